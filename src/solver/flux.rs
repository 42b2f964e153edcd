use super::geometry::Geometry;
use super::params::{SolverParams, TINY_NUMBER};
use super::reconstruct::flux_adv_j;
use super::workspace::Workspace;
use crate::grid::{FluidGrid, RadGrid};
use crate::state::NGHOST;

/// Offset of channel 0 for `(p, f, m)` in the line buffers.
/// Channel 0 is the streaming intensity, channel 1 the `3J` drift term.
#[inline(always)]
fn line_at(p: usize, f: usize, m: usize, nf: usize, na: usize) -> usize {
    (p * nf + f) * 2 * na + 2 * m
}

/// Accumulate the flux divergence of every interior `(cell, f, angle)` into
/// `ws.div` from the three directional sweeps. Ghost zones must be valid.
pub fn flux_step(params: &SolverParams, geometry: &Geometry, rad: &RadGrid, fluid: &FluidGrid, ws: &mut Workspace) {
    ws.div.iter_mut().for_each(|d| *d = 0.0);
    for dir in 0..3 {
        sweep(dir, params, geometry, rad, fluid, ws);
    }
}

fn sweep(dir: usize, params: &SolverParams, geometry: &Geometry, rad: &RadGrid, fluid: &FluidGrid, ws: &mut Workspace) {
    let dims = rad.dims;
    let nf = rad.nf();
    let na = rad.nang();
    let nch = nf * 2 * na;
    let n = dims.nx[dir];
    let len = dims.total(dir) * nch;

    for b in dims.interior((dir + 2) % 3) {
        for a in dims.interior((dir + 1) % 3) {
            load_line(dir, a, b, params, rad, fluid, ws);

            // Lines along x2 run at fixed radius, so the metric is constant per line
            let dtods = match dir {
                1 => params.dt / geometry.path_length(1, b, &dims),
                _ => params.dt / dims.dx[dir],
            };
            flux_adv_j(
                params.reconstruction,
                &ws.line_q[..len],
                &ws.line_s[..len],
                nch,
                NGHOST,
                NGHOST + n,
                dtods,
                &mut ws.face[..len],
            );

            for p in dims.interior(dir) {
                let (lsf, rsf) = if dir == 0 { geometry.x1_face_factors(p, &dims) } else { (1.0, 1.0) };
                let cell = dims.line_cell(dir, p, a, b);
                for f in 0..nf {
                    for m in 0..na {
                        let here = line_at(p, f, m, nf, na);
                        let right = line_at(p + 1, f, m, nf, na);
                        let left = line_at(p - 1, f, m, nf, na);

                        let stream = params.crat * (rsf * ws.face[right] - lsf * ws.face[here]);
                        let s1 = |o: usize| ws.line_s[o + 1];
                        let drift = 0.5
                            * (rsf * (s1(right) + s1(here)) * ws.face[right + 1]
                                - lsf * (s1(here) + s1(left)) * ws.face[here + 1]);

                        ws.div[rad.idx(cell, f, m)] += (stream + drift) * dtods;
                    }
                }
            }
        }
    }
}

/// Fill the paired (value, speed) channels for the whole line, ghosts included.
fn load_line(dir: usize, a: usize, b: usize, params: &SolverParams, rad: &RadGrid, fluid: &FluidGrid, ws: &mut Workspace) {
    let dims = rad.dims;
    let nf = rad.nf();
    let na = rad.nang();
    let invc = params.inv_crat();

    for p in 0..dims.total(dir) {
        let cell = dims.line_cell(dir, p, a, b);
        let v = fluid.velocity(cell);
        for f in 0..nf {
            let sigma = rad.opacity(cell, f);
            let thick = sigma[1] + sigma[2] > TINY_NUMBER;
            let j3 = 3.0 * rad.j[rad.idx_cf(cell, f)];
            let stream_speed = params.crat * rad.speed(cell, f, dir);
            let ray = rad.ray(cell, f);
            for m in 0..na {
                let mu = rad.angles.mu(m);
                let vmu = v[0] * mu[0] + v[1] * mu[1] + v[2] * mu[2];
                let md = mu[dir];
                let o = line_at(p, f, m, nf, na);

                if thick {
                    ws.line_q[o] = md * (ray[m] - vmu * j3 * invc);
                    ws.line_q[o + 1] = md * md * j3;
                    ws.line_s[o + 1] = if md.abs() > TINY_NUMBER { vmu / md } else { 0.0 };
                } else {
                    ws.line_q[o] = md * ray[m];
                    ws.line_q[o + 1] = 0.0;
                    ws.line_s[o + 1] = 0.0;
                }
                ws.line_s[o] = if md >= 0.0 { stream_speed } else { -stream_speed };
            }
        }
    }
}
