use super::params::Reconstruction;

/// Van Leer harmonic slope limiter.
#[inline(always)]
fn van_leer(dl: f64, dr: f64) -> f64 {
    if dl * dr > 0.0 {
        2.0 * dl * dr / (dl + dr)
    } else {
        0.0
    }
}

/// Upwinded interface values for a line of paired (value, speed) channels.
///
/// `q` and `s` hold `nch` channels per line position, `q[p * nch + c]`.
/// Face `p` sits between positions `p - 1` and `p`; faces `lo..=hi` are written
/// to `face` with the same layout. Each channel is upwinded on the sign of its
/// face-averaged speed, and a zero face speed takes the mean of both states.
/// Van Leer needs two valid positions on each side of every face.
#[allow(clippy::too_many_arguments)]
pub fn flux_adv_j(
    scheme: Reconstruction,
    q: &[f64],
    s: &[f64],
    nch: usize,
    lo: usize,
    hi: usize,
    dtods: f64,
    face: &mut [f64],
) {
    debug_assert!(lo >= 1);
    debug_assert!(q.len() >= (hi + 1) * nch && s.len() == q.len() && face.len() >= (hi + 1) * nch);

    let slope = |p: usize, c: usize| -> f64 {
        match scheme {
            Reconstruction::Donor => 0.0,
            Reconstruction::VanLeer => {
                let qm = q[(p - 1) * nch + c];
                let q0 = q[p * nch + c];
                let qp = q[(p + 1) * nch + c];
                van_leer(q0 - qm, qp - q0)
            }
        }
    };

    for p in lo..=hi {
        let left = (p - 1) * nch;
        let right = p * nch;
        for c in 0..nch {
            let sl = s[left + c];
            let sr = s[right + c];
            let sf = 0.5 * (sl + sr);

            let (ql, qr) = match scheme {
                Reconstruction::Donor => (q[left + c], q[right + c]),
                Reconstruction::VanLeer => {
                    let cl = (sl.abs() * dtods).min(1.0);
                    let cr = (sr.abs() * dtods).min(1.0);
                    (
                        q[left + c] + 0.5 * (1.0 - cl) * slope(p - 1, c),
                        q[right + c] - 0.5 * (1.0 - cr) * slope(p, c),
                    )
                }
            };

            face[right + c] = if sf > 0.0 {
                ql
            } else if sf < 0.0 {
                qr
            } else {
                0.5 * (ql + qr)
            };
        }
    }
}
