use std::f64::consts::PI;

/// Coefficients of the implicit absorption/emission update of one `(cell, f)`.
#[derive(Clone, Copy, Debug)]
pub struct Coupling {
    /// `dt * sigma_a`.
    pub dt_sigma: f64,
    /// Planck fraction of the group.
    pub fraction: f64,
    /// `rho * cv`, internal energy per unit temperature.
    pub tcoef: f64,
    pub prat: f64,
    pub crat: f64,
    /// `|v|^2`.
    pub v2: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonOutcome {
    pub temperature: f64,
    pub iterations: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonFailure {
    pub iterations: usize,
    pub residual: f64,
}

/// Solve `a4 T^4 + tcoef T - c0 = 0` for the positive root.
///
/// Starts from `t0` when it lies above the root, otherwise from the smaller of
/// `c0 / tcoef` and `(c0 / a4)^(1/4)`. Stops once the relative update falls
/// below `tol`.
pub fn solve_quartic(a4: f64, tcoef: f64, c0: f64, t0: f64, tol: f64, max_iter: usize) -> Result<NewtonOutcome, NewtonFailure> {
    let relative = |t: f64| (a4 * t.powi(4) + tcoef * t - c0).abs() / c0.abs().max(f64::MIN_POSITIVE);

    if a4 == 0.0 && tcoef == 0.0 {
        return Ok(NewtonOutcome { temperature: t0, iterations: 0 });
    }
    if !(c0 >= 0.0) || !c0.is_finite() {
        return Err(NewtonFailure { iterations: 0, residual: c0 });
    }
    if c0 == 0.0 {
        return Ok(NewtonOutcome { temperature: 0.0, iterations: 0 });
    }
    if a4 == 0.0 {
        return Ok(NewtonOutcome { temperature: c0 / tcoef, iterations: 0 });
    }
    if tcoef == 0.0 {
        return Ok(NewtonOutcome { temperature: (c0 / a4).powf(0.25), iterations: 0 });
    }

    // F is convex and increasing for T > 0: started at or above the root,
    // Newton descends monotonically onto it. Either term alone bounds the root.
    let f_at = |t: f64| a4 * t.powi(4) + tcoef * t - c0;
    let upper = (c0 / tcoef).min((c0 / a4).powf(0.25));
    let mut t = if t0 > 0.0 && f_at(t0) >= 0.0 { t0 } else { upper };
    for iter in 1..=max_iter {
        let t3 = t * t * t;
        let f = a4 * t3 * t + tcoef * t - c0;
        let df = 4.0 * a4 * t3 + tcoef;
        let dt = f / df;
        t -= dt;
        if !t.is_finite() || t <= 0.0 {
            return Err(NewtonFailure { iterations: iter, residual: relative(t) });
        }
        if dt.abs() <= tol * t {
            return Ok(NewtonOutcome { temperature: t, iterations: iter });
        }
    }
    Err(NewtonFailure { iterations: max_iter, residual: relative(t) })
}

/// Implicit absorption/emission for all angles of one `(cell, f)`.
///
/// `ray` holds the post-scattering intensities on entry and the coupled
/// intensities on exit. `angle_v` and `angle_v2` are `v . mu` and its square.
/// Gas and radiation energy are advanced together with backward Euler, keeping
/// `tcoef * dT = -Prat * 4pi * sum(w (1 - beta) dI)`.
#[allow(clippy::too_many_arguments)]
pub fn absorb(
    c: &Coupling,
    weights: &[f64],
    angle_v: &[f64],
    angle_v2: &[f64],
    ray: &mut [f64],
    t0: f64,
    tol: f64,
    max_iter: usize,
) -> Result<NewtonOutcome, NewtonFailure> {
    let invc = 1.0 / c.crat;
    let tau = c.dt_sigma * c.crat;
    let b2 = c.v2 * invc * invc;

    let mut emit = 0.0;
    let mut absorbed = 0.0;
    for (m, &i) in ray.iter().enumerate() {
        let beta = angle_v[m] * invc;
        let (e, k) = doppler(beta, angle_v2[m] * invc * invc, b2);
        let g = weights[m] * (1.0 - beta) / (1.0 + tau * k);
        emit += g * e;
        absorbed += g * k * i;
    }
    let a4 = c.prat * tau * c.fraction * emit;
    let c0 = c.tcoef * t0 + c.prat * 4.0 * PI * tau * absorbed;

    let outcome = solve_quartic(a4, c.tcoef, c0, t0, tol, max_iter)?;

    let planck = c.fraction * outcome.temperature.powi(4) * 0.25 / PI;
    for (m, i) in ray.iter_mut().enumerate() {
        let (e, k) = doppler(angle_v[m] * invc, angle_v2[m] * invc * invc, b2);
        *i = (*i + tau * e * planck) / (1.0 + tau * k);
    }
    Ok(outcome)
}

/// Emission and extinction factors to second order in `beta`.
#[inline(always)]
fn doppler(beta: f64, beta2: f64, b2: f64) -> (f64, f64) {
    (1.0 + 3.0 * beta + 6.0 * beta2 - 1.5 * b2, 1.0 - beta + 0.5 * b2)
}
