use std::f64::consts::PI;

use crate::error::RadError;

const WEIGHT_SUM_TOL: f64 = 1e-10;
const UNIT_TOL: f64 = 1e-8;

/// Discrete ordinate set: `noct` octants with `nang` angles each.
///
/// Angle index `n = l * nang + m` for octant `l` and per-octant angle `m`.
/// Octant bits: bit 0 flips x, bit 1 flips y, bit 2 flips z.
#[derive(Clone, Debug)]
pub struct AngleSet {
    noct: usize,
    nang: usize,
    mu: Vec<[f64; 3]>,
    weights: Vec<f64>,
}

impl AngleSet {
    /// Build from explicit direction cosines and weights.
    /// Weights must be positive and sum to one; directions must be unit vectors.
    pub fn new(noct: usize, nang: usize, mu: Vec<[f64; 3]>, weights: Vec<f64>) -> Result<Self, RadError> {
        let n = noct * nang;
        if n == 0 {
            return Err(RadError::InvalidQuadrature("empty angle set".into()));
        }
        if mu.len() != n || weights.len() != n {
            return Err(RadError::InvalidQuadrature(format!(
                "expected {} angles, got {} directions and {} weights",
                n,
                mu.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|&&w| !(w > 0.0)) {
            return Err(RadError::InvalidQuadrature(format!("non-positive weight {}", w)));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(RadError::InvalidQuadrature(format!("weights sum to {}, expected 1", sum)));
        }
        for (n, m) in mu.iter().enumerate() {
            let norm = (m[0] * m[0] + m[1] * m[1] + m[2] * m[2]).sqrt();
            if (norm - 1.0).abs() > UNIT_TOL {
                return Err(RadError::InvalidQuadrature(format!(
                    "direction {} has length {}",
                    n, norm
                )));
            }
        }
        Ok(Self { noct, nang, mu, weights })
    }

    /// Reflect one octant's directions into all eight octants.
    /// `weights` are per-octant and are rescaled so the full set sums to one.
    pub fn reflected(first_octant: &[[f64; 3]], weights: &[f64]) -> Result<Self, RadError> {
        if weights.len() != first_octant.len() {
            return Err(RadError::InvalidQuadrature(format!(
                "{} directions but {} weights",
                first_octant.len(),
                weights.len()
            )));
        }
        let set = Self::reflect(first_octant, weights);
        Self::new(set.noct, set.nang, set.mu, set.weights)
    }

    fn reflect(first_octant: &[[f64; 3]], weights: &[f64]) -> Self {
        let nang = first_octant.len();
        let wsum: f64 = weights.iter().sum();
        let mut mu = Vec::with_capacity(8 * nang);
        let mut w = Vec::with_capacity(8 * nang);
        for l in 0..8 {
            let s = octant_signs(l);
            for (dir, &wm) in first_octant.iter().zip(weights) {
                let norm = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
                mu.push([s[0] * dir[0] / norm, s[1] * dir[1] / norm, s[2] * dir[2] / norm]);
                w.push(wm / (8.0 * wsum));
            }
        }
        Self { noct: 8, nang, mu, weights: w }
    }

    /// One direction per octant along the cube diagonals.
    pub fn s2() -> Self {
        let c = 1.0 / 3.0_f64.sqrt();
        Self::reflect(&[[c, c, c]], &[1.0])
    }

    /// Level-symmetric S4 set: three equally weighted directions per octant.
    pub fn s4() -> Self {
        let (a, b) = (0.350_021_2, 0.868_890_3);
        Self::reflect(&[[a, a, b], [a, b, a], [b, a, a]], &[1.0, 1.0, 1.0])
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    pub fn noct(&self) -> usize {
        self.noct
    }

    pub fn nang(&self) -> usize {
        self.nang
    }

    #[inline(always)]
    pub fn mu(&self, n: usize) -> [f64; 3] {
        self.mu[n]
    }

    #[inline(always)]
    pub fn weight(&self, n: usize) -> f64 {
        self.weights[n]
    }

    pub fn directions(&self) -> &[[f64; 3]] {
        &self.mu
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Mean intensity J and flux vector H of one (cell, frequency) intensity slice.
    pub fn moments(&self, intensity: &[f64]) -> (f64, [f64; 3]) {
        let mut j = 0.0;
        let mut h = [0.0; 3];
        for ((&i, &w), mu) in intensity.iter().zip(&self.weights).zip(&self.mu) {
            let wi = w * i;
            j += wi;
            h[0] += wi * mu[0];
            h[1] += wi * mu[1];
            h[2] += wi * mu[2];
        }
        (j, h)
    }
}

/// Direction signs of octant `l`.
pub fn octant_signs(l: usize) -> [f64; 3] {
    let flip = |bit: usize| if l & bit != 0 { -1.0 } else { 1.0 };
    [flip(1), flip(2), flip(4)]
}

/// Frequency groups and the share of the blackbody each one carries.
#[derive(Clone, Debug)]
pub struct FrequencyGroups {
    fractions: Vec<f64>,
}

impl FrequencyGroups {
    pub fn new(fractions: Vec<f64>) -> Result<Self, RadError> {
        if fractions.is_empty() {
            return Err(RadError::InvalidConfig("at least one frequency group is required".into()));
        }
        if fractions.iter().any(|&f| !(f >= 0.0)) {
            return Err(RadError::InvalidConfig(format!("negative Planck fraction in {:?}", fractions)));
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(RadError::InvalidConfig(format!("Planck fractions sum to {}, expected 1", sum)));
        }
        Ok(Self { fractions })
    }

    /// Single frequency-integrated group.
    pub fn grey() -> Self {
        Self { fractions: vec![1.0] }
    }

    /// `nf` groups sharing the blackbody equally.
    pub fn equal(nf: usize) -> Result<Self, RadError> {
        if nf == 0 {
            return Err(RadError::InvalidConfig("at least one frequency group is required".into()));
        }
        Self::new(vec![1.0 / nf as f64; nf])
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    pub fn fraction(&self, f: usize) -> f64 {
        self.fractions[f]
    }

    /// Blackbody mean intensity of group `f` at temperature `t`.
    pub fn planck(&self, f: usize, t: f64) -> f64 {
        self.fractions[f] * t.powi(4) * 0.25 / PI
    }
}
