// ============================================================
// Layer 3 - Illuminant Domain Types
// ============================================================
// An illuminant is the RGB color of the light falling on a
// scene. The cascade predicts one unit-length RGB vector per
// stage; these types carry those vectors out of the tensor world.
//
// Reference: Yu et al. (2020) Cascading Convolutional Color Constancy

use serde::{Deserialize, Serialize};

const NORM_EPS: f32 = 1e-12;

/// Linear RGB illuminant color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Illuminant {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Illuminant {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// A white light with equal energy in every channel, unit length.
    pub fn neutral() -> Self {
        let c = 1.0 / 3f32.sqrt();
        Self::new(c, c, c)
    }

    /// Build from the first three values of a slice.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [r, g, b, ..] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn norm(&self) -> f32 {
        (self.r * self.r + self.g * self.g + self.b * self.b).sqrt()
    }

    /// Unit-length copy. A zero vector stays zero.
    pub fn normalized(&self) -> Self {
        let n = self.norm().max(NORM_EPS);
        Self::new(self.r / n, self.g / n, self.b / n)
    }

    /// Element-wise product, used to compose stage estimates.
    pub fn product(&self, other: &Self) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    /// rgb / (r + g + b)
    pub fn chromaticity(&self) -> [f32; 3] {
        let sum = (self.r + self.g + self.b).max(NORM_EPS);
        [self.r / sum, self.g / sum, self.b / sum]
    }

    /// Angle between two illuminants in degrees.
    pub fn angular_error(&self, other: &Self) -> f32 {
        let denom = (self.norm() * other.norm()).max(NORM_EPS);
        let dot = self.r * other.r + self.g * other.g + self.b * other.b;
        (dot / denom).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Per-stage illuminant predictions for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeEstimate {
    /// The file the image came from
    pub source: String,

    /// One unit-length prediction per cascade stage, in order
    pub stages: Vec<Illuminant>,
}

impl CascadeEstimate {
    pub fn new(source: impl Into<String>, stages: Vec<Illuminant>) -> Self {
        Self { source: source.into(), stages }
    }

    pub fn final_stage(&self) -> Option<Illuminant> {
        self.stages.last().copied()
    }

    /// Product of every stage estimate, renormalised.
    /// Each stage only corrects the residual cast left by the ones
    /// before it, so the full illuminant is their composition.
    pub fn combined(&self) -> Illuminant {
        self.stages
            .iter()
            .fold(Illuminant::new(1.0, 1.0, 1.0), |acc, s| acc.product(s))
            .normalized()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_has_unit_length() {
        let n = Illuminant::new(3.0, 4.0, 0.0).normalized();
        assert!((n.norm() - 1.0).abs() < 1e-6);
        assert!((n.r - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let n = Illuminant::new(0.0, 0.0, 0.0).normalized();
        assert_eq!(n, Illuminant::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_angular_error() {
        let a = Illuminant::new(1.0, 0.0, 0.0);
        let b = Illuminant::new(0.0, 1.0, 0.0);
        assert!((a.angular_error(&b) - 90.0).abs() < 1e-4);
        // Scale does not matter
        let c = Illuminant::new(2.0, 2.0, 2.0);
        assert!(Illuminant::neutral().angular_error(&c) < 1e-2);
    }

    #[test]
    fn test_chromaticity_sums_to_one() {
        let chroma = Illuminant::new(0.2, 0.5, 0.3).chromaticity();
        assert!((chroma.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_combined_is_normalised_product() {
        let est = CascadeEstimate::new(
            "a.png",
            vec![
                Illuminant::new(1.0, 2.0, 2.0).normalized(),
                Illuminant::neutral(),
                Illuminant::neutral(),
            ],
        );
        let combined = est.combined();
        assert!((combined.norm() - 1.0).abs() < 1e-5);
        // Neutral stages do not change the direction
        assert!(combined.angular_error(&est.stages[0]) < 1e-2);
        assert_eq!(est.final_stage(), Some(Illuminant::neutral()));
    }

    #[test]
    fn test_from_slice() {
        assert_eq!(Illuminant::from_slice(&[0.1, 0.2, 0.3]), Some(Illuminant::new(0.1, 0.2, 0.3)));
        assert_eq!(Illuminant::from_slice(&[0.1]), None);
    }
}
