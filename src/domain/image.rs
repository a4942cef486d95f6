// ============================================================
// Layer 3 - Image Frame Domain Type
// ============================================================
// A decoded RGB image in the layout the network consumes:
// planar channels (all reds, then greens, then blues), row-major,
// values in [0, 1].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbFrame {
    /// File path or name, kept so estimates can be traced back
    pub source: String,
    pub width:  usize,
    pub height: usize,
    /// CHW planes, length 3 * width * height
    pub data:   Vec<f32>,
}

impl RgbFrame {
    pub fn new(source: impl Into<String>, width: usize, height: usize, data: Vec<f32>) -> Self {
        Self { source: source.into(), width, height, data }
    }

    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// One color plane. `channel` is 0, 1 or 2.
    pub fn plane(&self, channel: usize) -> &[f32] {
        let len = self.plane_len();
        &self.data[channel * len..(channel + 1) * len]
    }

    /// True when `data` holds exactly three planes.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == 3 * self.plane_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planes_are_contiguous() {
        let frame = RgbFrame::new("x", 2, 1, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert!(frame.is_consistent());
        assert_eq!(frame.plane(1), &[0.3, 0.4]);
        assert_eq!(frame.plane(2), &[0.5, 0.6]);
    }
}
