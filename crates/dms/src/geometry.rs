//! Eye geometry metrics

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// A single facial landmark coordinate (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2D) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Eye Aspect Ratio (Soukupová & Čech, 2016)
///
/// Expects six points ordered outer corner, two upper-lid points, inner
/// corner, two lower-lid points:
///
/// ```text
/// EAR = (|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)
/// ```
///
/// An open eye sits around 0.25-0.35, a closed one near zero.
pub fn eye_aspect_ratio(eye: &[Point2D]) -> Result<f32, DmsError> {
    let [p0, p1, p2, p3, p4, p5] = eye else {
        return Err(DmsError::InvalidInput {
            expected: 6,
            actual: eye.len(),
        });
    };

    let vertical_a = p1.distance(p5);
    let vertical_b = p2.distance(p4);
    let horizontal = p0.distance(p3);

    if horizontal == 0.0 || !horizontal.is_finite() {
        return Err(DmsError::DegenerateGeometry);
    }

    Ok((vertical_a + vertical_b) / (2.0 * horizontal))
}
