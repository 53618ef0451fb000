//! Facial landmarks and the landmark extractor interface
//!
//! Landmarks follow the 68-point iBUG 300-W scheme. The subject's left eye
//! occupies indices 42-47 and the right eye 36-41, each ordered outer
//! corner, upper lid, inner corner, lower lid.

use std::ops::Range;

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{eye_aspect_ratio, Point2D};
use crate::DmsError;

/// Points in a full face landmark set
pub const FACE_LANDMARK_COUNT: usize = 68;

/// Points outlining one eye
pub const EYE_LANDMARK_COUNT: usize = 6;

/// Left eye indices in the 68-point scheme
pub const LEFT_EYE: Range<usize> = 42..48;

/// Right eye indices in the 68-point scheme
pub const RIGHT_EYE: Range<usize> = 36..42;

/// Six ordered eye-contour points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks([Point2D; EYE_LANDMARK_COUNT]);

impl EyeLandmarks {
    /// Build from a slice, rejecting anything but exactly six points
    pub fn new(points: &[Point2D]) -> Result<Self, DmsError> {
        let points: [Point2D; EYE_LANDMARK_COUNT] =
            points.try_into().map_err(|_| DmsError::InvalidInput {
                expected: EYE_LANDMARK_COUNT,
                actual: points.len(),
            })?;
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Point2D; EYE_LANDMARK_COUNT] {
        &self.0
    }

    /// Eye aspect ratio of this eye
    pub fn aspect_ratio(&self) -> Result<f32, DmsError> {
        eye_aspect_ratio(&self.0)
    }
}

/// Face bounding box reported by the face detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// Full 68-point landmark set for one face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct FaceLandmarks {
    points: Vec<Point2D>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point2D>) -> Result<Self, DmsError> {
        if points.len() != FACE_LANDMARK_COUNT {
            return Err(DmsError::InvalidInput {
                expected: FACE_LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn left_eye(&self) -> Result<EyeLandmarks, DmsError> {
        EyeLandmarks::new(&self.points[LEFT_EYE])
    }

    pub fn right_eye(&self) -> Result<EyeLandmarks, DmsError> {
        EyeLandmarks::new(&self.points[RIGHT_EYE])
    }
}

impl TryFrom<Vec<Point2D>> for FaceLandmarks {
    type Error = DmsError;

    fn try_from(points: Vec<Point2D>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<FaceLandmarks> for Vec<Point2D> {
    fn from(face: FaceLandmarks) -> Self {
        face.points
    }
}

/// Face detector plus landmark predictor
///
/// Implementations wrap whatever model produces the landmarks; the engine
/// only relies on the 68-point ordering.
pub trait LandmarkExtractor: Send {
    /// Find faces in a frame; empty when nobody is visible
    fn detect_faces(&mut self, frame: &VideoFrame) -> Result<Vec<FaceRegion>, DmsError>;

    /// Predict the 68 landmarks for one detected face
    fn extract_landmarks(
        &mut self,
        frame: &VideoFrame,
        face: &FaceRegion,
    ) -> Result<FaceLandmarks, DmsError>;
}

/// Landmarks of the first detected face, if any
pub fn first_face_landmarks(
    extractor: &mut dyn LandmarkExtractor,
    frame: &VideoFrame,
) -> Result<Option<FaceLandmarks>, DmsError> {
    let faces = extractor.detect_faces(frame)?;
    let Some(face) = faces.first() else {
        return Ok(None);
    };

    if faces.len() > 1 {
        debug!(
            "{} faces in frame {}, using the first",
            faces.len(),
            frame.sequence
        );
    }

    extractor.extract_landmarks(frame, face).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_face() -> FaceLandmarks {
        let points = (0..FACE_LANDMARK_COUNT)
            .map(|i| Point2D::new(i as f32, 0.0))
            .collect();
        FaceLandmarks::new(points).unwrap()
    }

    struct TwoFaces;

    impl LandmarkExtractor for TwoFaces {
        fn detect_faces(&mut self, _frame: &VideoFrame) -> Result<Vec<FaceRegion>, DmsError> {
            let face = |x| FaceRegion {
                x,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                confidence: 0.9,
            };
            Ok(vec![face(1.0), face(2.0)])
        }

        fn extract_landmarks(
            &mut self,
            _frame: &VideoFrame,
            face: &FaceRegion,
        ) -> Result<FaceLandmarks, DmsError> {
            let points = vec![Point2D::new(face.x, 0.0); FACE_LANDMARK_COUNT];
            FaceLandmarks::new(points)
        }
    }

    struct NoFaces;

    impl LandmarkExtractor for NoFaces {
        fn detect_faces(&mut self, _frame: &VideoFrame) -> Result<Vec<FaceRegion>, DmsError> {
            Ok(Vec::new())
        }

        fn extract_landmarks(
            &mut self,
            _frame: &VideoFrame,
            _face: &FaceRegion,
        ) -> Result<FaceLandmarks, DmsError> {
            Err(DmsError::Extraction("called without a face".into()))
        }
    }

    #[test]
    fn test_eye_slices_follow_68_point_scheme() {
        let face = numbered_face();
        let left = face.left_eye().unwrap();
        let right = face.right_eye().unwrap();

        assert_eq!(left.points()[0].x, 42.0);
        assert_eq!(left.points()[5].x, 47.0);
        assert_eq!(right.points()[0].x, 36.0);
        assert_eq!(right.points()[5].x, 41.0);
    }

    #[test]
    fn test_face_requires_68_points() {
        let err = FaceLandmarks::new(vec![Point2D::default(); 67]).unwrap_err();
        assert!(matches!(
            err,
            DmsError::InvalidInput {
                expected: 68,
                actual: 67
            }
        ));
    }

    #[test]
    fn test_eye_requires_six_points() {
        assert!(EyeLandmarks::new(&[Point2D::default(); 7]).is_err());
        assert!(EyeLandmarks::new(&[Point2D::default(); 6]).is_ok());
    }

    #[test]
    fn test_face_landmarks_deserialize_validates_length() {
        let short = serde_json::to_string(&vec![Point2D::default(); 3]).unwrap();
        assert!(serde_json::from_str::<FaceLandmarks>(&short).is_err());

        let full = serde_json::to_string(&numbered_face()).unwrap();
        let parsed: FaceLandmarks = serde_json::from_str(&full).unwrap();
        assert_eq!(parsed, numbered_face());
    }

    #[test]
    fn test_first_face_is_used() {
        let frame = VideoFrame::blank(4, 4, 0, 0);
        let face = first_face_landmarks(&mut TwoFaces, &frame).unwrap().unwrap();
        assert_eq!(face.points()[0].x, 1.0);
    }

    #[test]
    fn test_no_face_yields_none() {
        let frame = VideoFrame::blank(4, 4, 0, 0);
        assert!(first_face_landmarks(&mut NoFaces, &frame).unwrap().is_none());
    }
}
