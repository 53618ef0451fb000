//! Overlay render data for the monitoring view

use camera_capture::VideoFrame;
use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::analysis::{FrameObservation, FrameVerdict};
use crate::geometry::Point2D;
use crate::landmarks::EYE_LANDMARK_COUNT;
use crate::DmsError;

const EYE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ALERT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// What to draw on top of a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Closed outline of the left eye
    pub left_eye: Option<[Point2D; EYE_LANDMARK_COUNT]>,
    /// Closed outline of the right eye
    pub right_eye: Option<[Point2D; EYE_LANDMARK_COUNT]>,
    /// EAR shown next to the video
    pub ear: Option<f32>,
    /// Draw the alert banner
    pub alert: bool,
}

impl Overlay {
    pub fn new(observation: &FrameObservation, verdict: &FrameVerdict) -> Self {
        Self {
            left_eye: observation.left_eye.map(|eye| *eye.points()),
            right_eye: observation.right_eye.map(|eye| *eye.points()),
            ear: verdict.ear,
            alert: verdict.alert,
        }
    }

    /// Draw eye outlines and, while alerting, a banner across the top
    pub fn draw(&self, frame: &mut VideoFrame) -> Result<(), DmsError> {
        let mut canvas = frame
            .to_rgb_image()
            .map_err(|e| DmsError::ImageProcessing(e.to_string()))?;

        for eye in [&self.left_eye, &self.right_eye].into_iter().flatten() {
            for (i, start) in eye.iter().enumerate() {
                let end = &eye[(i + 1) % EYE_LANDMARK_COUNT];
                draw_line_segment_mut(&mut canvas, (start.x, start.y), (end.x, end.y), EYE_COLOR);
            }
        }

        if self.alert && frame.width > 0 {
            let banner_height = (frame.height / 12).max(1);
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(0, 0).of_size(frame.width, banner_height),
                ALERT_COLOR,
            );
        }

        frame.replace_pixels(canvas);
        Ok(())
    }
}
