//! Collaborator doubles shared by the controller and runner tests

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alerting::{AlertPlayer, AudioBackend, AudioError};
use camera_capture::{
    CameraConfig, CameraError, FrameStream, ReadOutcome, ReplaySource, VideoFrame, VideoSource,
};
use dms::landmarks::{FACE_LANDMARK_COUNT, LEFT_EYE, RIGHT_EYE};
use dms::{DmsError, FaceLandmarks, FaceRegion, LandmarkExtractor, Point2D};

use crate::{ControllerOptions, SessionController};

/// Six eye points 10px wide at `(x, y)` whose aspect ratio is `ear`
fn eye_points(x: f32, y: f32, ear: f32) -> [Point2D; 6] {
    let lid = ear * 5.0;
    [
        Point2D::new(x, y),
        Point2D::new(x + 3.0, y - lid),
        Point2D::new(x + 7.0, y - lid),
        Point2D::new(x + 10.0, y),
        Point2D::new(x + 7.0, y + lid),
        Point2D::new(x + 3.0, y + lid),
    ]
}

/// 68-point face whose eyes both have the given aspect ratio
pub fn face_with_ear(ear: f32) -> FaceLandmarks {
    let mut points = vec![Point2D::new(16.0, 16.0); FACE_LANDMARK_COUNT];
    points[RIGHT_EYE].copy_from_slice(&eye_points(4.0, 10.0, ear));
    points[LEFT_EYE].copy_from_slice(&eye_points(18.0, 10.0, ear));
    FaceLandmarks::new(points).expect("68 points")
}

/// Extractor that replays a per-frame EAR script (None = no face)
pub struct ScriptedExtractor {
    ears: Vec<Option<f32>>,
    degenerate_at: Option<u32>,
    malformed_at: Option<u32>,
    undetectable_at: Option<u32>,
}

impl ScriptedExtractor {
    pub fn new(ears: Vec<Option<f32>>) -> Self {
        Self {
            ears,
            degenerate_at: None,
            malformed_at: None,
            undetectable_at: None,
        }
    }

    /// Return coincident eye corners for this frame
    pub fn degenerate_at(mut self, sequence: u32) -> Self {
        self.degenerate_at = Some(sequence);
        self
    }

    /// Return a short landmark set for this frame
    pub fn malformed_at(mut self, sequence: u32) -> Self {
        self.malformed_at = Some(sequence);
        self
    }

    /// Fail face detection for this frame
    pub fn undetectable_at(mut self, sequence: u32) -> Self {
        self.undetectable_at = Some(sequence);
        self
    }
}

impl LandmarkExtractor for ScriptedExtractor {
    fn detect_faces(&mut self, frame: &VideoFrame) -> Result<Vec<FaceRegion>, DmsError> {
        if self.undetectable_at == Some(frame.sequence) {
            return Err(DmsError::Extraction("detector timed out".into()));
        }

        let visible = self
            .ears
            .get(frame.sequence as usize)
            .is_some_and(|ear| ear.is_some());

        Ok(if visible {
            vec![FaceRegion {
                x: 0.0,
                y: 0.0,
                width: frame.width as f32,
                height: frame.height as f32,
                confidence: 0.99,
            }]
        } else {
            Vec::new()
        })
    }

    fn extract_landmarks(
        &mut self,
        frame: &VideoFrame,
        _face: &FaceRegion,
    ) -> Result<FaceLandmarks, DmsError> {
        if self.malformed_at == Some(frame.sequence) {
            return FaceLandmarks::new(vec![Point2D::default(); 12]);
        }
        if self.degenerate_at == Some(frame.sequence) {
            return FaceLandmarks::new(vec![Point2D::new(5.0, 5.0); FACE_LANDMARK_COUNT]);
        }

        let ear = self
            .ears
            .get(frame.sequence as usize)
            .copied()
            .flatten()
            .ok_or_else(|| DmsError::Extraction("no face scripted".into()))?;
        Ok(face_with_ear(ear))
    }
}

/// Audio double: counts plays, stays "playing" until stopped
#[derive(Clone, Default)]
pub struct RecordingAudio {
    plays: Arc<AtomicUsize>,
    playing: Arc<AtomicBool>,
    fail_load: bool,
    fail_play: bool,
}

impl RecordingAudio {
    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Default::default()
        }
    }

    pub fn failing_play() -> Self {
        Self {
            fail_play: true,
            ..Default::default()
        }
    }

    /// Play attempts, including failed ones
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl AudioBackend for RecordingAudio {
    fn load(&self, path: &Path) -> Result<Box<dyn AlertPlayer>, AudioError> {
        if self.fail_load {
            return Err(AudioError::Load {
                path: path.to_path_buf(),
                reason: "no audio device".into(),
            });
        }
        Ok(Box::new(self.clone()))
    }
}

impl AlertPlayer for RecordingAudio {
    fn play(&mut self) -> Result<(), AudioError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.fail_play {
            return Err(AudioError::Playback("output device lost".into()));
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
    }
}

/// Source whose stream fails on the first read
pub struct BrokenCamera {
    pub open_streams: Arc<AtomicUsize>,
}

struct BrokenStream(Arc<AtomicUsize>);

impl VideoSource for BrokenCamera {
    fn open(&self, _config: &CameraConfig) -> Result<Box<dyn FrameStream>, CameraError> {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(BrokenStream(self.open_streams.clone())))
    }
}

impl FrameStream for BrokenStream {
    fn read_frame(&mut self, _timeout: Duration) -> Result<ReadOutcome, CameraError> {
        Err(CameraError::Read("device unplugged".into()))
    }
}

impl Drop for BrokenStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Controller over test doubles, without frame resizing
pub fn controller(
    source: &ReplaySource,
    extractor: ScriptedExtractor,
    audio: &RecordingAudio,
) -> SessionController {
    let mut options = ControllerOptions::default();
    options.camera.resize_width = None;
    SessionController::new(
        Box::new(source.clone()),
        Box::new(extractor),
        Box::new(audio.clone()),
        options,
    )
}
