//! Recorded landmark traces
//!
//! A trace is a JSON-lines file with one record per frame:
//!
//! ```text
//! {"sequence": 0, "timestamp_ns": 0, "face": [{"x": 1.0, "y": 2.0}, ...68 points]}
//! {"sequence": 1, "face": null}
//! ```
//!
//! Replaying a trace stands in for both the camera and the landmark model.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use camera_capture::{ReplaySource, VideoFrame};
use dms::{DmsError, FaceLandmarks, FaceRegion, LandmarkExtractor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Trace loading errors
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed trace record on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// One recorded frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub sequence: u32,
    #[serde(default)]
    pub timestamp_ns: u64,
    /// Landmarks of the detected face, `null` when nobody was visible
    pub face: Option<FaceLandmarks>,
}

/// Parsed landmark trace
#[derive(Debug, Clone, Default)]
pub struct LandmarkTrace {
    records: Vec<TraceRecord>,
}

impl LandmarkTrace {
    pub fn new(records: Vec<TraceRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let text = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Self::parse(&text)?;
        info!("Loaded {} trace frames from {}", trace.len(), path.display());
        Ok(trace)
    }

    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let records = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| TraceError::Parse {
                    line: idx + 1,
                    source,
                })
            })
            .collect::<Result<Vec<TraceRecord>, _>>()?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Blank frames carrying the recorded sequence numbers and timestamps
    pub fn video_source(&self, width: u32, height: u32) -> ReplaySource {
        let frames = self
            .records
            .iter()
            .map(|r| VideoFrame::blank(width, height, r.timestamp_ns, r.sequence))
            .collect();
        ReplaySource::new(frames)
    }

    /// Extractor answering with the recorded landmarks for each frame
    pub fn extractor(&self) -> TraceExtractor {
        let faces = self
            .records
            .iter()
            .filter_map(|r| r.face.clone().map(|face| (r.sequence, face)))
            .collect();
        TraceExtractor { faces }
    }
}

/// Landmark extractor backed by a trace
pub struct TraceExtractor {
    faces: HashMap<u32, FaceLandmarks>,
}

impl LandmarkExtractor for TraceExtractor {
    fn detect_faces(&mut self, frame: &VideoFrame) -> Result<Vec<FaceRegion>, DmsError> {
        let Some(face) = self.faces.get(&frame.sequence) else {
            return Ok(Vec::new());
        };

        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in face.points() {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Ok(vec![FaceRegion {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
            confidence: 1.0,
        }])
    }

    fn extract_landmarks(
        &mut self,
        frame: &VideoFrame,
        _face: &FaceRegion,
    ) -> Result<FaceLandmarks, DmsError> {
        self.faces
            .get(&frame.sequence)
            .cloned()
            .ok_or_else(|| {
                DmsError::Extraction(format!("no landmarks for frame {}", frame.sequence))
            })
    }
}
