//! Video source abstraction
//!
//! A [`VideoSource`] opens a [`FrameStream`]; the stream owns the capture
//! handle and releases it when dropped. Reads are bounded by a timeout so a
//! polling loop can notice a stop request between frames.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::frame::VideoFrame;
use crate::{CameraConfig, CameraError};

/// Result of a single bounded frame read
#[derive(Debug)]
pub enum ReadOutcome {
    /// A decoded frame
    Frame(VideoFrame),
    /// No frame arrived within the timeout
    Pending,
    /// The source is exhausted
    EndOfStream,
}

/// An open capture handle. Dropping it closes the device.
pub trait FrameStream: Send {
    /// Read the next frame, waiting at most `timeout`
    fn read_frame(&mut self, timeout: Duration) -> Result<ReadOutcome, CameraError>;
}

/// Something that can be opened into a frame stream (camera, file, replay)
pub trait VideoSource: Send {
    /// Open the source. Fails with [`CameraError::Open`] when unavailable.
    fn open(&self, config: &CameraConfig) -> Result<Box<dyn FrameStream>, CameraError>;
}

/// In-memory source that replays a fixed list of frames, then ends
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: Vec<VideoFrame>,
    /// Frame indices preceded by a read that times out
    stalls: Vec<usize>,
    unavailable: Option<String>,
    open_streams: Arc<AtomicUsize>,
}

impl ReplaySource {
    /// Create a replay source from frames
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames,
            ..Default::default()
        }
    }

    /// Replay `count` black frames with consecutive sequence numbers
    pub fn blank(count: u32, width: u32, height: u32) -> Self {
        let frames = (0..count)
            .map(|seq| VideoFrame::blank(width, height, seq as u64 * 33_000_000, seq))
            .collect();
        Self::new(frames)
    }

    /// A source whose `open` always fails
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Make the read before frame `index` time out once
    pub fn stall_before(mut self, index: usize) -> Self {
        self.stalls.push(index);
        self
    }

    /// Number of streams currently open from this source
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

impl VideoSource for ReplaySource {
    fn open(&self, config: &CameraConfig) -> Result<Box<dyn FrameStream>, CameraError> {
        if let Some(reason) = &self.unavailable {
            return Err(CameraError::Open(format!("{}: {}", config.device, reason)));
        }

        self.open_streams.fetch_add(1, Ordering::SeqCst);
        info!("Opened replay source {} ({} frames)", config.device, self.frames.len());

        let mut reads = VecDeque::with_capacity(self.frames.len() + self.stalls.len());
        for (index, frame) in self.frames.iter().enumerate() {
            if self.stalls.contains(&index) {
                reads.push_back(None);
            }
            reads.push_back(Some(frame.clone()));
        }

        Ok(Box::new(ReplayStream {
            reads,
            open_streams: self.open_streams.clone(),
        }))
    }
}

struct ReplayStream {
    /// `None` is a read that times out
    reads: VecDeque<Option<VideoFrame>>,
    open_streams: Arc<AtomicUsize>,
}

impl FrameStream for ReplayStream {
    fn read_frame(&mut self, _timeout: Duration) -> Result<ReadOutcome, CameraError> {
        Ok(match self.reads.pop_front() {
            Some(Some(frame)) => ReadOutcome::Frame(frame),
            Some(None) => ReadOutcome::Pending,
            None => ReadOutcome::EndOfStream,
        })
    }
}

impl Drop for ReplayStream {
    fn drop(&mut self) {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        debug!("Replay stream closed");
    }
}
