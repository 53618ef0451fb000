//! Session controller: lifecycle and per-frame effects

use alerting::{AlertConfig, AlertManager, AudioBackend};
use camera_capture::{CameraConfig, FrameStream, ReadOutcome, VideoFrame, VideoSource};
use chrono::{DateTime, Utc};
use dms::{
    first_face_landmarks, DmsError, DrowsinessMonitor, FrameObservation, FrameVerdict,
    LandmarkExtractor, MonitorState, Overlay, SessionConfig,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::SessionError;

/// Settings that outlive individual sessions
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    pub camera: CameraConfig,
    pub alert: AlertConfig,
    /// Draw the overlay onto each reported frame
    pub annotate_frames: bool,
}

/// Detection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Detecting,
    NotDetecting,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Detecting => "Detecting...",
            SessionStatus::NotDetecting => "Not detecting",
        }
    }
}

/// Result of one processed frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub session_id: Uuid,
    pub sequence: u32,
    pub timestamp_ns: u64,
    pub verdict: FrameVerdict,
    pub overlay: Overlay,
    /// The alert cue was started on this frame
    pub alert_started: bool,
    /// Annotated frame, when `annotate_frames` is on
    pub frame: Option<VideoFrame>,
}

/// Why a tick produced no verdict
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Bounded read returned without a frame
    NoFrame,
    /// The frame could not be evaluated; the session continues
    BadFrame { sequence: u32, reason: String },
}

/// Outcome of a single tick
#[derive(Debug)]
pub enum TickOutcome {
    Processed(FrameReport),
    Skipped(SkipReason),
    /// The source ran out of frames and the session was stopped
    Ended(SessionSummary),
}

/// Totals for a finished session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    /// Times the alert cue was started
    pub alerts_triggered: usize,
    /// Distinct drowsiness episodes
    pub alert_episodes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ear: Option<f32>,
}

/// Resources and state owned by one running session
struct ActiveSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: SessionConfig,
    stream: Box<dyn FrameStream>,
    alerts: AlertManager,
    monitor: DrowsinessMonitor,
    frames_processed: u64,
    frames_skipped: u64,
    min_ear: Option<f32>,
    /// The last attempt to play the cue failed
    cue_failing: bool,
}

impl ActiveSession {
    fn skip(&mut self, sequence: u32, err: &DmsError) -> TickOutcome {
        self.frames_skipped += 1;
        metrics::counter!("dms_frames_skipped_total").increment(1);
        warn!("[{}] Skipping frame {}: {}", self.id, sequence, err);
        TickOutcome::Skipped(SkipReason::BadFrame {
            sequence,
            reason: err.to_string(),
        })
    }

    fn record_ear(&mut self, ear: Option<f32>) {
        if let Some(ear) = ear {
            self.min_ear = Some(self.min_ear.map_or(ear, |min| min.min(ear)));
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            stopped_at: Utc::now(),
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
            alerts_triggered: self.alerts.fire_count(),
            alert_episodes: self.alerts.state().rising_edges,
            min_ear: self.min_ear,
        }
    }
}

/// Drives detection sessions against external collaborators
pub struct SessionController {
    source: Box<dyn VideoSource>,
    extractor: Box<dyn LandmarkExtractor>,
    audio: Box<dyn AudioBackend>,
    options: ControllerOptions,
    active: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(
        source: Box<dyn VideoSource>,
        extractor: Box<dyn LandmarkExtractor>,
        audio: Box<dyn AudioBackend>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            source,
            extractor,
            audio,
            options,
            active: None,
        }
    }

    /// Start a session: validate config, open the camera, load the cue
    ///
    /// If loading the cue fails the already-opened stream is dropped, so no
    /// resource outlives a failed start.
    pub fn start(&mut self, config: SessionConfig) -> Result<Uuid, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive);
        }

        config
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        let stream = self.source.open(&self.options.camera).map_err(|e| {
            error!("Failed to open video source: {}", e);
            SessionError::ResourceUnavailable(e.to_string())
        })?;

        let alerts = AlertManager::load(self.audio.as_ref(), &self.options.alert).map_err(|e| {
            error!("Failed to load alert sound: {}", e);
            SessionError::ResourceUnavailable(e.to_string())
        })?;

        let id = Uuid::new_v4();
        info!(
            "[{}] Detection started (EAR < {} for {} frames)",
            id, config.ear_threshold, config.consecutive_frame_threshold
        );

        self.active = Some(ActiveSession {
            id,
            started_at: Utc::now(),
            config,
            stream,
            alerts,
            monitor: DrowsinessMonitor::new(),
            frames_processed: 0,
            frames_skipped: 0,
            min_ear: None,
            cue_failing: false,
        });

        Ok(id)
    }

    /// Process one frame
    ///
    /// Blocks at most for the configured read timeout. End of stream stops
    /// the session; a failed read or malformed landmark set stops it and
    /// returns the error.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        let timeout = self.options.camera.read_timeout();
        let session = self.active.as_mut().ok_or(SessionError::NotActive)?;

        let frame = match session.stream.read_frame(timeout) {
            Ok(ReadOutcome::Frame(frame)) => frame,
            Ok(ReadOutcome::Pending) => return Ok(TickOutcome::Skipped(SkipReason::NoFrame)),
            Ok(ReadOutcome::EndOfStream) => {
                info!("[{}] Video source exhausted", session.id);
                return Ok(self
                    .stop()
                    .map_or(TickOutcome::Skipped(SkipReason::NoFrame), TickOutcome::Ended));
            }
            Err(e) => {
                error!("[{}] Frame read failed: {}", session.id, e);
                self.stop();
                return Err(SessionError::Capture(e));
            }
        };

        let sequence = frame.sequence;
        let mut frame = match self.options.camera.resize_width {
            Some(width) => match frame.resize_to_width(width) {
                Ok(resized) => resized,
                Err(e) => {
                    let err = DmsError::ImageProcessing(e.to_string());
                    return Ok(session.skip(sequence, &err));
                }
            },
            None => frame,
        };

        let timestamp_ns = frame.timestamp_ns;
        let evaluated = first_face_landmarks(self.extractor.as_mut(), &frame)
            .and_then(|face| FrameObservation::from_face(face.as_ref(), sequence, timestamp_ns))
            .and_then(|observation| {
                let verdict = session.monitor.process_frame(&observation, &session.config)?;
                Ok((observation, verdict))
            });

        let (observation, verdict) = match evaluated {
            Ok(evaluated) => evaluated,
            Err(e) if e.is_frame_recoverable() => return Ok(session.skip(sequence, &e)),
            Err(e) => {
                error!("[{}] Landmark contract violated at frame {}: {}", session.id, sequence, e);
                self.stop();
                return Err(SessionError::InvalidInput(e.to_string()));
            }
        };

        session.frames_processed += 1;
        session.record_ear(verdict.ear);
        metrics::counter!("dms_frames_processed_total").increment(1);

        match verdict.ear {
            Some(ear) => debug!(
                "[{}] frame {} EAR {:.3} ({})",
                session.id,
                sequence,
                ear,
                verdict.phase.as_str()
            ),
            None => debug!("[{}] frame {} no face", session.id, sequence),
        }

        let alert_started = match session.alerts.on_verdict(verdict.alert) {
            Ok(started) => {
                session.cue_failing = false;
                started
            }
            Err(e) => {
                // Warn once per failing run; the cue is retried every alerting frame
                if session.cue_failing {
                    debug!("[{}] Alert cue still failing: {}", session.id, e);
                } else {
                    warn!("[{}] Alert cue failed: {}", session.id, e);
                }
                session.cue_failing = true;
                false
            }
        };
        if alert_started {
            metrics::counter!("dms_alerts_triggered_total").increment(1);
        }

        let overlay = Overlay::new(&observation, &verdict);
        let frame = if self.options.annotate_frames {
            if let Err(e) = overlay.draw(&mut frame) {
                warn!("[{}] Overlay not drawn: {}", session.id, e);
            }
            Some(frame)
        } else {
            None
        };

        Ok(TickOutcome::Processed(FrameReport {
            session_id: session.id,
            sequence,
            timestamp_ns: observation.timestamp_ns,
            verdict,
            overlay,
            alert_started,
            frame,
        }))
    }

    /// Stop the session and release its resources
    ///
    /// Returns `None` if no session was active.
    pub fn stop(&mut self) -> Option<SessionSummary> {
        let mut session = self.active.take()?;
        session.alerts.silence();
        let summary = session.summary();
        drop(session);

        info!(
            "[{}] Detection stopped: {} frames, {} skipped, {} alerts",
            summary.session_id,
            summary.frames_processed,
            summary.frames_skipped,
            summary.alerts_triggered
        );
        Some(summary)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_active() {
            SessionStatus::Detecting
        } else {
            SessionStatus::NotDetecting
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|s| s.id)
    }

    /// Monitor state of the running session
    pub fn monitor_state(&self) -> Option<&MonitorState> {
        self.active.as_ref().map(|s| s.monitor.state())
    }
}
