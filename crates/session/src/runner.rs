//! Cooperative capture loop
//!
//! Runs `tick()` on a dedicated thread at a fixed cadence and forwards
//! reports to async consumers. Stopping is cooperative: the stop flag is
//! checked before each tick, and an in-flight frame read is never
//! interrupted, so a stop takes effect within one read timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::controller::{FrameReport, SessionController, SessionSummary, TickOutcome};
use crate::SessionError;

/// Controller shared between the capture thread and its owner
pub type SharedController = Arc<Mutex<SessionController>>;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Target spacing between ticks
    pub tick_interval: Duration,
    /// Reports buffered before new ones are dropped
    pub channel_capacity: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            channel_capacity: 64,
        }
    }
}

/// Events published by the capture loop
#[derive(Debug)]
pub enum RunnerEvent {
    Frame(FrameReport),
    /// Source exhausted; the session has been stopped
    Ended(SessionSummary),
    /// Session-fatal error; the session has been stopped
    Failed(String),
}

/// Cloneable stop request handle, e.g. for a UI thread
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capture loop for an already-started session
pub struct SessionRunner {
    receiver: mpsc::Receiver<RunnerEvent>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    controller: SharedController,
}

impl SessionRunner {
    /// Spawn the capture thread. The controller must have an active session.
    pub fn spawn(
        controller: SharedController,
        options: RunnerOptions,
    ) -> Result<Self, SessionError> {
        let active = controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_active();
        if !active {
            return Err(SessionError::NotActive);
        }

        let (tx, rx) = mpsc::channel::<RunnerEvent>(options.channel_capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let loop_controller = controller.clone();

        let handle = std::thread::Builder::new()
            .name("dms-capture".into())
            .spawn(move || {
                capture_loop(loop_controller, tx, shutdown_clone, options.tick_interval)
            })
            .map_err(|e| SessionError::ResourceUnavailable(format!("capture thread: {}", e)))?;

        Ok(Self {
            receiver: rx,
            shutdown,
            handle: Some(handle),
            controller,
        })
    }

    /// Receive the next event; `None` once the loop has exited
    pub async fn next(&mut self) -> Option<RunnerEvent> {
        self.receiver.recv().await
    }

    /// Handle for requesting a stop from elsewhere
    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(self.shutdown.clone())
    }

    /// Stop the loop, wait for it to exit, and stop the session
    ///
    /// Returns `None` if the session had already ended on its own.
    pub fn stop(mut self) -> Option<SessionSummary> {
        info!("Stopping capture loop");
        self.halt();
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop()
    }

    fn halt(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Unblocks a loop waiting to hand over a terminal event
        self.receiver.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Capture thread panicked");
            }
        }
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.halt();
        }
    }
}

fn capture_loop(
    controller: SharedController,
    tx: mpsc::Sender<RunnerEvent>,
    shutdown: Arc<AtomicBool>,
    interval: Duration,
) {
    debug!("Capture loop started ({:?} cadence)", interval);

    while !shutdown.load(Ordering::SeqCst) {
        let tick_start = Instant::now();
        let outcome = controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick();

        match outcome {
            Ok(TickOutcome::Processed(report)) => {
                if tx.try_send(RunnerEvent::Frame(report)).is_err() {
                    debug!("Report consumer lagging, frame report dropped");
                }
            }
            Ok(TickOutcome::Skipped(_)) => {}
            Ok(TickOutcome::Ended(summary)) => {
                let _ = tx.blocking_send(RunnerEvent::Ended(summary));
                break;
            }
            Err(SessionError::NotActive) => break,
            Err(e) => {
                error!("Capture loop aborted: {}", e);
                let _ = tx.blocking_send(RunnerEvent::Failed(e.to_string()));
                break;
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    debug!("Capture loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{controller, RecordingAudio, ScriptedExtractor};
    use camera_capture::ReplaySource;
    use dms::SessionConfig;

    fn shared(
        source: &ReplaySource,
        ears: Vec<Option<f32>>,
        audio: &RecordingAudio,
    ) -> SharedController {
        let mut controller = controller(source, ScriptedExtractor::new(ears), audio);
        controller
            .start(SessionConfig {
                ear_threshold: 0.22,
                consecutive_frame_threshold: 3,
            })
            .unwrap();
        Arc::new(Mutex::new(controller))
    }

    fn fast() -> RunnerOptions {
        RunnerOptions {
            tick_interval: Duration::from_millis(1),
            channel_capacity: 256,
        }
    }

    #[tokio::test]
    async fn test_runs_until_end_of_stream() {
        let source = ReplaySource::blank(5, 32, 24);
        let audio = RecordingAudio::default();
        let ears = vec![Some(0.25), Some(0.20), Some(0.19), Some(0.18), Some(0.30)];
        let controller = shared(&source, ears, &audio);

        let mut runner = SessionRunner::spawn(controller.clone(), fast()).unwrap();

        let mut alerts = Vec::new();
        let summary = loop {
            let event = tokio::time::timeout(Duration::from_secs(5), runner.next())
                .await
                .expect("runner stalled")
                .expect("channel closed early");
            match event {
                RunnerEvent::Frame(report) => alerts.push(report.verdict.alert),
                RunnerEvent::Ended(summary) => break summary,
                RunnerEvent::Failed(e) => panic!("session failed: {}", e),
            }
        };

        assert_eq!(alerts, vec![false, false, false, true, false]);
        assert_eq!(summary.frames_processed, 5);
        assert!(runner.next().await.is_none());
        assert!(runner.stop().is_none());
        assert!(!controller.lock().unwrap().is_active());
        assert_eq!(source.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_stop_cancels_running_session() {
        let source = ReplaySource::blank(10_000, 8, 8);
        let audio = RecordingAudio::default();
        let controller = shared(&source, vec![Some(0.3); 10_000], &audio);

        let mut runner = SessionRunner::spawn(
            controller.clone(),
            RunnerOptions {
                tick_interval: Duration::from_millis(5),
                channel_capacity: 4,
            },
        )
        .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), runner.next())
            .await
            .expect("runner stalled");
        assert!(matches!(first, Some(RunnerEvent::Frame(_))));

        let summary = runner.stop().expect("session was still running");
        assert!(summary.frames_processed >= 1);
        assert!(summary.frames_processed < 10_000);
        assert_eq!(source.open_streams(), 0);
        assert!(!controller.lock().unwrap().is_active());
    }

    #[tokio::test]
    async fn test_stop_signal_ends_loop() {
        let source = ReplaySource::blank(10_000, 8, 8);
        let audio = RecordingAudio::default();
        let controller = shared(&source, vec![None; 10_000], &audio);

        let mut runner = SessionRunner::spawn(controller.clone(), fast()).unwrap();
        let signal = runner.stop_signal();
        assert!(!signal.is_stop_requested());

        std::thread::spawn(move || signal.request_stop()).join().unwrap();

        // Loop exits on its own; the channel drains and closes
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while runner.next().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());

        // Session is stopped by the owner, not the loop
        assert!(controller.lock().unwrap().is_active());
        assert!(runner.stop().is_some());
        assert_eq!(source.open_streams(), 0);
    }

    #[test]
    fn test_spawn_requires_active_session() {
        let source = ReplaySource::blank(1, 8, 8);
        let audio = RecordingAudio::default();
        let idle = controller(&source, ScriptedExtractor::new(vec![]), &audio);

        let result = SessionRunner::spawn(Arc::new(Mutex::new(idle)), RunnerOptions::default());
        assert!(matches!(result, Err(SessionError::NotActive)));
    }
}
