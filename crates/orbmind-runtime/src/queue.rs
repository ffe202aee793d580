//! Orb loop — single consumer of the synthesis queue
//!
//! Producers (the cursor ticker, the bridge, tests) push `OrbEvent`s into one
//! bounded mpsc channel. `OrbLoop` owns the `OrbController` and handles one
//! event at a time. Ticker-driven results are broadcast as `OrbOutput`;
//! submitted stimuli answer their caller through a oneshot reply.

use crate::cursor::{CursorSample, CursorTracker};
use orbmind_cognition::{OrbController, OrbStatus, Synthesis};
use orbmind_core::{Error, Result, Stimulus, StimulusKind};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Every event that can enter the orb queue.
#[derive(Debug)]
pub enum OrbEvent {
    /// Run one synthesis cycle. Without a reply the result is broadcast.
    Stimulus {
        stimulus: Stimulus,
        reply: Option<oneshot::Sender<Option<Synthesis>>>,
    },
    Status {
        reply: oneshot::Sender<OrbStatus>,
    },
    Purge {
        reply: oneshot::Sender<bool>,
    },
    Reset,
    Shutdown,
}

/// Events emitted to every subscriber.
#[derive(Debug, Clone)]
pub enum OrbOutput {
    Pulse {
        kind: StimulusKind,
        synthesis: Box<Synthesis>,
    },
    Rejected {
        kind: StimulusKind,
    },
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeStatus {
    pub running: bool,
    #[serde(flatten)]
    pub orb: OrbStatus,
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

pub struct OrbLoop {
    queue_rx: mpsc::Receiver<OrbEvent>,
    output_tx: broadcast::Sender<OrbOutput>,
    controller: OrbController,
    cancel: CancellationToken,
}

impl OrbLoop {
    /// Returns `(loop, queue_tx, output_tx)`.
    pub fn new(
        controller: OrbController,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Sender<OrbEvent>, broadcast::Sender<OrbOutput>) {
        let runtime = &controller.config().runtime;
        let (queue_tx, queue_rx) = mpsc::channel(runtime.queue_capacity.max(1));
        let (output_tx, _) = broadcast::channel(runtime.output_capacity.max(1));

        let orb_loop = Self {
            queue_rx,
            output_tx: output_tx.clone(),
            controller,
            cancel,
        };
        (orb_loop, queue_tx, output_tx)
    }

    /// Process events until Shutdown, cancellation, or queue close.
    /// Hands the controller back when done.
    pub async fn run(mut self) -> OrbController {
        info!("OrbLoop started");
        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("OrbLoop: cancelled");
                    break;
                }
                event = self.queue_rx.recv() => match event {
                    Some(e) => e,
                    None => {
                        info!("OrbLoop: queue closed, shutting down");
                        break;
                    }
                },
            };

            match event {
                OrbEvent::Stimulus { stimulus, reply } => {
                    let kind = stimulus.kind;
                    let result = self.controller.process_stimulus(&stimulus);
                    match reply {
                        Some(reply) => {
                            let _ = reply.send(result);
                        }
                        None => {
                            let output = match result {
                                Some(synthesis) => OrbOutput::Pulse {
                                    kind,
                                    synthesis: Box::new(synthesis),
                                },
                                None => OrbOutput::Rejected { kind },
                            };
                            let _ = self.output_tx.send(output);
                        }
                    }
                }

                OrbEvent::Status { reply } => {
                    let _ = reply.send(self.controller.status());
                }

                OrbEvent::Purge { reply } => {
                    let _ = reply.send(self.controller.emergency_purge());
                }

                OrbEvent::Reset => {
                    self.controller.reset();
                }

                OrbEvent::Shutdown => {
                    info!("OrbLoop: received Shutdown");
                    break;
                }
            }
        }
        let _ = self.output_tx.send(OrbOutput::Stopped);
        info!("OrbLoop stopped");
        self.controller
    }
}

// ---------------------------------------------------------------------------
// Cursor ticker
// ---------------------------------------------------------------------------

/// Submit the latest cursor sample every `period`, only when it changed.
fn spawn_cursor_ticker(
    mut cursor_rx: watch::Receiver<Option<CursorSample>>,
    queue_tx: mpsc::Sender<OrbEvent>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    match cursor_rx.has_changed() {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(_) => break,
                    }
                    let sample = *cursor_rx.borrow_and_update();
                    let Some(sample) = sample else { continue };
                    let event = OrbEvent::Stimulus {
                        stimulus: sample.to_stimulus(),
                        reply: None,
                    };
                    if queue_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Cursor ticker stopped");
    })
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Start/stop/status wrapper around a running `OrbLoop` plus its ticker.
pub struct OrbHandle {
    queue_tx: mpsc::Sender<OrbEvent>,
    output_tx: broadcast::Sender<OrbOutput>,
    cursor_tx: watch::Sender<Option<CursorSample>>,
    tracker: Mutex<CursorTracker>,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    loop_task: Option<JoinHandle<OrbController>>,
    ticker_task: Option<JoinHandle<()>>,
}

impl OrbHandle {
    /// Spawn the loop and the cursor ticker. Must be called inside a tokio runtime.
    pub fn start(controller: OrbController) -> Self {
        let runtime = controller.config().runtime.clone();
        let cancel = CancellationToken::new();
        let (orb_loop, queue_tx, output_tx) = OrbLoop::new(controller, cancel.clone());
        let (cursor_tx, cursor_rx) = watch::channel(None);

        let running = Arc::new(AtomicBool::new(true));
        let loop_running = running.clone();
        let loop_task = tokio::spawn(async move {
            let controller = orb_loop.run().await;
            loop_running.store(false, Ordering::SeqCst);
            controller
        });
        let ticker_task = spawn_cursor_ticker(
            cursor_rx,
            queue_tx.clone(),
            Duration::from_millis(runtime.tick_ms.max(1)),
            cancel.clone(),
        );
        info!("Orb started (tick {}ms)", runtime.tick_ms);

        Self {
            queue_tx,
            output_tx,
            cursor_tx,
            tracker: Mutex::new(CursorTracker::new(runtime.cursor_velocity_cap)),
            cancel,
            running,
            loop_task: Some(loop_task),
            ticker_task: Some(ticker_task),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrbOutput> {
        self.output_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Record a cursor position. The ticker picks it up on its next tick.
    pub fn update_cursor(&self, x: f64, y: f64) -> CursorSample {
        let sample = match self.tracker.lock() {
            Ok(mut tracker) => tracker.sample(x, y),
            Err(poisoned) => poisoned.into_inner().sample(x, y),
        };
        self.cursor_tx.send_replace(Some(sample));
        sample
    }

    /// Run one cycle for `stimulus` and wait for its result.
    pub async fn submit(&self, stimulus: Stimulus) -> Result<Option<Synthesis>> {
        let (reply, rx) = oneshot::channel();
        self.send(OrbEvent::Stimulus {
            stimulus,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| stopped())
    }

    pub async fn status(&self) -> Result<RuntimeStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(OrbEvent::Status { reply }).await?;
        let orb = rx.await.map_err(|_| stopped())?;
        Ok(RuntimeStatus {
            running: self.is_running(),
            orb,
        })
    }

    pub async fn purge(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(OrbEvent::Purge { reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(OrbEvent::Reset).await
    }

    /// Stop the ticker and the loop. Returns the controller on a clean stop.
    pub async fn stop(&mut self) -> Option<OrbController> {
        if self.queue_tx.send(OrbEvent::Shutdown).await.is_err() {
            warn!("Orb loop already gone");
        }
        self.cancel.cancel();

        if let Some(ticker) = self.ticker_task.take() {
            let _ = ticker.await;
        }
        let controller = match self.loop_task.take() {
            Some(task) => task.await.ok(),
            None => None,
        };
        self.running.store(false, Ordering::SeqCst);
        info!("Orb stopped");
        controller
    }

    async fn send(&self, event: OrbEvent) -> Result<()> {
        self.queue_tx.send(event).await.map_err(|_| stopped())
    }
}

impl Drop for OrbHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn stopped() -> Error {
    Error::Internal("orb loop is not running".into())
}
