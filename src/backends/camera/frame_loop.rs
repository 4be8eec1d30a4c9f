// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle for frame producers and the analysis worker
//!
//! Two pieces live here:
//!
//! - [`CaptureLoopController`] drives a producer closure on its own thread
//!   until it asks to stop or the controller is stopped.
//! - [`AnalysisExecutor`] owns the single analysis thread. Producers hand it
//!   frames through a [`FrameSubmitter`]; only the newest unprocessed frame is
//!   kept, and any frame it replaces is released immediately.

use super::types::PixelFrame;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a capture loop running in a separate thread
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Start a new capture loop in a separate thread
    ///
    /// The closure is called repeatedly until it returns `LoopAction::Stop`
    /// or [`stop`](Self::stop) is called.
    pub fn start<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                if loop_fn() == LoopAction::Stop {
                    debug!(name = %thread_name, "Loop requested stop");
                    break;
                }
            }
            debug!(name = %thread_name, "Capture loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for a loop that stops itself
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[derive(Default)]
struct Slot {
    pending: Option<PixelFrame>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cloneable handle producers use to feed the analysis thread
#[derive(Clone)]
pub struct FrameSubmitter {
    shared: Arc<Shared>,
}

impl FrameSubmitter {
    /// Queue a frame, replacing (and releasing) any frame not yet analyzed
    ///
    /// Returns false if the executor has shut down; the frame is released.
    pub fn submit(&self, frame: PixelFrame) -> bool {
        let replaced = {
            let mut slot = self.shared.lock();
            if slot.shutdown {
                drop(slot);
                frame.release();
                return false;
            }
            slot.pending.replace(frame)
        };
        self.shared.ready.notify_one();

        if let Some(stale) = replaced {
            trace!(
                width = stale.width,
                height = stale.height,
                "Dropping unanalyzed frame"
            );
            stale.release();
        }
        true
    }
}

/// Single worker thread that runs analysis on the newest submitted frame
pub struct AnalysisExecutor {
    shared: Arc<Shared>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisExecutor {
    /// Spawn the analysis thread; `handler` receives ownership of each frame
    pub fn spawn<F>(mut handler: F) -> Self
    where
        F: FnMut(PixelFrame) + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let worker = Arc::clone(&shared);

        let thread_handle = thread::spawn(move || {
            debug!("Analysis thread started");
            loop {
                let frame = {
                    let mut slot = worker.lock();
                    loop {
                        if slot.shutdown {
                            break None;
                        }
                        if let Some(frame) = slot.pending.take() {
                            break Some(frame);
                        }
                        slot = worker
                            .ready
                            .wait(slot)
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                    }
                };
                let Some(frame) = frame else {
                    break;
                };
                // The frame is released during unwinding; keep serving later frames
                if panic::catch_unwind(AssertUnwindSafe(|| handler(frame))).is_err() {
                    warn!("Frame analysis panicked");
                }
            }
            debug!("Analysis thread exiting");
        });

        Self {
            shared,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn submitter(&self) -> FrameSubmitter {
        FrameSubmitter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stop the thread, wait for it, and release any frame still queued
    pub fn shutdown(&mut self) {
        let leftover = {
            let mut slot = self.shared.lock();
            slot.shutdown = true;
            slot.pending.take()
        };
        self.shared.ready.notify_all();

        if let Some(frame) = leftover {
            frame.release();
        }
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!("Analysis thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for AnalysisExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
