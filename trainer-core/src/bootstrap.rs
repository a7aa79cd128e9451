//! # Engine Bootstrap
//!
//! Sound engines usually need a one-time start-up step (opening a device,
//! resuming an audio context) before they accept notes. [`Bootstrap`] runs that
//! step on a dedicated thread and reports the outcome over a channel, so the
//! event loop can keep polling without blocking.
//!
//! A bootstrap cannot be cancelled. Dropping the handle detaches the worker,
//! which still runs to completion.

use crossbeam_channel::{Receiver, TryRecvError};
use std::thread;

/// Progress of a bootstrap as seen from the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootStatus {
    Pending,
    Ready,
    Failed(String),
}

/// Handle to an engine start-up task running on its own thread.
#[derive(Debug)]
pub struct Bootstrap {
    receiver: Receiver<Result<(), String>>,
    outcome: Option<BootStatus>,
}

impl Bootstrap {
    /// Spawns `init` on a worker thread.
    pub fn spawn<F>(init: F) -> Self
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            eprintln!("[BOOT] Starting synthesis engine...");
            let result = init();
            match &result {
                Ok(()) => eprintln!("[BOOT] Synthesis engine started"),
                Err(e) => eprintln!("[BOOT] Synthesis engine failed to start: {}", e),
            }
            // The receiver may already be gone; the result is then unused.
            let _ = sender.send(result);
        });
        Self {
            receiver,
            outcome: None,
        }
    }

    /// A bootstrap that has already finished successfully.
    pub fn ready() -> Self {
        let (_, receiver) = crossbeam_channel::bounded(1);
        Self {
            receiver,
            outcome: Some(BootStatus::Ready),
        }
    }

    /// Checks for the outcome without blocking. Once finished, the outcome
    /// is remembered.
    pub fn poll(&mut self) -> BootStatus {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        match self.receiver.try_recv() {
            Ok(result) => self.finish(result),
            Err(TryRecvError::Empty) => BootStatus::Pending,
            Err(TryRecvError::Disconnected) => {
                self.finish(Err("bootstrap worker exited without reporting".to_string()))
            }
        }
    }

    /// Blocks until the bootstrap finishes.
    pub fn wait(&mut self) -> BootStatus {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let result = self
            .receiver
            .recv()
            .unwrap_or_else(|_| Err("bootstrap worker exited without reporting".to_string()));
        self.finish(result)
    }

    fn finish(&mut self, result: Result<(), String>) -> BootStatus {
        let status = match result {
            Ok(()) => BootStatus::Ready,
            Err(reason) => BootStatus::Failed(reason),
        };
        self.outcome = Some(status.clone());
        status
    }
}
