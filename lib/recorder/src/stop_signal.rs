//! One-shot stop signal shared between the controller and its worker.
//!
//! Stopping drops the only sender, so every receiver observes a disconnected
//! channel, including ones blocked in [`StopSignal::wait_timeout`].

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::time::Duration;

pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (sender, receiver) = bounded(0);
    (
        StopHandle {
            sender: Some(sender),
        },
        StopSignal { receiver },
    )
}

#[derive(Debug)]
pub struct StopHandle {
    sender: Option<Sender<()>>,
}

impl StopHandle {
    /// Idempotent.
    pub fn stop(&mut self) {
        if self.sender.take().is_some() {
            log::debug!("stop signal raised");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct StopSignal {
    receiver: Receiver<()>,
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleeps for up to `timeout`. Returns `true` if stop was raised meanwhile.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(_) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
