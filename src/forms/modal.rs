//! Modal lifecycle
//!
//! A modal is `Open` until it is asked to close, then `Closing` until its
//! close delay has elapsed, then `Closed`. The delay is checked on `tick`, so
//! a modal that is dropped while closing simply never fires.

use std::time::{Duration, Instant};

/// Default close animation length
pub const CLOSE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Open,
    Closing { deadline: Instant },
    Closed,
}

/// Notifications for whoever hosts the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
    Created,
    Updated,
    Deleted,
    Closed,
}

#[derive(Debug)]
pub struct Modal {
    state: ModalState,
    close_delay: Duration,
    events: Vec<ModalEvent>,
}

impl Default for Modal {
    fn default() -> Self {
        Self::new()
    }
}

impl Modal {
    pub fn new() -> Self {
        Self::with_delay(CLOSE_DELAY)
    }

    pub fn with_delay(close_delay: Duration) -> Self {
        Self {
            state: ModalState::Open,
            close_delay,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ModalState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == ModalState::Closed
    }

    /// Start closing; ignored unless open
    pub fn close(&mut self, now: Instant) {
        if self.state == ModalState::Open {
            self.state = ModalState::Closing {
                deadline: now + self.close_delay,
            };
        }
    }

    /// Report a completed action, then start closing
    pub fn complete(&mut self, event: ModalEvent, now: Instant) {
        if self.state == ModalState::Open {
            self.events.push(event);
        }
        self.close(now);
    }

    /// Finish a pending close once its deadline has passed. Returns true on
    /// the tick that closed the modal.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            ModalState::Closing { deadline } if now >= deadline => {
                self.state = ModalState::Closed;
                self.events.push(ModalEvent::Closed);
                true
            }
            _ => false,
        }
    }

    /// Events emitted since the last call, oldest first
    pub fn take_events(&mut self) -> Vec<ModalEvent> {
        std::mem::take(&mut self.events)
    }
}
