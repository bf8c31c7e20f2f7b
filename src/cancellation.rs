//! Cooperative cancellation shared by every task of a run.
//!
//! A [`CancellationToken`] is a cheap, cloneable handle over an atomic
//! flag. Workers poll it at natural checkpoints (before building a
//! compilation, before and between rules, before each formatted file);
//! nothing is forcibly aborted. A token may carry a deadline, after which
//! it reports itself cancelled with the reason `"timeout"`.
//!
//! Child tokens observe their parent but can be cancelled on their own,
//! which lets the analyzer runner stop its own fan-out without cancelling
//! the rest of the run.

use crate::errors::{Result, WsfmtError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct TokenState {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    reason: Mutex<Option<String>>,
}

impl TokenState {
    fn new(deadline: Option<Instant>) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            deadline,
            reason: Mutex::new(None),
        }
    }

    fn cancel(&self, reason: &str) {
        {
            let mut slot = self.reason.lock();
            if slot.is_none() {
                *slot = Some(reason.to_string());
            }
        }
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel("timeout");
                true
            }
            _ => false,
        }
    }
}

/// Atomic cancellation signal with optional deadline.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<TokenState>,
    parent: Option<Box<CancellationToken>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(TokenState::new(None)),
            parent: None,
        }
    }

    /// Token that cancels itself once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: Arc::new(TokenState::new(Some(Instant::now() + timeout))),
            parent: None,
        }
    }

    /// Child token: cancelled when this token is, or when cancelled directly.
    pub fn child_token(&self) -> Self {
        Self {
            state: Arc::new(TokenState::new(None)),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Child token with its own deadline.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        Self {
            state: Arc::new(TokenState::new(Some(Instant::now() + timeout))),
            parent: Some(Box::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.state.cancel("requested");
    }

    pub fn cancel_with_reason(&self, reason: &str) {
        self.state.cancel(reason);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_cancelled())
    }

    /// Checkpoint: `Err(Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(WsfmtError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Why this token (or the nearest cancelled ancestor) was cancelled.
    pub fn reason(&self) -> Option<String> {
        if self.state.is_cancelled() {
            return self.state.reason.lock().clone();
        }
        self.parent.as_ref().and_then(|parent| parent.reason())
    }
}
