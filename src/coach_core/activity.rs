//! In-flight call tracking.
//!
//! At most one conversational call and one synthesis call may be outstanding
//! per coordinator. Each kind has an atomic flag; [`ActivityHandle::try_begin`]
//! claims it and hands back a [`CallPermit`] that releases the flag on drop,
//! including when the awaiting future is dropped mid-call.
//!
//! The handle is cheap to clone so a surface can poll `is_busy` to disable
//! its send/submit affordances without locking the coordinator.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::CoachError;

/// The two kinds of generation call the coordinator makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Converse,
    Synthesis,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Converse => f.write_str("converse"),
            CallKind::Synthesis => f.write_str("synthesis"),
        }
    }
}

/// Shared view of which calls are in flight.
#[derive(Debug, Clone, Default)]
pub struct ActivityHandle {
    converse: Arc<AtomicBool>,
    synthesis: Arc<AtomicBool>,
}

impl ActivityHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, kind: CallKind) -> &Arc<AtomicBool> {
        match kind {
            CallKind::Converse => &self.converse,
            CallKind::Synthesis => &self.synthesis,
        }
    }

    /// Whether a call of `kind` is outstanding.
    pub fn is_busy(&self, kind: CallKind) -> bool {
        self.flag(kind).load(Ordering::Acquire)
    }

    /// Claim the slot for `kind`, or fail with [`CoachError::Busy`].
    pub fn try_begin(&self, kind: CallKind) -> Result<CallPermit, CoachError> {
        let flag = self.flag(kind);
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoachError::Busy { operation: kind });
        }
        Ok(CallPermit {
            flag: Arc::clone(flag),
        })
    }
}

/// Proof that a call slot is held. Releases it on drop.
#[derive(Debug)]
pub struct CallPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
