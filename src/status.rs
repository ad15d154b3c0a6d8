//! # Status
//!
//! The four-state lifecycle of a `ProcessingContext`, stored as an atomic
//! word so transitions can be attempted with compare-and-swap from any
//! thread. Modeled on the atomic state word `tasker_shared::resilience`'s
//! `CircuitBreaker` uses for its three-state machine, widened to four states
//! with a stricter, one-directional transition graph.

use std::sync::atomic::{AtomicU8, Ordering};

/// The lifecycle status of a `ProcessingContext`.
///
/// Transitions are monotonic: `NOT_STARTED -> STARTED -> COMPLETED_OK` or
/// `NOT_STARTED -> STARTED -> COMPLETED_ERROR`. Any other transition is
/// rejected by `AtomicStatus::transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    NotStarted = 0,
    Started = 1,
    CompletedOk = 2,
    CompletedError = 3,
}

impl Status {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Status::NotStarted,
            1 => Status::Started,
            2 => Status::CompletedOk,
            3 => Status::CompletedError,
            other => unreachable!("invalid Status discriminant {other}"),
        }
    }
}

/// An atomic cell holding a `Status`, with CAS-guarded transitions.
#[derive(Debug)]
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new() -> Self {
        Self(AtomicU8::new(Status::NotStarted as u8))
    }

    pub fn load(&self) -> Status {
        Status::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Attempt `NOT_STARTED -> STARTED`. Returns `true` iff this call won
    /// the race (i.e. this call is the one that started the lifecycle).
    pub fn try_start(&self) -> bool {
        self.0
            .compare_exchange(
                Status::NotStarted as u8,
                Status::Started as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Transition `STARTED -> COMPLETED_OK`. Only called by the driver that
    /// owns the drain loop, so no CAS race is expected; still implemented as
    /// a CAS to make the invariant explicit and catch programmer error.
    pub fn complete_ok(&self) {
        let prev = self.0.compare_exchange(
            Status::Started as u8,
            Status::CompletedOk as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        debug_assert!(prev.is_ok(), "complete_ok called outside STARTED");
    }

    /// Transition `STARTED -> COMPLETED_ERROR`.
    pub fn complete_error(&self) {
        let prev = self.0.compare_exchange(
            Status::Started as u8,
            Status::CompletedError as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        debug_assert!(prev.is_ok(), "complete_error called outside STARTED");
    }

    pub fn is_started(&self) -> bool {
        matches!(self.load(), Status::Started)
    }

    pub fn is_committed(&self) -> bool {
        !matches!(self.load(), Status::NotStarted)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.load(), Status::CompletedError)
    }

    pub fn is_completed_ok(&self) -> bool {
        matches!(self.load(), Status::CompletedOk)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.load(), Status::CompletedOk | Status::CompletedError)
    }
}

impl Default for AtomicStatus {
    fn default() -> Self {
        Self::new()
    }
}
