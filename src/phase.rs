//! # Phase
//!
//! A named execution stage with an integer ordering key. The engine drains
//! phases in ascending `order`; phases that share an `order` form a single
//! bucket and run concurrently.

use std::cmp::Ordering;
use std::fmt;

/// A named stage in a processing lifecycle.
///
/// Two phases compare equal for *ordering* purposes whenever their `order`
/// matches (they belong to the same bucket), but remain distinguishable by
/// `(name, order)` for registration bookkeeping — see `Eq`/`Hash` below.
#[derive(Debug, Clone)]
pub struct Phase {
    name: String,
    order: i32,
}

impl Phase {
    /// Pre-invocation validation and setup.
    pub const PRE_INVOCATION: i32 = -1000;
    /// The primary invocation of the unit of work.
    pub const INVOCATION: i32 = 0;
    /// Bookkeeping that must run after invocation but before commit.
    pub const POST_INVOCATION: i32 = 1000;
    /// Last chance to stage state before the commit phase.
    pub const PREPARE_COMMIT: i32 = 10_000;
    /// The durable commit itself.
    pub const COMMIT: i32 = 20_000;
    /// Side effects that are only meaningful once commit has succeeded.
    pub const AFTER_COMMIT: i32 = 30_000;

    /// Construct a new phase with an application-chosen name and order.
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }

    /// The default six-phase table, in ascending order.
    pub fn pre_invocation() -> Self {
        Self::new("PRE_INVOCATION", Self::PRE_INVOCATION)
    }

    /// The default invocation phase.
    pub fn invocation() -> Self {
        Self::new("INVOCATION", Self::INVOCATION)
    }

    /// The default post-invocation phase.
    pub fn post_invocation() -> Self {
        Self::new("POST_INVOCATION", Self::POST_INVOCATION)
    }

    /// The default prepare-commit phase.
    pub fn prepare_commit() -> Self {
        Self::new("PREPARE_COMMIT", Self::PREPARE_COMMIT)
    }

    /// The default commit phase.
    pub fn commit() -> Self {
        Self::new("COMMIT", Self::COMMIT)
    }

    /// The default after-commit phase.
    pub fn after_commit() -> Self {
        Self::new("AFTER_COMMIT", Self::AFTER_COMMIT)
    }

    /// The phase's application-chosen name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The phase's ordering key. Only this field drives scheduling.
    pub fn order(&self) -> i32 {
        self.order
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.order)
    }
}

/// `Phase` is value-comparable by `order` for sorting.
impl PartialOrd for Phase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Phase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.cmp(&other.order)
    }
}

/// `Phase` is value-comparable by `(name, order)` for registration equality.
impl PartialEq for Phase {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.name == other.name
    }
}

impl Eq for Phase {}

impl std::hash::Hash for Phase {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.order.hash(state);
        self.name.hash(state);
    }
}

/// The default phase table, stable across implementations.
///
/// Applications may register handlers at any additional integer order; the
/// engine does not interpret phase names, only `order`.
#[derive(Debug, Clone)]
pub struct PhaseTable {
    phases: Vec<Phase>,
}

impl PhaseTable {
    /// The standard six-phase table used by default.
    pub fn standard() -> Self {
        Self {
            phases: vec![
                Phase::pre_invocation(),
                Phase::invocation(),
                Phase::post_invocation(),
                Phase::prepare_commit(),
                Phase::commit(),
                Phase::after_commit(),
            ],
        }
    }

    /// The phases in ascending order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Append an application-defined phase, keeping the table sorted.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self.phases.sort();
        self
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::standard()
    }
}
