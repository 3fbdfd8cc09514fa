//! Asynchronous-assert, synchronous-release reset synchronizer.
//!
//! The synchronizer is a chain of flip-flops with an asynchronous preset. It provides:
//! 1. **Immediate assertion:** Whenever the source condition is high every stage is preset,
//!    so the domain reset rises without waiting for a clock edge.
//! 2. **Synchronous release:** Once the condition is low, a zero is shifted in on each
//!    target edge; the reset falls only when it reaches the last stage.
//! 3. **State view:** `Asserted`, `Releasing { pending }` or `Released`.

use std::fmt;

use serde::Serialize;

/// Observable state of a domain reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ResetState {
    /// The source condition is high; the domain is held in reset.
    Asserted,
    /// The condition is low and the release is propagating.
    Releasing {
        /// Target edges still needed before the reset falls.
        pending: u8,
    },
    /// The domain reset is low.
    Released,
}

impl fmt::Display for ResetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asserted => write!(f, "ASSERTED"),
            Self::Releasing { pending } => write!(f, "RELEASING({pending})"),
            Self::Released => write!(f, "RELEASED"),
        }
    }
}

/// Flip-flop chain behind a domain reset.
#[derive(Clone, Debug)]
pub struct ResetSynchronizer {
    /// Stage 0 samples the release; the last stage drives the domain reset.
    stages: Vec<bool>,
    condition: bool,
}

impl ResetSynchronizer {
    /// Creates a synchronizer with `stages` flip-flops, all preset.
    pub fn new(stages: u8) -> Self {
        Self {
            stages: vec![true; usize::from(stages.max(1))],
            condition: true,
        }
    }

    /// Applies the asynchronous source condition.
    ///
    /// A high condition presets every stage immediately.
    pub fn set_condition(&mut self, condition: bool) {
        self.condition = condition;
        if condition {
            self.stages.fill(true);
        }
    }

    /// Advances the chain on a target-domain edge.
    pub fn clock_edge(&mut self) {
        if self.condition {
            self.stages.fill(true);
            return;
        }
        self.stages.rotate_right(1);
        self.stages[0] = false;
    }

    /// Current domain reset level.
    pub fn output(&self) -> bool {
        self.stages.last().copied().unwrap_or(true)
    }

    /// Number of stages.
    pub fn depth(&self) -> u8 {
        self.stages.len() as u8
    }

    /// Current state of the release sequence.
    pub fn state(&self) -> ResetState {
        if self.condition {
            return ResetState::Asserted;
        }
        let released = self.stages.iter().take_while(|s| !**s).count();
        if released >= self.stages.len() {
            ResetState::Released
        } else {
            ResetState::Releasing {
                pending: (self.stages.len() - released) as u8,
            }
        }
    }
}
