//! # Sale Status State Machine
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                 ┌──── Complete ────►  completed ─── Return ──┐          │
//! │                 │                                             │          │
//! │   ●──► active ──┤                                             ▼          │
//! │          ▲      │                                         returned       │
//! │          │      └──── Cancel ──────►  canceled               │          │
//! │          │                               │                    │          │
//! │          └────────── Activate ───────────┴────────────────────┘          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Operation | Legal source state(s)   | Resulting state |
//! |-----------|-------------------------|-----------------|
//! | Cancel    | `active`                | `canceled`      |
//! | Complete  | `active`                | `completed`     |
//! | Return    | `completed`             | `returned`      |
//! | Activate  | `canceled`, `returned`  | `active`        |
//!
//! The table is exhaustive: there is no way to set a status directly.
//! An illegal request is reported as [`StoreError::InvalidTransition`]
//! (kind `InvalidData`) and leaves the sale untouched.

use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::types::{Sale, SaleStatus};

/// A named lifecycle operation on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaleTransition {
    Cancel,
    Complete,
    Return,
    Activate,
}

impl SaleTransition {
    pub const ALL: [SaleTransition; 4] = [
        SaleTransition::Cancel,
        SaleTransition::Complete,
        SaleTransition::Return,
        SaleTransition::Activate,
    ];

    /// States this operation may start from.
    pub const fn legal_sources(self) -> &'static [SaleStatus] {
        match self {
            SaleTransition::Cancel | SaleTransition::Complete => &[SaleStatus::Active],
            SaleTransition::Return => &[SaleStatus::Completed],
            SaleTransition::Activate => &[SaleStatus::Canceled, SaleStatus::Returned],
        }
    }

    /// State the sale ends up in.
    pub const fn target(self) -> SaleStatus {
        match self {
            SaleTransition::Cancel => SaleStatus::Canceled,
            SaleTransition::Complete => SaleStatus::Completed,
            SaleTransition::Return => SaleStatus::Returned,
            SaleTransition::Activate => SaleStatus::Active,
        }
    }

    /// Message used when the current state is not a legal source.
    pub const fn rejection(self) -> &'static str {
        match self {
            SaleTransition::Cancel => "only active sales can be canceled",
            SaleTransition::Complete => "only active sales can be completed",
            SaleTransition::Return => "only completed sales can be returned",
            SaleTransition::Activate => "only canceled or returned sales can be activated",
        }
    }

    pub fn allows(self, from: SaleStatus) -> bool {
        self.legal_sources().contains(&from)
    }
}

impl fmt::Display for SaleTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaleTransition::Cancel => "cancel",
            SaleTransition::Complete => "complete",
            SaleTransition::Return => "return",
            SaleTransition::Activate => "activate",
        };
        f.write_str(s)
    }
}

impl Sale {
    /// Applies `transition` in memory.
    ///
    /// Nothing is persisted here; callers follow up with the optimistic
    /// update so the new status and the version bump land together.
    pub fn transition(&mut self, transition: SaleTransition) -> StoreResult<()> {
        if !transition.allows(self.status) {
            return Err(StoreError::InvalidTransition {
                sale_id: self.id,
                status: self.status,
                message: transition.rejection(),
            });
        }
        self.status = transition.target();
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
