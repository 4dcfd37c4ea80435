//! Weighted cell-redistribution scheduling.
//!
//! Two-phase protocol: every rank reports its cell count to the root
//! ([`census`]), the root derives goals and runs the pairing walk
//! ([`goals`], [`planner`]), then each rank receives its own slice of the
//! plan ([`distribute`]). Executing the transfers is the caller's job; this
//! subsystem only deals in counts.

pub mod census;
pub mod distribute;
pub mod goals;
pub mod planner;
pub mod schedule;
pub mod weights;

#[cfg(test)]
mod tests;

pub use distribute::{
    distribute_schedules, plan_redistribution, plan_redistribution_with_tags, receive_schedule,
    BalanceCommTags,
};
pub use goals::GoalTable;
pub use planner::{plan_transfers, Planner};
pub use schedule::Schedule;
pub use weights::WeightTable;

use crate::algs::communicator::CommTag;

/// Rank that performs centralized planning.
pub const ROOT: usize = 0;

/// Base of the tag block reserved for redistribution planning epochs.
pub const DEFAULT_BALANCE_TAG: CommTag = CommTag::new(0xBA1A);
