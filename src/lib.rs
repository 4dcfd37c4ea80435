//! # mesh-balance
//!
//! mesh-balance is a deterministic weighted cell-redistribution scheduler for
//! distributed mesh workflows. Given N cooperating ranks, each holding some
//! number of mesh cells, it computes a pairwise transfer plan (who sends how
//! many cells to whom) so that every rank ends up with a weighted-proportional
//! share of the total, while keeping the number of distinct point-to-point
//! transfers small.
//!
//! ## Features
//! - Centralized planning on a root rank with fan-out of per-rank
//!   [`Schedule`](balance::Schedule) slices
//! - Exact integer leftover accounting: no cell is ever dropped to rounding
//! - Pluggable communication backends (serial, in-process, MPI) behind the
//!   [`Communicator`](algs::communicator::Communicator) trait
//! - Fixed little-endian wire types separating narrow rank ids from 64-bit
//!   cell counts
//!
//! ## Determinism
//!
//! Planning is a pure function of the gathered counts and weights: the donor
//! ordering uses a stable sort with rank-id tie-breaking, so the same census
//! always yields the same plan. Tests fix RNG seeds explicitly.
//!
//! ## Usage
//!
//! Every rank calls [`balance::plan_redistribution`] with its local cell
//! count; the call returns that rank's own slice of the plan. Executing the
//! transfers (moving actual cell payloads) is left to the caller, which
//! already owns the cell data and a communicator.
//!
//! ```toml
//! [dependencies]
//! mesh-balance = "0.3"
//! # Optional: features = ["mpi-support"]
//! ```

pub mod algs;
pub mod balance;
pub mod balance_error;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::balance::{
        plan_redistribution, plan_redistribution_with_tags, plan_transfers, BalanceCommTags,
        GoalTable, Planner, Schedule, WeightTable,
    };
    pub use crate::balance_error::BalanceError;
}
