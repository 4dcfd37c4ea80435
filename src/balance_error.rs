//! BalanceError: unified error type for mesh-balance public APIs
//!
//! Every fallible operation in this crate reports through this enum; nothing
//! panics on bad input or a misbehaving peer.

use thiserror::Error;

/// Boxed source for communication failures.
pub type CommSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for mesh-balance operations.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// The weight table does not cover exactly one weight per rank.
    #[error("weight table covers {expected} ranks but the communicator has {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },
    /// A weight entry was negative.
    #[error("weight for rank {rank} must be non-negative, got {value}")]
    NegativeWeight { rank: usize, value: f64 },
    /// A `set_weight` range fell outside the table.
    #[error("rank range {lo}..={hi} out of bounds for {n_ranks} ranks")]
    RankRangeOutOfBounds {
        lo: usize,
        hi: usize,
        n_ranks: usize,
    },
    /// The communicator reported zero participating ranks.
    #[error("communicator reports zero ranks")]
    EmptyCommunicator,
    /// A point-to-point exchange with `neighbor` failed or returned garbage.
    #[error("communication with rank {neighbor} failed: {source}")]
    Comm { neighbor: usize, source: CommSource },
    /// A schedule wire message could not be reconstructed.
    #[error("schedule message from rank {from} malformed: {reason}")]
    MalformedSchedule { from: usize, reason: String },
    /// The pairing walk exhausted receivers while a donor still held cells.
    /// Indicates unbalanced goal/leftover arithmetic; not recoverable.
    #[error("balance walk ran out of receivers with {remaining} cells unplaced on rank {donor}")]
    UnbalancedWalk { donor: usize, remaining: u64 },
}
