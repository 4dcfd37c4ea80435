//! Schedule fan-out and the collective planning entry point:
//! census → goals → planner → per-rank schedule slices.

use bytemuck::Zeroable;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, cast_slice_mut, WireCells, WireCount, WireRank};
use crate::balance::census;
use crate::balance::goals::GoalTable;
use crate::balance::planner::Planner;
use crate::balance::schedule::Schedule;
use crate::balance::weights::WeightTable;
use crate::balance::{DEFAULT_BALANCE_TAG, ROOT};
use crate::balance_error::BalanceError;

/// Tag block for one planning epoch: census report, then the three schedule
/// messages (length header, rank array, count array).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BalanceCommTags {
    pub census: CommTag,
    pub header: CommTag,
    pub ranks: CommTag,
    pub counts: CommTag,
}

impl BalanceCommTags {
    /// Derive the four tags from one base tag.
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            census: base,
            header: base.offset(1),
            ranks: base.offset(2),
            counts: base.offset(3),
        }
    }
}

/// Root side: send every other rank its slice of the plan; the root's own
/// slice is returned directly, no serialization round-trip.
pub fn distribute_schedules<C: Communicator>(
    comm: &C,
    schedules: &[Schedule],
    tags: &BalanceCommTags,
) -> Result<Schedule, BalanceError> {
    debug_assert_eq!(comm.rank(), ROOT);
    debug_assert_eq!(schedules.len(), comm.size());
    for (rank, sched) in schedules.iter().enumerate() {
        if rank == ROOT {
            continue;
        }
        let header = [
            WireCount::new(sched.send_to.len()),
            WireCount::new(sched.recv_from.len()),
        ];
        let (ranks_buf, cells_buf) = sched.encode_wire();
        let _ = comm
            .isend(rank, tags.header.as_u16(), cast_slice(&header))
            .wait();
        let _ = comm
            .isend(rank, tags.ranks.as_u16(), cast_slice(&ranks_buf))
            .wait();
        let _ = comm
            .isend(rank, tags.counts.as_u16(), cast_slice(&cells_buf))
            .wait();
    }
    log::debug!("schedule slices fanned out to {} ranks", comm.size() - 1);
    Ok(schedules[ROOT].clone())
}

fn recv_exact<C: Communicator>(
    comm: &C,
    tag: CommTag,
    buf: &mut [u8],
    what: &str,
) -> Result<(), BalanceError> {
    let expected = buf.len();
    let h = comm.irecv(ROOT, tag.as_u16(), buf);
    match h.wait() {
        Some(data) if data.len() == expected => {
            buf.copy_from_slice(&data);
            Ok(())
        }
        Some(data) => Err(BalanceError::Comm {
            neighbor: ROOT,
            source: format!("expected {expected} bytes for {what}, got {}", data.len()).into(),
        }),
        None => Err(BalanceError::Comm {
            neighbor: ROOT,
            source: format!("failed to receive {what} from the root").into(),
        }),
    }
}

/// Non-root side: blocking-receive this rank's schedule slice from the root.
pub fn receive_schedule<C: Communicator>(
    comm: &C,
    tags: &BalanceCommTags,
) -> Result<Schedule, BalanceError> {
    let mut header = [WireCount::zeroed(); 2];
    recv_exact(comm, tags.header, cast_slice_mut(&mut header), "schedule header")?;
    let send_len = header[0].get();
    let recv_len = header[1].get();

    let mut ranks_buf = vec![WireRank::zeroed(); send_len + recv_len];
    recv_exact(comm, tags.ranks, cast_slice_mut(&mut ranks_buf), "schedule rank array")?;

    let mut cells_buf = vec![WireCells::zeroed(); 1 + send_len + recv_len];
    recv_exact(comm, tags.counts, cast_slice_mut(&mut cells_buf), "schedule count array")?;

    Schedule::decode_wire(ROOT, send_len, recv_len, &ranks_buf, &cells_buf)
}

/// Plan a redistribution epoch using explicit communication tags.
///
/// Collective: every rank calls this with its local cell count. The root
/// gathers the census, derives goals from `weights` (normalized once per
/// run; `None` means uniform), runs the planner, and fans the slices out.
/// Each rank returns holding exactly its own [`Schedule`]. Planning is
/// centralized: only the root's `weights` argument is consulted.
///
/// # Errors
/// Configuration errors (weight/size mismatch) are raised on the root before
/// any schedule message is sent; transport and consistency failures abort
/// the epoch with no partial plan.
pub fn plan_redistribution_with_tags<C: Communicator>(
    comm: &C,
    local_cells: u64,
    weights: Option<&WeightTable>,
    tags: BalanceCommTags,
) -> Result<Schedule, BalanceError> {
    let size = comm.size();
    if size == 0 {
        return Err(BalanceError::EmptyCommunicator);
    }
    if comm.rank() == ROOT {
        let weights = match weights {
            Some(w) => {
                if w.len() != size {
                    return Err(BalanceError::WeightCountMismatch {
                        expected: w.len(),
                        actual: size,
                    });
                }
                w.normalized()
            }
            None => WeightTable::uniform(size),
        };
        let counts = census::gather_counts(comm, local_cells, tags.census)?;
        let goals = GoalTable::compute(&counts, &weights)?;
        let schedules = Planner::new(&counts, &goals).run()?;
        distribute_schedules(comm, &schedules, &tags)
    } else {
        census::report_local_count(comm, local_cells, tags.census)?;
        receive_schedule(comm, &tags)
    }
}

/// [`plan_redistribution_with_tags`] on the reserved default tag block.
pub fn plan_redistribution<C: Communicator>(
    comm: &C,
    local_cells: u64,
    weights: Option<&WeightTable>,
) -> Result<Schedule, BalanceError> {
    plan_redistribution_with_tags(
        comm,
        local_cells,
        weights,
        BalanceCommTags::from_base(DEFAULT_BALANCE_TAG),
    )
}
