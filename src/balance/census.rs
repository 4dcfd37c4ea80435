//! Rank census: collect every rank's local cell count on the root.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, cast_slice_mut, WireCells};
use crate::balance::ROOT;
use crate::balance_error::BalanceError;

/// Non-root side: report this rank's local cell count to the root.
pub fn report_local_count<C: Communicator>(
    comm: &C,
    local_cells: u64,
    tag: CommTag,
) -> Result<(), BalanceError> {
    let cells = WireCells::new(local_cells);
    let h = comm.isend(ROOT, tag.as_u16(), cast_slice(std::slice::from_ref(&cells)));
    let _ = h.wait();
    Ok(())
}

/// Root side: blocking-receive one count from every other rank, in rank
/// order `1..size`, and return the full `counts[0..size)` array with the
/// root's own count in slot [`ROOT`].
pub fn gather_counts<C: Communicator>(
    comm: &C,
    local_cells: u64,
    tag: CommTag,
) -> Result<Vec<u64>, BalanceError> {
    debug_assert_eq!(comm.rank(), ROOT);
    let size = comm.size();
    let mut counts = vec![0u64; size];
    counts[ROOT] = local_cells;
    for peer in 1..size {
        let mut cells = WireCells::new(0);
        let h = comm.irecv(
            peer,
            tag.as_u16(),
            cast_slice_mut(std::slice::from_mut(&mut cells)),
        );
        match h.wait() {
            Some(data) if data.len() == std::mem::size_of::<WireCells>() => {
                let bytes = cast_slice_mut(std::slice::from_mut(&mut cells));
                bytes.copy_from_slice(&data);
                counts[peer] = cells.get();
            }
            Some(data) => {
                return Err(BalanceError::Comm {
                    neighbor: peer,
                    source: format!(
                        "expected {} bytes for census count, got {}",
                        std::mem::size_of::<WireCells>(),
                        data.len()
                    )
                    .into(),
                });
            }
            None => {
                return Err(BalanceError::Comm {
                    neighbor: peer,
                    source: format!("failed to receive cell count from rank {peer}").into(),
                });
            }
        }
    }
    log::debug!(
        "census complete: {} cells across {} ranks",
        counts.iter().sum::<u64>(),
        size
    );
    Ok(counts)
}
