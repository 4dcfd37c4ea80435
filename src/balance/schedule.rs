//! The per-rank transfer plan produced by the balance planner.

use serde::{Deserialize, Serialize};

use crate::algs::wire::{WireCells, WireRank};
use crate::balance_error::BalanceError;

/// One rank's slice of the redistribution plan.
///
/// `send_to`/`send_num` and `recv_from`/`recv_num` are parallel arrays, one
/// entry per distinct point-to-point transfer. Plans are symmetric: every
/// `(a sends k to b)` in a's schedule has a matching `(b receives k from a)`
/// in b's. All transfer counts are strictly positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Cell count this rank holds once the plan has been executed.
    pub num_cells: u64,
    pub send_to: Vec<usize>,
    pub send_num: Vec<u64>,
    pub recv_from: Vec<usize>,
    pub recv_num: Vec<u64>,
}

impl Schedule {
    /// A no-transfer schedule that simply keeps `num_cells`.
    pub fn keeping(num_cells: u64) -> Self {
        Self {
            num_cells,
            ..Self::default()
        }
    }

    pub(crate) fn push_send(&mut self, to: usize, num: u64) {
        self.send_to.push(to);
        self.send_num.push(num);
    }

    pub(crate) fn push_recv(&mut self, from: usize, num: u64) {
        self.recv_from.push(from);
        self.recv_num.push(num);
    }

    /// Outgoing transfers as `(destination rank, cell count)` pairs.
    pub fn sends(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.send_to.iter().copied().zip(self.send_num.iter().copied())
    }

    /// Incoming transfers as `(source rank, cell count)` pairs.
    pub fn recvs(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.recv_from
            .iter()
            .copied()
            .zip(self.recv_num.iter().copied())
    }

    pub fn total_outgoing(&self) -> u64 {
        self.send_num.iter().sum()
    }

    pub fn total_incoming(&self) -> u64 {
        self.recv_num.iter().sum()
    }

    /// True when the plan moves nothing in or out of this rank.
    pub fn is_empty(&self) -> bool {
        self.send_to.is_empty() && self.recv_from.is_empty()
    }

    /// Flatten into the two wire arrays: rank ids (narrow) and cell counts
    /// (wide). Layout: `[send_to.., recv_from..]` and
    /// `[num_cells, send_num.., recv_num..]`.
    pub(crate) fn encode_wire(&self) -> (Vec<WireRank>, Vec<WireCells>) {
        let mut ranks = Vec::with_capacity(self.send_to.len() + self.recv_from.len());
        ranks.extend(self.send_to.iter().map(|&r| WireRank::of(r)));
        ranks.extend(self.recv_from.iter().map(|&r| WireRank::of(r)));

        let mut cells = Vec::with_capacity(1 + self.send_num.len() + self.recv_num.len());
        cells.push(WireCells::new(self.num_cells));
        cells.extend(self.send_num.iter().map(|&n| WireCells::new(n)));
        cells.extend(self.recv_num.iter().map(|&n| WireCells::new(n)));
        (ranks, cells)
    }

    /// Rebuild a schedule from the wire arrays received from `from`.
    pub(crate) fn decode_wire(
        from: usize,
        send_len: usize,
        recv_len: usize,
        ranks: &[WireRank],
        cells: &[WireCells],
    ) -> Result<Self, BalanceError> {
        if ranks.len() != send_len + recv_len {
            return Err(BalanceError::MalformedSchedule {
                from,
                reason: format!(
                    "rank array holds {} entries, header promised {}",
                    ranks.len(),
                    send_len + recv_len
                ),
            });
        }
        if cells.len() != 1 + send_len + recv_len {
            return Err(BalanceError::MalformedSchedule {
                from,
                reason: format!(
                    "count array holds {} entries, header promised {}",
                    cells.len(),
                    1 + send_len + recv_len
                ),
            });
        }
        let (send_to, recv_from) = ranks.split_at(send_len);
        let num_cells = cells[0].get();
        let (send_num, recv_num) = cells[1..].split_at(send_len);
        Ok(Self {
            num_cells,
            send_to: send_to.iter().map(|r| r.get()).collect(),
            send_num: send_num.iter().map(|n| n.get()).collect(),
            recv_from: recv_from.iter().map(|r| r.get()).collect(),
            recv_num: recv_num.iter().map(|n| n.get()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schedule {
        let mut s = Schedule::keeping(42);
        s.push_send(3, 10);
        s.push_send(1, 5);
        s.push_recv(2, 7);
        s
    }

    #[test]
    fn wire_slices_carry_the_whole_plan() {
        let s = sample();
        let (ranks, cells) = s.encode_wire();
        assert_eq!(ranks.len(), 3);
        assert_eq!(cells.len(), 4);
        let back = Schedule::decode_wire(0, s.send_to.len(), s.recv_from.len(), &ranks, &cells)
            .unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn decode_rejects_short_rank_array() {
        let s = sample();
        let (ranks, cells) = s.encode_wire();
        let err = Schedule::decode_wire(5, 2, 2, &ranks, &cells).unwrap_err();
        assert!(matches!(err, BalanceError::MalformedSchedule { from: 5, .. }));
    }

    #[test]
    fn totals_sum_parallel_arrays() {
        let s = sample();
        assert_eq!(s.total_outgoing(), 15);
        assert_eq!(s.total_incoming(), 7);
        assert!(!s.is_empty());
        assert!(Schedule::keeping(9).is_empty());
    }
}
