use super::*;
use crate::balance_error::BalanceError;


/// Cross-check one full plan against the gathered counts: conservation,
/// per-rank count arithmetic, pairwise symmetry, strictly positive transfers.
fn assert_plan_invariants(counts: &[u64], schedules: &[Schedule]) {
    let total: u64 = counts.iter().sum();
    let final_total: u64 = schedules.iter().map(|s| s.num_cells).sum();
    assert_eq!(final_total, total, "cells were lost or invented");

    for (rank, sched) in schedules.iter().enumerate() {
        assert_eq!(
            counts[rank] + sched.total_incoming() - sched.total_outgoing(),
            sched.num_cells,
            "count arithmetic broken on rank {rank}"
        );
        for (_, num) in sched.sends().chain(sched.recvs()) {
            assert!(num > 0, "non-positive transfer on rank {rank}");
        }
        for (to, num) in sched.sends() {
            let matched = schedules[to]
                .recvs()
                .filter(|&(from, k)| from == rank && k == num)
                .count();
            assert_eq!(matched, 1, "send {rank}->{to} ({num}) has no matching recv");
        }
        for (from, num) in sched.recvs() {
            let matched = schedules[from]
                .sends()
                .filter(|&(to, k)| to == rank && k == num)
                .count();
            assert_eq!(matched, 1, "recv {rank}<-{from} ({num}) has no matching send");
        }
    }
}

#[test]
fn concentrated_cells_spread_evenly() {
    let counts = [100, 0, 0, 0];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(4)).unwrap();
    assert_plan_invariants(&counts, &schedules);

    for sched in &schedules {
        assert_eq!(sched.num_cells, 25);
    }
    // Rank 0 feeds every other rank with exactly one transfer each.
    assert_eq!(schedules[0].send_to.len(), 3);
    assert_eq!(schedules[0].total_outgoing(), 75);
    for rank in 1..4 {
        assert_eq!(schedules[rank].recv_from, vec![0]);
        assert_eq!(schedules[rank].recv_num, vec![25]);
    }
}

#[test]
fn weighted_plan_places_the_flooring_leftover() {
    // total 31, goals 15/9/6, one leftover unit
    let counts = [10, 10, 11];
    let weights = WeightTable::from_weights(vec![0.5, 0.3, 0.2]).unwrap();
    let schedules = plan_transfers(&counts, &weights).unwrap();
    assert_plan_invariants(&counts, &schedules);

    let goals = [15u64, 9, 6];
    let mut off_by_one = 0;
    for (rank, sched) in schedules.iter().enumerate() {
        let diff = sched.num_cells.abs_diff(goals[rank]);
        assert!(diff <= 1, "rank {rank} ended {diff} away from goal");
        off_by_one += diff;
    }
    // The single leftover lands on exactly one rank.
    assert_eq!(off_by_one, 1);
}

#[test]
fn single_rank_keeps_everything() {
    let counts = [17];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(1)).unwrap();
    assert_eq!(schedules.len(), 1);
    assert!(schedules[0].is_empty());
    assert_eq!(schedules[0].num_cells, 17);
}

#[test]
fn empty_mesh_plans_no_transfers() {
    let counts = [0, 0, 0];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(3)).unwrap();
    for sched in &schedules {
        assert!(sched.is_empty());
        assert_eq!(sched.num_cells, 0);
    }
}

#[test]
fn balanced_input_is_a_fixed_point() {
    let counts = [12, 12, 12, 12];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(4)).unwrap();
    for (rank, sched) in schedules.iter().enumerate() {
        assert!(sched.is_empty(), "rank {rank} moved cells needlessly");
        assert_eq!(sched.num_cells, 12);
    }
}

#[test]
fn zero_weight_rank_is_drained_and_never_receives() {
    let counts = [10, 10];
    let weights = WeightTable::from_weights(vec![1.0, 0.0]).unwrap();
    let schedules = plan_transfers(&counts, &weights).unwrap();
    assert_plan_invariants(&counts, &schedules);

    assert_eq!(schedules[1].num_cells, 0);
    assert!(schedules[1].recv_from.is_empty());
    assert_eq!(schedules[1].send_to, vec![0]);
    assert_eq!(schedules[1].send_num, vec![10]);
    assert_eq!(schedules[0].num_cells, 20);
}

#[test]
fn drained_middle_rank_routes_past_balanced_peers() {
    let counts = [6, 3, 3];
    let weights = WeightTable::from_weights(vec![0.5, 0.5, 0.0]).unwrap();
    let schedules = plan_transfers(&counts, &weights).unwrap();
    assert_plan_invariants(&counts, &schedules);

    assert_eq!(schedules[2].num_cells, 0);
    assert!(schedules[2].recv_from.is_empty());
    assert_eq!(schedules[0].num_cells, 6);
    assert_eq!(schedules[1].num_cells, 6);
}

#[test]
fn receiver_spans_multiple_donors() {
    // Rank 2 needs 3 cells but no single donor holds that much surplus, so
    // the receiver must stay current across two donors.
    let counts = [5, 4, 0];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(3)).unwrap();
    assert_plan_invariants(&counts, &schedules);

    assert_eq!(schedules[2].num_cells, 3);
    let mut sources: Vec<usize> = schedules[2].recv_from.clone();
    sources.sort_unstable();
    assert_eq!(sources, vec![0, 1]);
}

#[test]
fn leftover_headroom_stays_on_donors() {
    // total 10 over 3 ranks: goals 3/3/3 with one leftover. The surplus rank
    // keeps the extra unit, so no transfer is needed at all.
    let counts = [3, 3, 4];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(3)).unwrap();
    assert_plan_invariants(&counts, &schedules);
    for sched in &schedules {
        assert!(sched.is_empty());
    }
    assert_eq!(schedules[2].num_cells, 4);
}

#[test]
fn leftover_injection_tops_up_late_receivers() {
    // total 11 over 4 ranks: goals 2 each, three leftovers. One unit stays
    // on the donor, the other two are injected into receivers.
    let counts = [10, 0, 0, 1];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(4)).unwrap();
    assert_plan_invariants(&counts, &schedules);
    for sched in &schedules {
        assert!(sched.num_cells >= 2 && sched.num_cells <= 3);
    }
}

#[test]
fn receiver_carry_survives_a_donor_change() {
    // total 7 over 4 ranks: goals 1 each, three leftovers. Donor 0 runs dry
    // mid-receiver after an injection, so the bumped target must carry over
    // to donor 1 without spending a second leftover unit.
    let counts = [4, 3, 0, 0];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(4)).unwrap();
    assert_plan_invariants(&counts, &schedules);

    let held: Vec<u64> = schedules.iter().map(|s| s.num_cells).collect();
    assert_eq!(held, vec![2, 2, 2, 1]);
    let mut sources: Vec<usize> = schedules[2].recv_from.clone();
    sources.sort_unstable();
    assert_eq!(sources, vec![0, 1]);
}

#[test]
fn exhausted_receiver_cursor_is_fatal() {
    // Two single-cell donors with every goal floored to zero: the second
    // donor finds no receiver left and the walk must abort, not fabricate
    // a transfer.
    let counts = [1, 1, 0];
    let err = plan_transfers(&counts, &WeightTable::uniform(3)).unwrap_err();
    assert!(matches!(err, BalanceError::UnbalancedWalk { .. }));
}

#[test]
fn tiny_total_spreads_single_cells() {
    // total below the rank count: every goal floors to 0 and the whole
    // total is distributed via injection, one cell per receiver.
    let counts = [3, 0, 0, 0];
    let schedules = plan_transfers(&counts, &WeightTable::uniform(4)).unwrap();
    assert_plan_invariants(&counts, &schedules);
    let held: Vec<u64> = schedules.iter().map(|s| s.num_cells).collect();
    assert_eq!(held.iter().sum::<u64>(), 3);
    assert!(held.iter().all(|&c| c <= 1));
}
