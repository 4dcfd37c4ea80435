//! The balance planner: greedy donor/receiver pairing over rank counts.
//!
//! Runs once per planning epoch, on the root rank only. Donors are walked in
//! order of largest surplus and always paired against the currently most
//! under-quota receiver; the sort + two-cursor walk is what keeps the number
//! of distinct transfers small compared to naive pairwise balancing.

use crate::balance::goals::GoalTable;
use crate::balance::schedule::Schedule;
use crate::balance::weights::WeightTable;
use crate::balance_error::BalanceError;

/// Per-run planner state. Construct from the gathered counts and goal table,
/// call [`Planner::run`], discard. Holds no global state.
#[derive(Debug)]
pub struct Planner {
    working: Vec<i64>,
    goals: Vec<i64>,
    leftovers: i64,
    zero_goal_count: usize,
    /// One-shot carry: the current receiver's target has already been bumped
    /// by a leftover unit and must stay bumped across donor boundaries until
    /// the receiver is fully satisfied.
    carry: bool,
}

impl Planner {
    pub fn new(counts: &[u64], goals: &GoalTable) -> Self {
        debug_assert_eq!(counts.len(), goals.len());
        Self {
            working: counts.iter().map(|&c| c as i64).collect(),
            goals: goals.goals().iter().map(|&g| g as i64).collect(),
            leftovers: goals.leftovers() as i64,
            zero_goal_count: goals.zero_goal_count(),
            carry: false,
        }
    }

    /// Produce one [`Schedule`] per rank.
    ///
    /// # Errors
    /// `UnbalancedWalk` if the receiver cursor is exhausted while a donor
    /// still holds cells; the goal/leftover arithmetic rules this out for
    /// any input that reaches the planner, so it is fatal, not retried.
    pub fn run(mut self) -> Result<Vec<Schedule>, BalanceError> {
        let n = self.working.len();
        if n <= 1 {
            return Ok(self
                .working
                .iter()
                .map(|&c| Schedule::keeping(c as u64))
                .collect());
        }
        let mut schedules: Vec<Schedule> = vec![Schedule::default(); n];

        // 1. Order ranks by ascending deficit (goal - count): the biggest
        //    donor lands at the front, the neediest receiver at the back.
        //    The sort is stable, so ties keep ascending rank id.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&r| self.goals[r] - self.working[r]);

        // 2. Two-cursor walk: `start` consumes donors, `last` consumes
        //    receivers, meeting in the middle.
        let mut start = 0usize;
        let mut last = n - 1;
        let mut transfers = 0usize;
        while start < last {
            let donor = order[start];
            let mut num_to_send = self.working[donor] - self.goals[donor];
            // While leftovers remain, each non-drained donor keeps one unit
            // of headroom; this is what makes the floored goals sum back to
            // the true total.
            if self.leftovers > 0 && self.goals[donor] != 0 {
                num_to_send -= 1;
                self.leftovers -= 1;
            }
            while num_to_send > 0 {
                if start == last {
                    return Err(BalanceError::UnbalancedWalk {
                        donor,
                        remaining: num_to_send as u64,
                    });
                }
                let receiver = order[last];
                let mut num_to_receive = self.goals[receiver] - self.working[receiver];
                // Leftover injection: once the pool covers every remaining
                // non-drained slot, the current receiver's target grows by
                // one. A set carry keeps the bump without re-spending a unit.
                let open_slots = last as i64 - start as i64 - self.zero_goal_count as i64;
                if self.carry || self.leftovers >= open_slots {
                    num_to_receive += 1;
                    if !self.carry {
                        self.leftovers -= 1;
                    }
                    self.carry = true;
                }
                if num_to_receive <= 0 {
                    // Already at target (the one-unit skew can do this);
                    // step past it.
                    last -= 1;
                    self.carry = false;
                    continue;
                }
                if num_to_send >= num_to_receive {
                    // Receiver fully satisfied; move to the next one.
                    schedules[donor].push_send(receiver, num_to_receive as u64);
                    schedules[receiver].push_recv(donor, num_to_receive as u64);
                    self.working[donor] -= num_to_receive;
                    self.working[receiver] += num_to_receive;
                    last -= 1;
                    num_to_send -= num_to_receive;
                    self.carry = false;
                } else {
                    // Donor exhausted; the receiver stays current for the
                    // next donor, carry included.
                    schedules[donor].push_send(receiver, num_to_send as u64);
                    schedules[receiver].push_recv(donor, num_to_send as u64);
                    self.working[donor] -= num_to_send;
                    self.working[receiver] += num_to_send;
                    num_to_send = 0;
                }
                transfers += 1;
            }
            start += 1;
        }

        // 3. Final counts are whatever the walk left in place; at most one
        //    unit away from each goal.
        for (rank, sched) in schedules.iter_mut().enumerate() {
            sched.num_cells = self.working[rank] as u64;
        }
        log::debug!(
            "planned {} transfers across {} ranks ({} cells total)",
            transfers,
            n,
            self.working.iter().sum::<i64>()
        );
        Ok(schedules)
    }
}

/// Normalize `weights`, derive goals, and run the planner over `counts`.
///
/// This is the root rank's planning step in one call; distributed callers
/// use [`plan_redistribution`](crate::balance::plan_redistribution) instead.
pub fn plan_transfers(
    counts: &[u64],
    weights: &WeightTable,
) -> Result<Vec<Schedule>, BalanceError> {
    let weights = weights.normalized();
    let goals = GoalTable::compute(counts, &weights)?;
    Planner::new(counts, &goals).run()
}
