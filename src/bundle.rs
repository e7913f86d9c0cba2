// Copyright 2020 by Michael Thies <mail@mhthies.de>
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

//! Per-agent bundle maintenance: releasing tasks an agent has lost the consensus race for
//! ([`bundle_remove`]), and greedily inserting new winning bids ([`bundle_add`]).

use crate::scoring::{compute_bids, FeasibilityMatrix};
use crate::solver::AssignmentState;
use crate::{Agent, CompatibilityMatrix, SolveError, Task};

const EPSILON: f64 = 1e-5;

/// Release every task this agent has lost ownership of, and (per the diminishing-marginal-gain
/// invariant) every task inserted into its bundle *after* the first such loss, even if this
/// agent still nominally wins those later tasks.
///
/// The bundle records insertion order; once an earlier entry is invalidated, the score and
/// feasibility computations for everything after it are no longer trustworthy, so they are
/// released too and will be re-bid from scratch in [`bundle_add`].
pub fn bundle_remove(state: &mut AssignmentState, agent_index: usize) {
    let max_depth = state.bundle_list[agent_index].len();
    let mut out_bid_for_task = false;

    for idx in 0..max_depth {
        let task = state.bundle_list[agent_index][idx];
        if task < 0 {
            break;
        }
        let task = task as usize;

        if state.winners[agent_index][task] != agent_index as i64 {
            out_bid_for_task = true;
        }

        if out_bid_for_task {
            if state.winners[agent_index][task] == agent_index as i64 {
                state.winners[agent_index][task] = -1;
                state.winner_bid[agent_index][task] = -1.0;
            }

            let path = &mut state.path_list[agent_index];
            let idx_remove = path
                .iter()
                .position(|&t| t == task as i64)
                .expect("bundle entry must be present in the path");
            path.remove(idx_remove);
            path.push(-1);

            state.times_list[agent_index].remove(idx_remove);
            state.times_list[agent_index].push(-1.0);
            state.scores_list[agent_index].remove(idx_remove);
            state.scores_list[agent_index].push(-1.0);

            state.bundle_list[agent_index][idx] = -1;
        }
    }
}

/// Greedily grow `agent_index`'s bundle: repeatedly compute bids for every still-available task,
/// insert the best-scoring one (ties broken first by smaller agent index beating the task's
/// current winner, then by earliest task start time), and stop once the bundle is full or no
/// positive-score insertion remains.
///
/// Returns `true` if at least one task was added (used by the solver's convergence check).
pub fn bundle_add(
    state: &mut AssignmentState,
    agent_index: usize,
    agent: &Agent,
    tasks: &[Task],
    compatibility: &CompatibilityMatrix,
    time_window_flag: bool,
) -> Result<bool, SolveError> {
    let max_depth = state.bundle_list[agent_index].len();
    let num_tasks = tasks.len();
    let mut new_bid_flag = false;

    let mut feasibility = FeasibilityMatrix::new(num_tasks, max_depth);

    loop {
        let bundle_len = state.bundle_list[agent_index]
            .iter()
            .take_while(|&&t| t >= 0)
            .count();
        if bundle_len == max_depth {
            break;
        }

        let path_len = state.path_list[agent_index]
            .iter()
            .take_while(|&&t| t >= 0)
            .count();

        let bids = compute_bids(
            agent_index,
            agent,
            tasks,
            &state.path_list[agent_index]
                .iter()
                .take(path_len)
                .map(|&t| t as usize)
                .collect::<Vec<_>>(),
            &state.times_list[agent_index][..path_len],
            compatibility,
            time_window_flag,
            &mut feasibility,
        )?;

        let mut best_task: Option<usize> = None;
        let mut best_value = 0.0;

        for (task_index, bid) in bids.iter().enumerate() {
            let Some(bid) = bid else { continue };

            let diff = bid.value - state.winner_bid[agent_index][task_index];
            let eligible = diff > EPSILON
                || (diff.abs() <= EPSILON
                    && (agent_index as i64) < state.winners[agent_index][task_index]);
            if !eligible {
                continue;
            }

            match best_task {
                None => {
                    best_task = Some(task_index);
                    best_value = bid.value;
                }
                Some(current_best) => {
                    if bid.value > best_value {
                        best_task = Some(task_index);
                        best_value = bid.value;
                    } else if (bid.value - best_value).abs() <= EPSILON
                        && tasks[task_index].start_time < tasks[current_best].start_time
                    {
                        best_task = Some(task_index);
                        best_value = bid.value;
                    }
                }
            }
        }

        let Some(best_task) = best_task else { break };
        if best_value <= 0.0 {
            break;
        }

        new_bid_flag = true;
        let bid = bids[best_task].expect("selected task must have a bid");

        state.winners[agent_index][best_task] = agent_index as i64;
        state.winner_bid[agent_index][best_task] = bid.value;

        state.path_list[agent_index].insert(bid.best_index, best_task as i64);
        state.path_list[agent_index].pop();
        state.times_list[agent_index].insert(bid.best_index, bid.best_time);
        state.times_list[agent_index].pop();
        state.scores_list[agent_index].insert(bid.best_index, bid.value);
        state.scores_list[agent_index].pop();

        state.bundle_list[agent_index][bundle_len] = best_task as i64;

        feasibility.insert_duplicate_column(num_tasks, bid.best_index);
    }

    Ok(new_bid_flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(agent_id: u32, agent_type: usize, x: f64, y: f64) -> Agent {
        Agent {
            agent_id,
            agent_type,
            x,
            y,
            z: 0.0,
            nom_velocity: 1.0,
            availability: 0.0,
        }
    }

    fn task(task_id: u32, task_type: usize, x: f64, y: f64, value: f64) -> Task {
        Task {
            task_id,
            task_type,
            x,
            y,
            z: 0.0,
            start_time: 0.0,
            end_time: 1000.0,
            duration: 0.0,
            task_value: value,
            discount: 0.0,
        }
    }

    #[test]
    fn bundle_add_inserts_the_single_best_task() {
        let mut state = AssignmentState::new(1, 2, 2);
        let a = agent(0, 0, 0.0, 0.0);
        let tasks = vec![task(0, 0, 1.0, 0.0, 5.0), task(1, 0, 10.0, 0.0, 50.0)];
        let mut compat = CompatibilityMatrix::new(1, 1);
        compat.set(0, 0, true);

        let changed = bundle_add(&mut state, 0, &a, &tasks, &compat, false).unwrap();
        assert!(changed);
        assert_eq!(state.bundle_list[0][0], 1);
        assert_eq!(state.winners[0][1], 0);
    }

    #[test]
    fn bundle_remove_releases_task_and_everything_after_it() {
        let mut state = AssignmentState::new(1, 2, 2);
        state.bundle_list[0] = vec![0, 1];
        state.path_list[0] = vec![0, 1];
        state.times_list[0] = vec![1.0, 2.0];
        state.scores_list[0] = vec![5.0, 3.0];
        state.winners[0] = vec![1, 0]; // task 0 now owned by agent 1, task 1 still by agent 0

        bundle_remove(&mut state, 0);

        assert_eq!(state.bundle_list[0], vec![-1, -1]);
        assert_eq!(state.path_list[0], vec![-1, -1]);
        assert_eq!(state.winners[0][1], -1);
    }

    #[test]
    fn bundle_remove_is_a_no_op_when_all_owned() {
        let mut state = AssignmentState::new(1, 1, 1);
        state.bundle_list[0] = vec![0];
        state.path_list[0] = vec![0];
        state.times_list[0] = vec![1.0];
        state.scores_list[0] = vec![5.0];
        state.winners[0] = vec![0];

        bundle_remove(&mut state, 0);

        assert_eq!(state.bundle_list[0], vec![0]);
        assert_eq!(state.path_list[0], vec![0]);
    }

    #[test]
    fn bundle_add_stops_once_bundle_is_full() {
        let mut state = AssignmentState::new(1, 3, 1);
        let a = agent(0, 0, 0.0, 0.0);
        let tasks = vec![
            task(0, 0, 1.0, 0.0, 5.0),
            task(1, 0, 2.0, 0.0, 5.0),
            task(2, 0, 3.0, 0.0, 5.0),
        ];
        let mut compat = CompatibilityMatrix::new(1, 1);
        compat.set(0, 0, true);

        bundle_add(&mut state, 0, &a, &tasks, &compat, false).unwrap();
        assert_eq!(state.bundle_list[0].len(), 1);
        assert_ne!(state.bundle_list[0][0], -1);
    }
}
