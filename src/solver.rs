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

//! Top-level orchestration: builds the shared [`AssignmentState`], runs the synchronous
//! communicate/bundle loop until convergence, and translates the result back into stable task
//! ids.

use serde::Serialize;

use crate::bundle::{bundle_add, bundle_remove};
use crate::consensus::{communicate, complete_graph};
use crate::{Agent, CompatibilityMatrix, SolveError, Task};

/// Shared working state of one solver run: each agent's current winner beliefs, winning bids,
/// bundle (insertion order) and path (visit order), kept in lock-step with `times_list` and
/// `scores_list`.
///
/// `bundle_list`/`path_list` entries are task indices into the `tasks` slice passed to
/// [`solve`], or `-1` for unused slots; unused slots are always trailing, since
/// [`crate::bundle::bundle_remove`] and [`crate::bundle::bundle_add`] only ever shift entries
/// within the occupied prefix.
pub struct AssignmentState {
    pub winners: Vec<Vec<i64>>,
    pub winner_bid: Vec<Vec<f64>>,
    pub bundle_list: Vec<Vec<i64>>,
    pub path_list: Vec<Vec<i64>>,
    pub times_list: Vec<Vec<f64>>,
    pub scores_list: Vec<Vec<f64>>,
}

impl AssignmentState {
    pub fn new(num_agents: usize, num_tasks: usize, max_depth: usize) -> Self {
        AssignmentState {
            winners: vec![vec![-1; num_tasks]; num_agents],
            winner_bid: vec![vec![-1.0; num_tasks]; num_agents],
            bundle_list: vec![vec![-1; max_depth]; num_agents],
            path_list: vec![vec![-1; max_depth]; num_agents],
            times_list: vec![vec![-1.0; max_depth]; num_agents],
            scores_list: vec![vec![-1.0; max_depth]; num_agents],
        }
    }
}

/// Final, stable-id result of a [`solve`] run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveOutcome {
    /// Per agent, the task ids it ends up visiting, in visit order.
    pub path_list: Vec<Vec<u32>>,
    /// Per agent, the scheduled start time for each task in `path_list`.
    pub times_list: Vec<Vec<f64>>,
    /// Per agent, the marginal score earned for each task in `path_list`.
    pub scores_list: Vec<Vec<f64>>,
    /// Per agent, the task ids in bundle (insertion) order.
    pub bundle_list: Vec<Vec<u32>>,
    /// Sum of every agent's scores.
    pub total_score: f64,
    /// `false` if the loop hit the `2 * num_agents` stall bound without reaching the
    /// `num_agents` quiet-round bound; the returned assignment may still contain conflicts.
    pub converged: bool,
}

/// Run CBBA to a conflict-free (or stalled) assignment of `tasks` to `agents`.
///
/// Agents communicate over the default fully-connected topology (see [`complete_graph`]).
/// `max_depth` bounds how many tasks a single agent's bundle may hold. When `time_window_flag`
/// is `false`, tasks are scored purely by travel time from the agent's start position and
/// start-time/time-window feasibility checks are skipped.
pub fn solve(
    agents: &[Agent],
    tasks: &[Task],
    compatibility: &CompatibilityMatrix,
    max_depth: usize,
    time_window_flag: bool,
) -> Result<SolveOutcome, SolveError> {
    let num_agents = agents.len();
    let num_tasks = tasks.len();
    log::info!(
        "starting CBBA solve with {} agents, {} tasks, max_depth={}",
        num_agents,
        num_tasks,
        max_depth
    );

    let mut state = AssignmentState::new(num_agents, num_tasks, max_depth);
    let graph = complete_graph(num_agents);

    let mut iter_idx: u64 = 1;
    let mut iter_prev: u64 = 0;
    let mut time_mat = vec![vec![0u64; num_agents]; num_agents];
    let mut converged = true;

    loop {
        time_mat = communicate(
            &mut state.winners,
            &mut state.winner_bid,
            &time_mat,
            &graph,
            iter_idx,
        )?;

        let mut changed_agents = 0;
        for agent_index in 0..num_agents {
            bundle_remove(&mut state, agent_index);
            let new_bid_flag = bundle_add(
                &mut state,
                agent_index,
                &agents[agent_index],
                tasks,
                compatibility,
                time_window_flag,
            )?;
            if new_bid_flag {
                iter_prev = iter_idx;
                changed_agents += 1;
            }
        }
        log::debug!(
            "iteration {}: {} agent(s) placed a new bid",
            iter_idx,
            changed_agents
        );

        if iter_idx - iter_prev > num_agents as u64 {
            break;
        } else if iter_idx - iter_prev > 2 * num_agents as u64 {
            log::warn!("CBBA did not converge due to communication trouble");
            converged = false;
            break;
        } else {
            iter_idx += 1;
        }
    }

    let mut path_list = Vec::with_capacity(num_agents);
    let mut bundle_list = Vec::with_capacity(num_agents);
    let mut times_list = Vec::with_capacity(num_agents);
    let mut scores_list = Vec::with_capacity(num_agents);
    let mut total_score = 0.0;

    for agent_index in 0..num_agents {
        path_list.push(translate_ids(&state.path_list[agent_index], tasks)?);
        bundle_list.push(translate_ids(&state.bundle_list[agent_index], tasks)?);

        let mut agent_times = Vec::new();
        let mut agent_scores = Vec::new();
        for (&time, &score) in state.times_list[agent_index]
            .iter()
            .zip(state.scores_list[agent_index].iter())
        {
            if score <= -1.0 {
                break;
            }
            agent_times.push(time);
            agent_scores.push(score);
            total_score += score;
        }
        times_list.push(agent_times);
        scores_list.push(agent_scores);
    }

    log::info!(
        "CBBA solve finished after {} iteration(s), converged={}, total_score={:.3}",
        iter_idx,
        converged,
        total_score
    );

    Ok(SolveOutcome {
        path_list,
        times_list,
        scores_list,
        bundle_list,
        total_score,
        converged,
    })
}

fn translate_ids(indices: &[i64], tasks: &[Task]) -> Result<Vec<u32>, SolveError> {
    let mut ids = Vec::new();
    for &idx in indices {
        if idx < 0 {
            break;
        }
        let task = tasks
            .get(idx as usize)
            .ok_or(SolveError::TaskLookupMiss(idx as usize))?;
        ids.push(task.task_id);
    }
    Ok(ids)
}
