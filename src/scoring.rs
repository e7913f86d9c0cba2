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

//! Bid computation: for a given agent and its current path, finds the best insertion position
//! for each still-available, compatible task and the marginal score it would yield.

use crate::{Agent, CompatibilityMatrix, SolveError, Task};

/// Dense `[num_tasks x (max_depth+1)]` feasibility grid. `feasible[task][position]` is cleared
/// to `false` by the scorer once it proves that inserting `task` at `position` violates
/// `min_start <= max_start`; entries are never re-enabled within one `bundle_add` invocation
/// (see [`crate::bundle::bundle_add`]).
#[derive(Debug, Clone)]
pub struct FeasibilityMatrix {
    positions: usize,
    cells: Vec<bool>,
}

impl FeasibilityMatrix {
    /// A freshly allocated matrix, all entries feasible, sized for `num_tasks` tasks and
    /// `max_depth + 1` candidate insertion positions.
    pub fn new(num_tasks: usize, max_depth: usize) -> Self {
        FeasibilityMatrix {
            positions: max_depth + 1,
            cells: vec![true; num_tasks * (max_depth + 1)],
        }
    }

    pub fn get(&self, task: usize, position: usize) -> bool {
        self.cells[task * self.positions + position]
    }

    pub fn clear(&mut self, task: usize, position: usize) {
        self.cells[task * self.positions + position] = false;
    }

    /// Replicate the feasibility value at `position` into a freshly-opened gap at `position`,
    /// shifting every later entry one slot to the right and dropping the last one. Mirrors the
    /// insertion just performed on the path/times/scores arrays, for every candidate task row.
    pub fn insert_duplicate_column(&mut self, num_tasks: usize, position: usize) {
        for task in 0..num_tasks {
            let base = task * self.positions;
            let value = self.cells[base + position];
            for p in (position + 1..self.positions).rev() {
                self.cells[base + p] = self.cells[base + p - 1];
            }
            self.cells[base + position] = value;
        }
    }
}

/// Result of scoring one task's best insertion into an agent's current path.
#[derive(Debug, Clone, Copy)]
pub struct Bid {
    pub value: f64,
    pub best_index: usize,
    pub best_time: f64,
}

/// Compute the best attainable bid for every task compatible with `agent` and not already in
/// its `path`, given the tasks it already visits (in order) and their scheduled start times.
///
/// Returns, per task index, `Some(bid)` if a feasible positive-score insertion exists. Mutates
/// `feasibility` in place, pruning positions proven infeasible.
pub fn compute_bids(
    agent_index: usize,
    agent: &Agent,
    tasks: &[Task],
    path: &[usize],
    times: &[f64],
    compatibility: &CompatibilityMatrix,
    time_window_flag: bool,
    feasibility: &mut FeasibilityMatrix,
) -> Result<Vec<Option<Bid>>, SolveError> {
    let path_len = path.len();
    let mut bids = vec![None; tasks.len()];

    for (task_index, task) in tasks.iter().enumerate() {
        if !compatibility.allows(agent.agent_type, task.task_type) {
            continue;
        }
        if path[..path_len].contains(&task_index) {
            continue;
        }

        let mut best_bid = 0.0;
        let mut best_index = usize::MAX;
        let mut best_time = -2.0;

        for position in 0..=path_len {
            if !feasibility.get(task_index, position) {
                continue;
            }

            let prev = if position == 0 {
                None
            } else {
                Some((&tasks[path[position - 1]], times[position - 1]))
            };
            let next = if position == path_len {
                None
            } else {
                Some((&tasks[path[position]], times[position]))
            };

            let insertion = score_insertion(agent_index, agent, task, prev, next, time_window_flag)?;

            if time_window_flag && insertion.min_start > insertion.max_start {
                feasibility.clear(task_index, position);
                continue;
            }

            if insertion.score > best_bid {
                best_bid = insertion.score;
                best_index = position;
                best_time = if time_window_flag { insertion.min_start } else { 0.0 };
            }
        }

        if best_bid > 0.0 {
            bids[task_index] = Some(Bid {
                value: best_bid,
                best_index,
                best_time,
            });
        }
    }

    Ok(bids)
}

/// Result of [`score_insertion`]: the marginal score of inserting the candidate task, and the
/// feasible start-time window implied by its neighbors in the path.
pub struct InsertionScore {
    pub score: f64,
    pub min_start: f64,
    pub max_start: f64,
}

fn euclidean_travel_time(ax: f64, ay: f64, az: f64, bx: f64, by: f64, bz: f64, nom_velocity: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt() / nom_velocity
}

/// Compute the marginal score and feasible start-time bounds for inserting `task` between
/// `prev` (the task currently at the position before, with its scheduled start time) and `next`
/// (the task currently at the position after), for the given `agent`.
///
/// Quad and car agents share a single motion/reward model (homogeneous scoring); any other
/// agent type fails with [`SolveError::UnknownAgentType`], matching the original model's single
/// branch for known agent types.
pub fn score_insertion(
    agent_index: usize,
    agent: &Agent,
    task: &Task,
    prev: Option<(&Task, f64)>,
    next: Option<(&Task, f64)>,
    time_window_flag: bool,
) -> Result<InsertionScore, SolveError> {
    // The model currently scores all known agent types (quad, car) identically; distinguishing
    // their motion/reward models is a design extension, not a specified behavior (see DESIGN.md).
    if agent.agent_type > KNOWN_AGENT_TYPE_COUNT {
        return Err(SolveError::UnknownAgentType {
            agent_index,
            agent_type: agent.agent_type,
        });
    }

    let min_start = match prev {
        None => {
            let dt = euclidean_travel_time(
                agent.x, agent.y, agent.z, task.x, task.y, task.z, agent.nom_velocity,
            );
            task.start_time.max(agent.availability + dt)
        }
        Some((prev_task, prev_time)) => {
            let dt = euclidean_travel_time(
                prev_task.x, prev_task.y, prev_task.z, task.x, task.y, task.z, agent.nom_velocity,
            );
            task.start_time.max(prev_time + prev_task.duration + dt)
        }
    };

    let max_start = match next {
        None => task.end_time,
        Some((next_task, next_time)) => {
            let dt = euclidean_travel_time(
                task.x, task.y, task.z, next_task.x, next_task.y, next_task.z, agent.nom_velocity,
            );
            task.end_time.min(next_time - task.duration - dt)
        }
    };

    let reward = if time_window_flag {
        task.task_value * (-task.discount * (min_start - task.start_time)).exp()
    } else {
        let dt = euclidean_travel_time(
            agent.x, agent.y, agent.z, task.x, task.y, task.z, agent.nom_velocity,
        );
        task.task_value * (-task.discount * dt).exp()
    };

    // Fuel/distance penalty is intentionally elided; see PURPOSE & SCOPE non-goals.
    let score = reward;

    Ok(InsertionScore {
        score,
        min_start,
        max_start,
    })
}

/// Agent types the scorer knows how to score (quad = 0, car = 1, by convention of the built-in
/// compatibility rule). Any agent_type index beyond this is unscoreable.
const KNOWN_AGENT_TYPE_COUNT: usize = 1;
