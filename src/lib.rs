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

//! Decentralized task allocation core for heterogeneous mobile agents, implementing the
//! Consensus-Based Bundle Algorithm (CBBA) of Choi, Brunet & How (2009).
//!
//! Agents greedily build a bundle of compatible, time-window-feasible tasks (see [`scoring`]),
//! and a synchronous consensus phase (see [`consensus`]) reconciles conflicting winning bids
//! between agents until the assignment is conflict-free.

pub mod bundle;
pub mod config;
pub mod consensus;
pub mod generate;
pub mod io;
pub mod scoring;
pub mod solver;

use serde::{Deserialize, Serialize};

/// A mobile agent able to perform type-compatible tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier of the agent, used in the solver's output.
    pub agent_id: u32,
    /// Index of the agent's type into the [`config::Config::agent_types`] list.
    pub agent_type: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Nominal cruise velocity in meters per second. Must be > 0.
    pub nom_velocity: f64,
    /// Earliest point in time the agent can begin its first task.
    pub availability: f64,
}

/// An assignable, time-windowed, type-tagged job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier of the task, used in the solver's output.
    pub task_id: u32,
    /// Index of the task's type into the [`config::Config::task_types`] list.
    pub task_type: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Earliest time the task may be started.
    pub start_time: f64,
    /// Latest time the task may be started.
    pub end_time: f64,
    /// Time required to perform the task, once started.
    pub duration: f64,
    /// Reward for performing this task at its `start_time`.
    pub task_value: f64,
    /// Exponential decay coefficient applied to `task_value` for delayed starts.
    pub discount: f64,
}

/// Axis-aligned spatial bounds of the scenario, `[min, max]` per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldInfo {
    pub limit_x: [f64; 2],
    pub limit_y: [f64; 2],
    pub limit_z: [f64; 2],
}

/// Boolean mapping from `(agent_type, task_type)` to "this agent type may perform this task
/// type", used by the bid scorer to eliminate impossible pairings before any geometric
/// computation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityMatrix {
    num_task_types: usize,
    allowed: Vec<bool>,
}

impl CompatibilityMatrix {
    /// Create a matrix with all pairings disallowed.
    pub fn new(num_agent_types: usize, num_task_types: usize) -> Self {
        CompatibilityMatrix {
            num_task_types,
            allowed: vec![false; num_agent_types * num_task_types],
        }
    }

    pub fn set(&mut self, agent_type: usize, task_type: usize, allowed: bool) {
        self.allowed[agent_type * self.num_task_types + task_type] = allowed;
    }

    pub fn allows(&self, agent_type: usize, task_type: usize) -> bool {
        self.allowed[agent_type * self.num_task_types + task_type]
    }
}

/// Fatal errors raised while solving an assignment problem. All of these indicate either a
/// malformed input (an agent whose type the scorer has no branch for) or a violated internal
/// invariant; they are never expected during normal operation and recovery is not attempted
/// within a single `solve` call.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// The bid scorer encountered an agent type it has no scoring branch for. The original CBBA
    /// model only scores `quad` and `car` agents (identically); see [`scoring`].
    #[error("agent {agent_index} has unknown agent type {agent_type}; the scorer has no branch for it")]
    UnknownAgentType {
        agent_index: usize,
        agent_type: usize,
    },
    /// The consensus resolver observed a winner belief outside of `{-1, 0..num_agents}`, which
    /// can only happen if a prior round violated the state machine.
    #[error(
        "agent {receiver}'s belief about task {task} is {value}, which is not a valid winner index"
    )]
    InconsistentConsensusState {
        receiver: usize,
        task: usize,
        value: i64,
    },
    /// Post-processing could not translate an internal task index back into its stable
    /// `task_id`, because no such task exists in the input `TaskList` any more.
    #[error("no task found for internal task index {0}")]
    TaskLookupMiss(usize),
}
