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

pub mod simple;

use std::fmt::Write;

use crate::solver::SolveOutcome;
use crate::{Agent, CompatibilityMatrix, Task};

/// Format a solver outcome into a human readable String (e.g. to print it to stdout).
///
/// The output format looks like
/// ```text
/// ===== Agent 3 =====
/// (2 task(s), total score 142.50)
/// - task 7 at t=12.00 (score 90.00)
/// - task 2 at t=30.00 (score 52.50)
///
/// ===== Agent 4 =====
/// (no tasks assigned)
/// …
/// ```
pub fn format_outcome(outcome: &SolveOutcome, agents: &[Agent]) -> String {
    let mut result = String::new();
    for (agent_index, agent) in agents.iter().enumerate() {
        write!(result, "\n===== Agent {} =====\n", agent.agent_id).unwrap();
        let path = &outcome.path_list[agent_index];
        let times = &outcome.times_list[agent_index];
        let scores = &outcome.scores_list[agent_index];

        if path.is_empty() {
            writeln!(result, "(no tasks assigned)").unwrap();
            continue;
        }

        let agent_total: f64 = scores.iter().sum();
        writeln!(result, "({} task(s), total score {:.2})", path.len(), agent_total).unwrap();
        for ((task_id, time), score) in path.iter().zip(times).zip(scores) {
            writeln!(
                result,
                "- task {} at t={:.2} (score {:.2})",
                task_id, time, score
            )
            .unwrap();
        }
    }
    result
}

pub fn debug_list_of_tasks(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|t| format!("{:04} type={} value={:.1}", t.task_id, t.task_type, t.task_value))
        .collect::<Vec<String>>()
        .join("\n")
}

/// Assert that a scenario's agent/task time windows and velocities are sane. Intended for debug
/// assertions on freshly loaded or generated scenarios, not for reporting to end users (panics
/// on violation rather than returning a `Result`).
pub fn assert_scenario_consistency(
    agents: &[Agent],
    tasks: &[Task],
    compatibility: &CompatibilityMatrix,
) {
    for (i, task) in tasks.iter().enumerate() {
        assert!(
            task.start_time <= task.end_time,
            "task {} ({}. in list) has start_time {} after end_time {}",
            task.task_id,
            i,
            task.start_time,
            task.end_time
        );
        assert!(
            task.duration >= 0.0,
            "task {} ({}. in list) has negative duration {}",
            task.task_id,
            i,
            task.duration
        );
    }
    for (i, agent) in agents.iter().enumerate() {
        assert!(
            agent.nom_velocity > 0.0,
            "agent {} ({}. in list) has non-positive nom_velocity {}",
            agent.agent_id,
            i,
            agent.nom_velocity
        );
        for task in tasks {
            // Bounds check only; whether the pairing is *allowed* is not an inconsistency.
            let _ = compatibility.allows(agent.agent_type, task.task_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solve;

    #[test]
    fn format_outcome_marks_empty_agents() {
        let agents = vec![Agent {
            agent_id: 5,
            agent_type: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            nom_velocity: 1.0,
            availability: 0.0,
        }];
        let compat = CompatibilityMatrix::new(1, 1);
        let outcome = solve(&agents, &[], &compat, 1, true).unwrap();
        let formatted = format_outcome(&outcome, &agents);
        assert!(formatted.contains("Agent 5"));
        assert!(formatted.contains("no tasks assigned"));
    }
}
