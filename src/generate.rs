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

//! Randomized scenario generation for tests and demos. Not used by [`crate::solver::solve`]
//! itself, which never needs randomness; kept behind `rand` so the solving core stays
//! deterministic and dependency-light.

use rand::Rng;

use crate::config::Config;
use crate::{Agent, Task, WorldInfo};

/// Generate `num_agents` agents and `num_tasks` tasks, scattered uniformly at random within
/// `world`'s bounds, alternating agents between `quad` and `car` type (and tasks between `track`
/// and `rescue`) so that roughly half of each fall to either type, mirroring the original
/// scenario generator's `idx / num <= 0.5` split.
///
/// Agent/task ids are assigned densely starting at 0. Z coordinates are fixed at 0 (ground-level
/// scenario), matching the original generator.
pub fn generate_scenario<R: Rng + ?Sized>(
    num_agents: usize,
    num_tasks: usize,
    world: &WorldInfo,
    config: &Config,
    rng: &mut R,
) -> (Vec<Agent>, Vec<Task>) {
    let quad_type = config
        .agent_types
        .iter()
        .position(|t| t == "quad")
        .unwrap_or(0);
    let car_type = config
        .agent_types
        .iter()
        .position(|t| t == "car")
        .unwrap_or(0);
    let track_type = config
        .task_types
        .iter()
        .position(|t| t == "track")
        .unwrap_or(0);
    let rescue_type = config
        .task_types
        .iter()
        .position(|t| t == "rescue")
        .unwrap_or(0);

    let agents = (0..num_agents)
        .map(|idx| {
            let homogeneous_half = idx as f64 / num_agents.max(1) as f64 <= 0.5;
            let (agent_type, nom_velocity) = if homogeneous_half {
                (quad_type, config.quad_default.nom_velocity)
            } else {
                (car_type, config.car_default.nom_velocity)
            };
            Agent {
                agent_id: idx as u32,
                agent_type,
                x: rng.gen_range(world.limit_x[0]..world.limit_x[1]),
                y: rng.gen_range(world.limit_y[0]..world.limit_y[1]),
                z: 0.0,
                nom_velocity,
                availability: 0.0,
            }
        })
        .collect();

    let tasks = (0..num_tasks)
        .map(|idx| {
            let track_half = idx as f64 / num_tasks.max(1) as f64 <= 0.5;
            let (task_type, defaults) = if track_half {
                (track_type, &config.track_default)
            } else {
                (rescue_type, &config.rescue_default)
            };
            Task {
                task_id: idx as u32,
                task_type,
                x: rng.gen_range(world.limit_x[0]..world.limit_x[1]),
                y: rng.gen_range(world.limit_y[0]..world.limit_y[1]),
                z: 0.0,
                start_time: defaults.start_time,
                end_time: defaults.end_time,
                duration: defaults.duration,
                task_value: defaults.task_value,
                discount: 0.0,
            }
        })
        .collect();

    (agents, tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config() -> Config {
        let json = r#"{
            "AGENT_TYPES": ["quad", "car"],
            "TASK_TYPES": ["track", "rescue"],
            "QUAD_DEFAULT": {"NOM_VELOCITY": 3.0},
            "CAR_DEFAULT": {"NOM_VELOCITY": 1.0},
            "TRACK_DEFAULT": {"TASK_VALUE": 100.0, "START_TIME": 0.0, "END_TIME": 100.0, "DURATION": 0.0},
            "RESCUE_DEFAULT": {"TASK_VALUE": 150.0, "START_TIME": 0.0, "END_TIME": 200.0, "DURATION": 5.0}
        }"#;
        Config::from_json(json.as_bytes()).unwrap()
    }

    #[test]
    fn generates_requested_counts_within_world_bounds() {
        let world = WorldInfo {
            limit_x: [0.0, 10.0],
            limit_y: [0.0, 10.0],
            limit_z: [0.0, 0.0],
        };
        let config = config();
        let mut rng = StdRng::seed_from_u64(42);

        let (agents, tasks) = generate_scenario(4, 6, &world, &config, &mut rng);

        assert_eq!(agents.len(), 4);
        assert_eq!(tasks.len(), 6);
        for agent in &agents {
            assert!(agent.x >= 0.0 && agent.x <= 10.0);
            assert!(agent.y >= 0.0 && agent.y <= 10.0);
        }
    }

    #[test]
    fn splits_agents_between_quad_and_car_types() {
        let world = WorldInfo {
            limit_x: [0.0, 10.0],
            limit_y: [0.0, 10.0],
            limit_z: [0.0, 0.0],
        };
        let config = config();
        let mut rng = StdRng::seed_from_u64(7);

        let (agents, _) = generate_scenario(4, 0, &world, &config, &mut rng);
        let quad_count = agents.iter().filter(|a| a.agent_type == 0).count();
        assert_eq!(quad_count, 2);
    }
}
