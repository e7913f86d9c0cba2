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

//! Loads the agent/task type catalog and default parameters from a JSON configuration document,
//! and builds the resulting [`CompatibilityMatrix`].
//!
//! The configuration format mirrors the original model's `config.json`: a list of agent type
//! names, a list of task type names, and a `*_DEFAULT` block per built-in type providing the
//! parameters used by [`crate::generate`].

use std::io::Read;

use serde::Deserialize;

use crate::CompatibilityMatrix;

/// Default parameters for one agent type, as found under `"QUAD_DEFAULT"`/`"CAR_DEFAULT"`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentTypeDefaults {
    #[serde(rename = "NOM_VELOCITY")]
    pub nom_velocity: f64,
}

/// Default parameters for one task type, as found under `"TRACK_DEFAULT"`/`"RESCUE_DEFAULT"`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskTypeDefaults {
    #[serde(rename = "TASK_VALUE")]
    pub task_value: f64,
    #[serde(rename = "START_TIME")]
    pub start_time: f64,
    #[serde(rename = "END_TIME")]
    pub end_time: f64,
    #[serde(rename = "DURATION")]
    pub duration: f64,
}

/// Raw shape of the configuration JSON document, deserialized directly.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "AGENT_TYPES")]
    agent_types: Vec<String>,
    #[serde(rename = "TASK_TYPES")]
    task_types: Vec<String>,
    #[serde(rename = "QUAD_DEFAULT")]
    quad_default: AgentTypeDefaults,
    #[serde(rename = "CAR_DEFAULT")]
    car_default: AgentTypeDefaults,
    #[serde(rename = "TRACK_DEFAULT")]
    track_default: TaskTypeDefaults,
    #[serde(rename = "RESCUE_DEFAULT")]
    rescue_default: TaskTypeDefaults,
}

/// Parsed configuration: the type catalogs, their defaults, and the derived compatibility rule.
#[derive(Debug, Clone)]
pub struct Config {
    pub agent_types: Vec<String>,
    pub task_types: Vec<String>,
    pub quad_default: AgentTypeDefaults,
    pub car_default: AgentTypeDefaults,
    pub track_default: TaskTypeDefaults,
    pub rescue_default: TaskTypeDefaults,
    pub compatibility: CompatibilityMatrix,
}

/// Errors raised while loading a [`Config`]. Distinct from [`crate::SolveError`]: these
/// originate from malformed ambient input, not from a violated solver invariant.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Config {
    /// Parse a configuration document from `reader`.
    ///
    /// The `quad -> track` and `car -> rescue` compatibility rules are wired in whenever those
    /// type names are present in `AGENT_TYPES`/`TASK_TYPES`; if either name is missing, a warning
    /// is logged and the corresponding rule is simply omitted from the matrix, rather than
    /// failing the whole load.
    pub fn from_json<R: Read>(mut reader: R) -> Result<Config, ConfigError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let raw: RawConfig = serde_json::from_str(&contents)?;

        let mut compatibility = CompatibilityMatrix::new(raw.agent_types.len(), raw.task_types.len());

        match (
            raw.agent_types.iter().position(|t| t == "quad"),
            raw.task_types.iter().position(|t| t == "track"),
        ) {
            (Some(quad), Some(track)) => compatibility.set(quad, track, true),
            _ => log::warn!("configuration has no \"quad\"/\"track\" pair; quad agents will not be assignable to track tasks"),
        }

        match (
            raw.agent_types.iter().position(|t| t == "car"),
            raw.task_types.iter().position(|t| t == "rescue"),
        ) {
            (Some(car), Some(rescue)) => compatibility.set(car, rescue, true),
            _ => log::warn!("configuration has no \"car\"/\"rescue\" pair; car agents will not be assignable to rescue tasks"),
        }

        Ok(Config {
            agent_types: raw.agent_types,
            task_types: raw.task_types,
            quad_default: raw.quad_default,
            car_default: raw.car_default,
            track_default: raw.track_default,
            rescue_default: raw.rescue_default,
            compatibility,
        })
    }
}
