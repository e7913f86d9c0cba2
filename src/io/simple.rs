// Copyright 2020 by Michael Thies <mail@mhthies.de>

use serde_json::json;

use crate::solver::SolveOutcome;
use crate::{Agent, Task, WorldInfo};

/// Read a scenario (agents, tasks and the world bounds) from the simple JSON representation
/// (canonical `serde_json` serialization of `Agent`, `Task` and `WorldInfo`).
pub fn read<R: std::io::Read>(reader: R) -> Result<(Vec<Agent>, Vec<Task>, WorldInfo), String> {
    let mut data: serde_json::Value =
        serde_json::from_reader(reader).map_err(|err| err.to_string())?;

    let agents: Vec<Agent> =
        serde_json::from_value(data["agents"].take()).map_err(|e| format!("{}", e))?;
    let tasks: Vec<Task> =
        serde_json::from_value(data["tasks"].take()).map_err(|e| format!("{}", e))?;
    let world: WorldInfo =
        serde_json::from_value(data["world"].take()).map_err(|e| format!("{}", e))?;

    Ok((agents, tasks, world))
}

/// Write a scenario (agents, tasks and the world bounds) to the simple JSON representation.
pub fn write_scenario<W: std::io::Write>(
    writer: W,
    agents: &[Agent],
    tasks: &[Task],
    world: &WorldInfo,
) -> Result<(), String> {
    let a: serde_json::Value = serde_json::to_value(agents).map_err(|e| format!("{}", e))?;
    let t: serde_json::Value = serde_json::to_value(tasks).map_err(|e| format!("{}", e))?;
    let w: serde_json::Value = serde_json::to_value(world).map_err(|e| format!("{}", e))?;
    let data = json!({
        "format": "X-cbba-scenario-simple",
        "version": "1.0",
        "agents": a,
        "tasks": t,
        "world": w,
    });
    serde_json::to_writer(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}

/// Write a solver outcome as the simple JSON representation (canonical `serde_json`
/// serialization of `SolveOutcome`) to a writer (e.g. an output file).
pub fn write_outcome<W: std::io::Write>(writer: W, outcome: &SolveOutcome) -> Result<(), String> {
    let o: serde_json::Value = serde_json::to_value(outcome).map_err(|e| format!("{}", e))?;
    let data = json!({
        "format": "X-cbba-outcome-simple",
        "version": "1.0",
        "outcome": o,
    });
    serde_json::to_writer(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}
