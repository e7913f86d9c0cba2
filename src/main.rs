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

use std::fs::File;

use log::{debug, error, info, warn};

use cbba_core::config::Config;

fn main() {
    // Setup logging & parse command line arguments
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "This is the CBBA task allocation solver, version {}",
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
    );
    let args = parse_cli_args();

    if args.get_one::<String>("OUTPUT").is_none() && !args.get_flag("print") {
        warn!("No OUTPUT file and no --print option given. Solution will not be exported anywhere.");
    }

    // Load the optional type configuration, if given, to get a non-default compatibility matrix.
    let config = args.get_one::<String>("config").map(|configpath: &String| {
        debug!("Opening config file {} ...", configpath);
        let file = std::fs::File::open(configpath).unwrap_or_else(|e| {
            error!("Could not open config file {}: {}", configpath, e);
            std::process::exit(exitcode::NOINPUT)
        });
        Config::from_json(file).unwrap_or_else(|e| {
            error!("Could not parse config file {}: {}", configpath, e);
            std::process::exit(exitcode::DATAERR)
        })
    });

    // Open input file
    let inpath: &String = args.get_one("INPUT").unwrap();
    debug!("Opening input file {} ...", inpath);
    let file = std::fs::File::open(inpath).unwrap_or_else(|e| {
        error!("Could not open input file {}: {}", inpath, e);
        std::process::exit(exitcode::NOINPUT)
    });
    let (agents, tasks, _world) = cbba_core::io::simple::read(file).unwrap_or_else(|e| {
        error!("Could not read input file: {}", e);
        std::process::exit(exitcode::DATAERR)
    });

    let compatibility = match &config {
        Some(config) => config.compatibility.clone(),
        None => {
            let mut m = cbba_core::CompatibilityMatrix::new(2, 2);
            m.set(0, 0, true); // quad -> track
            m.set(1, 1, true); // car -> rescue
            m
        }
    };

    // In debug build: check consistency of imported data
    if cfg!(debug_assertions) {
        cbba_core::io::assert_scenario_consistency(&agents, &tasks, &compatibility);
    }

    info!(
        "Found {} agent(s) and {} task(s) for CBBA assignment.",
        agents.len(),
        tasks.len()
    );
    debug!("Tasks:\n{}", cbba_core::io::debug_list_of_tasks(&tasks));

    if agents.is_empty() {
        error!("Solving a CBBA assignment is only possible with 1 or more agents.");
        std::process::exit(exitcode::DATAERR);
    }

    let max_depth: usize = *args.get_one("max-depth").unwrap();
    let time_window_flag = !args.get_flag("no-time-windows");

    // Execute the solver
    let outcome = match cbba_core::solver::solve(&agents, &tasks, &compatibility, max_depth, time_window_flag) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("CBBA solve failed: {}", e);
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    info!(
        "Finished solving CBBA assignment. Total score {:.2}, converged={}.",
        outcome.total_score, outcome.converged
    );
    if !outcome.converged {
        warn!("Solver hit the stall bound before converging; the result may still contain conflicts.");
    }

    if let Some(outpath) = args.get_one::<String>("OUTPUT") {
        debug!("Opening output file {} ...", outpath);
        match File::create(outpath) {
            Err(e) => error!("Could not open output file {}: {}.", outpath, e),
            Ok(file) => match cbba_core::io::simple::write_outcome(file, &outcome) {
                Ok(_) => debug!("Solution written to {}.", outpath),
                Err(e) => error!("Could not write solution to {}: {}.", outpath, e),
            },
        }
    }

    if args.get_flag("print") {
        print!(
            "The assignment is:\n{}",
            cbba_core::io::format_outcome(&outcome, &agents)
        );
    }
}

/// Helper function to construct and execute parser for command line options
fn parse_cli_args() -> clap::ArgMatches {
    clap::command!()
        .arg(
            clap::Arg::new("max-depth")
                .short('d')
                .long("max-depth")
                .help("Maximum number of tasks a single agent's bundle may hold")
                .value_name("DEPTH")
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("no-time-windows")
                .long("no-time-windows")
                .help(
                    "Ignore task start/end times and duration; score purely by travel distance \
                     from the agent's start position.",
                )
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help(
                    "Path to a JSON configuration file providing the agent/task type catalog and \
                     the resulting compatibility matrix. Defaults to the built-in quad/car, \
                     track/rescue types.",
                )
                .value_name("CONFIG"),
        )
        .arg(
            clap::Arg::new("print")
                .short('p')
                .long("print")
                .help("Print the calculated assignment to stdout in a human readable format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("INPUT")
                .help("Sets the scenario input file to use")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("OUTPUT")
                .help("Sets the solution output file to use")
                .index(2),
        )
        .get_matches()
}
