//! Scenario-driven integration tests exercising the full `solve()` entry point, covering the
//! concrete scenarios and property-based invariants of the spec's testable properties.

use cbba_core::solver::solve;
use cbba_core::{Agent, CompatibilityMatrix, Task};

fn agent(agent_id: u32, agent_type: usize, x: f64, y: f64, nom_velocity: f64) -> Agent {
    Agent {
        agent_id,
        agent_type,
        x,
        y,
        z: 0.0,
        nom_velocity,
        availability: 0.0,
    }
}

fn task(
    task_id: u32,
    task_type: usize,
    x: f64,
    y: f64,
    start_time: f64,
    end_time: f64,
    duration: f64,
    task_value: f64,
) -> Task {
    Task {
        task_id,
        task_type,
        x,
        y,
        z: 0.0,
        start_time,
        end_time,
        duration,
        task_value,
        discount: 0.0,
    }
}

fn quad_compatibility() -> CompatibilityMatrix {
    let mut m = CompatibilityMatrix::new(1, 1);
    m.set(0, 0, true);
    m
}

#[test]
fn trivial_empty_scenario_converges_with_no_tasks() {
    let agents = vec![
        agent(0, 0, 0.0, 0.0, 1.0),
        agent(1, 0, 5.0, 5.0, 1.0),
        agent(2, 0, 9.0, 1.0, 1.0),
    ];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &[], &compat, 3, true).unwrap();

    assert!(outcome.converged);
    for path in &outcome.path_list {
        assert!(path.is_empty());
    }
    assert_eq!(outcome.total_score, 0.0);
}

#[test]
fn single_task_goes_to_the_closer_of_two_compatible_agents() {
    let agents = vec![
        agent(0, 0, 0.0, 0.0, 1.0),
        agent(1, 0, 0.0, 0.5, 1.0),
    ];
    let tasks = vec![task(0, 0, 1.0, 1.0, 0.0, 1000.0, 0.0, 10.0)];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &tasks, &compat, 2, true).unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.path_list[1], vec![0]);
    assert!(outcome.path_list[0].is_empty());
}

#[test]
fn identical_agents_break_conflict_by_smaller_index() {
    let agents = vec![
        agent(0, 0, 0.0, 0.0, 1.0),
        agent(1, 0, 0.0, 0.0, 1.0),
    ];
    let tasks = vec![task(0, 0, 1.0, 0.0, 0.0, 1000.0, 0.0, 10.0)];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &tasks, &compat, 2, true).unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.path_list[0], vec![0]);
    assert!(outcome.path_list[1].is_empty());
}

#[test]
fn infeasible_time_window_never_gets_added() {
    let agents = vec![agent(0, 0, 0.0, 0.0, 1.0)];
    // Travel time alone (10s) already exceeds the task's end_time: unreachable.
    let tasks = vec![task(0, 0, 10.0, 0.0, 0.0, 5.0, 0.0, 10.0)];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &tasks, &compat, 1, true).unwrap();

    assert!(outcome.converged);
    assert!(outcome.path_list[0].is_empty());
}

#[test]
fn full_bundle_caps_each_agent_at_max_depth() {
    let agents = vec![
        agent(0, 0, 0.0, 0.0, 1.0),
        agent(1, 0, 100.0, 100.0, 1.0),
    ];
    let tasks = vec![
        task(0, 0, 1.0, 0.0, 0.0, 1000.0, 0.0, 10.0),
        task(1, 0, 2.0, 0.0, 0.0, 1000.0, 0.0, 10.0),
        task(2, 0, 3.0, 0.0, 0.0, 1000.0, 0.0, 10.0),
        task(3, 0, 101.0, 100.0, 0.0, 1000.0, 0.0, 10.0),
        task(4, 0, 102.0, 100.0, 0.0, 1000.0, 0.0, 10.0),
    ];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &tasks, &compat, 1, true).unwrap();

    for path in &outcome.path_list {
        assert!(path.len() <= 1);
    }
}

#[test]
fn every_task_assigned_to_at_most_one_agent() {
    let agents = vec![
        agent(0, 0, 0.0, 0.0, 1.0),
        agent(1, 0, 10.0, 0.0, 1.0),
        agent(2, 0, 5.0, 5.0, 1.0),
    ];
    let tasks = vec![
        task(0, 0, 1.0, 0.0, 0.0, 1000.0, 1.0, 10.0),
        task(1, 0, 9.0, 0.0, 0.0, 1000.0, 1.0, 10.0),
        task(2, 0, 5.0, 4.0, 0.0, 1000.0, 1.0, 10.0),
        task(3, 0, 5.0, 6.0, 0.0, 1000.0, 1.0, 10.0),
    ];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &tasks, &compat, 4, true).unwrap();

    let mut seen = std::collections::HashSet::new();
    for path in &outcome.path_list {
        // No duplicates within one agent's own path.
        let mut within_agent = std::collections::HashSet::new();
        for &task_id in path {
            assert!(within_agent.insert(task_id), "duplicate task in one agent's path");
            assert!(seen.insert(task_id), "task {} assigned to more than one agent", task_id);
        }
    }
}

#[test]
fn scheduled_times_respect_time_windows_and_travel_separation() {
    let agents = vec![agent(0, 0, 0.0, 0.0, 2.0)];
    let tasks = vec![
        task(0, 0, 2.0, 0.0, 0.0, 1000.0, 3.0, 10.0),
        task(1, 0, 10.0, 0.0, 0.0, 1000.0, 1.0, 10.0),
    ];
    let compat = quad_compatibility();

    let outcome = solve(&agents, &tasks, &compat, 2, true).unwrap();

    let path = &outcome.path_list[0];
    let times = &outcome.times_list[0];
    assert_eq!(path.len(), 2);

    for (idx, &task_id) in path.iter().enumerate() {
        let t = tasks.iter().find(|t| t.task_id == task_id).unwrap();
        assert!(times[idx] >= t.start_time - 1e-9);
        assert!(times[idx] <= t.end_time + 1e-9);
    }
    // Travel between task 0 (x=2) and task 1 (x=10) at velocity 2 takes 4s, plus task 0's duration.
    assert!(times[1] >= times[0] + tasks[0].duration + 4.0 - 1e-9);
}

#[test]
fn incompatible_task_types_are_never_assigned() {
    let agents = vec![agent(0, 1, 0.0, 0.0, 1.0)]; // agent type 1, no compatible task type
    let tasks = vec![task(0, 0, 1.0, 0.0, 0.0, 1000.0, 0.0, 10.0)];
    let mut compat = CompatibilityMatrix::new(2, 1);
    compat.set(0, 0, true); // only agent type 0 may take task type 0

    let outcome = solve(&agents, &tasks, &compat, 1, true).unwrap();

    assert!(outcome.path_list[0].is_empty());
    assert_eq!(outcome.total_score, 0.0);
}

#[test]
fn solving_the_same_scenario_twice_is_deterministic() {
    let agents = vec![
        agent(0, 0, 0.0, 0.0, 1.0),
        agent(1, 0, 10.0, 0.0, 1.0),
        agent(2, 0, 5.0, 5.0, 1.0),
    ];
    let tasks = vec![
        task(0, 0, 1.0, 0.0, 0.0, 1000.0, 1.0, 10.0),
        task(1, 0, 9.0, 0.0, 0.0, 1000.0, 1.0, 10.0),
        task(2, 0, 5.0, 4.0, 0.0, 1000.0, 1.0, 10.0),
    ];
    let compat = quad_compatibility();

    let first = solve(&agents, &tasks, &compat, 4, true).unwrap();
    let second = solve(&agents, &tasks, &compat, 4, true).unwrap();

    assert_eq!(first.path_list, second.path_list);
    assert_eq!(first.times_list, second.times_list);
    assert_eq!(first.total_score, second.total_score);
}
