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

//! The consensus phase of CBBA: reconciling conflicting winner/winning-bid beliefs between
//! neighboring agents using the 17-entry action table of Choi, Brunet & How (2009), Table 1.
//!
//! `-1` is used throughout as the "no winner" sentinel, matching the rest of the crate.

use crate::SolveError;

/// Epsilon used for all bid comparisons in the consensus table, to treat near-equal bids as
/// ties broken by agent index rather than floating point noise.
const EPSILON: f64 = 1e-5;

/// Run one synchronous consensus round over the communication `graph`.
///
/// `winners` and `winner_bid` are each agent's belief vectors (`winners[i][j]`/`winner_bid[i][j]`);
/// they are read as a snapshot for the whole round and then overwritten in place with the
/// reconciled beliefs. `time_mat[i][k]` is agent i's freshest known iteration index for
/// information that originated at agent k; the returned matrix is the refreshed version.
///
/// `graph[k][i]` is true iff agent k's beliefs are visible to agent i this round. The spec's
/// default topology is the complete graph minus the self-loop diagonal.
pub fn communicate(
    winners: &mut Vec<Vec<i64>>,
    winner_bid: &mut Vec<Vec<f64>>,
    time_mat: &[Vec<u64>],
    graph: &[Vec<bool>],
    iter_idx: u64,
) -> Result<Vec<Vec<u64>>, SolveError> {
    let num_agents = winners.len();
    let num_tasks = if num_agents > 0 { winners[0].len() } else { 0 };

    let mut time_mat_new = time_mat.to_vec();
    let old_z = winners.clone();
    let old_y = winner_bid.clone();
    let mut z = old_z.clone();
    let mut y = old_y.clone();

    for k in 0..num_agents {
        for i in 0..num_agents {
            if !graph[k][i] {
                continue;
            }
            for j in 0..num_tasks {
                apply_table_entry(
                    &old_z,
                    &old_y,
                    &mut z,
                    &mut y,
                    time_mat,
                    &time_mat_new,
                    k,
                    i,
                    j,
                    num_agents,
                )?;
            }

            for n in 0..num_agents {
                if n != i && time_mat_new[i][n] < time_mat[k][n] {
                    time_mat_new[i][n] = time_mat[k][n];
                }
            }
            time_mat_new[i][k] = iter_idx;
        }
    }

    *winners = z;
    *winner_bid = y;
    Ok(time_mat_new)
}

/// Apply the sender-k/receiver-i/task-j entry of the CBBA action table, mutating `z`/`y` in
/// place. `old_z`/`old_y` are the round's read-only snapshot; `time_mat`/`time_mat_new` are the
/// prior and in-progress timestamp matrices, used to decide freshness for third-party claims.
fn apply_table_entry(
    old_z: &[Vec<i64>],
    old_y: &[Vec<f64>],
    z: &mut [Vec<i64>],
    y: &mut [Vec<f64>],
    time_mat: &[Vec<u64>],
    time_mat_new: &[Vec<u64>],
    k: usize,
    i: usize,
    j: usize,
    num_agents: usize,
) -> Result<(), SolveError> {
    let zk = old_z[k][j];
    let zi = z[i][j];
    let valid = |v: i64| v == -1 || (0..num_agents as i64).contains(&v);
    if !valid(zk) {
        return Err(SolveError::InconsistentConsensusState {
            receiver: k,
            task: j,
            value: zk,
        });
    }
    if !valid(zi) {
        return Err(SolveError::InconsistentConsensusState {
            receiver: i,
            task: j,
            value: zi,
        });
    }

    let update = |z: &mut [Vec<i64>], y: &mut [Vec<f64>]| {
        z[i][j] = old_z[k][j];
        y[i][j] = old_y[k][j];
    };
    let reset = |z: &mut [Vec<i64>], y: &mut [Vec<f64>]| {
        z[i][j] = -1;
        y[i][j] = -1.0;
    };
    let fresher = |m: usize| time_mat[k][m] > time_mat_new[i][m];
    let better_bid = |z: &[Vec<i64>], y: &[Vec<f64>]| {
        let diff = old_y[k][j] - y[i][j];
        diff > EPSILON || (diff.abs() <= EPSILON && z[i][j] > old_z[k][j])
    };

    if zk == k as i64 {
        // Entries 1-4: sender believes it owns the task.
        if zi == i as i64 {
            if better_bid(z, y) {
                update(z, y);
            }
        } else if zi == k as i64 {
            update(z, y);
        } else if zi > -1 {
            if fresher(zi as usize) || better_bid(z, y) {
                update(z, y);
            }
        } else if zi == -1 {
            update(z, y);
        } else {
            return Err(SolveError::InconsistentConsensusState {
                receiver: i,
                task: j,
                value: zi,
            });
        }
    } else if zk == i as i64 {
        // Entries 5-8: sender believes the receiver owns the task.
        if zi == i as i64 {
            // Leave.
        } else if zi == k as i64 {
            reset(z, y);
        } else if zi > -1 {
            if fresher(zi as usize) {
                reset(z, y);
            }
        } else if zi == -1 {
            // Leave.
        } else {
            return Err(SolveError::InconsistentConsensusState {
                receiver: i,
                task: j,
                value: zi,
            });
        }
    } else if zk > -1 {
        // Entries 9-13: sender believes some third agent m owns the task.
        let m = zk as usize;
        if zi == i as i64 {
            if fresher(m) && better_bid(z, y) {
                update(z, y);
            }
        } else if zi == k as i64 {
            if fresher(m) {
                update(z, y);
            } else {
                reset(z, y);
            }
        } else if zi == zk {
            if fresher(m) {
                update(z, y);
            }
        } else if zi > -1 {
            let zim = zi as usize;
            if fresher(zim) {
                if time_mat[k][m] >= time_mat_new[i][m] {
                    update(z, y);
                } else {
                    reset(z, y);
                }
            } else if fresher(m) && better_bid(z, y) {
                update(z, y);
            }
        } else if zi == -1 {
            if fresher(m) {
                update(z, y);
            }
        } else {
            return Err(SolveError::InconsistentConsensusState {
                receiver: i,
                task: j,
                value: zi,
            });
        }
    } else if zk == -1 {
        // Entries 14-17: sender believes no one owns the task.
        if zi == i as i64 {
            // Leave.
        } else if zi == k as i64 {
            update(z, y);
        } else if zi > -1 {
            if fresher(zi as usize) {
                update(z, y);
            }
        } else if zi == -1 {
            // Leave.
        } else {
            return Err(SolveError::InconsistentConsensusState {
                receiver: i,
                task: j,
                value: zi,
            });
        }
    } else {
        return Err(SolveError::InconsistentConsensusState {
            receiver: k,
            task: j,
            value: zk,
        });
    }

    Ok(())
}

/// Build the default communication graph: the complete graph minus the self-loop diagonal.
pub fn complete_graph(num_agents: usize) -> Vec<Vec<bool>> {
    (0..num_agents)
        .map(|k| (0..num_agents).map(|i| i != k).collect())
        .collect()
}
