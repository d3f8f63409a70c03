//! Rectangular minimum-cost assignment (Kuhn–Munkres family).
//!
//! Shortest-augmenting-path formulation: rows are inserted one at a time,
//! each via a Dijkstra-style search over reduced costs, followed by a dual
//! update and augmentation. Runs in O(nr² · nc) and handles rectangular
//! inputs directly as long as `nr <= nc` (the engine transposes otherwise).
//!
//! The solver is fully deterministic: fixed row insertion order, fixed
//! column scan order, and ties broken toward unassigned columns first.

use ndarray::Array2;

/// Solve the minimum-cost assignment for a finite cost matrix with
/// `nr <= nc`. Returns the assigned column for every row.
///
/// All costs must be finite; infeasibility cannot arise because every
/// row/column pair is assignable.
pub(crate) fn solve(cost: &Array2<f64>) -> Vec<usize> {
    let (nr, nc) = cost.dim();
    debug_assert!(nr <= nc, "solver requires nr <= nc; transpose first");

    let mut u = vec![0.0f64; nr];
    let mut v = vec![0.0f64; nc];
    let mut shortest_path_costs = vec![f64::INFINITY; nc];
    let mut path = vec![usize::MAX; nc];
    let mut col4row = vec![usize::MAX; nr];
    let mut row4col = vec![usize::MAX; nc];
    let mut sr = vec![false; nr];
    let mut sc = vec![false; nc];
    let mut remaining = vec![0usize; nc];

    for cur_row in 0..nr {
        sr.fill(false);
        sc.fill(false);
        shortest_path_costs.fill(f64::INFINITY);
        for (j, slot) in remaining.iter_mut().enumerate() {
            *slot = j;
        }
        let mut num_remaining = nc;
        let mut min_val = 0.0f64;
        let mut i = cur_row;
        let mut sink = usize::MAX;

        while sink == usize::MAX {
            let mut index = usize::MAX;
            let mut lowest = f64::INFINITY;
            sr[i] = true;

            for it in 0..num_remaining {
                let j = remaining[it];
                let reduced = min_val + cost[[i, j]] - u[i] - v[j];
                if reduced < shortest_path_costs[j] {
                    path[j] = i;
                    shortest_path_costs[j] = reduced;
                }
                if shortest_path_costs[j] < lowest
                    || (shortest_path_costs[j] == lowest && row4col[j] == usize::MAX)
                {
                    lowest = shortest_path_costs[j];
                    index = it;
                }
            }

            min_val = lowest;
            let j = remaining[index];
            if row4col[j] == usize::MAX {
                sink = j;
            } else {
                i = row4col[j];
            }
            sc[j] = true;
            num_remaining -= 1;
            remaining[index] = remaining[num_remaining];
        }

        u[cur_row] += min_val;
        for (row, visited) in sr.iter().enumerate() {
            if *visited && row != cur_row {
                u[row] += min_val - shortest_path_costs[col4row[row]];
            }
        }
        for (col, visited) in sc.iter().enumerate() {
            if *visited {
                v[col] -= min_val - shortest_path_costs[col];
            }
        }

        let mut j = sink;
        loop {
            let row = path[j];
            row4col[j] = row;
            std::mem::swap(&mut col4row[row], &mut j);
            if row == cur_row {
                break;
            }
        }
    }

    col4row
}
