//! Minimum-cost one-to-one assignment (Hungarian method with potentials).

/// Cost given to pairs that must never be accepted. Large enough that the
/// solver only uses such an edge when a row has nothing else left.
pub const INFEASIBLE_COST: i64 = 1_000_000;

/// Solve a rectangular assignment problem.
///
/// `cost[row][col]`; every row must have the same length. Returns, for each
/// row, the column it was assigned, with at most one row per column. When
/// there are more rows than columns the surplus rows get `None`. Ties go to
/// the lowest column index.
pub fn solve(cost: &[Vec<i64>]) -> Vec<Option<usize>> {
    let rows = cost.len();
    if rows == 0 {
        return Vec::new();
    }
    let cols = cost[0].len();
    debug_assert!(cost.iter().all(|r| r.len() == cols), "ragged cost matrix");
    if cols == 0 {
        return vec![None; rows];
    }

    if rows <= cols {
        return hungarian(rows, cols, |i, j| cost[i][j]);
    }

    // The solver needs rows <= cols: run on the transpose and invert.
    let by_col = hungarian(cols, rows, |i, j| cost[j][i]);
    let mut out = vec![None; rows];
    for (col, row) in by_col.into_iter().enumerate() {
        if let Some(row) = row {
            out[row] = Some(col);
        }
    }
    out
}

/// O(n²m) shortest-augmenting-path formulation, 1-indexed internally.
/// Column 0 is a sentinel. Requires `n <= m`.
fn hungarian(n: usize, m: usize, cost: impl Fn(usize, usize) -> i64) -> Vec<Option<usize>> {
    let inf = i64::MAX / 4;
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; m + 1];
    // p[j]: row currently holding column j (0 = free)
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![inf; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = inf;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let cur = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![None; n];
    for j in 1..=m {
        if p[j] != 0 {
            assignment[p[j] - 1] = Some(j - 1);
        }
    }
    assignment
}
