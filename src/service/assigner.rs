use crate::config::AssignmentPolicy;
use crate::error::MatchError;
use crate::models::{Candidate, Receipt, Transaction};
use pathfinding::kuhn_munkres::{kuhn_munkres_min, Weights};
use std::cmp::Ordering;
use std::collections::HashSet;

/// 候选优先级：置信度高 → 日期偏移小 → 金额差小 → 收据标识小 → 交易标识小
pub fn rank(a: &Candidate, b: &Candidate, receipts: &[Receipt], transactions: &[Transaction]) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.date_offset.cmp(&b.date_offset))
        .then_with(|| a.relative_diff.total_cmp(&b.relative_diff))
        .then_with(|| receipts[a.receipt_idx].id.cmp(&receipts[b.receipt_idx].id))
        .then_with(|| transactions[a.transaction_idx].id.cmp(&transactions[b.transaction_idx].id))
}

/// 一对一分配，返回被接受的候选下标（升序）
pub fn assign(
    policy: AssignmentPolicy,
    candidates: &[Candidate],
    receipts: &[Receipt],
    transactions: &[Transaction],
) -> Result<Vec<usize>, MatchError> {
    let mut accepted = match policy {
        AssignmentPolicy::Greedy => greedy(candidates, receipts, transactions),
        AssignmentPolicy::Optimal => optimal(candidates, receipts, transactions),
    };
    accepted.sort_unstable();
    verify_one_to_one(&accepted, candidates)?;
    Ok(accepted)
}

/// 贪心：按优先级依次接受两端都空闲的候选
pub fn greedy(candidates: &[Candidate], receipts: &[Receipt], transactions: &[Transaction]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| rank(&candidates[a], &candidates[b], receipts, transactions));

    let mut receipt_taken = vec![false; receipts.len()];
    let mut transaction_taken = vec![false; transactions.len()];
    let mut accepted = Vec::new();

    for idx in order {
        let c = &candidates[idx];
        if receipt_taken[c.receipt_idx] || transaction_taken[c.transaction_idx] {
            continue;
        }
        receipt_taken[c.receipt_idx] = true;
        transaction_taken[c.transaction_idx] = true;
        accepted.push(idx);
    }

    accepted
}

/// 最优：二分图最大权匹配（Kuhn-Munkres）
///
/// 只把有候选的收据/交易放进矩阵；行按收据标识排序、列按交易标识排序，
/// 同一输入总是得到同一结果。
pub fn optimal(candidates: &[Candidate], receipts: &[Receipt], transactions: &[Transaction]) -> Vec<usize> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<usize> = candidates.iter().map(|c| c.receipt_idx).collect();
    rows.sort_unstable_by(|&a, &b| receipts[a].id.cmp(&receipts[b].id));
    rows.dedup();
    let mut cols: Vec<usize> = candidates.iter().map(|c| c.transaction_idx).collect();
    cols.sort_unstable_by(|&a, &b| transactions[a].id.cmp(&transactions[b].id));
    cols.dedup();

    let row_of = position_map(&rows, receipts.len());
    let col_of = position_map(&cols, transactions.len());

    let mut weights = vec![vec![0.0; cols.len()]; rows.len()];
    let mut edge: Vec<Vec<Option<usize>>> = vec![vec![None; cols.len()]; rows.len()];
    for (idx, c) in candidates.iter().enumerate() {
        let (r, t) = (row_of[c.receipt_idx], col_of[c.transaction_idx]);
        weights[r][t] = c.confidence;
        edge[r][t] = Some(idx);
    }

    max_weight_assignment(&weights)
        .into_iter()
        .enumerate()
        .filter_map(|(r, col)| col.and_then(|t| edge[r][t]))
        .collect()
}

fn position_map(items: &[usize], len: usize) -> Vec<usize> {
    let mut map = vec![usize::MAX; len];
    for (pos, &item) in items.iter().enumerate() {
        map[item] = pos;
    }
    map
}

/// 置信度换算成整数权重的倍数
const WEIGHT_SCALE: f64 = 1e9;

/// 补零成方阵的权重矩阵，`at` 取负以便用最小费用求最大权
struct SquareMatrix {
    data: Vec<Vec<i64>>,
    size: usize,
}

impl SquareMatrix {
    fn new(data: Vec<Vec<i64>>) -> Self {
        let size = data.len();
        Self { data, size }
    }
}

impl Weights<i64> for SquareMatrix {
    fn rows(&self) -> usize {
        self.size
    }

    fn columns(&self) -> usize {
        self.size
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        -self.data.get(row).and_then(|r| r.get(col)).copied().unwrap_or(0)
    }

    fn neg(&self) -> Self {
        let data = self.data.iter().map(|row| row.iter().map(|&v| -v).collect()).collect();
        Self { data, size: self.size }
    }
}

/// 最大权分配：返回每行分到的列（行数多于列数时部分行为 None）
///
/// 权重为 0 的格子视为无边，分到补零列或无边格子的行都返回 None。
pub fn max_weight_assignment(weights: &[Vec<f64>]) -> Vec<Option<usize>> {
    let rows = weights.len();
    let cols = weights.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return vec![None; rows];
    }

    let n = rows.max(cols);
    let mut data = vec![vec![0i64; n]; n];
    for (i, row) in weights.iter().enumerate() {
        for (j, &w) in row.iter().enumerate().take(cols) {
            data[i][j] = (w * WEIGHT_SCALE).round() as i64;
        }
    }

    let matrix = SquareMatrix::new(data);
    let (_, assignments) = kuhn_munkres_min(&matrix);
    assignments
        .into_iter()
        .take(rows)
        .enumerate()
        .map(|(i, j)| (j < cols && matrix.data[i][j] > 0).then_some(j))
        .collect()
}

/// 校验一对一：任何收据或交易被认领两次都是分配算法缺陷，必须中止
pub fn verify_one_to_one(accepted: &[usize], candidates: &[Candidate]) -> Result<(), MatchError> {
    let mut receipts = HashSet::with_capacity(accepted.len());
    let mut transactions = HashSet::with_capacity(accepted.len());
    for &idx in accepted {
        let c = candidates.get(idx).ok_or_else(|| {
            MatchError::InvariantViolation(format!("accepted candidate {idx} does not exist"))
        })?;
        if !receipts.insert(c.receipt_idx) {
            return Err(MatchError::InvariantViolation(format!(
                "receipt #{} assigned twice",
                c.receipt_idx
            )));
        }
        if !transactions.insert(c.transaction_idx) {
            return Err(MatchError::InvariantViolation(format!(
                "transaction #{} assigned twice",
                c.transaction_idx
            )));
        }
    }
    Ok(())
}
