use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::ingest::{parse_receipts, parse_transactions, ReceiptEntry};
use crate::models::{
    ColumnMapping, EnrichedTransaction, MatchReport, MatchResult, MatchStats, RawReceipt,
    Receipt, StatementTable, TransactionId, UnmatchedReason,
};
use crate::service::engine::{EngineOutput, MatchEngine};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::HashMap;

/// 对账服务：导入 → 匹配 → 合并结果与流水
pub struct MatcherService {
    engine: MatchEngine,
}

impl MatcherService {
    pub fn new(config: MatchingConfig) -> Result<Self, MatchError> {
        Ok(Self {
            engine: MatchEngine::new(config)?,
        })
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// 一次完整对账
    ///
    /// 列映射错误直接返回错误；单条坏记录只进诊断，对应收据标为 INVALID_RECORD，
    /// 对应流水行保留在输出中但不参与匹配。
    pub fn reconcile(
        &self,
        raw_receipts: &[RawReceipt],
        table: &StatementTable,
        mapping: &ColumnMapping,
    ) -> Result<MatchReport, MatchError> {
        // 1. 导入流水（含列映射校验）
        let tx_batch = parse_transactions(table, mapping)?;

        // 2. 导入收据
        let receipt_batch = parse_receipts(raw_receipts);
        let receipts: Vec<Receipt> = receipt_batch.valid().cloned().collect();
        tracing::info!(
            "收据导入完成: {} 张, 有效 {} 张",
            receipt_batch.len(),
            receipts.len()
        );

        // 3. 匹配
        let output = self.engine.run(&receipts, &tx_batch.transactions)?;

        // 4. 按输入顺序合并无效收据
        let mut engine_results = output.results.iter().cloned();
        let mut results = Vec::with_capacity(receipt_batch.len());
        for entry in &receipt_batch.entries {
            match entry {
                ReceiptEntry::Valid(_) => {
                    let result = engine_results.next().ok_or_else(|| {
                        MatchError::InvariantViolation(format!(
                            "engine returned no result for receipt '{}'",
                            entry.id()
                        ))
                    })?;
                    results.push(result);
                }
                ReceiptEntry::Invalid { id, vendor, .. } => {
                    results.push(MatchResult::unmatched(
                        id,
                        vendor,
                        UnmatchedReason::InvalidRecord,
                        0,
                    ));
                }
            }
        }

        // 5. 流水回填
        let transactions = enrich(table, &output, &receipts, &tx_batch.transactions);

        let mut diagnostics = receipt_batch.diagnostics();
        diagnostics.extend(tx_batch.diagnostics.iter().cloned());

        let stats = stats(
            self.engine.config(),
            &results,
            &transactions,
            tx_batch.diagnostics.len(),
            output.candidates.len(),
        );
        tracing::info!(
            "对账完成: 收据 {} 张, 匹配 {} 张, 无候选 {} 张, 被抢占 {} 张, 无效 {} 张; 未匹配交易 {} 笔",
            stats.receipts,
            stats.matched,
            stats.no_candidate,
            stats.lost_to_better_match,
            stats.invalid_receipts,
            stats.unmatched_transactions
        );

        Ok(MatchReport {
            results,
            columns: table.columns.clone(),
            transactions,
            diagnostics,
            stats,
        })
    }
}

struct Claim<'a> {
    receipt_id: &'a str,
    vendor: &'a str,
    receipt_date: NaiveDate,
    confidence: f64,
}

/// 每一行流水（含无效行）一条，附上认领它的收据
fn enrich(
    table: &StatementTable,
    output: &EngineOutput,
    receipts: &[Receipt],
    transactions: &[crate::models::Transaction],
) -> Vec<EnrichedTransaction> {
    let mut claims: HashMap<TransactionId, Claim> = HashMap::with_capacity(output.accepted.len());
    for &idx in &output.accepted {
        let c = &output.candidates[idx];
        let r = &receipts[c.receipt_idx];
        claims.insert(
            transactions[c.transaction_idx].id,
            Claim {
                receipt_id: &r.id,
                vendor: &r.vendor,
                receipt_date: r.date,
                confidence: c.confidence,
            },
        );
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let id = TransactionId(row_idx);
            let fields: IndexMap<String, String> = table
                .columns
                .iter()
                .enumerate()
                .map(|(i, col)| (col.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect();

            match claims.get(&id) {
                Some(claim) => EnrichedTransaction {
                    transaction_id: id,
                    fields,
                    matched: true,
                    receipt_id: Some(claim.receipt_id.to_string()),
                    vendor: Some(claim.vendor.to_string()),
                    receipt_date: Some(claim.receipt_date),
                    confidence: Some(claim.confidence),
                },
                None => EnrichedTransaction {
                    transaction_id: id,
                    fields,
                    matched: false,
                    receipt_id: None,
                    vendor: None,
                    receipt_date: None,
                    confidence: None,
                },
            }
        })
        .collect()
}

fn stats(
    config: &MatchingConfig,
    results: &[MatchResult],
    transactions: &[EnrichedTransaction],
    invalid_transactions: usize,
    candidates: usize,
) -> MatchStats {
    let count = |reason: UnmatchedReason| results.iter().filter(|r| r.reason == Some(reason)).count();
    let matched_transactions = transactions.iter().filter(|t| t.matched).count();

    MatchStats {
        assignment: config.assignment,
        receipts: results.len(),
        matched: results.iter().filter(|r| r.matched).count(),
        no_candidate: count(UnmatchedReason::NoCandidate),
        lost_to_better_match: count(UnmatchedReason::LostToBetterMatch),
        invalid_receipts: count(UnmatchedReason::InvalidRecord),
        transactions: transactions.len(),
        matched_transactions,
        unmatched_transactions: transactions.len() - matched_transactions,
        invalid_transactions,
        candidates,
    }
}
