use crate::config::AssignmentPolicy;
use crate::error::RecordDiagnostic;
use crate::models::{AmountTier, SubScores, TransactionId};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

/// 未匹配原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnmatchedReason {
    /// 没有任何交易通过全部门槛
    NoCandidate,
    /// 有候选，但交易被分配给了置信度更高的收据
    LostToBetterMatch,
    /// 收据本身无法解析（金额/日期/字段缺失/重复标识）
    InvalidRecord,
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCandidate => write!(f, "NO_CANDIDATE"),
            Self::LostToBetterMatch => write!(f, "LOST_TO_BETTER_MATCH"),
            Self::InvalidRecord => write!(f, "INVALID_RECORD"),
        }
    }
}

/// 匹配明细
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDetail {
    pub transaction_id: TransactionId,
    pub transaction_amount: BigDecimal,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub confidence: f64,
    pub scores: SubScores,
    pub amount_tier: AmountTier,
    pub relative_difference: f64,
    pub date_offset_days: u32,
}

/// 败给其他收据的最佳候选
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LostTo {
    pub transaction_id: TransactionId,
    pub confidence: f64,
    pub winner_receipt_id: String,
}

/// 单张收据的匹配结果，每张输入收据恰好一条
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub receipt_id: String,
    pub vendor: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<MatchDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnmatchedReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_to: Option<LostTo>,
    /// 通过门槛的候选交易数
    pub candidate_count: usize,
}

impl MatchResult {
    pub fn matched(
        receipt_id: impl Into<String>,
        vendor: impl Into<String>,
        detail: MatchDetail,
        candidate_count: usize,
    ) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            vendor: vendor.into(),
            matched: true,
            detail: Some(detail),
            reason: None,
            lost_to: None,
            candidate_count,
        }
    }

    pub fn unmatched(
        receipt_id: impl Into<String>,
        vendor: impl Into<String>,
        reason: UnmatchedReason,
        candidate_count: usize,
    ) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            vendor: vendor.into(),
            matched: false,
            detail: None,
            reason: Some(reason),
            lost_to: None,
            candidate_count,
        }
    }

    pub fn with_lost_to(mut self, lost_to: LostTo) -> Self {
        self.lost_to = Some(lost_to);
        self
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.detail.as_ref().map(|d| d.transaction_id)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.detail.as_ref().map(|d| d.confidence)
    }
}

/// 追加了匹配字段的银行流水行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    pub transaction_id: TransactionId,
    /// 原始行（列名 -> 单元格，保持列序）
    pub fields: IndexMap<String, String>,
    pub matched: bool,
    pub receipt_id: Option<String>,
    pub vendor: Option<String>,
    pub receipt_date: Option<NaiveDate>,
    pub confidence: Option<f64>,
}

/// 运行统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub assignment: AssignmentPolicy,
    pub receipts: usize,
    pub matched: usize,
    pub no_candidate: usize,
    pub lost_to_better_match: usize,
    pub invalid_receipts: usize,
    pub transactions: usize,
    pub matched_transactions: usize,
    pub unmatched_transactions: usize,
    pub invalid_transactions: usize,
    pub candidates: usize,
}

/// 一次对账运行的完整输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub results: Vec<MatchResult>,
    pub columns: Vec<String>,
    pub transactions: Vec<EnrichedTransaction>,
    pub diagnostics: Vec<RecordDiagnostic>,
    pub stats: MatchStats,
}

impl MatchReport {
    /// 未被任何收据认领的交易
    pub fn unmatched_transactions(&self) -> impl Iterator<Item = &EnrichedTransaction> {
        self.transactions.iter().filter(|t| !t.matched)
    }

    pub fn result_for(&self, receipt_id: &str) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.receipt_id == receipt_id)
    }
}
