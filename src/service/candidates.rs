use crate::config::MatchingConfig;
use crate::models::{Candidate, Receipt, SubScores, Transaction};
use crate::service::scoring::ConfidenceAggregator;
use crate::service::similarity::{NameSimilarity, PreparedText};
use crate::service::{amount, date};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;

/// 候选生成器
///
/// 金额 → 日期 → 名称 三道硬门槛依次过滤，全部通过才构造候选。
/// 相似度模型在打分开始前拟合完毕，打分阶段按收据并行、只读共享。
pub struct CandidateGenerator<'a> {
    config: &'a MatchingConfig,
    aggregator: ConfidenceAggregator,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(config: &'a MatchingConfig) -> Self {
        Self {
            config,
            aggregator: ConfidenceAggregator::new(config.weights),
        }
    }

    /// 用本批次全部商户名与交易描述拟合相似度模型
    pub fn fit_model(receipts: &[Receipt], transactions: &[Transaction]) -> NameSimilarity {
        NameSimilarity::fit(
            receipts
                .iter()
                .map(|r| r.vendor.as_str())
                .chain(transactions.iter().map(|t| t.description.as_str())),
        )
    }

    /// 生成全部候选，顺序为 (收据输入顺序, 交易输入顺序)
    pub fn generate(
        &self,
        model: &NameSimilarity,
        receipts: &[Receipt],
        transactions: &[Transaction],
    ) -> Vec<Candidate> {
        let descriptions: Vec<PreparedText> = transactions
            .par_iter()
            .map(|t| model.prepare(&t.description))
            .collect();
        let index = DateIndex::new(transactions);

        let per_receipt: Vec<Vec<Candidate>> = receipts
            .par_iter()
            .enumerate()
            .map(|(ri, receipt)| {
                let vendor = model.prepare(&receipt.vendor);
                index
                    .within(receipt.date, self.config.days_delta)
                    .into_iter()
                    .filter_map(|ti| {
                        self.evaluate(model, ri, receipt, &vendor, ti, &transactions[ti], &descriptions[ti])
                    })
                    .collect()
            })
            .collect();

        per_receipt.into_iter().flatten().collect()
    }

    /// 单个 (收据, 交易) 对；任一门槛不通过返回 None
    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        model: &NameSimilarity,
        receipt_idx: usize,
        receipt: &Receipt,
        vendor: &PreparedText,
        transaction_idx: usize,
        transaction: &Transaction,
        description: &PreparedText,
    ) -> Option<Candidate> {
        let cfg = self.config;
        let t1 = cfg.amount_tolerance_tier1;
        let t2 = cfg.amount_tolerance_tier2;

        let cmp = amount::compare(&receipt.total, &transaction.amount, t1, t2);
        let amount_score = cmp.score(t1, t2)?;

        let (date_offset, date_score) = date::score(receipt.date, transaction.date, cfg.days_delta)?;

        let name_score = model.score(vendor, description);
        if name_score < cfg.similarity_threshold {
            return None;
        }

        let scores = SubScores {
            amount: amount_score,
            date: date_score,
            name: name_score,
        };
        let confidence = self.aggregator.aggregate(&scores);

        tracing::debug!(
            "候选: 收据 {} <-> 交易 {} 档位 {} 偏移 {}天 相似度 {:.3} 置信度 {:.3}",
            receipt.id,
            transaction.id,
            cmp.tier,
            date_offset,
            name_score,
            confidence
        );

        Some(Candidate {
            receipt_idx,
            transaction_idx,
            tier: cmp.tier,
            relative_diff: cmp.relative_diff,
            date_offset,
            scores,
            confidence,
        })
    }
}

/// 按日期排序的交易下标，用于快速取出日期窗口内的交易
struct DateIndex {
    sorted: Vec<(NaiveDate, usize)>,
}

impl DateIndex {
    fn new(transactions: &[Transaction]) -> Self {
        let mut sorted: Vec<(NaiveDate, usize)> = transactions
            .iter()
            .enumerate()
            .map(|(i, t)| (t.date, i))
            .collect();
        sorted.sort_unstable();
        Self { sorted }
    }

    /// 窗口内交易下标，按输入顺序返回
    fn within(&self, center: NaiveDate, days: u32) -> Vec<usize> {
        let span = Duration::days(i64::from(days));
        let lo = center.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
        let hi = center.checked_add_signed(span).unwrap_or(NaiveDate::MAX);

        let start = self.sorted.partition_point(|(d, _)| *d < lo);
        let end = self.sorted.partition_point(|(d, _)| *d <= hi);
        let mut hits: Vec<usize> = self.sorted[start..end].iter().map(|(_, i)| *i).collect();
        hits.sort_unstable();
        hits
    }
}
