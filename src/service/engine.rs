use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::models::{Candidate, MatchResult, Receipt, Transaction, TransactionId};
use crate::service::assigner;
use crate::service::candidates::CandidateGenerator;
use crate::service::classifier;
use std::collections::HashSet;
use std::time::Instant;

/// 引擎一次运行的输出
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// 每张收据一条，顺序同输入
    pub results: Vec<MatchResult>,
    pub candidates: Vec<Candidate>,
    /// 被接受的候选下标（升序）
    pub accepted: Vec<usize>,
}

impl EngineOutput {
    /// (收据标识, 交易标识) 形式的最终分配
    pub fn assignments<'a>(
        &'a self,
        receipts: &'a [Receipt],
        transactions: &'a [Transaction],
    ) -> impl Iterator<Item = (&'a str, TransactionId)> + 'a {
        self.accepted.iter().map(move |&idx| {
            let c = &self.candidates[idx];
            (receipts[c.receipt_idx].id.as_str(), transactions[c.transaction_idx].id)
        })
    }

    pub fn matched_count(&self) -> usize {
        self.accepted.len()
    }
}

/// 匹配引擎：候选生成 → 一对一分配 → 结果分类
///
/// 纯计算，无 I/O；同一输入与配置总是得到同一输出。
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: MatchingConfig,
}

impl MatchEngine {
    pub fn new(config: MatchingConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn run(
        &self,
        receipts: &[Receipt],
        transactions: &[Transaction],
    ) -> Result<EngineOutput, MatchError> {
        check_unique_ids(receipts, transactions)?;
        let started = Instant::now();

        tracing::info!(
            "开始匹配: {} 张收据, {} 笔交易, 策略 {}",
            receipts.len(),
            transactions.len(),
            self.config.assignment
        );

        // Phase 1: 拟合名称相似度模型
        let model = CandidateGenerator::fit_model(receipts, transactions);
        tracing::info!(
            "相似度模型: {} 篇文档, 词表 {} 个词",
            model.document_count(),
            model.vocabulary_size()
        );

        // Phase 2: 候选生成
        let generator = CandidateGenerator::new(&self.config);
        let candidates = generator.generate(&model, receipts, transactions);
        tracing::info!("候选生成完成: {} 个候选对", candidates.len());

        // Phase 3: 一对一分配
        let accepted = assigner::assign(self.config.assignment, &candidates, receipts, transactions)?;
        tracing::info!("分配完成: 接受 {} 个匹配", accepted.len());

        // Phase 4: 结果分类
        let results = classifier::classify(receipts, transactions, &candidates, &accepted);

        tracing::info!(
            "匹配结束: 匹配 {}/{} 张收据, 耗时 {:?}",
            accepted.len(),
            receipts.len(),
            started.elapsed()
        );

        Ok(EngineOutput {
            results,
            candidates,
            accepted,
        })
    }
}

fn check_unique_ids(receipts: &[Receipt], transactions: &[Transaction]) -> Result<(), MatchError> {
    let mut seen = HashSet::with_capacity(receipts.len());
    for r in receipts {
        if !seen.insert(r.id.as_str()) {
            return Err(MatchError::Configuration(format!(
                "duplicate receipt id '{}'",
                r.id
            )));
        }
    }
    let mut seen = HashSet::with_capacity(transactions.len());
    for t in transactions {
        if !seen.insert(t.id) {
            return Err(MatchError::Configuration(format!(
                "duplicate transaction id '{}'",
                t.id
            )));
        }
    }
    Ok(())
}
