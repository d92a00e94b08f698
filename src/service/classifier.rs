use crate::models::{
    Candidate, LostTo, MatchDetail, MatchResult, Receipt, Transaction, UnmatchedReason,
};
use crate::service::assigner::rank;

/// 根据分配结果给每张收据定性，输出顺序与收据输入顺序一致
pub fn classify(
    receipts: &[Receipt],
    transactions: &[Transaction],
    candidates: &[Candidate],
    accepted: &[usize],
) -> Vec<MatchResult> {
    let mut by_receipt: Vec<Vec<usize>> = vec![Vec::new(); receipts.len()];
    for (idx, c) in candidates.iter().enumerate() {
        by_receipt[c.receipt_idx].push(idx);
    }

    let mut assigned_to_receipt: Vec<Option<usize>> = vec![None; receipts.len()];
    // 交易 -> 认领它的收据
    let mut claimed_by: Vec<Option<usize>> = vec![None; transactions.len()];
    for &idx in accepted {
        let c = &candidates[idx];
        assigned_to_receipt[c.receipt_idx] = Some(idx);
        claimed_by[c.transaction_idx] = Some(c.receipt_idx);
    }

    receipts
        .iter()
        .enumerate()
        .map(|(ri, receipt)| {
            let own = &by_receipt[ri];
            if let Some(idx) = assigned_to_receipt[ri] {
                let c = &candidates[idx];
                return MatchResult::matched(
                    &receipt.id,
                    &receipt.vendor,
                    detail(c, &transactions[c.transaction_idx]),
                    own.len(),
                );
            }

            if own.is_empty() {
                return MatchResult::unmatched(
                    &receipt.id,
                    &receipt.vendor,
                    UnmatchedReason::NoCandidate,
                    0,
                );
            }

            let result = MatchResult::unmatched(
                &receipt.id,
                &receipt.vendor,
                UnmatchedReason::LostToBetterMatch,
                own.len(),
            );

            // 最佳的、已被其他收据认领的候选
            let best = own
                .iter()
                .map(|&idx| &candidates[idx])
                .filter_map(|c| claimed_by[c.transaction_idx].map(|winner| (c, winner)))
                .min_by(|(a, _), (b, _)| rank(a, b, receipts, transactions));

            match best {
                Some((c, winner)) => result.with_lost_to(LostTo {
                    transaction_id: transactions[c.transaction_idx].id,
                    confidence: c.confidence,
                    winner_receipt_id: receipts[winner].id.clone(),
                }),
                None => result,
            }
        })
        .collect()
}

fn detail(c: &Candidate, transaction: &Transaction) -> MatchDetail {
    MatchDetail {
        transaction_id: transaction.id,
        transaction_amount: transaction.amount.clone(),
        transaction_date: transaction.date,
        description: transaction.description.clone(),
        confidence: c.confidence,
        scores: c.scores,
        amount_tier: c.tier,
        relative_difference: c.relative_diff,
        date_offset_days: c.date_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmountTier, SubScores, TransactionId};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn cand(r: usize, t: usize, confidence: f64) -> Candidate {
        Candidate {
            receipt_idx: r,
            transaction_idx: t,
            tier: AmountTier::Strict,
            relative_diff: 0.0,
            date_offset: 0,
            scores: SubScores { amount: 1.0, date: 1.0, name: 1.0 },
            confidence,
        }
    }

    #[test]
    fn classifies_matched_lost_and_no_candidate() {
        let receipts = vec![
            Receipt::new("a", "FNAC", BigDecimal::from(10), date()),
            Receipt::new("b", "FNAC", BigDecimal::from(10), date()),
            Receipt::new("c", "LIDL", BigDecimal::from(5), date()),
        ];
        let transactions = vec![Transaction::new(0, BigDecimal::from(10), date(), "FNAC")];
        let candidates = vec![cand(0, 0, 0.95), cand(1, 0, 0.9)];

        let results = classify(&receipts, &transactions, &candidates, &[0]);
        assert_eq!(results.len(), 3);

        assert!(results[0].matched);
        assert_eq!(results[0].transaction_id(), Some(TransactionId(0)));
        assert_eq!(results[0].candidate_count, 1);

        assert!(!results[1].matched);
        assert_eq!(results[1].reason, Some(UnmatchedReason::LostToBetterMatch));
        let lost = results[1].lost_to.as_ref().unwrap();
        assert_eq!(lost.winner_receipt_id, "a");
        assert_eq!(lost.transaction_id, TransactionId(0));
        assert!((lost.confidence - 0.9).abs() < 1e-12);

        assert_eq!(results[2].reason, Some(UnmatchedReason::NoCandidate));
        assert_eq!(results[2].candidate_count, 0);
        assert!(results[2].detail.is_none());
    }

    #[test]
    fn lost_to_reports_best_claimed_candidate() {
        let receipts = vec![
            Receipt::new("a", "X", BigDecimal::from(1), date()),
            Receipt::new("b", "X", BigDecimal::from(1), date()),
            Receipt::new("c", "X", BigDecimal::from(1), date()),
        ];
        let transactions = vec![
            Transaction::new(0, BigDecimal::from(1), date(), "X"),
            Transaction::new(1, BigDecimal::from(1), date(), "X"),
        ];
        // c 的两个候选都被抢走，报告置信度较高的那个
        let candidates = vec![
            cand(0, 0, 0.99),
            cand(1, 1, 0.98),
            cand(2, 0, 0.7),
            cand(2, 1, 0.8),
        ];
        let results = classify(&receipts, &transactions, &candidates, &[0, 1]);
        let lost = results[2].lost_to.as_ref().unwrap();
        assert_eq!(lost.transaction_id, TransactionId(1));
        assert_eq!(lost.winner_receipt_id, "b");
        assert_eq!(results[2].candidate_count, 2);
    }
}
