use crate::error::MatchError;
use crate::models::{EnrichedTransaction, MatchReport, MatchResult};
use std::io::Write;
use std::path::Path;

/// 回填到流水后追加的列
pub const ENRICHED_COLUMNS: [&str; 5] = [
    "receipt_found",
    "receipt_file",
    "vendor",
    "receipt_date",
    "confidence",
];

pub const RESULT_COLUMNS: [&str; 7] = [
    "receipt_id",
    "vendor",
    "status",
    "transaction_row",
    "confidence",
    "amount_tier",
    "date_offset_days",
];

fn option_to_csv<T: ToString>(val: &Option<T>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 写出回填后的流水：原始列 + 匹配列
pub fn write_enriched_csv<W: Write>(report: &MatchReport, writer: W) -> Result<(), MatchError> {
    let mut writer = csv::Writer::from_writer(writer);

    let header: Vec<&str> = report
        .columns
        .iter()
        .map(String::as_str)
        .chain(ENRICHED_COLUMNS)
        .collect();
    writer.write_record(&header)?;

    for tx in &report.transactions {
        writer.write_record(enriched_record(report, tx))?;
    }

    writer.flush()?;
    Ok(())
}

fn enriched_record(report: &MatchReport, tx: &EnrichedTransaction) -> Vec<String> {
    let mut record: Vec<String> = report
        .columns
        .iter()
        .map(|c| tx.fields.get(c).cloned().unwrap_or_default())
        .collect();
    record.push(tx.matched.to_string());
    record.push(option_to_csv(&tx.receipt_id));
    record.push(option_to_csv(&tx.vendor));
    record.push(
        tx.receipt_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    );
    record.push(format!("{:.2}", tx.confidence.unwrap_or(0.0)));
    record
}

/// 写出收据维度的结果，每张收据一行
pub fn write_results_csv<W: Write>(results: &[MatchResult], writer: W) -> Result<(), MatchError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(RESULT_COLUMNS)?;

    for result in results {
        let status = match result.reason {
            Some(reason) => reason.to_string(),
            None => "MATCHED".to_string(),
        };
        let detail = result.detail.as_ref();
        writer.write_record(&[
            result.receipt_id.clone(),
            result.vendor.clone(),
            status,
            option_to_csv(&detail.map(|d| d.transaction_id.0)),
            option_to_csv(&detail.map(|d| format!("{:.2}", d.confidence))),
            option_to_csv(&detail.map(|d| d.amount_tier)),
            option_to_csv(&detail.map(|d| d.date_offset_days)),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// 导出回填后的流水到 CSV 文件
pub fn export_to_csv(report: &MatchReport, output_path: &Path) -> Result<(), MatchError> {
    let file = std::fs::File::create(output_path)?;
    write_enriched_csv(report, file)?;
    tracing::info!(
        "已导出 {} 行流水到 {}",
        report.transactions.len(),
        output_path.display()
    );
    Ok(())
}
