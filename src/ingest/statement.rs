use crate::error::{MatchError, RecordDiagnostic, RecordError};
use crate::ingest::parse::{parse_amount, parse_date};
use crate::models::{ColumnMapping, StatementTable, Transaction, TransactionId};
use indexmap::IndexMap;
use std::path::Path;

/// 列映射解析后的列下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub amount: usize,
    pub date: usize,
    pub description: usize,
}

/// 流水导入结果：有效交易 + 坏行诊断
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionBatch {
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<RecordDiagnostic>,
}

/// 校验列映射，只在导入时做一次
pub fn resolve_mapping(
    table: &StatementTable,
    mapping: &ColumnMapping,
) -> Result<ColumnIndices, MatchError> {
    let mut index: IndexMap<&str, usize> = IndexMap::with_capacity(table.columns.len());
    for (i, name) in table.columns.iter().enumerate() {
        if index.insert(name.as_str(), i).is_some() {
            return Err(MatchError::Configuration(format!(
                "statement has duplicate column '{name}'"
            )));
        }
    }

    let lookup = |field: &'static str, column: &str| -> Result<usize, MatchError> {
        if column.trim().is_empty() {
            return Err(MatchError::MissingMapping { field });
        }
        index
            .get(column)
            .copied()
            .ok_or_else(|| MatchError::UnknownColumn {
                field,
                column: column.to_string(),
            })
    };

    Ok(ColumnIndices {
        amount: lookup("amount_column", &mapping.amount_column)?,
        date: lookup("date_column", &mapping.date_column)?,
        description: lookup("description_column", &mapping.description_column)?,
    })
}

/// 按列映射把流水行转换为交易，交易标识 = 行号
pub fn parse_transactions(
    table: &StatementTable,
    mapping: &ColumnMapping,
) -> Result<TransactionBatch, MatchError> {
    let cols = resolve_mapping(table, mapping)?;
    let needed = cols.amount.max(cols.date).max(cols.description) + 1;

    let mut batch = TransactionBatch::default();
    for (row_idx, row) in table.rows.iter().enumerate() {
        match parse_row(row, &cols, needed, mapping.absolute_amounts) {
            Ok((amount, date, description)) => {
                batch
                    .transactions
                    .push(Transaction::new(row_idx, amount, date, description));
            }
            Err(error) => {
                let id = TransactionId(row_idx);
                tracing::warn!("交易 {} 无效, 已排除: {}", id, error);
                batch
                    .diagnostics
                    .push(RecordDiagnostic::transaction(id.to_string(), error));
            }
        }
    }

    tracing::info!(
        "流水导入完成: {} 行, 有效 {} 行, 排除 {} 行",
        table.len(),
        batch.transactions.len(),
        batch.diagnostics.len()
    );
    Ok(batch)
}

fn parse_row(
    row: &[String],
    cols: &ColumnIndices,
    needed: usize,
    absolute: bool,
) -> Result<(bigdecimal::BigDecimal, chrono::NaiveDate, String), RecordError> {
    if row.len() < needed {
        return Err(RecordError::RowWidth {
            expected: needed,
            found: row.len(),
        });
    }

    let raw_amount = row[cols.amount].trim();
    let mut amount = parse_amount(raw_amount).ok_or_else(|| RecordError::InvalidAmount {
        value: raw_amount.to_string(),
    })?;
    if absolute {
        amount = amount.abs();
    }

    let raw_date = row[cols.date].trim();
    let date = parse_date(raw_date).ok_or_else(|| RecordError::InvalidDate {
        value: raw_date.to_string(),
    })?;

    Ok((amount, date, row[cols.description].trim().to_string()))
}

/// 从 CSV 文本读取流水表；未指定分隔符时按表头在 `,` `;` `\t` 中自动识别
pub fn read_statement_csv(text: &str, delimiter: Option<u8>) -> Result<StatementTable, MatchError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(text));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(
        "读取 CSV 流水: 分隔符 {:?}, {} 列, {} 行",
        delimiter as char,
        columns.len(),
        rows.len()
    );
    Ok(StatementTable::new(columns, rows))
}

pub fn read_statement_file(path: &Path, delimiter: Option<u8>) -> Result<StatementTable, MatchError> {
    let text = std::fs::read_to_string(path)?;
    read_statement_csv(&text, delimiter)
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    [b';', b'\t', b',']
        .into_iter()
        .max_by_key(|d| header.bytes().filter(|b| b == d).count())
        .filter(|d| header.bytes().any(|b| b == *d))
        .unwrap_or(b',')
}
