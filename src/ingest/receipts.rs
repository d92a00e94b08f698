use crate::error::{MatchError, RecordDiagnostic, RecordError};
use crate::ingest::parse::{amount_from_f64, parse_amount, parse_date};
use crate::models::{RawAmount, RawReceipt, Receipt};
use indexmap::IndexSet;
use std::path::Path;

/// 输入收据的校验结果，保持输入顺序
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptEntry {
    Valid(Receipt),
    Invalid {
        id: String,
        vendor: String,
        error: RecordError,
    },
}

impl ReceiptEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Valid(r) => &r.id,
            Self::Invalid { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptBatch {
    pub entries: Vec<ReceiptEntry>,
}

impl ReceiptBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 可参与匹配的收据
    pub fn valid(&self) -> impl Iterator<Item = &Receipt> {
        self.entries.iter().filter_map(|e| match e {
            ReceiptEntry::Valid(r) => Some(r),
            ReceiptEntry::Invalid { .. } => None,
        })
    }

    pub fn diagnostics(&self) -> Vec<RecordDiagnostic> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                ReceiptEntry::Invalid { id, error, .. } => {
                    Some(RecordDiagnostic::receipt(id.clone(), error.clone()))
                }
                ReceiptEntry::Valid(_) => None,
            })
            .collect()
    }
}

/// 校验识别结果；坏记录记入诊断，不中断整批
pub fn parse_receipts(raw: &[RawReceipt]) -> ReceiptBatch {
    let mut seen: IndexSet<String> = IndexSet::with_capacity(raw.len());
    let mut entries = Vec::with_capacity(raw.len());

    for (idx, r) in raw.iter().enumerate() {
        let id = r
            .filename
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("receipt-{}", idx + 1));
        let vendor = r.vendor.as_deref().map(str::trim).unwrap_or_default().to_string();

        let entry = if !seen.insert(id.clone()) {
            Err(RecordError::DuplicateId { id: id.clone() })
        } else {
            validate(r).map(|(total, date)| Receipt::new(id.clone(), vendor.clone(), total, date))
        };

        match entry {
            Ok(receipt) => entries.push(ReceiptEntry::Valid(receipt)),
            Err(error) => {
                tracing::warn!("收据 {} 无效, 已排除: {}", id, error);
                entries.push(ReceiptEntry::Invalid { id, vendor, error });
            }
        }
    }

    ReceiptBatch { entries }
}

fn validate(r: &RawReceipt) -> Result<(bigdecimal::BigDecimal, chrono::NaiveDate), RecordError> {
    let total = match &r.total {
        None => return Err(RecordError::MissingField { field: "total".into() }),
        Some(RawAmount::Number(n)) => amount_from_f64(*n),
        Some(RawAmount::Text(s)) => parse_amount(s),
    }
    .ok_or_else(|| RecordError::InvalidAmount {
        value: r.total.as_ref().map(|t| t.to_string()).unwrap_or_default(),
    })?;

    let raw_date = r
        .date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RecordError::MissingField { field: "date".into() })?;
    let date = parse_date(raw_date).ok_or_else(|| RecordError::InvalidDate {
        value: raw_date.to_string(),
    })?;

    Ok((total, date))
}

/// 从 JSON 数组加载识别结果
pub fn load_receipts_json(text: &str) -> Result<Vec<RawReceipt>, MatchError> {
    Ok(serde_json::from_str(text)?)
}

/// 从目录加载识别结果：每个 `*.json` 文件一张收据，按文件名排序
///
/// 缺少 `filename` 时用 JSON 文件名（去掉扩展名）代替。无法解析的文件仍然
/// 产出一条只有标识的记录，后续校验会把它标为无效，而不是悄悄丢掉。
pub fn load_receipts_dir(dir: &Path) -> Result<Vec<RawReceipt>, MatchError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut receipts = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = std::fs::read_to_string(&path)?;

        let mut receipt = match serde_json::from_str::<RawReceipt>(&text) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("无法解析收据文件 {}: {}", path.display(), e);
                RawReceipt::default()
            }
        };
        if receipt.filename.as_deref().map_or(true, |f| f.trim().is_empty()) {
            receipt.filename = Some(stem);
        }
        receipts.push(receipt);
    }

    tracing::info!("从 {} 加载 {} 张收据", dir.display(), receipts.len());
    Ok(receipts)
}
