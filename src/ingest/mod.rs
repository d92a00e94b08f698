pub mod parse;
pub mod receipts;
pub mod statement;

pub use parse::{parse_amount, parse_date};
pub use receipts::{load_receipts_dir, load_receipts_json, parse_receipts, ReceiptBatch, ReceiptEntry};
pub use statement::{
    parse_transactions, read_statement_csv, read_statement_file, resolve_mapping, ColumnIndices,
    TransactionBatch,
};
