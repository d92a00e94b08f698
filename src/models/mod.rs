pub mod candidate;
pub mod receipt;
pub mod result;
pub mod transaction;

pub use candidate::{AmountTier, Candidate, SubScores};
pub use receipt::{RawAmount, RawReceipt, Receipt};
pub use result::{
    EnrichedTransaction, LostTo, MatchDetail, MatchReport, MatchResult, MatchStats,
    UnmatchedReason,
};
pub use transaction::{ColumnMapping, StatementTable, Transaction, TransactionId};
