pub mod ofx;
pub mod review;
pub mod sales;

pub use ofx::StatementRecord;
pub use review::{classify_all, classify_one, seed_candidates, TransactionCandidate};
pub use sales::{import_sales, SaleRow, SalesCsvError};
