// File I/O for match jobs: reference tables in, flagged tables and reports out

pub mod error;
pub mod export;
pub mod files;
pub mod naming;
pub mod table;

pub use error::IoError;
pub use export::{write_flagged_table, write_report, write_unmatched, ReportRow};
pub use files::{list_candidates, CandidateFile};
pub use table::{load_references, ReferenceTable};
