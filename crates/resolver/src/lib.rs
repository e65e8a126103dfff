//! `titlematch-resolver`: fuzzy title resolution engine.
//!
//! Pure engine crate: receives candidate strings and reference titles,
//! returns match decisions. No CLI or IO dependencies.

pub mod assignment;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod similarity;
pub mod summary;

pub use config::{MatchConfig, ResolverConfig};
pub use error::ResolveError;
pub use model::{BatchSummary, MatchMode, MatchResult, ReferenceRecord};
pub use normalize::{normalize, Normalizer};
pub use resolver::{resolve_batch, resolve_one, Resolver};
pub use similarity::{score, Scorer};
pub use summary::summarize;
