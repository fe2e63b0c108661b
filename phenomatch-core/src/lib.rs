pub mod catalog;
pub mod category;
pub mod embedding;
pub mod error;
pub mod leaderboard;
pub mod ranking;
pub mod similarity;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, CatalogGroup, DecodeReport};
pub use category::{Category, CategoryGate, Confirm};
pub use embedding::Embedding;
pub use error::{Error, Result};
pub use leaderboard::{Leaderboard, LinkLayout, MatchRecord};
pub use ranking::{rank, CutoffPolicy, RankOptions, RankedResult};
pub use similarity::{score, ScoreReport, ScoredCatalog};
