pub mod analyzer;
pub mod config;
pub mod prompt;
pub mod render;
pub mod session;
pub mod storage;

// Re-export core types for convenience
pub use phenomatch_core::{
    catalog, category, embedding, leaderboard, ranking, similarity, Catalog, Category, Embedding,
    Leaderboard,
};
pub use session::{Analysis, AnalyzeError, Session};
