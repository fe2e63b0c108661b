use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::ranking::{RankedEntry, RankedResult};

/// Where reference images and detail pages live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkLayout {
    pub image_root: String,
    /// Sub-path that primary entries resolve under.
    pub primary_dir: String,
    pub image_ext: String,
    pub detail_base: String,
}

impl Default for LinkLayout {
    fn default() -> Self {
        Self {
            image_root: "faces_lowres".to_string(),
            primary_dir: "basic".to_string(),
            image_ext: "jpg".to_string(),
            detail_base: "http://humanphenotypes.net".to_string(),
        }
    }
}

fn join(base: &str, parts: &[&str]) -> String {
    let mut out = base.trim_end_matches('/').to_string();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(part.trim_matches('/'));
    }
    out
}

impl LinkLayout {
    pub fn image_path(&self, name: &str, category: Category, is_primary: bool) -> String {
        let file = format!(
            "{}{}.{}",
            name.to_lowercase(),
            category.suffix(),
            self.image_ext
        );
        let dir = if is_primary { self.primary_dir.as_str() } else { "" };
        join(&self.image_root, &[dir, &file])
    }

    pub fn detail_url(&self, name: &str, is_primary: bool) -> String {
        let page = format!("{name}.html");
        let dir = if is_primary { self.primary_dir.as_str() } else { "" };
        join(&self.detail_base, &[dir, &page])
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub display_name: String,
    pub score: f64,
    pub similarity_percent: i64,
    pub image_path_hint: String,
    pub detail_url_hint: String,
    pub is_primary: bool,
}

/// Round half up, as the percentages are shown.
pub fn round_percent(score: f64) -> i64 {
    (score + 0.5).floor() as i64
}

impl MatchRecord {
    fn new(entry: &RankedEntry, category: Category, links: &LinkLayout) -> Self {
        Self {
            display_name: entry.name.clone(),
            score: entry.score,
            similarity_percent: round_percent(entry.score),
            image_path_hint: links.image_path(&entry.name, category, entry.is_primary),
            detail_url_hint: links.detail_url(&entry.name, entry.is_primary),
            is_primary: entry.is_primary,
        }
    }
}

/// Top match plus the full bounded list; `matches[0]` is the top match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub category: Category,
    pub top: MatchRecord,
    pub matches: Vec<MatchRecord>,
}

impl Leaderboard {
    pub fn new(ranked: &RankedResult, category: Category, links: &LinkLayout) -> Self {
        let matches: Vec<MatchRecord> = ranked
            .entries()
            .iter()
            .map(|e| MatchRecord::new(e, category, links))
            .collect();
        Self {
            category,
            top: MatchRecord::new(ranked.top(), category, links),
            matches,
        }
    }
}
