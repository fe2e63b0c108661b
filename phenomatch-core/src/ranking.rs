use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::similarity::{ScoredCatalog, ScoredEntry, ScoredGroup};

/// Default number of leaderboard rows.
pub const DEFAULT_LIMIT: usize = 10;

/// How the bounded result list is cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoffPolicy {
    /// Stop after `limit` rows, even in the middle of a group.
    #[default]
    Items,
    /// Keep the best `limit` groups and emit all of their rows.
    Groups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    pub limit: usize,
    pub cutoff: CutoffPolicy,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cutoff: CutoffPolicy::Items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub score: f64,
    pub is_primary: bool,
    /// Index of the group in the catalog as loaded.
    pub group: usize,
}

/// Leaderboard rows in display order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    entries: Vec<RankedEntry>,
}

impl RankedResult {
    /// `None` when there are no rows.
    pub fn new(entries: Vec<RankedEntry>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    /// First emitted row.
    pub fn top(&self) -> &RankedEntry {
        // Non-empty by construction.
        &self.entries[0]
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(entry: &ScoredEntry) -> f64 {
    entry.score.unwrap_or(f64::NEG_INFINITY)
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Best score reachable in a group, `-inf` when nothing in it was scored.
/// Expects `nested` already sorted.
pub fn group_score(group: &ScoredGroup) -> f64 {
    let primary = group.primary.as_ref().and_then(|p| p.score);
    let nested = group.nested.first().and_then(|n| n.score);
    match (primary, nested) {
        (Some(p), Some(n)) => p.max(n),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => f64::NEG_INFINITY,
    }
}

/// Order groups by group score and flatten into at most `limit` rows.
///
/// Within a group the primary entry is always emitted before its members,
/// whatever their scores. All sorts are stable, so ties keep catalog order.
pub fn rank(scored: &ScoredCatalog, options: &RankOptions) -> Result<RankedResult> {
    let mut groups: Vec<(usize, ScoredGroup)> = scored
        .groups
        .iter()
        .cloned()
        .enumerate()
        .filter(|(_, g)| g.primary.is_some() || !g.nested.is_empty())
        .collect();

    for (_, group) in groups.iter_mut() {
        group.nested.sort_by(|a, b| descending(key(a), key(b)));
    }
    let mut groups: Vec<(usize, f64, ScoredGroup)> = groups
        .into_iter()
        .map(|(i, g)| (i, group_score(&g), g))
        .collect();
    groups.sort_by(|a, b| descending(a.1, b.1));

    let mut entries = Vec::new();
    let mut emitted_groups = 0;
    for (index, _, group) in &groups {
        let full = match options.cutoff {
            CutoffPolicy::Items => entries.len() >= options.limit,
            CutoffPolicy::Groups => emitted_groups >= options.limit,
        };
        if full {
            break;
        }
        let before = entries.len();
        for entry in group.primary.iter().chain(group.nested.iter()) {
            if options.cutoff == CutoffPolicy::Items && entries.len() >= options.limit {
                break;
            }
            // Unscored entries have nothing to show.
            let Some(score) = entry.score else { continue };
            entries.push(RankedEntry {
                name: entry.name.clone(),
                score,
                is_primary: entry.is_primary,
                group: *index,
            });
        }
        if entries.len() > before {
            emitted_groups += 1;
        }
    }

    RankedResult::new(entries).ok_or_else(|| {
        log::info!("ranking produced no rows from {} group(s)", scored.groups.len());
        Error::EmptyCatalogResult
    })
}
