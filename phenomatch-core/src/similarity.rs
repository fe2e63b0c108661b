use crate::catalog::{Catalog, CatalogEntry, EntryLocation, Member};
use crate::category::Category;
use crate::embedding::{similarity_percent, Embedding};
use crate::error::ScoreError;

/// Catalog entry paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub name: String,
    pub is_primary: bool,
    /// Percentage, `None` when the entry could not be compared.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredGroup {
    pub primary: Option<ScoredEntry>,
    pub nested: Vec<ScoredEntry>,
}

/// Per-analysis view of the catalog. Built fresh for every query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCatalog {
    pub category: Category,
    pub groups: Vec<ScoredGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreIssue {
    pub location: EntryLocation,
    pub name: String,
    pub error: ScoreError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    pub scored: usize,
    pub issues: Vec<ScoreIssue>,
}

/// Compare `query` against every entry's reference embedding for `category`.
///
/// Entries that cannot be compared are logged, recorded in the report and left
/// without a score; the pass always completes.
pub fn score(catalog: &Catalog, query: &Embedding, category: Category) -> (ScoredCatalog, ScoreReport) {
    let mut report = ScoreReport::default();
    let groups = catalog
        .groups
        .iter()
        .enumerate()
        .map(|(gi, group)| {
            let primary = group.primary.as_ref().map(|entry| {
                let location = EntryLocation {
                    group: gi,
                    member: Member::Primary,
                };
                score_entry(entry, location, query, category, &mut report)
            });
            let nested = group
                .nested
                .iter()
                .enumerate()
                .map(|(mi, entry)| {
                    let location = EntryLocation {
                        group: gi,
                        member: Member::Nested(mi),
                    };
                    score_entry(entry, location, query, category, &mut report)
                })
                .collect();
            ScoredGroup { primary, nested }
        })
        .collect();

    log::debug!(
        "scored {} entries as {}, {} skipped",
        report.scored,
        category,
        report.issues.len()
    );
    (ScoredCatalog { category, groups }, report)
}

fn score_entry(
    entry: &CatalogEntry,
    location: EntryLocation,
    query: &Embedding,
    category: Category,
    report: &mut ScoreReport,
) -> ScoredEntry {
    let result = entry
        .embedding(category)
        .ok_or(ScoreError::MissingEmbedding)
        .and_then(|reference| similarity_percent(reference, query));
    let score = match result {
        Ok(s) => {
            report.scored += 1;
            Some(s)
        }
        Err(error) => {
            log::warn!("{} ({}): not scored: {}", location, entry.name, error);
            report.issues.push(ScoreIssue {
                location,
                name: entry.name.clone(),
                error,
            });
            None
        }
    };
    ScoredEntry {
        name: entry.name.clone(),
        is_primary: location.member == Member::Primary,
        score,
    }
}
