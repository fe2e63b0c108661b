//! Phenotype catalog: decoded reference embeddings grouped by family.
//!
//! Persisted layout, one JSON array per group:
//!
//! ```text
//! [ [name, embMale, embFemale], ..., [[name, embMale, embFemale], ...] ]
//! ```
//!
//! A group with one element holds only the nested list. With two or more, the
//! first element is the primary entry and the last is the nested list.

use serde_json::Value;
use std::fmt;

use crate::category::Category;
use crate::embedding::Embedding;
use crate::error::{EntryDecodeError, MalformedCatalogError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Primary,
    Nested(usize),
}

/// Where an entry lives inside the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryLocation {
    pub group: usize,
    pub member: Member,
}

impl fmt::Display for EntryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member {
            Member::Primary => write!(f, "group {} primary", self.group),
            Member::Nested(i) => write!(f, "group {} nested {}", self.group, i),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    embeddings: [Option<Embedding>; 2],
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, male: Option<Embedding>, female: Option<Embedding>) -> Self {
        Self {
            name: name.into(),
            embeddings: [male, female],
        }
    }

    /// Reference embedding for `category`, absent if it failed to decode.
    pub fn embedding(&self, category: Category) -> Option<&Embedding> {
        self.embeddings[category.slot()].as_ref()
    }

    fn to_payload(&self) -> Value {
        let slot = |c: Category| {
            self.embedding(c)
                .map(Embedding::to_base64)
                .unwrap_or_default()
        };
        Value::Array(vec![
            Value::String(self.name.clone()),
            Value::String(slot(Category::Male)),
            Value::String(slot(Category::Female)),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogGroup {
    pub primary: Option<CatalogEntry>,
    pub nested: Vec<CatalogEntry>,
}

impl CatalogGroup {
    /// No primary and no members: never ranked.
    pub fn is_degenerate(&self) -> bool {
        self.primary.is_none() && self.nested.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        usize::from(self.primary.is_some()) + self.nested.len()
    }
}

/// Decoded catalog. Read-only once loaded; scoring borrows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub groups: Vec<CatalogGroup>,
}

impl Catalog {
    pub fn new(groups: Vec<CatalogGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(CatalogGroup::entry_count).sum()
    }

    /// Re-encode into the persisted layout. Missing embeddings become "".
    pub fn to_payload(&self) -> Value {
        Value::Array(
            self.groups
                .iter()
                .map(|g| {
                    let nested = Value::Array(g.nested.iter().map(CatalogEntry::to_payload).collect());
                    match &g.primary {
                        Some(p) => Value::Array(vec![p.to_payload(), nested]),
                        None => Value::Array(vec![nested]),
                    }
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeIssue {
    pub location: EntryLocation,
    /// Embedding slot that failed; `None` when the whole entry was skipped.
    pub category: Option<Category>,
    pub error: EntryDecodeError,
}

/// Entries skipped for a bad shape, or kept without an embedding that failed
/// to decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
    pub issues: Vec<DecodeIssue>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parse a JSON catalog payload from text.
pub fn decode_str(raw: &str) -> Result<(Catalog, DecodeReport), MalformedCatalogError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| MalformedCatalogError::InvalidJson(e.to_string()))?;
    decode(&value)
}

/// Decode a persisted catalog payload.
pub fn decode(raw: &Value) -> Result<(Catalog, DecodeReport), MalformedCatalogError> {
    let groups = raw.as_array().ok_or(MalformedCatalogError::NotAList)?;
    let mut report = DecodeReport::default();
    let mut catalog = Catalog::default();

    for (gi, group) in groups.iter().enumerate() {
        let elements = group
            .as_array()
            .ok_or(MalformedCatalogError::GroupNotAList { group: gi })?;
        let (last, head) = elements
            .split_last()
            .ok_or(MalformedCatalogError::EmptyGroup { group: gi })?;
        let members = last
            .as_array()
            .ok_or(MalformedCatalogError::MissingNestedList { group: gi })?;

        let primary = match head.first() {
            Some(raw) => {
                let location = EntryLocation {
                    group: gi,
                    member: Member::Primary,
                };
                decode_entry(raw, location, &mut report)
            }
            None => None,
        };
        if head.len() > 1 {
            log::debug!("group {}: ignoring {} middle element(s)", gi, head.len() - 1);
        }

        let nested = members
            .iter()
            .enumerate()
            .filter_map(|(mi, raw)| {
                let location = EntryLocation {
                    group: gi,
                    member: Member::Nested(mi),
                };
                decode_entry(raw, location, &mut report)
            })
            .collect();

        let group = CatalogGroup { primary, nested };
        if group.is_degenerate() {
            log::warn!("group {} has no entries and will not be ranked", gi);
        }
        catalog.groups.push(group);
    }

    log::debug!(
        "decoded {} groups, {} entries, {} issue(s)",
        catalog.groups.len(),
        catalog.entry_count(),
        report.issues.len()
    );
    Ok((catalog, report))
}

/// Decode one `[name, male, female]` entry. A wrong shape skips the entry,
/// a bad embedding only drops that slot; both are recorded in `report`.
fn decode_entry(
    raw: &Value,
    location: EntryLocation,
    report: &mut DecodeReport,
) -> Option<CatalogEntry> {
    let fields: &[Value] = raw.as_array().map(Vec::as_slice).unwrap_or_default();
    let (name, male, female) = match fields {
        [Value::String(n), Value::String(m), Value::String(f)] => {
            (n.as_str(), m.as_str(), f.as_str())
        }
        _ => {
            let error = EntryDecodeError::BadShape {
                found: shape_of(raw),
            };
            log::warn!("{}: entry skipped: {}", location, error);
            report.issues.push(DecodeIssue {
                location,
                category: None,
                error,
            });
            return None;
        }
    };

    let mut slot = |encoded: &str, category: Category| match Embedding::from_base64(encoded) {
        Ok(e) => Some(e),
        Err(error) => {
            log::warn!("{} ({}): {} embedding skipped: {}", location, name, category.label(), error);
            report.issues.push(DecodeIssue {
                location,
                category: Some(category),
                error,
            });
            None
        }
    };
    let male = slot(male, Category::Male);
    let female = slot(female, Category::Female);
    Some(CatalogEntry::new(name, male, female))
}

fn shape_of(v: &Value) -> String {
    match v {
        Value::Array(a) if a.len() == 3 => "list with a non-string field".to_string(),
        Value::Array(a) => format!("list of {}", a.len()),
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::encode_embedding;
    use serde_json::json;

    fn entry(name: &str, m: &[f32], f: &[f32]) -> Value {
        json!([name, encode_embedding(m), encode_embedding(f)])
    }

    #[test]
    fn test_decode_group_shapes() {
        let raw = json!([
            [entry("Nordid", &[1.0, 0.0], &[0.0, 1.0]), [entry("Baltid", &[0.5, 0.5], &[0.2, 0.1])]],
            [[entry("Sinid", &[0.3, 0.3], &[0.1, 0.9])]],
            [entry("Lappid", &[1.0, 1.0], &[1.0, 1.0]), []],
        ]);
        let (catalog, report) = decode(&raw).unwrap();
        assert!(report.is_clean());
        assert_eq!(catalog.groups.len(), 3);

        let g0 = &catalog.groups[0];
        assert_eq!(g0.primary.as_ref().unwrap().name, "Nordid");
        assert_eq!(g0.nested[0].name, "Baltid");
        assert_eq!(
            g0.primary.as_ref().unwrap().embedding(Category::Female).unwrap().vector.to_vec(),
            vec![0.0, 1.0]
        );

        assert!(catalog.groups[1].primary.is_none());
        assert_eq!(catalog.groups[1].nested.len(), 1);
        assert!(catalog.groups[2].nested.is_empty());
        assert_eq!(catalog.entry_count(), 4);
    }

    #[test]
    fn test_middle_elements_ignored() {
        let raw = json!([[entry("A", &[1.0], &[1.0]), "ignored", 42, []]]);
        let (catalog, _) = decode(&raw).unwrap();
        assert_eq!(catalog.groups[0].primary.as_ref().unwrap().name, "A");
    }

    #[test]
    fn test_bad_embedding_is_recovered() {
        let raw = json!([[["Broken", "!!!", encode_embedding(&[1.0, 2.0])], []]]);
        let (catalog, report) = decode(&raw).unwrap();
        let p = catalog.groups[0].primary.as_ref().unwrap();
        assert!(p.embedding(Category::Male).is_none());
        assert!(p.embedding(Category::Female).is_some());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].category, Some(Category::Male));
        assert_eq!(
            report.issues[0].location,
            EntryLocation {
                group: 0,
                member: Member::Primary
            }
        );
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(decode(&json!({})), Err(MalformedCatalogError::NotAList));
        assert_eq!(
            decode(&json!([[]])),
            Err(MalformedCatalogError::EmptyGroup { group: 0 })
        );
        assert_eq!(
            decode(&json!([[[]], "x"])),
            Err(MalformedCatalogError::GroupNotAList { group: 1 })
        );
        assert_eq!(
            decode(&json!([[entry("A", &[1.0], &[1.0]), "not a list"]])),
            Err(MalformedCatalogError::MissingNestedList { group: 0 })
        );
    }

    #[test]
    fn test_bad_shape_entry_is_skipped() {
        let good = entry("Nordid", &[1.0, 0.0], &[0.0, 1.0]);
        let raw = json!([
            [good, [["Short", encode_embedding(&[1.0])], entry("Baltid", &[1.0, 0.1], &[0.1, 1.0])]],
            [good, []],
            [["Numeric", 7, encode_embedding(&[1.0])], []],
        ]);
        let (catalog, report) = decode(&raw).unwrap();

        assert_eq!(catalog.groups.len(), 3);
        assert_eq!(catalog.groups[0].nested.len(), 1);
        assert_eq!(catalog.groups[0].nested[0].name, "Baltid");
        assert!(catalog.groups[1].primary.is_some());
        assert!(catalog.groups[2].is_degenerate());
        assert_eq!(catalog.entry_count(), 3);

        assert_eq!(report.issues.len(), 2);
        let short = &report.issues[0];
        assert_eq!(
            short.location,
            EntryLocation {
                group: 0,
                member: Member::Nested(0)
            }
        );
        assert_eq!(short.category, None);
        assert_eq!(
            short.error,
            EntryDecodeError::BadShape {
                found: "list of 2".to_string()
            }
        );
        assert_eq!(
            report.issues[1].location,
            EntryLocation {
                group: 2,
                member: Member::Primary
            }
        );
        assert!(matches!(report.issues[1].error, EntryDecodeError::BadShape { .. }));
    }

    #[test]
    fn test_payload_round_trip() {
        let raw = json!([
            [entry("A", &[0.25, -1.0], &[3.0, 0.5]), [entry("A1", &[1.0, 2.0], &[2.0, 1.0])]],
            [[entry("B1", &[0.1, 0.2], &[0.3, 0.4])]],
        ]);
        let (catalog, _) = decode(&raw).unwrap();
        assert_eq!(catalog.to_payload(), raw);
    }
}
