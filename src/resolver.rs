//! Identifier resolution: dynasty / ruler / era names → table IDs.
//!
//! The same name can belong to several rows (魏 is both 曹魏 and 北魏),
//! so every lookup returns a set, and a token expands into one
//! [`IdentifierRow`] per combination.

use serde::{Deserialize, Serialize};
use tracing::debug;

use era_types::{DateToken, DynastyId, EraId, RulerId};

use crate::tables::ReferenceTables;

/// A dynasty together with its "part-of" children and its parent.
pub fn dynasty_family(tables: &ReferenceTables, id: DynastyId) -> Vec<DynastyId> {
    let mut ids = vec![id];
    ids.extend(tables.children_of(id));
    ids.extend(tables.parent_of(id));
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Dynasty name → matching IDs, expanded both ways along "part-of".
///
/// 唐 yields 唐 and 後唐; 後唐 yields 後唐 and 唐.
pub fn resolve_dynasty_name(tables: &ReferenceTables, name: &str) -> Vec<DynastyId> {
    let mut ids: Vec<DynastyId> = tables
        .dynasty_ids_named(name)
        .into_iter()
        .flat_map(|id| dynasty_family(tables, id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub fn resolve_ruler_name(tables: &ReferenceTables, name: &str) -> Vec<RulerId> {
    tables.ruler_ids_named(name)
}

pub fn resolve_era_name(tables: &ReferenceTables, name: &str) -> Vec<EraId> {
    tables.era_ids_named(name)
}

/// One token paired with one combination of resolved identifiers.
///
/// `None` on a field means the token gave nothing usable there: either no
/// identifier at all or a name with no matching row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRow {
    pub token: DateToken,
    pub dynasty_id: Option<DynastyId>,
    pub ruler_id: Option<RulerId>,
    pub era_id: Option<EraId>,
}

impl IdentifierRow {
    pub fn has_ids(&self) -> bool {
        self.dynasty_id.is_some() || self.ruler_id.is_some() || self.era_id.is_some()
    }
}

/// Options for one identifier field: an explicit ID wins, then the name's
/// matches, else a single `None`.
fn options<I: Copy>(explicit: Option<I>, name: Option<&str>, lookup: impl Fn(&str) -> Vec<I>) -> Vec<Option<I>> {
    if let Some(id) = explicit {
        return vec![Some(id)];
    }
    match name.map(&lookup) {
        Some(ids) if !ids.is_empty() => ids.into_iter().map(Some).collect(),
        _ => vec![None],
    }
}

/// Expand tokens into identifier rows.
///
/// Tokens without any identifier produce no rows.
pub fn resolve_identifiers(tokens: &[DateToken], tables: &ReferenceTables) -> Vec<IdentifierRow> {
    let mut out = Vec::new();
    for token in tokens.iter().filter(|t| t.has_identifier()) {
        let dyns = options(token.dynasty_id, token.dynasty.as_deref(), |n| {
            resolve_dynasty_name(tables, n)
        });
        let rulers = options(token.ruler_id, token.ruler.as_deref(), |n| {
            resolve_ruler_name(tables, n)
        });
        let eras = options(token.era_id, token.era.as_deref(), |n| resolve_era_name(tables, n));

        let before = out.len();
        for &dynasty_id in &dyns {
            for &ruler_id in &rulers {
                for &era_id in &eras {
                    out.push(IdentifierRow {
                        token: token.clone(),
                        dynasty_id,
                        ruler_id,
                        era_id,
                    });
                }
            }
        }
        debug!(index = token.index, rows = out.len() - before, "identifiers resolved");
    }
    out
}
