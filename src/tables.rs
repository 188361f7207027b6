//! Immutable reference tables: dynasties, rulers, eras and lunations.
//!
//! Built once per run and shared read-only by every stage. Ordered maps
//! keep every lookup deterministic.

use std::collections::{BTreeMap, BTreeSet};

use era_types::{CalendarStream, Dynasty, DynastyId, Era, EraId, LunarMonth, Ruler, RulerId};

use crate::error::{ResolveError, Result};

#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    dynasties: BTreeMap<DynastyId, Dynasty>,
    rulers: BTreeMap<RulerId, Ruler>,
    eras: BTreeMap<EraId, Era>,
    /// (stream, civil year) → lunations in calendar order
    lunar: BTreeMap<(CalendarStream, i32), Vec<LunarMonth>>,
    dynasty_names: BTreeMap<String, BTreeSet<DynastyId>>,
    ruler_names: BTreeMap<String, BTreeSet<RulerId>>,
    era_names: BTreeMap<String, BTreeSet<EraId>>,
    children: BTreeMap<DynastyId, BTreeSet<DynastyId>>,
}

impl ReferenceTables {
    /// Index and validate raw table rows.
    ///
    /// `dynasty_names` and `ruler_names` are alias lists; every row's own
    /// name is indexed as well.
    pub fn new(
        dynasties: Vec<Dynasty>,
        rulers: Vec<Ruler>,
        eras: Vec<Era>,
        lunar_months: Vec<LunarMonth>,
        dynasty_names: Vec<(String, DynastyId)>,
        ruler_names: Vec<(String, RulerId)>,
    ) -> Result<Self> {
        let mut t = ReferenceTables::default();

        for d in dynasties {
            t.dynasty_names.entry(d.name.clone()).or_default().insert(d.id);
            t.dynasties.insert(d.id, d);
        }
        for r in rulers {
            if !r.name.is_empty() {
                t.ruler_names.entry(r.name.clone()).or_default().insert(r.id);
            }
            t.rulers.insert(r.id, r);
        }
        for e in eras {
            t.era_names.entry(e.name.clone()).or_default().insert(e.id);
            t.eras.insert(e.id, e);
        }
        for (name, id) in dynasty_names {
            t.dynasty_names.entry(name).or_default().insert(id);
        }
        for (name, id) in ruler_names {
            t.ruler_names.entry(name).or_default().insert(id);
        }

        t.index_hierarchy()?;
        t.index_lunar(lunar_months)?;
        Ok(t)
    }

    fn index_hierarchy(&mut self) -> Result<()> {
        for d in self.dynasties.values() {
            if let Some(parent) = d.part_of {
                if !self.dynasties.contains_key(&parent) {
                    return Err(ResolveError::UnknownParent {
                        dynasty: d.id,
                        parent,
                    });
                }
                self.children.entry(parent).or_default().insert(d.id);
            }
        }
        // part_of must form a forest
        for &start in self.dynasties.keys() {
            let mut seen = BTreeSet::from([start]);
            let mut cur = start;
            while let Some(parent) = self.dynasties.get(&cur).and_then(|d| d.part_of) {
                if !seen.insert(parent) {
                    return Err(ResolveError::DynastyCycle(start));
                }
                cur = parent;
            }
        }
        Ok(())
    }

    fn index_lunar(&mut self, months: Vec<LunarMonth>) -> Result<()> {
        let mut keys = BTreeSet::new();
        for m in months {
            if !keys.insert((m.calendar_stream, m.year, m.month, m.intercalary)) {
                return Err(ResolveError::DuplicateLunation {
                    stream: m.calendar_stream,
                    year: m.year,
                    month: m.month,
                    intercalary: m.intercalary,
                });
            }
            self.lunar.entry((m.calendar_stream, m.year)).or_default().push(m);
        }
        for rows in self.lunar.values_mut() {
            rows.sort_by_key(|m| m.new_moon_jdn);
        }
        Ok(())
    }

    // ── Row lookups ──────────────────────────────────────────────────

    pub fn dynasty(&self, id: DynastyId) -> Option<&Dynasty> {
        self.dynasties.get(&id)
    }

    pub fn ruler(&self, id: RulerId) -> Option<&Ruler> {
        self.rulers.get(&id)
    }

    pub fn era(&self, id: EraId) -> Option<&Era> {
        self.eras.get(&id)
    }

    pub fn eras(&self) -> impl Iterator<Item = &Era> {
        self.eras.values()
    }

    /// Canonical ruler name: the row's own, else its first alias.
    pub fn ruler_name(&self, id: RulerId) -> Option<&str> {
        let r = self.rulers.get(&id)?;
        if !r.name.is_empty() {
            return Some(&r.name);
        }
        self.ruler_names
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(name, _)| name.as_str())
    }

    // ── Name lookups ─────────────────────────────────────────────────

    pub fn dynasty_ids_named(&self, name: &str) -> Vec<DynastyId> {
        ids_named(&self.dynasty_names, name)
    }

    pub fn ruler_ids_named(&self, name: &str) -> Vec<RulerId> {
        ids_named(&self.ruler_names, name)
    }

    pub fn era_ids_named(&self, name: &str) -> Vec<EraId> {
        ids_named(&self.era_names, name)
    }

    // ── Hierarchy ────────────────────────────────────────────────────

    pub fn children_of(&self, id: DynastyId) -> impl Iterator<Item = DynastyId> + '_ {
        self.children.get(&id).into_iter().flatten().copied()
    }

    pub fn parent_of(&self, id: DynastyId) -> Option<DynastyId> {
        self.dynasties.get(&id).and_then(|d| d.part_of)
    }

    // ── Lunar table ──────────────────────────────────────────────────

    /// Lunations of one stream's civil year; empty when not covered.
    pub fn lunations(&self, stream: CalendarStream, year: i32) -> &[LunarMonth] {
        self.lunar.get(&(stream, year)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every lunation, ordered by stream then year.
    pub fn all_lunations(&self) -> impl Iterator<Item = &LunarMonth> {
        self.lunar.values().flatten()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            dynasties: self.dynasties.len(),
            rulers: self.rulers.len(),
            eras: self.eras.len(),
            lunar_years: self.lunar.len(),
        }
    }
}

fn ids_named<I: Copy>(index: &BTreeMap<String, BTreeSet<I>>, name: &str) -> Vec<I> {
    index
        .get(name.trim())
        .map(|ids| ids.iter().copied().collect())
        .unwrap_or_default()
}

/// Row counts, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    pub dynasties: usize,
    pub rulers: usize,
    pub eras: usize,
    pub lunar_years: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_name_indexes_include_aliases() {
        let t = fixtures::tables();
        assert_eq!(t.dynasty_ids_named("魏"), vec![fixtures::CAO_WEI, fixtures::NORTHERN_WEI]);
        assert_eq!(t.ruler_ids_named("獻帝"), vec![fixtures::LIU_XIE]);
        assert_eq!(t.ruler_ids_named("劉協"), vec![fixtures::LIU_XIE]);
        assert_eq!(t.era_ids_named("建安"), vec![fixtures::JIAN_AN]);
        assert!(t.era_ids_named("不存在").is_empty());
    }

    #[test]
    fn test_hierarchy_index() {
        let t = fixtures::tables();
        let kids: Vec<_> = t.children_of(fixtures::TANG).collect();
        assert_eq!(kids, vec![fixtures::LATER_TANG]);
        assert_eq!(t.parent_of(fixtures::LATER_TANG), Some(fixtures::TANG));
        assert_eq!(t.parent_of(fixtures::TANG), None);
    }

    #[test]
    fn test_lunations_sorted_and_gap_empty() {
        let t = fixtures::tables();
        let months = t.lunations(1, 272);
        assert_eq!(months.len(), 12);
        assert!(months.windows(2).all(|w| w[0].new_moon_jdn < w[1].new_moon_jdn));
        assert!(t.lunations(1, 1000).is_empty());
    }

    #[test]
    fn test_cycle_rejected() {
        let d = |id, part_of| Dynasty {
            id,
            name: format!("d{id}"),
            part_of,
            calendar_stream: Some(1),
            start_year: 0,
            end_year: 10,
        };
        let err = ReferenceTables::new(
            vec![d(1, Some(2)), d(2, Some(1))],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::DynastyCycle(_)));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = ReferenceTables::new(
            vec![Dynasty {
                id: 1,
                name: "x".into(),
                part_of: Some(99),
                calendar_stream: None,
                start_year: 0,
                end_year: 1,
            }],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownParent { parent: 99, .. }));
    }

    #[test]
    fn test_duplicate_lunation_rejected() {
        let mut months = fixtures::lunar_year(1, 500, 1_903_000, None);
        months.push(months[0]);
        let err = ReferenceTables::new(vec![], vec![], vec![], months, vec![], vec![]).unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateLunation { year: 500, .. }));
    }
}
