//! Implied context carried from one date to the next.
//!
//! A list of size 1 means "known", an empty list means "unknown". Ambiguous
//! results never widen a list; they leave it alone, and the sequential loop
//! clears the whole context after any token that stays ambiguous.

use serde::{Deserialize, Serialize};

use era_types::{CalendarStream, DateToken, DynastyId, EraId, RulerId};

use crate::candidate::Candidate;
use crate::solver::Evidence;
use crate::tables::ReferenceTables;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedContext {
    pub calendar_streams: Vec<CalendarStream>,
    pub dynasties: Vec<DynastyId>,
    pub rulers: Vec<RulerId>,
    pub eras: Vec<EraId>,
    /// Year within the implied era / reign / dynasty
    pub year: Option<i32>,
    pub sex_year: Option<u8>,
    pub month: Option<u8>,
    pub intercalary: Option<bool>,
}

fn single<T: Copy>(ls: &[T]) -> Option<T> {
    match ls {
        [x] => Some(*x),
        _ => None,
    }
}

/// The one value every row agrees on, ignoring rows without one.
fn unanimous<T: Copy + PartialEq>(values: impl Iterator<Item = Option<T>>) -> Option<T> {
    let mut found = None;
    for v in values.flatten() {
        match found {
            None => found = Some(v),
            Some(f) if f != v => return None,
            _ => {}
        }
    }
    found
}

impl ImpliedContext {
    pub fn is_empty(&self) -> bool {
        *self == ImpliedContext::default()
    }

    pub fn clear(&mut self) {
        *self = ImpliedContext::default();
    }

    pub fn stream(&self) -> Option<CalendarStream> {
        single(&self.calendar_streams)
    }

    pub fn dynasty(&self) -> Option<DynastyId> {
        single(&self.dynasties)
    }

    pub fn ruler(&self) -> Option<RulerId> {
        single(&self.rulers)
    }

    pub fn era(&self) -> Option<EraId> {
        single(&self.eras)
    }

    fn clear_dates(&mut self) {
        self.year = None;
        self.sex_year = None;
        self.month = None;
        self.intercalary = None;
    }

    // ── Explicit resets ──────────────────────────────────────────────

    /// An explicit era pins stream, dynasty, ruler and era.
    pub fn reset_for_era(&mut self, tables: &ReferenceTables, id: EraId) {
        let Some(e) = tables.era(id) else { return };
        self.calendar_streams = vec![e.calendar_stream];
        self.dynasties = vec![e.dynasty_id];
        self.rulers = vec![e.ruler_id];
        self.eras = vec![id];
        self.clear_dates();
    }

    /// An explicit ruler pins stream, dynasty and ruler, and forgets the era.
    pub fn reset_for_ruler(&mut self, tables: &ReferenceTables, id: RulerId) {
        let Some(r) = tables.ruler(id) else { return };
        if let Some(s) = r.calendar_stream {
            self.calendar_streams = vec![s];
        }
        self.dynasties = vec![r.dynasty_id];
        self.rulers = vec![id];
        self.eras.clear();
        self.clear_dates();
    }

    /// An explicit dynasty pins stream and dynasty, and forgets ruler and era.
    pub fn reset_for_dynasty(&mut self, tables: &ReferenceTables, id: DynastyId) {
        let Some(d) = tables.dynasty(id) else { return };
        if let Some(s) = d.calendar_stream {
            self.calendar_streams = vec![s];
        }
        self.dynasties = vec![id];
        self.rulers.clear();
        self.eras.clear();
        self.clear_dates();
    }

    /// Apply the most specific explicit identifier on `token`, if any.
    pub fn reset_for_token(&mut self, tables: &ReferenceTables, token: &DateToken) {
        if let Some(id) = token.era_id {
            self.reset_for_era(tables, id);
        } else if let Some(id) = token.ruler_id {
            self.reset_for_ruler(tables, id);
        } else if let Some(id) = token.dynasty_id {
            self.reset_for_dynasty(tables, id);
        }
    }

    // ── Inheritance ──────────────────────────────────────────────────

    /// Fill what the candidates lack from the known context.
    ///
    /// Identifiers are filled only for tokens that name none and whose
    /// candidates carry none, so a token's own dynasty is never paired with an
    /// unrelated implied era and an unmatched name never borrows one. Year is
    /// filled for dates with month or day but no year; month for dates with
    /// a day but no month. Both only when a candidate sits under the implied
    /// era, ruler or dynasty, since an in-era year means nothing elsewhere.
    pub fn inherit(&self, cands: &mut [Candidate], token: &DateToken, tables: &ReferenceTables) {
        if !token.has_temporal_evidence() {
            return;
        }
        if !token.has_identifier() && !cands.iter().any(Candidate::has_ids) {
            for c in cands.iter_mut() {
                self.fill_identifiers(c, tables);
            }
        }
        if cands.iter().all(|c| c.calendar_stream.is_none()) {
            if let Some(s) = self.stream() {
                cands.iter_mut().for_each(|c| c.calendar_stream = Some(s));
            }
        }
        if !cands.iter().any(|c| self.same_anchor(c)) {
            return;
        }

        if !token.has_year_evidence() && token.has_lunar_evidence() {
            if cands.iter().all(|c| c.year.is_none()) {
                if let Some(y) = self.year {
                    cands.iter_mut().for_each(|c| c.year = Some(y));
                }
            }
            if cands.iter().all(|c| c.sex_year.is_none()) {
                if let Some(sy) = self.sex_year {
                    cands.iter_mut().for_each(|c| c.sex_year = Some(sy));
                }
            }
        }

        if token.month.is_none() && !token.intercalary && token.has_day_evidence() {
            for c in cands.iter_mut() {
                if c.month.is_none() {
                    c.month = self.month;
                }
                if self.intercalary == Some(true) {
                    c.intercalary = true;
                }
            }
        }
    }

    /// Whether `c` sits under the most specific implied identifier.
    fn same_anchor(&self, c: &Candidate) -> bool {
        if let Some(e) = self.era() {
            c.era_id == Some(e)
        } else if let Some(r) = self.ruler() {
            c.ruler_id == Some(r)
        } else if let Some(d) = self.dynasty() {
            c.dynasty_id == Some(d)
        } else {
            false
        }
    }

    fn fill_identifiers(&self, c: &mut Candidate, tables: &ReferenceTables) {
        if let Some(e) = self.era().and_then(|id| tables.era(id)) {
            c.era_id = Some(e.id);
            c.ruler_id = Some(e.ruler_id);
            c.dynasty_id = Some(e.dynasty_id);
            c.calendar_stream = Some(e.calendar_stream);
            c.span_start = Some(e.start_year);
            c.span_end = Some(e.end_year);
            c.max_year = e.max_year;
        } else if let Some(r) = self.ruler().and_then(|id| tables.ruler(id)) {
            c.ruler_id = Some(r.id);
            c.dynasty_id = Some(r.dynasty_id);
            c.calendar_stream = r.calendar_stream.or(self.stream());
            c.span_start = Some(r.start_year);
            c.span_end = Some(r.end_year);
            c.max_year = r.max_year;
        } else if let Some(d) = self.dynasty().and_then(|id| tables.dynasty(id)) {
            c.dynasty_id = Some(d.id);
            c.calendar_stream = d.calendar_stream.or(self.stream());
            c.span_start = Some(d.start_year);
            c.span_end = Some(d.end_year);
        }
    }

    // ── Update ───────────────────────────────────────────────────────

    /// Record what a solved token established.
    pub fn update(&mut self, rows: &[Candidate], token: &DateToken, evidence: Evidence) {
        if let Some(s) = unanimous(rows.iter().map(|r| r.calendar_stream)) {
            self.calendar_streams = vec![s];
        }
        if let Some(d) = unanimous(rows.iter().map(|r| r.dynasty_id)) {
            self.dynasties = vec![d];
        }
        if let Some(r) = unanimous(rows.iter().map(|r| r.ruler_id)) {
            self.rulers = vec![r];
        }
        if let Some(e) = unanimous(rows.iter().map(|r| r.era_id)) {
            self.eras = vec![e];
        }

        if evidence == Evidence::Simple {
            self.clear_dates();
            return;
        }

        if let Some(y) = token.year {
            if self.year != Some(y) {
                self.year = Some(y);
                self.month = None;
                self.intercalary = None;
            }
            self.sex_year = unanimous(rows.iter().map(|r| r.sex_year));
        } else if let Some(sy) = token.sex_year {
            self.sex_year = Some(sy);
            self.year = unanimous(rows.iter().map(|r| r.year));
            self.month = None;
            self.intercalary = None;
        }

        if evidence == Evidence::Lunar {
            if let Some(m) = unanimous(rows.iter().map(|r| r.month)) {
                self.month = Some(m);
            }
            if token.intercalary {
                self.intercalary = Some(true);
            } else if let Some(i) =
                unanimous(rows.iter().map(|r| r.lunation.map(|l| l.intercalary)))
            {
                self.intercalary = Some(i);
            }
        }
    }
}
