//! Candidate generation: the search space of structurally valid
//! (dynasty, ruler, era, calendar stream, year span) tuples for one token.

use std::collections::BTreeSet;

use tracing::debug;

use era_types::{
    CalendarStream, DateToken, Diagnostic, DynastyId, Era, EraId, LunarMonth, LunarPhase, RulerId,
};

use crate::params::RunParams;
use crate::resolver::{IdentifierRow, dynasty_family};
use crate::tables::ReferenceTables;

/// One interpretation of one token, refined in place by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub dynasty_id: Option<DynastyId>,
    pub ruler_id: Option<RulerId>,
    pub era_id: Option<EraId>,
    pub calendar_stream: Option<CalendarStream>,
    /// First civil year of the era, reign or dynasty
    pub span_start: Option<i32>,
    pub span_end: Option<i32>,
    /// Largest valid in-era year count
    pub max_year: Option<i32>,
    /// Year counted within the span
    pub year: Option<i32>,
    pub sex_year: Option<u8>,
    pub civil_year: Option<i32>,
    pub month: Option<u8>,
    pub intercalary: bool,
    pub day: Option<u8>,
    pub gz: Option<u8>,
    pub phase: Option<LunarPhase>,
    /// The lunation the date falls in, once matched
    pub lunation: Option<LunarMonth>,
    pub jdn: Option<i64>,
    /// False for rows already solved against the lunar table
    pub lunar_solution: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Candidate {
    /// A candidate carrying only the token's own date fields.
    pub fn from_token(token: &DateToken) -> Self {
        Candidate {
            index: token.index,
            dynasty_id: None,
            ruler_id: None,
            era_id: None,
            calendar_stream: None,
            span_start: None,
            span_end: None,
            max_year: None,
            year: token.year,
            sex_year: token.sex_year,
            civil_year: None,
            month: token.month,
            intercalary: token.intercalary,
            day: token.day,
            gz: token.gz,
            phase: token.phase,
            lunation: None,
            jdn: None,
            lunar_solution: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn has_ids(&self) -> bool {
        self.dynasty_id.is_some() || self.ruler_id.is_some() || self.era_id.is_some()
    }

    pub fn with_diagnostic(mut self, d: Diagnostic) -> Self {
        self.push_diagnostic(d);
        self
    }

    /// Append `d` unless the row already carries it.
    pub fn push_diagnostic(&mut self, d: Diagnostic) {
        if !self.diagnostics.contains(&d) {
            self.diagnostics.push(d);
        }
    }

    pub fn identity(&self) -> (Option<EraId>, Option<RulerId>, Option<DynastyId>) {
        (self.era_id, self.ruler_id, self.dynasty_id)
    }

    fn set_era(&mut self, e: &Era) {
        self.era_id = Some(e.id);
        self.ruler_id = Some(e.ruler_id);
        self.dynasty_id = Some(e.dynasty_id);
        self.calendar_stream = Some(e.calendar_stream);
        self.span_start = Some(e.start_year);
        self.span_end = Some(e.end_year);
        self.max_year = e.max_year;
    }
}

// ── Identified tokens ────────────────────────────────────────────────

fn dynasty_candidate(token: &DateToken, tables: &ReferenceTables, id: DynastyId) -> Option<Candidate> {
    let d = tables.dynasty(id)?;
    Some(Candidate {
        dynasty_id: Some(d.id),
        calendar_stream: d.calendar_stream,
        span_start: Some(d.start_year),
        span_end: Some(d.end_year),
        ..Candidate::from_token(token)
    })
}

fn ruler_candidate(
    token: &DateToken,
    tables: &ReferenceTables,
    id: RulerId,
    dynasty: Option<DynastyId>,
) -> Option<Candidate> {
    let r = tables.ruler(id)?;
    if let Some(d) = dynasty {
        if !dynasty_family(tables, d).contains(&r.dynasty_id) {
            return None;
        }
    }
    let stream = r
        .calendar_stream
        .or_else(|| tables.dynasty(r.dynasty_id).and_then(|d| d.calendar_stream));
    Some(Candidate {
        dynasty_id: Some(r.dynasty_id),
        ruler_id: Some(r.id),
        calendar_stream: stream,
        span_start: Some(r.start_year),
        span_end: Some(r.end_year),
        max_year: r.max_year,
        ..Candidate::from_token(token)
    })
}

fn era_candidates(token: &DateToken, tables: &ReferenceTables, row: &IdentifierRow) -> Vec<Candidate> {
    let family = row.dynasty_id.map(|d| dynasty_family(tables, d));
    let eras: Vec<&Era> = match row.era_id {
        Some(id) => tables.era(id).into_iter().collect(),
        None => tables.eras().collect(),
    };
    eras.into_iter()
        .filter(|e| row.ruler_id.is_none_or(|r| e.ruler_id == r))
        .filter(|e| family.as_ref().is_none_or(|f| f.contains(&e.dynasty_id)))
        .map(|e| {
            let mut c = Candidate::from_token(token);
            c.set_era(e);
            c
        })
        .collect()
}

fn identified_candidates(token: &DateToken, tables: &ReferenceTables, row: &IdentifierRow) -> Vec<Candidate> {
    match (row.dynasty_id, row.ruler_id, row.era_id) {
        (None, None, None) => Vec::new(),
        (Some(d), None, None) => dynasty_candidate(token, tables, d).into_iter().collect(),
        (dynasty, Some(r), None) => ruler_candidate(token, tables, r, dynasty).into_iter().collect(),
        _ => era_candidates(token, tables, row),
    }
}

/// Build the candidate set for one token from its identifier rows.
///
/// Never returns an empty set: a token whose identifiers match nothing
/// comes back as a single raw candidate, flagged `no-candidates` when it
/// did name something.
pub fn generate(
    token: &DateToken,
    rows: &[IdentifierRow],
    tables: &ReferenceTables,
    params: &RunParams,
) -> Vec<Candidate> {
    let named = token.has_identifier() || rows.iter().any(IdentifierRow::has_ids);
    if !named {
        if params.proliferate && (token.month.is_some() || token.intercalary) {
            return proliferate(token, tables, params);
        }
        return vec![Candidate::from_token(token)];
    }

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for row in rows {
        for c in identified_candidates(&row.token, tables, row) {
            if !params.allows_stream(c.calendar_stream) {
                continue;
            }
            if seen.insert(c.identity()) {
                out.push(c);
            }
        }
    }
    debug!(index = token.index, candidates = out.len(), "candidates generated");
    if out.is_empty() {
        return vec![Candidate::from_token(token).with_diagnostic(Diagnostic::NoCandidates)];
    }
    out
}

// ── Proliferation ────────────────────────────────────────────────────

/// Day of `m` satisfying the token's day evidence, if any.
///
/// `Ok(None)` means the token carries no day evidence.
fn day_in_lunation(token: &DateToken, m: &LunarMonth) -> Result<Option<u8>, ()> {
    let day = match (token.phase, token.gz, token.day) {
        (Some(phase), gz, _) => {
            let (day, gz_at) = match phase {
                LunarPhase::NewMoon => (1, m.new_moon_gz),
                LunarPhase::LastDay => (m.days, m.last_day_gz),
            };
            if gz.is_some_and(|g| g != gz_at) {
                return Err(());
            }
            Some(day)
        }
        (None, Some(gz), day) => {
            let d = (gz as i64 - m.new_moon_gz as i64).rem_euclid(60) as u8 + 1;
            if day.is_some_and(|x| x != d) {
                return Err(());
            }
            Some(d)
        }
        (None, None, day) => day,
    };
    match day {
        Some(d) if d > m.days => Err(()),
        d => Ok(d),
    }
}

fn month_matches(token: &DateToken, m: &LunarMonth) -> bool {
    let month = match token.month {
        Some(month) => m.month == month && m.intercalary == token.intercalary,
        None => m.intercalary,
    };
    month && token.nmd_gz.is_none_or(|g| g == m.new_moon_gz)
}

/// Search every lunation and era for a token with no identifier.
///
/// Rows come back fully solved (`lunar_solution` false). If the token's
/// year evidence rules out every match, the raw token is returned with the
/// reason attached.
fn proliferate(token: &DateToken, tables: &ReferenceTables, params: &RunParams) -> Vec<Candidate> {
    let mut hits = Vec::new();
    for m in tables.all_lunations() {
        if !params.allows_stream(Some(m.calendar_stream))
            || !params.within_bounds(m.year)
            || !month_matches(token, m)
        {
            continue;
        }
        let Ok(day) = day_in_lunation(token, m) else {
            continue;
        };
        for e in tables.eras() {
            if e.calendar_stream == m.calendar_stream
                && (e.start_year..=e.end_year).contains(&m.year)
            {
                hits.push((*m, day, e));
            }
        }
    }
    debug!(index = token.index, hits = hits.len(), "proliferated");
    if hits.is_empty() {
        return vec![Candidate::from_token(token).with_diagnostic(Diagnostic::NoCandidates)];
    }

    if let Some(y) = token.year {
        hits.retain(|(m, _, e)| m.year - e.start_year + 1 == y);
        if hits.is_empty() {
            return vec![Candidate::from_token(token).with_diagnostic(Diagnostic::YearLunationMismatch)];
        }
    }
    if let Some(sy) = token.sex_year {
        hits.retain(|(m, _, _)| m.year_gz == sy);
        if hits.is_empty() {
            return vec![
                Candidate::from_token(token).with_diagnostic(Diagnostic::YearSexagenaryMismatch),
            ];
        }
    }

    hits.into_iter()
        .map(|(m, day, e)| {
            let mut c = Candidate::from_token(token);
            c.set_era(e);
            c.year = Some(m.year - e.start_year + 1);
            c.sex_year = Some(m.year_gz);
            c.civil_year = Some(m.year);
            c.month = Some(m.month);
            c.intercalary = m.intercalary;
            c.day = day;
            c.jdn = day.map(|d| m.new_moon_jdn + d as i64 - 1);
            c.gz = c.jdn.map(crate::ganzhi::jdn_to_gz);
            c.lunation = Some(m);
            c.lunar_solution = false;
            c
        })
        .collect()
}
