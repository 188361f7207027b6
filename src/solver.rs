//! Constraint solving for one token's candidate set.
//!
//! Every stage narrows with a fallback: when a constraint rules out all
//! rows, the rows from before that stage come back annotated with the
//! reason, so a token with evidence never ends up row-less.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use era_types::{DateToken, Diagnostic, LunarMonth, LunarPhase};

use crate::candidate::Candidate;
use crate::context::ImpliedContext;
use crate::filter::{prefer, try_map, try_narrow};
use crate::ganzhi::{gz_add, gz_distance, gz_year, years_with_gz};
use crate::params::RunParams;
use crate::tables::ReferenceTables;

/// What kind of constraint a token carries, most specific last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// Identifiers only
    Simple,
    /// Numeric or sexagenary year, nothing finer
    Year,
    /// Month, intercalary marker, day, sexagenary day or lunar phase
    Lunar,
}

impl Evidence {
    pub fn classify(token: &DateToken) -> Self {
        if token.has_lunar_evidence() {
            Evidence::Lunar
        } else if token.has_year_evidence() {
            Evidence::Year
        } else {
            Evidence::Simple
        }
    }
}

pub struct Solver<'a> {
    tables: &'a ReferenceTables,
    params: &'a RunParams,
}

impl<'a> Solver<'a> {
    pub fn new(tables: &'a ReferenceTables, params: &'a RunParams) -> Self {
        Solver { tables, params }
    }

    pub fn solve(
        &self,
        rows: Vec<Candidate>,
        token: &DateToken,
        evidence: Evidence,
        implied: &ImpliedContext,
    ) -> Vec<Candidate> {
        debug!(index = token.index, ?evidence, rows = rows.len(), "solving");
        match evidence {
            Evidence::Simple => self.solve_simple(rows, implied),
            Evidence::Year => self.solve_year(rows, implied),
            Evidence::Lunar => self.solve_lunar(rows, token, implied),
        }
    }

    /// Keep in-bounds rows when more than one survives.
    fn clip(&self, rows: Vec<Candidate>, year: impl Fn(&Candidate) -> Option<i32>) -> Vec<Candidate> {
        if rows.len() < 2 {
            return rows;
        }
        try_narrow(rows, None, |c| year(c).is_some_and(|y| self.params.within_bounds(y)))
    }

    // ── Simple ───────────────────────────────────────────────────────

    pub fn solve_simple(&self, rows: Vec<Candidate>, implied: &ImpliedContext) -> Vec<Candidate> {
        let rows = prefer(rows, implied);
        let mut rows = self.clip(rows, |c| c.span_start);
        let pairs: BTreeSet<_> = rows.iter().map(|c| (c.dynasty_id, c.ruler_id)).collect();
        if pairs.len() > 1 {
            rows.iter_mut()
                .for_each(|c| c.push_diagnostic(Diagnostic::DynastyRulerEraMismatch));
        }
        rows
    }

    // ── Year ─────────────────────────────────────────────────────────

    /// Resolve civil years, then prefer and clip.
    pub fn solve_year(&self, rows: Vec<Candidate>, implied: &ImpliedContext) -> Vec<Candidate> {
        let rows = self.resolve_civil_year(rows);
        let rows = prefer(rows, implied);
        self.clip(rows, |c| c.civil_year)
    }

    fn resolve_civil_year(&self, rows: Vec<Candidate>) -> Vec<Candidate> {
        let year = rows.iter().find_map(|c| c.year);
        let sex_year = rows.iter().find_map(|c| c.sex_year);
        match (year, sex_year) {
            (Some(_), _) => numeric_year(rows),
            (None, Some(sy)) => try_map(rows, Diagnostic::YearResolutionFailed, |rows| {
                rows.iter().flat_map(|c| expand_sexagenary(c, sy)).collect()
            }),
            (None, None) => {
                let (tpq, taq) = (self.params.tpq, self.params.taq);
                try_map(rows, Diagnostic::YearResolutionFailed, |rows| {
                    rows.iter().flat_map(|c| expand_span(c, tpq, taq)).collect()
                })
            }
        }
    }

    // ── Lunar ────────────────────────────────────────────────────────

    pub fn solve_lunar(
        &self,
        rows: Vec<Candidate>,
        token: &DateToken,
        implied: &ImpliedContext,
    ) -> Vec<Candidate> {
        let years = self.solve_year(rows, implied);
        if years.iter().all(|c| c.civil_year.is_none()) {
            return flag(years, Diagnostic::LunarConstraintFailed);
        }

        let joined = self.join_lunations(&years);
        if joined.is_empty() {
            warn!(index = token.index, "no lunar data for candidate years");
            return flag(years, Diagnostic::LunarDataMissing);
        }

        // month may have come from the context rather than the token
        let month = years.iter().find_map(|c| c.month);
        let intercalary = years.iter().any(|c| c.intercalary);
        let months = match match_month(joined, month, intercalary, token.phase) {
            Ok(m) => m,
            Err(why) => return flag(years, why),
        };
        let months = match token.nmd_gz {
            Some(g) => try_narrow(months, Some(Diagnostic::NewMoonGzMismatch), |c| {
                lunation_of(c).is_some_and(|m| m.new_moon_gz == g)
            }),
            None => months,
        };
        debug!(index = token.index, months = months.len(), "months matched");

        let rows = if token.has_day_evidence() {
            resolve_day(months, token)
        } else {
            months
        };
        let rows = prefer(rows, implied);
        let rows = self.clip(rows, |c| c.civil_year);
        if rows.is_empty() {
            return flag(years, Diagnostic::LunarConstraintFailed);
        }
        rows
    }

    /// One row per lunation of each candidate's civil year.
    fn join_lunations(&self, rows: &[Candidate]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for c in rows {
            let Some(year) = c.civil_year else { continue };
            let streams = match c.calendar_stream {
                Some(s) if self.params.allows_stream(Some(s)) => vec![s],
                Some(_) => continue,
                None => self.params.allowed_streams(),
            };
            for s in streams {
                for m in self.tables.lunations(s, year) {
                    let mut row = c.clone();
                    row.calendar_stream = Some(s);
                    row.lunation = Some(*m);
                    out.push(row);
                }
            }
        }
        out
    }
}

fn flag(mut rows: Vec<Candidate>, d: Diagnostic) -> Vec<Candidate> {
    rows.iter_mut().for_each(|c| c.push_diagnostic(d));
    rows
}

// ── Year helpers ─────────────────────────────────────────────────────

/// Largest acceptable in-span year: the table's maximum, else the span length.
fn year_bound(c: &Candidate) -> Option<i32> {
    c.max_year.or(match (c.span_start, c.span_end) {
        (Some(s), Some(e)) => Some(e - s + 1),
        _ => None,
    })
}

fn numeric_year(rows: Vec<Candidate>) -> Vec<Candidate> {
    let rows = try_narrow(rows, Some(Diagnostic::YearOutOfBounds), |c| {
        c.year.is_some_and(|y| y >= 1 && year_bound(c).is_none_or(|b| y <= b))
    });
    let mut rows: Vec<Candidate> = rows
        .into_iter()
        .map(|mut c| {
            c.civil_year = match (c.span_start, c.year) {
                (Some(s), Some(y)) => s.checked_add(y).and_then(|v| v.checked_sub(1)),
                _ => None,
            };
            c
        })
        .collect();

    if rows.iter().any(|c| c.sex_year.is_some()) {
        rows = try_narrow(rows, Some(Diagnostic::YearSexagenaryMismatch), |c| {
            c.civil_year.map(gz_year) == c.sex_year
        });
    } else {
        rows.iter_mut().for_each(|c| c.sex_year = c.civil_year.map(gz_year));
    }
    rows
}

/// Every civil year in the candidate's span with cycle position `sy`.
fn expand_sexagenary(c: &Candidate, sy: u8) -> Vec<Candidate> {
    let (Some(start), Some(end)) = (c.span_start, c.span_end) else {
        return Vec::new();
    };
    years_with_gz(sy, start, end)
        .into_iter()
        .map(|y| Candidate {
            year: Some(y - start + 1),
            civil_year: Some(y),
            sex_year: Some(sy),
            ..c.clone()
        })
        .collect()
}

/// Every in-bounds civil year of the candidate's span.
fn expand_span(c: &Candidate, tpq: i32, taq: i32) -> Vec<Candidate> {
    let (Some(start), Some(end)) = (c.span_start, c.span_end) else {
        return Vec::new();
    };
    (start.max(tpq)..=end.min(taq))
        .map(|y| Candidate {
            year: Some(y - start + 1),
            civil_year: Some(y),
            sex_year: Some(gz_year(y)),
            ..c.clone()
        })
        .collect()
}

// ── Lunar helpers ────────────────────────────────────────────────────

fn lunation_of(c: &Candidate) -> Option<&LunarMonth> {
    c.lunation.as_ref()
}

/// Match the requested month against the joined lunations.
///
/// An ordinary month matches only ordinary lunations. A last-day date whose
/// month has no row retries against the following month.
fn match_month(
    joined: Vec<Candidate>,
    month: Option<u8>,
    intercalary: bool,
    phase: Option<LunarPhase>,
) -> Result<Vec<Candidate>, Diagnostic> {
    let pick = |want: Option<u8>, intercalary: bool| -> Vec<Candidate> {
        joined
            .iter()
            .filter(|c| {
                lunation_of(c).is_some_and(|m| {
                    m.intercalary == intercalary && want.is_none_or(|w| w == m.month)
                })
            })
            .cloned()
            .collect()
    };

    let mut matched = if intercalary {
        let rows = pick(month, true);
        if rows.is_empty() {
            return Err(Diagnostic::YearIntercalaryMonthMismatch);
        }
        rows
    } else if let Some(month) = month {
        let mut rows = pick(Some(month), false);
        if rows.is_empty() && phase == Some(LunarPhase::LastDay) {
            if let Some(next) = month.checked_add(1) {
                rows = pick(Some(next), false);
            }
        }
        if rows.is_empty() {
            return Err(Diagnostic::YearMonthMismatch);
        }
        rows
    } else {
        joined
    };

    for c in matched.iter_mut() {
        if let Some(m) = c.lunation {
            c.month = Some(m.month);
            c.intercalary = m.intercalary;
        }
    }
    Ok(matched)
}

fn phase_day(phase: LunarPhase, m: &LunarMonth) -> u8 {
    match phase {
        LunarPhase::NewMoon => 1,
        LunarPhase::LastDay => m.days,
    }
}

fn fix_day(mut c: Candidate, m: &LunarMonth, day: u8) -> Candidate {
    let jdn = m.new_moon_jdn + day as i64 - 1;
    c.day = Some(day);
    c.jdn = Some(jdn);
    c.gz = Some(gz_add(m.new_moon_gz, day as i64 - 1));
    c
}

/// Pin the day within each matched month, by whichever day evidence the
/// token carries. Rows that cannot satisfy it fall back to the month rows.
fn resolve_day(months: Vec<Candidate>, token: &DateToken) -> Vec<Candidate> {
    let solve = |why: Diagnostic, f: &dyn Fn(&LunarMonth) -> Option<u8>| {
        try_map(months.clone(), why, |rows| {
            rows.iter()
                .filter_map(|c| {
                    let m = lunation_of(c)?;
                    let day = f(m)?;
                    Some(fix_day(c.clone(), m, day))
                })
                .collect()
        })
    };

    match (token.phase, token.gz, token.day) {
        (Some(phase), None, None) => solve(Diagnostic::LunarConstraintFailed, &|m: &LunarMonth| {
            Some(phase_day(phase, m))
        }),
        (Some(phase), Some(gz), None) => solve(Diagnostic::LunarPhaseGzMismatch, &|m: &LunarMonth| {
            let day = phase_day(phase, m);
            (gz_add(m.new_moon_gz, day as i64 - 1) == gz).then_some(day)
        }),
        (Some(phase), gz, Some(day)) => solve(Diagnostic::LunarPhaseGzDayMismatch, &|m: &LunarMonth| {
            let ok = day == phase_day(phase, m)
                && gz.is_none_or(|g| gz_add(m.new_moon_gz, day as i64 - 1) == g);
            ok.then_some(day)
        }),
        (None, Some(gz), Some(day)) => solve(Diagnostic::MonthDayGzMismatch, &|m: &LunarMonth| {
            let by_day = m.new_moon_jdn + day as i64 - 1;
            let by_gz = m.new_moon_jdn + gz_distance(m.new_moon_gz, gz);
            (by_day == by_gz && day <= m.days).then_some(day)
        }),
        (None, Some(gz), None) => solve(Diagnostic::MonthGzMismatch, &|m: &LunarMonth| {
            let day = gz_distance(m.new_moon_gz, gz) as u8 + 1;
            (day <= m.days).then_some(day)
        }),
        (None, None, Some(day)) => solve(Diagnostic::MonthDayOutOfBounds, &|m: &LunarMonth| {
            (1..=m.days).contains(&day).then_some(day)
        }),
        (None, None, None) => months,
    }
}
