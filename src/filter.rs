//! Preference filtering: narrow an ambiguous row set toward the implied
//! context without ever emptying it.

use era_types::Diagnostic;

use crate::candidate::Candidate;
use crate::context::ImpliedContext;

/// Keep the rows matching `keep`; if none do, return `rows` unchanged with
/// `why` recorded on every row.
pub fn try_narrow(
    rows: Vec<Candidate>,
    why: Option<Diagnostic>,
    keep: impl Fn(&Candidate) -> bool,
) -> Vec<Candidate> {
    let narrowed: Vec<Candidate> = rows.iter().filter(|c| keep(c)).cloned().collect();
    if !narrowed.is_empty() {
        return narrowed;
    }
    let mut rows = rows;
    if let Some(d) = why {
        rows.iter_mut().for_each(|c| c.push_diagnostic(d));
    }
    rows
}

/// Apply `f` to the rows; if it leaves nothing, return the input with
/// `why` recorded. The general form of [`try_narrow`] for stages that
/// rebuild rows instead of filtering them.
pub fn try_map(
    rows: Vec<Candidate>,
    why: Diagnostic,
    f: impl FnOnce(&[Candidate]) -> Vec<Candidate>,
) -> Vec<Candidate> {
    let out = f(&rows);
    if !out.is_empty() {
        return out;
    }
    let mut rows = rows;
    rows.iter_mut().for_each(|c| c.push_diagnostic(why));
    rows
}

fn distinct<T: PartialEq>(rows: &[Candidate], key: impl Fn(&Candidate) -> T) -> usize {
    let mut seen: Vec<T> = Vec::new();
    for r in rows {
        let k = key(r);
        if !seen.contains(&k) {
            seen.push(k);
        }
    }
    seen.len()
}

/// Restrict on one dimension when the context knows its value and the rows
/// still disagree on it.
fn prefer_on<T: PartialEq + Copy>(
    rows: Vec<Candidate>,
    implied: Option<T>,
    key: impl Fn(&Candidate) -> Option<T>,
) -> Vec<Candidate> {
    match implied {
        Some(v) if rows.len() > 1 && distinct(&rows, &key) > 1 => {
            try_narrow(rows, None, |c| key(c) == Some(v))
        }
        _ => rows,
    }
}

/// Narrow by era, ruler, dynasty, calendar stream, month, intercalary, in
/// that order. A dimension that would empty the set is skipped.
pub fn prefer(rows: Vec<Candidate>, implied: &ImpliedContext) -> Vec<Candidate> {
    if rows.len() < 2 {
        return rows;
    }
    let rows = prefer_on(rows, implied.era(), |c| c.era_id);
    let rows = prefer_on(rows, implied.ruler(), |c| c.ruler_id);
    let rows = prefer_on(rows, implied.dynasty(), |c| c.dynasty_id);
    let rows = prefer_on(rows, implied.stream(), |c| c.calendar_stream);
    let rows = prefer_on(rows, implied.month, |c| c.month);
    let mut rows = prefer_on(rows, implied.intercalary, |c| {
        c.lunation.map(|l| l.intercalary).or(Some(c.intercalary))
    });
    dedup(&mut rows);
    rows
}

/// Drop exact duplicates, keeping first occurrences.
pub fn dedup(rows: &mut Vec<Candidate>) {
    let mut kept: Vec<Candidate> = Vec::with_capacity(rows.len());
    for r in rows.drain(..) {
        if !kept.contains(&r) {
            kept.push(r);
        }
    }
    *rows = kept;
}
