//! The sequential resolution loop.
//!
//! Tokens are solved strictly in index order: each one may inherit from the
//! context left by the one before it, so the loop is the only owner of the
//! [`ImpliedContext`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use era_types::{DateToken, Diagnostic, MonthSpan, ResolvedDate, render_diagnostics};

use crate::candidate::{Candidate, generate};
use crate::context::ImpliedContext;
use crate::filter::prefer;
use crate::julian::jdn_to_iso;
use crate::params::RunParams;
use crate::resolver::{IdentifierRow, resolve_identifiers};
use crate::solver::{Evidence, Solver};
use crate::tables::ReferenceTables;

/// Caller-supplied rewrite of the identifier table, applied before
/// candidate generation.
pub type IdentifierHook<'h> = Box<dyn Fn(Vec<IdentifierRow>) -> Vec<IdentifierRow> + 'h>;

/// Output of one batch: the rows, grouped by token index, and the context
/// to hand to the next batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub rows: Vec<ResolvedDate>,
    pub implied: ImpliedContext,
}

pub struct DateResolver<'t> {
    tables: &'t ReferenceTables,
    params: RunParams,
    hook: Option<IdentifierHook<'t>>,
}

impl<'t> DateResolver<'t> {
    pub fn new(tables: &'t ReferenceTables, params: RunParams) -> Self {
        DateResolver {
            tables,
            params: params.sanitised(),
            hook: None,
        }
    }

    pub fn with_hook(
        mut self,
        hook: impl Fn(Vec<IdentifierRow>) -> Vec<IdentifierRow> + 't,
    ) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Resolve a batch of tokens, starting from `implied`.
    pub fn resolve(&self, tokens: &[DateToken], implied: ImpliedContext) -> Resolution {
        let mut tokens = tokens.to_vec();
        tokens.sort_by_key(|t| t.index);

        let mut ids = resolve_identifiers(&tokens, self.tables);
        if let Some(hook) = &self.hook {
            ids = hook(ids);
        }

        let solver = Solver::new(self.tables, &self.params);
        let mut implied = implied;
        let mut rows = Vec::new();
        let mut ambiguous = false;
        for token in &tokens {
            if !self.params.sequential || ambiguous {
                implied.clear();
            }
            let own: Vec<IdentifierRow> = ids
                .iter()
                .filter(|r| r.token.index == token.index)
                .cloned()
                .collect();
            let solved = self.resolve_token(token, &own, &mut implied, &solver);
            ambiguous = solved.len() > 1;
            rows.extend(solved.iter().map(|c| self.to_resolved(c, token)));
        }
        // the next batch must not inherit from an unresolved last token
        if !self.params.sequential || ambiguous {
            implied.clear();
        }

        let clean = rows.iter().filter(|r| r.is_clean()).count();
        info!(tokens = tokens.len(), rows = rows.len(), clean, "resolution complete");
        Resolution { rows, implied }
    }

    fn resolve_token(
        &self,
        token: &DateToken,
        ids: &[IdentifierRow],
        implied: &mut ImpliedContext,
        solver: &Solver<'_>,
    ) -> Vec<Candidate> {
        implied.reset_for_token(self.tables, token);
        let mut cands = generate(token, ids, self.tables, &self.params);
        implied.inherit(&mut cands, token, self.tables);

        if token.has_temporal_evidence() && !cands.iter().any(Candidate::has_ids) {
            let why = if token.has_identifier() {
                Diagnostic::NoIdentifierMatch
            } else {
                Diagnostic::InsufficientInformation
            };
            debug!(index = token.index, %why, "unanchored date");
            let mut row = cands
                .into_iter()
                .next()
                .unwrap_or_else(|| Candidate::from_token(token));
            row.push_diagnostic(why);
            return vec![row];
        }

        let evidence = Evidence::classify(token);
        let mut solved = if cands.iter().all(|c| !c.lunar_solution) {
            prefer(cands, implied)
        } else {
            solver.solve(cands, token, evidence, implied)
        };

        for c in solved
            .iter_mut()
            .filter(|c| c.civil_year.is_some() && c.has_ids())
        {
            c.diagnostics.retain(|d| !d.is_preliminary());
        }
        debug!(index = token.index, rows = solved.len(), "token solved");

        implied.update(&solved, token, evidence);
        solved
    }

    fn iso(&self, jdn: i64) -> String {
        jdn_to_iso(jdn, self.params.proleptic_gregorian, self.params.gregorian_start)
    }

    fn to_resolved(&self, c: &Candidate, token: &DateToken) -> ResolvedDate {
        let t = self.tables;
        let month_span = match (c.jdn, c.lunation) {
            (None, Some(m)) => Some(MonthSpan {
                first_jdn: m.new_moon_jdn,
                last_jdn: m.last_day_jdn,
                first_date: self.iso(m.new_moon_jdn),
                last_date: self.iso(m.last_day_jdn),
                first_gz: m.new_moon_gz,
                last_gz: m.last_day_gz,
            }),
            _ => None,
        };
        ResolvedDate {
            index: token.index,
            text: token.text.clone(),
            dynasty_id: c.dynasty_id,
            dynasty_name: c.dynasty_id.and_then(|id| t.dynasty(id)).map(|d| d.name.clone()),
            ruler_id: c.ruler_id,
            ruler_name: c.ruler_id.and_then(|id| t.ruler_name(id)).map(str::to_string),
            era_id: c.era_id,
            era_name: c.era_id.and_then(|id| t.era(id)).map(|e| e.name.clone()),
            calendar_stream: c.calendar_stream,
            year: c.year,
            civil_year: c.civil_year,
            sex_year: c.sex_year,
            month: c.month,
            intercalary: c.intercalary,
            day: c.day,
            gz: c.gz,
            phase: c.phase,
            suffix: token.suffix.clone(),
            jdn: c.jdn,
            date: c.jdn.map(|j| self.iso(j)),
            month_span,
            diagnostic: render_diagnostics(&c.diagnostics),
            diagnostics: c.diagnostics.clone(),
        }
    }
}
