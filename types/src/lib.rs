//! Records shared between the resolution engine and its callers.
//!
//! Everything here is plain serde data: reference-table rows, the tokens
//! handed over by the tagger, and the resolved rows handed back.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type DynastyId = u32;
pub type RulerId = u32;
pub type EraId = u32;
/// Selects one national lunisolar calendar table (China 1–3, Japan 4, Korea 5–8).
pub type CalendarStream = u16;

// ── Lunar phase ──────────────────────────────────────────────────────────

/// Phase words that anchor a day to one end of a lunar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LunarPhase {
    /// 朔 – first day of the month
    NewMoon,
    /// 晦 – last day of the month
    LastDay,
}

impl LunarPhase {
    pub fn from_chinese(s: &str) -> Option<Self> {
        match s.trim() {
            "朔" => Some(Self::NewMoon),
            "晦" => Some(Self::LastDay),
            _ => None,
        }
    }
}

// ── Input token ──────────────────────────────────────────────────────────

/// One date expression, already tagged and normalised.
///
/// An explicit `*_id` always takes precedence over the name on the same
/// field. Months use the lunar-table encoding (正月 = 1, 臘月 = 13, 一月 = 14).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateToken {
    pub index: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynasty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynasty_id: Option<DynastyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruler_id: Option<RulerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era_id: Option<EraId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex_year: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(default)]
    pub intercalary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gz: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<LunarPhase>,
    /// Sexagenary day of the month's new moon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nmd_gz: Option<u8>,
    /// Qualifier such as 初, 中, 末
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl DateToken {
    /// True if any identifier (name or explicit ID) was supplied.
    pub fn has_identifier(&self) -> bool {
        self.dynasty.is_some()
            || self.dynasty_id.is_some()
            || self.ruler.is_some()
            || self.ruler_id.is_some()
            || self.era.is_some()
            || self.era_id.is_some()
    }

    pub fn has_year_evidence(&self) -> bool {
        self.year.is_some() || self.sex_year.is_some()
    }

    /// Month, intercalary marker, new-moon day, or any day evidence.
    pub fn has_lunar_evidence(&self) -> bool {
        self.month.is_some() || self.intercalary || self.nmd_gz.is_some() || self.has_day_evidence()
    }

    pub fn has_day_evidence(&self) -> bool {
        self.day.is_some() || self.gz.is_some() || self.phase.is_some()
    }

    pub fn has_temporal_evidence(&self) -> bool {
        self.has_year_evidence() || self.has_lunar_evidence()
    }
}

// ── Reference tables ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dynasty {
    pub id: DynastyId,
    pub name: String,
    /// Enclosing dynasty ("Later Tang" is part of "Tang")
    #[serde(default)]
    pub part_of: Option<DynastyId>,
    #[serde(default)]
    pub calendar_stream: Option<CalendarStream>,
    pub start_year: i32,
    pub end_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruler {
    pub id: RulerId,
    /// Canonical display name
    #[serde(default)]
    pub name: String,
    pub dynasty_id: DynastyId,
    #[serde(default)]
    pub calendar_stream: Option<CalendarStream>,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub max_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Era {
    pub id: EraId,
    pub name: String,
    pub ruler_id: RulerId,
    pub dynasty_id: DynastyId,
    pub calendar_stream: CalendarStream,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub max_year: Option<i32>,
}

/// One lunation of one calendar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LunarMonth {
    pub calendar_stream: CalendarStream,
    /// Civil (astronomical) year
    pub year: i32,
    pub month: u8,
    #[serde(default)]
    pub intercalary: bool,
    /// JDN of the new-moon day (day 1)
    pub new_moon_jdn: i64,
    /// JDN of the last day (晦)
    pub last_day_jdn: i64,
    pub new_moon_gz: u8,
    pub last_day_gz: u8,
    /// Number of days in the month (29 or 30)
    pub days: u8,
    /// Sexagenary number of the civil year
    pub year_gz: u8,
}

// ── Diagnostics ──────────────────────────────────────────────────────────

/// Why a row is not a clean, unique resolution.
///
/// Serialised as its stable code; `Display` renders the English phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diagnostic {
    NoIdentifierMatch,
    NoCandidates,
    InsufficientInformation,
    YearOutOfBounds,
    YearResolutionFailed,
    YearLunationMismatch,
    YearSexagenaryMismatch,
    DynastyRulerEraMismatch,
    YearMonthMismatch,
    YearIntercalaryMonthMismatch,
    LunarPhaseGzDayMismatch,
    LunarPhaseGzMismatch,
    NewMoonGzMismatch,
    MonthDayGzMismatch,
    MonthGzMismatch,
    MonthDayOutOfBounds,
    LunarDataMissing,
    LunarConstraintFailed,
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoIdentifierMatch => "no-identifier-match",
            Self::NoCandidates => "no-candidates",
            Self::InsufficientInformation => "insufficient-information",
            Self::YearOutOfBounds => "year-out-of-bounds",
            Self::YearResolutionFailed => "year-resolution-failed",
            Self::YearLunationMismatch => "year-lunation-mismatch",
            Self::YearSexagenaryMismatch => "year-sexagenary-mismatch",
            Self::DynastyRulerEraMismatch => "dynasty-ruler-era-mismatch",
            Self::YearMonthMismatch => "year-month-mismatch",
            Self::YearIntercalaryMonthMismatch => "year-intercalary-month-mismatch",
            Self::LunarPhaseGzDayMismatch => "lunar-phase-gz-day-mismatch",
            Self::LunarPhaseGzMismatch => "lunar-phase-gz-mismatch",
            Self::NewMoonGzMismatch => "new-moon-gz-mismatch",
            Self::MonthDayGzMismatch => "month-day-gz-mismatch",
            Self::MonthGzMismatch => "month-gz-mismatch",
            Self::MonthDayOutOfBounds => "month-day-out-of-bounds",
            Self::LunarDataMissing => "lunar-data-missing",
            Self::LunarConstraintFailed => "lunar-constraint-failed",
        }
    }

    /// Codes that only mean "not solved yet" and are dropped once a token
    /// resolves to an absolute year under some dynasty, ruler or era.
    pub fn is_preliminary(&self) -> bool {
        matches!(
            self,
            Self::NoIdentifierMatch | Self::NoCandidates | Self::YearOutOfBounds
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoIdentifierMatch => "No matches found",
            Self::NoCandidates => "No candidates generated",
            Self::InsufficientInformation => "Insufficient information",
            Self::YearOutOfBounds => "Year out of bounds",
            Self::YearResolutionFailed => "Year resolution failed",
            Self::YearLunationMismatch => "Year-lunation mismatch",
            Self::YearSexagenaryMismatch => "Year-sex. year mismatch",
            Self::DynastyRulerEraMismatch => "Dyn-rul-era mismatch",
            Self::YearMonthMismatch => "Year-month mismatch",
            Self::YearIntercalaryMonthMismatch => "Year-int. month mismatch",
            Self::LunarPhaseGzDayMismatch => "Lunar phase-sexDay-day mismatch",
            Self::LunarPhaseGzMismatch => "Lunar phase-gz mismatch",
            Self::NewMoonGzMismatch => "Lunar phase-day-NMsexDay mismatch",
            Self::MonthDayGzMismatch => "Month-day-gz mismatch",
            Self::MonthGzMismatch => "Month-gz mismatch (out of bounds)",
            Self::MonthDayOutOfBounds => "Month-day mismatch (out of bounds)",
            Self::LunarDataMissing => "No lunar data for year",
            Self::LunarConstraintFailed => "Lunar constraint solving failed",
        };
        write!(f, "{msg}; ")
    }
}

/// Concatenate diagnostics into the human-readable string carried on rows.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(|d| d.to_string()).collect()
}

// ── Output row ───────────────────────────────────────────────────────────

/// First and last day of a month-level resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpan {
    pub first_jdn: i64,
    pub last_jdn: i64,
    pub first_date: String,
    pub last_date: String,
    pub first_gz: u8,
    pub last_gz: u8,
}

/// One surviving interpretation of one input token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDate {
    pub index: usize,
    pub text: String,
    pub dynasty_id: Option<DynastyId>,
    pub dynasty_name: Option<String>,
    pub ruler_id: Option<RulerId>,
    pub ruler_name: Option<String>,
    pub era_id: Option<EraId>,
    pub era_name: Option<String>,
    pub calendar_stream: Option<CalendarStream>,
    /// Year counted within the era / reign / dynasty
    pub year: Option<i32>,
    /// Absolute civil year
    pub civil_year: Option<i32>,
    pub sex_year: Option<u8>,
    pub month: Option<u8>,
    pub intercalary: bool,
    pub day: Option<u8>,
    pub gz: Option<u8>,
    pub phase: Option<LunarPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub jdn: Option<i64>,
    /// Civil date derived from `jdn` (Julian or Gregorian, see run parameters)
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_span: Option<MonthSpan>,
    pub diagnostics: Vec<Diagnostic>,
    /// Rendered `diagnostics`; empty on full success
    pub diagnostic: String,
}

impl ResolvedDate {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_diagnostics_accumulates() {
        let s = render_diagnostics(&[Diagnostic::YearOutOfBounds, Diagnostic::YearMonthMismatch]);
        assert_eq!(s, "Year out of bounds; Year-month mismatch; ");
    }

    #[test]
    fn test_preliminary_codes() {
        assert!(Diagnostic::NoCandidates.is_preliminary());
        assert!(Diagnostic::YearOutOfBounds.is_preliminary());
        assert!(!Diagnostic::InsufficientInformation.is_preliminary());
        assert!(!Diagnostic::LunarConstraintFailed.is_preliminary());
    }

    #[test]
    fn test_token_evidence() {
        let t = DateToken {
            index: 0,
            gz: Some(53),
            ..Default::default()
        };
        assert!(!t.has_identifier());
        assert!(!t.has_year_evidence());
        assert!(t.has_lunar_evidence());
        assert!(t.has_temporal_evidence());

        let t = DateToken {
            index: 0,
            nmd_gz: Some(17),
            ..Default::default()
        };
        assert!(t.has_lunar_evidence());
        assert!(!t.has_day_evidence());
    }

    #[test]
    fn test_lunar_phase_from_chinese() {
        assert_eq!(LunarPhase::from_chinese("朔"), Some(LunarPhase::NewMoon));
        assert_eq!(LunarPhase::from_chinese("晦"), Some(LunarPhase::LastDay));
        assert_eq!(LunarPhase::from_chinese("望"), None);
    }
}
