//! Tagged date elements → numeric [`DateToken`]s.
//!
//! The tagger hands over each date as the raw strings of its child
//! elements, optionally with explicit numeric attributes. Attributes win
//! over strings on the same field; strings that fail to parse are dropped
//! with a debug log.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use era_types::{DateToken, DynastyId, EraId, LunarPhase, RulerId};

use crate::ganzhi::parse_ganzhi;
use crate::numerals::{parse_cn_day, parse_cn_month, parse_cn_year};

/// Any run of whitespace, removed from display text.
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Explicit numeric attributes carried on a date element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateAttributes {
    pub dynasty_id: Option<DynastyId>,
    pub ruler_id: Option<RulerId>,
    pub era_id: Option<EraId>,
    pub year: Option<i32>,
    pub sex_year: Option<u8>,
    pub month: Option<u8>,
    pub intercalary: Option<bool>,
    pub day: Option<u8>,
    pub gz: Option<u8>,
    pub phase: Option<LunarPhase>,
    pub nmd_gz: Option<u8>,
}

/// One tagged date as produced by the tagger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggedDate {
    pub index: usize,
    pub text: String,
    pub dynasty: Option<String>,
    pub ruler: Option<String>,
    pub era: Option<String>,
    pub year: Option<String>,
    pub sex_year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub gz: Option<String>,
    /// 朔 or 晦
    pub lp: Option<String>,
    /// Sexagenary day of the month's new moon
    pub nmdgz: Option<String>,
    /// Intercalary marker (閏), when tagged apart from the month
    pub intercalary: Option<String>,
    pub suffix: Option<String>,
    pub attrs: DateAttributes,
}

fn clean(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(|v| RE_WHITESPACE.replace_all(v, "").into_owned())
        .filter(|v| !v.is_empty())
}

/// Parse a non-empty string field, logging values that do not parse.
fn parse_field<T>(index: usize, field: &str, raw: &Option<String>, f: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = clean(raw)?;
    let parsed = f(&raw);
    if parsed.is_none() {
        debug!(index, field, raw = %raw, "unparseable date element dropped");
    }
    parsed
}

impl TaggedDate {
    pub fn normalise(&self) -> DateToken {
        let a = &self.attrs;
        let i = self.index;

        let parsed_month = parse_field(i, "month", &self.month, parse_cn_month);
        let month = a.month.or(parsed_month.and_then(|(m, _)| m));
        let marker = clean(&self.intercalary).is_some();
        let intercalary = a
            .intercalary
            .unwrap_or(marker || parsed_month.is_some_and(|(_, leap)| leap));

        let gz = a.gz.or_else(|| parse_field(i, "gz", &self.gz, parse_ganzhi));
        let phase = a.phase.or_else(|| parse_field(i, "lp", &self.lp, LunarPhase::from_chinese));
        // a 朔 day's sexagenary day is the new moon's
        let nmd_gz = a
            .nmd_gz
            .or_else(|| parse_field(i, "nmdgz", &self.nmdgz, parse_ganzhi))
            .or(gz.filter(|_| phase == Some(LunarPhase::NewMoon)));

        DateToken {
            index: i,
            text: RE_WHITESPACE.replace_all(&self.text, "").into_owned(),
            dynasty: clean(&self.dynasty),
            dynasty_id: a.dynasty_id,
            ruler: clean(&self.ruler),
            ruler_id: a.ruler_id,
            era: clean(&self.era),
            era_id: a.era_id,
            year: a.year.or_else(|| parse_field(i, "year", &self.year, parse_cn_year)),
            sex_year: a.sex_year.or_else(|| parse_field(i, "sex_year", &self.sex_year, parse_ganzhi)),
            month,
            intercalary,
            day: a.day.or_else(|| parse_field(i, "day", &self.day, parse_cn_day)),
            gz,
            phase,
            nmd_gz,
            suffix: clean(&self.suffix),
        }
    }
}

/// Normalise a batch, keeping input order.
pub fn normalise_all(dates: &[TaggedDate]) -> Vec<DateToken> {
    dates.iter().map(TaggedDate::normalise).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(index: usize) -> TaggedDate {
        TaggedDate {
            index,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalise_era_year_month() {
        let t = TaggedDate {
            text: "建安 十八年 二月".into(),
            era: Some("建安".into()),
            year: Some("十八年".into()),
            month: Some("二月".into()),
            ..tagged(0)
        }
        .normalise();
        assert_eq!(t.text, "建安十八年二月");
        assert_eq!(t.era.as_deref(), Some("建安"));
        assert_eq!(t.year, Some(18));
        assert_eq!(t.month, Some(2));
        assert!(!t.intercalary);
    }

    #[test]
    fn test_normalise_yuan_nian_and_special_months() {
        let t = TaggedDate {
            year: Some("元年".into()),
            month: Some("臘月".into()),
            ..tagged(1)
        }
        .normalise();
        assert_eq!(t.year, Some(1));
        assert_eq!(t.month, Some(13));

        let t = TaggedDate {
            month: Some("一月".into()),
            ..tagged(2)
        }
        .normalise();
        assert_eq!(t.month, Some(14));
    }

    #[test]
    fn test_normalise_intercalary_sources() {
        let t = TaggedDate {
            month: Some("閏三月".into()),
            ..tagged(0)
        }
        .normalise();
        assert_eq!((t.month, t.intercalary), (Some(3), true));

        let t = TaggedDate {
            month: Some("三月".into()),
            intercalary: Some("閏".into()),
            ..tagged(0)
        }
        .normalise();
        assert_eq!((t.month, t.intercalary), (Some(3), true));

        let t = TaggedDate {
            intercalary: Some("閏".into()),
            month: Some("閏月".into()),
            ..tagged(0)
        }
        .normalise();
        assert_eq!((t.month, t.intercalary), (None, true));
    }

    #[test]
    fn test_normalise_day_fields() {
        let t = TaggedDate {
            sex_year: Some("甲子歲".into()),
            gz: Some("景辰".into()),
            lp: Some("朔".into()),
            day: Some("廿三日".into()),
            suffix: Some("末".into()),
            ..tagged(3)
        }
        .normalise();
        assert_eq!(t.sex_year, Some(1));
        assert_eq!(t.gz, Some(53));
        assert_eq!(t.phase, Some(LunarPhase::NewMoon));
        assert_eq!(t.day, Some(23));
        assert_eq!(t.suffix.as_deref(), Some("末"));
    }

    #[test]
    fn test_normalise_new_moon_gz() {
        let t = TaggedDate {
            month: Some("二月".into()),
            nmdgz: Some("丙辰".into()),
            gz: Some("庚申".into()),
            ..tagged(0)
        }
        .normalise();
        assert_eq!(t.nmd_gz, Some(53));
        assert_eq!(t.gz, Some(57));

        let t = TaggedDate {
            gz: Some("丙辰".into()),
            lp: Some("朔".into()),
            ..tagged(1)
        }
        .normalise();
        assert_eq!(t.nmd_gz, Some(53));

        let t = TaggedDate {
            gz: Some("丙辰".into()),
            lp: Some("晦".into()),
            ..tagged(2)
        }
        .normalise();
        assert_eq!(t.nmd_gz, None);
    }

    #[test]
    fn test_attributes_win_over_strings() {
        let t = TaggedDate {
            era: Some("建安".into()),
            year: Some("十八年".into()),
            month: Some("閏二月".into()),
            attrs: DateAttributes {
                era_id: Some(7),
                year: Some(3),
                month: Some(5),
                intercalary: Some(false),
                ..Default::default()
            },
            ..tagged(0)
        }
        .normalise();
        assert_eq!(t.era_id, Some(7));
        assert_eq!(t.era.as_deref(), Some("建安"));
        assert_eq!(t.year, Some(3));
        assert_eq!(t.month, Some(5));
        assert!(!t.intercalary);
    }

    #[test]
    fn test_unparseable_and_blank_strings_dropped() {
        let t = TaggedDate {
            dynasty: Some("  ".into()),
            year: Some("某年".into()),
            gz: Some("甲丑".into()),
            ..tagged(0)
        }
        .normalise();
        assert_eq!(t.dynasty, None);
        assert_eq!(t.year, None);
        assert_eq!(t.gz, None);
        assert!(!t.has_temporal_evidence());
    }

    #[test]
    fn test_tagged_date_from_json() {
        let dates: Vec<TaggedDate> = serde_json::from_str(
            r#"[{"index": 0, "text": "鳳皇元年", "era": "鳳皇", "year": "元年"},
                {"index": 1, "gz": "丙辰", "attrs": {"phase": "new-moon"}}]"#,
        )
        .unwrap();
        let tokens = normalise_all(&dates);
        assert_eq!(tokens[0].year, Some(1));
        assert_eq!(tokens[1].gz, Some(53));
        assert_eq!(tokens[1].phase, Some(LunarPhase::NewMoon));
    }
}
