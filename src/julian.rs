//! Julian Day Number ↔ civil calendar conversion.
//!
//! Civil dates before the Gregorian start are rendered in the Julian
//! calendar unless proleptic Gregorian output is requested. Years are
//! astronomical (1 BCE is year 0).

use serde::{Deserialize, Serialize};

/// A civil calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CivilDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CivilDate {
    pub const fn new(year: i32, month: u8, day: u8) -> Self {
        CivilDate { year, month, day }
    }

    /// ISO-8601 style rendering, signed for years before year 0.
    pub fn to_iso(&self) -> String {
        if self.year < 0 {
            format!("-{:04}-{:02}-{:02}", -self.year, self.month, self.day)
        } else {
            format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
        }
    }

    /// True if the fields form a real Gregorian date.
    pub fn is_valid_gregorian(&self) -> bool {
        if !(1..=12).contains(&self.month) || self.day == 0 {
            return false;
        }
        let leap = (self.year % 4 == 0 && self.year % 100 != 0) || self.year % 400 == 0;
        let len = match self.month {
            2 if leap => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        };
        self.day <= len
    }
}

/// Day the Gregorian reform took effect.
pub const DEFAULT_GREGORIAN_START: CivilDate = CivilDate::new(1582, 10, 15);

fn shifted(date: CivilDate) -> (i64, i64, i64) {
    let a = (14 - date.month as i64) / 12;
    let y = date.year as i64 + 4800 - a;
    let m = date.month as i64 + 12 * a - 3;
    (y, m, date.day as i64)
}

pub fn gregorian_to_jdn(date: CivilDate) -> i64 {
    let (y, m, d) = shifted(date);
    d + (153 * m + 2) / 5 + 365 * y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)
        - 32045
}

pub fn julian_to_jdn(date: CivilDate) -> i64 {
    let (y, m, d) = shifted(date);
    d + (153 * m + 2) / 5 + 365 * y + y.div_euclid(4) - 32083
}

fn from_f(f: i64) -> CivilDate {
    let e = 4 * f + 3;
    let g = e.rem_euclid(1461) / 4;
    let h = 5 * g + 2;
    let day = h.rem_euclid(153) / 5 + 1;
    let month = (h.div_euclid(153) + 2).rem_euclid(12) + 1;
    let year = e.div_euclid(1461) - 4716 + (14 - month) / 12;
    CivilDate::new(year as i32, month as u8, day as u8)
}

pub fn jdn_to_gregorian(jdn: i64) -> CivilDate {
    let f = jdn + 1401 + ((4 * jdn + 274277).div_euclid(146097) * 3).div_euclid(4) - 38;
    from_f(f)
}

pub fn jdn_to_julian(jdn: i64) -> CivilDate {
    from_f(jdn + 1401)
}

/// Civil date of `jdn`, switching calendars at `gregorian_start`.
pub fn jdn_to_civil(jdn: i64, proleptic_gregorian: bool, gregorian_start: CivilDate) -> CivilDate {
    if proleptic_gregorian || jdn >= gregorian_to_jdn(gregorian_start) {
        jdn_to_gregorian(jdn)
    } else {
        jdn_to_julian(jdn)
    }
}

pub fn jdn_to_iso(jdn: i64, proleptic_gregorian: bool, gregorian_start: CivilDate) -> String {
    jdn_to_civil(jdn, proleptic_gregorian, gregorian_start).to_iso()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gregorian_reform_boundary() {
        assert_eq!(gregorian_to_jdn(CivilDate::new(1582, 10, 15)), 2299161);
        assert_eq!(julian_to_jdn(CivilDate::new(1582, 10, 4)), 2299160);
        assert_eq!(jdn_to_julian(2299160), CivilDate::new(1582, 10, 4));
        assert_eq!(jdn_to_gregorian(2299161), CivilDate::new(1582, 10, 15));
    }

    #[test]
    fn test_j2000() {
        assert_eq!(gregorian_to_jdn(CivilDate::new(2000, 1, 1)), 2451545);
        assert_eq!(jdn_to_gregorian(2451545), CivilDate::new(2000, 1, 1));
    }

    #[test]
    fn test_jdn_to_civil_switches_calendar() {
        let gs = DEFAULT_GREGORIAN_START;
        assert_eq!(jdn_to_iso(2299160, false, gs), "1582-10-04");
        assert_eq!(jdn_to_iso(2299160, true, gs), "1582-10-14");
        assert_eq!(jdn_to_iso(2299161, false, gs), "1582-10-15");
    }

    #[test]
    fn test_julian_roundtrip_ancient() {
        for jdn in [1_538_000_i64, 1_720_000, 1_798_888, 1_820_523] {
            let d = jdn_to_julian(jdn);
            assert_eq!(julian_to_jdn(d), jdn);
            let g = jdn_to_gregorian(jdn);
            assert_eq!(gregorian_to_jdn(g), jdn);
        }
    }

    #[test]
    fn test_negative_year_iso() {
        // 1 January 1 BCE (astronomical year 0) is JDN 1721058 in the Julian calendar
        assert_eq!(jdn_to_julian(1721058), CivilDate::new(0, 1, 1));
        // year -1 is common in the Julian calendar
        let d = jdn_to_julian(1721058 - 365);
        assert_eq!(d, CivilDate::new(-1, 1, 1));
        assert_eq!(d.to_iso(), "-0001-01-01");
    }

    #[test]
    fn test_valid_gregorian() {
        assert!(CivilDate::new(2000, 2, 29).is_valid_gregorian());
        assert!(!CivilDate::new(1900, 2, 29).is_valid_gregorian());
        assert!(!CivilDate::new(1582, 13, 1).is_valid_gregorian());
    }
}
