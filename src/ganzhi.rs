//! Sexagenary (干支) cycle arithmetic for years and days.
//!
//! Cycle positions are numbered 1–60, 甲子 = 1.

pub const STEMS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];
pub const BRANCHES: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

/// Civil year 4 (and therefore −596) opens a cycle.
const YEAR_ANCHOR: i32 = 4;
/// JDN offset placing 1949-10-01 (JDN 2433191) on 甲子.
const DAY_OFFSET: i64 = 49;

fn stem_index(c: char) -> Option<usize> {
    // 景 replaces 丙 in Tang texts (taboo on 李昞)
    let c = if c == '景' { '丙' } else { c };
    STEMS.iter().position(|s| *s == c)
}

fn branch_index(c: char) -> Option<usize> {
    BRANCHES.iter().position(|b| *b == c)
}

/// Two-character stem-branch name → cycle position, e.g. 丙辰 → 53.
///
/// Trailing 年/歲 (sexagenary years) are ignored. Returns `None` for
/// stem/branch pairs of mismatched parity, which never occur in the cycle.
pub fn parse_ganzhi(s: &str) -> Option<u8> {
    let s = s.trim().trim_end_matches(['年', '歲']);
    let mut chars = s.chars();
    let stem = stem_index(chars.next()?)?;
    let branch = branch_index(chars.next()?)?;
    if chars.next().is_some() || stem % 2 != branch % 2 {
        return None;
    }
    let pos = (6 * stem as i32 - 5 * branch as i32).rem_euclid(60);
    Some(pos as u8 + 1)
}

/// Cycle position → stem-branch name.
pub fn ganzhi_name(n: u8) -> Option<String> {
    if !(1..=60).contains(&n) {
        return None;
    }
    let i = (n - 1) as usize;
    Some([STEMS[i % 10], BRANCHES[i % 12]].iter().collect())
}

/// Sexagenary position of a civil year.
pub fn gz_year(year: i32) -> u8 {
    ((year - YEAR_ANCHOR).rem_euclid(60) + 1) as u8
}

/// Sexagenary position of a day.
pub fn jdn_to_gz(jdn: i64) -> u8 {
    ((jdn + DAY_OFFSET).rem_euclid(60) + 1) as u8
}

/// Position `offset` days after `gz` on the cycle.
pub fn gz_add(gz: u8, offset: i64) -> u8 {
    ((gz as i64 - 1 + offset).rem_euclid(60) + 1) as u8
}

/// Days from `from` forward to the next occurrence of `to` (0–59).
pub fn gz_distance(from: u8, to: u8) -> i64 {
    (to as i64 - from as i64).rem_euclid(60)
}

/// Every civil year in `start..=end` whose cycle position is `gz`.
pub fn years_with_gz(gz: u8, start: i32, end: i32) -> Vec<i32> {
    if start > end || !(1..=60).contains(&gz) {
        return Vec::new();
    }
    let Some(first) = start.checked_add(gz_distance(gz_year(start), gz) as i32) else {
        return Vec::new();
    };
    (first..=end).step_by(60).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ganzhi_known_positions() {
        assert_eq!(parse_ganzhi("甲子"), Some(1));
        assert_eq!(parse_ganzhi("乙丑"), Some(2));
        assert_eq!(parse_ganzhi("甲戌"), Some(11));
        assert_eq!(parse_ganzhi("丙辰"), Some(53));
        assert_eq!(parse_ganzhi("癸亥"), Some(60));
    }

    #[test]
    fn test_parse_ganzhi_variants_and_suffix() {
        assert_eq!(parse_ganzhi("景辰"), Some(53));
        assert_eq!(parse_ganzhi("甲子歲"), Some(1));
        assert_eq!(parse_ganzhi("丙辰年"), Some(53));
    }

    #[test]
    fn test_parse_ganzhi_invalid() {
        assert_eq!(parse_ganzhi("甲丑"), None);
        assert_eq!(parse_ganzhi("甲"), None);
        assert_eq!(parse_ganzhi("甲子丑"), None);
        assert_eq!(parse_ganzhi("建安"), None);
    }

    #[test]
    fn test_ganzhi_name_roundtrip_all() {
        for n in 1..=60u8 {
            let name = ganzhi_name(n).unwrap();
            assert_eq!(parse_ganzhi(&name), Some(n));
        }
        assert_eq!(ganzhi_name(0), None);
        assert_eq!(ganzhi_name(61), None);
    }

    #[test]
    fn test_gz_year_anchors() {
        assert_eq!(gz_year(4), 1);
        assert_eq!(gz_year(-596), 1);
        assert_eq!(gz_year(1984), 1);
        assert_eq!(gz_year(213), parse_ganzhi("癸巳").unwrap());
    }

    #[test]
    fn test_jdn_to_gz_anchor() {
        assert_eq!(jdn_to_gz(2433191), 1);
        assert_eq!(jdn_to_gz(2433190), 60);
    }

    #[test]
    fn test_years_with_gz_spacing() {
        let ys = years_with_gz(1, 100, 229);
        assert_eq!(ys, vec![124, 184]);
        assert!(years_with_gz(1, 10, 5).is_empty());
        assert!(years_with_gz(0, 100, 229).is_empty());
        assert!(years_with_gz(61, 100, 229).is_empty());
        assert!(years_with_gz(10, i32::MAX - 5, i32::MAX).is_empty());
    }

    #[test]
    fn test_gz_add_wraps() {
        assert_eq!(gz_add(60, 1), 1);
        assert_eq!(gz_add(1, -1), 60);
        assert_eq!(gz_distance(49, 53), 4);
        assert_eq!(gz_distance(53, 49), 56);
    }
}
