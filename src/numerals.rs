//! Chinese numerals as they appear in dated passages.

/// Single Chinese digit character → value 1–9.
fn cn_digit(c: char) -> Option<u32> {
    match c {
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

/// Contracted tens: 廿 = 20, 卅 = 30, 卌 = 40 (plus their variant forms).
fn cn_tens(c: char) -> Option<u32> {
    match c {
        '廿' | '卄' => Some(20),
        '卅' | '丗' => Some(30),
        '卌' => Some(40),
        _ => None,
    }
}

/// Parse a Chinese cardinal number (元/一–九十九) → u32.
///
/// Handles 元, 一–九, 十, 十一–十九, D十, D十D, the contracted tens
/// 廿/卅/卌 (廿三 = 23) and the archaic 有 joiner (十有二 = 12).
pub fn parse_cn_number(s: &str) -> Option<u32> {
    if s == "元" {
        return Some(1);
    }
    let chars: Vec<char> = s.chars().filter(|c| *c != '有').collect();
    match chars.as_slice() {
        ['十'] => Some(10),
        ['十', d] => Some(10 + cn_digit(*d)?),
        [c] => cn_digit(*c).or_else(|| cn_tens(*c)),
        [t, d] if cn_tens(*t).is_some() => Some(cn_tens(*t)? + cn_digit(*d)?),
        [d, '十'] => Some(cn_digit(*d)? * 10),
        [d1, '十', d2] => Some(cn_digit(*d1)? * 10 + cn_digit(*d2)?),
        _ => None,
    }
}

/// Parse a year expression such as `十八年`, `元年` or `三載`.
pub fn parse_cn_year(s: &str) -> Option<i32> {
    let base = s.trim().trim_end_matches(['年', '載']);
    parse_cn_number(base).map(|n| n as i32)
}

/// Parse a month expression → (month number, intercalary).
///
/// Month numbers follow the lunar-table encoding: 正月 is 1, 臘月 is 13 and
/// 一月 is 14, so that calendars which distinguish 正月 from 一月 keep both.
/// A bare 閏月 has no number of its own.
pub fn parse_cn_month(s: &str) -> Option<(Option<u8>, bool)> {
    let s = s.trim();
    let (intercalary, rest) = match s.strip_prefix('閏') {
        Some(r) => (true, r),
        None => (false, s),
    };
    let base = rest.strip_suffix('月').unwrap_or(rest);
    let month = match base {
        "" if intercalary => return Some((None, true)),
        "正" => 1,
        "臘" => 13,
        "一" => 14,
        _ => {
            let m = parse_cn_number(base)?;
            if !(2..=12).contains(&m) {
                return None;
            }
            m as u8
        }
    };
    Some((Some(month), intercalary))
}

/// Parse a day-of-month expression such as `十五日` or `廿三日`.
pub fn parse_cn_day(s: &str) -> Option<u8> {
    let base = s.trim().trim_end_matches('日');
    let d = parse_cn_number(base)?;
    if (1..=30).contains(&d) { Some(d as u8) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cn_number_basic_digits() {
        assert_eq!(parse_cn_number("元"), Some(1));
        assert_eq!(parse_cn_number("一"), Some(1));
        assert_eq!(parse_cn_number("九"), Some(9));
    }

    #[test]
    fn test_parse_cn_number_tens() {
        assert_eq!(parse_cn_number("十"), Some(10));
        assert_eq!(parse_cn_number("十八"), Some(18));
        assert_eq!(parse_cn_number("二十"), Some(20));
        assert_eq!(parse_cn_number("四十三"), Some(43));
        assert_eq!(parse_cn_number("九十九"), Some(99));
    }

    #[test]
    fn test_parse_cn_number_contracted_and_you() {
        assert_eq!(parse_cn_number("廿"), Some(20));
        assert_eq!(parse_cn_number("廿三"), Some(23));
        assert_eq!(parse_cn_number("卅"), Some(30));
        assert_eq!(parse_cn_number("十有二"), Some(12));
    }

    #[test]
    fn test_parse_cn_number_invalid() {
        assert_eq!(parse_cn_number(""), None);
        assert_eq!(parse_cn_number("百"), None);
        assert_eq!(parse_cn_number("太"), None);
    }

    #[test]
    fn test_parse_cn_year() {
        assert_eq!(parse_cn_year("元年"), Some(1));
        assert_eq!(parse_cn_year("十八年"), Some(18));
        assert_eq!(parse_cn_year("三載"), Some(3));
    }

    #[test]
    fn test_parse_cn_month_encoding() {
        assert_eq!(parse_cn_month("正月"), Some((Some(1), false)));
        assert_eq!(parse_cn_month("二月"), Some((Some(2), false)));
        assert_eq!(parse_cn_month("十二月"), Some((Some(12), false)));
        assert_eq!(parse_cn_month("臘月"), Some((Some(13), false)));
        assert_eq!(parse_cn_month("一月"), Some((Some(14), false)));
    }

    #[test]
    fn test_parse_cn_month_intercalary() {
        assert_eq!(parse_cn_month("閏三月"), Some((Some(3), true)));
        assert_eq!(parse_cn_month("閏正月"), Some((Some(1), true)));
        assert_eq!(parse_cn_month("閏月"), Some((None, true)));
    }

    #[test]
    fn test_parse_cn_month_invalid() {
        assert_eq!(parse_cn_month("十三月"), None);
        assert_eq!(parse_cn_month(""), None);
    }

    #[test]
    fn test_parse_cn_day() {
        assert_eq!(parse_cn_day("一日"), Some(1));
        assert_eq!(parse_cn_day("廿三日"), Some(23));
        assert_eq!(parse_cn_day("三十日"), Some(30));
        assert_eq!(parse_cn_day("卌日"), None);
    }
}
