//! Small in-memory reference tables shared by the unit tests.

use era_types::{CalendarStream, Dynasty, DynastyId, Era, EraId, LunarMonth, Ruler, RulerId};

use crate::ganzhi::{gz_year, jdn_to_gz};
use crate::tables::ReferenceTables;

pub const HAN: DynastyId = 1;
pub const CAO_WEI: DynastyId = 2;
pub const NORTHERN_WEI: DynastyId = 3;
pub const WU: DynastyId = 4;
pub const TANG: DynastyId = 10;
pub const LATER_TANG: DynastyId = 11;
pub const LONG_STATE: DynastyId = 20;
pub const YAMATO: DynastyId = 30;

pub const LIU_XIE: RulerId = 101;
pub const SUN_HAO: RulerId = 102;
pub const CAO_PI: RulerId = 103;
pub const LI_CUNXU: RulerId = 110;
pub const LI_SHIMIN: RulerId = 111;
pub const LONG_KING: RulerId = 120;
pub const KOTOKU: RulerId = 130;

pub const JIAN_AN: EraId = 1001;
pub const FENG_HUANG: EraId = 1002;
pub const HUANG_CHU: EraId = 1003;
pub const TONG_GUANG: EraId = 1010;
pub const ZHEN_GUAN: EraId = 1011;
pub const YONG_CHANG: EraId = 1020;
pub const TAIKA: EraId = 1030;

/// First new moon of 建安十八年 (213).
pub const NM_213: i64 = 1_798_888;
/// First new moon of 鳳皇元年 (272).
pub const NM_272: i64 = 1_820_460;
/// 214 carries an intercalary month after its third month.
pub const NM_214: i64 = NM_213 + 354;

fn dynasty(id: DynastyId, name: &str, part_of: Option<DynastyId>, start: i32, end: i32) -> Dynasty {
    let stream = if id == YAMATO { 4 } else { 1 };
    Dynasty {
        id,
        name: name.to_string(),
        part_of,
        calendar_stream: Some(stream),
        start_year: start,
        end_year: end,
    }
}

fn ruler(id: RulerId, name: &str, dynasty_id: DynastyId, start: i32, end: i32) -> Ruler {
    Ruler {
        id,
        name: name.to_string(),
        dynasty_id,
        calendar_stream: None,
        start_year: start,
        end_year: end,
        max_year: Some(end - start + 1),
    }
}

fn era(id: EraId, name: &str, ruler_id: RulerId, dynasty_id: DynastyId, start: i32, end: i32) -> Era {
    let stream = if dynasty_id == YAMATO { 4 } else { 1 };
    Era {
        id,
        name: name.to_string(),
        ruler_id,
        dynasty_id,
        calendar_stream: stream,
        start_year: start,
        end_year: end,
        max_year: Some(end - start + 1),
    }
}

/// Twelve alternating 30/29-day months from `first_new_moon`, plus an
/// intercalary copy of month `leap_after` right after it.
pub fn lunar_year(
    stream: CalendarStream,
    year: i32,
    first_new_moon: i64,
    leap_after: Option<u8>,
) -> Vec<LunarMonth> {
    let mut plan = Vec::new();
    for m in 1..=12u8 {
        plan.push((m, false));
        if leap_after == Some(m) {
            plan.push((m, true));
        }
    }
    let mut nm = first_new_moon;
    plan.into_iter()
        .enumerate()
        .map(|(i, (month, intercalary))| {
            let days: u8 = if i % 2 == 0 { 30 } else { 29 };
            let last = nm + days as i64 - 1;
            let row = LunarMonth {
                calendar_stream: stream,
                year,
                month,
                intercalary,
                new_moon_jdn: nm,
                last_day_jdn: last,
                new_moon_gz: jdn_to_gz(nm),
                last_day_gz: jdn_to_gz(last),
                days,
                year_gz: gz_year(year),
            };
            nm = last + 1;
            row
        })
        .collect()
}

pub fn tables() -> ReferenceTables {
    let dynasties = vec![
        dynasty(HAN, "漢", None, -205, 220),
        dynasty(CAO_WEI, "曹魏", None, 220, 265),
        dynasty(NORTHERN_WEI, "北魏", None, 386, 534),
        dynasty(WU, "吳", None, 222, 280),
        dynasty(TANG, "唐", None, 618, 907),
        dynasty(LATER_TANG, "後唐", Some(TANG), 923, 936),
        dynasty(LONG_STATE, "長國", None, 100, 229),
        dynasty(YAMATO, "日本", None, 600, 1868),
    ];
    let rulers = vec![
        ruler(LIU_XIE, "劉協", HAN, 189, 220),
        ruler(SUN_HAO, "孫皓", WU, 264, 280),
        ruler(CAO_PI, "曹丕", CAO_WEI, 220, 226),
        ruler(LI_CUNXU, "李存勖", LATER_TANG, 923, 926),
        ruler(LI_SHIMIN, "李世民", TANG, 626, 649),
        ruler(LONG_KING, "長王", LONG_STATE, 100, 229),
        ruler(KOTOKU, "孝德", YAMATO, 645, 654),
    ];
    let eras = vec![
        era(JIAN_AN, "建安", LIU_XIE, HAN, 196, 220),
        era(FENG_HUANG, "鳳皇", SUN_HAO, WU, 272, 272),
        era(HUANG_CHU, "黃初", CAO_PI, CAO_WEI, 220, 226),
        era(TONG_GUANG, "同光", LI_CUNXU, LATER_TANG, 923, 926),
        era(ZHEN_GUAN, "貞觀", LI_SHIMIN, TANG, 627, 649),
        era(YONG_CHANG, "永長", LONG_KING, LONG_STATE, 100, 229),
        era(TAIKA, "大化", KOTOKU, YAMATO, 645, 650),
    ];
    let mut lunar = lunar_year(1, 213, NM_213, None);
    lunar.extend(lunar_year(1, 214, NM_214, Some(3)));
    lunar.extend(lunar_year(1, 272, NM_272, None));
    let dynasty_names = vec![
        ("魏".to_string(), CAO_WEI),
        ("魏".to_string(), NORTHERN_WEI),
        ("漢".to_string(), HAN),
    ];
    let ruler_names = vec![("獻帝".to_string(), LIU_XIE), ("莊宗".to_string(), LI_CUNXU)];
    ReferenceTables::new(dynasties, rulers, eras, lunar, dynasty_names, ruler_names)
        .expect("fixture tables are consistent")
}
