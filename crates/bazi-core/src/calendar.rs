//! Civil-date validation, the four sexagenary pillars, and lunisolar
//! conversion.
//!
//! The year pillar turns over at 立春, the month pillar at each of the
//! twelve jie, and the day pillar at civil midnight (or 23:00 under
//! [`ZiHourMode::Traditional`]). An instant falling exactly on a term
//! belongs to the sector that term opens.

use chrono::NaiveDate;

use crate::astro::{
    gregorian_from_jdn, local_day, lunation_index_near, new_moon_local, solar_term,
};
use crate::cycle::{five_rats_stem, five_tigers_stem, Branch, GanZhi};
use crate::error::{BaziError, Result};

/// Years accepted as input. Internal astronomical coverage extends one
/// year past each end so boundary lookups never fail for valid input.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// How a birth in the 23:00..24:00 half of the 子 hour assigns its day
/// pillar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZiHourMode {
    /// The day pillar follows the civil date.
    #[default]
    Modern,
    /// The day pillar rolls over at 23:00, with the start of the 子 hour.
    Traditional,
}

/// Rejects nonexistent civil dates and years outside the supported epoch.
pub(crate) fn validate_civil(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(BaziError::InvalidDate(format!(
            "year {year} outside supported range {MIN_YEAR}..={MAX_YEAR}"
        )));
    }
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(BaziError::InvalidDate(format!(
            "{year:04}-{month:02}-{day:02} is not a calendar date"
        )));
    }
    if hour > 23 || minute > 59 {
        return Err(BaziError::InvalidDate(format!(
            "{hour:02}:{minute:02} is not a clock time"
        )));
    }
    Ok(())
}

/// One of the twelve jie-bounded month sectors, with its bounding instants.
/// Sector 0 opens at 立春; its branch is 寅.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MonthSector {
    pub index: usize,
    /// Local instant of the jie that opens this sector.
    pub start: f64,
    /// Local instant of the next jie.
    pub end: f64,
}

impl MonthSector {
    pub fn branch(&self) -> Branch {
        Branch::from_index(((self.index + 2) % 12) as u8).unwrap()
    }
}

/// Locates the jie sector containing a local instant by scanning the jie
/// from the previous December's 大雪 through the following January's 小寒.
pub(crate) fn month_sector(local_jd: f64) -> Result<MonthSector> {
    let (gy, _, _) = gregorian_from_jdn(local_day(local_jd));
    let mut jie: Vec<f64> = Vec::with_capacity(14);
    jie.push(solar_term(gy - 1, 22)?);
    for term in (0..=22).step_by(2) {
        jie.push(solar_term(gy, term)?);
    }
    jie.push(solar_term(gy + 1, 0)?);

    for (i, pair) in jie.windows(2).enumerate() {
        if pair[0] <= local_jd && local_jd < pair[1] {
            // The scan starts at 大雪, the jie of sector 10.
            return Ok(MonthSector {
                index: (i + 10) % 12,
                start: pair[0],
                end: pair[1],
            });
        }
    }
    Err(BaziError::ComputationError(format!(
        "instant {local_jd} escaped the jie scan for year {gy}"
    )))
}

/// The sexagenary year governing an instant: the civil year if the instant
/// is on or after that year's 立春, otherwise the year before.
pub(crate) fn effective_year(local_jd: f64) -> Result<i32> {
    let (gy, _, _) = gregorian_from_jdn(local_day(local_jd));
    let lichun = solar_term(gy, 2)?;
    Ok(if local_jd >= lichun { gy } else { gy - 1 })
}

fn ganzhi_at(index: i64) -> GanZhi {
    GanZhi::from_index(index.rem_euclid(60) as u8).unwrap()
}

/// The year pillar of a sexagenary year number (1984 is 甲子).
pub(crate) fn year_ganzhi(year: i32) -> GanZhi {
    ganzhi_at(year as i64 - 4)
}

/// The day pillar of a civil day given as a julian day number.
pub(crate) fn day_ganzhi(jdn: i64) -> GanZhi {
    ganzhi_at(jdn + 49)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FourPillars {
    pub year: GanZhi,
    pub month: GanZhi,
    pub day: GanZhi,
    pub hour: GanZhi,
}

/// Derives all four pillars for a local instant. `hour` is the wall-clock
/// hour, needed for the 23:00 rollover decision; the year and month pillars
/// always follow the instant itself.
pub(crate) fn four_pillars(local_jd: f64, hour: u32, mode: ZiHourMode) -> Result<FourPillars> {
    let eff = effective_year(local_jd)?;
    let year = year_ganzhi(eff);

    let sector = month_sector(local_jd)?;
    let month_stem = five_tigers_stem(year.stem(), sector.index);
    let month = GanZhi::from_pair(month_stem, sector.branch()).ok_or_else(|| {
        BaziError::ComputationError("five-tigers stem broke sector parity".into())
    })?;

    let mut day_number = local_day(local_jd);
    if mode == ZiHourMode::Traditional && hour == 23 {
        day_number += 1;
    }
    let day = day_ganzhi(day_number);

    let hour_branch = Branch::from_index((((hour + 1) / 2) % 12) as u8).unwrap();
    let hour_stem = five_rats_stem(day.stem(), hour_branch);
    let hour = GanZhi::from_pair(hour_stem, hour_branch).ok_or_else(|| {
        BaziError::ComputationError("five-rats stem broke hour parity".into())
    })?;

    Ok(FourPillars {
        year,
        month,
        day,
        hour,
    })
}

// ---------------------------------------------------------------------------
// Lunisolar conversion
// ---------------------------------------------------------------------------

/// A date in the lunisolar calendar. `month` is the civil month number
/// (1 = 正月 .. 12 = 腊月); a leap month repeats the number of the month
/// it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub leap: bool,
    pub day: u32,
}

const MONTH_NAMES: [&str; 12] = [
    "正", "二", "三", "四", "五", "六", "七", "八", "九", "十", "冬", "腊",
];

fn day_name(day: u32) -> String {
    const DIGITS: [&str; 10] = ["一", "二", "三", "四", "五", "六", "七", "八", "九", "十"];
    match day {
        1..=10 => format!("初{}", DIGITS[(day - 1) as usize]),
        11..=19 => format!("十{}", DIGITS[(day - 11) as usize]),
        20 => "二十".to_string(),
        21..=29 => format!("廿{}", DIGITS[(day - 21) as usize]),
        _ => "三十".to_string(),
    }
}

impl LunarDate {
    /// Display form, e.g. `1990年四月廿一` or `2017年闰六月初一`.
    pub fn zh(&self) -> String {
        format!(
            "{}年{}{}月{}",
            self.year,
            if self.leap { "闰" } else { "" },
            MONTH_NAMES[(self.month - 1) as usize],
            day_name(self.day)
        )
    }
}

/// One month of a sui: its first civil day and its number.
struct SuiMonth {
    start: i64,
    number: u32,
    leap: bool,
}

/// Builds the months of the sui anchored at the winter solstice of year
/// `sy`: month 11 (which contains that solstice) through the month before
/// the next sui's month 11, with the leap month identified when thirteen
/// lunations fit.
fn build_sui(sy: i32) -> Result<(Vec<SuiMonth>, i64)> {
    let ws0 = solar_term(sy, 23)?;
    let ws1 = solar_term(sy + 1, 23)?;
    let ws0_day = local_day(ws0);
    let ws1_day = local_day(ws1);

    // Month 11 opens at the last new moon on or before the solstice day.
    let mut k = lunation_index_near(ws0);
    while local_day(new_moon_local(k)?) > ws0_day {
        k -= 1;
    }
    while local_day(new_moon_local(k + 1)?) <= ws0_day {
        k += 1;
    }

    // Collect month starts up to and including the next sui's month 11,
    // the last new moon on or before the next solstice day.
    let mut starts: Vec<i64> = Vec::with_capacity(14);
    loop {
        let d = local_day(new_moon_local(k)?);
        if d > ws1_day {
            break;
        }
        starts.push(d);
        k += 1;
    }
    let month_count = starts.len() - 1;

    // A sui of thirteen lunations gets a leap month: the first one after
    // month 11 containing no major term.
    let leap_idx = if month_count == 13 {
        let mut zhongqi: Vec<i64> = vec![ws0_day];
        for term in (1..=23).step_by(2) {
            zhongqi.push(local_day(solar_term(sy + 1, term)?));
        }
        (1..month_count).find(|&i| {
            !zhongqi
                .iter()
                .any(|&z| starts[i] <= z && z < starts[i + 1])
        })
    } else {
        None
    };

    let mut months = Vec::with_capacity(month_count);
    let mut number = 11u32;
    for (i, &start) in starts[..month_count].iter().enumerate() {
        if Some(i) == leap_idx {
            let prev = months
                .last()
                .map(|m: &SuiMonth| m.number)
                .unwrap_or(11);
            months.push(SuiMonth {
                start,
                number: prev,
                leap: true,
            });
        } else {
            months.push(SuiMonth {
                start,
                number,
                leap: false,
            });
            number = number % 12 + 1;
        }
    }
    Ok((months, starts[month_count]))
}

/// Converts a civil day (julian day number) to its lunisolar date.
pub(crate) fn lunar_from_day(day: i64) -> Result<LunarDate> {
    let (gy, _, _) = gregorian_from_jdn(day);
    let (months, end) = build_sui(gy)?;
    let (months, end, sy) = if day < months[0].start {
        let (m, e) = build_sui(gy - 1)?;
        (m, e, gy - 1)
    } else {
        (months, end, gy)
    };

    let mut found = None;
    for (i, m) in months.iter().enumerate() {
        let month_end = months.get(i + 1).map(|n| n.start).unwrap_or(end);
        if m.start <= day && day < month_end {
            found = Some(m);
            break;
        }
    }
    let m = found.ok_or_else(|| {
        BaziError::ComputationError(format!("day {day} not covered by sui {sy}"))
    })?;
    // Months 11 and 12 belong to the lunar year of the anchoring solstice;
    // the rest to the following one.
    let year = if m.number >= 11 { sy } else { sy + 1 };
    Ok(LunarDate {
        year,
        month: m.number,
        leap: m.leap,
        day: (day - m.start + 1) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::{jdn_from_gregorian, local_civil_jd};

    fn lunar(y: i32, m: u32, d: u32) -> LunarDate {
        lunar_from_day(jdn_from_gregorian(y, m as i32, d as i32)).unwrap()
    }

    fn pillars(y: i32, mo: u32, d: u32, h: u32, min: u32, mode: ZiHourMode) -> FourPillars {
        let jd = local_civil_jd(y, mo as i32, d as i32, h, min);
        four_pillars(jd, h, mode).unwrap()
    }

    #[test]
    fn golden_chart_pillars() {
        let p = pillars(1990, 5, 15, 14, 30, ZiHourMode::Modern);
        assert_eq!("庚午", p.year.name());
        assert_eq!("辛巳", p.month.name());
        assert_eq!("庚辰", p.day.name());
        assert_eq!("癸未", p.hour.name());
    }

    #[test]
    fn year_turns_over_at_lichun_not_new_year() {
        // 1990-01-20 precedes 立春, so the year pillar is still 己巳.
        let p = pillars(1990, 1, 20, 12, 0, ZiHourMode::Modern);
        assert_eq!("己巳", p.year.name());
        // 1990-02-05 follows 立春 (Feb 4).
        let p = pillars(1990, 2, 5, 12, 0, ZiHourMode::Modern);
        assert_eq!("庚午", p.year.name());
    }

    #[test]
    fn month_sector_branches_progress() {
        // Mid-month dates across 1990 walk the branches 寅..丑 in order.
        let expected = ["寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥"];
        for (i, zh) in expected.iter().enumerate() {
            let p = pillars(1990, 2 + i as u32, 15, 12, 0, ZiHourMode::Modern);
            assert_eq!(*zh, p.month.branch().zh(), "month {}", 2 + i);
        }
    }

    #[test]
    fn day_pillar_advances_every_sixty_days() {
        let a = day_ganzhi(jdn_from_gregorian(1990, 5, 15));
        let b = day_ganzhi(jdn_from_gregorian(1990, 5, 15) + 60);
        assert_eq!(a, b);
        let c = day_ganzhi(jdn_from_gregorian(1990, 5, 16));
        assert_eq!(a.step(1), c);
    }

    #[test]
    fn zi_hour_modes_differ_only_after_2300() {
        let modern = pillars(1990, 5, 15, 23, 30, ZiHourMode::Modern);
        let traditional = pillars(1990, 5, 15, 23, 30, ZiHourMode::Traditional);
        assert_eq!("庚辰", modern.day.name());
        assert_eq!("辛巳", traditional.day.name());
        // The hour branch is 子 in both modes.
        assert_eq!(Branch::Zi, modern.hour.branch());
        assert_eq!(Branch::Zi, traditional.hour.branch());
        // Both agree at 22:59.
        let m = pillars(1990, 5, 15, 22, 59, ZiHourMode::Modern);
        let t = pillars(1990, 5, 15, 22, 59, ZiHourMode::Traditional);
        assert_eq!(m.day, t.day);
    }

    #[test]
    fn hour_branch_halves() {
        assert_eq!("子", pillars(1990, 5, 15, 0, 0, ZiHourMode::Modern).hour.branch().zh());
        assert_eq!("子", pillars(1990, 5, 15, 23, 0, ZiHourMode::Modern).hour.branch().zh());
        assert_eq!("午", pillars(1990, 5, 15, 12, 0, ZiHourMode::Modern).hour.branch().zh());
        assert_eq!("亥", pillars(1990, 5, 15, 21, 10, ZiHourMode::Modern).hour.branch().zh());
    }

    #[test]
    fn boundary_instant_opens_the_new_sector() {
        // Exactly on 立春: both the year and the month turn over there.
        let lichun = solar_term(1990, 2).unwrap();
        let sector = month_sector(lichun).unwrap();
        assert_eq!(0, sector.index);
        assert_eq!(lichun, sector.start);
        assert_eq!(1990, effective_year(lichun).unwrap());
        // One tick earlier still belongs to the old year and the 丑 sector.
        let before = lichun - 1.0 / 86400.0;
        assert_eq!(11, month_sector(before).unwrap().index);
        assert_eq!(1989, effective_year(before).unwrap());
    }

    #[test]
    fn golden_lunar_date() {
        let l = lunar(1990, 5, 15);
        assert_eq!(
            LunarDate { year: 1990, month: 4, leap: false, day: 21 },
            l
        );
        assert_eq!("1990年四月廿一", l.zh());
    }

    #[test]
    fn leap_sixth_month_2017() {
        // 2017-07-23 opened the leap sixth month.
        let l = lunar(2017, 7, 23);
        assert_eq!(
            LunarDate { year: 2017, month: 6, leap: true, day: 1 },
            l
        );
        assert_eq!("2017年闰六月初一", l.zh());
        // The day before still belongs to the regular sixth month.
        let l = lunar(2017, 7, 22);
        assert_eq!((6, false), (l.month, l.leap));
    }

    #[test]
    fn lunar_year_boundary_months() {
        // 2000-01-01 falls in month 11 of lunar 1999.
        let l = lunar(2000, 1, 1);
        assert_eq!((1999, 11, false), (l.year, l.month, l.leap));
        // Chinese New Year 2000-02-05 opens month 1 of lunar 2000.
        let l = lunar(2000, 2, 5);
        assert_eq!(
            LunarDate { year: 2000, month: 1, leap: false, day: 1 },
            l
        );
    }

    #[test]
    fn validation_rejects_bad_input() {
        assert!(matches!(
            validate_civil(1990, 2, 30, 0, 0),
            Err(BaziError::InvalidDate(_))
        ));
        assert!(matches!(
            validate_civil(1850, 6, 1, 0, 0),
            Err(BaziError::InvalidDate(_))
        ));
        assert!(matches!(
            validate_civil(1990, 5, 15, 24, 0),
            Err(BaziError::InvalidDate(_))
        ));
        assert!(validate_civil(2100, 12, 31, 23, 59).is_ok());
    }
}
