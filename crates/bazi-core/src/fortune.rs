//! Fortune cycles: onset offset (起运), decennial cycles (大运), and
//! annual cycles (流年).
//!
//! Direction is fixed once per chart from gender and the year stem's
//! polarity. The onset offset scales the distance to the governing jie at
//! the traditional ratio of 3 days to 1 year (4320 minutes per year, 360
//! per month, 12 per day).

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::calendar::{month_sector, year_ganzhi};
use crate::chart::{BirthChart, Gender};
use crate::cycle::{GanZhi, Polarity};
use crate::error::{BaziError, Result};

const MINUTES_PER_YEAR: i64 = 4320;
const MINUTES_PER_MONTH: i64 = 360;
const MINUTES_PER_DAY: i64 = 12;

/// Which way the decennial sequence steps through the 60-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDirection {
    Forward,
    Reverse,
}

impl CycleDirection {
    /// Forward for Yang-year males and Yin-year females; reverse otherwise.
    pub fn derive(year_stem_polarity: Polarity, gender: Gender) -> Self {
        match (year_stem_polarity, gender) {
            (Polarity::Yang, Gender::Male) | (Polarity::Yin, Gender::Female) => Self::Forward,
            _ => Self::Reverse,
        }
    }

    pub fn zh(self) -> &'static str {
        match self {
            Self::Forward => "顺行",
            Self::Reverse => "逆行",
        }
    }

    fn step(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

/// The offset from birth to the start of the first decennial cycle.
/// Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Onset {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl Onset {
    pub fn describe(&self) -> String {
        format!(
            "出生后{}年{}个月{}天起运",
            self.years, self.months, self.days
        )
    }
}

/// One decennial entry. The entry before onset completion carries no
/// pillar; reporting layers label it 起运前.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecennialCycle {
    pub index: usize,
    pub ganzhi: Option<GanZhi>,
    pub pre_onset: bool,
    /// Calendar year the span begins.
    pub start_year: i32,
    pub start_age: u32,
    pub end_age: u32,
}

/// One calendar year within a decennial span, carrying that year's
/// sexagenary pillar.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnnualCycle {
    pub index: usize,
    pub year: i32,
    pub age: u32,
    pub ganzhi: GanZhi,
}

#[derive(Debug, Clone, Serialize)]
pub struct FortuneCycles {
    pub direction: CycleDirection,
    pub onset: Onset,
    /// Calendar year in which the first decennial cycle begins.
    pub onset_year: i32,
    /// Eight entries: the flagged pre-onset span, then seven completed
    /// decades.
    pub decennial: Vec<DecennialCycle>,
}

/// Derives direction, onset, and the decennial sequence for a chart.
pub fn compute_fortune(chart: &BirthChart) -> Result<FortuneCycles> {
    let input = &chart.input;
    let direction = CycleDirection::derive(chart.year().ganzhi.stem().polarity(), input.gender);

    // Forward counts to the next jie, reverse back to the one that opened
    // the sector. A birth exactly on a jie sits at its sector's start.
    let sector = month_sector(chart.birth_jd)?;
    let span_days = match direction {
        CycleDirection::Forward => sector.end - chart.birth_jd,
        CycleDirection::Reverse => chart.birth_jd - sector.start,
    };
    if span_days < 0.0 {
        return Err(BaziError::ComputationError(format!(
            "negative jie distance {span_days} for onset"
        )));
    }
    let minutes = (span_days * 1440.0).round() as i64;
    let onset = Onset {
        years: (minutes / MINUTES_PER_YEAR) as u32,
        months: (minutes % MINUTES_PER_YEAR / MINUTES_PER_MONTH) as u32,
        days: (minutes % MINUTES_PER_MONTH / MINUTES_PER_DAY) as u32,
    };

    // Shift the birth date by the onset offset to place the first cycle on
    // the calendar. The input was validated when the chart was built.
    let onset_date = NaiveDate::from_ymd_opt(input.year, input.month, input.day)
        .and_then(|d| d.checked_add_months(Months::new(onset.years * 12 + onset.months)))
        .and_then(|d| d.checked_add_days(Days::new(onset.days as u64)))
        .ok_or_else(|| BaziError::ComputationError("onset date out of range".into()))?;
    let onset_year = onset_date.year();

    let mut decennial = Vec::with_capacity(8);
    decennial.push(DecennialCycle {
        index: 0,
        ganzhi: None,
        pre_onset: true,
        start_year: input.year,
        start_age: 0,
        end_age: onset.years.saturating_sub(1),
    });
    for i in 0..7usize {
        let ganzhi = chart.month().ganzhi.step(direction.step() * (i as i32 + 1));
        let start_age = onset.years + 10 * i as u32;
        decennial.push(DecennialCycle {
            index: i + 1,
            ganzhi: Some(ganzhi),
            pre_onset: false,
            start_year: onset_year + 10 * i as i32,
            start_age,
            end_age: start_age + 9,
        });
    }

    tracing::debug!(
        direction = direction.zh(),
        onset = %onset.describe(),
        onset_year,
        "fortune cycles derived"
    );

    Ok(FortuneCycles {
        direction,
        onset,
        onset_year,
        decennial,
    })
}

/// The calendar years inside one decennial span, each with its own
/// sexagenary year pillar.
pub fn annual_cycles(cycle: &DecennialCycle) -> Vec<AnnualCycle> {
    let span = (cycle.end_age - cycle.start_age) as usize + 1;
    (0..span)
        .map(|j| AnnualCycle {
            index: j,
            year: cycle.start_year + j as i32,
            age: cycle.start_age + j as u32,
            ganzhi: year_ganzhi(cycle.start_year + j as i32),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ZiHourMode;
    use crate::chart::{compute_chart, BirthInput};

    fn input(year: i32, month: u32, day: u32, hour: u32, gender: Gender) -> BirthInput {
        BirthInput {
            year,
            month,
            day,
            hour,
            minute: 30,
            gender,
            zi_hour_mode: ZiHourMode::Modern,
        }
    }

    fn fortune_for(i: BirthInput) -> FortuneCycles {
        compute_fortune(&compute_chart(&i).unwrap()).unwrap()
    }

    #[test]
    fn golden_fortune() {
        let f = fortune_for(input(1990, 5, 15, 14, Gender::Male));
        // 庚 is Yang, male: forward, counting to 芒种 on June 6.
        assert_eq!(CycleDirection::Forward, f.direction);
        assert_eq!(7, f.onset.years);
        assert_eq!(1997, f.onset_year);
    }

    #[test]
    fn direction_flips_with_gender_and_year_polarity() {
        let m = fortune_for(input(1990, 5, 15, 14, Gender::Male));
        let f = fortune_for(input(1990, 5, 15, 14, Gender::Female));
        assert_eq!(CycleDirection::Forward, m.direction);
        assert_eq!(CycleDirection::Reverse, f.direction);
        // 1991 is 辛未, a Yin year: the flip reverses.
        let m = fortune_for(input(1991, 5, 15, 14, Gender::Male));
        let f = fortune_for(input(1991, 5, 15, 14, Gender::Female));
        assert_eq!(CycleDirection::Reverse, m.direction);
        assert_eq!(CycleDirection::Forward, f.direction);
    }

    #[test]
    fn decennial_sequence_steps_from_month_pillar() {
        let f = fortune_for(input(1990, 5, 15, 14, Gender::Male));
        assert_eq!(8, f.decennial.len());
        let head = &f.decennial[0];
        assert!(head.pre_onset);
        assert_eq!(None, head.ganzhi);
        assert_eq!(1990, head.start_year);
        // Month pillar 辛巳 steps forward: 壬午, 癸未, ...
        assert_eq!("壬午", f.decennial[1].ganzhi.unwrap().name());
        assert_eq!("癸未", f.decennial[2].ganzhi.unwrap().name());
        for w in f.decennial[1..].windows(2) {
            assert_eq!(w[0].end_age + 1, w[1].start_age);
            assert_eq!(w[0].start_year + 10, w[1].start_year);
        }
        assert_eq!(7, f.decennial[1].start_age);
        assert_eq!(16, f.decennial[1].end_age);
    }

    #[test]
    fn reverse_sequence_steps_backward() {
        let f = fortune_for(input(1990, 5, 15, 14, Gender::Female));
        // 辛巳 stepping back: 庚辰, 己卯.
        assert_eq!("庚辰", f.decennial[1].ganzhi.unwrap().name());
        assert_eq!("己卯", f.decennial[2].ganzhi.unwrap().name());
    }

    #[test]
    fn annual_cycles_are_calendar_year_pillars() {
        let f = fortune_for(input(1990, 5, 15, 14, Gender::Male));
        let years = annual_cycles(&f.decennial[1]);
        assert_eq!(10, years.len());
        assert_eq!(1997, years[0].year);
        assert_eq!("丁丑", years[0].ganzhi.name());
        assert_eq!(7, years[0].age);
        assert_eq!("戊寅", years[1].ganzhi.name());
        assert_eq!(2006, years[9].year);
    }

    #[test]
    fn onset_span_depends_on_direction() {
        // Born the evening of 芒种 day 1990: the sector has just opened.
        let forward = fortune_for(input(1990, 6, 6, 20, Gender::Male));
        assert!(forward.onset.years >= 9); // nearly a whole sector to the next jie
        let reverse = fortune_for(input(1990, 6, 6, 20, Gender::Female));
        assert_eq!(0, reverse.onset.years); // hours back to the sector's start
    }
}
