//! Chart assembly: pillars annotated with ten-gods readings, element
//! tallies, and the lunisolar rendering of the birth instant.

use serde::{Deserialize, Serialize};

use crate::astro::{local_civil_jd, local_day};
use crate::calendar::{four_pillars, lunar_from_day, validate_civil, LunarDate, ZiHourMode};
use crate::cycle::{Branch, Element, GanZhi, Stem, TenGod};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn zh(self) -> &'static str {
        match self {
            Gender::Male => "男",
            Gender::Female => "女",
        }
    }
}

/// A birth instant in local civil time (UTC+8) plus the options that
/// affect derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthInput {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    pub gender: Gender,
    #[serde(default)]
    pub zi_hour_mode: ZiHourMode,
}

/// One pillar with its relational readings against the day master.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PillarReading {
    pub ganzhi: GanZhi,
    /// `None` on the day pillar, whose stem is the day master itself.
    pub stem_god: Option<TenGod>,
    /// Branch reading, through the branch's principal hidden stem.
    pub branch_god: TenGod,
}

impl PillarReading {
    fn new(ganzhi: GanZhi, day_master: Stem, is_day_pillar: bool) -> Self {
        Self {
            ganzhi,
            stem_god: (!is_day_pillar).then(|| TenGod::of_stem(day_master, ganzhi.stem())),
            branch_god: TenGod::of_branch(day_master, ganzhi.branch()),
        }
    }

    pub fn na_yin(&self) -> &'static str {
        self.ganzhi.na_yin()
    }
}

/// A fully derived natal chart. Pillars are ordered year, month, day, hour.
#[derive(Debug, Clone, Serialize)]
pub struct BirthChart {
    pub input: BirthInput,
    pub pillars: [PillarReading; 4],
    pub lunar: LunarDate,
    /// Birth instant as a local civil julian date; fortune derivation
    /// measures jie distances from here.
    #[serde(skip)]
    pub(crate) birth_jd: f64,
}

impl BirthChart {
    pub fn year(&self) -> &PillarReading {
        &self.pillars[0]
    }

    pub fn month(&self) -> &PillarReading {
        &self.pillars[1]
    }

    pub fn day(&self) -> &PillarReading {
        &self.pillars[2]
    }

    pub fn hour(&self) -> &PillarReading {
        &self.pillars[3]
    }

    /// The day pillar's stem, the reference point of every ten-gods reading.
    pub fn day_master(&self) -> Stem {
        self.day().ganzhi.stem()
    }

    /// Zodiac animal of the lunisolar year (the animal turns over at the
    /// lunar new year, not at 立春).
    pub fn zodiac(&self) -> &'static str {
        let branch = (self.lunar.year as i64 - 4).rem_euclid(12) as u8;
        Branch::from_index(branch).unwrap().zodiac()
    }

    /// The eight slot elements in pillar order, stem before branch.
    pub fn elements(&self) -> [Element; 8] {
        let mut out = [Element::Wood; 8];
        for (i, p) in self.pillars.iter().enumerate() {
            out[2 * i] = p.ganzhi.stem().element();
            out[2 * i + 1] = p.ganzhi.branch().element();
        }
        out
    }

    /// Tally of the eight slots per element, in productive-cycle order
    /// (Wood, Fire, Earth, Metal, Water).
    pub fn element_counts(&self) -> [u8; 5] {
        let mut counts = [0u8; 5];
        for e in self.elements() {
            counts[e.index() as usize] += 1;
        }
        counts
    }
}

/// Derives the natal chart for a birth instant.
///
/// Fails with `InvalidDate` for nonexistent dates or years outside
/// [`crate::calendar::MIN_YEAR`]..=[`crate::calendar::MAX_YEAR`].
pub fn compute_chart(input: &BirthInput) -> Result<BirthChart> {
    validate_civil(input.year, input.month, input.day, input.hour, input.minute)?;
    let birth_jd = local_civil_jd(
        input.year,
        input.month as i32,
        input.day as i32,
        input.hour,
        input.minute,
    );

    let p = four_pillars(birth_jd, input.hour, input.zi_hour_mode)?;
    let day_master = p.day.stem();
    let pillars = [
        PillarReading::new(p.year, day_master, false),
        PillarReading::new(p.month, day_master, false),
        PillarReading::new(p.day, day_master, true),
        PillarReading::new(p.hour, day_master, false),
    ];
    let lunar = lunar_from_day(local_day(birth_jd))?;

    tracing::debug!(
        year = %p.year.name(),
        month = %p.month.name(),
        day = %p.day.name(),
        hour = %p.hour.name(),
        "chart derived"
    );

    Ok(BirthChart {
        input: *input,
        pillars,
        lunar,
        birth_jd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_input() -> BirthInput {
        BirthInput {
            year: 1990,
            month: 5,
            day: 15,
            hour: 14,
            minute: 30,
            gender: Gender::Male,
            zi_hour_mode: ZiHourMode::Modern,
        }
    }

    #[test]
    fn golden_chart_readings() {
        use TenGod::*;
        let chart = compute_chart(&golden_input()).unwrap();
        assert_eq!(Stem::Geng, chart.day_master());
        assert_eq!("马", chart.zodiac());

        assert_eq!(Some(Friend), chart.year().stem_god);
        assert_eq!(DirectOfficer, chart.year().branch_god);
        assert_eq!(Some(RobWealth), chart.month().stem_god);
        assert_eq!(SevenKillings, chart.month().branch_god);
        assert_eq!(None, chart.day().stem_god);
        assert_eq!(IndirectResource, chart.day().branch_god);
        assert_eq!(Some(HurtingOfficer), chart.hour().stem_god);
        assert_eq!(DirectResource, chart.hour().branch_god);

        assert_eq!("路旁土", chart.year().na_yin());
        assert_eq!("白蜡金", chart.month().na_yin());
    }

    #[test]
    fn golden_element_counts() {
        let chart = compute_chart(&golden_input()).unwrap();
        // 庚午 辛巳 庚辰 癸未: three Metal, two Fire, two Earth, one Water.
        assert_eq!([0, 2, 2, 3, 1], chart.element_counts());
        assert_eq!(8u8, chart.element_counts().iter().sum::<u8>());
    }

    #[test]
    fn invalid_dates_are_rejected_up_front() {
        let mut input = golden_input();
        input.month = 2;
        input.day = 30;
        assert!(compute_chart(&input).is_err());
        let mut input = golden_input();
        input.year = 1850;
        assert!(compute_chart(&input).is_err());
    }

    #[test]
    fn chart_serializes() {
        let chart = compute_chart(&golden_input()).unwrap();
        let v = serde_json::to_value(&chart).unwrap();
        assert!(v.get("pillars").is_some());
        assert_eq!("male", v["input"]["gender"]);
    }
}
