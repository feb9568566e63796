//! Integration test: full engine pass over the public API.
//!
//! Verifies that:
//! 1. The golden chart (1990-05-15 14:30, male) derives the documented
//!    pillars, readings, lunisolar date, and fortune sequence.
//! 2. Structural invariants hold across a spread of inputs: parity-locked
//!    pillars, eight element slots, contiguous decennial spans.
//! 3. The error taxonomy distinguishes bad input from engine gaps.

use bazi_core::{
    annual_cycles, compute_chart, compute_fortune, BaziError, BirthInput, CycleDirection, Gender,
    Stem, TenGod, ZiHourMode,
};

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

#[test]
fn golden_chart_end_to_end() {
    let chart = compute_chart(&input(1990, 5, 15, 14, Gender::Male)).unwrap();
    let names: Vec<String> = chart.pillars.iter().map(|p| p.ganzhi.name()).collect();
    assert_eq!(vec!["庚午", "辛巳", "庚辰", "癸未"], names);
    assert_eq!(Stem::Geng, chart.day_master());
    assert_eq!("马", chart.zodiac());
    assert_eq!("1990年四月廿一", chart.lunar.zh());
    assert_eq!(Some(TenGod::HurtingOfficer), chart.hour().stem_god);

    let fortune = compute_fortune(&chart).unwrap();
    assert_eq!(CycleDirection::Forward, fortune.direction);
    assert_eq!(7, fortune.onset.years);
    assert_eq!("壬午", fortune.decennial[1].ganzhi.unwrap().name());
    let years = annual_cycles(&fortune.decennial[1]);
    assert_eq!("丁丑", years[0].ganzhi.name(), "1997 is a 丁丑 year");
}

#[test]
fn pillars_stay_parity_locked_across_inputs() {
    for year in [1900, 1936, 1975, 2000, 2044, 2100] {
        for (month, day, hour) in [(1, 9, 0), (4, 5, 11), (8, 23, 17), (12, 31, 23)] {
            let chart = compute_chart(&input(year, month, day, hour, Gender::Female))
                .unwrap_or_else(|e| panic!("{year}-{month}-{day}: {e}"));
            for p in &chart.pillars {
                assert_eq!(
                    p.ganzhi.stem().index() % 2,
                    p.ganzhi.branch().index() % 2,
                    "parity broken at {year}-{month}-{day}"
                );
            }
            let counts = chart.element_counts();
            assert_eq!(8u8, counts.iter().sum(), "slot count at {year}-{month}-{day}");
        }
    }
}

#[test]
fn day_pillar_period_is_sixty_days() {
    let base = compute_chart(&input(2000, 3, 1, 10, Gender::Male)).unwrap();
    let later = compute_chart(&input(2000, 4, 30, 10, Gender::Male)).unwrap();
    assert_eq!(base.day().ganzhi, later.day().ganzhi);
}

#[test]
fn decennial_spans_are_contiguous_everywhere() {
    for (year, gender) in [
        (1955, Gender::Male),
        (1955, Gender::Female),
        (1984, Gender::Male),
        (2021, Gender::Female),
    ] {
        let fortune =
            compute_fortune(&compute_chart(&input(year, 7, 7, 7, gender)).unwrap()).unwrap();
        assert_eq!(8, fortune.decennial.len());
        assert!(fortune.decennial[0].pre_onset);
        for w in fortune.decennial[1..].windows(2) {
            assert_eq!(w[0].end_age + 1, w[1].start_age);
        }
        // Consecutive pillars differ by one cycle step in a fixed direction.
        let step = match fortune.direction {
            CycleDirection::Forward => 1,
            CycleDirection::Reverse => -1,
        };
        for w in fortune.decennial[1..].windows(2) {
            assert_eq!(w[0].ganzhi.unwrap().step(step), w[1].ganzhi.unwrap());
        }
    }
}

#[test]
fn error_taxonomy() {
    let nonexistent = compute_chart(&input(1991, 2, 29, 8, Gender::Male));
    assert!(matches!(nonexistent, Err(BaziError::InvalidDate(_))));

    let out_of_range = compute_chart(&input(2101, 1, 1, 8, Gender::Male));
    assert!(matches!(out_of_range, Err(BaziError::InvalidDate(_))));

    // Boundary years remain fully computable, fortune included.
    let early = compute_chart(&input(1900, 1, 1, 0, Gender::Female)).unwrap();
    compute_fortune(&early).unwrap();
    let late = compute_chart(&input(2100, 12, 31, 23, Gender::Male)).unwrap();
    compute_fortune(&late).unwrap();
}
