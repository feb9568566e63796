//! bazi-core: Four Pillars engine (lunisolar calendar, sexagenary pillars,
//! ten-gods readings, fortune cycles).
//!
//! A pure function of (date, time, gender): no I/O, no shared state. The
//! gateway add-on owns serialization labels and transport concerns.

mod astro;
mod calendar;
mod chart;
mod cycle;
mod error;
mod fortune;

// Sexagenary cycle primitives
pub use cycle::{
    five_rats_stem, five_tigers_stem, Branch, Element, GanZhi, Polarity, Stem, TenGod,
};

// Calendar layer
pub use calendar::{LunarDate, ZiHourMode, MAX_YEAR, MIN_YEAR};

// Chart assembly
pub use chart::{compute_chart, BirthChart, BirthInput, Gender, PillarReading};

// Fortune cycles
pub use fortune::{
    annual_cycles, compute_fortune, AnnualCycle, CycleDirection, DecennialCycle, FortuneCycles,
    Onset,
};

pub use error::{BaziError, Result};
