//! Solar-term and new-moon instants from closed-form astronomical series.
//!
//! Instants are computed in TT (as JDE), shifted by ΔT to UT, and expressed
//! as "local civil julian dates" in UTC+8, the reference meridian of this
//! calendar tradition. Accuracy is on the order of a minute, which is what
//! the onset arithmetic and day-boundary decisions need.
//!
//! Coverage is bounded by the ΔT fit; lookups outside it fail with
//! `MissingCoverage` instead of extrapolating.

use crate::error::{BaziError, Result};

/// Internal coverage: one year of slack on each side of the public
/// 1900..=2100 input range, for lookups that cross a year boundary.
pub(crate) const COVERAGE_MIN_YEAR: i32 = 1899;
pub(crate) const COVERAGE_MAX_YEAR: i32 = 2101;

/// Hours east of UTC for all civil times in this crate.
const TZ_HOURS: f64 = 8.0;

const DEG: f64 = std::f64::consts::PI / 180.0;

// ---------------------------------------------------------------------------
// Day arithmetic
// ---------------------------------------------------------------------------

/// Julian day number for a proleptic Gregorian date (Fliegel–Van Flandern;
/// integer division truncates toward zero, as the formula expects).
pub(crate) fn jdn_from_gregorian(year: i32, month: i32, day: i32) -> i64 {
    let (y, m, d) = (year as i64, month as i64, day as i64);
    (1461 * (y + 4800 + (m - 14) / 12)) / 4 + (367 * (m - 2 - 12 * ((m - 14) / 12))) / 12
        - (3 * ((y + 4900 + (m - 14) / 12) / 100)) / 4
        + d
        - 32075
}

/// Inverse of [`jdn_from_gregorian`], `(year, month, day)`.
pub(crate) fn gregorian_from_jdn(jdn: i64) -> (i32, i32, i32) {
    let f = jdn + 1401 + (((4 * jdn + 274277) / 146097) * 3) / 4 - 38;
    let e = 4 * f + 3;
    let g = (e % 1461) / 4;
    let h = 5 * g + 2;
    let day = (h % 153) / 5 + 1;
    let month = (h / 153 + 2) % 12 + 1;
    let year = e / 1461 - 4716 + (12 + 2 - month) / 12;
    (year as i32, month as i32, day as i32)
}

/// Local civil julian date for a UTC+8 wall-clock time.
pub(crate) fn local_civil_jd(year: i32, month: i32, day: i32, hour: u32, minute: u32) -> f64 {
    jdn_from_gregorian(year, month, day) as f64 - 0.5
        + (hour as f64 + minute as f64 / 60.0) / 24.0
}

/// The civil day (as a JDN) a local julian date falls on.
pub(crate) fn local_day(local_jd: f64) -> i64 {
    (local_jd + 0.5).floor() as i64
}

// ---------------------------------------------------------------------------
// Time scales
// ---------------------------------------------------------------------------

/// ΔT = TT − UT in seconds, piecewise polynomial fit (Espenak & Meeus).
/// Valid over the coverage window with slack on both sides.
fn delta_t_seconds(year: f64) -> f64 {
    if year < 1900.0 {
        let t = year - 1860.0;
        7.62 + 0.5737 * t - 0.251754 * t * t + 0.01680668 * t.powi(3) - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233174.0
    } else if year < 1920.0 {
        let t = year - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t * t + 0.0061966 * t.powi(3) - 0.000197 * t.powi(4)
    } else if year < 1941.0 {
        let t = year - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t * t + 0.0020936 * t.powi(3)
    } else if year < 1961.0 {
        let t = year - 1950.0;
        29.07 + 0.407 * t - t * t / 233.0 + t.powi(3) / 2547.0
    } else if year < 1986.0 {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t * t / 260.0 - t.powi(3) / 718.0
    } else if year < 2005.0 {
        let t = year - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t * t + 0.0017275 * t.powi(3) + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if year < 2050.0 {
        let t = year - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t * t
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - year)
    }
}

/// TT instant → local civil julian date (UTC+8).
fn jde_to_local(jde: f64) -> f64 {
    let year = 2000.0 + (jde - 2451545.0) / 365.2422;
    jde - delta_t_seconds(year) / 86400.0 + TZ_HOURS / 24.0
}

// ---------------------------------------------------------------------------
// Solar terms
// ---------------------------------------------------------------------------

/// Apparent solar longitude in degrees, low-precision series (good to
/// ~0.01°, i.e. a few minutes of time at the Sun's ~1°/day pace).
fn solar_apparent_longitude(jde: f64) -> f64 {
    let t = (jde - 2451545.0) / 36525.0;
    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = (357.52911 + 35999.05029 * t - 0.0001537 * t * t) * DEG;
    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();
    let omega = (125.04 - 1934.136 * t) * DEG;
    (l0 + c - 0.00569 - 0.00478 * omega.sin()).rem_euclid(360.0)
}

fn coverage_check(year: i32) -> Result<()> {
    if (COVERAGE_MIN_YEAR..=COVERAGE_MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(BaziError::MissingCoverage { year })
    }
}

/// Local civil julian date of solar term `term` (0 = 小寒 through
/// 23 = 冬至, in order of occurrence) within calendar year `year`.
///
/// Even-numbered terms are the 12 jie that open month sectors; odd ones are
/// the major terms (zhongqi) used by the leap-month rule.
pub(crate) fn solar_term(year: i32, term: usize) -> Result<f64> {
    debug_assert!(term < 24);
    coverage_check(year)?;
    let target = (285.0 + 15.0 * term as f64).rem_euclid(360.0);
    // Terms pace out from early January at the mean tropical rate.
    let mut jde = jdn_from_gregorian(year, 1, 1) as f64 - 0.5 + 4.0 + 15.2184 * term as f64;
    for _ in 0..12 {
        let mut diff = target - solar_apparent_longitude(jde);
        diff -= 360.0 * (diff / 360.0).round();
        if diff.abs() < 1e-9 {
            break;
        }
        jde += diff * 365.2422 / 360.0;
    }
    Ok(jde_to_local(jde))
}

// ---------------------------------------------------------------------------
// New moons
// ---------------------------------------------------------------------------

/// Approximate lunation index (k in the mean-lunation series) whose new moon
/// falls nearest the given local instant.
pub(crate) fn lunation_index_near(local_jd: f64) -> i64 {
    ((local_jd - TZ_HOURS / 24.0 - 2451550.09766) / 29.530588861).round() as i64
}

/// Local civil julian date of the new moon with lunation index `k`
/// (standard lunation series with solar, lunar and planetary corrections).
pub(crate) fn new_moon_local(k: i64) -> Result<f64> {
    let kf = k as f64;
    let t = kf / 1236.85;
    let (t2, t3, t4) = (t * t, t * t * t, t * t * t * t);

    let mean = 2451550.09766 + 29.530588861 * kf + 0.00015437 * t2 - 0.000000150 * t3
        + 0.00000000073 * t4;
    let year = 2000.0 + (mean - 2451545.0) / 365.2422;
    coverage_check(year.floor() as i32)?;

    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let m = (2.5534 + 29.10535670 * kf - 0.0000014 * t2 - 0.00000011 * t3) * DEG;
    let mp = (201.5643 + 385.81693528 * kf + 0.0107582 * t2 + 0.00001238 * t3
        - 0.000000058 * t4)
        * DEG;
    let f = (160.7108 + 390.67050284 * kf - 0.0016118 * t2 - 0.00000227 * t3
        + 0.000000011 * t4)
        * DEG;
    let omega = (124.7746 - 1.56375588 * kf + 0.0020672 * t2 + 0.00000215 * t3) * DEG;

    let mut corr = -0.40720 * mp.sin()
        + 0.17241 * e * m.sin()
        + 0.01608 * (2.0 * mp).sin()
        + 0.01039 * (2.0 * f).sin()
        + 0.00739 * e * (mp - m).sin()
        - 0.00514 * e * (mp + m).sin()
        + 0.00208 * e * e * (2.0 * m).sin()
        - 0.00111 * (mp - 2.0 * f).sin()
        - 0.00057 * (mp + 2.0 * f).sin()
        + 0.00056 * e * (2.0 * mp + m).sin()
        - 0.00042 * (3.0 * mp).sin()
        + 0.00042 * e * (m + 2.0 * f).sin()
        + 0.00038 * e * (m - 2.0 * f).sin()
        - 0.00024 * e * (2.0 * mp - m).sin()
        - 0.00017 * omega.sin()
        - 0.00007 * (mp + 2.0 * m).sin()
        + 0.00004 * (2.0 * mp - 2.0 * f).sin()
        + 0.00004 * (3.0 * m).sin()
        + 0.00003 * (mp + m - 2.0 * f).sin()
        + 0.00003 * (2.0 * mp + 2.0 * f).sin()
        - 0.00003 * (mp + m + 2.0 * f).sin()
        + 0.00003 * (mp - m + 2.0 * f).sin()
        - 0.00002 * (mp - m - 2.0 * f).sin()
        - 0.00002 * (3.0 * mp + m).sin()
        + 0.00002 * (4.0 * mp).sin();

    // Planetary perturbations. The first argument carries a slow secular
    // drift of its own.
    let a1 = 299.77 + 0.107408 * kf - 0.009173 * t2;
    corr += 0.000325 * (a1 * DEG).sin();
    let planetary: [(f64, f64, f64); 13] = [
        (0.000165, 251.88, 0.016321),
        (0.000164, 251.83, 26.651886),
        (0.000126, 349.42, 36.412478),
        (0.000110, 84.66, 18.206239),
        (0.000062, 141.74, 53.303771),
        (0.000060, 207.14, 2.453732),
        (0.000056, 154.84, 7.306860),
        (0.000047, 34.52, 27.261239),
        (0.000042, 207.19, 0.121824),
        (0.000040, 291.34, 1.844379),
        (0.000037, 161.72, 24.198154),
        (0.000035, 239.56, 25.513099),
        (0.000023, 331.55, 3.592518),
    ];
    for (amp, base, rate) in planetary {
        corr += amp * ((base + rate * kf) * DEG).sin();
    }

    Ok(jde_to_local(mean + corr))
}
