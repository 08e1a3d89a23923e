use chrono::{Datelike, NaiveDateTime, Timelike};

use super::math::normalize_degrees;

/// Degrees of sidereal angle per clock second, as the mount protocol
/// defines it. Fixed value; the rigorous rate would be 360/86164.0905.
pub const LST_DEGREES_PER_SECOND: f64 = 0.00423611;

pub fn seconds_to_lst_degrees(seconds: f64) -> f64 {
    seconds * LST_DEGREES_PER_SECOND
}

/// Civil-calendar rule of the Julian Date algorithm: January and February
/// count as months 13 and 14 of the previous year.
pub fn shift_civil(year: i32, month: u32) -> (i32, u32) {
    if month <= 2 {
        (year - 1, month + 12)
    } else {
        (year, month)
    }
}

/// Julian Date of a Gregorian UTC instant.
/// `year` and `month` must already be shifted by `shift_civil`.
pub fn julian_date(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> f64 {
    let a = year / 100;
    let b = a / 4;
    let c = 2 - a + b;
    let e = f64::floor(365.25 * (year as f64 + 4716.0));
    let f = f64::floor(30.6001 * (month as f64 + 1.0));
    c as f64 + day as f64 + e + f - 1524.5
        + hour as f64 / 24.0
        + minute as f64 / 1440.0
        + second as f64 / 86400.0
}

pub fn julian_centuries(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

/// Greenwich Mean Sidereal Time in degrees, [0, 360).
pub fn gmst_degrees(jd: f64) -> f64 {
    let d = jd - 2451545.0;
    let t = d / 36525.0;
    normalize_degrees(
        280.46061837
        + 360.98564736629 * d
        + 0.000387933 * t * t
        - t * t * t / 38710000.0
    )
}

pub fn local_sidereal_time(gmst: f64, longitude: f64) -> f64 {
    normalize_degrees(gmst + longitude)
}

/// Julian Date of a chrono UTC time.
pub fn julian_time(dt: &NaiveDateTime) -> f64 {
    let (year, month) = shift_civil(dt.year(), dt.month());
    julian_date(year, month, dt.day(), dt.hour(), dt.minute(), dt.second())
}

pub fn julian_centuries_of(dt: &NaiveDateTime) -> f64 {
    julian_centuries(julian_time(dt))
}

#[test]
fn test_julian_date() {
    // J2000.0
    let (y, m) = shift_civil(2000, 1);
    assert_eq!((y, m), (1999, 13));
    assert_eq!(julian_date(y, m, 1, 12, 0, 0), 2451545.0);

    let (y, m) = shift_civil(2001, 1);
    assert_eq!(julian_date(y, m, 1, 12, 0, 0), 2_451_911.0);

    // month after February is not shifted
    let (y, m) = shift_civil(2024, 6);
    assert_eq!((y, m), (2024, 6));
    assert_eq!(julian_date(y, m, 1, 0, 0, 0), 2460462.5);
}

#[test]
fn test_julian_time() {
    use chrono::NaiveDate;

    let dt = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    assert_eq!(julian_time(&dt), 2451545.0);
    assert_eq!(julian_centuries_of(&dt), 0.0);

    let dt = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    assert!(f64::abs(julian_centuries_of(&dt) - 1.0) < 1e-4);
}

#[test]
fn test_gmst_degrees() {
    // reference value at J2000.0
    assert!(f64::abs(gmst_degrees(2451545.0) - 280.46061837) < 1e-9);

    // one sidereal advance later the angle grows by ~0.9856° over a solar day
    let next_day = gmst_degrees(2451546.0);
    let diff = normalize_degrees(next_day - gmst_degrees(2451545.0));
    assert!(f64::abs(diff - 0.98564736629) < 1e-6);
}

#[test]
fn test_local_sidereal_time() {
    let gmst = gmst_degrees(2451545.0);
    assert_eq!(local_sidereal_time(gmst, 0.0), gmst);
    assert!(f64::abs(local_sidereal_time(gmst, 150.944799) - (gmst + 150.944799)) < 1e-9);
    assert!((0.0..360.0).contains(&local_sidereal_time(gmst, -170.0)));
}
