use std::{f64::consts::PI, fmt::Debug};

use crate::sexagesimal::value_to_sexagesimal;

pub fn radian_to_degree(radian: f64) -> f64 {
    180.0 * radian / PI
}

pub fn degree_to_radian(degree: f64) -> f64 {
    PI * degree / 180.0
}

pub fn degree_to_hour(degree: f64) -> f64 {
    degree / 15.0
}

pub fn hour_to_degree(hour: f64) -> f64 {
    15.0 * hour
}

/// Reduces an angle in degrees into [0, 360).
pub fn normalize_degrees(x: f64) -> f64 {
    let mut result = x % 360.0;
    if result < 0.0 {
        result += 360.0;
    }
    // a tiny negative remainder rounds up to exactly 360.0 above
    if result >= 360.0 {
        result -= 360.0;
    }
    result
}

#[test]
fn test_normalize_degrees() {
    assert_eq!(normalize_degrees(0.0), 0.0);
    assert_eq!(normalize_degrees(360.0), 0.0);
    assert_eq!(normalize_degrees(725.5), 5.5);
    assert_eq!(normalize_degrees(-1.0), 359.0);
    assert_eq!(normalize_degrees(-720.0), 0.0);

    let values = [0.0, 123.456, -0.25, 359.999999, -1e-18, 987_654.321, -987_654.321];
    for v in values {
        let n = normalize_degrees(v);
        assert!((0.0..360.0).contains(&n));
        assert_eq!(normalize_degrees(n), n);
    }
}

fn asin_clamped(x: f64) -> f64 {
    f64::asin(x.clamp(-1.0, 1.0))
}

#[derive(Clone, Copy, Default, PartialEq)]
pub struct EqCoord {
    pub ra:  f64, // in degrees
    pub dec: f64, // in degrees
}

impl EqCoord {
    /// Great-circle separation of two coordinates, in degrees.
    pub fn angle_between(crd1: &EqCoord, crd2: &EqCoord) -> f64 {
        let sin_diff_dec = f64::sin(degree_to_radian(crd2.dec - crd1.dec) / 2.0);
        let sin_diff_ra = f64::sin(degree_to_radian(crd2.ra - crd1.ra) / 2.0);
        let root_expr =
            sin_diff_dec * sin_diff_dec +
            f64::cos(degree_to_radian(crd1.dec)) *
            f64::cos(degree_to_radian(crd2.dec)) *
            sin_diff_ra * sin_diff_ra;
        radian_to_degree(2.0 * asin_clamped(f64::sqrt(root_expr)))
    }
}

impl Debug for EqCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqCoord")
            .field("ra", &value_to_sexagesimal(degree_to_hour(self.ra), true, 8))
            .field("dec", &value_to_sexagesimal(self.dec, true, 6))
            .finish()
    }
}

#[test]
fn test_angle_between() {
    let sep = |ra1, dec1, ra2, dec2| EqCoord::angle_between(
        &EqCoord { ra: ra1, dec: dec1 },
        &EqCoord { ra: ra2, dec: dec2 },
    );

    assert!(f64::abs(sep(10.0, 20.0, 10.0, 20.0)) < 1e-9);
    assert!(f64::abs(sep(0.0, 0.0, 90.0, 0.0) - 90.0) < 1e-9);
    assert!(f64::abs(sep(0.0, -45.0, 180.0, 45.0) - 180.0) < 1e-9);
    assert!(f64::abs(sep(0.0, 89.0, 180.0, 89.0) - 2.0) < 1e-9);
}

#[derive(Clone, Copy, Default, PartialEq)]
pub struct HorizCoord {
    pub alt: f64, // in degrees
    pub az:  f64, // in degrees
}

impl Debug for HorizCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizCoord")
            .field("alt", &value_to_sexagesimal(self.alt, true, 8))
            .field("az", &value_to_sexagesimal(self.az, true, 8))
            .finish()
    }
}

/// Horizontal coordinates of a target from its hour angle and declination.
/// Azimuth is North-referenced and increases eastward.
pub fn horizontal_from_equatorial(ha: f64, dec: f64, latitude: f64) -> HorizCoord {
    let h = degree_to_radian(ha);
    let d = degree_to_radian(dec);
    let l = degree_to_radian(latitude);
    let azimuth = PI + f64::atan2(
        f64::sin(h),
        f64::cos(h) * f64::sin(l) - f64::tan(d) * f64::cos(l)
    );
    let altitude = asin_clamped(
        f64::sin(l) * f64::sin(d) + f64::cos(h) * f64::cos(d) * f64::cos(l)
    );
    HorizCoord {
        alt: radian_to_degree(altitude),
        az:  normalize_degrees(radian_to_degree(azimuth)),
    }
}

/// Inverse of `horizontal_from_equatorial` for the same azimuth convention.
/// Resolves the hour angle in all quadrants.
pub fn equatorial_from_horizontal(alt: f64, az: f64, latitude: f64, lst: f64) -> EqCoord {
    let a = degree_to_radian(alt);
    let z = degree_to_radian(normalize_degrees(az));
    let l = degree_to_radian(latitude);
    let dec = asin_clamped(
        f64::sin(a) * f64::sin(l) + f64::cos(a) * f64::cos(l) * f64::cos(z)
    );
    let zs = z - PI;
    let ha = f64::atan2(
        f64::sin(zs),
        f64::cos(zs) * f64::sin(l) + f64::tan(a) * f64::cos(l)
    );
    EqCoord {
        ra:  normalize_degrees(lst - radian_to_degree(ha)),
        dec: radian_to_degree(dec),
    }
}

#[test]
fn test_horizontal_round_trip() {
    let lst = 100.0;
    for latitude in [-60.0, -30.0, 15.0, 45.0] {
        for dec in [-65.0, -20.0, 0.0, 40.0, 75.0] {
            for ha in [0.0, 30.0, 120.0, 210.0, 300.0] {
                let ra = normalize_degrees(lst - ha);
                let horiz = horizontal_from_equatorial(ha, dec, latitude);
                let eq = equatorial_from_horizontal(horiz.alt, horiz.az, latitude, lst);
                assert!(
                    f64::abs(eq.ra - ra) < 1e-6 && f64::abs(eq.dec - dec) < 1e-6,
                    "lat={} dec={} ha={}: got {:?}", latitude, dec, ha, eq
                );
            }
        }
    }
}

#[test]
fn test_horizontal_from_equatorial() {
    // target on the meridian, south of zenith for a northern site
    let horiz = horizontal_from_equatorial(0.0, 0.0, 45.0);
    assert!(f64::abs(horiz.alt - 45.0) < 1e-9);
    assert!(f64::abs(horiz.az - 180.0) < 1e-9);

    // pole star sits at the latitude's altitude, due north
    let horiz = horizontal_from_equatorial(77.0, 90.0, 45.0);
    assert!(f64::abs(horiz.alt - 45.0) < 1e-9);
    assert!(f64::abs(horiz.az) < 1e-9 || f64::abs(horiz.az - 360.0) < 1e-9);
}

/// Sexagesimal breakdown of a right ascension in hours of time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hms {
    pub hours:   i32,
    pub minutes: i32,
    pub seconds: f64,
}

impl Hms {
    pub fn from_degrees(ra: f64) -> Self {
        let hours = (ra / 360.0) * 24.0;
        let whole = f64::floor(hours);
        let minutes = (hours - whole) * 60.0;
        let minute = f64::floor(minutes);
        let seconds = (minutes - minute) * 60.0;
        Self {
            hours:   whole as i32,
            minutes: minute as i32,
            seconds,
        }
    }

    pub fn to_degrees(&self) -> f64 {
        self.hours as f64 * 15.0
            + self.minutes as f64 * 15.0 / 60.0
            + self.seconds * 15.0 / 3600.0
    }
}

#[test]
fn test_hms() {
    let hms = Hms::from_degrees(180.0);
    assert_eq!(hms.hours, 12);
    assert_eq!(hms.minutes, 0);
    assert!(f64::abs(hms.seconds) < 1e-9);

    let hms = Hms::from_degrees(186.6496);
    assert_eq!(hms.hours, 12);
    assert_eq!(hms.minutes, 26);
    assert!(f64::abs(hms.seconds - 35.904) < 1e-6);

    for ra in [0.0, 0.015, 42.4242, 186.6496, 359.999] {
        let hms = Hms::from_degrees(ra);
        assert!(f64::abs(hms.to_degrees() - ra) < 1e-6);
    }
}

/// Sexagesimal breakdown of a signed value in degrees. The sign stays on
/// the degrees field; minutes and seconds are magnitudes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dms {
    pub degrees: i32,
    pub minutes: i32,
    pub seconds: f64,
}

impl Dms {
    pub fn from_degrees(value: f64) -> Self {
        if value >= 0.0 {
            let whole = f64::floor(value);
            let minutes = (value - whole) * 60.0;
            let minute = f64::floor(minutes);
            let seconds = (minutes - minute) * 60.0;
            Self {
                degrees: whole as i32,
                minutes: minute as i32,
                seconds,
            }
        } else {
            let whole = f64::ceil(value);
            let minutes = (value - whole) * 60.0;
            let minute = f64::ceil(minutes);
            let seconds = (minutes - minute) * 60.0;
            Self {
                degrees: whole as i32,
                minutes: f64::abs(minute) as i32,
                seconds: f64::abs(seconds),
            }
        }
    }

    pub fn to_degrees(&self) -> f64 {
        let magnitude = f64::abs(self.degrees as f64)
            + self.minutes as f64 / 60.0
            + self.seconds / 3600.0;
        if self.degrees < 0 { -magnitude } else { magnitude }
    }
}

#[test]
fn test_dms() {
    let dms = Dms::from_degrees(63.0991);
    assert_eq!(dms.degrees, 63);
    assert_eq!(dms.minutes, 5);
    assert!(f64::abs(dms.seconds - 56.76) < 1e-6);

    let dms = Dms::from_degrees(-63.0991);
    assert_eq!(dms.degrees, -63);
    assert_eq!(dms.minutes, 5);
    assert!(f64::abs(dms.seconds - 56.76) < 1e-6);
    assert!(f64::abs(dms.to_degrees() + 63.0991) < 1e-9);

    let dms = Dms::from_degrees(-10.755);
    assert_eq!(dms.degrees, -10);
    assert_eq!(dms.minutes, 45);
    assert!(f64::abs(dms.seconds - 18.0) < 1e-6);

    for v in [0.0, 0.5, 89.9999, -0.0042, -31.08, -89.9999] {
        let dms = Dms::from_degrees(v);
        assert!(f64::abs(f64::abs(dms.to_degrees()) - f64::abs(v)) < 1e-6);
        assert!(dms.minutes >= 0);
        assert!(dms.seconds >= 0.0);
    }
}
