use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Serialize, Deserialize};

use crate::{
    observer::Observer,
    position::Position,
    sexagesimal::sexagesimal_to_value,
    sky_math::{math::*, time::*},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Time snapshot has {0} fields but 8 required")]
    SnapshotFieldCount(usize),

    #[error("Bad `{0}` value `{1}` in time snapshot")]
    SnapshotValue(&'static str, String),

    #[error("`{0}` is not a sexagesimal value")]
    Sexagesimal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Precession correction applied to J2000 catalog coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PrecessionModel {
    /// First-order annual rates.
    #[default]
    Annual,
    /// Simplified per-century rates.
    Centennial,
}

const TIME_SNAPSHOT_FIELDS: usize = 8;

/// The UTC instant in effect and the sidereal values derived from it.
/// The year/month pair is stored in the shifted form of the Julian Date
/// algorithm: January and February as months 13 and 14 of the previous
/// year. The wire format carries the fields in that same form.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TimeSnapshot {
    pub year:   i32,
    pub month:  u32,
    pub day:    u32,
    pub hour:   u32,
    pub minute: u32,
    pub second: u32,
    pub lst:    f64, // in degrees
    pub diff:   f64, // in degrees
}

impl std::fmt::Display for TimeSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f, "{}|{}|{}|{}|{}|{}|{}|{}",
            self.year, self.month, self.day,
            self.hour, self.minute, self.second,
            self.lst, self.diff
        )
    }
}

impl std::str::FromStr for TimeSnapshot {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        fn parse<T: std::str::FromStr>(name: &'static str, text: &str) -> Result<T> {
            text.trim()
                .parse()
                .map_err(|_| Error::SnapshotValue(name, text.trim().to_string()))
        }

        let fields: Vec<&str> = text.trim().split('|').collect();
        if fields.len() != TIME_SNAPSHOT_FIELDS {
            return Err(Error::SnapshotFieldCount(fields.len()));
        }
        Ok(Self {
            year:   parse("year", fields[0])?,
            month:  parse("month", fields[1])?,
            day:    parse("day", fields[2])?,
            hour:   parse("hour", fields[3])?,
            minute: parse("minute", fields[4])?,
            second: parse("second", fields[5])?,
            lst:    parse("lst", fields[6])?,
            diff:   parse("diff", fields[7])?,
        })
    }
}

/// Conversion engine for one observing session: owns the site coordinates
/// and the current UTC time, and keeps one target position consistent
/// with them. Calendar inputs are the caller's contract and are not
/// validated here.
pub struct AstroCalcs {
    longitude: f64, // in degrees
    latitude:  f64, // in degrees
    model:     PrecessionModel,
    time:      TimeSnapshot,
    catalog:   Option<EqCoord>, // J2000 target as selected
    target:    Position,
}

impl AstroCalcs {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self::with_model(longitude, latitude, PrecessionModel::default())
    }

    pub fn with_model(longitude: f64, latitude: f64, model: PrecessionModel) -> Self {
        Self {
            longitude,
            latitude,
            model,
            time:    TimeSnapshot::default(),
            catalog: None,
            target:  Position::default(),
        }
    }

    pub fn from_observer(observer: &Observer) -> Self {
        Self::new(observer.longitude, observer.latitude)
    }

    /// Sets the UTC time and recomputes the local sidereal time. The new
    /// LST is propagated into the current target position.
    pub fn update_time(&mut self, year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) {
        let (year, month) = shift_civil(year, month);
        self.time.year = year;
        self.time.month = month;
        self.time.day = day;
        self.time.hour = hour;
        self.time.minute = minute;
        self.time.second = second;
        self.recompute_lst();
    }

    pub fn update_time_utc(&mut self, dt: &NaiveDateTime) {
        self.update_time(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second());
    }

    fn recompute_lst(&mut self) {
        let t = &mut self.time;
        let jd = julian_date(t.year, t.month, t.day, t.hour, t.minute, t.second);
        let gmst = gmst_degrees(jd);
        let clock_degrees =
            t.hour as f64 * 15.0 +
            t.minute as f64 * 15.0 / 60.0 +
            t.second as f64 * 15.0 / 3600.0;
        t.lst = local_sidereal_time(gmst, self.longitude);
        t.diff = clock_degrees - gmst;
        self.target = self.target.with_updated_lst(t.lst);
        log::debug!("time set to JD {:.6}, LST = {:.6} deg", jd, t.lst);
    }

    /// Pipe-delimited time snapshot: `Y|M|D|h|m|s|LST|diff`.
    pub fn serialize_time(&self) -> String {
        self.time.to_string()
    }

    /// Restores the time state from `serialize_time` text. The parse is
    /// atomic: on any error the engine keeps its previous state.
    pub fn deserialize_time(&mut self, text: &str) -> Result<()> {
        let snapshot: TimeSnapshot = text.parse()?;
        self.target = self.target.with_updated_lst(snapshot.lst);
        self.time = snapshot;
        Ok(())
    }

    /// Stores a J2000 catalog coordinate as the target, corrected for
    /// precession into the frame of the current time.
    pub fn set_target_j2000(&mut self, ra: f64, dec: f64) {
        let catalog = EqCoord { ra, dec };
        let current = self.precess(&catalog);
        log::debug!("target {:?} precessed to {:?}", catalog, current);
        self.catalog = Some(catalog);
        self.target = Position::new(current.ra, current.dec, self.latitude, self.time.lst);
    }

    /// Same, from catalog-style text: RA as `HH:MM:SS.s` in hours of time,
    /// Dec as `±DD:MM:SS` in degrees.
    pub fn set_target_j2000_text(&mut self, ra: &str, dec: &str) -> Result<()> {
        let ra_hours = sexagesimal_to_value(ra)
            .ok_or_else(|| Error::Sexagesimal(ra.to_string()))?;
        let dec_degrees = sexagesimal_to_value(dec)
            .ok_or_else(|| Error::Sexagesimal(dec.to_string()))?;
        self.set_target_j2000(hour_to_degree(ra_hours), dec_degrees);
        Ok(())
    }

    /// Corrects a J2000 coordinate for precession at the engine's current
    /// year, with the model selected at construction.
    pub fn precess(&self, crd: &EqCoord) -> EqCoord {
        let t = (self.time.year - 2000) as f64;
        let ra = degree_to_radian(crd.ra);
        let dec = degree_to_radian(crd.dec);
        match self.model {
            PrecessionModel::Annual => {
                let m = (3.0749 + 0.0000186 * t) * t;
                let n = (20.043 - 0.000085 * t) * t;
                let ns = (1.3362 - 0.0000056 * t) * t;
                let ra_seconds = m + ns * f64::sin(ra) * f64::tan(dec);
                let dec_seconds = n * f64::cos(ra);
                EqCoord {
                    ra:  crd.ra + ra_seconds / 3600.0 * 15.0,
                    dec: crd.dec + dec_seconds / 3600.0,
                }
            }
            PrecessionModel::Centennial => {
                let t = t / 100.0;
                let m = 307.0 * t;
                let n = 134.0 * t;
                let s = 2004.0 * t;
                let ra_seconds = crd.ra * 3600.0 / 15.0 + m + n * f64::sin(ra) * f64::tan(dec);
                let dec_seconds = crd.dec * 3600.0 + s * f64::cos(ra);
                EqCoord {
                    ra:  ra_seconds / 3600.0 * 15.0,
                    dec: dec_seconds / 3600.0,
                }
            }
        }
    }

    /// Lifts the target's apparent altitude by atmospheric refraction and
    /// re-derives its equatorial coordinates from the corrected Alt/Az.
    /// Near and below the horizon the correction is undefined and the
    /// target is left untouched.
    pub fn apply_refraction(&mut self) {
        let alt = self.target.alt();
        if alt <= -5.0 {
            log::debug!("no refraction at altitude {:.3} deg", alt);
            return;
        }
        let correction = 1.02 / f64::tan(degree_to_radian(alt + 10.3 / (alt + 5.11)));
        if !correction.is_finite() {
            log::debug!("refraction correction not finite at altitude {:.3} deg", alt);
            return;
        }
        self.target = Position::from_alt_az(
            alt + correction / 3600.0,
            self.target.az(),
            self.latitude,
            self.time.lst,
        );
    }

    /// Sets the target from the mount's reported horizontal coordinates.
    pub fn set_alt_az(&mut self, alt: f64, az: f64) {
        self.target = Position::from_alt_az(alt, az, self.latitude, self.time.lst);
    }

    /// Copy of the current target as it stands `offset` clock seconds
    /// later. Engine state is not changed.
    pub fn position_at(&self, offset: f64) -> Position {
        Position::with_offset(
            self.target.ra(),
            self.target.dec(),
            offset,
            self.latitude,
            self.time.lst,
        )
    }

    pub fn right_ascension(&self) -> f64 {
        normalize_degrees(self.target.ra())
    }

    pub fn declination(&self) -> f64 {
        self.target.dec()
    }

    pub fn hour_angle(&self) -> f64 {
        normalize_degrees(self.time.lst - self.target.ra())
    }

    pub fn local_sidereal_time(&self) -> f64 {
        normalize_degrees(self.time.lst)
    }

    pub fn altitude(&self) -> f64 {
        self.target.alt()
    }

    pub fn azimuth(&self) -> f64 {
        normalize_degrees(self.target.az())
    }

    pub fn target(&self) -> &Position {
        &self.target
    }

    pub fn catalog_target(&self) -> Option<EqCoord> {
        self.catalog
    }

    pub fn time(&self) -> &TimeSnapshot {
        &self.time
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn precession_model(&self) -> PrecessionModel {
        self.model
    }

    /// Great-circle distance between the current target and `crd`, the
    /// quantity a goto loop watches while slewing.
    pub fn target_separation(&self, crd: &EqCoord) -> f64 {
        EqCoord::angle_between(&self.target.eq_coord(), crd)
    }
}

#[test]
fn test_lst_at_greenwich_j2000() {
    let mut calcs = AstroCalcs::new(0.0, 51.476852);
    calcs.update_time(2000, 1, 1, 12, 0, 0);

    // stored calendar fields are the shifted ones
    assert_eq!(calcs.time().year, 1999);
    assert_eq!(calcs.time().month, 13);

    assert!(f64::abs(calcs.local_sidereal_time() - 280.46061837) < 1e-9);
}

#[test]
fn test_lst_monotonic_within_day() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    let mut prev = None;
    for hour in 0..24 {
        calcs.update_time(2024, 6, 1, hour, 0, 0);
        let lst = calcs.local_sidereal_time();
        assert!((0.0..360.0).contains(&lst));
        if let Some(prev) = prev {
            // sidereal time gains ~15.041 deg per clock hour
            let step = normalize_degrees(lst - prev);
            assert!(step > 15.0 && step < 15.1, "step = {}", step);
        }
        prev = Some(lst);
    }
}

#[test]
fn test_update_time_utc() {
    use chrono::NaiveDate;

    let mut by_fields = AstroCalcs::new(150.944799, -31.08);
    by_fields.update_time(2024, 2, 29, 23, 59, 59);

    let mut by_chrono = AstroCalcs::new(150.944799, -31.08);
    let dt = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(23, 59, 59).unwrap();
    by_chrono.update_time_utc(&dt);

    assert_eq!(by_fields.serialize_time(), by_chrono.serialize_time());
}

#[test]
fn test_time_snapshot_round_trip() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2023, 11, 5, 1, 2, 3);
    calcs.update_time(2024, 2, 10, 18, 30, 59);
    calcs.set_target_j2000(186.6496, -63.0991);

    let text = calcs.serialize_time();
    assert_eq!(text.split('|').count(), 8);

    let mut restored = AstroCalcs::new(150.944799, -31.08);
    restored.deserialize_time(&text).unwrap();
    assert!(f64::abs(restored.local_sidereal_time() - calcs.local_sidereal_time()) < 1e-9);
    assert_eq!(restored.time(), calcs.time());

    // the restored LST also reproduces from the restored calendar fields
    let t = restored.time().clone();
    let mut recomputed = AstroCalcs::new(150.944799, -31.08);
    recomputed.update_time(t.year, t.month, t.day, t.hour, t.minute, t.second);
    assert!(f64::abs(recomputed.local_sidereal_time() - calcs.local_sidereal_time()) < 1e-9);
}

#[test]
fn test_time_snapshot_serde() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2024, 2, 10, 18, 30, 59);

    let json = serde_json::to_string(calcs.time()).unwrap();
    let restored: TimeSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, calcs.time());
}

#[test]
fn test_deserialize_time_is_atomic() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2024, 6, 1, 10, 20, 30);
    let before = calcs.time().clone();

    assert!(matches!(
        calcs.deserialize_time("2024|6|1"),
        Err(Error::SnapshotFieldCount(3))
    ));
    assert_eq!(calcs.time(), &before);

    assert!(matches!(
        calcs.deserialize_time("2024|6|1|10|20|30|281.5|0.25|99|99"),
        Err(Error::SnapshotFieldCount(10))
    ));
    assert_eq!(calcs.time(), &before);

    assert!(matches!(
        calcs.deserialize_time("2024|what|1|10|20|30|281.5|0.25"),
        Err(Error::SnapshotValue("month", _))
    ));
    assert_eq!(calcs.time(), &before);
}

#[test]
fn test_precess_identity_at_epoch() {
    for model in [PrecessionModel::Annual, PrecessionModel::Centennial] {
        let mut calcs = AstroCalcs::with_model(0.0, 45.0, model);
        // March keeps the stored year at 2000
        calcs.update_time(2000, 3, 1, 0, 0, 0);
        let crd = EqCoord { ra: 186.6496, dec: -63.0991 };
        let precessed = calcs.precess(&crd);
        assert!(f64::abs(precessed.ra - crd.ra) < 1e-12);
        assert!(f64::abs(precessed.dec - crd.dec) < 1e-12);
    }
}

#[test]
fn test_precess_annual_rates() {
    let mut calcs = AstroCalcs::new(0.0, 45.0);
    calcs.update_time(2024, 6, 1, 0, 0, 0);

    // at RA 0 the correction reduces to the bare m and n rates
    let precessed = calcs.precess(&EqCoord { ra: 0.0, dec: 0.0 });
    let t = 24.0;
    let m = (3.0749 + 0.0000186 * t) * t;
    let n = (20.043 - 0.000085 * t) * t;
    assert!(f64::abs(precessed.ra - m / 3600.0 * 15.0) < 1e-12);
    assert!(f64::abs(precessed.dec - n / 3600.0) < 1e-12);
}

#[test]
fn test_set_target_j2000() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2024, 6, 1, 10, 20, 30);
    calcs.set_target_j2000(186.6496, -63.0991);

    let catalog = calcs.catalog_target().unwrap();
    assert_eq!(catalog.ra, 186.6496);
    assert_eq!(catalog.dec, -63.0991);

    // precession has moved the pointing coordinate off the catalog value
    assert!(calcs.right_ascension() != 186.6496);
    assert!(f64::abs(calcs.right_ascension() - 186.6496) < 0.5);
    assert!(f64::abs(calcs.declination() + 63.0991) < 0.5);

    // target follows the engine's LST
    assert!(f64::abs(
        calcs.hour_angle()
        - normalize_degrees(calcs.local_sidereal_time() - calcs.right_ascension())
    ) < 1e-9);
}

#[test]
fn test_set_target_j2000_text() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2000, 3, 1, 0, 0, 0);

    // Acrux, J2000: 12:26:35.9 -63:05:56.7
    calcs.set_target_j2000_text("12:26:35.9", "-63:05:56.7").unwrap();
    assert!(f64::abs(calcs.right_ascension() - 186.6496) < 1e-3);
    assert!(f64::abs(calcs.declination() + 63.0991) < 1e-3);

    assert!(matches!(
        calcs.set_target_j2000_text("acrux", "-63:05:56.7"),
        Err(Error::Sexagesimal(_))
    ));
}

#[test]
fn test_set_alt_az_round_trip() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    // March 2000: no precession offset between catalog and pointing frame
    calcs.update_time(2000, 3, 1, 8, 15, 0);
    calcs.set_target_j2000(186.6496, -20.5);
    let (alt, az) = (calcs.altitude(), calcs.azimuth());

    let mut mount = AstroCalcs::new(150.944799, -31.08);
    mount.update_time(2000, 3, 1, 8, 15, 0);
    mount.set_alt_az(alt, az);
    assert!(f64::abs(mount.right_ascension() - calcs.right_ascension()) < 1e-6);
    assert!(f64::abs(mount.declination() - calcs.declination()) < 1e-6);
    assert!(f64::abs(mount.altitude() - alt) < 1e-12);
    assert!(f64::abs(mount.azimuth() - az) < 1e-12);
}

#[test]
fn test_refraction_properties() {
    let mut calcs = AstroCalcs::new(0.0, 0.0);
    calcs.update_time(2024, 6, 1, 0, 0, 0);

    let refraction_at = |calcs: &mut AstroCalcs, alt: f64| {
        calcs.set_alt_az(alt, 180.0);
        calcs.apply_refraction();
        calcs.altitude() - alt
    };

    let mut prev = f64::INFINITY;
    for alt in [0.0, 10.0, 20.0, 30.0, 45.0, 60.0, 75.0, 89.0] {
        let r = refraction_at(&mut calcs, alt);
        assert!(r >= 0.0, "negative refraction at alt {}", alt);
        assert!(r < prev, "refraction grew at alt {}", alt);
        prev = r;
    }

    // vanishes towards the zenith
    assert!(f64::abs(refraction_at(&mut calcs, 89.9)) < 1e-5);

    // undefined below the horizon: target stays put
    calcs.set_alt_az(-10.0, 100.0);
    let before = (calcs.altitude(), calcs.azimuth());
    calcs.apply_refraction();
    assert_eq!((calcs.altitude(), calcs.azimuth()), before);
}

#[test]
fn test_refraction_keeps_equatorial_consistent() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2000, 3, 1, 8, 15, 0);
    // close to the meridian at that instant, well above the horizon
    calcs.set_target_j2000(60.0, -20.5);
    let unrefracted_alt = calcs.altitude();
    let az = calcs.azimuth();

    calcs.apply_refraction();
    assert!(calcs.altitude() > unrefracted_alt);
    assert!(f64::abs(calcs.azimuth() - az) < 1e-9);

    // RA/Dec were re-derived from the corrected Alt/Az
    let expected = Position::from_alt_az(
        calcs.altitude(), calcs.azimuth(), calcs.latitude(), calcs.local_sidereal_time()
    );
    assert!(f64::abs(calcs.right_ascension() - expected.ra()) < 1e-9);
    assert!(f64::abs(calcs.declination() - expected.dec()) < 1e-9);
}

#[test]
fn test_position_at() {
    let mut calcs = AstroCalcs::new(150.944799, -31.08);
    calcs.update_time(2024, 6, 1, 10, 20, 30);
    calcs.set_target_j2000(186.6496, -20.5);
    let lst_before = calcs.local_sidereal_time();

    let now = calcs.position_at(0.0);
    assert!(f64::abs(now.ra() - calcs.right_ascension()) < 1e-12);
    assert!(f64::abs(now.alt() - calcs.altitude()) < 1e-12);

    let later = calcs.position_at(60.0);
    assert!(f64::abs(later.lst() - normalize_degrees(lst_before + 60.0 * LST_DEGREES_PER_SECOND)) < 1e-9);

    // engine state is untouched
    assert_eq!(calcs.local_sidereal_time(), lst_before);
}

#[test]
fn test_target_separation() {
    let mut calcs = AstroCalcs::new(0.0, 45.0);
    calcs.update_time(2000, 3, 1, 0, 0, 0);
    calcs.set_target_j2000(90.0, 0.0);

    let here = calcs.catalog_target().unwrap();
    assert!(calcs.target_separation(&here) < 1e-9);
    assert!(f64::abs(calcs.target_separation(&EqCoord { ra: 0.0, dec: 0.0 }) - 90.0) < 1e-9);
}
