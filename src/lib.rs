//! Computational core for an equatorial telescope mount: RA/Dec ↔ Alt/Az
//! conversion, precession and refraction corrections of catalog coordinates
//! and local sidereal time maintenance for a fixed observing site.

pub mod sky_math;
pub mod sexagesimal;
pub mod observer;
pub mod position;
pub mod engine;

pub use engine::{AstroCalcs, Error, PrecessionModel, Result, TimeSnapshot};
pub use observer::Observer;
pub use position::{Position, RiseSet};
pub use sky_math::math::{Dms, EqCoord, Hms, HorizCoord};
