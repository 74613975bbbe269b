#![forbid(unsafe_code)]
//! Census microdata model SSOT.

mod enrollment;
mod ids;
mod record;

pub use enrollment::{EnrollmentCounts, ENROLLMENT_COLUMNS};
pub use ids::{
    CensusYear, InstitutionCode, InstitutionYearKey, ParseError, CODE_MAX_LEN, NAME_MAX_LEN,
    YEAR_MAX, YEAR_MIN,
};
pub use record::{GeoAttributes, SchoolRecord};

pub const CRATE_NAME: &str = "censo-model";
