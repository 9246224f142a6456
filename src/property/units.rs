//! UN/CEFACT common codes used as `unitCode`

pub const CELSIUS: &str = "CEL";
pub const PERCENT: &str = "P1";
pub const LUX: &str = "LUX";
pub const KILOPASCAL: &str = "KPA";
pub const LITRE: &str = "LTR";
pub const METRE: &str = "MTR";
pub const SECOND: &str = "SEC";
