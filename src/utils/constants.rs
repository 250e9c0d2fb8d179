pub(crate) const NS_PER_S: f64 = 1e9;
pub(crate) const DEGREES_PER_CYCLE: f64 = 360.0;
