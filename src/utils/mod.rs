pub mod constants;
pub mod interpolate;
pub mod mapping;
pub mod radar;
pub mod vna;
