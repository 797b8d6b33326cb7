pub mod chart;
pub mod fields;
pub mod roster;
