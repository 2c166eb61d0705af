//! Survey definition, response intake, and satisfaction metrics for DeepCX.

pub mod config;
pub mod error;
pub mod surveys;
pub mod telemetry;
