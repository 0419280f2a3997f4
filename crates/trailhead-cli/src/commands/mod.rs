pub mod config;
pub mod goal;
pub mod steps;
pub mod sweep;
pub mod usage;
