//! Command implementations for segidx-cmd

pub mod build;
pub mod coarse;
pub mod find;
pub mod generate;
pub mod inspect;
