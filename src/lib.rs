// src/lib.rs

pub mod backup;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod tweaks;
#[cfg(windows)]
pub mod ui;
pub mod utils;
pub mod worker;

#[cfg(test)]
mod testing;
