// src/ui/mod.rs

pub mod app;
pub mod button;
