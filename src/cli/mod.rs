// src/cli/mod.rs

pub mod actions;
pub mod commands;
