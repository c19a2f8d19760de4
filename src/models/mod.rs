// src/models/mod.rs

pub mod attempt;
pub mod quiz;
pub mod timestamp;
pub mod user;
