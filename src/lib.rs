// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod quiz;
pub mod routes;
pub mod session;
pub mod storage;
