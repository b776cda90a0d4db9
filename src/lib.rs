//! plantlog: plants and their health diagnosis logs over a cached HTTP API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
