//! Application services layer.

pub mod error;
pub mod health_logs;
pub mod pagination;
pub mod plants;
pub mod repos;
pub mod upstream;
