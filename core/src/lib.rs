//! Core library for the program / work-item tracker.
//!
//! - [`pm`]: domain records plus the burndown, part hierarchy and dashboard
//!   computations that run over them.
//! - [`db`]: SQLite storage (pool, migrations, repositories).
//! - [`config`]: service configuration loading.

pub mod config;
pub mod db;
pub mod pm;
