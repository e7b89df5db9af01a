//! LABBOOK CLI library exports.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
