//! Core domain types and logic. No I/O.

pub mod ohlcv;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod indicator_helpers;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
