//! IntAct Common Library
//!
//! Shared error handling and logging set-up for the IntAct export tools.
//!
//! - **Error Handling**: [`IntactError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber initialisation driven by environment
//!   variables or a builder
//!
//! # Example
//!
//! ```no_run
//! use intact_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! let config = LogConfig::builder()
//!     .level(LogLevel::Debug)
//!     .log_file_prefix("intact-export")
//!     .build();
//! init_logging(&config).unwrap();
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

pub use error::{IntactError, Result};
