//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the dance library core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the configuration builder used to bootstrap the core and
//! the logging conventions used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
