//! Core types and configuration for fnpack.
//!
//! This crate defines the `fnpack.toml` schema ([`FnpackConfig`]), the
//! language template descriptor ([`LanguageTemplate`]), image tag formats
//! ([`TagFormat`], [`image_name`]), and shared error types.

pub mod config;
pub mod error;
pub mod tag;
pub mod template;

pub use config::{BuildDefaults, FnpackConfig, FunctionConfig};
pub use error::{Error, Result};
pub use tag::{TagFormat, image_name};
pub use template::{BuildOption, LanguageTemplate};
