//! Core types and configuration for webpub.
//!
//! This crate resolves the deployment [`Environment`], loads the `webpub.toml`
//! [`Settings`] and the per-environment [`BundleConfig`], rewrites the
//! process manager [`ProcessDescriptor`], and defines the shared error type.

pub mod config;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod package;

pub use config::{
    BundleConfig, BundlerSettings, PathSettings, PublishSettings, SETTINGS_FILE, Settings,
    TemplateSettings,
};
pub use environment::{ENVIRONMENT_VAR, Environment};
pub use error::{Error, Result};
pub use manifest::{ProcessDescriptor, ProcessEntry};
pub use package::{PACKAGE_NAME_VAR, package_name};
