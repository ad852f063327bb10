//! weaver-common: configuration, errors and telemetry shared by the media crates.

pub mod config;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::{
    FileStore, LinkPolicyConfig, Loader, MediaConfig, Saver, SchemaConfig, UploadConfig,
};
pub use crate::error::{ParseError, SerDeError, WeaverError};
