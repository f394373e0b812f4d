//! Sync configuration types.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::digest::HashAlgorithm;

/// What the diff engine does with a file it cannot hash.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HashErrorPolicy {
    /// Treat the file as changed and copy it.
    #[default]
    Copy,
    /// Leave the file out of the copy list.
    Skip,
}

/// Configuration for one sync run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SyncConfig {
    /// Root of the tree to mirror.
    pub source: PathBuf,

    /// Root of the tree to bring in line with `source`.
    pub destination: PathBuf,

    /// Digest used for content comparison.
    #[builder(default)]
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Number of hashing/copy workers (0 = available parallelism).
    #[builder(default = "0")]
    #[serde(default)]
    pub concurrency: usize,

    /// Compute the plan without touching the destination.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,

    /// Stop applying after the first failed entry.
    #[builder(default = "false")]
    #[serde(default)]
    pub fail_fast: bool,

    /// Treat files with different listed sizes as changed without hashing.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub size_shortcut: bool,

    /// Handling of files that cannot be hashed.
    #[builder(default)]
    #[serde(default)]
    pub on_hash_error: HashErrorPolicy,

    /// Where to write the copy list, if anywhere.
    #[builder(default)]
    #[serde(default)]
    pub copy_report: Option<PathBuf>,

    /// Where to write the delete list, if anywhere.
    #[builder(default)]
    #[serde(default)]
    pub delete_report: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl SyncConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let source = match self.source {
            Some(ref source) if !source.as_os_str().is_empty() => source,
            Some(_) => return Err("Source path cannot be empty".to_string()),
            None => return Err("Source path is required".to_string()),
        };
        let destination = match self.destination {
            Some(ref destination) if !destination.as_os_str().is_empty() => destination,
            Some(_) => return Err("Destination path cannot be empty".to_string()),
            None => return Err("Destination path is required".to_string()),
        };
        if source == destination {
            return Err("Source and destination must be different paths".to_string());
        }
        Ok(())
    }
}

impl SyncConfig {
    /// Create a new sync config builder.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Create a config with defaults for everything but the two roots.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            hash_algorithm: HashAlgorithm::default(),
            concurrency: 0,
            dry_run: false,
            fail_fast: false,
            size_shortcut: true,
            on_hash_error: HashErrorPolicy::default(),
            copy_report: None,
            delete_report: None,
        }
    }

    /// Worker count with `0` resolved to the available parallelism.
    pub fn effective_concurrency(&self) -> usize {
        match self.concurrency {
            0 => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            n => n,
        }
    }
}
