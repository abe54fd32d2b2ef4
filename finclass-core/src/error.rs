//! Error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a model bundle could not be loaded.
///
/// Every variant names the artifact it concerns.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The file or directory does not exist.
    #[error("{}: artifact not found", .path.display())]
    Missing {
        /// Expected location.
        path: PathBuf,
    },

    /// The artifact exists but could not be read.
    #[error("{}: read failed: {source}", .path.display())]
    Io {
        /// Artifact location.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The artifact is not valid JSON for its schema.
    #[error("{}: invalid artifact: {source}", .path.display())]
    Parse {
        /// Artifact location.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The artifact parsed but violates a structural rule.
    #[error("{}: {reason}", .path.display())]
    Inconsistent {
        /// Artifact location.
        path: PathBuf,
        /// Human-readable description.
        reason: String,
    },

    /// The profile bundled with the artifacts no longer hashes to the
    /// fingerprint they were fitted with.
    #[error(
        "{}: normalization profile fingerprint mismatch (recorded {recorded}, computed {computed})",
        .path.display()
    )]
    ProfileMismatch {
        /// Manifest location.
        path: PathBuf,
        /// Fingerprint stored in the manifest.
        recorded: String,
        /// Fingerprint of the profile as loaded.
        computed: String,
    },

    /// The bundled profile is not the one the caller asked for.
    #[error("{}: profile {found} does not satisfy required {required}", .path.display())]
    ProfilePin {
        /// Manifest location.
        path: PathBuf,
        /// Requested `name[@version]`.
        required: String,
        /// Bundled `name@version`.
        found: String,
    },

    /// The manifest declares a layout this build cannot read.
    #[error("{}: unsupported format version {found} (supported: {supported})", .path.display())]
    UnsupportedFormat {
        /// Manifest location.
        path: PathBuf,
        /// Declared version.
        found: u32,
        /// Version this build reads.
        supported: u32,
    },
}

impl ModelError {
    /// Artifact the error concerns.
    pub fn path(&self) -> &Path {
        match self {
            ModelError::Missing { path }
            | ModelError::Io { path, .. }
            | ModelError::Parse { path, .. }
            | ModelError::Inconsistent { path, .. }
            | ModelError::ProfileMismatch { path, .. }
            | ModelError::ProfilePin { path, .. }
            | ModelError::UnsupportedFormat { path, .. } => path,
        }
    }

    pub(crate) fn inconsistent(path: &Path, reason: impl Into<String>) -> Self {
        ModelError::Inconsistent {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Before normalization.
    Input,
    /// After filtering, on the canonical text.
    Filter,
    /// Artifact loading or inference.
    Model,
}

/// Errors returned by [`Pipeline`](crate::Pipeline).
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The raw text is empty or whitespace only.
    #[error("input text is empty")]
    EmptyInput,

    /// Nothing meaningful survived normalization and filtering.
    #[error(
        "not enough recognizable content to classify \
         (canonical text has {length} characters, at least {min_length} required)"
    )]
    InsufficientSignal {
        /// Canonical text length in characters.
        length: usize,
        /// Required minimum.
        min_length: usize,
    },

    /// The model artifacts are missing or invalid.
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
}

impl ClassifyError {
    /// Stage that rejected the request.
    pub fn stage(&self) -> Stage {
        match self {
            ClassifyError::EmptyInput => Stage::Input,
            ClassifyError::InsufficientSignal { .. } => Stage::Filter,
            ClassifyError::ModelUnavailable(_) => Stage::Model,
        }
    }

    /// `true` when the user can fix the problem by changing the input text.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ClassifyError::ModelUnavailable(_))
    }
}

/// A profile pin string that is not `NAME` or `NAME@VERSION`.
#[derive(Debug, Error)]
#[error("invalid profile pin {0:?}: expected NAME or NAME@VERSION")]
pub struct InvalidPin(pub String);
