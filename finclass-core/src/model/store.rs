//! On-disk model bundles.
//!
//! A bundle directory holds:
//!
//! ```text
//! models/demo/
//! ├── manifest.json          format version, profile, fingerprint, file names
//! ├── tfidf_vectorizer.json  TfidfArtifact
//! └── classifier.json        ClassifierArtifact, tagged by "kind"
//! ```
//!
//! Loading is all-or-nothing: every artifact is parsed and cross-checked
//! before a [`ModelBundle`] is returned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::forest::ForestArtifact;
use super::linear::LinearArtifact;
use super::tfidf::TfidfArtifact;
use super::{Classifier, ForestClassifier, LinearClassifier, TfidfVectorizer, Vectorizer};
use crate::error::ModelError;
use crate::profile::{NormalizationProfile, ProfilePin};

/// Manifest layout version this build reads.
pub const FORMAT_VERSION: u32 = 1;

/// File name of the manifest inside a bundle directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Bundle manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Layout version, see [`FORMAT_VERSION`].
    pub format_version: u32,
    /// Profile the artifacts were fitted under.
    pub profile: NormalizationProfile,
    /// Fingerprint of `profile` recorded at fit time.
    pub fingerprint: String,
    /// Vectorizer file, relative to the bundle directory.
    pub vectorizer: PathBuf,
    /// Classifier file, relative to the bundle directory.
    pub classifier: PathBuf,
}

/// Classifier file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClassifierArtifact {
    /// Averaging tree ensemble.
    Forest(ForestArtifact),
    /// Linear softmax model.
    Linear(LinearArtifact),
}

impl ClassifierArtifact {
    /// Validates the artifact and returns its evaluator.
    ///
    /// # Errors
    ///
    /// Returns a description of the first structural problem found.
    pub fn build(self) -> Result<Box<dyn Classifier>, String> {
        Ok(match self {
            ClassifierArtifact::Forest(a) => Box::new(ForestClassifier::from_artifact(a)?),
            ClassifierArtifact::Linear(a) => Box::new(LinearClassifier::from_artifact(a)?),
        })
    }
}

/// Profile, vectorizer and classifier that belong together.
///
/// Immutable once built and safe to share across threads.
pub struct ModelBundle {
    profile: NormalizationProfile,
    fingerprint: String,
    vectorizer: Box<dyn Vectorizer>,
    classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("profile", &self.profile.id())
            .field("fingerprint", &self.fingerprint)
            .field("dimension", &self.vectorizer.dimension())
            .field("classes", &self.classifier.classes())
            .finish()
    }
}

impl ModelBundle {
    /// Assembles a bundle from in-memory parts.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Inconsistent`] if the classifier was fitted on
    /// a different dimension than the vectorizer produces.
    pub fn new(
        profile: NormalizationProfile,
        vectorizer: Box<dyn Vectorizer>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ModelError> {
        Self::assemble(profile, vectorizer, classifier, Path::new("<memory>"))
    }

    fn assemble(
        profile: NormalizationProfile,
        vectorizer: Box<dyn Vectorizer>,
        classifier: Box<dyn Classifier>,
        classifier_path: &Path,
    ) -> Result<Self, ModelError> {
        if classifier.n_features() != vectorizer.dimension() {
            return Err(ModelError::inconsistent(
                classifier_path,
                format!(
                    "classifier expects {} features but the vocabulary has {}",
                    classifier.n_features(),
                    vectorizer.dimension()
                ),
            ));
        }
        let fingerprint = profile.fingerprint();
        Ok(Self {
            profile,
            fingerprint,
            vectorizer,
            classifier,
        })
    }

    /// Profile the artifacts expect.
    #[inline(always)]
    pub fn profile(&self) -> &NormalizationProfile {
        &self.profile
    }

    /// Fingerprint of [`profile`](Self::profile).
    #[inline(always)]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Feature extractor.
    #[inline(always)]
    pub fn vectorizer(&self) -> &dyn Vectorizer {
        self.vectorizer.as_ref()
    }

    /// Probability model.
    #[inline(always)]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

/// A bundle directory, optionally restricted to one profile.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
    pin: Option<ProfilePin>,
}

impl ModelStore {
    /// Opens a bundle directory.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Missing`] if `dir` is not a directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ModelError::Missing { path: dir });
        }
        Ok(Self { dir, pin: None })
    }

    /// Requires the bundled profile to satisfy `pin`.
    pub fn with_pin(mut self, pin: ProfilePin) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Bundle directory.
    #[inline(always)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads and checks the manifest only.
    ///
    /// # Errors
    ///
    /// Fails if the manifest is unreadable, declares another format version,
    /// its profile no longer matches the recorded fingerprint or the pin is
    /// not satisfied.
    pub fn manifest(&self) -> Result<Manifest, ModelError> {
        let path = self.dir.join(MANIFEST_FILE);
        let manifest: Manifest = read_json(&path)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat {
                path,
                found: manifest.format_version,
                supported: FORMAT_VERSION,
            });
        }

        let computed = manifest.profile.fingerprint();
        if !computed.eq_ignore_ascii_case(manifest.fingerprint.trim()) {
            return Err(ModelError::ProfileMismatch {
                path,
                recorded: manifest.fingerprint,
                computed,
            });
        }

        if let Some(pin) = &self.pin {
            if !pin.matches(&manifest.profile) {
                return Err(ModelError::ProfilePin {
                    path,
                    required: pin.to_string(),
                    found: manifest.profile.id(),
                });
            }
        }

        Ok(manifest)
    }

    /// Loads and cross-checks the whole bundle.
    ///
    /// # Errors
    ///
    /// Any unreadable, malformed or mutually inconsistent artifact.
    pub fn load(&self) -> Result<ModelBundle, ModelError> {
        let manifest = self.manifest()?;

        let vectorizer_path = self.dir.join(&manifest.vectorizer);
        let artifact: TfidfArtifact = read_json(&vectorizer_path)?;
        let vectorizer = TfidfVectorizer::from_artifact(artifact)
            .map_err(|reason| ModelError::inconsistent(&vectorizer_path, reason))?;
        debug!(path = %vectorizer_path.display(), terms = vectorizer.dimension(), "vectorizer loaded");

        let classifier_path = self.dir.join(&manifest.classifier);
        let artifact: ClassifierArtifact = read_json(&classifier_path)?;
        let classifier = artifact
            .build()
            .map_err(|reason| ModelError::inconsistent(&classifier_path, reason))?;
        debug!(path = %classifier_path.display(), classes = classifier.classes().len(), "classifier loaded");

        let bundle = ModelBundle::assemble(
            manifest.profile,
            Box::new(vectorizer),
            classifier,
            &classifier_path,
        )?;

        info!(
            dir = %self.dir.display(),
            profile = %bundle.profile().id(),
            fingerprint = %bundle.fingerprint(),
            features = bundle.vectorizer().dimension(),
            classes = bundle.classifier().classes().len(),
            "model bundle loaded"
        );
        Ok(bundle)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ModelError::Missing {
            path: path.to_path_buf(),
        },
        _ => ModelError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_artifact_is_tagged_by_kind() {
        let json = r#"{
            "kind": "linear",
            "classes": ["a", "b"],
            "coef": [[1.0], [-1.0]],
            "intercept": [0.0, 0.0]
        }"#;
        let artifact: ClassifierArtifact = serde_json::from_str(json).unwrap();
        assert!(matches!(artifact, ClassifierArtifact::Linear(_)));
        let classifier = artifact.build().unwrap();
        assert_eq!(classifier.n_features(), 1);
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let json = r#"{"kind": "svm", "classes": ["a"]}"#;
        assert!(serde_json::from_str::<ClassifierArtifact>(json).is_err());
    }

    #[test]
    fn open_requires_a_directory() {
        let err = ModelStore::open("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ModelError::Missing { .. }));
    }
}
