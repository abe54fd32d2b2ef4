//! Complaint classification core.
//!
//! Turns a free-text consumer-finance complaint into a category label and a
//! ranked confidence distribution. The part that matters is the text
//! pipeline: the canonical text fed to the model must be produced exactly as
//! it was when the model was fitted, so every switch lives in a versioned,
//! fingerprinted [`NormalizationProfile`] shipped with the artifacts.
//!
//! - [`analyzer`]: normalizer, tokenizer, lemmatizer, stopwords
//! - [`filter`] / [`canonical`]: token filter and canonical join
//! - [`model`]: vectorizer and classifier readers, [`ModelStore`]
//! - [`pipeline`]: [`Preprocessor`] and [`Pipeline`]
//! - [`rank`]: result ordering
//!
//! Threading:
//! - Every type here is immutable after construction. A [`Pipeline`] can be
//!   shared behind an `Arc` and called from any number of threads.

#![warn(missing_docs)]

pub mod analyzer;
pub mod canonical;
pub mod error;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod rank;

pub use analyzer::{EnglishAnalyzer, LexicalAnalyzer, TextNormalizer, Token};
pub use error::{ClassifyError, ModelError, Stage};
pub use filter::TokenFilter;
pub use model::{ModelBundle, ModelStore};
pub use pipeline::{Pipeline, Prediction, Preprocessor};
pub use profile::{NormalizationProfile, ProfilePin};
