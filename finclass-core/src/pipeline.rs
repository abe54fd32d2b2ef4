//! Request pipeline.
//!
//! ```text
//! raw ─► normalize ─► analyze ─► filter ─► join ─► vectorize ─► classify ─► rank
//!        └──────────── Preprocessor ─────────────┘  └────── ModelBundle ──────┘
//! ```
//!
//! [`Preprocessor`] turns raw text into canonical text and needs only a
//! profile. [`Pipeline`] adds the loaded model. Both hold no per-request
//! state, so one instance serves any number of threads.

use std::borrow::Cow;

use finclass_types::{CategoryLabel, Classification, ConfidenceDistribution, Prepared};
use tracing::{debug, warn};

use crate::analyzer::{EnglishAnalyzer, LexicalAnalyzer, TextNormalizer};
use crate::canonical;
use crate::error::{ClassifyError, ModelError};
use crate::filter::TokenFilter;
use crate::model::{argmax, ModelBundle};
use crate::profile::NormalizationProfile;
use crate::rank::rank;

/// Normalizer, analyzer and filter of one profile.
pub struct Preprocessor {
    normalizer: TextNormalizer,
    analyzer: Box<dyn LexicalAnalyzer>,
    filter: TokenFilter,
}

impl std::fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("normalizer", &self.normalizer)
            .field("analyzer", &self.analyzer.name())
            .field("filter", &self.filter)
            .finish()
    }
}

impl Preprocessor {
    /// Builds the stages `profile` describes, with the English analyzer.
    pub fn from_profile(profile: &NormalizationProfile) -> Self {
        let analyzer = EnglishAnalyzer::with_source(profile.stopwords);
        Self::with_analyzer(profile, Box::new(analyzer))
    }

    /// Builds the stages `profile` describes around a caller-supplied analyzer.
    pub fn with_analyzer(
        profile: &NormalizationProfile,
        analyzer: Box<dyn LexicalAnalyzer>,
    ) -> Self {
        if analyzer.name() != profile.analyzer {
            warn!(
                expected = %profile.analyzer,
                actual = analyzer.name(),
                "analyzer differs from the profile's"
            );
        }
        Self {
            normalizer: TextNormalizer::new(profile.normalizer.clone()),
            analyzer,
            filter: TokenFilter::from_profile(profile),
        }
    }

    /// Normalizer stage only.
    #[inline]
    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    /// Canonical text of normalized input.
    pub fn canonicalize(&self, normalized: &str) -> String {
        let mut lemmas: Vec<Cow<'_, str>> = Vec::new();
        self.analyzer.analyze(normalized, &mut |token| {
            if self.filter.accepts(&token) {
                lemmas.push(token.lemma);
            }
        });
        canonical::join(&lemmas)
    }

    /// Every intermediate form of `raw`.
    pub fn prepare(&self, raw: &str) -> Prepared {
        let normalized = self.normalize(raw);
        let canonical = self.canonicalize(&normalized);
        debug!(
            raw_len = raw.len(),
            normalized_len = normalized.len(),
            canonical_len = canonical.len(),
            "prepared"
        );
        Prepared {
            raw: raw.to_string(),
            normalized,
            canonical,
        }
    }
}

/// Arg-max label and full distribution for one canonical text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// First class with the highest probability.
    pub label: CategoryLabel,
    /// One probability per class, in class-list order.
    pub distribution: ConfidenceDistribution,
}

/// End-to-end classifier over a loaded [`ModelBundle`].
///
/// ```no_run
/// use finclass_core::{ModelStore, Pipeline};
///
/// let bundle = ModelStore::open("models/demo")?.load()?;
/// let pipeline = Pipeline::new(bundle);
/// let result = pipeline.run("They charged a late fee twice on my credit card")?;
/// println!("{} ({:.2})", result.label, result.confidence());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Pipeline {
    preprocessor: Preprocessor,
    bundle: ModelBundle,
}

impl Pipeline {
    /// Pipeline with the English analyzer.
    pub fn new(bundle: ModelBundle) -> Self {
        let preprocessor = Preprocessor::from_profile(bundle.profile());
        Self {
            preprocessor,
            bundle,
        }
    }

    /// Pipeline with a caller-supplied analyzer.
    pub fn with_analyzer(bundle: ModelBundle, analyzer: Box<dyn LexicalAnalyzer>) -> Self {
        let preprocessor = Preprocessor::with_analyzer(bundle.profile(), analyzer);
        Self {
            preprocessor,
            bundle,
        }
    }

    /// Loaded artifacts.
    #[inline(always)]
    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Every intermediate form of `raw`.
    #[inline]
    pub fn prepare(&self, raw: &str) -> Prepared {
        self.preprocessor.prepare(raw)
    }

    /// Classifies canonical text.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::InsufficientSignal`] if `canonical` is shorter than
    /// the profile's minimum; [`ClassifyError::ModelUnavailable`] if the
    /// classifier returns a malformed distribution.
    pub fn classify(&self, canonical: &str) -> Result<Prediction, ClassifyError> {
        let min_length = self.bundle.profile().min_canonical_len;
        let length = canonical.chars().count();
        if length < min_length {
            warn!(length, min_length, "rejected: insufficient signal");
            return Err(ClassifyError::InsufficientSignal { length, min_length });
        }

        let features = self.bundle.vectorizer().transform(canonical);
        debug!(nnz = features.nnz(), dim = features.dim(), "vectorized");

        let classifier = self.bundle.classifier();
        let classes = classifier.classes();
        let probabilities = classifier.predict_proba(&features);
        let label = match argmax(&probabilities) {
            Some(index) if probabilities.len() == classes.len() => classes[index].clone(),
            _ => {
                return Err(ModelError::inconsistent(
                    std::path::Path::new("<classifier>"),
                    format!(
                        "{} probabilities for {} classes",
                        probabilities.len(),
                        classes.len()
                    ),
                )
                .into())
            }
        };

        Ok(Prediction {
            label,
            distribution: ConfidenceDistribution::new(classes, &probabilities),
        })
    }

    /// Classifies raw text.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::EmptyInput`] for blank text, otherwise as
    /// [`classify`](Self::classify).
    pub fn run(&self, raw: &str) -> Result<Classification, ClassifyError> {
        if raw.trim().is_empty() {
            warn!("rejected: empty input");
            return Err(ClassifyError::EmptyInput);
        }
        let prepared = self.prepare(raw);
        let Prediction {
            label,
            distribution,
        } = self.classify(&prepared.canonical)?;
        let ranked = rank(&distribution);
        debug!(label = %label, "classified");
        Ok(Classification {
            label,
            ranked,
            prepared,
        })
    }

    /// Runs every input in order.
    pub fn classify_batch<I, S>(&self, inputs: I) -> Vec<Result<Classification, ClassifyError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs.into_iter().map(|raw| self.run(raw.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Token;
    use crate::model::{Classifier, FeatureVector, Vectorizer};

    /// Every word is one feature: "alpha" 0, "beta" 1.
    struct TwoWords;

    impl Vectorizer for TwoWords {
        fn dimension(&self) -> usize {
            2
        }

        fn transform(&self, canonical: &str) -> FeatureVector {
            let entries = canonical
                .split(' ')
                .filter_map(|w| match w {
                    "alpha" => Some((0, 1.0)),
                    "beta" => Some((1, 1.0)),
                    _ => None,
                })
                .collect();
            FeatureVector::from_entries(2, entries)
        }
    }

    /// Each class gets the share of its own word: "a" of alpha, "b" of beta.
    /// `classes` must be `["b", "a"]`.
    struct Share {
        classes: Vec<CategoryLabel>,
    }

    impl Classifier for Share {
        fn classes(&self) -> &[CategoryLabel] {
            &self.classes
        }

        fn n_features(&self) -> usize {
            2
        }

        fn predict_proba(&self, x: &FeatureVector) -> Vec<f64> {
            let (a, b) = (x.get(0), x.get(1));
            if a + b == 0.0 {
                return vec![0.5, 0.5];
            }
            vec![b / (a + b), a / (a + b)]
        }
    }

    /// Each word is its own lemma; nothing is a stopword.
    struct Verbatim;

    impl LexicalAnalyzer for Verbatim {
        fn name(&self) -> &str {
            "verbatim"
        }

        fn analyze<'n>(&self, normalized: &'n str, emit: &mut dyn FnMut(Token<'n>)) {
            for (i, word) in normalized.split(' ').filter(|w| !w.is_empty()).enumerate() {
                emit(Token::plain(word, i as u32));
            }
        }
    }

    fn bundle() -> ModelBundle {
        ModelBundle::new(
            NormalizationProfile::default(),
            Box::new(TwoWords),
            Box::new(Share {
                classes: vec!["b".into(), "a".into()],
            }),
        )
        .unwrap()
    }

    #[test]
    fn run_produces_ranked_classification() {
        let pipeline = Pipeline::with_analyzer(bundle(), Box::new(Verbatim));
        let result = pipeline.run("Alpha alpha BETA").unwrap();

        assert_eq!(result.prepared.normalized, "alpha alpha beta");
        assert_eq!(result.prepared.canonical, "alpha alpha beta");
        assert_eq!(result.label.as_str(), "a");
        assert_eq!(result.ranked[0].label.as_str(), "a");
        assert!((result.confidence() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn argmax_tie_takes_first_class_but_ranking_sorts_by_label() {
        let pipeline = Pipeline::with_analyzer(bundle(), Box::new(Verbatim));
        let result = pipeline.run("alpha beta").unwrap();
        assert_eq!(result.label.as_str(), "b");
        assert_eq!(result.ranked[0].label.as_str(), "a");
    }

    #[test]
    fn blank_input_is_empty() {
        let pipeline = Pipeline::new(bundle());
        assert!(matches!(pipeline.run("   \n\t"), Err(ClassifyError::EmptyInput)));
        assert!(matches!(pipeline.run(""), Err(ClassifyError::EmptyInput)));
    }

    #[test]
    fn filtered_out_input_lacks_signal() {
        let pipeline = Pipeline::new(bundle());
        match pipeline.run("the and a 123 !!!") {
            Err(ClassifyError::InsufficientSignal { length, min_length }) => {
                assert_eq!(length, 0);
                assert_eq!(min_length, 2);
            }
            other => panic!("expected InsufficientSignal, got {other:?}"),
        }
    }

    #[test]
    fn classify_enforces_minimum_canonical_length() {
        let pipeline = Pipeline::new(bundle());
        assert!(matches!(
            pipeline.classify("a"),
            Err(ClassifyError::InsufficientSignal { length: 1, min_length: 2 })
        ));
        assert!(matches!(
            pipeline.classify(""),
            Err(ClassifyError::InsufficientSignal { length: 0, min_length: 2 })
        ));

        let prediction = pipeline.classify("ab").unwrap();
        assert_eq!(prediction.label.as_str(), "b");
        assert_eq!(prediction.distribution.len(), 2);
    }

    #[test]
    fn classify_counts_characters_not_bytes() {
        let pipeline = Pipeline::new(bundle());
        assert!(matches!(
            pipeline.classify("é"),
            Err(ClassifyError::InsufficientSignal { length: 1, min_length: 2 })
        ));
    }

    #[test]
    fn stricter_profile_rejects_short_canonical() {
        let profile = NormalizationProfile {
            min_canonical_len: 3,
            ..NormalizationProfile::default()
        };
        let bundle = ModelBundle::new(
            profile,
            Box::new(TwoWords),
            Box::new(Share {
                classes: vec!["b".into(), "a".into()],
            }),
        )
        .unwrap();
        let pipeline = Pipeline::with_analyzer(bundle, Box::new(Verbatim));

        assert!(matches!(
            pipeline.classify("ab"),
            Err(ClassifyError::InsufficientSignal { length: 2, min_length: 3 })
        ));
        assert!(pipeline.classify("abc").is_ok());
        assert!(matches!(
            pipeline.run("ab"),
            Err(ClassifyError::InsufficientSignal { length: 2, min_length: 3 })
        ));
    }

    #[test]
    fn placeholders_never_reach_the_canonical_text() {
        let pipeline = Pipeline::new(bundle());
        let prepared = pipeline.prepare("I bought the {Product_Purchased} and it broke");
        assert_eq!(prepared.normalized, "i bought the and it broke");
        assert!(!prepared.canonical.contains("product"));
        assert!(!prepared.canonical.is_empty());
    }

    #[test]
    fn unknown_words_still_classify() {
        let pipeline = Pipeline::with_analyzer(bundle(), Box::new(Verbatim));
        let result = pipeline.run("zebra quartz").unwrap();
        assert_eq!(result.ranked.len(), 2);
        let total: f64 = result.ranked.iter().map(|r| r.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prepare_applies_the_default_analyzer_and_filter() {
        let pipeline = Pipeline::new(bundle());
        let prepared = pipeline.prepare("They keep CHARGING me fees!!");
        assert_eq!(prepared.normalized, "they keep charging me fees");
        assert_eq!(prepared.canonical, "charge fee");
    }

    #[test]
    fn batch_keeps_order_and_errors() {
        let pipeline = Pipeline::with_analyzer(bundle(), Box::new(Verbatim));
        let results = pipeline.classify_batch(["alpha", "", "beta beta"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().label.as_str(), "a");
        assert!(matches!(results[1], Err(ClassifyError::EmptyInput)));
        assert_eq!(results[2].as_ref().unwrap().label.as_str(), "b");
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        struct Wide;
        impl Vectorizer for Wide {
            fn dimension(&self) -> usize {
                3
            }
            fn transform(&self, _: &str) -> FeatureVector {
                FeatureVector::zeros(3)
            }
        }
        let err = ModelBundle::new(
            NormalizationProfile::default(),
            Box::new(Wide),
            Box::new(Share {
                classes: vec!["b".into(), "a".into()],
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expects 2 features"));
    }

    #[test]
    fn pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
