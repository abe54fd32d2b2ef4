use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use finclass_core::model::ClassifierArtifact;
use finclass_core::{
    ClassifyError, ModelError, ModelStore, NormalizationProfile, Pipeline, ProfilePin, Stage,
};
use serde_json::{json, Value};

const DEMO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../models/demo");

const SAMPLE: &str = "I have been trying to contact the bank regarding a fraudulent charge \
                      on my card, but they keep ignoring me!";

fn demo() -> Pipeline {
    let bundle = ModelStore::open(DEMO).unwrap().load().unwrap();
    Pipeline::new(bundle)
}

/// Copies the demo bundle into a fresh directory.
fn copy_demo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in fs::read_dir(DEMO).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn edit_json(path: &Path, edit: impl FnOnce(&mut Value)) {
    let mut value: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    edit(&mut value);
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

#[test]
fn demo_profile_is_the_default_profile() {
    let manifest = ModelStore::open(DEMO).unwrap().manifest().unwrap();
    assert_eq!(manifest.profile, NormalizationProfile::default());
    assert_eq!(manifest.fingerprint, NormalizationProfile::default().fingerprint());
}

#[test]
fn sample_complaint_end_to_end() {
    let result = demo().run(SAMPLE).unwrap();

    assert_eq!(
        result.prepared.canonical,
        "contact bank fraudulent charge card ignore"
    );
    assert_eq!(result.label.as_str(), "credit_card");
    assert_eq!(result.ranked.len(), 5);
    assert_eq!(result.ranked[0].label, result.label);
    assert!(result.confidence() > 0.5);

    let total: f64 = result.ranked.iter().map(|r| r.probability).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert!(result
        .ranked
        .windows(2)
        .all(|w| w[0].probability >= w[1].probability));
}

#[test]
fn products_are_told_apart() {
    let pipeline = demo();
    let cases = [
        (
            "The debt collector keeps calling me at work and threatening a lawsuit",
            "debt_collection",
        ),
        (
            "Equifax reports an incorrect late payment on my credit report",
            "credit_reporting",
        ),
        ("My mortgage servicer mishandled the escrow account", "mortgage"),
        ("Overdraft fees on my checking account", "retail_banking"),
        ("I was charged a late fee twice on my CREDIT CARD", "credit_card"),
    ];
    for (text, expected) in cases {
        let result = pipeline.run(text).unwrap();
        assert_eq!(result.label.as_str(), expected, "{text:?}");
    }
}

#[test]
fn repeated_runs_are_identical() {
    let pipeline = demo();
    let first = pipeline.run(SAMPLE).unwrap();
    for _ in 0..10 {
        assert_eq!(pipeline.run(SAMPLE).unwrap(), first);
    }

    // A second, independently loaded pipeline agrees too.
    assert_eq!(demo().run(SAMPLE).unwrap(), first);
}

#[test]
fn masked_text_leaves_no_mask_fragments() {
    let result = demo()
        .run("On XX/XX/XXXX my account XXXX-XXXX was charged {$XXXX.XX} in fees")
        .unwrap();
    assert!(!result.prepared.normalized.contains("xx"));
    assert!(!result.prepared.canonical.contains("xx"));
    assert_eq!(result.prepared.normalized, "on my account was charged in fees");
}

#[test]
fn nothing_left_after_filtering() {
    let err = demo().run("the and a 123 !!! XXXX").unwrap_err();
    assert!(matches!(
        err,
        ClassifyError::InsufficientSignal { length: 0, min_length: 2 }
    ));
    assert_eq!(err.stage(), Stage::Filter);
    assert!(err.is_recoverable());
}

#[test]
fn blank_input_is_rejected() {
    let err = demo().run(" \n ").unwrap_err();
    assert!(matches!(err, ClassifyError::EmptyInput));
    assert_eq!(err.stage(), Stage::Input);
}

#[test]
fn unknown_vocabulary_still_gives_a_distribution() {
    let result = demo().run("zebra quartz xylophone").unwrap();
    assert_eq!(result.prepared.canonical, "zebra quartz xylophone");
    assert_eq!(result.ranked.len(), 5);
    let total: f64 = result.ranked.iter().map(|r| r.probability).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert!(result.ranked.iter().all(|r| r.probability > 0.0));
}

#[test]
fn shared_pipeline_across_threads() {
    let pipeline = Arc::new(demo());
    let expected = pipeline.run(SAMPLE).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                (0..25)
                    .map(|_| pipeline.run(SAMPLE).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for result in handle.join().unwrap() {
            assert_eq!(result, expected);
        }
    }
}

#[test]
fn tampered_profile_is_refused() {
    let dir = copy_demo();
    edit_json(&dir.path().join("manifest.json"), |manifest| {
        manifest["profile"]["min_token_len"] = json!(3);
    });

    let err = ModelStore::open(dir.path()).unwrap().load().unwrap_err();
    match &err {
        ModelError::ProfileMismatch { recorded, computed, .. } => {
            assert_eq!(recorded, &NormalizationProfile::default().fingerprint());
            assert_ne!(recorded, computed);
        }
        other => panic!("expected ProfileMismatch, got {other:?}"),
    }

    let err = ClassifyError::from(err);
    assert_eq!(err.stage(), Stage::Model);
    assert!(!err.is_recoverable());
}

#[test]
fn fingerprint_comparison_ignores_case() {
    let dir = copy_demo();
    edit_json(&dir.path().join("manifest.json"), |manifest| {
        let upper = manifest["fingerprint"].as_str().unwrap().to_uppercase();
        manifest["fingerprint"] = json!(upper);
    });
    assert!(ModelStore::open(dir.path()).unwrap().load().is_ok());
}

#[test]
fn profile_pin_is_enforced() {
    let ok: ProfilePin = "cfpb-lemma@1".parse().unwrap();
    assert!(ModelStore::open(DEMO).unwrap().with_pin(ok).load().is_ok());

    let newer: ProfilePin = "cfpb-lemma@2".parse().unwrap();
    let err = ModelStore::open(DEMO)
        .unwrap()
        .with_pin(newer)
        .load()
        .unwrap_err();
    assert!(matches!(err, ModelError::ProfilePin { .. }));
    assert!(err.to_string().contains("cfpb-lemma@1"));
}

#[test]
fn unsupported_format_version() {
    let dir = copy_demo();
    edit_json(&dir.path().join("manifest.json"), |manifest| {
        manifest["format_version"] = json!(99);
    });
    let err = ModelStore::open(dir.path()).unwrap().load().unwrap_err();
    assert!(matches!(
        err,
        ModelError::UnsupportedFormat { found: 99, supported: 1, .. }
    ));
}

#[test]
fn missing_artifacts_are_reported_by_path() {
    let err = ModelStore::open("/no/such/bundle").unwrap_err();
    assert!(matches!(err, ModelError::Missing { .. }));

    let dir = copy_demo();
    fs::remove_file(dir.path().join("classifier.json")).unwrap();
    let err = ModelStore::open(dir.path()).unwrap().load().unwrap_err();
    match err {
        ModelError::Missing { path } => assert!(path.ends_with("classifier.json")),
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[test]
fn corrupt_artifact_is_a_parse_error() {
    let dir = copy_demo();
    fs::write(dir.path().join("tfidf_vectorizer.json"), "{ not json").unwrap();
    let err = ModelStore::open(dir.path()).unwrap().load().unwrap_err();
    assert!(matches!(err, ModelError::Parse { .. }));
    assert!(err.path().ends_with("tfidf_vectorizer.json"));
}

#[test]
fn classifier_of_the_wrong_width_is_inconsistent() {
    let dir = copy_demo();
    edit_json(&dir.path().join("classifier.json"), |clf| {
        for row in clf["coef"].as_array_mut().unwrap() {
            row.as_array_mut().unwrap().pop();
        }
    });
    let err = ModelStore::open(dir.path()).unwrap().load().unwrap_err();
    assert!(matches!(err, ModelError::Inconsistent { .. }), "{err:?}");
}

/// Replaces the demo classifier with a two-tree forest splitting on one term.
fn forest_bundle(term: &str) -> tempfile::TempDir {
    let dir = copy_demo();
    let vectorizer: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("tfidf_vectorizer.json")).unwrap(),
    )
    .unwrap();
    let n_features = vectorizer["vocabulary"].as_object().unwrap().len();
    let feature = vectorizer["vocabulary"][term].as_u64().unwrap();

    let tree = json!({
        "feature": [feature, -2, -2],
        "threshold": [0.0, -2.0, -2.0],
        "left": [1, -1, -1],
        "right": [2, -1, -1],
        "value": [[5.0, 5.0], [1.0, 3.0], [4.0, 0.0]],
    });
    let forest = json!({
        "kind": "forest",
        "classes": ["mortgage", "other"],
        "n_features": n_features,
        "trees": [tree.clone(), tree],
    });
    // Round-trip through the typed artifact so the fixture matches the reader.
    let artifact: ClassifierArtifact = serde_json::from_value(forest).unwrap();
    fs::write(
        dir.path().join("classifier.json"),
        serde_json::to_string(&artifact).unwrap(),
    )
    .unwrap();
    dir
}

#[test]
fn forest_bundle_classifies() {
    let dir = forest_bundle("escrow");
    let pipeline = Pipeline::new(ModelStore::open(dir.path()).unwrap().load().unwrap());

    let hit = pipeline.run("They lost my escrow payment").unwrap();
    assert_eq!(hit.label.as_str(), "mortgage");
    assert!((hit.confidence() - 1.0).abs() < 1e-12);

    let miss = pipeline.run("They lost my deposit").unwrap();
    assert_eq!(miss.label.as_str(), "other");
    assert!((miss.confidence() - 0.75).abs() < 1e-12);
}
