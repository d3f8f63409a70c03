//! Error taxonomy exercised through the public surface.

use std::error::Error;

use bloomlink::{
    compare, match_datasets, ColumnSpec, DataTable, EmbeddedDataset, Embedder, EmbedderConfig,
    EmbedderError, FeatureError, FeatureFactory, LinkageError, MatchError, MatchOptions,
    SerializationError,
};

fn table() -> DataTable {
    DataTable::from_rows(vec!["name"], vec![vec![Some("Laura Ochoa".into())]]).unwrap()
}

fn colspec() -> Vec<ColumnSpec> {
    vec![ColumnSpec::new("name", "name")]
}

#[test]
fn invalid_config_surfaces_structured_variants() {
    let factory = FeatureFactory::standard();

    assert!(matches!(
        Embedder::new(EmbedderConfig::default().with_filter_size(0), factory.clone()),
        Err(EmbedderError::InvalidConfigSize { m: 0 })
    ));
    assert!(matches!(
        Embedder::new(EmbedderConfig::default().with_num_hashes(0), factory.clone()),
        Err(EmbedderError::InvalidConfigHashes { k: 0 })
    ));
    assert!(matches!(
        Embedder::new(
            EmbedderConfig::default().with_threshold_quantile(2.0),
            factory
        ),
        Err(EmbedderError::InvalidConfigQuantile { .. })
    ));
}

#[test]
fn unknown_feature_type_reports_the_name() {
    let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap();
    let colspec = vec![ColumnSpec::new("name", "postcode")];
    let err = embedder.embed(&table(), &colspec, false).unwrap_err();

    match err {
        EmbedderError::Feature(FeatureError::UnknownFeatureType { name, .. }) => {
            assert_eq!(name, "postcode");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_field_value_names_the_column() {
    let records = vec![serde_json::json!({"name": {"first": "Laura"}})];
    let err = DataTable::from_json_records(&records).unwrap_err();
    match err {
        EmbedderError::Feature(FeatureError::InvalidFieldValue { column, found }) => {
            assert_eq!(column, "name");
            assert_eq!(found, "object");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn config_mismatch_returns_both_checksums() {
    let a = Embedder::new(
        EmbedderConfig::default().with_salt("a"),
        FeatureFactory::standard(),
    )
    .unwrap();
    let b = Embedder::new(
        EmbedderConfig::default().with_salt("b"),
        FeatureFactory::standard(),
    )
    .unwrap();

    let left = a.embed(&table(), &colspec(), true).unwrap();
    let right = b.embed(&table(), &colspec(), true).unwrap();

    match compare(&a, &left, &right).unwrap_err() {
        MatchError::ConfigMismatch { left, right } => {
            assert_ne!(left, right);
            assert_eq!(left.len(), 64);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_input_is_an_error_for_matching_only() {
    let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap();
    let empty_table = DataTable::new(vec!["name"]);
    let empty = embedder.embed(&empty_table, &colspec(), true).unwrap();
    let full = embedder.embed(&table(), &colspec(), true).unwrap();

    // Comparison tolerates the empty side.
    let sim = compare(&embedder, &empty, &full).unwrap();
    assert_eq!(sim.dims(), (0, 1));

    // Matching does not.
    let err = match_datasets(&sim, &MatchOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        LinkageError::Match(MatchError::EmptyInput { side: "left" })
    ));
}

#[test]
fn corrupt_dataset_reports_serialization_errors() {
    assert!(matches!(
        EmbeddedDataset::from_jsonl("no header here"),
        Err(SerializationError::Header)
    ));

    let future = "{\"version\":7,\"m\":1024,\"checksum\":\"x\"}\n";
    assert!(matches!(
        EmbeddedDataset::from_jsonl(future),
        Err(SerializationError::UnsupportedVersion { found: 7, .. })
    ));
}

#[test]
fn corrupt_blob_is_rejected_with_a_clear_kind() {
    let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap();
    let mut blob = embedder.to_blob().unwrap();

    // Flip payload bytes past the header; decompression or decoding fails.
    let len = blob.len();
    for byte in blob[len - 8..].iter_mut() {
        *byte ^= 0xFF;
    }
    let err = Embedder::from_blob(&blob).unwrap_err();
    assert!(matches!(err, EmbedderError::Serialization(_)));
}

#[test]
fn linkage_error_chains_to_the_source() {
    let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap();
    let bad_colspec = vec![ColumnSpec::new("name", "nope")];
    let err = bloomlink::embed_table(&embedder, &table(), &bad_colspec, true).unwrap_err();

    let mut chain = 0;
    let mut source: Option<&dyn Error> = Some(&err);
    while let Some(current) = source {
        chain += 1;
        source = current.source();
    }
    // LinkageError -> EmbedderError -> FeatureError
    assert!(chain >= 3, "expected a source chain, got depth {chain}");
    assert!(err.to_string().contains("embedding failure"));
}

#[test]
fn invalid_cutoff_rejected_before_assignment() {
    let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap();
    let dataset = embedder.embed(&table(), &colspec(), true).unwrap();
    let sim = compare(&embedder, &dataset, &dataset).unwrap();

    let err = sim
        .matching(&MatchOptions::new().with_abs_cutoff(1.5))
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidCutoff { .. }));
}
