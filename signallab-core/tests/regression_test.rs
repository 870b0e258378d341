//! Regression estimator end to end: CSV upload → fit → predict.

use signallab_core::regression::{
    FeatureTable, FeatureValue, PredictionRow, RegressionConfig, RegressionEstimator,
};
use signallab_core::{EngineError, SchemaError};

/// Houses with a noisy price: 100/sqft + 9000/bedroom + location premium.
fn houses_csv(rows: usize) -> String {
    let locations = ["downtown", "suburb", "rural", "lakeside"];
    let mut csv = String::from("sqft,bedrooms,location,price\n");
    for i in 0..rows {
        let sqft = 900 + (i * 53) % 1400;
        let bedrooms = 1 + (i * 7) % 5;
        let location = locations[(i * 3) % 4];
        let premium = match location {
            "downtown" => 40_000.0,
            "lakeside" => 25_000.0,
            "suburb" => 10_000.0,
            _ => 0.0,
        };
        let noise = ((i * 37) % 11) as f64 * 150.0 - 750.0;
        let price = 20_000.0 + 100.0 * sqft as f64 + 9_000.0 * bedrooms as f64 + premium + noise;
        csv.push_str(&format!("{sqft},{bedrooms},{location},{price}\n"));
    }
    csv
}

fn table(rows: usize) -> FeatureTable {
    FeatureTable::from_csv_reader(houses_csv(rows).as_bytes()).unwrap()
}

fn row(location: &str) -> PredictionRow {
    PredictionRow::new()
        .with("sqft", 1500.0)
        .with("bedrooms", 3.0)
        .with("location", location)
}

#[test]
fn fits_noisy_data_well() {
    let fitted = RegressionEstimator::default().fit(&table(80), "price").unwrap();
    let report = &fitted.report;

    assert_eq!(report.test_rows, 16);
    assert_eq!(report.train_rows, 64);
    assert!(report.r2 > 0.99, "r2 = {}", report.r2);
    assert!(report.rmse < 1_000.0, "rmse = {}", report.rmse);
    assert_eq!(report.held_out.len(), 16);
    assert!(report.dropped_features.is_empty());

    let sqft = report.coefficients.iter().find(|c| c.feature == "sqft").unwrap();
    assert!((sqft.value - 100.0).abs() < 2.0, "sqft coefficient {}", sqft.value);
}

#[test]
fn identical_runs_are_identical() {
    let t = table(60);
    let a = RegressionEstimator::default().fit(&t, "price").unwrap();
    let b = RegressionEstimator::default().fit(&t, "price").unwrap();

    assert_eq!(a.report.r2.to_bits(), b.report.r2.to_bits());
    assert_eq!(a.report.rmse.to_bits(), b.report.rmse.to_bits());
    let pa = a.model.predict(&row("suburb")).unwrap();
    let pb = b.model.predict(&row("suburb")).unwrap();
    assert_eq!(pa.to_bits(), pb.to_bits());
}

#[test]
fn seed_changes_the_split() {
    let t = table(60);
    let a = RegressionEstimator::default().fit(&t, "price").unwrap();
    let b = RegressionEstimator::new(RegressionConfig {
        seed: 7,
        ..RegressionConfig::default()
    })
    .fit(&t, "price")
    .unwrap();
    assert_ne!(a.report.held_out, b.report.held_out);
}

#[test]
fn unseen_category_matches_reference() {
    let fitted = RegressionEstimator::default().fit(&table(60), "price").unwrap();

    // Sorted categories: downtown, lakeside, rural, suburb. "downtown" is the reference.
    let names = fitted.model.feature_names();
    assert!(!names.iter().any(|n| n == "location_downtown"));
    assert!(!names.iter().any(|n| n == "location_mountain"));

    let reference = fitted.model.predict(&row("downtown")).unwrap();
    let unseen = fitted.model.predict(&row("mountain")).unwrap();
    assert_eq!(reference, unseen);
    assert_eq!(fitted.model.feature_names().len(), 5);
}

#[test]
fn encoder_is_frozen_at_fit_time() {
    let fitted = RegressionEstimator::default().fit(&table(60), "price").unwrap();
    let before = fitted.model.feature_names().to_vec();
    for location in ["downtown", "mountain", "suburb", "desert"] {
        fitted.model.predict(&row(location)).unwrap();
    }
    assert_eq!(fitted.model.feature_names(), before.as_slice());
}

#[test]
fn prediction_row_must_match_features() {
    let fitted = RegressionEstimator::default().fit(&table(40), "price").unwrap();

    let missing = PredictionRow::new().with("sqft", 1500.0).with("location", "rural");
    assert!(matches!(
        fitted.model.predict(&missing),
        Err(SchemaError::PredictionRowMismatch { .. })
    ));

    let extra = row("rural").with("garage", 1.0);
    assert!(fitted.model.predict(&extra).is_err());

    let target_included = row("rural").with("price", 1.0);
    assert!(fitted.model.predict(&target_included).is_err());
}

#[test]
fn default_row_with_overrides() {
    let fitted = RegressionEstimator::default().fit(&table(40), "price").unwrap();
    let mut row = fitted.model.default_row();
    assert!(matches!(row.get("location"), Some(FeatureValue::Category(_))));

    fitted.model.apply_override(&mut row, "sqft=2000").unwrap();
    let large = fitted.model.predict(&row).unwrap();
    fitted.model.apply_override(&mut row, "sqft=1000").unwrap();
    let small = fitted.model.predict(&row).unwrap();
    assert!(large > small);

    assert!(fitted.model.apply_override(&mut row, "sqft=big").is_err());
}

#[test]
fn schema_errors() {
    let err = RegressionEstimator::default()
        .fit(&table(20), "value")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Schema(SchemaError::MissingTarget { ref column }) if column == "value"
    ));

    let text_target = FeatureTable::from_csv_reader("a,b,c\n1,2,x\n3,4,y\n5,6,z\n".as_bytes()).unwrap();
    assert!(matches!(
        RegressionEstimator::default().fit(&text_target, "c"),
        Err(EngineError::Schema(SchemaError::NonNumericTarget { .. }))
    ));

    let unlisted = RegressionEstimator::new(RegressionConfig {
        categorical: Some(vec![]),
        ..RegressionConfig::default()
    });
    assert!(matches!(
        unlisted.fit(&table(20), "price"),
        Err(EngineError::Schema(SchemaError::NonNumericColumn { .. }))
    ));
}

#[test]
fn collinear_feature_is_reported() {
    let mut csv = String::from("a,b,twice_a,y\n");
    for i in 0..30 {
        let a = i as f64;
        let b = ((i * 7) % 5) as f64;
        csv.push_str(&format!("{a},{b},{},{}\n", 2.0 * a, 3.0 + a - 2.0 * b));
    }
    let table = FeatureTable::from_csv_reader(csv.as_bytes()).unwrap();
    let fitted = RegressionEstimator::default().fit(&table, "y").unwrap();

    assert_eq!(fitted.report.dropped_features, vec!["twice_a".to_string()]);
    assert!((fitted.report.r2 - 1.0).abs() < 1e-9);
}
