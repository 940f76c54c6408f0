//! Aggregation, thresholds, options and model integration tests.

mod common;

use approx::assert_relative_eq;
use common::{cloud_with_outlier, line_fit_data, single_column};
use faer::{Col, Mat};
use regress_outliers::prelude::*;
use serde_json::json;

fn checker(methods: Vec<Method>) -> OutlierChecker {
    OutlierChecker::builder()
        .methods(methods)
        .verbose(false)
        .build()
        .expect("valid options")
}

// ============================================================================
// Composite score
// ============================================================================

#[test]
fn test_composite_is_mean_of_method_flags() {
    let x = cloud_with_outlier(80, 2, 6.0, 11);
    let result = checker(vec![
        Method::Zscore,
        Method::ZscoreRobust,
        Method::Iqr,
        Method::Mahalanobis,
        Method::Lof,
    ])
    .check_matrix(&x)
    .unwrap();

    let table = result.table();
    let m = table.scores.len() as f64;
    for i in 0..result.len() {
        let flagged = table.scores.iter().filter(|s| s.outlier[i]).count() as f64;
        assert_relative_eq!(result.composite()[i], flagged / m, epsilon = 1e-15);
        assert_eq!(result.flags()[i], flagged / m > 0.5);
    }
    assert!(result.is_outlier(79));
}

#[test]
fn test_tie_at_one_half_is_not_flagged() {
    let x = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let result = OutlierChecker::builder()
        .methods(vec![Method::Zscore, Method::Iqr])
        .thresholds(ThresholdOverride::from_pairs(&[("zscore", 3.0)]).unwrap())
        .verbose(false)
        .build()
        .unwrap()
        .check_matrix(&x)
        .unwrap();
    assert_eq!(result.table().outlier(Method::Iqr).unwrap()[4], true);
    assert_eq!(result.table().outlier(Method::Zscore).unwrap()[4], false);
    assert_eq!(result.composite()[4], 0.5);
    assert!(!result.is_outlier(4));
}

#[test]
fn test_table_column_names() {
    let x = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let result = checker(vec![Method::ZscoreRobust, Method::Iqr]).check_matrix(&x).unwrap();
    assert_eq!(
        result.table().column_names(),
        vec![
            "Distance_Zscore_robust",
            "Outlier_Zscore_robust",
            "Distance_IQR",
            "Outlier_IQR",
            "Outlier"
        ]
    );
}

// ============================================================================
// Thresholds
// ============================================================================

#[test]
fn test_uniform_override_applies_to_every_method() {
    let x = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let methods = vec![Method::Zscore, Method::ZscoreRobust, Method::Iqr, Method::Mahalanobis];
    let result = OutlierChecker::builder()
        .methods(methods.clone())
        .threshold(2.0)
        .verbose(false)
        .build()
        .unwrap()
        .check_matrix(&x)
        .unwrap();

    for m in methods {
        assert_eq!(result.thresholds().get(m), Some(2.0), "{m}");
    }
    // z(100) = 1.9994 is below the overridden cutoff.
    assert_eq!(result.table().outlier(Method::Zscore).unwrap()[4], false);
}

#[test]
fn test_default_thresholds_depend_on_shape() {
    let table = ThresholdTable::defaults(100, 2);
    assert_relative_eq!(table.get(Method::Mahalanobis).unwrap(), 7.377759, epsilon = 1e-5);
    assert_relative_eq!(table.get(Method::Zscore).unwrap(), 1.959964, epsilon = 1e-5);
    assert_eq!(table.get(Method::Optics), Some(4.0));
    assert_eq!(table.get(Method::Iqr), Some(1.5));
}

#[test]
fn test_threshold_override_parsing() {
    assert_eq!(
        ThresholdOverride::from_json(&json!(2)).unwrap(),
        ThresholdOverride::Uniform(2.0)
    );
    let per = ThresholdOverride::from_json(&json!({"zscore": 3, "iqr": 2.5})).unwrap();
    let mut table = ThresholdTable::defaults(10, 1);
    table.apply(&per);
    assert_eq!(table.get(Method::Zscore), Some(3.0));
    assert_eq!(table.get(Method::Iqr), Some(2.5));

    assert!(matches!(
        ThresholdOverride::from_json(&json!("high")),
        Err(OutlierError::MalformedThresholds { .. })
    ));
    assert!(matches!(
        ThresholdOverride::from_json(&json!({"zcore": 3})),
        Err(OutlierError::UnknownThresholdKey { key }) if key == "zcore"
    ));
}

#[test]
fn test_out_of_range_threshold_fails_fast() {
    let x = single_column(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let err = OutlierChecker::builder()
        .methods(vec![Method::Zscore, Method::Hdi])
        .threshold(2.0)
        .build()
        .unwrap()
        .check_matrix(&x)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.method(), Some(Method::Hdi));
}

// ============================================================================
// Method selection and options
// ============================================================================

#[test]
fn test_unknown_method_name() {
    let err = "zsocre".parse::<Method>().unwrap_err();
    assert!(matches!(&err, OutlierError::UnknownMethod { name } if name == "zsocre"));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(MethodSelection::parse(&["iqr", "all"]).unwrap(), MethodSelection::All);
}

#[test]
fn test_options_from_json() {
    let options = OutlierOptions::from_json(
        r#"{
            "methods": ["zscore", "iqr"],
            "thresholds": {"zscore": 3.0},
            "verbose": false,
            "parallel": false,
            "seed": 7
        }"#,
    )
    .unwrap();
    assert_eq!(options.methods, MethodSelection::Methods(vec![Method::Zscore, Method::Iqr]));
    assert!(!options.parallel);
    assert_eq!(options.seed, 7);
    assert_eq!(options.ics_simulations, 200);

    let all = OutlierOptions::from_json(r#"{"methods": "all"}"#).unwrap();
    assert_eq!(all.methods, MethodSelection::All);

    assert!(OutlierOptions::from_json(r#"{"percentage_central": 0.2}"#).is_err());
}

#[test]
fn test_options_json_reports_unknown_threshold_key() {
    let err = OutlierOptions::from_json(r#"{"methods": "all", "thresholds": {"zcore": 2}}"#)
        .unwrap_err();
    assert!(err.to_string().contains("zcore"), "{err}");
    assert_eq!(OutlierError::from(err).kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_detect_outliers_on_dataset() {
    let data = Dataset::new()
        .with_numeric("x", vec![1.0, 2.0, 3.0, 4.0, 100.0])
        .unwrap()
        .with_categorical("label", vec!["a".into(); 5])
        .unwrap()
        .with_logical("used", vec![true; 5])
        .unwrap();
    let options = OutlierOptions::builder()
        .methods(vec![Method::Zscore, Method::Iqr])
        .verbose(false)
        .build()
        .unwrap();
    let result = detect_outliers(OutlierInput::Data(&data), &options)
        .unwrap()
        .unwrap();
    assert_eq!(result.variables(), &["x".to_string()]);
    assert_eq!(result.outlier_indices(), vec![4]);

    let text = result.to_string();
    assert!(text.starts_with("1 outlier detected: cases 5."));
    assert!(text.contains("zscore (1.960), iqr (1.5)"));
}

// ============================================================================
// Optional dependencies
// ============================================================================

#[test]
fn test_unavailable_dependency_omits_detector() {
    let x = cloud_with_outlier(60, 2, 8.0, 4);
    let registry = DetectorRegistry::from_disable_list("density-clustering");
    let result = OutlierChecker::builder()
        .methods(vec![Method::Mahalanobis, Method::Lof, Method::Iqr])
        .registry(registry)
        .verbose(false)
        .build()
        .unwrap()
        .check_matrix(&x)
        .unwrap();

    assert_eq!(result.methods(), &[Method::Mahalanobis, Method::Iqr]);
    assert!(!result
        .table()
        .column_names()
        .iter()
        .any(|c| c.ends_with("_LOF")));
    assert!(result.warnings().iter().any(|w| w.contains("lof")));
    let table = result.table();
    for i in 0..result.len() {
        let flagged = table.scores.iter().filter(|s| s.outlier[i]).count() as f64;
        assert_relative_eq!(result.composite()[i], flagged / 2.0);
    }
}

// ============================================================================
// Fitted models
// ============================================================================

#[test]
fn test_linear_model_cook() {
    let (x, residuals) = line_fit_data(25);
    let fit = LinearModelFit::new(x, residuals, true).unwrap();
    let result = checker(vec![Method::Cook]).check_model(&fit).unwrap().unwrap();
    assert_eq!(result.methods(), &[Method::Cook]);
    assert_eq!(result.outlier_indices(), vec![24]);
}

#[test]
fn test_bayesian_model_pareto() {
    let x = Mat::from_fn(6, 2, |i, j| (i + j) as f64);
    let k = Col::from_fn(6, |i| [0.2, 0.1, 0.95, 0.3, 0.69, 0.72][i]);
    let fit = BayesianModelFit::new(x, k).unwrap();
    assert!(fit.is_bayesian());
    let result = checker(vec![Method::Pareto]).check_model(&fit).unwrap().unwrap();
    assert_eq!(result.outlier_indices(), vec![2, 5]);
}

#[test]
fn test_model_detector_on_wrong_model_is_a_warning() {
    let (x, residuals) = line_fit_data(25);
    let fit = LinearModelFit::new(x, residuals, true).unwrap();
    let result = checker(vec![Method::Pareto, Method::Zscore])
        .check_model(&fit)
        .unwrap()
        .unwrap();
    assert_eq!(result.methods(), &[Method::Zscore]);
    assert!(result.warnings()[0].contains("pareto"));
}

#[test]
fn test_unsupported_model_returns_nothing() {
    let model = UnsupportedModel::new(
        "glmmTMB",
        "zero-inflated models have no outlier diagnostics",
    );
    let options = OutlierOptions::builder().verbose(false).build().unwrap();
    assert!(detect_outliers(OutlierInput::Model(&model), &options)
        .unwrap()
        .is_none());
}
