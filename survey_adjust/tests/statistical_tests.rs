use nalgebra::{DMatrix, DVector};
use survey_adjust::surveying::{
    Adjustment, BetaMeaning, DataSnooping, GlobalTest, QualityConfig, QualityReport, TauTest,
};
use survey_adjust::AdjustError;

#[test]
fn global_test_scenario() {
    let test = GlobalTest::new(1.0, 1.0, 10, 0.05).unwrap();
    assert!(test.passes());
    assert!(test.minimum() < 1.0 && 1.0 < test.maximum());
}

#[test]
fn global_test_is_strict_at_bounds() {
    let probe = GlobalTest::new(2.0, 1.5, 12, 0.05).unwrap();
    for bound in [probe.minimum(), probe.maximum()] {
        assert!(!GlobalTest::new(bound, 1.5, 12, 0.05).unwrap().passes());
    }
    let middle = 0.5 * (probe.minimum() + probe.maximum());
    assert!(GlobalTest::new(middle, 1.5, 12, 0.05).unwrap().passes());
}

#[test]
fn zero_residual_never_fails() {
    let v = DVector::from_vec(vec![0.0]);
    let q = DMatrix::from_element(1, 1, 1.0);
    let tau = TauTest::new(1.0, &v, &q, 0.05, 1).unwrap();
    assert_eq!(tau.results(), &[true]);
    let snooping = DataSnooping::new(1.0, &v, &q, &q, 0.05, 0.8).unwrap();
    assert_eq!(snooping.results(), &[true]);
}

#[test]
fn tests_are_idempotent() {
    let v = DVector::from_vec(vec![0.3, -1.4, 2.9, 0.05]);
    let qv = DMatrix::from_diagonal(&DVector::from_vec(vec![0.6, 0.8, 0.7, 0.5]));
    let ql = DMatrix::identity(4, 4);
    let r = qv.clone();
    let tau_a = TauTest::new(1.1, &v, &qv, 0.05, 4).unwrap();
    let tau_b = TauTest::new(1.1, &v, &qv, 0.05, 4).unwrap();
    assert_eq!(tau_a.results(), tau_b.results());
    assert_eq!(tau_a.statistics(), tau_b.statistics());
    let ds_a = DataSnooping::new(1.0, &v, &ql, &r, 0.05, 0.8).unwrap();
    let ds_b = DataSnooping::new(1.0, &v, &ql, &r, 0.05, 0.8).unwrap();
    assert_eq!(ds_a, ds_b);
}

#[test]
fn out_of_range_parameters() {
    let v = DVector::from_vec(vec![0.1, 0.2]);
    let q = DMatrix::identity(2, 2);
    assert!(matches!(
        TauTest::new(1.0, &v, &q, 0.05, 0),
        Err(AdjustError::Range { name: "f", .. })
    ));
    assert!(matches!(
        DataSnooping::new(1.0, &v, &q, &q, 1.0, 0.8),
        Err(AdjustError::Range { name: "alpha", .. })
    ));
    assert!(matches!(
        GlobalTest::new(1.0, 1.0, 3, 0.0),
        Err(AdjustError::Range { name: "alpha", .. })
    ));
}

#[test]
fn tests_do_not_touch_the_adjustment() {
    let a = DMatrix::from_element(6, 1, 1.0);
    let p = DMatrix::identity(6, 6);
    let f = DVector::from_vec(vec![0.01, -0.02, 0.015, 0.0, -0.01, 0.005]);
    let adj = Adjustment::regular(&a, &p, &f).unwrap();
    let before = adj.summary();

    let config = QualityConfig::from_json(
        r#"{"sigma0_squared": 0.0001, "alpha": 0.05, "beta": 0.2, "beta_meaning": "type_ii_error"}"#,
    )
    .unwrap();
    assert_eq!(config.beta_meaning, BetaMeaning::TypeIIError);
    let report = QualityReport::evaluate(&adj, &config).unwrap();
    assert_eq!(adj.summary(), before);
    assert_eq!(report.summary, before);
    assert_eq!(report.tau.results().len(), 6);
    assert_eq!(report.data_snooping.results().len(), 6);
    assert!(report.suspect_observations().is_empty());

    let again = QualityReport::evaluate(&adj, &config).unwrap();
    assert_eq!(report, again);
}
