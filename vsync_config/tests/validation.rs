use rstest::rstest;
use vsync_config::{Tunables, load_toml};

#[test]
fn parses_full_table() {
    let t = load_toml(
        r#"
history_size = 10
min_samples = 6
outlier_tolerance_percent = 25
"#,
    )
    .unwrap();
    assert_eq!(t.history_size, 10);
    assert_eq!(t.min_samples, 6);
    assert_eq!(t.outlier_tolerance_percent, 25);
    t.validate().unwrap();
}

#[test]
fn partial_table_fills_defaults() {
    let t = load_toml("history_size = 32\n").unwrap();
    assert_eq!(t.history_size, 32);
    assert_eq!(t.min_samples, Tunables::default().min_samples);
}

#[test]
fn unknown_types_are_rejected() {
    assert!(load_toml("history_size = \"lots\"\n").is_err());
}

#[rstest]
#[case::min_samples_too_small(Tunables { min_samples: 1, ..Tunables::default() })]
#[case::history_below_min(Tunables { history_size: 4, min_samples: 6, ..Tunables::default() })]
#[case::zero_tolerance(Tunables { outlier_tolerance_percent: 0, ..Tunables::default() })]
#[case::tolerance_half_period(Tunables { outlier_tolerance_percent: 50, ..Tunables::default() })]
fn invalid_tunables_fail_validation(#[case] t: Tunables) {
    assert!(t.validate().is_err());
}

#[rstest]
#[case(Tunables::default())]
#[case(Tunables { history_size: 6, min_samples: 6, outlier_tolerance_percent: 25 })]
#[case(Tunables { history_size: 64, min_samples: 2, outlier_tolerance_percent: 1 })]
#[case(Tunables { outlier_tolerance_percent: 49, ..Tunables::default() })]
fn valid_tunables_pass_validation(#[case] t: Tunables) {
    t.validate().unwrap();
}
