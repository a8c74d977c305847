use trial_core::{Method, TrialError};

#[test]
fn method_parses_common_spellings() {
    assert_eq!("sequential".parse::<Method>().unwrap(), Method::Sequential);
    assert_eq!("Random".parse::<Method>().unwrap(), Method::Random);
    assert_eq!("fullRandom".parse::<Method>().unwrap(), Method::FullRandom);
    assert_eq!("full_random".parse::<Method>().unwrap(), Method::FullRandom);
    assert_eq!(" FULL-RANDOM ".parse::<Method>().unwrap(), Method::FullRandom);
}

#[test]
fn unknown_method_is_configuration_error() {
    let err = "staircase".parse::<Method>().unwrap_err();
    assert!(matches!(err, TrialError::Configuration(_)));
    assert_eq!(err.info().code, "unknown-method");
    assert_eq!(err.info().context_value("method"), Some("staircase"));
}

#[test]
fn method_display_roundtrips_through_from_str() {
    for method in Method::ALL {
        assert_eq!(method.to_string().parse::<Method>().unwrap(), method);
    }
    assert_eq!(Method::default(), Method::Random);
}

#[test]
fn method_serde_uses_snake_case_and_aliases() {
    assert_eq!(serde_json::to_string(&Method::FullRandom).unwrap(), "\"full_random\"");
    let parsed: Method = serde_json::from_str("\"fullRandom\"").unwrap();
    assert_eq!(parsed, Method::FullRandom);
}

#[test]
fn method_deserialization_matches_from_str() {
    for raw in ["\"FULL_RANDOM\"", "\"Full-Random\"", "\"full random\"", "\"fullrandom\""] {
        let parsed: Method = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, Method::FullRandom, "{raw}");
    }
    assert_eq!(serde_json::from_str::<Method>("\"SEQUENTIAL\"").unwrap(), Method::Sequential);
    assert!(serde_json::from_str::<Method>("\"staircase\"").is_err());
}
