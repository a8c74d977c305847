use trial_core::errors::{ErrorInfo, TrialError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("resource", "conditions.csv")
        .with_context("phase", "parse")
}

#[test]
fn configuration_error_surface() {
    let err = TrialError::Configuration(sample_info("C001", "unknown method"));
    assert_eq!(err.info().code, "C001");
    assert!(err.info().context.contains_key("resource"));
}

#[test]
fn selection_error_surface() {
    let err = TrialError::SelectionSyntax(sample_info("S001", "bad range"));
    assert_eq!(err.info().code, "S001");
}

#[test]
fn unsupported_format_error_surface() {
    let err = TrialError::UnsupportedFormat(sample_info("F001", "no reader"));
    assert_eq!(err.info().code, "F001");
}

#[test]
fn import_error_carries_resource_phase_and_cause() {
    let err = TrialError::import("blocks.xlsx", "retrieve", "resource is not registered");
    let info = err.info();
    assert!(matches!(err, TrialError::Import(_)));
    assert_eq!(info.code, "import-retrieve");
    assert_eq!(info.context_value("resource"), Some("blocks.xlsx"));
    assert_eq!(info.context_value("phase"), Some("retrieve"));
    assert_eq!(info.cause.as_deref(), Some("resource is not registered"));
}

#[test]
fn display_renders_context_hint_and_cause() {
    let err = TrialError::Configuration(
        ErrorInfo::new("unknown-method", "unknown trial ordering method")
            .with_context("method", "staircase")
            .with_hint("use random")
            .with_cause("no such variant"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("configuration error: unknown trial ordering method"));
    assert!(rendered.contains("method=staircase"));
    assert!(rendered.contains("hint: use random"));
    assert!(rendered.contains("cause: no such variant"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = TrialError::selection("empty-term", "selection term is empty");
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "SelectionSyntax");
    assert_eq!(json["detail"]["code"], "empty-term");
    let back: TrialError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, err);
}
