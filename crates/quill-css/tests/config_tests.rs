//! Tests for deserializing and building `InlinerConfig`.

use quill_css::InlinerConfig;

#[test]
fn test_empty_json_gives_defaults() {
    let config: InlinerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, InlinerConfig::default());
}

#[test]
fn test_partial_json_overrides_only_given_fields() {
    let config: InlinerConfig = serde_json::from_str(
        r##"{"excluded_selectors": [".keep", "#raw"], "keep_uninlinable_rules": false}"##,
    )
    .unwrap();
    assert_eq!(config.excluded_selectors, vec![".keep", "#raw"]);
    assert!(!config.keep_uninlinable_rules);
    assert!(config.parse_style_blocks);
    assert_eq!(config.allowed_media_types, vec!["all", "screen", "print"]);
}

#[test]
fn test_round_trip_through_json() {
    let config = InlinerConfig::default()
        .exclude_selector("table.layout")
        .allow_media_type("speech")
        .disallow_media_type("print");
    let json = serde_json::to_string(&config).unwrap();
    let back: InlinerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
    assert_eq!(back.allowed_media_types, vec!["all", "screen", "speech"]);
}

#[test]
fn test_wrong_field_type_is_rejected() {
    let result: Result<InlinerConfig, _> = serde_json::from_str(r#"{"parse_style_blocks": "yes"}"#);
    assert!(result.is_err());
}
