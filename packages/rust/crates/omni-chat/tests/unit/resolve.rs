use super::*;

const UNSET_ENV: &str = "OMNI_CHAT_TEST_KNOB_NEVER_SET";

#[test]
fn cli_value_wins_over_settings_and_default() {
    assert_eq!(
        resolve_string(Some("cli".to_string()), UNSET_ENV, Some("file"), "default"),
        "cli"
    );
    assert_eq!(resolve_positive_u64(Some(7), UNSET_ENV, Some(9), 300), 7);
}

#[test]
fn blank_or_zero_values_fall_through() {
    assert_eq!(
        resolve_string(Some("  ".to_string()), UNSET_ENV, Some("  "), "default"),
        "default"
    );
    assert_eq!(
        resolve_string(None, UNSET_ENV, Some(" file "), "default"),
        "file"
    );
    assert_eq!(resolve_positive_u64(Some(0), UNSET_ENV, Some(0), 300), 300);
    assert_eq!(resolve_positive_u64(None, UNSET_ENV, Some(45), 300), 45);
}

#[test]
fn concurrency_limit_is_optional() {
    assert_eq!(resolve_optional_positive_usize(None, UNSET_ENV, None), None);
    assert_eq!(
        resolve_optional_positive_usize(Some(0), UNSET_ENV, Some(3)),
        Some(3)
    );
    assert_eq!(
        resolve_optional_positive_usize(Some(2), UNSET_ENV, Some(3)),
        Some(2)
    );
}

#[test]
fn unset_env_parses_to_none() {
    assert_eq!(parse_positive_u64_from_env(UNSET_ENV), None);
    assert_eq!(parse_temperature_from_env(UNSET_ENV), None);
    assert_eq!(parse_bool_from_env(UNSET_ENV), None);
}
