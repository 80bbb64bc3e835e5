use super::*;

#[test]
fn persistence_backend_names_parse_case_insensitively() {
    assert_eq!(
        parse_persistence_backend("Memory"),
        Some(PersistenceBackendMode::Memory)
    );
    assert_eq!(
        parse_persistence_backend(" valkey "),
        Some(PersistenceBackendMode::Valkey)
    );
    assert_eq!(
        parse_persistence_backend("redis"),
        Some(PersistenceBackendMode::Valkey)
    );
    assert_eq!(
        parse_persistence_backend("none"),
        Some(PersistenceBackendMode::Disabled)
    );
    assert_eq!(parse_persistence_backend("sqlite"), None);
}
