use std::io;

use sciforge_hooks::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }
}

#[test]
fn test_toml_error_conversion() {
    let toml_err = toml::from_str::<toml::Table>("[unclosed").unwrap_err();
    let err: Error = toml_err.into();
    assert!(matches!(err, Error::TomlError(_)));
}

#[test]
fn test_error_display() {
    let err = Error::ContextError("no generation context was provided".to_string());
    assert_eq!(err.to_string(), "Context error: no generation context was provided.");

    let err = Error::MetadataError("'cpu' is not a table".to_string());
    assert_eq!(err.to_string(), "Metadata error: 'cpu' is not a table.");
}

#[test]
fn test_malformed_context_is_a_context_error() {
    use sciforge_hooks::context::HookInput;

    for content in ["{\"context\": [", "project_name: [unclosed"] {
        let err = HookInput::parse(content).unwrap_err();
        assert!(matches!(err, Error::ContextError(_)), "{content}: {err}");
        assert!(err.to_string().starts_with("Context error: Invalid context format"));
    }
}
