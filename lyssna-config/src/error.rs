//! Errors raised while loading `LyssnaConfig`.

use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// One line per rejected setting, named by its dotted path.
    #[error("invalid lyssna configuration:\n{}", describe(.0))]
    Validation(#[source] ValidationErrors),

    #[error("could not read lyssna configuration: {0}")]
    Parsing(#[from] figment::Error),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect("", errors, &mut lines);
    lines.sort();
    lines.join("\n")
}

fn collect(section: &str, errors: &ValidationErrors, lines: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        // Struct-level checks report under `__all__`; they belong to the section.
        let path = match (section, field.as_ref()) {
            ("", "__all__") => "config".to_string(),
            (_, "__all__") => section.to_string(),
            ("", field) => field.to_string(),
            (_, field) => format!("{section}.{field}"),
        };
        match kind {
            ValidationErrorsKind::Field(errors) => {
                lines.extend(errors.iter().map(|e| format!("  {path}: {}", explain(e))));
            }
            ValidationErrorsKind::Struct(nested) => collect(&path, nested, lines),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(&format!("{path}[{index}]"), nested, lines);
                }
            }
        }
    }
}

fn explain(error: &ValidationError) -> String {
    match error.code.as_ref() {
        "replay_file_required" => "mode `replay` needs `capture.replay_file`".into(),
        "invalid_capture_mode" => "mode must be `pcap` or `replay`".into(),
        "invalid_interface" => "not a valid interface name".into(),
        "invalid_log_level" => "expected trace, debug, info, warn or error".into(),
        "range" => match (error.params.get("min"), error.params.get("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            _ => "out of range".into(),
        },
        code => error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| code.to_string()),
    }
}
