//! One-shot check of a JSON document, as used by `fieldcheck check`.

use std::io::Read;
use std::path::Path;

use fieldcheck_core::{validate_body, FieldSpec, ValidationResult};
use serde_json::{json, Value};

pub const EXIT_VALID: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_MALFORMED: u8 = 2;
pub const EXIT_IO: u8 = 3;

/// What to print and which status to exit with.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckReport {
    pub exit_code: u8,
    pub output: Value,
}

pub fn check(body: &[u8], spec: &FieldSpec) -> CheckReport {
    match validate_body(body, spec) {
        Ok((_, result)) => {
            let exit_code = match result {
                ValidationResult::Valid => EXIT_VALID,
                ValidationResult::Invalid { .. } => EXIT_INVALID,
            };
            let output = serde_json::to_value(&result)
                .unwrap_or_else(|e| json!({ "status": "error", "error": e.to_string() }));
            CheckReport { exit_code, output }
        }
        Err(e) => CheckReport {
            exit_code: EXIT_MALFORMED,
            output: json!({ "status": "malformed", "error": e.to_string() }),
        },
    }
}

/// Contents of `file`, or stdin when `file` is `None` or `-`.
pub fn read_input(file: Option<&Path>) -> std::io::Result<Vec<u8>> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read(path),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Read `file` and check it. Unreadable input exits with [`EXIT_IO`].
pub fn check_input(file: Option<&Path>, spec: &FieldSpec) -> CheckReport {
    match read_input(file) {
        Ok(body) => check(&body, spec),
        Err(e) => CheckReport {
            exit_code: EXIT_IO,
            output: json!({ "status": "error", "error": e.to_string() }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcheck_core::Presence;

    #[test]
    fn valid_document() {
        let report = check(br#"{"email":"test@example.com"}"#, &FieldSpec::new(["email"]));
        assert_eq!(report.exit_code, EXIT_VALID);
        assert_eq!(report.output, json!({"status": "valid"}));
    }

    #[test]
    fn missing_fields() {
        let report = check(
            br#"{"email":"a","phone":"b"}"#,
            &FieldSpec::new(["email", "phone", "fax"]),
        );
        assert_eq!(report.exit_code, EXIT_INVALID);
        assert_eq!(report.output["missing_fields"], json!(["fax"]));
    }

    #[test]
    fn malformed_document() {
        let report = check(br#"["not","an","object"]"#, &FieldSpec::new(["email"]));
        assert_eq!(report.exit_code, EXIT_MALFORMED);
        assert_eq!(report.output["status"], "malformed");
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let path = Path::new("/nonexistent/fieldcheck-input.json");
        assert!(read_input(Some(path)).is_err());
        let report = check_input(Some(path), &FieldSpec::new(["email"]));
        assert_eq!(report.exit_code, EXIT_IO);
        assert_eq!(report.output["status"], "error");
    }

    #[test]
    fn file_input_is_checked() {
        let path = std::env::temp_dir().join(format!("fieldcheck-check-{}.json", std::process::id()));
        std::fs::write(&path, br#"{"email":"a","phone":"b"}"#).unwrap();
        let report = check_input(Some(path.as_path()), &FieldSpec::new(["email", "fax"]));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(report.exit_code, EXIT_INVALID);
        assert_eq!(report.output["missing_fields"], json!(["fax"]));
    }

    #[test]
    fn policy_applies() {
        let spec = FieldSpec::new(["email"]).with_presence(Presence::KeyOnly);
        assert_eq!(check(br#"{"email":null}"#, &spec).exit_code, EXIT_VALID);
    }
}
