//! JSON I/O handling for CLI
//!
//! - Input: one JSON object per line
//! - Output: one JSON object per line
//! - UTF-8 only

use std::io::Write;

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};
use crate::model::{ParseError, Record};

/// Parse one input line into a record
pub fn parse_record(line: &str) -> CliResult<Record> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| CliError::invalid_input(format!("Malformed JSON: {}", e)))?;
    match value {
        Value::Object(record) => Ok(record),
        other => Err(CliError::invalid_input(format!("Expected a JSON object, got {}", other))),
    }
}

/// Write a success response line
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_json(out, &json!({ "status": "ok", "data": data }))
}

/// Write a validation failure line
pub fn write_parse_error<W: Write>(out: &mut W, err: &ParseError) -> CliResult<()> {
    let mut response = json!({
        "status": "error",
        "code": err.kind().code(),
        "message": err.message(),
    });
    if let Some(field) = err.field() {
        response["field"] = Value::from(field);
    }
    if !err.fields().is_empty() {
        response["fields"] = Value::from(err.fields().to_vec());
    }
    write_json(out, &response)
}

/// Write an input failure line
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_json(out, &json!({ "status": "error", "code": code, "message": message }))
}

/// Write a JSON value followed by a newline
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(buf: Vec<u8>) -> Vec<Value> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record(r#"{"a": 1}"#).unwrap()["a"], json!(1));
        assert_eq!(parse_record("[1]").unwrap_err().code_str(), "CLI_INVALID_INPUT");
        assert_eq!(parse_record("{").unwrap_err().code_str(), "CLI_INVALID_INPUT");
    }

    #[test]
    fn test_write_parse_error() {
        let mut buf = Vec::new();
        let err = ParseError::missing_required("User", vec!["username".into()]);
        write_parse_error(&mut buf, &err).unwrap();
        write_response(&mut buf, json!({ "x": 1 })).unwrap();

        let out = lines(buf);
        assert_eq!(out[0]["status"], "error");
        assert_eq!(out[0]["code"], "MISSING_REQUIRED_FIELDS");
        assert_eq!(out[0]["fields"], json!(["username"]));
        assert!(out[0].get("field").is_none());
        assert_eq!(out[1], json!({ "status": "ok", "data": { "x": 1 } }));
    }
}
