use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::ClientError;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Report a client error with its field errors, then hand it back so the
/// process exits non-zero
pub fn report_client_error(output_format: &OutputFormat, err: ClientError) -> anyhow::Error {
    match output_format {
        OutputFormat::Json => {
            let response = json!({
                "success": false,
                "error": err.user_message(),
                "error_code": err.error_code(),
                "errors": err.field_errors(),
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", err.user_message());
            for field in err.field_errors() {
                eprintln!("  {}: {}", field.field, field.message);
            }
        }
    }
    anyhow::Error::new(err)
}

/// Print rows as JSON or as text lines produced by `line`
pub fn output_rows<T, F>(
    output_format: &OutputFormat,
    collection_name: &str,
    rows: &[T],
    line: F,
) -> anyhow::Result<()>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: rows
            }))?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No {} found", collection_name);
            }
            for row in rows {
                println!("{}", line(row));
            }
        }
    }
    Ok(())
}

/// Print one record as JSON or as `label: value` pairs
pub fn output_record<T: Serialize>(
    output_format: &OutputFormat,
    record: &T,
    fields: &[(&str, String)],
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        OutputFormat::Text => {
            let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
            for (label, value) in fields {
                println!("{:width$}  {}", label, value, width = width);
            }
        }
    }
    Ok(())
}
