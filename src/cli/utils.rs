use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Envelope printed for `--json`, shaped like the server's success body
pub fn success_envelope(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });
    if let Some(data) = data {
        response["data"] = data;
    }
    response
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_envelope(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message
                }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "success": true, "data": { collection_name: [] } }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Left-aligned text table; columns are sized to their widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.push("-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_data_only_when_given() {
        assert_eq!(success_envelope("done", None), json!({ "success": true, "message": "done" }));
        assert_eq!(
            success_envelope("done", Some(json!({ "id": 1 })))["data"],
            json!({ "id": 1 })
        );
    }

    #[test]
    fn table_columns_fit_widest_cell() {
        let table = render_table(
            &["SLUG", "NAME"],
            &[
                vec!["acme".to_string(), "Acme Corp".to_string()],
                vec!["globex-corporation".to_string(), "Globex".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "SLUG                NAME");
        assert_eq!(lines[2], "acme                Acme Corp");
        assert_eq!(lines[3], "globex-corporation  Globex");
        assert_eq!(lines[1].len(), 18 + 2 + 9);
    }
}
