//! Output formatting for the CLI

use crate::resource::{ColumnDef, Resource};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::{Map, Value};

/// How results are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// Selected fields as JSON
    Json,
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Selected fields of one resource as a JSON object keyed by column header
pub fn select_fields(resource: &Resource, fields: &[ColumnDef]) -> Value {
    let mut selected = Map::new();
    for field in fields {
        let value = resource.lookup(&field.json_path).cloned().unwrap_or(Value::Null);
        selected.insert(field.header.clone(), value);
    }
    Value::Object(selected)
}

/// Two-column Property/Value rendering of one resource
pub fn render_dict(resource: &Resource, fields: &[ColumnDef], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Property", "Value"]);
            for field in fields {
                table.add_row(vec![field.header.clone(), resource.display(&field.json_path)]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&select_fields(resource, fields)).unwrap_or_default()
        }
    }
}

/// One row per resource, one column per field
pub fn render_list(resources: &[Resource], fields: &[ColumnDef], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(fields.iter().map(|f| f.header.as_str()).collect::<Vec<_>>());
            for resource in resources {
                table.add_row(
                    fields
                        .iter()
                        .map(|f| resource.display(&f.json_path))
                        .collect::<Vec<_>>(),
                );
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<Value> = resources
                .iter()
                .map(|r| select_fields(r, fields))
                .collect();
            serde_json::to_string_pretty(&rows).unwrap_or_default()
        }
    }
}

pub fn print_dict(resource: &Resource, fields: &[ColumnDef], format: OutputFormat) {
    println!("{}", render_dict(resource, fields, format));
}

pub fn print_list(resources: &[Resource], fields: &[ColumnDef], format: OutputFormat) {
    println!("{}", render_list(resources, fields, format));
}

/// Print log entries one message per line, oldest first
pub fn print_logs(entries: &[Resource], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            for entry in entries {
                let timestamp = entry.display("created_at");
                let message = entry.display("message");
                if timestamp.is_empty() {
                    println!("{}", message);
                } else {
                    println!("{} {}", timestamp, message);
                }
            }
        }
        OutputFormat::Json => {
            let values: Vec<&Resource> = entries.iter().collect();
            println!("{}", serde_json::to_string_pretty(&values).unwrap_or_default());
        }
    }
}
