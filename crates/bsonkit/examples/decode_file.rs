//! Simple decoder to inspect BSON files.

use std::fs;

use bsonkit::{decode_document, write_text, ElementType, JsonWriterSettings, Value, SHELL};

fn tally(value: &Value, counts: &mut Vec<(ElementType, usize)>) {
    let kind = value.element_type();
    match counts.iter_mut().find(|(k, _)| *k == kind) {
        Some((_, n)) => *n += 1,
        None => counts.push((kind, 1)),
    }
    match value {
        Value::Document(inner) => {
            for (_, child) in inner {
                tally(child, counts);
            }
        }
        Value::Array(items) => {
            for item in items {
                tally(item, counts);
            }
        }
        Value::JavaScriptWithScope(code) => {
            for (_, child) in &code.scope {
                tally(child, counts);
            }
        }
        _ => {}
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 80 {
        let cut: String = text.chars().take(77).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample.bson".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let document = decode_document(&data).expect("Failed to decode");

    println!("\n=== Elements ({} top-level) ===", document.len());
    let mut counts = Vec::new();
    for (_, value) in &document {
        tally(value, &mut counts);
    }
    for (kind, count) in &counts {
        println!("  {:?}: {}", kind, count);
    }

    println!("\n=== First 20 Entries ===");
    for (i, (name, value)) in document.iter().take(20).enumerate() {
        println!("[{}] {} = {}", i, name, preview(value));
    }
    if document.len() > 20 {
        println!("... and {} more entries", document.len() - 20);
    }

    let mut settings = JsonWriterSettings::shell();
    settings.set_indent(true).expect("settings are unfrozen");
    println!("\n=== Document ===");
    println!("{}", write_text(&document, &SHELL, &settings));
}
