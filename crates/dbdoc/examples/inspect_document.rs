//! Simple decoder to inspect an encoded document file.

use std::fs;

use dbdoc::{Document, DocumentCodec, Value, ValueKind};

fn format_value(v: &Value) -> String {
    match v {
        Value::String(s) => {
            let preview: String = s.chars().take(80).collect();
            if s.chars().count() > 80 {
                format!("\"{}...\"", preview)
            } else {
                format!("\"{}\"", preview)
            }
        }
        Value::Binary(b) => format!("BINARY[{}]", b.len()),
        Value::ObjectId(id) => format!("ObjectId({})", id),
        Value::Document(d) => format!("{{...{} fields}}", d.len()),
        Value::Array(items) => format!("[...{} items]", items.len()),
        other => other.to_string(),
    }
}

fn print_fields(doc: &Document, indent: usize) {
    for (name, value) in doc {
        println!("{:indent$}{} ({:?}) = {}", "", name, value.kind(), format_value(value));
        match value {
            Value::Document(inner) => print_fields(inner, indent + 2),
            Value::Array(items) => {
                for (i, item) in items.iter().take(10).enumerate() {
                    println!("{:width$}[{}] = {}", "", i, format_value(item), width = indent + 2);
                    if let Value::Document(inner) = item {
                        print_fields(inner, indent + 4);
                    }
                }
                if items.len() > 10 {
                    println!("{:width$}... and {} more items", "", items.len() - 10, width = indent + 2);
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "document.bin".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let codec = DocumentCodec::default();
    let doc = codec.decode_from_slice(&data).expect("Failed to decode");

    println!("\n=== Document ({} fields) ===", doc.len());
    match codec.get_document_id(&doc) {
        Ok(id) if id.kind() == ValueKind::ObjectId => println!("_id: {} (generated)", id),
        Ok(id) => println!("_id: {}", format_value(id)),
        Err(err) => println!("_id: {}", err),
    }

    println!("\n=== Fields ===");
    print_fields(&doc, 0);
}
