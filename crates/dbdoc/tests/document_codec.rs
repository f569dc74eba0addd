//! End-to-end behavior of the document codec: identity policy, hook scoping
//! and nested round trips through the binary format.

use std::sync::Arc;

use dbdoc::codec::{transform, TreeWriter};
use dbdoc::{
    Document, DocumentCodec, EncoderContext, HookError, ObjectId, TransformerRegistry, Value,
    ValueKind,
};

fn stringify(v: Value) -> Result<Value, HookError> {
    Ok(Value::String(v.to_string()))
}

/// Saves then reloads a document, the way a collection round trip would.
fn save_and_load(codec: &DocumentCodec, doc: &mut Document) -> Document {
    let bytes = codec.encode_to_vec(doc, EncoderContext::collectible()).unwrap();
    codec.decode_from_slice(&bytes).unwrap()
}

#[test]
fn test_respects_encode_id_first_property() {
    let codec = DocumentCodec::default();
    let mut doc = Document::new().append("x", 2).append("_id", 2);

    let mut sink = TreeWriter::new();
    let ctx = EncoderContext::builder()
        .is_encoding_collectible_document(true)
        .build();
    codec.encode(&mut sink, &mut doc, ctx).unwrap();
    let encoded = sink.into_document().unwrap();
    assert_eq!(encoded.keys().collect::<Vec<_>>(), vec!["_id", "x"]);

    let mut sink = TreeWriter::new();
    let ctx = EncoderContext::builder()
        .is_encoding_collectible_document(false)
        .build();
    codec.encode(&mut sink, &mut doc, ctx).unwrap();
    let encoded = sink.into_document().unwrap();
    assert_eq!(encoded.keys().collect::<Vec<_>>(), vec!["x", "_id"]);
}

#[test]
fn test_id_first_survives_binary_round_trip() {
    let codec = DocumentCodec::default();
    let mut doc = Document::new().append("x", 2).append("_id", 2);
    let decoded = save_and_load(&codec, &mut doc);
    assert_eq!(decoded, Document::new().append("_id", 2).append("x", 2));
}

#[test]
fn test_should_generate_id_if_absent() {
    let codec = DocumentCodec::default();
    let mut doc = Document::new();
    assert!(!codec.document_has_id(&doc));

    codec.generate_id_if_absent_from_document(&mut doc);
    assert!(codec.document_has_id(&doc));
    assert_eq!(codec.get_document_id(&doc).unwrap().kind(), ValueKind::ObjectId);
}

#[test]
fn test_should_not_generate_id_if_present() {
    let codec = DocumentCodec::default();
    let mut doc = Document::new().append("_id", 1);
    assert!(codec.document_has_id(&doc));

    codec.generate_id_if_absent_from_document(&mut doc);
    assert!(codec.document_has_id(&doc));
    assert_eq!(codec.get_document_id(&doc), Ok(&Value::Int32(1)));
    assert_eq!(doc, Document::new().append("_id", 1));
}

#[test]
fn test_generated_id_matches_stored_id() {
    let codec = DocumentCodec::default();
    let mut doc = Document::new().append("a", 1);
    let decoded = save_and_load(&codec, &mut doc);

    let assigned = codec.get_document_id(&doc).unwrap().clone();
    assert_eq!(codec.get_document_id(&decoded), Ok(&assigned));

    // Saving again reuses the id now present on the document.
    let again = save_and_load(&codec, &mut doc);
    assert_eq!(again.get("_id"), Some(&assigned));
}

#[test]
fn test_transformers() {
    let hooks = Arc::new(TransformerRegistry::new());
    let codec = DocumentCodec::default().with_transformers(Arc::clone(&hooks));
    let original = Document::new().append("_id", 1).append("x", 1.1);

    let stored = save_and_load(&codec, &mut original.clone());
    assert_eq!(stored.get("x").unwrap().kind(), ValueKind::Double);

    hooks.register_encode_hook(ValueKind::Double, stringify);
    let stored = save_and_load(&codec, &mut original.clone());
    assert_eq!(stored.get("x"), Some(&Value::from("1.1")));

    hooks.clear_all();
    let bytes = codec
        .encode_to_vec(&mut original.clone(), EncoderContext::collectible())
        .unwrap();
    let stored = codec.decode_from_slice(&bytes).unwrap();
    assert_eq!(stored.get("x"), Some(&Value::Double(1.1)));

    // Decode hooks apply to bytes written before they were registered.
    hooks.register_decode_hook(ValueKind::Double, stringify);
    let loaded = codec.decode_from_slice(&bytes).unwrap();
    assert_eq!(loaded.get("x"), Some(&Value::from("1.1")));

    hooks.clear_all();
    let loaded = codec.decode_from_slice(&bytes).unwrap();
    assert_eq!(loaded.get("x"), Some(&Value::Double(1.1)));
}

#[test]
fn test_global_transformers_are_shared() {
    let global = transform::global();
    let a = DocumentCodec::default().with_global_transformers();
    let b = DocumentCodec::default().with_global_transformers();
    let isolated = DocumentCodec::default();

    let round_trip = |codec: &DocumentCodec| -> Result<Document, Box<dyn std::error::Error>> {
        let mut doc = Document::new().append("n", 5i64);
        let bytes = codec.encode_to_vec(&mut doc, EncoderContext::default())?;
        Ok(codec.decode_from_slice(&bytes)?)
    };

    global.register_encode_hook(ValueKind::Int64, |v| {
        Ok(Value::Int32(v.as_i64().unwrap_or_default() as i32))
    });
    let (via_a, via_b, via_isolated) = (round_trip(&a), round_trip(&b), round_trip(&isolated));
    global.clear_all();

    assert_eq!(via_a.unwrap().get("n"), Some(&Value::Int32(5)));
    assert_eq!(via_b.unwrap().get("n"), Some(&Value::Int32(5)));
    assert_eq!(via_isolated.unwrap().get("n"), Some(&Value::Int64(5)));
    assert_eq!(round_trip(&a).unwrap().get("n"), Some(&Value::Int64(5)));
}

#[test]
fn test_list_of_documents_round_trip() {
    let codec = DocumentCodec::default();
    let list = vec![
        Value::Document(Document::new().append("a", 1).append("b", true)),
        Value::Document(Document::new().append("c", "string").append("d", 0.1)),
    ];
    let mut doc = Document::new().append("l", list.clone());

    let stored = save_and_load(&codec, &mut doc);
    assert_eq!(stored.get("l"), Some(&Value::Array(list)));
}

#[test]
fn test_every_kind_round_trips() {
    let codec = DocumentCodec::default();
    let id = ObjectId::new();
    let mut doc = Document::new()
        .append("_id", id)
        .append("null", Value::Null)
        .append("bool", false)
        .append("i32", i32::MIN)
        .append("i64", i64::MAX)
        .append("f64", -0.25)
        .append("str", "héllo")
        .append("bin", vec![0u8, 1, 2, 255])
        .append("doc", Document::new().append("_id", "inner").append("z", Value::Null))
        .append(
            "arr",
            vec![Value::Int32(1), Value::Array(vec![]), Value::Document(Document::new())],
        );
    let expected = doc.clone();

    let stored = save_and_load(&codec, &mut doc);
    assert_eq!(stored, expected);
    assert_eq!(stored.get("_id"), Some(&Value::ObjectId(id)));
}

#[test]
fn test_decode_rejects_truncated_input() {
    let codec = DocumentCodec::default();
    let mut doc = Document::new().append("s", "value");
    let bytes = codec.encode_to_vec(&mut doc, EncoderContext::default()).unwrap();
    for len in 0..bytes.len() {
        assert!(codec.decode_from_slice(&bytes[..len]).is_err(), "accepted {len} bytes");
    }
}
