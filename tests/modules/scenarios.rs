use lazybson::{
    decode_all,
    decode_document,
    doc,
    encode,
    encode_document,
    oid::ObjectId,
    Bson,
    CodecOptions,
    Document,
    RawArrayIter,
    RawDocumentView,
};

const SHERLOCK: &[u8] = b"P\x00\x00\x00\x07_id\x00Um\xf6\x8bn2\xab!\xa9^\x07\x85\x02name\x00\t\x00\x00\x00Sherlock\x00\x03address\x00\x1e\x00\x00\x00\x02street\x00\r\x00\x00\x00Baker Street\x00\x00\x00";

fn sherlock() -> Document {
    doc! {
        "_id": ObjectId::parse_str("556df68b6e32ab21a95e0785").unwrap(),
        "name": "Sherlock",
        "address": { "street": "Baker Street" },
    }
}

#[test]
fn encode_single_int32() {
    let bytes = encode(&Bson::Document(doc! { "a": 1 }), false, &CodecOptions::default()).unwrap();
    assert_eq!(
        bytes,
        [0x0C, 0x00, 0x00, 0x00, 0x10, 0x61, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn declared_size_past_end_of_buffer() {
    let err = decode_document(
        b"\x10\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x00",
        &CodecOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_malformed_bytes());
    assert!(err.to_string().contains("invalid object size"));
}

#[test]
fn missing_terminator_at_declared_size() {
    let err = decode_document(
        b"\x0c\x00\x00\x00\x10a\x00\x01\x00\x00\x00\xff",
        &CodecOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_malformed_bytes());
    assert!(err.to_string().contains("bad eoo"));
}

#[test]
fn raw_view_reads_fields() {
    let view = RawDocumentView::new(SHERLOCK, &CodecOptions::default());
    assert_eq!(view.get("name").unwrap().and_then(Bson::as_str), Some("Sherlock"));
    let address = view.get("address").unwrap().and_then(Bson::as_document).unwrap();
    assert_eq!(address.get_str("street").unwrap(), "Baker Street");
    assert_eq!(view.len().unwrap(), 3);
}

#[test]
fn raw_view_set() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);
    view.set("foo", "bar").unwrap();
    assert_eq!(view.len().unwrap(), 4);

    let mut expected = sherlock();
    expected.insert("foo", "bar");
    let bytes = view.raw_bytes().unwrap();
    assert_eq!(decode_document(bytes, &options).unwrap(), expected);
}

#[test]
fn raw_view_delete() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);
    view.remove("name").unwrap();
    assert_eq!(view.len().unwrap(), 2);

    let decoded = decode_document(view.raw_bytes().unwrap(), &options).unwrap();
    assert!(!decoded.contains_key("name"));
    assert_eq!(decoded.len(), 2);
}

#[test]
fn raw_array_of_documents() {
    let options = CodecOptions::default();
    let outer = encode_document(
        &doc! { "docs": [{ "hello": "world" }, { "hello": "world" }] },
        false,
        &options,
    )
    .unwrap();
    let array = &outer[9..outer.len() - 1];

    let mut iter = RawArrayIter::new(array, &options).unwrap();
    for _ in 0..2 {
        let view = iter.next().unwrap().unwrap().into_document().unwrap();
        assert_eq!(view.get("hello").unwrap().and_then(Bson::as_str), Some("world"));
    }
    assert!(iter.next().is_none());
}

#[test]
fn concatenated_documents() {
    let options = CodecOptions::default();
    let docs = [doc! { "n": 1 }, doc! { "n": 2 }, sherlock()];
    let mut bytes = Vec::new();
    for doc in &docs {
        bytes.extend(encode_document(doc, false, &options).unwrap());
    }
    assert_eq!(decode_all(&bytes, &options).unwrap(), docs);
}
