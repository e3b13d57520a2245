use std::borrow::Cow;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    decode_document,
    doc,
    encode_document,
    error::ErrorKind,
    oid::ObjectId,
    Bson,
    CodecOptions,
    Document,
    RawArrayIter,
    RawDocumentView,
    RawValue,
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
fn lazy_get() {
    let options = CodecOptions::default();
    let view = RawDocumentView::new(SHERLOCK, &options);
    assert!(!view.is_inflated());

    assert_eq!(view.get("name").unwrap(), Some(&Bson::String("Sherlock".into())));
    assert!(view.is_inflated());
    assert_eq!(
        view.get("address")
            .unwrap()
            .and_then(Bson::as_document)
            .map(|address| address.get_str("street").unwrap()),
        Some("Baker Street")
    );
    assert_eq!(view.len().unwrap(), 3);
    assert_eq!(view.get("missing").unwrap(), None);
    assert_eq!(view, sherlock());
}

#[test]
fn clean_view_returns_original_bytes() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);
    assert_eq!(view.raw_bytes().unwrap(), SHERLOCK);

    view.len().unwrap();
    assert!(!view.is_dirty());
    assert_eq!(view.raw_bytes().unwrap(), SHERLOCK);
    assert_matches!(view.into_bytes().unwrap(), Cow::Borrowed(bytes) if bytes == SHERLOCK);
}

#[test]
fn set_marks_dirty_and_reencodes() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);

    assert_eq!(view.set("foo", "bar").unwrap(), None);
    assert!(view.is_dirty());
    assert_eq!(view.len().unwrap(), 4);

    let bytes = view.raw_bytes().unwrap().to_vec();
    assert!(!view.is_dirty());

    let mut expected = sherlock();
    expected.insert("foo", "bar");
    assert_eq!(decode_document(&bytes, &options).unwrap(), expected);
    assert_eq!(
        i32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize,
        bytes.len()
    );
}

#[test]
fn set_replaces_existing_value() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);

    let old = view.set("name", "Mycroft").unwrap();
    assert_eq!(old, Some(Bson::String("Sherlock".into())));
    assert_eq!(view.len().unwrap(), 3);

    let bytes = view.raw_bytes().unwrap().to_vec();
    let doc = decode_document(&bytes, &options).unwrap();
    assert_eq!(doc.get_str("name").unwrap(), "Mycroft");
    let keys: Vec<_> = doc.keys().cloned().collect();
    assert_eq!(keys, ["_id", "name", "address"]);
}

#[test]
fn remove_marks_dirty_and_reencodes() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);

    assert!(view.remove("name").unwrap().is_some());
    assert_eq!(view.len().unwrap(), 2);

    let bytes = view.raw_bytes().unwrap().to_vec();
    let mut expected = sherlock();
    expected.remove("name");
    assert_eq!(decode_document(&bytes, &options).unwrap(), expected);

    assert_eq!(view.remove("name").unwrap(), None);
    assert!(view.is_dirty());
}

#[test]
fn keys_and_iteration_follow_wire_order() {
    let view = RawDocumentView::new(SHERLOCK, &CodecOptions::default());
    let keys: Vec<_> = view.keys().unwrap().cloned().collect();
    assert_eq!(keys, ["_id", "name", "address"]);

    let values: Vec<_> = view.iter().unwrap().map(|(_, v)| v.clone()).collect();
    assert_eq!(values[1], Bson::String("Sherlock".into()));
}

#[test]
fn contains_key_scans_without_inflating() {
    let view = RawDocumentView::new(SHERLOCK, &CodecOptions::default());
    assert!(view.contains_key("address").unwrap());
    assert!(!view.contains_key("street").unwrap());
    assert!(!view.is_inflated());

    view.get("name").unwrap();
    assert!(view.contains_key("_id").unwrap());
}

#[test]
fn malformed_bytes_fail_on_first_access() {
    let options = CodecOptions::default();
    let truncated = &SHERLOCK[..40];
    let mut view = RawDocumentView::new(truncated, &options);

    let err = view.get("name").unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::MalformedBytes { ref message } if message == "invalid object size"
    );
    assert!(view.len().is_err());
    assert!(view.contains_key("name").is_err());
    assert!(view.set("a", 1).is_err());
    assert!(!view.is_dirty());

    // Never inflated and never dirtied, so the bytes come back untouched.
    assert_eq!(view.raw_bytes().unwrap(), truncated);
    assert!(format!("{view:?}").contains("raw"));
}

#[test]
fn failed_reencode_stays_dirty() {
    let options = CodecOptions::default();
    let mut view = RawDocumentView::new(SHERLOCK, &options);

    view.set("bad\0key", 1).unwrap();
    assert!(view.raw_bytes().unwrap_err().is_invalid_document());
    assert!(view.is_dirty());

    view.remove("bad\0key").unwrap();
    assert_eq!(decode_document(view.raw_bytes().unwrap(), &options).unwrap(), sherlock());
}

#[test]
fn from_document_and_into_document() {
    let options = CodecOptions::default();
    let view = RawDocumentView::from_document(&sherlock(), &options).unwrap();
    assert_eq!(view, RawDocumentView::new(SHERLOCK, &options));
    assert_eq!(view.into_document().unwrap(), sherlock());
}

#[test]
fn equality_ignores_byte_layout() {
    let options = CodecOptions::default();
    let mut edited = RawDocumentView::new(SHERLOCK, &options);
    edited.set("name", "Sherlock").unwrap();
    assert!(edited.is_dirty());
    assert_eq!(edited, RawDocumentView::new(SHERLOCK, &options));

    let broken = RawDocumentView::new(&SHERLOCK[..10], &options);
    assert_ne!(broken, RawDocumentView::new(&SHERLOCK[..10], &options));
}

#[test]
fn tz_aware_view() {
    let options = CodecOptions::builder().tz_aware(true).build();
    let bytes = encode_document(
        &doc! { "when": crate::DateTime::from_millis(0) },
        false,
        &options,
    )
    .unwrap();
    let view = RawDocumentView::new(bytes, &options);
    let when = view.get("when").unwrap().and_then(Bson::as_datetime).unwrap();
    assert!(when.is_tz_aware());
    assert!(view.options().tz_aware());
}

fn two_hellos() -> Vec<u8> {
    // Arrays share the document layout, with indices as field names.
    encode_document(
        &doc! { "0": { "hello": "world" }, "1": { "hello": "there" } },
        false,
        &CodecOptions::default(),
    )
    .unwrap()
}

#[test]
fn array_iter_yields_document_views() {
    let bytes = two_hellos();
    let mut iter = RawArrayIter::new(&bytes, &CodecOptions::default()).unwrap();

    let first = iter.next().unwrap().unwrap().into_document().unwrap();
    assert!(!first.is_inflated());
    assert_eq!(first.get("hello").unwrap(), Some(&Bson::String("world".into())));

    let second = iter.next().unwrap().unwrap().into_document().unwrap();
    assert_eq!(second, doc! { "hello": "there" });

    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
}

#[test]
fn array_iter_views_borrow_the_buffer() {
    let bytes = two_hellos();
    let mut iter = RawArrayIter::new(&bytes, &CodecOptions::default()).unwrap();
    let mut first = iter.next().unwrap().unwrap().into_document().unwrap();
    let raw = first.raw_bytes().unwrap();
    // tag and "0\0" precede the first embedded document
    assert_eq!(raw, &bytes[7..7 + raw.len()]);
}

#[test]
fn array_iter_mixed_values() {
    let options = CodecOptions::default();
    let outer = encode_document(
        &doc! { "arr": [1, "two", [3, 4], { "five": 5 }, null] },
        false,
        &options,
    )
    .unwrap();
    // tag, "arr\0", then the array itself
    let array = &outer[4 + 1 + 4..outer.len() - 1];
    let values: Vec<_> = RawArrayIter::new(array, &options)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(values.len(), 5);

    assert_eq!(values[0].as_value(), Some(&Bson::Int32(1)));
    assert_eq!(values[1].as_value(), Some(&Bson::String("two".into())));
    assert_matches!(&values[2], RawValue::Array(_));
    assert_eq!(values[3].as_document().unwrap(), &doc! { "five": 5 });
    assert_eq!(values[4].as_value(), Some(&Bson::Null));

    let mut values = values.into_iter();
    let nested = values.nth(2).unwrap().into_array().unwrap();
    let nested: Vec<_> = nested
        .map(|v| v.unwrap().as_value().cloned().unwrap())
        .collect();
    assert_eq!(nested, [Bson::Int32(3), Bson::Int32(4)]);
}

#[test]
fn array_iter_stops_after_error() {
    let mut bytes = two_hellos();
    // Corrupt the tag of the second element.
    let second_tag = 4 + 1 + 2 + 22;
    bytes[second_tag] = 0x42;

    let mut iter = RawArrayIter::new(&bytes, &CodecOptions::default()).unwrap();
    assert!(iter.next().unwrap().is_ok());
    let err = iter.next().unwrap().unwrap_err();
    assert!(err.is_malformed_bytes());
    assert_eq!(err.index, Some(1));
    assert!(iter.next().is_none());
}

#[test]
fn array_iter_rejects_bad_frame() {
    let options = CodecOptions::default();
    assert!(RawArrayIter::new(b"\x06\x00\x00\x00\x00", &options).is_err());
    assert!(RawArrayIter::new(b"\x05\x00\x00\x00\x01", &options).is_err());

    let mut empty = RawArrayIter::new(b"\x05\x00\x00\x00\x00", &options).unwrap();
    assert!(empty.next().is_none());
}
