use proptest::prelude::*;

use crate::{
    decode_document,
    doc,
    encode_document,
    oid::ObjectId,
    spec::BinarySubtype,
    Binary,
    Bson,
    CodecOptions,
    Document,
    JavaScriptCodeWithScope,
    RawArrayIter,
    RawDocumentView,
    Regex,
};

fn arbitrary_binary_subtype() -> impl Strategy<Value = BinarySubtype> {
    prop_oneof![
        Just(BinarySubtype::Generic),
        Just(BinarySubtype::Function),
        Just(BinarySubtype::BinaryOld),
        Just(BinarySubtype::UuidOld),
        Just(BinarySubtype::Uuid),
        Just(BinarySubtype::Md5),
    ]
}

fn arbitrary_bson() -> impl Strategy<Value = Bson> {
    let leaf = prop_oneof![
        Just(Bson::Null),
        any::<String>().prop_map(Bson::String),
        any::<bool>().prop_map(Bson::Boolean),
        (-1e15f64..1e15).prop_map(Bson::Double),
        any::<i32>().prop_map(Bson::Int32),
        any::<i64>().prop_map(Bson::Int64),
        ("[^\0]*", "[a-z]*")
            .prop_map(|(pattern, options)| Bson::RegularExpression(Regex { pattern, options })),
        any::<[u8; 12]>().prop_map(|bytes| Bson::ObjectId(ObjectId::from_bytes(bytes))),
        (arbitrary_binary_subtype(), any::<Vec<u8>>())
            // 16-byte UUID subtypes decode as Bson::Uuid
            .prop_filter("uuid-shaped binary", |(subtype, bytes)| {
                !(matches!(subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld)
                    && bytes.len() == 16)
            })
            .prop_map(|(subtype, bytes)| Bson::Binary(Binary { subtype, bytes })),
        any::<String>().prop_map(Bson::JavaScriptCode),
    ];

    leaf.prop_recursive(4, 256, 10, |inner| {
        prop_oneof![
            prop::collection::hash_map("[^\0]*", inner.clone(), 0..12)
                .prop_map(|map| Bson::Document(map.into_iter().collect())),
            prop::collection::vec(inner.clone(), 0..12).prop_map(Bson::Array),
            (
                prop::collection::hash_map("[^\0]*", inner, 0..12)
                    .prop_map(|map| map.into_iter().collect::<Document>()),
                any::<String>()
            )
                .prop_map(|(scope, code)| Bson::JavaScriptCodeWithScope(
                    JavaScriptCodeWithScope { code, scope }
                )),
        ]
    })
}

proptest! {
    #[test]
    fn no_crashes(s: Vec<u8>) {
        let options = CodecOptions::default();
        let _ = decode_document(&s, &options);

        let view = RawDocumentView::new(&s[..], &options);
        let _ = view.contains_key("a");
        let _ = view.len();

        if let Ok(iter) = RawArrayIter::new(&s, &options) {
            let _ = iter.count();
        }
    }

    #[test]
    fn roundtrip_bson(bson in arbitrary_bson()) {
        let options = CodecOptions::default();
        let doc = doc! { "bson": bson };
        let bytes = encode_document(&doc, false, &options);
        prop_assert!(bytes.is_ok());
        let bytes = bytes.unwrap();

        let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        prop_assert_eq!(declared as usize, bytes.len());

        let roundtrip = decode_document(&bytes, &options);
        prop_assert!(roundtrip.is_ok());
        prop_assert_eq!(doc, roundtrip.unwrap());
    }

    #[test]
    fn clean_view_is_idempotent(bson in arbitrary_bson()) {
        let options = CodecOptions::default();
        let bytes = encode_document(&doc! { "bson": bson }, false, &options).unwrap();

        let mut view = RawDocumentView::new(&bytes[..], &options);
        prop_assert!(view.len().is_ok());
        prop_assert_eq!(view.raw_bytes().unwrap(), &bytes[..]);
    }

    #[test]
    fn dirty_view_reencodes(bson in arbitrary_bson(), key in "[^\0]*", value in arbitrary_bson()) {
        let options = CodecOptions::default();
        let mut doc = doc! { "bson": bson };
        let bytes = encode_document(&doc, false, &options).unwrap();

        let mut view = RawDocumentView::new(bytes, &options);
        view.set(key.clone(), value.clone()).unwrap();
        doc.insert(key, value);

        let reencoded = view.raw_bytes().unwrap().to_vec();
        prop_assert_eq!(decode_document(&reencoded, &options).unwrap(), doc);
    }
}
