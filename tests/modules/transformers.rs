use std::net::Ipv4Addr;

use lazybson::{
    decode_document,
    doc,
    encode_document,
    error::Error,
    spec::ElementType,
    transformer::DecodeMatcher,
    Bson,
    CodecOptions,
    Custom,
    RawDocumentView,
    Transformer,
    TransformerRegistry,
};

fn ip_encoder() -> Transformer {
    Transformer::new().encode_with(|ip: &Ipv4Addr| Ok(Bson::Int64(u32::from(*ip).into())))
}

fn ip_decoder() -> Transformer {
    Transformer::new().decode_with(DecodeMatcher::element(ElementType::Int64), |value| {
        let raw = value
            .as_i64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| Error::transform("address out of range"))?;
        Ok(Bson::Custom(Custom::new(Ipv4Addr::from(raw))))
    })
}

fn with_registry(registry: TransformerRegistry) -> CodecOptions {
    CodecOptions::builder().transformer_registry(registry).build()
}

#[test]
fn round_trip_through_both_hooks() {
    let both = Transformer::new()
        .encode_with(|ip: &Ipv4Addr| Ok(Bson::Int64(u32::from(*ip).into())))
        .decode_with(DecodeMatcher::element(ElementType::Int64), |value| {
            let raw = value.as_i64().unwrap_or_default() as u32;
            Ok(Bson::Custom(Custom::new(Ipv4Addr::from(raw))))
        });
    let options = with_registry(TransformerRegistry::new().with(both));

    let doc = doc! { "host": Custom::new(Ipv4Addr::new(10, 0, 0, 1)) };
    let bytes = encode_document(&doc, false, &options).unwrap();
    assert_eq!(decode_document(&bytes, &options).unwrap(), doc);
}

#[test]
fn split_hooks_compose() {
    let options = with_registry(TransformerRegistry::new().with(ip_encoder()).with(ip_decoder()));

    let doc = doc! { "host": Custom::new(Ipv4Addr::LOCALHOST) };
    let bytes = encode_document(&doc, false, &options).unwrap();
    assert_eq!(decode_document(&bytes, &options).unwrap(), doc);
}

#[test]
fn encode_only_transformer() {
    let options = with_registry(TransformerRegistry::new().with(ip_encoder()));

    let bytes = encode_document(
        &doc! { "host": Custom::new(Ipv4Addr::new(0, 0, 1, 0)) },
        false,
        &options,
    )
    .unwrap();
    let plain = encode_document(&doc! { "host": 256i64 }, false, &CodecOptions::default()).unwrap();
    assert_eq!(bytes, plain);
    assert_eq!(
        decode_document(&bytes, &options).unwrap(),
        doc! { "host": 256i64 }
    );
}

#[test]
fn decode_only_transformer() {
    let options = with_registry(TransformerRegistry::new().with(ip_decoder()));

    let err = encode_document(
        &doc! { "host": Custom::new(Ipv4Addr::LOCALHOST) },
        false,
        &options,
    )
    .unwrap_err();
    assert!(err.is_unsupported_type());

    let bytes = encode_document(&doc! { "host": 256i64 }, false, &options).unwrap();
    let view = RawDocumentView::new(&bytes[..], &options);
    assert_eq!(
        view.get("host").unwrap().and_then(Bson::as_custom::<Ipv4Addr>),
        Some(&Ipv4Addr::new(0, 0, 1, 0))
    );
}

#[test]
fn decode_hook_errors_surface() {
    let options = with_registry(TransformerRegistry::new().with(ip_decoder()));
    let bytes = encode_document(&doc! { "host": -1i64 }, false, &options).unwrap();

    let err = decode_document(&bytes, &options).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("host"));
    assert!(err.to_string().contains("address out of range"));
}
