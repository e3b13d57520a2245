// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Decoder

use crate::{
    bson::{Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    document::{Document, DocumentMap},
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    options::CodecOptions,
    spec::{BinarySubtype, ElementType},
    uuid::Uuid,
    Binary,
    DateTime,
    Decimal128,
};

pub(crate) const MIN_BSON_STRING_SIZE: usize = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_BSON_DOCUMENT_SIZE: usize = 4 + 1; // 4 bytes for length, one byte for null terminator
const MIN_CODE_WITH_SCOPE_SIZE: usize = 4 + MIN_BSON_STRING_SIZE + MIN_BSON_DOCUMENT_SIZE;

/// Decodes the single document that makes up all of `bytes` into a [`Document`].
///
/// Trailing bytes after the document are an error; use [`decode_document_with_length`] to
/// decode a prefix.
///
/// ```
/// use lazybson::{decode_document, doc, CodecOptions};
///
/// let bytes = b"\x0c\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x00";
/// assert_eq!(decode_document(bytes, &CodecOptions::default())?, doc! { "a": 1 });
/// # Ok::<(), lazybson::error::Error>(())
/// ```
pub fn decode_document(bytes: &[u8], options: &CodecOptions) -> Result<Document> {
    decode_document_as(bytes, options)
}

/// Decodes the single document that makes up all of `bytes` into any [`DocumentMap`].
pub fn decode_document_as<D: DocumentMap>(bytes: &[u8], options: &CodecOptions) -> Result<D> {
    let (doc, consumed) = decode_document_with_length(bytes, options)?;
    if consumed != bytes.len() {
        return Err(Error::malformed_bytes(format!(
            "{} trailing bytes after document",
            bytes.len() - consumed
        )));
    }
    Ok(doc)
}

/// Decodes the document at the start of `bytes`, returning it along with the number of bytes
/// it occupied.
pub fn decode_document_with_length<D: DocumentMap>(
    bytes: &[u8],
    options: &CodecOptions,
) -> Result<(D, usize)> {
    let size = read_document_frame(bytes)?;
    let doc = decode_document_body(&bytes[..size], options)?;
    Ok((doc, size))
}

/// Decodes the document that makes up all of `bytes` as a value, running any decode hook
/// registered for embedded documents over the whole document.
pub fn decode_value(bytes: &[u8], options: &CodecOptions) -> Result<Bson> {
    let doc: Document = decode_document_as(bytes, options)?;
    options.transformer_registry().transform_for_decode(
        ElementType::EmbeddedDocument,
        None,
        Bson::Document(doc),
    )
}

/// Decodes every document in a buffer of concatenated documents.
///
/// A trailing fragment too short to be a document is an error, never silently dropped.
pub fn decode_all(bytes: &[u8], options: &CodecOptions) -> Result<Vec<Document>> {
    decode_all_as(bytes, options)
}

/// Decodes every document in a buffer of concatenated documents into any [`DocumentMap`].
pub fn decode_all_as<D: DocumentMap>(bytes: &[u8], options: &CodecOptions) -> Result<Vec<D>> {
    let mut docs = Vec::new();
    let mut position = 0;
    while position < bytes.len() {
        let (doc, consumed) = decode_document_with_length(&bytes[position..], options)
            .map_err(|e| e.with_index(docs.len()))?;
        docs.push(doc);
        position += consumed;
    }
    tracing::trace!(count = docs.len(), bytes = bytes.len(), "decoded document batch");
    Ok(docs)
}

/// Decodes every document in a buffer of concatenated documents as values, running any decode
/// hook registered for embedded documents over each one, as [`decode_value`] does.
pub fn decode_all_values(bytes: &[u8], options: &CodecOptions) -> Result<Vec<Bson>> {
    let registry = options.transformer_registry();
    decode_all_as::<Document>(bytes, options)?
        .into_iter()
        .enumerate()
        .map(|(index, doc)| {
            registry
                .transform_for_decode(ElementType::EmbeddedDocument, None, Bson::Document(doc))
                .map_err(|e| e.with_index(index))
        })
        .collect()
}

/// Whether `bytes` is exactly one well-formed document.
pub fn is_valid(bytes: &[u8]) -> bool {
    decode_document(bytes, &CodecOptions::default()).is_ok()
}

/// Decodes one element starting at `offset` within a document body, returning its name, its
/// value and the offset just past it. Decode hooks registered in `options` are applied.
pub fn decode_element(
    bytes: &[u8],
    offset: usize,
    options: &CodecOptions,
) -> Result<(String, Bson, usize)> {
    let (tag, name, payload) = read_element_header(bytes, offset)?;
    let (value, end) = element_type(tag)
        .and_then(|et| decode_payload(et, bytes, payload, options))
        .map_err(|e| e.with_key(name))?;
    Ok((name.to_string(), value, end))
}

/// Checks the framing of the document or array at the start of `bytes` and returns its declared
/// length.
pub(crate) fn read_document_frame(bytes: &[u8]) -> Result<usize> {
    let size = i32_from_slice(bytes)
        .ok()
        .and_then(|size| usize::try_from(size).ok())
        .filter(|size| *size >= MIN_BSON_DOCUMENT_SIZE && *size <= bytes.len())
        .ok_or_else(|| Error::malformed_bytes("invalid object size"))?;
    if bytes[size - 1] != 0 {
        return Err(Error::malformed_bytes("bad eoo"));
    }
    Ok(size)
}

fn decode_document_body<D: DocumentMap>(doc_bytes: &[u8], options: &CodecOptions) -> Result<D> {
    let end = doc_bytes.len() - 1;
    let body = &doc_bytes[..end];
    let mut doc = D::default();
    let mut position = 4;
    while position < end {
        let (key, value, next) = decode_element(body, position, options)?;
        doc.insert(key, value);
        position = next;
    }
    Ok(doc)
}

fn decode_array_body(array_bytes: &[u8], options: &CodecOptions) -> Result<Vec<Bson>> {
    let end = array_bytes.len() - 1;
    let body = &array_bytes[..end];
    let mut array = Vec::new();
    let mut position = 4;
    while position < end {
        let index = array.len();
        let (tag, _, payload) =
            read_element_header(body, position).map_err(|e| e.with_index(index))?;
        let (value, next) = element_type(tag)
            .and_then(|et| decode_payload(et, body, payload, options))
            .map_err(|e| e.with_index(index))?;
        array.push(value);
        position = next;
    }
    Ok(array)
}

pub(crate) fn element_type(tag: u8) -> Result<ElementType> {
    ElementType::from(tag).ok_or_else(|| {
        Error::malformed_bytes(format!("unrecognized element type 0x{tag:02x}"))
    })
}

/// Reads an element's tag byte and NUL-terminated name, returning them with the offset of the
/// payload.
pub(crate) fn read_element_header(bytes: &[u8], offset: usize) -> Result<(u8, &str, usize)> {
    let tag = *bytes
        .get(offset)
        .ok_or_else(|| Error::malformed_bytes("unexpected end of document"))?;
    let (name, payload) = read_cstring(bytes, offset + 1)?;
    Ok((tag, name, payload))
}

/// Decodes the payload of an element of type `element_type` at `offset`, returning the value
/// (after decode hooks) and the offset just past it.
pub(crate) fn decode_payload(
    element_type: ElementType,
    bytes: &[u8],
    offset: usize,
    options: &CodecOptions,
) -> Result<(Bson, usize)> {
    let (value, subtype, end) = decode_builtin(element_type, bytes, offset, options)?;
    let value = options
        .transformer_registry()
        .transform_for_decode(element_type, subtype, value)?;
    Ok((value, end))
}

/// Returns the offset just past the payload of an element of type `element_type` at `offset`
/// without decoding it.
pub(crate) fn skip_payload(
    element_type: ElementType,
    bytes: &[u8],
    offset: usize,
) -> Result<usize> {
    let len = match element_type {
        ElementType::Null | ElementType::Undefined | ElementType::MinKey | ElementType::MaxKey => 0,
        ElementType::Boolean => 1,
        ElementType::Int32 => 4,
        ElementType::Double
        | ElementType::Int64
        | ElementType::DateTime
        | ElementType::Timestamp => 8,
        ElementType::ObjectId => 12,
        ElementType::Decimal128 => 16,
        ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
            4 + read_len(bytes, offset)?
        }
        ElementType::DbPointer => 4 + read_len(bytes, offset)? + 12,
        ElementType::EmbeddedDocument
        | ElementType::Array
        | ElementType::JavaScriptCodeWithScope => read_len(bytes, offset)?,
        ElementType::Binary => 5 + read_len(bytes, offset)?,
        ElementType::RegularExpression => {
            let (_, after_pattern) = read_cstring(bytes, offset)?;
            let (_, end) = read_cstring(bytes, after_pattern)?;
            return Ok(end);
        }
    };
    let end = checked_add(offset, len)?;
    if end > bytes.len() {
        return Err(truncated(element_type));
    }
    Ok(end)
}

fn decode_builtin(
    element_type: ElementType,
    bytes: &[u8],
    offset: usize,
    options: &CodecOptions,
) -> Result<(Bson, Option<BinarySubtype>, usize)> {
    let (value, end) = match element_type {
        ElementType::Double => {
            let v = f64::from_le_bytes(read_array(bytes, offset, element_type)?);
            (Bson::Double(v), offset + 8)
        }
        ElementType::String => {
            let (s, end) = read_string(bytes, offset)?;
            (Bson::String(s.to_string()), end)
        }
        ElementType::JavaScriptCode => {
            let (s, end) = read_string(bytes, offset)?;
            (Bson::JavaScriptCode(s.to_string()), end)
        }
        ElementType::Symbol => {
            let (s, end) = read_string(bytes, offset)?;
            (Bson::Symbol(s.to_string()), end)
        }
        ElementType::EmbeddedDocument => {
            let sub = &bytes[offset..];
            let size = read_document_frame(sub)?;
            let doc = decode_document_body(&sub[..size], options)?;
            (Bson::Document(doc), offset + size)
        }
        ElementType::Array => {
            let sub = &bytes[offset..];
            let size = read_document_frame(sub)?;
            let array = decode_array_body(&sub[..size], options)?;
            (Bson::Array(array), offset + size)
        }
        ElementType::Binary => return decode_binary(bytes, offset, options),
        ElementType::Undefined => (Bson::Undefined, offset),
        ElementType::Null => (Bson::Null, offset),
        ElementType::MinKey => (Bson::MinKey, offset),
        ElementType::MaxKey => (Bson::MaxKey, offset),
        ElementType::ObjectId => {
            let id = ObjectId::from_bytes(read_array(bytes, offset, element_type)?);
            (Bson::ObjectId(id), offset + 12)
        }
        ElementType::Boolean => {
            let [b] = read_array(bytes, offset, element_type)?;
            let value = match b {
                0 => false,
                1 => true,
                other => {
                    return Err(Error::malformed_bytes(format!(
                        "boolean must be stored as 0 or 1, got {other}"
                    )));
                }
            };
            (Bson::Boolean(value), offset + 1)
        }
        ElementType::DateTime => {
            let millis = i64::from_le_bytes(read_array(bytes, offset, element_type)?);
            let dt = DateTime::from_millis(millis).with_tz_aware(options.tz_aware());
            (Bson::DateTime(dt), offset + 8)
        }
        ElementType::RegularExpression => {
            let (pattern, after_pattern) = read_cstring(bytes, offset)?;
            let (regex_options, end) = read_cstring(bytes, after_pattern)?;
            let regex = Regex {
                pattern: pattern.to_string(),
                options: regex_options.to_string(),
            };
            (Bson::RegularExpression(regex), end)
        }
        ElementType::DbPointer => {
            let (namespace, after_namespace) = read_string(bytes, offset)?;
            let id = ObjectId::from_bytes(read_array(bytes, after_namespace, element_type)?);
            let pointer = DbPointer {
                namespace: namespace.to_string(),
                id,
            };
            (Bson::DbPointer(pointer), after_namespace + 12)
        }
        ElementType::JavaScriptCodeWithScope => {
            let total = read_len(bytes, offset)?;
            if total < MIN_CODE_WITH_SCOPE_SIZE {
                return Err(Error::malformed_bytes(format!(
                    "code with scope length must be at least {MIN_CODE_WITH_SCOPE_SIZE}, got \
                     {total}"
                )));
            }
            let end = checked_add(offset, total)?;
            let cws = bytes
                .get(..end)
                .ok_or_else(|| truncated(element_type))?;
            let (code, scope_start) = read_string(cws, offset + 4)?;
            let scope_bytes = &cws[scope_start..];
            let scope_size = read_document_frame(scope_bytes)?;
            if scope_start + scope_size != end {
                return Err(Error::malformed_bytes(
                    "code with scope length does not match its contents",
                ));
            }
            let scope = decode_document_body(&scope_bytes[..scope_size], options)?;
            let value = JavaScriptCodeWithScope {
                code: code.to_string(),
                scope,
            };
            (Bson::JavaScriptCodeWithScope(value), end)
        }
        ElementType::Int32 => {
            let v = i32::from_le_bytes(read_array(bytes, offset, element_type)?);
            (Bson::Int32(v), offset + 4)
        }
        ElementType::Timestamp => {
            let ts = Timestamp::from_le_bytes(read_array(bytes, offset, element_type)?);
            (Bson::Timestamp(ts), offset + 8)
        }
        ElementType::Int64 => {
            let v = i64::from_le_bytes(read_array(bytes, offset, element_type)?);
            (Bson::Int64(v), offset + 8)
        }
        ElementType::Decimal128 => {
            let d = Decimal128::from_bytes(read_array(bytes, offset, element_type)?);
            (Bson::Decimal128(d), offset + 16)
        }
    };
    Ok((value, None, end))
}

fn decode_binary(
    bytes: &[u8],
    offset: usize,
    options: &CodecOptions,
) -> Result<(Bson, Option<BinarySubtype>, usize)> {
    let len = read_len(bytes, offset)?;
    let [subtype] = read_array(bytes, offset + 4, ElementType::Binary)?;
    let subtype = BinarySubtype::from(subtype);
    let mut data_start = offset + 5;
    let end = checked_add(data_start, len)?;
    if end > bytes.len() {
        return Err(truncated(ElementType::Binary));
    }

    if let BinarySubtype::BinaryOld = subtype {
        let inner = read_len(bytes, data_start)?;
        if len < 4 || inner != len - 4 {
            return Err(Error::malformed_bytes(
                "invalid binary (st 2) - lengths don't match!",
            ));
        }
        data_start += 4;
    }
    let data = &bytes[data_start..end];

    let value = match (subtype, <[u8; 16]>::try_from(data)) {
        (BinarySubtype::Uuid, Ok(uuid)) => Bson::Uuid(Uuid::from_bytes(uuid)),
        (BinarySubtype::UuidOld, Ok(_)) => {
            let binary = Binary {
                subtype,
                bytes: data.to_vec(),
            };
            Bson::Uuid(binary.to_uuid_with_representation(options.uuid_representation().legacy())?)
        }
        _ => Bson::Binary(Binary {
            subtype,
            bytes: data.to_vec(),
        }),
    };
    Ok((value, Some(subtype), end))
}

fn truncated(element_type: ElementType) -> Error {
    Error::malformed_bytes(format!("truncated {element_type:?} value"))
}

fn read_array<const N: usize>(
    bytes: &[u8],
    offset: usize,
    element_type: ElementType,
) -> Result<[u8; N]> {
    bytes
        .get(offset..)
        .and_then(|rest| rest.get(..N))
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| truncated(element_type))
}

fn i32_from_slice(val: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = val
        .get(0..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            Error::malformed_bytes(format!(
                "expected 4 bytes to read i32, instead got {}",
                val.len()
            ))
        })?;
    Ok(i32::from_le_bytes(arr))
}

/// Reads a non-negative little-endian length prefix at `offset`.
fn read_len(bytes: &[u8], offset: usize) -> Result<usize> {
    let length = i32_from_slice(bytes.get(offset..).unwrap_or_default())?;
    usize::try_from(length)
        .map_err(|_| Error::malformed_bytes(format!("negative length {length}")))
}

/// Reads a length-prefixed, NUL-terminated UTF-8 string at `offset`, returning it with the
/// offset just past it.
fn read_string(bytes: &[u8], offset: usize) -> Result<(&str, usize)> {
    let len = read_len(bytes, offset)?;
    if len < 1 {
        return Err(Error::malformed_bytes(format!(
            "BSON length encoded string needs to be at least {MIN_BSON_STRING_SIZE} bytes, \
             instead got {}",
            len + 4
        )));
    }
    let start = offset + 4;
    let end = checked_add(start, len)?;
    if end > bytes.len() {
        return Err(Error::malformed_bytes(format!(
            "expected buffer to contain at least {end} bytes, but it only has {}",
            bytes.len()
        )));
    }
    if bytes[end - 1] != 0 {
        return Err(Error::malformed_bytes("string not null-terminated"));
    }
    Ok((try_to_str(&bytes[start..end - 1])?, end))
}

/// Reads a NUL-terminated UTF-8 string at `offset`, returning it with the offset just past the
/// terminator.
fn read_cstring(bytes: &[u8], offset: usize) -> Result<(&str, usize)> {
    let rest = bytes.get(offset..).unwrap_or_default();
    let nul = rest
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| Error::malformed_bytes("expected null terminator for cstring"))?;
    Ok((try_to_str(&rest[..nul])?, offset + nul + 1))
}

fn try_to_str(data: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(data).map_err(|_| ErrorKind::Utf8Encoding.into())
}

fn checked_add(lhs: usize, rhs: usize) -> Result<usize> {
    lhs.checked_add(rhs)
        .ok_or_else(|| Error::malformed_bytes("attempted to add with overflow"))
}
