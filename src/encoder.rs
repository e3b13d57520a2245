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

//! Encoder

use std::borrow::Cow;

use crate::{
    bson::{Bson, DbPointer, JavaScriptCodeWithScope, Regex},
    document::DocumentMap,
    error::{Error, Result},
    options::CodecOptions,
    spec::BinarySubtype,
    Binary,
};

/// Encodes a top-level value into a standalone document.
///
/// `value` must be a [`Bson::Document`], or a [`Bson::Custom`] whose encode hook produces one.
/// Anything else fails with [`ErrorKind::InvalidDocument`](crate::error::ErrorKind).
///
/// ```
/// use lazybson::{doc, encode, Bson, CodecOptions};
///
/// let bytes = encode(&Bson::Document(doc! { "a": 1 }), false, &CodecOptions::default())?;
/// assert_eq!(bytes, b"\x0c\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x00");
/// # Ok::<(), lazybson::error::Error>(())
/// ```
pub fn encode(value: &Bson, check_keys: bool, options: &CodecOptions) -> Result<Vec<u8>> {
    match value {
        Bson::Document(doc) => encode_document(doc, check_keys, options),
        Bson::Custom(custom) => {
            match options.transformer_registry().transform_for_encode(custom)? {
                Bson::Document(doc) => encode_document(&doc, check_keys, options),
                other => Err(Error::invalid_document(format!(
                    "encoder expected a document, but {} was transformed into {}",
                    custom.type_name(),
                    other.type_name()
                ))),
            }
        }
        other => Err(Error::invalid_document(format!(
            "encoder expected a document, got {}",
            other.type_name()
        ))),
    }
}

/// Encodes a mapping into a standalone document.
///
/// Fields are written in the mapping's iteration order. With `check_keys` set, top-level names
/// beginning with `$` or containing `.` are rejected.
pub fn encode_document<M>(doc: &M, check_keys: bool, options: &CodecOptions) -> Result<Vec<u8>>
where
    M: DocumentMap + ?Sized,
{
    let mut encoder = Encoder::new(options);
    encoder.write_document(doc.iter_entries(), check_keys)?;
    Ok(encoder.buf)
}

/// Encodes a single element: its type tag, its name and its payload.
///
/// [`Bson::Custom`] values are converted by the registered transformers first.
pub fn encode_element(name: &str, value: &Bson, options: &CodecOptions) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(options);
    encoder
        .write_element(name, value)
        .map_err(|e| e.with_key(name))?;
    Ok(encoder.buf)
}

fn validate_key(key: &str) -> Result<()> {
    if key.starts_with('$') {
        return Err(Error::invalid_document(format!(
            "key {key:?} must not start with '$'"
        )));
    }
    if key.contains('.') {
        return Err(Error::invalid_document(format!(
            "key {key:?} must not contain '.'"
        )));
    }
    Ok(())
}

fn len_to_i32(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| Error::invalid_document(format!("{len} bytes exceeds the maximum BSON size")))
}

struct Encoder<'o> {
    buf: Vec<u8>,
    options: &'o CodecOptions,
}

impl<'o> Encoder<'o> {
    fn new(options: &'o CodecOptions) -> Self {
        Self {
            buf: Vec::new(),
            options,
        }
    }

    /// Reserves four bytes for a length prefix and returns their position.
    fn reserve_len(&mut self) -> usize {
        let at = self.buf.len();
        self.buf.extend_from_slice(&[0; 4]);
        at
    }

    /// Fills a reserved length prefix with the number of bytes written since it was reserved.
    fn patch_len(&mut self, at: usize) -> Result<()> {
        let len = len_to_i32(self.buf.len() - at)?;
        self.buf[at..at + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn write_i32(&mut self, val: i32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    fn write_cstring(&mut self, s: &str, what: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::invalid_document(format!(
                "{what} must not contain a NUL byte"
            )));
        }
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_i32(len_to_i32(s.len() + 1)?);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    fn write_document<'a>(
        &mut self,
        entries: impl Iterator<Item = (&'a str, &'a Bson)>,
        check_keys: bool,
    ) -> Result<()> {
        let start = self.reserve_len();
        for (key, value) in entries {
            if check_keys {
                validate_key(key).map_err(|e| e.with_key(key))?;
            }
            self.write_element(key, value).map_err(|e| e.with_key(key))?;
        }
        self.buf.push(0);
        self.patch_len(start)
    }

    fn write_array(&mut self, values: &[Bson]) -> Result<()> {
        let start = self.reserve_len();
        for (index, value) in values.iter().enumerate() {
            self.write_element(&index.to_string(), value)
                .map_err(|e| e.with_index(index))?;
        }
        self.buf.push(0);
        self.patch_len(start)
    }

    fn write_binary(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> Result<()> {
        if let BinarySubtype::BinaryOld = subtype {
            self.write_i32(len_to_i32(bytes.len() + 4)?);
            self.buf.push(subtype.into());
            self.write_i32(len_to_i32(bytes.len())?);
        } else {
            self.write_i32(len_to_i32(bytes.len())?);
            self.buf.push(subtype.into());
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_element(&mut self, name: &str, value: &Bson) -> Result<()> {
        let value = match value {
            Bson::Custom(custom) => Cow::Owned(
                self.options
                    .transformer_registry()
                    .transform_for_encode(custom)?,
            ),
            other => Cow::Borrowed(other),
        };
        let element_type = value
            .element_type()
            .ok_or_else(|| Error::unsupported_type(value.type_name()))?;

        self.buf.push(element_type as u8);
        self.write_cstring(name, "key")?;

        match value.as_ref() {
            Bson::Double(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Bson::String(s) | Bson::JavaScriptCode(s) | Bson::Symbol(s) => self.write_string(s)?,
            Bson::Array(values) => self.write_array(values)?,
            Bson::Document(doc) => self.write_document(doc.iter_entries(), false)?,
            Bson::Boolean(b) => self.buf.push(u8::from(*b)),
            Bson::RegularExpression(Regex { pattern, options }) => {
                self.write_cstring(pattern, "regex pattern")?;
                self.write_cstring(options, "regex options")?;
            }
            Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => {
                let start = self.reserve_len();
                self.write_string(code)?;
                self.write_document(scope.iter_entries(), false)?;
                self.patch_len(start)?;
            }
            Bson::Int32(v) => self.write_i32(*v),
            Bson::Int64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Bson::Timestamp(ts) => self.buf.extend_from_slice(&ts.to_le_bytes()),
            Bson::Binary(Binary { subtype, bytes }) => self.write_binary(*subtype, bytes)?,
            Bson::Uuid(uuid) => {
                let binary = Binary::from_uuid_with_representation(
                    *uuid,
                    self.options.uuid_representation(),
                );
                self.write_binary(binary.subtype, &binary.bytes)?;
            }
            Bson::ObjectId(id) => self.buf.extend_from_slice(&id.bytes()),
            Bson::DateTime(dt) => self
                .buf
                .extend_from_slice(&dt.timestamp_millis().to_le_bytes()),
            Bson::Decimal128(d) => self.buf.extend_from_slice(&d.bytes()),
            Bson::DbPointer(DbPointer { namespace, id }) => {
                self.write_string(namespace)?;
                self.buf.extend_from_slice(&id.bytes());
            }
            Bson::Null | Bson::Undefined | Bson::MinKey | Bson::MaxKey => {}
            Bson::Custom(custom) => return Err(Error::unsupported_type(custom.type_name())),
        }
        Ok(())
    }
}
