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

//! BSON is a binary format in which zero or more key/value pairs are stored as a single entity.
//! We call this entity a document.
//!
//! This library supports version 1.1 of the [BSON standard](http://bsonspec.org/spec.html). It
//! provides an eager codec between [`Document`]s and bytes, an extension point for native types
//! ([`Transformer`]), and lazy access to encoded documents ([`RawDocumentView`]) and arrays
//! ([`RawArrayIter`]).
//!
//! ## Basic usage
//!
//! ```rust
//! use lazybson::{decode_document, doc, encode_document, Bson, CodecOptions};
//!
//! let options = CodecOptions::default();
//! let doc = doc! { "hello": "world", "count": 3 };
//!
//! let bytes = encode_document(&doc, false, &options)?;
//! assert_eq!(&bytes[..4], &(bytes.len() as i32).to_le_bytes());
//!
//! let back = decode_document(&bytes, &options)?;
//! assert_eq!(back.get("hello"), Some(&Bson::String("world".into())));
//! assert_eq!(back, doc);
//! # Ok::<(), lazybson::error::Error>(())
//! ```
//!
//! ## Choosing a container
//!
//! Decoding is generic over any [`DocumentMap`]. `Vec<(String, Bson)>` keeps duplicate field
//! names, `BTreeMap<String, Bson>` sorts them.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use lazybson::{decode_document_as, doc, encode_document, Bson, CodecOptions};
//!
//! let options = CodecOptions::default();
//! let bytes = encode_document(&doc! { "b": 1, "a": 2 }, false, &options)?;
//! let sorted: BTreeMap<String, Bson> = decode_document_as(&bytes, &options)?;
//! assert_eq!(sorted.keys().collect::<Vec<_>>(), ["a", "b"]);
//! # Ok::<(), lazybson::error::Error>(())
//! ```
//!
//! ## Logging
//!
//! State changes of lazy views and batch decodes are reported through [`tracing`] at the
//! `debug` and `trace` levels. Install a subscriber to see them.

#![allow(clippy::cognitive_complexity, clippy::derive_partial_eq_without_eq)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use self::{
    binary::Binary,
    bson::{Array, Bson, Custom, CustomValue, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    decimal128::Decimal128,
    decoder::{
        decode_all,
        decode_all_as,
        decode_all_values,
        decode_document,
        decode_document_as,
        decode_document_with_length,
        decode_element,
        decode_value,
        is_valid,
    },
    document::{Document, DocumentMap},
    encoder::{encode, encode_document, encode_element},
    oid::ObjectId,
    options::{CodecOptions, CodecOptionsBuilder, UuidRepresentation},
    raw::{RawArrayIter, RawDocumentView, RawValue},
    transformer::{Transformer, TransformerRegistry},
    uuid::Uuid,
};

#[macro_use]
mod macros;
mod binary;
mod bson;
pub mod datetime;
mod decimal128;
mod decoder;
pub mod document;
mod encoder;
pub mod error;
pub mod oid;
pub mod options;
pub mod raw;
pub mod spec;
pub mod transformer;
pub mod uuid;
