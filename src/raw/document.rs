use std::{borrow::Cow, cell::OnceCell, fmt};

use tracing::{debug, trace};

use crate::{
    bson::Bson,
    decoder::{self, read_document_frame, read_element_header, skip_payload},
    document::{Document, Iter, Keys},
    encoder::encode_document,
    error::{Error, Result},
    options::CodecOptions,
};

/// A document whose bytes are decoded on first access.
///
/// The view moves through three states: raw (only bytes), inflated (bytes plus the decoded
/// fields, which agree), and dirty (the decoded fields have been edited and the bytes are
/// stale). Reading any field inflates; [`set`](Self::set) and [`remove`](Self::remove) make
/// it dirty; [`raw_bytes`](Self::raw_bytes) re-encodes a dirty view and makes it clean again.
///
/// Construction never fails. A malformed buffer is reported by the first call that needs to
/// decode it.
///
/// Inflation always produces a plain [`Document`], whatever container the caller decodes
/// into elsewhere. The view keeps the rest of the options it was given, including decode hooks.
pub struct RawDocumentView<'a> {
    raw: Cow<'a, [u8]>,
    options: CodecOptions,
    inflated: OnceCell<Document>,
    dirty: bool,
}

impl<'a> RawDocumentView<'a> {
    /// Wraps `bytes`, which should hold exactly one document. Nothing is decoded yet.
    pub fn new(bytes: impl Into<Cow<'a, [u8]>>, options: &CodecOptions) -> Self {
        Self {
            raw: bytes.into(),
            options: options.clone(),
            inflated: OnceCell::new(),
            dirty: false,
        }
    }

    /// Encodes `doc` and wraps the result.
    pub fn from_document(doc: &Document, options: &CodecOptions) -> Result<RawDocumentView<'static>> {
        let bytes = encode_document(doc, false, options)?;
        Ok(RawDocumentView::new(bytes, options))
    }

    fn inflated(&self) -> Result<&Document> {
        if let Some(doc) = self.inflated.get() {
            return Ok(doc);
        }
        let doc = decoder::decode_document(&self.raw, &self.options)?;
        debug!(bytes = self.raw.len(), fields = doc.len(), "inflated raw document");
        Ok(self.inflated.get_or_init(|| doc))
    }

    fn inflated_mut(&mut self) -> Result<&mut Document> {
        self.inflated()?;
        self.inflated
            .get_mut()
            .ok_or_else(|| Error::malformed_bytes("raw document failed to inflate"))
    }

    /// The value stored under `key`.
    pub fn get(&self, key: impl AsRef<str>) -> Result<Option<&Bson>> {
        Ok(self.inflated()?.get(key))
    }

    /// Whether a field named `key` exists. A view that has not been inflated is scanned in place
    /// without decoding any values.
    pub fn contains_key(&self, key: impl AsRef<str>) -> Result<bool> {
        let key = key.as_ref();
        if let Some(doc) = self.inflated.get() {
            return Ok(doc.contains_key(key));
        }

        let size = read_document_frame(&self.raw)?;
        let body = &self.raw[..size - 1];
        let mut position = 4;
        while position < body.len() {
            let (tag, name, payload) = read_element_header(body, position)?;
            if name == key {
                return Ok(true);
            }
            position = skip_payload(decoder::element_type(tag)?, body, payload)
                .map_err(|e| e.with_key(name))?;
        }
        Ok(false)
    }

    /// The field names, in order.
    pub fn keys(&self) -> Result<Keys<'_>> {
        Ok(self.inflated()?.keys())
    }

    /// The fields, in order.
    pub fn iter(&self) -> Result<Iter<'_>> {
        Ok(self.inflated()?.iter())
    }

    /// The number of fields.
    pub fn len(&self) -> Result<usize> {
        Ok(self.inflated()?.len())
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.inflated()?.is_empty())
    }

    /// Sets a field, returning the value it replaced. The view becomes dirty.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Result<Option<Bson>> {
        let key = key.into();
        trace!(key = key.as_str(), "setting field on raw document");
        let old = self.inflated_mut()?.insert(key, value);
        self.dirty = true;
        Ok(old)
    }

    /// Removes a field, returning its value. The view becomes dirty even if the field was absent.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Result<Option<Bson>> {
        let key = key.as_ref();
        trace!(key, "removing field from raw document");
        let old = self.inflated_mut()?.remove(key);
        self.dirty = true;
        Ok(old)
    }

    /// The encoded document.
    ///
    /// A clean view returns the bytes it was built from, unchanged. A dirty view first
    /// re-encodes its fields and keeps the result as its new bytes. If re-encoding fails the
    /// error is returned, the fields are left as they were and the view stays dirty.
    pub fn raw_bytes(&mut self) -> Result<&[u8]> {
        if self.dirty {
            let doc = self.inflated()?;
            match encode_document(doc, false, &self.options) {
                Ok(bytes) => {
                    debug!(bytes = bytes.len(), "re-encoded dirty raw document");
                    self.raw = Cow::Owned(bytes);
                    self.dirty = false;
                }
                Err(error) => {
                    debug!(%error, "failed to re-encode dirty raw document");
                    return Err(error);
                }
            }
        }
        Ok(&self.raw)
    }

    /// Consumes the view, returning its encoded bytes. See [`raw_bytes`](Self::raw_bytes).
    pub fn into_bytes(mut self) -> Result<Cow<'a, [u8]>> {
        self.raw_bytes()?;
        Ok(self.raw)
    }

    /// Consumes the view, returning its decoded fields.
    pub fn into_document(self) -> Result<Document> {
        self.inflated()?;
        self.inflated
            .into_inner()
            .ok_or_else(|| Error::malformed_bytes("raw document failed to inflate"))
    }

    /// Whether the fields have been decoded.
    pub fn is_inflated(&self) -> bool {
        self.inflated.get().is_some()
    }

    /// Whether the fields have been edited since the bytes were last encoded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The options this view decodes and encodes with.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Views are equal when their decoded fields are equal, regardless of how the bytes are laid
/// out. A view that fails to decode is equal to nothing.
impl PartialEq for RawDocumentView<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.inflated(), other.inflated()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<Document> for RawDocumentView<'_> {
    fn eq(&self, other: &Document) -> bool {
        self.inflated().is_ok_and(|doc| doc == other)
    }
}

impl fmt::Debug for RawDocumentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RawDocumentView");
        match self.inflated() {
            Ok(doc) => s.field("fields", doc),
            Err(_) => s.field("raw", &hex::encode(&self.raw)),
        };
        s.field("dirty", &self.dirty).finish()
    }
}

impl fmt::Display for RawDocumentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inflated() {
            Ok(doc) => fmt::Display::fmt(doc, f),
            Err(error) => write!(f, "<malformed document: {error}>"),
        }
    }
}
