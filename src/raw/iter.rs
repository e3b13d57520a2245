use std::iter::FusedIterator;

use crate::{
    bson::Bson,
    decoder::{decode_payload, element_type, read_document_frame, read_element_header},
    error::Result,
    options::CodecOptions,
    raw::RawDocumentView,
    spec::ElementType,
};

/// An element produced by a [`RawArrayIter`].
#[derive(Debug)]
pub enum RawValue<'a> {
    /// An embedded document, not yet decoded.
    Document(RawDocumentView<'a>),

    /// An embedded array, not yet decoded.
    Array(RawArrayIter<'a>),

    /// Any other value, decoded eagerly.
    Value(Bson),
}

impl<'a> RawValue<'a> {
    /// Returns the document view if this is an embedded document.
    pub fn as_document(&self) -> Option<&RawDocumentView<'a>> {
        match self {
            RawValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the document view if this is an embedded document.
    pub fn into_document(self) -> Option<RawDocumentView<'a>> {
        match self {
            RawValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the nested iterator if this is an embedded array.
    pub fn into_array(self) -> Option<RawArrayIter<'a>> {
        match self {
            RawValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns the decoded value if this is neither a document nor an array.
    pub fn as_value(&self) -> Option<&Bson> {
        match self {
            RawValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// A single pass over the elements of an encoded array.
///
/// Element names are skipped without checking that they count up from `"0"`. Once an element
/// fails to decode the error is yielded and iteration ends. To walk the array again, build a
/// new iterator over the same bytes.
#[derive(Debug, Clone)]
pub struct RawArrayIter<'a> {
    bytes: &'a [u8],
    options: CodecOptions,
    offset: usize,
    index: usize,
    valid: bool,
}

impl<'a> RawArrayIter<'a> {
    /// Checks the array's declared length and terminator and positions the iterator before
    /// the first element.
    pub fn new(bytes: &'a [u8], options: &CodecOptions) -> Result<Self> {
        let size = read_document_frame(bytes)?;
        Ok(Self {
            bytes: &bytes[..size],
            options: options.clone(),
            offset: 4,
            index: 0,
            valid: true,
        })
    }

    /// The encoded array this iterator walks, including its length prefix and terminator.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    fn next_element(&self) -> Result<(RawValue<'a>, usize)> {
        let body: &'a [u8] = &self.bytes[..self.bytes.len() - 1];
        let (tag, _, payload) = read_element_header(body, self.offset)?;
        match element_type(tag)? {
            ElementType::EmbeddedDocument => {
                let sub = &body[payload..];
                let size = read_document_frame(sub)?;
                let view = RawDocumentView::new(&sub[..size], &self.options);
                Ok((RawValue::Document(view), payload + size))
            }
            ElementType::Array => {
                let sub = &body[payload..];
                let size = read_document_frame(sub)?;
                let array = RawArrayIter::new(&sub[..size], &self.options)?;
                Ok((RawValue::Array(array), payload + size))
            }
            other => {
                let (value, end) = decode_payload(other, body, payload, &self.options)?;
                Ok((RawValue::Value(value), end))
            }
        }
    }
}

impl<'a> Iterator for RawArrayIter<'a> {
    type Item = Result<RawValue<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.valid || self.offset >= self.bytes.len() - 1 {
            return None;
        }

        match self.next_element() {
            Ok((value, next)) => {
                self.offset = next;
                self.index += 1;
                Some(Ok(value))
            }
            Err(error) => {
                self.valid = false;
                Some(Err(error.with_index(self.index)))
            }
        }
    }
}

impl FusedIterator for RawArrayIter<'_> {}
