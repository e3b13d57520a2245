//! Lazy access to encoded BSON.
//!
//! A [`RawDocumentView`] wraps the bytes of one document and decodes them only when a field
//! is first read. Edits go to the decoded fields and mark the view dirty; the bytes are
//! re-encoded the next time they are requested.
//!
//! ```
//! use lazybson::{doc, encode_document, CodecOptions, RawDocumentView};
//!
//! let options = CodecOptions::default();
//! let bytes = encode_document(&doc! { "name": "Sherlock" }, false, &options)?;
//!
//! let mut view = RawDocumentView::new(&bytes[..], &options);
//! assert!(!view.is_inflated());
//! assert_eq!(view.get("name")?.and_then(|v| v.as_str()), Some("Sherlock"));
//! assert!(view.is_inflated());
//!
//! // Untouched views hand back their original bytes.
//! assert_eq!(view.raw_bytes()?, &bytes[..]);
//!
//! view.set("street", "Baker Street")?;
//! assert!(view.is_dirty());
//! let updated = view.raw_bytes()?.to_vec();
//! assert!(!view.is_dirty());
//! assert_ne!(updated, bytes);
//! # Ok::<(), lazybson::error::Error>(())
//! ```
//!
//! A [`RawArrayIter`] walks the elements of an encoded array once. Embedded documents come back
//! as views over the same buffer, embedded arrays as nested iterators; everything else is
//! decoded eagerly.
//!
//! Views and iterators are not synchronized. A view caches its decoded fields in a
//! [`std::cell::OnceCell`], so it can be sent to another thread but not shared between threads;
//! callers that need concurrent access must serialize it themselves.

mod document;
mod iter;

pub use self::{
    document::RawDocumentView,
    iter::{RawArrayIter, RawValue},
};
