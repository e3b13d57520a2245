//! A BSON document represented as an associative HashMap with insertion ordering, and the
//! [`DocumentMap`] capability any mapping must have to be encoded or decoded.

use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    iter::{Extend, FromIterator, IntoIterator},
};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    bson::{Array, Bson, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    Binary,
    DateTime,
    Decimal128,
};

/// The narrow set of mapping operations the codec needs from a container.
///
/// Encoding walks [`iter_entries`](DocumentMap::iter_entries) in order; decoding builds a
/// container with [`Default`] and [`insert`](DocumentMap::insert). Implemented for
/// [`Document`], for `BTreeMap<String, Bson>` (sorted keys) and for `Vec<(String, Bson)>`
/// (keeps duplicate names exactly as they appear on the wire).
pub trait DocumentMap: Default {
    /// The number of fields.
    fn len(&self) -> usize;

    /// Whether the mapping has no fields.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&Bson>;

    /// Stores `value` under `key`, returning the value it replaced.
    fn insert(&mut self, key: String, value: Bson) -> Option<Bson>;

    /// Removes the value stored under `key`.
    fn remove(&mut self, key: &str) -> Option<Bson>;

    /// The fields in encoding order.
    fn iter_entries(&self) -> Box<dyn Iterator<Item = (&str, &Bson)> + '_>;
}

/// A BSON document represented as an associative HashMap with insertion ordering.
#[derive(Clone, PartialEq, Default)]
pub struct Document {
    inner: IndexMap<String, Bson, RandomState>,
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{k}\": {v}")?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Document(")?;
        Debug::fmt(&self.inner, fmt)?;
        write!(fmt, ")")
    }
}

/// An owning iterator over Document entries.
pub struct IntoIter {
    inner: indexmap::map::IntoIter<String, Bson>,
}

/// An iterator over Document entries.
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, String, Bson>,
}

/// An iterator over a Document's keys.
pub struct Keys<'a> {
    inner: indexmap::map::Keys<'a, String, Bson>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a String;

    fn next(&mut self) -> Option<&'a String> {
        self.inner.next()
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.inner.iter(),
        }
    }
}

impl<K: Into<String>, V: Into<Bson>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Iterator for IntoIter {
    type Item = (String, Bson);

    fn next(&mut self) -> Option<(String, Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a Bson);

    fn next(&mut self) -> Option<(&'a String, &'a Bson)> {
        self.inner.next()
    }
}

impl Document {
    /// Creates a new empty Document.
    pub fn new() -> Document {
        Document {
            inner: IndexMap::default(),
        }
    }

    /// Gets an iterator over the entries of the map.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// Clears the document, removing all values.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns a reference to the Bson corresponding to the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Gets a mutable reference to the Bson corresponding to the key
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        self.inner.get_mut(key.as_ref())
    }

    fn get_typed<'a, T>(
        &'a self,
        key: impl AsRef<str>,
        expected: ElementType,
        f: impl FnOnce(&'a Bson) -> Option<T>,
    ) -> Result<T> {
        let key = key.as_ref();
        let value = self
            .get(key)
            .ok_or_else(|| Error::value_access_not_present().with_key(key))?;
        f(value).ok_or_else(|| {
            Error::value_access_unexpected_type(value.element_type(), expected).with_key(key)
        })
    }

    /// Get a floating point value for this key if it exists and has the correct type.
    pub fn get_f64(&self, key: impl AsRef<str>) -> Result<f64> {
        self.get_typed(key, ElementType::Double, Bson::as_f64)
    }

    /// Get a reference to a Decimal128 value for this key if it exists and has the correct type.
    pub fn get_decimal128(&self, key: impl AsRef<str>) -> Result<&Decimal128> {
        self.get_typed(key, ElementType::Decimal128, |v| match v {
            Bson::Decimal128(d) => Some(d),
            _ => None,
        })
    }

    /// Get a string slice this key if it exists and has the correct type.
    pub fn get_str(&self, key: impl AsRef<str>) -> Result<&str> {
        self.get_typed(key, ElementType::String, Bson::as_str)
    }

    /// Get a reference to an array for this key if it exists and has the correct type.
    pub fn get_array(&self, key: impl AsRef<str>) -> Result<&Array> {
        self.get_typed(key, ElementType::Array, Bson::as_array)
    }

    /// Get a reference to a document for this key if it exists and has the correct type.
    pub fn get_document(&self, key: impl AsRef<str>) -> Result<&Document> {
        self.get_typed(key, ElementType::EmbeddedDocument, Bson::as_document)
    }

    /// Get a mutable reference to a document for this key if it exists and has the correct
    /// type.
    pub fn get_document_mut(&mut self, key: impl AsRef<str>) -> Result<&mut Document> {
        let key = key.as_ref();
        match self.inner.get_mut(key) {
            Some(Bson::Document(doc)) => Ok(doc),
            Some(other) => Err(Error::value_access_unexpected_type(
                other.element_type(),
                ElementType::EmbeddedDocument,
            )
            .with_key(key)),
            None => Err(Error::value_access_not_present().with_key(key)),
        }
    }

    /// Get a bool value for this key if it exists and has the correct type.
    pub fn get_bool(&self, key: impl AsRef<str>) -> Result<bool> {
        self.get_typed(key, ElementType::Boolean, Bson::as_bool)
    }

    /// Returns whether this key has a null value.
    pub fn is_null(&self, key: impl AsRef<str>) -> bool {
        self.get(key) == Some(&Bson::Null)
    }

    /// Get an i32 value for this key if it exists and has the correct type.
    pub fn get_i32(&self, key: impl AsRef<str>) -> Result<i32> {
        self.get_typed(key, ElementType::Int32, Bson::as_i32)
    }

    /// Get an i64 value for this key if it exists and has the correct type.
    pub fn get_i64(&self, key: impl AsRef<str>) -> Result<i64> {
        self.get_typed(key, ElementType::Int64, Bson::as_i64)
    }

    /// Get a time stamp value for this key if it exists and has the correct type.
    pub fn get_timestamp(&self, key: impl AsRef<str>) -> Result<Timestamp> {
        self.get_typed(key, ElementType::Timestamp, Bson::as_timestamp)
    }

    /// Get a reference to a generic binary value for this key if it exists and has the correct
    /// type.
    pub fn get_binary_generic(&self, key: impl AsRef<str>) -> Result<&Vec<u8>> {
        self.get_typed(key, ElementType::Binary, |v| match v {
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            }) => Some(bytes),
            _ => None,
        })
    }

    /// Get an object id value for this key if it exists and has the correct type.
    pub fn get_object_id(&self, key: impl AsRef<str>) -> Result<ObjectId> {
        self.get_typed(key, ElementType::ObjectId, Bson::as_object_id)
    }

    /// Get a reference to a UTC datetime value for this key if it exists and has the correct
    /// type.
    pub fn get_datetime(&self, key: impl AsRef<str>) -> Result<&DateTime> {
        self.get_typed(key, ElementType::DateTime, Bson::as_datetime)
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a collection of all keys in the document.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            inner: self.inner.keys(),
        }
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the document contains no elements
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sets the value of the entry with the OccupiedEntry's key,
    /// and returns the entry's old value. Accepts any type that
    /// can be converted into Bson.
    pub fn insert<KT: Into<String>, BT: Into<Bson>>(&mut self, key: KT, val: BT) -> Option<Bson> {
        self.inner.insert(key.into(), val.into())
    }

    /// Takes the value of the entry out of the document, and returns it.
    /// Computes in **O(n)** time (average), preserving the order of the remaining fields.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }
}

impl Extend<(String, Bson)> for Document {
    fn extend<T: IntoIterator<Item = (String, Bson)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl DocumentMap for Document {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, key: &str) -> Option<&Bson> {
        self.inner.get(key)
    }

    fn insert(&mut self, key: String, value: Bson) -> Option<Bson> {
        self.inner.insert(key, value)
    }

    fn remove(&mut self, key: &str) -> Option<Bson> {
        self.inner.shift_remove(key)
    }

    fn iter_entries(&self) -> Box<dyn Iterator<Item = (&str, &Bson)> + '_> {
        Box::new(self.inner.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl DocumentMap for BTreeMap<String, Bson> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &str) -> Option<&Bson> {
        BTreeMap::get(self, key)
    }

    fn insert(&mut self, key: String, value: Bson) -> Option<Bson> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &str) -> Option<Bson> {
        BTreeMap::remove(self, key)
    }

    fn iter_entries(&self) -> Box<dyn Iterator<Item = (&str, &Bson)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// A field list. `insert` always appends, so duplicate names decoded from the wire survive;
/// `get` returns the first match and `remove` removes every match.
impl DocumentMap for Vec<(String, Bson)> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, key: &str) -> Option<&Bson> {
        self.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v)
    }

    fn insert(&mut self, key: String, value: Bson) -> Option<Bson> {
        self.push((key, value));
        None
    }

    fn remove(&mut self, key: &str) -> Option<Bson> {
        let mut removed = None;
        self.retain_mut(|(k, v)| {
            if k.as_str() == key {
                if removed.is_none() {
                    removed = Some(std::mem::take(v));
                }
                false
            } else {
                true
            }
        });
        removed
    }

    fn iter_entries(&self) -> Box<dyn Iterator<Item = (&str, &Bson)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}
