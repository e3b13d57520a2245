//! User-registered conversions between native Rust types and BSON values.
//!
//! A [`Transformer`] carries up to two independent hooks. The encode hook claims
//! [`Bson::Custom`] values holding one particular Rust type and turns them into an encodable
//! [`Bson`] value. The decode hook claims decoded values of one wire type (optionally narrowed
//! to a binary subtype) and turns them into whatever value the application wants, typically a
//! [`Bson::Custom`]. A transformer with only one hook takes part only in that direction.
//!
//! Transformers live in an ordered [`TransformerRegistry`]; the first transformer whose hook
//! matches wins. The registry is consulted exactly once per field: the value an encode hook
//! returns is written by the built-in encoder, and the value a decode hook returns is stored
//! as-is.
//!
//! ```
//! use lazybson::{spec::ElementType, transformer::DecodeMatcher};
//! use lazybson::{Bson, Custom, Transformer, TransformerRegistry};
//!
//! #[derive(Debug, PartialEq)]
//! struct Celsius(f64);
//!
//! let transformer = Transformer::new()
//!     .encode_with(|c: &Celsius| Ok(Bson::Double(c.0)))
//!     .decode_with(DecodeMatcher::element(ElementType::Double), |v| {
//!         Ok(Bson::Custom(Custom::new(Celsius(v.as_f64().unwrap_or_default()))))
//!     });
//! let registry = TransformerRegistry::new().with(transformer);
//! assert_eq!(registry.len(), 1);
//! ```

use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use crate::{
    bson::{Bson, Custom},
    error::{Error, Result},
    spec::{BinarySubtype, ElementType},
};

type EncodeHook = Arc<dyn Fn(&dyn Any) -> Result<Bson> + Send + Sync>;
type DecodeHook = Arc<dyn Fn(Bson) -> Result<Bson> + Send + Sync>;

/// Selects the decoded values a decode hook applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodeMatcher {
    /// The wire element type to match.
    pub element_type: ElementType,

    /// For binary values, the wire subtype to match. `None` matches every subtype.
    pub subtype: Option<BinarySubtype>,
}

impl DecodeMatcher {
    /// Matches every value of the given element type.
    pub fn element(element_type: ElementType) -> Self {
        Self {
            element_type,
            subtype: None,
        }
    }

    /// Matches binary values with the given subtype.
    pub fn binary(subtype: BinarySubtype) -> Self {
        Self {
            element_type: ElementType::Binary,
            subtype: Some(subtype),
        }
    }

    fn matches(&self, element_type: ElementType, subtype: Option<BinarySubtype>) -> bool {
        self.element_type == element_type && (self.subtype.is_none() || self.subtype == subtype)
    }
}

struct EncodeEntry {
    type_id: TypeId,
    type_name: &'static str,
    hook: EncodeHook,
}

struct DecodeEntry {
    matcher: DecodeMatcher,
    hook: DecodeHook,
}

/// A pair of optional conversion hooks. See the [module level documentation](self).
#[derive(Clone, Default)]
pub struct Transformer {
    encode: Option<Arc<EncodeEntry>>,
    decode: Option<Arc<DecodeEntry>>,
}

impl Transformer {
    /// Creates a transformer with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encode hook, which claims [`Bson::Custom`] values holding a `T`.
    pub fn encode_with<T, F>(mut self, hook: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<Bson> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let hook: EncodeHook = Arc::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(value) => hook(value),
            None => Err(Error::transform(format!("encode hook expected {type_name}"))),
        });
        self.encode = Some(Arc::new(EncodeEntry {
            type_id: TypeId::of::<T>(),
            type_name,
            hook,
        }));
        self
    }

    /// Sets the decode hook, which receives every decoded value selected by `matcher`.
    pub fn decode_with<F>(mut self, matcher: DecodeMatcher, hook: F) -> Self
    where
        F: Fn(Bson) -> Result<Bson> + Send + Sync + 'static,
    {
        self.decode = Some(Arc::new(DecodeEntry {
            matcher,
            hook: Arc::new(hook),
        }));
        self
    }

    /// Whether this transformer takes part in encoding.
    pub fn has_encode_hook(&self) -> bool {
        self.encode.is_some()
    }

    /// Whether this transformer takes part in decoding.
    pub fn has_decode_hook(&self) -> bool {
        self.decode.is_some()
    }

    fn encodes(&self, type_id: TypeId) -> bool {
        self.encode.as_ref().is_some_and(|e| e.type_id == type_id)
    }

    fn decodes(&self, element_type: ElementType, subtype: Option<BinarySubtype>) -> bool {
        self.decode
            .as_ref()
            .is_some_and(|d| d.matcher.matches(element_type, subtype))
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("encode", &self.encode.as_ref().map(|e| e.type_name))
            .field("decode", &self.decode.as_ref().map(|d| d.matcher))
            .finish()
    }
}

/// An ordered set of [`Transformer`]s. Lookup is first-match-wins in registration order.
#[derive(Clone, Debug, Default)]
pub struct TransformerRegistry {
    transformers: Vec<Transformer>,
}

impl TransformerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transformer.
    pub fn register(&mut self, transformer: Transformer) {
        self.transformers.push(transformer);
    }

    /// Appends a transformer, returning the registry for chaining.
    pub fn with(mut self, transformer: Transformer) -> Self {
        self.register(transformer);
        self
    }

    /// The number of registered transformers.
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Whether no transformers are registered.
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// The first transformer whose encode hook claims `value`.
    pub fn match_for_encode(&self, value: &Custom) -> Option<&Transformer> {
        let type_id = value.value_type_id();
        self.transformers.iter().find(|t| t.encodes(type_id))
    }

    /// The first transformer whose decode hook claims values of the given wire type.
    pub fn match_for_decode(
        &self,
        element_type: ElementType,
        subtype: Option<BinarySubtype>,
    ) -> Option<&Transformer> {
        self.transformers
            .iter()
            .find(|t| t.decodes(element_type, subtype))
    }

    /// Converts a custom value into an encodable one.
    pub(crate) fn transform_for_encode(&self, value: &Custom) -> Result<Bson> {
        let entry = self
            .match_for_encode(value)
            .and_then(|t| t.encode.as_ref())
            .ok_or_else(|| Error::unsupported_type(value.type_name()))?;
        match (entry.hook)(value.as_any())? {
            Bson::Custom(inner) => Err(Error::unsupported_type(inner.type_name())),
            encoded => Ok(encoded),
        }
    }

    /// Runs the matching decode hook over a freshly decoded value, if any matches.
    pub(crate) fn transform_for_decode(
        &self,
        element_type: ElementType,
        subtype: Option<BinarySubtype>,
        value: Bson,
    ) -> Result<Bson> {
        match self
            .match_for_decode(element_type, subtype)
            .and_then(|t| t.decode.as_ref())
        {
            Some(entry) => (entry.hook)(value),
            None => Ok(value),
        }
    }
}
