//! Configuration threaded through every encode and decode call.

use std::sync::Arc;

use crate::transformer::TransformerRegistry;
pub use crate::uuid::UuidRepresentation;

/// Options controlling how values are encoded and decoded.
///
/// `CodecOptions` is immutable once built and cheap to clone; the transformer registry is
/// shared behind an [`Arc`]. It is `Send + Sync`, so a single instance can be shared by any
/// number of concurrent codec calls.
///
/// The container type decoded documents are built in is chosen statically through the
/// `D: DocumentMap` parameter of [`decode_document_as`](crate::decode_document_as) rather
/// than stored here.
///
/// ```
/// use lazybson::{CodecOptions, UuidRepresentation};
///
/// let options = CodecOptions::builder()
///     .tz_aware(true)
///     .uuid_representation(UuidRepresentation::Standard)
///     .build();
/// assert!(options.tz_aware());
/// assert_eq!(CodecOptions::default().uuid_representation(), UuidRepresentation::PythonLegacy);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CodecOptions {
    tz_aware: bool,
    uuid_representation: UuidRepresentation,
    transformers: Arc<TransformerRegistry>,
}

impl CodecOptions {
    /// Returns a builder starting from the default options.
    pub fn builder() -> CodecOptionsBuilder {
        CodecOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Whether decoded datetimes are marked as timezone-aware.
    pub fn tz_aware(&self) -> bool {
        self.tz_aware
    }

    /// The representation [`Bson::Uuid`](crate::Bson::Uuid) values are written in, and the
    /// byte order subtype 3 UUIDs are read with.
    pub fn uuid_representation(&self) -> UuidRepresentation {
        self.uuid_representation
    }

    /// The registered transformers.
    pub fn transformer_registry(&self) -> &TransformerRegistry {
        &self.transformers
    }

    /// Returns a builder seeded with these options.
    pub fn to_builder(&self) -> CodecOptionsBuilder {
        CodecOptionsBuilder {
            options: self.clone(),
        }
    }
}

/// Builder for [`CodecOptions`].
#[derive(Clone, Debug)]
pub struct CodecOptionsBuilder {
    options: CodecOptions,
}

impl CodecOptionsBuilder {
    /// Sets whether decoded datetimes are timezone-aware. Defaults to `false`.
    pub fn tz_aware(mut self, tz_aware: bool) -> Self {
        self.options.tz_aware = tz_aware;
        self
    }

    /// Sets the UUID representation. Defaults to [`UuidRepresentation::PythonLegacy`].
    pub fn uuid_representation(mut self, representation: UuidRepresentation) -> Self {
        self.options.uuid_representation = representation;
        self
    }

    /// Sets the transformer registry. Defaults to an empty registry.
    pub fn transformer_registry(mut self, registry: TransformerRegistry) -> Self {
        self.options.transformers = Arc::new(registry);
        self
    }

    /// Builds the options.
    pub fn build(self) -> CodecOptions {
        self.options
    }
}
