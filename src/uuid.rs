//! UUID support for BSON.
//!
//! BSON stores UUIDs as binary values. The canonical form uses binary subtype 4 with the UUID's
//! big-endian bytes; older drivers used subtype 3 with driver-specific byte orders. The
//! [`UuidRepresentation`] configured on [`CodecOptions`](crate::CodecOptions) selects which form
//! [`Bson::Uuid`] values are written in.
//!
//! Decoding keys off the subtype byte that is actually on the wire: a 16-byte subtype 4 value is
//! always read as [`UuidRepresentation::Standard`], while a 16-byte subtype 3 value is read with
//! the configured legacy byte order ([`UuidRepresentation::PythonLegacy`] when the configuration
//! is `Standard`). Because subtype 3 does not record which legacy order produced it, a value only
//! round-trips when it is read back with the same representation it was written with. Reading
//! with a different legacy representation never fails; it yields a UUID with permuted bytes.
//!
//! ```
//! use lazybson::{uuid::{Uuid, UuidRepresentation}, Binary};
//!
//! let uuid = Uuid::parse_str("00112233445566778899AABBCCDDEEFF")?;
//! let bin = Binary::from_uuid_with_representation(uuid, UuidRepresentation::JavaLegacy);
//!
//! // The binary holds a JavaLegacy UUID, so the standard conversion is refused.
//! assert!(bin.to_uuid().is_err());
//!
//! let back = bin.to_uuid_with_representation(UuidRepresentation::JavaLegacy)?;
//! assert_eq!(back, uuid);
//! # Ok::<(), Box::<dyn std::error::Error>>(())
//! ```

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    error::{Error, Result},
    spec::BinarySubtype,
    Binary,
    Bson,
};

/// A struct modeling a BSON UUID value.
#[derive(Clone, Copy, PartialEq, Hash, Eq, PartialOrd, Ord)]
pub struct Uuid {
    uuid: uuid::Uuid,
}

impl Uuid {
    /// Creates a random UUID.
    pub fn new() -> Self {
        Self {
            uuid: uuid::Uuid::new_v4(),
        }
    }

    /// Creates a [`Uuid`] using the supplied big-endian bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            uuid: uuid::Uuid::from_bytes(bytes),
        }
    }

    /// Creates a [`Uuid`] from the provided hex string.
    pub fn parse_str(input: impl AsRef<str>) -> Result<Self> {
        let uuid = uuid::Uuid::parse_str(input.as_ref()).map_err(Error::invalid_uuid_string)?;
        Ok(Self { uuid })
    }

    /// Returns an array of 16 bytes containing the [`Uuid`]'s data.
    pub const fn bytes(self) -> [u8; 16] {
        *self.uuid.as_bytes()
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Uuid {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uuid.fmt(f)
    }
}

impl std::fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        std::fmt::Debug::fmt(&self.uuid, f)
    }
}

impl From<uuid::Uuid> for Uuid {
    fn from(uuid: uuid::Uuid) -> Self {
        Self { uuid }
    }
}

impl From<Uuid> for uuid::Uuid {
    fn from(u: Uuid) -> Self {
        u.uuid
    }
}

impl From<Uuid> for Bson {
    fn from(u: Uuid) -> Self {
        Bson::Uuid(u)
    }
}

/// The wire layouts a [`Uuid`] can be written in.
///
/// Different drivers historically wrote UUIDs with binary subtype 3 using different byte orders.
/// If a UUID has been written with a particular representation, it MUST be read back with the same
/// representation.
#[non_exhaustive]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Hash)]
pub enum UuidRepresentation {
    /// The canonical representation of UUIDs in BSON (binary with subtype 0x04)
    Standard,
    /// The legacy representation of UUIDs in BSON used by the C# driver (binary subtype 0x03)
    CSharpLegacy,
    /// The legacy representation of UUIDs in BSON used by the Java driver (binary subtype 0x03)
    JavaLegacy,
    /// The legacy representation of UUIDs in BSON used by the Python driver, which is the same
    /// format as STANDARD, but has binary subtype 0x03
    #[default]
    PythonLegacy,
}

impl UuidRepresentation {
    /// The binary subtype this representation is written with.
    pub fn binary_subtype(self) -> BinarySubtype {
        match self {
            UuidRepresentation::Standard => BinarySubtype::Uuid,
            _ => BinarySubtype::UuidOld,
        }
    }

    /// The representation used to read a subtype 3 value under this configuration.
    pub(crate) fn legacy(self) -> Self {
        match self {
            UuidRepresentation::Standard => UuidRepresentation::PythonLegacy,
            other => other,
        }
    }

    /// Reorders between the big-endian UUID layout and this representation's wire layout. Every
    /// permutation used here is its own inverse.
    fn permute(self, bytes: &mut [u8; 16]) {
        match self {
            UuidRepresentation::Standard | UuidRepresentation::PythonLegacy => {}
            UuidRepresentation::CSharpLegacy => {
                bytes[0..4].reverse();
                bytes[4..6].reverse();
                bytes[6..8].reverse();
            }
            UuidRepresentation::JavaLegacy => {
                bytes[0..8].reverse();
                bytes[8..16].reverse();
            }
        }
    }
}

impl Binary {
    /// Converts a [`Uuid`] into a subtype 4 [`Binary`].
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self::from_uuid_with_representation(uuid, UuidRepresentation::Standard)
    }

    /// Converts a [`Uuid`] into a [`Binary`] laid out according to `rep`.
    pub fn from_uuid_with_representation(uuid: Uuid, rep: UuidRepresentation) -> Self {
        let mut bytes = uuid.bytes();
        rep.permute(&mut bytes);
        Binary {
            subtype: rep.binary_subtype(),
            bytes: bytes.to_vec(),
        }
    }

    /// Reads this [`Binary`] as a [`Uuid`] laid out according to `rep`. If the representation
    /// does not match the binary subtype, an error is returned.
    pub fn to_uuid_with_representation(&self, rep: UuidRepresentation) -> Result<Uuid> {
        let expected = rep.binary_subtype();
        if self.subtype != expected {
            return Err(Error::uuid_representation_mismatch(
                rep,
                self.subtype,
                expected,
            ));
        }
        let mut buf: [u8; 16] = self
            .bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::invalid_uuid_length(self.bytes.len()))?;
        rep.permute(&mut buf);
        Ok(Uuid::from_bytes(buf))
    }

    /// Reads this [`Binary`] as a [`Uuid`] using the standard representation.
    pub fn to_uuid(&self) -> Result<Uuid> {
        self.to_uuid_with_representation(UuidRepresentation::Standard)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const HEX: &str = "00112233445566778899AABBCCDDEEFF";

    #[test]
    fn java_legacy_layout() {
        let uuid = Uuid::parse_str(HEX).unwrap();
        let bin = Binary::from_uuid_with_representation(uuid, UuidRepresentation::JavaLegacy);
        assert_eq!(bin.subtype, BinarySubtype::UuidOld);
        assert_eq!(hex::encode(&bin.bytes), "7766554433221100ffeeddccbbaa9988");
    }

    #[test]
    fn csharp_legacy_layout() {
        let uuid = Uuid::parse_str(HEX).unwrap();
        let bin = Binary::from_uuid_with_representation(uuid, UuidRepresentation::CSharpLegacy);
        assert_eq!(bin.subtype, BinarySubtype::UuidOld);
        assert_eq!(hex::encode(&bin.bytes), "33221100554477668899aabbccddeeff");
    }

    #[test]
    fn every_representation_round_trips() {
        let uuid = Uuid::parse_str(HEX).unwrap();
        for rep in [
            UuidRepresentation::Standard,
            UuidRepresentation::PythonLegacy,
            UuidRepresentation::JavaLegacy,
            UuidRepresentation::CSharpLegacy,
        ] {
            let bin = Binary::from_uuid_with_representation(uuid, rep);
            assert_eq!(bin.to_uuid_with_representation(rep).unwrap(), uuid);
        }
    }

    #[test]
    fn mismatched_subtype_is_rejected() {
        let uuid = Uuid::parse_str(HEX).unwrap();
        let bin = Binary::from_uuid_with_representation(uuid, UuidRepresentation::PythonLegacy);
        assert!(bin.to_uuid().is_err());

        let short = Binary {
            subtype: BinarySubtype::Uuid,
            bytes: vec![1, 2, 3],
        };
        assert!(short.to_uuid().is_err());
    }
}
