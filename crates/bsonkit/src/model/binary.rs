//! Binary element payloads and uuid subtype handling.

use uuid::Uuid;

use crate::error::GuidError;
use crate::guid::{self, GuidRepresentationMode, UuidRepresentation};
use crate::limits::UUID_PAYLOAD_LEN;

/// Subtype byte of a binary element.
///
/// Values 0x09 through 0x7F are reserved by the wire format; 0x80 and above
/// are user defined. Both ranges round-trip without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    /// 0x00: generic binary data.
    Generic,
    /// 0x01: function.
    Function,
    /// 0x02: deprecated binary layout with a nested length prefix.
    OldBinary,
    /// 0x03: uuid in a driver-legacy byte order.
    UuidLegacy,
    /// 0x04: uuid in RFC 4122 byte order.
    UuidStandard,
    /// 0x05: MD5 digest.
    Md5,
    /// 0x06: encrypted value.
    Encrypted,
    /// 0x07: compressed column data.
    Column,
    /// 0x08: sensitive data.
    Sensitive,
    /// 0x80..=0xFF: user defined.
    UserDefined(u8),
    /// 0x09..=0x7F: reserved.
    Reserved(u8),
}

impl BinarySubtype {
    /// Converts a raw subtype byte. Every byte maps to a subtype.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => BinarySubtype::Generic,
            0x01 => BinarySubtype::Function,
            0x02 => BinarySubtype::OldBinary,
            0x03 => BinarySubtype::UuidLegacy,
            0x04 => BinarySubtype::UuidStandard,
            0x05 => BinarySubtype::Md5,
            0x06 => BinarySubtype::Encrypted,
            0x07 => BinarySubtype::Column,
            0x08 => BinarySubtype::Sensitive,
            0x80..=0xFF => BinarySubtype::UserDefined(value),
            _ => BinarySubtype::Reserved(value),
        }
    }

    /// Returns the wire byte for this subtype.
    pub fn to_u8(&self) -> u8 {
        match self {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::OldBinary => 0x02,
            BinarySubtype::UuidLegacy => 0x03,
            BinarySubtype::UuidStandard => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::Encrypted => 0x06,
            BinarySubtype::Column => 0x07,
            BinarySubtype::Sensitive => 0x08,
            BinarySubtype::UserDefined(value) => *value,
            BinarySubtype::Reserved(value) => *value,
        }
    }

    /// Returns true for the two uuid subtypes.
    pub fn is_uuid(&self) -> bool {
        matches!(self, BinarySubtype::UuidLegacy | BinarySubtype::UuidStandard)
    }
}

/// A binary element value: subtype plus payload bytes.
///
/// Uuid-subtype values may additionally carry a [`UuidRepresentation`] tag.
/// The tag is advisory metadata describing the byte order of the payload; it
/// never participates in equality and never alters the stored bytes. The
/// invariants are enforced at construction: subtype 0x04 only carries
/// Standard, subtype 0x03 never carries Standard.
#[derive(Debug, Clone)]
pub struct Binary {
    subtype: BinarySubtype,
    bytes: Vec<u8>,
    representation: UuidRepresentation,
}

impl Binary {
    /// Creates a binary value with no representation tag.
    pub fn new(subtype: BinarySubtype, bytes: Vec<u8>) -> Self {
        Self {
            subtype,
            bytes,
            representation: UuidRepresentation::Unspecified,
        }
    }

    /// Returns the subtype.
    pub fn subtype(&self) -> BinarySubtype {
        self.subtype
    }

    /// Returns the payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the value and returns the payload bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the representation tag.
    pub fn representation(&self) -> UuidRepresentation {
        self.representation
    }

    /// Returns a copy carrying the given representation tag.
    ///
    /// Fails when the tag is incompatible with the subtype (subtype 0x04
    /// requires Standard, subtype 0x03 forbids it, other subtypes carry no
    /// tag) or when the payload is not 16 bytes. Unspecified always succeeds
    /// and clears the tag.
    pub fn with_representation(
        mut self,
        representation: UuidRepresentation,
    ) -> Result<Self, GuidError> {
        if representation == UuidRepresentation::Unspecified {
            self.representation = representation;
            return Ok(self);
        }
        if !representation.compatible_with(self.subtype) {
            return Err(GuidError::RepresentationMismatch {
                subtype: self.subtype,
                representation,
            });
        }
        if self.bytes.len() != UUID_PAYLOAD_LEN {
            return Err(GuidError::InvalidLength {
                len: self.bytes.len(),
            });
        }
        self.representation = representation;
        Ok(self)
    }

    /// Creates a uuid binary value under an explicit representation.
    ///
    /// The subtype follows from the representation: Standard stores subtype
    /// 0x04, the legacy orders store subtype 0x03.
    pub fn from_uuid_with_representation(
        uuid: Uuid,
        representation: UuidRepresentation,
    ) -> Result<Self, GuidError> {
        let subtype = representation.binary_subtype()?;
        let bytes = guid::guid_to_bytes(uuid, representation)?;
        Ok(Self {
            subtype,
            bytes: bytes.to_vec(),
            representation,
        })
    }

    /// Creates a uuid binary value under the process-default representation.
    ///
    /// Fails in V3 mode (the representation must then be given explicitly)
    /// and in V2 mode when the process default is Unspecified.
    pub fn from_uuid(uuid: Uuid) -> Result<Self, GuidError> {
        match guid::representation_mode() {
            GuidRepresentationMode::V2 => {
                Self::from_uuid_with_representation(uuid, guid::default_representation())
            }
            GuidRepresentationMode::V3 => Err(GuidError::UnspecifiedRepresentation),
        }
    }

    /// Interprets the payload as a uuid under the carried representation tag.
    pub fn to_uuid(&self) -> Result<Uuid, GuidError> {
        self.to_uuid_with_representation(self.representation)
    }

    /// Interprets the payload as a uuid under an explicit representation.
    ///
    /// Fails when the representation conflicts with the stored subtype or
    /// the payload is not 16 bytes. The bytes are never reordered to paper
    /// over a mismatch.
    pub fn to_uuid_with_representation(
        &self,
        representation: UuidRepresentation,
    ) -> Result<Uuid, GuidError> {
        if representation == UuidRepresentation::Unspecified {
            return Err(GuidError::UnspecifiedRepresentation);
        }
        if !representation.compatible_with(self.subtype) {
            return Err(GuidError::RepresentationMismatch {
                subtype: self.subtype,
                representation,
            });
        }
        let bytes: [u8; UUID_PAYLOAD_LEN] =
            self.bytes
                .as_slice()
                .try_into()
                .map_err(|_| GuidError::InvalidLength {
                    len: self.bytes.len(),
                })?;
        guid::guid_from_bytes(bytes, representation)
    }

    /// Tags a decoded value with the effective ambient representation.
    ///
    /// Callers guarantee compatibility via the tagging rules; this never
    /// reorders bytes.
    pub(crate) fn tag_representation(&mut self, representation: UuidRepresentation) {
        debug_assert!(
            representation == UuidRepresentation::Unspecified
                || representation.compatible_with(self.subtype)
        );
        self.representation = representation;
    }
}

// The representation tag is advisory; two values with the same subtype and
// bytes are the same wire value.
impl PartialEq for Binary {
    fn eq(&self, other: &Self) -> bool {
        self.subtype == other.subtype && self.bytes == other.bytes
    }
}

impl Eq for Binary {}
