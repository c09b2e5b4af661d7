//! Byte-order resolution for 128-bit identifiers.
//!
//! Drivers have historically stored uuids in four different byte orders,
//! distinguished by a [`UuidRepresentation`] that is negotiated out of band.
//! This module implements the pure byte transforms between each
//! representation and the RFC 4122 big-endian order that [`uuid::Uuid`]
//! uses, plus the process-wide compatibility defaults that legacy callers
//! still mutate.

use std::sync::atomic::{AtomicU8, Ordering};

use uuid::Uuid;

use crate::error::GuidError;
use crate::model::BinarySubtype;

// =============================================================================
// REPRESENTATIONS
// =============================================================================

/// Byte order of a uuid stored in a binary element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum UuidRepresentation {
    /// No representation chosen. Conversion is an error, raw bytes pass through.
    #[default]
    Unspecified = 0,
    /// RFC 4122 big-endian order, stored with subtype 0x04.
    Standard = 1,
    /// .NET `Guid.ToByteArray()` order (three little-endian fields, then
    /// eight big-endian bytes), stored with subtype 0x03.
    CSharpLegacy = 2,
    /// Each 8-byte half reversed independently, stored with subtype 0x03.
    JavaLegacy = 3,
    /// RFC 4122 byte order but stored with subtype 0x03.
    PythonLegacy = 4,
}

impl UuidRepresentation {
    /// Converts a raw byte to a representation, if valid.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(UuidRepresentation::Unspecified),
            1 => Some(UuidRepresentation::Standard),
            2 => Some(UuidRepresentation::CSharpLegacy),
            3 => Some(UuidRepresentation::JavaLegacy),
            4 => Some(UuidRepresentation::PythonLegacy),
            _ => None,
        }
    }

    /// Returns the binary subtype a uuid with this representation is stored
    /// under: Standard maps to 0x04, the legacy orders to 0x03.
    pub fn binary_subtype(&self) -> Result<BinarySubtype, GuidError> {
        match self {
            UuidRepresentation::Unspecified => Err(GuidError::UnspecifiedRepresentation),
            UuidRepresentation::Standard => Ok(BinarySubtype::UuidStandard),
            UuidRepresentation::CSharpLegacy
            | UuidRepresentation::JavaLegacy
            | UuidRepresentation::PythonLegacy => Ok(BinarySubtype::UuidLegacy),
        }
    }

    /// Returns true if a uuid with this representation may be stored under
    /// the given subtype without violating the subtype invariants.
    pub fn compatible_with(&self, subtype: BinarySubtype) -> bool {
        match subtype {
            BinarySubtype::UuidStandard => *self == UuidRepresentation::Standard,
            BinarySubtype::UuidLegacy => {
                *self != UuidRepresentation::Standard && *self != UuidRepresentation::Unspecified
            }
            _ => false,
        }
    }
}

/// Which generation of representation handling is in effect.
///
/// V2 applies one representation uniformly per reader/writer settings
/// instance; V3 defers the choice to field-level serializers and passes raw
/// subtype/bytes through the codec unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GuidRepresentationMode {
    V2 = 2,
    V3 = 3,
}

// =============================================================================
// PROCESS DEFAULTS
// =============================================================================

// Settings snapshot these once at construction; the codec itself never reads
// them mid-operation. Mutation is uncoordinated across threads, which is the
// documented hazard of the legacy globals.
static MODE: AtomicU8 = AtomicU8::new(GuidRepresentationMode::V2 as u8);
static DEFAULT_REPRESENTATION: AtomicU8 = AtomicU8::new(UuidRepresentation::CSharpLegacy as u8);

/// Returns the process-wide representation mode.
pub fn representation_mode() -> GuidRepresentationMode {
    match MODE.load(Ordering::Relaxed) {
        3 => GuidRepresentationMode::V3,
        _ => GuidRepresentationMode::V2,
    }
}

/// Sets the process-wide representation mode.
///
/// Legacy callers save the previous value, mutate, and restore it afterward.
#[deprecated(note = "configure the representation per reader/writer settings instead")]
pub fn set_representation_mode(mode: GuidRepresentationMode) {
    MODE.store(mode as u8, Ordering::Relaxed);
}

/// Returns the process-wide default representation applied by V2-mode
/// settings at construction.
pub fn default_representation() -> UuidRepresentation {
    UuidRepresentation::from_u8(DEFAULT_REPRESENTATION.load(Ordering::Relaxed))
        .unwrap_or(UuidRepresentation::Unspecified)
}

/// Sets the process-wide default representation.
///
/// Meaningful in V2 mode only; V3-mode settings ignore it.
#[deprecated(note = "configure the representation per reader/writer settings instead")]
pub fn set_default_representation(representation: UuidRepresentation) {
    DEFAULT_REPRESENTATION.store(representation as u8, Ordering::Relaxed);
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Applies the byte transform for a representation.
///
/// Every defined transform is an involution, so the same permutation maps
/// stored bytes to RFC 4122 order and back.
fn swap_bytes(mut bytes: [u8; 16], representation: UuidRepresentation) -> [u8; 16] {
    match representation {
        UuidRepresentation::Unspecified => bytes,
        UuidRepresentation::Standard | UuidRepresentation::PythonLegacy => bytes,
        UuidRepresentation::CSharpLegacy => {
            bytes[0..4].reverse();
            bytes[4..6].reverse();
            bytes[6..8].reverse();
            bytes
        }
        UuidRepresentation::JavaLegacy => {
            bytes[0..8].reverse();
            bytes[8..16].reverse();
            bytes
        }
    }
}

/// Converts stored bytes to a [`Uuid`] under the given representation.
///
/// The bytes are never reinterpreted under a different representation than
/// the one supplied; diverging results for diverging representations are
/// intentional and preserved.
pub fn guid_from_bytes(
    bytes: [u8; 16],
    representation: UuidRepresentation,
) -> Result<Uuid, GuidError> {
    if representation == UuidRepresentation::Unspecified {
        return Err(GuidError::UnspecifiedRepresentation);
    }
    Ok(Uuid::from_bytes(swap_bytes(bytes, representation)))
}

/// Converts a [`Uuid`] to stored bytes under the given representation.
pub fn guid_to_bytes(
    uuid: Uuid,
    representation: UuidRepresentation,
) -> Result<[u8; 16], GuidError> {
    if representation == UuidRepresentation::Unspecified {
        return Err(GuidError::UnspecifiedRepresentation);
    }
    Ok(swap_bytes(*uuid.as_bytes(), representation))
}

#[cfg(test)]
pub(crate) static TEST_GUID_GLOBALS: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        0xFF,
    ];

    #[test]
    fn test_standard_is_rfc4122_order() {
        let uuid = guid_from_bytes(SAMPLE, UuidRepresentation::Standard).unwrap();
        assert_eq!(
            uuid.hyphenated().to_string(),
            "00112233-4455-6677-8899-aabbccddeeff"
        );
    }

    #[test]
    fn test_csharp_legacy_field_order() {
        // .NET reverses the int32 and two int16 fields, keeps the rest
        let uuid = guid_from_bytes(SAMPLE, UuidRepresentation::CSharpLegacy).unwrap();
        assert_eq!(
            uuid.hyphenated().to_string(),
            "33221100-5544-7766-8899-aabbccddeeff"
        );

        let uuid = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let bytes = guid_to_bytes(uuid, UuidRepresentation::CSharpLegacy).unwrap();
        assert_eq!(
            bytes,
            [0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
             0xEE, 0xFF]
        );
    }

    #[test]
    fn test_java_legacy_half_reversal() {
        let uuid = guid_from_bytes(SAMPLE, UuidRepresentation::JavaLegacy).unwrap();
        assert_eq!(
            uuid.hyphenated().to_string(),
            "77665544-3322-1100-ffee-ddccbbaa9988"
        );
    }

    #[test]
    fn test_python_legacy_matches_standard_bytes() {
        let standard = guid_from_bytes(SAMPLE, UuidRepresentation::Standard).unwrap();
        let python = guid_from_bytes(SAMPLE, UuidRepresentation::PythonLegacy).unwrap();
        assert_eq!(standard, python);
        // Same byte order, but the two representations store different subtypes
        assert_eq!(
            UuidRepresentation::Standard.binary_subtype().unwrap(),
            BinarySubtype::UuidStandard
        );
        assert_eq!(
            UuidRepresentation::PythonLegacy.binary_subtype().unwrap(),
            BinarySubtype::UuidLegacy
        );
    }

    #[test]
    fn test_cross_representation_divergence() {
        let standard = guid_from_bytes(SAMPLE, UuidRepresentation::Standard).unwrap();
        let csharp = guid_from_bytes(SAMPLE, UuidRepresentation::CSharpLegacy).unwrap();
        let java = guid_from_bytes(SAMPLE, UuidRepresentation::JavaLegacy).unwrap();
        assert_ne!(standard, csharp);
        assert_ne!(standard, java);
        assert_ne!(csharp, java);
    }

    #[test]
    fn test_unspecified_rejected() {
        assert_eq!(
            guid_from_bytes(SAMPLE, UuidRepresentation::Unspecified),
            Err(GuidError::UnspecifiedRepresentation)
        );
        assert_eq!(
            guid_to_bytes(Uuid::nil(), UuidRepresentation::Unspecified),
            Err(GuidError::UnspecifiedRepresentation)
        );
        assert_eq!(
            UuidRepresentation::Unspecified.binary_subtype(),
            Err(GuidError::UnspecifiedRepresentation)
        );
    }

    #[test]
    fn test_subtype_compatibility() {
        assert!(UuidRepresentation::Standard.compatible_with(BinarySubtype::UuidStandard));
        assert!(!UuidRepresentation::Standard.compatible_with(BinarySubtype::UuidLegacy));
        assert!(UuidRepresentation::CSharpLegacy.compatible_with(BinarySubtype::UuidLegacy));
        assert!(!UuidRepresentation::CSharpLegacy.compatible_with(BinarySubtype::UuidStandard));
        assert!(!UuidRepresentation::Unspecified.compatible_with(BinarySubtype::UuidLegacy));
        assert!(!UuidRepresentation::JavaLegacy.compatible_with(BinarySubtype::Generic));
    }

    #[test]
    #[allow(deprecated)]
    fn test_process_defaults_save_restore() {
        let _guard = TEST_GUID_GLOBALS.lock().unwrap();

        let saved_mode = representation_mode();
        let saved_rep = default_representation();

        set_representation_mode(GuidRepresentationMode::V3);
        assert_eq!(representation_mode(), GuidRepresentationMode::V3);
        set_default_representation(UuidRepresentation::JavaLegacy);
        assert_eq!(default_representation(), UuidRepresentation::JavaLegacy);

        set_representation_mode(saved_mode);
        set_default_representation(saved_rep);
        assert_eq!(representation_mode(), saved_mode);
        assert_eq!(default_representation(), saved_rep);
    }

    proptest! {
        #[test]
        fn prop_conversion_roundtrip(bytes in prop::array::uniform16(any::<u8>()), rep in 1u8..=4) {
            let rep = UuidRepresentation::from_u8(rep).unwrap();
            let uuid = guid_from_bytes(bytes, rep).unwrap();
            let back = guid_to_bytes(uuid, rep).unwrap();
            prop_assert_eq!(bytes, back);
        }

        #[test]
        fn prop_uuid_roundtrip(raw in prop::array::uniform16(any::<u8>()), rep in 1u8..=4) {
            let rep = UuidRepresentation::from_u8(rep).unwrap();
            let uuid = Uuid::from_bytes(raw);
            let bytes = guid_to_bytes(uuid, rep).unwrap();
            let back = guid_from_bytes(bytes, rep).unwrap();
            prop_assert_eq!(uuid, back);
        }
    }
}
