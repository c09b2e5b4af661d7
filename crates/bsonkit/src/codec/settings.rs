//! Reader and writer settings for the binary codec.
//!
//! Settings are mutable until [`freeze`](BinaryReaderSettings::freeze) and
//! read-only afterwards; a frozen instance can be shared freely. `Clone`
//! always yields an unfrozen copy, so the way to customize a shared settings
//! object is clone, mutate, freeze.
//!
//! Each settings object snapshots the process-wide guid representation mode
//! (and, in V2 mode, the default representation) once at construction. The
//! codec itself only ever consults the snapshot.

use crate::error::ConfigError;
use crate::guid::{
    default_representation, representation_mode, GuidRepresentationMode, UuidRepresentation,
};
use crate::limits::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_SIZE};

/// Settings for decoding binary documents.
#[derive(Debug)]
pub struct BinaryReaderSettings {
    max_depth: usize,
    max_document_size: usize,
    mode: GuidRepresentationMode,
    guid_representation: UuidRepresentation,
    fix_old_binary_subtype_on_input: bool,
    utf8_lossy: bool,
    frozen: bool,
}

impl BinaryReaderSettings {
    /// Creates unfrozen settings, snapshotting the guid globals.
    pub fn new() -> BinaryReaderSettings {
        let mode = representation_mode();
        let guid_representation = match mode {
            GuidRepresentationMode::V2 => default_representation(),
            GuidRepresentationMode::V3 => UuidRepresentation::Unspecified,
        };
        BinaryReaderSettings {
            max_depth: DEFAULT_MAX_DEPTH,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            mode,
            guid_representation,
            fix_old_binary_subtype_on_input: false,
            utf8_lossy: false,
            frozen: false,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_document_size(&self) -> usize {
        self.max_document_size
    }

    /// The representation mode snapshotted at construction.
    pub fn mode(&self) -> GuidRepresentationMode {
        self.mode
    }

    /// The representation applied to legacy uuid payloads in V2 mode.
    pub fn guid_representation(&self) -> UuidRepresentation {
        self.guid_representation
    }

    pub fn fix_old_binary_subtype_on_input(&self) -> bool {
        self.fix_old_binary_subtype_on_input
    }

    pub fn utf8_lossy(&self) -> bool {
        self.utf8_lossy
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_unfrozen(&self) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                target: "BinaryReaderSettings",
            });
        }
        Ok(())
    }

    pub fn set_max_depth(&mut self, max_depth: usize) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        if max_depth == 0 {
            return Err(ConfigError::InvalidValue { name: "max_depth" });
        }
        self.max_depth = max_depth;
        Ok(())
    }

    pub fn set_max_document_size(&mut self, max: usize) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        if max == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_document_size",
            });
        }
        self.max_document_size = max;
        Ok(())
    }

    pub fn set_guid_representation(
        &mut self,
        representation: UuidRepresentation,
    ) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.guid_representation = representation;
        Ok(())
    }

    /// Replaces decoded OldBinary values with Generic after validating the
    /// nested length. Defaults to off.
    pub fn set_fix_old_binary_subtype_on_input(&mut self, fix: bool) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.fix_old_binary_subtype_on_input = fix;
        Ok(())
    }

    /// Replaces invalid UTF-8 sequences with U+FFFD instead of failing.
    /// Defaults to off.
    pub fn set_utf8_lossy(&mut self, lossy: bool) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.utf8_lossy = lossy;
        Ok(())
    }

    /// Makes the settings immutable. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}

#[cfg(test)]
impl BinaryReaderSettings {
    /// Test constructor with an explicit snapshot, independent of the
    /// process globals.
    pub(crate) fn with_mode(
        mode: GuidRepresentationMode,
        representation: UuidRepresentation,
    ) -> BinaryReaderSettings {
        let mut settings = BinaryReaderSettings::new();
        settings.mode = mode;
        settings.guid_representation = representation;
        settings
    }
}

impl Default for BinaryReaderSettings {
    fn default() -> BinaryReaderSettings {
        BinaryReaderSettings::new()
    }
}

impl Clone for BinaryReaderSettings {
    /// The copy is unfrozen regardless of the source.
    fn clone(&self) -> BinaryReaderSettings {
        BinaryReaderSettings {
            max_depth: self.max_depth,
            max_document_size: self.max_document_size,
            mode: self.mode,
            guid_representation: self.guid_representation,
            fix_old_binary_subtype_on_input: self.fix_old_binary_subtype_on_input,
            utf8_lossy: self.utf8_lossy,
            frozen: false,
        }
    }
}

/// Settings for encoding binary documents.
#[derive(Debug)]
pub struct BinaryWriterSettings {
    max_depth: usize,
    max_document_size: usize,
    mode: GuidRepresentationMode,
    guid_representation: UuidRepresentation,
    fix_old_binary_subtype_on_output: bool,
    check_uuid_representation: bool,
    frozen: bool,
}

impl BinaryWriterSettings {
    /// Creates unfrozen settings, snapshotting the guid globals.
    pub fn new() -> BinaryWriterSettings {
        let mode = representation_mode();
        let guid_representation = match mode {
            GuidRepresentationMode::V2 => default_representation(),
            GuidRepresentationMode::V3 => UuidRepresentation::Unspecified,
        };
        BinaryWriterSettings {
            max_depth: DEFAULT_MAX_DEPTH,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            mode,
            guid_representation,
            fix_old_binary_subtype_on_output: false,
            check_uuid_representation: true,
            frozen: false,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_document_size(&self) -> usize {
        self.max_document_size
    }

    pub fn mode(&self) -> GuidRepresentationMode {
        self.mode
    }

    pub fn guid_representation(&self) -> UuidRepresentation {
        self.guid_representation
    }

    pub fn fix_old_binary_subtype_on_output(&self) -> bool {
        self.fix_old_binary_subtype_on_output
    }

    pub fn check_uuid_representation(&self) -> bool {
        self.check_uuid_representation
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_unfrozen(&self) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                target: "BinaryWriterSettings",
            });
        }
        Ok(())
    }

    pub fn set_max_depth(&mut self, max_depth: usize) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        if max_depth == 0 {
            return Err(ConfigError::InvalidValue { name: "max_depth" });
        }
        self.max_depth = max_depth;
        Ok(())
    }

    pub fn set_max_document_size(&mut self, max: usize) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        if max == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_document_size",
            });
        }
        self.max_document_size = max;
        Ok(())
    }

    pub fn set_guid_representation(
        &mut self,
        representation: UuidRepresentation,
    ) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.guid_representation = representation;
        Ok(())
    }

    /// Writes OldBinary values using the Generic layout. Defaults to off.
    pub fn set_fix_old_binary_subtype_on_output(&mut self, fix: bool) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.fix_old_binary_subtype_on_output = fix;
        Ok(())
    }

    /// Rejects legacy uuid values whose representation conflicts with the
    /// writer's. Defaults to on.
    pub fn set_check_uuid_representation(&mut self, check: bool) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.check_uuid_representation = check;
        Ok(())
    }

    /// Makes the settings immutable. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}

#[cfg(test)]
impl BinaryWriterSettings {
    /// Test constructor with an explicit snapshot, independent of the
    /// process globals.
    pub(crate) fn with_mode(
        mode: GuidRepresentationMode,
        representation: UuidRepresentation,
    ) -> BinaryWriterSettings {
        let mut settings = BinaryWriterSettings::new();
        settings.mode = mode;
        settings.guid_representation = representation;
        settings
    }
}

impl Default for BinaryWriterSettings {
    fn default() -> BinaryWriterSettings {
        BinaryWriterSettings::new()
    }
}

impl Clone for BinaryWriterSettings {
    /// The copy is unfrozen regardless of the source.
    fn clone(&self) -> BinaryWriterSettings {
        BinaryWriterSettings {
            max_depth: self.max_depth,
            max_document_size: self.max_document_size,
            mode: self.mode,
            guid_representation: self.guid_representation,
            fix_old_binary_subtype_on_output: self.fix_old_binary_subtype_on_output,
            check_uuid_representation: self.check_uuid_representation,
            frozen: false,
        }
    }
}
