//! Output settings for the textual dialects.
//!
//! Follows the same lifecycle as the binary codec settings: mutable until
//! [`freeze`](JsonWriterSettings::freeze), read-only afterwards, and `Clone`
//! always yields an unfrozen copy. The guid representation mode is
//! snapshotted from the process globals once at construction.

use crate::error::ConfigError;
use crate::guid::{
    default_representation, representation_mode, GuidRepresentationMode, UuidRepresentation,
};

/// Which textual dialect the writer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOutputMode {
    /// Shell constructor syntax: `ObjectId("…")`, `NumberLong(5)`, `/re/`.
    /// Round-trips every element type but is not plain JSON.
    Shell,
    /// `$`-wrapper objects: `{ "$oid" : "…" }`. Any JSON parser can read the
    /// output, at the cost of more verbose special types.
    Strict,
}

/// Settings for writing textual output.
#[derive(Debug)]
pub struct JsonWriterSettings {
    output_mode: JsonOutputMode,
    indent: bool,
    indent_chars: String,
    newline_chars: String,
    always_quote_names: bool,
    mode: GuidRepresentationMode,
    guid_representation: UuidRepresentation,
    frozen: bool,
}

impl JsonWriterSettings {
    /// Creates unfrozen shell-mode settings, snapshotting the guid globals.
    pub fn new() -> JsonWriterSettings {
        JsonWriterSettings::with_output_mode(JsonOutputMode::Shell)
    }

    /// Preset for the shell dialect.
    pub fn shell() -> JsonWriterSettings {
        JsonWriterSettings::with_output_mode(JsonOutputMode::Shell)
    }

    /// Preset for the strict dialect.
    pub fn strict() -> JsonWriterSettings {
        JsonWriterSettings::with_output_mode(JsonOutputMode::Strict)
    }

    fn with_output_mode(output_mode: JsonOutputMode) -> JsonWriterSettings {
        let mode = representation_mode();
        let guid_representation = match mode {
            GuidRepresentationMode::V2 => default_representation(),
            GuidRepresentationMode::V3 => UuidRepresentation::Unspecified,
        };
        JsonWriterSettings {
            output_mode,
            indent: false,
            indent_chars: "  ".to_string(),
            newline_chars: "\n".to_string(),
            always_quote_names: true,
            mode,
            guid_representation,
            frozen: false,
        }
    }

    pub fn output_mode(&self) -> JsonOutputMode {
        self.output_mode
    }

    pub fn indent(&self) -> bool {
        self.indent
    }

    pub fn indent_chars(&self) -> &str {
        &self.indent_chars
    }

    pub fn newline_chars(&self) -> &str {
        &self.newline_chars
    }

    pub fn always_quote_names(&self) -> bool {
        self.always_quote_names
    }

    /// The representation mode snapshotted at construction.
    pub fn mode(&self) -> GuidRepresentationMode {
        self.mode
    }

    /// The representation applied to legacy uuid payloads in V2 mode.
    pub fn guid_representation(&self) -> UuidRepresentation {
        self.guid_representation
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_unfrozen(&self) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                target: "JsonWriterSettings",
            });
        }
        Ok(())
    }

    pub fn set_output_mode(&mut self, mode: JsonOutputMode) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.output_mode = mode;
        Ok(())
    }

    /// Writes each element on its own line. Defaults to off.
    pub fn set_indent(&mut self, indent: bool) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.indent = indent;
        Ok(())
    }

    /// The string repeated once per nesting level. Defaults to two spaces.
    pub fn set_indent_chars(&mut self, chars: &str) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.indent_chars = chars.to_string();
        Ok(())
    }

    /// The line separator used in indent mode. Defaults to `"\n"`.
    pub fn set_newline_chars(&mut self, chars: &str) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.newline_chars = chars.to_string();
        Ok(())
    }

    /// Quotes element names even when the shell would accept them bare.
    /// Defaults to on; strict mode quotes regardless.
    pub fn set_always_quote_names(&mut self, always: bool) -> Result<(), ConfigError> {
        self.check_unfrozen()?;
        self.always_quote_names = always;
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

    /// Makes the settings immutable. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}

#[cfg(test)]
impl JsonWriterSettings {
    /// Test constructor with an explicit snapshot, independent of the
    /// process globals.
    pub(crate) fn with_mode(
        output_mode: JsonOutputMode,
        mode: GuidRepresentationMode,
        representation: UuidRepresentation,
    ) -> JsonWriterSettings {
        let mut settings = JsonWriterSettings::with_output_mode(output_mode);
        settings.mode = mode;
        settings.guid_representation = representation;
        settings
    }
}

impl Default for JsonWriterSettings {
    fn default() -> JsonWriterSettings {
        JsonWriterSettings::new()
    }
}

impl Clone for JsonWriterSettings {
    /// The copy is unfrozen regardless of the source.
    fn clone(&self) -> JsonWriterSettings {
        JsonWriterSettings {
            output_mode: self.output_mode,
            indent: self.indent,
            indent_chars: self.indent_chars.clone(),
            newline_chars: self.newline_chars.clone(),
            always_quote_names: self.always_quote_names,
            mode: self.mode,
            guid_representation: self.guid_representation,
            frozen: false,
        }
    }
}
