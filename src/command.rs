//! Command codes and class-to-command mapping.
//!
//! A [`CommandCode`] is a short token meaningful to the physical controller.
//! Codes come from exactly two places: the fixed [`CommandMapper`] table, or
//! an operator-typed manual entry. Nothing else fabricates codes.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Result};

use crate::error::{ControlError, ControlErrorKind};

/// Terminator appended to every code on the wire.
pub const COMMAND_TERMINATOR: u8 = b'\n';

/// A validated outbound command token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandCode(String);

impl CommandCode {
    /// Accepts any non-empty token after trimming; manual entries are passed
    /// verbatim beyond that single check.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("command code must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes written to the transport: the code followed by the terminator.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut bytes = self.0.as_bytes().to_vec();
        bytes.push(COMMAND_TERMINATOR);
        bytes
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed table mapping eligible classes to pick commands.
#[derive(Clone, Debug)]
pub struct CommandMapper {
    table: BTreeMap<u32, CommandCode>,
}

impl CommandMapper {
    pub fn new(entries: impl IntoIterator<Item = (u32, CommandCode)>) -> Self {
        Self {
            table: entries.into_iter().collect(),
        }
    }

    /// Map a class id to its command code.
    ///
    /// An unmapped class is a terminal outcome for the trigger, reported as
    /// `Unrecognized`; it is not a retryable error.
    pub fn map(&self, class_id: u32) -> Result<CommandCode> {
        self.table.get(&class_id).cloned().ok_or_else(|| {
            ControlError::new(
                ControlErrorKind::Unrecognized,
                format!("class {} has no command mapping", class_id),
            )
            .into()
        })
    }

    pub fn is_mapped(&self, class_id: u32) -> bool {
        self.table.contains_key(&class_id)
    }
}

impl Default for CommandMapper {
    /// Reference table: green picks P1, yellow P2, red P3. Orange (class 1)
    /// is deliberately unmapped.
    fn default() -> Self {
        let code = |s: &str| CommandCode(s.to_string());
        Self::new([(0, code("P1")), (2, code("P2")), (3, code("P3"))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_maps_three_of_four_classes() {
        let mapper = CommandMapper::default();

        assert_eq!(mapper.map(0).unwrap().as_str(), "P1");
        assert_eq!(mapper.map(2).unwrap().as_str(), "P2");
        assert_eq!(mapper.map(3).unwrap().as_str(), "P3");

        let err = mapper.map(1).unwrap_err();
        assert_eq!(
            ControlError::kind_of(&err),
            Some(ControlErrorKind::Unrecognized)
        );
    }

    #[test]
    fn wire_encoding_appends_terminator() {
        let code = CommandCode::new("P2").unwrap();
        assert_eq!(code.to_wire(), b"P2\n");
    }

    #[test]
    fn manual_codes_pass_verbatim_after_trim() {
        let code = CommandCode::new("  j0 ").unwrap();
        assert_eq!(code.as_str(), "j0");
        assert_eq!(code.to_wire(), b"j0\n");

        assert!(CommandCode::new("   ").is_err());
        assert!(CommandCode::new("").is_err());
    }
}
