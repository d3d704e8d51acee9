use serde::Deserialize;
use serde::Serialize;

use crate::constants::REFERENCE_FIELDS;
use crate::FieldRegistry;
use crate::Result;

/// One entry of the traced field table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Identifier carried in every change event, at most 16 bytes
    pub name: String,
    /// Value written by the initializer
    #[serde(default)]
    pub default: u32,
}

pub(super) fn default_fields() -> Vec<FieldSpec> {
    REFERENCE_FIELDS
        .iter()
        .map(|(name, default)| FieldSpec {
            name: (*name).to_string(),
            default: *default,
        })
        .collect()
}

/// The registry constructor owns the table rules; validation only builds
/// and discards one.
pub(super) fn validate_fields(fields: &[FieldSpec]) -> Result<()> {
    FieldRegistry::from_specs(fields).map(|_| ())
}
