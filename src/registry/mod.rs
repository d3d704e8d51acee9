//! Field registry: the closed set of traceable configuration fields.
//!
//! Indices are dense (`0..field_count`) and assigned by position in the table
//! handed to [`FieldRegistry::new`]. The table is immutable once built; every
//! lookup is a plain slice index.


use std::collections::HashMap;

use crate::constants::FIELD_NAME_LEN;
use crate::constants::REFERENCE_FIELDS;
use crate::config::FieldSpec;
use crate::RegistryError;
use crate::Result;
use crate::TracerError;

/// One traceable configuration attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    index: u32,
    name: String,
    default: u32,
}

impl Field {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> u32 {
        self.default
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    /// Builds a registry from `(name, default)` pairs; the position of each
    /// pair becomes the field index.
    ///
    /// # Errors
    /// Returns `RegistryError` when:
    /// - the table is empty or holds more than `u32::MAX` entries
    /// - a name is empty, contains a NUL byte or is longer than
    ///   [`FIELD_NAME_LEN`] bytes
    /// - two fields share a name
    pub fn new<I, S>(table: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut seen: HashMap<String, u32> = HashMap::new();

        for (position, (name, default)) in table.into_iter().enumerate() {
            let index = u32::try_from(position).map_err(|_| RegistryError::TooManyFields {
                max: u64::from(u32::MAX),
            })?;
            let name = name.into();

            if name.is_empty() {
                return Err(RegistryError::EmptyName { index }.into());
            }
            // Event records are NUL-padded; an embedded NUL would cut the decoded name short
            if name.contains('\0') {
                return Err(RegistryError::NulInName { name, index }.into());
            }
            if name.len() > FIELD_NAME_LEN {
                return Err(RegistryError::NameTooLong {
                    len: name.len(),
                    name,
                    max: FIELD_NAME_LEN,
                }
                .into());
            }
            if let Some(first) = seen.insert(name.clone(), index) {
                return Err(RegistryError::DuplicateName {
                    name,
                    first,
                    second: index,
                }
                .into());
            }

            fields.push(Field {
                index,
                name,
                default,
            });
        }

        if fields.is_empty() {
            return Err(RegistryError::Empty.into());
        }

        Ok(Self { fields })
    }

    /// The six-field terminal configuration table: version, registryHash,
    /// featureFlags, terminalMode, rows, cols.
    pub fn reference() -> Self {
        Self {
            fields: REFERENCE_FIELDS
                .iter()
                .enumerate()
                .map(|(index, (name, default))| Field {
                    index: index as u32,
                    name: (*name).to_string(),
                    default: *default,
                })
                .collect(),
        }
    }

    pub fn from_specs(specs: &[FieldSpec]) -> Result<Self> {
        Self::new(specs.iter().map(|s| (s.name.clone(), s.default)))
    }

    pub fn field_count(&self) -> u32 {
        // Construction caps the table at u32::MAX entries
        self.fields.len() as u32
    }

    pub fn field(
        &self,
        index: u32,
    ) -> std::result::Result<&Field, TracerError> {
        self.fields
            .get(index as usize)
            .ok_or(TracerError::InvalidField {
                index,
                field_count: self.field_count(),
            })
    }

    pub fn field_name(
        &self,
        index: u32,
    ) -> std::result::Result<&str, TracerError> {
        self.field(index).map(Field::name)
    }

    pub fn default_value(
        &self,
        index: u32,
    ) -> std::result::Result<u32, TracerError> {
        self.field(index).map(Field::default_value)
    }

    pub fn index_of(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.fields.iter().find(|f| f.name == name).map(Field::index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::reference()
    }
}
