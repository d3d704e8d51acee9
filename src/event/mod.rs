//! Change events and their fixed-layout wire record.
//!
//! A [`ChangeEvent`] serializes to exactly [`EVENT_RECORD_LEN`] bytes:
//!
//! ```text
//! offset  size  field
//! 0       8     timestamp   (u64, monotonic ns)
//! 8       4     actor_id    (u32)
//! 12      4     field_index (u32)
//! 16      4     old_value   (u32)
//! 20      4     new_value   (u32)
//! 24      16    field_name  (NUL padded, truncated)
//! ```
//!
//! All integers are little-endian. The struct field order below is the wire
//! order; bincode's default fixed-int encoding adds no framing.


use std::borrow::Cow;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::EVENT_RECORD_LEN;
use crate::constants::FIELD_NAME_LEN;
use crate::Error;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    timestamp: u64,
    actor_id: u32,
    field_index: u32,
    old_value: u32,
    new_value: u32,
    field_name: [u8; FIELD_NAME_LEN],
}

impl ChangeEvent {
    pub fn new(
        timestamp: u64,
        actor_id: u32,
        field_index: u32,
        field_name: &str,
        old_value: u32,
        new_value: u32,
    ) -> Self {
        Self {
            timestamp,
            actor_id,
            field_index,
            old_value,
            new_value,
            field_name: pad_name(field_name),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn actor_id(&self) -> u32 {
        self.actor_id
    }

    pub fn field_index(&self) -> u32 {
        self.field_index
    }

    pub fn old_value(&self) -> u32 {
        self.old_value
    }

    pub fn new_value(&self) -> u32 {
        self.new_value
    }

    /// Field name with the NUL padding stripped.
    pub fn field_name(&self) -> Cow<'_, str> {
        let end = self
            .field_name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(FIELD_NAME_LEN);
        String::from_utf8_lossy(&self.field_name[..end])
    }

    pub fn field_name_bytes(&self) -> &[u8; FIELD_NAME_LEN] {
        &self.field_name
    }

    pub fn to_record(&self) -> Result<[u8; EVENT_RECORD_LEN]> {
        let mut record = [0u8; EVENT_RECORD_LEN];
        bincode::serialize_into(&mut record[..], self)?;
        Ok(record)
    }

    pub fn from_record(record: &[u8]) -> Result<Self> {
        if record.len() != EVENT_RECORD_LEN {
            return Err(Error::Codec(Box::new(bincode::ErrorKind::Custom(format!(
                "event record must be {} bytes, got {}",
                EVENT_RECORD_LEN,
                record.len()
            )))));
        }
        Ok(bincode::deserialize(record)?)
    }
}

/// Copies at most [`FIELD_NAME_LEN`] bytes of `name`, NUL padding the rest.
fn pad_name(name: &str) -> [u8; FIELD_NAME_LEN] {
    let mut padded = [0u8; FIELD_NAME_LEN];
    let len = name.len().min(FIELD_NAME_LEN);
    padded[..len].copy_from_slice(&name.as_bytes()[..len]);
    padded
}
