// -
// Wire layout

/// Fixed width of the NUL-padded field name in an event record
pub const FIELD_NAME_LEN: usize = 16;

/// Size in bytes of one serialized change event record:
/// timestamp(8) + actor_id(4) + field_index(4) + old_value(4) + new_value(4) + name(16)
pub const EVENT_RECORD_LEN: usize = 8 + 4 * 4 + FIELD_NAME_LEN;

// -
// Reference field table

pub(crate) const REFERENCE_FIELDS: [(&str, u32); 6] = [
    ("version", 1),
    ("registryHash", 0x1234_5678),
    ("featureFlags", 0x0000_0007),
    ("terminalMode", 1),
    ("rows", 48),
    ("cols", 80),
];

// -
// Metric labels

pub(crate) const METRIC_FIELD_LABEL: &str = "field";
