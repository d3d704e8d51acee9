use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Upper bound for the publish wait: the mutation path may never stall longer
const MAX_PUBLISH_TIMEOUT_US: u64 = 1_000_000;

/// Upper bound for the channel buffer, allocated in full when the emitter is
/// built (40 bytes per slot, 40MB at the limit)
pub const MAX_CAPACITY: usize = 1 << 20;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChannelConfig {
    /// Number of change events buffered between the mutation path and the
    /// consumer.
    ///
    /// **Performance Impact**:
    /// - Memory: 40 bytes per slot
    /// - Default 1024 slots ≈ 40KB
    ///
    /// **Default**: 1024
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// How long `publish` may wait for room in a full channel, in
    /// microseconds. `0` drops the event immediately.
    ///
    /// **Default**: 0
    #[serde(default = "default_publish_timeout_us")]
    pub publish_timeout_us: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            publish_timeout_us: default_publish_timeout_us(),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("channel.capacity must be > 0".into()));
        }

        if self.capacity > MAX_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "channel.capacity {} exceeds the {} slot limit",
                self.capacity, MAX_CAPACITY
            )));
        }

        if self.publish_timeout_us > MAX_PUBLISH_TIMEOUT_US {
            return Err(Error::InvalidConfig(format!(
                "channel.publish_timeout_us {} exceeds the {}us limit",
                self.publish_timeout_us, MAX_PUBLISH_TIMEOUT_US
            )));
        }

        Ok(())
    }
}

fn default_capacity() -> usize {
    1024
}

fn default_publish_timeout_us() -> u64 {
    0
}
