use tracing::debug;

use super::StateStore;
use crate::FieldRegistry;
use crate::Result;

/// Writes every field's default into its slot.
///
/// Must run before the first `cas_update` and must not race with one; the
/// caller owns that ordering. Running it again resets every slot to its
/// default, discarding accepted mutations.
pub fn initialize_store(
    store: &StateStore,
    registry: &FieldRegistry,
) -> Result<()> {
    for field in registry.iter() {
        store.reset_slot(field.index(), field.default_value())?;
        debug!(
            field_index = field.index(),
            field_name = field.name(),
            value = field.default_value(),
            "slot initialized"
        );
    }
    Ok(())
}
