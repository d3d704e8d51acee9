use std::sync::Arc;

use tracing_test::traced_test;

use super::*;
use crate::initialize_store;
use crate::Error;
use crate::TracerError;

fn setup() -> MutationValidator {
    let registry = Arc::new(FieldRegistry::reference());
    let store = Arc::new(StateStore::for_registry(&registry));
    initialize_store(&store, &registry).unwrap();
    MutationValidator::new(registry, store)
}

#[test]
#[traced_test]
fn accepted_mutation_builds_event_from_observed_values() {
    let validator = setup();

    let outcome = validator.validate_and_apply(3, 1, 0, 42).unwrap();

    let event = outcome.event().expect("accepted");
    assert_eq!(event.field_index(), 3);
    assert_eq!(event.field_name(), "terminalMode");
    assert_eq!(event.old_value(), 1);
    assert_eq!(event.new_value(), 0);
    assert_eq!(event.actor_id(), 42);
    assert_eq!(validator.store().read(3).unwrap(), 0);
    assert!(logs_contain("mutation accepted"));
}

#[test]
fn stale_expected_value_is_a_conflict_not_an_error() {
    let validator = setup();

    let outcome = validator.validate_and_apply(4, 47, 50, 1).unwrap();

    assert_eq!(outcome, MutationOutcome::Conflict);
    assert!(outcome.event().is_none());
    assert_eq!(validator.store().read(4).unwrap(), 48);
}

#[test]
fn out_of_range_index_is_reported_distinctly() {
    let validator = setup();
    let before = validator.store().snapshot();

    let result = validator.validate_and_apply(6, 0, 1, 1);

    assert!(matches!(
        result,
        Err(Error::Tracer(TracerError::InvalidField {
            index: 6,
            field_count: 6
        }))
    ));
    assert_eq!(validator.store().snapshot(), before);
}

#[test]
fn rejected_call_repeats_identically_against_unchanged_state() {
    let validator = setup();

    let first = validator.validate_and_apply(5, 81, 100, 9).unwrap();
    let second = validator.validate_and_apply(5, 81, 100, 9).unwrap();

    assert_eq!(first, MutationOutcome::Conflict);
    assert_eq!(second, MutationOutcome::Conflict);
    assert_eq!(validator.store().read(5).unwrap(), 80);
}

#[test]
fn accepted_events_chain_old_values() {
    let validator = setup();
    let values = [49, 50, 10, 10, 200];

    let mut expected = validator.registry().default_value(4).unwrap();
    let mut events = Vec::new();
    for v in values {
        let outcome = validator.validate_and_apply(4, expected, v, 1).unwrap();
        events.push(outcome.into_event().unwrap());
        expected = v;
    }

    assert_eq!(events[0].old_value(), 48);
    for pair in events.windows(2) {
        assert_eq!(pair[1].old_value(), pair[0].new_value());
        assert!(pair[1].timestamp() >= pair[0].timestamp());
    }
}
