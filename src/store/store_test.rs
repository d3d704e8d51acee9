use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use super::*;
use crate::Error;

#[test]
fn new_store_is_zero_valued() {
    let store = StateStore::new(4);

    assert_eq!(store.len(), 4);
    assert_eq!(store.snapshot(), vec![0, 0, 0, 0]);
}

#[test]
fn initialize_then_read_returns_defaults() {
    let registry = FieldRegistry::reference();
    let store = StateStore::for_registry(&registry);

    initialize_store(&store, &registry).unwrap();

    for field in registry.iter() {
        assert_eq!(store.read(field.index()).unwrap(), field.default_value());
    }
}

#[test]
fn initialize_twice_resets_accepted_mutations() {
    let registry = FieldRegistry::reference();
    let store = StateStore::for_registry(&registry);
    initialize_store(&store, &registry).unwrap();
    assert!(store.cas_update(4, 48, 50).unwrap());

    initialize_store(&store, &registry).unwrap();

    assert_eq!(store.read(4).unwrap(), 48);
}

#[test]
fn read_out_of_range_fails() {
    let store = StateStore::new(6);

    assert!(matches!(
        store.read(6),
        Err(Error::Tracer(TracerError::InvalidField {
            index: 6,
            field_count: 6
        }))
    ));
}

#[test]
fn cas_update_swaps_only_on_match() {
    let store = StateStore::new(1);

    assert!(!store.cas_update(0, 7, 9).unwrap());
    assert_eq!(store.read(0).unwrap(), 0);

    assert!(store.cas_update(0, 0, 9).unwrap());
    assert_eq!(store.read(0).unwrap(), 9);
}

#[test]
fn cas_update_out_of_range_leaves_store_untouched() {
    let store = StateStore::new(2);

    assert!(store.cas_update(2, 0, 1).is_err());
    assert_eq!(store.snapshot(), vec![0, 0]);
}

#[test]
fn concurrent_cas_with_same_expected_has_single_winner() {
    const THREADS: usize = 8;

    for _ in 0..50 {
        let store = Arc::new(StateStore::new(1));
        let barrier = Arc::new(Barrier::new(THREADS));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let store = store.clone();
                let barrier = barrier.clone();
                let winners = winners.clone();
                thread::spawn(move || {
                    barrier.wait();
                    if store.cas_update(0, 0, i as u32 + 1).unwrap() {
                        winners.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(winners.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_ne!(store.read(0).unwrap(), 0);
    }
}

#[test]
fn concurrent_increments_via_cas_lose_no_updates() {
    const THREADS: u32 = 4;
    const PER_THREAD: u32 = 1_000;
    let store = Arc::new(StateStore::new(1));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    loop {
                        let current = store.read(0).unwrap();
                        if store.cas_update(0, current, current + 1).unwrap() {
                            break;
                        }
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.read(0).unwrap(), THREADS * PER_THREAD);
}
