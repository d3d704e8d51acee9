use std::thread;
use std::time::Duration;
use std::time::Instant;

use tracing_test::traced_test;

use super::*;
use crate::Error;
use crate::MAX_CAPACITY;

fn event(n: u32) -> ChangeEvent {
    ChangeEvent::new(u64::from(n), 1, 0, "version", n, n + 1)
}

fn emitter(
    capacity: usize,
    publish_timeout_us: u64,
) -> ChannelEmitter {
    ChannelEmitter::new(&ChannelConfig {
        capacity,
        publish_timeout_us,
    })
    .unwrap()
}

#[test]
fn published_events_reach_the_consumer_in_order() {
    let emitter = emitter(8, 0);
    let stream = emitter.subscribe().unwrap();

    for n in 0..3 {
        emitter.publish(event(n));
    }

    let received = stream.drain();
    assert_eq!(received, vec![event(0), event(1), event(2)]);
    assert_eq!(emitter.dropped_event_count(), 0);
}

#[test]
#[traced_test]
fn events_before_attachment_are_dropped_not_replayed() {
    let emitter = emitter(8, 0);

    emitter.publish(event(0));
    emitter.publish(event(1));
    let stream = emitter.subscribe().unwrap();
    emitter.publish(event(2));

    assert_eq!(stream.drain(), vec![event(2)]);
    assert_eq!(emitter.dropped_event_count(), 2);
    assert!(logs_contain("event channel dropping change events"));
}

#[test]
fn full_channel_drops_and_counts_without_blocking() {
    let emitter = emitter(2, 0);
    let stream = emitter.subscribe().unwrap();

    let started = Instant::now();
    for n in 0..5 {
        emitter.publish(event(n));
    }

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(emitter.dropped_event_count(), 3);
    assert_eq!(stream.drain(), vec![event(0), event(1)]);
}

#[test]
fn bounded_wait_gives_up_after_timeout() {
    let emitter = emitter(1, 2_000);
    let _stream = emitter.subscribe().unwrap();
    emitter.publish(event(0));

    let started = Instant::now();
    emitter.publish(event(1));

    assert!(started.elapsed() >= Duration::from_micros(2_000));
    assert_eq!(emitter.dropped_event_count(), 1);
}

#[test]
fn bounded_wait_succeeds_when_consumer_catches_up() {
    let emitter = emitter(1, 500_000);
    let stream = emitter.subscribe().unwrap();
    emitter.publish(event(0));

    let consumer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        let first = stream.next_timeout(Duration::from_secs(1));
        let second = stream.next_timeout(Duration::from_secs(1));
        (first, second)
    });
    emitter.publish(event(1));

    let (first, second) = consumer.join().unwrap();
    assert_eq!(first, Some(event(0)));
    assert_eq!(second, Some(event(1)));
    assert_eq!(emitter.dropped_event_count(), 0);
}

#[test]
fn detached_consumer_counts_as_drop() {
    let emitter = emitter(8, 0);
    let stream = emitter.subscribe().unwrap();
    drop(stream);

    emitter.publish(event(0));

    assert_eq!(emitter.dropped_event_count(), 1);
}

#[test]
fn second_subscribe_is_rejected() {
    let emitter = emitter(8, 0);
    let _stream = emitter.subscribe().unwrap();

    assert!(matches!(
        emitter.subscribe(),
        Err(Error::Tracer(TracerError::StreamTaken))
    ));
}

#[test]
fn close_ends_the_stream_after_draining() {
    let emitter = emitter(8, 0);
    let mut stream = emitter.subscribe().unwrap();
    emitter.publish(event(0));

    emitter.close();
    emitter.publish(event(1));

    assert!(emitter.is_closed());
    assert_eq!(stream.next(), Some(event(0)));
    assert_eq!(stream.next(), None);
    assert!(stream.is_finished());
    assert_eq!(emitter.dropped_event_count(), 1);
}

#[test]
fn next_timeout_distinguishes_idle_from_finished() {
    let emitter = emitter(8, 0);
    let stream = emitter.subscribe().unwrap();

    assert_eq!(stream.next_timeout(Duration::from_millis(5)), None);
    assert!(!stream.is_finished());

    emitter.close();
    assert_eq!(stream.next_timeout(Duration::from_millis(5)), None);
    assert!(stream.is_finished());
}

#[test]
fn concurrent_publishers_never_lose_count() {
    const THREADS: u32 = 4;
    const PER_THREAD: u32 = 500;
    let emitter = std::sync::Arc::new(emitter(64, 0));
    let stream = emitter.subscribe().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let emitter = emitter.clone();
            thread::spawn(move || {
                for n in 0..PER_THREAD {
                    emitter.publish(event(t * PER_THREAD + n));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let delivered = stream.drain().len() as u64;
    assert_eq!(
        delivered + emitter.dropped_event_count(),
        u64::from(THREADS * PER_THREAD)
    );
    assert!(delivered <= 64);
}

#[test]
fn drain_marks_a_closed_stream_finished() {
    let emitter = emitter(8, 0);
    let stream = emitter.subscribe().unwrap();
    emitter.publish(event(0));

    assert_eq!(stream.drain(), vec![event(0)]);
    assert!(!stream.is_finished());

    emitter.publish(event(1));
    emitter.close();

    assert_eq!(stream.drain(), vec![event(1)]);
    assert!(stream.is_finished());
}

#[test]
fn invalid_channel_config_is_rejected() {
    for capacity in [0, MAX_CAPACITY + 1] {
        let result = ChannelEmitter::new(&ChannelConfig {
            capacity,
            publish_timeout_us: 0,
        });

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
