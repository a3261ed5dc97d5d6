//! Playback scheduling properties

mod common;

use common::{FakeSink, silent_chunk};
use nova_voice::PlaybackScheduler;

#[test]
fn chunks_start_at_cumulative_offsets() {
    let sink = FakeSink::new();
    sink.set_clock(1.5);
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    let durations = [0.5, 0.25, 1.0, 0.1];
    for d in durations {
        scheduler.enqueue(silent_chunk(d)).unwrap();
    }

    let started = sink.started();
    let mut expected_start = 1.5;
    for (chunk, d) in started.iter().zip(durations) {
        assert!(
            (chunk.at - expected_start).abs() < 1e-9,
            "expected start {expected_start}, got {}",
            chunk.at
        );
        expected_start += d;
    }
}

#[test]
fn consecutive_chunks_never_overlap() {
    let sink = FakeSink::new();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    for d in [0.3, 0.2, 0.4] {
        scheduler.enqueue(silent_chunk(d)).unwrap();
    }

    let started = sink.started();
    for pair in started.windows(2) {
        let end_of_first = pair[0].at + pair[0].duration;
        assert!(pair[1].at >= end_of_first - 1e-9);
    }
}

#[test]
fn interrupt_flushes_all_pending_sources() {
    let sink = FakeSink::new();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    let a = scheduler.enqueue(silent_chunk(0.5)).unwrap();
    let b = scheduler.enqueue(silent_chunk(0.5)).unwrap();
    assert_eq!(scheduler.active_len(), 2);

    scheduler.interrupt();

    assert_eq!(scheduler.active_len(), 0);
    let stopped = sink.stopped();
    assert!(stopped.contains(&a));
    assert!(stopped.contains(&b));
}

#[test]
fn post_interrupt_chunk_schedules_from_current_clock() {
    let sink = FakeSink::new();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    // Queue far ahead of the clock, then interrupt
    scheduler.enqueue(silent_chunk(30.0)).unwrap();
    sink.set_clock(3.0);
    scheduler.interrupt();

    scheduler.enqueue(silent_chunk(0.5)).unwrap();
    let started = sink.started();
    assert!((started.last().unwrap().at - 3.0).abs() < 1e-9);
}

#[test]
fn idle_gap_schedules_from_now_not_the_past() {
    let sink = FakeSink::new();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    scheduler.enqueue(silent_chunk(0.2)).unwrap();
    sink.set_clock(10.0);
    scheduler.enqueue(silent_chunk(0.2)).unwrap();

    let started = sink.started();
    assert!((started[1].at - 10.0).abs() < 1e-9);
}

#[test]
fn finished_sources_are_not_stopped_later() {
    let sink = FakeSink::new();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    let a = scheduler.enqueue(silent_chunk(0.1)).unwrap();
    let b = scheduler.enqueue(silent_chunk(0.1)).unwrap();

    sink.complete(a);
    scheduler.reap();
    assert_eq!(scheduler.active_len(), 1);

    scheduler.interrupt();
    assert_eq!(sink.stopped(), vec![b]);
}

#[test]
fn teardown_is_safe_when_idle_and_when_loaded() {
    let sink = FakeSink::new();
    let mut scheduler = PlaybackScheduler::new(sink.clone());

    scheduler.teardown();
    assert_eq!(scheduler.active_len(), 0);

    scheduler.enqueue(silent_chunk(0.5)).unwrap();
    scheduler.teardown();
    assert_eq!(scheduler.active_len(), 0);
    assert_eq!(sink.stopped().len(), 1);
}
