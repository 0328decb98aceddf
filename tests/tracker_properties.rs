use std::cell::RefCell;
use std::rc::Rc;

use assert_matches::assert_matches;
use laptick::clock::{Clock, ManualClock};
use laptick::persistence::{MemorySnapshotStore, SnapshotStore, MAX_PERSISTED_LAPS};
use laptick::{Mode, Phase, TimeTracker, TrackerError, TrackerEvent, ValidationIssue};
use proptest::prelude::*;

fn tracker_at(start_ms: u64) -> (TimeTracker, ManualClock, MemorySnapshotStore) {
    let clock = ManualClock::new(start_ms);
    let store = MemorySnapshotStore::new();
    let tracker = TimeTracker::new(Box::new(clock.clone()), Box::new(store.clone()));
    (tracker, clock, store)
}

#[test]
fn countdown_tick_sequence() {
    let (mut t, clock, _) = tracker_at(7_000);
    let completions = Rc::new(RefCell::new(0u32));
    let counter = Rc::clone(&completions);
    t.subscribe(move |e| {
        if *e == TrackerEvent::CountdownCompleted {
            *counter.borrow_mut() += 1;
        }
    });

    t.switch_mode(Mode::Countdown).unwrap();
    t.configure_countdown(0, 0, 5).unwrap();
    t.start().unwrap();
    let t0 = clock.now_ms();

    t.tick(t0 + 2000);
    assert_eq!(t.elapsed_ms(), 3000);
    assert_eq!(*completions.borrow(), 0);

    t.tick(t0 + 5000);
    assert_eq!(t.elapsed_ms(), 0);
    assert_eq!(t.phase(), Phase::Idle);
    assert!(!t.can_lap());

    t.tick(t0 + 9000);
    assert_eq!(*completions.borrow(), 1);
}

#[test]
fn irregular_ticks_do_not_drift() {
    let (mut t, clock, _) = tracker_at(0);
    t.start().unwrap();
    for gap in [16, 17, 5_000, 1, 33, 250_000] {
        clock.advance(gap);
        t.poll();
    }
    assert_eq!(t.elapsed_ms(), 16 + 17 + 5_000 + 1 + 33 + 250_000);
}

#[test]
fn configure_countdown_bounds() {
    let (mut t, _, _) = tracker_at(0);
    assert_matches!(
        t.configure_countdown(0, 0, 0),
        Err(TrackerError::Validation(ValidationIssue::ZeroDuration))
    );
    assert_eq!(t.configure_countdown(0, 59, 59), Ok(3_599_000));
}

#[test]
fn persisted_laps_capped_on_save() {
    let (mut t, clock, store) = tracker_at(0);
    t.start().unwrap();
    for _ in 0..(MAX_PERSISTED_LAPS + 7) {
        clock.advance(100);
        t.lap();
    }
    assert_eq!(t.laps().len(), MAX_PERSISTED_LAPS + 7);

    let saved = store.load().unwrap();
    assert_eq!(saved.laps.len(), MAX_PERSISTED_LAPS);
    assert_eq!(saved.laps[0].number, 8);
}

#[test]
fn rejected_commands_do_not_mutate() {
    let (mut t, clock, _) = tracker_at(0);
    t.start().unwrap();
    clock.advance(500);
    t.poll();
    let before = t.state().clone();

    assert!(t.switch_mode(Mode::Countdown).is_err());
    assert!(t.configure_countdown(0, 1, 0).is_err());
    assert_eq!(t.state(), &before);
}

fn restored(raw: &str) -> (TimeTracker, ManualClock) {
    let clock = ManualClock::new(0);
    let tracker = TimeTracker::new(
        Box::new(clock.clone()),
        Box::new(MemorySnapshotStore::with_raw(raw)),
    );
    (tracker, clock)
}

fn assert_lap_invariants(t: &TimeTracker) {
    let laps = t.laps();
    assert!(laps.windows(2).all(|w| w[0].cumulative_ms <= w[1].cumulative_ms));
    assert!(laps.windows(2).all(|w| w[1].index == w[0].index + 1));
    assert!(laps
        .windows(2)
        .all(|w| w[1].split_ms == w[1].cumulative_ms - w[0].cumulative_ms));
    if let Some(last) = laps.last() {
        assert!(last.cumulative_ms <= t.elapsed_ms());
    }
}

#[test]
fn huge_stored_elapsed_restores_as_fresh_stopwatch() {
    let (mut t, clock) = restored(r#"{"mode":"stopwatch","timeElapsed":1e30}"#);
    assert_eq!(t.phase(), Phase::Idle);
    t.start().unwrap();
    clock.advance(10);
    t.poll();
    assert_eq!(t.elapsed_ms(), 10);
}

#[test]
fn huge_stored_countdown_target_is_not_trusted() {
    let (mut t, clock) =
        restored(r#"{"mode":"countdown","timeElapsed":5000,"countdownTarget":1.8e19}"#);
    assert_matches!(t.start(), Err(TrackerError::Configuration));
    t.configure_countdown(0, 0, 10).unwrap();
    t.start().unwrap();
    clock.advance(4_000);
    t.poll();
    assert_eq!(t.elapsed_ms(), 6_000);
}

#[test]
fn huge_stored_lap_number_is_renumbered() {
    let (mut t, clock) = restored(
        r#"{"timeElapsed":2000,"laps":[{"number":1e12,"duration":2000,"accumulated":2000,"timestamp":"08:00:00"}]}"#,
    );
    assert_eq!(t.laps()[0].index, 1);
    t.start().unwrap();
    clock.advance(500);
    let lap = t.lap().unwrap();
    assert_eq!(lap.index, 2);
    assert_eq!(lap.split_ms, 500);
    assert_lap_invariants(&t);
}

#[test]
fn truncated_lap_history_keeps_its_numbering() {
    let (mut t, clock) = restored(
        r#"{"timeElapsed":3000,"laps":[{"number":8,"duration":700,"accumulated":2000},{"number":9,"duration":1000,"accumulated":3000}]}"#,
    );
    let laps = t.laps();
    assert_eq!((laps[0].index, laps[0].split_ms), (8, 700));
    assert_eq!((laps[1].index, laps[1].split_ms), (9, 1000));

    t.start().unwrap();
    clock.advance(250);
    assert_eq!(t.lap().unwrap().index, 10);
}

#[test]
fn laps_past_restored_elapsed_are_dropped() {
    let (mut t, clock) = restored(
        r#"{"timeElapsed":1000,"laps":[{"number":1,"duration":9000,"accumulated":9000}]}"#,
    );
    assert!(t.laps().is_empty());
    t.start().unwrap();
    clock.advance(10);
    let lap = t.lap().unwrap();
    assert_eq!((lap.index, lap.split_ms, lap.cumulative_ms), (1, 1010, 1010));
}

#[test]
fn inconsistent_laps_are_repaired_on_restore() {
    let (mut t, clock) = restored(
        r#"{"timeElapsed":5000,"laps":[
            {"number":3,"duration":1,"accumulated":1000},
            {"number":1,"duration":1,"accumulated":3000},
            {"number":2,"duration":1,"accumulated":2000},
            {"number":4,"duration":1,"accumulated":4000}
        ]}"#,
    );
    let laps = t.laps();
    assert_eq!(laps.len(), 3);
    assert_eq!(laps.iter().map(|l| l.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(laps.iter().map(|l| l.split_ms).collect::<Vec<_>>(), vec![1000, 2000, 1000]);

    t.start().unwrap();
    clock.advance(600);
    t.lap();
    assert_lap_invariants(&t);
    let total: u64 = t.laps().iter().map(|l| l.split_ms).sum();
    assert_eq!(total, 5600);
}

proptest! {
    #[test]
    fn pause_resume_keeps_continuity(
        run in 0u64..10_000_000,
        pause_gap in 0u64..10_000_000,
        after in 0u64..10_000_000,
    ) {
        let (mut t, clock, _) = tracker_at(1_000);
        t.start().unwrap();
        clock.advance(run);
        t.pause();
        let at_pause = t.elapsed_ms();
        prop_assert_eq!(at_pause, run);

        clock.advance(pause_gap);
        t.start().unwrap();
        let resume_time = clock.now_ms();
        t.tick(resume_time + after);
        prop_assert_eq!(t.elapsed_ms(), at_pause + after);
    }

    #[test]
    fn countdown_pause_resume_keeps_continuity(
        target_secs in 1u32..3_600,
        run_pct in 0u64..100,
        pause_gap in 0u64..1_000_000,
    ) {
        let (mut t, clock, _) = tracker_at(0);
        t.switch_mode(Mode::Countdown).unwrap();
        let target = t.configure_countdown(target_secs / 3600, (target_secs % 3600) / 60, target_secs % 60).unwrap();
        t.start().unwrap();
        let run = target * run_pct / 100;
        clock.advance(run);
        t.pause();
        prop_assert_eq!(t.elapsed_ms(), target - run);

        clock.advance(pause_gap);
        t.start().unwrap();
        t.poll();
        prop_assert_eq!(t.elapsed_ms(), target - run);
    }

    #[test]
    fn lap_in_countdown_is_noop(steps in proptest::collection::vec(1u64..5_000, 1..20)) {
        let (mut t, clock, _) = tracker_at(0);
        t.switch_mode(Mode::Countdown).unwrap();
        t.configure_countdown(10, 0, 0).unwrap();
        t.start().unwrap();
        for step in steps {
            clock.advance(step);
            prop_assert!(t.lap().is_none());
        }
        prop_assert!(t.laps().is_empty());
    }

    #[test]
    fn lap_splits_sum_to_cumulative(steps in proptest::collection::vec(0u64..60_000, 1..60)) {
        let (mut t, clock, _) = tracker_at(0);
        t.start().unwrap();
        for step in &steps {
            clock.advance(*step);
            t.lap();
        }
        let laps = t.laps();
        prop_assert!(laps.windows(2).all(|w| w[0].cumulative_ms <= w[1].cumulative_ms));
        prop_assert!(laps.iter().enumerate().all(|(i, l)| l.index as usize == i + 1));
        let total: u64 = laps.iter().map(|l| l.split_ms).sum();
        prop_assert_eq!(total, laps.last().unwrap().cumulative_ms);
    }

    #[test]
    fn reset_always_clears(ops in proptest::collection::vec(0u8..5, 0..30)) {
        let (mut t, clock, _) = tracker_at(0);
        t.configure_countdown(0, 0, 30).unwrap();
        for op in ops {
            clock.advance(700);
            match op {
                0 => { let _ = t.toggle_start(); }
                1 => { t.lap(); }
                2 => { let _ = t.toggle_mode(); }
                3 => t.poll(),
                _ => t.pause(),
            }
        }
        t.reset();
        let s = t.state();
        prop_assert_eq!(s.elapsed_ms, 0);
        prop_assert!(s.laps.is_empty());
        prop_assert!(!s.is_running());
        prop_assert!(!s.is_paused());
    }

    #[test]
    fn arbitrary_stored_laps_keep_invariants(
        elapsed in 0u64..100_000,
        stored in proptest::collection::vec((0u64..2_000_000, 0u64..200_000, 0u64..200_000), 0..20),
        step in 0u64..10_000,
    ) {
        let laps: Vec<String> = stored
            .iter()
            .map(|(n, d, a)| format!(r#"{{"number":{n},"duration":{d},"accumulated":{a}}}"#))
            .collect();
        let (mut t, clock) = restored(&format!(
            r#"{{"timeElapsed":{elapsed},"laps":[{}]}}"#,
            laps.join(",")
        ));
        assert_lap_invariants(&t);

        t.start().unwrap();
        clock.advance(step);
        t.lap();
        t.lap();
        assert_lap_invariants(&t);
        prop_assert!(t.laps().iter().all(|l| l.index >= 1));
    }

    #[test]
    fn save_load_roundtrip(lap_steps in proptest::collection::vec(1u64..10_000, 0..50), sound in any::<bool>()) {
        let (mut t, clock, store) = tracker_at(0);
        if !sound {
            t.toggle_sound();
        }
        t.start().unwrap();
        for step in &lap_steps {
            clock.advance(*step);
            t.lap();
        }
        clock.advance(1);
        t.pause();

        let restored = TimeTracker::new(Box::new(ManualClock::new(0)), Box::new(store.clone()));
        prop_assert_eq!(restored.persisted_snapshot(), t.persisted_snapshot());
        prop_assert_eq!(restored.laps(), t.laps());
        prop_assert_eq!(restored.elapsed_ms(), t.elapsed_ms());
        prop_assert_eq!(restored.phase(), Phase::Paused);
        prop_assert_eq!(restored.sound_enabled(), sound);
    }
}
