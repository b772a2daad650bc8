//! Integration tests for the clock manager lifecycle and registry surface.

use std::sync::Arc;
use std::time::Duration;

use softclock::prelude::*;
use softclock_test_helpers::prelude::*;

/// Deadline generous enough for CI machines under load.
const DEADLINE: Duration = Duration::from_secs(5);

/// Window long enough to span several poll intervals.
const QUIET_WINDOW: Duration = Duration::from_millis(100);

fn counting_handler(probe: &Probe) -> TickHandler {
    let probe = probe.clone();
    Arc::new(move |_| probe.hit())
}

#[test]
fn test_registered_handler_is_invoked() {
    let clock = must(SoftClock::with_defaults());
    let probe = Probe::new();

    must(clock.register(counting_handler(&probe)));

    assert!(
        probe.wait_for(1, DEADLINE),
        "handler was never invoked after registration"
    );
    clock.shutdown();
}

#[test]
fn test_handler_receives_tick_flag() {
    let clock = must(SoftClock::with_defaults());
    let probe = Probe::new();
    let handler: TickHandler = Arc::new({
        let probe = probe.clone();
        move |flag| {
            assert_eq!(flag, TICK_FLAG);
            probe.hit();
        }
    });

    must(clock.register(handler));
    assert!(probe.wait_for(1, DEADLINE));
    clock.shutdown();
}

#[test]
fn test_capacity_is_sixteen_and_full_table_rejects() {
    let clock = must(SoftClock::with_defaults());

    let probes: Vec<Probe> = (0..MAX_HANDLERS).map(|_| Probe::new()).collect();
    for probe in &probes {
        must(clock.register(counting_handler(probe)));
    }
    assert_eq!(clock.handler_count(), MAX_HANDLERS);

    let overflow = Probe::new();
    let err = must_err(clock.register(counting_handler(&overflow)));
    assert!(matches!(err, ClockError::CapacityExceeded { capacity: 16 }));

    // The existing sixteen stay registered and invokable.
    assert_eq!(clock.handler_count(), MAX_HANDLERS);
    for probe in &probes {
        assert!(
            probe.wait_for(1, DEADLINE),
            "surviving handler stopped being invoked"
        );
    }
    assert!(overflow.stays_at(0, QUIET_WINDOW));
    clock.shutdown();
}

#[test]
fn test_mutation_under_suspension_swaps_handlers() {
    let clock = must(SoftClock::with_defaults());
    let b = Probe::new();
    let handler_b = counting_handler(&b);
    must(clock.register(handler_b.clone()));
    assert!(b.wait_for(1, DEADLINE));

    clock.suspend();
    must(clock.unregister(&handler_b));
    let c = Probe::new();
    must(clock.register(counting_handler(&c)));
    clock.resume();

    assert!(c.wait_for(1, DEADLINE), "replacement handler never invoked");
    let b_final = b.count();
    assert!(
        b.stays_at(b_final, QUIET_WINDOW),
        "unregistered handler still being invoked"
    );
    clock.shutdown();
}

#[test]
fn test_unregister_unknown_handler_fails() {
    let clock = must(SoftClock::with_defaults());
    let stranger: TickHandler = Arc::new(|_| {});

    let err = must_err(clock.unregister(&stranger));
    assert!(matches!(err, ClockError::NotRegistered));
    clock.shutdown();
}

#[test]
fn test_freed_slot_is_reusable() {
    let clock = must(SoftClock::with_defaults());

    let probes: Vec<Probe> = (0..MAX_HANDLERS).map(|_| Probe::new()).collect();
    let handlers: Vec<TickHandler> = probes.iter().map(counting_handler).collect();
    for handler in &handlers {
        must(clock.register(handler.clone()));
    }

    must(clock.unregister(&handlers[3]));
    let replacement = Probe::new();
    must(clock.register(counting_handler(&replacement)));
    assert_eq!(clock.handler_count(), MAX_HANDLERS);

    assert!(replacement.wait_for(1, DEADLINE));
    clock.shutdown();
}

#[test]
fn test_no_invocations_after_shutdown() {
    let clock = must(SoftClock::with_defaults());
    let probe = Probe::new();
    must(clock.register(counting_handler(&probe)));
    assert!(probe.wait_for(1, DEADLINE));

    clock.shutdown();
    let after = probe.count();
    assert!(
        probe.stays_at(after, QUIET_WINDOW),
        "handler invoked after shutdown returned"
    );
}

#[test]
fn test_shutdown_is_idempotent() {
    let clock = must(SoftClock::with_defaults());
    clock.shutdown();
    clock.shutdown();
}

#[test]
fn test_drop_without_explicit_shutdown_joins_thread() {
    let probe = Probe::new();
    {
        let clock = must(SoftClock::with_defaults());
        must(clock.register(counting_handler(&probe)));
        assert!(probe.wait_for(1, DEADLINE));
        // Dropped here; Drop must stop and join the dispatch thread.
    }
    let after = probe.count();
    assert!(probe.stays_at(after, QUIET_WINDOW));
}

#[test]
fn test_invalid_config_is_rejected_before_spawn() {
    let config = ClockConfig {
        tick_rate_hz: 0,
        ..Default::default()
    };
    let err = must_err(SoftClock::start(config));
    assert!(matches!(err, ClockError::InvalidConfig(_)));
}

#[test]
fn test_ticks_accumulate() {
    let clock = must(SoftClock::with_defaults());
    assert!(wait_until(DEADLINE, || clock.ticks_dispatched() >= 3));
    clock.shutdown();
}

#[test]
fn test_custom_tick_rate() {
    let config = must(
        ClockConfig::builder()
            .tick_rate_hz(100)
            .poll_interval(Duration::from_millis(5))
            .build(),
    );
    let clock = must(SoftClock::start(config));
    assert_eq!(clock.config().tick_rate_hz, 100);

    let probe = Probe::new();
    must(clock.register(counting_handler(&probe)));
    assert!(probe.wait_for(2, DEADLINE));
    clock.shutdown();
}

#[test]
fn test_concurrent_registration() {
    let clock = Arc::new(must(SoftClock::with_defaults()));
    let probes: Vec<Probe> = (0..8).map(|_| Probe::new()).collect();

    let mut workers = vec![];
    for probe in &probes {
        let clock = clock.clone();
        let handler = counting_handler(probe);
        workers.push(std::thread::spawn(move || clock.register(handler)));
    }
    for worker in workers {
        must(must(worker.join().map_err(|_| "worker panicked")));
    }

    assert_eq!(clock.handler_count(), 8);
    for probe in &probes {
        assert!(probe.wait_for(1, DEADLINE));
    }
    clock.shutdown();
}
