//! Scheduler delivery specs
//!
//! A tick produces at most one execution; undeliverable or stale triggers
//! are dropped without one, and the drop is distinguishable in the record
//! from a failed execution.

use crate::prelude::*;
use ferry_core::{
    Clock, Delivery, DeliveryEvent, DeliveryPolicy, DeliveryState, DropReason, Effect, FakeClock,
    FakeRegistrar, SequentialIdGen, TickSchedule, TriggerPayload,
};
use ferry_engine::{EffectExecutor, Runtime};
use std::time::Duration;

#[tokio::test]
async fn n_ticks_start_n_executions_with_unique_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registrar = FakeRegistrar::new();
    let executor = EffectExecutor::open(dir.path().join("history.jsonl")).unwrap();
    let runtime = Runtime::new(
        test_config(Duration::from_secs(10 * 60)),
        registrar.clone(),
        clock.clone(),
        SequentialIdGen::default(),
        executor,
    );

    let mut schedule = TickSchedule::new(Duration::from_secs(10 * 60), &clock);
    clock.advance(Duration::from_secs(30 * 60));
    let ticks = schedule.poll(&clock);
    assert_eq!(ticks.len(), 3);

    let mut timestamps = Vec::new();
    for tick in ticks {
        let (delivery, handles) = runtime.handle_tick(tick).await.unwrap();
        assert!(matches!(delivery.state, DeliveryState::Delivered { .. }));
        for handle in handles {
            timestamps.push(handle.await.unwrap().unwrap().input.timestamp);
        }
    }

    assert_eq!(timestamps.len(), 3);
    timestamps.dedup();
    assert_eq!(timestamps.len(), 3, "each execution has its own timestamp");
    assert_eq!(registrar.call_count(), 3);
}

#[test]
fn undelivered_event_is_dropped_as_stale_after_three_hours() {
    let clock = FakeClock::new();
    let payload = TriggerPayload::new(clock.now_utc(), serde_json::json!({}));
    let mut delivery = Delivery::new(1, payload, DeliveryPolicy::default());
    let mut emitted = Vec::new();

    // Two rejected attempts, each an hour and a half apart
    for _ in 0..2 {
        let (next, effects) = delivery.transition(DeliveryEvent::Attempt, &clock);
        delivery = next;
        record_events(&effects, &mut emitted);
        let (next, effects) = delivery.transition(
            DeliveryEvent::Rejected {
                error: "orchestrator unreachable".to_string(),
            },
            &clock,
        );
        delivery = next;
        record_events(&effects, &mut emitted);
        clock.advance(Duration::from_secs(90 * 60));
    }

    // The third attempt finds the event three hours old
    let (delivery, effects) = delivery.transition(DeliveryEvent::Attempt, &clock);
    record_events(&effects, &mut emitted);

    assert!(matches!(
        delivery.state,
        DeliveryState::Dropped {
            reason: DropReason::Stale
        }
    ));

    // Distinguishable from a failed execution: a delivery:dropped record
    // exists and no execution-side records do
    assert!(emitted.iter().any(|name| name == "delivery:dropped"));
    assert!(!emitted.iter().any(|name| name.starts_with("execution:")));
}

#[test]
fn rejections_exhaust_the_attempt_budget() {
    let clock = FakeClock::new();
    let payload = TriggerPayload::new(clock.now_utc(), serde_json::json!({}));
    let mut delivery = Delivery::new(1, payload, DeliveryPolicy::default());

    for _ in 0..3 {
        let (next, _) = delivery.transition(DeliveryEvent::Attempt, &clock);
        let (next, _) = next.transition(
            DeliveryEvent::Rejected {
                error: "unreachable".to_string(),
            },
            &clock,
        );
        delivery = next;
    }

    assert!(matches!(
        delivery.state,
        DeliveryState::Dropped {
            reason: DropReason::AttemptsExhausted
        }
    ));
}

fn record_events(effects: &[Effect], into: &mut Vec<String>) {
    for effect in effects {
        if let Effect::Emit(event) = effect {
            into.push(event.name());
        }
    }
}
