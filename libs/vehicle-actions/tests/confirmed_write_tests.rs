//! Integration tests for the confirmed write protocol over the simulated bus

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use errors::{ErrorCode, ValResult};
use vehicle_actions::helpers::create_test_facade;
use vehicle_actions::{SignalBusFacade, TimestampedValue};
use vehicle_bus::helpers::create_test_cabin;
use vehicle_bus::ids::{self, seat};
use vehicle_bus::{set_error, AreaId, BusError, Value, WriteFault};

fn front() -> BTreeSet<AreaId> {
    BTreeSet::from([seat::ROW_1_LEFT, seat::ROW_1_RIGHT])
}

fn outcome_value(
    results: &BTreeMap<AreaId, ValResult<TimestampedValue>>,
    zone: AreaId,
) -> ValResult<Value> {
    results[&zone].as_ref().map(|v| v.value.clone()).map_err(|e| *e)
}

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn test_write_is_confirmed_per_zone() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);

    let results = facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5))
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(outcome_value(&results, seat::ROW_1_LEFT), Ok(Value::Int(5)));
    assert_eq!(outcome_value(&results, seat::ROW_1_RIGHT), Ok(Value::Int(5)));
    assert_eq!(bus.write_count(), 2);
    assert_eq!(facade.pending_write_count(), 0);
}

#[test]
fn test_zones_holding_the_value_are_not_written() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.seed_value(ids::HVAC_FAN_SPEED, seat::ROW_1_RIGHT, Value::Int(5));

    let results = facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5))
        .unwrap();

    assert_eq!(outcome_value(&results, seat::ROW_1_LEFT), Ok(Value::Int(5)));
    assert_eq!(results[&seat::ROW_1_RIGHT], Err(ErrorCode::ValueAlreadySet));
    assert_eq!(bus.write_count(), 1);
    assert_eq!(bus.writes()[0].area, seat::ROW_1_LEFT);
}

#[test]
fn test_float_writes_match_within_tolerance() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);

    let results = facade
        .set_with_confirmation(ids::HVAC_TEMPERATURE_SET, &front(), &Value::Float(21.000_002))
        .unwrap();

    assert_eq!(results[&seat::ROW_1_LEFT], Err(ErrorCode::ValueAlreadySet));
    assert_eq!(results[&seat::ROW_1_RIGHT], Err(ErrorCode::ValueAlreadySet));
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_after_write_hook_runs_once_per_batch() {
    let bus = create_test_cabin();
    let batches = Arc::new(AtomicUsize::new(0));
    let counter = batches.clone();
    let facade = SignalBusFacade::new(bus.clone(), bus.clock())
        .with_confirmation_timeout(Duration::from_millis(200))
        .with_after_write(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

    facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(6))
        .unwrap();
    facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(6))
        .unwrap();

    // The second call finds every zone already set
    assert_eq!(batches.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Faults
// ============================================================================

#[test]
fn test_silent_zone_times_out() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.set_write_fault(ids::HVAC_FAN_SPEED, seat::ROW_1_RIGHT, WriteFault::Drop);

    let results = facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5))
        .unwrap();

    assert_eq!(outcome_value(&results, seat::ROW_1_LEFT), Ok(Value::Int(5)));
    assert_eq!(
        results[&seat::ROW_1_RIGHT],
        Err(ErrorCode::SetPropertyCallbackTimedOut)
    );
    assert_eq!(bus.listener_count(), 0);
}

#[test]
fn test_stale_event_is_ignored() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.set_write_fault(ids::HVAC_FAN_SPEED, seat::ROW_1_LEFT, WriteFault::Stale);

    let results = facade
        .set_with_confirmation(
            ids::HVAC_FAN_SPEED,
            &BTreeSet::from([seat::ROW_1_LEFT]),
            &Value::Int(5),
        )
        .unwrap();

    assert_eq!(
        results[&seat::ROW_1_LEFT],
        Err(ErrorCode::SetPropertyCallbackTimedOut)
    );
}

#[test]
fn test_foreign_value_is_skipped() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.set_write_fault(
        ids::HVAC_FAN_SPEED,
        seat::ROW_1_LEFT,
        WriteFault::Foreign(Value::Int(2)),
    );

    let results = facade
        .set_with_confirmation(
            ids::HVAC_FAN_SPEED,
            &BTreeSet::from([seat::ROW_1_LEFT]),
            &Value::Int(5),
        )
        .unwrap();

    assert_eq!(outcome_value(&results, seat::ROW_1_LEFT), Ok(Value::Int(5)));
}

#[test]
fn test_error_events_and_unavailable_changes() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.set_write_fault(
        ids::HVAC_FAN_SPEED,
        seat::ROW_1_LEFT,
        WriteFault::ErrorEvent(set_error::ACCESS_DENIED),
    );
    bus.set_write_fault(ids::HVAC_FAN_SPEED, seat::ROW_1_RIGHT, WriteFault::Unavailable);

    let results = facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5))
        .unwrap();

    assert_eq!(
        results[&seat::ROW_1_LEFT],
        Err(ErrorCode::PropertyAccessDeniedSecurity)
    );
    assert_eq!(results[&seat::ROW_1_RIGHT], Err(ErrorCode::PropertyNotAvailable));
}

#[test]
fn test_rejected_write_does_not_block_the_batch() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.set_write_fault(
        ids::HVAC_FAN_SPEED,
        seat::ROW_1_LEFT,
        WriteFault::Reject(BusError::NotAvailable),
    );

    let results = facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5))
        .unwrap();

    assert_eq!(results[&seat::ROW_1_LEFT], Err(ErrorCode::PropertyNotAvailable));
    assert_eq!(outcome_value(&results, seat::ROW_1_RIGHT), Ok(Value::Int(5)));
}

#[test]
fn test_subscription_failure_is_a_platform_defect() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    bus.fail_subscriptions(true);

    assert_eq!(
        facade.set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5)),
        Err(ErrorCode::BadPlatformImpl)
    );
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_unsupported_zone_is_reported_without_writing() {
    let bus = create_test_cabin();
    let facade = create_test_facade(&bus);
    let zones = BTreeSet::from([seat::ROW_1_LEFT, seat::ROW_2_LEFT]);

    let results = facade
        .set_with_confirmation(ids::HVAC_FAN_SPEED, &zones, &Value::Int(5))
        .unwrap();

    assert_eq!(outcome_value(&results, seat::ROW_1_LEFT), Ok(Value::Int(5)));
    assert_eq!(results[&seat::ROW_2_LEFT], Err(ErrorCode::AreaNotSupported));
    assert_eq!(bus.write_count(), 1);
}

// ============================================================================
// Interruption
// ============================================================================

#[test]
fn test_interrupt_completes_pending_writes() {
    let bus = create_test_cabin();
    let facade = Arc::new(
        SignalBusFacade::new(bus.clone(), bus.clock())
            .with_confirmation_timeout(Duration::from_secs(10)),
    );
    bus.set_write_fault(ids::HVAC_FAN_SPEED, seat::ROW_1_LEFT, WriteFault::Drop);
    bus.set_write_fault(ids::HVAC_FAN_SPEED, seat::ROW_1_RIGHT, WriteFault::Drop);

    let writer = {
        let facade = facade.clone();
        thread::spawn(move || facade.set_with_confirmation(ids::HVAC_FAN_SPEED, &front(), &Value::Int(5)))
    };

    while facade.pending_write_count() == 0 {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(facade.interrupt_pending_writes(), 1);

    let results = writer.join().unwrap().unwrap();
    assert_eq!(
        results[&seat::ROW_1_LEFT],
        Err(ErrorCode::SetPropertyCallbackInterrupted)
    );
    assert_eq!(
        results[&seat::ROW_1_RIGHT],
        Err(ErrorCode::SetPropertyCallbackInterrupted)
    );
    assert_eq!(facade.pending_write_count(), 0);
}
