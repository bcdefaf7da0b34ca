//! Write confirmation rendezvous
//!
//! One [`PendingConfirmation`] exists per dispatched write batch. The bus
//! notification thread completes zones as events arrive; the dispatching
//! thread blocks in [`PendingConfirmation::await_outcome`] and force-completes
//! whatever is left on timeout or interruption. Both sides go through the same
//! mutex, so a zone is completed exactly once.

use std::sync::Arc;
use std::time::Instant;

use errors::{ErrorCode, ValResult};
use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use vehicle_bus::{
    set_error, AreaId, ReadingStatus, SignalId, SignalListener, SignalReading, TimeProvider,
    Value,
};

use crate::facade::TimestampedValue;

/// Per-area outcomes collected for one batch
pub type AreaOutcomes = FxHashMap<AreaId, ValResult<TimestampedValue>>;

#[derive(Default)]
struct ConfirmState {
    received: FxHashSet<AreaId>,
    outcomes: AreaOutcomes,
    interrupted: bool,
}

/// Completion record shared by the dispatching and notification threads
pub struct PendingConfirmation {
    signal: SignalId,
    area_ids: FxHashSet<AreaId>,
    expected: Value,
    created_nanos: i64,
    clock: Arc<dyn TimeProvider>,
    state: Mutex<ConfirmState>,
    done: Condvar,
}

impl PendingConfirmation {
    pub fn new(
        signal: SignalId,
        area_ids: FxHashSet<AreaId>,
        expected: Value,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        let created_nanos = clock.now_nanos();
        Self {
            signal,
            area_ids,
            expected,
            created_nanos,
            clock,
            state: Mutex::new(ConfirmState::default()),
            done: Condvar::new(),
        }
    }

    /// Exclude areas whose write failed synchronously
    ///
    /// An area that already received an event cannot also have failed; that
    /// is reported as `BadValImpl`.
    pub fn mark_failed(&self, failed: &FxHashSet<AreaId>) -> ValResult<()> {
        let mut state = self.state.lock();
        for area in failed {
            if !state.received.insert(*area) {
                return Err(ErrorCode::BadValImpl);
            }
        }
        if self.is_complete(&state) {
            self.done.notify_all();
        }
        Ok(())
    }

    /// Force-complete every outstanding area with an interruption error
    pub fn interrupt(&self) {
        let mut state = self.state.lock();
        state.interrupted = true;
        self.done.notify_all();
    }

    /// Block until every area has an outcome or `deadline` passes
    ///
    /// Areas still outstanding at the deadline complete with
    /// `SetPropertyCallbackTimedOut`. Only collected outcomes are returned;
    /// areas excluded through [`Self::mark_failed`] are not part of them.
    pub fn await_outcome(&self, deadline: Instant) -> AreaOutcomes {
        let mut state = self.state.lock();
        loop {
            if self.is_complete(&state) {
                break;
            }
            if state.interrupted {
                self.finish_outstanding(&mut state, ErrorCode::SetPropertyCallbackInterrupted);
                break;
            }
            if self.done.wait_until(&mut state, deadline).timed_out() {
                if !self.is_complete(&state) {
                    let code = if state.interrupted {
                        ErrorCode::SetPropertyCallbackInterrupted
                    } else {
                        ErrorCode::SetPropertyCallbackTimedOut
                    };
                    self.finish_outstanding(&mut state, code);
                }
                break;
            }
        }
        std::mem::take(&mut state.outcomes)
    }

    fn is_complete(&self, state: &ConfirmState) -> bool {
        state.received.len() == self.area_ids.len()
    }

    fn finish_outstanding(&self, state: &mut ConfirmState, code: ErrorCode) {
        for area in &self.area_ids {
            if state.received.insert(*area) {
                debug!(signal = self.signal, area = *area, code = %code, "Write not confirmed");
                state.outcomes.insert(*area, Err(code));
            }
        }
    }

    /// Common filters for both event kinds
    fn accepts(&self, state: &ConfirmState, signal: SignalId, area: AreaId) -> bool {
        !self.is_complete(state)
            && signal == self.signal
            && self.area_ids.contains(&area)
            && !state.received.contains(&area)
    }

    fn complete(&self, state: &mut ConfirmState, area: AreaId, outcome: ValResult<TimestampedValue>) {
        state.outcomes.insert(area, outcome);
        state.received.insert(area);
        if self.is_complete(state) {
            self.done.notify_all();
        }
    }
}

impl SignalListener for PendingConfirmation {
    fn on_change(&self, reading: &SignalReading) {
        let mut state = self.state.lock();
        if !self.accepts(&state, reading.signal, reading.area) {
            return;
        }
        if reading.timestamp_nanos <= self.created_nanos
            || reading.timestamp_nanos >= self.clock.now_nanos()
        {
            trace!(
                signal = reading.signal,
                area = reading.area,
                "Dropped event outside the write window"
            );
            return;
        }

        let outcome = match reading.status {
            ReadingStatus::Available => match &reading.value {
                Some(value) if value.matches(&self.expected) => Ok(TimestampedValue {
                    area_id: reading.area,
                    value: value.clone(),
                    timestamp_nanos: reading.timestamp_nanos,
                }),
                _ => {
                    debug!(
                        signal = reading.signal,
                        area = reading.area,
                        "Dropped change to an unexpected value"
                    );
                    return;
                },
            },
            ReadingStatus::Unavailable => Err(ErrorCode::PropertyNotAvailable),
            ReadingStatus::Error => Err(ErrorCode::PlatformInternalError),
            ReadingStatus::Unknown(_) => Err(ErrorCode::BadPlatformImpl),
        };
        self.complete(&mut state, reading.area, outcome);
    }

    fn on_error(&self, signal: SignalId, area: AreaId, code: i32) {
        let mut state = self.state.lock();
        if !self.accepts(&state, signal, area) {
            return;
        }
        self.complete(&mut state, area, Err(map_error_event(code)));
    }
}

/// Map an asynchronous error event code
pub fn map_error_event(code: i32) -> ErrorCode {
    match code {
        set_error::TRY_AGAIN => ErrorCode::BadPlatformImpl,
        set_error::INVALID_ARG => ErrorCode::BadValImpl,
        set_error::NOT_AVAILABLE => ErrorCode::PropertyNotAvailable,
        set_error::ACCESS_DENIED => ErrorCode::PropertyAccessDeniedSecurity,
        _ => ErrorCode::PlatformInternalError,
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use std::time::Duration;

    use super::*;
    use vehicle_bus::TickingTimeProvider;

    const SIGNAL: SignalId = 0x1540_0500;

    fn pending(areas: &[AreaId], expected: Value) -> (Arc<PendingConfirmation>, Arc<TickingTimeProvider>) {
        let clock = Arc::new(TickingTimeProvider::new(1_000, 10));
        let pending = Arc::new(PendingConfirmation::new(
            SIGNAL,
            areas.iter().copied().collect(),
            expected,
            clock.clone(),
        ));
        (pending, clock)
    }

    fn reading(area: AreaId, value: Value, timestamp_nanos: i64) -> SignalReading {
        SignalReading::available(SIGNAL, area, value, timestamp_nanos)
    }

    #[test]
    fn test_admission_rules() {
        let (pending, clock) = pending(&[0x1, 0x4], Value::Int(5));
        let now = clock.now_nanos();

        // Wrong signal, unknown area, stale, future, wrong value
        pending.on_change(&SignalReading::available(SIGNAL + 1, 0x1, Value::Int(5), now));
        pending.on_change(&reading(0x10, Value::Int(5), now));
        pending.on_change(&reading(0x1, Value::Int(5), 500));
        pending.on_change(&reading(0x1, Value::Int(5), i64::MAX));
        pending.on_change(&reading(0x1, Value::Int(4), now));
        assert!(pending.state.lock().received.is_empty());

        pending.on_change(&reading(0x1, Value::Int(5), now));
        // Second event for the same area is ignored
        pending.on_error(SIGNAL, 0x1, set_error::ACCESS_DENIED);
        pending.on_error(SIGNAL, 0x4, set_error::NOT_AVAILABLE);

        let outcomes = pending.await_outcome(Instant::now() + Duration::from_secs(1));
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[&0x1].as_ref().map(|v| v.value.clone()), Ok(Value::Int(5)));
        assert_eq!(outcomes[&0x4], Err(ErrorCode::PropertyNotAvailable));
    }

    #[test]
    fn test_timeout_completes_outstanding() {
        let (pending, clock) = pending(&[0x1, 0x4], Value::Bool(true));
        pending.on_change(&reading(0x1, Value::Bool(true), clock.now_nanos()));

        let outcomes = pending.await_outcome(Instant::now() + Duration::from_millis(20));
        assert!(outcomes[&0x1].is_ok());
        assert_eq!(outcomes[&0x4], Err(ErrorCode::SetPropertyCallbackTimedOut));
    }

    #[test]
    fn test_failed_areas_are_excluded() {
        let (pending, clock) = pending(&[0x1, 0x4], Value::Int(1));
        pending.on_change(&reading(0x1, Value::Int(1), clock.now_nanos()));

        assert_eq!(
            pending.mark_failed(&FxHashSet::from_iter([0x1])),
            Err(ErrorCode::BadValImpl)
        );

        let (pending, _) = self::pending(&[0x1, 0x4], Value::Int(1));
        pending.mark_failed(&FxHashSet::from_iter([0x4])).unwrap();
        pending.interrupt();
        let outcomes = pending.await_outcome(Instant::now() + Duration::from_secs(5));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[&0x1], Err(ErrorCode::SetPropertyCallbackInterrupted));
    }

    #[test]
    fn test_status_and_error_code_mapping() {
        let (pending, clock) = pending(&[0x1, 0x2, 0x4], Value::Int(1));
        let now = clock.now_nanos();
        pending.on_change(&SignalReading {
            status: ReadingStatus::Error,
            value: None,
            ..reading(0x1, Value::Int(1), now)
        });
        pending.on_change(&SignalReading {
            status: ReadingStatus::Unknown(9),
            value: None,
            ..reading(0x2, Value::Int(1), now)
        });
        pending.on_error(SIGNAL, 0x4, 42);

        let outcomes = pending.await_outcome(Instant::now() + Duration::from_secs(1));
        assert_eq!(outcomes[&0x1], Err(ErrorCode::PlatformInternalError));
        assert_eq!(outcomes[&0x2], Err(ErrorCode::BadPlatformImpl));
        assert_eq!(outcomes[&0x4], Err(ErrorCode::PlatformInternalError));
        assert_eq!(map_error_event(set_error::TRY_AGAIN), ErrorCode::BadPlatformImpl);
        assert_eq!(map_error_event(set_error::INVALID_ARG), ErrorCode::BadValImpl);
    }
}
