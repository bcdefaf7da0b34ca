//! Signal bus facade
//!
//! Wraps a raw [`SignalBus`] with validated, cached configs, zone-level reads
//! and the confirmed write protocol. All errors leave this module as
//! [`ErrorCode`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use errors::{ErrorCode, ValResult};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use vehicle_bus::{
    AreaId, BusError, ReadingStatus, SignalBus, SignalId, SignalReading, TimeProvider, Value,
};

use crate::confirm::{AreaOutcomes, PendingConfirmation};
use crate::property::PropertyConfig;

/// Default budget for write confirmations
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Invoked once per dispatched write batch, before waiting for events
pub type AfterWriteHook = Arc<dyn Fn() + Send + Sync>;

/// Per-zone read or write outcome
pub type ZoneResults = BTreeMap<AreaId, ValResult<TimestampedValue>>;

/// A value observed on the bus, with the area it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampedValue {
    pub area_id: AreaId,
    pub value: Value,
    pub timestamp_nanos: i64,
}

/// Map a synchronous bus failure
pub fn map_bus_error(err: &BusError) -> ErrorCode {
    match err {
        BusError::Internal | BusError::IllegalState(_) => ErrorCode::PlatformInternalError,
        BusError::AccessDenied => ErrorCode::PropertyAccessDeniedSecurity,
        BusError::NotAvailableRetry | BusError::NotAvailable | BusError::Other(_) => {
            ErrorCode::PropertyNotAvailable
        },
        BusError::InvalidArgument(_) => ErrorCode::BadValImpl,
    }
}

pub struct SignalBusFacade {
    bus: Arc<dyn SignalBus>,
    clock: Arc<dyn TimeProvider>,
    configs: DashMap<SignalId, Arc<PropertyConfig>>,
    confirmation_timeout: Duration,
    after_write: Option<AfterWriteHook>,
    in_flight: DashMap<u64, Arc<PendingConfirmation>>,
    next_write: AtomicU64,
}

impl SignalBusFacade {
    /// `clock` must be the clock the bus stamps its readings with
    pub fn new(bus: Arc<dyn SignalBus>, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            bus,
            clock,
            configs: DashMap::new(),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            after_write: None,
            in_flight: DashMap::new(),
            next_write: AtomicU64::new(0),
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_after_write(mut self, hook: AfterWriteHook) -> Self {
        self.after_write = Some(hook);
        self
    }

    pub fn clock(&self) -> &Arc<dyn TimeProvider> {
        &self.clock
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    /// Validated config of `id`, cached after the first success
    pub fn config(&self, id: SignalId) -> ValResult<Arc<PropertyConfig>> {
        if let Some(config) = self.configs.get(&id) {
            return Ok(Arc::clone(config.value()));
        }

        let raw = self.bus.signal_configs(&[id]).map_err(|e| {
            warn!(signal = id, "Config query failed: {}", e);
            map_bus_error(&e)
        })?;
        let config = PropertyConfig::validate(id, raw).map_err(|code| {
            if code == ErrorCode::BadPlatformImpl {
                error!(signal = id, "Malformed signal config");
            }
            code
        })?;

        let config = Arc::new(config);
        self.configs.insert(id, Arc::clone(&config));
        debug!(signal = id, areas = config.area_ids().count(), "Cached signal config");
        Ok(config)
    }

    pub fn is_supported(&self, id: SignalId) -> ValResult<bool> {
        match self.config(id) {
            Ok(_) => Ok(true),
            Err(ErrorCode::PropertyNotSupported) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// `false` if any zone has no covering area id
    pub fn are_all_areas_supported(&self, id: SignalId, zones: &BTreeSet<AreaId>) -> ValResult<bool> {
        if zones.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        let config = self.config(id)?;
        Ok(zones.iter().all(|zone| config.area_id(*zone).is_ok()))
    }

    /// Read every zone; zones covered by the same area id share one read
    pub fn get_values(&self, id: SignalId, zones: &BTreeSet<AreaId>) -> ValResult<ZoneResults> {
        if zones.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        let config = self.config(id)?;

        let mut reads: FxHashMap<AreaId, ValResult<TimestampedValue>> = FxHashMap::default();
        let mut results = BTreeMap::new();
        for zone in zones {
            let outcome = match config.area_id(*zone) {
                Ok(area) => reads
                    .entry(area)
                    .or_insert_with(|| self.read_area(&config, area))
                    .clone(),
                Err(code) => Err(code),
            };
            results.insert(*zone, outcome);
        }
        Ok(results)
    }

    fn read_area(&self, config: &PropertyConfig, area: AreaId) -> ValResult<TimestampedValue> {
        let readable = config.area(area).is_some_and(|a| a.access.is_readable());
        if !readable {
            return Err(ErrorCode::AreaNotReadable);
        }

        let reading = self.bus.get(config.id, area).map_err(|e| {
            warn!(signal = config.id, area, "Read failed: {}", e);
            map_bus_error(&e)
        })?;
        self.validate_reading(config, area, reading)
    }

    fn validate_reading(
        &self,
        config: &PropertyConfig,
        area: AreaId,
        reading: SignalReading,
    ) -> ValResult<TimestampedValue> {
        if reading.signal != config.id || reading.area != area {
            error!(
                signal = config.id,
                area,
                echoed_signal = reading.signal,
                echoed_area = reading.area,
                "Reading echoes the wrong signal or area"
            );
            return Err(ErrorCode::BadPlatformImpl);
        }

        match reading.status {
            ReadingStatus::Available => {},
            ReadingStatus::Unavailable => return Err(ErrorCode::PropertyNotAvailable),
            ReadingStatus::Error => return Err(ErrorCode::PlatformInternalError),
            ReadingStatus::Unknown(status) => {
                error!(signal = config.id, area, status, "Unknown reading status");
                return Err(ErrorCode::BadPlatformImpl);
            },
        }

        if reading.timestamp_nanos >= self.clock.now_nanos() {
            error!(signal = config.id, area, "Reading stamped in the future");
            return Err(ErrorCode::BadPlatformImpl);
        }

        match reading.value {
            Some(value) if value.value_type() == config.value_type => Ok(TimestampedValue {
                area_id: area,
                value,
                timestamp_nanos: reading.timestamp_nanos,
            }),
            _ => {
                error!(signal = config.id, area, "Reading has no value of the signal type");
                Err(ErrorCode::BadPlatformImpl)
            },
        }
    }

    /// Write `value` to every zone and wait for the bus to confirm
    ///
    /// Zones already holding `value` are reported as `ValueAlreadySet` and
    /// never written. The result has exactly one entry per requested zone.
    pub fn set_with_confirmation(
        &self,
        id: SignalId,
        zones: &BTreeSet<AreaId>,
        value: &Value,
    ) -> ValResult<ZoneResults> {
        if zones.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        let config = self.config(id)?;
        if value.value_type() != config.value_type {
            return Err(ErrorCode::BadValImpl);
        }

        let current = self.get_values(id, zones).map_err(|_| ErrorCode::BadValImpl)?;

        let mut results = BTreeMap::new();
        let mut to_update: BTreeMap<AreaId, Vec<AreaId>> = BTreeMap::new();
        for (zone, outcome) in current {
            match outcome {
                Err(code) => {
                    results.insert(zone, Err(code));
                },
                Ok(current) if current.value.matches(value) => {
                    results.insert(zone, Err(ErrorCode::ValueAlreadySet));
                },
                Ok(current) => to_update.entry(current.area_id).or_default().push(zone),
            }
        }

        if !to_update.is_empty() {
            let area_ids: BTreeSet<AreaId> = to_update.keys().copied().collect();
            let outcomes = self.write_and_confirm(&config, &area_ids, value)?;
            for (area, area_zones) in to_update {
                let outcome = outcomes.get(&area).cloned().ok_or(ErrorCode::BadPlatformImpl)?;
                for zone in area_zones {
                    results.insert(zone, outcome.clone());
                }
            }
        }

        if results.len() != zones.len() || !zones.iter().all(|z| results.contains_key(z)) {
            error!(signal = id, "Write outcome does not cover the requested zones");
            return Err(ErrorCode::BadPlatformImpl);
        }
        Ok(results)
    }

    fn write_and_confirm(
        &self,
        config: &PropertyConfig,
        area_ids: &BTreeSet<AreaId>,
        value: &Value,
    ) -> ValResult<AreaOutcomes> {
        let pending = Arc::new(PendingConfirmation::new(
            config.id,
            area_ids.iter().copied().collect(),
            value.clone(),
            Arc::clone(&self.clock),
        ));
        let subscription = self
            .bus
            .subscribe(config.id, pending.clone())
            .map_err(|e| {
                error!(signal = config.id, "Subscription failed: {}", e);
                ErrorCode::BadPlatformImpl
            })?;

        let write_id = self.next_write.fetch_add(1, Ordering::Relaxed);
        self.in_flight.insert(write_id, Arc::clone(&pending));
        let outcome = self.dispatch(config, area_ids, value, &pending);
        self.in_flight.remove(&write_id);
        self.bus.unsubscribe(subscription);
        outcome
    }

    fn dispatch(
        &self,
        config: &PropertyConfig,
        area_ids: &BTreeSet<AreaId>,
        value: &Value,
        pending: &PendingConfirmation,
    ) -> ValResult<AreaOutcomes> {
        let mut failed: FxHashMap<AreaId, ErrorCode> = FxHashMap::default();
        for area in area_ids {
            let writable = config.area(*area).is_some_and(|a| a.access.is_writable());
            if !writable {
                failed.insert(*area, ErrorCode::AreaNotWritable);
                continue;
            }
            if let Err(e) = self.bus.set(config.id, *area, value.clone()) {
                let code = map_bus_error(&e);
                warn!(signal = config.id, area = *area, code = %code, "Write rejected: {}", e);
                failed.insert(*area, code);
            }
        }

        if let Some(hook) = &self.after_write {
            hook();
        }

        let failed_ids: FxHashSet<AreaId> = failed.keys().copied().collect();
        pending.mark_failed(&failed_ids).map_err(|code| {
            error!(signal = config.id, "Rejected area already confirmed");
            code
        })?;

        let confirmed = pending.await_outcome(Instant::now() + self.confirmation_timeout);
        if confirmed.len() != area_ids.len() - failed.len() {
            error!(
                signal = config.id,
                expected = area_ids.len() - failed.len(),
                collected = confirmed.len(),
                "Confirmation count mismatch"
            );
            return Err(ErrorCode::BadValImpl);
        }

        let confirmed_count = confirmed.values().filter(|o| o.is_ok()).count();
        let mut merged = confirmed;
        for (area, code) in failed {
            merged.insert(area, Err(code));
        }
        if merged.len() != area_ids.len() || !area_ids.iter().all(|a| merged.contains_key(a)) {
            return Err(ErrorCode::BadPlatformImpl);
        }

        info!(
            signal = config.id,
            areas = area_ids.len(),
            confirmed = confirmed_count,
            value = %value,
            "Write batch finished"
        );
        Ok(merged)
    }

    /// Force-complete every in-flight confirmation as interrupted
    pub fn interrupt_pending_writes(&self) -> usize {
        let mut count = 0;
        for entry in self.in_flight.iter() {
            entry.value().interrupt();
            count += 1;
        }
        if count > 0 {
            warn!(count, "Interrupted pending writes");
        }
        count
    }

    pub fn pending_write_count(&self) -> usize {
        self.in_flight.len()
    }
}
