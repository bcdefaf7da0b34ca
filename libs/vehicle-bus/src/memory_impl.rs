//! In-memory simulated vehicle bus
//!
//! Uses DashMap for concurrent signal storage and a dedicated notification
//! thread for change/error events, mirroring how a real vehicle bus reports
//! write outcomes asynchronously. Faults can be injected per signal area.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::error::BusError;
use crate::time::{SystemTimeProvider, TimeProvider};
use crate::traits::{SignalBus, SignalListener, SubscriptionId};
use crate::types::{AreaId, ReadingStatus, SignalConfig, SignalId, SignalReading, Value};

/// How an accepted write behaves
#[derive(Debug, Clone, PartialEq)]
pub enum WriteFault {
    /// The write call itself fails
    Reject(BusError),
    /// Accepted, but no event ever follows
    Drop,
    /// Accepted, then an asynchronous error event with this code
    ErrorEvent(i32),
    /// Accepted, then a change event with status unavailable
    Unavailable,
    /// Accepted, then only an event stamped before the write
    Stale,
    /// Another writer's value is reported first, then the real change
    Foreign(Value),
}

/// How a read behaves
#[derive(Debug, Clone, PartialEq)]
pub enum ReadFault {
    /// The read call itself fails
    Reject(BusError),
    /// Reading carries this status
    Status(ReadingStatus),
    /// Reading echoes a different area id
    WrongArea(AreaId),
    /// Reading is stamped in the future
    FutureTimestamp,
    /// Reading carries a value of the wrong type
    WrongType(Value),
}

/// One recorded `set` call
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub signal: SignalId,
    pub area: AreaId,
    pub value: Value,
}

/// Statistics about the simulated bus
#[derive(Debug, Clone)]
pub struct BusStats {
    pub signal_count: usize,
    pub value_count: usize,
    pub listener_count: usize,
    pub write_count: usize,
}

enum BusEvent {
    Change(SignalReading),
    Error {
        signal: SignalId,
        area: AreaId,
        code: i32,
    },
    Flush(mpsc::Sender<()>),
}

struct Subscription {
    signal: SignalId,
    listener: Arc<dyn SignalListener>,
}

struct Inner {
    configs: DashMap<SignalId, SignalConfig>,
    values: DashMap<(SignalId, AreaId), SignalReading>,
    listeners: RwLock<FxHashMap<SubscriptionId, Subscription>>,
    next_subscription: AtomicU64,
    write_faults: DashMap<(SignalId, AreaId), WriteFault>,
    read_faults: DashMap<(SignalId, AreaId), ReadFault>,
    fail_subscriptions: AtomicBool,
    writes: Mutex<Vec<WriteRecord>>,
    clock: Arc<dyn TimeProvider>,
}

impl Inner {
    fn dispatch(&self, event: BusEvent) {
        let signal = match &event {
            BusEvent::Change(reading) => reading.signal,
            BusEvent::Error { signal, .. } => *signal,
            BusEvent::Flush(done) => {
                let _ = done.send(());
                return;
            },
        };

        // Snapshot under the read lock, call outside of it
        let targets: Vec<Arc<dyn SignalListener>> = self
            .listeners
            .read()
            .values()
            .filter(|s| s.signal == signal)
            .map(|s| Arc::clone(&s.listener))
            .collect();

        for listener in targets {
            match &event {
                BusEvent::Change(reading) => listener.on_change(reading),
                BusEvent::Error { signal, area, code } => listener.on_error(*signal, *area, *code),
                BusEvent::Flush(_) => {},
            }
        }
    }
}

/// In-memory bus with asynchronous event delivery
pub struct MemoryBus {
    inner: Arc<Inner>,
    sender: Mutex<Option<mpsc::Sender<BusEvent>>>,
    notifier: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryBus {
    /// Create an empty bus stamped by `clock`
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        let inner = Arc::new(Inner {
            configs: DashMap::new(),
            values: DashMap::new(),
            listeners: RwLock::new(FxHashMap::default()),
            next_subscription: AtomicU64::new(1),
            write_faults: DashMap::new(),
            read_faults: DashMap::new(),
            fail_subscriptions: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
            clock,
        });

        let (tx, rx) = mpsc::channel::<BusEvent>();
        let worker = Arc::clone(&inner);
        let spawned = std::thread::Builder::new()
            .name("bus-notifier".to_string())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    worker.dispatch(event);
                }
                trace!("Bus notifier stopped");
            });

        let (sender, notifier) = match spawned {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                warn!("Bus notifier thread unavailable, delivering inline: {}", e);
                (None, None)
            },
        };

        Self {
            inner,
            sender: Mutex::new(sender),
            notifier: Mutex::new(notifier),
        }
    }

    /// Create an empty bus on the system clock
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemTimeProvider))
    }

    /// Clock used for all timestamps on this bus
    pub fn clock(&self) -> Arc<dyn TimeProvider> {
        Arc::clone(&self.inner.clock)
    }

    /// Register or replace a signal config
    pub fn add_signal(&self, config: SignalConfig) {
        debug!("Bus signal {:#x}: {} areas", config.id, config.area_configs.len());
        self.inner.configs.insert(config.id, config);
    }

    /// Remove a signal and its stored values
    pub fn remove_signal(&self, signal: SignalId) {
        self.inner.configs.remove(&signal);
        self.inner.values.retain(|(id, _), _| *id != signal);
    }

    /// Store a value without emitting an event
    pub fn seed_value(&self, signal: SignalId, area: AreaId, value: Value) {
        let reading = SignalReading::available(signal, area, value, self.inner.clock.now_nanos());
        self.inner.values.insert((signal, area), reading);
    }

    /// Store a value and emit a change event, as if the hardware changed on its own
    pub fn inject_change(&self, signal: SignalId, area: AreaId, value: Value) {
        self.store_and_emit(signal, area, value);
    }

    /// Emit an asynchronous error event
    pub fn inject_error(&self, signal: SignalId, area: AreaId, code: i32) {
        self.emit(BusEvent::Error { signal, area, code });
    }

    /// Current stored value, if any
    pub fn current_value(&self, signal: SignalId, area: AreaId) -> Option<Value> {
        self.inner
            .values
            .get(&(signal, area))
            .and_then(|r| r.value.clone())
    }

    pub fn set_write_fault(&self, signal: SignalId, area: AreaId, fault: WriteFault) {
        self.inner.write_faults.insert((signal, area), fault);
    }

    pub fn clear_write_fault(&self, signal: SignalId, area: AreaId) {
        self.inner.write_faults.remove(&(signal, area));
    }

    pub fn set_read_fault(&self, signal: SignalId, area: AreaId, fault: ReadFault) {
        self.inner.read_faults.insert((signal, area), fault);
    }

    pub fn clear_read_fault(&self, signal: SignalId, area: AreaId) {
        self.inner.read_faults.remove(&(signal, area));
    }

    /// Make every subsequent `subscribe` call fail
    pub fn fail_subscriptions(&self, fail: bool) {
        self.inner.fail_subscriptions.store(fail, Ordering::SeqCst);
    }

    /// All `set` calls received so far, including rejected ones
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.inner.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.writes.lock().len()
    }

    pub fn clear_writes(&self) {
        self.inner.writes.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Block until every event emitted so far has been delivered
    pub fn flush(&self) {
        let (tx, rx) = mpsc::channel();
        self.emit(BusEvent::Flush(tx));
        let _ = rx.recv();
    }

    /// Get statistics about stored data
    pub fn stats(&self) -> BusStats {
        BusStats {
            signal_count: self.inner.configs.len(),
            value_count: self.inner.values.len(),
            listener_count: self.listener_count(),
            write_count: self.write_count(),
        }
    }

    fn emit(&self, event: BusEvent) {
        let undelivered = match self.sender.lock().as_ref() {
            Some(tx) => tx.send(event).err().map(|e| e.0),
            None => Some(event),
        };
        if let Some(event) = undelivered {
            self.inner.dispatch(event);
        }
    }

    fn store_and_emit(&self, signal: SignalId, area: AreaId, value: Value) {
        let reading = SignalReading::available(signal, area, value, self.inner.clock.now_nanos());
        self.inner.values.insert((signal, area), reading.clone());
        self.emit(BusEvent::Change(reading));
    }

    fn config(&self, signal: SignalId) -> Result<SignalConfig, BusError> {
        self.inner
            .configs
            .get(&signal)
            .map(|c| c.clone())
            .ok_or_else(|| BusError::invalid_argument(format!("unknown signal {:#x}", signal)))
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::with_system_clock()
    }
}

impl Drop for MemoryBus {
    fn drop(&mut self) {
        // Closing the channel ends the notifier loop
        self.sender.lock().take();
        if let Some(handle) = self.notifier.lock().take() {
            let _ = handle.join();
        }
    }
}

impl SignalBus for MemoryBus {
    fn signal_configs(&self, ids: &[SignalId]) -> Result<Vec<SignalConfig>, BusError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.inner.configs.get(id).map(|c| c.clone()))
            .collect())
    }

    fn get(&self, signal: SignalId, area: AreaId) -> Result<SignalReading, BusError> {
        let config = self.config(signal)?;
        if config.area_config(area).is_none() {
            return Err(BusError::invalid_argument(format!(
                "signal {:#x} has no area {:#x}",
                signal, area
            )));
        }

        let mut reading = self
            .inner
            .values
            .get(&(signal, area))
            .map(|r| r.clone())
            .unwrap_or_else(|| SignalReading {
                signal,
                area,
                status: ReadingStatus::Unavailable,
                timestamp_nanos: self.inner.clock.now_nanos(),
                value: None,
            });

        let fault = self.inner.read_faults.get(&(signal, area)).map(|f| f.clone());
        match fault {
            Some(ReadFault::Reject(e)) => return Err(e),
            Some(ReadFault::Status(status)) => reading.status = status,
            Some(ReadFault::WrongArea(other)) => reading.area = other,
            Some(ReadFault::FutureTimestamp) => reading.timestamp_nanos = i64::MAX,
            Some(ReadFault::WrongType(value)) => reading.value = Some(value),
            None => {},
        }
        Ok(reading)
    }

    fn set(&self, signal: SignalId, area: AreaId, value: Value) -> Result<(), BusError> {
        self.inner.writes.lock().push(WriteRecord {
            signal,
            area,
            value: value.clone(),
        });

        let config = self.config(signal)?;
        if config.area_config(area).is_none() {
            return Err(BusError::invalid_argument(format!(
                "signal {:#x} has no area {:#x}",
                signal, area
            )));
        }
        if value.value_type() != config.value_type {
            return Err(BusError::invalid_argument(format!(
                "signal {:#x} expects {:?}",
                signal, config.value_type
            )));
        }

        let fault = self.inner.write_faults.get(&(signal, area)).map(|f| f.clone());
        match fault {
            Some(WriteFault::Reject(e)) => Err(e),
            Some(WriteFault::Drop) => Ok(()),
            Some(WriteFault::ErrorEvent(code)) => {
                self.emit(BusEvent::Error { signal, area, code });
                Ok(())
            },
            Some(WriteFault::Unavailable) => {
                self.emit(BusEvent::Change(SignalReading {
                    signal,
                    area,
                    status: ReadingStatus::Unavailable,
                    timestamp_nanos: self.inner.clock.now_nanos(),
                    value: None,
                }));
                Ok(())
            },
            Some(WriteFault::Stale) => {
                self.emit(BusEvent::Change(SignalReading::available(
                    signal, area, value, 0,
                )));
                Ok(())
            },
            Some(WriteFault::Foreign(other)) => {
                let now = self.inner.clock.now_nanos();
                self.emit(BusEvent::Change(SignalReading::available(
                    signal, area, other, now,
                )));
                self.store_and_emit(signal, area, value);
                Ok(())
            },
            None => {
                self.store_and_emit(signal, area, value);
                Ok(())
            },
        }
    }

    fn subscribe(
        &self,
        signal: SignalId,
        listener: Arc<dyn SignalListener>,
    ) -> Result<SubscriptionId, BusError> {
        if self.inner.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(BusError::IllegalState("subscriptions disabled".to_string()));
        }
        let id = self.inner.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .write()
            .insert(id, Subscription { signal, listener });
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.inner.listeners.write().remove(&subscription);
    }
}
