//! Bus traits
//!
//! The bus is a synchronous collaborator: reads and writes return
//! immediately, and the outcome of a write is reported later through a
//! [`SignalListener`] on the bus notification thread.

use std::sync::Arc;

use crate::error::BusError;
use crate::types::{AreaId, SignalConfig, SignalId, SignalReading, Value};

/// Handle returned by [`SignalBus::subscribe`]
pub type SubscriptionId = u64;

/// Receives asynchronous events for one signal
pub trait SignalListener: Send + Sync {
    /// A value changed (or its status did)
    fn on_change(&self, reading: &SignalReading);

    /// A previously accepted write failed, `code` is one of [`crate::set_error`]
    fn on_error(&self, signal: SignalId, area: AreaId, code: i32);
}

/// Read/write/config primitives for signals
pub trait SignalBus: Send + Sync + 'static {
    /// Configs for the requested ids; unknown ids are omitted
    fn signal_configs(&self, ids: &[SignalId]) -> Result<Vec<SignalConfig>, BusError>;

    /// Read one area of a signal
    fn get(&self, signal: SignalId, area: AreaId) -> Result<SignalReading, BusError>;

    /// Fire-and-forget write; confirmation arrives through listeners
    fn set(&self, signal: SignalId, area: AreaId, value: Value) -> Result<(), BusError>;

    /// Register a listener for change and error events of `signal`
    fn subscribe(
        &self,
        signal: SignalId,
        listener: Arc<dyn SignalListener>,
    ) -> Result<SubscriptionId, BusError>;

    /// Remove a listener; unknown ids are ignored
    fn unsubscribe(&self, subscription: SubscriptionId);
}
