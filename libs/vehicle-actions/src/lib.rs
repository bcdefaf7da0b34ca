//! Vehicle action layer
//!
//! Named, permission-gated get/set/offset actions over vehicle signals.
//!
//! - [`facade::SignalBusFacade`] validates signal configs, reads zones and
//!   runs the confirmed write protocol over a [`vehicle_bus::SignalBus`]
//! - [`action`] and [`offset`] resolve each action's capability once and
//!   map element names to zones
//! - [`temperature`] handles the dual Celsius/Fahrenheit tables
//! - [`category`] groups actions into an enumerable operation table and
//!   [`catalog`] registers the built-in seat, door and light actions

pub mod action;
pub mod capability;
pub mod catalog;
pub mod category;
pub mod confirm;
pub mod elements;
pub mod facade;
pub mod generators;
pub mod hvac_power;
pub mod offset;
pub mod params;
pub mod permission;
pub mod property;
pub mod results;
pub mod temperature;
pub mod value_range;

pub use action::{Action, ActionContext, ActionDef, GetAction, SetAction};
pub use capability::{Capability, CapabilityCache, ResolveOnce};
pub use catalog::{
    Catalog, DoorActions, ExternalLightActions, FanDirection, SeatActions, SteeringWheelActions,
    WindowActions,
};
pub use category::{ActionCategory, ActionHandle, ActionKind, OperationDescriptor};
pub use elements::{element_set, ElementMap, GLOBAL_ELEMENT};
pub use facade::{SignalBusFacade, TimestampedValue, DEFAULT_CONFIRMATION_TIMEOUT};
pub use generators::RangeGenerator;
pub use offset::{OffsetAction, OffsetRequest};
pub use params::{ActionParams, PowerMode};
pub use permission::{AllowAll, PermissionChecker, StaticPermissions};
pub use results::{ActionValue, GetResult, GlobalGetResult, GlobalSetResult, OffsetResult, SetResult};
pub use temperature::{Temperature, TemperatureUnit};
pub use value_range::ValueRange;

/// Helpers for tests across the workspace
pub mod helpers {
    use std::sync::Arc;
    use std::time::Duration;

    use vehicle_bus::MemoryBus;

    use crate::action::ActionContext;
    use crate::facade::SignalBusFacade;

    /// Confirmation timeout short enough for timeout tests
    pub const TEST_CONFIRMATION_TIMEOUT: Duration = Duration::from_millis(200);

    /// Facade sharing the bus clock, with a short confirmation timeout
    pub fn create_test_facade(bus: &Arc<MemoryBus>) -> Arc<SignalBusFacade> {
        Arc::new(
            SignalBusFacade::new(bus.clone(), bus.clock())
                .with_confirmation_timeout(TEST_CONFIRMATION_TIMEOUT),
        )
    }

    /// Context granting every permission
    pub fn create_test_context(bus: &Arc<MemoryBus>) -> ActionContext {
        ActionContext::allow_all(create_test_facade(bus))
    }
}
