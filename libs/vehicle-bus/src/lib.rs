//! Vehicle signal bus
//!
//! The boundary between the action layer and the hardware: a raw signal
//! model, the synchronous [`SignalBus`] trait with asynchronous change/error
//! delivery through [`SignalListener`], and an in-memory simulated vehicle.

pub mod error;
pub mod ids;
pub mod memory_impl;
pub mod profile;
pub mod time;
pub mod traits;
pub mod types;

pub use error::{BusError, ProfileError};
pub use memory_impl::{BusStats, MemoryBus, ReadFault, WriteFault, WriteRecord};
pub use profile::{AreaProfile, IdRef, ProfileValue, SignalProfile, VehicleProfile};
pub use time::{FixedTimeProvider, SystemTimeProvider, TickingTimeProvider, TimeProvider};
pub use traits::{SignalBus, SignalListener, SubscriptionId};
pub use types::{
    float_eq, set_error, Access, AreaConfig, AreaId, AreaType, ReadingStatus, SignalConfig,
    SignalId, SignalReading, Value, ValueType, FLOAT_TOLERANCE, GLOBAL_AREA_ID,
};

/// Helpers for tests across the workspace
pub mod helpers {
    use std::sync::Arc;

    use crate::ids::{self, seat};
    use crate::memory_impl::MemoryBus;
    use crate::time::TickingTimeProvider;
    use crate::types::{Access, AreaConfig, AreaType, SignalConfig, Value, ValueType};

    /// Empty bus on a ticking clock
    pub fn create_test_bus() -> Arc<MemoryBus> {
        Arc::new(MemoryBus::new(Arc::new(TickingTimeProvider::default())))
    }

    /// Seat signal config over `areas`
    pub fn seat_signal(
        id: i32,
        value_type: ValueType,
        areas: &[i32],
        range: Option<(Value, Value)>,
    ) -> SignalConfig {
        SignalConfig {
            id,
            value_type,
            area_type: AreaType::Seat,
            access: Access::ReadWrite,
            config_array: vec![],
            area_configs: areas
                .iter()
                .map(|area| {
                    let config = AreaConfig::new(*area, Access::ReadWrite);
                    match &range {
                        Some((min, max)) => config.with_range(min.clone(), max.clone()),
                        None => config,
                    }
                })
                .collect(),
        }
    }

    /// Two front seats with HVAC power, fan speed, temperature and display units
    pub fn create_test_cabin() -> Arc<MemoryBus> {
        let bus = create_test_bus();
        let front = [seat::ROW_1_LEFT, seat::ROW_1_RIGHT];

        let mut power = seat_signal(ids::HVAC_POWER_ON, ValueType::Boolean, &front, None);
        power.config_array = vec![ids::HVAC_FAN_SPEED, ids::HVAC_TEMPERATURE_SET];
        bus.add_signal(power);

        bus.add_signal(seat_signal(
            ids::HVAC_FAN_SPEED,
            ValueType::Int32,
            &front,
            Some((Value::Int(1), Value::Int(7))),
        ));
        bus.add_signal(seat_signal(
            ids::HVAC_TEMPERATURE_SET,
            ValueType::Float,
            &front,
            Some((Value::Float(16.0), Value::Float(28.0))),
        ));
        bus.add_signal(SignalConfig {
            id: ids::HVAC_TEMPERATURE_DISPLAY_UNITS,
            value_type: ValueType::Int32,
            area_type: AreaType::Global,
            access: Access::ReadWrite,
            config_array: vec![],
            area_configs: vec![AreaConfig::new(0, Access::ReadWrite)],
        });

        for area in front {
            bus.seed_value(ids::HVAC_POWER_ON, area, Value::Bool(true));
            bus.seed_value(ids::HVAC_FAN_SPEED, area, Value::Int(3));
            bus.seed_value(ids::HVAC_TEMPERATURE_SET, area, Value::Float(21.0));
        }
        bus.seed_value(
            ids::HVAC_TEMPERATURE_DISPLAY_UNITS,
            0,
            Value::Int(ids::VEHICLE_UNIT_CELSIUS),
        );
        bus
    }
}
