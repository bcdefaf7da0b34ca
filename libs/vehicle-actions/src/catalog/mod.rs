//! Built-in action catalogue
//!
//! Five categories: seats (HVAC and seat climate), doors, windows, the
//! steering wheel and exterior lights. Every action is registered up front; whether it works on a given
//! vehicle is only known once its capability is resolved.

pub mod door;
pub mod light;
pub mod seat;
pub mod steering_wheel;
pub mod window;

use errors::{ErrorCode, ValResult};

use crate::action::ActionContext;
use crate::category::{ActionCategory, OperationDescriptor};

pub use door::DoorActions;
pub use light::ExternalLightActions;
pub use seat::{FanDirection, SeatActions};
pub use steering_wheel::SteeringWheelActions;
pub use window::WindowActions;

/// Every category of the catalogue
pub struct Catalog {
    pub seats: SeatActions,
    pub doors: DoorActions,
    pub windows: WindowActions,
    pub steering_wheel: SteeringWheelActions,
    pub lights: ExternalLightActions,
}

impl Catalog {
    pub fn new(ctx: &ActionContext) -> ValResult<Self> {
        Ok(Self {
            seats: SeatActions::new(ctx)?,
            doors: DoorActions::new(ctx)?,
            windows: WindowActions::new(ctx)?,
            steering_wheel: SteeringWheelActions::new(ctx)?,
            lights: ExternalLightActions::new(ctx)?,
        })
    }

    pub fn categories(&self) -> [&ActionCategory; 5] {
        [
            self.seats.category(),
            self.doors.category(),
            self.windows.category(),
            self.steering_wheel.category(),
            self.lights.category(),
        ]
    }

    /// Category owning `action`
    pub fn find(&self, action: &str) -> ValResult<&ActionCategory> {
        self.categories()
            .into_iter()
            .find(|c| c.contains(action))
            .ok_or(ErrorCode::InvalidApiArgument)
    }

    /// Operation table of every category, keyed by category name
    pub fn operations(&self) -> Vec<(String, OperationDescriptor)> {
        self.categories()
            .into_iter()
            .flat_map(|c| {
                c.operations()
                    .into_iter()
                    .map(move |op| (c.name().to_string(), op))
            })
            .collect()
    }
}
