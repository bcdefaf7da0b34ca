//! Well-known signal and area identifiers

use crate::types::{AreaId, SignalId};

// ============================================================================
// Signals
// ============================================================================

pub const HVAC_FAN_SPEED: SignalId = 0x1540_0500;
pub const HVAC_FAN_DIRECTION: SignalId = 0x1540_0501;
pub const HVAC_TEMPERATURE_SET: SignalId = 0x1560_0503;
pub const HVAC_AC_ON: SignalId = 0x1520_0505;
pub const HVAC_MAX_AC_ON: SignalId = 0x1520_0506;
pub const HVAC_MAX_DEFROST_ON: SignalId = 0x1520_0507;
pub const HVAC_RECIRC_ON: SignalId = 0x1520_0508;
pub const HVAC_AUTO_ON: SignalId = 0x1520_050A;
pub const HVAC_SEAT_TEMPERATURE: SignalId = 0x1540_050B;
pub const HVAC_TEMPERATURE_DISPLAY_UNITS: SignalId = 0x1140_050E;
pub const HVAC_POWER_ON: SignalId = 0x1520_0510;
pub const HVAC_FAN_DIRECTION_AVAILABLE: SignalId = 0x1541_0511;
pub const HVAC_AUTO_RECIRC_ON: SignalId = 0x1520_0512;
pub const DOOR_POS: SignalId = 0x1640_0B00;
pub const DOOR_LOCK: SignalId = 0x1620_0B02;
pub const HEADLIGHTS_STATE: SignalId = 0x1140_0E00;
pub const HEADLIGHTS_SWITCH: SignalId = 0x1140_0E10;
pub const HVAC_DEFROSTER: SignalId = 0x1320_0504;
pub const HVAC_ELECTRIC_DEFROSTER_ON: SignalId = 0x1320_0514;
pub const HVAC_STEERING_WHEEL_HEAT: SignalId = 0x1140_050D;
pub const WINDOW_POS: SignalId = 0x1340_0BC0;
pub const WINDOW_LOCK: SignalId = 0x1320_0BC4;

const SIGNAL_NAMES: &[(&str, SignalId)] = &[
    ("HVAC_FAN_SPEED", HVAC_FAN_SPEED),
    ("HVAC_FAN_DIRECTION", HVAC_FAN_DIRECTION),
    ("HVAC_TEMPERATURE_SET", HVAC_TEMPERATURE_SET),
    ("HVAC_AC_ON", HVAC_AC_ON),
    ("HVAC_MAX_AC_ON", HVAC_MAX_AC_ON),
    ("HVAC_MAX_DEFROST_ON", HVAC_MAX_DEFROST_ON),
    ("HVAC_RECIRC_ON", HVAC_RECIRC_ON),
    ("HVAC_AUTO_ON", HVAC_AUTO_ON),
    ("HVAC_SEAT_TEMPERATURE", HVAC_SEAT_TEMPERATURE),
    ("HVAC_TEMPERATURE_DISPLAY_UNITS", HVAC_TEMPERATURE_DISPLAY_UNITS),
    ("HVAC_POWER_ON", HVAC_POWER_ON),
    ("HVAC_FAN_DIRECTION_AVAILABLE", HVAC_FAN_DIRECTION_AVAILABLE),
    ("HVAC_AUTO_RECIRC_ON", HVAC_AUTO_RECIRC_ON),
    ("DOOR_POS", DOOR_POS),
    ("DOOR_LOCK", DOOR_LOCK),
    ("HEADLIGHTS_STATE", HEADLIGHTS_STATE),
    ("HEADLIGHTS_SWITCH", HEADLIGHTS_SWITCH),
    ("HVAC_DEFROSTER", HVAC_DEFROSTER),
    ("HVAC_ELECTRIC_DEFROSTER_ON", HVAC_ELECTRIC_DEFROSTER_ON),
    ("HVAC_STEERING_WHEEL_HEAT", HVAC_STEERING_WHEEL_HEAT),
    ("WINDOW_POS", WINDOW_POS),
    ("WINDOW_LOCK", WINDOW_LOCK),
];

/// Look up a signal id by its well-known name
pub fn signal_by_name(name: &str) -> Option<SignalId> {
    SIGNAL_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}

/// Well-known name of a signal id
pub fn signal_name(id: SignalId) -> Option<&'static str> {
    SIGNAL_NAMES
        .iter()
        .find(|(_, s)| *s == id)
        .map(|(n, _)| *n)
}

// ============================================================================
// Units
// ============================================================================

pub const VEHICLE_UNIT_CELSIUS: i32 = 0x30;
pub const VEHICLE_UNIT_FAHRENHEIT: i32 = 0x31;

// ============================================================================
// Areas
// ============================================================================

pub mod seat {
    use super::AreaId;

    pub const ROW_1_LEFT: AreaId = 0x0001;
    pub const ROW_1_CENTER: AreaId = 0x0002;
    pub const ROW_1_RIGHT: AreaId = 0x0004;
    pub const ROW_2_LEFT: AreaId = 0x0010;
    pub const ROW_2_CENTER: AreaId = 0x0020;
    pub const ROW_2_RIGHT: AreaId = 0x0040;
    pub const ROW_3_LEFT: AreaId = 0x0100;
    pub const ROW_3_CENTER: AreaId = 0x0200;
    pub const ROW_3_RIGHT: AreaId = 0x0400;
}

pub mod door {
    use super::AreaId;

    pub const ROW_1_LEFT: AreaId = 0x0000_0001;
    pub const ROW_1_RIGHT: AreaId = 0x0000_0004;
    pub const ROW_2_LEFT: AreaId = 0x0000_0010;
    pub const ROW_2_RIGHT: AreaId = 0x0000_0040;
    pub const ROW_3_LEFT: AreaId = 0x0000_0100;
    pub const ROW_3_RIGHT: AreaId = 0x0000_0400;
    pub const HOOD: AreaId = 0x1000_0000;
    pub const REAR: AreaId = 0x2000_0000;
}

pub mod window {
    use super::AreaId;

    pub const FRONT_WINDSHIELD: AreaId = 0x0000_0001;
    pub const REAR_WINDSHIELD: AreaId = 0x0000_0002;
    pub const ROW_1_LEFT: AreaId = 0x0000_0010;
    pub const ROW_1_RIGHT: AreaId = 0x0000_0040;
    pub const ROW_2_LEFT: AreaId = 0x0000_0100;
    pub const ROW_2_RIGHT: AreaId = 0x0000_0400;
    pub const ROW_3_LEFT: AreaId = 0x0000_1000;
    pub const ROW_3_RIGHT: AreaId = 0x0000_4000;
    pub const ROOF_TOP_1: AreaId = 0x0001_0000;
    pub const ROOF_TOP_2: AreaId = 0x0002_0000;
}

/// Fan direction bit flags
pub mod fan_direction {
    pub const FACE: i32 = 0x1;
    pub const FLOOR: i32 = 0x2;
    pub const FACE_AND_FLOOR: i32 = 0x3;
    pub const DEFROST: i32 = 0x4;
    pub const FACE_AND_DEFROST: i32 = 0x5;
    pub const DEFROST_AND_FLOOR: i32 = 0x6;
    pub const ALL: i32 = 0x7;
}

/// Headlight states and switch positions
pub mod light_state {
    pub const OFF: i32 = 0;
    pub const ON: i32 = 1;
    pub const DAYTIME_RUNNING: i32 = 2;
    pub const AUTOMATIC: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names_roundtrip() {
        assert_eq!(signal_by_name("hvac_power_on"), Some(HVAC_POWER_ON));
        assert_eq!(signal_name(DOOR_LOCK), Some("DOOR_LOCK"));
        assert_eq!(signal_by_name("window_pos"), Some(WINDOW_POS));
        assert_eq!(signal_by_name("TIRE_PRESSURE"), None);
    }
}
