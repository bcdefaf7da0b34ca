//! Validated signal configuration

use std::collections::BTreeMap;

use errors::{ErrorCode, ValResult};
use vehicle_bus::{
    Access, AreaConfig, AreaId, AreaType, SignalConfig, SignalId, ValueType, GLOBAL_AREA_ID,
};

/// Signal configuration that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyConfig {
    pub id: SignalId,
    pub value_type: ValueType,
    pub area_type: AreaType,
    pub access: Access,
    pub config_array: Vec<i32>,
    areas: BTreeMap<AreaId, AreaConfig>,
}

impl PropertyConfig {
    /// Validate what the bus returned for a single-id config query
    pub fn validate(id: SignalId, mut raw: Vec<SignalConfig>) -> ValResult<Self> {
        let config = match raw.len() {
            0 => return Err(ErrorCode::PropertyNotSupported),
            1 => raw.remove(0),
            _ => return Err(ErrorCode::BadPlatformImpl),
        };
        if config.id != id || config.area_configs.is_empty() || config.access == Access::None {
            return Err(ErrorCode::BadPlatformImpl);
        }

        let mut areas = BTreeMap::new();
        for area in config.area_configs {
            if areas.insert(area.area_id, area).is_some() {
                return Err(ErrorCode::BadPlatformImpl);
            }
        }

        let has_global = areas.contains_key(&GLOBAL_AREA_ID);
        let valid_layout = if config.area_type == AreaType::Global {
            has_global && areas.len() == 1
        } else {
            !has_global
        };
        if !valid_layout {
            return Err(ErrorCode::BadPlatformImpl);
        }

        Ok(Self {
            id,
            value_type: config.value_type,
            area_type: config.area_type,
            access: config.access,
            config_array: config.config_array,
            areas,
        })
    }

    /// Area id of the config that covers `zone`
    ///
    /// The global zone only matches a config whose areas are exactly `{0}`;
    /// any other zone matches the first area id containing all its bits.
    pub fn area_id(&self, zone: AreaId) -> ValResult<AreaId> {
        if zone == GLOBAL_AREA_ID {
            return if self.areas.len() == 1 && self.areas.contains_key(&GLOBAL_AREA_ID) {
                Ok(GLOBAL_AREA_ID)
            } else {
                Err(ErrorCode::AreaNotSupported)
            };
        }
        self.areas
            .keys()
            .find(|area_id| **area_id & zone == zone)
            .copied()
            .ok_or(ErrorCode::AreaNotSupported)
    }

    pub fn area(&self, area_id: AreaId) -> Option<&AreaConfig> {
        self.areas.get(&area_id)
    }

    pub fn area_ids(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.areas.keys().copied()
    }

    pub fn all_readable(&self) -> bool {
        self.areas.values().all(|a| a.access.is_readable())
    }

    pub fn all_writable(&self) -> bool {
        self.areas.values().all(|a| a.access.is_writable())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn raw(area_type: AreaType, areas: &[AreaId]) -> SignalConfig {
        SignalConfig {
            id: 7,
            value_type: ValueType::Int32,
            area_type,
            access: Access::ReadWrite,
            config_array: vec![],
            area_configs: areas
                .iter()
                .map(|a| AreaConfig::new(*a, Access::ReadWrite))
                .collect(),
        }
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            PropertyConfig::validate(7, vec![]),
            Err(ErrorCode::PropertyNotSupported)
        );
        assert_eq!(
            PropertyConfig::validate(7, vec![raw(AreaType::Seat, &[1]), raw(AreaType::Seat, &[2])]),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            PropertyConfig::validate(8, vec![raw(AreaType::Seat, &[1])]),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            PropertyConfig::validate(7, vec![raw(AreaType::Seat, &[])]),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            PropertyConfig::validate(7, vec![raw(AreaType::Global, &[1])]),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            PropertyConfig::validate(7, vec![raw(AreaType::Seat, &[0, 1])]),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            PropertyConfig::validate(7, vec![raw(AreaType::Seat, &[1, 1])]),
            Err(ErrorCode::BadPlatformImpl)
        );

        let mut no_access = raw(AreaType::Seat, &[1]);
        no_access.access = Access::None;
        assert_eq!(
            PropertyConfig::validate(7, vec![no_access]),
            Err(ErrorCode::BadPlatformImpl)
        );
    }

    #[test]
    fn test_area_id_lookup() {
        // Row 1 left+center share one area, row 1 right has its own
        let config = PropertyConfig::validate(7, vec![raw(AreaType::Seat, &[0x3, 0x4])]).unwrap();
        assert_eq!(config.area_id(0x1), Ok(0x3));
        assert_eq!(config.area_id(0x2), Ok(0x3));
        assert_eq!(config.area_id(0x4), Ok(0x4));
        assert_eq!(config.area_id(0x10), Err(ErrorCode::AreaNotSupported));
        assert_eq!(config.area_id(0), Err(ErrorCode::AreaNotSupported));

        let global = PropertyConfig::validate(7, vec![raw(AreaType::Global, &[0])]).unwrap();
        assert_eq!(global.area_id(0), Ok(0));
    }

    #[test]
    fn test_access_summary() {
        let mut config = raw(AreaType::Seat, &[0x1, 0x4]);
        config.area_configs[1].access = Access::Read;
        let config = PropertyConfig::validate(7, vec![config]).unwrap();
        assert!(config.all_readable());
        assert!(!config.all_writable());
    }
}
