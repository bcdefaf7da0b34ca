//! Permission checks

use std::collections::BTreeSet;

pub const PERMISSION_CONTROL_CAR_CLIMATE: &str = "android.car.permission.CONTROL_CAR_CLIMATE";
pub const PERMISSION_CONTROL_CAR_DOORS: &str = "android.car.permission.CONTROL_CAR_DOORS";
pub const PERMISSION_CONTROL_CAR_WINDOWS: &str = "android.car.permission.CONTROL_CAR_WINDOWS";
pub const PERMISSION_CAR_EXTERIOR_LIGHTS: &str = "android.car.permission.CAR_EXTERIOR_LIGHTS";
pub const PERMISSION_CONTROL_CAR_EXTERIOR_LIGHTS: &str =
    "android.car.permission.CONTROL_CAR_EXTERIOR_LIGHTS";

pub trait PermissionChecker: Send + Sync {
    fn is_granted(&self, permission: &str) -> bool;
}

/// Grants everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn is_granted(&self, _permission: &str) -> bool {
        true
    }
}

/// Grants a fixed set of permissions
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    granted: BTreeSet<String>,
}

impl StaticPermissions {
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }
}

impl PermissionChecker for StaticPermissions {
    fn is_granted(&self, permission: &str) -> bool {
        self.granted.contains(permission)
    }
}
