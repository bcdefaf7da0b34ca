//! Error taxonomy for the vehicle action layer
//!
//! Every core operation returns [`ValResult<T>`]. Whole-call failures abort an
//! action; per-element failures travel inside result maps as the same
//! [`ErrorCode`] so a multi-zone call can partially succeed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value-or-error result used throughout the action layer
pub type ValResult<T> = std::result::Result<T, ErrorCode>;

/// Closed set of error codes surfaced by actions
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ============================================================================
    // Capability errors
    // ============================================================================
    #[error("Required permission is not granted")]
    MissingRequiredPermission,

    #[error("Signal is not supported by the vehicle")]
    PropertyNotSupported,

    #[error("Area is not supported by the signal")]
    AreaNotSupported,

    #[error("Action is not supported")]
    ActionNotSupported,

    #[error("Element is not defined for the action")]
    UndefinedElement,

    #[error("Element is not supported by the action")]
    ElementNotSupported,

    #[error("Invalid API argument")]
    InvalidApiArgument,

    #[error("Area is not readable")]
    AreaNotReadable,

    #[error("Area is not writable")]
    AreaNotWritable,

    // ============================================================================
    // Contract violations
    // ============================================================================
    #[error("Vehicle platform violated its contract")]
    BadPlatformImpl,

    #[error("Action layer violated its own precondition")]
    BadValImpl,

    // ============================================================================
    // Transient hardware errors
    // ============================================================================
    #[error("Signal is not available")]
    PropertyNotAvailable,

    #[error("Platform reported an internal error")]
    PlatformInternalError,

    #[error("Access to the signal was denied")]
    PropertyAccessDeniedSecurity,

    #[error("HVAC power is disabled")]
    HvacPowerIsDisabled,

    // ============================================================================
    // Confirmation protocol errors
    // ============================================================================
    #[error("Write confirmation timed out")]
    SetPropertyCallbackTimedOut,

    #[error("Write confirmation was interrupted")]
    SetPropertyCallbackInterrupted,

    // ============================================================================
    // Value errors
    // ============================================================================
    #[error("Value is already set")]
    ValueAlreadySet,

    #[error("Value is not supported")]
    ValueNotSupported,

    #[error("Value is below the minimum")]
    ValueBelowMinimum,

    #[error("Value is above the maximum")]
    ValueAboveMaximum,
}

/// Coarse grouping of error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Permission missing, signal/zone/element/action not supported
    Capability,
    /// The vehicle platform broke its contract
    PlatformDefect,
    /// The action layer broke its own precondition
    InternalDefect,
    /// Passed through untouched, never retried here
    TransientHardware,
    /// Confirmation timeout or interruption
    Protocol,
    /// Per-element value rejection
    Value,
}

impl ErrorCode {
    /// Stable identifier, matches the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequiredPermission => "MISSING_REQUIRED_PERMISSION",
            Self::PropertyNotSupported => "PROPERTY_NOT_SUPPORTED",
            Self::AreaNotSupported => "AREA_NOT_SUPPORTED",
            Self::ActionNotSupported => "ACTION_NOT_SUPPORTED",
            Self::UndefinedElement => "UNDEFINED_ELEMENT",
            Self::ElementNotSupported => "ELEMENT_NOT_SUPPORTED",
            Self::InvalidApiArgument => "INVALID_API_ARGUMENT",
            Self::AreaNotReadable => "AREA_NOT_READABLE",
            Self::AreaNotWritable => "AREA_NOT_WRITABLE",
            Self::BadPlatformImpl => "BAD_PLATFORM_IMPL",
            Self::BadValImpl => "BAD_VAL_IMPL",
            Self::PropertyNotAvailable => "PROPERTY_NOT_AVAILABLE",
            Self::PlatformInternalError => "PLATFORM_INTERNAL_ERROR",
            Self::PropertyAccessDeniedSecurity => "PROPERTY_ACCESS_DENIED_SECURITY",
            Self::HvacPowerIsDisabled => "HVAC_POWER_IS_DISABLED",
            Self::SetPropertyCallbackTimedOut => "SET_PROPERTY_CALLBACK_TIMED_OUT",
            Self::SetPropertyCallbackInterrupted => "SET_PROPERTY_CALLBACK_INTERRUPTED",
            Self::ValueAlreadySet => "VALUE_ALREADY_SET",
            Self::ValueNotSupported => "VALUE_NOT_SUPPORTED",
            Self::ValueBelowMinimum => "VALUE_BELOW_MINIMUM",
            Self::ValueAboveMaximum => "VALUE_ABOVE_MAXIMUM",
        }
    }

    /// Error class used for triage and log levels
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingRequiredPermission
            | Self::PropertyNotSupported
            | Self::AreaNotSupported
            | Self::ActionNotSupported
            | Self::UndefinedElement
            | Self::ElementNotSupported
            | Self::InvalidApiArgument
            | Self::AreaNotReadable
            | Self::AreaNotWritable => ErrorClass::Capability,

            Self::BadPlatformImpl => ErrorClass::PlatformDefect,
            Self::BadValImpl => ErrorClass::InternalDefect,

            Self::PropertyNotAvailable
            | Self::PlatformInternalError
            | Self::PropertyAccessDeniedSecurity
            | Self::HvacPowerIsDisabled => ErrorClass::TransientHardware,

            Self::SetPropertyCallbackTimedOut | Self::SetPropertyCallbackInterrupted => {
                ErrorClass::Protocol
            },

            Self::ValueAlreadySet
            | Self::ValueNotSupported
            | Self::ValueBelowMinimum
            | Self::ValueAboveMaximum => ErrorClass::Value,
        }
    }
}

// Tests
#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serde_name() {
        for code in [
            ErrorCode::BadPlatformImpl,
            ErrorCode::SetPropertyCallbackTimedOut,
            ErrorCode::PropertyAccessDeniedSecurity,
            ErrorCode::ValueAboveMaximum,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(ErrorCode::BadPlatformImpl.class(), ErrorClass::PlatformDefect);
        assert_eq!(ErrorCode::BadValImpl.class(), ErrorClass::InternalDefect);
        assert_eq!(
            ErrorCode::SetPropertyCallbackInterrupted.class(),
            ErrorClass::Protocol
        );
        assert_eq!(ErrorCode::ValueAlreadySet.class(), ErrorClass::Value);
        assert_eq!(
            ErrorCode::MissingRequiredPermission.class(),
            ErrorClass::Capability
        );
    }

    #[test]
    fn test_roundtrip_from_json() {
        let code: ErrorCode = serde_json::from_str("\"HVAC_POWER_IS_DISABLED\"").unwrap();
        assert_eq!(code, ErrorCode::HvacPowerIsDisabled);
    }
}
