//! Bus boundary errors

use thiserror::Error;

use crate::types::SignalId;

/// Errors raised synchronously by [`crate::SignalBus`] calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("Bus internal error")]
    Internal,

    #[error("Access denied")]
    AccessDenied,

    #[error("Signal not available, try again")]
    NotAvailableRetry,

    #[error("Signal not available")]
    NotAvailable,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("{0}")]
    Other(String),
}

impl BusError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Errors building a bus from a vehicle profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid identifier '{0}'")]
    InvalidId(String),

    #[error("Signal {signal:#x}: {reason}")]
    InvalidSignal { signal: SignalId, reason: String },

    #[error("Failed to load profile: {0}")]
    Load(#[from] common::Error),

    #[error("Failed to parse profile: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ProfileError {
    pub fn invalid_signal(signal: SignalId, reason: impl Into<String>) -> Self {
        Self::InvalidSignal {
            signal,
            reason: reason.into(),
        }
    }
}
