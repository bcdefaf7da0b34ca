//! Shared ambient stack for the vehicle action workspace
//!
//! Provides the pieces every binary and library in the workspace reuses:
//! - logging bootstrap (bracketed-level console output, optional file output)
//! - layered configuration loading (file + `VAL_` environment overrides)
//! - the basic library error type

pub mod config_loader;
pub mod error;
pub mod logging;

pub use config_loader::{
    get_config_value, load_config_file_only, load_config_from_file, ENV_PREFIX,
};
pub use error::{Error, Result};
pub use logging::{init_logging, LogConfig, LogFormat};
