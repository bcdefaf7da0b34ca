//! valctl - vehicle action control tool
//!
//! Drives the action catalogue against a simulated vehicle built from a
//! profile file. Whole-call failures exit non-zero; per-element failures are
//! reported alongside the successful elements.

mod config;
mod output;
mod parse;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{debug, info};
use vehicle_actions::{
    element_set, ActionCategory, ActionContext, AllowAll, Catalog, OffsetRequest,
    PermissionChecker, SignalBusFacade, StaticPermissions, Temperature, TemperatureUnit,
};
use vehicle_bus::{MemoryBus, SystemTimeProvider, VehicleProfile};

use crate::config::ValConfig;

const DEFAULT_CONFIG_FILE: &str = "config/valctl.yaml";
const CONFIG_ENV: &str = "VAL_CONFIG";

#[derive(Parser)]
#[command(name = "valctl")]
#[command(about = "Vehicle action control tool")]
#[command(long_about = "Vehicle action control tool

Runs catalogue actions against a simulated vehicle loaded from a profile.

Examples:
  valctl list                                                   # List every action
  valctl supported SEAT_ACTION_ENABLE_AC                        # Check support
  valctl get SEAT_ACTION_GET_HVAC_FAN_SPEED SEAT_ROW_1_LEFT
  valctl set SEAT_ACTION_SET_HVAC_FAN_SPEED 5 SEAT_ROW_1_LEFT SEAT_ROW_1_RIGHT
  valctl offset SEAT_ACTION_DECREMENT_HVAC_FAN_SPEED -1 SEAT_ROW_1_LEFT
  valctl set-temperature SEAT_ACTION_SET_HVAC_TARGET_TEMPERATURE 72 f SEAT_ROW_1_LEFT")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (yaml, toml or json), defaults to config/valctl.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vehicle profile, overrides the config file
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every action of every category
    List,

    /// Check whether an action is supported and by which elements
    Supported {
        action: String,
    },

    /// Show the value ranges of an action per element
    Ranges {
        action: String,
    },

    /// Read an action's value
    Get {
        action: String,
        /// Element names, e.g. SEAT_ROW_1_LEFT or GLOBAL
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Write a value through a set action
    Set {
        action: String,
        value: String,
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Apply a relative change through an increment/decrement action
    Offset {
        action: String,
        #[arg(allow_negative_numbers = true)]
        delta: String,
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Set a target temperature
    SetTemperature {
        action: String,
        #[arg(allow_negative_numbers = true)]
        value: f32,
        /// c or f
        unit: TemperatureUnit,
        /// Reject temperatures that are not in the vehicle's table
        #[arg(long)]
        exact: bool,
        #[arg(required = true)]
        seats: Vec<String>,
    },

    /// Read a target temperature
    GetTemperature {
        action: String,
        /// Defaults to the vehicle's display unit
        #[arg(short, long)]
        unit: Option<TemperatureUnit>,
        #[arg(required = true)]
        seats: Vec<String>,
    },

    /// Change a target temperature by a delta
    OffsetTemperature {
        action: String,
        #[arg(allow_negative_numbers = true)]
        delta: f32,
        unit: TemperatureUnit,
        #[arg(long)]
        exact: bool,
        #[arg(required = true)]
        seats: Vec<String>,
    },
}

/// Everything a command needs
struct Session {
    bus: Arc<MemoryBus>,
    catalog: Catalog,
}

impl Session {
    fn open(config: &ValConfig) -> Result<Self> {
        let profile = VehicleProfile::from_file(&config.profile)
            .with_context(|| format!("Failed to load profile {}", config.profile.display()))?;
        let bus = Arc::new(MemoryBus::from_profile(&profile, Arc::new(SystemTimeProvider))?);
        let facade = Arc::new(
            SignalBusFacade::new(bus.clone(), bus.clock())
                .with_confirmation_timeout(config.confirmation_timeout()),
        );

        let permissions: Arc<dyn PermissionChecker> = if config.granted_permissions.is_empty() {
            Arc::new(AllowAll)
        } else {
            Arc::new(StaticPermissions::new(config.granted_permissions.iter().cloned()))
        };
        let ctx = ActionContext::new(facade, permissions);
        let catalog = Catalog::new(&ctx).map_err(|code| anyhow!("Failed to build catalogue: {}", code))?;

        info!(profile = %profile.name, "Session ready");
        Ok(Self { bus, catalog })
    }

    fn category(&self, action: &str) -> Result<&ActionCategory> {
        self.catalog
            .find(action)
            .map_err(|_| anyhow!("Unknown action '{}', see 'valctl list'", action))
    }
}

/// Fails the command on a whole-call error
fn call<T>(action: &str, result: errors::ValResult<T>) -> Result<T> {
    result.map_err(|code| anyhow!("{} failed: {}", action, code))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // An explicit config file must exist; the default one is optional
    let explicit = cli.config.is_some() || std::env::var_os(CONFIG_ENV).is_some();
    let config_file =
        common::get_config_value(cli.config, CONFIG_ENV, PathBuf::from(DEFAULT_CONFIG_FILE));
    let config_file = (explicit || config_file.exists()).then_some(config_file);
    let mut config = ValConfig::load(config_file.as_deref())?;
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    common::init_logging(&config.log.to_log_config(cli.verbose, !cli.no_color))?;

    let session = Session::open(&config)?;
    let json = cli.json;

    match cli.command {
        Commands::List => output::print_operations(&session.catalog.operations(), json)?,
        Commands::Supported { action } => {
            let category = session.category(&action)?;
            let elements = if call(&action, category.is_action_supported(&action))? {
                Some(call(&action, category.supported_elements(&action))?)
            } else {
                None
            };
            output::print_supported(&action, elements.as_ref(), json)?;
        },
        Commands::Ranges { action } => {
            let category = session.category(&action)?;
            let ranges = call(&action, category.element_ranges(&action))?;
            output::print_ranges(&action, &ranges, json)?;
        },
        Commands::Get { action, elements } => {
            let category = session.category(&action)?;
            let result = call(&action, category.get(&action, element_set(elements)).await)?;
            output::print_get(&result, json)?;
        },
        Commands::Set {
            action,
            value,
            elements,
        } => {
            let category = session.category(&action)?;
            let value_type = call(&action, category.handle(&action))?.action().value_type();
            let value = parse::parse_value(&value, value_type)?;
            let requested = element_set(elements);
            debug!(%action, %value, "Setting value");
            let result = call(&action, category.set(&action, requested.clone(), value).await)?;
            output::print_set(&result, &requested, json)?;
        },
        Commands::Offset {
            action,
            delta,
            elements,
        } => {
            let category = session.category(&action)?;
            let value_type = call(&action, category.handle(&action))?.action().value_type();
            let request = parse::offset_request(&delta, value_type, element_set(elements))?;
            let result = call(&action, category.apply_offset(&action, request).await)?;
            output::print_offset(&result, json)?;
        },
        Commands::SetTemperature {
            action,
            value,
            unit,
            exact,
            seats,
        } => {
            let category = session.category(&action)?;
            let requested = element_set(seats);
            let temperature = Temperature { value, unit };
            let result = call(
                &action,
                category
                    .set_temperature(&action, requested.clone(), temperature, !exact)
                    .await,
            )?;
            output::print_set(&result, &requested, json)?;
        },
        Commands::GetTemperature { action, unit, seats } => {
            let category = session.category(&action)?;
            let result = call(
                &action,
                category.get_temperature(&action, element_set(seats), unit).await,
            )?;
            output::print_get(&result, json)?;
        },
        Commands::OffsetTemperature {
            action,
            delta,
            unit,
            exact,
            seats,
        } => {
            let category = session.category(&action)?;
            let request = OffsetRequest::Temperature {
                elements: element_set(seats),
                offset: Temperature { value: delta, unit },
                round_to_nearest: !exact,
            };
            let result = call(&action, category.apply_offset(&action, request).await)?;
            output::print_offset(&result, json)?;
        },
    }

    let stats = session.bus.stats();
    debug!(writes = stats.write_count, listeners = stats.listener_count, "Done");
    if !json && stats.write_count > 0 {
        println!("\n{} {} bus writes", "*".bright_blue(), stats.write_count);
    }
    Ok(())
}
