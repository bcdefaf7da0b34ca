//! HVAC power dependency
//!
//! Some climate signals only accept writes while HVAC power is on for the
//! zone. The power signal's config array lists the signals that depend on it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use errors::{ErrorCode, ValResult};
use tracing::{debug, error, info};
use vehicle_bus::ids::HVAC_POWER_ON;
use vehicle_bus::{AreaId, SignalId, Value};

use crate::capability::{resolve_with, ResolveOnce};
use crate::elements::ElementMap;
use crate::facade::SignalBusFacade;

/// Outcome of checking (and possibly enabling) power for a set of elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerState {
    /// Elements the dependent operation may touch
    pub to_update: BTreeSet<String>,
    pub errors: BTreeMap<String, ErrorCode>,
    /// Elements whose power was switched on by this call
    pub enabled_by_us: BTreeSet<String>,
}

impl PowerState {
    fn all(elements: &BTreeSet<String>) -> Self {
        Self {
            to_update: elements.clone(),
            ..Self::default()
        }
    }

    /// `ValueAlreadySet` is expected for elements that were just powered on
    fn is_noise(&self, element: &str, code: ErrorCode) -> bool {
        code == ErrorCode::ValueAlreadySet && self.enabled_by_us.contains(element)
    }

    pub fn filter_errors(&self, errors: BTreeMap<String, ErrorCode>) -> BTreeMap<String, ErrorCode> {
        errors
            .into_iter()
            .filter(|(element, code)| !self.is_noise(element, *code))
            .collect()
    }

    pub fn filter_outcomes<V>(
        &self,
        outcomes: BTreeMap<String, ValResult<V>>,
    ) -> BTreeMap<String, ValResult<V>> {
        outcomes
            .into_iter()
            .filter(|(element, outcome)| match outcome {
                Err(code) => !self.is_noise(element, *code),
                Ok(_) => true,
            })
            .collect()
    }
}

pub struct HvacPowerDependency {
    facade: Arc<SignalBusFacade>,
    signal: SignalId,
    elements: ElementMap,
    enable_if_needed: bool,
    dependent: ResolveOnce<ValResult<bool>>,
}

impl HvacPowerDependency {
    pub fn new(
        facade: Arc<SignalBusFacade>,
        signal: SignalId,
        elements: ElementMap,
        enable_if_needed: bool,
    ) -> ValResult<Self> {
        if signal == HVAC_POWER_ON || elements.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        Ok(Self {
            facade,
            signal,
            elements,
            enable_if_needed,
            dependent: ResolveOnce::new(),
        })
    }

    /// Whether HVAC power gates this signal; resolved once
    pub fn is_dependent(&self) -> ValResult<bool> {
        *resolve_with(&self.dependent, || self.resolve_dependent())
    }

    fn resolve_dependent(&self) -> ValResult<bool> {
        if !self.facade.is_supported(HVAC_POWER_ON)? {
            return Ok(false);
        }
        let power = self.facade.config(HVAC_POWER_ON)?;
        if !power.config_array.contains(&self.signal) {
            return Ok(false);
        }

        let config = self.facade.config(self.signal)?;
        for area_id in config.area_ids() {
            if power.area_id(area_id).is_err() {
                error!(
                    signal = self.signal,
                    area = area_id,
                    "Area is not covered by the HVAC power signal"
                );
                return Err(ErrorCode::BadPlatformImpl);
            }
        }
        debug!(signal = self.signal, "Signal depends on HVAC power");
        Ok(true)
    }

    /// Split `elements` by power state, switching power on when allowed
    pub fn compute_power_state(&self, elements: &BTreeSet<String>) -> ValResult<PowerState> {
        if !self.is_dependent()? {
            return Ok(PowerState::all(elements));
        }

        let mut state = PowerState::default();
        if elements.is_empty() {
            return Ok(state);
        }

        let zones = self.elements.zones_for(elements)?;
        let readings = self.facade.get_values(HVAC_POWER_ON, &zones)?;
        let mut powered_off = BTreeSet::new();
        for (zone, reading) in readings {
            let element = self.element(zone)?;
            match reading {
                Err(code) => {
                    state.errors.insert(element, code);
                },
                Ok(reading) => {
                    if reading.value.as_bool().ok_or(ErrorCode::BadPlatformImpl)? {
                        state.to_update.insert(element);
                    } else {
                        powered_off.insert(zone);
                    }
                },
            }
        }

        if !self.enable_if_needed {
            for zone in powered_off {
                state.errors.insert(self.element(zone)?, ErrorCode::HvacPowerIsDisabled);
            }
            return Ok(state);
        }
        if powered_off.is_empty() {
            return Ok(state);
        }

        let outcomes = self
            .facade
            .set_with_confirmation(HVAC_POWER_ON, &powered_off, &Value::Bool(true))?;
        for (zone, outcome) in outcomes {
            let element = self.element(zone)?;
            match outcome {
                Err(code) => {
                    state.errors.insert(element, code);
                },
                Ok(confirmed) if confirmed.value.as_bool() == Some(true) => {
                    state.to_update.insert(element.clone());
                    state.enabled_by_us.insert(element);
                },
                Ok(_) => {
                    error!(signal = self.signal, zone, "HVAC power confirmed as off");
                    return Err(ErrorCode::BadValImpl);
                },
            }
        }
        if !state.enabled_by_us.is_empty() {
            info!(signal = self.signal, elements = ?state.enabled_by_us, "Enabled HVAC power");
        }
        Ok(state)
    }

    fn element(&self, zone: AreaId) -> ValResult<String> {
        self.elements
            .element(zone)
            .map(str::to_string)
            .ok_or(ErrorCode::UndefinedElement)
    }
}

/// Run `operation` on the powered elements and merge in the power errors
pub fn with_power<V, F>(
    dependency: &HvacPowerDependency,
    elements: &BTreeSet<String>,
    operation: F,
) -> ValResult<BTreeMap<String, ValResult<V>>>
where
    F: FnOnce(&BTreeSet<String>) -> ValResult<BTreeMap<String, ValResult<V>>>,
{
    let state = dependency.compute_power_state(elements)?;
    let mut results: BTreeMap<String, ValResult<V>> = state
        .errors
        .iter()
        .map(|(element, code)| (element.clone(), Err(*code)))
        .collect();
    if state.to_update.is_empty() {
        return Ok(results);
    }
    results.extend(state.filter_outcomes(operation(&state.to_update)?));
    Ok(results)
}

/// Same as [`with_power`] for operations that only report failures
pub fn with_power_errors<F>(
    dependency: &HvacPowerDependency,
    elements: &BTreeSet<String>,
    operation: F,
) -> ValResult<BTreeMap<String, ErrorCode>>
where
    F: FnOnce(&BTreeSet<String>) -> ValResult<BTreeMap<String, ErrorCode>>,
{
    let state = dependency.compute_power_state(elements)?;
    let mut results = state.errors.clone();
    if state.to_update.is_empty() {
        return Ok(results);
    }
    results.extend(state.filter_errors(operation(&state.to_update)?));
    Ok(results)
}
