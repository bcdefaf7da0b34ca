//! Get and set actions
//!
//! [`Action`] holds what every action kind shares: the definition, the
//! resolve-once capability and the element checks. [`GetAction`] and
//! [`SetAction`] add the read and confirmed write paths on top.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use errors::{ErrorCode, ValResult};
use tracing::{debug, error, info, warn};
use vehicle_bus::{AreaId, SignalId, Value, ValueType};

use crate::capability::{resolve_with, Capability, CapabilitySlot, Resolution, ResolveOnce};
use crate::elements::ElementMap;
use crate::facade::SignalBusFacade;
use crate::generators::RangeGenerator;
use crate::hvac_power::{with_power, with_power_errors, HvacPowerDependency};
use crate::params::{ActionParams, PowerMode};
use crate::permission::{AllowAll, PermissionChecker};
use crate::property::PropertyConfig;
use crate::results::{GetResult, SetResult};
use crate::temperature::{display_units, Temperature, TemperatureTable, TemperatureUnit};
use crate::value_range::ValueRange;

/// Collaborators shared by every action
#[derive(Clone)]
pub struct ActionContext {
    pub facade: Arc<SignalBusFacade>,
    pub permissions: Arc<dyn PermissionChecker>,
}

impl ActionContext {
    pub fn new(facade: Arc<SignalBusFacade>, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            facade,
            permissions,
        }
    }

    pub fn allow_all(facade: Arc<SignalBusFacade>) -> Self {
        Self::new(facade, Arc::new(AllowAll))
    }
}

/// Static description of an action
#[derive(Debug, Clone)]
pub struct ActionDef {
    pub name: String,
    pub signal: SignalId,
    pub value_type: ValueType,
    pub permission: String,
    pub elements: ElementMap,
    pub params: ActionParams,
}

impl ActionDef {
    pub fn new(
        name: impl Into<String>,
        signal: SignalId,
        value_type: ValueType,
        permission: impl Into<String>,
        elements: ElementMap,
    ) -> Self {
        Self {
            name: name.into(),
            signal,
            value_type,
            permission: permission.into(),
            elements,
            params: ActionParams::default(),
        }
    }

    pub fn with_params(mut self, params: ActionParams) -> Self {
        self.params = params;
        self
    }

    /// Reject definitions no vehicle could ever satisfy
    fn validate(&self) -> ValResult<()> {
        let params = &self.params;
        let numeric = self.value_type.is_numeric();
        let valid = !self.name.is_empty()
            && !self.permission.is_empty()
            && !self.elements.is_empty()
            && (!params.min_max || numeric)
            && (params.required_values.is_empty()
                || (params.min_max
                    && numeric
                    && params
                        .required_values
                        .iter()
                        .all(|v| v.value_type() == self.value_type)))
            && params
                .range
                .as_ref()
                .is_none_or(|g| g.is_min_max() == params.min_max);
        if valid {
            Ok(())
        } else {
            error!(action = %self.name, "Invalid action definition");
            Err(ErrorCode::BadValImpl)
        }
    }
}

fn bounds_are_valid(value_type: ValueType, min: &Value, max: &Value) -> bool {
    match (value_type, min, max) {
        (ValueType::Int32, Value::Int(min), Value::Int(max)) => min < max,
        (ValueType::Float, Value::Float(min), Value::Float(max)) => {
            min.is_finite() && max.is_finite() && min < max
        },
        _ => false,
    }
}

/// Shared core of every action kind
pub struct Action {
    def: ActionDef,
    ctx: ActionContext,
    requires_write: bool,
    capability: CapabilitySlot,
    power: Option<HvacPowerDependency>,
}

impl Action {
    pub fn new(ctx: ActionContext, def: ActionDef, requires_write: bool) -> ValResult<Self> {
        def.validate()?;
        let power = match def.params.power {
            PowerMode::Independent => None,
            PowerMode::Dependent { enable_if_needed } => Some(HvacPowerDependency::new(
                Arc::clone(&ctx.facade),
                def.signal,
                def.elements.clone(),
                enable_if_needed,
            )?),
        };
        Ok(Self {
            def,
            ctx,
            requires_write,
            capability: Box::new(ResolveOnce::new()),
            power,
        })
    }

    /// Replace the capability storage policy
    pub fn with_capability_cache(mut self, cache: CapabilitySlot) -> Self {
        self.capability = cache;
        self
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn signal(&self) -> SignalId {
        self.def.signal
    }

    pub fn value_type(&self) -> ValueType {
        self.def.value_type
    }

    pub fn elements(&self) -> &ElementMap {
        &self.def.elements
    }

    pub fn params(&self) -> &ActionParams {
        &self.def.params
    }

    pub fn facade(&self) -> &Arc<SignalBusFacade> {
        &self.ctx.facade
    }

    pub fn power(&self) -> Option<&HvacPowerDependency> {
        self.power.as_ref()
    }

    pub fn is_temperature(&self) -> bool {
        matches!(self.def.params.range, Some(RangeGenerator::DualUnitTemperature))
    }

    // ========================================================================
    // Capability
    // ========================================================================

    /// Resolved capability, computed on first use and never refreshed
    pub fn capability(&self) -> Resolution {
        let resolved = resolve_with(&*self.capability, || self.resolve());
        (*resolved).clone()
    }

    pub fn is_supported(&self) -> ValResult<bool> {
        self.capability().map(|c| c.supported)
    }

    fn resolve(&self) -> Resolution {
        let resolution = self.resolve_uncached();
        match &resolution {
            Ok(capability) => info!(
                action = %self.def.name,
                supported = capability.supported,
                elements = capability.elements.len(),
                "Resolved action capability"
            ),
            Err(code) => warn!(action = %self.def.name, code = %code, "Action capability failed"),
        }
        resolution
    }

    fn resolve_uncached(&self) -> Resolution {
        if !self.ctx.permissions.is_granted(&self.def.permission) {
            return Err(ErrorCode::MissingRequiredPermission);
        }

        let facade = &self.ctx.facade;
        if !facade.is_supported(self.def.signal)? {
            return Ok(Arc::new(Capability::unsupported()));
        }

        let config = facade.config(self.def.signal)?;
        if config.value_type != self.def.value_type {
            error!(
                action = %self.def.name,
                expected = ?self.def.value_type,
                actual = ?config.value_type,
                "Signal has the wrong value type"
            );
            return Err(ErrorCode::BadPlatformImpl);
        }
        if !config.all_readable() || (self.requires_write && !config.all_writable()) {
            error!(action = %self.def.name, "Signal lacks the required access");
            return Err(ErrorCode::BadPlatformImpl);
        }

        let capability = self.resolve_elements(&config)?;
        if capability.elements.is_empty() {
            if self.def.params.has_custom_range() {
                return Ok(Arc::new(Capability::unsupported()));
            }
            error!(action = %self.def.name, "No element is supported");
            return Err(ErrorCode::BadValImpl);
        }

        if let Some(power) = &self.power {
            power.is_dependent()?;
        }
        Ok(Arc::new(capability))
    }

    fn resolve_elements(&self, config: &PropertyConfig) -> ValResult<Capability> {
        let mut capability = Capability {
            supported: true,
            ..Capability::default()
        };
        let min_max = self.def.params.min_max_generator();

        for (element, zone) in self.def.elements.iter() {
            let Ok(area_id) = config.area_id(zone) else {
                debug!(action = %self.def.name, element, "Zone has no area");
                continue;
            };

            if let Some(generator) = &min_max {
                let area = config.area(area_id).ok_or(ErrorCode::BadPlatformImpl)?;
                let (min, max) = match (&area.min, &area.max) {
                    (Some(min), Some(max)) if bounds_are_valid(self.def.value_type, min, max) => {
                        (min, max)
                    },
                    _ => {
                        error!(action = %self.def.name, area = area_id, "Missing or invalid bounds");
                        return Err(ErrorCode::BadPlatformImpl);
                    },
                };

                let range = match generator.min_max_range(min, max, &config.config_array) {
                    Ok(range) => range,
                    Err(ErrorCode::AreaNotSupported) => {
                        debug!(action = %self.def.name, element, "Zone excluded by its bounds");
                        continue;
                    },
                    Err(code) => return Err(code),
                };

                let required = &self.def.params.required_values;
                if !required.iter().all(|v| range.contains(v)) {
                    error!(action = %self.def.name, element, "Range misses required values");
                    return Err(ErrorCode::BadPlatformImpl);
                }
                capability.ranges.insert(element.to_string(), range);
            } else if let Some(generator) = &self.def.params.range {
                let range = generator.zone_range(&self.ctx.facade, zone)?;
                capability.ranges.insert(element.to_string(), range);
            }

            capability.elements.insert(element.to_string());
        }
        Ok(capability)
    }

    fn supported(&self) -> ValResult<Arc<Capability>> {
        let capability = self.capability()?;
        if !capability.supported {
            return Err(ErrorCode::ActionNotSupported);
        }
        Ok(capability)
    }

    pub fn supported_elements(&self) -> ValResult<BTreeSet<String>> {
        Ok(self.supported()?.elements.clone())
    }

    pub fn element_ranges(&self) -> ValResult<BTreeMap<String, ValueRange>> {
        Ok(self.supported()?.ranges.clone())
    }

    pub fn element_range(&self, element: &str) -> ValResult<ValueRange> {
        let capability = self.supported()?;
        if !capability.elements.contains(element) {
            return Err(ErrorCode::ElementNotSupported);
        }
        capability
            .ranges
            .get(element)
            .cloned()
            .ok_or(ErrorCode::BadValImpl)
    }

    pub fn does_element_support_value(&self, element: &str, value: &Value) -> ValResult<bool> {
        let capability = self.supported()?;
        if !capability.elements.contains(element) {
            return Err(ErrorCode::ElementNotSupported);
        }
        match self.def.value_type {
            ValueType::Boolean => Ok(true),
            ValueType::Int32 | ValueType::Float => capability
                .ranges
                .get(element)
                .map(|range| range.contains(value))
                .ok_or(ErrorCode::BadValImpl),
            ValueType::Int32Vec => Err(ErrorCode::BadValImpl),
        }
    }

    // ========================================================================
    // Element checks and raw operations
    // ========================================================================

    /// Zones of `elements`, which must all be covered by the signal
    pub fn zones(&self, elements: &BTreeSet<String>) -> ValResult<BTreeSet<AreaId>> {
        self.supported()?;
        let zones = self.def.elements.zones_for(elements)?;
        if !self.ctx.facade.are_all_areas_supported(self.def.signal, &zones)? {
            return Err(ErrorCode::ElementNotSupported);
        }
        Ok(zones)
    }

    /// Requests must name a non-empty subset of the supported elements
    pub fn check_elements(&self, elements: &BTreeSet<String>) -> ValResult<()> {
        if elements.is_empty() {
            return Err(ErrorCode::InvalidApiArgument);
        }
        let capability = self.supported()?;
        if !elements.is_subset(&capability.elements) {
            warn!(action = %self.def.name, ?elements, "Request names unsupported elements");
            return Err(ErrorCode::InvalidApiArgument);
        }
        Ok(())
    }

    fn element(&self, zone: AreaId) -> ValResult<String> {
        self.def
            .elements
            .element(zone)
            .map(str::to_string)
            .ok_or(ErrorCode::BadValImpl)
    }

    /// Current value per element
    pub fn read(&self, elements: &BTreeSet<String>) -> ValResult<BTreeMap<String, ValResult<Value>>> {
        let zones = self.zones(elements)?;
        self.ctx
            .facade
            .get_values(self.def.signal, &zones)?
            .into_iter()
            .map(|(zone, outcome)| Ok((self.element(zone)?, outcome.map(|v| v.value))))
            .collect()
    }

    /// Confirmed write of `value`; only failed elements are returned
    pub fn write(&self, elements: &BTreeSet<String>, value: &Value) -> ValResult<BTreeMap<String, ErrorCode>> {
        let zones = self.zones(elements)?;
        let outcomes = self
            .ctx
            .facade
            .set_with_confirmation(self.def.signal, &zones, value)?;

        let mut errors = BTreeMap::new();
        for (zone, outcome) in outcomes {
            if let Err(code) = outcome {
                errors.insert(self.element(zone)?, code);
            }
        }
        Ok(errors)
    }

    /// Read, honoring the HVAC power dependency
    pub fn read_powered(&self, elements: &BTreeSet<String>) -> ValResult<BTreeMap<String, ValResult<Value>>> {
        match &self.power {
            Some(power) => with_power(power, elements, |e| self.read(e)),
            None => self.read(elements),
        }
    }

    /// Write, honoring the HVAC power dependency
    pub fn write_powered(
        &self,
        elements: &BTreeSet<String>,
        value: &Value,
    ) -> ValResult<BTreeMap<String, ErrorCode>> {
        match &self.power {
            Some(power) => with_power_errors(power, elements, |e| self.write(e, value)),
            None => self.write(elements, value),
        }
    }

    pub(crate) fn temperature_table_check(&self) -> ValResult<()> {
        if self.is_temperature() {
            Ok(())
        } else {
            Err(ErrorCode::BadValImpl)
        }
    }
}

// ============================================================================
// Get
// ============================================================================

pub struct GetAction {
    core: Action,
}

impl GetAction {
    pub fn new(ctx: ActionContext, def: ActionDef) -> ValResult<Self> {
        Ok(Self {
            core: Action::new(ctx, def, false)?,
        })
    }

    pub fn action(&self) -> &Action {
        &self.core
    }

    pub fn get(&self, elements: &BTreeSet<String>) -> ValResult<GetResult<Value>> {
        self.core.check_elements(elements)?;
        let values = self.core.read_powered(elements)?;
        Ok(GetResult::new(self.core.name(), values))
    }

    /// Temperature per seat in `unit`, or in the display unit
    pub fn get_temperature(
        &self,
        elements: &BTreeSet<String>,
        unit: Option<TemperatureUnit>,
    ) -> ValResult<GetResult<Temperature>> {
        self.core.temperature_table_check()?;
        let unit = match unit {
            Some(unit) => unit,
            None => display_units(self.core.facade())?,
        };

        let readings = self.get(elements)?;
        let ranges = self.core.element_ranges()?;
        let mut values = BTreeMap::new();
        for (element, reading) in readings.values {
            let outcome = reading.and_then(|value| {
                let celsius = value.as_f32().ok_or(ErrorCode::BadPlatformImpl)?;
                let range = ranges.get(&element).ok_or(ErrorCode::BadValImpl)?;
                Ok(TemperatureTable::from_range(range)?.display(celsius, unit))
            });
            values.insert(element, outcome);
        }
        Ok(GetResult::new(self.core.name(), values))
    }
}

// ============================================================================
// Set
// ============================================================================

pub struct SetAction {
    core: Action,
}

impl SetAction {
    pub fn new(ctx: ActionContext, def: ActionDef) -> ValResult<Self> {
        Ok(Self {
            core: Action::new(ctx, def, true)?,
        })
    }

    pub fn action(&self) -> &Action {
        &self.core
    }

    pub fn set(&self, elements: &BTreeSet<String>, value: &Value) -> ValResult<SetResult> {
        self.core.check_elements(elements)?;
        let errors = self.core.write_powered(elements, value)?;
        if !errors.is_empty() {
            debug!(action = %self.core.name(), failed = errors.len(), "Set finished with errors");
        }
        Ok(SetResult::new(self.core.name(), errors))
    }

    /// Set an absolute temperature, converted into the display unit
    ///
    /// Seats are grouped by the Celsius value they resolve to and each group
    /// is written once.
    pub fn set_temperature(
        &self,
        elements: &BTreeSet<String>,
        temperature: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<SetResult> {
        if !temperature.is_finite() {
            warn!(action = %self.core.name(), value = temperature.value, "Temperature is not finite");
            return Err(ErrorCode::InvalidApiArgument);
        }
        self.core.temperature_table_check()?;
        self.core.check_elements(elements)?;
        let unit = display_units(self.core.facade())?;
        let target = temperature.to_unit(unit);
        let ranges = self.core.element_ranges()?;

        let mut errors = BTreeMap::new();
        let mut groups: Vec<(f32, BTreeSet<String>)> = Vec::new();
        for element in elements {
            let range = ranges.get(element).ok_or(ErrorCode::BadValImpl)?;
            let table = TemperatureTable::from_range(range)?;
            match table.processed_index(target, round_to_nearest) {
                Ok(index) => {
                    let set_value = table.set_value(index);
                    match groups.iter_mut().find(|(v, _)| vehicle_bus::float_eq(*v, set_value)) {
                        Some((_, group)) => {
                            group.insert(element.clone());
                        },
                        None => groups.push((set_value, BTreeSet::from([element.clone()]))),
                    }
                },
                Err(code) => {
                    errors.insert(element.clone(), code);
                },
            }
        }

        for (set_value, group) in groups {
            let result = self.set(&group, &Value::Float(set_value))?;
            errors.extend(result.errors);
        }
        Ok(SetResult::new(self.core.name(), errors))
    }
}
