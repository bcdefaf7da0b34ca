//! Element names and their zone bijection

use std::collections::{BTreeMap, BTreeSet};

use errors::{ErrorCode, ValResult};
use rustc_hash::FxHashMap;
use vehicle_bus::{AreaId, GLOBAL_AREA_ID};

/// Element addressing the whole vehicle on global signals
pub const GLOBAL_ELEMENT: &str = "GLOBAL";

/// Fixed bijection between element names and bus zones
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMap {
    to_zone: BTreeMap<String, AreaId>,
    to_element: FxHashMap<AreaId, String>,
}

impl ElementMap {
    /// Build from `(element, zone)` pairs; empty maps and duplicate names or
    /// zones are rejected
    pub fn new<I, S>(pairs: I) -> ValResult<Self>
    where
        I: IntoIterator<Item = (S, AreaId)>,
        S: Into<String>,
    {
        let mut to_zone = BTreeMap::new();
        let mut to_element = FxHashMap::default();
        for (element, zone) in pairs {
            let element = element.into();
            if to_element.insert(zone, element.clone()).is_some()
                || to_zone.insert(element, zone).is_some()
            {
                return Err(ErrorCode::BadValImpl);
            }
        }
        if to_zone.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        Ok(Self {
            to_zone,
            to_element,
        })
    }

    /// The single `GLOBAL` element
    pub fn global() -> Self {
        let mut to_zone = BTreeMap::new();
        to_zone.insert(GLOBAL_ELEMENT.to_string(), GLOBAL_AREA_ID);
        let mut to_element = FxHashMap::default();
        to_element.insert(GLOBAL_AREA_ID, GLOBAL_ELEMENT.to_string());
        Self {
            to_zone,
            to_element,
        }
    }

    pub fn zone(&self, element: &str) -> Option<AreaId> {
        self.to_zone.get(element).copied()
    }

    pub fn element(&self, zone: AreaId) -> Option<&str> {
        self.to_element.get(&zone).map(String::as_str)
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> + '_ {
        self.to_zone.keys().map(String::as_str)
    }

    /// `(element, zone)` pairs in element order
    pub fn iter(&self) -> impl Iterator<Item = (&str, AreaId)> + '_ {
        self.to_zone.iter().map(|(e, z)| (e.as_str(), *z))
    }

    pub fn len(&self) -> usize {
        self.to_zone.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_zone.is_empty()
    }

    /// Zones for `elements`; an unknown element is `UndefinedElement`
    pub fn zones_for(&self, elements: &BTreeSet<String>) -> ValResult<BTreeSet<AreaId>> {
        elements
            .iter()
            .map(|e| self.zone(e).ok_or(ErrorCode::UndefinedElement))
            .collect()
    }
}

/// Collect element names into the set type used by requests
pub fn element_set<I, S>(elements: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    elements.into_iter().map(Into::into).collect()
}
