//! Routing profiles
//!
//! A profile turns raw edge attributes into traversal costs per meter and
//! turn-cost attributes into a multiplier for the stored turn cost.

use crate::type_index::Attribute;

/// Traversal cost of an edge in both stored directions.
///
/// Factors are costs per meter, zero meaning no access in that direction.
/// Speeds are in meters per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFactor {
    pub forward_factor: f64,
    pub backward_factor: f64,
    pub forward_speed: f64,
    pub backward_speed: f64,
    pub can_stop: bool,
}

impl EdgeFactor {
    pub const NO_ACCESS: EdgeFactor = EdgeFactor {
        forward_factor: 0.0,
        backward_factor: 0.0,
        forward_speed: 0.0,
        backward_speed: 0.0,
        can_stop: false,
    };

    /// Same factor in both directions.
    pub fn both_ways(factor: f64, speed: f64, can_stop: bool) -> Self {
        Self {
            forward_factor: factor,
            backward_factor: factor,
            forward_speed: speed,
            backward_speed: speed,
            can_stop,
        }
    }

    /// The factor as seen when traversing the edge the other way around.
    pub fn reverse(&self) -> Self {
        Self {
            forward_factor: self.backward_factor,
            backward_factor: self.forward_factor,
            forward_speed: self.backward_speed,
            backward_speed: self.forward_speed,
            can_stop: self.can_stop,
        }
    }

    pub fn factor(&self, forward: bool) -> f64 {
        if forward {
            self.forward_factor
        } else {
            self.backward_factor
        }
    }

    pub fn speed(&self, forward: bool) -> f64 {
        if forward {
            self.forward_speed
        } else {
            self.backward_speed
        }
    }

    pub fn can_access(&self, forward: bool) -> bool {
        self.factor(forward) > 0.0
    }
}

/// Multiplier applied to stored turn costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnCostFactor {
    /// Any non-zero stored cost forbids the turn.
    pub is_binary: bool,
    pub cost_factor: f64,
}

impl TurnCostFactor {
    /// The turn table does not apply to this profile.
    pub const EMPTY: TurnCostFactor = TurnCostFactor {
        is_binary: false,
        cost_factor: 0.0,
    };

    pub const BINARY: TurnCostFactor = TurnCostFactor {
        is_binary: true,
        cost_factor: 1.0,
    };

    pub fn is_empty(&self) -> bool {
        !self.is_binary && self.cost_factor == 0.0
    }

    /// Cost of a stored turn cost under this factor.
    pub fn apply(&self, cost: u32) -> f64 {
        if self.is_empty() || cost == 0 {
            return 0.0;
        }
        if self.is_binary {
            return f64::INFINITY;
        }
        cost as f64 * self.cost_factor
    }
}

pub trait Profile: Send + Sync {
    fn name(&self) -> &str;

    fn factor(&self, attributes: &[Attribute]) -> EdgeFactor;

    fn turn_cost_factor(&self, attributes: &[Attribute]) -> TurnCostFactor;
}

/// Attribute lookup by key.
pub fn get<'a>(attributes: &'a [Attribute], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Fastest-route car profile on OSM highway tags.
///
/// The factor is the travel time in seconds per meter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarProfile;

impl Profile for CarProfile {
    fn name(&self) -> &str {
        "car"
    }

    fn factor(&self, attributes: &[Attribute]) -> EdgeFactor {
        let Some(highway) = get(attributes, "highway") else {
            return EdgeFactor::NO_ACCESS;
        };

        let speed_kmh = match highway {
            "motorway" => 110.0,
            "motorway_link" => 60.0,
            "trunk" => 90.0,
            "trunk_link" => 50.0,
            "primary" => 70.0,
            "primary_link" => 40.0,
            "secondary" => 60.0,
            "secondary_link" => 40.0,
            "tertiary" => 50.0,
            "tertiary_link" => 30.0,
            "unclassified" => 50.0,
            "residential" => 30.0,
            "service" => 20.0,
            "living_street" => 10.0,
            _ => return EdgeFactor::NO_ACCESS,
        };

        let denied = ["motor_vehicle", "vehicle", "access"]
            .iter()
            .any(|key| matches!(get(attributes, key), Some("no") | Some("private")));
        if denied {
            return EdgeFactor::NO_ACCESS;
        }

        let speed = speed_kmh / 3.6;
        let is_motorway = highway == "motorway" || highway == "motorway_link";
        let mut factor = EdgeFactor::both_ways(1.0 / speed, speed, !is_motorway);

        match get(attributes, "oneway") {
            Some("yes" | "1" | "true") => {
                factor.backward_factor = 0.0;
                factor.backward_speed = 0.0;
            }
            Some("-1" | "reverse") => {
                factor.forward_factor = 0.0;
                factor.forward_speed = 0.0;
            }
            // motorways are oneway unless tagged otherwise
            None if is_motorway => {
                factor.backward_factor = 0.0;
                factor.backward_speed = 0.0;
            }
            _ => {}
        }
        factor
    }

    fn turn_cost_factor(&self, attributes: &[Attribute]) -> TurnCostFactor {
        let Some(restriction) = get(attributes, "restriction") else {
            return TurnCostFactor::EMPTY;
        };
        if let Some(except) = get(attributes, "except") {
            if except.contains("motorcar") || except.contains("motor_vehicle") {
                return TurnCostFactor::EMPTY;
            }
        }
        if restriction.starts_with("no_") || restriction.starts_with("only_") {
            TurnCostFactor::BINARY
        } else {
            TurnCostFactor::EMPTY
        }
    }
}
