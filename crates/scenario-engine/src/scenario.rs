//! Scenario definitions: named, ordered lists of geometry edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Geometry;

/// How an edit changes each selected, valid cell.
///
/// ```yaml
/// type: clamp_to_range
/// min: 0
/// max: 40
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueRule {
    /// `cell = value`
    SetConstant { value: f64 },
    /// `cell = cell + delta`, without clamping.
    AddDelta { delta: f64 },
    /// `cell = max(min, min(cell, max))`. When `min > max` every selected
    /// cell becomes `min`.
    ClampToRange { min: f64, max: f64 },
}

impl ValueRule {
    #[inline]
    pub fn apply(&self, cell: f64) -> f64 {
        match *self {
            ValueRule::SetConstant { value } => value,
            ValueRule::AddDelta { delta } => cell + delta,
            ValueRule::ClampToRange { min, max } => cell.min(max).max(min),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueRule::SetConstant { .. } => "set_constant",
            ValueRule::AddDelta { .. } => "add_delta",
            ValueRule::ClampToRange { .. } => "clamp_to_range",
        }
    }
}

/// One step of a scenario: a geometry in a declared CRS and a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub geometry: Geometry,
    pub crs: String,
    pub rule: ValueRule,
}

impl Edit {
    pub fn new(geometry: Geometry, crs: impl Into<String>, rule: ValueRule) -> Self {
        Self {
            geometry,
            crs: crs.into(),
            rule,
        }
    }
}

/// A named, immutable, ordered list of edits.
///
/// `id` and `created_at` are generated when absent from serialized input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    name: String,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    edits: Vec<Edit>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, edits: Vec<Edit>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            edits,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Edits in application order.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Same edits in reverse order, under a new id.
    pub fn reversed(&self) -> Scenario {
        let mut edits = self.edits.clone();
        edits.reverse();
        Scenario::new(format!("{} (reversed)", self.name), edits)
    }
}
