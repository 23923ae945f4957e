//! Catalog filter value objects.
//!
//! Raw query parameters arrive as loosely-typed optional strings. They are
//! normalized exactly once into [`Filters`]; any value that fails to parse
//! becomes an absent filter instead of an error.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::MaterialType;
use crate::domain::types::Condition;

/// Unvalidated filter parameters as they appear on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilters {
    pub category: Option<String>,
    pub material: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
}

/// Validated, immutable catalog filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filters {
    pub category: Option<Uuid>,
    pub material: Option<Uuid>,
    pub condition: Option<Condition>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub location: Option<String>,
    pub search: Option<String>,
}

impl Filters {
    pub fn from_raw(raw: &RawFilters) -> Self {
        Self {
            category: parse_id(raw.category.as_deref()),
            material: parse_id(raw.material.as_deref()),
            condition: raw
                .condition
                .as_deref()
                .and_then(|value| Condition::from_str(value).ok()),
            min_price: parse_price(raw.min_price.as_deref()),
            max_price: parse_price(raw.max_price.as_deref()),
            location: non_empty(raw.location.as_deref()),
            search: non_empty(raw.search.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Present filters as `(name, value)` pairs in no particular order.
    ///
    /// Prices are normalized so `10`, `10.0` and `10.00` produce the same value.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::with_capacity(7);
        if let Some(category) = self.category {
            entries.push(("category", category.to_string()));
        }
        if let Some(material) = self.material {
            entries.push(("material", material.to_string()));
        }
        if let Some(condition) = self.condition {
            entries.push(("condition", condition.as_str().to_string()));
        }
        if let Some(min) = self.min_price {
            entries.push(("minPrice", min.normalize().to_string()));
        }
        if let Some(max) = self.max_price {
            entries.push(("maxPrice", max.normalize().to_string()));
        }
        if let Some(location) = self.location.as_ref() {
            entries.push(("location", location.clone()));
        }
        if let Some(search) = self.search.as_ref() {
            entries.push(("search", search.clone()));
        }
        entries.retain(|(_, value)| !value.is_empty());
        entries
    }
}

fn parse_id(value: Option<&str>) -> Option<Uuid> {
    value.and_then(|value| Uuid::parse_str(value.trim()).ok())
}

fn parse_price(value: Option<&str>) -> Option<Decimal> {
    value
        .and_then(|value| Decimal::from_str(value.trim()).ok())
        .filter(|price| !price.is_sign_negative())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Whether the selected material falls outside `materials` and must be reset.
pub fn should_clear_material(selected: Option<Uuid>, materials: &[MaterialType]) -> bool {
    match selected {
        Some(id) => !materials.iter().any(|material| material.id == id),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    Applied,
}

/// Two-state filter editor: edits land in `pending`, `apply` promotes them.
#[derive(Debug, Clone)]
pub struct FilterSession {
    applied: Filters,
    pending: Filters,
    state: SessionState,
}

impl Default for FilterSession {
    fn default() -> Self {
        Self::new(Filters::default())
    }
}

impl FilterSession {
    pub fn new(initial: Filters) -> Self {
        Self {
            pending: initial.clone(),
            applied: initial,
            state: SessionState::Applied,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn applied(&self) -> &Filters {
        &self.applied
    }

    pub fn pending(&self) -> &Filters {
        &self.pending
    }

    pub fn edit(&mut self, change: impl FnOnce(&mut Filters)) {
        change(&mut self.pending);
        self.state = SessionState::Editing;
    }

    /// Change the pending category, clearing the pending material when it is
    /// not valid under `materials` (the vocabulary of the new category).
    ///
    /// Returns true when the material was cleared.
    pub fn select_category(&mut self, category: Option<Uuid>, materials: &[MaterialType]) -> bool {
        let clear = should_clear_material(self.pending.material, materials);
        self.edit(|filters| {
            filters.category = category;
            if clear {
                filters.material = None;
            }
        });
        clear
    }

    /// Promote pending filters. Returns true when the applied set changed,
    /// in which case callers restart pagination at page 1.
    pub fn apply(&mut self) -> bool {
        let changed = self.applied != self.pending;
        self.applied = self.pending.clone();
        self.state = SessionState::Applied;
        changed
    }

    pub fn discard(&mut self) {
        self.pending = self.applied.clone();
        self.state = SessionState::Applied;
    }
}
