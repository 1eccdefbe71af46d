//! Service areas live inside `tenants.business.service_areas` as a JSONB list,
//! so this module is pure list logic; persistence goes through
//! [`Tenant::update_service_areas`](super::tenant::Tenant::update_service_areas).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::slug::slugify;

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ServiceArea {
    #[serde(default)]
    pub id: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip: Option<i32>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub minimum: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl ServiceArea {
    pub fn new(city: &str, state: &str, zip: Option<i32>) -> Self {
        let mut area = Self {
            id: String::new(),
            city: city.trim().to_string(),
            state: state.trim().to_string(),
            zip,
            primary: false,
            minimum: 0.0,
            multiplier: default_multiplier(),
        };
        area.id = area.derive_id();
        area
    }

    /// Stable identifier, e.g. `"Fort Worth", "TX"` -> `"fort-worth-tx"`.
    pub fn derive_id(&self) -> String {
        format!("{}-{}", slugify(&self.city), self.state.trim().to_lowercase())
    }

    /// Parse a stored JSONB value. Entries that do not deserialize are
    /// dropped, and entries without an id get a derived one.
    pub fn parse_list(value: &serde_json::Value) -> Vec<ServiceArea> {
        let Some(items) = value.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| serde_json::from_value::<ServiceArea>(item.clone()).ok())
            .map(|mut area| {
                if area.id.is_empty() {
                    area.id = area.derive_id();
                }
                area
            })
            .collect()
    }

    /// Assign ids and enforce a single primary area. The first area flagged
    /// primary keeps the flag; without one, the first area becomes primary.
    pub fn normalize(areas: &mut [ServiceArea]) {
        for area in areas.iter_mut() {
            area.id = area.derive_id();
        }
        let primary_idx = areas.iter().position(|a| a.primary).unwrap_or(0);
        for (idx, area) in areas.iter_mut().enumerate() {
            area.primary = idx == primary_idx;
        }
    }

    /// First id that appears more than once.
    pub fn find_duplicate(areas: &[ServiceArea]) -> Option<String> {
        let mut seen = std::collections::HashSet::new();
        areas
            .iter()
            .map(|a| a.derive_id())
            .find(|id| !seen.insert(id.clone()))
    }

    /// Remove the area with `id`. Returns the removed area, promoting the
    /// first remaining area when the primary one was removed.
    pub fn remove(areas: &mut Vec<ServiceArea>, id: &str) -> Option<ServiceArea> {
        let idx = areas.iter().position(|a| a.id == id)?;
        let removed = areas.remove(idx);
        if removed.primary {
            if let Some(first) = areas.first_mut() {
                first.primary = true;
            }
        }
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn area(city: &str, state: &str, primary: bool) -> ServiceArea {
        let mut a = ServiceArea::new(city, state, None);
        a.primary = primary;
        a
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(area("Fort Worth", "TX", false).id, "fort-worth-tx");
        assert_eq!(area("St. Louis", "MO", false).id, "st-louis-mo");
    }

    #[test]
    fn test_normalize_keeps_first_primary() {
        let mut areas = vec![
            area("Dallas", "TX", false),
            area("Plano", "TX", true),
            area("Frisco", "TX", true),
        ];
        ServiceArea::normalize(&mut areas);
        let primaries: Vec<_> = areas.iter().map(|a| a.primary).collect();
        assert_eq!(primaries, vec![false, true, false]);
    }

    #[test]
    fn test_normalize_promotes_first_when_none_primary() {
        let mut areas = vec![area("Dallas", "TX", false), area("Plano", "TX", false)];
        ServiceArea::normalize(&mut areas);
        assert!(areas[0].primary);
        assert!(!areas[1].primary);
    }

    #[test]
    fn test_remove_primary_promotes_next() {
        let mut areas = vec![area("Dallas", "TX", true), area("Plano", "TX", false)];
        let removed = ServiceArea::remove(&mut areas, "dallas-tx").unwrap();
        assert_eq!(removed.city, "Dallas");
        assert_eq!(areas.len(), 1);
        assert!(areas[0].primary);
        assert!(ServiceArea::remove(&mut areas, "nowhere-tx").is_none());
    }

    #[test]
    fn test_find_duplicate() {
        let areas = vec![
            area("Dallas", "TX", true),
            area("dallas", "tx", false),
        ];
        assert_eq!(
            ServiceArea::find_duplicate(&areas),
            Some("dallas-tx".to_string())
        );
        assert_eq!(ServiceArea::find_duplicate(&areas[..1]), None);
    }

    #[test]
    fn test_parse_list_is_tolerant() {
        let value = json!([
            {"city": "Austin", "state": "TX", "zip": 78701, "primary": true},
            {"city": 42},
            "garbage"
        ]);
        let areas = ServiceArea::parse_list(&value);
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].id, "austin-tx");
        assert_eq!(areas[0].multiplier, 1.0);
        assert!(ServiceArea::parse_list(&json!({"not": "a list"})).is_empty());
    }
}
