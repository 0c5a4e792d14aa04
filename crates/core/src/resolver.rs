use std::collections::HashMap;

use crate::model::CatalogSet;

pub const DEFAULT_COMBINATION: &str = "default";

pub const COMBINATION_KEYS: [&str; 4] = ["default", "low-discount", "high-damage", "extreme"];

/// Sub-parameter id to chosen parameter value id.
pub type Selections = HashMap<i64, i64>;

pub fn default_selections(catalog: &[CatalogSet]) -> Selections {
    catalog
        .iter()
        .flat_map(|set| set.sub_parameters.iter())
        .filter_map(|param| {
            param
                .values
                .first()
                .map(|value| (param.parameter.id, value.id))
        })
        .collect()
}

/// Only the first sub-parameter of the first set drives the key; every other
/// selection is display-only.
pub fn resolve_combination_key(catalog: &[CatalogSet], selections: &Selections) -> &'static str {
    let Some(param) = catalog.first().and_then(|set| set.sub_parameters.first()) else {
        return DEFAULT_COMBINATION;
    };
    let Some(chosen) = selections.get(&param.parameter.id) else {
        return DEFAULT_COMBINATION;
    };
    match param.values.iter().position(|value| value.id == *chosen) {
        Some(idx) => COMBINATION_KEYS[idx.min(COMBINATION_KEYS.len() - 1)],
        None => DEFAULT_COMBINATION,
    }
}

/// Defaults for every sub-parameter, overridden by whatever the caller chose.
pub fn merge_selections(catalog: &[CatalogSet], chosen: &Selections) -> Selections {
    let mut merged = default_selections(catalog);
    merged.extend(chosen.iter().map(|(param, value)| (*param, *value)));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogParameter, ParameterValue, SubParameter, VariableSet};

    fn param(id: i64, set_id: i64, value_ids: &[i64]) -> CatalogParameter {
        CatalogParameter {
            parameter: SubParameter {
                id,
                set_id,
                name: format!("param-{id}"),
                description: None,
                order: 0,
            },
            values: value_ids
                .iter()
                .enumerate()
                .map(|(idx, value_id)| ParameterValue {
                    id: *value_id,
                    sub_parameter_id: id,
                    label: format!("v{idx}"),
                    value: idx as f64,
                    description: None,
                    order: idx as i32,
                })
                .collect(),
        }
    }

    fn set(id: i64, params: Vec<CatalogParameter>) -> CatalogSet {
        CatalogSet {
            set: VariableSet {
                id,
                name: format!("set-{id}"),
                description: None,
                order: id as i32,
            },
            sub_parameters: params,
        }
    }

    fn catalog() -> Vec<CatalogSet> {
        vec![
            set(1, vec![param(10, 1, &[100, 101, 102, 103, 104, 105]), param(11, 1, &[110, 111])]),
            set(2, vec![param(20, 2, &[200, 201, 202])]),
        ]
    }

    #[test]
    fn index_picks_fixed_key() {
        let catalog = catalog();
        let mut selections = default_selections(&catalog);
        assert_eq!(resolve_combination_key(&catalog, &selections), "default");
        selections.insert(10, 101);
        assert_eq!(resolve_combination_key(&catalog, &selections), "low-discount");
        selections.insert(10, 102);
        assert_eq!(resolve_combination_key(&catalog, &selections), "high-damage");
    }

    #[test]
    fn index_is_clamped_to_last_key() {
        let catalog = catalog();
        let mut selections = Selections::new();
        selections.insert(10, 105);
        assert_eq!(resolve_combination_key(&catalog, &selections), "extreme");
    }

    #[test]
    fn other_parameters_do_not_change_key() {
        let catalog = catalog();
        let mut selections = default_selections(&catalog);
        selections.insert(10, 102);
        let before = resolve_combination_key(&catalog, &selections);
        selections.insert(11, 111);
        selections.insert(20, 202);
        assert_eq!(resolve_combination_key(&catalog, &selections), before);
    }

    #[test]
    fn unresolvable_selection_falls_back_to_default() {
        let catalog = catalog();
        assert_eq!(resolve_combination_key(&[], &Selections::new()), "default");
        assert_eq!(resolve_combination_key(&catalog, &Selections::new()), "default");
        let mut selections = Selections::new();
        selections.insert(10, 999);
        assert_eq!(resolve_combination_key(&catalog, &selections), "default");
        let empty_set = vec![set(1, vec![])];
        assert_eq!(resolve_combination_key(&empty_set, &selections), "default");
    }

    #[test]
    fn defaults_take_first_value_of_each_parameter() {
        let catalog = catalog();
        let defaults = default_selections(&catalog);
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults[&10], 100);
        assert_eq!(defaults[&20], 200);
        let mut chosen = Selections::new();
        chosen.insert(20, 201);
        let merged = merge_selections(&catalog, &chosen);
        assert_eq!(merged[&20], 201);
        assert_eq!(merged[&11], 110);
    }
}
