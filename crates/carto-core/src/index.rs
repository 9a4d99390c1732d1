// crates/carto-core/src/index.rs

//! # Feature Index
//!
//! Canonical entity names and the name → feature lookup.
//!
//! Province datasets come from several providers which disagree on the
//! attribute holding the name (French and Arabic keys, upper/lower case).
//! [`resolve_name`] tries them in a fixed order so a feature always yields
//! the same name.
//!
//! Duplicate-name policy
//! ---------------------
//! When two features resolve to the same name, the one appearing **later**
//! in the source wins the index entry. Earlier duplicates stay on the map
//! (and are styled) but cannot be reached by name. Every overwritten name
//! is recorded in [`FeatureIndex::duplicates`] and logged at `warn` so the
//! data problem is visible rather than silently dropped.

use crate::layer::{Feature, FeatureId, GeometryLayer};
use std::collections::BTreeMap;
use tracing::warn;

/// Attribute keys that may carry a province name, in lookup order.
pub const NAME_KEYS: [&str; 8] = [
    "NOM-PROV", "NOM_PROV", "name", "NAME", "nom", "Nom", "الاقليم", "الإقليم",
];

/// Returns the first non-empty text value among [`NAME_KEYS`].
pub fn resolve_name(feature: &Feature) -> Option<&str> {
    NAME_KEYS
        .iter()
        .filter_map(|key| feature.property(key).and_then(|v| v.as_text()))
        .find(|name| !name.is_empty())
}

/// Non-owning name → [`FeatureId`] lookup over a [`GeometryLayer`].
///
/// Rebuilt from scratch on every (re)load; never used to mutate geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureIndex {
    by_name: BTreeMap<String, FeatureId>,
    duplicates: Vec<String>,
}

impl FeatureIndex {
    pub fn build(layer: &GeometryLayer) -> Self {
        let mut index = Self::default();
        for feature in layer.features() {
            let Some(name) = resolve_name(feature) else {
                continue;
            };
            if let Some(previous) = index.by_name.insert(name.to_owned(), feature.id) {
                warn!(
                    name,
                    kept = %feature.id,
                    dropped = %previous,
                    "duplicate province name; later feature wins"
                );
                index.duplicates.push(name.to_owned());
            }
        }
        index
    }

    pub fn get(&self, name: &str) -> Option<FeatureId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Indexed names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Names that were overwritten by a later feature, once per overwrite.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}
