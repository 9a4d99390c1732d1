// crates/carto-core/src/catalog.rs

//! # Province Catalog
//!
//! The list the sidebar shows. Entity names come from the
//! [`FeatureIndex`] (the geometry is the source of truth); regions and
//! download links come from separately shipped [`ReferenceData`].

use crate::index::FeatureIndex;
use crate::text::contains_folded;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shown when a province has no region in the reference data.
pub const DEFAULT_REGION_LABEL: &str = "Région du Royaume";

/// Shown when a province has no downloadable database.
pub const DOWNLOAD_UNAVAILABLE_NOTICE: &str = "Base de données non disponible pour cette zone.";

/// Static lookup tables shipped next to the geometry source.
///
/// ```json
/// {
///   "regions": { "Rabat": "Rabat-Salé-Kénitra" },
///   "downloads": { "Rabat": "https://example.org/rabat.zip" },
///   "region_list": ["Rabat-Salé-Kénitra"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    /// Province name → region name.
    pub regions: BTreeMap<String, String>,
    /// Province name → download URL.
    pub downloads: BTreeMap<String, String>,
    /// Region names in display order. Derived from `regions` when empty.
    pub region_list: Vec<String>,
}

/// Outcome of the popup's "download" action.
///
/// A missing link is a business rule, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadAction {
    Open { url: String },
    Unavailable { notice: &'static str },
}

impl ReferenceData {
    #[cfg(feature = "json")]
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    #[cfg(feature = "json")]
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::CartoError::NotFound(format!(
                "Reference data not found at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }

    pub fn region_of(&self, name: &str) -> Option<&str> {
        self.regions.get(name).map(String::as_str)
    }

    pub fn region_label(&self, name: &str) -> &str {
        self.region_of(name).unwrap_or(DEFAULT_REGION_LABEL)
    }

    pub fn download_url(&self, name: &str) -> Option<&str> {
        self.downloads
            .get(name)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn download_action(&self, name: &str) -> DownloadAction {
        match self.download_url(name) {
            Some(url) => DownloadAction::Open {
                url: url.to_owned(),
            },
            None => DownloadAction::Unavailable {
                notice: DOWNLOAD_UNAVAILABLE_NOTICE,
            },
        }
    }

    /// Region names for the filter dropdown.
    pub fn regions(&self) -> Vec<&str> {
        if !self.region_list.is_empty() {
            return self.region_list.iter().map(String::as_str).collect();
        }
        let mut all: Vec<&str> = self.regions.values().map(String::as_str).collect();
        all.sort_unstable();
        all.dedup();
        all
    }
}

/// One sidebar row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceEntry {
    pub name: String,
    pub region: Option<String>,
    pub download_url: Option<String>,
}

/// All selectable provinces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    entries: Vec<ProvinceEntry>,
}

impl Catalog {
    /// One entry per indexed name, in the index's lexical order.
    pub fn from_index(index: &FeatureIndex, reference: &ReferenceData) -> Self {
        let entries = index
            .names()
            .map(|name| ProvinceEntry {
                name: name.to_owned(),
                region: reference.region_of(name).map(str::to_owned),
                download_url: reference.download_url(name).map(str::to_owned),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ProvinceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose name contains `term` (accent/case-insensitive) and,
    /// when `region` is given and non-empty, whose region is exactly `region`.
    pub fn filter(&self, term: &str, region: Option<&str>) -> Vec<&ProvinceEntry> {
        let region = region.filter(|r| !r.is_empty());
        self.entries
            .iter()
            .filter(|e| contains_folded(&e.name, term))
            .filter(|e| match (region, e.region.as_deref()) {
                (None, _) => true,
                (Some(wanted), Some(actual)) => wanted == actual,
                (Some(_), None) => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{GeometryLayer, PropertyValue};

    fn reference() -> ReferenceData {
        ReferenceData {
            regions: [
                ("Fès", "Fès-Meknès"),
                ("Meknès", "Fès-Meknès"),
                ("Rabat", "Rabat-Salé-Kénitra"),
            ]
            .into_iter()
            .map(|(a, b)| (a.to_owned(), b.to_owned()))
            .collect(),
            downloads: [("Rabat", "https://example.org/rabat.zip"), ("Fès", "")]
                .into_iter()
                .map(|(a, b)| (a.to_owned(), b.to_owned()))
                .collect(),
            region_list: vec![],
        }
    }

    fn catalog() -> Catalog {
        let layer = GeometryLayer::from_parts(["Rabat", "Fès", "Meknès", "Ifrane"].into_iter().map(|n| {
            let mut p = BTreeMap::new();
            p.insert("NOM_PROV".to_owned(), PropertyValue::Text(n.to_owned()));
            (p, None)
        }));
        Catalog::from_index(&FeatureIndex::build(&layer), &reference())
    }

    #[test]
    fn name_filter_folds_accents() {
        let c = catalog();
        let hits: Vec<_> = c.filter("fes", None).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(hits, vec!["Fès"]);
        assert_eq!(c.filter("", None).len(), 4);
    }

    #[test]
    fn region_filter_is_exact() {
        let c = catalog();
        let hits: Vec<_> = c
            .filter("", Some("Fès-Meknès"))
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Fès", "Meknès"]);
        assert!(c.filter("", Some("fes-meknes")).is_empty());
        assert!(c.filter("", Some("Fès-Meknès ")).is_empty());
        assert_eq!(c.filter("", Some("")).len(), 4);
        assert!(c.filter("ifrane", Some("Fès-Meknès")).is_empty());
    }

    #[test]
    fn empty_links_count_as_missing() {
        let r = reference();
        assert_eq!(
            r.download_action("Rabat"),
            DownloadAction::Open {
                url: "https://example.org/rabat.zip".into()
            }
        );
        assert_eq!(
            r.download_action("Fès"),
            DownloadAction::Unavailable {
                notice: DOWNLOAD_UNAVAILABLE_NOTICE
            }
        );
    }

    #[test]
    fn region_list_is_derived_when_absent() {
        assert_eq!(reference().regions(), vec!["Fès-Meknès", "Rabat-Salé-Kénitra"]);
        assert_eq!(reference().region_label("Ifrane"), DEFAULT_REGION_LABEL);
    }
}
