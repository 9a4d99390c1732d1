//! carto-cli
//! =========
//!
//! Command-line interface for the `carto-core` map synchronization engine.
//!
//! This crate primarily provides a binary (`carto-cli`). The small library
//! target exists so the overview below renders as a documentation page.
//!
//! Quick start
//! -----------
//!
//! ```text
//! carto-cli --help
//! carto-cli -i provinces.geojson stats
//! carto-cli -i provinces.geojson -r reference.json provinces --filter fes
//! carto-cli -i provinces.geojson replay click:Rabat empty base:Terrain
//! ```
//!
//! The `replay` command drives a headless map view with a recording engine
//! and prints every renderer command and shell notification per step,
//! which makes it handy for checking a GeoJSON source before shipping it.
//!
//! For programmatic access use the [`carto-core`] crate directly.
//!
#![cfg_attr(docsrs, feature(doc_cfg))]
