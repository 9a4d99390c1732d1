use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for carto-cli
#[derive(Debug, Parser)]
#[command(
    name = "carto",
    version,
    about = "CLI for inspecting province maps and replaying selection sessions"
)]
pub struct CliArgs {
    /// Path to the province GeoJSON (`.geojson` or `.geojson.gz`)
    #[arg(short = 'i', long = "input", global = true)]
    pub input: Option<PathBuf>,

    /// Map configuration (JSON); every field is optional
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Reference data (JSON): regions and download links per province
    #[arg(short = 'r', long = "reference", global = true)]
    pub reference: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a summary of the geometry source
    Stats,

    /// List provinces, optionally filtered
    Provinces {
        /// Accent- and case-insensitive name filter
        #[arg(short = 'f', long = "filter", default_value = "")]
        filter: String,

        /// Only provinces of this region
        #[arg(long = "region")]
        region: Option<String>,
    },

    /// List the regions known to the reference data
    Regions,

    /// Select a province and print what the popup would show
    Show {
        /// Province name as it appears in the source
        name: String,
    },

    /// Geocode a free-text query through Nominatim
    #[cfg(feature = "http")]
    Search {
        /// Free text, e.g. "Rabat"
        query: String,
    },

    /// Replay a scripted session against a recording engine
    ///
    /// Steps: click:<name>, click:#<id>, empty, list:<name>, dismiss,
    /// base:<OSM|Satellite|Terrain>, pointer:<lon>,<lat>, width:<px>
    Replay {
        #[arg(required = true)]
        steps: Vec<String>,
    },

    /// Parse the source and write a bincode snapshot next to it (or to --out)
    #[cfg(feature = "cache")]
    Snapshot {
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
}
