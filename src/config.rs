use std::path::PathBuf;

use clap::Args;
use trajectory_core::DataLayout;

/// Where the datasets live. Every field can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Directory holding the regions and events JSON files
    #[arg(long, global = true, env = "TRAJECTORY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Reference geography file name inside the data directory
    #[arg(
        long,
        global = true,
        env = "TRAJECTORY_REGIONS_FILE",
        default_value = "china_regions_coordinates.json"
    )]
    pub regions_file: String,

    /// Events file stem: `{stem}.json` (base language), `{stem}_{tag}.json`
    #[arg(
        long,
        global = true,
        env = "TRAJECTORY_EVENTS_STEM",
        default_value = "trajectory_events"
    )]
    pub events_stem: String,
}

impl Config {
    /// Layout relative to the data directory; the filesystem source resolves
    /// paths against `data_dir` itself.
    pub fn layout(&self) -> DataLayout {
        DataLayout {
            root: String::new(),
            regions_file: self.regions_file.clone(),
            events_stem: self.events_stem.clone(),
        }
    }
}
