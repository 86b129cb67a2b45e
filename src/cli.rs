//! Command line for the headless host.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Render an artmap view to PNG", long_about = None)]
pub struct Cli {
    /// Config file (TOML or JSON); defaults to the user config location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Data directory with points.json, artists.json and thumbnails/
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Where to write the rendered surface
    #[arg(long, default_value = "artmap.png")]
    pub output: PathBuf,

    /// Simulate a click at client coordinates before rendering
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub click: Option<Vec<f64>>,
}

impl Cli {
    /// The click position, if one was given.
    pub fn click_position(&self) -> Option<(f64, f64)> {
        match self.click.as_deref() {
            Some([x, y]) => Some((*x, *y)),
            _ => None,
        }
    }
}
