//
// cli.rs
// Med2Image-rs
//
// Defines the CLI surface with Clap and hands the validated settings to the converter.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::config::{ConversionConfig, ConversionOptions};
use crate::convert::convert;
use crate::selector::Selector;

/// Convert a DICOM file/series or a NIfTI volume into per-slice images.
#[derive(Parser, Debug)]
#[command(name = "med2image", version)]
#[command(
    about = "Convert DICOM series and NIfTI volumes into per-slice PNG/JPEG (or DICOM) images",
    long_about = None
)]
pub struct Cli {
    /// Input file: DICOM (.dcm) or NIfTI (.nii / .nii.gz)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory, created with its parents if absent
    #[arg(short = 'd', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Output file stem, or a %Field%Field... template filled from the DICOM header
    #[arg(short = 'o', long, default_value = "output")]
    pub output_stem: String,

    /// Output type (png, jpg, bmp, tiff, dcm); defaults to the stem extension, else png
    #[arg(short = 't', long)]
    pub output_type: Option<String>,

    /// Slice to convert: an index, -1/all, or m/middle
    #[arg(short, long, allow_hyphen_values = true)]
    pub slice: Option<Selector>,

    /// Frame of a 4D volume to convert: an index, -1/all, or m/middle
    #[arg(short, long, default_value = "all", allow_hyphen_values = true)]
    pub frame: Selector,

    /// Report statistics of every plane as it is converted
    #[arg(long)]
    pub show_slices: bool,

    /// Slice along all three axes into x/, y/ and z/ subdirectories
    #[arg(long)]
    pub reslice: bool,

    /// Invert intensities of every plane
    #[arg(long)]
    pub invert: bool,

    /// Print the elapsed time once the conversion finishes
    #[arg(long)]
    pub print_elapsed_time: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<Cli> for ConversionOptions {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.input,
            output_dir: cli.output_dir,
            output_stem: cli.output_stem,
            output_type: cli.output_type,
            slices: cli.slice,
            frames: cli.frame,
            reslice: cli.reslice,
            invert: cli.invert,
            show_slices: cli.show_slices,
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let started = Instant::now();
    let print_elapsed = cli.print_elapsed_time;

    let config = ConversionConfig::try_from(ConversionOptions::from(cli))?;
    convert(&config)?;

    if print_elapsed {
        println!(
            "Elapsed time = {:.6} seconds",
            started.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
