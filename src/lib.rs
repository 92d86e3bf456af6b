//
// lib.rs
// Med2Image-rs
//
// Exposes the conversion engine and re-exports the CLI entry point for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - November 2025

pub mod cli;
pub mod config;
pub mod convert;
pub mod dicom_access;
pub mod dicom_source;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod naming;
pub mod nifti_source;
pub mod selector;
pub mod source;
pub mod stats;
pub mod transform;
pub mod volume;
pub mod writer;

pub use cli::{run as run_cli, Cli};
pub use config::{ConversionConfig, ConversionOptions};
pub use convert::{convert, ConversionReport};
pub use error::{ConvertError, ErrorClass};
