//
// config.rs
// Med2Image-rs
//
// Validated conversion settings. Everything that can be rejected without touching the filesystem is rejected here.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use crate::error::ConvertError;
use crate::naming::{resolve_output, OutputType, Stem};
use crate::selector::Selector;
use crate::source::{Source, SourceFormat};

/// Raw settings as the user gave them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub output_stem: String,
    pub output_type: Option<String>,
    pub slices: Option<Selector>,
    pub frames: Selector,
    pub reslice: bool,
    pub invert: bool,
    pub show_slices: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_dir: PathBuf::from("."),
            output_stem: "output".to_string(),
            output_type: None,
            slices: None,
            frames: Selector::All,
            reslice: false,
            invert: false,
            show_slices: false,
        }
    }
}

/// Settings checked for consistency; building one performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    pub source: Source,
    pub output_dir: PathBuf,
    pub stem: Stem,
    pub output_type: OutputType,
    pub frames: Selector,
    /// Slice selector for the extractor; DICOM uses its own selector to pick files instead.
    pub slices: Selector,
    pub reslice: bool,
    pub invert: bool,
    pub show_slices: bool,
}

impl TryFrom<ConversionOptions> for ConversionConfig {
    type Error = ConvertError;

    fn try_from(options: ConversionOptions) -> Result<Self, Self::Error> {
        let source = Source::new(options.input, options.slices)?;
        let (stem, output_type) =
            resolve_output(&options.output_stem, options.output_type.as_deref())?;

        if output_type.is_dicom() {
            if source.format() != SourceFormat::Dicom {
                return Err(ConvertError::UnsupportedRoundTrip {
                    source_format: source.format(),
                });
            }
            if options.reslice {
                return Err(ConvertError::InvalidConfig(
                    "dcm output cannot be combined with --reslice".to_string(),
                ));
            }
        }

        if options.output_dir.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "output directory must not be empty".to_string(),
            ));
        }

        let slices = match source.format() {
            // The DICOM adapter consumes the selector when choosing files; the loaded volume is
            // either a single plane or a full series walked completely.
            SourceFormat::Dicom => Selector::All,
            SourceFormat::Nifti => options.slices.unwrap_or(Selector::All),
        };

        Ok(Self {
            source,
            output_dir: options.output_dir,
            stem,
            output_type,
            frames: options.frames,
            slices,
            reslice: options.reslice,
            invert: options.invert,
            show_slices: options.show_slices,
        })
    }
}
