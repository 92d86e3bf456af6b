//
// error.rs
// Med2Image-rs
//
// Error taxonomy for a conversion run: every fatal condition maps to a class with a stable exit code and a report line.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceFormat;

/// Broad families of fatal errors. Each one owns a process exit code that stays stable across releases.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorClass {
    Input,
    DimensionMismatch,
    ElementCount,
    MissingMetadata,
    Config,
    Output,
}

impl ErrorClass {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorClass::Input => 10,
            ErrorClass::DimensionMismatch => 20,
            ErrorClass::ElementCount => 21,
            ErrorClass::MissingMetadata => 30,
            ErrorClass::Config => 40,
            ErrorClass::Output => 50,
        }
    }

    /// What the tool was doing when this class of error stopped it.
    pub fn action(self) -> &'static str {
        match self {
            ErrorClass::Input => "trying to read input file",
            ErrorClass::DimensionMismatch => "attempting to insert DICOM into volume structure",
            ErrorClass::ElementCount => "attempting to write a slice back into its DICOM container",
            ErrorClass::MissingMetadata => "attempting to parse DICOM header",
            ErrorClass::Config => "validating the conversion settings",
            ErrorClass::Output => "writing output images",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not access/read {path:?}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse DICOM file {path:?}: {source}")]
    ReadDicom {
        path: PathBuf,
        #[source]
        source: dicom::object::ReadError,
    },

    #[error("could not decode pixel data of {path:?}: {source}")]
    DecodePixels {
        path: PathBuf,
        #[source]
        source: dicom::pixeldata::Error,
    },

    #[error("pixel buffer of {path:?} does not fit its declared shape: {source}")]
    PixelShape {
        path: PathBuf,
        #[source]
        source: ndarray::ShapeError,
    },

    #[error("{path:?} has {samples} samples per pixel; only single-channel images can be converted")]
    UnsupportedPixelData { path: PathBuf, samples: u16 },

    #[error("could not read NIfTI file {path:?}: {source}")]
    ReadNifti {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },

    #[error("no DICOM files found in {dir:?}")]
    EmptySeries { dir: PathBuf },

    #[error(
        "a dimension mismatch occurred: {path:?} is {found:?} but the series is {expected:?}"
    )]
    DimensionMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("the slice has {found} samples but {path:?} holds {expected}")]
    ElementCountMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("the DICOM header does not contain a {field} tag")]
    MissingTag { field: String },

    #[error("dcm output format is only available for DICOM input, not {source_format}")]
    UnsupportedRoundTrip { source_format: SourceFormat },

    #[error("unrecognised input type for {path:?}; expected .dcm, .nii or .nii.gz")]
    UnknownSourceFormat { path: PathBuf },

    #[error("unsupported output type '{0}'")]
    UnsupportedOutputType(String),

    #[error("{what} index {index} is out of range for an extent of {extent}")]
    SelectorOutOfRange {
        what: &'static str,
        index: usize,
        extent: usize,
    },

    #[error("{rank}D NIfTI volumes are not supported; expected 3D or 4D data")]
    UnsupportedRank { rank: usize },

    #[error("{0}")]
    InvalidConfig(String),

    #[error("output path {path:?} exists and is not a directory")]
    OutputNotADirectory { path: PathBuf },

    #[error("could not create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save image to {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write DICOM file {path:?}: {reason}")]
    DicomWrite { path: PathBuf, reason: String },
}

impl ConvertError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ConvertError::InputUnreadable { .. }
            | ConvertError::ReadDicom { .. }
            | ConvertError::DecodePixels { .. }
            | ConvertError::PixelShape { .. }
            | ConvertError::UnsupportedPixelData { .. }
            | ConvertError::ReadNifti { .. }
            | ConvertError::EmptySeries { .. } => ErrorClass::Input,
            ConvertError::DimensionMismatch { .. } => ErrorClass::DimensionMismatch,
            ConvertError::ElementCountMismatch { .. } => ErrorClass::ElementCount,
            ConvertError::MissingTag { .. } => ErrorClass::MissingMetadata,
            ConvertError::UnsupportedRoundTrip { .. }
            | ConvertError::UnknownSourceFormat { .. }
            | ConvertError::UnsupportedOutputType(_)
            | ConvertError::SelectorOutOfRange { .. }
            | ConvertError::UnsupportedRank { .. }
            | ConvertError::InvalidConfig(_) => ErrorClass::Config,
            ConvertError::OutputNotADirectory { .. }
            | ConvertError::CreateDir { .. }
            | ConvertError::Encode { .. }
            | ConvertError::DicomWrite { .. } => ErrorClass::Output,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.class().exit_code()
    }

    /// Human-readable action/error/exit-code triple printed before the process terminates.
    pub fn report(&self) -> String {
        let class = self.class();
        format!(
            "While {}, {}. Returning to system with error code {}",
            class.action(),
            self,
            class.exit_code()
        )
    }
}
