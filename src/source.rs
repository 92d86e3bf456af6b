//
// source.rs
// Med2Image-rs
//
// Input format detection and the per-format dispatch that turns an input path into a loaded volume.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fmt;
use std::path::{Path, PathBuf};

use dicom::object::DefaultDicomObject;
use tracing::info;

use crate::dicom_access::MetadataAccessor;
use crate::error::ConvertError;
use crate::extract::PlaneKey;
use crate::selector::Selector;
use crate::volume::Volume;
use crate::{dicom_source, nifti_source};

/// Container format of the input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SourceFormat {
    Dicom,
    Nifti,
}

impl SourceFormat {
    /// Detect the format from the file extension (`.dcm`, `.nii`, `.nii.gz`, any case).
    pub fn sniff(path: &Path) -> Result<Self, ConvertError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".dcm") {
            Ok(SourceFormat::Dicom)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Ok(SourceFormat::Nifti)
        } else {
            Err(ConvertError::UnknownSourceFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Dicom => f.write_str("DICOM"),
            SourceFormat::Nifti => f.write_str("NIfTI"),
        }
    }
}

/// What to load, chosen once from the input extension.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Source {
    /// A DICOM file; the slice selector decides whether its directory is read as a series.
    Dicom {
        path: PathBuf,
        slices: Option<Selector>,
    },
    Nifti { path: PathBuf },
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, slices: Option<Selector>) -> Result<Self, ConvertError> {
        let path = path.into();
        Ok(match SourceFormat::sniff(&path)? {
            SourceFormat::Dicom => Source::Dicom { path, slices },
            SourceFormat::Nifti => Source::Nifti { path },
        })
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            Source::Dicom { .. } => SourceFormat::Dicom,
            Source::Nifti { .. } => SourceFormat::Nifti,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Source::Dicom { path, .. } | Source::Nifti { path } => path,
        }
    }

    pub fn load(&self) -> Result<LoadedSource, ConvertError> {
        // Report a missing input the same way for both formats.
        std::fs::metadata(self.path()).map_err(|source| ConvertError::InputUnreadable {
            path: self.path().to_path_buf(),
            source,
        })?;

        let loaded = match self {
            Source::Dicom { path, slices } => dicom_source::load(path, *slices)?,
            Source::Nifti { path } => nifti_source::load(path)?,
        };
        info!(
            "{} volume loaded: {} with shape {:?}",
            loaded.format,
            loaded.volume.rank(),
            loaded.volume.shape()
        );
        Ok(loaded)
    }
}

/// A decoded input: the volume plus whatever DICOM containers it came from.
#[derive(Debug)]
pub struct LoadedSource {
    pub format: SourceFormat,
    pub volume: Volume,
    /// File whose name feeds `%inputFile` and whose header is summarised.
    pub representative: PathBuf,
    containers: Vec<DefaultDicomObject>,
    representative_index: usize,
}

impl LoadedSource {
    pub(crate) fn dicom(
        volume: Volume,
        representative: PathBuf,
        containers: Vec<DefaultDicomObject>,
        representative_index: usize,
    ) -> Self {
        Self {
            format: SourceFormat::Dicom,
            volume,
            representative,
            containers,
            representative_index,
        }
    }

    pub(crate) fn nifti(volume: Volume, path: PathBuf) -> Self {
        Self {
            format: SourceFormat::Nifti,
            volume,
            representative: path,
            containers: Vec::new(),
            representative_index: 0,
        }
    }

    /// Header of the representative container. NIfTI sources have none.
    pub fn metadata(&self) -> Option<&dyn MetadataAccessor> {
        self.containers
            .get(self.representative_index)
            .map(|c| c as &dyn MetadataAccessor)
    }

    /// Source container for a plane: the single file of a 2D load, the stacked file otherwise.
    pub fn container_for(&self, key: &PlaneKey) -> Option<&DefaultDicomObject> {
        match self.volume {
            Volume::Plane(_) => self.containers.first(),
            _ => self.containers.get(key.index?),
        }
    }

    /// Whether depth planes are turned for display outside re-slice mode.
    pub fn rotate_depth(&self) -> bool {
        self.format == SourceFormat::Nifti
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffing_by_extension() {
        assert_eq!(
            SourceFormat::sniff(Path::new("/a/IM0001.DCM")).unwrap(),
            SourceFormat::Dicom
        );
        assert_eq!(
            SourceFormat::sniff(Path::new("brain.nii")).unwrap(),
            SourceFormat::Nifti
        );
        assert_eq!(
            SourceFormat::sniff(Path::new("brain.nii.gz")).unwrap(),
            SourceFormat::Nifti
        );
        assert!(matches!(
            SourceFormat::sniff(Path::new("scan.mgz")),
            Err(ConvertError::UnknownSourceFormat { .. })
        ));
    }

    #[test]
    fn nifti_sources_drop_the_slice_selector() {
        let source = Source::new("vol.nii.gz", Some(Selector::Middle)).unwrap();
        assert_eq!(source.format(), SourceFormat::Nifti);
        assert_eq!(source.path(), Path::new("vol.nii.gz"));
    }

    #[test]
    fn missing_input_is_an_input_error() {
        let source = Source::new("/definitely/not/here.dcm", None).unwrap();
        let err = source.load().unwrap_err();
        assert!(matches!(err, ConvertError::InputUnreadable { .. }));
        assert_eq!(err.exit_code(), 10);
    }
}
