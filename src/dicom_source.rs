//
// dicom_source.rs
// Med2Image-rs
//
// Loads a DICOM file or its containing directory as a series, decoding stored pixel values without LUTs.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};

use dicom::object::{open_file, DefaultDicomObject};
use dicom::pixeldata::PixelDecoder;
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, VoiLutOption};
use ndarray::{s, Array2, Array3};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::ConvertError;
use crate::selector::Selector;
use crate::source::LoadedSource;
use crate::volume::Volume;

/// Load according to the slice selector; see [`crate::source::Source::Dicom`].
pub fn load(input: &Path, slices: Option<Selector>) -> Result<LoadedSource, ConvertError> {
    match slices {
        None => load_single(input),
        Some(Selector::All) => load_series(input),
        Some(selector) => {
            let files = list_series(series_dir(input))?;
            let position = selector.resolve(files.len(), "file")?.start;
            let chosen = &files[position];
            info!(
                "converting file {} of {} in the series: {}",
                position,
                files.len(),
                chosen.display()
            );
            load_single(chosen)
        }
    }
}

/// Sorted `.dcm` files (any case) directly inside `dir`.
pub fn list_series(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ConvertError::InputUnreadable {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && has_dicom_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        return Err(ConvertError::EmptySeries {
            dir: dir.to_path_buf(),
        });
    }
    debug!("{} DICOM files found in {}", files.len(), dir.display());
    Ok(files)
}

fn has_dicom_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
}

fn series_dir(input: &Path) -> &Path {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn load_single(path: &Path) -> Result<LoadedSource, ConvertError> {
    let object = open(path)?;
    let plane = decode_plane(&object, path)?;
    Ok(LoadedSource::dicom(
        Volume::Plane(plane),
        path.to_path_buf(),
        vec![object],
        0,
    ))
}

fn load_series(input: &Path) -> Result<LoadedSource, ConvertError> {
    let files = list_series(series_dir(input))?;

    let mut objects = Vec::with_capacity(files.len());
    let mut planes: Vec<Array2<f32>> = Vec::with_capacity(files.len());
    for path in &files {
        let object = open(path)?;
        let plane = decode_plane(&object, path)?;
        if let Some(first) = planes.first().map(Array2::dim) {
            if plane.dim() != first {
                return Err(ConvertError::DimensionMismatch {
                    path: path.clone(),
                    expected: first,
                    found: plane.dim(),
                });
            }
        }
        objects.push(object);
        planes.push(plane);
    }

    let representative_index = files
        .iter()
        .position(|f| f.file_name() == input.file_name())
        .unwrap_or(files.len() / 2);

    Ok(LoadedSource::dicom(
        Volume::Stack(stack_planes(&planes)),
        files[representative_index].clone(),
        objects,
        representative_index,
    ))
}

fn open(path: &Path) -> Result<DefaultDicomObject, ConvertError> {
    open_file(path).map_err(|source| ConvertError::ReadDicom {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode stored values of the first frame as a (rows, columns) plane.
pub fn decode_plane(
    object: &DefaultDicomObject,
    path: &Path,
) -> Result<Array2<f32>, ConvertError> {
    let decoded = object
        .decode_pixel_data()
        .map_err(|source| ConvertError::DecodePixels {
            path: path.to_path_buf(),
            source,
        })?;

    let samples = decoded.samples_per_pixel();
    if samples != 1 {
        return Err(ConvertError::UnsupportedPixelData {
            path: path.to_path_buf(),
            samples,
        });
    }
    if decoded.number_of_frames() > 1 {
        warn!(
            "{} holds {} frames; only the first is converted",
            path.display(),
            decoded.number_of_frames()
        );
    }

    // Stored values only: a round-trip write must put back what was read.
    let options = ConvertOptions::new()
        .with_modality_lut(ModalityLutOption::None)
        .with_voi_lut(VoiLutOption::Identity);
    let mut values = decoded
        .to_vec_with_options::<f32>(&options)
        .map_err(|source| ConvertError::DecodePixels {
            path: path.to_path_buf(),
            source,
        })?;

    let rows = decoded.rows() as usize;
    let columns = decoded.columns() as usize;
    values.truncate(rows * columns);
    Array2::from_shape_vec((rows, columns), values).map_err(|source| ConvertError::PixelShape {
        path: path.to_path_buf(),
        source,
    })
}

/// Stack equally-shaped planes along a new last axis, in order.
fn stack_planes(planes: &[Array2<f32>]) -> Array3<f32> {
    let (rows, columns) = planes.first().map(Array2::dim).unwrap_or((0, 0));
    let mut volume = Array3::<f32>::zeros((rows, columns, planes.len()));
    for (k, plane) in planes.iter().enumerate() {
        volume.slice_mut(s![.., .., k]).assign(plane);
    }
    volume
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::core::{DataElement, PrimitiveValue, VR};
    use dicom::dictionary_std::{tags, StandardDataDictionary};
    use dicom::object::{FileDicomObject, FileMetaTableBuilder};
    use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
    use ndarray::array;
    use std::fs;

    fn rgb_object() -> DefaultDicomObject {
        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.3")
            .build()
            .unwrap();
        let mut obj = FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, meta);
        for (tag, value) in [
            (tags::ROWS, 2_u16),
            (tags::COLUMNS, 2),
            (tags::SAMPLES_PER_PIXEL, 3),
            (tags::PLANAR_CONFIGURATION, 0),
            (tags::BITS_ALLOCATED, 8),
            (tags::BITS_STORED, 8),
            (tags::HIGH_BIT, 7),
            (tags::PIXEL_REPRESENTATION, 0),
        ] {
            obj.put(DataElement::new(tag, VR::US, PrimitiveValue::from(value)));
        }
        obj.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("RGB"),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OB,
            PrimitiveValue::from((0..12).collect::<Vec<u8>>()),
        ));
        obj
    }

    #[test]
    fn color_pixel_data_is_rejected() {
        let err = decode_plane(&rgb_object(), Path::new("color.dcm")).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedPixelData { samples: 3, .. }
        ));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn series_listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.dcm", "a.DCM", "c.txt", "d.dcm.bak"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.dcm")).unwrap();

        let files = list_series(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.DCM", "b.dcm"]);
    }

    #[test]
    fn empty_directory_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_series(dir.path()).unwrap_err();
        assert!(matches!(err, ConvertError::EmptySeries { .. }));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn planes_stack_along_depth() {
        let planes = vec![array![[1.0, 2.0], [3.0, 4.0]], array![[5.0, 6.0], [7.0, 8.0]]];
        let volume = stack_planes(&planes);
        assert_eq!(volume.dim(), (2, 2, 2));
        assert_eq!(volume[[1, 0, 1]], 7.0);
        assert_eq!(volume[[0, 1, 0]], 2.0);
    }

    #[test]
    fn bare_file_names_list_the_working_directory() {
        assert_eq!(series_dir(Path::new("IM0001.dcm")), Path::new("."));
        assert_eq!(series_dir(Path::new("/data/IM0001.dcm")), Path::new("/data"));
    }
}
