//
// writer.rs
// Med2Image-rs
//
// Persists transformed planes: 8-bit grayscale rasters, or the plane written back into a copy of its DICOM container.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs;
use std::path::Path;

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::dictionary_std::{tags, StandardDataDictionary};
use dicom::object::{DefaultDicomObject, FileDicomObject, FileMetaTableBuilder};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;

use crate::dicom_access::ElementAccess;
use crate::error::ConvertError;
use crate::naming::{Encoder, OutputType};

// Used when the container has no SOP identifiers of its own.
const FALLBACK_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.7";
const FALLBACK_SOP_INSTANCE_UID: &str = "1.2.3.4.5";

/// Create the output directory (and parents) unless it already exists.
///
/// An existing non-directory at that path is fatal.
pub fn ensure_directory(path: &Path) -> Result<(), ConvertError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(ConvertError::OutputNotADirectory {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| ConvertError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes each plane with the encoder picked from the output type.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SliceWriter {
    encoder: Encoder,
}

impl SliceWriter {
    pub fn new(output_type: &OutputType) -> Self {
        Self {
            encoder: output_type.encoder(),
        }
    }

    /// Write one plane to `path`, creating its directory on demand.
    ///
    /// `container` is required for DICOM output and ignored otherwise.
    pub fn write(
        &self,
        plane: &Array2<f32>,
        path: &Path,
        container: Option<&DefaultDicomObject>,
    ) -> Result<(), ConvertError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }
        match self.encoder {
            Encoder::Raster(format) => write_raster(plane, path, format),
            Encoder::Dicom => {
                let container = container.ok_or_else(|| ConvertError::DicomWrite {
                    path: path.to_path_buf(),
                    reason: "no source container for this plane".to_string(),
                })?;
                write_dicom(plane, container, path)
            }
        }
    }
}

/// Linear map of the plane's own range onto 0..=255; a constant plane is black.
pub fn to_grayscale(plane: &Array2<f32>) -> GrayImage {
    let (rows, columns) = plane.dim();
    let min = plane.fold(f32::INFINITY, |acc, &v| acc.min(v));
    let max = plane.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let range = max - min;

    GrayImage::from_fn(columns as u32, rows as u32, |x, y| {
        let value = plane[[y as usize, x as usize]];
        let level = if range > 0.0 {
            ((value - min) / range * 255.0).round().clamp(0.0, 255.0) as u8
        } else {
            0
        };
        Luma([level])
    })
}

fn write_raster(
    plane: &Array2<f32>,
    path: &Path,
    format: ImageFormat,
) -> Result<(), ConvertError> {
    to_grayscale(plane)
        .save_with_format(path, format)
        .map_err(|source| ConvertError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace the container's pixel data with `plane` and save it as Explicit VR Little Endian.
pub fn write_dicom(
    plane: &Array2<f32>,
    container: &DefaultDicomObject,
    path: &Path,
) -> Result<(), ConvertError> {
    let rows = container.element_uint(tags::ROWS).unwrap_or(0) as usize;
    let columns = container.element_uint(tags::COLUMNS).unwrap_or(0) as usize;
    let samples = container
        .element_uint(tags::SAMPLES_PER_PIXEL)
        .unwrap_or(1) as usize;
    let expected = rows * columns * samples;
    if plane.len() != expected {
        return Err(ConvertError::ElementCountMismatch {
            path: path.to_path_buf(),
            expected,
            found: plane.len(),
        });
    }

    let bits_allocated = container.element_uint(tags::BITS_ALLOCATED).unwrap_or(16);
    let signed = container.element_uint(tags::PIXEL_REPRESENTATION) == Some(1);
    let (vr, bytes) = encode_samples(plane, bits_allocated, signed).ok_or_else(|| {
        ConvertError::DicomWrite {
            path: path.to_path_buf(),
            reason: format!("unsupported BitsAllocated {bits_allocated}"),
        }
    })?;

    let mut object = container.clone().into_inner();
    object.put(DataElement::new(
        tags::PIXEL_DATA,
        vr,
        PrimitiveValue::from(bytes),
    ));
    // Only the first frame was read, so only one frame is written.
    if object.element(tags::NUMBER_OF_FRAMES).is_ok() {
        object.put(DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from("1"),
        ));
    }

    let sop_class_uid = container
        .element_str(tags::SOP_CLASS_UID)
        .unwrap_or_else(|| FALLBACK_SOP_CLASS_UID.to_string());
    let sop_instance_uid = container
        .element_str(tags::SOP_INSTANCE_UID)
        .unwrap_or_else(|| FALLBACK_SOP_INSTANCE_UID.to_string());

    let file_meta = FileMetaTableBuilder::new()
        .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
        .media_storage_sop_class_uid(sop_class_uid)
        .media_storage_sop_instance_uid(sop_instance_uid)
        .build()
        .map_err(|e| ConvertError::DicomWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut file_object =
        FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, file_meta);
    for element in object {
        file_object.put(element);
    }

    file_object
        .write_to_file(path)
        .map_err(|e| ConvertError::DicomWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Round and clamp samples to the stored type, little-endian. `None` for unsupported widths.
fn encode_samples(
    plane: &Array2<f32>,
    bits_allocated: u32,
    signed: bool,
) -> Option<(VR, Vec<u8>)> {
    let values = plane.iter().map(|v| v.round());
    let bytes: Vec<u8> = match (bits_allocated, signed) {
        (8, false) => values.map(|v| v.clamp(0.0, u8::MAX as f32) as u8).collect(),
        (8, true) => values
            .map(|v| v.clamp(i8::MIN as f32, i8::MAX as f32) as i8 as u8)
            .collect(),
        (16, false) => values
            .flat_map(|v| (v.clamp(0.0, u16::MAX as f32) as u16).to_le_bytes())
            .collect(),
        (16, true) => values
            .flat_map(|v| (v.clamp(i16::MIN as f32, i16::MAX as f32) as i16).to_le_bytes())
            .collect(),
        (32, false) => values
            .flat_map(|v| (v.clamp(0.0, u32::MAX as f32) as u32).to_le_bytes())
            .collect(),
        (32, true) => values
            .flat_map(|v| (v.clamp(i32::MIN as f32, i32::MAX as f32) as i32).to_le_bytes())
            .collect(),
        _ => return None,
    };
    let vr = if bits_allocated == 8 { VR::OB } else { VR::OW };
    Some((vr, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dicom_source::decode_plane;
    use ndarray::array;

    /// In-memory 8-bit monochrome container of `frames` 2x2 frames.
    fn container(frames: &str, pixels: Vec<u8>) -> DefaultDicomObject {
        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.9")
            .build()
            .expect("meta");
        let mut obj = FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, meta);
        obj.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from("1.2.840.10008.5.1.4.1.1.7"),
        ));
        obj.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("1.2.826.0.1.3680043.2.1125.9"),
        ));
        for (tag, value) in [
            (tags::ROWS, 2_u16),
            (tags::COLUMNS, 2),
            (tags::SAMPLES_PER_PIXEL, 1),
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
            PrimitiveValue::from("MONOCHROME2"),
        ));
        obj.put(DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(frames),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OB,
            PrimitiveValue::from(pixels),
        ));
        obj
    }

    #[test]
    fn plane_that_does_not_fit_the_container_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy.dcm");
        let err = write_dicom(
            &Array2::zeros((3, 2)),
            &container("1", vec![0, 64, 128, 255]),
            &path,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::ElementCountMismatch {
                expected: 4,
                found: 6,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 21);
        assert!(!path.exists());
    }

    #[test]
    fn multi_frame_container_is_written_back_as_its_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let source = container("2", vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let plane = decode_plane(&source, Path::new("multi.dcm")).unwrap();
        assert_eq!(plane, array![[1.0, 2.0], [3.0, 4.0]]);

        let path = dir.path().join("copy.dcm");
        write_dicom(&plane, &source, &path).unwrap();

        let written = dicom::object::open_file(&path).unwrap();
        let pixels = written.element(tags::PIXEL_DATA).unwrap().to_bytes().unwrap();
        assert_eq!(&pixels[..], &[1, 2, 3, 4]);
        let frames = written.element(tags::NUMBER_OF_FRAMES).unwrap().to_str().unwrap();
        assert_eq!(frames.trim(), "1");
        assert_eq!(
            written.element_str(tags::SOP_INSTANCE_UID).as_deref(),
            Some("1.2.826.0.1.3680043.2.1125.9")
        );
    }

    #[test]
    fn grayscale_spans_the_full_range() {
        let image = to_grayscale(&array![[10.0, 20.0, 30.0], [40.0, 50.0, 60.0]]);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.get_pixel(2, 1).0, [255]);
        assert_eq!(image.get_pixel(1, 1).0, [204]);
    }

    #[test]
    fn constant_planes_are_black() {
        let image = to_grayscale(&Array2::from_elem((2, 2), 7.0));
        assert!(image.pixels().all(|p| p.0 == [0]));
    }

    #[test]
    fn samples_are_clamped_to_the_stored_type() {
        let plane = array![[-3.0, 1.6], [300.0, 70000.0]];
        let (vr, bytes) = encode_samples(&plane, 8, false).unwrap();
        assert_eq!(vr, VR::OB);
        assert_eq!(bytes, vec![0, 2, 255, 255]);

        let (vr, bytes) = encode_samples(&plane, 16, true).unwrap();
        assert_eq!(vr, VR::OW);
        assert_eq!(&bytes[..2], &(-3i16).to_le_bytes());
        assert_eq!(&bytes[6..], &i16::MAX.to_le_bytes());

        assert!(encode_samples(&plane, 12, false).is_none());
    }

    #[test]
    fn existing_file_is_not_an_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, b"x").unwrap();
        let err = ensure_directory(&file).unwrap_err();
        assert!(matches!(err, ConvertError::OutputNotADirectory { .. }));
        assert_eq!(err.exit_code(), 50);

        let nested = dir.path().join("a/b/c");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn raster_writes_create_missing_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("z").join("scan-slice000.png");
        SliceWriter::new(&OutputType::png())
            .write(&array![[0.0, 1.0], [2.0, 3.0]], &path, None)
            .unwrap();
        let written = image::open(&path).unwrap().to_luma8();
        assert_eq!(written.get_pixel(1, 1).0, [255]);
    }
}
