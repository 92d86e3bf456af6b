//
// nifti_source.rs
// Med2Image-rs
//
// Loads a NIfTI-1 volume (.nii or .nii.gz) as a 3D stack or a 4D series.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::Path;

use ndarray::{ArrayD, Ix3, Ix4, IxDyn};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::ConvertError;
use crate::source::LoadedSource;
use crate::volume::Volume;

pub fn load(path: &Path) -> Result<LoadedSource, ConvertError> {
    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|source| ConvertError::ReadNifti {
            path: path.to_path_buf(),
            source,
        })?;
    let decoded = object
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|source| ConvertError::ReadNifti {
            path: path.to_path_buf(),
            source,
        })?;

    // Copy out in logical order into an array of our own layout.
    let shape = decoded.shape().to_vec();
    let values: Vec<f32> = decoded.iter().copied().collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|source| {
        ConvertError::PixelShape {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let volume = into_volume(data, path)?;
    Ok(LoadedSource::nifti(volume, path.to_path_buf()))
}

/// Drop trailing singleton axes past the fourth, then require a 3D or 4D grid.
pub fn into_volume(data: ArrayD<f32>, path: &Path) -> Result<Volume, ConvertError> {
    let mut shape = data.shape().to_vec();
    while shape.len() > 4 && shape.last() == Some(&1) {
        shape.pop();
    }
    let data = data
        .into_shape(IxDyn(&shape))
        .map_err(|source| shape_error(path, source))?;

    match shape.len() {
        3 => data
            .into_dimensionality::<Ix3>()
            .map(Volume::Stack)
            .map_err(|source| shape_error(path, source)),
        4 => data
            .into_dimensionality::<Ix4>()
            .map(Volume::Series)
            .map_err(|source| shape_error(path, source)),
        rank => Err(ConvertError::UnsupportedRank { rank }),
    }
}

fn shape_error(path: &Path, source: ndarray::ShapeError) -> ConvertError {
    ConvertError::PixelShape {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Rank;

    fn grid(shape: &[usize]) -> ArrayD<f32> {
        ArrayD::from_shape_fn(IxDyn(shape), |idx| idx[0] as f32)
    }

    #[test]
    fn ranks_three_and_four_are_accepted() {
        let path = Path::new("v.nii");
        assert_eq!(into_volume(grid(&[2, 3, 4]), path).unwrap().rank(), Rank::Three);
        assert_eq!(
            into_volume(grid(&[2, 3, 4, 5]), path).unwrap().rank(),
            Rank::Four
        );
    }

    #[test]
    fn trailing_singletons_past_the_fourth_axis_are_dropped() {
        let volume = into_volume(grid(&[2, 3, 4, 5, 1, 1]), Path::new("v.nii")).unwrap();
        assert_eq!(volume.shape(), &[2, 3, 4, 5]);
    }

    #[test]
    fn other_ranks_are_rejected() {
        let err = into_volume(grid(&[4, 4]), Path::new("flat.nii")).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedRank { rank: 2 }));
        assert_eq!(err.exit_code(), 40);

        let err = into_volume(grid(&[2, 2, 2, 2, 3]), Path::new("v.nii")).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedRank { rank: 5 }));
    }
}
