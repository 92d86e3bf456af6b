//
// transform.rs
// Med2Image-rs
//
// Per-slice pixel transforms: quarter-turn rotation for display orientation and intensity inversion.
//
// Thales Matheus Mendonça Santos - November 2025

use ndarray::{s, Array2};

/// Transforms applied to each extracted plane, rotation first.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SliceTransform {
    pub rotate: bool,
    pub invert: bool,
}

impl SliceTransform {
    pub fn apply(&self, plane: Array2<f32>) -> Array2<f32> {
        let plane = if self.rotate {
            rotate_quarter(&plane)
        } else {
            plane
        };
        if self.invert {
            invert_intensities(&plane)
        } else {
            plane
        }
    }
}

/// Rotate a plane 90° counter-clockwise; an (r, c) plane becomes (c, r).
pub fn rotate_quarter(plane: &Array2<f32>) -> Array2<f32> {
    plane.t().slice(s![..;-1, ..]).to_owned()
}

/// `max(plane) - plane`, with the maximum taken over this plane only.
pub fn invert_intensities(plane: &Array2<f32>) -> Array2<f32> {
    if plane.is_empty() {
        return plane.clone();
    }
    let max = plane.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    plane.mapv(|v| max - v)
}
