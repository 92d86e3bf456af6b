//
// volume.rs
// Med2Image-rs
//
// Format-independent in-memory image model: a single plane, a 3D stack, or a 4D series of stacks.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fmt;

use ndarray::{Array2, Array3, Array4, ArrayView3, Axis};

/// Dimensionality of a decoded image; decides how it is walked.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Rank {
    Two,
    Three,
    Four,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Two => f.write_str("2D"),
            Rank::Three => f.write_str("3D"),
            Rank::Four => f.write_str("4D"),
        }
    }
}

/// Decoded intensities. The array is never mutated once built; planes are copied out of it.
///
/// Axes are (i, j) for a plane, (i, j, k) for a stack and (i, j, k, frame) for a series.
#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    Plane(Array2<f32>),
    Stack(Array3<f32>),
    Series(Array4<f32>),
}

impl Volume {
    pub fn rank(&self) -> Rank {
        match self {
            Volume::Plane(_) => Rank::Two,
            Volume::Stack(_) => Rank::Three,
            Volume::Series(_) => Rank::Four,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Volume::Plane(data) => data.shape(),
            Volume::Stack(data) => data.shape(),
            Volume::Series(data) => data.shape(),
        }
    }

    /// Number of frames: the 4th extent for a series, 1 otherwise.
    pub fn frame_count(&self) -> usize {
        match self {
            Volume::Series(data) => data.len_of(Axis(3)),
            _ => 1,
        }
    }

    /// Spatial stack for one frame. A plane has no stack view.
    pub fn frame(&self, frame: usize) -> Option<ArrayView3<'_, f32>> {
        match self {
            Volume::Plane(_) => None,
            Volume::Stack(data) => (frame == 0).then(|| data.view()),
            Volume::Series(data) => {
                (frame < data.len_of(Axis(3))).then(|| data.index_axis(Axis(3), frame))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_frames_are_stacks() {
        let series = Volume::Series(Array4::from_shape_fn((2, 3, 4, 5), |(i, j, k, f)| {
            (i + 10 * j + 100 * k + 1000 * f) as f32
        }));
        assert_eq!(series.rank(), Rank::Four);
        assert_eq!(series.frame_count(), 5);

        let frame = series.frame(3).expect("frame 3");
        assert_eq!(frame.shape(), &[2, 3, 4]);
        assert_eq!(frame[[1, 2, 3]], 1.0 + 20.0 + 300.0 + 3000.0);
        assert!(series.frame(5).is_none());
    }

    #[test]
    fn stack_has_a_single_implicit_frame() {
        let stack = Volume::Stack(Array3::zeros((2, 2, 3)));
        assert_eq!(stack.rank(), Rank::Three);
        assert_eq!(stack.frame_count(), 1);
        assert!(stack.frame(0).is_some());
        assert!(stack.frame(1).is_none());
    }

    #[test]
    fn plane_reports_its_shape() {
        let plane = Volume::Plane(Array2::zeros((4, 6)));
        assert_eq!(plane.rank(), Rank::Two);
        assert_eq!(plane.shape(), &[4, 6]);
        assert!(plane.frame(0).is_none());
    }
}
