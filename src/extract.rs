//
// extract.rs
// Med2Image-rs
//
// Walks a volume frame by frame and axis by axis, emitting the selected 2D planes in a deterministic order.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fmt;
use std::ops::Range;

use ndarray::{Array2, Axis as NdAxis};
use tracing::debug;

use crate::error::ConvertError;
use crate::selector::Selector;
use crate::volume::Volume;

/// Spatial axis of a 3D stack.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Axis {
    Row,
    Column,
    Depth,
}

impl Axis {
    /// Walk order when re-slicing.
    pub const ALL: [Axis; 3] = [Axis::Row, Axis::Column, Axis::Depth];

    fn dimension(self) -> usize {
        match self {
            Axis::Row => 0,
            Axis::Column => 1,
            Axis::Depth => 2,
        }
    }

    /// Name of the per-axis directory created when re-slicing.
    pub fn subdirectory(self) -> &'static str {
        match self {
            Axis::Row => "x",
            Axis::Column => "y",
            Axis::Depth => "z",
        }
    }

    /// Row and column planes are turned for conventional radiological display; depth planes are not.
    fn reslice_rotation(self) -> bool {
        !matches!(self, Axis::Depth)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subdirectory())
    }
}

/// Identifies one emitted plane; everything the namer needs to build its path.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PlaneKey {
    pub frame: Option<usize>,
    pub index: Option<usize>,
    pub subdirectory: Option<Axis>,
}

/// An extracted plane, not yet transformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub key: PlaneKey,
    pub axis: Axis,
    /// Whether this plane should be turned a quarter for display.
    pub rotate: bool,
    pub data: Array2<f32>,
}

/// What to extract from a volume.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Selection {
    pub frames: Selector,
    pub slices: Selector,
    pub reslice: bool,
    /// Rotation applied to depth planes outside re-slice mode.
    pub rotate_depth: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            frames: Selector::All,
            slices: Selector::All,
            reslice: false,
            rotate_depth: false,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct AxisPass {
    axis: Axis,
    indices: Range<usize>,
    rotate: bool,
    subdirectory: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct FramePass {
    frame: usize,
    axes: Vec<AxisPass>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum State {
    /// A 2D volume: one plane, no frame or index.
    SinglePlane,
    Emitting {
        frame: usize,
        axis: usize,
        index: usize,
    },
    Done,
}

/// One-shot iterator over the planes of a volume.
///
/// Frame and slice ranges are resolved when the extractor is built, so a selector that does not fit
/// the volume fails before the first plane is emitted. Planes come out frame-major, then axis, then
/// index.
#[derive(Debug)]
pub struct SliceExtractor<'v> {
    volume: &'v Volume,
    passes: Vec<FramePass>,
    state: State,
}

impl<'v> SliceExtractor<'v> {
    pub fn new(volume: &'v Volume, selection: Selection) -> Result<Self, ConvertError> {
        if matches!(volume, Volume::Plane(_)) {
            return Ok(Self {
                volume,
                passes: Vec::new(),
                state: State::SinglePlane,
            });
        }

        let frames = Self::resolve_frames(volume, selection.frames)?;
        let passes = frames
            .map(|frame| Self::resolve_axes(volume, frame, &selection))
            .collect::<Result<Vec<_>, _>>()?;

        let state = if passes.is_empty() {
            State::Done
        } else {
            State::Emitting {
                frame: 0,
                axis: 0,
                index: 0,
            }
        };
        Ok(Self {
            volume,
            passes,
            state,
        })
    }

    fn resolve_frames(volume: &Volume, selector: Selector) -> Result<Range<usize>, ConvertError> {
        match volume {
            Volume::Series(_) => {
                let frames = selector.resolve(volume.frame_count(), "frame")?;
                debug!("frames to convert: {:?}", frames);
                Ok(frames)
            }
            // The frame selector has no meaning for a single stack.
            _ => Ok(0..1),
        }
    }

    fn resolve_axes(
        volume: &Volume,
        frame: usize,
        selection: &Selection,
    ) -> Result<FramePass, ConvertError> {
        let stack = volume
            .frame(frame)
            .ok_or(ConvertError::SelectorOutOfRange {
                what: "frame",
                index: frame,
                extent: volume.frame_count(),
            })?;

        let axes = if selection.reslice {
            Axis::ALL
                .iter()
                .map(|&axis| {
                    let extent = stack.len_of(NdAxis(axis.dimension()));
                    Ok(AxisPass {
                        axis,
                        indices: selection.slices.resolve(extent, "slice")?,
                        rotate: axis.reslice_rotation(),
                        subdirectory: true,
                    })
                })
                .collect::<Result<Vec<_>, ConvertError>>()?
        } else {
            let extent = stack.len_of(NdAxis(Axis::Depth.dimension()));
            vec![AxisPass {
                axis: Axis::Depth,
                indices: selection.slices.resolve(extent, "slice")?,
                rotate: selection.rotate_depth,
                subdirectory: false,
            }]
        };

        for pass in &axes {
            debug!(
                "frame {frame}: axis {} indices {:?}",
                pass.axis, pass.indices
            );
        }
        Ok(FramePass { frame, axes })
    }

    /// Number of planes the extractor will emit in total.
    pub fn plane_count(&self) -> usize {
        match self.state {
            State::SinglePlane => 1,
            _ => self
                .passes
                .iter()
                .flat_map(|f| f.axes.iter())
                .map(|a| a.indices.len())
                .sum(),
        }
    }

    /// Keys of every plane, in emission order, without extracting any pixels.
    #[cfg(test)]
    fn keys(&self) -> Vec<PlaneKey> {
        if matches!(self.state, State::SinglePlane) {
            return vec![PlaneKey::default()];
        }
        let four_d = matches!(self.volume, Volume::Series(_));
        let mut keys = Vec::with_capacity(self.plane_count());
        for frame in &self.passes {
            for pass in &frame.axes {
                for index in pass.indices.clone() {
                    keys.push(Self::key_for(four_d, frame.frame, pass, index));
                }
            }
        }
        keys
    }

    fn key_for(four_d: bool, frame: usize, pass: &AxisPass, index: usize) -> PlaneKey {
        PlaneKey {
            frame: four_d.then_some(frame),
            index: Some(index),
            subdirectory: pass.subdirectory.then_some(pass.axis),
        }
    }

    fn plane_at(&self, frame: usize, pass: &AxisPass, index: usize) -> Option<Plane> {
        let stack = self.volume.frame(frame)?;
        let data = stack
            .index_axis(NdAxis(pass.axis.dimension()), index)
            .to_owned();
        Some(Plane {
            key: Self::key_for(matches!(self.volume, Volume::Series(_)), frame, pass, index),
            axis: pass.axis,
            rotate: pass.rotate,
            data,
        })
    }

    /// Move past the plane at (frame, axis, index), skipping empty ranges.
    fn advance(&self, mut frame: usize, mut axis: usize, mut index: usize) -> State {
        index += 1;
        loop {
            let Some(frame_pass) = self.passes.get(frame) else {
                return State::Done;
            };
            match frame_pass.axes.get(axis) {
                Some(pass) if pass.indices.start + index < pass.indices.end => {
                    return State::Emitting { frame, axis, index };
                }
                Some(_) => {
                    axis += 1;
                    index = 0;
                }
                None => {
                    frame += 1;
                    axis = 0;
                    index = 0;
                }
            }
        }
    }
}

impl Iterator for SliceExtractor<'_> {
    type Item = Plane;

    fn next(&mut self) -> Option<Plane> {
        loop {
            match self.state.clone() {
                State::Done => return None,
                State::SinglePlane => {
                    self.state = State::Done;
                    let Volume::Plane(data) = self.volume else {
                        return None;
                    };
                    return Some(Plane {
                        key: PlaneKey::default(),
                        axis: Axis::Depth,
                        rotate: false,
                        data: data.clone(),
                    });
                }
                State::Emitting { frame, axis, index } => {
                    let pass = &self.passes[frame].axes[axis];
                    if pass.indices.start + index >= pass.indices.end {
                        // Empty range at the cursor; skip ahead.
                        self.state = self.advance(frame, axis, index);
                        continue;
                    }
                    let plane = self.plane_at(
                        self.passes[frame].frame,
                        pass,
                        pass.indices.start + index,
                    );
                    self.state = self.advance(frame, axis, index);
                    return plane;
                }
            }
        }
    }
}
