use ndarray::Array2;

/// Aggregate statistics over one plane, reported while slices are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneStatistics {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
    pub shape: (usize, usize),
}

pub fn plane_statistics(plane: &Array2<f32>) -> PlaneStatistics {
    let shape = plane.dim();
    if plane.is_empty() {
        return PlaneStatistics {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            std_dev: 0.0,
            shape,
        };
    }

    let min = plane.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max = plane.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let count = plane.len() as f32;
    let mean = plane.iter().sum::<f32>() / count;

    let variance = plane
        .iter()
        .map(|x| {
            let diff = mean - x;
            diff * diff
        })
        .sum::<f32>()
        / count;

    PlaneStatistics {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
        shape,
    }
}
