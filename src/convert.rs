//
// convert.rs
// Med2Image-rs
//
// Runs one conversion: load the source, resolve the output stem, walk the selected planes and write each one.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::extract::{Selection, SliceExtractor};
use crate::metadata::log_header_summary;
use crate::naming::OutputNamer;
use crate::selector::Selector;
use crate::source::{LoadedSource, SourceFormat};
use crate::stats::plane_statistics;
use crate::transform::SliceTransform;
use crate::volume::Rank;
use crate::writer::{ensure_directory, SliceWriter};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub source_format: SourceFormat,
    pub stem: String,
    /// Every file written, in write order.
    pub written: Vec<PathBuf>,
}

pub fn convert(config: &ConversionConfig) -> Result<ConversionReport, ConvertError> {
    let loaded = config.source.load()?;

    if let Some(header) = loaded.metadata() {
        log_header_summary(header);
    }

    let stem = config.stem.resolve(&loaded.representative, loaded.metadata())?;
    debug!("output file stem resolved to '{stem}'");

    let extractor = SliceExtractor::new(&loaded.volume, selection(config, &loaded))?;
    debug!("{} planes selected", extractor.plane_count());

    // Nothing is created until the whole selection is known to be valid.
    ensure_directory(&config.output_dir)?;
    let namer = OutputNamer::new(&config.output_dir, stem, config.output_type.clone());
    let writer = SliceWriter::new(&config.output_type);

    let mut written = Vec::with_capacity(extractor.plane_count());
    for plane in extractor {
        let path = namer.path_for(&plane.key);
        let transform = SliceTransform {
            rotate: plane.rotate,
            invert: config.invert,
        };
        let data = transform.apply(plane.data);

        if config.show_slices {
            let stats = plane_statistics(&data);
            info!(
                "{}: shape {:?}, min {:.3}, max {:.3}, mean {:.3}, std dev {:.3}",
                path.display(),
                stats.shape,
                stats.min,
                stats.max,
                stats.mean,
                stats.std_dev
            );
        }

        writer.write(&data, &path, loaded.container_for(&plane.key))?;
        info!("Outputfile = {}", path.display());
        written.push(path);
    }

    Ok(ConversionReport {
        source_format: loaded.format,
        stem: namer.stem().to_string(),
        written,
    })
}

fn selection(config: &ConversionConfig, loaded: &LoadedSource) -> Selection {
    let rank = loaded.volume.rank();
    let mut reslice = config.reslice;
    if reslice && rank == Rank::Two {
        warn!("re-slicing needs a 3D volume; the 2D input is converted as a single plane");
        reslice = false;
    }
    if config.frames != Selector::All && rank != Rank::Four {
        debug!("frame selector '{}' ignored for {} input", config.frames, rank);
    }
    Selection {
        frames: config.frames,
        slices: config.slices,
        reslice,
        rotate_depth: loaded.rotate_depth(),
    }
}
