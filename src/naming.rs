//
// naming.rs
// Med2Image-rs
//
// Output naming: stem templates driven by DICOM header fields, output type resolution, and per-plane paths.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::ImageFormat;

use crate::dicom_access::MetadataAccessor;
use crate::error::ConvertError;
use crate::extract::{Axis, PlaneKey};

/// Prefix marking a stem as a field template.
pub const TEMPLATE_ESCAPE: char = '%';

/// Token standing for the source file name rather than a header field.
pub const INPUT_FILE_TOKEN: &str = "inputFile";

/// Replacement for a header value that sanitizes to nothing.
pub const NO_VALUE: &str = "no value provided";

const PLACEHOLDER: char = '.';

/// Encoder chosen for an output extension.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Encoder {
    Raster(ImageFormat),
    Dicom,
}

/// Output file extension (as the user spelled it, lower-cased) and its encoder.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OutputType {
    extension: String,
    encoder: Encoder,
}

impl OutputType {
    pub fn png() -> Self {
        Self {
            extension: "png".to_string(),
            encoder: Encoder::Raster(ImageFormat::Png),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    pub fn is_dicom(&self) -> bool {
        self.encoder == Encoder::Dicom
    }
}

impl FromStr for OutputType {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let extension = s.trim().trim_start_matches('.').to_ascii_lowercase();
        let encoder = match extension.as_str() {
            "dcm" => Encoder::Dicom,
            // Only formats that can encode an 8-bit grayscale buffer.
            other => match ImageFormat::from_extension(other) {
                Some(
                    format @ (ImageFormat::Png
                    | ImageFormat::Jpeg
                    | ImageFormat::Bmp
                    | ImageFormat::Tiff),
                ) => Encoder::Raster(format),
                _ => return Err(ConvertError::UnsupportedOutputType(s.to_string())),
            },
        };
        Ok(Self { extension, encoder })
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension)
    }
}

/// Split a recognised output extension off the stem.
///
/// Suffixes that do not name a supported output type stay part of the stem.
pub fn split_stem_extension(stem: &str) -> (&str, Option<OutputType>) {
    if let Some((base, ext)) = stem.rsplit_once('.') {
        if !base.is_empty() && !ext.contains(['/', '\\']) {
            if let Ok(output_type) = ext.parse::<OutputType>() {
                return (base, Some(output_type));
            }
        }
    }
    (stem, None)
}

/// Resolve the stem and output type from the raw `--output-stem` and `--output-type` values.
///
/// An explicit type wins over a stem extension, a stem extension wins over the PNG default.
pub fn resolve_output(
    stem: &str,
    explicit_type: Option<&str>,
) -> Result<(Stem, OutputType), ConvertError> {
    let (base, stem_type) = split_stem_extension(stem);
    let output_type = match explicit_type.map(str::trim).filter(|t| !t.is_empty()) {
        Some(explicit) => explicit.parse()?,
        None => stem_type.unwrap_or_else(OutputType::png),
    };
    Ok((Stem::parse(base)?, output_type))
}

/// A configured output stem: used verbatim, or assembled from header fields.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Stem {
    Literal(String),
    Template(Vec<String>),
}

impl Stem {
    pub fn parse(raw: &str) -> Result<Self, ConvertError> {
        if raw.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "output file stem must not be empty".to_string(),
            ));
        }
        let Some(body) = raw.strip_prefix(TEMPLATE_ESCAPE) else {
            return Ok(Stem::Literal(raw.to_string()));
        };
        let tokens: Vec<String> = body.split(TEMPLATE_ESCAPE).map(str::to_string).collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(ConvertError::InvalidConfig(format!(
                "output stem template '{raw}' contains an empty field name"
            )));
        }
        Ok(Stem::Template(tokens))
    }

    /// Produce the final stem.
    ///
    /// `source_file` is the representative input file and `metadata` its header, if the format has one.
    /// A template field absent from the header is fatal.
    pub fn resolve(
        &self,
        source_file: &Path,
        metadata: Option<&dyn MetadataAccessor>,
    ) -> Result<String, ConvertError> {
        let tokens = match self {
            Stem::Literal(stem) => return Ok(stem.clone()),
            Stem::Template(tokens) => tokens,
        };

        let mut parts = Vec::with_capacity(tokens.len());
        for token in tokens {
            let part = if token == INPUT_FILE_TOKEN {
                file_base_name(source_file)
            } else {
                let value = metadata
                    .and_then(|m| m.field(token))
                    .ok_or_else(|| ConvertError::MissingTag {
                        field: token.clone(),
                    })?;
                sanitize(&value)
            };
            parts.push(part);
        }
        Ok(parts.join("-"))
    }
}

/// Make a header value safe for a file name: trim, then replace every non-alphanumeric character.
pub fn sanitize(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { PLACEHOLDER })
        .collect();
    if cleaned.is_empty() {
        NO_VALUE.to_string()
    } else {
        cleaned
    }
}

/// File name without directory and without its (possibly double, as in `.nii.gz`) extension.
pub fn file_base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base.to_string(),
        _ => name.to_string(),
    }
}

/// Builds one output path per plane from the resolved stem.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    directory: PathBuf,
    stem: String,
    output_type: OutputType,
}

impl OutputNamer {
    pub fn new(
        directory: impl Into<PathBuf>,
        stem: impl Into<String>,
        output_type: OutputType,
    ) -> Self {
        Self {
            directory: directory.into(),
            stem: stem.into(),
            output_type,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Directory that receives planes of `axis` when re-slicing, or the output directory itself.
    pub fn directory_for(&self, axis: Option<Axis>) -> PathBuf {
        match axis {
            Some(axis) => self.directory.join(axis.subdirectory()),
            None => self.directory.clone(),
        }
    }

    pub fn path_for(&self, key: &PlaneKey) -> PathBuf {
        let mut name = self.stem.clone();
        if let Some(frame) = key.frame {
            name.push_str(&format!("-frame{frame:03}"));
        }
        if let Some(index) = key.index {
            name.push_str(&format!("-slice{index:03}"));
        }
        name.push('.');
        name.push_str(self.output_type.extension());
        self.directory_for(key.subdirectory).join(name)
    }
}
