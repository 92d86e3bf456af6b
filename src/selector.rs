//
// selector.rs
// Med2Image-rs
//
// Slice and frame selectors: parses the command-line grammar and resolves a selector into a concrete index range.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;

use crate::error::ConvertError;

/// Which indices along one axis (or over the frames of a 4D volume) should be converted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Selector {
    Index(usize),
    All,
    Middle,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid selector '{0}': expected a non-negative index, -1/all, or m/middle")]
pub struct SelectorParseError(String);

impl FromStr for Selector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            // "-1" is the historical spelling of "all".
            "-1" | "all" => Ok(Selector::All),
            "m" | "middle" => Ok(Selector::Middle),
            other => other
                .parse::<usize>()
                .map(Selector::Index)
                .map_err(|_| SelectorParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(i) => write!(f, "{i}"),
            Selector::All => f.write_str("all"),
            Selector::Middle => f.write_str("middle"),
        }
    }
}

impl Selector {
    /// Resolve against an axis extent into a half-open range.
    ///
    /// `what` names the axis in the error raised when an explicit index falls outside the extent.
    pub fn resolve(self, extent: usize, what: &'static str) -> Result<Range<usize>, ConvertError> {
        match self {
            Selector::All => Ok(0..extent),
            Selector::Middle => {
                if extent == 0 {
                    return Err(ConvertError::SelectorOutOfRange {
                        what,
                        index: 0,
                        extent,
                    });
                }
                let middle = extent / 2;
                Ok(middle..middle + 1)
            }
            Selector::Index(index) if index < extent => Ok(index..index + 1),
            Selector::Index(index) => Err(ConvertError::SelectorOutOfRange {
                what,
                index,
                extent,
            }),
        }
    }
}
