use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::dicom_access::MetadataAccessor;

/// Header fields shown while a DICOM source is converted. None of them is required.
pub const DISPLAY_FIELDS: [&str; 6] = [
    "PatientName",
    "PatientAge",
    "PatientSex",
    "PatientID",
    "SeriesDescription",
    "ProtocolName",
];

/// Display fields of one header: present values plus the names that were absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSummary {
    pub fields: BTreeMap<String, String>,
    pub missing: Vec<String>,
}

pub fn extract_header_summary<M: MetadataAccessor + ?Sized>(header: &M) -> HeaderSummary {
    let mut summary = HeaderSummary::default();
    for name in DISPLAY_FIELDS {
        match header.field(name) {
            Some(value) => {
                summary.fields.insert(name.to_string(), value);
            }
            None => summary.missing.push(name.to_string()),
        }
    }
    summary
}

/// Log the display fields in a fixed order; every missing one is a recoverable warning.
pub fn log_header_summary<M: MetadataAccessor + ?Sized>(header: &M) -> HeaderSummary {
    let summary = extract_header_summary(header);
    for name in DISPLAY_FIELDS {
        match summary.fields.get(name) {
            Some(value) => info!("{:<44}{}", format!("{name}:"), value),
            None => {
                info!(
                    "{:<44}{name} not found in DCM header.",
                    format!("{name}:")
                );
                warn!("the DICOM file does not seem to contain a {name} tag");
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Partial;

    impl MetadataAccessor for Partial {
        fn field(&self, name: &str) -> Option<String> {
            match name {
                "PatientID" => Some("PAT123".to_string()),
                "ProtocolName" => Some("T1 AX".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn missing_display_fields_are_collected_not_fatal() {
        let summary = log_header_summary(&Partial);
        assert_eq!(summary.fields.len(), 2);
        assert_eq!(summary.fields["PatientID"], "PAT123");
        assert_eq!(
            summary.missing,
            vec![
                "PatientName",
                "PatientAge",
                "PatientSex",
                "SeriesDescription"
            ]
        );
    }
}
