use dicom::core::Tag;
use dicom::object::DefaultDicomObject;

/// Header lookup by field name, as used by stem templates and the header summary.
///
/// `None` means the field is absent or has no textual value; callers decide whether that is fatal.
pub trait MetadataAccessor {
    fn field(&self, name: &str) -> Option<String>;
}

/// Small helper trait to pull typed values out of a DICOM object by tag.
pub trait ElementAccess {
    fn element_str(&self, tag: Tag) -> Option<String>;
    fn element_uint(&self, tag: Tag) -> Option<u32>;
}

impl ElementAccess for DefaultDicomObject {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| strip_padding(&s))
    }

    fn element_uint(&self, tag: Tag) -> Option<u32> {
        self.element(tag).ok().and_then(|e| e.to_int::<u32>().ok())
    }
}

impl MetadataAccessor for DefaultDicomObject {
    fn field(&self, name: &str) -> Option<String> {
        // Names are standard dictionary keywords (PatientID, ProtocolName, ...).
        self.element_by_name(name)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| strip_padding(&s))
    }
}

// DICOM pads odd-length values with a trailing space or NUL.
fn strip_padding(value: &str) -> String {
    value.trim_end_matches(['\0', ' ']).to_string()
}
