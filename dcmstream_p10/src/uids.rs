//! The root UID prefix and implementation identifiers that dcmstream stamps
//! into the File Meta Information of DICOM P10 data it serializes.

/// dcmstream's root UID prefix.
///
pub const DCMSTREAM_ROOT_UID_PREFIX: &str = "1.2.826.0.1.3680043.10.1687.";

/// dcmstream's implementation class UID, included in the File Meta
/// Information of serialized DICOM P10 data.
///
pub const DCMSTREAM_IMPLEMENTATION_CLASS_UID: &str =
  "1.2.826.0.1.3680043.10.1687.0";

/// dcmstream's implementation version name, included in the File Meta
/// Information of serialized DICOM P10 data.
///
pub static DCMSTREAM_IMPLEMENTATION_VERSION_NAME: std::sync::LazyLock<String> =
  std::sync::LazyLock::new(|| {
    format!("DCMSTREAM {}", env!("CARGO_PKG_VERSION"))
  });
