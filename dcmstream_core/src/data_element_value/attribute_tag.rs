//! Work with the DICOM `AttributeTag` value representation.

use crate::{DataElementTag, DataError};

/// Converts an `AttributeTag` value into a list of data element tags.
///
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<DataElementTag>, DataError> {
  if bytes.len() % 4 != 0 {
    return Err(DataError::new_value_invalid(
      "AttributeTag data length is not a multiple of 4".to_string(),
    ));
  }

  Ok(
    bytes
      .chunks_exact(4)
      .map(|chunk| {
        DataElementTag::new(
          u16::from_le_bytes([chunk[0], chunk[1]]),
          u16::from_le_bytes([chunk[2], chunk[3]]),
        )
      })
      .collect(),
  )
}

/// Converts a list of data element tags into an `AttributeTag` value.
///
pub fn to_bytes(tags: &[DataElementTag]) -> Vec<u8> {
  let mut bytes = Vec::with_capacity(tags.len() * 4);

  for tag in tags {
    bytes.extend_from_slice(&tag.group.to_le_bytes());
    bytes.extend_from_slice(&tag.element.to_le_bytes());
  }

  bytes
}
