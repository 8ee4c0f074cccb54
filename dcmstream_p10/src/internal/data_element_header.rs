use dcmstream_core::{DataElementTag, ValueRepresentation, dictionary};

use crate::internal::value_length::ValueLength;

/// The header of a single data element: its tag, VR, and value length. The VR
/// is `None` for data elements that don't have one, i.e. items and the item
/// and sequence delimiters.
///
pub struct DataElementHeader {
  pub tag: DataElementTag,
  pub vr: Option<ValueRepresentation>,
  pub length: ValueLength,
}

impl core::fmt::Display for DataElementHeader {
  /// Formats a data element header as `"(GROUP,ELEMENT) VR NAME"`, e.g.
  /// `"(0008,0020) DA Study Date"`.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let tag_name = dictionary::tag_name(self.tag, None);

    match self.vr {
      Some(vr) => write!(f, "{} {} {}", self.tag, vr, tag_name),
      None => write!(f, "{} {}", self.tag, tag_name),
    }
  }
}

/// The size of the value length field for a VR in the DICOM P10 explicit VR
/// encoding.
///
pub enum ValueLengthSize {
  U16,
  U32,
}

impl ValueLengthSize {
  /// Returns the maximum value length representable by this length field
  /// size.
  ///
  pub fn max_length(&self) -> usize {
    match self {
      Self::U16 => 0xFFFF,
      Self::U32 => 0xFFFFFFFE,
    }
  }
}

impl DataElementHeader {
  /// Returns the size of the value length field used by a VR in the DICOM P10
  /// explicit VR encoding.
  ///
  pub fn value_length_size(vr: ValueRepresentation) -> ValueLengthSize {
    match vr {
      ValueRepresentation::OtherByteString
      | ValueRepresentation::OtherDoubleString
      | ValueRepresentation::OtherFloatString
      | ValueRepresentation::OtherLongString
      | ValueRepresentation::OtherVeryLongString
      | ValueRepresentation::OtherWordString
      | ValueRepresentation::Sequence
      | ValueRepresentation::SignedVeryLong
      | ValueRepresentation::UniversalResourceIdentifier
      | ValueRepresentation::Unknown
      | ValueRepresentation::UnlimitedCharacters
      | ValueRepresentation::UnlimitedText
      | ValueRepresentation::UnsignedVeryLong => ValueLengthSize::U32,

      _ => ValueLengthSize::U16,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_string_test() {
    assert_eq!(
      DataElementHeader {
        tag: dictionary::PATIENT_AGE.tag,
        vr: Some(ValueRepresentation::AgeString),
        length: ValueLength::ZERO,
      }
      .to_string(),
      "(0010,1010) AS Patient's Age".to_string()
    );

    assert_eq!(
      DataElementHeader {
        tag: dictionary::ITEM.tag,
        vr: None,
        length: ValueLength::ZERO,
      }
      .to_string(),
      "(FFFE,E000) Item".to_string()
    );
  }
}
