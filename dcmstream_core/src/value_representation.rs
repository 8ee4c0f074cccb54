//! The DICOM value representations (VRs).
//!
//! Ref: PS3.5 6.2.

/// One of the 34 value representations defined by the DICOM standard.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueRepresentation {
  AgeString,
  ApplicationEntity,
  AttributeTag,
  CodeString,
  Date,
  DateTime,
  DecimalString,
  FloatingPointDouble,
  FloatingPointSingle,
  IntegerString,
  LongString,
  LongText,
  OtherByteString,
  OtherDoubleString,
  OtherFloatString,
  OtherLongString,
  OtherVeryLongString,
  OtherWordString,
  PersonName,
  Sequence,
  ShortString,
  ShortText,
  SignedLong,
  SignedShort,
  SignedVeryLong,
  Time,
  UniqueIdentifier,
  UniversalResourceIdentifier,
  Unknown,
  UnlimitedCharacters,
  UnlimitedText,
  UnsignedLong,
  UnsignedShort,
  UnsignedVeryLong,
}

/// The constraints the DICOM standard places on the length of a value for a
/// given VR:
///
/// 1. The maximum number of bytes.
///
/// 2. Optionally, a value the number of bytes must be an exact multiple of.
///
/// 3. Optionally, for string VRs, a maximum number of characters. For
///    multi-valued string VRs this applies to each value individually.
///
#[derive(Debug, PartialEq)]
pub struct LengthRequirements {
  pub bytes_max: usize,
  pub bytes_multiple_of: Option<usize>,
  pub string_characters_max: Option<usize>,
}

impl core::fmt::Display for ValueRepresentation {
  /// Formats a VR as its two-character code, e.g. `"DA"`.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.write_str(core::str::from_utf8(&self.to_bytes()).unwrap())
  }
}

impl ValueRepresentation {
  /// Parses a VR from its two-character code, e.g. `b"DA"`.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, ()> {
    match bytes {
      b"AE" => Ok(Self::ApplicationEntity),
      b"AS" => Ok(Self::AgeString),
      b"AT" => Ok(Self::AttributeTag),
      b"CS" => Ok(Self::CodeString),
      b"DA" => Ok(Self::Date),
      b"DS" => Ok(Self::DecimalString),
      b"DT" => Ok(Self::DateTime),
      b"FD" => Ok(Self::FloatingPointDouble),
      b"FL" => Ok(Self::FloatingPointSingle),
      b"IS" => Ok(Self::IntegerString),
      b"LO" => Ok(Self::LongString),
      b"LT" => Ok(Self::LongText),
      b"OB" => Ok(Self::OtherByteString),
      b"OD" => Ok(Self::OtherDoubleString),
      b"OF" => Ok(Self::OtherFloatString),
      b"OL" => Ok(Self::OtherLongString),
      b"OV" => Ok(Self::OtherVeryLongString),
      b"OW" => Ok(Self::OtherWordString),
      b"PN" => Ok(Self::PersonName),
      b"SH" => Ok(Self::ShortString),
      b"SL" => Ok(Self::SignedLong),
      b"SQ" => Ok(Self::Sequence),
      b"SS" => Ok(Self::SignedShort),
      b"ST" => Ok(Self::ShortText),
      b"SV" => Ok(Self::SignedVeryLong),
      b"TM" => Ok(Self::Time),
      b"UC" => Ok(Self::UnlimitedCharacters),
      b"UI" => Ok(Self::UniqueIdentifier),
      b"UL" => Ok(Self::UnsignedLong),
      b"UN" => Ok(Self::Unknown),
      b"UR" => Ok(Self::UniversalResourceIdentifier),
      b"US" => Ok(Self::UnsignedShort),
      b"UT" => Ok(Self::UnlimitedText),
      b"UV" => Ok(Self::UnsignedVeryLong),

      _ => Err(()),
    }
  }

  /// Returns the two-character code for a VR, e.g. `b"DA"`.
  ///
  pub fn to_bytes(&self) -> [u8; 2] {
    *match self {
      Self::AgeString => b"AS",
      Self::ApplicationEntity => b"AE",
      Self::AttributeTag => b"AT",
      Self::CodeString => b"CS",
      Self::Date => b"DA",
      Self::DateTime => b"DT",
      Self::DecimalString => b"DS",
      Self::FloatingPointDouble => b"FD",
      Self::FloatingPointSingle => b"FL",
      Self::IntegerString => b"IS",
      Self::LongString => b"LO",
      Self::LongText => b"LT",
      Self::OtherByteString => b"OB",
      Self::OtherDoubleString => b"OD",
      Self::OtherFloatString => b"OF",
      Self::OtherLongString => b"OL",
      Self::OtherVeryLongString => b"OV",
      Self::OtherWordString => b"OW",
      Self::PersonName => b"PN",
      Self::Sequence => b"SQ",
      Self::ShortString => b"SH",
      Self::ShortText => b"ST",
      Self::SignedLong => b"SL",
      Self::SignedShort => b"SS",
      Self::SignedVeryLong => b"SV",
      Self::Time => b"TM",
      Self::UniqueIdentifier => b"UI",
      Self::UniversalResourceIdentifier => b"UR",
      Self::Unknown => b"UN",
      Self::UnlimitedCharacters => b"UC",
      Self::UnlimitedText => b"UT",
      Self::UnsignedLong => b"UL",
      Self::UnsignedShort => b"US",
      Self::UnsignedVeryLong => b"UV",
    }
  }

  /// Returns the descriptive name of a VR, e.g. `"CodeString"`.
  ///
  pub fn name(&self) -> &'static str {
    match self {
      Self::AgeString => "AgeString",
      Self::ApplicationEntity => "ApplicationEntity",
      Self::AttributeTag => "AttributeTag",
      Self::CodeString => "CodeString",
      Self::Date => "Date",
      Self::DateTime => "DateTime",
      Self::DecimalString => "DecimalString",
      Self::FloatingPointDouble => "FloatingPointDouble",
      Self::FloatingPointSingle => "FloatingPointSingle",
      Self::IntegerString => "IntegerString",
      Self::LongString => "LongString",
      Self::LongText => "LongText",
      Self::OtherByteString => "OtherByteString",
      Self::OtherDoubleString => "OtherDoubleString",
      Self::OtherFloatString => "OtherFloatString",
      Self::OtherLongString => "OtherLongString",
      Self::OtherVeryLongString => "OtherVeryLongString",
      Self::OtherWordString => "OtherWordString",
      Self::PersonName => "PersonName",
      Self::Sequence => "Sequence",
      Self::ShortString => "ShortString",
      Self::ShortText => "ShortText",
      Self::SignedLong => "SignedLong",
      Self::SignedShort => "SignedShort",
      Self::SignedVeryLong => "SignedVeryLong",
      Self::Time => "Time",
      Self::UniqueIdentifier => "UniqueIdentifier",
      Self::UniversalResourceIdentifier => "UniversalResourceIdentifier",
      Self::Unknown => "Unknown",
      Self::UnlimitedCharacters => "UnlimitedCharacters",
      Self::UnlimitedText => "UnlimitedText",
      Self::UnsignedLong => "UnsignedLong",
      Self::UnsignedShort => "UnsignedShort",
      Self::UnsignedVeryLong => "UnsignedVeryLong",
    }
  }

  /// Returns whether a VR holds 8-bit textual data.
  ///
  pub fn is_string(self) -> bool {
    matches!(
      self,
      Self::AgeString
        | Self::ApplicationEntity
        | Self::CodeString
        | Self::Date
        | Self::DateTime
        | Self::DecimalString
        | Self::IntegerString
        | Self::LongString
        | Self::LongText
        | Self::PersonName
        | Self::ShortString
        | Self::ShortText
        | Self::Time
        | Self::UniqueIdentifier
        | Self::UniversalResourceIdentifier
        | Self::UnlimitedCharacters
        | Self::UnlimitedText
    )
  }

  /// Returns whether a VR holds textual data that is subject to the Specific
  /// Character Set, and can therefore hold any Unicode codepoint once decoded
  /// to UTF-8.
  ///
  pub fn is_encoded_string(self) -> bool {
    matches!(
      self,
      Self::LongString
        | Self::LongText
        | Self::PersonName
        | Self::ShortString
        | Self::ShortText
        | Self::UnlimitedCharacters
        | Self::UnlimitedText
    )
  }

  /// Appends this VR's padding byte if the given bytes are of odd length.
  /// `UniqueIdentifier` pads with a NUL byte, the other string VRs pad with a
  /// space, and the remaining VRs have no padding byte.
  ///
  pub fn pad_bytes_to_even_length(self, bytes: &mut Vec<u8>) {
    if bytes.len() % 2 == 0 {
      return;
    }

    if self == Self::UniqueIdentifier {
      bytes.push(0x00);
    } else if self.is_string() {
      bytes.push(0x20);
    }
  }

  /// Returns the length constraints for a VR. See [`LengthRequirements`].
  ///
  pub fn length_requirements(self) -> LengthRequirements {
    let (bytes_max, bytes_multiple_of, string_characters_max) = match self {
      Self::AgeString => (4, None, None),
      Self::ApplicationEntity => (16, None, None),
      Self::Date => (8, None, None),
      Self::DateTime => (26, None, None),
      Self::Time => (14, None, None),

      Self::AttributeTag
      | Self::FloatingPointSingle
      | Self::SignedLong
      | Self::UnsignedLong => (0xFFFC, Some(4), None),

      Self::FloatingPointDouble => (0xFFF8, Some(8), None),

      Self::SignedShort | Self::UnsignedShort => (0xFFFE, Some(2), None),

      Self::OtherDoubleString
      | Self::OtherVeryLongString
      | Self::SignedVeryLong
      | Self::UnsignedVeryLong => (0xFFFFFFF8, Some(8), None),

      Self::OtherFloatString | Self::OtherLongString => {
        (0xFFFFFFFC, Some(4), None)
      }

      Self::OtherByteString | Self::OtherWordString => {
        (0xFFFFFFFE, Some(2), None)
      }

      Self::CodeString | Self::DecimalString | Self::ShortString => {
        (0xFFFE, None, Some(16))
      }

      Self::IntegerString => (0xFFFE, None, Some(12)),
      Self::LongString | Self::UniqueIdentifier => (0xFFFE, None, Some(64)),
      Self::LongText => (0xFFFE, None, Some(10_240)),
      Self::PersonName => (0xFFFE, None, Some(324)),
      Self::ShortText => (0xFFFE, None, Some(1024)),

      Self::UniversalResourceIdentifier
      | Self::Unknown
      | Self::UnlimitedCharacters
      | Self::UnlimitedText => (0xFFFFFFFE, None, None),

      Self::Sequence => (0, None, None),
    };

    LengthRequirements {
      bytes_max,
      bytes_multiple_of,
      string_characters_max,
    }
  }

  /// Reverses the byte order of each of the fixed-width numeric values stored
  /// in the given data. VRs that don't hold fixed-width binary values are left
  /// untouched.
  ///
  pub fn swap_endianness(self, bytes: &mut [u8]) {
    let value_width = match self {
      Self::AttributeTag
      | Self::OtherWordString
      | Self::SignedShort
      | Self::UnsignedShort => 2,

      Self::FloatingPointSingle
      | Self::OtherFloatString
      | Self::OtherLongString
      | Self::SignedLong
      | Self::UnsignedLong => 4,

      Self::FloatingPointDouble
      | Self::OtherDoubleString
      | Self::OtherVeryLongString
      | Self::SignedVeryLong
      | Self::UnsignedVeryLong => 8,

      _ => return,
    };

    for value in bytes.chunks_exact_mut(value_width) {
      value.reverse();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_VRS: [(ValueRepresentation, &str, &str); 34] = [
    (ValueRepresentation::AgeString, "AS", "AgeString"),
    (
      ValueRepresentation::ApplicationEntity,
      "AE",
      "ApplicationEntity",
    ),
    (ValueRepresentation::AttributeTag, "AT", "AttributeTag"),
    (ValueRepresentation::CodeString, "CS", "CodeString"),
    (ValueRepresentation::Date, "DA", "Date"),
    (ValueRepresentation::DateTime, "DT", "DateTime"),
    (ValueRepresentation::DecimalString, "DS", "DecimalString"),
    (
      ValueRepresentation::FloatingPointDouble,
      "FD",
      "FloatingPointDouble",
    ),
    (
      ValueRepresentation::FloatingPointSingle,
      "FL",
      "FloatingPointSingle",
    ),
    (ValueRepresentation::IntegerString, "IS", "IntegerString"),
    (ValueRepresentation::LongString, "LO", "LongString"),
    (ValueRepresentation::LongText, "LT", "LongText"),
    (ValueRepresentation::OtherByteString, "OB", "OtherByteString"),
    (
      ValueRepresentation::OtherDoubleString,
      "OD",
      "OtherDoubleString",
    ),
    (
      ValueRepresentation::OtherFloatString,
      "OF",
      "OtherFloatString",
    ),
    (ValueRepresentation::OtherLongString, "OL", "OtherLongString"),
    (
      ValueRepresentation::OtherVeryLongString,
      "OV",
      "OtherVeryLongString",
    ),
    (ValueRepresentation::OtherWordString, "OW", "OtherWordString"),
    (ValueRepresentation::PersonName, "PN", "PersonName"),
    (ValueRepresentation::Sequence, "SQ", "Sequence"),
    (ValueRepresentation::ShortString, "SH", "ShortString"),
    (ValueRepresentation::ShortText, "ST", "ShortText"),
    (ValueRepresentation::SignedLong, "SL", "SignedLong"),
    (ValueRepresentation::SignedShort, "SS", "SignedShort"),
    (ValueRepresentation::SignedVeryLong, "SV", "SignedVeryLong"),
    (ValueRepresentation::Time, "TM", "Time"),
    (
      ValueRepresentation::UniqueIdentifier,
      "UI",
      "UniqueIdentifier",
    ),
    (
      ValueRepresentation::UniversalResourceIdentifier,
      "UR",
      "UniversalResourceIdentifier",
    ),
    (ValueRepresentation::Unknown, "UN", "Unknown"),
    (
      ValueRepresentation::UnlimitedCharacters,
      "UC",
      "UnlimitedCharacters",
    ),
    (ValueRepresentation::UnlimitedText, "UT", "UnlimitedText"),
    (ValueRepresentation::UnsignedLong, "UL", "UnsignedLong"),
    (ValueRepresentation::UnsignedShort, "US", "UnsignedShort"),
    (
      ValueRepresentation::UnsignedVeryLong,
      "UV",
      "UnsignedVeryLong",
    ),
  ];

  #[test]
  fn from_bytes_test() {
    for (vr, code, _) in ALL_VRS {
      assert_eq!(ValueRepresentation::from_bytes(code.as_bytes()), Ok(vr));
    }

    assert_eq!(ValueRepresentation::from_bytes(b"XY"), Err(()));
  }

  #[test]
  fn to_string_test() {
    for (vr, code, _) in ALL_VRS {
      assert_eq!(vr.to_string(), code);
    }
  }

  #[test]
  fn name_test() {
    for (vr, _, name) in ALL_VRS {
      assert_eq!(vr.name(), name);
    }
  }

  #[test]
  fn is_string_test() {
    let string_vrs = ALL_VRS
      .iter()
      .filter(|(vr, _, _)| vr.is_string())
      .map(|(_, code, _)| *code)
      .collect::<Vec<_>>();

    assert_eq!(
      string_vrs,
      vec![
        "AS", "AE", "CS", "DA", "DT", "DS", "IS", "LO", "LT", "PN", "SH",
        "ST", "TM", "UI", "UR", "UC", "UT"
      ]
    );
  }

  #[test]
  fn is_encoded_string_test() {
    let encoded_string_vrs = ALL_VRS
      .iter()
      .filter(|(vr, _, _)| vr.is_encoded_string())
      .map(|(_, code, _)| *code)
      .collect::<Vec<_>>();

    assert_eq!(
      encoded_string_vrs,
      vec!["LO", "LT", "PN", "SH", "ST", "UC", "UT"]
    );
  }

  #[test]
  fn pad_bytes_to_even_length_test() {
    let mut bytes = vec![];
    ValueRepresentation::LongText.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, Vec::<u8>::new());

    let mut bytes = vec![0x41];
    ValueRepresentation::LongText.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41, 0x20]);

    let mut bytes = vec![0x41];
    ValueRepresentation::UniqueIdentifier.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41, 0x00]);

    let mut bytes = vec![0x41];
    ValueRepresentation::OtherByteString.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41]);
  }

  #[test]
  fn length_requirements_test() {
    assert_eq!(
      ValueRepresentation::AgeString.length_requirements(),
      LengthRequirements {
        bytes_max: 4,
        bytes_multiple_of: None,
        string_characters_max: None,
      }
    );

    assert_eq!(
      ValueRepresentation::AttributeTag.length_requirements(),
      LengthRequirements {
        bytes_max: 0xFFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      }
    );

    assert_eq!(
      ValueRepresentation::OtherVeryLongString.length_requirements(),
      LengthRequirements {
        bytes_max: 0xFFFFFFF8,
        bytes_multiple_of: Some(8),
        string_characters_max: None,
      }
    );

    assert_eq!(
      ValueRepresentation::PersonName.length_requirements(),
      LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(324),
      }
    );

    assert_eq!(
      ValueRepresentation::Sequence.length_requirements(),
      LengthRequirements {
        bytes_max: 0,
        bytes_multiple_of: None,
        string_characters_max: None,
      }
    );
  }

  #[test]
  fn swap_endianness_test() {
    let mut bytes = [0, 1, 2, 3];
    ValueRepresentation::SignedShort.swap_endianness(&mut bytes);
    assert_eq!(bytes, [1, 0, 3, 2]);

    let mut bytes = [0, 1, 2, 3, 4, 5, 6, 7];
    ValueRepresentation::SignedLong.swap_endianness(&mut bytes);
    assert_eq!(bytes, [3, 2, 1, 0, 7, 6, 5, 4]);

    let mut bytes = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
    ValueRepresentation::SignedVeryLong.swap_endianness(&mut bytes);
    assert_eq!(
      bytes,
      [7, 6, 5, 4, 3, 2, 1, 0, 15, 14, 13, 12, 11, 10, 9, 8]
    );

    let mut bytes = [0, 1, 2, 3];
    ValueRepresentation::OtherByteString.swap_endianness(&mut bytes);
    assert_eq!(bytes, [0, 1, 2, 3]);
  }
}
