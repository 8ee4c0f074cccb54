//! Decoding of DICOM string data into UTF-8 based on the *'(0008,0005)
//! Specific Character Set)'* data element.
//!
//! String bytes are always stored verbatim in data element values; decoding
//! only happens when string data is materialized during a P10 read, or when a
//! caller explicitly asks for a decoded string. Data without a declared
//! character set uses the default repertoire.

/// A character set that DICOM string data can be encoded with, as declared by
/// the *'(0008,0005) Specific Character Set'* data element.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpecificCharacterSet {
  /// The default repertoire, ISO-IR 6, i.e. ISO 646 / US-ASCII.
  IsoIr6,

  /// ISO-IR 100, i.e. ISO 8859-1 / Latin-1.
  IsoIr100,

  /// ISO-IR 192, i.e. Unicode in UTF-8.
  IsoIr192,
}

impl SpecificCharacterSet {
  /// Converts a *'(0008,0005) Specific Character Set'* value into a character
  /// set. Unrecognized character sets return an error.
  ///
  /// When the value is multi-valued only the first value is relevant, as code
  /// extensions are not supported by this library.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_string(value: &str) -> Result<Self, ()> {
    let term = value
      .split('\\')
      .next()
      .unwrap_or("")
      .trim_matches([' ', '\0']);

    match term {
      "" | "ISO_IR 6" | "ISO 2022 IR 6" => Ok(Self::IsoIr6),
      "ISO_IR 100" | "ISO 2022 IR 100" => Ok(Self::IsoIr100),
      "ISO_IR 192" => Ok(Self::IsoIr192),

      _ => Err(()),
    }
  }

  /// Returns whether string data in this character set is already valid UTF-8
  /// and can be passed through without conversion.
  ///
  pub fn is_utf8_compatible(&self) -> bool {
    matches!(self, Self::IsoIr6 | Self::IsoIr192)
  }

  /// Decodes string bytes in this character set into a UTF-8 string. Bytes
  /// that are invalid in the character set are replaced, so this function
  /// always succeeds.
  ///
  pub fn decode_bytes(&self, bytes: &[u8]) -> String {
    match self {
      Self::IsoIr6 => {
        let mut bytes = bytes.to_vec();
        sanitize_default_charset_bytes(&mut bytes);

        String::from_utf8(bytes).unwrap()
      }

      Self::IsoIr100 => bytes.iter().map(|b| char::from(*b)).collect(),

      Self::IsoIr192 => String::from_utf8_lossy(bytes).into_owned(),
    }
  }
}

impl Default for SpecificCharacterSet {
  fn default() -> Self {
    Self::IsoIr6
  }
}

/// Replaces bytes that aren't part of the default repertoire with a question
/// mark. The repertoire is the printable ISO 646 characters plus the control
/// characters that DICOM allows in string data.
///
pub fn sanitize_default_charset_bytes(bytes: &mut [u8]) {
  for byte in bytes.iter_mut() {
    let is_allowed = matches!(*byte, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x1B)
      || (0x20..=0x7E).contains(byte);

    if !is_allowed {
      *byte = b'?';
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_string_test() {
    assert_eq!(
      SpecificCharacterSet::from_string(""),
      Ok(SpecificCharacterSet::IsoIr6)
    );

    assert_eq!(
      SpecificCharacterSet::from_string("ISO_IR 6"),
      Ok(SpecificCharacterSet::IsoIr6)
    );

    assert_eq!(
      SpecificCharacterSet::from_string("ISO_IR 100 "),
      Ok(SpecificCharacterSet::IsoIr100)
    );

    assert_eq!(
      SpecificCharacterSet::from_string("ISO_IR 192"),
      Ok(SpecificCharacterSet::IsoIr192)
    );

    assert_eq!(SpecificCharacterSet::from_string("ISO_IR 13"), Err(()));
  }

  #[test]
  fn decode_bytes_test() {
    assert_eq!(
      SpecificCharacterSet::IsoIr6.decode_bytes(b"AB\x80C"),
      "AB?C".to_string()
    );

    assert_eq!(
      SpecificCharacterSet::IsoIr100.decode_bytes(&[0x4D, 0xFC, 0x6C, 0x6C]),
      "Müll".to_string()
    );

    assert_eq!(
      SpecificCharacterSet::IsoIr192.decode_bytes("Müll".as_bytes()),
      "Müll".to_string()
    );
  }

  #[test]
  fn sanitize_default_charset_bytes_test() {
    let mut bytes = b"A\x1BB\xFF".to_vec();
    sanitize_default_charset_bytes(&mut bytes);
    assert_eq!(bytes, b"A\x1BB?".to_vec());
  }
}
