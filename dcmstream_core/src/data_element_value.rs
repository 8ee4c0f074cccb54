//! A data element value holding data of any of the DICOM value
//! representations. Data element values are stored in a [`DataSet`] keyed by
//! their data element tag.

use byteorder::ByteOrder;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
  DataElementTag, DataError, DataSet, SharedBytes, StructuredAge,
  StructuredDate, StructuredDateTime, StructuredTime, ValueRepresentation,
  code_strings, dictionary, utils,
};

pub mod age_string;
pub mod attribute_tag;
pub mod date;
pub mod date_time;
pub mod decimal_string;
pub mod integer_string;
pub mod person_name;
pub mod time;
pub mod unique_identifier;

/// A DICOM data element value. One of:
///
/// 1. A binary value: raw little-endian bytes for a specific VR. This is the
///    common case. For string VRs the bytes are UTF-8.
///
/// 2. A lookup table descriptor value. Exactly six bytes holding three 16-bit
///    integers, where the middle integer is read as signed or unsigned
///    depending on whether the VR is [`ValueRepresentation::SignedShort`] or
///    [`ValueRepresentation::UnsignedShort`]. The first and last integers are
///    always unsigned. This unusual scheme is required by the standard.
///
/// 3. An encapsulated pixel data value: the raw items of an encapsulated
///    pixel data sequence, where the VR is
///    [`ValueRepresentation::OtherByteString`] or
///    [`ValueRepresentation::OtherWordString`].
///
/// 4. A sequence value: a list of nested data sets.
///
/// Binary data is stored as [`SharedBytes`] and decoded into richer types
/// only on request. Deferring the decode means non-conformant data, which is
/// common in practice, can still be carried through unaltered.
///
/// Ref: PS3.5 6.2.
///
#[derive(Clone, Debug, PartialEq)]
pub struct DataElementValue(RawValue);

#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::enum_variant_names)]
enum RawValue {
  BinaryValue {
    vr: ValueRepresentation,
    bytes: SharedBytes,
  },
  LookupTableDescriptorValue {
    vr: ValueRepresentation,
    bytes: SharedBytes,
  },
  EncapsulatedPixelDataValue {
    vr: ValueRepresentation,
    items: Vec<SharedBytes>,
  },
  SequenceValue {
    items: Vec<DataSet>,
  },
}

impl DataElementValue {
  /// Formats a data element value as a single human-readable line. Output
  /// longer than `output_width` is truncated with a trailing ellipsis.
  ///
  pub fn to_string(&self, tag: DataElementTag, output_width: usize) -> String {
    // The most items a comma-separated list can need before it is guaranteed
    // to reach the output width
    let list_max_size = output_width.div_ceil(3);

    let result = match &self.0 {
      RawValue::BinaryValue { vr, bytes } if vr.is_string() => {
        Ok(string_value_to_string(*vr, bytes, tag))
      }

      RawValue::LookupTableDescriptorValue { vr, bytes }
      | RawValue::BinaryValue { vr, bytes } => match vr {
        ValueRepresentation::AttributeTag => {
          match attribute_tag::from_bytes(bytes) {
            Ok(tags) => Ok((
              tags
                .iter()
                .take(list_max_size)
                .map(|tag| tag.to_string())
                .collect::<Vec<String>>()
                .join(", "),
              None,
            )),
            Err(_) => Err(()),
          }
        }

        ValueRepresentation::FloatingPointDouble
        | ValueRepresentation::FloatingPointSingle
        | ValueRepresentation::OtherDoubleString
        | ValueRepresentation::OtherFloatString => match self.get_floats() {
          Ok(floats) => Ok((
            floats
              .iter()
              .take(list_max_size)
              .map(|f| {
                if *f == f64::INFINITY {
                  "Infinity".to_string()
                } else if *f == f64::NEG_INFINITY {
                  "-Infinity".to_string()
                } else {
                  format!("{:?}", f)
                }
              })
              .collect::<Vec<String>>()
              .join(", "),
            None,
          )),
          Err(_) => Err(()),
        },

        ValueRepresentation::OtherByteString
        | ValueRepresentation::OtherLongString
        | ValueRepresentation::OtherVeryLongString
        | ValueRepresentation::OtherWordString
        | ValueRepresentation::Unknown => {
          Ok((utils::inspect_u8_slice(bytes, list_max_size), None))
        }

        ValueRepresentation::SignedLong
        | ValueRepresentation::SignedShort
        | ValueRepresentation::UnsignedLong
        | ValueRepresentation::UnsignedShort => match self.get_ints::<i64>() {
          Ok(ints) => Ok((
            ints
              .iter()
              .take(list_max_size)
              .map(|i| i.to_string())
              .collect::<Vec<String>>()
              .join(", "),
            None,
          )),
          Err(_) => Err(()),
        },

        ValueRepresentation::SignedVeryLong
        | ValueRepresentation::UnsignedVeryLong => {
          match self.get_big_ints::<i128>() {
            Ok(ints) => Ok((
              ints
                .iter()
                .take(list_max_size)
                .map(|i| i.to_string())
                .collect::<Vec<String>>()
                .join(", "),
              None,
            )),
            Err(_) => Err(()),
          }
        }

        _ => Err(()),
      },

      RawValue::EncapsulatedPixelDataValue { items, .. } => {
        let total_size: usize = items.iter().map(|item| item.len()).sum();

        Ok((
          format!("Items: {}, bytes: {}", items.len(), total_size),
          None,
        ))
      }

      RawValue::SequenceValue { items } => {
        Ok((format!("Items: {}", items.len()), None))
      }
    };

    match result {
      Ok((s, suffix)) => {
        let suffix = suffix.unwrap_or_default();

        // The width left for the value once the suffix is subtracted. At
        // least ten characters are always allowed.
        let output_width =
          core::cmp::max(output_width.saturating_sub(suffix.len()), 10);

        // When there are more codepoints than columns, truncate on grapheme
        // boundaries, assuming one column per grapheme
        if s.len() > output_width {
          let graphemes = UnicodeSegmentation::graphemes(s.as_str(), true)
            .collect::<Vec<&str>>();

          if graphemes.len() > output_width {
            format!("{} …{}", graphemes[0..output_width - 2].join(""), suffix)
          } else {
            format!("{}{}", s, suffix)
          }
        } else {
          format!("{}{}", s, suffix)
        }
      }

      Err(()) => "<error converting to string>".to_string(),
    }
  }
}

/// Formats the content of a string VR binary value for display, along with an
/// optional descriptive suffix for recognized UIDs and code strings.
///
fn string_value_to_string(
  vr: ValueRepresentation,
  bytes: &[u8],
  tag: DataElementTag,
) -> (String, Option<String>) {
  // Display the longest valid UTF-8 prefix, so values cut partway through a
  // character, e.g. at a maximum read size, still show what they hold
  let value = match core::str::from_utf8(bytes) {
    Ok(value) => value,

    Err(e) if e.valid_up_to() > 0 => {
      core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap()
    }

    Err(_) => return ("!! Invalid UTF-8 data".to_string(), None),
  };

  let formatted_value = match structured_string_to_string(vr, bytes) {
    Some(formatted) => formatted,

    None if string_vr_allows_multiplicity(vr) => value
      .split('\\')
      .map(|s| format!("{:?}", trim_string_item(vr, s)))
      .collect::<Vec<String>>()
      .join(", "),

    None => format!("{:?}", trim_string_item(vr, value)),
  };

  (formatted_value, string_value_description(vr, value, tag))
}

/// Formats the value of one of the structured string VRs, i.e. ages, dates,
/// and times, using its structured form. `None` is returned when the VR isn't
/// structured or its value doesn't parse, in which case the value displays as
/// a plain string instead.
///
fn structured_string_to_string(
  vr: ValueRepresentation,
  bytes: &[u8],
) -> Option<String> {
  match vr {
    ValueRepresentation::AgeString => {
      StructuredAge::from_bytes(bytes).ok().map(|age| age.to_string())
    }

    ValueRepresentation::Date => {
      StructuredDate::from_bytes(bytes).ok().map(|date| date.to_iso8601())
    }

    ValueRepresentation::DateTime => StructuredDateTime::from_bytes(bytes)
      .ok()
      .map(|date_time| date_time.to_iso8601()),

    ValueRepresentation::Time => {
      StructuredTime::from_bytes(bytes).ok().map(|time| time.to_iso8601())
    }

    _ => None,
  }
}

/// Returns whether a string VR holds multiple backslash-separated values that
/// display as a comma-separated list.
///
fn string_vr_allows_multiplicity(vr: ValueRepresentation) -> bool {
  matches!(
    vr,
    ValueRepresentation::CodeString
      | ValueRepresentation::DecimalString
      | ValueRepresentation::IntegerString
      | ValueRepresentation::LongString
      | ValueRepresentation::ShortString
      | ValueRepresentation::UniqueIdentifier
      | ValueRepresentation::UnlimitedCharacters
  )
}

/// Trims a single string value for display using the VR's padding rules.
///
fn trim_string_item(vr: ValueRepresentation, s: &str) -> &str {
  match vr {
    ValueRepresentation::UniqueIdentifier => s.trim_end_matches('\0'),

    ValueRepresentation::ApplicationEntity
    | ValueRepresentation::UniversalResourceIdentifier => s.trim_matches(' '),

    ValueRepresentation::LongText
    | ValueRepresentation::ShortText
    | ValueRepresentation::UnlimitedCharacters
    | ValueRepresentation::UnlimitedText => s.trim_end_matches(' '),

    _ => s.trim_matches(' '),
  }
}

/// Returns the ` (…)` description appended to recognized UID and CodeString
/// values.
///
fn string_value_description(
  vr: ValueRepresentation,
  value: &str,
  tag: DataElementTag,
) -> Option<String> {
  let description = match vr {
    ValueRepresentation::UniqueIdentifier => {
      dictionary::uid_name(value.trim_end_matches('\0')).ok()?
    }

    ValueRepresentation::CodeString => {
      code_strings::describe(value.trim(), tag).ok()?
    }

    _ => return None,
  };

  Some(format!(" ({})", description))
}

impl DataElementValue {
  /// Constructs a new binary data element value. All VRs other than
  /// [`ValueRepresentation::Sequence`] are allowed. The bytes must satisfy
  /// the VR's length requirements, and for string VRs must hold text that is
  /// valid for the VR.
  ///
  pub fn new_binary(
    vr: ValueRepresentation,
    bytes: SharedBytes,
  ) -> Result<Self, DataError> {
    if vr == ValueRepresentation::Sequence {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for binary data",
        vr
      )));
    }

    if vr.is_encoded_string() {
      if core::str::from_utf8(&bytes).is_err() {
        return Err(DataError::new_value_invalid(format!(
          "Bytes for '{}' are not valid UTF-8",
          vr
        )));
      }
    } else if vr.is_string() {
      let invalid_byte = bytes.iter().find(|b| {
        !matches!(**b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x1B)
          && !(0x20..=0x7E).contains(*b)
      });

      if let Some(invalid_byte) = invalid_byte {
        return Err(DataError::new_value_invalid(format!(
          "Bytes for '{}' has disallowed byte: 0x{:02X}",
          vr, *invalid_byte
        )));
      }
    }

    let value = Self::new_binary_unchecked(vr, bytes);

    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new binary data element value without validating `vr` or
  /// `bytes`. Used by the P10 read process, which bounds lengths via the data
  /// element header.
  ///
  pub fn new_binary_unchecked(
    vr: ValueRepresentation,
    bytes: SharedBytes,
  ) -> Self {
    Self(RawValue::BinaryValue { vr, bytes })
  }

  /// Constructs a new lookup table descriptor value. The VR must be
  /// [`ValueRepresentation::SignedShort`] or
  /// [`ValueRepresentation::UnsignedShort`], and `bytes` must be exactly six
  /// bytes long.
  ///
  pub fn new_lookup_table_descriptor(
    vr: ValueRepresentation,
    bytes: SharedBytes,
  ) -> Result<Self, DataError> {
    if vr != ValueRepresentation::SignedShort
      && vr != ValueRepresentation::UnsignedShort
    {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for lookup table descriptor \
         data",
        vr
      )));
    }

    let value = Self::new_lookup_table_descriptor_unchecked(vr, bytes);

    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new lookup table descriptor value without validating `vr`
  /// or `bytes`.
  ///
  pub fn new_lookup_table_descriptor_unchecked(
    vr: ValueRepresentation,
    bytes: SharedBytes,
  ) -> Self {
    Self(RawValue::LookupTableDescriptorValue { vr, bytes })
  }

  /// Constructs a new encapsulated pixel data value. The VR must be
  /// [`ValueRepresentation::OtherByteString`] or
  /// [`ValueRepresentation::OtherWordString`]. Strictly only the former is
  /// allowed by the standard, but the latter occurs in practice.
  ///
  /// `items` are the items of the encapsulated pixel data sequence: an
  /// optional basic offset table first, followed by fragments of pixel data.
  /// Each item must be of even length. Ref: PS3.5 A.4.
  ///
  pub fn new_encapsulated_pixel_data(
    vr: ValueRepresentation,
    items: Vec<SharedBytes>,
  ) -> Result<Self, DataError> {
    if vr != ValueRepresentation::OtherByteString
      && vr != ValueRepresentation::OtherWordString
    {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for encapsulated pixel data",
        vr
      )));
    }

    let value = Self::new_encapsulated_pixel_data_unchecked(vr, items);

    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new encapsulated pixel data value without validating `vr`
  /// or `items`.
  ///
  pub fn new_encapsulated_pixel_data_unchecked(
    vr: ValueRepresentation,
    items: Vec<SharedBytes>,
  ) -> Self {
    Self(RawValue::EncapsulatedPixelDataValue { vr, items })
  }

  /// Creates a new `Sequence` data element value.
  ///
  pub fn new_sequence(items: Vec<DataSet>) -> Self {
    Self(RawValue::SequenceValue { items })
  }

  /// Creates a new `AgeString` data element value.
  ///
  pub fn new_age_string(value: &StructuredAge) -> Result<Self, DataError> {
    let bytes = value.to_bytes()?;

    Ok(Self::new_binary_unchecked(
      ValueRepresentation::AgeString,
      bytes.into(),
    ))
  }

  /// Creates a new `ApplicationEntity` data element value.
  ///
  pub fn new_application_entity(value: &str) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::ApplicationEntity,
      &[value.trim_matches(' ')],
    )
  }

  /// Creates a new `AttributeTag` data element value.
  ///
  pub fn new_attribute_tag(
    value: &[DataElementTag],
  ) -> Result<Self, DataError> {
    let bytes = attribute_tag::to_bytes(value);

    Self::new_binary(ValueRepresentation::AttributeTag, bytes.into())
  }

  /// Creates a new `CodeString` data element value.
  ///
  pub fn new_code_string(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::CodeString,
      &value
        .iter()
        .map(|s| s.trim_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `Date` data element value.
  ///
  pub fn new_date(value: &StructuredDate) -> Result<Self, DataError> {
    let bytes = value.to_bytes()?;

    Ok(Self::new_binary_unchecked(
      ValueRepresentation::Date,
      bytes.into(),
    ))
  }

  /// Creates a new `DateTime` data element value.
  ///
  pub fn new_date_time(value: &StructuredDateTime) -> Result<Self, DataError> {
    let bytes = value.to_bytes()?;

    Ok(Self::new_binary_unchecked(
      ValueRepresentation::DateTime,
      bytes.into(),
    ))
  }

  /// Creates a new `DecimalString` data element value.
  ///
  pub fn new_decimal_string(value: &[f64]) -> Result<Self, DataError> {
    let bytes = decimal_string::to_bytes(value);

    Self::new_binary(ValueRepresentation::DecimalString, bytes.into())
  }

  /// Creates a new `FloatingPointDouble` data element value.
  ///
  pub fn new_floating_point_double(value: &[f64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_f64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::FloatingPointDouble, bytes.into())
  }

  /// Creates a new `FloatingPointSingle` data element value.
  ///
  pub fn new_floating_point_single(value: &[f32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_f32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::FloatingPointSingle, bytes.into())
  }

  /// Creates a new `IntegerString` data element value.
  ///
  pub fn new_integer_string(value: &[i32]) -> Result<Self, DataError> {
    let bytes = integer_string::to_bytes(value);

    Self::new_binary(ValueRepresentation::IntegerString, bytes.into())
  }

  /// Creates a new `LongString` data element value.
  ///
  pub fn new_long_string(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::LongString,
      &value
        .iter()
        .map(|s| s.trim_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `LongText` data element value.
  ///
  pub fn new_long_text(value: &str) -> Result<Self, DataError> {
    new_text(ValueRepresentation::LongText, value)
  }

  /// Creates a new `OtherByteString` data element value.
  ///
  pub fn new_other_byte_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherByteString, value.into())
  }

  /// Creates a new `OtherDoubleString` data element value.
  ///
  pub fn new_other_double_string(value: &[f64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_f64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::OtherDoubleString, bytes.into())
  }

  /// Creates a new `OtherFloatString` data element value.
  ///
  pub fn new_other_float_string(value: &[f32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_f32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::OtherFloatString, bytes.into())
  }

  /// Creates a new `OtherLongString` data element value.
  ///
  pub fn new_other_long_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherLongString, value.into())
  }

  /// Creates a new `OtherVeryLongString` data element value.
  ///
  pub fn new_other_very_long_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherVeryLongString, value.into())
  }

  /// Creates a new `OtherWordString` data element value.
  ///
  pub fn new_other_word_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherWordString, value.into())
  }

  /// Creates a new `PersonName` data element value.
  ///
  pub fn new_person_name(
    value: &[person_name::StructuredPersonName],
  ) -> Result<Self, DataError> {
    let bytes = person_name::to_bytes(value)?;

    Ok(Self::new_binary_unchecked(
      ValueRepresentation::PersonName,
      bytes.into(),
    ))
  }

  /// Creates a new `ShortString` data element value.
  ///
  pub fn new_short_string(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::ShortString,
      &value
        .iter()
        .map(|s| s.trim_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `ShortText` data element value.
  ///
  pub fn new_short_text(value: &str) -> Result<Self, DataError> {
    new_text(ValueRepresentation::ShortText, value)
  }

  /// Creates a new `SignedLong` data element value.
  ///
  pub fn new_signed_long(value: &[i32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_i32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedLong, bytes.into())
  }

  /// Creates a new `SignedShort` data element value.
  ///
  pub fn new_signed_short(value: &[i16]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 2];
    byteorder::LittleEndian::write_i16_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedShort, bytes.into())
  }

  /// Creates a new `SignedVeryLong` data element value.
  ///
  pub fn new_signed_very_long(value: &[i64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_i64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedVeryLong, bytes.into())
  }

  /// Creates a new `Time` data element value.
  ///
  pub fn new_time(value: &StructuredTime) -> Result<Self, DataError> {
    let bytes = value.to_bytes()?;

    Ok(Self::new_binary_unchecked(
      ValueRepresentation::Time,
      bytes.into(),
    ))
  }

  /// Creates a new `UniqueIdentifier` data element value.
  ///
  pub fn new_unique_identifier(value: &[&str]) -> Result<Self, DataError> {
    let bytes = unique_identifier::to_bytes(value)?;

    Self::new_binary(ValueRepresentation::UniqueIdentifier, bytes.into())
  }

  /// Creates a new `UniversalResourceIdentifier` data element value.
  ///
  pub fn new_universal_resource_identifier(
    value: &str,
  ) -> Result<Self, DataError> {
    new_text(
      ValueRepresentation::UniversalResourceIdentifier,
      value.trim_matches(' '),
    )
  }

  /// Creates a new `Unknown` data element value.
  ///
  pub fn new_unknown(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::Unknown, value.into())
  }

  /// Creates a new `UnlimitedCharacters` data element value.
  ///
  pub fn new_unlimited_characters(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::UnlimitedCharacters,
      &value
        .iter()
        .map(|s| s.trim_end_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `UnlimitedText` data element value.
  ///
  pub fn new_unlimited_text(value: &str) -> Result<Self, DataError> {
    new_text(ValueRepresentation::UnlimitedText, value)
  }

  /// Creates a new `UnsignedLong` data element value.
  ///
  pub fn new_unsigned_long(value: &[u32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_u32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedLong, bytes.into())
  }

  /// Creates a new `UnsignedShort` data element value.
  ///
  pub fn new_unsigned_short(value: &[u16]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 2];
    byteorder::LittleEndian::write_u16_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedShort, bytes.into())
  }

  /// Creates a new `UnsignedVeryLong` data element value.
  ///
  pub fn new_unsigned_very_long(value: &[u64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_u64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedVeryLong, bytes.into())
  }

  /// Returns the value representation of this data element value.
  ///
  pub fn value_representation(&self) -> ValueRepresentation {
    match &self.0 {
      RawValue::BinaryValue { vr, .. }
      | RawValue::LookupTableDescriptorValue { vr, .. }
      | RawValue::EncapsulatedPixelDataValue { vr, .. } => *vr,
      RawValue::SequenceValue { .. } => ValueRepresentation::Sequence,
    }
  }

  /// Returns the raw bytes of a value that holds binary data. Sequences and
  /// encapsulated pixel data don't have a single run of bytes and return an
  /// error.
  ///
  pub fn bytes(&self) -> Result<&SharedBytes, DataError> {
    match &self.0 {
      RawValue::BinaryValue { bytes, .. }
      | RawValue::LookupTableDescriptorValue { bytes, .. } => Ok(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the raw bytes of a value that holds binary data, but only when
  /// its VR is one of those listed.
  ///
  pub fn vr_bytes(
    &self,
    allowed_vrs: &[ValueRepresentation],
  ) -> Result<&SharedBytes, DataError> {
    if allowed_vrs.contains(&self.value_representation()) {
      self.bytes()
    } else {
      Err(DataError::new_value_not_present())
    }
  }

  /// Returns the items of a value that holds encapsulated pixel data.
  ///
  pub fn encapsulated_pixel_data(
    &self,
  ) -> Result<&Vec<SharedBytes>, DataError> {
    match &self.0 {
      RawValue::EncapsulatedPixelDataValue { items, .. } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the items of a value that holds a sequence.
  ///
  pub fn sequence_items(&self) -> Result<&[DataSet], DataError> {
    match &self.0 {
      RawValue::SequenceValue { items } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns a mutable reference to the items of a value that holds a
  /// sequence.
  ///
  pub fn sequence_items_mut(&mut self) -> Result<&mut Vec<DataSet>, DataError> {
    match &mut self.0 {
      RawValue::SequenceValue { items } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the size in bytes of this value including nested sequences and a
  /// fixed per-value overhead, so the result is never zero.
  ///
  pub fn total_byte_size(&self) -> u64 {
    let data_size = match &self.0 {
      RawValue::BinaryValue { bytes, .. }
      | RawValue::LookupTableDescriptorValue { bytes, .. } => {
        bytes.len() as u64
      }

      RawValue::EncapsulatedPixelDataValue { items, .. } => {
        items.len() as u64 * 8
          + items.iter().map(|item| item.len() as u64).sum::<u64>()
      }

      RawValue::SequenceValue { items } => {
        items.iter().map(|item| item.total_byte_size()).sum()
      }
    };

    data_size + core::mem::size_of::<Self>() as u64
  }

  /// Returns the string contained in this value. Supported for VRs that don't
  /// allow multiplicity, and for those that do when exactly one string is
  /// present.
  ///
  pub fn get_string(&self) -> Result<&str, DataError> {
    match &self.0 {
      RawValue::BinaryValue { vr, bytes }
        if matches!(
          vr,
          ValueRepresentation::ApplicationEntity
            | ValueRepresentation::LongText
            | ValueRepresentation::ShortText
            | ValueRepresentation::UniversalResourceIdentifier
            | ValueRepresentation::UnlimitedText
        ) =>
      {
        let string = core::str::from_utf8(bytes).map_err(|_| {
          DataError::new_value_invalid(
            "String bytes are not valid UTF-8".to_string(),
          )
        })?;

        let string = match vr {
          ValueRepresentation::ApplicationEntity
          | ValueRepresentation::UniversalResourceIdentifier => {
            string.trim_matches(' ')
          }
          _ => string.trim_end_matches(' '),
        };

        Ok(string)
      }

      _ => {
        let strings = self.get_strings()?;

        match strings.as_slice() {
          [s] => Ok(s),
          _ => Err(DataError::new_multiplicity_mismatch()),
        }
      }
    }
  }

  /// Returns the strings contained in this value. Supported for string VRs
  /// that allow multiplicity.
  ///
  pub fn get_strings(&self) -> Result<Vec<&str>, DataError> {
    match &self.0 {
      RawValue::BinaryValue { vr, bytes }
        if matches!(
          vr,
          ValueRepresentation::CodeString
            | ValueRepresentation::LongString
            | ValueRepresentation::ShortString
            | ValueRepresentation::UniqueIdentifier
            | ValueRepresentation::UnlimitedCharacters
        ) =>
      {
        let string = core::str::from_utf8(bytes).map_err(|_| {
          DataError::new_value_invalid(
            "String bytes are not valid UTF-8".to_string(),
          )
        })?;

        let strings = string
          .split('\\')
          .map(|s| match vr {
            ValueRepresentation::CodeString => {
              s.trim_end_matches('\0').trim_matches(' ')
            }
            ValueRepresentation::UniqueIdentifier => s.trim_end_matches('\0'),
            ValueRepresentation::UnlimitedCharacters => s.trim_end_matches(' '),
            _ => s.trim_matches(' '),
          })
          .collect::<Vec<&str>>();

        Ok(strings)
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the integer contained in this value. Supported for VRs holding
  /// integer data when exactly one integer is present.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<T, DataError> {
    let ints = self.get_ints()?;

    match ints.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the integers contained in this value. Supported for VRs holding
  /// integer data.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    fn read_ints<T: num_traits::PrimInt + TryFrom<i64>>(
      bytes: &[u8],
      value_width: usize,
      type_name: &str,
      read: impl Fn(&[u8]) -> i64,
    ) -> Result<Vec<T>, DataError> {
      if bytes.len() % value_width != 0 {
        return Err(DataError::new_value_invalid(format!(
          "Invalid {} data",
          type_name
        )));
      }

      bytes
        .chunks_exact(value_width)
        .map(|chunk| convert_int::<i64, T>(read(chunk)))
        .collect()
    }

    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::IntegerString,
        bytes,
      } => integer_string::from_bytes(bytes)?
        .into_iter()
        .map(|i| convert_int::<i32, T>(i))
        .collect(),

      RawValue::BinaryValue {
        vr: ValueRepresentation::SignedLong,
        bytes,
      } => read_ints(bytes, 4, "Int32", |chunk| {
        byteorder::LittleEndian::read_i32(chunk).into()
      }),

      RawValue::BinaryValue {
        vr: ValueRepresentation::SignedShort,
        bytes,
      } => read_ints(bytes, 2, "Int16", |chunk| {
        byteorder::LittleEndian::read_i16(chunk).into()
      }),

      RawValue::BinaryValue {
        vr: ValueRepresentation::UnsignedLong,
        bytes,
      } => read_ints(bytes, 4, "Uint32", |chunk| {
        byteorder::LittleEndian::read_u32(chunk).into()
      }),

      RawValue::BinaryValue {
        vr: ValueRepresentation::UnsignedShort,
        bytes,
      } => read_ints(bytes, 2, "Uint16", |chunk| {
        byteorder::LittleEndian::read_u16(chunk).into()
      }),

      RawValue::LookupTableDescriptorValue { .. } => {
        let (entry_count, first_input_value, bits_per_entry) =
          self.get_lookup_table_descriptor()?;

        Ok(vec![
          convert_int::<i64, T>(entry_count.into())?,
          convert_int::<i64, T>(first_input_value.into())?,
          convert_int::<i64, T>(bits_per_entry.into())?,
        ])
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the three integers of a lookup table descriptor value. The
  /// middle integer is signed when the value's VR is
  /// [`ValueRepresentation::SignedShort`].
  ///
  pub fn get_lookup_table_descriptor(
    &self,
  ) -> Result<(u16, i32, u16), DataError> {
    match &self.0 {
      RawValue::LookupTableDescriptorValue { vr, bytes } => {
        if bytes.len() == 6
          && (*vr == ValueRepresentation::SignedShort
            || *vr == ValueRepresentation::UnsignedShort)
        {
          let entry_count = byteorder::LittleEndian::read_u16(&bytes[0..2]);

          // The VR decides the signedness of the middle 16-bit integer
          let first_input_value: i32 =
            if *vr == ValueRepresentation::SignedShort {
              byteorder::LittleEndian::read_i16(&bytes[2..4]).into()
            } else {
              byteorder::LittleEndian::read_u16(&bytes[2..4]).into()
            };

          let bits_per_entry = byteorder::LittleEndian::read_u16(&bytes[4..6]);

          Ok((entry_count, first_input_value, bits_per_entry))
        } else {
          Err(DataError::new_value_invalid(
            "Invalid lookup table descriptor".to_string(),
          ))
        }
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the 64-bit integer contained in this value. Supported for the
  /// `SignedVeryLong` and `UnsignedVeryLong` VRs when exactly one integer is
  /// present.
  ///
  pub fn get_big_int<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
  ) -> Result<T, DataError> {
    let ints = self.get_big_ints()?;

    match ints.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the 64-bit integers contained in this value. Supported for the
  /// `SignedVeryLong` and `UnsignedVeryLong` VRs.
  ///
  pub fn get_big_ints<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    fn convert_big_int<T: num_traits::PrimInt + TryFrom<i128>>(
      i: i128,
    ) -> Result<T, DataError> {
      T::try_from(i).map_err(|_| {
        DataError::new_value_invalid(format!(
          "Value '{}' is out of range for the target integer type '{}'",
          i,
          core::any::type_name::<T>()
        ))
      })
    }

    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::SignedVeryLong,
        bytes,
      } => {
        if bytes.len() % 8 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Int64 data".to_string(),
          ));
        }

        bytes
          .chunks_exact(8)
          .map(|chunk| {
            convert_big_int(byteorder::LittleEndian::read_i64(chunk).into())
          })
          .collect()
      }

      RawValue::BinaryValue {
        vr: ValueRepresentation::UnsignedVeryLong,
        bytes,
      } => {
        if bytes.len() % 8 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Uint64 data".to_string(),
          ));
        }

        bytes
          .chunks_exact(8)
          .map(|chunk| {
            convert_big_int(byteorder::LittleEndian::read_u64(chunk).into())
          })
          .collect()
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the float contained in this value. Supported for VRs holding
  /// floating point data when exactly one float is present.
  ///
  pub fn get_float(&self) -> Result<f64, DataError> {
    let floats = self.get_floats()?;

    match floats.as_slice() {
      [f] => Ok(*f),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the floats contained in this value. Supported for VRs holding
  /// floating point data.
  ///
  pub fn get_floats(&self) -> Result<Vec<f64>, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::DecimalString,
        bytes,
      } => decimal_string::from_bytes(bytes),

      RawValue::BinaryValue { vr, bytes }
        if *vr == ValueRepresentation::FloatingPointDouble
          || *vr == ValueRepresentation::OtherDoubleString =>
      {
        if bytes.len() % 8 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Float64 data".to_string(),
          ));
        }

        Ok(
          bytes
            .chunks_exact(8)
            .map(byteorder::LittleEndian::read_f64)
            .collect(),
        )
      }

      RawValue::BinaryValue { vr, bytes }
        if *vr == ValueRepresentation::FloatingPointSingle
          || *vr == ValueRepresentation::OtherFloatString =>
      {
        if bytes.len() % 4 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Float32 data".to_string(),
          ));
        }

        Ok(
          bytes
            .chunks_exact(4)
            .map(|chunk| f64::from(byteorder::LittleEndian::read_f32(chunk)))
            .collect(),
        )
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured age contained in an `AgeString` value.
  ///
  pub fn get_age(&self) -> Result<StructuredAge, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::AgeString,
        bytes,
      } => StructuredAge::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the data element tags contained in an `AttributeTag` value.
  ///
  pub fn get_attribute_tags(&self) -> Result<Vec<DataElementTag>, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::AttributeTag,
        bytes,
      } => attribute_tag::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured date contained in a `Date` value.
  ///
  pub fn get_date(&self) -> Result<StructuredDate, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::Date,
        bytes,
      } => StructuredDate::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured date/time contained in a `DateTime` value.
  ///
  pub fn get_date_time(&self) -> Result<StructuredDateTime, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::DateTime,
        bytes,
      } => StructuredDateTime::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured time contained in a `Time` value.
  ///
  pub fn get_time(&self) -> Result<StructuredTime, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::Time,
        bytes,
      } => StructuredTime::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured person name contained in a `PersonName` value
  /// holding exactly one name.
  ///
  pub fn get_person_name(
    &self,
  ) -> Result<person_name::StructuredPersonName, DataError> {
    let mut person_names = self.get_person_names()?;

    if person_names.len() == 1 {
      return Ok(person_names.remove(0));
    }

    Err(DataError::new_multiplicity_mismatch())
  }

  /// Returns the structured person names contained in a `PersonName` value.
  ///
  pub fn get_person_names(
    &self,
  ) -> Result<Vec<person_name::StructuredPersonName>, DataError> {
    match &self.0 {
      RawValue::BinaryValue {
        vr: ValueRepresentation::PersonName,
        bytes,
      } => person_name::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Checks that the number of bytes held by this value is valid for its
  /// value representation.
  ///
  pub fn validate_length(&self) -> Result<(), DataError> {
    match &self.0 {
      RawValue::LookupTableDescriptorValue { vr, bytes } => {
        if bytes.len() != 6 {
          return Err(DataError::new_value_length_invalid(
            *vr,
            bytes.len() as u64,
            "Lookup table descriptor length must be exactly 6 bytes"
              .to_string(),
          ));
        }
      }

      RawValue::BinaryValue { vr, bytes } => {
        let requirements = vr.length_requirements();
        let bytes_multiple_of = requirements.bytes_multiple_of.unwrap_or(2);

        if bytes.len() > requirements.bytes_max {
          return Err(DataError::new_value_length_invalid(
            *vr,
            bytes.len() as u64,
            format!("Must not exceed {} bytes", requirements.bytes_max),
          ));
        }

        if bytes.len() % bytes_multiple_of != 0 {
          return Err(DataError::new_value_length_invalid(
            *vr,
            bytes.len() as u64,
            format!("Must be a multiple of {} bytes", bytes_multiple_of),
          ));
        }
      }

      RawValue::EncapsulatedPixelDataValue { vr, items } => {
        for item in items {
          if item.len() > 0xFFFFFFFE {
            return Err(DataError::new_value_length_invalid(
              *vr,
              item.len() as u64,
              format!("Must not exceed {} bytes", 0xFFFFFFFEu32),
            ));
          }

          if item.len() % 2 != 0 {
            return Err(DataError::new_value_length_invalid(
              *vr,
              item.len() as u64,
              "Must be a multiple of 2 bytes".to_string(),
            ));
          }
        }
      }

      RawValue::SequenceValue { .. } => (),
    };

    Ok(())
  }
}

/// Converts an integer to the target integer type, erroring when the value is
/// out of the target type's range.
///
fn convert_int<U, T>(i: U) -> Result<T, DataError>
where
  U: num_traits::PrimInt + Into<i64> + core::fmt::Display + Copy,
  T: num_traits::PrimInt + TryFrom<i64>,
{
  T::try_from(i.into()).map_err(|_| {
    DataError::new_value_invalid(format!(
      "Value '{}' is out of range for the target integer type '{}'",
      i,
      core::any::type_name::<T>()
    ))
  })
}

/// Creates a data element value holding a multi-valued string. The individual
/// values are validated and then joined with backslashes into the final
/// bytes.
///
fn new_string_list(
  vr: ValueRepresentation,
  value: &[&str],
) -> Result<DataElementValue, DataError> {
  let string_characters_max = vr
    .length_requirements()
    .string_characters_max
    .unwrap_or(0xFFFFFFFE);

  for s in value.iter() {
    if s.len() > string_characters_max {
      return Err(DataError::new_value_invalid(format!(
        "String list item is longer than the max length of {}",
        string_characters_max
      )));
    }

    // Backslashes in an individual value would alter the multiplicity once
    // the values are joined
    if s.contains('\\') {
      return Err(DataError::new_value_invalid(
        "String list item contains backslashes".to_string(),
      ));
    }

    if vr == ValueRepresentation::CodeString
      && !s.bytes().all(|b| {
        b.is_ascii_uppercase() || b.is_ascii_digit() || b == b' ' || b == b'_'
      })
    {
      return Err(DataError::new_value_invalid(format!(
        "String list item contains characters disallowed for CodeString: \
         '{}'",
        s
      )));
    }
  }

  let mut bytes = value.join("\\").into_bytes();
  vr.pad_bytes_to_even_length(&mut bytes);

  DataElementValue::new_binary(vr, bytes.into())
}

/// Creates a data element value holding a single text value, trimming
/// trailing spaces and padding to even length.
///
fn new_text(
  vr: ValueRepresentation,
  value: &str,
) -> Result<DataElementValue, DataError> {
  let mut bytes = value.trim_end_matches(' ').to_string().into_bytes();
  vr.pad_bytes_to_even_length(&mut bytes);

  DataElementValue::new_binary(vr, bytes.into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn value_representation_test() {
    assert_eq!(
      DataElementValue::new_long_string(&["123"])
        .unwrap()
        .value_representation(),
      ValueRepresentation::LongString
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0u8; 6].into()
      )
      .value_representation(),
      ValueRepresentation::UnsignedShort
    );

    assert_eq!(
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherWordString,
        vec![]
      )
      .value_representation(),
      ValueRepresentation::OtherWordString
    );

    assert_eq!(
      DataElementValue::new_sequence(vec![]).value_representation(),
      ValueRepresentation::Sequence
    );
  }

  #[test]
  fn bytes_test() {
    assert_eq!(
      DataElementValue::new_long_string(&["12"]).unwrap().bytes(),
      Ok(&b"12".to_vec().into())
    );

    assert_eq!(
      DataElementValue::new_floating_point_single(&[1.0])
        .unwrap()
        .bytes(),
      Ok(&vec![0, 0, 0x80, 0x3F].into())
    );

    assert_eq!(
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherWordString,
        vec![]
      )
      .bytes(),
      Err(DataError::new_value_not_present())
    );

    assert_eq!(
      DataElementValue::new_sequence(vec![]).bytes(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn new_code_string_test() {
    assert_eq!(
      DataElementValue::new_code_string(&["DERIVED ", "SECONDARY"])
        .unwrap()
        .bytes(),
      Ok(&b"DERIVED\\SECONDARY ".to_vec().into())
    );

    assert_eq!(
      DataElementValue::new_code_string(&["A\\B"]),
      Err(DataError::new_value_invalid(
        "String list item contains backslashes".to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_code_string(&["lowercase"]),
      Err(DataError::new_value_invalid(
        "String list item contains characters disallowed for CodeString: \
         'lowercase'"
          .to_string()
      ))
    );
  }

  #[test]
  fn get_string_test() {
    assert_eq!(
      DataElementValue::new_application_entity("A")
        .unwrap()
        .get_string(),
      Ok("A")
    );

    assert_eq!(
      DataElementValue::new_long_text("A").unwrap().get_string(),
      Ok("A")
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::ShortText,
        vec![0xD0].into()
      )
      .get_string(),
      Err(DataError::new_value_invalid(
        "String bytes are not valid UTF-8".to_string(),
      ))
    );

    assert_eq!(
      DataElementValue::new_long_string(&["A"])
        .unwrap()
        .get_string(),
      Ok("A")
    );

    assert_eq!(
      DataElementValue::new_long_string(&["A", "B"])
        .unwrap()
        .get_string(),
      Err(DataError::new_multiplicity_mismatch())
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[1])
        .unwrap()
        .get_string(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_strings_test() {
    assert_eq!(
      DataElementValue::new_code_string(&["A", "B"])
        .unwrap()
        .get_strings(),
      Ok(vec!["A", "B"])
    );

    assert_eq!(
      DataElementValue::new_unique_identifier(&["1.2", "3.4"])
        .unwrap()
        .get_strings(),
      Ok(vec!["1.2", "3.4"])
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::ShortString,
        vec![0xD0].into()
      )
      .get_strings(),
      Err(DataError::new_value_invalid(
        "String bytes are not valid UTF-8".to_string(),
      ))
    );

    assert_eq!(
      DataElementValue::new_long_text("A").unwrap().get_strings(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_int_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::IntegerString,
        b"  123   ".to_vec().into()
      )
      .get_int(),
      Ok(123)
    );

    assert_eq!(
      DataElementValue::new_unsigned_long(&[1234])
        .unwrap()
        .get_int(),
      Ok(1234)
    );

    assert_eq!(
      DataElementValue::new_unsigned_long(&[123, 456])
        .unwrap()
        .get_int::<i32>(),
      Err(DataError::new_multiplicity_mismatch())
    );

    assert_eq!(
      DataElementValue::new_long_text("123")
        .unwrap()
        .get_int::<i32>(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_ints_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::IntegerString,
        b" 123 \\456 ".to_vec().into()
      )
      .get_ints(),
      Ok(vec![123, 456])
    );

    assert_eq!(
      DataElementValue::new_signed_long(&[i32::MIN, i32::MAX])
        .unwrap()
        .get_ints::<i32>(),
      Ok(vec![i32::MIN, i32::MAX])
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::SignedLong,
        vec![0].into()
      )
      .get_ints::<i32>(),
      Err(DataError::new_value_invalid("Invalid Int32 data".to_string()))
    );

    assert_eq!(
      DataElementValue::new_signed_short(&[i16::MIN, i16::MAX])
        .unwrap()
        .get_ints::<i16>(),
      Ok(vec![i16::MIN, i16::MAX])
    );

    assert_eq!(
      DataElementValue::new_unsigned_long(&[u32::MIN, u32::MAX])
        .unwrap()
        .get_ints::<u32>(),
      Ok(vec![u32::MIN, u32::MAX])
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[u16::MIN, u16::MAX])
        .unwrap()
        .get_ints::<u16>(),
      Ok(vec![u16::MIN, u16::MAX])
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[0xFFFF])
        .unwrap()
        .get_ints::<i16>(),
      Err(DataError::new_value_invalid(
        "Value '65535' is out of range for the target integer type 'i16'"
          .to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_floating_point_single(&[123.0])
        .unwrap()
        .get_ints::<i32>(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_lookup_table_descriptor_test() {
    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::SignedShort,
        vec![0x34, 0x12, 0x00, 0x80, 0x78, 0x56].into()
      )
      .get_ints(),
      Ok(vec![0x1234, -0x8000, 0x5678])
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0x34, 0x12, 0x00, 0x80, 0x78, 0x56].into()
      )
      .get_ints(),
      Ok(vec![0x1234, 0x8000, 0x5678])
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::OtherWordString,
        vec![0, 0, 0, 0, 0, 0].into()
      )
      .get_ints::<i32>(),
      Err(DataError::new_value_invalid(
        "Invalid lookup table descriptor".to_string(),
      ))
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0, 0, 0, 0].into()
      )
      .get_ints::<i32>(),
      Err(DataError::new_value_invalid(
        "Invalid lookup table descriptor".to_string(),
      ))
    );
  }

  #[test]
  fn get_big_ints_test() {
    assert_eq!(
      DataElementValue::new_signed_very_long(&[i64::MIN, i64::MAX])
        .unwrap()
        .get_big_ints::<i64>(),
      Ok(vec![i64::MIN, i64::MAX])
    );

    assert_eq!(
      DataElementValue::new_unsigned_very_long(&[u64::MIN, u64::MAX])
        .unwrap()
        .get_big_ints::<u64>(),
      Ok(vec![u64::MIN, u64::MAX])
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::SignedVeryLong,
        vec![0].into()
      )
      .get_big_ints::<i64>(),
      Err(DataError::new_value_invalid("Invalid Int64 data".to_string()))
    );

    assert_eq!(
      DataElementValue::new_unsigned_very_long(&[1234, 1234])
        .unwrap()
        .get_big_int::<u64>(),
      Err(DataError::new_multiplicity_mismatch())
    );

    assert_eq!(
      DataElementValue::new_long_text("123")
        .unwrap()
        .get_big_ints::<u64>(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_float_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::DecimalString,
        b" 1.2   ".to_vec().into()
      )
      .get_float(),
      Ok(1.2)
    );

    assert_eq!(
      DataElementValue::new_floating_point_single(&[1.0])
        .unwrap()
        .get_float(),
      Ok(1.0)
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::DecimalString,
        b" 1.2  \\3.4".to_vec().into()
      )
      .get_float(),
      Err(DataError::new_multiplicity_mismatch())
    );

    assert_eq!(
      DataElementValue::new_long_text("1.0").unwrap().get_float(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_floats_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::DecimalString,
        b" 1.2  \\3.4".to_vec().into()
      )
      .get_floats(),
      Ok(vec![1.2, 3.4])
    );

    assert_eq!(
      DataElementValue::new_floating_point_double(&[1.0, 2.5])
        .unwrap()
        .get_floats(),
      Ok(vec![1.0, 2.5])
    );

    assert_eq!(
      DataElementValue::new_other_float_string(&[1.0, 2.5])
        .unwrap()
        .get_floats(),
      Ok(vec![1.0, 2.5])
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::FloatingPointDouble,
        vec![0].into()
      )
      .get_floats(),
      Err(DataError::new_value_invalid(
        "Invalid Float64 data".to_string()
      ))
    );
  }

  #[test]
  fn get_age_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::AgeString,
        b"041Y".to_vec().into()
      )
      .get_age(),
      Ok(StructuredAge {
        number: 41,
        unit: age_string::AgeUnit::Years
      })
    );

    assert_eq!(
      DataElementValue::new_long_text("041Y").unwrap().get_age(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_person_name_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::PersonName,
        b"DOE^JANE".to_vec().into()
      )
      .get_person_name(),
      Ok(person_name::StructuredPersonName {
        alphabetic: Some(person_name::PersonNameComponents {
          last_name: "DOE".to_string(),
          first_name: "JANE".to_string(),
          middle_name: "".to_string(),
          prefix: "".to_string(),
          suffix: "".to_string(),
        }),
        ideographic: None,
        phonetic: None,
      })
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::PersonName,
        b"A\\B".to_vec().into()
      )
      .get_person_name(),
      Err(DataError::new_multiplicity_mismatch())
    );
  }

  #[test]
  fn validate_length_test() {
    assert!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0, 0].into()
      )
      .validate_length()
      .is_ok()
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::UnsignedLong,
        vec![0, 0].into()
      )
      .validate_length(),
      Err(DataError::new_value_length_invalid(
        ValueRepresentation::UnsignedLong,
        2,
        "Must be a multiple of 4 bytes".to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::AgeString,
        b"012345".to_vec().into()
      )
      .validate_length(),
      Err(DataError::new_value_length_invalid(
        ValueRepresentation::AgeString,
        6,
        "Must not exceed 4 bytes".to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0, 0].into()
      )
      .validate_length(),
      Err(DataError::new_value_length_invalid(
        ValueRepresentation::UnsignedShort,
        2,
        "Lookup table descriptor length must be exactly 6 bytes".to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherByteString,
        vec![vec![0].into()]
      )
      .validate_length(),
      Err(DataError::new_value_length_invalid(
        ValueRepresentation::OtherByteString,
        1,
        "Must be a multiple of 2 bytes".to_string()
      ))
    );
  }

  #[test]
  fn to_string_test() {
    assert_eq!(
      DataElementValue::new_code_string(&["DERIVED", "SECONDARY"])
        .unwrap()
        .to_string(DataElementTag::ZERO, 80),
      "\"DERIVED\", \"SECONDARY\"".to_string()
    );

    assert_eq!(
      DataElementValue::new_unique_identifier(&["1.2.840.10008.1.2.1"])
        .unwrap()
        .to_string(DataElementTag::ZERO, 80),
      "\"1.2.840.10008.1.2.1\" (Explicit VR Little Endian)".to_string()
    );

    assert_eq!(
      DataElementValue::new_floating_point_double(&[f64::INFINITY, 2.5])
        .unwrap()
        .to_string(DataElementTag::ZERO, 80),
      "Infinity, 2.5".to_string()
    );

    assert_eq!(
      DataElementValue::new_attribute_tag(&[DataElementTag::new(
        0x1122, 0x3344
      )])
      .unwrap()
      .to_string(DataElementTag::ZERO, 80),
      "(1122,3344)".to_string()
    );

    assert_eq!(
      DataElementValue::new_other_byte_string(vec![0x1A, 0x2B])
        .unwrap()
        .to_string(DataElementTag::ZERO, 80),
      "[1A 2B]".to_string()
    );

    assert_eq!(
      DataElementValue::new_sequence(vec![])
        .to_string(DataElementTag::ZERO, 80),
      "Items: 0".to_string()
    );

    assert_eq!(
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherByteString,
        vec![vec![0, 0].into(), vec![1, 1, 1, 1].into()]
      )
      .to_string(DataElementTag::ZERO, 80),
      "Items: 2, bytes: 6".to_string()
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::ShortText,
        vec![0x80, 0x80].into()
      )
      .to_string(DataElementTag::ZERO, 80),
      "!! Invalid UTF-8 data".to_string()
    );
  }
}
