//! Tracks where in the hierarchy of sequences and items a DICOM P10 read is
//! currently at, along with the data needed to correctly interpret incoming
//! data elements at that location:
//!
//! 1. The end offsets of defined-length sequences and items, so their
//!    delimiters can be synthesized. All defined lengths are converted to
//!    undefined lengths with explicit delimiters on the way through.
//!
//! 2. The active Specific Character Set used to decode string values that
//!    aren't in UTF-8. Set by the *'(0008,0005) Specific Character Set'* data
//!    element, usually in the root data set, but an item can override it.
//!
//! 3. The values of data elements that determine the VR of later data
//!    elements when the transfer syntax is 'Implicit VR Little Endian', e.g.
//!    *'(0028,0106) Smallest Image Pixel Value'* is `UnsignedShort` or
//!    `SignedShort` depending on *'(0028,0103) Pixel Representation'*.

use std::collections::BTreeMap;

use dcmstream_core::{
  DataElementTag, SharedBytes, SpecificCharacterSet, ValueRepresentation,
  dictionary, utils,
};

use crate::internal::value_length::ValueLength;
use crate::{P10Error, P10Part};

/// A P10 location is a stack of entries, the current one at the end.
///
#[derive(Debug)]
pub struct P10Location {
  entries: Vec<LocationEntry>,
}

/// An entry in a P10 location. The root data set entry is always present at
/// the bottom of the stack, followed by alternating sequences and items.
///
#[derive(Debug)]
enum LocationEntry {
  RootDataSet {
    clarifying_data_elements: ClarifyingDataElements,
    last_data_element_tag: DataElementTag,
  },
  Sequence {
    tag: DataElementTag,
    is_implicit_vr: bool,
    ends_at: Option<u64>,
    item_count: usize,
  },
  Item {
    clarifying_data_elements: ClarifyingDataElements,
    last_data_element_tag: DataElementTag,
    ends_at: Option<u64>,
  },
}

/// The data element values needed to decode non-UTF-8 string data and to
/// infer VRs when the transfer syntax is 'Implicit VR Little Endian'.
///
#[derive(Clone, Debug)]
struct ClarifyingDataElements {
  specific_character_set: SpecificCharacterSet,
  bits_allocated: Option<u16>,
  pixel_representation: Option<u16>,
  private_creators: BTreeMap<DataElementTag, String>,
}

impl Default for ClarifyingDataElements {
  fn default() -> Self {
    Self {
      specific_character_set: SpecificCharacterSet::IsoIr6,
      bits_allocated: None,
      pixel_representation: None,
      private_creators: BTreeMap::new(),
    }
  }
}

impl ClarifyingDataElements {
  fn private_creator_for_tag(&self, tag: DataElementTag) -> Option<&String> {
    if !tag.is_private() {
      return None;
    }

    let private_creator_tag = DataElementTag::new(tag.group, tag.element >> 8);

    self.private_creators.get(&private_creator_tag)
  }
}

/// Returns whether a data element's value needs to be materialized by the
/// read process and added to the location because it clarifies the
/// interpretation of later data elements.
///
pub fn is_clarifying_data_element(tag: DataElementTag) -> bool {
  tag == dictionary::SPECIFIC_CHARACTER_SET.tag
    || tag == dictionary::BITS_ALLOCATED.tag
    || tag == dictionary::PIXEL_REPRESENTATION.tag
    || tag.is_private_creator()
}

impl P10Location {
  /// Creates a new P10 location holding just the root data set entry.
  ///
  pub fn new() -> Self {
    Self {
      entries: vec![LocationEntry::RootDataSet {
        clarifying_data_elements: ClarifyingDataElements::default(),
        last_data_element_tag: DataElementTag::ZERO,
      }],
    }
  }

  /// Checks that a data element tag is greater than the previous tag seen at
  /// the current location. DICOM P10 data stores data elements in ascending
  /// tag order inside each data set and item.
  ///
  /// Enforcing this matters for streaming reads because lower-numbered data
  /// elements are sometimes needed to interpret higher-numbered ones.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn check_data_element_ordering(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(), ()> {
    match self.entries.last_mut() {
      Some(LocationEntry::RootDataSet {
        last_data_element_tag,
        ..
      })
      | Some(LocationEntry::Item {
        last_data_element_tag,
        ..
      }) => {
        if tag > *last_data_element_tag {
          *last_data_element_tag = tag;
          Ok(())
        } else {
          Err(())
        }
      }

      Some(LocationEntry::Sequence { .. }) => Ok(()),

      None => Err(()),
    }
  }

  /// Returns whether a sequence in this location forces the 'Implicit VR
  /// Little Endian' transfer syntax. This happens for sequences read with an
  /// explicit VR of UN and an undefined length.
  ///
  /// Ref: DICOM Correction Proposal CP-246.
  ///
  pub fn is_implicit_vr_forced(&self) -> bool {
    self.entries.iter().any(|entry| {
      matches!(
        entry,
        LocationEntry::Sequence {
          is_implicit_vr: true,
          ..
        }
      )
    })
  }

  /// Swaps the endianness of value bytes for a data element.
  ///
  /// Pixel data with a VR of OW but a bits allocated value of 32 or 64 is a
  /// special case: it actually stores 32/64-bit words, not the 16-bit words
  /// the VR indicates.
  ///
  pub fn swap_endianness(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    data: &mut [u8],
  ) {
    let vr = if vr == ValueRepresentation::OtherWordString
      && tag == dictionary::PIXEL_DATA.tag
    {
      match self.active_clarifying_data_elements().bits_allocated {
        Some(32) => ValueRepresentation::UnsignedLong,
        Some(64) => ValueRepresentation::UnsignedVeryLong,
        _ => vr,
      }
    } else {
      vr
    };

    vr.swap_endianness(data);
  }

  /// Returns the next delimiter part for this location, if there is one. A
  /// delimiter part is due when the bytes read has reached the `ends_at`
  /// offset of the entry at the top of the location stack.
  ///
  /// This is how defined-length sequences and items are converted to
  /// undefined lengths with explicit delimiters.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn next_delimiter_part(&mut self, bytes_read: u64) -> Result<P10Part, ()> {
    match self.entries.last() {
      Some(LocationEntry::Sequence {
        tag,
        ends_at: Some(ends_at),
        ..
      }) if *ends_at <= bytes_read => {
        let tag = *tag;
        self.entries.pop();
        Ok(P10Part::SequenceDelimiter { tag })
      }

      Some(LocationEntry::Item {
        ends_at: Some(ends_at),
        ..
      }) if *ends_at <= bytes_read => {
        self.entries.pop();
        Ok(P10Part::SequenceItemDelimiter)
      }

      _ => Err(()),
    }
  }

  /// Returns the delimiter parts that close out everything currently on the
  /// location stack, regardless of `ends_at` offsets. Used when the incoming
  /// data ends.
  ///
  pub fn pending_delimiter_parts(&self) -> Vec<P10Part> {
    self
      .entries
      .iter()
      .rev()
      .map(|entry| match entry {
        LocationEntry::Sequence { tag, .. } => {
          P10Part::SequenceDelimiter { tag: *tag }
        }
        LocationEntry::Item { .. } => P10Part::SequenceItemDelimiter,
        LocationEntry::RootDataSet { .. } => P10Part::End,
      })
      .collect()
  }

  /// Pushes a new sequence onto this location.
  ///
  pub fn add_sequence(
    &mut self,
    tag: DataElementTag,
    is_implicit_vr: bool,
    ends_at: Option<u64>,
  ) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::RootDataSet { .. })
      | Some(LocationEntry::Item { .. }) => {
        self.entries.push(LocationEntry::Sequence {
          tag,
          is_implicit_vr,
          ends_at,
          item_count: 0,
        });

        Ok(())
      }

      _ => {
        let private_creator = self
          .active_clarifying_data_elements()
          .private_creator_for_tag(tag);

        Err(format!(
          "Sequence data element '{}' encountered outside of the root data \
           set or an item",
          dictionary::tag_with_name(tag, private_creator.map(|x| x.as_str()))
        ))
      }
    }
  }

  /// Pops the current sequence off this location, returning its tag.
  ///
  pub fn end_sequence(&mut self) -> Result<DataElementTag, String> {
    match self.entries.last() {
      Some(LocationEntry::Sequence { tag, .. }) => {
        let tag = *tag;
        self.entries.pop();
        Ok(tag)
      }

      _ => {
        Err("Sequence delimiter encountered outside of a sequence".to_string())
      }
    }
  }

  /// Returns the number of items added to the current sequence so far.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn sequence_item_count(&self) -> Result<usize, ()> {
    match self.entries.last() {
      Some(LocationEntry::Sequence { item_count, .. }) => Ok(*item_count),
      _ => Err(()),
    }
  }

  /// Records that another item was read in the current encapsulated pixel
  /// data sequence. Pixel data items don't go onto the location stack because
  /// they can't nest.
  ///
  pub fn note_pixel_data_item(&mut self) {
    if let Some(LocationEntry::Sequence { item_count, .. }) =
      self.entries.last_mut()
    {
      *item_count += 1;
    }
  }

  /// Pushes a new item onto this location, returning the item's index.
  ///
  pub fn add_item(
    &mut self,
    ends_at: Option<u64>,
    length: ValueLength,
  ) -> Result<usize, String> {
    match self.entries.last_mut() {
      Some(LocationEntry::Sequence { item_count, .. }) => {
        let index = *item_count;

        *item_count += 1;

        // The new item starts with the clarifying data elements active at the
        // current location
        self.entries.push(LocationEntry::Item {
          clarifying_data_elements: self
            .active_clarifying_data_elements()
            .clone(),
          last_data_element_tag: DataElementTag::ZERO,
          ends_at,
        });

        Ok(index)
      }

      _ => Err(format!(
        "Item encountered outside of a sequence, length: {length}",
      )),
    }
  }

  /// Pops the current item off this location.
  ///
  pub fn end_item(&mut self) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::Item { .. }) => {
        self.entries.pop();
        Ok(())
      }

      _ => Err("Item delimiter encountered outside of an item".to_string()),
    }
  }

  /// Returns the clarifying data elements that currently apply.
  ///
  fn active_clarifying_data_elements(&self) -> &ClarifyingDataElements {
    for entry in self.entries.iter().rev() {
      match entry {
        LocationEntry::RootDataSet {
          clarifying_data_elements,
          ..
        }
        | LocationEntry::Item {
          clarifying_data_elements,
          ..
        } => return clarifying_data_elements,

        _ => (),
      }
    }

    unreachable!();
  }

  fn active_clarifying_data_elements_mut(
    &mut self,
  ) -> &mut ClarifyingDataElements {
    for entry in self.entries.iter_mut().rev() {
      match entry {
        LocationEntry::RootDataSet {
          clarifying_data_elements,
          ..
        }
        | LocationEntry::Item {
          clarifying_data_elements,
          ..
        } => return clarifying_data_elements,

        _ => (),
      }
    }

    unreachable!();
  }

  /// Records a clarifying data element's materialized value.
  ///
  /// The only value bytes ever altered are those of the *'(0008,0005)
  /// Specific Character Set'* data element, which is normalized to UTF-8.
  ///
  pub fn add_clarifying_data_element(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    value_bytes: &mut SharedBytes,
  ) -> Result<(), P10Error> {
    if tag == dictionary::SPECIFIC_CHARACTER_SET.tag {
      self.update_specific_character_set(value_bytes)?;
    } else if vr == ValueRepresentation::UnsignedShort {
      let bytes: &[u8] = value_bytes;
      if let Ok(bytes) = TryInto::<[u8; 2]>::try_into(bytes) {
        let value = u16::from_le_bytes(bytes);

        let clarifying_data_elements =
          self.active_clarifying_data_elements_mut();

        if tag == dictionary::BITS_ALLOCATED.tag {
          clarifying_data_elements.bits_allocated = Some(value);
        } else if tag == dictionary::PIXEL_REPRESENTATION.tag {
          clarifying_data_elements.pixel_representation = Some(value);
        }
      }
    } else if vr == ValueRepresentation::LongString && tag.is_private_creator()
    {
      self.update_private_creator(value_bytes, tag);
    }

    Ok(())
  }

  fn update_specific_character_set(
    &mut self,
    value_bytes: &mut SharedBytes,
  ) -> Result<(), P10Error> {
    let specific_character_set =
      core::str::from_utf8(value_bytes).map_err(|_| {
        P10Error::SpecificCharacterSetInvalid {
          specific_character_set: utils::inspect_u8_slice(value_bytes, 64),
          details: "Invalid UTF-8".to_string(),
        }
      })?;

    self
      .active_clarifying_data_elements_mut()
      .specific_character_set = SpecificCharacterSet::from_string(
      specific_character_set,
    )
    .map_err(|_| P10Error::SpecificCharacterSetInvalid {
      specific_character_set: specific_character_set.chars().take(64).collect(),
      details: "".to_string(),
    })?;

    *value_bytes = b"ISO_IR 192".to_vec().into();

    Ok(())
  }

  fn update_private_creator(
    &mut self,
    value_bytes: &[u8],
    tag: DataElementTag,
  ) {
    let private_creator = match core::str::from_utf8(value_bytes) {
      Ok(value) => value.trim_end_matches(' ').to_string(),
      Err(_) => return,
    };

    self
      .active_clarifying_data_elements_mut()
      .private_creators
      .insert(tag, private_creator);
  }

  /// Returns whether the active Specific Character Set is byte compatible
  /// with UTF-8.
  ///
  pub fn is_specific_character_set_utf8_compatible(&self) -> bool {
    self
      .active_clarifying_data_elements()
      .specific_character_set
      .is_utf8_compatible()
  }

  /// Decodes string bytes using the active Specific Character Set and returns
  /// the equivalent UTF-8 bytes, padded to even length for the VR.
  ///
  pub fn decode_string_bytes(
    &self,
    vr: ValueRepresentation,
    value_bytes: &[u8],
  ) -> Vec<u8> {
    let charset = &self
      .active_clarifying_data_elements()
      .specific_character_set;

    let mut bytes = charset.decode_bytes(value_bytes).into_bytes();

    vr.pad_bytes_to_even_length(&mut bytes);

    bytes
  }

  /// Returns the VR for a data element when the transfer syntax is 'Implicit
  /// VR Little Endian'. Most VRs come straight from the dictionary because
  /// the data element has only one allowed VR; the rest are determined from
  /// the clarifying data elements.
  ///
  /// On error, the tag of the clarifying data element that was missing or
  /// invalid is returned.
  ///
  pub fn infer_vr_for_tag(
    &self,
    tag: DataElementTag,
  ) -> Result<ValueRepresentation, DataElementTag> {
    let clarifying_data_elements = self.active_clarifying_data_elements();

    let private_creator = clarifying_data_elements.private_creator_for_tag(tag);

    let allowed_vrs =
      match dictionary::find(tag, private_creator.map(|x| x.as_str())) {
        Ok(item) => item.vrs,
        Err(_) => &[],
      };

    match allowed_vrs {
      [vr] => Ok(*vr),

      // '(7FE0,0010) Pixel Data' can't use OB in an implicit VR transfer
      // syntax. Ref: PS3.5 8.2.
      [
        ValueRepresentation::OtherByteString,
        ValueRepresentation::OtherWordString,
      ] if tag == dictionary::PIXEL_DATA.tag => {
        Ok(ValueRepresentation::OtherWordString)
      }

      // US/SS ambiguity is resolved by '(0028,0103) Pixel Representation'
      [
        ValueRepresentation::UnsignedShort,
        ValueRepresentation::SignedShort,
      ] if tag == dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag
        || tag == dictionary::LARGEST_IMAGE_PIXEL_VALUE.tag
        || tag == dictionary::PIXEL_PADDING_VALUE.tag
        || tag == dictionary::PIXEL_PADDING_RANGE_LIMIT.tag
        || tag == dictionary::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
        || tag == dictionary::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
        || tag == dictionary::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
        || tag == dictionary::LUT_DESCRIPTOR.tag =>
      {
        match clarifying_data_elements.pixel_representation {
          Some(0) => Ok(ValueRepresentation::UnsignedShort),
          Some(1) => Ok(ValueRepresentation::SignedShort),
          _ => Err(dictionary::PIXEL_REPRESENTATION.tag),
        }
      }

      // The raw bytes of '(0028,3006) LUT Data' are the same under both of
      // its VRs, so no decision is needed. OW also covers tightly packed
      // 8-bit LUT data. Ref: PS3.3 C.11.1.1.1.
      [
        ValueRepresentation::UnsignedShort,
        ValueRepresentation::OtherWordString,
      ] if tag == dictionary::LUT_DATA.tag => {
        Ok(ValueRepresentation::OtherWordString)
      }

      // '(60xx,3000) Overlay Data' is always OW in an implicit VR transfer
      // syntax. Ref: PS3.5 8.1.2.
      _ if (0x6000..=0x60FF).contains(&tag.group)
        && tag.group % 2 == 0
        && tag.element == 0x3000 =>
      {
        Ok(ValueRepresentation::OtherWordString)
      }

      _ => Ok(ValueRepresentation::Unknown),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sequence_and_item_tracking_test() {
    let mut location = P10Location::new();

    let sequence_tag = DataElementTag::new(0x0008, 0x1140);

    assert_eq!(location.add_sequence(sequence_tag, false, None), Ok(()));
    assert_eq!(location.sequence_item_count(), Ok(0));

    assert_eq!(location.add_item(None, ValueLength::Undefined), Ok(0));
    assert_eq!(location.end_item(), Ok(()));

    assert_eq!(location.add_item(None, ValueLength::Undefined), Ok(1));
    assert_eq!(location.end_item(), Ok(()));

    assert_eq!(location.end_sequence(), Ok(sequence_tag));

    assert_eq!(
      location.end_sequence(),
      Err("Sequence delimiter encountered outside of a sequence".to_string())
    );
  }

  #[test]
  fn next_delimiter_part_test() {
    let mut location = P10Location::new();

    let sequence_tag = DataElementTag::new(0x0008, 0x1140);

    location.add_sequence(sequence_tag, false, Some(100)).unwrap();

    assert_eq!(location.next_delimiter_part(50), Err(()));
    assert_eq!(
      location.next_delimiter_part(100),
      Ok(P10Part::SequenceDelimiter { tag: sequence_tag })
    );
  }

  #[test]
  fn infer_vr_for_tag_test() {
    let mut location = P10Location::new();

    assert_eq!(
      location.infer_vr_for_tag(dictionary::PATIENT_NAME.tag),
      Ok(ValueRepresentation::PersonName)
    );

    assert_eq!(
      location.infer_vr_for_tag(dictionary::PIXEL_DATA.tag),
      Ok(ValueRepresentation::OtherWordString)
    );

    assert_eq!(
      location.infer_vr_for_tag(dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag),
      Err(dictionary::PIXEL_REPRESENTATION.tag)
    );

    location
      .add_clarifying_data_element(
        dictionary::PIXEL_REPRESENTATION.tag,
        ValueRepresentation::UnsignedShort,
        &mut vec![1, 0].into(),
      )
      .unwrap();

    assert_eq!(
      location.infer_vr_for_tag(dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag),
      Ok(ValueRepresentation::SignedShort)
    );

    assert_eq!(
      location.infer_vr_for_tag(DataElementTag::new(0x6000, 0x3000)),
      Ok(ValueRepresentation::OtherWordString)
    );

    assert_eq!(
      location.infer_vr_for_tag(DataElementTag::new(0x0101, 0x0001)),
      Ok(ValueRepresentation::Unknown)
    );
  }
}
