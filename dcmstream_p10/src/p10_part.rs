//! The parts that DICOM P10 data is broken into when read or written in a
//! streaming fashion.

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, SharedBytes,
  TransferSyntax, ValueRepresentation, dictionary,
};

use crate::internal::{
  data_element_header::DataElementHeader, value_length::ValueLength,
};

/// A DICOM P10 part is the smallest unit of structured DICOM P10 data. A
/// stream of parts is produced by progressively reading raw DICOM P10 bytes,
/// and can symmetrically be serialized back to bytes, or be built directly
/// from an in-memory data set.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Part {
  /// The 128-byte File Preamble and the "DICM" prefix that start DICOM P10
  /// data. The preamble's content is application-defined and is commonly all
  /// zero.
  ///
  /// When reading DICOM P10 data that has no File Preamble and "DICM" prefix
  /// this part is emitted with all preamble bytes set to zero.
  FilePreambleAndDICMPrefix { preamble: Box<[u8; 128]> },

  /// The File Meta Information, i.e. the group 2 data elements.
  ///
  /// When reading DICOM P10 data that has no File Meta Information this part
  /// is emitted with an empty data set.
  FileMetaInformation { data_set: DataSet },

  /// The start of the next data element. Always followed by one or more
  /// [`P10Part::DataElementValueBytes`] parts carrying the data element's
  /// value bytes.
  DataElementHeader {
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
    path: DataSetPath,
  },

  /// Raw bytes for the value of the current data element. A single data
  /// element's value is split over multiple of these parts when it exceeds
  /// the maximum part size.
  DataElementValueBytes {
    tag: DataElementTag,
    vr: ValueRepresentation,
    data: SharedBytes,
    bytes_remaining: u32,
  },

  /// The start of a new sequence. When this is the start of an encapsulated
  /// pixel data sequence the VR is [`ValueRepresentation::OtherByteString`]
  /// or [`ValueRepresentation::OtherWordString`], otherwise it is
  /// [`ValueRepresentation::Sequence`].
  SequenceStart {
    tag: DataElementTag,
    vr: ValueRepresentation,
    path: DataSetPath,
  },

  /// The end of the current sequence.
  SequenceDelimiter { tag: DataElementTag },

  /// The start of a new item in the current sequence.
  SequenceItemStart { index: usize },

  /// The end of the current sequence item.
  SequenceItemDelimiter,

  /// The start of a new item in the current encapsulated pixel data sequence.
  /// Its data follows in one or more [`P10Part::DataElementValueBytes`]
  /// parts.
  PixelDataItem { index: usize, length: u32 },

  /// The end of the DICOM P10 data. All provided data has been successfully
  /// parsed.
  End,
}

impl core::fmt::Display for P10Part {
  /// Formats a DICOM P10 part as a human-readable string.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      P10Part::FilePreambleAndDICMPrefix { .. } => {
        write!(f, "FilePreambleAndDICMPrefix")
      }

      P10Part::FileMetaInformation { data_set } => {
        let elements = data_set
          .iter()
          .map(|(tag, value)| {
            format!(
              "{}: {}",
              DataElementHeader {
                tag: *tag,
                vr: Some(value.value_representation()),
                length: ValueLength::ZERO,
              },
              value.to_string(*tag, 80)
            )
          })
          .collect::<Vec<String>>()
          .join(", ");

        write!(f, "FileMetaInformation: {elements}")
      }

      P10Part::DataElementHeader {
        tag, vr, length, ..
      } => write!(
        f,
        "DataElementHeader: {}, name: {}, vr: {}, length: {} bytes",
        tag,
        dictionary::tag_name(*tag, None),
        vr,
        length
      ),

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => write!(
        f,
        "DataElementValueBytes: {} bytes of data, {} bytes remaining",
        data.len(),
        bytes_remaining
      ),

      P10Part::SequenceStart { tag, vr, .. } => write!(
        f,
        "SequenceStart: {}, name: {}, vr: {}",
        tag,
        dictionary::tag_name(*tag, None),
        vr,
      ),

      P10Part::SequenceDelimiter { .. } => write!(f, "SequenceDelimiter"),

      P10Part::SequenceItemStart { index } => {
        write!(f, "SequenceItemStart: item {index}")
      }

      P10Part::SequenceItemDelimiter => write!(f, "SequenceItemDelimiter"),

      P10Part::PixelDataItem { index, length } => {
        write!(f, "PixelDataItem: item {index}, {length} bytes")
      }

      P10Part::End => write!(f, "End"),
    }
  }
}

impl P10Part {
  /// Returns whether this part belongs to the file header before the main
  /// data set, i.e. it is a [`P10Part::FilePreambleAndDICMPrefix`] or a
  /// [`P10Part::FileMetaInformation`].
  ///
  pub fn is_header_part(&self) -> bool {
    matches!(
      self,
      P10Part::FilePreambleAndDICMPrefix { .. }
        | P10Part::FileMetaInformation { .. }
    )
  }

  /// When this part is a [`P10Part::FileMetaInformation`], changes the
  /// transfer syntax it declares. Other parts are unchanged.
  ///
  pub fn change_transfer_syntax(
    &mut self,
    new_transfer_syntax: &TransferSyntax,
  ) {
    if let P10Part::FileMetaInformation { data_set } = self {
      data_set
        .insert_string_value(
          &dictionary::TRANSFER_SYNTAX_UID,
          &[new_transfer_syntax.uid],
        )
        .unwrap();
    }
  }
}

/// Converts all data elements in a data set to a stream of DICOM P10 parts
/// returned through a callback.
///
pub fn data_elements_to_parts<E>(
  data_set: &DataSet,
  path: &DataSetPath,
  part_callback: &mut impl FnMut(&P10Part) -> Result<(), E>,
) -> Result<(), E> {
  for (tag, value) in data_set.iter() {
    let mut path = path.clone();
    path.add_data_element(*tag).unwrap();

    data_element_to_parts(*tag, value, &path, part_callback)?;
  }

  Ok(())
}

/// Converts a single data element to DICOM P10 parts returned through a
/// callback.
///
pub fn data_element_to_parts<E>(
  tag: DataElementTag,
  value: &DataElementValue,
  path: &DataSetPath,
  part_callback: &mut impl FnMut(&P10Part) -> Result<(), E>,
) -> Result<(), E> {
  let vr = value.value_representation();

  // Values whose bytes are directly available are written out as-is
  if let Ok(bytes) = value.bytes() {
    part_callback(&P10Part::DataElementHeader {
      tag,
      vr,
      length: bytes.len() as u32,
      path: path.clone(),
    })?;

    part_callback(&P10Part::DataElementValueBytes {
      tag,
      vr,
      data: bytes.clone(),
      bytes_remaining: 0,
    })?;

    return Ok(());
  }

  // Encapsulated pixel data is written as its individual items followed by a
  // sequence delimiter
  if let Ok(items) = value.encapsulated_pixel_data() {
    part_callback(&P10Part::SequenceStart {
      tag,
      vr,
      path: path.clone(),
    })?;

    for (index, item) in items.iter().enumerate() {
      part_callback(&P10Part::PixelDataItem {
        index,
        length: item.len() as u32,
      })?;

      part_callback(&P10Part::DataElementValueBytes {
        tag: dictionary::ITEM.tag,
        vr,
        data: item.clone(),
        bytes_remaining: 0,
      })?;
    }

    part_callback(&P10Part::SequenceDelimiter { tag })?;

    return Ok(());
  }

  // Sequences are written as their item data sets, recursively, followed by
  // a sequence delimiter
  if let Ok(items) = value.sequence_items() {
    part_callback(&P10Part::SequenceStart {
      tag,
      vr,
      path: path.clone(),
    })?;

    for (index, item) in items.iter().enumerate() {
      part_callback(&P10Part::SequenceItemStart { index })?;

      let mut path = path.clone();
      path.add_sequence_item(index).unwrap();

      data_elements_to_parts(item, &path, part_callback)?;

      part_callback(&P10Part::SequenceItemDelimiter)?;
    }

    part_callback(&P10Part::SequenceDelimiter { tag })?;

    return Ok(());
  }

  // One of the branches above always applies
  unreachable!();
}
