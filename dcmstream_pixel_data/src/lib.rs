//! Extraction of the individual frames of image data held in a DICOM data
//! set's *'(7FE0,0010) Pixel Data'* data element.
//!
//! Frames can be extracted from an in-memory data set with
//! [`DataSetPixelDataExtensions::get_pixel_data_frames()`], or streamed
//! directly out of a DICOM P10 part stream with
//! [`P10PixelDataFrameTransform`], which avoids ever holding the whole pixel
//! data element in memory.
//!
//! Frames are delimited and delivered in their stored form. Decoding of
//! compressed frame data is outside the scope of this library.

pub mod p10_pixel_data_frame_transform;
pub mod pixel_data_frame;

use byteorder::ByteOrder;

use dcmstream_core::{
  DataError, DataSet, SharedBytes, TransferSyntax, ValueRepresentation,
  dictionary, transfer_syntax,
};

pub use p10_pixel_data_frame_transform::{
  P10PixelDataFrameTransform, P10PixelDataFrameTransformError,
};
pub use pixel_data_frame::PixelDataFrame;

/// Returns the end-of-image marker that terminates a single frame's bitstream
/// in the given transfer syntax, if it has one. The JPEG, JPEG-LS, and
/// JPEG 2000 families all end an image with the two bytes `FFD9`.
///
pub fn end_of_image_marker(
  transfer_syntax: &TransferSyntax,
) -> Option<[u8; 2]> {
  let has_eoi_marker = transfer_syntax == &transfer_syntax::JPEG_BASELINE_8BIT
    || transfer_syntax == &transfer_syntax::JPEG_EXTENDED_12BIT
    || transfer_syntax == &transfer_syntax::JPEG_LOSSLESS_NON_HIERARCHICAL
    || transfer_syntax == &transfer_syntax::JPEG_LOSSLESS_NON_HIERARCHICAL_SV1
    || transfer_syntax == &transfer_syntax::JPEG_LS_LOSSLESS
    || transfer_syntax == &transfer_syntax::JPEG_LS_LOSSY_NEAR_LOSSLESS
    || transfer_syntax == &transfer_syntax::JPEG_2K_LOSSLESS_ONLY
    || transfer_syntax == &transfer_syntax::JPEG_2K
    || transfer_syntax == &transfer_syntax::JPEG_2K_MULTI_COMPONENT_LOSSLESS_ONLY
    || transfer_syntax == &transfer_syntax::JPEG_2K_MULTI_COMPONENT
    || transfer_syntax == &transfer_syntax::HIGH_THROUGHPUT_JPEG_2K_LOSSLESS_ONLY
    || transfer_syntax
      == &transfer_syntax::HIGH_THROUGHPUT_JPEG_2K_WITH_RPCL_OPTIONS_LOSSLESS_ONLY
    || transfer_syntax == &transfer_syntax::HIGH_THROUGHPUT_JPEG_2K;

  if has_eoi_marker {
    Some([0xFF, 0xD9])
  } else {
    None
  }
}

/// Constructs the error returned when pixel data can't be partitioned into
/// frames.
///
pub(crate) fn pixel_data_invalid(details: String) -> DataError {
  DataError::new_value_invalid(format!("Invalid pixel data: {details}"))
}

/// Adds functions to [`DataSet`] for extracting its frames of pixel data.
///
pub trait DataSetPixelDataExtensions
where
  Self: Sized,
{
  /// Returns all frames of image data in this data set's *'(7FE0,0010) Pixel
  /// Data'* data element, which must be present. Native and encapsulated
  /// pixel data are both supported, and frames share the pixel data's bytes
  /// rather than copying them.
  ///
  /// The *'(0028,0008) Number of Frames'*, *'(0028,0010) Rows'*,
  /// *'(0028,0011) Columns'*, *'(0028,0002) Samples per Pixel'*,
  /// *'(0028,0100) Bits Allocated'*, *'(0002,0010) Transfer Syntax UID'*,
  /// *'(7FE0,0001) Extended Offset Table'*, and *'(7FE0,0002) Extended Offset
  /// Table Lengths'* data elements are consulted when present and relevant.
  ///
  fn get_pixel_data_frames(&self) -> Result<Vec<PixelDataFrame>, DataError>;
}

impl DataSetPixelDataExtensions for DataSet {
  fn get_pixel_data_frames(&self) -> Result<Vec<PixelDataFrame>, DataError> {
    let pixel_data = self.get_value(dictionary::PIXEL_DATA.tag)?;

    let vr = pixel_data.value_representation();
    if vr != ValueRepresentation::OtherByteString
      && vr != ValueRepresentation::OtherWordString
    {
      return Err(DataError::new_value_not_present());
    }

    let number_of_frames: i64 =
      self.get_int_with_default(dictionary::NUMBER_OF_FRAMES.tag, 1)?;

    if number_of_frames < 0 {
      return Err(pixel_data_invalid(format!(
        "Number of frames is invalid: {number_of_frames}"
      )));
    }

    let number_of_frames = number_of_frames as usize;

    // Native pixel data holds all frames in one run of bytes
    if let Ok(bytes) = pixel_data.bytes() {
      let bits_allocated =
        self.get_int_with_default(dictionary::BITS_ALLOCATED.tag, 8u16)?;

      if bits_allocated == 1 {
        return native_bitmap_frames(self, bytes, number_of_frames);
      }

      return native_frames(bytes, number_of_frames);
    }

    // Encapsulated pixel data holds its frames in a list of fragments
    let items = pixel_data.encapsulated_pixel_data()?;

    let [basic_offset_table, fragments @ ..] = items.as_slice() else {
      return Err(pixel_data_invalid(
        "Encapsulated pixel data has no basic offset table item".to_string(),
      ));
    };

    let extended_offset_table = parse_extended_offset_table(self)?;

    if !basic_offset_table.is_empty() {
      if extended_offset_table.is_some() {
        return Err(pixel_data_invalid(
          "Extended Offset Table must be absent when there is a Basic Offset \
           Table"
            .to_string(),
        ));
      }

      let offsets = parse_basic_offset_table(basic_offset_table)?;

      return offset_table_frames(
        fragments,
        &offsets.into_iter().map(|o| (o, None)).collect::<Vec<_>>(),
      );
    }

    if let Some(offset_table) = extended_offset_table {
      return offset_table_frames(fragments, &offset_table);
    }

    // With no offset table, a single frame owns all fragments
    if number_of_frames <= 1 {
      let mut frame = PixelDataFrame::new();
      for fragment in fragments {
        frame.push_chunk(fragment.clone());
      }

      return Ok(vec![frame]);
    }

    // Multiple frames with no offset table are grouped on the transfer
    // syntax's end-of-image marker, when it has one
    let marker = self
      .get_transfer_syntax()
      .ok()
      .and_then(end_of_image_marker);

    if let Some(marker) = marker {
      return end_of_image_marker_frames(fragments, number_of_frames, marker);
    }

    // Without a marker the only usable structure is one fragment per frame
    if fragments.len() == number_of_frames {
      return Ok(
        fragments
          .iter()
          .enumerate()
          .map(|(index, fragment)| {
            let mut frame = PixelDataFrame::new();
            frame.set_index(index);
            frame.push_chunk(fragment.clone());
            frame
          })
          .collect(),
      );
    }

    Err(pixel_data_invalid(
      "Encapsulated pixel data structure can't be determined".to_string(),
    ))
  }
}

/// Splits native pixel data into equally sized frames.
///
fn native_frames(
  bytes: &SharedBytes,
  number_of_frames: usize,
) -> Result<Vec<PixelDataFrame>, DataError> {
  if number_of_frames == 0 {
    return Ok(vec![]);
  }

  if number_of_frames == 1 {
    let mut frame = PixelDataFrame::new();
    frame.push_chunk(bytes.clone());

    return Ok(vec![frame]);
  }

  let frame_size = bytes.len() / number_of_frames;

  if frame_size * number_of_frames != bytes.len() {
    return Err(pixel_data_invalid(format!(
      "Multi-frame pixel data of length {} bytes does not divide evenly into \
       {} frames",
      bytes.len(),
      number_of_frames
    )));
  }

  Ok(
    (0..number_of_frames)
      .map(|index| {
        let mut frame = PixelDataFrame::new();
        frame.set_index(index);
        frame.push_chunk(bytes.slice(index * frame_size, (index + 1) * frame_size));
        frame
      })
      .collect(),
  )
}

/// Splits native 1-bit pixel data into frames. Frames of bitmap data pack
/// together with no byte alignment between them, so a frame can start and end
/// partway through a byte.
///
fn native_bitmap_frames(
  data_set: &DataSet,
  bytes: &SharedBytes,
  number_of_frames: usize,
) -> Result<Vec<PixelDataFrame>, DataError> {
  let rows: u64 = data_set.get_int(dictionary::ROWS.tag)?;
  let columns: u64 = data_set.get_int(dictionary::COLUMNS.tag)?;
  let samples: u64 =
    data_set.get_int_with_default(dictionary::SAMPLES_PER_PIXEL.tag, 1)?;

  let frame_size = rows * columns * samples;
  let expected_length = (frame_size * number_of_frames as u64).div_ceil(8);

  if bytes.len() as u64 != expected_length {
    return Err(pixel_data_invalid(format!(
      "Bitmap pixel data has length {} bytes but {} bytes were expected",
      bytes.len(),
      expected_length
    )));
  }

  Ok(
    (0..number_of_frames)
      .map(|index| {
        let start_bit = index as u64 * frame_size;
        let end_bit = start_bit + frame_size;

        let mut frame = PixelDataFrame::new();
        frame.set_index(index);
        frame.push_chunk(bytes.slice(
          (start_bit / 8) as usize,
          end_bit.div_ceil(8) as usize,
        ));
        frame.set_bit_offset((start_bit % 8) as usize);

        frame
      })
      .collect(),
  )
}

/// Parses a basic offset table's bytes into frame offsets.
///
fn parse_basic_offset_table(bytes: &[u8]) -> Result<Vec<u64>, DataError> {
  if bytes.len() % 4 != 0 {
    return Err(pixel_data_invalid(
      "Basic Offset Table length is not a multiple of 4".to_string(),
    ));
  }

  let mut offsets = vec![0u32; bytes.len() / 4];
  byteorder::LittleEndian::read_u32_into(bytes, &mut offsets);

  if offsets.first() != Some(&0) {
    return Err(pixel_data_invalid(
      "Basic Offset Table first value must be zero".to_string(),
    ));
  }

  if !offsets.windows(2).all(|pair| pair[0] <= pair[1]) {
    return Err(pixel_data_invalid(
      "Basic Offset Table values are not sorted".to_string(),
    ));
  }

  Ok(offsets.into_iter().map(u64::from).collect())
}

/// Parses the *'(7FE0,0001) Extended Offset Table'* and *'(7FE0,0002)
/// Extended Offset Table Lengths'* data elements into frame offsets and
/// lengths, when both are present in the data set.
///
#[allow(clippy::type_complexity)]
fn parse_extended_offset_table(
  data_set: &DataSet,
) -> Result<Option<Vec<(u64, Option<u64>)>>, DataError> {
  let offsets_bytes = match data_set.get_value_bytes(
    dictionary::EXTENDED_OFFSET_TABLE.tag,
    ValueRepresentation::OtherVeryLongString,
  ) {
    Ok(bytes) => bytes,
    Err(e) if e.is_tag_not_present() => return Ok(None),
    Err(e) => return Err(e),
  };

  let lengths_bytes = data_set.get_value_bytes(
    dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag,
    ValueRepresentation::OtherVeryLongString,
  )?;

  if offsets_bytes.len() % 8 != 0 || lengths_bytes.len() % 8 != 0 {
    return Err(pixel_data_invalid(
      "Extended Offset Table has invalid size".to_string(),
    ));
  }

  let mut offsets = vec![0u64; offsets_bytes.len() / 8];
  byteorder::LittleEndian::read_u64_into(offsets_bytes, &mut offsets);

  let mut lengths = vec![0u64; lengths_bytes.len() / 8];
  byteorder::LittleEndian::read_u64_into(lengths_bytes, &mut lengths);

  if offsets.len() != lengths.len() {
    return Err(pixel_data_invalid(
      "Extended Offset Table and Lengths don't have the same number of items"
        .to_string(),
    ));
  }

  if offsets.first().copied().unwrap_or(0) != 0 {
    return Err(pixel_data_invalid(
      "Extended Offset Table first value must be zero".to_string(),
    ));
  }

  if !offsets.windows(2).all(|pair| pair[0] <= pair[1]) {
    return Err(pixel_data_invalid(
      "Extended Offset Table values are not sorted".to_string(),
    ));
  }

  Ok(Some(
    offsets
      .into_iter()
      .zip(lengths)
      .map(|(offset, length)| (offset, Some(length)))
      .collect(),
  ))
}

/// Groups fragments into frames using an offset table. Offsets locate each
/// frame's first item header in the fragment stream, where every fragment
/// contributes its 8-byte item header plus its data.
///
fn offset_table_frames(
  fragments: &[SharedBytes],
  offset_table: &[(u64, Option<u64>)],
) -> Result<Vec<PixelDataFrame>, DataError> {
  let mut frames = Vec::with_capacity(offset_table.len());

  let mut stream_offset = 0u64;
  let mut fragments = fragments.iter();

  for (index, (offset, length)) in offset_table.iter().enumerate() {
    if stream_offset != *offset {
      return Err(pixel_data_invalid(
        "Pixel data offset table is malformed".to_string(),
      ));
    }

    let next_offset = offset_table.get(index + 1).map(|entry| entry.0);

    let mut frame = PixelDataFrame::new();
    frame.set_index(index);

    // Consume fragments until the next frame's offset, or the end of the
    // fragments for the final frame
    loop {
      match next_offset {
        Some(next_offset) if stream_offset >= next_offset => break,
        _ => (),
      }

      let Some(fragment) = fragments.next() else {
        if next_offset.is_none() {
          break;
        }

        return Err(pixel_data_invalid(
          "Pixel data offset table is malformed".to_string(),
        ));
      };

      frame.push_chunk(fragment.clone());
      stream_offset += 8 + fragment.len() as u64;
    }

    if let Some(length) = length {
      let frame_length = frame.len() as u64;

      if frame_length > *length {
        frame.drop_end_bytes((frame_length - *length) as usize);
      } else if frame_length < *length {
        return Err(pixel_data_invalid(format!(
          "Offset table length value '{}' is invalid for frame of length \
           '{}'",
          length, frame_length
        )));
      }
    }

    frames.push(frame);
  }

  Ok(frames)
}

/// Groups fragments into frames by ending a frame at each fragment whose data
/// ends with the given end-of-image marker. The markers must produce exactly
/// the declared number of frames.
///
fn end_of_image_marker_frames(
  fragments: &[SharedBytes],
  number_of_frames: usize,
  marker: [u8; 2],
) -> Result<Vec<PixelDataFrame>, DataError> {
  let mut frames = vec![];
  let mut frame = PixelDataFrame::new();

  for fragment in fragments {
    frame.push_chunk(fragment.clone());

    if fragment.len() >= 2 && fragment[fragment.len() - 2..] == marker {
      frame.set_index(frames.len());
      frames.push(core::mem::replace(&mut frame, PixelDataFrame::new()));
    }
  }

  if !frame.is_empty() || frames.len() != number_of_frames {
    return Err(pixel_data_invalid(format!(
      "Encapsulated pixel data fragments do not divide into {} frames",
      number_of_frames
    )));
  }

  Ok(frames)
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::DataElementValue;

  fn image_data_set(
    number_of_frames: i64,
    bits_allocated: i64,
    transfer_syntax: &TransferSyntax,
  ) -> DataSet {
    let mut data_set = DataSet::new();

    data_set
      .insert_string_value(
        &dictionary::TRANSFER_SYNTAX_UID,
        &[transfer_syntax.uid],
      )
      .unwrap();
    data_set
      .insert_int_value(&dictionary::SAMPLES_PER_PIXEL, &[1])
      .unwrap();
    data_set
      .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[number_of_frames])
      .unwrap();
    data_set.insert_int_value(&dictionary::ROWS, &[2]).unwrap();
    data_set
      .insert_int_value(&dictionary::COLUMNS, &[2])
      .unwrap();
    data_set
      .insert_int_value(&dictionary::BITS_ALLOCATED, &[bits_allocated])
      .unwrap();

    data_set
  }

  #[test]
  fn native_multi_frame_test() {
    let mut data_set = image_data_set(
      3,
      16,
      &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
    );

    let payload: Vec<u8> = (0u8..24).collect();
    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_other_word_string(payload.clone()).unwrap(),
    );

    let frames = data_set.get_pixel_data_frames().unwrap();

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].to_bytes(), payload[0..8].to_vec().into());
    assert_eq!(frames[1].to_bytes(), payload[8..16].to_vec().into());
    assert_eq!(frames[2].to_bytes(), payload[16..24].to_vec().into());
  }

  #[test]
  fn native_indivisible_multi_frame_test() {
    let mut data_set = image_data_set(
      3,
      16,
      &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
    );

    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_other_word_string(vec![0; 22]).unwrap(),
    );

    assert_eq!(
      data_set.get_pixel_data_frames(),
      Err(pixel_data_invalid(
        "Multi-frame pixel data of length 22 bytes does not divide evenly \
         into 3 frames"
          .to_string()
      ))
    );
  }

  #[test]
  fn native_bitmap_frames_test() {
    let mut data_set =
      image_data_set(3, 1, &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN);

    // Three 4-bit frames pack into two bytes: 0b1101_0011, 0b0000_1010
    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_other_word_string(vec![0b1101_0011, 0b0000_1010])
        .unwrap(),
    );

    let frames = data_set.get_pixel_data_frames().unwrap();

    assert_eq!(frames.len(), 3);

    assert_eq!(frames[0].bit_offset(), 0);
    assert_eq!(frames[0].len_in_bits(), 8);

    assert_eq!(frames[1].bit_offset(), 4);
    assert_eq!(frames[1].to_bytes()[0] & 0x0F, 0b1101);

    assert_eq!(frames[2].bit_offset(), 0);
    assert_eq!(frames[2].to_bytes()[0] & 0x0F, 0b1010);
  }

  #[test]
  fn encapsulated_single_frame_test() {
    let mut data_set =
      image_data_set(1, 8, &transfer_syntax::JPEG_BASELINE_8BIT);

    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_encapsulated_pixel_data(
        ValueRepresentation::OtherByteString,
        vec![
          SharedBytes::empty(),
          vec![1, 2].into(),
          vec![3, 4].into(),
        ],
      )
      .unwrap(),
    );

    let frames = data_set.get_pixel_data_frames().unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].to_bytes(), vec![1, 2, 3, 4].into());
  }

  #[test]
  fn encapsulated_eoi_marker_frames_test() {
    let mut data_set =
      image_data_set(2, 8, &transfer_syntax::JPEG_BASELINE_8BIT);

    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_encapsulated_pixel_data(
        ValueRepresentation::OtherByteString,
        vec![
          SharedBytes::empty(),
          vec![1, 2, 0xFF, 0xD9].into(),
          vec![5, 6].into(),
          vec![7, 8, 0xFF, 0xD9].into(),
        ],
      )
      .unwrap(),
    );

    let frames = data_set.get_pixel_data_frames().unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].to_bytes(), vec![1, 2, 0xFF, 0xD9].into());
    assert_eq!(frames[1].len(), 6);
    assert_eq!(frames[1].to_bytes(), vec![5, 6, 7, 8, 0xFF, 0xD9].into());
  }

  #[test]
  fn encapsulated_basic_offset_table_test() {
    let mut data_set =
      image_data_set(2, 8, &transfer_syntax::JPEG_BASELINE_8BIT);

    // The second frame starts after the first two fragments, i.e. at offset
    // 8 + 2 + 8 + 4 = 22
    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_encapsulated_pixel_data(
        ValueRepresentation::OtherByteString,
        vec![
          vec![0, 0, 0, 0, 22, 0, 0, 0].into(),
          vec![1, 2].into(),
          vec![3, 4, 5, 6].into(),
          vec![7, 8].into(),
        ],
      )
      .unwrap(),
    );

    let frames = data_set.get_pixel_data_frames().unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].to_bytes(), vec![1, 2, 3, 4, 5, 6].into());
    assert_eq!(frames[1].to_bytes(), vec![7, 8].into());
  }

  #[test]
  fn encapsulated_extended_offset_table_test() {
    let mut data_set =
      image_data_set(2, 8, &transfer_syntax::JPEG_BASELINE_8BIT);

    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_encapsulated_pixel_data(
        ValueRepresentation::OtherByteString,
        vec![
          SharedBytes::empty(),
          vec![1, 2, 3, 4].into(),
          vec![5, 6].into(),
        ],
      )
      .unwrap(),
    );

    // The second frame starts at offset 8 + 4 = 12. The first frame's exact
    // length is 3 bytes, one less than its fragment due to padding.
    data_set.insert(
      dictionary::EXTENDED_OFFSET_TABLE.tag,
      DataElementValue::new_other_very_long_string(vec![
        0, 0, 0, 0, 0, 0, 0, 0, 12, 0, 0, 0, 0, 0, 0, 0,
      ])
      .unwrap(),
    );
    data_set.insert(
      dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag,
      DataElementValue::new_other_very_long_string(vec![
        3, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0,
      ])
      .unwrap(),
    );

    let frames = data_set.get_pixel_data_frames().unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].to_bytes(), vec![1, 2, 3].into());
    assert_eq!(frames[1].to_bytes(), vec![5, 6].into());
  }
}
