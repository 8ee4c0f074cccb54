//! Extraction of pixel data frames from a stream of DICOM P10 parts.

use std::collections::VecDeque;

use byteorder::ByteOrder;

use dcmstream_core::{
  DataElementTag, DataElementValue, DataError, DcmstreamError, SharedBytes,
  TransferSyntax, ValueRepresentation, dictionary, transfer_syntax,
};
use dcmstream_p10::{P10Error, P10FilterTransform, P10Part};

use crate::{PixelDataFrame, end_of_image_marker, pixel_data_invalid};

/// Takes a stream of DICOM P10 parts and emits the frames of pixel data it
/// contains. Frames are emitted as soon as their data is available, with no
/// copying of pixel data, so arbitrarily large pixel data streams through in
/// bounded memory.
///
/// Native and encapsulated pixel data are both supported.
///
pub struct P10PixelDataFrameTransform {
  transfer_syntax: &'static TransferSyntax,

  details: FrameDetails,
  detail_capture: Option<DetailCapture>,

  // Selects the '(7FE0,0010) Pixel Data' data element at the root of the
  // data set
  pixel_data_filter: P10FilterTransform,

  is_encapsulated: bool,
  next_frame_index: usize,

  // Native pixel data state: the size of a single frame in bits, the chunks
  // of pixel data not yet emitted paired with the number of bits already
  // consumed from each, and the read/write positions in bits
  native_frame_size: u64,
  native_chunks: VecDeque<(SharedBytes, u64)>,
  native_read_offset: u64,
  native_write_offset: u64,

  // Encapsulated pixel data state: the basic offset table's chunks, the
  // framing mode decided once the basic offset table is complete, the
  // remaining offset table entries, the chunks of the frame currently being
  // assembled, the final bytes of the current fragment, the index of the
  // current item, and the byte offset into the fragment stream
  basic_offset_table_chunks: Vec<SharedBytes>,
  mode: Option<EncapsulatedMode>,
  offset_table: VecDeque<OffsetTableEntry>,
  frame_chunks: Vec<SharedBytes>,
  fragment_tail: [u8; 2],
  item_index: usize,
  fragment_stream_offset: u64,
}

/// An offset table entry: the byte offset of a frame's first item header in
/// the fragment stream, and the frame's exact length when known.
///
type OffsetTableEntry = (u64, Option<u64>);

/// How fragments of encapsulated pixel data are assigned to frames.
///
#[derive(Clone, Copy, Debug, PartialEq)]
enum EncapsulatedMode {
  /// All fragments belong to the one and only frame.
  SingleFrame,

  /// Frame boundaries come from the basic or extended offset table.
  OffsetTable,

  /// A frame ends at each fragment whose data ends with the transfer
  /// syntax's end-of-image marker.
  EndOfImageMarkers { marker: [u8; 2] },

  /// Each fragment is one frame. The fallback for multi-frame pixel data
  /// with no offset table in a transfer syntax without an end-of-image
  /// marker.
  FragmentPerFrame,
}

/// The values of the data elements that describe the pixel data, captured
/// from the part stream as they go past.
///
#[derive(Debug, Default)]
struct FrameDetails {
  rows: Option<u16>,
  columns: Option<u16>,
  samples_per_pixel: Option<u16>,
  bits_allocated: Option<u16>,
  number_of_frames: Option<usize>,
  extended_offset_table: Option<SharedBytes>,
  extended_offset_table_lengths: Option<SharedBytes>,
}

/// A data element of interest whose value bytes are currently being captured
/// from the part stream.
///
struct DetailCapture {
  tag: DataElementTag,
  vr: ValueRepresentation,
  data: Vec<SharedBytes>,
}

/// An error from extracting frames of pixel data out of a stream of DICOM P10
/// parts.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10PixelDataFrameTransformError {
  /// The stream of DICOM P10 parts is invalid.
  P10Error(P10Error),

  /// The data elements describing the pixel data, or the pixel data itself,
  /// are invalid.
  DataError(DataError),
}

impl core::fmt::Display for P10PixelDataFrameTransformError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::P10Error(e) => e.fmt(f),
      Self::DataError(e) => e.fmt(f),
    }
  }
}

impl DcmstreamError for P10PixelDataFrameTransformError {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    match self {
      Self::P10Error(e) => e.to_lines(task_description),
      Self::DataError(e) => e.to_lines(task_description),
    }
  }
}

/// The data elements whose values are captured as they stream past because
/// they are needed to assemble frames.
///
const DETAIL_TAGS: [DataElementTag; 7] = [
  dictionary::SAMPLES_PER_PIXEL.tag,
  dictionary::NUMBER_OF_FRAMES.tag,
  dictionary::ROWS.tag,
  dictionary::COLUMNS.tag,
  dictionary::BITS_ALLOCATED.tag,
  dictionary::EXTENDED_OFFSET_TABLE.tag,
  dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag,
];

impl P10PixelDataFrameTransform {
  /// Creates a new transform for extracting frames of pixel data from a
  /// stream of DICOM P10 parts.
  ///
  pub fn new() -> Self {
    let pixel_data_filter =
      P10FilterTransform::new(Box::new(|tag, _vr, _length, path| {
        tag == dictionary::PIXEL_DATA.tag && path.is_root()
      }));

    Self {
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      details: FrameDetails::default(),
      detail_capture: None,
      pixel_data_filter,
      is_encapsulated: false,
      next_frame_index: 0,
      native_frame_size: 0,
      native_chunks: VecDeque::new(),
      native_read_offset: 0,
      native_write_offset: 0,
      basic_offset_table_chunks: vec![],
      mode: None,
      offset_table: VecDeque::new(),
      frame_chunks: vec![],
      fragment_tail: [0, 0],
      item_index: 0,
      fragment_stream_offset: 0,
    }
  }

  /// Adds the next DICOM P10 part, returning any frames of pixel data that
  /// are now complete.
  ///
  pub fn add_part(
    &mut self,
    part: &P10Part,
  ) -> Result<Vec<PixelDataFrame>, P10PixelDataFrameTransformError> {
    if let P10Part::FileMetaInformation { data_set } = part {
      if let Ok(transfer_syntax) = data_set.get_transfer_syntax() {
        self.transfer_syntax = transfer_syntax;
      }

      return Ok(vec![]);
    }

    if part.is_header_part() {
      return Ok(vec![]);
    }

    let is_pixel_data = self
      .pixel_data_filter
      .add_part(part)
      .map_err(P10PixelDataFrameTransformError::P10Error)?;

    if is_pixel_data {
      self
        .process_pixel_data_part(part)
        .map_err(P10PixelDataFrameTransformError::DataError)
    } else {
      self
        .process_detail_part(part)
        .map_err(P10PixelDataFrameTransformError::DataError)?;

      Ok(vec![])
    }
  }

  /// Returns the number of frames declared by the *'(0028,0008) Number of
  /// Frames'* data element, defaulting to one when it's absent.
  ///
  pub fn number_of_frames(&self) -> usize {
    self.details.number_of_frames.unwrap_or(1)
  }

  /// Captures the values of the data elements that describe the pixel data.
  ///
  fn process_detail_part(&mut self, part: &P10Part) -> Result<(), DataError> {
    match part {
      P10Part::DataElementHeader { tag, vr, path, .. }
        if path.is_root() && DETAIL_TAGS.contains(tag) =>
      {
        self.detail_capture = Some(DetailCapture {
          tag: *tag,
          vr: *vr,
          data: vec![],
        });

        Ok(())
      }

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => {
        let Some(capture) = self.detail_capture.as_mut() else {
          return Ok(());
        };

        capture.data.push(data.clone());

        if *bytes_remaining == 0 {
          let capture = self.detail_capture.take().unwrap();
          self.record_detail(capture)?;
        }

        Ok(())
      }

      _ => Ok(()),
    }
  }

  fn record_detail(&mut self, capture: DetailCapture) -> Result<(), DataError> {
    let bytes = concatenate_chunks(capture.data);
    let value = DataElementValue::new_binary_unchecked(capture.vr, bytes);

    match capture.tag {
      tag if tag == dictionary::ROWS.tag => {
        self.details.rows = Some(value.get_int::<u16>()?);
      }
      tag if tag == dictionary::COLUMNS.tag => {
        self.details.columns = Some(value.get_int::<u16>()?);
      }
      tag if tag == dictionary::SAMPLES_PER_PIXEL.tag => {
        self.details.samples_per_pixel = Some(value.get_int::<u16>()?);
      }
      tag if tag == dictionary::BITS_ALLOCATED.tag => {
        self.details.bits_allocated = Some(value.get_int::<u16>()?);
      }
      tag if tag == dictionary::NUMBER_OF_FRAMES.tag => {
        let number_of_frames = value.get_int::<i64>()?;

        if number_of_frames < 0 {
          return Err(pixel_data_invalid(format!(
            "Number of frames is invalid: {number_of_frames}"
          )));
        }

        self.details.number_of_frames = Some(number_of_frames as usize);
      }
      tag if tag == dictionary::EXTENDED_OFFSET_TABLE.tag => {
        self.details.extended_offset_table = Some(value.bytes()?.clone());
      }
      tag if tag == dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag => {
        self.details.extended_offset_table_lengths =
          Some(value.bytes()?.clone());
      }
      _ => (),
    }

    Ok(())
  }

  /// Processes the next part of the '(7FE0,0010) Pixel Data' data element.
  ///
  fn process_pixel_data_part(
    &mut self,
    part: &P10Part,
  ) -> Result<Vec<PixelDataFrame>, DataError> {
    match part {
      // The start of native pixel data
      P10Part::DataElementHeader { length, .. } => {
        self.is_encapsulated = false;
        self.native_frame_size = self.compute_native_frame_size(*length)?;

        Ok(vec![])
      }

      // The start of encapsulated pixel data. The first item is the basic
      // offset table.
      P10Part::SequenceStart { .. } => {
        self.is_encapsulated = true;

        Ok(vec![])
      }

      P10Part::PixelDataItem { index, .. } => {
        self.item_index = *index;
        self.fragment_tail = [0, 0];

        // The first fragment item follows the completed basic offset table,
        // which decides the framing mode
        if *index == 1 && self.mode.is_none() {
          self.decide_encapsulated_mode()?;
        }

        let mut frames = vec![];

        // An offset table boundary at this item closes the current frame
        if self.mode == Some(EncapsulatedMode::OffsetTable) && *index > 0 {
          let next_frame_offset = self.offset_table.get(1).map(|entry| entry.0);

          if let Some(next_frame_offset) = next_frame_offset {
            if next_frame_offset == self.fragment_stream_offset {
              frames.push(self.take_current_frame(true)?);
            } else if next_frame_offset < self.fragment_stream_offset {
              return Err(pixel_data_invalid(
                "Pixel data offset table is malformed".to_string(),
              ));
            }
          }
        }

        if *index > 0 {
          self.fragment_stream_offset += 8;
        }

        Ok(frames)
      }

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => {
        if !self.is_encapsulated {
          if self.native_frame_size == 0 {
            return Ok(vec![]);
          }

          self.native_chunks.push_back((data.clone(), 0));
          self.native_write_offset += data.len() as u64 * 8;

          return Ok(self.pending_native_frames());
        }

        // The basic offset table's data is accumulated, and the framing mode
        // is decided as soon as it's complete
        if self.item_index == 0 && self.mode.is_none() {
          self.basic_offset_table_chunks.push(data.clone());

          if *bytes_remaining == 0 {
            self.decide_encapsulated_mode()?;
          }

          return Ok(vec![]);
        }

        self.fragment_stream_offset += data.len() as u64;
        self.frame_chunks.push(data.clone());

        update_fragment_tail(&mut self.fragment_tail, data);

        let mut frames = vec![];

        if *bytes_remaining == 0 {
          match self.mode {
            Some(EncapsulatedMode::EndOfImageMarkers { marker })
              if self.fragment_tail == marker =>
            {
              frames.push(self.take_current_frame(false)?);
            }

            Some(EncapsulatedMode::FragmentPerFrame) => {
              frames.push(self.take_current_frame(false)?);
            }

            _ => (),
          }
        }

        Ok(frames)
      }

      // The end of the encapsulated pixel data
      P10Part::SequenceDelimiter { .. } => {
        let mut frames = vec![];

        match self.mode {
          Some(EncapsulatedMode::SingleFrame)
          | Some(EncapsulatedMode::OffsetTable) => {
            if !self.frame_chunks.is_empty() {
              frames.push(self.take_current_frame(true)?);
            }
          }

          Some(EncapsulatedMode::EndOfImageMarkers { .. })
          | Some(EncapsulatedMode::FragmentPerFrame) => {
            let number_of_frames = self.number_of_frames();

            if !self.frame_chunks.is_empty()
              || self.next_frame_index != number_of_frames
            {
              return Err(pixel_data_invalid(format!(
                "Encapsulated pixel data fragments do not divide into {} \
                 frames",
                number_of_frames
              )));
            }
          }

          None => (),
        }

        Ok(frames)
      }

      _ => Ok(vec![]),
    }
  }

  /// Returns the size in bits of a single frame of native pixel data, and
  /// validates the pixel data's total length against it.
  ///
  fn compute_native_frame_size(&self, length: u32) -> Result<u64, DataError> {
    let number_of_frames = self.number_of_frames();

    if number_of_frames == 0 {
      return Ok(0);
    }

    // Bitmap pixel data packs frames together with no byte alignment between
    // them
    if self.details.bits_allocated == Some(1) {
      let rows = self.details.rows.unwrap_or(0) as u64;
      let columns = self.details.columns.unwrap_or(0) as u64;
      let samples = self.details.samples_per_pixel.unwrap_or(1) as u64;

      let frame_size = rows * columns * samples;
      let expected_length = (frame_size * number_of_frames as u64).div_ceil(8);

      if u64::from(length) != expected_length {
        return Err(pixel_data_invalid(format!(
          "Bitmap pixel data has length {} bytes but {} bytes were expected",
          length, expected_length
        )));
      }

      Ok(frame_size)
    } else {
      if length as u64 % number_of_frames as u64 != 0 {
        return Err(pixel_data_invalid(format!(
          "Multi-frame pixel data of length {} bytes does not divide evenly \
           into {} frames",
          length, number_of_frames
        )));
      }

      Ok(u64::from(length) * 8 / number_of_frames as u64)
    }
  }

  /// Emits as many complete frames of native pixel data as the accumulated
  /// chunks allow.
  ///
  fn pending_native_frames(&mut self) -> Vec<PixelDataFrame> {
    let mut frames = vec![];

    let frame_size = self.native_frame_size;

    while self.native_read_offset + frame_size <= self.native_write_offset {
      let mut frame = PixelDataFrame::new();

      frame.set_index(self.next_frame_index);
      frame.set_bit_offset((self.native_read_offset % 8) as usize);

      while (frame.len_in_bits() as u64) < frame_size {
        let (chunk, chunk_offset) = self.native_chunks.pop_front().unwrap();

        let chunk_bits = chunk.len() as u64 * 8 - chunk_offset;
        let bits_needed = frame_size - frame.len_in_bits() as u64;

        if chunk_bits <= bits_needed {
          // The whole remainder of this chunk belongs to the frame
          frame.push_chunk(chunk.drop_front((chunk_offset / 8) as usize));
          self.native_read_offset += chunk_bits;
        } else {
          // Take just the part of this chunk the frame needs, and return the
          // rest for the next frame
          frame.push_chunk(chunk.slice(
            (chunk_offset / 8) as usize,
            (chunk_offset + bits_needed).div_ceil(8) as usize,
          ));

          self
            .native_chunks
            .push_front((chunk, chunk_offset + bits_needed));
          self.native_read_offset += bits_needed;
        }
      }

      // Never emit more frames than '(0028,0008) Number of Frames' declares.
      // Relevant to bitmap pixel data whose trailing unused bits are large
      // enough to hold one or more further frames, which happens when a
      // single frame is under a byte in size.
      if self.next_frame_index < self.number_of_frames() {
        frames.push(frame);
        self.next_frame_index += 1;
      } else {
        break;
      }
    }

    frames
  }

  /// Decides how fragments are assigned to frames once the basic offset
  /// table is complete.
  ///
  fn decide_encapsulated_mode(&mut self) -> Result<(), DataError> {
    let basic_offset_table = self.parse_basic_offset_table()?;
    let extended_offset_table = self.parse_extended_offset_table()?;

    self.mode = Some(if !basic_offset_table.is_empty() {
      // Only one kind of offset table is allowed. Ref: PS3.5 A.4.
      if extended_offset_table.is_some() {
        return Err(pixel_data_invalid(
          "Extended Offset Table must be absent when there is a Basic Offset \
           Table"
            .to_string(),
        ));
      }

      self.offset_table = basic_offset_table;
      EncapsulatedMode::OffsetTable
    } else if let Some(extended_offset_table) = extended_offset_table {
      self.offset_table = extended_offset_table;
      EncapsulatedMode::OffsetTable
    } else if self.number_of_frames() <= 1 {
      EncapsulatedMode::SingleFrame
    } else if let Some(marker) = end_of_image_marker(self.transfer_syntax) {
      EncapsulatedMode::EndOfImageMarkers { marker }
    } else {
      EncapsulatedMode::FragmentPerFrame
    });

    Ok(())
  }

  /// Parses the accumulated basic offset table data into offset table
  /// entries.
  ///
  fn parse_basic_offset_table(
    &mut self,
  ) -> Result<VecDeque<OffsetTableEntry>, DataError> {
    let data =
      concatenate_chunks(core::mem::take(&mut self.basic_offset_table_chunks));

    if data.is_empty() {
      return Ok(VecDeque::new());
    }

    if data.len() % 4 != 0 {
      return Err(pixel_data_invalid(
        "Basic Offset Table length is not a multiple of 4".to_string(),
      ));
    }

    let mut offsets = vec![0u32; data.len() / 4];
    byteorder::LittleEndian::read_u32_into(&data, &mut offsets);

    // The first offset is always zero and offsets always ascend.
    // Ref: PS3.5 A.4.
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

    Ok(
      offsets
        .into_iter()
        .map(|offset| (u64::from(offset), None))
        .collect(),
    )
  }

  /// Parses the *'(7FE0,0001) Extended Offset Table'* and *'(7FE0,0002)
  /// Extended Offset Table Lengths'* values into offset table entries, when
  /// both are present.
  ///
  fn parse_extended_offset_table(
    &self,
  ) -> Result<Option<VecDeque<OffsetTableEntry>>, DataError> {
    let (Some(offsets_bytes), Some(lengths_bytes)) = (
      self.details.extended_offset_table.as_ref(),
      self.details.extended_offset_table_lengths.as_ref(),
    ) else {
      return Ok(None);
    };

    if offsets_bytes.len() % 8 != 0 {
      return Err(pixel_data_invalid(
        "Extended Offset Table has invalid size".to_string(),
      ));
    }

    if lengths_bytes.len() % 8 != 0 {
      return Err(pixel_data_invalid(
        "Extended Offset Table Lengths has invalid size".to_string(),
      ));
    }

    let mut offsets = vec![0u64; offsets_bytes.len() / 8];
    byteorder::LittleEndian::read_u64_into(offsets_bytes, &mut offsets);

    let mut lengths = vec![0u64; lengths_bytes.len() / 8];
    byteorder::LittleEndian::read_u64_into(lengths_bytes, &mut lengths);

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

    if offsets.len() != lengths.len() {
      return Err(pixel_data_invalid(
        "Extended Offset Table and Lengths don't have the same number of \
         items"
          .to_string(),
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

  /// Takes the chunks of the current frame and returns them as a completed
  /// frame. When the frame came from an offset table, the table's entry is
  /// consumed and its length, when known, is applied to the frame.
  ///
  fn take_current_frame(
    &mut self,
    from_offset_table: bool,
  ) -> Result<PixelDataFrame, DataError> {
    let mut frame = PixelDataFrame::new();

    frame.set_index(self.next_frame_index);
    self.next_frame_index += 1;

    for chunk in core::mem::take(&mut self.frame_chunks) {
      frame.push_chunk(chunk);
    }

    if from_offset_table {
      if let Some((_, frame_length)) = self.offset_table.pop_front() {
        if let Some(frame_length) = frame_length {
          apply_length_to_frame(&mut frame, frame_length)?;
        }
      }
    }

    Ok(frame)
  }
}

impl Default for P10PixelDataFrameTransform {
  fn default() -> Self {
    Self::new()
  }
}

/// Joins chunks of shared bytes into one, avoiding a copy when there is only
/// a single chunk.
///
fn concatenate_chunks(chunks: Vec<SharedBytes>) -> SharedBytes {
  match chunks.as_slice() {
    [] => SharedBytes::empty(),
    [chunk] => chunk.clone(),
    _ => {
      let length = chunks.iter().map(|chunk| chunk.len()).sum();
      let mut buffer = Vec::with_capacity(length);

      for chunk in chunks.iter() {
        buffer.extend_from_slice(chunk);
      }

      buffer.into()
    }
  }
}

/// Records the final bytes of the current fragment as its data streams past.
///
fn update_fragment_tail(tail: &mut [u8; 2], data: &SharedBytes) {
  match data.len() {
    0 => (),
    1 => {
      tail[0] = tail[1];
      tail[1] = data[0];
    }
    len => {
      tail[0] = data[len - 2];
      tail[1] = data[len - 1];
    }
  }
}

/// Trims a frame down to the exact length given by an offset table. An offset
/// table length larger than the frame is invalid.
///
fn apply_length_to_frame(
  frame: &mut PixelDataFrame,
  frame_length: u64,
) -> Result<(), DataError> {
  let length = frame.len() as u64;

  if length > frame_length {
    frame.drop_end_bytes((length - frame_length) as usize);
  } else if length < frame_length {
    return Err(pixel_data_invalid(format!(
      "Offset table length value '{}' is invalid for frame of length '{}'",
      frame_length, length
    )));
  }

  Ok(())
}
