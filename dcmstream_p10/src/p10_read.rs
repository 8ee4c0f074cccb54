//! Converts incoming chunks of raw DICOM P10 data into DICOM P10 parts.
//!
//! The conversion is streaming: chunks of raw bytes are written to a read
//! context, and DICOM P10 parts become readable as their data arrives. See
//! [`P10Part`] for the parts that are emitted.
//!
//! There is no requirement to stream, however. DICOM P10 data that is already
//! fully in memory can be written to a new read context as one final chunk
//! and then have all of its parts read out.
//!
//! Memory usage during a read is controlled with [`P10ReadConfig`].

use byteorder::ByteOrder;

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, SharedBytes,
  TransferSyntax, ValueRepresentation, character_set, dictionary,
  transfer_syntax,
};

use crate::internal::byte_stream::{ByteStream, ByteStreamError};
use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::internal::p10_location::{self, P10Location};
use crate::{
  P10Error, P10Part, P10ReadConfig, internal::value_length::ValueLength,
};

/// The state of an in-progress DICOM P10 read. Raw bytes are added with
/// [`Self::write_bytes`] and parts are read out with [`Self::read_parts`].
///
#[derive(Debug)]
pub struct P10ReadContext {
  config: P10ReadConfig,
  stream: ByteStream,
  next_step: NextStep,
  transfer_syntax: &'static TransferSyntax,
  path: DataSetPath,
  location: P10Location,
  has_emitted_specific_character_set: bool,
}

/// What a read context will attempt to read next from its byte stream.
///
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
enum NextStep {
  ReadFilePreambleAndDICMPrefix,
  ReadFileMetaInformation {
    starts_at: u64,
    ends_at: Option<u64>,
    data_set: DataSet,
  },
  ReadDataElementHeader,
  ReadDataElementValueBytes {
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
    bytes_remaining: u32,
    emit_parts: bool,
  },
  ReadPixelDataItem {
    vr: ValueRepresentation,
  },
}

impl P10ReadContext {
  /// Creates a new read context for reading DICOM P10 data.
  ///
  pub fn new(config: Option<P10ReadConfig>) -> P10ReadContext {
    P10ReadContext {
      config: config.unwrap_or_default(),
      stream: ByteStream::new(),
      next_step: NextStep::ReadFilePreambleAndDICMPrefix,
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      path: DataSetPath::new(),
      location: P10Location::new(),
      has_emitted_specific_character_set: false,
    }
  }

  /// Sets the transfer syntax to use when the DICOM P10 data doesn't declare
  /// one in its File Meta Information, or has no File Meta Information at
  /// all. Must be set before any parts are read.
  ///
  /// The default is 'Implicit VR Little Endian'.
  ///
  pub fn set_fallback_transfer_syntax(
    &mut self,
    transfer_syntax: &'static TransferSyntax,
  ) {
    self.transfer_syntax = transfer_syntax;
  }

  /// Returns the transfer syntax for this read context. It starts as the
  /// fallback transfer syntax and is updated when one is read from the File
  /// Meta Information.
  ///
  pub fn transfer_syntax(&self) -> &TransferSyntax {
    self.transfer_syntax
  }

  /// Writes raw DICOM P10 bytes to this read context for parsing by
  /// subsequent calls to [`Self::read_parts()`]. Passing `done` as true
  /// signals the end of the DICOM P10 data, after which further writes error.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: SharedBytes,
    done: bool,
  ) -> Result<(), P10Error> {
    self.stream.write(bytes, done).map_err(|e| {
      self.map_byte_stream_error(e, "Writing data to DICOM P10 read context")
    })
  }

  /// Reads the next DICOM P10 parts out of this read context. On success,
  /// zero or more parts are returned and this function can be called again
  /// for further parts.
  ///
  /// A [`P10Error::DataRequired`] error means no further parts can be read
  /// until more data is supplied with [`Self::write_bytes`].
  ///
  pub fn read_parts(&mut self) -> Result<Vec<P10Part>, P10Error> {
    match self.next_step {
      NextStep::ReadFilePreambleAndDICMPrefix => {
        self.read_file_preamble_and_dicm_prefix_part()
      }

      NextStep::ReadFileMetaInformation { .. } => {
        self.read_file_meta_information_part()
      }

      NextStep::ReadDataElementHeader => {
        // Emit a delimiter part for a defined-length sequence or item if one
        // is due
        if let Some(part) = self.next_delimiter_part() {
          return Ok(vec![part]);
        }

        // Detect the end of the DICOM data
        if self.stream.is_fully_consumed() {
          // Close out any active sequences and items. There is deliberately
          // no check that all sequences and items were explicitly ended, so
          // P10 data truncated on a data element boundary reads without
          // error.
          Ok(self.location.pending_delimiter_parts())
        } else {
          let is_at_root = self.path.len() == 0;

          let (mut parts, tag) = self.read_data_element_header_part()?;

          // Ensure a Specific Character Set data element is emitted even when
          // the input data doesn't have one
          if !self.has_emitted_specific_character_set
            && is_at_root
            && tag >= dictionary::SPECIFIC_CHARACTER_SET.tag
          {
            if tag > dictionary::SPECIFIC_CHARACTER_SET.tag {
              parts.splice(0..0, Self::specific_character_set_utf8_parts());
            }

            self.has_emitted_specific_character_set = true;
          }

          Ok(parts)
        }
      }

      NextStep::ReadDataElementValueBytes {
        tag,
        vr,
        length,
        bytes_remaining,
        emit_parts,
      } => self.read_data_element_value_bytes_part(
        tag,
        vr,
        length,
        bytes_remaining,
        emit_parts,
      ),

      NextStep::ReadPixelDataItem { vr } => self.read_pixel_data_item_part(vr),
    }
  }

  /// Returns the delimiter part that is due at the current read offset, if
  /// any.
  ///
  fn next_delimiter_part(&mut self) -> Option<P10Part> {
    let bytes_read = self.stream.bytes_read();

    match self.location.next_delimiter_part(bytes_read) {
      Ok(part) => {
        if matches!(part, P10Part::SequenceDelimiter { .. })
          || part == P10Part::SequenceItemDelimiter
        {
          self.path.pop().unwrap();
        }

        Some(part)
      }

      Err(()) => None,
    }
  }

  /// Reads the 128-byte File Preamble and the "DICM" prefix that follows it.
  /// When the "DICM" bytes aren't at the expected offset the File Preamble is
  /// taken to be absent and a zeroed preamble is emitted instead.
  ///
  fn read_file_preamble_and_dicm_prefix_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let preamble = match self.stream.peek(132) {
      Ok(data) => {
        if &data[128..132] == b"DICM" {
          self.stream.read(132).map_err(|e| {
            self.map_byte_stream_error(e, "Reading file header")
          })?;

          let mut preamble = [0u8; 128];
          preamble.copy_from_slice(&data[0..128]);

          Ok(Box::new(preamble))
        } else if self.config.require_dicm_prefix {
          Err(P10Error::DicmPrefixNotPresent)
        } else {
          Ok(Box::new([0u8; 128]))
        }
      }

      // Data that ends before 132 bytes has no File Preamble at all
      Err(ByteStreamError::DataEnd) if !self.config.require_dicm_prefix => {
        Ok(Box::new([0u8; 128]))
      }

      Err(e) => Err(self.map_byte_stream_error(e, "Reading file header")),
    }?;

    self.next_step = NextStep::ReadFileMetaInformation {
      starts_at: self.stream.bytes_read(),
      ends_at: None,
      data_set: DataSet::new(),
    };

    Ok(vec![P10Part::FilePreambleAndDICMPrefix { preamble }])
  }

  /// Reads the File Meta Information into a data set and emits its part once
  /// complete. A *'(0002,0000) File Meta Information Group Length'* data
  /// element, when present, determines where the File Meta Information ends.
  /// When absent, data elements are read until one outside group 0x0002 is
  /// seen.
  ///
  fn read_file_meta_information_part(
    &mut self,
  ) -> Result<Vec<P10Part>, P10Error> {
    let NextStep::ReadFileMetaInformation {
      starts_at,
      ends_at,
      data_set: fmi_data_set,
    } = &mut self.next_step
    else {
      unreachable!();
    };

    loop {
      if let Some(ends_at) = ends_at {
        if self.stream.bytes_read() >= *ends_at {
          break;
        }
      }

      // Peek the 8 bytes holding the tag, the VR, and, for VRs with a 16-bit
      // length field, the value length
      let data = self.stream.peek(8).map_err(|e| {
        map_byte_stream_error(
          e,
          "Reading File Meta Information",
          &self.stream,
          &self.path,
        )
      })?;

      let tag = DataElementTag::new(
        byteorder::LittleEndian::read_u16(&data[0..2]),
        byteorder::LittleEndian::read_u16(&data[2..4]),
      );

      // When there's no group length, the first data element outside group
      // 0x0002 ends the File Meta Information
      if tag.group != 0x0002 && ends_at.is_none() {
        break;
      }

      // When there is a group length, a data element outside group 0x0002
      // inside it makes the File Meta Information invalid
      if tag.group != 0x0002 && ends_at.is_some() {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Data element in File Meta Information does not have the \
            group 0x0002"
            .to_string(),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      let vr = ValueRepresentation::from_bytes(&data[4..6]).map_err(|_| {
        P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Data element has invalid VR".to_string(),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        }
      })?;

      // Sequences aren't allowed in File Meta Information
      if vr == ValueRepresentation::Sequence {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Data element in File Meta Information is a sequence"
            .to_string(),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      // Read the value length as either 16-bit or 32-bit depending on the VR
      let (value_offset, value_length) =
        match DataElementHeader::value_length_size(vr) {
          ValueLengthSize::U16 => Ok((
            8usize,
            usize::from(byteorder::LittleEndian::read_u16(&data[6..8])),
          )),

          ValueLengthSize::U32 => match self.stream.peek(12) {
            Ok(data) => Ok((
              12usize,
              byteorder::LittleEndian::read_u32(&data[8..12]) as usize,
            )),
            Err(e) => Err(map_byte_stream_error(
              e,
              "Reading File Meta Information",
              &self.stream,
              &self.path,
            )),
          },
        }?;

      let data_element_size = value_offset + value_length;

      // The whole File Meta Information must stay under the max part size
      if fmi_data_set.total_byte_size() + data_element_size as u64
        > u64::from(self.config.max_part_size)
      {
        return Err(P10Error::MaximumExceeded {
          details: format!(
            "File Meta Information exceeds the max part size of {} bytes",
            self.config.max_part_size
          ),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      let data = self.stream.read(data_element_size).map_err(|e| {
        map_byte_stream_error(
          e,
          "Reading File Meta Information data element value",
          &self.stream,
          &self.path,
        )
      })?;

      let value =
        DataElementValue::new_binary_unchecked(vr, data.drop_front(value_offset));

      // The group length data element determines the end offset of the File
      // Meta Information. It isn't added to the data set.
      if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag {
        if ends_at.is_none() && fmi_data_set.is_empty() {
          match value.get_int::<u32>() {
            Ok(group_length) => {
              *ends_at = Some(*starts_at + 12 + u64::from(group_length));
            }
            Err(_) => {
              return Err(P10Error::DataInvalid {
                when: "Reading File Meta Information".to_string(),
                details: format!(
                  "Group length is invalid: {:?}",
                  value.to_string(DataElementTag::ZERO, 80)
                ),
                path: DataSetPath::new_with_data_element(tag),
                offset: self.stream.bytes_read(),
              });
            }
          }
        }

        continue;
      }

      // Update the active transfer syntax when it is specified
      if tag == dictionary::TRANSFER_SYNTAX_UID.tag {
        self.transfer_syntax = match value.get_string() {
          Ok(uid) => TransferSyntax::from_uid(uid).map_err(|_| {
            P10Error::TransferSyntaxNotSupported {
              transfer_syntax_uid: uid.to_string(),
            }
          }),

          Err(e) => Err(P10Error::DataInvalid {
            when: "Reading File Meta Information".to_string(),
            details: e.to_string(),
            path: DataSetPath::new_with_data_element(
              dictionary::TRANSFER_SYNTAX_UID.tag,
            ),
            offset: self.stream.bytes_read(),
          }),
        }?;
      }

      fmi_data_set.insert(tag, value);
    }

    // For a deflated transfer syntax everything after the File Meta
    // Information passes through zlib inflate
    if self.transfer_syntax.is_deflated {
      self.stream.start_zlib_inflate();
    }

    // Reflect the final transfer syntax in the emitted File Meta Information
    if self.transfer_syntax != &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN {
      fmi_data_set
        .insert_string_value(
          &dictionary::TRANSFER_SYNTAX_UID,
          &[self.transfer_syntax.uid],
        )
        .unwrap();
    }

    let part = P10Part::FileMetaInformation {
      data_set: core::mem::take(fmi_data_set),
    };

    self.next_step = NextStep::ReadDataElementHeader;

    Ok(vec![part])
  }

  fn read_data_element_header_part(
    &mut self,
  ) -> Result<(Vec<P10Part>, DataElementTag), P10Error> {
    let header = self.read_data_element_header()?;

    // A VR of UN (Unknown) is inferred where possible
    let vr = match header.vr {
      Some(ValueRepresentation::Unknown) => {
        Some(self.location.infer_vr_for_tag(header.tag).map_err(
          |missing_tag| P10Error::DataInvalid {
            when: format!(
              "Inferring VR for data element '{}'",
              dictionary::tag_with_name(header.tag, None)
            ),
            details: format!(
              "The value for the '{}' data element is missing or invalid",
              dictionary::tag_with_name(missing_tag, None)
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          },
        )?)
      }
      vr => vr,
    };

    match (header.tag, vr, header.length) {
      // The start of a new sequence
      (tag, Some(ValueRepresentation::Sequence), _)
      | (tag, Some(ValueRepresentation::Unknown), ValueLength::Undefined) => {
        self.check_data_element_ordering(&header)?;

        let ends_at = match header.length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        // A sequence read from an explicit VR of UN with undefined length
        // must have its content read as 'Implicit VR Little Endian'.
        // Ref: DICOM Correction Proposal CP-246.
        let is_implicit_vr = header.vr == Some(ValueRepresentation::Unknown);

        self
          .location
          .add_sequence(tag, is_implicit_vr, ends_at)
          .map_err(|details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        if self.path.len() / 2 >= self.config.max_sequence_depth {
          return Err(P10Error::MaximumExceeded {
            details: "Maximum allowed sequence depth reached".to_string(),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        self.path.add_data_element(tag).unwrap();

        Ok((
          vec![P10Part::SequenceStart {
            tag,
            vr: ValueRepresentation::Sequence,
            path: self.path.clone(),
          }],
          header.tag,
        ))
      }

      // The start of a new sequence item
      (tag, None, _) if tag == dictionary::ITEM.tag => {
        let ends_at = match header.length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        let index = self.location.add_item(ends_at, header.length).map_err(
          |details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          },
        )?;

        self.path.add_sequence_item(index).unwrap();

        Ok((vec![P10Part::SequenceItemStart { index }], header.tag))
      }

      // The start of an encapsulated pixel data sequence
      (tag, Some(vr), ValueLength::Undefined)
        if tag == dictionary::PIXEL_DATA.tag
          && (vr == ValueRepresentation::OtherByteString
            || vr == ValueRepresentation::OtherWordString) =>
      {
        self.check_data_element_ordering(&header)?;

        self
          .location
          .add_sequence(tag, false, None)
          .map_err(|details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        self.path.add_data_element(tag).unwrap();

        self.next_step = NextStep::ReadPixelDataItem { vr };

        Ok((
          vec![P10Part::SequenceStart {
            tag,
            vr,
            path: self.path.clone(),
          }],
          header.tag,
        ))
      }

      // A sequence delimiter ends the current sequence
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag =>
      {
        let parts = if let Ok(tag) = self.location.end_sequence() {
          self.path.pop().unwrap();

          vec![P10Part::SequenceDelimiter { tag }]
        } else {
          // A sequence delimiter outside of a sequence is skipped rather than
          // erroring. Such rogue delimiters occur in the wild and skipping
          // them lets that data be read.
          vec![]
        };

        Ok((parts, header.tag))
      }

      // An item delimiter ends the current item
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::ITEM_DELIMITATION_ITEM.tag =>
      {
        self
          .location
          .end_item()
          .map_err(|details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        self.path.pop().unwrap();

        Ok((vec![P10Part::SequenceItemDelimiter], header.tag))
      }

      // All other data elements have their value bytes read next
      (tag, Some(vr), ValueLength::Defined { length }) => {
        self.check_data_element_ordering(&header)?;

        // Data element values are always an even number of bytes
        if length % 2 == 1 {
          return Err(P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details: format!(
              "Data element '{}' has odd length {} bytes",
              header, length
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        let materialized_value_required =
          self.is_materialized_value_required(tag, vr);

        // A materialized value must fit under the max string size
        if materialized_value_required && length > self.config.max_string_size {
          return Err(P10Error::MaximumExceeded {
            details: format!(
              "Value for '{}' with VR {} and length {} bytes exceeds the \
               maximum allowed string size of {} bytes",
              dictionary::tag_with_name(tag, None),
              vr,
              length,
              self.config.max_string_size
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        self
          .path
          .add_data_element(tag)
          .map_err(|_| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details: format!(
              "Data element '{}' is not valid for the current path",
              header
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        // The '(FFFC,FFFC) Data Set Trailing Padding' data element and group
        // length data elements (element 0x0000) are swallowed without
        // emitting parts. Ref: PS3.10 7.2, PS3.5 7.2.
        let emit_parts = tag != dictionary::DATA_SET_TRAILING_PADDING.tag
          && tag.element != 0x0000;

        // For a materialized value the header part is emitted only once all
        // the data is in, because conversion to UTF-8 can change the value
        // length
        let parts = if emit_parts && !materialized_value_required {
          vec![P10Part::DataElementHeader {
            tag,
            vr,
            length,
            path: self.path.clone(),
          }]
        } else {
          vec![]
        };

        self.next_step = NextStep::ReadDataElementValueBytes {
          tag,
          vr,
          length,
          bytes_remaining: length,
          emit_parts,
        };

        Ok((parts, header.tag))
      }

      (_, _, _) => Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!("Invalid data element '{}'", header),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      }),
    }
  }

  /// Returns the two parts for a '(0008,0005) Specific Character Set' data
  /// element declaring UTF-8 (ISO_IR 192).
  ///
  fn specific_character_set_utf8_parts() -> [P10Part; 2] {
    let tag = dictionary::SPECIFIC_CHARACTER_SET.tag;
    let vr = ValueRepresentation::CodeString;
    let data = b"ISO_IR 192";

    [
      P10Part::DataElementHeader {
        tag,
        vr,
        length: data.len() as u32,
        path: DataSetPath::new_with_data_element(tag),
      },
      P10Part::DataElementValueBytes {
        tag,
        vr,
        data: data.to_vec().into(),
        bytes_remaining: 0,
      },
    ]
  }

  /// Reads a data element header. Depending on the transfer syntax and, for
  /// explicit VR transfer syntaxes, the VR itself, this consumes 8 or 12
  /// bytes.
  ///
  fn read_data_element_header(&mut self) -> Result<DataElementHeader, P10Error> {
    let transfer_syntax = self.active_transfer_syntax();

    // Peek the 4 tag bytes
    let tag = match self.stream.peek(4) {
      Ok(data) => {
        let (group, element) = match transfer_syntax.endianness {
          transfer_syntax::Endianness::LittleEndian => (
            byteorder::LittleEndian::read_u16(&data[0..2]),
            byteorder::LittleEndian::read_u16(&data[2..4]),
          ),

          transfer_syntax::Endianness::BigEndian => (
            byteorder::BigEndian::read_u16(&data[0..2]),
            byteorder::BigEndian::read_u16(&data[2..4]),
          ),
        };

        Ok(DataElementTag::new(group, element))
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }?;

    // Items and delimiters never have an explicit VR
    let vr_serialization = if tag == dictionary::ITEM.tag
      || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
      || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
    {
      transfer_syntax::VrSerialization::VrImplicit
    } else {
      transfer_syntax.vr_serialization
    };

    // File Meta Information data elements aren't allowed in the root of the
    // main data set. They are tolerated inside sequence items because a
    // TransferSyntaxUID there has been seen in the wild, invalid though it
    // is.
    if tag.group == 0x0002
      && self.path.is_root()
      && !matches!(self.next_step, NextStep::ReadFileMetaInformation { .. })
    {
      return Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "File Meta Information data element '{}' found in the main data \
           set",
          tag
        ),
        path: DataSetPath::new_with_data_element(tag),
        offset: self.stream.bytes_read(),
      });
    }

    match vr_serialization {
      transfer_syntax::VrSerialization::VrExplicit => {
        self.read_explicit_vr_and_length(tag)
      }
      transfer_syntax::VrSerialization::VrImplicit => {
        self.read_implicit_vr_and_length(tag)
      }
    }
  }

  /// Checks that a data element tag is greater than the previous tag at the
  /// current location, when the read config requires ordering.
  ///
  fn check_data_element_ordering(
    &mut self,
    header: &DataElementHeader,
  ) -> Result<(), P10Error> {
    if !self.config.require_ordered_data_elements {
      return Ok(());
    }

    self
      .location
      .check_data_element_ordering(header.tag)
      .map_err(|_| P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!("Data element '{}' is not in ascending order", header),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      })
  }

  /// Returns the transfer syntax to decode the current data with. This is the
  /// declared transfer syntax, except where 'Implicit VR Little Endian' is
  /// forced by an explicit VR of UN with undefined length.
  ///
  /// Ref: DICOM Correction Proposal CP-246.
  ///
  fn active_transfer_syntax(&self) -> &'static TransferSyntax {
    if self.location.is_implicit_vr_forced() {
      &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
    } else {
      self.transfer_syntax
    }
  }

  /// Reads the value length following a data element tag when the VR is
  /// implicit.
  ///
  fn read_implicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<DataElementHeader, P10Error> {
    match self.stream.read(8) {
      Ok(data) => {
        let length = match self.active_transfer_syntax().endianness {
          transfer_syntax::Endianness::LittleEndian => {
            byteorder::LittleEndian::read_u32(&data[4..8])
          }
          transfer_syntax::Endianness::BigEndian => {
            byteorder::BigEndian::read_u32(&data[4..8])
          }
        };

        // Items and delimiters have no VR. All other tags start as UN
        // (Unknown) and have their VR inferred from the dictionary and the
        // clarifying data elements.
        let vr = if tag == dictionary::ITEM.tag
          || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
          || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
        {
          None
        } else {
          Some(ValueRepresentation::Unknown)
        };

        Ok(DataElementHeader {
          tag,
          vr,
          length: ValueLength::new(length),
        })
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }
  }

  /// Reads the explicit VR and value length following a data element tag.
  ///
  fn read_explicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<DataElementHeader, P10Error> {
    // Peek and validate the explicit VR
    let vr = match self.stream.peek(6) {
      Ok(data) => {
        let vr_bytes = &data[4..6];

        match ValueRepresentation::from_bytes(vr_bytes) {
          Ok(vr) => Ok(vr),

          // A VR of two spaces or two NUL bytes is treated as UN and inferred
          // in due course. Not part of the standard, but seen in the wild.
          _ => match vr_bytes {
            [0x00, 0x00] | [0x20, 0x20] => Ok(ValueRepresentation::Unknown),

            _ => Err(P10Error::DataInvalid {
              when: "Reading data element VR".to_string(),
              details: format!(
                "Unrecognized VR {:?} for tag '{}'",
                vr_bytes,
                dictionary::tag_with_name(tag, None)
              ),
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            }),
          },
        }
      }

      Err(e) => Err(
        self.map_byte_stream_error(e, "Reading explicit VR data element header"),
      ),
    }?;

    // The header size depends on whether the VR uses a 16-bit or 32-bit
    // length field
    let header_size = match DataElementHeader::value_length_size(vr) {
      ValueLengthSize::U16 => 8,
      ValueLengthSize::U32 => 12,
    };

    match self.stream.read(header_size) {
      Ok(data) => {
        let length = match header_size {
          12 => match self.active_transfer_syntax().endianness {
            transfer_syntax::Endianness::LittleEndian => {
              byteorder::LittleEndian::read_u32(&data[8..12])
            }
            transfer_syntax::Endianness::BigEndian => {
              byteorder::BigEndian::read_u32(&data[8..12])
            }
          },
          _ => match self.active_transfer_syntax().endianness {
            transfer_syntax::Endianness::LittleEndian => {
              byteorder::LittleEndian::read_u16(&data[6..8]).into()
            }
            transfer_syntax::Endianness::BigEndian => {
              byteorder::BigEndian::read_u16(&data[6..8]).into()
            }
          },
        };

        Ok(DataElementHeader {
          tag,
          vr: Some(vr),
          length: ValueLength::new(length),
        })
      }

      Err(e) => Err(
        self.map_byte_stream_error(e, "Reading explicit VR data element header"),
      ),
    }
  }

  fn read_data_element_value_bytes_part(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    value_length: u32,
    bytes_remaining: u32,
    emit_parts: bool,
  ) -> Result<Vec<P10Part>, P10Error> {
    let materialized_value_required =
      self.is_materialized_value_required(tag, vr);

    // A materialized value must be read as a whole. Everything else is read
    // in chunks of up to the max part size.
    let bytes_to_read = if materialized_value_required {
      value_length
    } else {
      core::cmp::min(bytes_remaining, self.config.max_part_size)
    };

    match self.stream.read(bytes_to_read as usize) {
      Ok(mut data) => {
        // Data element values are always emitted in little endian
        if self.active_transfer_syntax().endianness.is_big() {
          let mut raw_data = data.into_vec();
          self.location.swap_endianness(tag, vr, &mut raw_data);
          data = raw_data.into();
        }

        let bytes_remaining = bytes_remaining - bytes_to_read;

        let data = if materialized_value_required {
          self.process_materialized_data_element(tag, vr, data)?
        } else {
          data
        };

        let mut parts = Vec::with_capacity(2);

        if emit_parts {
          // The header part for a materialized value is emitted now that its
          // final length following UTF-8 conversion is known
          if materialized_value_required {
            let max_length = DataElementHeader::value_length_size(vr).max_length();

            if data.len() > max_length {
              return Err(P10Error::DataInvalid {
                when: "Reading data element value bytes".to_string(),
                details: format!(
                  "Length of {} bytes exceeds the maximum of {} bytes after \
                   conversion to UTF-8",
                  data.len(),
                  max_length
                ),
                path: self.path.clone(),
                offset: self.stream.bytes_read(),
              });
            }

            parts.push(P10Part::DataElementHeader {
              tag,
              vr,
              length: data.len() as u32,
              path: self.path.clone(),
            });
          }

          parts.push(P10Part::DataElementValueBytes {
            tag,
            vr,
            data,
            bytes_remaining,
          });
        }

        if bytes_remaining == 0 {
          self.path.pop().unwrap();

          // The data element is complete. The next step is either the next
          // pixel data item, when inside an encapsulated pixel data
          // sequence, or the next data element header.
          self.next_step = if tag == dictionary::ITEM.tag {
            NextStep::ReadPixelDataItem { vr }
          } else {
            NextStep::ReadDataElementHeader
          };
        } else {
          self.next_step = NextStep::ReadDataElementValueBytes {
            tag,
            vr,
            length: value_length,
            bytes_remaining,
            emit_parts,
          };
        }

        Ok(parts)
      }

      Err(e) => {
        let when = format!(
          "Reading {} data element value bytes, VR: {}",
          bytes_to_read, vr
        );

        Err(self.map_byte_stream_error(e, &when))
      }
    }
  }

  fn is_materialized_value_required(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
  ) -> bool {
    // Clarifying data elements need their value available to the read process
    if p10_location::is_clarifying_data_element(tag) {
      return true;
    }

    // Encoded strings that aren't already valid UTF-8 need to be converted
    if vr.is_encoded_string() {
      return !self.location.is_specific_character_set_utf8_compatible();
    }

    // Other string VRs use ISO 646 and should already be valid UTF-8, but
    // invalid bytes have been observed in the wild, so they are sanitized by
    // replacing invalid characters with a question mark
    if vr.is_string() {
      return true;
    }

    false
  }

  fn process_materialized_data_element(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    mut value_bytes: SharedBytes,
  ) -> Result<SharedBytes, P10Error> {
    // Decode string values using the active character set. Private Creator
    // values must only use the default character repertoire and so are
    // sanitized against it. Ref: PS3.5 7.8.1.
    if vr.is_string() {
      if vr.is_encoded_string() && !tag.is_private_creator() {
        value_bytes =
          self.location.decode_string_bytes(vr, &value_bytes).into();
      } else {
        let mut data = value_bytes.into_vec();
        character_set::sanitize_default_charset_bytes(&mut data);
        value_bytes = data.into();
      }
    }

    // Record the value when this is a clarifying data element
    self
      .location
      .add_clarifying_data_element(tag, vr, &mut value_bytes)?;

    Ok(value_bytes)
  }

  fn read_pixel_data_item_part(
    &mut self,
    vr: ValueRepresentation,
  ) -> Result<Vec<P10Part>, P10Error> {
    match self.read_data_element_header()? {
      // Pixel data items have no VR and a defined length
      DataElementHeader {
        tag,
        vr: None,
        length: ValueLength::Defined { length },
      } if tag == dictionary::ITEM.tag => {
        self.next_step = NextStep::ReadDataElementValueBytes {
          tag: dictionary::ITEM.tag,
          vr,
          length,
          bytes_remaining: length,
          emit_parts: true,
        };

        let index = self.location.sequence_item_count().unwrap_or(0);
        self.location.note_pixel_data_item();
        self.path.add_sequence_item(index).unwrap();

        Ok(vec![P10Part::PixelDataItem { index, length }])
      }

      DataElementHeader {
        tag,
        vr: None,
        length: ValueLength::ZERO,
      } if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag => {
        self.location.end_sequence().map_err(|details| {
          P10Error::DataInvalid {
            when: "Reading encapsulated pixel data item".to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          }
        })?;

        self.path.pop().unwrap();

        self.next_step = NextStep::ReadDataElementHeader;

        Ok(vec![P10Part::SequenceDelimiter {
          tag: dictionary::PIXEL_DATA.tag,
        }])
      }

      header => Err(P10Error::DataInvalid {
        when: "Reading encapsulated pixel data item".to_string(),
        details: format!("Invalid data element '{}'", header),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      }),
    }
  }

  /// Maps a byte stream error into a P10 error.
  ///
  fn map_byte_stream_error(
    &self,
    error: ByteStreamError,
    when: &str,
  ) -> P10Error {
    map_byte_stream_error(error, when, &self.stream, &self.path)
  }
}

/// Maps a byte stream error into a P10 error.
///
fn map_byte_stream_error(
  error: ByteStreamError,
  when: &str,
  stream: &ByteStream,
  path: &DataSetPath,
) -> P10Error {
  let offset = stream.bytes_read();

  match error {
    ByteStreamError::DataRequired => P10Error::DataRequired {
      when: when.to_string(),
    },

    ByteStreamError::DataEnd => P10Error::DataEndedUnexpectedly {
      when: when.to_string(),
      path: path.clone(),
      offset,
    },

    ByteStreamError::ZlibDataError => P10Error::DataInvalid {
      when: when.to_string(),
      details: "Zlib data is invalid".to_string(),
      path: path.clone(),
      offset,
    },

    ByteStreamError::WriteAfterCompletion => P10Error::WriteAfterCompletion,
  }
}

impl Default for P10ReadContext {
  fn default() -> Self {
    Self::new(None)
  }
}
