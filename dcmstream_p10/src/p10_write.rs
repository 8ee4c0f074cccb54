//! Serializes data sets and streams of DICOM P10 parts into raw DICOM P10
//! bytes.

use byteorder::ByteOrder;

use dcmstream_core::transfer_syntax::Endianness;
use dcmstream_core::{
  DataElementValue, DataSet, DataSetPath, SharedBytes, TransferSyntax,
  dictionary, transfer_syntax,
};

use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::internal::value_length::ValueLength;
use crate::{
  P10Error, P10FilterTransform, P10InsertTransform, P10Part, P10WriteConfig,
  p10_part,
};

/// Data is deflated in chunks of this size when writing a deflated transfer
/// syntax.
///
const ZLIB_DEFLATE_CHUNK_SIZE: usize = 64 * 1024;

/// The state of an in-progress DICOM P10 write. DICOM P10 parts are written
/// with [`Self::write_part()`] and the resulting raw bytes are collected with
/// [`Self::read_bytes()`].
///
pub struct P10WriteContext {
  config: P10WriteConfig,
  p10_bytes: Vec<SharedBytes>,
  p10_total_byte_count: u64,
  is_ended: bool,
  transfer_syntax: &'static TransferSyntax,
  zlib_stream: Option<flate2::Compress>,
  path: DataSetPath,
  sequence_item_counts: Vec<usize>,
  pending_value_bytes: Option<u32>,
}

impl P10WriteContext {
  /// Creates a new write context for writing DICOM P10 data.
  ///
  pub fn new(config: Option<P10WriteConfig>) -> Self {
    Self {
      config: config.unwrap_or_default(),
      p10_bytes: vec![],
      p10_total_byte_count: 0,
      is_ended: false,
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      zlib_stream: None,
      path: DataSetPath::new(),
      sequence_item_counts: vec![],
      pending_value_bytes: None,
    }
  }

  /// Takes the DICOM P10 bytes generated by recent calls to
  /// [`Self::write_part()`] out of this write context.
  ///
  pub fn read_bytes(&mut self) -> Vec<SharedBytes> {
    core::mem::take(&mut self.p10_bytes)
  }

  /// Writes the next DICOM P10 part to this write context. The new raw bytes
  /// this generates are collected with [`Self::read_bytes()`].
  ///
  pub fn write_part(&mut self, part: &P10Part) -> Result<(), P10Error> {
    if self.is_ended {
      return Err(P10Error::PartStreamInvalid {
        when: "Writing DICOM P10 part".to_string(),
        details: "Received a further DICOM P10 part after the write was \
          completed"
          .to_string(),
        part: part.clone(),
      });
    }

    match part {
      // The File Meta Information sets the transfer syntax for the rest of
      // the write, and starts a zlib compressor when that transfer syntax is
      // deflated
      P10Part::FileMetaInformation {
        data_set: file_meta_information,
      } => {
        let transfer_syntax_uid = file_meta_information
          .get_string(dictionary::TRANSFER_SYNTAX_UID.tag)
          .unwrap_or(transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN.uid);

        let new_transfer_syntax = TransferSyntax::from_uid(transfer_syntax_uid)
          .map_err(|_| P10Error::TransferSyntaxNotSupported {
            transfer_syntax_uid: transfer_syntax_uid.to_string(),
          })?;

        // The zlib header is excluded, as required for the deflated transfer
        // syntaxes
        if new_transfer_syntax.is_deflated {
          self.zlib_stream = Some(flate2::Compress::new(
            flate2::Compression::new(self.config.zlib_compression_level),
            false,
          ));
        }

        self.transfer_syntax = new_transfer_syntax;

        let part_bytes = self.part_to_bytes(part)?;
        self.p10_total_byte_count += part_bytes.len() as u64;
        self.p10_bytes.push(part_bytes);

        Ok(())
      }

      // The end part flushes any remaining deflated data and completes the
      // write
      P10Part::End => {
        if let Some(zlib_stream) = self.zlib_stream.as_mut() {
          loop {
            let mut output = vec![0u8; ZLIB_DEFLATE_CHUNK_SIZE];

            let total_out = zlib_stream.total_out();
            let status = zlib_stream
              .compress(&[], &mut output, flate2::FlushCompress::Finish)
              .unwrap();
            output.resize((zlib_stream.total_out() - total_out) as usize, 0);

            if !output.is_empty() {
              self.p10_total_byte_count += output.len() as u64;
              self.p10_bytes.push(output.into());
            }

            if status == flate2::Status::StreamEnd {
              break;
            }
          }

          self.zlib_stream = None;
        }

        self.is_ended = true;

        Ok(())
      }

      _ => {
        // Check that value bytes tally with the declared length of the data
        // element or pixel data item they belong to
        self.check_value_bytes_length(part)?;

        // Track the part in the current path
        match part {
          P10Part::DataElementHeader { tag, .. } => {
            self.path.add_data_element(*tag)
          }

          P10Part::SequenceStart { tag, .. } => {
            self.sequence_item_counts.push(0);
            self.path.add_data_element(*tag)
          }

          P10Part::SequenceItemStart { .. }
          | P10Part::PixelDataItem { .. } => {
            match self.sequence_item_counts.last_mut() {
              Some(count) => {
                *count += 1;
                self.path.add_sequence_item(*count - 1)
              }
              None => Err("No active sequence".to_string()),
            }
          }

          _ => Ok(()),
        }
        .map_err(|_| P10Error::PartStreamInvalid {
          when: "Writing part to context".to_string(),
          details: "The data set path is not in a valid state for this part"
            .to_string(),
          part: part.clone(),
        })?;

        let part_bytes = self.part_to_bytes(part)?;

        // Unwind the path when the part ends a data element, item, or
        // sequence
        match part {
          P10Part::DataElementValueBytes {
            bytes_remaining: 0, ..
          }
          | P10Part::SequenceItemDelimiter => self.path.pop(),

          P10Part::SequenceDelimiter { .. } => {
            self.sequence_item_counts.pop();
            self.path.pop()
          }

          _ => Ok(()),
        }
        .map_err(|_| P10Error::PartStreamInvalid {
          when: "Writing part to context".to_string(),
          details: "The data set path is empty".to_string(),
          part: part.clone(),
        })?;

        // Pass the new bytes through the zlib compressor when one is active
        if let Some(zlib_stream) = self.zlib_stream.as_mut() {
          let mut input = &part_bytes[..];

          while !input.is_empty() {
            let mut output = vec![0u8; ZLIB_DEFLATE_CHUNK_SIZE];

            let total_in = zlib_stream.total_in();
            let total_out = zlib_stream.total_out();
            zlib_stream
              .compress(input, &mut output, flate2::FlushCompress::None)
              .unwrap();
            output.resize((zlib_stream.total_out() - total_out) as usize, 0);

            if !output.is_empty() {
              self.p10_total_byte_count += output.len() as u64;
              self.p10_bytes.push(output.into());
            }

            let input_bytes_consumed =
              (zlib_stream.total_in() - total_in) as usize;
            if input_bytes_consumed == 0 {
              return Err(P10Error::OtherError {
                error_type: "Zlib deflate failure".to_string(),
                details: "Zlib compressor did not consume any bytes"
                  .to_string(),
              });
            }

            input = &input[input_bytes_consumed..];
          }
        } else {
          self.p10_total_byte_count += part_bytes.len() as u64;
          self.p10_bytes.push(part_bytes);
        }

        Ok(())
      }
    }
  }

  /// Checks that [`P10Part::DataElementValueBytes`] parts carry exactly the
  /// number of bytes declared by the preceding [`P10Part::DataElementHeader`]
  /// or [`P10Part::PixelDataItem`].
  ///
  fn check_value_bytes_length(&mut self, part: &P10Part) -> Result<(), P10Error> {
    match part {
      P10Part::DataElementHeader { length, .. }
      | P10Part::PixelDataItem { length, .. } => {
        self.pending_value_bytes = Some(*length);

        Ok(())
      }

      P10Part::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => {
        let is_consistent = match self.pending_value_bytes {
          Some(pending) => {
            pending as u64 == data.len() as u64 + u64::from(*bytes_remaining)
          }
          None => false,
        };

        if !is_consistent {
          return Err(P10Error::PartStreamInvalid {
            when: "Writing data element value bytes".to_string(),
            details: "Value bytes do not match the declared value length"
              .to_string(),
            part: part.clone(),
          });
        }

        self.pending_value_bytes = if *bytes_remaining == 0 {
          None
        } else {
          Some(*bytes_remaining)
        };

        Ok(())
      }

      _ => Ok(()),
    }
  }

  /// Serializes a single DICOM P10 part to raw DICOM P10 bytes.
  ///
  fn part_to_bytes(&self, part: &P10Part) -> Result<SharedBytes, P10Error> {
    match part {
      P10Part::FilePreambleAndDICMPrefix { preamble } => {
        let mut bytes = Vec::with_capacity(132);

        bytes.extend_from_slice(preamble.as_ref());
        bytes.extend_from_slice(b"DICM");

        Ok(bytes.into())
      }

      P10Part::FileMetaInformation { data_set } => {
        let mut file_meta_information = data_set.clone();
        self.add_implementation_details(&mut file_meta_information);

        let mut fmi_bytes = Vec::with_capacity(256);

        // The '(0002,0000) File Meta Information Group Length' data element
        // leads, with a placeholder length that is filled in at the end
        fmi_bytes
          .extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x55, 0x4C, 0x04, 0x00]);
        fmi_bytes.extend_from_slice(&[0, 0, 0, 0]);

        for (tag, value) in file_meta_information.into_iter() {
          // Skip any group length element carried over from a read
          if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag {
            continue;
          }

          let vr = value.value_representation();

          let value_bytes = value.bytes().map_err(|_| P10Error::DataInvalid {
            when: "Serializing File Meta Information".to_string(),
            details: format!(
              "Tag '{}' with value representation '{}' is not allowed in \
               File Meta Information",
              tag, vr
            ),
            path: self.path.clone(),
            offset: self.p10_total_byte_count,
          })?;

          let header_bytes = self.data_element_header_to_bytes(
            &DataElementHeader {
              tag,
              vr: Some(vr),
              length: ValueLength::new(value_bytes.len() as u32),
            },
            Endianness::LittleEndian,
          )?;

          fmi_bytes.extend_from_slice(&header_bytes);
          fmi_bytes.extend_from_slice(value_bytes);
        }

        // Fill in the group length
        let fmi_length = fmi_bytes.len() - 12;
        byteorder::LittleEndian::write_u32(
          &mut fmi_bytes[8..12],
          fmi_length as u32,
        );

        Ok(fmi_bytes.into())
      }

      P10Part::DataElementHeader {
        tag, vr, length, ..
      } => {
        let vr = match self.transfer_syntax.vr_serialization {
          transfer_syntax::VrSerialization::VrExplicit => Some(*vr),
          transfer_syntax::VrSerialization::VrImplicit => None,
        };

        self.data_element_header_to_bytes(
          &DataElementHeader {
            tag: *tag,
            vr,
            length: ValueLength::new(*length),
          },
          self.transfer_syntax.endianness,
        )
      }

      P10Part::DataElementValueBytes { vr, data, .. } => {
        if self.transfer_syntax.endianness.is_big() {
          // The data is cloned because the endianness swap can't be done in
          // place on shared bytes
          let mut data = data.clone().into_vec();
          vr.swap_endianness(&mut data);
          Ok(data.into())
        } else {
          Ok(data.clone())
        }
      }

      P10Part::SequenceStart { tag, vr, .. } => {
        let vr = match self.transfer_syntax.vr_serialization {
          transfer_syntax::VrSerialization::VrExplicit => Some(*vr),
          transfer_syntax::VrSerialization::VrImplicit => None,
        };

        self.data_element_header_to_bytes(
          &DataElementHeader {
            tag: *tag,
            vr,
            length: ValueLength::Undefined,
          },
          self.transfer_syntax.endianness,
        )
      }

      P10Part::SequenceDelimiter { .. } => self.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
          vr: None,
          length: ValueLength::ZERO,
        },
        self.transfer_syntax.endianness,
      ),

      P10Part::SequenceItemStart { .. } => self.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::ITEM.tag,
          vr: None,
          length: ValueLength::Undefined,
        },
        self.transfer_syntax.endianness,
      ),

      P10Part::SequenceItemDelimiter => self.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::ITEM_DELIMITATION_ITEM.tag,
          vr: None,
          length: ValueLength::ZERO,
        },
        self.transfer_syntax.endianness,
      ),

      P10Part::PixelDataItem { length, .. } => self
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::ITEM.tag,
            vr: None,
            length: ValueLength::new(*length),
          },
          self.transfer_syntax.endianness,
        ),

      P10Part::End => Ok(SharedBytes::empty()),
    }
  }

  /// Serializes a data element header. A header with no VR is serialized in
  /// the implicit VR form.
  ///
  fn data_element_header_to_bytes(
    &self,
    header: &DataElementHeader,
    endianness: Endianness,
  ) -> Result<SharedBytes, P10Error> {
    let length = header.length.to_u32();

    let mut bytes = Vec::with_capacity(12);

    match endianness {
      Endianness::LittleEndian => {
        bytes.extend_from_slice(&header.tag.group.to_le_bytes());
        bytes.extend_from_slice(&header.tag.element.to_le_bytes());
      }
      Endianness::BigEndian => {
        bytes.extend_from_slice(&header.tag.group.to_be_bytes());
        bytes.extend_from_slice(&header.tag.element.to_be_bytes());
      }
    };

    match header.vr {
      // Implicit VR: just the 32-bit length
      None => match endianness {
        Endianness::LittleEndian => {
          bytes.extend_from_slice(&length.to_le_bytes())
        }
        Endianness::BigEndian => bytes.extend_from_slice(&length.to_be_bytes()),
      },

      // Explicit VR: the VR code then a 16-bit or 32-bit length
      Some(vr) => {
        bytes.extend_from_slice(&vr.to_bytes());

        match DataElementHeader::value_length_size(vr) {
          ValueLengthSize::U16 => {
            if length > u16::MAX as u32 {
              return Err(P10Error::DataInvalid {
                when: "Serializing data element header".to_string(),
                details: format!(
                  "Length 0x{:X} exceeds the maximum of 0xFFFF",
                  length,
                ),
                path: self.path.clone(),
                offset: self.p10_total_byte_count,
              });
            }

            match endianness {
              Endianness::LittleEndian => {
                bytes.extend_from_slice(&(length as u16).to_le_bytes())
              }
              Endianness::BigEndian => {
                bytes.extend_from_slice(&(length as u16).to_be_bytes())
              }
            }
          }

          // 32-bit lengths are preceded by two reserved bytes
          ValueLengthSize::U32 => {
            bytes.extend_from_slice(&[0, 0]);

            match endianness {
              Endianness::LittleEndian => {
                bytes.extend_from_slice(&length.to_le_bytes())
              }
              Endianness::BigEndian => {
                bytes.extend_from_slice(&length.to_be_bytes())
              }
            }
          }
        };
      }
    }

    Ok(bytes.into())
  }

  /// Sets the *'(0002,0001) File Meta Information Version'*, *'(0002,0012)
  /// Implementation Class UID'*, and *'(0002,0013) Implementation Version
  /// Name'* data elements prior to serializing File Meta Information.
  ///
  fn add_implementation_details(&self, file_meta_information: &mut DataSet) {
    file_meta_information.insert(
      dictionary::FILE_META_INFORMATION_VERSION.tag,
      DataElementValue::new_other_byte_string(vec![0, 1]).unwrap(),
    );

    if let Ok(value) = DataElementValue::new_unique_identifier(&[
      &self.config.implementation_class_uid,
    ]) {
      file_meta_information
        .insert(dictionary::IMPLEMENTATION_CLASS_UID.tag, value);
    }

    if let Ok(value) = DataElementValue::new_short_string(&[
      &self.config.implementation_version_name,
    ]) {
      file_meta_information
        .insert(dictionary::IMPLEMENTATION_VERSION_NAME.tag, value);
    }
  }
}

impl Default for P10WriteContext {
  fn default() -> Self {
    Self::new(None)
  }
}

/// Converts a data set to a stream of DICOM P10 parts returned through a
/// callback.
///
pub fn data_set_to_parts<E>(
  data_set: &DataSet,
  part_callback: &mut impl FnMut(&P10Part) -> Result<(), E>,
) -> Result<(), E> {
  // File Meta Information data elements are filtered out of the main data
  // set's part stream because they are carried by the FileMetaInformation
  // part
  let mut remove_fmi_transform = P10FilterTransform::new(Box::new(
    |tag, _vr, _length, _path| tag.group != 2,
  ));

  // A '(0008,0005) Specific Character Set' data element declaring UTF-8
  // (ISO_IR 192) is inserted into the part stream, as all string data held in
  // data sets is UTF-8
  let mut data_elements_to_insert = DataSet::new();
  data_elements_to_insert
    .insert_string_value(&dictionary::SPECIFIC_CHARACTER_SET, &["ISO_IR 192"])
    .unwrap();
  let mut insert_specific_character_set_transform =
    P10InsertTransform::new(data_elements_to_insert);

  let mut process_part = |part: &P10Part| -> Result<(), E> {
    // Part streams generated from a data set are always well-formed, so the
    // transforms can't fail here
    if !remove_fmi_transform.add_part(part).unwrap() {
      return Ok(());
    }

    let parts = insert_specific_character_set_transform.add_part(part).unwrap();

    for part in parts {
      part_callback(&part)?;
    }

    Ok(())
  };

  // File Preamble and File Meta Information lead
  process_part(&P10Part::FilePreambleAndDICMPrefix {
    preamble: Box::new([0; 128]),
  })?;
  process_part(&P10Part::FileMetaInformation {
    data_set: data_set.file_meta_information(),
  })?;

  // Then the main data set
  p10_part::data_elements_to_parts(data_set, &DataSetPath::new(), &mut process_part)?;

  process_part(&P10Part::End)
}

/// Converts a data set to DICOM P10 bytes returned through a callback.
///
pub fn data_set_to_bytes(
  data_set: &DataSet,
  bytes_callback: &mut impl FnMut(SharedBytes) -> Result<(), P10Error>,
  config: Option<P10WriteConfig>,
) -> Result<(), P10Error> {
  let mut context = P10WriteContext::new(config);

  let mut process_part = |part: &P10Part| -> Result<(), P10Error> {
    context.write_part(part)?;

    for bytes in context.read_bytes() {
      bytes_callback(bytes)?;
    }

    Ok(())
  };

  data_set_to_parts(data_set, &mut process_part)
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::ValueRepresentation;

  #[test]
  fn data_element_header_to_bytes_test() {
    let context = P10WriteContext::new(None);

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::PIXEL_DATA.tag,
          vr: None,
          length: ValueLength::new(0x12345678),
        },
        Endianness::LittleEndian,
      ),
      Ok(vec![0xE0, 0x7F, 0x10, 0x00, 0x78, 0x56, 0x34, 0x12].into())
    );

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::PIXEL_DATA.tag,
          vr: None,
          length: ValueLength::new(0x12345678),
        },
        Endianness::BigEndian,
      ),
      Ok(vec![0x7F, 0xE0, 0x00, 0x10, 0x12, 0x34, 0x56, 0x78].into())
    );

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::PATIENT_AGE.tag,
          vr: Some(ValueRepresentation::UnlimitedText),
          length: ValueLength::new(0x1234),
        },
        Endianness::LittleEndian,
      ),
      Ok(
        vec![0x10, 0x00, 0x10, 0x10, 0x55, 0x54, 0, 0, 0x34, 0x12, 0, 0]
          .into()
      )
    );

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::PIXEL_DATA.tag,
          vr: Some(ValueRepresentation::OtherWordString),
          length: ValueLength::new(0x12345678),
        },
        Endianness::LittleEndian,
      ),
      Ok(
        vec![
          0xE0, 0x7F, 0x10, 0x00, 0x4F, 0x57, 0, 0, 0x78, 0x56, 0x34, 0x12
        ]
        .into()
      )
    );

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag,
          vr: Some(ValueRepresentation::SignedShort),
          length: ValueLength::new(0x1234),
        },
        Endianness::BigEndian,
      ),
      Ok(vec![0x00, 0x28, 0x01, 0x06, 0x53, 0x53, 0x12, 0x34].into())
    );

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::PATIENT_AGE.tag,
          vr: Some(ValueRepresentation::AgeString),
          length: ValueLength::new(0x12345),
        },
        Endianness::LittleEndian,
      ),
      Err(P10Error::DataInvalid {
        when: "Serializing data element header".to_string(),
        details: "Length 0x12345 exceeds the maximum of 0xFFFF".to_string(),
        path: DataSetPath::new(),
        offset: 0
      })
    );
  }
}
