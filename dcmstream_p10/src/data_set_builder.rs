//! Materializes a stream of DICOM P10 parts into an in-memory data set.
//!
//! The part stream usually comes from reading raw DICOM P10 bytes with the
//! [`crate::p10_read`] module.

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, SharedBytes, ValueRepresentation,
  dictionary,
};

use crate::{P10Error, P10Part};

/// Builds an in-memory data set from a stream of DICOM P10 parts.
///
#[derive(Debug, PartialEq)]
pub struct DataSetBuilder {
  file_preamble: Option<Box<[u8; 128]>>,
  file_meta_information: Option<DataSet>,
  location: Vec<BuilderLocation>,
  pending_data_element: Option<PendingDataElement>,
  is_complete: bool,
}

/// Where in the data set the builder is currently at, i.e. the sequences and
/// items that are currently being built.
///
#[derive(Debug, PartialEq)]
enum BuilderLocation {
  RootDataSet {
    data_set: DataSet,
  },
  Sequence {
    tag: DataElementTag,
    items: Vec<DataSet>,
  },
  SequenceItem {
    data_set: DataSet,
  },
  EncapsulatedPixelDataSequence {
    vr: ValueRepresentation,
    items: Vec<SharedBytes>,
  },
}

/// A data element whose header part has been received but whose value bytes
/// parts are still incoming.
///
#[derive(Debug, PartialEq)]
struct PendingDataElement {
  tag: DataElementTag,
  vr: ValueRepresentation,
  data: Vec<SharedBytes>,
}

impl Default for DataSetBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl DataSetBuilder {
  /// Creates a new data set builder.
  ///
  pub fn new() -> Self {
    Self {
      file_preamble: None,
      file_meta_information: None,
      location: vec![BuilderLocation::RootDataSet {
        data_set: DataSet::new(),
      }],
      pending_data_element: None,
      is_complete: false,
    }
  }

  /// Returns whether this builder has received the final [`P10Part::End`]
  /// part and is complete.
  ///
  pub fn is_complete(&self) -> bool {
    self.is_complete
  }

  /// Returns the 128-byte File Preamble, or an error if it hasn't been
  /// received yet. The preamble's content is application-defined and is often
  /// all zero.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn file_preamble(&self) -> Result<&[u8; 128], ()> {
    match &self.file_preamble {
      Some(preamble) => Ok(preamble),
      None => Err(()),
    }
  }

  /// Returns the completed data set, or an error if this builder isn't
  /// complete. The File Meta Information is merged into the returned data
  /// set.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn final_data_set(&mut self) -> Result<DataSet, ()> {
    let mut data_set = match (self.is_complete, self.location.as_mut_slice()) {
      (true, [BuilderLocation::RootDataSet { data_set }]) => {
        core::mem::take(data_set)
      }
      _ => return Err(()),
    };

    if let Some(file_meta_information) = self.file_meta_information.take() {
      data_set.merge(file_meta_information);
    }

    Ok(data_set)
  }

  /// Forces an incomplete builder to completion by synthesizing the delimiter
  /// and end parts still outstanding, so a partially built data set can be
  /// retrieved. Useful when the source of the parts hit an error partway
  /// through. Never needed for complete, valid DICOM P10 data.
  ///
  pub fn force_end(&mut self) {
    if self.is_complete {
      return;
    }

    self.pending_data_element = None;

    while let Some(location) = self.location.last() {
      match location {
        BuilderLocation::Sequence { tag, .. } => {
          let tag = *tag;
          self.add_part(&P10Part::SequenceDelimiter { tag }).unwrap();
        }

        BuilderLocation::EncapsulatedPixelDataSequence { .. } => {
          self
            .add_part(&P10Part::SequenceDelimiter {
              tag: dictionary::PIXEL_DATA.tag,
            })
            .unwrap();
        }

        BuilderLocation::SequenceItem { .. } => {
          self.add_part(&P10Part::SequenceItemDelimiter).unwrap();
        }

        BuilderLocation::RootDataSet { .. } => {
          self.add_part(&P10Part::End).unwrap();
          return;
        }
      };
    }
  }

  /// Adds the next DICOM P10 part to this builder, checking that it is valid
  /// at the current position in the part stream.
  ///
  pub fn add_part(&mut self, part: &P10Part) -> Result<(), P10Error> {
    if self.is_complete {
      return Err(P10Error::PartStreamInvalid {
        when: "Building data set".to_string(),
        details: "Part received after the part stream has ended".to_string(),
        part: part.clone(),
      });
    }

    // A pending data element must have its value bytes completed before
    // anything else arrives
    if self.pending_data_element.is_some() {
      return self.add_part_to_pending_data_element(part);
    }

    match (part, self.location.last()) {
      (P10Part::FilePreambleAndDICMPrefix { preamble }, _) => {
        self.file_preamble = Some(preamble.clone());
        Ok(())
      }

      (P10Part::FileMetaInformation { data_set }, _) => {
        self.file_meta_information = Some(data_set.clone());
        Ok(())
      }

      (part, Some(BuilderLocation::Sequence { .. })) => {
        self.add_part_to_sequence(part)
      }

      (part, Some(BuilderLocation::EncapsulatedPixelDataSequence { .. })) => {
        self.add_part_to_encapsulated_pixel_data_sequence(part)
      }

      (part, _) => self.add_part_to_data_set(part),
    }
  }

  /// Ingests the next part when the current location is a sequence.
  ///
  fn add_part_to_sequence(&mut self, part: &P10Part) -> Result<(), P10Error> {
    match part {
      P10Part::SequenceItemStart { .. } => {
        self.location.push(BuilderLocation::SequenceItem {
          data_set: DataSet::new(),
        });

        Ok(())
      }

      P10Part::SequenceDelimiter { .. } => {
        if let Some(BuilderLocation::Sequence { tag, items }) =
          self.location.pop()
        {
          let sequence = DataElementValue::new_sequence(items);
          self.insert_data_element_at_current_location(tag, sequence);
        }

        Ok(())
      }

      part => self.unexpected_part_error(part),
    }
  }

  /// Ingests the next part when the current location is an encapsulated pixel
  /// data sequence.
  ///
  fn add_part_to_encapsulated_pixel_data_sequence(
    &mut self,
    part: &P10Part,
  ) -> Result<(), P10Error> {
    match part {
      P10Part::PixelDataItem { .. } => {
        self.pending_data_element = Some(PendingDataElement {
          tag: dictionary::ITEM.tag,
          vr: ValueRepresentation::OtherByteString,
          data: vec![],
        });

        Ok(())
      }

      P10Part::SequenceDelimiter { .. } => {
        if let Some(BuilderLocation::EncapsulatedPixelDataSequence {
          vr,
          items,
        }) = self.location.pop()
        {
          self.insert_data_element_at_current_location(
            dictionary::PIXEL_DATA.tag,
            DataElementValue::new_encapsulated_pixel_data_unchecked(vr, items),
          );
        }

        Ok(())
      }

      part => self.unexpected_part_error(part),
    }
  }

  /// Ingests the next part when the current location is the root data set or
  /// an item of a sequence.
  ///
  fn add_part_to_data_set(&mut self, part: &P10Part) -> Result<(), P10Error> {
    match part {
      // A new data element. Its value bytes arrive in subsequent parts.
      P10Part::DataElementHeader { tag, vr, .. } => {
        self.pending_data_element = Some(PendingDataElement {
          tag: *tag,
          vr: *vr,
          data: vec![],
        });

        Ok(())
      }

      // The start of a new sequence or encapsulated pixel data sequence
      P10Part::SequenceStart { tag, vr, .. } => {
        let new_location = match vr {
          ValueRepresentation::OtherByteString
          | ValueRepresentation::OtherWordString => {
            BuilderLocation::EncapsulatedPixelDataSequence {
              vr: *vr,
              items: vec![],
            }
          }

          _ => BuilderLocation::Sequence {
            tag: *tag,
            items: vec![],
          },
        };

        self.location.push(new_location);

        Ok(())
      }

      // The end of the current item, which must actually be an item
      P10Part::SequenceItemDelimiter => match self.location.as_slice() {
        [
          ..,
          BuilderLocation::Sequence { .. },
          BuilderLocation::SequenceItem { .. },
        ] => {
          if let Some(BuilderLocation::SequenceItem { data_set }) =
            self.location.pop()
          {
            if let Some(BuilderLocation::Sequence { items, .. }) =
              self.location.last_mut()
            {
              items.push(data_set);
            }
          }

          Ok(())
        }

        _ => Err(P10Error::PartStreamInvalid {
          when: "Building data set".to_string(),
          details: "Received sequence item delimiter part outside of an item"
            .to_string(),
          part: part.clone(),
        }),
      },

      // The end of the part stream, which must arrive in the root data set
      P10Part::End => match self.location.as_slice() {
        [BuilderLocation::RootDataSet { .. }] => {
          self.is_complete = true;

          Ok(())
        }

        _ => Err(P10Error::PartStreamInvalid {
          when: "Building data set".to_string(),
          details: "Received end part outside of the root data set"
            .to_string(),
          part: part.clone(),
        }),
      },

      part => self.unexpected_part_error(part),
    }
  }

  /// Ingests the next part when there is a pending data element expecting
  /// value bytes parts.
  ///
  fn add_part_to_pending_data_element(
    &mut self,
    part: &P10Part,
  ) -> Result<(), P10Error> {
    match (part, self.pending_data_element.as_mut()) {
      (
        P10Part::DataElementValueBytes {
          data,
          bytes_remaining,
          ..
        },
        Some(pending_data_element),
      ) => {
        pending_data_element.data.push(data.clone());

        if *bytes_remaining == 0 {
          let tag = pending_data_element.tag;
          let value = build_final_data_element_value(
            tag,
            pending_data_element.vr,
            core::mem::take(&mut pending_data_element.data),
          );

          self.insert_data_element_at_current_location(tag, value);

          self.pending_data_element = None;
        }

        Ok(())
      }

      (part, _) => self.unexpected_part_error(part),
    }
  }

  /// Inserts a completed data element at the current builder location.
  ///
  fn insert_data_element_at_current_location(
    &mut self,
    tag: DataElementTag,
    value: DataElementValue,
  ) {
    match (self.location.as_mut_slice(), value.bytes()) {
      ([BuilderLocation::RootDataSet { data_set }], _)
      | ([.., BuilderLocation::SequenceItem { data_set }], _) => {
        data_set.insert(tag, value);
      }

      (
        [
          ..,
          BuilderLocation::EncapsulatedPixelDataSequence { items, .. },
        ],
        Ok(bytes),
      ) => items.push(bytes.clone()),

      // No other locations can receive a data element
      _ => unreachable!(),
    };
  }

  /// The error returned when a part arrives that isn't valid at the current
  /// location.
  ///
  fn unexpected_part_error(&self, part: &P10Part) -> Result<(), P10Error> {
    Err(P10Error::PartStreamInvalid {
      when: "Building data set".to_string(),
      details: format!(
        "Received unexpected P10 part at location: {}",
        location_to_string(&self.location),
      ),
      part: part.clone(),
    })
  }
}

/// Concatenates the received value bytes of a completed data element and
/// returns its final data element value.
///
fn build_final_data_element_value(
  tag: DataElementTag,
  vr: ValueRepresentation,
  value_bytes: Vec<SharedBytes>,
) -> DataElementValue {
  // When the value arrived as a single chunk it is used as-is with no copy
  let bytes = match value_bytes.as_slice() {
    [bytes] => bytes.clone(),
    _ => {
      let value_length = value_bytes.iter().map(|v| v.len()).sum();
      let mut bytes = Vec::with_capacity(value_length);

      for data in value_bytes.iter() {
        bytes.extend_from_slice(data);
      }

      bytes.into()
    }
  };

  // Lookup table descriptors are a special case because of the non-standard
  // way their VR applies to their bytes
  if dictionary::is_lut_descriptor_tag(tag) {
    DataElementValue::new_lookup_table_descriptor_unchecked(vr, bytes)
  } else {
    DataElementValue::new_binary_unchecked(vr, bytes)
  }
}

/// Formats a builder location for error reporting.
///
fn location_to_string(location: &[BuilderLocation]) -> String {
  location
    .iter()
    .map(|entry| match entry {
      BuilderLocation::RootDataSet { .. } => "RootDataSet".to_string(),
      BuilderLocation::Sequence { tag, .. } => format!("Sequence{}", tag),
      BuilderLocation::SequenceItem { .. } => "SequenceItem".to_string(),
      BuilderLocation::EncapsulatedPixelDataSequence { .. } => {
        "EncapsulatedPixelDataSequence".to_string()
      }
    })
    .collect::<Vec<String>>()
    .join(".")
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::{DataSetPath, dictionary};

  #[test]
  fn build_data_set_test() {
    let mut builder = DataSetBuilder::new();

    let parts = [
      P10Part::FilePreambleAndDICMPrefix {
        preamble: Box::new([0; 128]),
      },
      P10Part::FileMetaInformation {
        data_set: DataSet::new(),
      },
      P10Part::DataElementHeader {
        tag: dictionary::PATIENT_NAME.tag,
        vr: ValueRepresentation::PersonName,
        length: 8,
        path: DataSetPath::new_with_data_element(dictionary::PATIENT_NAME.tag),
      },
      P10Part::DataElementValueBytes {
        tag: dictionary::PATIENT_NAME.tag,
        vr: ValueRepresentation::PersonName,
        data: b"DOE^".to_vec().into(),
        bytes_remaining: 4,
      },
      P10Part::DataElementValueBytes {
        tag: dictionary::PATIENT_NAME.tag,
        vr: ValueRepresentation::PersonName,
        data: b"JANE".to_vec().into(),
        bytes_remaining: 0,
      },
      P10Part::End,
    ];

    for part in parts.iter() {
      builder.add_part(part).unwrap();
    }

    assert!(builder.is_complete());

    let data_set = builder.final_data_set().unwrap();

    assert_eq!(
      data_set.get_string(dictionary::PATIENT_NAME.tag),
      Ok("DOE^JANE")
    );
  }

  #[test]
  fn build_sequence_test() {
    let mut builder = DataSetBuilder::new();

    let sequence_tag = dictionary::REFERENCED_IMAGE_SEQUENCE.tag;

    let parts = [
      P10Part::SequenceStart {
        tag: sequence_tag,
        vr: ValueRepresentation::Sequence,
        path: DataSetPath::new_with_data_element(sequence_tag),
      },
      P10Part::SequenceItemStart { index: 0 },
      P10Part::DataElementHeader {
        tag: dictionary::SERIES_DESCRIPTION.tag,
        vr: ValueRepresentation::LongString,
        length: 6,
        path: DataSetPath::new(),
      },
      P10Part::DataElementValueBytes {
        tag: dictionary::SERIES_DESCRIPTION.tag,
        vr: ValueRepresentation::LongString,
        data: b"Nested".to_vec().into(),
        bytes_remaining: 0,
      },
      P10Part::SequenceItemDelimiter,
      P10Part::SequenceDelimiter { tag: sequence_tag },
      P10Part::End,
    ];

    for part in parts.iter() {
      builder.add_part(part).unwrap();
    }

    let data_set = builder.final_data_set().unwrap();

    let items = data_set
      .get_value(sequence_tag)
      .unwrap()
      .sequence_items()
      .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(
      items[0].get_string(dictionary::SERIES_DESCRIPTION.tag),
      Ok("Nested")
    );
  }

  #[test]
  fn build_encapsulated_pixel_data_test() {
    let mut builder = DataSetBuilder::new();

    let parts = [
      P10Part::SequenceStart {
        tag: dictionary::PIXEL_DATA.tag,
        vr: ValueRepresentation::OtherByteString,
        path: DataSetPath::new_with_data_element(dictionary::PIXEL_DATA.tag),
      },
      P10Part::PixelDataItem {
        index: 0,
        length: 0,
      },
      P10Part::DataElementValueBytes {
        tag: dictionary::ITEM.tag,
        vr: ValueRepresentation::OtherByteString,
        data: SharedBytes::empty(),
        bytes_remaining: 0,
      },
      P10Part::PixelDataItem {
        index: 1,
        length: 4,
      },
      P10Part::DataElementValueBytes {
        tag: dictionary::ITEM.tag,
        vr: ValueRepresentation::OtherByteString,
        data: vec![1, 2, 3, 4].into(),
        bytes_remaining: 0,
      },
      P10Part::SequenceDelimiter {
        tag: dictionary::PIXEL_DATA.tag,
      },
      P10Part::End,
    ];

    for part in parts.iter() {
      builder.add_part(part).unwrap();
    }

    let data_set = builder.final_data_set().unwrap();

    assert_eq!(
      data_set
        .get_value(dictionary::PIXEL_DATA.tag)
        .unwrap()
        .encapsulated_pixel_data(),
      Ok(&vec![SharedBytes::empty(), vec![1, 2, 3, 4].into()])
    );
  }

  #[test]
  fn force_end_test() {
    let mut builder = DataSetBuilder::new();

    builder
      .add_part(&P10Part::SequenceStart {
        tag: dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
        vr: ValueRepresentation::Sequence,
        path: DataSetPath::new_with_data_element(
          dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
        ),
      })
      .unwrap();
    builder
      .add_part(&P10Part::SequenceItemStart { index: 0 })
      .unwrap();

    assert!(builder.final_data_set().is_err());

    builder.force_end();

    assert!(builder.is_complete());

    let data_set = builder.final_data_set().unwrap();
    assert!(data_set.has(dictionary::REFERENCED_IMAGE_SEQUENCE.tag));
  }
}
