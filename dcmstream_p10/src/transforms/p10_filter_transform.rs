//! A filter over a stream of DICOM P10 parts.

use dcmstream_core::{DataElementTag, DataSetPath, ValueRepresentation};

use crate::{P10Error, P10Part};

/// Applies a data element predicate to a stream of DICOM P10 parts. Data
/// elements that the predicate rejects are removed from the stream, including
/// all of their nested content.
///
pub struct P10FilterTransform {
  predicate: Box<PredicateFunction>,
  path: DataSetPath,
  path_filter_results: Vec<bool>,
}

/// The predicate function for a [`P10FilterTransform`] that decides whether a
/// data element passes the filter. It receives the data element's tag, VR,
/// length (`None` for sequences), and the path to its parent.
///
pub type PredicateFunction = dyn FnMut(
  DataElementTag,
  ValueRepresentation,
  Option<u32>,
  &DataSetPath,
) -> bool;

impl P10FilterTransform {
  /// Creates a new filter transform. The predicate is called for each data
  /// element in the stream, and only data elements it returns true for pass
  /// through the filter.
  ///
  pub fn new(predicate: Box<PredicateFunction>) -> Self {
    Self {
      predicate,
      path: DataSetPath::new(),
      path_filter_results: vec![],
    }
  }

  /// Returns whether the filter's current position is at the root data set,
  /// i.e. no sequences are currently open.
  ///
  pub fn is_at_root(&self) -> bool {
    self.path.len() == 0
  }

  /// Adds the next part to this filter transform and returns whether the part
  /// passes the filter.
  ///
  pub fn add_part(&mut self, part: &P10Part) -> Result<bool, P10Error> {
    let current_filter_state = *self.path_filter_results.last().unwrap_or(&true);

    let map_path_error = |details: String| -> P10Error {
      P10Error::PartStreamInvalid {
        when: "Filtering P10 part stream".to_string(),
        details,
        part: part.clone(),
      }
    };

    let mut run_predicate =
      |tag, vr, length: Option<u32>| -> Result<bool, P10Error> {
        // A data element whose parent is already filtered out never runs the
        // predicate
        let filter_result = match self.path_filter_results.as_slice() {
          [] | [.., true] => (self.predicate)(tag, vr, length, &self.path),
          _ => false,
        };

        self.path.add_data_element(tag).map_err(map_path_error)?;

        self.path_filter_results.push(filter_result);

        Ok(filter_result)
      };

    match part {
      P10Part::SequenceStart { tag, vr, .. } => run_predicate(*tag, *vr, None),

      P10Part::DataElementHeader {
        tag, vr, length, ..
      } => run_predicate(*tag, *vr, Some(*length)),

      P10Part::SequenceItemStart { index } => {
        self
          .path
          .add_sequence_item(*index)
          .map_err(map_path_error)?;

        Ok(current_filter_state)
      }

      P10Part::SequenceItemDelimiter => {
        self.path.pop().map_err(map_path_error)?;

        Ok(current_filter_state)
      }

      P10Part::PixelDataItem { index, .. } => {
        self
          .path
          .add_sequence_item(*index)
          .map_err(map_path_error)?;

        self.path_filter_results.push(current_filter_state);

        Ok(current_filter_state)
      }

      // The end of the data element or sequence at the top of the path
      P10Part::SequenceDelimiter { .. }
      | P10Part::DataElementValueBytes {
        bytes_remaining: 0, ..
      } => {
        self.path.pop().map_err(map_path_error)?;
        self.path_filter_results.pop();

        Ok(current_filter_state)
      }

      _ => Ok(current_filter_state),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::dictionary;

  fn parts_for_element(
    tag: DataElementTag,
    value_bytes: &[u8],
  ) -> Vec<P10Part> {
    vec![
      P10Part::DataElementHeader {
        tag,
        vr: ValueRepresentation::LongText,
        length: value_bytes.len() as u32,
        path: DataSetPath::new_with_data_element(tag),
      },
      P10Part::DataElementValueBytes {
        tag,
        vr: ValueRepresentation::LongText,
        data: value_bytes.to_vec().into(),
        bytes_remaining: 0,
      },
    ]
  }

  #[test]
  fn add_part_test() {
    let mut filter = P10FilterTransform::new(Box::new(
      |tag, _vr, _length, _path| tag != dictionary::PATIENT_ID.tag,
    ));

    for part in parts_for_element(dictionary::PATIENT_NAME.tag, b"AB") {
      assert_eq!(filter.add_part(&part), Ok(true));
    }

    for part in parts_for_element(dictionary::PATIENT_ID.tag, b"12") {
      assert_eq!(filter.add_part(&part), Ok(false));
    }
  }

  #[test]
  fn filters_nested_content_test() {
    let sequence_tag = dictionary::REFERENCED_IMAGE_SEQUENCE.tag;

    let mut filter = P10FilterTransform::new(Box::new(
      move |tag, _vr, _length, _path| tag != sequence_tag,
    ));

    assert_eq!(
      filter.add_part(&P10Part::SequenceStart {
        tag: sequence_tag,
        vr: ValueRepresentation::Sequence,
        path: DataSetPath::new_with_data_element(sequence_tag),
      }),
      Ok(false)
    );

    assert_eq!(
      filter.add_part(&P10Part::SequenceItemStart { index: 0 }),
      Ok(false)
    );

    // Data elements nested in a filtered out sequence don't pass, and their
    // predicate isn't consulted
    for part in parts_for_element(dictionary::PATIENT_NAME.tag, b"AB") {
      assert_eq!(filter.add_part(&part), Ok(false));
    }

    assert_eq!(filter.add_part(&P10Part::SequenceItemDelimiter), Ok(false));

    assert_eq!(
      filter.add_part(&P10Part::SequenceDelimiter { tag: sequence_tag }),
      Ok(false)
    );

    // Once the sequence has ended, data elements pass again
    for part in parts_for_element(dictionary::PATIENT_NAME.tag, b"AB") {
      assert_eq!(filter.add_part(&part), Ok(true));
    }
  }
}
