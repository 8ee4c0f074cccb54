//! Insertion of data elements into a stream of DICOM P10 parts.

use dcmstream_core::{DataElementTag, DataElementValue, DataSet, DataSetPath};

use crate::{P10Error, P10FilterTransform, P10Part, p10_part};

/// Inserts data elements into the root data set of a stream of DICOM P10
/// parts, maintaining ascending tag order.
///
pub struct P10InsertTransform {
  data_elements_to_insert: Vec<(DataElementTag, DataElementValue)>,
  filter_transform: P10FilterTransform,
}

impl P10InsertTransform {
  /// Creates a new insert transform that inserts the given data elements into
  /// the root data set of a part stream.
  ///
  pub fn new(data_elements_to_insert: DataSet) -> Self {
    let tags_to_insert = data_elements_to_insert.tags();

    // Data elements being inserted are filtered out of the incoming stream so
    // the result has no duplicates
    let filter_transform =
      P10FilterTransform::new(Box::new(move |tag, _vr, _length, path| {
        !path.is_root() || !tags_to_insert.contains(&tag)
      }));

    Self {
      data_elements_to_insert: data_elements_to_insert
        .into_iter()
        .rev()
        .collect(),
      filter_transform,
    }
  }

  /// Adds the next part to this insert transform and returns the resulting
  /// parts.
  ///
  pub fn add_part(&mut self, part: &P10Part) -> Result<Vec<P10Part>, P10Error> {
    // Once everything is inserted, parts pass straight through
    if self.data_elements_to_insert.is_empty() {
      return Ok(vec![part.clone()]);
    }

    let is_at_root = self.filter_transform.is_at_root();

    if !self.filter_transform.add_part(part)? {
      return Ok(vec![]);
    }

    // Insertion only happens in the root data set
    if !is_at_root {
      return Ok(vec![part.clone()]);
    }

    let mut output_parts = vec![];

    match part {
      // On the start of a new data element, first emit any data elements that
      // sort before it
      P10Part::SequenceStart { tag, path, .. }
      | P10Part::DataElementHeader { tag, path, .. } => {
        while let Some(data_element) = self.data_elements_to_insert.pop() {
          if data_element.0.to_int() >= tag.to_int() {
            self.data_elements_to_insert.push(data_element);
            break;
          }

          let mut path = path.clone();
          path
            .pop()
            .and_then(|_| path.add_data_element(data_element.0))
            .map_err(|_| P10Error::PartStreamInvalid {
              when: "Adding part to insert transform".to_string(),
              details: "Failed altering path for data element to insert"
                .to_string(),
              part: part.clone(),
            })?;

          Self::append_data_element_parts(
            data_element,
            &path,
            &mut output_parts,
          );
        }

        output_parts.push(part.clone());
      }

      // At the end of the part stream, emit any data elements still pending
      P10Part::End => {
        while let Some(data_element) = self.data_elements_to_insert.pop() {
          let tag = data_element.0;

          Self::append_data_element_parts(
            data_element,
            &DataSetPath::new_with_data_element(tag),
            &mut output_parts,
          );
        }

        output_parts.push(P10Part::End);
      }

      _ => output_parts.push(part.clone()),
    };

    Ok(output_parts)
  }

  fn append_data_element_parts(
    data_element: (DataElementTag, DataElementValue),
    path: &DataSetPath,
    output_parts: &mut Vec<P10Part>,
  ) {
    p10_part::data_element_to_parts::<()>(
      data_element.0,
      &data_element.1,
      path,
      &mut |part: &P10Part| {
        output_parts.push(part.clone());
        Ok(())
      },
    )
    .unwrap();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::ValueRepresentation;

  #[test]
  fn add_part_test() {
    let data_elements_to_insert: DataSet = vec![
      (
        DataElementTag::new(0, 0),
        DataElementValue::new_long_text("00").unwrap(),
      ),
      (
        DataElementTag::new(1, 0),
        DataElementValue::new_long_text("01").unwrap(),
      ),
      (
        DataElementTag::new(3, 0),
        DataElementValue::new_long_text("03").unwrap(),
      ),
      (
        DataElementTag::new(4, 0),
        DataElementValue::new_long_text("04").unwrap(),
      ),
      (
        DataElementTag::new(6, 0),
        DataElementValue::new_long_text("06").unwrap(),
      ),
      (
        DataElementTag::new(7, 0),
        DataElementValue::new_long_text("07").unwrap(),
      ),
    ]
    .into_iter()
    .collect();

    let mut insert_transform = P10InsertTransform::new(data_elements_to_insert);

    let input_parts: Vec<P10Part> = vec![
      parts_for_tag(DataElementTag::new(2, 0), b"12"),
      parts_for_tag(DataElementTag::new(5, 0), b"15"),
      parts_for_tag(DataElementTag::new(6, 0), b"16"),
      vec![P10Part::End],
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut output_parts = vec![];
    for part in input_parts {
      output_parts
        .extend_from_slice(insert_transform.add_part(&part).unwrap().as_slice());
    }

    assert_eq!(
      output_parts,
      vec![
        parts_for_tag(DataElementTag::new(0, 0), b"00"),
        parts_for_tag(DataElementTag::new(1, 0), b"01"),
        parts_for_tag(DataElementTag::new(2, 0), b"12"),
        parts_for_tag(DataElementTag::new(3, 0), b"03"),
        parts_for_tag(DataElementTag::new(4, 0), b"04"),
        parts_for_tag(DataElementTag::new(5, 0), b"15"),
        parts_for_tag(DataElementTag::new(6, 0), b"06"),
        parts_for_tag(DataElementTag::new(7, 0), b"07"),
        vec![P10Part::End],
      ]
      .into_iter()
      .flatten()
      .collect::<Vec<P10Part>>()
    );
  }

  fn parts_for_tag(tag: DataElementTag, value_bytes: &[u8]) -> Vec<P10Part> {
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
}
