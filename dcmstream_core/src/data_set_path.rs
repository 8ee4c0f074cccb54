//! A path that addresses a data element or sequence item nested anywhere in a
//! data set.

use crate::{DataElementTag, dictionary};

/// A path through the sequence hierarchy of a data set. Entries alternate
/// between data element tags and sequence item indices, and are separated by a
/// forward slash in the textual form.
///
/// Examples:
///
/// - `""`: the root data set.
/// - `"00100010"`: the *'(0010,0010) Patient Name'* data element.
/// - `"00186011/[0]"`: the first item of the *'(0018,6011) Sequence of
///   Ultrasound Regions'* sequence.
/// - `"00186011/[1]/00186014"`: the *'(0018,6014) Region Data Type'* data
///   element in that sequence's second item.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSetPath(Vec<DataSetPathEntry>);

/// A single entry in a [`DataSetPath`].
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DataSetPathEntry {
  DataElement { tag: DataElementTag },
  SequenceItem { index: usize },
}

impl DataSetPath {
  /// Creates an empty path, i.e. a path to the root data set.
  ///
  pub fn new() -> Self {
    Self(vec![])
  }

  /// Creates a path with a single entry for the given data element.
  ///
  pub fn new_with_data_element(tag: DataElementTag) -> Self {
    Self(vec![DataSetPathEntry::DataElement { tag }])
  }

  /// Returns the entries of this path.
  ///
  pub(crate) fn entries(&self) -> &[DataSetPathEntry] {
    &self.0
  }

  /// Returns the number of entries in this path.
  ///
  #[allow(clippy::len_without_is_empty)]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns whether this path is empty or addresses a data element at the
  /// root of the data set.
  ///
  pub fn is_root(&self) -> bool {
    matches!(
      self.0.as_slice(),
      [] | [DataSetPathEntry::DataElement { .. }]
    )
  }

  /// Returns the number of sequence item entries in this path.
  ///
  pub fn sequence_item_count(&self) -> usize {
    self
      .0
      .iter()
      .filter(|e| matches!(e, DataSetPathEntry::SequenceItem { .. }))
      .count()
  }

  /// Returns the tag of the final entry if it is a data element, and an error
  /// otherwise.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn final_data_element(&self) -> Result<DataElementTag, ()> {
    match self.0.last() {
      Some(DataSetPathEntry::DataElement { tag }) => Ok(*tag),
      _ => Err(()),
    }
  }

  /// Returns the tag of the innermost sequence this path passes through, and
  /// an error if the path contains no sequence items.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn last_sequence_tag(&self) -> Result<DataElementTag, ()> {
    let mut entries = self.0.iter().rev();

    while let Some(entry) = entries.next() {
      if let DataSetPathEntry::SequenceItem { .. } = entry {
        if let Some(DataSetPathEntry::DataElement { tag }) = entries.next() {
          return Ok(*tag);
        }
      }
    }

    Err(())
  }

  /// Appends a data element entry. This is only valid when the path is empty
  /// or currently ends with a sequence item.
  ///
  pub fn add_data_element(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(), String> {
    match self.0.last() {
      None | Some(DataSetPathEntry::SequenceItem { .. }) => {
        self.0.push(DataSetPathEntry::DataElement { tag });
        Ok(())
      }
      _ => Err(format!(
        "Invalid data set path entry: {}",
        tag.to_hex_string()
      )),
    }
  }

  /// Appends a sequence item entry. This is only valid when the path
  /// currently ends with a data element.
  ///
  pub fn add_sequence_item(&mut self, index: usize) -> Result<(), String> {
    match self.0.last() {
      Some(DataSetPathEntry::DataElement { .. }) => {
        self.0.push(DataSetPathEntry::SequenceItem { index });
        Ok(())
      }
      _ => Err(format!("Invalid data set path entry: [{}]", index)),
    }
  }

  /// Removes the final entry of this path.
  ///
  pub fn pop(&mut self) -> Result<(), String> {
    match self.0.pop() {
      Some(_) => Ok(()),
      None => Err("Data set path is empty".to_string()),
    }
  }

  /// Parses a path from its textual form, e.g. `"00186011/[0]/00186014"`.
  ///
  pub fn from_string(s: &str) -> Result<Self, String> {
    let mut path = Self::new();

    if s.is_empty() {
      return Ok(path);
    }

    for entry in s.split('/') {
      if let Ok(tag) = DataElementTag::from_hex_string(entry) {
        path.add_data_element(tag)?;
        continue;
      }

      if let Some(index) = entry
        .strip_prefix('[')
        .and_then(|e| e.strip_suffix(']'))
        .and_then(|e| e.parse::<usize>().ok())
      {
        path.add_sequence_item(index)?;
        continue;
      }

      return Err(format!("Invalid data set path entry: {}", entry));
    }

    Ok(path)
  }

  /// Formats a path with the name of each data element included, for use in
  /// error messages and other human-facing output.
  ///
  pub fn to_detailed_string(&self) -> String {
    self
      .0
      .iter()
      .map(|entry| match entry {
        DataSetPathEntry::DataElement { tag } => {
          dictionary::tag_with_name(*tag, None)
        }
        DataSetPathEntry::SequenceItem { index } => format!("Item {}", index),
      })
      .collect::<Vec<_>>()
      .join(" / ")
  }
}

impl core::fmt::Display for DataSetPath {
  /// Formats a path as its entries separated by forward slashes.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let path = self
      .0
      .iter()
      .map(|entry| match entry {
        DataSetPathEntry::DataElement { tag } => tag.to_hex_string(),
        DataSetPathEntry::SequenceItem { index } => format!("[{}]", index),
      })
      .collect::<Vec<_>>()
      .join("/");

    f.write_str(&path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_string_test() {
    let mut path = DataSetPath::new();

    assert_eq!(
      path.add_data_element(DataElementTag::new(0x1234, 0x5678)),
      Ok(())
    );
    assert_eq!(&path.to_string(), "12345678");

    assert_eq!(
      path.add_data_element(DataElementTag::new(0x1234, 0x5678)),
      Err("Invalid data set path entry: 12345678".to_string())
    );

    assert_eq!(path.add_sequence_item(2), Ok(()));
    assert_eq!(&path.to_string(), "12345678/[2]");

    assert_eq!(
      path.add_sequence_item(2),
      Err("Invalid data set path entry: [2]".to_string())
    );

    assert_eq!(
      path.add_data_element(DataElementTag::new(0x1122, 0x3344)),
      Ok(())
    );
    assert_eq!(&path.to_string(), "12345678/[2]/11223344");
  }

  #[test]
  fn from_string_test() {
    assert_eq!(DataSetPath::from_string(""), Ok(DataSetPath::new()));

    let mut path = DataSetPath::new();
    path
      .add_data_element(DataElementTag::new(0x1234, 0x5678))
      .unwrap();
    assert_eq!(DataSetPath::from_string("12345678"), Ok(path.clone()));

    path.add_sequence_item(2).unwrap();
    assert_eq!(DataSetPath::from_string("12345678/[2]"), Ok(path.clone()));

    path
      .add_data_element(DataElementTag::new(0x1122, 0x3344))
      .unwrap();
    assert_eq!(
      DataSetPath::from_string("12345678/[2]/11223344"),
      Ok(path.clone())
    );

    assert_eq!(
      DataSetPath::from_string("12345678/[2]/11223344").unwrap().to_string(),
      "12345678/[2]/11223344"
    );

    assert_eq!(
      DataSetPath::from_string("12345678/11223344"),
      Err("Invalid data set path entry: 11223344".to_string())
    );

    assert_eq!(
      DataSetPath::from_string("bogus"),
      Err("Invalid data set path entry: bogus".to_string())
    );
  }

  #[test]
  fn last_sequence_tag_test() {
    assert_eq!(DataSetPath::new().last_sequence_tag(), Err(()));

    let path = DataSetPath::from_string("12345678/[2]/11223344").unwrap();
    assert_eq!(
      path.last_sequence_tag(),
      Ok(DataElementTag::new(0x1234, 0x5678))
    );
  }
}
