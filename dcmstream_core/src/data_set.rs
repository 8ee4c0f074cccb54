//! A DICOM data set: a mapping of data element tags to data element values.

pub mod print;

use std::collections::BTreeMap;

use crate::data_element_value::{age_string, date, date_time, person_name, time};
use crate::data_set_path::DataSetPathEntry;
use crate::{
  DataElementTag, DataElementValue, DataError, DataSetPath,
  DataSetPrintOptions, SharedBytes, TransferSyntax, ValueRepresentation,
  dictionary,
};

/// A DICOM data set. Data elements are keyed by tag and iterate in ascending
/// tag order regardless of insertion order. Inserting a tag that is already
/// present replaces the existing value.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSet(BTreeMap<DataElementTag, DataElementValue>);

/// The result of looking up a [`DataSetPath`] in a data set: either a data
/// element value, or a sequence item, i.e. a nested data set.
///
enum DataSetLookupResult<'a> {
  DataElementValue(&'a DataElementValue),
  DataSet(&'a DataSet),
}

impl DataSet {
  /// Returns a new empty data set.
  ///
  pub fn new() -> Self {
    Self(BTreeMap::new())
  }

  /// Returns the number of data elements in this data set.
  ///
  pub fn size(&self) -> usize {
    self.0.len()
  }

  /// Returns whether this data set contains no data elements.
  ///
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns whether a data element with the given tag is present.
  ///
  pub fn has(&self, tag: DataElementTag) -> bool {
    self.0.contains_key(&tag)
  }

  /// Returns a new data set holding this data set's File Meta Information,
  /// i.e. its data elements with a group of 2.
  ///
  /// The *'(0002,0002) Media Storage SOP Class UID'* and *'(0002,0003) Media
  /// Storage SOP Instance UID'* data elements are set to match the
  /// *'(0008,0016) SOP Class UID'* and *'(0008,0018) SOP Instance UID'*
  /// data elements when those are present.
  ///
  pub fn file_meta_information(&self) -> DataSet {
    let mut file_meta_information: DataSet = self
      .0
      .range(
        DataElementTag::new(2, 0x0000)..=DataElementTag::new(2, 0xFFFF),
      )
      .map(|(tag, value)| (*tag, value.clone()))
      .collect();

    // Sequences and encapsulated pixel data aren't allowed in File Meta
    // Information
    file_meta_information
      .0
      .retain(|_tag, value| value.bytes().is_ok());

    if let Ok(value) = self.get_value(dictionary::SOP_CLASS_UID.tag) {
      file_meta_information
        .insert(dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag, value.clone());
    } else {
      file_meta_information.delete(dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag);
    }

    if let Ok(value) = self.get_value(dictionary::SOP_INSTANCE_UID.tag) {
      file_meta_information.insert(
        dictionary::MEDIA_STORAGE_SOP_INSTANCE_UID.tag,
        value.clone(),
      );
    } else {
      file_meta_information
        .delete(dictionary::MEDIA_STORAGE_SOP_INSTANCE_UID.tag);
    }

    file_meta_information
  }

  /// Inserts a data element into this data set, replacing any existing value
  /// for the tag.
  ///
  pub fn insert(&mut self, tag: DataElementTag, value: DataElementValue) {
    self.0.insert(tag, value);
  }

  /// Inserts a new binary value into this data set.
  ///
  pub fn insert_binary_value(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    bytes: SharedBytes,
  ) -> Result<(), DataError> {
    self.insert(tag, DataElementValue::new_binary(vr, bytes)?);

    Ok(())
  }

  /// Inserts a data element holding an age string value. The data element is
  /// specified through its dictionary entry.
  ///
  pub fn insert_age_string_value(
    &mut self,
    item: &dictionary::Item,
    value: &age_string::StructuredAge,
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(1) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::AgeString] => {
        DataElementValue::new_age_string(value)
      }
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding an attribute tag value. The data element
  /// is specified through its dictionary entry.
  ///
  pub fn insert_attribute_tag_value(
    &mut self,
    item: &dictionary::Item,
    value: &[DataElementTag],
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(value.len()) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::AttributeTag] => {
        DataElementValue::new_attribute_tag(value)
      }
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding a date value. The data element is
  /// specified through its dictionary entry.
  ///
  pub fn insert_date_value(
    &mut self,
    item: &dictionary::Item,
    value: &date::StructuredDate,
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(1) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::Date] => DataElementValue::new_date(value),
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding a date/time value. The data element is
  /// specified through its dictionary entry.
  ///
  pub fn insert_date_time_value(
    &mut self,
    item: &dictionary::Item,
    value: &date_time::StructuredDateTime,
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(1) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::DateTime] => {
        DataElementValue::new_date_time(value)
      }
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding float values, selecting the VR from the
  /// data element's dictionary entry.
  ///
  pub fn insert_float_value(
    &mut self,
    item: &dictionary::Item,
    value: &[f64],
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(value.len()) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::DecimalString] => {
        DataElementValue::new_decimal_string(value)
      }
      [ValueRepresentation::FloatingPointDouble] => {
        DataElementValue::new_floating_point_double(value)
      }
      [ValueRepresentation::FloatingPointSingle] => {
        DataElementValue::new_floating_point_single(
          value.iter().map(|f| *f as f32).collect::<Vec<f32>>().as_slice(),
        )
      }
      [ValueRepresentation::OtherDoubleString] => {
        DataElementValue::new_other_double_string(value)
      }
      [ValueRepresentation::OtherFloatString] => {
        DataElementValue::new_other_float_string(
          value.iter().map(|f| *f as f32).collect::<Vec<f32>>().as_slice(),
        )
      }

      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding integer values, selecting the VR from the
  /// data element's dictionary entry.
  ///
  pub fn insert_int_value(
    &mut self,
    item: &dictionary::Item,
    value: &[i64],
  ) -> Result<(), DataError> {
    fn convert_and_build<U>(
      value: &[i64],
      converter: fn(i64) -> Result<U, std::num::TryFromIntError>,
      builder: fn(&[U]) -> Result<DataElementValue, DataError>,
      vr: ValueRepresentation,
    ) -> Result<DataElementValue, DataError> {
      let converted = value
        .iter()
        .map(|i| {
          converter(*i).map_err(|_| {
            DataError::new_value_invalid(format!(
              "Value {} is out of range for the {} VR",
              i, vr,
            ))
          })
        })
        .collect::<Result<Vec<U>, DataError>>()?;

      builder(&converted)
    }

    if !item.multiplicity.contains(value.len()) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::IntegerString] => convert_and_build(
        value,
        i32::try_from,
        DataElementValue::new_integer_string,
        ValueRepresentation::IntegerString,
      ),

      [ValueRepresentation::SignedLong] => convert_and_build(
        value,
        i32::try_from,
        DataElementValue::new_signed_long,
        ValueRepresentation::SignedLong,
      ),

      [ValueRepresentation::SignedShort] => convert_and_build(
        value,
        i16::try_from,
        DataElementValue::new_signed_short,
        ValueRepresentation::SignedShort,
      ),

      [ValueRepresentation::UnsignedLong] => convert_and_build(
        value,
        u32::try_from,
        DataElementValue::new_unsigned_long,
        ValueRepresentation::UnsignedLong,
      ),

      [ValueRepresentation::UnsignedShort] => convert_and_build(
        value,
        u16::try_from,
        DataElementValue::new_unsigned_short,
        ValueRepresentation::UnsignedShort,
      ),

      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding 64-bit integer values, selecting the VR
  /// from the data element's dictionary entry.
  ///
  pub fn insert_big_int_value(
    &mut self,
    item: &dictionary::Item,
    value: &[i128],
  ) -> Result<(), DataError> {
    fn convert_and_build<U>(
      value: &[i128],
      converter: fn(i128) -> Result<U, std::num::TryFromIntError>,
      builder: fn(&[U]) -> Result<DataElementValue, DataError>,
      vr: ValueRepresentation,
      tag: DataElementTag,
    ) -> Result<DataElementValue, DataError> {
      let converted = value
        .iter()
        .map(|i| {
          converter(*i).map_err(|_| {
            DataError::new_value_invalid(format!(
              "Value {} is out of range for the {} VR",
              i, vr
            ))
            .with_path(&DataSetPath::new_with_data_element(tag))
          })
        })
        .collect::<Result<Vec<U>, DataError>>()?;

      builder(&converted)
    }

    if !item.multiplicity.contains(value.len()) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::SignedVeryLong] => convert_and_build(
        value,
        i64::try_from,
        DataElementValue::new_signed_very_long,
        ValueRepresentation::SignedVeryLong,
        item.tag,
      ),

      [ValueRepresentation::UnsignedVeryLong] => convert_and_build(
        value,
        u64::try_from,
        DataElementValue::new_unsigned_very_long,
        ValueRepresentation::UnsignedVeryLong,
        item.tag,
      ),

      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding person name values. The data element is
  /// specified through its dictionary entry.
  ///
  pub fn insert_person_name_value(
    &mut self,
    item: &dictionary::Item,
    value: &[person_name::StructuredPersonName],
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(value.len()) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::PersonName] => {
        DataElementValue::new_person_name(value)
      }
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding a sequence. The data element is specified
  /// through its dictionary entry.
  ///
  pub fn insert_sequence_value(
    &mut self,
    item: &dictionary::Item,
    items: Vec<Self>,
  ) -> Result<(), DataError> {
    let value = match item.vrs {
      [ValueRepresentation::Sequence] => {
        Ok(DataElementValue::new_sequence(items))
      }
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding string values, selecting the VR from the
  /// data element's dictionary entry.
  ///
  pub fn insert_string_value(
    &mut self,
    item: &dictionary::Item,
    value: &[&str],
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(value.len()) {
      return invalid_insert_error(item);
    }

    let value = match (item.vrs, value) {
      ([ValueRepresentation::ApplicationEntity], [value]) => {
        DataElementValue::new_application_entity(value)
      }
      ([ValueRepresentation::CodeString], _) => {
        DataElementValue::new_code_string(value)
      }
      ([ValueRepresentation::LongString], _) => {
        DataElementValue::new_long_string(value)
      }
      ([ValueRepresentation::LongText], [value]) => {
        DataElementValue::new_long_text(value)
      }
      ([ValueRepresentation::ShortString], _) => {
        DataElementValue::new_short_string(value)
      }
      ([ValueRepresentation::ShortText], [value]) => {
        DataElementValue::new_short_text(value)
      }
      ([ValueRepresentation::UniqueIdentifier], _) => {
        DataElementValue::new_unique_identifier(value)
      }
      ([ValueRepresentation::UniversalResourceIdentifier], [value]) => {
        DataElementValue::new_universal_resource_identifier(value)
      }
      ([ValueRepresentation::UnlimitedCharacters], _) => {
        DataElementValue::new_unlimited_characters(value)
      }
      ([ValueRepresentation::UnlimitedText], [value]) => {
        DataElementValue::new_unlimited_text(value)
      }

      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Inserts a data element holding a time value. The data element is
  /// specified through its dictionary entry.
  ///
  pub fn insert_time_value(
    &mut self,
    item: &dictionary::Item,
    value: &time::StructuredTime,
  ) -> Result<(), DataError> {
    if !item.multiplicity.contains(1) {
      return invalid_insert_error(item);
    }

    let value = match item.vrs {
      [ValueRepresentation::Time] => DataElementValue::new_time(value),
      _ => invalid_insert_error(item),
    }?;

    self.0.insert(item.tag, value);

    Ok(())
  }

  /// Merges another data set into this one. Data elements from the other data
  /// set take precedence.
  ///
  pub fn merge(&mut self, other: Self) {
    self.0.extend(other.0);
  }

  /// Deletes the data element with the given tag, if present.
  ///
  pub fn delete(&mut self, tag: DataElementTag) {
    self.0.remove(&tag);
  }

  /// Keeps only the data elements for which the predicate returns true.
  ///
  pub fn retain(
    &mut self,
    predicate: impl FnMut(&DataElementTag, &mut DataElementValue) -> bool,
  ) {
    self.0.retain(predicate);
  }

  /// Returns the tags in this data set in ascending order.
  ///
  pub fn tags(&self) -> Vec<DataElementTag> {
    self.0.keys().copied().collect()
  }

  /// Returns an iterator over this data set's elements in ascending tag
  /// order.
  ///
  pub fn iter(
    &self,
  ) -> std::collections::btree_map::Iter<'_, DataElementTag, DataElementValue>
  {
    self.0.iter()
  }

  /// Returns a mutable iterator over this data set's elements in ascending
  /// tag order.
  ///
  pub fn iter_mut(
    &mut self,
  ) -> std::collections::btree_map::IterMut<'_, DataElementTag, DataElementValue>
  {
    self.0.iter_mut()
  }

  /// Folds over every data element in this data set, recursing into
  /// sequences. The callback receives the accumulator, the path of the
  /// current data element, and its value. Elements are visited in ascending
  /// tag order, parents before their sequence items.
  ///
  pub fn fold<T>(
    &self,
    initial: T,
    mut callback: impl FnMut(T, &DataSetPath, &DataElementValue) -> T,
  ) -> T {
    let mut path = DataSetPath::new();

    self.fold_at_path(&mut path, initial, &mut callback)
  }

  fn fold_at_path<T, F>(
    &self,
    path: &mut DataSetPath,
    mut accumulator: T,
    callback: &mut F,
  ) -> T
  where
    F: FnMut(T, &DataSetPath, &DataElementValue) -> T,
  {
    for (tag, value) in self.iter() {
      path.add_data_element(*tag).unwrap();

      accumulator = callback(accumulator, path, value);

      if let Ok(items) = value.sequence_items() {
        for (index, item) in items.iter().enumerate() {
          path.add_sequence_item(index).unwrap();
          accumulator = item.fold_at_path(path, accumulator, callback);
          path.pop().unwrap();
        }
      }

      path.pop().unwrap();
    }

    accumulator
  }

  /// Splits this data set in two based on a predicate. The first returned
  /// data set holds the data elements the predicate matched, the second holds
  /// the rest. Both preserve tag order.
  ///
  pub fn partition(
    &self,
    mut predicate: impl FnMut(DataElementTag) -> bool,
  ) -> (DataSet, DataSet) {
    let mut matched = DataSet::new();
    let mut unmatched = DataSet::new();

    for (tag, value) in self.iter() {
      if predicate(*tag) {
        matched.insert(*tag, value.clone());
      } else {
        unmatched.insert(*tag, value.clone());
      }
    }

    (matched, unmatched)
  }

  /// Prints this data set to stdout formatted for readability.
  ///
  pub fn print(&self) {
    self.print_with_options(&DataSetPrintOptions::default());
  }

  /// Prints this data set to stdout formatted for readability using the given
  /// print options.
  ///
  pub fn print_with_options(&self, print_options: &DataSetPrintOptions) {
    self.to_lines(print_options, &mut |line| {
      println!("{}", line);
    })
  }

  /// Converts this data set to printable lines using the given print options.
  /// The lines are returned through a callback.
  ///
  pub fn to_lines(
    &self,
    print_options: &DataSetPrintOptions,
    callback: &mut impl FnMut(String),
  ) {
    print::data_set_to_lines(self, print_options, callback, 0);
  }

  /// Looks up a path in this data set and returns the data element value or
  /// nested data set it addresses.
  ///
  fn lookup(
    &self,
    path: &DataSetPath,
  ) -> Result<DataSetLookupResult, DataError> {
    let mut lookup_result = DataSetLookupResult::DataSet(self);

    for entry in path.entries().iter() {
      match lookup_result {
        DataSetLookupResult::DataElementValue(value) => {
          if let DataSetPathEntry::SequenceItem { index } = entry {
            if let Ok(items) = value.sequence_items() {
              if let Some(item) = items.get(*index) {
                lookup_result = DataSetLookupResult::DataSet(item);
                continue;
              }
            }
          }

          return Err(DataError::new_tag_not_present().with_path(path));
        }

        DataSetLookupResult::DataSet(data_set) => {
          if let DataSetPathEntry::DataElement { tag } = entry {
            if let Some(value) = data_set.0.get(tag) {
              lookup_result = DataSetLookupResult::DataElementValue(value);
              continue;
            }
          }

          return Err(DataError::new_tag_not_present().with_path(path));
        }
      }
    }

    Ok(lookup_result)
  }

  /// Returns the data element value for the given tag.
  ///
  pub fn get_value(
    &self,
    tag: DataElementTag,
  ) -> Result<&DataElementValue, DataError> {
    match self.0.get(&tag) {
      Some(value) => Ok(value),
      None => Err(
        DataError::new_tag_not_present()
          .with_path(&DataSetPath::new_with_data_element(tag)),
      ),
    }
  }

  /// Returns the data element value at the given path, which must end with a
  /// data element tag.
  ///
  pub fn get_value_at_path(
    &self,
    path: &DataSetPath,
  ) -> Result<&DataElementValue, DataError> {
    match self.lookup(path) {
      Ok(DataSetLookupResult::DataElementValue(value)) => Ok(value),
      _ => Err(DataError::new_tag_not_present().with_path(path)),
    }
  }

  /// Returns the nested data set at the given path, which must be empty or
  /// end with a sequence item index.
  ///
  pub fn get_data_set_at_path(
    &self,
    path: &DataSetPath,
  ) -> Result<&DataSet, DataError> {
    match self.lookup(path) {
      Ok(DataSetLookupResult::DataSet(data_set)) => Ok(data_set),
      _ => Err(DataError::new_tag_not_present().with_path(path)),
    }
  }

  /// Returns the raw value bytes for the given tag when the value has the
  /// expected VR.
  ///
  /// See [`DataElementValue::bytes()`].
  ///
  pub fn get_value_bytes(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
  ) -> Result<&SharedBytes, DataError> {
    let value = self.get_value(tag)?;

    if value.value_representation() == vr {
      value
        .bytes()
        .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
    } else {
      Err(
        DataError::new_value_not_present()
          .with_path(&DataSetPath::new_with_data_element(tag)),
      )
    }
  }

  /// Returns the single string value of the data element with the given tag.
  ///
  pub fn get_string(&self, tag: DataElementTag) -> Result<&str, DataError> {
    self
      .get_value(tag)?
      .get_string()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all string values of the data element with the given tag.
  ///
  pub fn get_strings(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<&str>, DataError> {
    self
      .get_value(tag)?
      .get_strings()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the single integer value of the data element with the given tag.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
  ) -> Result<T, DataError> {
    self
      .get_value(tag)?
      .get_int()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the single integer value of the data element with the given tag,
  /// or a default when the data element isn't present.
  ///
  pub fn get_int_with_default<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
    default: T,
  ) -> Result<T, DataError> {
    match self.get_int(tag) {
      Ok(value) => Ok(value),
      Err(e) if e.is_tag_not_present() => Ok(default),
      Err(e) => Err(e),
    }
  }

  /// Returns all integer values of the data element with the given tag.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<T>, DataError> {
    self
      .get_value(tag)?
      .get_ints()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the single 64-bit integer value of the data element with the
  /// given tag.
  ///
  pub fn get_big_int<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
    tag: DataElementTag,
  ) -> Result<T, DataError> {
    self
      .get_value(tag)?
      .get_big_int()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all 64-bit integer values of the data element with the given
  /// tag.
  ///
  pub fn get_big_ints<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<T>, DataError> {
    self
      .get_value(tag)?
      .get_big_ints()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the single float value of the data element with the given tag.
  ///
  pub fn get_float(&self, tag: DataElementTag) -> Result<f64, DataError> {
    self
      .get_value(tag)?
      .get_float()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all float values of the data element with the given tag.
  ///
  pub fn get_floats(&self, tag: DataElementTag) -> Result<Vec<f64>, DataError> {
    self
      .get_value(tag)?
      .get_floats()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the structured age value of the data element with the given tag.
  ///
  pub fn get_age(
    &self,
    tag: DataElementTag,
  ) -> Result<age_string::StructuredAge, DataError> {
    self
      .get_value(tag)?
      .get_age()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the structured date value of the data element with the given
  /// tag.
  ///
  pub fn get_date(
    &self,
    tag: DataElementTag,
  ) -> Result<date::StructuredDate, DataError> {
    self
      .get_value(tag)?
      .get_date()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the structured date/time value of the data element with the
  /// given tag.
  ///
  pub fn get_date_time(
    &self,
    tag: DataElementTag,
  ) -> Result<date_time::StructuredDateTime, DataError> {
    self
      .get_value(tag)?
      .get_date_time()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the structured time value of the data element with the given
  /// tag.
  ///
  pub fn get_time(
    &self,
    tag: DataElementTag,
  ) -> Result<time::StructuredTime, DataError> {
    self
      .get_value(tag)?
      .get_time()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the single person name value of the data element with the given
  /// tag.
  ///
  pub fn get_person_name(
    &self,
    tag: DataElementTag,
  ) -> Result<person_name::StructuredPersonName, DataError> {
    self
      .get_value(tag)?
      .get_person_name()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all person name values of the data element with the given tag.
  ///
  pub fn get_person_names(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<person_name::StructuredPersonName>, DataError> {
    self
      .get_value(tag)?
      .get_person_names()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Looks up the *'(0002,0010) Transfer Syntax UID'* data element and
  /// converts its value to a known transfer syntax definition.
  ///
  pub fn get_transfer_syntax(
    &self,
  ) -> Result<&'static TransferSyntax, DataError> {
    let transfer_syntax_uid =
      self.get_string(dictionary::TRANSFER_SYNTAX_UID.tag)?;

    TransferSyntax::from_uid(transfer_syntax_uid).map_err(|_| {
      DataError::new_value_invalid(format!(
        "Unrecognized transfer syntax UID: '{}'",
        transfer_syntax_uid
      ))
    })
  }

  /// Returns the size in bytes of all data elements in this data set.
  ///
  /// See [`DataElementValue::total_byte_size()`].
  ///
  pub fn total_byte_size(&self) -> u64 {
    self.iter().map(|(_, value)| value.total_byte_size()).sum()
  }

  /// Returns the display name of a data element tag, using the other data
  /// elements in this data set to resolve the private creator when the tag is
  /// private.
  ///
  pub fn tag_name(&self, tag: DataElementTag) -> &'static str {
    let private_creator = self.private_creator_for_tag(tag).ok();

    dictionary::tag_name(tag, private_creator)
  }

  /// Formats a data element tag with its display name, e.g.
  /// `"(0008,0020) Study Date"`, using the other data elements in this data
  /// set to resolve the private creator when the tag is private.
  ///
  pub fn tag_with_name(&self, tag: DataElementTag) -> String {
    let private_creator = self.private_creator_for_tag(tag).ok();

    dictionary::tag_with_name(tag, private_creator)
  }

  /// Returns the value of the *'(gggg,00xx) Private Creator'* data element
  /// that applies to the given private tag.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn private_creator_for_tag(
    &self,
    tag: DataElementTag,
  ) -> Result<&str, ()> {
    if !tag.is_private() {
      return Err(());
    }

    let private_creator_tag = DataElementTag::new(tag.group, tag.element >> 8);

    if private_creator_tag.element < 0x10 {
      return Err(());
    }

    self.get_string(private_creator_tag).map_err(|_| ())
  }

  /// Removes all data elements in private groups, including those inside
  /// sequences.
  ///
  pub fn delete_private_elements(&mut self) {
    self.0.retain(|tag, value| {
      if tag.is_private() {
        return false;
      }

      if let Ok(items) = value.sequence_items_mut() {
        for item in items.iter_mut() {
          item.delete_private_elements();
        }
      }

      true
    })
  }

  /// Returns a new data set holding the private block for the given group and
  /// private creator name. The group must be odd, and the private creator
  /// name must match exactly.
  ///
  /// Ref: PS3.5 7.8.1.
  ///
  pub fn private_block(
    &self,
    group: u16,
    private_creator: &str,
  ) -> Result<Self, String> {
    if group & 1 == 0 {
      return Err("Private group number is even".to_string());
    }

    let private_creator_value =
      DataElementValue::new_long_string(&[private_creator])
        .map_err(|_| "Private creator name is invalid")?;

    // Search for the '(gggg,00XX) Private Creator' data element that reserves
    // the block
    let mut private_creator_element = None;
    for element in 0x10..=0xFF {
      if self.0.get(&DataElementTag::new(group, element))
        == Some(&private_creator_value)
      {
        private_creator_element = Some(element);
        break;
      }
    }

    let private_creator_element = private_creator_element
      .ok_or(format!("Private creator '{}' not found", private_creator))?;

    let element_start = private_creator_element << 8;
    let element_end = element_start | 0xFF;

    let mut result = Self::new();
    for (tag, value) in self.0.iter() {
      if tag.group == group
        && tag.element >= element_start
        && tag.element <= element_end
      {
        result.insert(*tag, value.clone());
      }
    }

    Ok(result)
  }
}

impl FromIterator<(DataElementTag, DataElementValue)> for DataSet {
  fn from_iter<T: IntoIterator<Item = (DataElementTag, DataElementValue)>>(
    iter: T,
  ) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl IntoIterator for DataSet {
  type Item = (DataElementTag, DataElementValue);

  type IntoIter =
    std::collections::btree_map::IntoIter<DataElementTag, DataElementValue>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl Extend<(DataElementTag, DataElementValue)> for DataSet {
  fn extend<T: IntoIterator<Item = (DataElementTag, DataElementValue)>>(
    &mut self,
    iter: T,
  ) {
    self.0.extend(iter);
  }
}

/// The error returned when one of the `insert_*_value` functions is called
/// with arguments that don't fit the dictionary entry.
///
fn invalid_insert_error<T>(item: &dictionary::Item) -> Result<T, DataError> {
  match item.vrs {
    [vr] => Err(DataError::new_value_invalid(format!(
      "Data element '{}' (VR: '{}', multiplicity: {}) does not support the \
       provided data",
      item.name, vr, item.multiplicity
    ))),

    vrs => Err(DataError::new_value_invalid(format!(
      "Data element '{}' supports multiple VRs: {}",
      item.name,
      vrs
        .iter()
        .map(|vr| vr.to_string())
        .collect::<Vec<String>>()
        .join(", ")
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_data_set() -> DataSet {
    let mut nested = DataSet::new();
    nested
      .insert_string_value(&dictionary::SERIES_DESCRIPTION, &["Nested"])
      .unwrap();

    let mut data_set = DataSet::new();
    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["1234"])
      .unwrap();
    data_set
      .insert_sequence_value(
        &dictionary::REFERENCED_IMAGE_SEQUENCE,
        vec![nested],
      )
      .unwrap();

    data_set
  }

  #[test]
  fn iteration_is_sorted_test() {
    let mut data_set = DataSet::new();
    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["1234"])
      .unwrap();
    data_set
      .insert_string_value(&dictionary::MODALITY, &["MR"])
      .unwrap();
    data_set
      .insert_string_value(&dictionary::ACCESSION_NUMBER, &["A1"])
      .unwrap();

    assert_eq!(
      data_set.tags(),
      vec![
        dictionary::ACCESSION_NUMBER.tag,
        dictionary::MODALITY.tag,
        dictionary::PATIENT_ID.tag,
      ]
    );
  }

  #[test]
  fn duplicate_insert_keeps_last_test() {
    let mut data_set = DataSet::new();
    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["1234"])
      .unwrap();
    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["5678"])
      .unwrap();

    assert_eq!(data_set.size(), 1);
    assert_eq!(data_set.get_string(dictionary::PATIENT_ID.tag), Ok("5678"));
  }

  #[test]
  fn get_value_at_path_test() {
    let data_set = test_data_set();

    assert_eq!(
      data_set
        .get_value_at_path(&DataSetPath::from_string("00100020").unwrap())
        .unwrap()
        .get_string(),
      Ok("1234")
    );

    assert_eq!(
      data_set
        .get_value_at_path(
          &DataSetPath::from_string("00081140/[0]/0008103E").unwrap()
        )
        .unwrap()
        .get_string(),
      Ok("Nested")
    );

    let missing_path = DataSetPath::from_string("00081140/[1]").unwrap();
    assert_eq!(
      data_set.get_data_set_at_path(&missing_path),
      Err(DataError::new_tag_not_present().with_path(&missing_path))
    );
  }

  #[test]
  fn fold_test() {
    let data_set = test_data_set();

    let visited = data_set.fold(vec![], |mut acc, path, _value| {
      acc.push(path.to_string());
      acc
    });

    assert_eq!(
      visited,
      vec![
        "00081140".to_string(),
        "00081140/[0]/0008103E".to_string(),
        "00100020".to_string(),
      ]
    );
  }

  #[test]
  fn partition_test() {
    let data_set = test_data_set();

    let (sequences, rest) =
      data_set.partition(|tag| tag == dictionary::REFERENCED_IMAGE_SEQUENCE.tag);

    assert_eq!(sequences.tags(), vec![dictionary::REFERENCED_IMAGE_SEQUENCE.tag]);
    assert_eq!(rest.tags(), vec![dictionary::PATIENT_ID.tag]);
  }

  #[test]
  fn private_creator_for_tag_test() {
    let mut data_set = DataSet::new();
    data_set.insert(
      DataElementTag::new(0x0009, 0x0010),
      DataElementValue::new_long_string(&["GEMS_IDEN_01"]).unwrap(),
    );

    assert_eq!(
      data_set.private_creator_for_tag(DataElementTag::new(0x0009, 0x1001)),
      Ok("GEMS_IDEN_01")
    );

    assert_eq!(
      data_set.private_creator_for_tag(DataElementTag::new(0x0009, 0x0001)),
      Err(())
    );

    assert_eq!(
      data_set.private_creator_for_tag(DataElementTag::new(0x0008, 0x1001)),
      Err(())
    );
  }

  #[test]
  fn private_block_test() {
    let mut data_set = DataSet::new();
    data_set.insert(
      DataElementTag::new(0x0009, 0x0010),
      DataElementValue::new_long_string(&["GEMS_IDEN_01"]).unwrap(),
    );
    data_set.insert(
      DataElementTag::new(0x0009, 0x1001),
      DataElementValue::new_long_string(&["value"]).unwrap(),
    );
    data_set.insert(
      DataElementTag::new(0x0009, 0x2001),
      DataElementValue::new_long_string(&["other block"]).unwrap(),
    );

    let block = data_set.private_block(0x0009, "GEMS_IDEN_01").unwrap();
    assert_eq!(block.tags(), vec![DataElementTag::new(0x0009, 0x1001)]);

    assert_eq!(
      data_set.private_block(0x0008, "GEMS_IDEN_01"),
      Err("Private group number is even".to_string())
    );

    assert_eq!(
      data_set.private_block(0x0009, "MISSING"),
      Err("Private creator 'MISSING' not found".to_string())
    );
  }

  #[test]
  fn delete_private_elements_test() {
    let mut nested = DataSet::new();
    nested.insert(
      DataElementTag::new(0x0009, 0x1001),
      DataElementValue::new_long_string(&["private"]).unwrap(),
    );
    nested
      .insert_string_value(&dictionary::SERIES_DESCRIPTION, &["Nested"])
      .unwrap();

    let mut data_set = DataSet::new();
    data_set
      .insert_sequence_value(
        &dictionary::REFERENCED_IMAGE_SEQUENCE,
        vec![nested],
      )
      .unwrap();
    data_set.insert(
      DataElementTag::new(0x0009, 0x1001),
      DataElementValue::new_long_string(&["private"]).unwrap(),
    );

    data_set.delete_private_elements();

    assert_eq!(data_set.tags(), vec![dictionary::REFERENCED_IMAGE_SEQUENCE.tag]);

    let items = data_set
      .get_value(dictionary::REFERENCED_IMAGE_SEQUENCE.tag)
      .unwrap()
      .sequence_items()
      .unwrap();
    assert_eq!(items[0].tags(), vec![dictionary::SERIES_DESCRIPTION.tag]);
  }
}
