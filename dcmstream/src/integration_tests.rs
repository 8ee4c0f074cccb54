//! Integration tests that exercise reading, writing, and pixel data frame
//! extraction together.

use crate::*;

/// Serializes a data set to DICOM P10 bytes held in memory.
///
fn write_to_bytes(data_set: &DataSet) -> Vec<u8> {
  let mut bytes = vec![];

  data_set
    .to_p10_bytes(
      &mut |chunk| {
        bytes.extend_from_slice(&chunk);
        Ok(())
      },
      None,
    )
    .unwrap();

  bytes
}

/// Parses DICOM P10 bytes into a data set.
///
fn read_from_bytes(bytes: Vec<u8>) -> DataSet {
  DataSet::read_p10_bytes(bytes.into()).unwrap()
}

#[test]
fn explicit_vr_little_endian_round_trip_test() {
  let mut data_set = DataSet::new();
  data_set
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid],
    )
    .unwrap();
  data_set
    .insert_string_value(&dictionary::PATIENT_NAME, &["DOE^JANE"])
    .unwrap();

  let bytes = write_to_bytes(&data_set);

  assert!(dcmstream_p10::is_valid_bytes(&bytes));

  let parsed = read_from_bytes(bytes.clone());

  assert_eq!(
    parsed.get_string(dictionary::TRANSFER_SYNTAX_UID.tag),
    Ok(transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid)
  );
  assert_eq!(
    parsed.get_value(dictionary::PATIENT_NAME.tag),
    data_set.get_value(dictionary::PATIENT_NAME.tag)
  );
  assert_eq!(
    parsed.get_string(dictionary::SPECIFIC_CHARACTER_SET.tag),
    Ok("ISO_IR 192")
  );

  // A further write/read cycle reproduces the parsed data set exactly
  assert_eq!(read_from_bytes(write_to_bytes(&parsed)), parsed);
}

#[test]
fn nested_sequence_round_trip_test() {
  let mut item_0 = DataSet::new();
  item_0
    .insert_string_value(&dictionary::SERIES_DESCRIPTION, &["First"])
    .unwrap();

  let mut item_1 = DataSet::new();
  item_1
    .insert_string_value(&dictionary::SERIES_DESCRIPTION, &["Second"])
    .unwrap();

  let mut data_set = DataSet::new();
  data_set
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid],
    )
    .unwrap();
  data_set
    .insert_sequence_value(
      &dictionary::REFERENCED_IMAGE_SEQUENCE,
      vec![item_0, item_1],
    )
    .unwrap();

  let parsed = read_from_bytes(write_to_bytes(&data_set));

  let items = parsed
    .get_value(dictionary::REFERENCED_IMAGE_SEQUENCE.tag)
    .unwrap()
    .sequence_items()
    .unwrap();

  assert_eq!(items.len(), 2);
  assert_eq!(
    items[0].get_string(dictionary::SERIES_DESCRIPTION.tag),
    Ok("First")
  );
  assert_eq!(
    items[1].get_string(dictionary::SERIES_DESCRIPTION.tag),
    Ok("Second")
  );
}

/// An implicit VR little endian element header.
///
fn implicit_element(tag: DataElementTag, data: &[u8]) -> Vec<u8> {
  let mut bytes = vec![];

  bytes.extend_from_slice(&tag.group.to_le_bytes());
  bytes.extend_from_slice(&tag.element.to_le_bytes());
  bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
  bytes.extend_from_slice(data);

  bytes
}

/// An implicit VR little endian header with the given raw length value.
///
fn implicit_header(tag: DataElementTag, length: u32) -> Vec<u8> {
  let mut bytes = vec![];

  bytes.extend_from_slice(&tag.group.to_le_bytes());
  bytes.extend_from_slice(&tag.element.to_le_bytes());
  bytes.extend_from_slice(&length.to_le_bytes());

  bytes
}

#[test]
fn indefinite_and_definite_length_sequences_parse_identically_test() {
  let sequence_tag = dictionary::REFERENCED_IMAGE_SEQUENCE.tag;
  let item_element = implicit_element(dictionary::SERIES_DESCRIPTION.tag, b"A ");

  // The sequence and its items with lengths of 0xFFFFFFFF, closed by
  // delimiters
  let mut indefinite = vec![];
  indefinite.extend(implicit_header(sequence_tag, 0xFFFFFFFF));
  for _ in 0..2 {
    indefinite.extend(implicit_header(dictionary::ITEM.tag, 0xFFFFFFFF));
    indefinite.extend(item_element.clone());
    indefinite
      .extend(implicit_header(dictionary::ITEM_DELIMITATION_ITEM.tag, 0));
  }
  indefinite
    .extend(implicit_header(dictionary::SEQUENCE_DELIMITATION_ITEM.tag, 0));

  // The same sequence with fully defined lengths and no delimiters
  let item_length = item_element.len() as u32;
  let sequence_length = 2 * (8 + item_length);

  let mut definite = vec![];
  definite.extend(implicit_header(sequence_tag, sequence_length));
  for _ in 0..2 {
    definite.extend(implicit_header(dictionary::ITEM.tag, item_length));
    definite.extend(item_element.clone());
  }

  let parsed_indefinite = read_from_bytes(indefinite);
  let parsed_definite = read_from_bytes(definite);

  assert_eq!(parsed_indefinite, parsed_definite);

  let items = parsed_indefinite
    .get_value(sequence_tag)
    .unwrap()
    .sequence_items()
    .unwrap();

  assert_eq!(items.len(), 2);
  assert_eq!(
    items[0].get_string(dictionary::SERIES_DESCRIPTION.tag),
    Ok("A")
  );
}

/// Builds a data set describing a two-frame JPEG Baseline image whose
/// encapsulated pixel data has an empty basic offset table and three
/// fragments, the first frame being one fragment and the second spanning two.
///
fn encapsulated_image_data_set() -> DataSet {
  let mut data_set = DataSet::new();

  data_set
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::JPEG_BASELINE_8BIT.uid],
    )
    .unwrap();
  data_set
    .insert_int_value(&dictionary::SAMPLES_PER_PIXEL, &[1])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[2])
    .unwrap();
  data_set.insert_int_value(&dictionary::ROWS, &[2]).unwrap();
  data_set
    .insert_int_value(&dictionary::COLUMNS, &[2])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_ALLOCATED, &[8])
    .unwrap();

  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_encapsulated_pixel_data(
      ValueRepresentation::OtherByteString,
      vec![
        SharedBytes::empty(),
        vec![1, 2, 3, 4, 0xFF, 0xD9].into(),
        vec![5, 6, 7, 8].into(),
        vec![9, 10, 0xFF, 0xD9].into(),
      ],
    )
    .unwrap(),
  );

  data_set
}

#[test]
fn encapsulated_pixel_data_round_trip_test() {
  let data_set = encapsulated_image_data_set();

  let parsed = read_from_bytes(write_to_bytes(&data_set));

  assert_eq!(
    parsed.get_value(dictionary::PIXEL_DATA.tag),
    data_set.get_value(dictionary::PIXEL_DATA.tag)
  );

  let frames = parsed.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 2);
  assert_eq!(frames[0].to_bytes(), vec![1, 2, 3, 4, 0xFF, 0xD9].into());
  assert_eq!(frames[1].len(), 8);
  assert_eq!(
    frames[1].to_bytes(),
    vec![5, 6, 7, 8, 9, 10, 0xFF, 0xD9].into()
  );
}

#[test]
fn streaming_frame_extraction_test() {
  let data_set = encapsulated_image_data_set();

  // Stream the frames straight out of the data set's part stream
  let mut transform = P10PixelDataFrameTransform::new();
  let mut frames = vec![];

  data_set
    .to_p10_parts(&mut |part| {
      frames.extend(transform.add_part(part)?);
      Ok::<(), P10PixelDataFrameTransformError>(())
    })
    .unwrap();

  assert_eq!(frames.len(), 2);
  assert_eq!(frames[0].index(), 0);
  assert_eq!(frames[0].to_bytes(), vec![1, 2, 3, 4, 0xFF, 0xD9].into());
  assert_eq!(frames[1].index(), 1);
  assert_eq!(
    frames[1].to_bytes(),
    vec![5, 6, 7, 8, 9, 10, 0xFF, 0xD9].into()
  );
}

#[test]
fn file_meta_information_is_stamped_test() {
  let mut data_set = DataSet::new();
  data_set
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid],
    )
    .unwrap();
  data_set
    .insert_string_value(
      &dictionary::SOP_CLASS_UID,
      &["1.2.840.10008.5.1.4.1.1.7"],
    )
    .unwrap();
  data_set
    .insert_string_value(&dictionary::SOP_INSTANCE_UID, &["1.2.3.4"])
    .unwrap();

  let parsed = read_from_bytes(write_to_bytes(&data_set));

  assert_eq!(
    parsed.get_string(dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag),
    Ok("1.2.840.10008.5.1.4.1.1.7")
  );
  assert_eq!(
    parsed.get_string(dictionary::MEDIA_STORAGE_SOP_INSTANCE_UID.tag),
    Ok("1.2.3.4")
  );
  assert_eq!(
    parsed.get_string(dictionary::IMPLEMENTATION_CLASS_UID.tag),
    Ok(dcmstream_p10::uids::DCMSTREAM_IMPLEMENTATION_CLASS_UID)
  );
  assert!(parsed.has(dictionary::IMPLEMENTATION_VERSION_NAME.tag));
}

#[test]
fn deflated_round_trip_test() {
  let mut data_set = DataSet::new();
  data_set
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.uid],
    )
    .unwrap();
  data_set
    .insert_string_value(&dictionary::PATIENT_ID, &["1234"])
    .unwrap();

  let parsed = read_from_bytes(write_to_bytes(&data_set));

  assert_eq!(parsed.get_string(dictionary::PATIENT_ID.tag), Ok("1234"));
  assert_eq!(
    parsed.get_string(dictionary::TRANSFER_SYNTAX_UID.tag),
    Ok(transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.uid)
  );
}

#[test]
fn truncated_data_errors_test() {
  let mut data_set = DataSet::new();
  data_set
    .insert_string_value(&dictionary::PATIENT_ID, &["1234"])
    .unwrap();

  let mut bytes = write_to_bytes(&data_set);
  bytes.truncate(bytes.len() - 2);

  assert!(matches!(
    DataSet::read_p10_bytes(bytes.into()),
    Err(P10Error::DataEndedUnexpectedly { .. })
  ));
}
