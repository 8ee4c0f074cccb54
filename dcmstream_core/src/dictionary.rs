//! Lookup of known data elements, private data elements, and UIDs.
//!
//! This dictionary contains the data elements needed by this library along
//! with the common identification, patient, study, and image attributes. It is
//! not an exhaustive copy of the registry in PS3.6.

use crate::ValueRepresentation as VR;
use crate::{DataElementTag, ValueMultiplicity};

/// A single data element definition: its tag, display name, allowed VRs, and
/// value multiplicity.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
  pub tag: DataElementTag,
  pub name: &'static str,
  pub vrs: &'static [VR],
  pub multiplicity: ValueMultiplicity,
}

const fn item(
  group: u16,
  element: u16,
  name: &'static str,
  vrs: &'static [VR],
  min: u32,
  max: Option<u32>,
) -> Item {
  Item {
    tag: DataElementTag { group, element },
    name,
    vrs,
    multiplicity: ValueMultiplicity { min, max },
  }
}

pub const FILE_META_INFORMATION_GROUP_LENGTH: Item = item(
  0x0002, 0x0000, "File Meta Information Group Length",
  &[VR::UnsignedLong], 1, Some(1),
);
pub const FILE_META_INFORMATION_VERSION: Item = item(
  0x0002, 0x0001, "File Meta Information Version",
  &[VR::OtherByteString], 1, Some(1),
);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Item = item(
  0x0002, 0x0002, "Media Storage SOP Class UID",
  &[VR::UniqueIdentifier], 1, Some(1),
);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Item = item(
  0x0002, 0x0003, "Media Storage SOP Instance UID",
  &[VR::UniqueIdentifier], 1, Some(1),
);
pub const TRANSFER_SYNTAX_UID: Item = item(
  0x0002, 0x0010, "Transfer Syntax UID",
  &[VR::UniqueIdentifier], 1, Some(1),
);
pub const IMPLEMENTATION_CLASS_UID: Item = item(
  0x0002, 0x0012, "Implementation Class UID",
  &[VR::UniqueIdentifier], 1, Some(1),
);
pub const IMPLEMENTATION_VERSION_NAME: Item = item(
  0x0002, 0x0013, "Implementation Version Name",
  &[VR::ShortString], 1, Some(1),
);
pub const SOURCE_APPLICATION_ENTITY_TITLE: Item = item(
  0x0002, 0x0016, "Source Application Entity Title",
  &[VR::ApplicationEntity], 1, Some(1),
);

pub const SPECIFIC_CHARACTER_SET: Item = item(
  0x0008, 0x0005, "Specific Character Set", &[VR::CodeString], 1, None,
);
pub const IMAGE_TYPE: Item =
  item(0x0008, 0x0008, "Image Type", &[VR::CodeString], 2, None);
pub const SOP_CLASS_UID: Item = item(
  0x0008, 0x0016, "SOP Class UID", &[VR::UniqueIdentifier], 1, Some(1),
);
pub const SOP_INSTANCE_UID: Item = item(
  0x0008, 0x0018, "SOP Instance UID", &[VR::UniqueIdentifier], 1, Some(1),
);
pub const STUDY_DATE: Item =
  item(0x0008, 0x0020, "Study Date", &[VR::Date], 1, Some(1));
pub const SERIES_DATE: Item =
  item(0x0008, 0x0021, "Series Date", &[VR::Date], 1, Some(1));
pub const ACQUISITION_DATE: Item =
  item(0x0008, 0x0022, "Acquisition Date", &[VR::Date], 1, Some(1));
pub const CONTENT_DATE: Item =
  item(0x0008, 0x0023, "Content Date", &[VR::Date], 1, Some(1));
pub const ACQUISITION_DATE_TIME: Item = item(
  0x0008, 0x002A, "Acquisition DateTime", &[VR::DateTime], 1, Some(1),
);
pub const STUDY_TIME: Item =
  item(0x0008, 0x0030, "Study Time", &[VR::Time], 1, Some(1));
pub const SERIES_TIME: Item =
  item(0x0008, 0x0031, "Series Time", &[VR::Time], 1, Some(1));
pub const ACCESSION_NUMBER: Item = item(
  0x0008, 0x0050, "Accession Number", &[VR::ShortString], 1, Some(1),
);
pub const MODALITY: Item =
  item(0x0008, 0x0060, "Modality", &[VR::CodeString], 1, Some(1));
pub const MANUFACTURER: Item =
  item(0x0008, 0x0070, "Manufacturer", &[VR::LongString], 1, Some(1));
pub const REFERRING_PHYSICIAN_NAME: Item = item(
  0x0008, 0x0090, "Referring Physician's Name", &[VR::PersonName], 1, Some(1),
);
pub const STUDY_DESCRIPTION: Item = item(
  0x0008, 0x1030, "Study Description", &[VR::LongString], 1, Some(1),
);
pub const SERIES_DESCRIPTION: Item = item(
  0x0008, 0x103E, "Series Description", &[VR::LongString], 1, Some(1),
);
pub const REFERENCED_IMAGE_SEQUENCE: Item = item(
  0x0008, 0x1140, "Referenced Image Sequence", &[VR::Sequence], 1, Some(1),
);

pub const PATIENT_NAME: Item =
  item(0x0010, 0x0010, "Patient's Name", &[VR::PersonName], 1, Some(1));
pub const PATIENT_ID: Item =
  item(0x0010, 0x0020, "Patient ID", &[VR::LongString], 1, Some(1));
pub const PATIENT_BIRTH_DATE: Item = item(
  0x0010, 0x0030, "Patient's Birth Date", &[VR::Date], 1, Some(1),
);
pub const PATIENT_SEX: Item =
  item(0x0010, 0x0040, "Patient's Sex", &[VR::CodeString], 1, Some(1));
pub const PATIENT_AGE: Item =
  item(0x0010, 0x1010, "Patient's Age", &[VR::AgeString], 1, Some(1));
pub const PATIENT_WEIGHT: Item = item(
  0x0010, 0x1030, "Patient's Weight", &[VR::DecimalString], 1, Some(1),
);

pub const BODY_PART_EXAMINED: Item = item(
  0x0018, 0x0015, "Body Part Examined", &[VR::CodeString], 1, Some(1),
);
pub const SLICE_THICKNESS: Item = item(
  0x0018, 0x0050, "Slice Thickness", &[VR::DecimalString], 1, Some(1),
);
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Item = item(
  0x0018, 0x6011, "Sequence of Ultrasound Regions",
  &[VR::Sequence], 1, Some(1),
);

pub const STUDY_INSTANCE_UID: Item = item(
  0x0020, 0x000D, "Study Instance UID", &[VR::UniqueIdentifier], 1, Some(1),
);
pub const SERIES_INSTANCE_UID: Item = item(
  0x0020, 0x000E, "Series Instance UID", &[VR::UniqueIdentifier], 1, Some(1),
);
pub const STUDY_ID: Item =
  item(0x0020, 0x0010, "Study ID", &[VR::ShortString], 1, Some(1));
pub const SERIES_NUMBER: Item = item(
  0x0020, 0x0011, "Series Number", &[VR::IntegerString], 1, Some(1),
);
pub const INSTANCE_NUMBER: Item = item(
  0x0020, 0x0013, "Instance Number", &[VR::IntegerString], 1, Some(1),
);
pub const IMAGE_POSITION_PATIENT: Item = item(
  0x0020, 0x0032, "Image Position (Patient)",
  &[VR::DecimalString], 3, Some(3),
);
pub const IMAGE_ORIENTATION_PATIENT: Item = item(
  0x0020, 0x0037, "Image Orientation (Patient)",
  &[VR::DecimalString], 6, Some(6),
);
pub const FRAME_OF_REFERENCE_UID: Item = item(
  0x0020, 0x0052, "Frame of Reference UID",
  &[VR::UniqueIdentifier], 1, Some(1),
);

pub const SAMPLES_PER_PIXEL: Item = item(
  0x0028, 0x0002, "Samples per Pixel", &[VR::UnsignedShort], 1, Some(1),
);
pub const PHOTOMETRIC_INTERPRETATION: Item = item(
  0x0028, 0x0004, "Photometric Interpretation",
  &[VR::CodeString], 1, Some(1),
);
pub const PLANAR_CONFIGURATION: Item = item(
  0x0028, 0x0006, "Planar Configuration", &[VR::UnsignedShort], 1, Some(1),
);
pub const NUMBER_OF_FRAMES: Item = item(
  0x0028, 0x0008, "Number of Frames", &[VR::IntegerString], 1, Some(1),
);
pub const ROWS: Item =
  item(0x0028, 0x0010, "Rows", &[VR::UnsignedShort], 1, Some(1));
pub const COLUMNS: Item =
  item(0x0028, 0x0011, "Columns", &[VR::UnsignedShort], 1, Some(1));
pub const PIXEL_SPACING: Item = item(
  0x0028, 0x0030, "Pixel Spacing", &[VR::DecimalString], 2, Some(2),
);
pub const BITS_ALLOCATED: Item = item(
  0x0028, 0x0100, "Bits Allocated", &[VR::UnsignedShort], 1, Some(1),
);
pub const BITS_STORED: Item = item(
  0x0028, 0x0101, "Bits Stored", &[VR::UnsignedShort], 1, Some(1),
);
pub const HIGH_BIT: Item =
  item(0x0028, 0x0102, "High Bit", &[VR::UnsignedShort], 1, Some(1));
pub const PIXEL_REPRESENTATION: Item = item(
  0x0028, 0x0103, "Pixel Representation", &[VR::UnsignedShort], 1, Some(1),
);
pub const SMALLEST_IMAGE_PIXEL_VALUE: Item = item(
  0x0028, 0x0106, "Smallest Image Pixel Value",
  &[VR::UnsignedShort, VR::SignedShort], 1, Some(1),
);
pub const LARGEST_IMAGE_PIXEL_VALUE: Item = item(
  0x0028, 0x0107, "Largest Image Pixel Value",
  &[VR::UnsignedShort, VR::SignedShort], 1, Some(1),
);
pub const PIXEL_PADDING_VALUE: Item = item(
  0x0028, 0x0120, "Pixel Padding Value",
  &[VR::UnsignedShort, VR::SignedShort], 1, Some(1),
);
pub const PIXEL_PADDING_RANGE_LIMIT: Item = item(
  0x0028, 0x0121, "Pixel Padding Range Limit",
  &[VR::UnsignedShort, VR::SignedShort], 1, Some(1),
);
pub const WINDOW_CENTER: Item = item(
  0x0028, 0x1050, "Window Center", &[VR::DecimalString], 1, None,
);
pub const WINDOW_WIDTH: Item = item(
  0x0028, 0x1051, "Window Width", &[VR::DecimalString], 1, None,
);
pub const RESCALE_INTERCEPT: Item = item(
  0x0028, 0x1052, "Rescale Intercept", &[VR::DecimalString], 1, Some(1),
);
pub const RESCALE_SLOPE: Item = item(
  0x0028, 0x1053, "Rescale Slope", &[VR::DecimalString], 1, Some(1),
);
pub const RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Item = item(
  0x0028, 0x1101, "Red Palette Color Lookup Table Descriptor",
  &[VR::UnsignedShort, VR::SignedShort], 3, Some(3),
);
pub const GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Item = item(
  0x0028, 0x1102, "Green Palette Color Lookup Table Descriptor",
  &[VR::UnsignedShort, VR::SignedShort], 3, Some(3),
);
pub const BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Item = item(
  0x0028, 0x1103, "Blue Palette Color Lookup Table Descriptor",
  &[VR::UnsignedShort, VR::SignedShort], 3, Some(3),
);
pub const LUT_DESCRIPTOR: Item = item(
  0x0028, 0x3002, "LUT Descriptor",
  &[VR::UnsignedShort, VR::SignedShort], 3, Some(3),
);
pub const LUT_DATA: Item = item(
  0x0028, 0x3006, "LUT Data",
  &[VR::UnsignedShort, VR::OtherWordString], 1, None,
);

pub const EXTENDED_OFFSET_TABLE: Item = item(
  0x7FE0, 0x0001, "Extended Offset Table",
  &[VR::OtherVeryLongString], 1, Some(1),
);
pub const EXTENDED_OFFSET_TABLE_LENGTHS: Item = item(
  0x7FE0, 0x0002, "Extended Offset Table Lengths",
  &[VR::OtherVeryLongString], 1, Some(1),
);
pub const PIXEL_DATA: Item = item(
  0x7FE0, 0x0010, "Pixel Data",
  &[VR::OtherByteString, VR::OtherWordString], 1, Some(1),
);

pub const DATA_SET_TRAILING_PADDING: Item = item(
  0xFFFC, 0xFFFC, "Data Set Trailing Padding",
  &[VR::OtherByteString], 1, Some(1),
);

pub const ITEM: Item = item(0xFFFE, 0xE000, "Item", &[], 1, Some(1));
pub const ITEM_DELIMITATION_ITEM: Item =
  item(0xFFFE, 0xE00D, "Item Delimitation Item", &[], 1, Some(1));
pub const SEQUENCE_DELIMITATION_ITEM: Item =
  item(0xFFFE, 0xE0DD, "Sequence Delimitation Item", &[], 1, Some(1));

/// All items in this dictionary, ordered by tag.
///
static ITEMS: [&Item; 67] = [
  &FILE_META_INFORMATION_GROUP_LENGTH,
  &FILE_META_INFORMATION_VERSION,
  &MEDIA_STORAGE_SOP_CLASS_UID,
  &MEDIA_STORAGE_SOP_INSTANCE_UID,
  &TRANSFER_SYNTAX_UID,
  &IMPLEMENTATION_CLASS_UID,
  &IMPLEMENTATION_VERSION_NAME,
  &SOURCE_APPLICATION_ENTITY_TITLE,
  &SPECIFIC_CHARACTER_SET,
  &IMAGE_TYPE,
  &SOP_CLASS_UID,
  &SOP_INSTANCE_UID,
  &STUDY_DATE,
  &SERIES_DATE,
  &ACQUISITION_DATE,
  &CONTENT_DATE,
  &ACQUISITION_DATE_TIME,
  &STUDY_TIME,
  &SERIES_TIME,
  &ACCESSION_NUMBER,
  &MODALITY,
  &MANUFACTURER,
  &REFERRING_PHYSICIAN_NAME,
  &STUDY_DESCRIPTION,
  &SERIES_DESCRIPTION,
  &REFERENCED_IMAGE_SEQUENCE,
  &PATIENT_NAME,
  &PATIENT_ID,
  &PATIENT_BIRTH_DATE,
  &PATIENT_SEX,
  &PATIENT_AGE,
  &PATIENT_WEIGHT,
  &BODY_PART_EXAMINED,
  &SLICE_THICKNESS,
  &SEQUENCE_OF_ULTRASOUND_REGIONS,
  &STUDY_INSTANCE_UID,
  &SERIES_INSTANCE_UID,
  &STUDY_ID,
  &SERIES_NUMBER,
  &INSTANCE_NUMBER,
  &IMAGE_POSITION_PATIENT,
  &IMAGE_ORIENTATION_PATIENT,
  &FRAME_OF_REFERENCE_UID,
  &SAMPLES_PER_PIXEL,
  &PHOTOMETRIC_INTERPRETATION,
  &PLANAR_CONFIGURATION,
  &NUMBER_OF_FRAMES,
  &ROWS,
  &COLUMNS,
  &PIXEL_SPACING,
  &BITS_ALLOCATED,
  &BITS_STORED,
  &HIGH_BIT,
  &PIXEL_REPRESENTATION,
  &SMALLEST_IMAGE_PIXEL_VALUE,
  &LARGEST_IMAGE_PIXEL_VALUE,
  &PIXEL_PADDING_VALUE,
  &PIXEL_PADDING_RANGE_LIMIT,
  &WINDOW_CENTER,
  &WINDOW_WIDTH,
  &RESCALE_INTERCEPT,
  &RESCALE_SLOPE,
  &RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  &GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  &BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  &LUT_DESCRIPTOR,
  &LUT_DATA,
];

/// A private data element definition belonging to the private block reserved
/// by a specific private creator. The element value is the low byte of the
/// data element's element value.
///
struct PrivateItem {
  creator: &'static str,
  group: u16,
  element: u8,
  item: Item,
}

/// Well-known private data elements. This list covers only a few frequently
/// encountered private blocks.
///
static PRIVATE_ITEMS: [PrivateItem; 3] = [
  PrivateItem {
    creator: "GEMS_IDEN_01",
    group: 0x0009,
    element: 0x01,
    item: item(0x0009, 0x0001, "Full Fidelity", &[VR::LongString], 1, Some(1)),
  },
  PrivateItem {
    creator: "GEMS_IDEN_01",
    group: 0x0009,
    element: 0x02,
    item: item(0x0009, 0x0002, "Suite Id", &[VR::ShortString], 1, Some(1)),
  },
  PrivateItem {
    creator: "SIEMENS CSA HEADER",
    group: 0x0029,
    element: 0x10,
    item: item(
      0x0029, 0x0010, "CSA Image Header Info",
      &[VR::OtherByteString], 1, Some(1),
    ),
  },
];

/// Looks up the dictionary item for a data element tag. For private tags the
/// private creator, when known, selects the private block to look in.
/// Trailing spaces on the private creator are ignored.
///
#[allow(clippy::result_unit_err)]
pub fn find(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> Result<&'static Item, ()> {
  if tag.is_private() {
    let creator = private_creator.ok_or(())?.trim_end_matches(' ');

    return PRIVATE_ITEMS
      .iter()
      .find(|private_item| {
        private_item.creator == creator
          && private_item.group == tag.group
          && u16::from(private_item.element) == tag.element & 0x00FF
      })
      .map(|private_item| &private_item.item)
      .ok_or(());
  }

  match tag {
    tag if tag == ITEM.tag => Ok(&ITEM),
    tag if tag == ITEM_DELIMITATION_ITEM.tag => Ok(&ITEM_DELIMITATION_ITEM),
    tag if tag == SEQUENCE_DELIMITATION_ITEM.tag => {
      Ok(&SEQUENCE_DELIMITATION_ITEM)
    }
    tag if tag == DATA_SET_TRAILING_PADDING.tag => {
      Ok(&DATA_SET_TRAILING_PADDING)
    }
    tag if tag == EXTENDED_OFFSET_TABLE.tag => Ok(&EXTENDED_OFFSET_TABLE),
    tag if tag == EXTENDED_OFFSET_TABLE_LENGTHS.tag => {
      Ok(&EXTENDED_OFFSET_TABLE_LENGTHS)
    }
    tag if tag == PIXEL_DATA.tag => Ok(&PIXEL_DATA),

    _ => ITEMS.iter().find(|item| item.tag == tag).copied().ok_or(()),
  }
}

/// Returns the display name for a data element tag. Tags not in the
/// dictionary return `"unknown_tag"`, or `"unknown_private_tag"` when the tag
/// is in a private group.
///
pub fn tag_name(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> &'static str {
  match find(tag, private_creator) {
    Ok(item) => item.name,
    Err(()) if tag.is_private() => "unknown_private_tag",
    Err(()) => "unknown_tag",
  }
}

/// Formats a data element tag with its display name, e.g.
/// `"(0008,0020) Study Date"`.
///
pub fn tag_with_name(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> String {
  format!("{} {}", tag, tag_name(tag, private_creator))
}

/// Returns whether a tag holds a lookup table descriptor, i.e. one whose
/// middle 16-bit value is interpreted using the value's own VR.
///
pub fn is_lut_descriptor_tag(tag: DataElementTag) -> bool {
  tag == LUT_DESCRIPTOR.tag
    || tag == RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
}

/// Returns the display name of a well-known UID, covering the transfer syntax
/// and common storage SOP class UIDs.
///
#[allow(clippy::result_unit_err)]
pub fn uid_name(uid: &str) -> Result<&'static str, ()> {
  if let Ok(transfer_syntax) = crate::TransferSyntax::from_uid(uid) {
    return Ok(transfer_syntax.name);
  }

  match uid {
    "1.2.840.10008.1.1" => Ok("Verification SOP Class"),
    "1.2.840.10008.5.1.4.1.1.1" => Ok("Computed Radiography Image Storage"),
    "1.2.840.10008.5.1.4.1.1.1.1" => {
      Ok("Digital X-Ray Image Storage - For Presentation")
    }
    "1.2.840.10008.5.1.4.1.1.2" => Ok("CT Image Storage"),
    "1.2.840.10008.5.1.4.1.1.3.1" => Ok("Ultrasound Multi-frame Image Storage"),
    "1.2.840.10008.5.1.4.1.1.4" => Ok("MR Image Storage"),
    "1.2.840.10008.5.1.4.1.1.6.1" => Ok("Ultrasound Image Storage"),
    "1.2.840.10008.5.1.4.1.1.7" => Ok("Secondary Capture Image Storage"),
    "1.2.840.10008.5.1.4.1.1.12.1" => Ok("X-Ray Angiographic Image Storage"),
    "1.2.840.10008.5.1.4.1.1.20" => Ok("Nuclear Medicine Image Storage"),
    "1.2.840.10008.5.1.4.1.1.128" => {
      Ok("Positron Emission Tomography Image Storage")
    }

    _ => Err(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn find_test() {
    assert_eq!(
      find(DataElementTag::new(0x0008, 0x0020), None),
      Ok(&STUDY_DATE)
    );

    assert_eq!(find(DataElementTag::new(0x0008, 0x9999), None), Err(()));
  }

  #[test]
  fn find_private_test() {
    let tag = DataElementTag::new(0x0009, 0x1001);

    assert_eq!(find(tag, None), Err(()));
    assert_eq!(find(tag, Some("GEMS_IDEN_01")), Ok(&PRIVATE_ITEMS[0].item));
    assert_eq!(find(tag, Some("GEMS_IDEN_01  ")), Ok(&PRIVATE_ITEMS[0].item));
    assert_eq!(find(tag, Some("UNREGISTERED")), Err(()));
  }

  #[test]
  fn tag_name_test() {
    assert_eq!(tag_name(PATIENT_AGE.tag, None), "Patient's Age");
    assert_eq!(tag_name(DataElementTag::new(0x0008, 0x9999), None), "unknown_tag");
    assert_eq!(
      tag_name(DataElementTag::new(0x0009, 0x9999), None),
      "unknown_private_tag"
    );
  }

  #[test]
  fn tag_with_name_test() {
    assert_eq!(
      tag_with_name(PATIENT_AGE.tag, None),
      "(0010,1010) Patient's Age"
    );
  }

  #[test]
  fn uid_name_test() {
    assert_eq!(
      uid_name("1.2.840.10008.1.2.1"),
      Ok("Explicit VR Little Endian")
    );
    assert_eq!(uid_name("1.2.840.10008.5.1.4.1.1.2"), Ok("CT Image Storage"));
    assert_eq!(uid_name("1.2.3.4"), Err(()));
  }
}
