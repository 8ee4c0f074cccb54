//! Descriptions for commonly seen `CodeString` values.

use crate::{DataElementTag, dictionary};

/// Returns a description of a `CodeString` value if one is available.
///
/// Only code strings whose meaning isn't evident from the value itself are
/// covered, and the list makes no attempt to be exhaustive.
///
#[allow(clippy::result_unit_err)]
pub fn describe(value: &str, tag: DataElementTag) -> Result<&'static str, ()> {
  match tag {
    tag if tag == dictionary::MODALITY.tag => match value {
      "AU" => Ok("Audio"),
      "BI" => Ok("Biomagnetic imaging"),
      "CR" => Ok("Computed Radiography"),
      "CT" => Ok("Computed Tomography"),
      "DX" => Ok("Digital Radiography"),
      "ECG" => Ok("Electrocardiography"),
      "ES" => Ok("Endoscopy"),
      "GM" => Ok("General Microscopy"),
      "IO" => Ok("Intra-Oral Radiography"),
      "IVUS" => Ok("Intravascular Ultrasound"),
      "MG" => Ok("Mammography"),
      "MR" => Ok("Magnetic Resonance"),
      "NM" => Ok("Nuclear Medicine"),
      "OCT" => Ok("Optical Coherence Tomography (non-Ophthalmic)"),
      "OP" => Ok("Ophthalmic Photography"),
      "OT" => Ok("Other"),
      "PT" => Ok("Positron emission tomography (PET)"),
      "PX" => Ok("Panoramic X-Ray"),
      "RF" => Ok("Radio Fluoroscopy"),
      "RG" => Ok("Radiographic imaging (conventional film/screen)"),
      "RTDOSE" => Ok("Radiotherapy Dose"),
      "RTIMAGE" => Ok("Radiotherapy Image"),
      "RTPLAN" => Ok("Radiotherapy Plan"),
      "RTSTRUCT" => Ok("Radiotherapy Structure Set"),
      "SC" => Ok("Secondary Capture"),
      "SM" => Ok("Slide Microscopy"),
      "SR" => Ok("SR Document"),
      "US" => Ok("Ultrasound"),
      "XA" => Ok("X-Ray Angiography"),
      "XC" => Ok("External-camera Photography"),

      _ => Err(()),
    },

    tag if tag == dictionary::PATIENT_SEX.tag => match value {
      "F" => Ok("Female"),
      "M" => Ok("Male"),
      "O" => Ok("Other"),

      _ => Err(()),
    },

    _ => Err(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn describe_test() {
    assert_eq!(
      describe("US", dictionary::MODALITY.tag),
      Ok("Ultrasound")
    );

    assert_eq!(describe("F", dictionary::PATIENT_SEX.tag), Ok("Female"));

    assert_eq!(describe("XYZZY", dictionary::MODALITY.tag), Err(()));

    assert_eq!(describe("US", dictionary::PATIENT_NAME.tag), Err(()));
  }
}
