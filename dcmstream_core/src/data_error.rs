//! The [`DataError`] type describing errors raised when creating or reading
//! data elements and data sets.

use crate::{DataSetPath, DcmstreamError, ValueRepresentation, dictionary};

/// An error raised when creating or reading data elements in a data set. One
/// of:
///
/// 1. **Tag not present**. A lookup requested a tag that isn't in the data
///    set.
///
/// 2. **Value not present**. A typed accessor was used on a value whose VR
///    doesn't hold that type, e.g. an integer was requested from a
///    `LongText` value.
///
/// 3. **Multiplicity mismatch**. A single-value accessor was used on a value
///    holding a different number of values.
///
/// 4. **Value invalid**. A value's bytes could not be decoded for its VR,
///    e.g. string bytes that aren't valid UTF-8, or, when creating a value,
///    the supplied input wasn't valid for the VR.
///
/// 5. **Value length invalid**. A value's byte length breaks a constraint of
///    its VR: too short, too long, or misaligned.
///
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
  TagNotPresent {
    path: DataSetPath,
  },
  ValueNotPresent {
    path: Option<DataSetPath>,
  },
  MultiplicityMismatch {
    path: Option<DataSetPath>,
  },
  ValueInvalid {
    details: String,
    path: Option<DataSetPath>,
  },
  ValueLengthInvalid {
    vr: ValueRepresentation,
    length: u64,
    details: String,
    path: Option<DataSetPath>,
  },
}

impl core::fmt::Display for DataError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    fn path_to_string(path: &Option<DataSetPath>) -> String {
      match path {
        Some(path) => path.to_detailed_string(),
        None => "<unknown>".to_string(),
      }
    }

    let description = match self {
      Self::TagNotPresent { path } => {
        format!("Tag not present at {}", path.to_detailed_string())
      }
      Self::ValueNotPresent { path } => {
        format!("Value not present at {}", path_to_string(path))
      }
      Self::MultiplicityMismatch { path } => {
        format!("Multiplicity mismatch at {}", path_to_string(path))
      }
      Self::ValueInvalid { details, path } => {
        format!(
          "Invalid value at {}, details: {}",
          path_to_string(path),
          details
        )
      }
      Self::ValueLengthInvalid { details, path, .. } => {
        format!(
          "Invalid value length at {}, details: {}",
          path_to_string(path),
          details
        )
      }
    };

    write!(f, "DICOM Data Error: {description}")
  }
}

impl DataError {
  /// Constructs a new 'Tag not present' error.
  ///
  pub fn new_tag_not_present() -> Self {
    Self::TagNotPresent {
      path: DataSetPath::new(),
    }
  }

  /// Constructs a new 'Value not present' error.
  ///
  pub fn new_value_not_present() -> Self {
    Self::ValueNotPresent { path: None }
  }

  /// Constructs a new 'Multiplicity mismatch' error.
  ///
  pub fn new_multiplicity_mismatch() -> Self {
    Self::MultiplicityMismatch { path: None }
  }

  /// Constructs a new 'Value invalid' error.
  ///
  pub fn new_value_invalid(details: String) -> Self {
    Self::ValueInvalid {
      details,
      path: None,
    }
  }

  /// Constructs a new 'Value length invalid' error.
  ///
  pub fn new_value_length_invalid(
    vr: ValueRepresentation,
    length: u64,
    details: String,
  ) -> Self {
    Self::ValueLengthInvalid {
      vr,
      length,
      details,
      path: None,
    }
  }

  /// Returns whether this is a 'Tag not present' error.
  ///
  pub fn is_tag_not_present(&self) -> bool {
    matches!(self, Self::TagNotPresent { .. })
  }

  /// Returns the path to the data element this error relates to, if known.
  ///
  pub fn path(&self) -> Option<&DataSetPath> {
    match self {
      Self::TagNotPresent { path } => Some(path),
      Self::ValueNotPresent { path }
      | Self::MultiplicityMismatch { path }
      | Self::ValueInvalid { path, .. }
      | Self::ValueLengthInvalid { path, .. } => path.as_ref(),
    }
  }

  /// Attaches the path of the offending data element to this error. Included
  /// wherever possible so errors pinpoint their location in a data set.
  ///
  pub fn with_path(self, path: &DataSetPath) -> Self {
    match self {
      Self::TagNotPresent { .. } => Self::TagNotPresent { path: path.clone() },
      Self::ValueNotPresent { .. } => Self::ValueNotPresent {
        path: Some(path.clone()),
      },
      Self::MultiplicityMismatch { .. } => Self::MultiplicityMismatch {
        path: Some(path.clone()),
      },
      Self::ValueInvalid { details, .. } => Self::ValueInvalid {
        details,
        path: Some(path.clone()),
      },
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => Self::ValueLengthInvalid {
        vr,
        length,
        details,
        path: Some(path.clone()),
      },
    }
  }

  /// Returns the human-readable name of this error.
  ///
  pub fn name(&self) -> &'static str {
    match self {
      Self::TagNotPresent { .. } => "Tag not present",
      Self::ValueNotPresent { .. } => "Value not present",
      Self::MultiplicityMismatch { .. } => "Multiplicity mismatch",
      Self::ValueInvalid { .. } => "Invalid value",
      Self::ValueLengthInvalid { .. } => "Invalid value length",
    }
  }

  /// Returns this error's `details` field, if it has one.
  ///
  pub fn details(&self) -> &str {
    match self {
      Self::ValueInvalid { details, .. } => details,
      Self::ValueLengthInvalid { details, .. } => details,
      _ => "",
    }
  }
}

impl DcmstreamError for DataError {
  /// Returns lines of text that describe this data error in a human-readable
  /// format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM data error {}", task_description),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    if let Some(path) = self.path() {
      if let Ok(tag) = path.final_data_element() {
        lines.push(format!("  Tag: {tag}"));
        lines.push(format!("  Name: {}", dictionary::tag_name(tag, None)));
      }

      lines.push(format!("  Path: {}", path.to_detailed_string()));
    }

    match self {
      Self::ValueInvalid { details, .. } => {
        lines.push(format!("  Details: {details}"));
      }
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => {
        lines.push(format!("  VR: {vr}"));
        lines.push(format!("  Length: {length} bytes"));
        lines.push(format!("  Details: {details}"));
      }
      _ => (),
    }

    lines
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_lines_test() {
    assert_eq!(
      DataError::new_tag_not_present()
        .with_path(&DataSetPath::from_string("12345678/[1]/11223344").unwrap())
        .to_lines("testing")
        .join("\n"),
      r#"DICOM data error testing

  Error: Tag not present
  Tag: (1122,3344)
  Name: unknown_tag
  Path: (1234,5678) unknown_tag / Item 1 / (1122,3344) unknown_tag"#
    );

    assert_eq!(
      DataError::new_multiplicity_mismatch()
        .to_lines("testing")
        .join("\n"),
      r#"DICOM data error testing

  Error: Multiplicity mismatch"#
    );

    assert_eq!(
      DataError::new_value_length_invalid(
        ValueRepresentation::AgeString,
        5,
        "Test 123".to_string(),
      )
      .to_lines("testing")
      .join("\n"),
      r#"DICOM data error testing

  Error: Invalid value length
  VR: AS
  Length: 5 bytes
  Details: Test 123"#
    );
  }
}
