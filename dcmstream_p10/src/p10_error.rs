//! The error type for DICOM P10 reading and writing.

use dcmstream_core::{DataSetPath, DcmstreamError};

use crate::P10Part;

/// An error raised when reading or writing DICOM P10 data.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Error {
  /// The data specifies a DICOM transfer syntax that isn't supported.
  TransferSyntaxNotSupported { transfer_syntax_uid: String },

  /// The data contains a *'(0008,0005) Specific Character Set'* data element
  /// whose value isn't a supported character set.
  SpecificCharacterSetInvalid {
    specific_character_set: String,
    details: String,
  },

  /// A read context needs more data to be written to it before the next part
  /// can be read. This is the recoverable needs-more-data condition.
  DataRequired { when: String },

  /// A read context reached the end of its data partway through reading the
  /// next part, and no more data can be added. The data is malformed or
  /// truncated.
  DataEndedUnexpectedly {
    when: String,
    path: DataSetPath,
    offset: u64,
  },

  /// The supplied data does not have 'DICM' at offset 128 and the read config
  /// requires it.
  DicmPrefixNotPresent,

  /// A read context couldn't parse the next part because the supplied data is
  /// invalid, or a write context couldn't serialize a part written to it.
  DataInvalid {
    when: String,
    details: String,
    path: DataSetPath,
    offset: u64,
  },

  /// One of the read config's maximums was exceeded. The maximums bound
  /// memory usage during a streaming read.
  MaximumExceeded {
    details: String,
    path: DataSetPath,
    offset: u64,
  },

  /// A stream of [`P10Part`]s contained a part that isn't valid at its
  /// position in the stream, e.g. a [`P10Part::DataElementValueBytes`] that
  /// doesn't follow a [`P10Part::DataElementHeader`].
  PartStreamInvalid {
    when: String,
    details: String,
    part: P10Part,
  },

  /// Bytes were written to a read context after its final bytes had already
  /// been written.
  WriteAfterCompletion,

  /// An error with an underlying file or stream.
  FileError { when: String, details: String },

  /// A general-purpose error for cases not covered by the other variants.
  OtherError { error_type: String, details: String },
}

impl core::fmt::Display for P10Error {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    write!(f, "DICOM P10 error: {}", self.name())
  }
}

impl P10Error {
  /// Returns the name of this error as a human-readable string.
  ///
  pub fn name(&self) -> &str {
    match self {
      Self::TransferSyntaxNotSupported { .. } => {
        "Transfer syntax not supported"
      }
      Self::SpecificCharacterSetInvalid { .. } => {
        "Specific character set invalid"
      }
      Self::DataRequired { .. } => "Data required",
      Self::DataEndedUnexpectedly { .. } => "Unexpected end of data",
      Self::DicmPrefixNotPresent => "'DICM' prefix is not present",
      Self::DataInvalid { .. } => "Invalid data",
      Self::MaximumExceeded { .. } => "Maximum exceeded",
      Self::PartStreamInvalid { .. } => "P10 part stream invalid",
      Self::WriteAfterCompletion => "Write after completion",
      Self::FileError { .. } => "File I/O failure",
      Self::OtherError { error_type, .. } => error_type,
    }
  }

  /// Returns this error's `details` field, if it has one.
  ///
  pub fn details(&self) -> &str {
    match self {
      Self::SpecificCharacterSetInvalid { details, .. }
      | Self::DataInvalid { details, .. }
      | Self::MaximumExceeded { details, .. }
      | Self::PartStreamInvalid { details, .. }
      | Self::FileError { details, .. }
      | Self::OtherError { details, .. } => details,
      _ => "",
    }
  }
}

impl DcmstreamError for P10Error {
  /// Returns lines of text that describe this DICOM P10 error in a
  /// human-readable format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM P10 error {task_description}"),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    match self {
      P10Error::DataRequired { when }
      | P10Error::DataEndedUnexpectedly { when, .. }
      | P10Error::DataInvalid { when, .. }
      | P10Error::PartStreamInvalid { when, .. }
      | P10Error::FileError { when, .. } => {
        lines.push(format!("  When: {when}"));
      }

      _ => (),
    };

    match self {
      P10Error::TransferSyntaxNotSupported {
        transfer_syntax_uid,
      } => {
        lines.push(format!("  Transfer syntax UID: {transfer_syntax_uid}"));
      }

      P10Error::SpecificCharacterSetInvalid {
        specific_character_set,
        details,
      } => {
        lines.push(format!(
          "  Specific character set: {specific_character_set}"
        ));

        if !details.is_empty() {
          lines.push(format!("  Details: {details}"));
        }
      }

      P10Error::PartStreamInvalid { details, part, .. } => {
        lines.push(format!("  Details: {details}"));
        lines.push(format!("  Part: {part}"));
      }

      P10Error::DataInvalid { details, .. }
      | P10Error::MaximumExceeded { details, .. }
      | P10Error::FileError { details, .. }
      | P10Error::OtherError { details, .. } => {
        lines.push(format!("  Details: {details}"));
      }

      _ => (),
    };

    match self {
      P10Error::DataEndedUnexpectedly { offset, path, .. }
      | P10Error::DataInvalid { path, offset, .. }
      | P10Error::MaximumExceeded { offset, path, .. } => {
        lines.push(format!("  Path: {}", path.to_detailed_string()));
        lines.push(format!("  Offset: 0x{offset:X}"));
      }

      _ => (),
    };

    lines
  }
}
