//! Work with the DICOM `Date` value representation.

use regex::Regex;

use crate::{DataError, utils};

/// A structured date that can be converted to/from a `Date` value.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredDate {
  pub year: u16,
  pub month: u8,
  pub day: u8,
}

static DATE_REGEX: std::sync::LazyLock<Regex> =
  std::sync::LazyLock::new(|| Regex::new("^(\\d{4})(\\d\\d)(\\d\\d)$").unwrap());

impl StructuredDate {
  /// Converts a `Date` value into a structured date.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
    let date_string = core::str::from_utf8(bytes).map_err(|_| {
      DataError::new_value_invalid("Date is invalid UTF-8".to_string())
    })?;

    let date_string = utils::trim_trailing_padding(date_string).trim();

    match DATE_REGEX.captures(date_string) {
      Some(caps) => Ok(Self {
        year: caps.get(1).unwrap().as_str().parse::<u16>().unwrap(),
        month: caps.get(2).unwrap().as_str().parse::<u8>().unwrap(),
        day: caps.get(3).unwrap().as_str().parse::<u8>().unwrap(),
      }),

      _ => Err(DataError::new_value_invalid(format!(
        "Date is invalid: '{date_string}'"
      ))),
    }
  }

  /// Converts a structured date into a `Date` value.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    Ok(
      Self::components_to_string(self.year, Some(self.month), Some(self.day))?
        .into_bytes(),
    )
  }

  /// Builds the content of a `Date` value where the month and day are both
  /// optional. A month is required when a day is specified. This partial form
  /// is used by the `DateTime` value representation.
  ///
  pub fn components_to_string(
    year: u16,
    month: Option<u8>,
    day: Option<u8>,
  ) -> Result<String, DataError> {
    if day.is_some() && month.is_none() {
      return Err(DataError::new_value_invalid(
        "Date's month must be present when there is a day value".to_string(),
      ));
    }

    if year > 9999 {
      return Err(DataError::new_value_invalid(format!(
        "Date's year is invalid: {year}"
      )));
    }

    let mut result = format!("{year:04}");

    if let Some(month) = month {
      if !(1..=12).contains(&month) {
        return Err(DataError::new_value_invalid(format!(
          "Date's month is invalid: {month}"
        )));
      }

      result.push_str(&format!("{month:02}"));
    }

    if let Some(day) = day {
      if !(1..=31).contains(&day) {
        return Err(DataError::new_value_invalid(format!(
          "Date's day is invalid: {day}"
        )));
      }

      result.push_str(&format!("{day:02}"));
    }

    Ok(result)
  }

  /// Formats a structured date as an ISO 8601 date.
  ///
  pub fn to_iso8601(&self) -> String {
    format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_iso8601_test() {
    assert_eq!(
      StructuredDate {
        year: 2024,
        month: 7,
        day: 2
      }
      .to_iso8601(),
      "2024-07-02"
    );
  }

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      StructuredDate::from_bytes(b"20000102"),
      Ok(StructuredDate {
        year: 2000,
        month: 1,
        day: 2
      })
    );

    assert_eq!(
      StructuredDate::from_bytes(&[0xD0]),
      Err(DataError::new_value_invalid(
        "Date is invalid UTF-8".to_string()
      ))
    );

    assert_eq!(
      StructuredDate::from_bytes(b"2024"),
      Err(DataError::new_value_invalid(
        "Date is invalid: '2024'".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      StructuredDate {
        year: 2000,
        month: 1,
        day: 2
      }
      .to_bytes(),
      Ok(b"20000102".to_vec())
    );

    assert_eq!(
      StructuredDate {
        year: 10000,
        month: 1,
        day: 2
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Date's year is invalid: 10000".to_string()
      ))
    );

    assert_eq!(
      StructuredDate {
        year: 0,
        month: 13,
        day: 2
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Date's month is invalid: 13".to_string()
      ))
    );

    assert_eq!(
      StructuredDate {
        year: 100,
        month: 1,
        day: 32
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Date's day is invalid: 32".to_string()
      ))
    );
  }
}
