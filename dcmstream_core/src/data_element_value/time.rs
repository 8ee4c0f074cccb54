//! Work with the DICOM `Time` value representation.

use regex::Regex;

use crate::{DataError, utils};

/// A structured time that can be converted to/from a `Time` value. The minute
/// and second components are optional.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredTime {
  pub hour: u8,
  pub minute: Option<u8>,
  pub second: Option<f64>,
}

static TIME_REGEX: std::sync::LazyLock<Regex> =
  std::sync::LazyLock::new(|| {
    Regex::new("^(\\d\\d)((\\d\\d)((\\d\\d)(\\.\\d{1,6})?)?)?$").unwrap()
  });

impl StructuredTime {
  /// Converts a `Time` value into a structured time.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
    let time_string = core::str::from_utf8(bytes).map_err(|_| {
      DataError::new_value_invalid("Time is invalid UTF-8".to_string())
    })?;

    let time_string = utils::trim_trailing_padding(time_string).trim();

    match TIME_REGEX.captures(time_string) {
      Some(caps) => Ok(Self {
        hour: caps.get(1).unwrap().as_str().parse::<u8>().unwrap(),
        minute: caps.get(3).map(|m| m.as_str().parse::<u8>().unwrap()),
        second: caps.get(4).map(|s| s.as_str().parse::<f64>().unwrap()),
      }),

      _ => Err(DataError::new_value_invalid(format!(
        "Time is invalid: '{}'",
        time_string
      ))),
    }
  }

  /// Converts a structured time into a `Time` value.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    let mut bytes = self.to_time_string()?.into_bytes();

    if bytes.len() % 2 == 1 {
      bytes.push(0x20);
    }

    Ok(bytes)
  }

  /// Returns the `Time` string form of a structured time.
  ///
  pub fn to_time_string(&self) -> Result<String, DataError> {
    if self.second.is_some() && self.minute.is_none() {
      return Err(DataError::new_value_invalid(
        "Time minute value must be present when there is a second value"
          .to_string(),
      ));
    }

    if self.hour > 23 {
      return Err(DataError::new_value_invalid(format!(
        "Time hour value is invalid: {}",
        self.hour,
      )));
    }

    let mut result = format!("{:02}", self.hour);

    if let Some(minute) = self.minute {
      if minute > 59 {
        return Err(DataError::new_value_invalid(format!(
          "Time minute value is invalid: {}",
          minute
        )));
      }

      result.push_str(&format!("{:02}", minute));
    }

    // A second value of exactly 60 is allowed to accommodate leap seconds
    if let Some(second) = self.second {
      if !(0.0..=60.0).contains(&second) {
        return Err(DataError::new_value_invalid(format!(
          "Time second value is invalid: {}",
          second
        )));
      }

      result.push_str(&Self::format_second(second));
    }

    Ok(result)
  }

  /// Formats a structured time as an ISO 8601 time. Components that aren't
  /// specified are omitted.
  ///
  pub fn to_iso8601(&self) -> String {
    let mut s = format!("{:02}", self.hour);

    if let Some(minute) = self.minute {
      s.push_str(&format!(":{:02}", minute));

      if let Some(second) = self.second {
        s.push(':');
        s.push_str(&Self::format_second(second));
      }
    }

    s
  }

  /// Formats a number of seconds as `SS[.FFFFFF]`, with up to six fractional
  /// digits that are only included for a non-whole number of seconds.
  ///
  fn format_second(seconds: f64) -> String {
    let whole_seconds = format!("{:02}", seconds.floor() as u8);

    let fractional_seconds = (seconds.fract() * 1_000_000.0).round() as u32;

    if fractional_seconds == 0 {
      whole_seconds
    } else {
      let fractional_seconds = fractional_seconds.to_string();
      format!(
        "{}.{}",
        whole_seconds,
        fractional_seconds.trim_end_matches('0')
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      StructuredTime::from_bytes(b"22"),
      Ok(StructuredTime {
        hour: 22,
        minute: None,
        second: None
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"2231"),
      Ok(StructuredTime {
        hour: 22,
        minute: Some(31),
        second: None
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"223114.5 "),
      Ok(StructuredTime {
        hour: 22,
        minute: Some(31),
        second: Some(14.5)
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"22:31"),
      Err(DataError::new_value_invalid(
        "Time is invalid: '22:31'".to_string()
      ))
    );

    assert_eq!(
      StructuredTime::from_bytes(&[0xD0]),
      Err(DataError::new_value_invalid(
        "Time is invalid UTF-8".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      StructuredTime {
        hour: 9,
        minute: Some(40),
        second: Some(2.25)
      }
      .to_bytes(),
      Ok(b"094002.25 ".to_vec())
    );

    assert_eq!(
      StructuredTime {
        hour: 9,
        minute: None,
        second: Some(2.0)
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Time minute value must be present when there is a second value"
          .to_string()
      ))
    );

    assert_eq!(
      StructuredTime {
        hour: 24,
        minute: None,
        second: None
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Time hour value is invalid: 24".to_string()
      ))
    );
  }

  #[test]
  fn to_iso8601_test() {
    assert_eq!(
      StructuredTime {
        hour: 9,
        minute: Some(40),
        second: Some(2.5)
      }
      .to_iso8601(),
      "09:40:02.5"
    );

    assert_eq!(
      StructuredTime {
        hour: 9,
        minute: None,
        second: None
      }
      .to_iso8601(),
      "09"
    );
  }
}
