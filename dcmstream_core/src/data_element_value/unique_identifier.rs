//! Work with the DICOM `UniqueIdentifier` value representation.

use regex::Regex;

use crate::DataError;

/// Converts a list of UIDs into a `UniqueIdentifier` value.
///
pub fn to_bytes(uids: &[&str]) -> Result<Vec<u8>, DataError> {
  if uids.iter().any(|uid| !is_valid(uid)) {
    return Err(DataError::new_value_invalid(
      "UniqueIdentifier is invalid".to_string(),
    ));
  }

  let mut bytes = uids.join("\\").into_bytes();

  if bytes.len() % 2 == 1 {
    bytes.push(0x00);
  }

  Ok(bytes)
}

static UID_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
  Regex::new("^(0|[1-9][0-9]*)(\\.(0|[1-9][0-9]*))*$").unwrap()
});

/// Returns whether a string is a valid UID. A valid UID is 1-64 characters of
/// digit sequences separated by periods, with no leading zeros in any
/// sequence other than a lone zero.
///
pub fn is_valid(uid: &str) -> bool {
  if uid.is_empty() || uid.len() > 64 {
    return false;
  }

  UID_REGEX.is_match(uid)
}

/// Generates a new random 64-character UID underneath the given prefix. The
/// prefix must itself be a valid UID of no more than 60 characters, or empty.
///
#[allow(clippy::result_unit_err)]
pub fn new(prefix: &str) -> Result<String, ()> {
  use rand::Rng;

  let mut rng = rand::thread_rng();
  let mut random_character = |range: core::ops::Range<u8>| -> char {
    char::from(rng.gen_range(range))
  };

  new_using_rng(prefix, &mut random_character)
}

/// Generates a new random 64-character UID underneath the given prefix, using
/// the passed function as the source of random characters.
///
#[allow(clippy::result_unit_err)]
pub fn new_using_rng(
  prefix: &str,
  rng: &mut dyn FnMut(core::ops::Range<u8>) -> char,
) -> Result<String, ()> {
  if prefix.len() > 60 || !prefix.is_empty() && !is_valid(prefix) {
    return Err(());
  }

  // Start with a separator, if needed, then a non-zero digit
  let mut uid = prefix.to_string();
  if !uid.is_empty() {
    uid.push('.');
  }
  uid.push(rng(b'1'..b'9' + 1));

  while uid.len() < 64 {
    uid.push(rng(b'0'..b'9' + 1));
  }

  Ok(uid)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_bytes_test() {
    let invalid_uid_error = Err(DataError::new_value_invalid(
      "UniqueIdentifier is invalid".to_string(),
    ));

    assert_eq!(to_bytes(&[]), Ok(vec![]));

    assert_eq!(to_bytes(&[""]), invalid_uid_error);

    assert_eq!(to_bytes(&["1.0"]), Ok(b"1.0\0".to_vec()));

    assert_eq!(to_bytes(&["1.2", "3.4"]), Ok(b"1.2\\3.4\0".to_vec()));

    assert_eq!(to_bytes(&["1.00"]), invalid_uid_error);

    assert_eq!(to_bytes(&["1".repeat(65).as_str()]), invalid_uid_error);
  }

  #[test]
  fn new_test() {
    for _ in 0..100 {
      assert!(is_valid(&new("").unwrap()));
      assert!(is_valid(&new("1111.2222").unwrap()));
    }

    assert!(is_valid(&new("1".repeat(60).as_str()).unwrap()));

    let uid = new("1111.2222").unwrap();
    assert!(uid.starts_with("1111.2222."));
    assert_eq!(uid.len(), 64);

    assert_eq!(new("1".repeat(61).as_str()), Err(()));

    assert_eq!(new("1."), Err(()));
  }
}
