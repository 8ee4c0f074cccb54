//! Shared helper types and functions used across the library.

use std::rc::Rc;

/// A cheaply cloneable byte slice. It stores an `Rc<Vec<u8>>` along with the
/// range of that buffer it covers, so slicing and cloning never copy the
/// underlying bytes.
///
/// Dereferences to `&[u8]` and so can be used anywhere a plain byte slice is
/// expected.
///
#[derive(Clone)]
pub struct SharedBytes {
  buffer: Rc<Vec<u8>>,
  range: core::ops::Range<usize>,
}

impl SharedBytes {
  /// Creates a shared byte slice that takes ownership of the given `Vec<u8>`.
  ///
  pub fn from_vec(buffer: Vec<u8>) -> Self {
    let range = 0..buffer.len();

    Self {
      buffer: Rc::new(buffer),
      range,
    }
  }

  /// Creates a shared byte slice of length zero.
  ///
  pub fn empty() -> Self {
    Self {
      buffer: Rc::new(vec![]),
      range: 0..0,
    }
  }

  /// Returns a new shared byte slice covering the given subrange of this one.
  /// No bytes are copied.
  ///
  pub fn slice(&self, start: usize, end: usize) -> Self {
    assert!(start <= end, "Shared bytes range is inverted");
    assert!(end <= self.range.len(), "Shared bytes range is out of bounds");

    Self {
      buffer: self.buffer.clone(),
      range: (self.range.start + start)..(self.range.start + end),
    }
  }

  /// Returns a new shared byte slice with the first `n` bytes removed.
  ///
  pub fn drop_front(&self, n: usize) -> Self {
    self.slice(n, self.len())
  }

  /// Returns a new shared byte slice covering only the first `n` bytes.
  ///
  pub fn take_front(&self, n: usize) -> Self {
    self.slice(0, n)
  }

  /// Consumes this shared byte slice and returns its content as a `Vec<u8>`.
  /// The underlying buffer is reused rather than copied when this is the only
  /// reference to it and the slice covers the whole buffer.
  ///
  pub fn into_vec(self) -> Vec<u8> {
    if self.range == (0..self.buffer.len()) {
      match Rc::try_unwrap(self.buffer) {
        Ok(buffer) => buffer,
        Err(rc) => rc[self.range].to_vec(),
      }
    } else {
      self.as_slice().to_vec()
    }
  }

  fn as_slice(&self) -> &[u8] {
    &self.buffer[self.range.clone()]
  }
}

impl core::ops::Deref for SharedBytes {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    self.as_slice()
  }
}

impl core::fmt::Debug for SharedBytes {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{:?}", self.as_slice())
  }
}

impl PartialEq for SharedBytes {
  fn eq(&self, other: &Self) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl From<Vec<u8>> for SharedBytes {
  fn from(buffer: Vec<u8>) -> Self {
    SharedBytes::from_vec(buffer)
  }
}

/// Formats a byte slice as uppercase hex, e.g. `[1A 2B 3C]`. Slices longer
/// than `max_length` are cut short and given a trailing ellipsis, e.g.
/// `[1A 2B 3C …]`.
///
pub fn inspect_u8_slice(bytes: &[u8], max_length: usize) -> String {
  let mut result =
    String::with_capacity(3 * core::cmp::min(max_length, bytes.len()) + 4);

  result.push('[');

  for (index, byte) in bytes.iter().take(max_length).enumerate() {
    if index > 0 {
      result.push(' ');
    }

    result.push_str(&format!("{:02X}", byte));
  }

  if bytes.len() > max_length {
    result.push_str(" …");
  }

  result.push(']');

  result
}

/// Trims trailing space and NUL characters from a string slice. These are the
/// padding characters used by DICOM string values.
///
pub fn trim_trailing_padding(s: &str) -> &str {
  s.trim_end_matches([' ', '\0'])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slice_test() {
    let bytes = SharedBytes::from_vec(vec![0, 1, 2, 3, 4, 5]);

    assert_eq!(&*bytes.slice(1, 4), &[1, 2, 3]);
    assert_eq!(&*bytes.slice(1, 4).drop_front(1), &[2, 3]);
    assert_eq!(&*bytes.take_front(2), &[0, 1]);
    assert_eq!(bytes.slice(2, 5).into_vec(), vec![2, 3, 4]);
  }

  #[test]
  fn inspect_u8_slice_test() {
    assert_eq!(
      inspect_u8_slice(&[0xD1, 0x96, 0x33], 100),
      "[D1 96 33]".to_string()
    );

    assert_eq!(
      inspect_u8_slice(&[0xD1, 0x96, 0x33, 0x44], 3),
      "[D1 96 33 …]".to_string()
    );
  }

  #[test]
  fn trim_trailing_padding_test() {
    assert_eq!(trim_trailing_padding("AB \0 "), "AB");
    assert_eq!(trim_trailing_padding(" AB"), " AB");
  }
}
