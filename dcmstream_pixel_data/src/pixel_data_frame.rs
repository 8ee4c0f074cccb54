//! A single frame of pixel data in its raw form.
//!
//! The data may be native or encapsulated in a transfer-syntax-specific
//! encoding, but how it is encoded is not a concern of [`PixelDataFrame`].

use dcmstream_core::SharedBytes;

/// A single frame of pixel data, held as one or more chunks of shared bytes
/// so that no pixel data is copied during frame extraction.
///
/// Use [`PixelDataFrame::to_bytes()`] when the frame's data is needed in one
/// contiguous buffer.
///
#[derive(Clone, Debug)]
pub struct PixelDataFrame {
  index: usize,
  chunks: Vec<SharedBytes>,
  length: usize,
  bit_offset: usize,
}

impl PixelDataFrame {
  /// Creates a new empty frame of pixel data.
  ///
  pub fn new() -> Self {
    Self {
      index: 0,
      chunks: vec![],
      length: 0,
      bit_offset: 0,
    }
  }

  /// Returns the index of this frame in its data set, starting at zero.
  ///
  pub fn index(&self) -> usize {
    self.index
  }

  /// Sets the index of this frame in its data set.
  ///
  pub fn set_index(&mut self, index: usize) {
    self.index = index;
  }

  /// Appends the next chunk of pixel data to this frame.
  ///
  pub fn push_chunk(&mut self, data: SharedBytes) {
    self.length += data.len();
    self.chunks.push(data);
  }

  /// The size in bytes of this frame of pixel data.
  ///
  pub fn len(&self) -> usize {
    self.length
  }

  /// Returns whether this frame of pixel data is empty.
  ///
  pub fn is_empty(&self) -> bool {
    self.length == 0
  }

  /// The size in bits of this frame of pixel data, taking the frame's bit
  /// offset into account.
  ///
  pub fn len_in_bits(&self) -> usize {
    (self.length * 8).saturating_sub(self.bit_offset)
  }

  /// Returns the bit offset for this frame: the number of low bits of the
  /// frame's first byte that belong to the previous frame and should be
  /// skipped.
  ///
  /// The bit offset is only ever non-zero for native pixel data with a
  /// *'(0028,0100) Bits Allocated'* value of 1, where frames aren't required
  /// to start on byte boundaries.
  ///
  pub fn bit_offset(&self) -> usize {
    self.bit_offset
  }

  /// Sets this frame's bit offset. See [`Self::bit_offset()`].
  ///
  pub fn set_bit_offset(&mut self, bit_offset: usize) {
    self.bit_offset = bit_offset.clamp(0, 7);
  }

  /// Returns the chunks of binary data that make up this frame.
  ///
  pub fn chunks(&self) -> &[SharedBytes] {
    &self.chunks
  }

  /// Removes `count` bytes from the end of this frame, crossing chunk
  /// boundaries as needed.
  ///
  pub fn drop_end_bytes(&mut self, count: usize) {
    let target_length = self.length.saturating_sub(count);

    // Pop chunks off the end until the frame no longer exceeds the target
    // length
    while self.length > target_length {
      match self.chunks.pop() {
        Some(chunk) => {
          self.length -= chunk.len();

          // If too much was removed, put back the part of the chunk that's
          // still needed
          if self.length < target_length {
            let keep = target_length - self.length;

            self.chunks.push(chunk.take_front(keep));
            self.length = target_length;

            break;
          }
        }

        None => break,
      }
    }
  }

  /// Returns this frame's data as a single contiguous buffer. This copies the
  /// pixel data when the frame holds more than one chunk or has a bit offset,
  /// so iterating [`Self::chunks()`] is preferred where possible.
  ///
  pub fn to_bytes(&self) -> SharedBytes {
    // A frame of exactly one chunk and no bit offset needs no copy
    if self.bit_offset == 0 {
      match self.chunks.as_slice() {
        [] => return SharedBytes::empty(),
        [chunk] => return chunk.clone(),
        _ => (),
      }
    }

    let mut buffer = Vec::with_capacity(self.length);
    for chunk in self.chunks.iter() {
      buffer.extend_from_slice(chunk);
    }

    // A bit offset is corrected for by right shifting the whole buffer. Each
    // output byte is the 16-bit window over a byte and its successor, shifted
    // down by the offset. Only occurs for 1bpp frames whose pixel count isn't
    // a multiple of eight.
    if self.bit_offset != 0 {
      for i in 0..buffer.len() {
        let next = buffer.get(i + 1).copied().unwrap_or(0);
        let window = u16::from_le_bytes([buffer[i], next]);

        buffer[i] = (window >> self.bit_offset) as u8;
      }
    }

    buffer.into()
  }
}

impl Default for PixelDataFrame {
  fn default() -> Self {
    Self::new()
  }
}

impl PartialEq for PixelDataFrame {
  fn eq(&self, other: &Self) -> bool {
    self.to_bytes() == other.to_bytes()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_chunk_test() {
    let mut frame = PixelDataFrame::new();

    frame.push_chunk(SharedBytes::from_vec(vec![0, 1, 2, 3]).take_front(3));

    assert_eq!(frame.len(), 3);
    assert_eq!(frame.to_bytes(), vec![0, 1, 2].into());
  }

  #[test]
  fn multiple_chunks_test() {
    let mut frame = PixelDataFrame::new();

    frame.push_chunk(SharedBytes::from_vec(vec![0, 1, 2, 3]).take_front(2));
    frame.push_chunk(SharedBytes::from_vec(vec![4, 5, 6, 7]).slice(1, 3));
    frame.push_chunk(SharedBytes::from_vec(vec![8, 9, 10, 11]).drop_front(2));

    assert_eq!(frame.len(), 6);
    assert_eq!(frame.chunks().len(), 3);
    assert_eq!(frame.to_bytes(), vec![0, 1, 5, 6, 10, 11].into());
  }

  #[test]
  fn drop_end_bytes_test() {
    let mut frame = PixelDataFrame::new();
    frame.push_chunk(vec![0, 1, 2, 3, 4].into());

    frame.drop_end_bytes(2);
    assert_eq!(frame.len(), 3);
    assert_eq!(frame.to_bytes(), vec![0, 1, 2].into());

    let mut frame = PixelDataFrame::new();
    frame.push_chunk(SharedBytes::from_vec(vec![9, 0, 1, 9]).slice(1, 3));
    frame.push_chunk(vec![2, 3].into());

    frame.drop_end_bytes(1);
    assert_eq!(frame.to_bytes(), vec![0, 1, 2].into());

    let mut frame = PixelDataFrame::new();
    frame.push_chunk(vec![0, 1].into());
    frame.push_chunk(vec![2, 3].into());
    frame.push_chunk(vec![4, 5].into());

    frame.drop_end_bytes(2);
    assert_eq!(frame.to_bytes(), vec![0, 1, 2, 3].into());

    frame.drop_end_bytes(100);
    assert_eq!(frame.len(), 0);
    assert_eq!(frame.chunks().len(), 0);
  }

  #[test]
  fn bit_offset_test() {
    let mut frame = PixelDataFrame::new();

    // Two bytes of 1-bit pixel data where the first two bits belong to the
    // previous frame
    frame.push_chunk(vec![0b1010_1101, 0b0000_0011].into());
    frame.set_bit_offset(2);

    assert_eq!(frame.len_in_bits(), 14);
    assert_eq!(frame.to_bytes(), vec![0b1110_1011, 0b0000_0000].into());
  }
}
