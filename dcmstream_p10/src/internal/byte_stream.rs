use std::collections::VecDeque;

use dcmstream_core::SharedBytes;

/// A byte stream that accepts incoming chunks of binary data of any size and
/// lets the result be read and peeked as one continuous run of bytes.
///
/// Chunks are immutable once written. Consumption is tracked as an offset
/// into the frontmost chunk, which is discarded once the offset passes its
/// end, so reads that fall inside a single chunk can be served as zero-copy
/// slices.
///
/// Incoming bytes can optionally be passed through zlib inflate before being
/// made available for reading.
///
#[derive(Debug)]
pub struct ByteStream {
  chunks: VecDeque<SharedBytes>,
  front_offset: usize,
  available: u64,
  bytes_read: u64,
  is_writing_finished: bool,
  inflater: Option<Inflater>,
}

/// The state of an active zlib inflation: the inflate stream, the deflated
/// input not yet fed to it, and a cursor into that input's frontmost chunk.
///
#[derive(Debug)]
struct Inflater {
  stream: flate2::Decompress,
  input: VecDeque<SharedBytes>,
  input_offset: usize,
  reached_end: bool,
}

#[derive(Debug)]
pub enum ByteStreamError {
  /// A read couldn't be fulfilled because the stream doesn't hold the number
  /// of bytes requested and more need to be written to it first.
  DataRequired,

  /// A read would go past the end of the stream.
  DataEnd,

  /// Data written to a stream with zlib inflate active wasn't valid zlib
  /// data.
  ZlibDataError,

  /// Data was written to a stream whose final bytes have already been
  /// written.
  WriteAfterCompletion,
}

/// Inflated output is produced at most this many bytes at a time. Inflation
/// stops once a read can be served, so a zlib bomb can't balloon memory
/// usage beyond the requested read size plus one step.
///
const INFLATE_OUTPUT_STEP: usize = 32 * 1024;

impl ByteStream {
  /// Creates a new empty byte stream.
  ///
  pub fn new() -> ByteStream {
    ByteStream {
      chunks: VecDeque::new(),
      front_offset: 0,
      available: 0,
      bytes_read: 0,
      is_writing_finished: false,
      inflater: None,
    }
  }

  /// Returns the total number of bytes read out of this stream so far.
  ///
  pub fn bytes_read(&self) -> u64 {
    self.bytes_read
  }

  /// Returns whether the stream is fully consumed, i.e. no bytes remain
  /// unread and no further bytes will be written.
  ///
  pub fn is_fully_consumed(&self) -> bool {
    self.available == 0
      && self.is_writing_finished
      && match &self.inflater {
        Some(inflater) => inflater.reached_end,
        None => true,
      }
  }

  /// Writes bytes to this stream, making them available to subsequent reads.
  /// Passing `done` as true signals that no more bytes will be written, after
  /// which further writes error.
  ///
  /// When zlib inflate is active the written bytes are inflated and the
  /// output is what becomes readable.
  ///
  pub fn write(
    &mut self,
    data: SharedBytes,
    done: bool,
  ) -> Result<(), ByteStreamError> {
    if self.is_writing_finished {
      return Err(ByteStreamError::WriteAfterCompletion);
    }

    self.is_writing_finished = done;

    if !data.is_empty() {
      match self.inflater.as_mut() {
        Some(inflater) => inflater.input.push_back(data),

        None => {
          self.available += data.len() as u64;
          self.chunks.push_back(data);
        }
      }
    }

    Ok(())
  }

  /// Reads bytes out of this stream. A read that falls inside the frontmost
  /// chunk is returned as a slice of it with no copying.
  ///
  pub fn read(
    &mut self,
    byte_count: usize,
  ) -> Result<SharedBytes, ByteStreamError> {
    if byte_count == 0 {
      return Ok(SharedBytes::empty());
    }

    self.ensure_readable(byte_count)?;

    let front = self.chunks.front().unwrap();

    let result = if byte_count <= front.len() - self.front_offset {
      front.slice(self.front_offset, self.front_offset + byte_count)
    } else {
      self.copy_out(byte_count).into()
    };

    self.discard(byte_count);

    Ok(result)
  }

  /// Returns the bytes the next read will return without consuming them.
  ///
  pub fn peek(&mut self, byte_count: usize) -> Result<Vec<u8>, ByteStreamError> {
    self.ensure_readable(byte_count)?;

    Ok(self.copy_out(byte_count))
  }

  /// Turns this stream into a zlib inflating stream. All unread bytes, and
  /// all bytes written from now on, pass through streaming zlib inflation and
  /// the inflated output is what is read out.
  ///
  /// Used when the transfer syntax is deflated.
  ///
  pub fn start_zlib_inflate(&mut self) {
    self.inflater = Some(Inflater {
      stream: flate2::Decompress::new(false),
      input: core::mem::take(&mut self.chunks),
      input_offset: self.front_offset,
      reached_end: false,
    });

    self.front_offset = 0;
    self.available = 0;
  }

  /// Inflates pending input and then checks that `byte_count` bytes are
  /// available to be read or peeked.
  ///
  fn ensure_readable(
    &mut self,
    byte_count: usize,
  ) -> Result<(), ByteStreamError> {
    self.run_inflate(byte_count)?;

    if byte_count as u64 <= self.available {
      Ok(())
    } else if self.is_writing_finished {
      Err(ByteStreamError::DataEnd)
    } else {
      Err(ByteStreamError::DataRequired)
    }
  }

  /// Copies the next `byte_count` readable bytes into a new buffer without
  /// consuming them. The caller has already checked availability.
  ///
  fn copy_out(&self, byte_count: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(byte_count);
    let mut offset = self.front_offset;

    for chunk in self.chunks.iter() {
      if result.len() == byte_count {
        break;
      }

      let end = core::cmp::min(chunk.len(), offset + byte_count - result.len());
      result.extend_from_slice(&chunk[offset..end]);

      offset = 0;
    }

    result
  }

  /// Consumes `byte_count` readable bytes by advancing the front offset and
  /// discarding chunks it passes over.
  ///
  fn discard(&mut self, byte_count: usize) {
    self.available -= byte_count as u64;
    self.bytes_read += byte_count as u64;

    let mut remaining = byte_count;
    while remaining > 0 {
      let front_length = self.chunks.front().unwrap().len() - self.front_offset;

      if remaining < front_length {
        self.front_offset += remaining;
        break;
      }

      remaining -= front_length;
      self.front_offset = 0;
      self.chunks.pop_front();
    }
  }

  /// When zlib inflate is active, inflates input in bounded steps until
  /// `target` bytes are available or the input can't yield any more.
  ///
  fn run_inflate(&mut self, target: usize) -> Result<(), ByteStreamError> {
    if self.inflater.is_none() {
      return Ok(());
    }

    while self.available < target as u64 {
      let inflater = self.inflater.as_mut().unwrap();

      if inflater.reached_end {
        break;
      }

      let Some(input_chunk) = inflater.input.front() else {
        break;
      };

      let input = &input_chunk[inflater.input_offset..];
      let mut output = vec![0u8; INFLATE_OUTPUT_STEP];

      let total_in_before = inflater.stream.total_in();
      let total_out_before = inflater.stream.total_out();

      let status = inflater
        .stream
        .decompress(input, &mut output, flate2::FlushDecompress::None)
        .map_err(|_| ByteStreamError::ZlibDataError)?;

      let consumed = (inflater.stream.total_in() - total_in_before) as usize;
      let produced = (inflater.stream.total_out() - total_out_before) as usize;

      // Advance the input cursor, retiring the front input chunk once it is
      // fully fed to the inflate stream
      inflater.input_offset += consumed;
      if inflater.input_offset >= input_chunk.len() {
        inflater.input.pop_front();
        inflater.input_offset = 0;
      }

      if status == flate2::Status::StreamEnd {
        inflater.reached_end = true;
      }

      if produced > 0 {
        output.truncate(produced);
        self.available += produced as u64;
        self.chunks.push_back(output.into());
      }

      if status == flate2::Status::StreamEnd {
        break;
      }

      // No progress means the next step needs input that hasn't been written
      // yet
      if consumed == 0 && produced == 0 {
        break;
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn read_and_peek_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![0, 1, 2].into(), false).unwrap();
    stream.write(vec![3, 4, 5].into(), false).unwrap();

    assert_eq!(stream.peek(4).unwrap(), vec![0, 1, 2, 3]);

    assert_eq!(&*stream.read(2).unwrap(), &[0, 1]);
    assert_eq!(&*stream.read(3).unwrap(), &[2, 3, 4]);
    assert_eq!(stream.bytes_read(), 5);

    assert!(matches!(stream.read(2), Err(ByteStreamError::DataRequired)));

    stream.write(vec![6].into(), true).unwrap();

    assert_eq!(&*stream.read(2).unwrap(), &[5, 6]);
    assert!(stream.is_fully_consumed());

    assert!(matches!(stream.read(1), Err(ByteStreamError::DataEnd)));

    assert!(matches!(
      stream.write(vec![7].into(), true),
      Err(ByteStreamError::WriteAfterCompletion)
    ));
  }

  #[test]
  fn read_within_front_chunk_is_zero_copy_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![0, 1, 2, 3, 4, 5].into(), false).unwrap();

    // Consecutive reads inside one chunk advance the front offset
    assert_eq!(&*stream.read(2).unwrap(), &[0, 1]);
    assert_eq!(&*stream.read(2).unwrap(), &[2, 3]);
    assert_eq!(stream.peek(2).unwrap(), vec![4, 5]);
    assert_eq!(&*stream.read(2).unwrap(), &[4, 5]);
  }

  #[test]
  fn zlib_inflate_test() {
    let data = b"Hello zlib world, hello zlib world, hello zlib world";

    let mut compressor =
      flate2::Compress::new(flate2::Compression::default(), false);
    let mut deflated = vec![0u8; 256];
    compressor
      .compress(data, &mut deflated, flate2::FlushCompress::Finish)
      .unwrap();
    deflated.resize(compressor.total_out() as usize, 0);

    let mut stream = ByteStream::new();
    stream.start_zlib_inflate();
    stream.write(deflated.into(), true).unwrap();

    assert_eq!(&*stream.read(data.len()).unwrap(), data.as_slice());
    assert!(stream.is_fully_consumed());
  }
}
