//! Reads and writes the DICOM Part 10 (P10) binary format used to store and
//! transmit DICOM-based medical imaging information.

pub mod data_set_builder;
pub mod p10_error;
pub mod p10_part;
pub mod p10_read;
pub mod p10_read_config;
pub mod p10_write;
pub mod p10_write_config;
pub mod transforms;
pub mod uids;

mod internal;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use dcmstream_core::{DataElementTag, DataSet, SharedBytes};

pub use data_set_builder::DataSetBuilder;
pub use p10_error::P10Error;
pub use p10_part::P10Part;
pub use p10_read::P10ReadContext;
pub use p10_read_config::P10ReadConfig;
pub use p10_write::P10WriteContext;
pub use p10_write_config::P10WriteConfig;
pub use transforms::p10_filter_transform::P10FilterTransform;
pub use transforms::p10_insert_transform::P10InsertTransform;

/// Returns whether a file contains DICOM P10 data, determined by the presence
/// of the 'DICM' prefix at offset 128.
///
pub fn is_valid_file<P: AsRef<Path>>(filename: P) -> bool {
  match File::open(filename) {
    Ok(mut file) => {
      let mut buffer = [0u8; 132];
      match file.read_exact(&mut buffer) {
        Ok(_) => is_valid_bytes(&buffer),
        Err(_) => false,
      }
    }
    Err(_) => false,
  }
}

/// Returns whether the given bytes contain DICOM P10 data, determined by the
/// presence of the 'DICM' prefix at offset 128.
///
pub fn is_valid_bytes(bytes: &[u8]) -> bool {
  bytes.len() >= 132 && bytes[128..132] == *b"DICM"
}

/// Reads DICOM P10 data from a file into an in-memory data set.
///
pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<DataSet, P10Error> {
  match File::open(filename) {
    Ok(mut file) => read_stream(&mut file).map_err(|e| e.0),
    Err(e) => Err(P10Error::FileError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}

/// Reads DICOM P10 data from a read stream into an in-memory data set,
/// consuming all data available in the stream.
///
/// On error, the data set builder at the time of the error is also returned,
/// allowing the data successfully read before the error to be turned into a
/// partial data set with [`DataSetBuilder::force_end`].
///
pub fn read_stream(
  stream: &mut dyn Read,
) -> Result<DataSet, (P10Error, Box<DataSetBuilder>)> {
  let mut context = P10ReadContext::new(None);
  let mut builder = Box::new(DataSetBuilder::new());

  loop {
    let parts = match read_parts_from_stream(stream, &mut context) {
      Ok(parts) => parts,
      Err(e) => return Err((e, builder)),
    };

    for part in parts {
      if let Err(e) = builder.add_part(&part) {
        return Err((e, builder));
      }
    }

    if let Ok(final_data_set) = builder.final_data_set() {
      return Ok(final_data_set);
    }
  }
}

/// Reads the next DICOM P10 parts from a read stream. Bytes are read from the
/// stream in 256 KiB chunks until the read context makes at least one part
/// available or errors.
///
pub fn read_parts_from_stream(
  stream: &mut dyn Read,
  context: &mut P10ReadContext,
) -> Result<Vec<P10Part>, P10Error> {
  loop {
    match context.read_parts() {
      Ok(parts) => {
        if parts.is_empty() {
          continue;
        } else {
          return Ok(parts);
        }
      }

      // The read context needs more data, so read bytes off the stream and
      // write them to it
      Err(P10Error::DataRequired { .. }) => {
        let mut buffer = vec![0u8; 256 * 1024];
        match stream.read(&mut buffer) {
          Ok(0) => context.write_bytes(SharedBytes::empty(), true)?,

          Ok(bytes_count) => {
            buffer.resize(bytes_count, 0);
            context.write_bytes(buffer.into(), false)?;
          }

          Err(e) => {
            return Err(P10Error::FileError {
              when: "Reading from stream".to_string(),
              details: e.to_string(),
            });
          }
        }
      }

      e => return e,
    }
  }
}

/// Reads DICOM P10 data from a vector of bytes into a data set.
///
pub fn read_bytes(
  bytes: SharedBytes,
) -> Result<DataSet, (P10Error, Box<DataSetBuilder>)> {
  let mut context = P10ReadContext::new(None);
  let mut builder = Box::new(DataSetBuilder::new());

  if let Err(e) = context.write_bytes(bytes, true) {
    return Err((e, builder));
  }

  loop {
    match context.read_parts() {
      Ok(parts) => {
        for part in parts.iter() {
          if let Err(e) = builder.add_part(part) {
            return Err((e, builder));
          }
        }

        if let Ok(final_data_set) = builder.final_data_set() {
          return Ok(final_data_set);
        }
      }

      Err(e) => return Err((e, builder)),
    }
  }
}

/// Reads DICOM P10 data from a file into an in-memory data set, reading only
/// the requested data elements at the root of the main data set. The file is
/// read just far enough to return the requested data elements.
///
pub fn read_file_partial<P: AsRef<Path>>(
  filename: P,
  tags: &[DataElementTag],
  config: Option<P10ReadConfig>,
) -> Result<DataSet, P10Error> {
  match File::open(filename) {
    Ok(mut file) => read_stream_partial(&mut file, tags, config),
    Err(e) => Err(P10Error::FileError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}

/// Reads DICOM P10 data from a read stream into an in-memory data set,
/// reading only the requested data elements at the root of the main data set.
/// The stream is read just far enough to return the requested data elements.
///
pub fn read_stream_partial(
  stream: &mut dyn Read,
  tags: &[DataElementTag],
  config: Option<P10ReadConfig>,
) -> Result<DataSet, P10Error> {
  let mut context = P10ReadContext::new(config);

  let largest_tag = tags.iter().max().copied().unwrap_or(DataElementTag::ZERO);

  // Only the requested root data elements pass the filter
  let mut filter = {
    let tags = tags.to_vec();
    P10FilterTransform::new(Box::new(move |tag, _vr, _length, path| {
      !path.is_root() || tags.contains(&tag)
    }))
  };

  let mut data_set_builder = DataSetBuilder::new();

  let mut is_done = false;

  while !is_done {
    let parts = read_parts_from_stream(stream, &mut context)?;

    for part in parts {
      if filter.add_part(&part)? {
        data_set_builder.add_part(&part)?;
      }

      match part {
        P10Part::DataElementHeader { tag, path, .. }
        | P10Part::SequenceStart { tag, path, .. } => {
          if tag > largest_tag && path.is_root() {
            is_done = true;
            break;
          }
        }

        P10Part::End => {
          is_done = true;
          break;
        }

        _ => (),
      }
    }
  }

  data_set_builder.force_end();
  let mut data_set = data_set_builder.final_data_set().unwrap();

  // File Meta Information data elements are excluded unless explicitly
  // requested
  data_set.retain(|tag, _value| {
    !tag.is_file_meta_information() || tags.contains(tag)
  });

  Ok(data_set)
}

/// Writes a data set to a DICOM P10 file, overwriting any existing file with
/// the given name.
///
pub fn write_file<P: AsRef<Path>>(
  filename: P,
  data_set: &DataSet,
  config: Option<P10WriteConfig>,
) -> Result<(), P10Error> {
  match File::create(filename) {
    Ok(mut file) => write_stream(&mut file, data_set, config),
    Err(e) => Err(P10Error::FileError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}

/// Writes a data set as DICOM P10 bytes to a write stream.
///
pub fn write_stream(
  stream: &mut dyn std::io::Write,
  data_set: &DataSet,
  config: Option<P10WriteConfig>,
) -> Result<(), P10Error> {
  let mut bytes_callback = |p10_bytes: SharedBytes| -> Result<(), P10Error> {
    stream
      .write_all(&p10_bytes)
      .map_err(|e| P10Error::FileError {
        when: "Writing DICOM P10 data to stream".to_string(),
        details: e.to_string(),
      })
  };

  p10_write::data_set_to_bytes(data_set, &mut bytes_callback, config)?;

  stream.flush().map_err(|e| P10Error::FileError {
    when: "Writing DICOM P10 data to stream".to_string(),
    details: e.to_string(),
  })
}

/// Writes DICOM P10 parts to an output stream through the given write
/// context. Returns whether a [`P10Part::End`] part was present.
///
pub fn write_parts_to_stream(
  parts: &[P10Part],
  stream: &mut dyn std::io::Write,
  context: &mut P10WriteContext,
) -> Result<bool, P10Error> {
  for part in parts.iter() {
    context.write_part(part)?;
  }

  for bytes in context.read_bytes() {
    stream.write_all(&bytes).map_err(|e| P10Error::FileError {
      when: "Writing to output stream".to_string(),
      details: e.to_string(),
    })?;
  }

  if parts.last() == Some(&P10Part::End) {
    stream.flush().map_err(|e| P10Error::FileError {
      when: "Writing to output stream".to_string(),
      details: e.to_string(),
    })?;

    Ok(true)
  } else {
    Ok(false)
  }
}

/// Adds functions to [`DataSet`] for converting to and from the DICOM P10
/// format.
///
pub trait DataSetP10Extensions
where
  Self: Sized,
{
  /// Reads DICOM P10 data from a file into an in-memory data set.
  ///
  fn read_p10_file<P: AsRef<Path>>(filename: P) -> Result<Self, P10Error>;

  /// Reads DICOM P10 data from a read stream into an in-memory data set,
  /// consuming all data available in the stream.
  ///
  fn read_p10_stream(stream: &mut dyn Read) -> Result<Self, P10Error>;

  /// Reads DICOM P10 data from a vector of bytes into a data set.
  ///
  fn read_p10_bytes(bytes: SharedBytes) -> Result<Self, P10Error>;

  /// Writes a data set to a DICOM P10 file, overwriting any existing file
  /// with the given name.
  ///
  fn write_p10_file<P: AsRef<Path>>(
    &self,
    filename: P,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error>;

  /// Writes a data set as DICOM P10 bytes to a write stream.
  ///
  fn write_p10_stream(
    &self,
    stream: &mut dyn std::io::Write,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error>;

  /// Converts a data set to a stream of DICOM P10 parts returned through a
  /// callback.
  ///
  fn to_p10_parts<E>(
    &self,
    part_callback: &mut impl FnMut(&P10Part) -> Result<(), E>,
  ) -> Result<(), E>;

  /// Converts a data set to DICOM P10 bytes returned through a callback.
  ///
  fn to_p10_bytes(
    &self,
    bytes_callback: &mut impl FnMut(SharedBytes) -> Result<(), P10Error>,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error>;
}

impl DataSetP10Extensions for DataSet {
  fn read_p10_file<P: AsRef<Path>>(filename: P) -> Result<Self, P10Error> {
    read_file(filename)
  }

  fn read_p10_stream(stream: &mut dyn Read) -> Result<DataSet, P10Error> {
    read_stream(stream).map_err(|e| e.0)
  }

  fn read_p10_bytes(bytes: SharedBytes) -> Result<Self, P10Error> {
    read_bytes(bytes).map_err(|e| e.0)
  }

  fn write_p10_file<P: AsRef<Path>>(
    &self,
    filename: P,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error> {
    write_file(filename, self, config)
  }

  fn write_p10_stream(
    &self,
    stream: &mut dyn std::io::Write,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error> {
    write_stream(stream, self, config)
  }

  fn to_p10_parts<E>(
    &self,
    part_callback: &mut impl FnMut(&P10Part) -> Result<(), E>,
  ) -> Result<(), E> {
    p10_write::data_set_to_parts(self, part_callback)
  }

  fn to_p10_bytes(
    &self,
    bytes_callback: &mut impl FnMut(SharedBytes) -> Result<(), P10Error>,
    config: Option<P10WriteConfig>,
  ) -> Result<(), P10Error> {
    p10_write::data_set_to_bytes(self, bytes_callback, config)
  }
}
