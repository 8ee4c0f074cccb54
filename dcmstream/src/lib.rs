//! Streaming DICOM P10 reading, writing, and pixel data extraction.
//!
//! This crate re-exports the three libraries that make up dcmstream:
//!
//! - `dcmstream_core`: the DICOM data model. Data sets, data elements, data
//!   element values, value representations, transfer syntaxes, and character
//!   sets.
//!
//! - `dcmstream_p10`: a streaming reader and writer for the DICOM Part 10
//!   binary format.
//!
//! - `dcmstream_pixel_data`: extraction of individual frames of image data
//!   from native and encapsulated pixel data.

pub use dcmstream_core::*;

pub use dcmstream_p10::{
  DataSetBuilder, DataSetP10Extensions, P10Error, P10FilterTransform,
  P10InsertTransform, P10Part, P10ReadConfig, P10ReadContext, P10WriteConfig,
  P10WriteContext,
};

pub use dcmstream_pixel_data::{
  DataSetPixelDataExtensions, P10PixelDataFrameTransform,
  P10PixelDataFrameTransformError, PixelDataFrame,
};

#[cfg(test)]
mod integration_tests;
