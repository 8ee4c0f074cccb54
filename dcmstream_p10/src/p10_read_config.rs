/// Configuration used when reading DICOM P10 data.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct P10ReadConfig {
  pub(crate) max_part_size: u32,
  pub(crate) max_string_size: u32,
  pub(crate) max_sequence_depth: usize,
  pub(crate) require_dicm_prefix: bool,
  pub(crate) require_ordered_data_elements: bool,
}

impl Default for P10ReadConfig {
  fn default() -> Self {
    Self {
      max_part_size: 0xFFFFFFFE,
      max_string_size: 0xFFFFFFFE,
      max_sequence_depth: 10_000,
      require_dicm_prefix: false,
      require_ordered_data_elements: true,
    }
  }
}

impl P10ReadConfig {
  /// The maximum size in bytes of a DICOM P10 part emitted by a read context.
  /// Used to bound memory usage during a streaming read. Must be a multiple
  /// of 8.
  ///
  /// Two parts are affected:
  ///
  /// 1. [`P10Part::FileMetaInformation`](crate::P10Part), where it caps the
  ///    size of the File Meta Information. Exceeding it is a read error.
  ///
  /// 2. [`P10Part::DataElementValueBytes`](crate::P10Part), where it caps the
  ///    size of each part's `data`. Larger data element values are split
  ///    across multiple parts. Non-UTF-8 string data is instead capped by
  ///    [`P10ReadConfig::max_string_size()`].
  ///
  /// By default there is no limit, so each data element's value arrives in a
  /// single part.
  ///
  pub fn max_part_size(mut self, value: u32) -> Self {
    self.max_part_size = (value / 8) * 8;
    self
  }

  /// The maximum size in bytes of non-UTF-8 string values. Such values are
  /// converted to UTF-8 by the read context, which requires materializing the
  /// whole value in memory, so this caps that materialization.
  ///
  /// A value exceeding this size is a read error, so the maximum should not
  /// be set too low. It can usefully be set larger than the maximum part size
  /// to allow large string values while keeping parts small for bulk data.
  ///
  /// By default there is no limit.
  ///
  pub fn max_string_size(mut self, value: u32) -> Self {
    self.max_string_size = core::cmp::max(value, self.max_part_size);
    self
  }

  /// The maximum sequence nesting depth. Bounds memory usage and rejects
  /// malformed or malicious data.
  ///
  /// The default of ten thousand doesn't meaningfully constrain real data.
  ///
  pub fn max_sequence_depth(mut self, value: usize) -> Self {
    self.max_sequence_depth = value;
    self
  }

  /// Whether the 'DICM' prefix is required at bytes 128-132. Well-formed
  /// DICOM P10 data always has it, but raw data set fragments don't.
  ///
  /// Not required by default.
  ///
  pub fn require_dicm_prefix(mut self, value: bool) -> Self {
    self.require_dicm_prefix = value;
    self
  }

  /// Whether to error when data elements aren't in ascending tag order. Out
  /// of order data elements are malformed and can be misread, e.g. a
  /// *'(0008,0005) Specific Character Set'* appearing after string data
  /// elements means they were decoded with the wrong character set.
  ///
  /// Enforced by default.
  ///
  pub fn require_ordered_data_elements(mut self, value: bool) -> Self {
    self.require_ordered_data_elements = value;
    self
  }
}
