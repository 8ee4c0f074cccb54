//! The DICOM transfer syntaxes supported by this library.

/// Whether a transfer syntax stores the VR of each data element explicitly or
/// leaves it implicit.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VrSerialization {
  VrImplicit,
  VrExplicit,
}

/// The byte order of a transfer syntax.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endianness {
  LittleEndian,
  BigEndian,
}

impl Endianness {
  /// Returns whether this is big endian byte order.
  ///
  pub fn is_big(&self) -> bool {
    *self == Endianness::BigEndian
  }
}

/// A single DICOM transfer syntax: its name and UID, how VRs are serialized,
/// its endianness, whether the data set is zlib deflated, and whether its
/// pixel data is stored encapsulated.
///
#[derive(Debug, PartialEq)]
pub struct TransferSyntax {
  pub name: &'static str,
  pub uid: &'static str,
  pub vr_serialization: VrSerialization,
  pub endianness: Endianness,
  pub is_deflated: bool,
  pub is_encapsulated: bool,
}

/// The 'Implicit VR Little Endian' transfer syntax.
///
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Implicit VR Little Endian",
  uid: "1.2.840.10008.1.2",
  vr_serialization: VrSerialization::VrImplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: false,
};

/// The 'Explicit VR Little Endian' transfer syntax.
///
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Explicit VR Little Endian",
  uid: "1.2.840.10008.1.2.1",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: false,
};

/// The 'Encapsulated Uncompressed Explicit VR Little Endian' transfer syntax.
///
pub const ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax =
  TransferSyntax {
    name: "Encapsulated Uncompressed Explicit VR Little Endian",
    uid: "1.2.840.10008.1.2.1.98",
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_deflated: false,
    is_encapsulated: true,
  };

/// The 'Deflated Explicit VR Little Endian' transfer syntax.
///
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Deflated Explicit VR Little Endian",
  uid: "1.2.840.10008.1.2.1.99",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: true,
  is_encapsulated: false,
};

/// The 'Explicit VR Big Endian' transfer syntax. Retired, but still found in
/// the wild.
///
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Explicit VR Big Endian",
  uid: "1.2.840.10008.1.2.2",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::BigEndian,
  is_deflated: false,
  is_encapsulated: false,
};

/// The 'JPEG Baseline (Process 1)' transfer syntax.
///
pub const JPEG_BASELINE_8BIT: TransferSyntax = TransferSyntax {
  name: "JPEG Baseline (Process 1)",
  uid: "1.2.840.10008.1.2.4.50",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG Extended (Process 2 & 4)' transfer syntax.
///
pub const JPEG_EXTENDED_12BIT: TransferSyntax = TransferSyntax {
  name: "JPEG Extended (Process 2 & 4)",
  uid: "1.2.840.10008.1.2.4.51",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG Lossless, Non-Hierarchical (Process 14)' transfer syntax.
///
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: TransferSyntax = TransferSyntax {
  name: "JPEG Lossless, Non-Hierarchical (Process 14)",
  uid: "1.2.840.10008.1.2.4.57",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG Lossless, Non-Hierarchical, First-Order Prediction (Process 14
/// [Selection Value 1])' transfer syntax.
///
pub const JPEG_LOSSLESS_NON_HIERARCHICAL_SV1: TransferSyntax = TransferSyntax {
  name: "JPEG Lossless, Non-Hierarchical, First-Order Prediction (Process 14 \
    [Selection Value 1])",
  uid: "1.2.840.10008.1.2.4.70",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG-LS Lossless Image Compression' transfer syntax.
///
pub const JPEG_LS_LOSSLESS: TransferSyntax = TransferSyntax {
  name: "JPEG-LS Lossless Image Compression",
  uid: "1.2.840.10008.1.2.4.80",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG-LS Lossy (Near-Lossless) Image Compression' transfer syntax.
///
pub const JPEG_LS_LOSSY_NEAR_LOSSLESS: TransferSyntax = TransferSyntax {
  name: "JPEG-LS Lossy (Near-Lossless) Image Compression",
  uid: "1.2.840.10008.1.2.4.81",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG 2000 Image Compression (Lossless Only)' transfer syntax.
///
pub const JPEG_2K_LOSSLESS_ONLY: TransferSyntax = TransferSyntax {
  name: "JPEG 2000 Image Compression (Lossless Only)",
  uid: "1.2.840.10008.1.2.4.90",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG 2000 Image Compression' transfer syntax.
///
pub const JPEG_2K: TransferSyntax = TransferSyntax {
  name: "JPEG 2000 Image Compression",
  uid: "1.2.840.10008.1.2.4.91",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'JPEG 2000 Part 2 Multi-component Image Compression (Lossless Only)'
/// transfer syntax.
///
pub const JPEG_2K_MULTI_COMPONENT_LOSSLESS_ONLY: TransferSyntax =
  TransferSyntax {
    name: "JPEG 2000 Part 2 Multi-component Image Compression (Lossless Only)",
    uid: "1.2.840.10008.1.2.4.92",
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_deflated: false,
    is_encapsulated: true,
  };

/// The 'JPEG 2000 Part 2 Multi-component Image Compression' transfer syntax.
///
pub const JPEG_2K_MULTI_COMPONENT: TransferSyntax = TransferSyntax {
  name: "JPEG 2000 Part 2 Multi-component Image Compression",
  uid: "1.2.840.10008.1.2.4.93",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'High-Throughput JPEG 2000 (Lossless Only)' transfer syntax.
///
pub const HIGH_THROUGHPUT_JPEG_2K_LOSSLESS_ONLY: TransferSyntax =
  TransferSyntax {
    name: "High-Throughput JPEG 2000 (Lossless Only)",
    uid: "1.2.840.10008.1.2.4.201",
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_deflated: false,
    is_encapsulated: true,
  };

/// The 'High-Throughput JPEG 2000 with RPCL Options (Lossless Only)' transfer
/// syntax.
///
pub const HIGH_THROUGHPUT_JPEG_2K_WITH_RPCL_OPTIONS_LOSSLESS_ONLY:
  TransferSyntax = TransferSyntax {
  name: "High-Throughput JPEG 2000 with RPCL Options (Lossless Only)",
  uid: "1.2.840.10008.1.2.4.202",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'High-Throughput JPEG 2000' transfer syntax.
///
pub const HIGH_THROUGHPUT_JPEG_2K: TransferSyntax = TransferSyntax {
  name: "High-Throughput JPEG 2000",
  uid: "1.2.840.10008.1.2.4.203",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// The 'RLE Lossless' transfer syntax.
///
pub const RLE_LOSSLESS: TransferSyntax = TransferSyntax {
  name: "RLE Lossless",
  uid: "1.2.840.10008.1.2.5",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
  is_encapsulated: true,
};

/// All transfer syntaxes supported by this library.
///
pub const ALL: [&TransferSyntax; 19] = [
  &IMPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_LITTLE_ENDIAN,
  &ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN,
  &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_BIG_ENDIAN,
  &JPEG_BASELINE_8BIT,
  &JPEG_EXTENDED_12BIT,
  &JPEG_LOSSLESS_NON_HIERARCHICAL,
  &JPEG_LOSSLESS_NON_HIERARCHICAL_SV1,
  &JPEG_LS_LOSSLESS,
  &JPEG_LS_LOSSY_NEAR_LOSSLESS,
  &JPEG_2K_LOSSLESS_ONLY,
  &JPEG_2K,
  &JPEG_2K_MULTI_COMPONENT_LOSSLESS_ONLY,
  &JPEG_2K_MULTI_COMPONENT,
  &HIGH_THROUGHPUT_JPEG_2K_LOSSLESS_ONLY,
  &HIGH_THROUGHPUT_JPEG_2K_WITH_RPCL_OPTIONS_LOSSLESS_ONLY,
  &HIGH_THROUGHPUT_JPEG_2K,
  &RLE_LOSSLESS,
];

impl TransferSyntax {
  /// Returns the transfer syntax with the given UID, or an error if the UID
  /// isn't recognized.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_uid(uid: &str) -> Result<&'static Self, ()> {
    ALL
      .iter()
      .find(|transfer_syntax| transfer_syntax.uid == uid)
      .copied()
      .ok_or(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_uid_test() {
    for transfer_syntax in ALL {
      assert_eq!(
        TransferSyntax::from_uid(transfer_syntax.uid),
        Ok(transfer_syntax)
      );
    }

    assert!(TransferSyntax::from_uid("1.2.3.4").is_err());
  }

  #[test]
  fn uids_are_unique_test() {
    for (i, a) in ALL.iter().enumerate() {
      for b in ALL.iter().skip(i + 1) {
        assert_ne!(a.uid, b.uid);
      }
    }
  }
}
