//! Code kinds and their platform-native symbology identifiers.

use serde::{Deserialize, Serialize};

/// A family of machine-readable codes the host can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeKind {
    /// QR codes.
    Qr,
    /// One-dimensional barcodes.
    Barcode,
    /// PDF417 stacked barcodes.
    Pdf417,
}

impl CodeKind {
    /// Every supported kind, the default acceptance set.
    pub const ALL: [CodeKind; 3] = [CodeKind::Qr, CodeKind::Barcode, CodeKind::Pdf417];

    /// The platform-native symbology identifiers this kind covers.
    pub fn native_symbologies(self) -> &'static [NativeSymbology] {
        match self {
            CodeKind::Qr => &[NativeSymbology::Qr],
            CodeKind::Barcode => &[
                NativeSymbology::Code39,
                NativeSymbology::Code93,
                NativeSymbology::Code128,
                NativeSymbology::Itf14,
                NativeSymbology::Ean8,
                NativeSymbology::Ean13,
            ],
            CodeKind::Pdf417 => &[NativeSymbology::Pdf417],
        }
    }
}

/// A single platform-native symbology identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeSymbology {
    /// QR two-dimensional code.
    Qr,
    /// Code 39 linear barcode.
    Code39,
    /// Code 93 linear barcode.
    Code93,
    /// Code 128 linear barcode.
    Code128,
    /// ITF-14 linear barcode.
    Itf14,
    /// EAN-8 linear barcode.
    Ean8,
    /// EAN-13 linear barcode.
    Ean13,
    /// PDF417 stacked barcode.
    Pdf417,
}

/// Flattens a kind list into the symbologies handed to the metadata output.
pub fn native_symbologies_for(kinds: &[CodeKind]) -> Vec<NativeSymbology> {
    kinds
        .iter()
        .flat_map(|kind| kind.native_symbologies().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barcode_family_expands_to_six_symbologies() {
        assert_eq!(CodeKind::Barcode.native_symbologies().len(), 6);
    }

    #[test]
    fn test_all_kinds_flatten_without_overlap() {
        let symbologies = native_symbologies_for(&CodeKind::ALL);
        assert_eq!(symbologies.len(), 8);
        assert!(symbologies.contains(&NativeSymbology::Qr));
        assert!(symbologies.contains(&NativeSymbology::Pdf417));
    }

    #[test]
    fn test_kind_names_serialize_kebab_case() {
        assert_eq!(
            serde_json_like(&CodeKind::Pdf417),
            "pdf417"
        );
        assert_eq!(serde_json_like(&CodeKind::Qr), "qr");
    }

    fn serde_json_like(kind: &CodeKind) -> String {
        // TOML round-trip exercises the serde rename attribute.
        #[derive(Serialize)]
        struct Wrap<'a> {
            kind: &'a CodeKind,
        }
        let text = toml::to_string(&Wrap { kind }).unwrap();
        text.trim().trim_start_matches("kind = ").trim_matches('"').to_owned()
    }
}
