//! QR code for a receipt. The encoded payload is the receipt export text block.

use crate::receipt::TransactionReceiptView;
use qrcode::render::{svg, unicode};
use qrcode::QrCode;
use thiserror::Error;

/// Minimum SVG edge length in pixels.
pub const SVG_MIN_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("Unable to encode QR code: {0}")]
    Encode(qrcode::types::QrError),
}

pub fn encode(receipt: &TransactionReceiptView) -> Result<QrCode, QrError> {
    QrCode::new(receipt.to_export_payload()).map_err(QrError::Encode)
}

pub fn to_svg(code: &QrCode) -> String {
    code.render::<svg::Color<'_>>()
        .min_dimensions(SVG_MIN_SIZE, SVG_MIN_SIZE)
        .build()
}

/// Two modules per character cell using half blocks. Colors are inverted for dark terminals.
pub fn to_terminal(code: &QrCode) -> String {
    code.render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::tests::sample_receipt;

    #[test]
    fn test_encode_is_deterministic() {
        let first = encode(&sample_receipt()).unwrap();
        let second = encode(&sample_receipt()).unwrap();

        assert_eq!(first.version(), second.version());
        assert_eq!(first.to_colors(), second.to_colors());
    }

    #[test]
    fn test_payload_changes_code() {
        let receipt = sample_receipt();
        let other = TransactionReceiptView {
            block_number: 501,
            ..sample_receipt()
        };

        assert_ne!(
            encode(&receipt).unwrap().to_colors(),
            encode(&other).unwrap().to_colors(),
        );
    }

    #[test]
    fn test_svg() {
        let svg = to_svg(&encode(&sample_receipt()).unwrap());

        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_terminal_rendering() {
        let code = encode(&sample_receipt()).unwrap();
        let text = to_terminal(&code);

        // Dense1x2 packs two module rows into each text row.
        let rows = text.lines().count();
        assert!(rows >= code.width() / 2);
        assert!(rows < code.width() + 8);
        assert!(text.contains('█') || text.contains('▀') || text.contains('▄'));
    }
}
