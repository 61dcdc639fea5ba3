//! File exports for a held receipt.

use crate::receipt::TransactionReceiptView;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;
use tracing::info;

pub use self::pdf::PdfError;
pub use self::qr::QrError;

pub mod pdf;
pub mod qr;

/// The PDF receipt always gets this name.
pub const PDF_FILE_NAME: &str = "Transaction_Receipt.pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF rendering error")]
    Pdf(#[from] PdfError),

    #[error("QR code rendering error")]
    Qr(#[from] QrError),

    #[error("Unable to write {0:?}")]
    Io(PathBuf, #[source] io::Error),
}

/// Write the PDF receipt into `dir` and return its path. An existing file is replaced.
pub fn write_pdf(receipt: &TransactionReceiptView, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(PDF_FILE_NAME);
    let bytes = pdf::render(receipt)?;

    fs::write(&path, &bytes).map_err(|err| ExportError::Io(path.clone(), err))?;
    info!("Wrote {} bytes to {path:?}", bytes.len());

    Ok(path)
}

/// Write the receipt QR code as an SVG image.
pub fn write_qr_svg(receipt: &TransactionReceiptView, path: &Path) -> Result<(), ExportError> {
    let svg = qr::to_svg(&qr::encode(receipt)?);

    fs::write(path, svg).map_err(|err| ExportError::Io(path.to_path_buf(), err))?;
    info!("Wrote QR code to {path:?}");

    Ok(())
}
