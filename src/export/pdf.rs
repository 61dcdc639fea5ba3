//! Single page PDF receipt.
//!
//! Positions are given in millimeters from the top-left corner of an A4 page and converted to
//! PDF user space (points, origin at the bottom-left). The output contains no timestamps or
//! document IDs, so rendering the same receipt always produces the same bytes.

use crate::receipt::TransactionReceiptView;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

pub const TITLE: &str = "Transaction Receipt";

const PAGE_WIDTH_PT: i64 = 595; // A4
const PAGE_HEIGHT_PT: i64 = 842;
const PT_PER_MM: f64 = 72.0 / 25.4;

const LEFT_MM: f64 = 10.0;
const TITLE_TOP_MM: f64 = 10.0;
const BODY_TOP_MM: f64 = 20.0;
const LINE_SPACING_MM: f64 = 10.0;

const TITLE_FONT_SIZE: i64 = 16;
const BODY_FONT_SIZE: i64 = 12;
const FONT: &str = "F1";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Unable to encode page content")]
    Encode(#[from] lopdf::Error),

    #[error("Unable to serialize PDF document")]
    Write(#[from] std::io::Error),
}

/// Render the receipt as PDF bytes.
///
/// The body is the export payload, one line per field, each on its own baseline.
pub fn render(receipt: &TransactionReceiptView) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT => font_id,
        },
    });

    let mut operations = Vec::new();
    text_line(&mut operations, TITLE_FONT_SIZE, TITLE_TOP_MM, TITLE);

    let payload = receipt.to_export_payload();
    for (i, line) in payload.lines().enumerate() {
        let top = BODY_TOP_MM + LINE_SPACING_MM * i as f64;
        text_line(&mut operations, BODY_FONT_SIZE, top, line);
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH_PT.into(), PAGE_HEIGHT_PT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    Ok(bytes)
}

fn text_line(operations: &mut Vec<Operation>, font_size: i64, top_mm: f64, text: &str) {
    let x = (LEFT_MM * PT_PER_MM).round() as i64;
    let y = PAGE_HEIGHT_PT - (top_mm * PT_PER_MM).round() as i64;

    operations.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT.into(), font_size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]);
}
