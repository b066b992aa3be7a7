//! Text span extraction from PDF pages.
//!
//! Walks the decoded content stream tracking the text and line
//! matrices, and emits one span per text-showing operator with the
//! operator's origin in PDF user space (bottom-left origin, y up).
//! The CTM is ignored and `T*`/`'` use a `1.2 x font size` leading
//! approximation; both are fine for the roster-style documents this
//! tool targets, where identifiers sit in plain unrotated text.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::StampError;

/// A run of text at a single origin, the atomic unit the stamper
/// inspects. Produced per page, never retained.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Extract the text spans of one page, in content-stream order.
///
/// Re-scanning the same unmutated page yields the same spans. Spans
/// whose text is blank are discarded.
pub fn scan_page(doc: &Document, page_id: ObjectId) -> Result<Vec<TextSpan>, StampError> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| StampError::PdfLoad(format!("failed to read page content: {e}")))?;
    let content = Content::decode(&content_data)
        .map_err(|e| StampError::PdfLoad(format!("failed to decode page content: {e}")))?;

    let mut spans = Vec::new();

    let mut current_font = String::new();
    let mut current_font_size: f32 = 12.0;
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    let mut emit = |text: Option<String>, matrix: &[f32; 6]| {
        if let Some(text) = text {
            if !text.trim().is_empty() {
                spans.push(TextSpan {
                    text,
                    x: matrix[4],
                    y: matrix[5],
                });
            }
        }
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        current_font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = as_number(&op.operands[1]) {
                        current_font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = as_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = as_number(&op.operands[1]).unwrap_or(0.0);
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] =
                            as_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
            }
            "Tj" => {
                if in_text_block {
                    if let Some(operand) = op.operands.first() {
                        emit(decode_operand(operand, doc, &fonts, &current_font), &text_matrix);
                    }
                }
            }
            "'" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
                if in_text_block {
                    if let Some(operand) = op.operands.first() {
                        emit(decode_operand(operand, doc, &fonts, &current_font), &text_matrix);
                    }
                }
            }
            "\"" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
                if in_text_block {
                    if let Some(operand) = op.operands.get(2) {
                        emit(decode_operand(operand, doc, &fonts, &current_font), &text_matrix);
                    }
                }
            }
            "TJ" => {
                if in_text_block {
                    if let Some(Ok(array)) = op.operands.first().map(Object::as_array) {
                        let mut combined = String::new();
                        for item in array {
                            if let Some(text) = decode_operand(item, doc, &fonts, &current_font) {
                                combined.push_str(&text);
                            }
                        }
                        emit(Some(combined), &text_matrix);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a string operand through the page font encoding, falling
/// back to UTF-16BE (BOM-prefixed) and then Latin-1.
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &std::collections::BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}
