//! Overlay writing: the visible name stamp and the invisible
//! searchable run.
//!
//! PDF content streams use a bottom-left origin with y increasing
//! upward; all geometry here is expressed in that space. Overlays are
//! additive only: the page's original content streams are never
//! modified, the overlay stream is appended after them.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::StampError;
use crate::model::{OverlayStyle, Rgb};
use crate::scan::TextSpan;

/// Resource names registered on stamped pages.
const FONT_RESOURCE: &str = "NsOv";
const GSTATE_RESOURCE: &str = "NsGs";

/// Line height as a multiple of font size.
const LINE_FACTOR: f32 = 1.2;

/// Rectangle width per character, as a multiple of font size. A
/// monospace-style approximation, not a font metric; Helvetica averages
/// close enough for a stamp background.
const CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Font size of the invisible searchable run.
const SEARCH_FONT_SIZE: f32 = 0.1;

/// One matched span on a page, ready to stamp.
#[derive(Debug)]
pub struct PageHit<'a> {
    pub span: TextSpan,
    pub identifier: i64,
    pub names: &'a [String],
}

/// Writes overlays into a document, one appended content stream per
/// stamped page. Font and graphics-state objects are created lazily
/// and shared by every page of the run.
pub struct OverlayWriter {
    style: OverlayStyle,
    font_id: Option<ObjectId>,
    gstate_id: Option<ObjectId>,
}

impl OverlayWriter {
    pub fn new(style: OverlayStyle) -> Self {
        OverlayWriter {
            style,
            font_id: None,
            gstate_id: None,
        }
    }

    /// Stamp every hit on one page. Pages without hits are left
    /// completely untouched (no resources registered, no content
    /// appended). Returns the number of overlays written.
    pub fn apply_page(
        &mut self,
        doc: &mut Document,
        page_id: ObjectId,
        hits: &[PageHit<'_>],
    ) -> Result<usize, StampError> {
        if hits.is_empty() {
            return Ok(0);
        }

        let font_id = *self.font_id.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            })
        });
        let opacity = self.style.bg_opacity;
        let gstate_id = *self.gstate_id.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(opacity),
                "CA" => Object::Real(opacity),
            })
        });

        ensure_page_resources(doc, page_id, font_id, gstate_id)?;

        let content = self.page_content(hits);
        let encoded = content
            .encode()
            .map_err(|e| StampError::PdfSave(format!("failed to encode overlay content: {e}")))?;
        append_content_to_page(doc, page_id, encoded)?;

        Ok(hits.len())
    }

    /// Build the overlay content stream for one page: first all
    /// background rectangles under the alpha graphics state, then all
    /// opaque text, then the invisible searchable runs.
    fn page_content(&self, hits: &[PageHit<'_>]) -> Content {
        let style = &self.style;
        let mut ops = Vec::new();

        // Background rectangles, alpha applies only inside this q/Q.
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "gs",
            vec![Object::Name(GSTATE_RESOURCE.into())],
        ));
        push_fill_color(&mut ops, style.bg_color);
        for hit in hits {
            let geo = Geometry::for_hit(hit, style);
            ops.push(Operation::new(
                "re",
                vec![
                    geo.rect_x.into(),
                    geo.rect_y.into(),
                    geo.rect_w.into(),
                    geo.rect_h.into(),
                ],
            ));
            ops.push(Operation::new("f", vec![]));
        }
        ops.push(Operation::new("Q", vec![]));

        ops.push(Operation::new("q", vec![]));

        // Visible names, one text object per hit, leading 1.2 x size so
        // the text block bottom lands on the rectangle's bottom edge.
        push_fill_color(&mut ops, style.text_color);
        for hit in hits {
            let geo = Geometry::for_hit(hit, style);
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(FONT_RESOURCE.into()),
                    style.font_size.into(),
                ],
            ));
            ops.push(Operation::new(
                "TL",
                vec![(style.font_size * LINE_FACTOR).into()],
            ));
            ops.push(Operation::new(
                "Td",
                vec![geo.text_x.into(), geo.first_baseline_y.into()],
            ));
            for (i, name) in hit.names.iter().enumerate() {
                if i > 0 {
                    ops.push(Operation::new("T*", vec![]));
                }
                ops.push(Operation::new("Tj", vec![text_string(name)]));
            }
            ops.push(Operation::new("ET", vec![]));
        }

        // Invisible searchable runs at the original span origins: all
        // names plus the identifier, near-white and far below legible
        // size, indexed by text search but not visible on the page.
        push_fill_color(&mut ops, Rgb::WHITE);
        for hit in hits {
            let search_text = format!("{} {}", hit.names.join(" "), hit.identifier);
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.into()), SEARCH_FONT_SIZE.into()],
            ));
            ops.push(Operation::new(
                "Td",
                vec![hit.span.x.into(), hit.span.y.into()],
            ));
            ops.push(Operation::new("Tj", vec![text_string(&search_text)]));
            ops.push(Operation::new("ET", vec![]));
        }

        ops.push(Operation::new("Q", vec![]));

        Content { operations: ops }
    }
}

/// Stamp geometry for one hit, in page space.
struct Geometry {
    rect_x: f32,
    rect_y: f32,
    rect_w: f32,
    rect_h: f32,
    text_x: f32,
    first_baseline_y: f32,
}

impl Geometry {
    fn for_hit(hit: &PageHit<'_>, style: &OverlayStyle) -> Geometry {
        let line_count = hit.names.len() as f32;
        let max_chars = hit
            .names
            .iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0) as f32;

        let rect_h = line_count * style.font_size * LINE_FACTOR;
        let rect_w = max_chars * style.font_size * CHAR_WIDTH_FACTOR;
        let rect_x = hit.span.x + style.x_offset;
        let rect_y = hit.span.y + style.y_offset;

        Geometry {
            rect_x,
            rect_y,
            rect_w,
            rect_h,
            text_x: rect_x,
            first_baseline_y: rect_y + rect_h - style.font_size,
        }
    }
}

fn push_fill_color(ops: &mut Vec<Operation>, color: Rgb) {
    ops.push(Operation::new(
        "rg",
        vec![color.r.into(), color.g.into(), color.b.into()],
    ));
}

/// Encode text for the WinAnsi-encoded overlay font. Characters above
/// U+00FF have no slot there and become '?'.
fn text_string(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// Make the overlay font and graphics state reachable from the page.
///
/// The page's effective Resources dictionary (inline, referenced, or
/// inherited through the page tree) is cloned, extended with the two
/// overlay entries, and written inline on the page, so sibling pages
/// sharing the original dictionary are unaffected and the page's own
/// fonts keep resolving.
fn ensure_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gstate_id: ObjectId,
) -> Result<(), StampError> {
    let mut resources = resolve_resources(doc, page_id)?;

    set_subdict_entry(doc, &mut resources, b"Font", FONT_RESOURCE, font_id);
    set_subdict_entry(doc, &mut resources, b"ExtGState", GSTATE_RESOURCE, gstate_id);

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| StampError::PdfLoad(format!("failed to get page object: {e}")))?;
    match page {
        Object::Dictionary(dict) => {
            dict.set("Resources", Object::Dictionary(resources));
            Ok(())
        }
        _ => Err(StampError::PdfLoad(
            "page object is not a dictionary".into(),
        )),
    }
}

/// The page's effective Resources as an owned dictionary, walking up
/// the page tree for inherited resources when the page has none.
fn resolve_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, StampError> {
    let mut current_id = page_id;
    for _ in 0..16 {
        let dict = doc
            .get_object(current_id)
            .and_then(Object::as_dict)
            .map_err(|e| StampError::PdfLoad(format!("failed to get page dictionary: {e}")))?;

        if let Ok(resources) = dict.get(b"Resources") {
            let resolved = match resources {
                Object::Reference(id) => doc.get_object(*id).and_then(Object::as_dict).ok(),
                Object::Dictionary(d) => Some(d),
                _ => None,
            };
            if let Some(d) = resolved {
                return Ok(d.clone());
            }
        }

        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent_id) => current_id = parent_id,
            Err(_) => break,
        }
    }

    Ok(Dictionary::new())
}

/// Set `resources[kind][name] = ref` on the owned resources copy,
/// expanding a referenced sub-dictionary inline if needed.
fn set_subdict_entry(
    doc: &Document,
    resources: &mut Dictionary,
    kind: &[u8],
    name: &str,
    target: ObjectId,
) {
    let mut subdict = match resources.get(kind) {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .map(Dictionary::clone)
            .unwrap_or_default(),
        _ => Dictionary::new(),
    };
    subdict.set(name, Object::Reference(target));
    resources.set(kind, Object::Dictionary(subdict));
}

/// Append an overlay stream to the page's Contents, preserving the
/// original stream(s).
fn append_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), StampError> {
    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content)));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| StampError::PdfLoad(format!("failed to get page object: {e}")))?;

    if let Object::Dictionary(dict) = page {
        let existing = dict.get(b"Contents").ok().cloned();
        match existing {
            Some(Object::Reference(existing_id)) => {
                dict.set(
                    "Contents",
                    Object::Array(vec![
                        Object::Reference(existing_id),
                        Object::Reference(content_id),
                    ]),
                );
            }
            Some(Object::Array(mut arr)) => {
                arr.push(Object::Reference(content_id));
                dict.set("Contents", Object::Array(arr));
            }
            _ => {
                dict.set("Contents", Object::Reference(content_id));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::doc_with_text_runs;

    fn hit<'a>(x: f32, y: f32, identifier: i64, names: &'a [String]) -> PageHit<'a> {
        PageHit {
            span: TextSpan {
                text: identifier.to_string(),
                x,
                y,
            },
            identifier,
            names,
        }
    }

    #[test]
    fn stamped_page_gains_searchable_names() {
        let (mut doc, page_id) = doc_with_text_runs(&[(100.0, 700.0, "42")]);
        assert!(!doc.extract_text(&[1]).unwrap().contains("Jane Doe"));

        let names = vec!["Jane Doe".to_string()];
        let mut writer = OverlayWriter::new(OverlayStyle::default());
        let stamped = writer
            .apply_page(&mut doc, page_id, &[hit(100.0, 700.0, 42, &names)])
            .unwrap();

        assert_eq!(stamped, 1);
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Jane Doe"), "stamped name not searchable: {text:?}");
        assert!(text.contains("42"), "identifier not searchable: {text:?}");
    }

    #[test]
    fn original_content_is_preserved() {
        let (mut doc, page_id) = doc_with_text_runs(&[(100.0, 700.0, "42")]);
        let original = doc.get_page_content(page_id).unwrap();

        let names = vec!["Jane Doe".to_string()];
        let mut writer = OverlayWriter::new(OverlayStyle::default());
        writer
            .apply_page(&mut doc, page_id, &[hit(100.0, 700.0, 42, &names)])
            .unwrap();

        // Contents becomes [original, overlay]; the original stream is
        // byte-identical.
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 2);
        let first_id = contents[0].as_reference().unwrap();
        let stream = doc.get_object(first_id).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, original);
    }

    #[test]
    fn no_hits_leaves_page_untouched() {
        let (mut doc, page_id) = doc_with_text_runs(&[(100.0, 700.0, "not a number")]);
        let mut writer = OverlayWriter::new(OverlayStyle::default());
        let stamped = writer.apply_page(&mut doc, page_id, &[]).unwrap();
        assert_eq!(stamped, 0);

        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(matches!(
            page.get(b"Contents").unwrap(),
            Object::Reference(_)
        ));
        let resources = page.get(b"Resources").unwrap();
        let resources = match resources {
            Object::Reference(id) => doc.get_object(*id).unwrap().as_dict().unwrap(),
            Object::Dictionary(d) => d,
            _ => panic!("unexpected resources object"),
        };
        assert!(resources.get(b"ExtGState").is_err());
    }

    #[test]
    fn overlay_stream_draws_rect_and_gstate() {
        let (mut doc, page_id) = doc_with_text_runs(&[(100.0, 700.0, "42")]);
        let names = vec!["Ann".to_string(), "Ben".to_string()];
        let style = OverlayStyle::default();
        let mut writer = OverlayWriter::new(style.clone());
        writer
            .apply_page(&mut doc, page_id, &[hit(100.0, 700.0, 42, &names)])
            .unwrap();

        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        let overlay_id = contents[1].as_reference().unwrap();
        let stream = doc.get_object(overlay_id).unwrap().as_stream().unwrap();
        let ops = Content::decode(&stream.content).unwrap().operations;

        let re = ops
            .iter()
            .find(|op| op.operator == "re")
            .expect("no rectangle in overlay stream");
        let values: Vec<f32> = re
            .operands
            .iter()
            .map(|o| match o {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r,
                _ => panic!("non-numeric re operand"),
            })
            .collect();
        // Two names: height is 2 lines, width follows the longer name.
        let expected = [
            100.0 + style.x_offset,
            700.0 + style.y_offset,
            3.0 * style.font_size * 0.6,
            2.0 * style.font_size * 1.2,
        ];
        for (value, want) in values.iter().zip(expected) {
            assert!((value - want).abs() < 0.01, "got {values:?}");
        }

        assert!(ops.iter().any(|op| op.operator == "gs"));
        assert!(ops.iter().any(|op| op.operator == "f"));
    }

    #[test]
    fn page_resources_gain_overlay_entries() {
        let (mut doc, page_id) = doc_with_text_runs(&[(100.0, 700.0, "42")]);
        let names = vec!["Jane".to_string()];
        let mut writer = OverlayWriter::new(OverlayStyle::default());
        writer
            .apply_page(&mut doc, page_id, &[hit(100.0, 700.0, 42, &names)])
            .unwrap();

        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        // The page's own font survives alongside the overlay font.
        assert!(fonts.get(b"F1").is_ok());
        assert!(fonts.get(FONT_RESOURCE.as_bytes()).is_ok());
        let gstates = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        assert!(gstates.get(GSTATE_RESOURCE.as_bytes()).is_ok());
    }

    #[test]
    fn non_latin_chars_degrade_to_question_mark() {
        match text_string("Søren 北") {
            Object::String(bytes, _) => {
                assert_eq!(bytes, b"S\xF8ren ?".to_vec());
            }
            _ => panic!("expected string object"),
        }
    }
}
