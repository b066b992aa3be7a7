//! Shared fixtures for unit tests: minimal single-page documents built
//! with lopdf, with a Helvetica resource so text decoding works.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub(crate) fn doc_with_ops(operations: Vec<Operation>) -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        lopdf::Dictionary::new(),
        content.encode().unwrap(),
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    (doc, page_id)
}

/// One `BT .. Tj .. ET` block per run, at the given origin.
pub(crate) fn text_run_ops(runs: &[(f32, f32, &str)]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for &(x, y, text) in runs {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

pub(crate) fn doc_with_text_runs(runs: &[(f32, f32, &str)]) -> (Document, ObjectId) {
    doc_with_ops(text_run_ops(runs))
}
