pub mod error;
pub mod model;
pub mod overlay;
pub mod roster;
pub mod scan;

#[cfg(test)]
pub(crate) mod testutil;

use log::debug;
use lopdf::Document;

use error::StampError;
use model::{
    IdentifierMapping, MappingStats, OverlayStyle, ProcessingResult, RosterSummary, RunSummary,
};
use overlay::{OverlayWriter, PageHit};
use roster::parse_identifier;

/// Receives per-page progress while a run is in flight. Called after
/// each page completes, in document order.
pub trait ProgressSink {
    fn page_done(&mut self, completed: usize, total: usize);
}

/// Sink for non-interactive callers.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn page_done(&mut self, _completed: usize, _total: usize) {}
}

/// Load a roster spreadsheet into an identifier mapping.
pub fn load_mapping(
    roster_bytes: &[u8],
) -> Result<(IdentifierMapping, RosterSummary), StampError> {
    roster::load(roster_bytes)
}

/// Main API entry point: stamp a PDF with the names from a roster
/// spreadsheet.
///
/// Builds the mapping, scans every page's text spans for identifiers,
/// overlays each match, and serializes the modified document. The
/// caller's input buffers are never mutated; the returned bytes are the
/// sole artifact.
pub fn stamp_pdf(
    roster_bytes: &[u8],
    pdf_bytes: &[u8],
    style: &OverlayStyle,
    progress: &mut dyn ProgressSink,
) -> Result<ProcessingResult, StampError> {
    let (mapping, _) = roster::load(roster_bytes)?;
    stamp_with_mapping(&mapping, pdf_bytes, style, progress)
}

/// Scan every page of a PDF without modifying it, for diagnostics.
/// Returns `(page number, spans)` in document order.
pub fn scan_document(pdf_bytes: &[u8]) -> Result<Vec<(u32, Vec<scan::TextSpan>)>, StampError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| StampError::PdfLoad(format!("not a readable PDF: {e}")))?;

    doc.get_pages()
        .into_iter()
        .map(|(page_num, page_id)| Ok((page_num, scan::scan_page(&doc, page_id)?)))
        .collect()
}

/// Stamp a PDF against an already-built mapping.
pub fn stamp_with_mapping(
    mapping: &IdentifierMapping,
    pdf_bytes: &[u8],
    style: &OverlayStyle,
    progress: &mut dyn ProgressSink,
) -> Result<ProcessingResult, StampError> {
    style.validate()?;

    let mut doc = Document::load_mem(pdf_bytes)
        .map_err(|e| StampError::PdfLoad(format!("not a readable PDF: {e}")))?;

    let pages = doc.get_pages();
    let total = pages.len();
    let mut writer = OverlayWriter::new(style.clone());
    let mut spans_stamped = 0;

    for (done, (_page_num, page_id)) in pages.into_iter().enumerate() {
        let spans = scan::scan_page(&doc, page_id)?;

        // Most spans on a page are not bare identifiers; both parse
        // failure and a mapping miss just mean "leave the span alone".
        let hits: Vec<PageHit<'_>> = spans
            .into_iter()
            .filter_map(|span| {
                let identifier = parse_identifier(&span.text)?;
                let names = mapping.names(identifier)?;
                Some(PageHit {
                    span,
                    identifier,
                    names,
                })
            })
            .collect();

        spans_stamped += writer.apply_page(&mut doc, page_id, &hits)?;
        progress.page_done(done + 1, total);
    }

    debug!("stamped {spans_stamped} spans across {total} pages");

    let mut pdf = Vec::new();
    doc.save_to(&mut pdf)
        .map_err(|e| StampError::PdfSave(e.to_string()))?;

    Ok(ProcessingResult {
        pdf,
        summary: RunSummary {
            pages: total,
            spans_stamped,
            mapping: MappingStats::for_mapping(mapping),
        },
    })
}
