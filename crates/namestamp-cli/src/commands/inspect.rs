use std::path::PathBuf;

use namestamp_core::error::StampError;
use namestamp_core::roster::parse_identifier;

use crate::output;

pub fn run(pdf: PathBuf, output_format: &str, ids_only: bool) -> Result<(), StampError> {
    let bytes = std::fs::read(&pdf)?;
    let mut pages = namestamp_core::scan_document(&bytes)?;

    if ids_only {
        for (_, spans) in pages.iter_mut() {
            spans.retain(|span| parse_identifier(&span.text).is_some());
        }
    }

    match output_format {
        "json" => output::json::print_spans(&pages)?,
        _ => output::table::print_spans(&pages),
    }

    Ok(())
}
