use std::path::Path;

use namestamp_core::model::{IdentifierMapping, MappingStats, RosterSummary, RunSummary};
use namestamp_core::roster::parse_identifier;
use namestamp_core::scan::TextSpan;

pub fn print_run_summary(summary: &RunSummary, out: &Path) {
    println!(
        "Stamped {} span(s) across {} page(s)",
        summary.spans_stamped, summary.pages
    );
    println!("  identifiers loaded:      {}", summary.mapping.identifiers);
    println!("  names loaded:            {}", summary.mapping.names);
    println!(
        "  multi-name identifiers:  {}",
        summary.mapping.multi_name_identifiers
    );
    println!("  output: {}", out.display());
}

pub fn print_roster(
    mapping: &IdentifierMapping,
    stats: MappingStats,
    summary: RosterSummary,
    entries: bool,
) {
    println!(
        "{} identifier(s), {} name(s), {} with multiple names",
        stats.identifiers, stats.names, stats.multi_name_identifiers
    );
    if summary.rows_skipped > 0 {
        println!(
            "  {} of {} row(s) skipped",
            summary.rows_skipped, summary.rows_read
        );
    }

    if entries {
        let max_width = mapping
            .iter()
            .map(|(id, _)| id.to_string().len())
            .max()
            .unwrap_or(1);
        println!();
        for (id, names) in mapping.iter() {
            println!("  {:>width$}  {}", id, names.join("; "), width = max_width);
        }
    }
}

pub fn print_spans(pages: &[(u32, Vec<TextSpan>)]) {
    for (page_num, spans) in pages {
        println!("--- Page {} ({} span(s)) ---", page_num, spans.len());
        for span in spans {
            let marker = match parse_identifier(&span.text) {
                Some(id) => format!("  [id {id}]"),
                None => String::new(),
            };
            println!(
                "  ({:8.2}, {:8.2})  {:?}{}",
                span.x, span.y, span.text, marker
            );
        }
        println!();
    }
}
