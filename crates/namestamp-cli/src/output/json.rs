use namestamp_core::error::StampError;
use namestamp_core::model::{IdentifierMapping, MappingStats, RosterSummary, RunSummary};
use namestamp_core::roster::parse_identifier;
use namestamp_core::scan::TextSpan;

pub fn print_run_summary(summary: &RunSummary) -> Result<(), StampError> {
    let json = serde_json::to_string_pretty(summary)?;
    println!("{json}");
    Ok(())
}

pub fn print_roster(
    mapping: &IdentifierMapping,
    stats: MappingStats,
    summary: RosterSummary,
) -> Result<(), StampError> {
    let value = serde_json::json!({
        "stats": stats,
        "rows": summary,
        "mapping": mapping,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn print_spans(pages: &[(u32, Vec<TextSpan>)]) -> Result<(), StampError> {
    let value: Vec<_> = pages
        .iter()
        .map(|(page_num, spans)| {
            serde_json::json!({
                "page": page_num,
                "spans": spans
                    .iter()
                    .map(|span| {
                        serde_json::json!({
                            "text": span.text,
                            "x": span.x,
                            "y": span.y,
                            "identifier": parse_identifier(&span.text),
                        })
                    })
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
