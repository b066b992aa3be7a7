use std::path::PathBuf;

use namestamp_core::error::StampError;
use namestamp_core::model::MappingStats;

use crate::output;

pub fn run(roster: PathBuf, output_format: &str, entries: bool) -> Result<(), StampError> {
    let bytes = std::fs::read(&roster)?;
    let (mapping, summary) = namestamp_core::load_mapping(&bytes)?;
    let stats = MappingStats::for_mapping(&mapping);

    match output_format {
        "json" => output::json::print_roster(&mapping, stats, summary)?,
        _ => output::table::print_roster(&mapping, stats, summary, entries),
    }

    Ok(())
}
