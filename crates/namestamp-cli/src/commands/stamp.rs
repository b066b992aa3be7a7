use std::io::Write;
use std::path::{Path, PathBuf};

use namestamp_core::error::StampError;
use namestamp_core::model::{OverlayStyle, Rgb};
use namestamp_core::{NoProgress, ProgressSink};

use crate::output;

/// Style flag values from the command line; each one set overrides the
/// style file (or the defaults).
pub struct StyleOverrides {
    pub font_size: Option<f32>,
    pub text_color: Option<String>,
    pub bg_color: Option<String>,
    pub bg_opacity: Option<f32>,
    pub x_offset: Option<f32>,
    pub y_offset: Option<f32>,
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn page_done(&mut self, completed: usize, total: usize) {
        eprintln!("  page {completed}/{total}");
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    roster: PathBuf,
    pdf: PathBuf,
    out: PathBuf,
    style_file: Option<PathBuf>,
    overrides: StyleOverrides,
    output_format: &str,
    quiet: bool,
) -> Result<(), StampError> {
    let style = build_style(style_file.as_deref(), &overrides)?;

    let roster_bytes = std::fs::read(&roster)?;
    let pdf_bytes = std::fs::read(&pdf)?;

    let result = if quiet {
        namestamp_core::stamp_pdf(&roster_bytes, &pdf_bytes, &style, &mut NoProgress)?
    } else {
        namestamp_core::stamp_pdf(&roster_bytes, &pdf_bytes, &style, &mut StderrProgress)?
    };

    write_atomic(&out, &result.pdf)?;

    match output_format {
        "json" => output::json::print_run_summary(&result.summary)?,
        _ => output::table::print_run_summary(&result.summary, &out),
    }

    Ok(())
}

fn build_style(
    style_file: Option<&Path>,
    overrides: &StyleOverrides,
) -> Result<OverlayStyle, StampError> {
    let mut style = match style_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        }
        None => OverlayStyle::default(),
    };

    if let Some(size) = overrides.font_size {
        style.font_size = size;
    }
    if let Some(ref hex) = overrides.text_color {
        style.text_color = parse_color(hex)?;
    }
    if let Some(ref hex) = overrides.bg_color {
        style.bg_color = parse_color(hex)?;
    }
    if let Some(opacity) = overrides.bg_opacity {
        style.bg_opacity = opacity;
    }
    if let Some(x) = overrides.x_offset {
        style.x_offset = x;
    }
    if let Some(y) = overrides.y_offset {
        style.y_offset = y;
    }

    style.validate()?;
    Ok(style)
}

fn parse_color(hex: &str) -> Result<Rgb, StampError> {
    Rgb::from_hex(hex)
        .ok_or_else(|| StampError::StyleInvalid(format!("'{hex}' is not a #RRGGBB color")))
}

/// Write the output through a temp file in the destination directory,
/// renamed into place on success. The temp file is removed on every
/// failure path, so an aborted run never leaves a partial PDF behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StampError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| StampError::Io(e.error))?;
    Ok(())
}
