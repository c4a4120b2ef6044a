use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, info_span};

use care_ingest::{Extraction, HeaderMapping, IngestOptions, load_records};
use care_model::{InputOrder, PatientSummary, ResolverOptions};
use care_resolve::{ResolutionStats, resolve};

use crate::cli::{InputArgs, InspectArgs, OutputFormatArg, ResolveArgs};
use crate::report::{mapping_table, stats_table, summary_table};

/// Everything `resolve` prints.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub source: PathBuf,
    pub skipped_rows: usize,
    pub stats: ResolutionStats,
    pub patients: Vec<PatientSummary>,
}

pub fn run_resolve(args: &ResolveArgs) -> Result<ResolveReport> {
    let path = &args.input.file;
    let span = info_span!("resolve_file", path = %path.display());
    let _guard = span.enter();

    let mut ingest_options = ingest_options(&args.input)?;
    if let Some(millis) = args.import_timestamp {
        ingest_options = ingest_options.with_import_timestamp(millis);
    }
    let extraction = load(path, &ingest_options)?;
    let skipped_rows = extraction.skipped_rows;

    let start = Instant::now();
    let resolution = resolve(extraction.records, &resolver_options(args));
    let patients = resolution.summaries();
    info!(
        patients = patients.len(),
        skipped_rows,
        duration_ms = start.elapsed().as_millis(),
        "resolve complete"
    );

    Ok(ResolveReport {
        source: path.clone(),
        skipped_rows,
        stats: resolution.stats,
        patients,
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<HeaderMapping> {
    let options = ingest_options(&args.input)?;
    let extraction = load(&args.input.file, &options)?;
    info!(
        records = extraction.records.len(),
        mapped = extraction.mapping.matches.len(),
        unmapped = extraction.mapping.unmapped.len(),
        "inspect complete"
    );
    Ok(extraction.mapping)
}

/// Render a report in the requested format.
pub fn render_report(report: &ResolveReport, format: OutputFormatArg) -> Result<String> {
    match format {
        OutputFormatArg::Json => {
            serde_json::to_string_pretty(report).context("serialize resolve report")
        }
        OutputFormatArg::Table => Ok(format!(
            "{}\n{}",
            summary_table(&report.patients),
            stats_table(&report.stats)
        )),
    }
}

pub fn render_mapping(mapping: &HeaderMapping) -> String {
    mapping_table(mapping).to_string()
}

/// Print to stdout, or write to `output` when given.
pub fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn load(path: &Path, options: &IngestOptions) -> Result<Extraction> {
    let start = Instant::now();
    let extraction =
        load_records(path, options).with_context(|| format!("read {}", path.display()))?;
    info!(
        records = extraction.records.len(),
        skipped_rows = extraction.skipped_rows,
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    Ok(extraction)
}

fn ingest_options(args: &InputArgs) -> Result<IngestOptions> {
    let Some(delimiter) = u8::try_from(args.delimiter).ok().filter(u8::is_ascii) else {
        bail!("delimiter must be a single ASCII character, got {:?}", args.delimiter);
    };
    let mut options = IngestOptions::new()
        .with_header_rows(args.header_rows)
        .with_delimiter(delimiter);
    if args.no_fuzzy_headers {
        options = options.with_fuzzy_threshold(None);
    }
    Ok(options)
}

fn resolver_options(args: &ResolveArgs) -> ResolverOptions {
    let mut options = if args.strict {
        ResolverOptions::strict()
    } else {
        ResolverOptions::new()
    };
    if let Some(count) = args.min_evidence {
        options = options.with_min_evidence_categories(usize::from(count));
    }
    if args.presort {
        options = options.with_input_order(InputOrder::Presorted);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(delimiter: char) -> InputArgs {
        InputArgs {
            file: PathBuf::from("intake.csv"),
            header_rows: 1,
            delimiter,
            no_fuzzy_headers: true,
        }
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        assert!(ingest_options(&input('，')).is_err());
    }

    #[test]
    fn builds_ingest_options_from_flags() {
        let options = ingest_options(&input(';')).unwrap();
        assert_eq!(options.delimiter, b';');
        assert_eq!(options.fuzzy_threshold, None);
    }
}
