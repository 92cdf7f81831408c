//! `orderqa run` and `orderqa validate`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use orderqa_io::{csv as io_csv, discover, xlsx};
use orderqa_recon::marts::{self, MartCount};
use orderqa_recon::{PipelineConfig, RunSummary, Schema};

use crate::exit_codes::{EXIT_ERROR, EXIT_FINDINGS};
use crate::CliError;

/// Where each output landed.
#[derive(Debug, Serialize)]
struct OutputPaths {
    report: PathBuf,
    marts_dir: PathBuf,
    mart_counts: PathBuf,
    archive: PathBuf,
    review: PathBuf,
}

#[derive(Debug, Serialize)]
struct RunJson {
    #[serde(flatten)]
    summary: RunSummary,
    marts: Vec<MartCount>,
    outputs: OutputPaths,
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    PipelineConfig::from_toml(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("check it with: orderqa validate {}", path.display()))
    })
}

pub fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let parsed = load_config(Some(&config))?;
    eprintln!(
        "config ok: '{}' (tolerance {}, {} business key column(s), {} context key column(s))",
        parsed.name,
        parsed.checks.price_tolerance,
        parsed.checks.business_key.len(),
        parsed.checks.context_key.len(),
    );
    Ok(())
}

pub fn cmd_run(
    input: PathBuf,
    config_path: Option<PathBuf>,
    out: PathBuf,
    json_output: bool,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let schema = Schema::canonical();

    let files = discover::list_input_files(&input)
        .map_err(|e| CliError::io(e).with_hint("pass the directory that holds the extracts"))?;
    if files.is_empty() {
        log::warn!("no files in {}", input.display());
    }

    let loader = io_csv::PipeDelimitedLoader::new(&input)
        .with_delimiter(config.input.delimiter_byte()?);
    let output = orderqa_recon::run(&config, &schema, &files, &loader)?;

    // Outputs
    std::fs::create_dir_all(&out)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", out.display())))?;
    let paths = OutputPaths {
        report: out.join(&config.output.report),
        marts_dir: out.join(&config.output.marts_dir),
        mart_counts: out.join(&config.output.mart_counts),
        archive: out.join(&config.output.archive),
        review: out.join(&config.output.review),
    };

    xlsx::write_issue_report(&output.report, &output.examples, &paths.report)
        .map_err(CliError::io)?;

    let built = marts::build_marts(&output.cleaned);
    let mart_files = io_csv::write_marts(&built, &paths.marts_dir).map_err(CliError::io)?;
    let counts = marts::summarize(&built);
    io_csv::write_mart_counts(&counts, &paths.mart_counts).map_err(CliError::io)?;
    orderqa_io::zip_files(&mart_files, &paths.archive).map_err(CliError::io)?;
    io_csv::write_records(&output.review, &paths.review).map_err(CliError::io)?;

    let summary = output.summary();
    print_human_summary(&summary, &paths);

    if json_output {
        let doc = RunJson { summary, marts: counts, outputs: paths };
        let json_str = serde_json::to_string_pretty(&doc)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    let total = output.report.total_findings();
    if strict && total > 0 {
        return Err(CliError::new(EXIT_FINDINGS, format!("{total} finding(s) reported"))
            .with_hint(format!("see {}", out.join(&config.output.report).display())));
    }
    Ok(())
}

fn print_human_summary(summary: &RunSummary, paths: &OutputPaths) {
    let merged_files = summary.files.iter().filter(|f| f.state.is_merged()).count();
    eprintln!(
        "{} file(s): {} merged, {} rejected",
        summary.files.len(),
        merged_files,
        summary.files.len() - merged_files,
    );
    for file in summary.files.iter().filter(|f| f.state.is_rejected()) {
        eprintln!("  {}: {}", file.file, file.state);
    }
    eprintln!(
        "{} merged row(s): {} cleaned, {} for review ({} duplicate order-line group(s), {} benign)",
        summary.merged_rows,
        summary.cleaned_rows,
        summary.review_rows,
        summary.benign_groups + summary.review_groups,
        summary.benign_groups,
    );

    let total: usize = summary.findings.values().sum();
    eprintln!("{total} finding(s)");
    for (category, count) in summary.findings.iter().filter(|(_, n)| **n > 0) {
        eprintln!("  {category}: {count}");
    }

    for path in [&paths.report, &paths.mart_counts, &paths.archive, &paths.review] {
        eprintln!("wrote {}", path.display());
    }
}
