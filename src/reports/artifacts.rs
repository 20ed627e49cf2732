use codfrel::config::Config;
use codfrel::dataset::DatasetType;
use codfrel::error::CfResult;
use codfrel::eval::{EvalRow, EvaluationReport, MapScores, SweepPoint};
use codfrel::optimizer::RunOutcome;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::PhaseTiming;

pub const ROWS_HEADER: [&str; 7] = [
    "nl_index",
    "pl_index",
    "label",
    "prediction",
    "prediction_max_fitness_score",
    "pl_pred_lines",
    "pl_total_lines",
];

/// Machine-readable record of one evaluation run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub name: &'a str,
    pub dataset: String,
    pub dataset_type: DatasetType,
    pub dataset_sha256: String,
    pub seed: Option<u64>,
    pub config: &'a Config,
    pub nl_items: usize,
    pub pl_items: usize,
    pub links: usize,
    pub fallback_nl_items: Vec<usize>,
    pub outcome: &'a RunOutcome,
    pub evaluation: &'a EvaluationReport,
    pub timings: &'a [PhaseTiming],
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

pub fn write_rows_csv(path: &Path, rows: &[EvalRow]) -> CfResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(ROWS_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.nl_index.to_string(),
            row.pl_index.to_string(),
            flag(row.is_link).to_string(),
            flag(row.predicted).to_string(),
            row.max_fitness.to_string(),
            row.pred_lines.to_string(),
            row.total_lines.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn map_line(scores: Option<&MapScores>) -> String {
    scores.map_or_else(
        || "undefined (no links or no NL items)".to_string(),
        |s| s.to_string(),
    )
}

fn point_section(
    text: &mut String,
    title: &str,
    point: Option<&SweepPoint>,
    map: Option<&MapScores>,
) {
    match point {
        Some(p) => {
            let _ = writeln!(text, "Config with {}:\n{}", title, p.config);
            let _ = writeln!(text, "Metrics with {}:\n{}", title, p.metrics);
            let _ = writeln!(text, "Diagnostic MAP with {}:\n{}", title, map_line(map));
        }
        None => {
            let _ = writeln!(text, "Config with {}:\nnone (F1 undefined everywhere)", title);
        }
    }
    text.push('\n');
}

pub fn summary_text(summary: &RunSummary<'_>) -> String {
    let mut text = String::new();
    let eval = summary.evaluation;

    if summary.outcome.interrupted {
        text.push_str("ATTENTION: GA run was interrupted before its stopping condition.\n\n");
    }

    let _ = writeln!(
        text,
        "Dataset:\n{} ({}), sha256 {}\n{} NL items, {} PL items, {} links\n",
        summary.dataset,
        summary.dataset_type,
        summary.dataset_sha256,
        summary.nl_items,
        summary.pl_items,
        summary.links
    );

    let _ = writeln!(
        text,
        "MAP calculated directly from population:\n{}\n",
        map_line(eval.map_from_population.as_ref())
    );

    point_section(
        &mut text,
        "best F1",
        eval.sweep.best_f1.as_ref(),
        eval.diagnostic_map.best_f1.as_ref(),
    );
    point_section(
        &mut text,
        "best F1 and 0 min lines ratio",
        eval.sweep.best_f1_zero_ratio.as_ref(),
        eval.diagnostic_map.best_f1_zero_ratio.as_ref(),
    );
    point_section(
        &mut text,
        "minimum requirements",
        Some(&eval.sweep.baseline),
        eval.diagnostic_map.baseline.as_ref(),
    );

    text.push_str("Execution times:\n");
    for t in summary.timings {
        let _ = writeln!(text, "{}: {:.3}s", t.phase, t.seconds);
    }
    text.push('\n');

    let _ = writeln!(text, "Global iterations:\n{}", summary.outcome.global_generations);
    let per_nl = summary
        .outcome
        .generations_per_nl
        .iter()
        .enumerate()
        .map(|(nl, g)| format!("{}: {}", nl, g))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(text, "Iterations[nl]:\n{{{}}}\n", per_nl);

    if !summary.fallback_nl_items.is_empty() {
        let _ = writeln!(
            text,
            "NL items without keyword-matched lines (random selection):\n{:?}\n",
            summary.fallback_nl_items
        );
    }

    text.push_str("NOTE:\n");
    text.push_str("'MAP calculated directly from population' is the authoritative MAP.\n");
    text.push_str("The diagnostic MAP values are computed from sweep rows, where a row counts\n");
    text.push_str("as reached by the population only if its max fitness is non-zero.\n");
    text
}

// A missing best point still leaves a header-only file.
fn rows_of(point: Option<&SweepPoint>) -> &[EvalRow] {
    point.map(|p| p.rows.as_slice()).unwrap_or(&[])
}

/// Writes the three row files plus `summary.txt` and `summary.json` into `dir`.
pub fn write_all(dir: &Path, summary: &RunSummary<'_>) -> CfResult<()> {
    fs::create_dir_all(dir)?;
    let sweep = &summary.evaluation.sweep;

    write_rows_csv(&dir.join("best_f1_rows.csv"), rows_of(sweep.best_f1.as_ref()))?;
    write_rows_csv(
        &dir.join("best_f1_0_min_lines_ratio_rows.csv"),
        rows_of(sweep.best_f1_zero_ratio.as_ref()),
    )?;
    write_rows_csv(&dir.join("minimum_requirements_rows.csv"), &sweep.baseline.rows)?;

    fs::write(dir.join("summary.txt"), summary_text(summary))?;
    fs::write(dir.join("summary.json"), serde_json::to_string_pretty(summary)?)?;
    Ok(())
}
