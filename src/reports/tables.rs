use codfrel::corpus::CorpusIndex;
use codfrel::dataset::Dataset;
use codfrel::eval::{EvalMetrics, EvaluationReport, MapScores, SweepPoint, MAP_DEPTH};
use codfrel::optimizer::RunOutcome;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::PhaseTiming;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn opt_cell(v: Option<f64>) -> Cell {
    match v {
        Some(x) => Cell::new(format!("{:.4}", x)),
        None => Cell::new("undefined").fg(Color::DarkGrey),
    }
}

fn align_right_from(table: &mut Table, first: usize, last: usize) {
    for i in first..=last {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn map(report: &EvaluationReport) {
    let mut table = new_table();
    let mut header = vec![Cell::new("MAP").add_attribute(Attribute::Bold)];
    header.extend((1..=MAP_DEPTH).map(|k| Cell::new(format!("@{}", k))));
    table.add_row(header);

    let rows: [(&str, Option<&MapScores>, Color); 4] = [
        ("Population", report.map_from_population.as_ref(), Color::Cyan),
        ("Best F1 (diag)", report.diagnostic_map.best_f1.as_ref(), Color::DarkGrey),
        (
            "Best F1 ratio 0 (diag)",
            report.diagnostic_map.best_f1_zero_ratio.as_ref(),
            Color::DarkGrey,
        ),
        ("Minimum (diag)", report.diagnostic_map.baseline.as_ref(), Color::DarkGrey),
    ];

    for (label, scores, color) in rows {
        let mut row = vec![Cell::new(label).fg(color)];
        match scores {
            Some(s) => row.extend(s.values().iter().map(|v| Cell::new(format!("{:.4}", v)))),
            None => row.extend((0..MAP_DEPTH).map(|_| opt_cell(None))),
        }
        table.add_row(row);
    }
    align_right_from(&mut table, 1, MAP_DEPTH);
    println!("\n{}", table);
}

pub fn sweep(report: &EvaluationReport) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Configuration").add_attribute(Attribute::Bold),
        Cell::new("min_fitness"),
        Cell::new("min_lines_ratio"),
        Cell::new("TP").fg(Color::Green),
        Cell::new("FP").fg(Color::Red),
        Cell::new("TN"),
        Cell::new("FN").fg(Color::Red),
        Cell::new("Precision"),
        Cell::new("Recall"),
        Cell::new("F1").fg(Color::Cyan),
        Cell::new("F2"),
    ]);

    let sweep = &report.sweep;
    let points: [(&str, Option<&SweepPoint>); 3] = [
        ("Best F1", sweep.best_f1.as_ref()),
        ("Best F1, ratio 0", sweep.best_f1_zero_ratio.as_ref()),
        ("Minimum requirements", Some(&sweep.baseline)),
    ];

    for (label, point) in points {
        let mut row = vec![Cell::new(label).add_attribute(Attribute::Bold)];
        match point {
            Some(p) => {
                row.push(Cell::new(format!("{:.4}", p.config.min_fitness)));
                row.push(Cell::new(format!("{:.2}", p.config.min_lines_ratio)));
                row.extend(metric_cells(&p.metrics));
            }
            None => row.push(Cell::new("no defined F1").fg(Color::DarkGrey)),
        }
        table.add_row(row);
    }
    align_right_from(&mut table, 1, 10);
    println!("\n{}", table);
}

fn metric_cells(m: &EvalMetrics) -> Vec<Cell> {
    vec![
        Cell::new(m.tp),
        Cell::new(m.fp),
        Cell::new(m.tn),
        Cell::new(m.fn_),
        opt_cell(m.precision),
        opt_cell(m.recall),
        opt_cell(m.f1).fg(Color::Cyan),
        opt_cell(m.f2),
    ]
}

pub fn run(outcome: &RunOutcome, timings: &[PhaseTiming]) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Phase").add_attribute(Attribute::Bold),
        Cell::new("Seconds"),
    ]);
    for t in timings {
        table.add_row(vec![Cell::new(&t.phase), Cell::new(format!("{:.2}", t.seconds))]);
    }

    let (min_gen, max_gen) = outcome
        .generations_per_nl
        .iter()
        .fold((usize::MAX, 0), |(lo, hi), &g| (lo.min(g), hi.max(g)));
    table.add_row(vec![
        Cell::new("Global generations").add_attribute(Attribute::Bold),
        Cell::new(outcome.global_generations),
    ]);
    if !outcome.generations_per_nl.is_empty() {
        table.add_row(vec![
            Cell::new("Generations per NL (min/max)"),
            Cell::new(format!("{}/{}", min_gen, max_gen)),
        ]);
    }
    if outcome.interrupted {
        table.add_row(vec![
            Cell::new("Status").fg(Color::Yellow),
            Cell::new("interrupted").fg(Color::Yellow),
        ]);
    }
    align_right_from(&mut table, 1, 1);
    println!("\n{}", table);
}

pub fn dataset(dataset: &Dataset, corpus: &CorpusIndex) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("NL items").add_attribute(Attribute::Bold),
        Cell::new("PL items"),
        Cell::new("Links"),
        Cell::new("PL lines"),
        Cell::new("Fallback NL").fg(Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new(dataset.nl_count()),
        Cell::new(dataset.pl_count()),
        Cell::new(dataset.links_count()),
        Cell::new(corpus.lines().len()),
        Cell::new(corpus.fallback_items().len()).fg(Color::Yellow),
    ]);
    align_right_from(&mut table, 0, 4);
    println!("\n{}", table);
}

pub fn nl_items(dataset: &Dataset, corpus: &CorpusIndex, limit: usize) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("NL").add_attribute(Attribute::Bold),
        Cell::new("Tokens"),
        Cell::new("Keywords"),
        Cell::new("Guided lines"),
        Cell::new("Links"),
    ]);
    for item in corpus.nl_items().iter().take(limit) {
        let guided = if corpus.is_fallback(item.index) {
            Cell::new("fallback").fg(Color::Yellow)
        } else {
            Cell::new(corpus.guided_len(item.index))
        };
        table.add_row(vec![
            Cell::new(item.index).add_attribute(Attribute::Bold),
            Cell::new(item.tokens.len()),
            Cell::new(item.keywords.len()),
            guided,
            Cell::new(dataset.linked(item.index).map_or(0, |s| s.len())),
        ]);
    }
    align_right_from(&mut table, 1, 4);
    println!("\n{}", table);
    if corpus.nl_count() > limit {
        println!("   ... {} more NL items", corpus.nl_count() - limit);
    }
}
