//! Report writer collaborator
//!
//! Renders a [`TestOutcome`] as a two-grid CSV report: one grid of
//! observed conditional ratios and one of converged randomized
//! thresholds. Both axes are labeled with the concatenated category sets
//! (independent-variable labels first), so natural and reversed cells
//! land in one square grid.
//! CSV carries no font styling, so significant observed cells are
//! distinguished with a trailing `*` and the trailer row explains the
//! marker.
//!
//! The output path is timestamped, `result.csv` becoming e.g.
//! `result_20260827_153012.csv`, so successive runs never clobber each
//! other.

use std::fs::File;
use std::path::{Path, PathBuf};

use catdep_core::TestOutcome;
use chrono::Local;

use crate::CliError;

/// Inserts a `_YYYYMMDD_HHMMSS` timestamp between file stem and
/// extension.
pub fn timestamped_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("result");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{stamp}.{ext}"),
        None => format!("{stem}_{stamp}"),
    };
    path.with_file_name(name)
}

/// Writes the two-grid report to `path`.
pub fn write_report(path: &Path, outcome: &TestOutcome, rand_level: f64) -> Result<(), CliError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(File::create(path)?);

    let categories: Vec<&str> = outcome
        .categories_a
        .iter()
        .chain(&outcome.categories_b)
        .map(String::as_str)
        .collect();

    writer.write_record(["Observed"])?;
    write_grid(&mut writer, outcome, &categories, |cell| {
        let mut value = format_ratio(cell.observed);
        if cell.significant {
            value.push('*');
        }
        value
    })?;

    writer.write_record([""])?;
    writer.write_record(["Randomized"])?;
    write_grid(&mut writer, outcome, &categories, |cell| {
        format_ratio(cell.randomized)
    })?;

    writer.write_record([""])?;
    writer.write_record([format!(
        "Values marked * are higher than {rand_level}% of randomized results."
    )])?;

    writer.flush()?;
    Ok(())
}

fn write_grid<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    outcome: &TestOutcome,
    categories: &[&str],
    render: impl Fn(&catdep_core::DependencyCell) -> String,
) -> Result<(), CliError> {
    let mut header = vec!["Indep.\\Dep.".to_owned()];
    header.extend(categories.iter().map(|c| (*c).to_owned()));
    writer.write_record(&header)?;

    for row_cat in categories {
        let mut record = vec![(*row_cat).to_owned()];
        for col_cat in categories {
            let key = ((*row_cat).to_owned(), (*col_cat).to_owned());
            record.push(match outcome.matrix.get(&key) {
                Some(cell) => render(cell),
                None => String::new(),
            });
        }
        writer.write_record(&record)?;
    }
    Ok(())
}

fn format_ratio(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value}")
    }
}
