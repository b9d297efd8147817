//! Feature engineering over stored bars and CSV directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::BatchReport;
use crate::core::error::QuantError;
use crate::core::Result;
use crate::data::csv::{read_table, write_records};
use crate::features::{engineer_features, engineer_table};
use crate::store::{FeatureRecord, Store};

/// Engineer and store the features of one ticker. Returns rows inserted.
pub fn transform_ticker(store: &mut dyn Store, ticker: &str) -> Result<usize> {
    let bars = store.load_bars(ticker)?;
    if bars.is_empty() {
        return Err(QuantError::no_historical_data(ticker));
    }
    let features = engineer_features(&bars)?;
    debug!(ticker, bars = bars.len(), rows = features.len(), "engineered features");
    store.upsert_features(&features)
}

/// Engineer and store the features of every ticker.
pub fn transform(store: &mut dyn Store, tickers: &[String]) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for ticker in tickers {
        let result = transform_ticker(store, ticker);
        report.record(ticker.as_str(), result)?;
    }
    info!(
        tickers = tickers.len(),
        skipped = report.skipped.len(),
        rows = report.total_rows(),
        "transform complete"
    );
    Ok(report)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn is_csv(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Engineer every `<input>/<dataset>/<TICKER>.csv` into
/// `<output>/<dataset>/<TICKER>.csv`, undefined values written as 0.
///
/// Files directly under `input` and the output directory itself (when it
/// lives inside `input`) are ignored. Report entries are named
/// `<dataset>/<file>`.
pub fn process_csv_dir(input: &Path, output: &Path) -> Result<BatchReport> {
    let output_canonical = fs::canonicalize(output).ok();
    let mut report = BatchReport::default();

    for dataset_dir in sorted_entries(input)? {
        if !dataset_dir.is_dir() {
            continue;
        }
        if output_canonical.is_some() && fs::canonicalize(&dataset_dir).ok() == output_canonical {
            continue;
        }
        let Some(dataset) = dataset_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let out_dir = output.join(&dataset);
        fs::create_dir_all(&out_dir)?;

        for file in sorted_entries(&dataset_dir)?.into_iter().filter(|p| is_csv(p)) {
            let (Some(stem), Some(name)) = (file.file_stem(), file.file_name()) else {
                continue;
            };
            let ticker = stem.to_string_lossy().into_owned();
            let out_file = out_dir.join(name);
            let result = read_table(&file)
                .and_then(|table| engineer_table(&ticker, &table))
                .and_then(|features| {
                    write_records(&out_file, &FeatureRecord::from_rows(&ticker, &features.rows))?;
                    Ok(features.len())
                });
            report.record(format!("{dataset}/{}", name.to_string_lossy()), result)?;
        }
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        files = report.processed.len(),
        skipped = report.skipped.len(),
        "processed csv datasets"
    );
    Ok(report)
}
