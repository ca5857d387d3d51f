use super::distance::DistanceMap;
use super::extractor::CompanyRecord;

use csv;
use failure::Fail;
use log::info;
use serde::Serialize;

use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time;

pub const HEADER: [&str; 5] = ["name", "location", "website", "description", "distance"];

#[derive(Debug)]
pub struct TableStats {
    pub rows_written: usize,
    pub rows_without_distance: usize,
}

#[derive(Debug, Fail)]
pub enum TableError {
    #[fail(display = "I/O error: {}", _0)]
    Io(io::Error),
    #[fail(display = "Csv error: {}", _0)]
    Csv(csv::Error),
}

impl From<io::Error> for TableError {
    fn from(err: io::Error) -> TableError {
        TableError::Io(err)
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> TableError {
        TableError::Csv(err)
    }
}

/// One output line. Field order matches `HEADER`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRow<'a> {
    pub name: &'a str,
    pub location: &'a str,
    pub website: &'a str,
    pub description: &'a str,
    pub distance: Option<f64>,
}

pub fn build_rows<'a>(records: &'a [CompanyRecord], distances: &DistanceMap) -> Vec<CompanyRow<'a>> {
    records
        .iter()
        .map(|record| CompanyRow {
            name: &record.name,
            location: &record.location,
            website: &record.website,
            description: &record.description,
            distance: distances.get(&record.location).cloned().unwrap_or(None),
        })
        .collect()
}

// Missing distances go last.
#[inline]
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by (distance, location, description).
pub fn sort_rows(rows: &mut [CompanyRow]) {
    rows.sort_by(|a, b| {
        compare_distance(a.distance, b.distance)
            .then_with(|| a.location.cmp(b.location))
            .then_with(|| a.description.cmp(b.description))
    });
}

pub fn write_rows<W: io::Write>(rows: &[CompanyRow], output: W) -> Result<TableStats, TableError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(output);

    csv_writer.write_record(&HEADER)?;

    let mut rows_without_distance = 0;
    for row in rows {
        if row.distance.is_none() {
            rows_without_distance += 1;
        }
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;

    Ok(TableStats {
        rows_written: rows.len(),
        rows_without_distance,
    })
}

/// Writes the table to `path`, replacing anything already there.
pub fn write_table_file(rows: &[CompanyRow], path: &Path) -> Result<TableStats, TableError> {
    let start_instant = time::Instant::now();

    let file = File::create(path)?;
    let stats = write_rows(rows, io::BufWriter::new(file))?;

    let elapsed_secs = start_instant.elapsed().as_millis() as f32 / 1000.0f32;
    info!(
        "Wrote {} rows to {} in {} seconds",
        stats.rows_written,
        path.display(),
        elapsed_secs
    );

    Ok(stats)
}
