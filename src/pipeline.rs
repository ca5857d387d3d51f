use super::distance;
use super::extractor::{self, ExtractError};
use super::geocoder::{Coordinate, PlaceGeocoder, PostalGeocoder};
use super::settings::DEFAULT_HOME_POSTAL_CODE;
use super::table_writer::{self, TableError};

use failure::Fail;
use log::{info, warn};
use std::path::Path;

#[derive(Debug, Fail)]
pub enum PipelineError {
    #[fail(display = "{}", _0)]
    Extract(ExtractError),
    #[fail(display = "Couldn't establish home coordinates for postal code {}", _0)]
    HomeNotFound(String),
    #[fail(display = "Couldn't write the table: {}", _0)]
    Table(TableError),
}

impl From<ExtractError> for PipelineError {
    fn from(err: ExtractError) -> PipelineError {
        PipelineError::Extract(err)
    }
}

impl From<TableError> for PipelineError {
    fn from(err: TableError) -> PipelineError {
        PipelineError::Table(err)
    }
}

/// The geocoding collaborators of a run.
pub struct Geocoders<'a> {
    pub postal: &'a dyn PostalGeocoder,
    pub places: &'a dyn PlaceGeocoder,
}

#[derive(Debug, PartialEq)]
pub struct RunStats {
    pub companies: usize,
    pub malformed_rows: usize,
    pub locations: usize,
    pub rows_without_distance: usize,
}

fn locate_home_once(postal: &dyn PostalGeocoder, code: &str) -> Option<Coordinate> {
    match postal.locate_postal_code(code) {
        Ok(Some(coordinate)) => Some(coordinate),
        Ok(None) => {
            warn!("Postal code {} has no coordinates", code);
            None
        }
        Err(err) => {
            warn!("{}", err);
            None
        }
    }
}

/// Resolves `code`, falling back to Belmont, CA when it can't be located.
pub fn resolve_home(postal: &dyn PostalGeocoder, code: &str) -> Result<Coordinate, PipelineError> {
    if let Some(home) = locate_home_once(postal, code) {
        info!("Found home coordinates for zip code {}", code);
        return Ok(home);
    }

    warn!(
        "Home coordinates couldn't be established! Using Belmont CA ({}) as home",
        DEFAULT_HOME_POSTAL_CODE
    );
    locate_home_once(postal, DEFAULT_HOME_POSTAL_CODE)
        .ok_or_else(|| PipelineError::HomeNotFound(code.to_owned()))
}

/// Everything after the page fetch: extract, geocode, measure, sort and
/// write the table to `output_path`.
pub fn run(
    html: &str,
    home_postal_code: &str,
    geocoders: &Geocoders,
    output_path: &Path,
    quiet_mode: bool,
) -> Result<RunStats, PipelineError> {
    let extraction = extractor::extract_companies(html)?;
    for row_error in &extraction.row_errors {
        warn!("{}", row_error);
    }

    let home = resolve_home(geocoders.postal, home_postal_code)?;

    let locations = extraction.locations();
    let distances = distance::build_distance_map(&home, &locations, geocoders.places, quiet_mode);

    let mut rows = table_writer::build_rows(&extraction.records, &distances);
    table_writer::sort_rows(&mut rows);
    let table_stats = table_writer::write_table_file(&rows, output_path)?;
    info!("{} is complete.", output_path.display());

    Ok(RunStats {
        companies: extraction.records.len(),
        malformed_rows: extraction.row_errors.len(),
        locations: locations.len(),
        rows_without_distance: table_stats.rows_without_distance,
    })
}
