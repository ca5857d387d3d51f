use crate::cli_utils;
use super::geocoder_types::{Coordinate, GeocodeError, PostalGeocoder};

use failure::Fail;
use log::{info, warn};

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

pub const US_POSTAL_DATA_URL: &str =
    "https://symerio.github.io/postal-codes-data/data/geonames/US.txt";
const CACHE_DIR_NAME: &str = "biotech-distance";
const CACHE_FILE_NAME: &str = "US.txt";

// GeoNames postal code dump columns (tab separated, no header).
const POSTAL_CODE_IDX: usize = 1;
const LATITUDE_IDX: usize = 9;
const LONGITUDE_IDX: usize = 10;

#[derive(Debug, Fail)]
pub enum PostalIndexError {
    #[fail(display = "I/O error: {}", _0)]
    Io(io::Error),
    #[fail(display = "Couldn't download postal codes from {}: {}", url, reason)]
    Download { url: String, reason: String },
    #[fail(display = "No cache directory available. Use --postal-data")]
    NoCacheDir,
    #[fail(display = "Postal code dataset contains no postal codes")]
    Empty,
}

impl From<io::Error> for PostalIndexError {
    fn from(err: io::Error) -> PostalIndexError {
        PostalIndexError::Io(err)
    }
}

/// Offline US postal code → coordinate lookup. Codes listed more than once
/// resolve to the mean of their coordinates.
#[derive(Debug)]
pub struct PostalCodeIndex {
    entries: HashMap<String, Option<Coordinate>>,
}

fn parse_coordinate(record: &csv::StringRecord) -> Option<Coordinate> {
    let latitude = record.get(LATITUDE_IDX)?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let longitude = record.get(LONGITUDE_IDX)?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Coordinate::new(latitude, longitude))
}

fn mean(coordinates: &[Coordinate]) -> Option<Coordinate> {
    if coordinates.is_empty() {
        return None;
    }
    let count = coordinates.len() as f64;
    let latitude = coordinates.iter().map(|c| c.latitude).sum::<f64>() / count;
    let longitude = coordinates.iter().map(|c| c.longitude).sum::<f64>() / count;
    Some(Coordinate::new(latitude, longitude))
}

/// "94002", " 94002 " and "94002-1234" all normalize to "94002".
fn normalize_us_code(code: &str) -> Option<&str> {
    let zip5 = code.trim().split('-').next()?;
    if zip5.len() == 5 && zip5.chars().all(|c| c.is_ascii_digit()) {
        Some(zip5)
    } else {
        None
    }
}

impl PostalCodeIndex {
    pub fn from_reader<R: io::Read>(reader: R) -> Result<PostalCodeIndex, PostalIndexError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut grouped: HashMap<String, Vec<Coordinate>> = HashMap::new();
        let mut error_lines = 0;

        for (line_number, record_result) in csv_reader.records().enumerate() {
            let record = match record_result {
                Ok(record) => record,
                Err(err) => {
                    warn!("Unable to read postal code line {}: {}", line_number + 1, err);
                    error_lines += 1;
                    continue;
                }
            };

            let code = match record.get(POSTAL_CODE_IDX).map(str::trim) {
                Some(code) if !code.is_empty() => code.to_owned(),
                _ => {
                    error_lines += 1;
                    continue;
                }
            };

            let coordinates = grouped.entry(code).or_insert_with(Vec::new);
            if let Some(coordinate) = parse_coordinate(&record) {
                coordinates.push(coordinate);
            }
        }

        if grouped.is_empty() {
            return Err(PostalIndexError::Empty);
        }

        let entries: HashMap<String, Option<Coordinate>> = grouped
            .into_iter()
            .map(|(code, coordinates)| {
                let coordinate = mean(&coordinates);
                (code, coordinate)
            })
            .collect();

        if error_lines > 0 {
            warn!("Skipped {} unreadable postal code lines", error_lines);
        }

        Ok(PostalCodeIndex { entries })
    }

    pub fn from_path(path: &Path) -> Result<PostalCodeIndex, PostalIndexError> {
        let file = File::open(path)?;
        PostalCodeIndex::from_reader(io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl PostalGeocoder for PostalCodeIndex {
    fn locate_postal_code(&self, code: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let zip5 = normalize_us_code(code)
            .ok_or_else(|| GeocodeError::InvalidPostalCode(code.to_owned()))?;

        Ok(self.entries.get(zip5).cloned().unwrap_or(None))
    }
}

pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
}

fn download_dataset(agent: &ureq::Agent, url: &str, dest: &Path, quiet_mode: bool) -> Result<(), PostalIndexError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    info!("Downloading US postal codes from {} into {}", url, dest.display());
    let spinner = cli_utils::create_spinner(quiet_mode, "Downloading postal codes...");

    let response = agent.get(url).call().map_err(|err| PostalIndexError::Download {
        url: url.to_owned(),
        reason: err.to_string(),
    });
    let response = match response {
        Ok(response) => response,
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err);
        }
    };

    let stored = store_complete(&mut response.into_reader(), dest);
    spinner.finish_and_clear();

    let bytes = stored?;
    info!("Downloaded {} bytes of postal code data", bytes);
    Ok(())
}

/// Copies `reader` into a `.part` sibling of `dest` and renames it once the
/// copy is complete. The partial file is removed on any failure.
fn store_complete<R: io::Read + ?Sized>(reader: &mut R, dest: &Path) -> io::Result<u64> {
    let partial = dest.with_extension("txt.part");
    let stored = File::create(&partial)
        .and_then(|mut file| io::copy(reader, &mut file))
        .and_then(|bytes| fs::rename(&partial, dest).map(|_| bytes));

    if stored.is_err() && partial.exists() {
        if let Err(err) = fs::remove_file(&partial) {
            warn!("Couldn't remove {}: {}", partial.display(), err);
        }
    }
    stored
}

/// Loads the postal dataset from `explicit_path`, or from the user cache,
/// downloading it once when the cache is empty.
pub fn load_postal_index(
    agent: &ureq::Agent,
    explicit_path: Option<&Path>,
    quiet_mode: bool,
) -> Result<PostalCodeIndex, PostalIndexError> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => {
            let cached = default_cache_path().ok_or(PostalIndexError::NoCacheDir)?;
            if !cached.exists() {
                download_dataset(agent, US_POSTAL_DATA_URL, &cached, quiet_mode)?;
            }
            cached
        }
    };

    info!("Loading postal codes from {}", path.display());
    let spinner = cli_utils::create_spinner(quiet_mode, "Loading postal codes...");
    let index = PostalCodeIndex::from_path(&path);
    spinner.finish_and_clear();

    let index = index?;
    info!("Loaded {} postal codes", index.len());
    Ok(index)
}
