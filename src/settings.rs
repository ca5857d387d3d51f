use clap::{App, Arg, ArgMatches};
use failure::Fail;
use simplelog::LevelFilter;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOME_POSTAL_CODE: &str = "94002"; // Belmont, CA
pub const DEFAULT_OUTPUT_FILE: &str = "bio_companies.csv";
pub const DEFAULT_DIRECTORY_URL: &str =
    "https://biopharmguy.com/links/company-by-name-northern-california.php";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "biotech-distance/0.1";
pub const DEFAULT_TIMEOUT_SECS: &str = "30";
// Nominatim usage policy: at most one request per second.
pub const DEFAULT_GEOCODE_INTERVAL_MS: &str = "1000";

#[derive(Debug, Fail)]
pub enum SettingsError {
    #[fail(display = "Invalid value for --{}: {}", flag, value)]
    InvalidNumber { flag: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub home_postal_code: String,
    pub output_path: PathBuf,
    pub directory_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub nominatim_url: String,
    pub geocode_interval: Duration,
    pub postal_data: Option<PathBuf>,
    pub quiet: bool,
}

pub fn build_cli() -> App<'static, 'static> {
    App::new("biotech-distance")
        .version("0.1.0")
        .author("Gustavo Ajzenman")
        .about("Table of biotech companies sorted by distance from home")
        .arg(Arg::with_name("zip")
            .short("z")
            .value_name("home zip code")
            .help("5 digit zip code of home, default = Belmont, CA")
            .takes_value(true)
            .default_value(DEFAULT_HOME_POSTAL_CODE)
        )
        .arg(Arg::with_name("output")
            .short("o")
            .value_name("output_file")
            .help("File to write the table of biotech companies to")
            .takes_value(true)
            .default_value(DEFAULT_OUTPUT_FILE)
        )
        .arg(Arg::with_name("url")
            .short("u")
            .long("url")
            .help("Directory page listing the companies")
            .takes_value(true)
            .default_value(DEFAULT_DIRECTORY_URL)
        )
        .arg(Arg::with_name("timeout")
            .short("t")
            .long("timeout")
            .help("Timeout in seconds for every HTTP request")
            .takes_value(true)
            .default_value(DEFAULT_TIMEOUT_SECS)
        )
        .arg(Arg::with_name("user-agent")
            .long("user-agent")
            .help("User-Agent header sent with every HTTP request")
            .takes_value(true)
            .default_value(DEFAULT_USER_AGENT)
        )
        .arg(Arg::with_name("nominatim-url")
            .long("nominatim-url")
            .help("Nominatim search endpoint used for place names")
            .takes_value(true)
            .default_value(DEFAULT_NOMINATIM_URL)
        )
        .arg(Arg::with_name("geocode-interval")
            .long("geocode-interval")
            .help("Minimum milliseconds between two geocoding requests")
            .takes_value(true)
            .default_value(DEFAULT_GEOCODE_INTERVAL_MS)
        )
        .arg(Arg::with_name("postal-data")
            .long("postal-data")
            .help("GeoNames US postal code dump. If omitted, a cached copy is used (downloaded on first run).")
            .takes_value(true)
        )
        .arg(Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .help("Log debug information")
            .conflicts_with("quiet")
        )
        .arg(Arg::with_name("quiet")
            .short("q")
            .long("quiet")
            .help("Only log warnings and errors, hide progress bars")
        )
}

pub fn log_level(matches: &ArgMatches) -> LevelFilter {
    if matches.is_present("verbose") {
        LevelFilter::Debug
    } else if matches.is_present("quiet") {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

fn parse_number(matches: &ArgMatches, flag: &'static str) -> Result<u64, SettingsError> {
    value_t!(matches, flag, u64).map_err(|_| SettingsError::InvalidNumber {
        flag,
        value: matches.value_of(flag).unwrap_or_default().to_owned(),
    })
}

impl RunSettings {
    pub fn from_matches(matches: &ArgMatches) -> Result<RunSettings, SettingsError> {
        let timeout_secs = parse_number(matches, "timeout")?;
        let interval_ms = parse_number(matches, "geocode-interval")?;

        Ok(RunSettings {
            home_postal_code: matches
                .value_of("zip")
                .unwrap_or(DEFAULT_HOME_POSTAL_CODE)
                .trim()
                .to_owned(),
            output_path: PathBuf::from(matches.value_of("output").unwrap_or(DEFAULT_OUTPUT_FILE)),
            directory_url: matches.value_of("url").unwrap_or(DEFAULT_DIRECTORY_URL).to_owned(),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: matches
                .value_of("user-agent")
                .unwrap_or(DEFAULT_USER_AGENT)
                .to_owned(),
            nominatim_url: matches
                .value_of("nominatim-url")
                .unwrap_or(DEFAULT_NOMINATIM_URL)
                .to_owned(),
            geocode_interval: Duration::from_millis(interval_ms),
            postal_data: matches.value_of("postal-data").map(PathBuf::from),
            quiet: matches.is_present("quiet"),
        })
    }
}
