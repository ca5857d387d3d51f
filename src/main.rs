#[macro_use]
extern crate clap;

use failure::Error;
use log::{error, info};
use simplelog;

mod cli_utils;
mod distance;
mod extractor;
mod fetcher;
mod geocoder;
mod pipeline;
mod settings;
mod table_writer;

#[cfg(test)]
mod test_support;

use chrono::offset::Local;
use clap::ArgMatches;

use geocoder::NominatimGeocoder;
use pipeline::{Geocoders, RunStats};
use settings::RunSettings;

fn main() {
    let matches = settings::build_cli().get_matches();

    let local_time = Local::now();
    let time_offset = local_time.offset();
    // Configure logging
    simplelog::TermLogger::init(
        settings::log_level(&matches),
        simplelog::Config {
            offset: time_offset.clone(),
            ..simplelog::Config::default()
        },
        simplelog::TerminalMode::Stderr,
    )
    .ok();

    match do_main(&matches) {
        Ok(stats) => info!("Process finished OK: {:?}", stats),
        Err(err) => {
            error!("Process finished with an error: {}", err);
            std::process::exit(1);
        }
    };
}

fn do_main(matches: &ArgMatches) -> Result<RunStats, Error> {
    let settings = RunSettings::from_matches(matches)?;
    let agent = fetcher::build_agent(settings.timeout, &settings.user_agent);

    let page = fetcher::fetch_page(&agent, &settings.directory_url, settings.quiet)?;

    let postal = geocoder::load_postal_index(&agent, settings.postal_data.as_deref(), settings.quiet)?;
    let places = NominatimGeocoder::new(agent.clone(), &settings.nominatim_url, settings.geocode_interval);

    let geocoders = Geocoders {
        postal: &postal,
        places: &places,
    };

    let stats = pipeline::run(
        &page,
        &settings.home_postal_code,
        &geocoders,
        &settings.output_path,
        settings.quiet,
    )?;

    Ok(stats)
}
