use super::cli_utils;

use failure::Fail;
use log::{debug, info};
use std::time::Duration;

#[derive(Debug, Fail)]
pub enum FetchError {
    #[fail(display = "Couldn't access website {} (HTTP status {})", url, status)]
    Status { url: String, status: u16 },
    #[fail(display = "Connection attempt to {} failed with error: {}", url, reason)]
    Transport { url: String, reason: String },
    #[fail(display = "Couldn't read the body of {}: {}", url, reason)]
    Body { url: String, reason: String },
}

/// Agent shared by every outbound call. Carries the request timeout and
/// the User-Agent header.
pub fn build_agent(timeout: Duration, user_agent: &str) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

pub fn fetch_page(agent: &ureq::Agent, url: &str, quiet_mode: bool) -> Result<String, FetchError> {
    let spinner = cli_utils::create_spinner(quiet_mode, "Fetching directory page...");

    let result = request_page(agent, url);

    spinner.finish_and_clear();
    let body = result?;
    info!("Accessed {} ({} bytes)", url, body.len());
    Ok(body)
}

fn request_page(agent: &ureq::Agent, url: &str) -> Result<String, FetchError> {
    debug!("GET {}", url);
    let response = agent.get(url).call().map_err(|err| match err {
        ureq::Error::Status(status, _) => FetchError::Status {
            url: url.to_owned(),
            status,
        },
        ureq::Error::Transport(transport) => FetchError::Transport {
            url: url.to_owned(),
            reason: transport.to_string(),
        },
    })?;

    // Only a plain 200 carries the directory listing.
    if response.status() != 200 {
        return Err(FetchError::Status {
            url: url.to_owned(),
            status: response.status(),
        });
    }

    response.into_string().map_err(|err| FetchError::Body {
        url: url.to_owned(),
        reason: err.to_string(),
    })
}
