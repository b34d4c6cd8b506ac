// URayTech decoders take commands as bare CGI query strings over plain HTTP
// with basic auth, e.g. GET /setpro.cgi?channelup. The reboot switch lives on
// /set.cgi and the status page on /getpro.cgi.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";

const COMMANDS: &[(&str, &str)] = &[
    ("channelup", "/setpro.cgi?channelup"),
    ("channeldown", "/setpro.cgi?channeldown"),
    ("reboot", "/set.cgi?reboot"),
    ("status", "/getpro.cgi"),
];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown command {0:?}")]
    UnknownCommand(String),
    #[error("Bad channel id {0:?}")]
    BadChannel(String),
    #[error("Request failed: {0}")]
    Transport(Box<ureq::Transport>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn encode(command: &str) -> Result<String, Error> {
    if let Some(id) = command.strip_prefix("channel:") {
        // Channel ids are one-based on the remote, zero-based in the CGI.
        let id: i64 = id.parse().map_err(|_| Error::BadChannel(id.to_string()))?;
        return Ok(format!("/setpro.cgi?playindex={}", id - 1));
    }
    COMMANDS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, query)| (*query).to_string())
        .ok_or_else(|| Error::UnknownCommand(command.to_string()))
}

/// Issues the single GET carrying the command and returns the response body.
/// The decoder answers failed commands with ordinary pages, so any completed
/// HTTP exchange counts as delivered; only transport failures are errors.
pub fn send(
    host: &str,
    port: u16,
    query: &str,
    username: &str,
    password: &str,
    timeout: Duration,
) -> Result<String, Error> {
    let url = format!("http://{host}:{port}{query}");
    info!("GET {url}");
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let credentials = STANDARD.encode(format!("{username}:{password}"));
    let response = match agent
        .get(&url)
        .set("Authorization", &format!("Basic {credentials}"))
        .call()
    {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            info!("decoder answered http {code}");
            response
        }
        Err(ureq::Error::Transport(transport)) => return Err(Error::Transport(Box::new(transport))),
    };
    let body = response.into_string()?;
    debug!("response: {body:?}");
    Ok(body)
}
