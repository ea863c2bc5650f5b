//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run, currently always the API
//! server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{backend, ARG_CURRENCY, ARG_PORT, ARG_SECURE_COOKIES, ARG_STATIC_DIR};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let backend_opts = backend::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        backend_url: backend_opts.url,
        anon_key: backend_opts.anon_key,
        service_role_key: backend_opts.service_role_key,
        static_dir: matches.get_one::<String>(ARG_STATIC_DIR).cloned(),
        secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        currency: matches
            .get_one::<String>(ARG_CURRENCY)
            .cloned()
            .unwrap_or_else(|| "RON".to_string()),
    }))
}
