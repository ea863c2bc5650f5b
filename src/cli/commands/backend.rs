use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_ANON_KEY: &str = "anon-key";
pub const ARG_SERVICE_ROLE_KEY: &str = "service-role-key";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .long(ARG_BACKEND_URL)
                .help("Hosted backend base URL, example: https://<project>.supabase.co")
                .env("DEPOZIT_SUPABASE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ANON_KEY)
                .long(ARG_ANON_KEY)
                .help("Public anon key sent with every backend request")
                .env("DEPOZIT_SUPABASE_ANON_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SERVICE_ROLE_KEY)
                .long(ARG_SERVICE_ROLE_KEY)
                .help("Privileged service-role key, only used by user management")
                .env("DEPOZIT_SUPABASE_SERVICE_ROLE_KEY")
                .hide_env_values(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub anon_key: Option<SecretString>,
    pub service_role_key: Option<SecretString>,
}

impl Options {
    /// # Errors
    /// Returns an error if the backend URL is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_BACKEND_URL)
            .cloned()
            .context("missing required argument: --backend-url")?;

        let secret = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(SecretString::from)
        };

        Ok(Self {
            url,
            anon_key: secret(ARG_ANON_KEY),
            service_role_key: secret(ARG_SERVICE_ROLE_KEY),
        })
    }
}
