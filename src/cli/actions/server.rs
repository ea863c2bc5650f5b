use crate::{
    api::{self, ServerConfig},
    backend::Backend,
    cli::{globals::GlobalArgs, telemetry},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{debug, error};

pub struct Args {
    pub port: u16,
    pub backend_url: String,
    pub anon_key: Option<SecretString>,
    pub service_role_key: Option<SecretString>,
    pub static_dir: Option<String>,
    pub secure_cookies: bool,
    pub currency: String,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("backend_url", &self.backend_url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "***"))
            .field("service_role_key", &self.service_role_key.as_ref().map(|_| "***"))
            .field("static_dir", &self.static_dir)
            .field("secure_cookies", &self.secure_cookies)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Log every backend key that is not configured, at the default verbosity.
fn report_missing_keys(has_anon_key: bool, has_service_role_key: bool) {
    if !has_anon_key {
        error!("DEPOZIT_SUPABASE_ANON_KEY is not set, backend requests will fail");
    }
    if !has_service_role_key {
        error!("DEPOZIT_SUPABASE_SERVICE_ROLE_KEY is not set, user management is disabled");
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the backend client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut globals = GlobalArgs::new(args.backend_url);

    // Missing keys do not stop the server; the endpoints that need them answer 500.
    report_missing_keys(args.anon_key.is_some(), args.service_role_key.is_some());
    if let Some(key) = args.anon_key {
        globals.set_anon_key(key);
    }
    if let Some(key) = args.service_role_key {
        globals.set_service_role_key(key);
    }

    debug!("Global args: {:?}", globals);

    let backend = Backend::new(&globals).context("Failed to build backend client")?;

    let config = ServerConfig::new()
        .with_static_dir(args.static_dir)
        .with_secure_cookies(args.secure_cookies)
        .with_currency(args.currency);

    let result = api::new(args.port, backend, config).await;

    telemetry::shutdown_tracer();

    result
}
