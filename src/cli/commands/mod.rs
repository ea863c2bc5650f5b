pub mod backend;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_STATIC_DIR: &str = "static-dir";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";
pub const ARG_CURRENCY: &str = "currency";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("depozit")
        .about("Point of sale and inventory administration")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("DEPOZIT_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory with the prebuilt frontend bundle, served behind the route gate")
                .env("DEPOZIT_STATIC_DIR"),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark session cookies Secure (enable when served over HTTPS)")
                .env("DEPOZIT_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_CURRENCY)
                .long(ARG_CURRENCY)
                .help("Currency label printed on exported reports")
                .env("DEPOZIT_CURRENCY")
                .default_value("RON"),
        );

    let command = backend::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "depozit");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Point of sale and inventory administration".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_backend() {
        temp_env::with_vars(
            [
                ("DEPOZIT_SUPABASE_ANON_KEY", None::<&str>),
                ("DEPOZIT_SUPABASE_SERVICE_ROLE_KEY", None::<&str>),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec![
                    "depozit",
                    "--port",
                    "9090",
                    "--backend-url",
                    "https://project.supabase.co",
                    "--anon-key",
                    "anon",
                ]);

                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(9090));
                assert_eq!(
                    matches.get_one::<String>(backend::ARG_BACKEND_URL).cloned(),
                    Some("https://project.supabase.co".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(backend::ARG_ANON_KEY).cloned(),
                    Some("anon".to_string())
                );
                assert!(matches
                    .get_one::<String>(backend::ARG_SERVICE_ROLE_KEY)
                    .is_none());
                assert_eq!(
                    matches.get_one::<String>(ARG_CURRENCY).cloned(),
                    Some("RON".to_string())
                );
                assert!(!matches.get_flag(ARG_SECURE_COOKIES));
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("DEPOZIT_SUPABASE_URL", Some("https://project.supabase.co")),
                ("DEPOZIT_SUPABASE_ANON_KEY", Some("anon")),
                ("DEPOZIT_SUPABASE_SERVICE_ROLE_KEY", Some("service")),
                ("DEPOZIT_PORT", Some("443")),
                ("DEPOZIT_STATIC_DIR", Some("/srv/depozit")),
                ("DEPOZIT_SECURE_COOKIES", Some("true")),
                ("DEPOZIT_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["depozit"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>(ARG_STATIC_DIR).cloned(),
                    Some("/srv/depozit".to_string())
                );
                assert!(matches.get_flag(ARG_SECURE_COOKIES));
                assert_eq!(
                    matches.get_one::<String>(backend::ARG_SERVICE_ROLE_KEY).cloned(),
                    Some("service".to_string())
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("DEPOZIT_LOG_LEVEL", Some(level)),
                    ("DEPOZIT_SUPABASE_URL", Some("https://project.supabase.co")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["depozit"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("DEPOZIT_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "depozit".to_string(),
                    "--backend-url".to_string(),
                    "https://project.supabase.co".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
