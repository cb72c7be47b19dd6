use chrono::NaiveDate;
use lexbridge_core::{DateRange, Profile, DEFAULT_PROCESSOR_NAME};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INPUT_FILE: &str = "import.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration(msg.into())
}

/// Raw environment, optionally seeded from `.env`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvConfig {
    pub stripe_key: Option<String>,
    pub stripe_name: Option<String>,
    pub aggregate_fees: Option<bool>,
    pub source_method: Option<String>,
    pub profile: Option<String>,
    pub input_file: Option<PathBuf>,
    pub http_timeout_secs: Option<u64>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        envy::from_env::<Self>().map_err(|e| invalid(format!("invalid environment variables: {e}")))
    }
}

/// Command-line values; each one beats its environment counterpart.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source: Option<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub profile: Option<String>,
    pub profile_file: Option<PathBuf>,
    pub aggregate_fees: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMethod {
    Csv,
    Api,
}

impl SourceMethod {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        match text.to_ascii_uppercase().as_str() {
            "CSV" => Ok(SourceMethod::Csv),
            "API" => Ok(SourceMethod::Api),
            _ => Err(invalid(format!("unknown source method '{text}' (expected CSV or API)"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Csv { input: PathBuf },
    Api { range: DateRange },
}

impl Source {
    pub fn default_output(&self) -> PathBuf {
        match self {
            Source::Csv { .. } => PathBuf::from("export.csv"),
            Source::Api { range } => PathBuf::from(format!("export_{}_{}.csv", range.start, range.end)),
        }
    }
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Source,
    pub output: PathBuf,
    pub profile: Profile,
    pub stripe_key: Option<String>,
    pub fallback_name: String,
    pub timeout: Duration,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn load_profile(name: Option<&str>, file: Option<&Path>) -> Result<Profile, ConfigError> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("cannot read profile file {}: {e}", path.display())))?;
        return Profile::from_toml(&content).map_err(|e| invalid(e.to_string()));
    }
    Profile::preset(name.unwrap_or(Profile::DEFAULT)).map_err(|e| invalid(e.to_string()))
}

impl Settings {
    pub fn resolve(env: EnvConfig, cli: Overrides) -> Result<Self, ConfigError> {
        let method = match cli.source.as_deref().or(env.source_method.as_deref()) {
            Some(text) => SourceMethod::parse(text)?,
            None => SourceMethod::Csv,
        };
        let stripe_key = non_blank(env.stripe_key);

        let source = match method {
            SourceMethod::Csv => Source::Csv {
                input: cli
                    .input
                    .or(env.input_file)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE)),
            },
            SourceMethod::Api => {
                if stripe_key.is_none() {
                    return Err(invalid("the API source method needs STRIPE_KEY"));
                }
                let (Some(start), Some(end)) = (cli.start_date, cli.end_date) else {
                    return Err(invalid("the API source method needs --start-date and --end-date"));
                };
                let range = DateRange::new(start, end)
                    .ok_or_else(|| invalid(format!("end date {end} is before start date {start}")))?;
                Source::Api { range }
            }
        };

        let profile = load_profile(
            cli.profile.as_deref().or(env.profile.as_deref()),
            cli.profile_file.as_deref(),
        )?
        .with_aggregation(cli.aggregate_fees.or(env.aggregate_fees));

        let timeout_secs = env.http_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(invalid("HTTP_TIMEOUT_SECS must be positive"));
        }

        let output = cli.output.unwrap_or_else(|| source.default_output());

        Ok(Settings {
            source,
            output,
            profile,
            stripe_key,
            fallback_name: non_blank(env.stripe_name).unwrap_or_else(|| DEFAULT_PROCESSOR_NAME.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbridge_core::{FeeScheme, NumberStyle};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn api_env() -> EnvConfig {
        EnvConfig {
            stripe_key: Some("sk_test_123".into()),
            source_method: Some("api".into()),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn defaults_to_csv_and_default_profile() {
        let s = Settings::resolve(EnvConfig::default(), Overrides::default()).unwrap();
        assert_eq!(s.source, Source::Csv { input: PathBuf::from("import.csv") });
        assert_eq!(s.output, PathBuf::from("export.csv"));
        assert_eq!(s.profile.name, Profile::DEFAULT);
        assert!(!s.profile.aggregate_fees);
        assert_eq!(s.fallback_name, DEFAULT_PROCESSOR_NAME);
        assert_eq!(s.timeout, Duration::from_secs(10));
        assert_eq!(s.stripe_key, None);
    }

    #[test]
    fn source_method_is_case_insensitive() {
        assert_eq!(SourceMethod::parse("csv").unwrap(), SourceMethod::Csv);
        assert_eq!(SourceMethod::parse(" Api ").unwrap(), SourceMethod::Api);
    }

    #[test]
    fn unknown_source_method_is_rejected() {
        let env = EnvConfig {
            source_method: Some("ftp".into()),
            ..EnvConfig::default()
        };
        let err = Settings::resolve(env, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("unknown source method 'ftp'"));
    }

    #[test]
    fn api_without_dates_is_rejected() {
        let cli = Overrides {
            start_date: Some(date("2024-01-01")),
            ..Overrides::default()
        };
        let err = Settings::resolve(api_env(), cli).unwrap_err();
        assert!(err.to_string().contains("--end-date"));
    }

    #[test]
    fn api_with_end_before_start_is_rejected() {
        let cli = Overrides {
            start_date: Some(date("2024-02-01")),
            end_date: Some(date("2024-01-01")),
            ..Overrides::default()
        };
        assert!(Settings::resolve(api_env(), cli).is_err());
    }

    #[test]
    fn api_without_key_is_rejected() {
        let env = EnvConfig {
            stripe_key: Some("   ".into()),
            ..api_env()
        };
        let cli = Overrides {
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2024-01-31")),
            ..Overrides::default()
        };
        let err = Settings::resolve(env, cli).unwrap_err();
        assert!(err.to_string().contains("STRIPE_KEY"));
    }

    #[test]
    fn api_output_is_named_after_range() {
        let cli = Overrides {
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2024-01-31")),
            ..Overrides::default()
        };
        let s = Settings::resolve(api_env(), cli).unwrap();
        assert_eq!(s.output, PathBuf::from("export_2024-01-01_2024-01-31.csv"));
        assert!(matches!(s.source, Source::Api { .. }));
    }

    #[test]
    fn cli_beats_environment() {
        let env = EnvConfig {
            source_method: Some("API".into()),
            profile: Some("raw".into()),
            aggregate_fees: Some(false),
            input_file: Some("env.csv".into()),
            ..EnvConfig::default()
        };
        let cli = Overrides {
            source: Some("csv".into()),
            input: Some("cli.csv".into()),
            output: Some("out/ledger.csv".into()),
            profile: Some("lexoffice-monthly".into()),
            aggregate_fees: Some(true),
            ..Overrides::default()
        };
        let s = Settings::resolve(env, cli).unwrap();
        assert_eq!(s.source, Source::Csv { input: PathBuf::from("cli.csv") });
        assert_eq!(s.output, PathBuf::from("out/ledger.csv"));
        assert_eq!(s.profile.fee_scheme, FeeScheme::Monthly);
        assert!(s.profile.aggregate_fees);
    }

    #[test]
    fn aggregation_flag_overrides_profile_default() {
        let env = EnvConfig {
            profile: Some("lexoffice-pooled".into()),
            aggregate_fees: Some(false),
            ..EnvConfig::default()
        };
        let s = Settings::resolve(env, Overrides::default()).unwrap();
        assert_eq!(s.profile.fee_scheme, FeeScheme::Pooled);
        assert!(!s.profile.aggregate_fees);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let env = EnvConfig {
            profile: Some("datev".into()),
            ..EnvConfig::default()
        };
        assert!(matches!(
            Settings::resolve(env, Overrides::default()),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn profile_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(
            &path,
            "name = \"custom\"\ncolumns = \"lexoffice\"\nnumbers = \"localized\"\naggregate-fees = true\nfee-scheme = \"monthly\"\ndescriptions = \"templated\"\n",
        )
        .unwrap();
        let cli = Overrides {
            profile_file: Some(path),
            ..Overrides::default()
        };
        let s = Settings::resolve(EnvConfig::default(), cli).unwrap();
        assert_eq!(s.profile.name, "custom");
        assert_eq!(s.profile.numbers, NumberStyle::Localized);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let env = EnvConfig {
            http_timeout_secs: Some(0),
            ..EnvConfig::default()
        };
        assert!(Settings::resolve(env, Overrides::default()).is_err());
    }

    #[test]
    fn custom_fallback_name() {
        let env = EnvConfig {
            stripe_name: Some("Stripe Payments Europe".into()),
            ..EnvConfig::default()
        };
        let s = Settings::resolve(env, Overrides::default()).unwrap();
        assert_eq!(s.fallback_name, "Stripe Payments Europe");
    }
}
