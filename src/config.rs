//! Configuration - command line and environment
//!
//! TigerStyle: parse once at startup, validate everything, hand the rest of
//! the program a plain [`AppConfig`].

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use weave_core::IdStrategy;

use crate::{APP_NAME, HTTP_BIND_ADDRESS_DEFAULT, REQUEST_TIMEOUT_MS_DEFAULT, REQUEST_TIMEOUT_MS_MAX};

/// Environment variable consulted when `--database-url` is absent.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

// =============================================================================
// CLI
// =============================================================================

/// Users/posts/comments GraphQL demos
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Users/posts/comments GraphQL demos on the weave resolution engine")]
#[command(version)]
pub struct Cli {
    /// HTTP bind address
    #[arg(short, long, global = true, default_value = HTTP_BIND_ADDRESS_DEFAULT)]
    pub bind: String,

    /// Schema configuration to serve
    #[arg(long, global = true, value_enum, default_value_t = SchemaVariant::Basics)]
    pub variant: SchemaVariant,

    /// Postgres URL for the nexus variant (falls back to DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Per-request deadline in milliseconds
    #[arg(long, global = true, default_value_t = REQUEST_TIMEOUT_MS_DEFAULT)]
    pub request_timeout_ms: u64,

    /// Start with an empty store
    #[arg(long, global = true)]
    pub no_seed: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to do once configured.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the GraphQL endpoint (default)
    Serve,

    /// Print the selected schema as SDL
    Schema,

    /// Run one document against a freshly seeded in-memory store
    Exec {
        /// Document file, or `-` for stdin
        #[arg(short, long)]
        query: String,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// Operation to run when the document has several
        #[arg(long)]
        operation_name: Option<String>,
    },
}

impl Cli {
    /// The subcommand, defaulting to [`Command::Serve`].
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

// =============================================================================
// Schema Variant
// =============================================================================

/// The two schema configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaVariant {
    /// Mock store, string identifiers
    Basics,
    /// ORM-style store, integer identifiers
    Nexus,
}

impl SchemaVariant {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basics => "basics",
            Self::Nexus => "nexus",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basics" => Some(Self::Basics),
            "nexus" => Some(Self::Nexus),
            _ => None,
        }
    }

    /// How the in-memory store mints identifiers for this variant.
    #[must_use]
    pub fn id_strategy(&self) -> IdStrategy {
        match self {
            Self::Basics => IdStrategy::Uuid,
            Self::Nexus => IdStrategy::Sequential,
        }
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `--bind` is not a socket address.
    #[error("invalid bind address {value}: {reason}")]
    InvalidBind {
        /// Supplied value
        value: String,
        /// Parser message
        reason: String,
    },

    /// A database URL was given for a variant without a database.
    #[error("--database-url only applies to the nexus variant, not {0}")]
    DatabaseUrlUnsupported(SchemaVariant),

    /// A database URL was given but the binary has no Postgres support.
    #[error("--database-url requires building with the `postgres` feature")]
    PostgresDisabled,

    /// The URL is not a Postgres URL.
    #[error("database url must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    /// Timeout outside `1..=REQUEST_TIMEOUT_MS_MAX`.
    #[error("request timeout must be between 1 and {max} ms, got {value}")]
    InvalidTimeout {
        /// Supplied value
        value: u64,
        /// Upper bound
        max: u64,
    },
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Schema configuration
    pub variant: SchemaVariant,
    /// Postgres URL (nexus only)
    pub database_url: Option<String>,
    /// Per-request deadline
    pub request_timeout: Duration,
    /// Load demo data into an empty store
    pub seed: bool,
}

impl AppConfig {
    /// Resolve the command line against the process environment.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, std::env::var(DATABASE_URL_ENV).ok())
    }

    /// Resolve the command line with an explicit `DATABASE_URL` value.
    pub fn resolve(cli: &Cli, env_database_url: Option<String>) -> Result<Self, ConfigError> {
        let bind = cli
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBind {
                value: cli.bind.clone(),
                reason: e.to_string(),
            })?;

        if cli.request_timeout_ms == 0 || cli.request_timeout_ms > REQUEST_TIMEOUT_MS_MAX {
            return Err(ConfigError::InvalidTimeout {
                value: cli.request_timeout_ms,
                max: REQUEST_TIMEOUT_MS_MAX,
            });
        }

        let database_url = match (cli.variant, cli.database_url.clone()) {
            (SchemaVariant::Basics, Some(_)) => {
                return Err(ConfigError::DatabaseUrlUnsupported(cli.variant));
            }
            (SchemaVariant::Basics, None) => None,
            (SchemaVariant::Nexus, Some(url)) => Some(url),
            (SchemaVariant::Nexus, None) => env_database_url.filter(|url| !url.is_empty()),
        };

        if let Some(url) = &database_url {
            if !cfg!(feature = "postgres") {
                return Err(ConfigError::PostgresDisabled);
            }
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::InvalidDatabaseUrl);
            }
        }

        Ok(Self {
            bind,
            variant: cli.variant,
            database_url,
            request_timeout: Duration::from_millis(cli.request_timeout_ms),
            seed: !cli.no_seed,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once(APP_NAME).chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(cli.command(), Command::Serve);
        assert_eq!(config.bind, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.variant, SchemaVariant::Basics);
        assert_eq!(config.database_url, None);
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert!(config.seed);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["schema", "--variant", "nexus", "-vv"]);

        assert_eq!(cli.command(), Command::Schema);
        assert_eq!(cli.variant, SchemaVariant::Nexus);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_exec_arguments() {
        let cli = parse(&["exec", "--query", "-", "--operation-name", "Q"]);

        assert_eq!(
            cli.command(),
            Command::Exec {
                query: "-".into(),
                variables: None,
                operation_name: Some("Q".into()),
            }
        );
    }

    #[test]
    fn test_invalid_bind() {
        let cli = parse(&["--bind", "not-an-address"]);
        let err = AppConfig::resolve(&cli, None).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidBind { .. }));
    }

    #[test]
    fn test_invalid_timeout() {
        let cli = parse(&["--request-timeout-ms", "0"]);

        assert!(matches!(
            AppConfig::resolve(&cli, None),
            Err(ConfigError::InvalidTimeout { value: 0, .. })
        ));
    }

    #[test]
    fn test_database_url_rejected_for_basics() {
        let cli = parse(&["--database-url", "postgres://localhost/demos"]);

        assert_eq!(
            AppConfig::resolve(&cli, None),
            Err(ConfigError::DatabaseUrlUnsupported(SchemaVariant::Basics))
        );
    }

    #[test]
    fn test_env_database_url_ignored_for_basics() {
        let cli = parse(&[]);
        let config = AppConfig::resolve(&cli, Some("postgres://localhost/demos".into())).unwrap();

        assert_eq!(config.database_url, None);
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_database_url_requires_feature() {
        let cli = parse(&["--variant", "nexus"]);

        assert_eq!(
            AppConfig::resolve(&cli, Some("postgres://localhost/demos".into())),
            Err(ConfigError::PostgresDisabled)
        );
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_database_url_from_env() {
        let cli = parse(&["--variant", "nexus"]);
        let config = AppConfig::resolve(&cli, Some("postgres://localhost/demos".into())).unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/demos"));

        let cli = parse(&["--variant", "nexus", "--database-url", "mysql://x"]);
        assert_eq!(
            AppConfig::resolve(&cli, None),
            Err(ConfigError::InvalidDatabaseUrl)
        );
    }

    #[test]
    fn test_variant_strings() {
        assert_eq!(SchemaVariant::from_str("NEXUS"), Some(SchemaVariant::Nexus));
        assert_eq!(SchemaVariant::from_str("prisma"), None);
        assert_eq!(SchemaVariant::Basics.to_string(), "basics");
        assert_eq!(SchemaVariant::Basics.id_strategy(), IdStrategy::Uuid);
        assert_eq!(SchemaVariant::Nexus.id_strategy(), IdStrategy::Sequential);
    }
}
