use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;

use crate::aws::{AwsSecretStore, StoreSettings};
use crate::envfile::ENV_FILE_NAME;
use crate::error::{EnvsyncError, Result};
use crate::sync::{self, PublishMode};

/// Usage lines shown when an unknown command is given.
pub const COMMANDS: &[&str] = &[
    "env-get <secret-name> <region>",
    "env-set <secret-name> <region> <env-file-path>",
    "env-create <secret-name> <region> <env-file-path>",
    "create <secret-name> <region> <key> <value>",
    "update <secret-name> <region> <key> <value>",
    "apikey <create|update> <secret-name> <region> <key-name> <length>",
    "--version, -v",
];

#[derive(Debug, Parser)]
#[command(
    name = "envsync",
    version,
    disable_version_flag = true,
    about = "Sync .env files with AWS Secrets Manager"
)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// AWS shared-config profile to use
    #[arg(long, global = true, env = "ENVSYNC_PROFILE")]
    profile: Option<String>,

    /// Custom Secrets Manager endpoint (e.g. a local emulator)
    #[arg(long, global = true, env = "ENVSYNC_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Overwrite ./.env with the key/value pairs of a secret
    EnvGet { secret_name: String, region: String },
    /// Merge an env file into an existing secret (file values win)
    EnvSet { secret_name: String, region: String, env_file: PathBuf },
    /// Create a new secret from an env file
    EnvCreate { secret_name: String, region: String, env_file: PathBuf },
    /// Create a new secret holding one key/value pair
    Create {
        secret_name: String,
        region: String,
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Set one key/value pair in an existing secret
    Update {
        secret_name: String,
        region: String,
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Generate an API key and store it in a secret
    Apikey {
        #[arg(value_enum)]
        mode: ApiKeyMode,
        secret_name: String,
        region: String,
        key_name: String,
        /// Number of characters, 32 to 4096
        length: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ApiKeyMode {
    /// Create a new secret
    Create,
    /// Upsert into an existing secret
    Update,
}

impl From<ApiKeyMode> for PublishMode {
    fn from(mode: ApiKeyMode) -> Self {
        match mode {
            ApiKeyMode::Create => PublishMode::Create,
            ApiKeyMode::Update => PublishMode::Update,
        }
    }
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Runs the parsed command against Secrets Manager.
pub fn execute(cli: Cli) -> Result<()> {
    let Cli { profile, endpoint_url, command, .. } = cli;
    let connect = |region: String| {
        AwsSecretStore::new(StoreSettings {
            region,
            profile: profile.clone(),
            endpoint_url: endpoint_url.clone(),
        })
    };

    match command {
        Commands::EnvGet { secret_name, region } => cmd_env_get(&connect(region)?, &secret_name),
        Commands::EnvSet { secret_name, region, env_file } => {
            cmd_env_set(&connect(region)?, &secret_name, &env_file)
        }
        Commands::EnvCreate { secret_name, region, env_file } => {
            cmd_env_create(&connect(region)?, &secret_name, &env_file)
        }
        Commands::Create { secret_name, region, key, value } => {
            sync::create_pair(&connect(region)?, &secret_name, &key, &value)?;
            println!("✓ Created secret {secret_name} with {key}");
            Ok(())
        }
        Commands::Update { secret_name, region, key, value } => {
            sync::upsert_pair(&connect(region)?, &secret_name, &key, &value)?;
            println!("✓ Set {key} in {secret_name}");
            Ok(())
        }
        Commands::Apikey { mode, secret_name, region, key_name, length } => {
            cmd_apikey(&connect(region)?, mode.into(), &secret_name, &key_name, length)
        }
    }
}

/// Parses arguments, mapping clap failures onto exit-code-1 errors. Help and
/// version output still exit 0 through clap.
pub fn parse_args<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        ErrorKind::InvalidSubcommand => Err(EnvsyncError::UnknownCommand),
        _ => Err(EnvsyncError::Usage(err.render().to_string())),
    })
}

fn cmd_env_get(store: &AwsSecretStore, secret_name: &str) -> Result<()> {
    let dest = env::current_dir()?.join(ENV_FILE_NAME);
    let written = sync::pull_to_file(store, secret_name, &dest)?;

    println!("✓ Wrote {written} key{} from {secret_name} to {}", plural(written), dest.display());
    Ok(())
}

fn cmd_env_set(store: &AwsSecretStore, secret_name: &str, env_file: &Path) -> Result<()> {
    let keys = sync::push_merge_from_file(store, secret_name, env_file)?;

    for key in &keys {
        println!("  updated {key}");
    }
    println!(
        "✓ Merged {} key{} into {secret_name} ({})",
        keys.len(),
        plural(keys.len()),
        store.region()
    );
    Ok(())
}

fn cmd_env_create(store: &AwsSecretStore, secret_name: &str, env_file: &Path) -> Result<()> {
    let keys = sync::push_create_from_file(store, secret_name, env_file)?;

    for key in &keys {
        println!("  added {key}");
    }
    println!(
        "✓ Created secret {secret_name} with {} key{} ({})",
        keys.len(),
        plural(keys.len()),
        store.region()
    );
    Ok(())
}

fn cmd_apikey(
    store: &AwsSecretStore,
    mode: PublishMode,
    secret_name: &str,
    key_name: &str,
    length: usize,
) -> Result<()> {
    let published = sync::generate_and_publish(store, secret_name, key_name, length, mode)?;

    let verb = match published.mode {
        PublishMode::Create => "Created secret",
        PublishMode::Update => "Updated secret",
    };
    println!("✓ {verb} {secret_name} with {key_name}");
    println!("{}", published.value.expose_secret());
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command_shape() {
        let cli = parse_args(["envsync", "env-get", "app", "us-east-1"]).expect("env-get");
        assert!(matches!(cli.command, Commands::EnvGet { .. }));

        let cli = parse_args(["envsync", "env-set", "app", "us-east-1", ".env"]).expect("env-set");
        assert!(matches!(cli.command, Commands::EnvSet { .. }));

        let cli =
            parse_args(["envsync", "env-create", "app", "us-east-1", ".env"]).expect("env-create");
        assert!(matches!(cli.command, Commands::EnvCreate { .. }));

        let cli = parse_args(["envsync", "update", "app", "us-east-1", "K", "-v"]).expect("update");
        assert!(matches!(cli.command, Commands::Update { ref value, .. } if value == "-v"));

        let cli = parse_args(["envsync", "apikey", "update", "app", "us-east-1", "API_KEY", "48"])
            .expect("apikey");
        match cli.command {
            Commands::Apikey { mode, length, .. } => {
                assert!(matches!(mode, ApiKeyMode::Update));
                assert_eq!(length, 48);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn wrong_argument_count_is_a_usage_error() {
        let err = parse_args(["envsync", "env-get", "app"]).expect_err("must fail");
        assert!(matches!(&err, EnvsyncError::Usage(text) if text.contains("Usage:")));

        let err =
            parse_args(["envsync", "env-get", "app", "us-east-1", "extra"]).expect_err("must fail");
        assert!(matches!(err, EnvsyncError::Usage(_)));

        let err =
            parse_args(["envsync", "create", "app", "us-east-1", "K"]).expect_err("must fail");
        assert!(matches!(err, EnvsyncError::Usage(_)));
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = parse_args(["envsync", "frobnicate"]).expect_err("must fail");
        assert!(matches!(err, EnvsyncError::UnknownCommand));
    }

    #[test]
    fn invalid_apikey_mode_or_length_is_a_usage_error() {
        let err = parse_args(["envsync", "apikey", "rotate", "app", "us-east-1", "K", "32"])
            .expect_err("must fail");
        assert!(matches!(err, EnvsyncError::Usage(_)));

        let err = parse_args(["envsync", "apikey", "create", "app", "us-east-1", "K", "many"])
            .expect_err("must fail");
        assert!(matches!(err, EnvsyncError::Usage(_)));
    }

    #[test]
    fn global_options_reach_settings() {
        let cli = parse_args([
            "envsync",
            "--profile",
            "staging",
            "env-get",
            "app",
            "eu-west-1",
            "--endpoint-url",
            "http://localhost:4566",
        ])
        .expect("parse");

        assert_eq!(cli.profile.as_deref(), Some("staging"));
        assert_eq!(cli.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert!(!cli.verbose());

        let cli = parse_args(["envsync", "env-get", "app", "eu-west-1", "--verbose"])
            .expect("parse");
        assert!(cli.verbose());
    }
}
