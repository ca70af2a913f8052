//! AWS Secrets Manager backend.
//!
//! Credentials come from the default provider chain (environment, shared
//! profile, SSO, instance metadata). The SDK is async; every call is driven to
//! completion on a private current-thread runtime so the rest of the crate
//! stays blocking.

use std::fmt;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::error::{EnvsyncError, Result};
use crate::store::SecretStore;

/// Where and as whom to reach Secrets Manager.
#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    pub region: String,
    /// Named profile from the shared AWS config files.
    pub profile: Option<String>,
    /// Overrides the service endpoint, e.g. for LocalStack.
    pub endpoint_url: Option<String>,
}

impl StoreSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self { region: region.into(), ..Self::default() }
    }
}

pub struct AwsSecretStore {
    settings: StoreSettings,
    runtime: Runtime,
    // Built on first use; every caller sees the same client or the same failure.
    client: OnceCell<std::result::Result<Client, String>>,
}

impl fmt::Debug for AwsSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSecretStore")
            .field("settings", &self.settings)
            .field("initialized", &self.client.get().is_some())
            .finish()
    }
}

impl AwsSecretStore {
    /// Prepares the runtime. No network or credential lookup happens until the
    /// first secret operation.
    pub fn new(settings: StoreSettings) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| EnvsyncError::Config(format!("failed to create runtime: {err}")))?;

        Ok(Self { settings, runtime, client: OnceCell::new() })
    }

    pub fn region(&self) -> &str {
        &self.settings.region
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .get_or_init(|| self.load_client())
            .as_ref()
            .map_err(|reason| EnvsyncError::Config(reason.clone()))
    }

    fn load_client(&self) -> std::result::Result<Client, String> {
        let region = self.settings.region.trim();
        if region.is_empty() {
            return Err("region must not be empty".to_string());
        }

        debug!(
            region,
            profile = self.settings.profile.as_deref(),
            endpoint = self.settings.endpoint_url.as_deref(),
            "loading AWS config"
        );

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = &self.settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &self.settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = self.runtime.block_on(loader.load());
        Ok(Client::new(&config))
    }
}

impl SecretStore for AwsSecretStore {
    fn get_secret(&self, name: &str) -> Result<String> {
        let client = self.client()?;
        debug!(secret = name, "fetching secret");

        let output = self
            .runtime
            .block_on(client.get_secret_value().secret_id(name).send())
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_resource_not_found_exception()) {
                    return EnvsyncError::NotFound(name.to_string());
                }
                if is_transport_failure(&err) {
                    return EnvsyncError::Config(DisplayErrorContext(&err).to_string());
                }
                EnvsyncError::RemoteRead {
                    name: name.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                }
            })?;

        // Binary secrets carry no string payload and can never hold a mapping.
        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| EnvsyncError::IncompatibleFormat(name.to_string()))
    }

    fn create_secret(&self, name: &str, blob: &str) -> Result<()> {
        let client = self.client()?;
        debug!(secret = name, "creating secret");

        self.runtime
            .block_on(client.create_secret().name(name).secret_string(blob).send())
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_resource_exists_exception()) {
                    return EnvsyncError::RemoteWrite {
                        name: name.to_string(),
                        reason: "a secret with this name already exists".to_string(),
                    };
                }
                write_failure(name, &err)
            })?;

        Ok(())
    }

    fn put_secret(&self, name: &str, blob: &str) -> Result<()> {
        let client = self.client()?;
        debug!(secret = name, "putting secret value");

        self.runtime
            .block_on(client.put_secret_value().secret_id(name).secret_string(blob).send())
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_resource_not_found_exception()) {
                    return EnvsyncError::NotFound(name.to_string());
                }
                write_failure(name, &err)
            })?;

        Ok(())
    }
}

fn is_transport_failure<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(
        err,
        SdkError::ConstructionFailure(_) | SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    )
}

fn write_failure<E, R>(name: &str, err: &SdkError<E, R>) -> EnvsyncError
where
    E: std::error::Error + 'static,
    R: fmt::Debug,
{
    if is_transport_failure(err) {
        return EnvsyncError::Config(DisplayErrorContext(err).to_string());
    }
    EnvsyncError::RemoteWrite {
        name: name.to_string(),
        reason: DisplayErrorContext(err).to_string(),
    }
}
