use std::env;
use anyhow::{bail, Context, Result};

/// Default logical store name; every blob key lives inside this namespace.
pub const DEFAULT_STORE_NAME: &str = "sunwoo-takbae-v1";

/// Which blob store implementation backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    Spanner(SpannerSettings),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannerSettings {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerSettings {
    pub fn project_path(&self) -> String {
        format!("projects/{}", self.project)
    }

    pub fn instance_path(&self) -> String {
        format!("{}/instances/{}", self.project_path(), self.instance)
    }

    pub fn database_path(&self) -> String {
        format!("{}/databases/{}", self.instance_path(), self.database)
    }

    /// Instance configuration used when the instance has to be created.
    pub fn instance_config(&self) -> String {
        let config = if self.emulator_host.is_some() {
            "emulator-config"
        } else {
            "regional-us-central1"
        };
        format!("{}/instanceConfigs/{}", self.project_path(), config)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BlobBackend,
    pub store_name: String,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("BLOB_BACKEND").as_deref().unwrap_or("spanner") {
            "spanner" => BlobBackend::Spanner(SpannerSettings {
                emulator_host: lookup("SPANNER_EMULATOR_HOST"),
                project: lookup("SPANNER_PROJECT")
                    .context("SPANNER_PROJECT environment variable is required")?,
                instance: lookup("SPANNER_INSTANCE")
                    .context("SPANNER_INSTANCE environment variable is required")?,
                database: lookup("SPANNER_DATABASE")
                    .context("SPANNER_DATABASE environment variable is required")?,
            }),
            "memory" => BlobBackend::Memory,
            other => bail!("BLOB_BACKEND must be 'spanner' or 'memory', got '{}'", other),
        };

        let store_name = lookup("BLOB_STORE_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string());

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = lookup("SERVICE_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string());

        Ok(Config {
            backend,
            store_name,
            service_port,
            service_host,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.backend {
            BlobBackend::Spanner(spanner) => {
                tracing::info!("  Blob backend: spanner");
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner database: {}", spanner.database_path());
            }
            BlobBackend::Memory => {
                tracing::info!("  Blob backend: memory (data is lost on restart)");
            }
        }
        tracing::info!("  Blob store name: {}", self.store_name);
        tracing::info!("  Service listening on: {}", self.bind_address());
    }
}
