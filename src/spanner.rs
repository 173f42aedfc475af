use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::{Code, Status};
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::key::Key;
use gcloud_spanner::mutation::{delete, insert_or_update};
use gcloud_spanner::statement::Statement;
use gcloud_spanner::transaction_ro::ReadOnlyTransaction;
use gcloud_spanner::value::{CommitTimestamp, TimestampBound};
use std::sync::Arc;
use std::time::Duration;

use crate::blob_store::{BlobStore, Consistency};
use crate::config::SpannerSettings;

const BLOBS_TABLE: &str = "blobs";

/// Staleness accepted for [`Consistency::Eventual`] reads.
const EVENTUAL_MAX_STALENESS_SECS: u64 = 15;

/// Blob store backed by a single Spanner table.
///
/// Every row is keyed by `(store_name, blob_key)` so several logical stores
/// can share one database.
#[derive(Clone)]
pub struct SpannerBlobStore {
    inner: Arc<Client>,
    store_name: String,
}

impl SpannerBlobStore {
    /// Connect to Spanner, provisioning the instance, database and table
    /// first if they do not exist yet.
    ///
    /// The gcloud-spanner library automatically detects the
    /// SPANNER_EMULATOR_HOST environment variable and connects to
    /// the emulator when set, or production Spanner otherwise.
    pub async fn connect(settings: &SpannerSettings, store_name: &str) -> Result<Self> {
        auto_provision(settings).await?;

        let database_path = settings.database_path();

        match &settings.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {} (store: {})",
            database_path,
            store_name
        );

        Ok(Self {
            inner: Arc::new(client),
            store_name: store_name.to_string(),
        })
    }

    async fn read_transaction(&self, consistency: Consistency) -> Result<ReadOnlyTransaction> {
        let tx = match consistency {
            Consistency::Strong => self.inner.single().await,
            Consistency::Eventual => {
                let bound = TimestampBound::max_staleness(Duration::from_secs(
                    EVENTUAL_MAX_STALENESS_SECS,
                ));
                self.inner.single_with_timestamp_bound(bound).await
            }
        };
        tx.context("Failed to create read transaction")
    }
}

#[async_trait]
impl BlobStore for SpannerBlobStore {
    async fn get(&self, key: &str, consistency: Consistency) -> Result<Option<String>> {
        let mut statement = Statement::new(
            "SELECT value FROM blobs WHERE store_name = @store_name AND blob_key = @blob_key",
        );
        statement.add_param("store_name", &self.store_name);
        statement.add_param("blob_key", &key.to_string());

        let mut tx = self.read_transaction(consistency).await?;
        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query blob from Spanner")?;

        if let Some(row) = result_set.next().await? {
            let value: String = row.column_by_name("value")?;
            tracing::debug!("Read blob: {}", key);
            Ok(Some(value))
        } else {
            tracing::debug!("Blob not found: {}", key);
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let blob_key = key.to_string();
        let mutation = insert_or_update(
            BLOBS_TABLE,
            &["store_name", "blob_key", "value", "updated_at"],
            &[&self.store_name, &blob_key, &value, &CommitTimestamp::new()],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to write blob to Spanner")?;

        tracing::debug!("Stored blob: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let blob_key = key.to_string();
        let mutation = delete(BLOBS_TABLE, Key::composite(&[&self.store_name, &blob_key]));

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to delete blob from Spanner")?;

        tracing::debug!("Deleted blob: {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut statement = Statement::new(
            "SELECT blob_key FROM blobs \
             WHERE store_name = @store_name AND STARTS_WITH(blob_key, @prefix) \
             ORDER BY blob_key",
        );
        statement.add_param("store_name", &self.store_name);
        statement.add_param("prefix", &prefix.to_string());

        let mut tx = self.read_transaction(Consistency::Strong).await?;
        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to list blobs from Spanner")?;

        let mut keys = Vec::new();
        while let Some(row) = result_set.next().await? {
            keys.push(row.column_by_name::<String>("blob_key")?);
        }

        tracing::debug!("Listed {} blobs with prefix {:?}", keys.len(), prefix);
        Ok(keys)
    }

    /// Execute a lightweight `SELECT 1` to verify the connection.
    async fn health_check(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set.next().await?.is_some() {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

const BLOBS_TABLE_DDL: &str = "CREATE TABLE blobs (
    store_name STRING(MAX) NOT NULL,
    blob_key STRING(MAX) NOT NULL,
    value STRING(MAX) NOT NULL,
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (store_name, blob_key)";

/// Make sure the instance, database and `blobs` table exist.
///
/// A freshly created database gets the table in the same operation; an
/// existing one is checked through its DDL.
async fn auto_provision(settings: &SpannerSettings) -> Result<()> {
    tracing::info!("Starting auto-provisioning checks...");

    let admin = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let instance_path = settings.instance_path();
    let lookup = admin
        .instance()
        .get_instance(GetInstanceRequest { name: instance_path.clone(), field_mask: None }, None)
        .await;
    if !resource_exists("instance", &instance_path, lookup)? {
        create_instance(&admin, settings).await?;
    }

    let database_path = settings.database_path();
    let lookup = admin
        .database()
        .get_database(GetDatabaseRequest { name: database_path.clone() }, None)
        .await;
    if resource_exists("database", &database_path, lookup)? {
        ensure_blobs_table(&admin, &database_path).await?;
    } else {
        create_database_with_blobs_table(&admin, settings).await?;
    }

    tracing::info!("Auto-provisioning complete");
    Ok(())
}

/// Interpret an admin lookup: found, missing, or a real failure.
fn resource_exists<T>(kind: &str, path: &str, lookup: std::result::Result<T, Status>) -> Result<bool> {
    match lookup {
        Ok(_) => {
            tracing::info!("Spanner {} already exists: {}", kind, path);
            Ok(true)
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Spanner {} not found, creating: {}", kind, path);
            Ok(false)
        }
        Err(status) => Err(anyhow::anyhow!(
            "Failed to check {} {}: {}",
            kind,
            path,
            status.message()
        )),
    }
}

async fn create_instance(admin: &AdminClient, settings: &SpannerSettings) -> Result<()> {
    let request = CreateInstanceRequest {
        parent: settings.project_path(),
        instance_id: settings.instance.clone(),
        instance: Some(Instance {
            name: settings.instance_path(),
            config: settings.instance_config(),
            display_name: format!("{} blob store", settings.instance),
            node_count: 1,
            ..Default::default()
        }),
    };

    admin
        .instance()
        .create_instance(request, None)
        .await
        .context("Failed to start instance creation")?
        .wait(None)
        .await
        .context("Failed to create instance")?;

    tracing::info!("Instance created: {}", settings.instance_path());
    Ok(())
}

async fn create_database_with_blobs_table(admin: &AdminClient, settings: &SpannerSettings) -> Result<()> {
    let request = CreateDatabaseRequest {
        parent: settings.instance_path(),
        create_statement: format!("CREATE DATABASE `{}`", settings.database),
        extra_statements: vec![BLOBS_TABLE_DDL.to_string()],
        encryption_config: None,
        database_dialect: 1, // Google Standard SQL
        proto_descriptors: vec![],
    };

    admin
        .database()
        .create_database(request, None)
        .await
        .context("Failed to start database creation")?
        .wait(None)
        .await
        .context("Failed to create database")?;

    tracing::info!("Database created with table 'blobs': {}", settings.database_path());
    Ok(())
}

fn has_blobs_table(statements: &[String]) -> bool {
    statements
        .iter()
        .any(|stmt| stmt.contains("CREATE TABLE blobs") || stmt.contains("CREATE TABLE `blobs`"))
}

async fn ensure_blobs_table(admin: &AdminClient, database_path: &str) -> Result<()> {
    let ddl = admin
        .database()
        .get_database_ddl(GetDatabaseDdlRequest { database: database_path.to_string() }, None)
        .await
        .context("Failed to get database DDL")?
        .into_inner();

    if has_blobs_table(&ddl.statements) {
        tracing::info!("Table 'blobs' already exists");
        return Ok(());
    }

    let request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements: vec![BLOBS_TABLE_DDL.to_string()],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    admin
        .database()
        .update_database_ddl(request, None)
        .await
        .context("Failed to start table creation")?
        .wait(None)
        .await
        .context("Failed to create table")?;

    tracing::info!("Table 'blobs' created");
    Ok(())
}
