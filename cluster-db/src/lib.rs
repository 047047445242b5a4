pub mod api;
pub mod entities;
pub mod error;
pub mod filter;
pub mod migration;
pub mod repository;

pub use entities::cluster::Model as Cluster;
pub use entities::identity_cluster::Model as IdentityCluster;
pub use error::{MigrationError, RepositoryError};
pub use filter::ClusterFilter;

pub mod tests {
    use anyhow::Result;
    use chrono::Utc;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use uuid::Uuid;

    use crate::{
        api::{DbApi, DEFAULT_DATABASE_NAME},
        entities::cluster,
    };

    /// A fresh in-memory sqlite database, not migrated.
    pub async fn connect_memory_db() -> Result<DatabaseConnection> {
        // every connection to `sqlite::memory:` is its own database
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        Ok(Database::connect(options).await?)
    }

    pub async fn prepare_db() -> Result<DbApi> {
        let conn = connect_memory_db().await?;
        let db = DbApi { conn, pool: None };
        db.migrate(DEFAULT_DATABASE_NAME).await?;
        Ok(db)
    }

    /// A cluster with random, unique values in every field.
    pub fn new_cluster() -> cluster::Model {
        let now = Utc::now().into();
        let id = Uuid::new_v4();
        cluster::Model {
            cluster_id: Uuid::nil(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            name: format!("cluster-{id}"),
            url: format!("https://api.cluster-{id}.com/"),
            console_url: format!("https://console.cluster-{id}.com/"),
            metrics_url: format!("https://metrics.cluster-{id}.com/"),
            logging_url: format!("https://logging.cluster-{id}.com/"),
            app_dns: format!("apps.cluster-{id}.com"),
            sa_token: Uuid::new_v4().to_string(),
            sa_username: Uuid::new_v4().to_string(),
            sa_token_encrypted: true,
            token_provider_id: Uuid::new_v4().to_string(),
            auth_client_id: Uuid::new_v4().to_string(),
            auth_client_secret: Uuid::new_v4().to_string(),
            auth_default_scope: Uuid::new_v4().to_string(),
            cluster_type: "OSD".to_string(),
            capacity_exhausted: false,
        }
    }

    /// Compares every field but the timestamps.
    pub fn assert_equal_clusters(expected: &cluster::Model, actual: &cluster::Model) {
        let strip = |c: &cluster::Model| cluster::Model {
            created_at: actual.created_at,
            updated_at: actual.updated_at,
            ..c.clone()
        };
        assert_eq!(strip(expected), strip(actual));
    }
}
