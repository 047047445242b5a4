use anyhow::Result;
use sea_orm::DatabaseConnection;
use sqlx::PgPool;

use crate::{
    migration,
    repository::{ClusterRepository, IdentityClusterRepository},
};

/// Name the version table is scoped to when the caller doesn't pick one.
pub const DEFAULT_DATABASE_NAME: &str = "cluster";

#[derive(Clone)]
pub struct DbApi {
    pub conn: DatabaseConnection,
    pub pool: Option<PgPool>,
}

async fn connect_db(conn_url: &str) -> Result<sqlx::PgPool> {
    let pool: sqlx::PgPool = sqlx::pool::PoolOptions::new()
        .max_connections(100)
        .connect(conn_url)
        .await?;
    Ok(pool)
}

impl DbApi {
    /// Connects to postgres and, unless `no_migration` is set, brings the
    /// schema of `database_name` up to date before handing out repositories.
    pub async fn new(conn_url: &str, database_name: &str, no_migration: bool) -> Result<Self> {
        let pool = connect_db(conn_url).await?;
        let conn = sea_orm::SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
        let db = DbApi {
            conn,
            pool: Some(pool),
        };
        if !no_migration {
            db.migrate(database_name).await?;
        }
        Ok(db)
    }

    pub async fn migrate(&self, database_name: &str) -> Result<()> {
        migration::migrate(&self.conn, database_name, &migration::steps()).await?;
        Ok(())
    }

    /// Index of the last step applied to `database_name`, `-1` if none.
    pub async fn current_version(&self, database_name: &str) -> Result<i64> {
        Ok(migration::current_version(&self.conn, database_name).await?)
    }

    pub fn clusters(&self) -> ClusterRepository {
        ClusterRepository::new(self.conn.clone())
    }

    pub fn identity_clusters(&self) -> IdentityClusterRepository {
        IdentityClusterRepository::new(self.conn.clone())
    }
}
