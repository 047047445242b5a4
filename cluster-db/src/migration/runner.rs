use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use sea_orm_migration::prelude::*;
use tracing::{debug, info};

use super::Step;
use crate::{entities::version, error::MigrationError};

/// Applies every step of `steps` past the version recorded for
/// `database_name`, one transaction per step.
///
/// Re-running with the same or a longer list only applies the new steps, and a
/// list shorter than the recorded version is a no-op. The first failing step
/// aborts the run with the version left at the last committed step.
pub async fn migrate(
    db: &DatabaseConnection,
    database_name: &str,
    steps: &[Step],
) -> Result<(), MigrationError> {
    ensure_version_table(db)
        .await
        .map_err(|source| MigrationError::Setup {
            database_name: database_name.to_string(),
            source,
        })?;

    let current = current_version(db, database_name).await?;
    let next = usize::try_from(current + 1).unwrap_or_default();
    if next >= steps.len() {
        debug!(
            "database {database_name} already at version {current}, {} steps requested",
            steps.len()
        );
        return Ok(());
    }

    for (index, step) in steps.iter().enumerate().skip(next) {
        apply_step(db, database_name, index, step).await?;
    }

    info!(
        "database {database_name} migrated from version {current} to {}",
        steps.len() - 1
    );
    Ok(())
}

/// The index of the last step applied to `database_name`, `-1` if none.
pub async fn current_version(
    db: &DatabaseConnection,
    database_name: &str,
) -> Result<i64, MigrationError> {
    read_version(db, database_name)
        .await
        .map_err(|source| MigrationError::Setup {
            database_name: database_name.to_string(),
            source,
        })
}

async fn apply_step(
    db: &DatabaseConnection,
    database_name: &str,
    index: usize,
    step: &Step,
) -> Result<(), MigrationError> {
    let step_err = |source| MigrationError::Step {
        index,
        name: step.name,
        source,
    };
    let expected = index as i64 - 1;

    let txn = db.begin().await.map_err(step_err)?;

    let found = read_version(&txn, database_name).await.map_err(step_err)?;
    if found != expected {
        return Err(MigrationError::Conflict {
            index,
            name: step.name,
            expected,
            found,
        });
    }

    {
        let manager = SchemaManager::new(&txn);
        (step.up)(&manager).await.map_err(step_err)?;
        if let Some(verify) = step.verify {
            verify(&manager)
                .await
                .map_err(|source| MigrationError::Verification {
                    index,
                    name: step.name,
                    source,
                })?;
        }
    }

    version::ActiveModel {
        database_name: ActiveValue::Set(database_name.to_string()),
        version: ActiveValue::Set(index as i64),
        updated_at: ActiveValue::Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(step_err)?;

    txn.commit().await.map_err(step_err)?;

    info!("applied migration step {index} ({}) to {database_name}", step.name);
    Ok(())
}

async fn read_version<C: ConnectionTrait>(db: &C, database_name: &str) -> Result<i64, DbErr> {
    let latest = version::Entity::find()
        .filter(version::Column::DatabaseName.eq(database_name))
        .order_by_desc(version::Column::Version)
        .one(db)
        .await?;
    Ok(latest.map(|v| v.version).unwrap_or(-1))
}

async fn ensure_version_table(db: &DatabaseConnection) -> Result<(), DbErr> {
    let manager = SchemaManager::new(db);
    manager
        .create_table(
            Table::create()
                .table(Version::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Version::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Version::DatabaseName).string().not_null())
                .col(ColumnDef::new(Version::Version).big_integer().not_null())
                .col(
                    ColumnDef::new(Version::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .to_owned(),
        )
        .await?;

    // a second runner racing on the same step fails here instead of applying
    // it twice
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_version_database_name_version")
                .table(Version::Table)
                .unique()
                .col(Version::DatabaseName)
                .col(Version::Version)
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Version {
    Table,
    Id,
    DatabaseName,
    Version,
    UpdatedAt,
}
