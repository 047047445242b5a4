use futures::future::BoxFuture;
use sea_orm_migration::{prelude::*, sea_orm::DbBackend};

/// `uuid_generate_v4()` is used by operators seeding rows by hand.
pub fn up<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(async move {
        if manager.get_database_backend() != DbBackend::Postgres {
            return Ok(());
        }
        manager
            .get_connection()
            .execute_unprepared(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#)
            .await?;
        Ok(())
    })
}
