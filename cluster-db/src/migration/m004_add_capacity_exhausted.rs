use futures::future::BoxFuture;
use sea_orm_migration::prelude::*;

use super::verify_boolean_backfill;

pub fn up<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(async move {
        manager
            .alter_table(
                Table::alter()
                    .table(Cluster::Table)
                    .add_column(
                        ColumnDef::new(Cluster::CapacityExhausted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await
    })
}

pub fn verify<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(verify_boolean_backfill(
        manager,
        Cluster::Table,
        Cluster::CapacityExhausted,
        false,
    ))
}

#[derive(DeriveIden)]
enum Cluster {
    Table,
    CapacityExhausted,
}
