use futures::future::BoxFuture;
use sea_orm_migration::{prelude::*, sea_orm::DbBackend};

use super::m001_create_cluster_tables::{
    identity_cluster_table, Cluster, IdentityCluster, IDENTITY_CLUSTER_FK,
};

const REBUILT_TABLE: &str = "identity_cluster_rebuild";

pub fn up<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(async move {
        if manager.get_database_backend() == DbBackend::Sqlite {
            return rebuild_with_cascade(manager).await;
        }

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name(IDENTITY_CLUSTER_FK)
                    .table(IdentityCluster::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name(IDENTITY_CLUSTER_FK)
                    .from(IdentityCluster::Table, IdentityCluster::ClusterId)
                    .to(Cluster::Table, Cluster::ClusterId)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await
    })
}

// sqlite can't alter a foreign key, so copy the rows into a table declared
// with the cascade and swap it in
async fn rebuild_with_cascade(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let rebuilt = Alias::new(REBUILT_TABLE);
    manager
        .create_table(identity_cluster_table(
            rebuilt.clone().into_iden(),
            ForeignKeyAction::Cascade,
        ))
        .await?;

    let select = Query::select()
        .columns(copied_columns())
        .from(IdentityCluster::Table)
        .to_owned();
    let copy = Query::insert()
        .into_table(rebuilt.clone())
        .columns(copied_columns())
        .select_from(select)
        .map_err(|e| DbErr::Migration(e.to_string()))?
        .to_owned();
    manager.exec_stmt(copy).await?;

    manager
        .drop_table(Table::drop().table(IdentityCluster::Table).to_owned())
        .await?;
    manager
        .rename_table(
            Table::rename()
                .table(rebuilt, IdentityCluster::Table)
                .to_owned(),
        )
        .await
}

fn copied_columns() -> [IdentityCluster; 5] {
    [
        IdentityCluster::IdentityId,
        IdentityCluster::ClusterId,
        IdentityCluster::CreatedAt,
        IdentityCluster::UpdatedAt,
        IdentityCluster::DeletedAt,
    ]
}
