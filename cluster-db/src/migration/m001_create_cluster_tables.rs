use futures::future::BoxFuture;
use sea_orm_migration::prelude::*;

pub const IDENTITY_CLUSTER_FK: &str = "identity_cluster_cluster_id_fkey";

pub fn up<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(async move {
        manager
            .create_table(
                Table::create()
                    .table(Cluster::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cluster::ClusterId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Cluster::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cluster::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cluster::DeletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Cluster::Name).string().not_null())
                    .col(ColumnDef::new(Cluster::Url).string().not_null())
                    .col(ColumnDef::new(Cluster::ConsoleUrl).string().not_null())
                    .col(ColumnDef::new(Cluster::MetricsUrl).string().not_null())
                    .col(ColumnDef::new(Cluster::LoggingUrl).string().not_null())
                    .col(ColumnDef::new(Cluster::AppDns).string().not_null())
                    .col(ColumnDef::new(Cluster::SaToken).string().not_null())
                    .col(ColumnDef::new(Cluster::SaUsername).string().not_null())
                    .col(ColumnDef::new(Cluster::TokenProviderId).string().not_null())
                    .col(ColumnDef::new(Cluster::AuthClientId).string().not_null())
                    .col(ColumnDef::new(Cluster::AuthClientSecret).string().not_null())
                    .col(ColumnDef::new(Cluster::AuthDefaultScope).string().not_null())
                    .col(ColumnDef::new(Cluster::Type).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(identity_cluster_table(
                IdentityCluster::Table.into_iden(),
                ForeignKeyAction::NoAction,
            ))
            .await?;

        Ok(())
    })
}

/// Shape of `identity_cluster`, parameterized so the cascade step can rebuild
/// the table on backends that can't alter foreign keys in place.
pub fn identity_cluster_table(table: DynIden, on_delete: ForeignKeyAction) -> TableCreateStatement {
    Table::create()
        .table(table.clone())
        .if_not_exists()
        .col(
            ColumnDef::new(IdentityCluster::IdentityId)
                .uuid()
                .not_null(),
        )
        .col(ColumnDef::new(IdentityCluster::ClusterId).uuid().not_null())
        .col(
            ColumnDef::new(IdentityCluster::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(IdentityCluster::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(IdentityCluster::DeletedAt).timestamp_with_time_zone())
        .primary_key(
            Index::create()
                .col(IdentityCluster::IdentityId)
                .col(IdentityCluster::ClusterId),
        )
        .foreign_key(
            ForeignKey::create()
                .name(IDENTITY_CLUSTER_FK)
                .from(table, IdentityCluster::ClusterId)
                .to(Cluster::Table, Cluster::ClusterId)
                .on_delete(on_delete),
        )
        .to_owned()
}

#[derive(DeriveIden)]
pub enum Cluster {
    Table,
    ClusterId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Name,
    Url,
    ConsoleUrl,
    MetricsUrl,
    LoggingUrl,
    AppDns,
    SaToken,
    SaUsername,
    TokenProviderId,
    AuthClientId,
    AuthClientSecret,
    AuthDefaultScope,
    Type,
}

#[derive(DeriveIden)]
pub enum IdentityCluster {
    Table,
    IdentityId,
    ClusterId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
