use futures::future::BoxFuture;
use sea_orm_migration::prelude::*;

use super::{m001_create_cluster_tables::Cluster, m003_create_cluster_url_index::CLUSTER_URL_INDEX};

/// Fails on duplicate urls. Those have to be resolved by an operator before
/// the migration can go through.
pub fn up<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(async move {
        manager
            .drop_index(
                Index::drop()
                    .name(CLUSTER_URL_INDEX)
                    .table(Cluster::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(CLUSTER_URL_INDEX)
                    .table(Cluster::Table)
                    .unique()
                    .col(Cluster::Url)
                    .to_owned(),
            )
            .await
    })
}
