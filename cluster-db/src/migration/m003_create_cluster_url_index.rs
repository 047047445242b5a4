use futures::future::BoxFuture;
use sea_orm_migration::prelude::*;

use super::m001_create_cluster_tables::Cluster;

pub const CLUSTER_URL_INDEX: &str = "idx_cluster_url";

pub fn up<'a>(manager: &'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>> {
    Box::pin(async move {
        manager
            .create_index(
                Index::create()
                    .name(CLUSTER_URL_INDEX)
                    .table(Cluster::Table)
                    .col(Cluster::Url)
                    .to_owned(),
            )
            .await
    })
}
