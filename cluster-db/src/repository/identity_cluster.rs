use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entities::{cluster, identity_cluster},
    error::RepositoryError,
};

const ENTITY: &str = "identity_cluster";

/// Links between external identities and the clusters they were provisioned
/// on. Rows go away with their cluster.
#[derive(Clone)]
pub struct IdentityClusterRepository {
    conn: DatabaseConnection,
}

impl IdentityClusterRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fails with [`RepositoryError::ConstraintViolation`] if the cluster
    /// doesn't exist or the link is already there.
    pub async fn create(
        &self,
        identity_id: Uuid,
        cluster_id: Uuid,
    ) -> Result<identity_cluster::Model, RepositoryError> {
        let now = Utc::now().into();
        let model = identity_cluster::ActiveModel {
            identity_id: ActiveValue::Set(identity_id),
            cluster_id: ActiveValue::Set(cluster_id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            deleted_at: ActiveValue::Set(None),
        }
        .insert(&self.conn)
        .await
        .map_err(|e| RepositoryError::from_db(ENTITY, "create", e))?;
        debug!("linked identity {identity_id} to cluster {cluster_id}");
        Ok(model)
    }

    pub async fn load(
        &self,
        identity_id: Uuid,
        cluster_id: Uuid,
    ) -> Result<identity_cluster::Model, RepositoryError> {
        identity_cluster::Entity::find_by_id((identity_id, cluster_id))
            .filter(identity_cluster::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "load", e))?
            .ok_or_else(|| {
                RepositoryError::not_found(
                    ENTITY,
                    "identity and cluster id",
                    format!("{identity_id}/{cluster_id}"),
                )
            })
    }

    /// The clusters an identity is linked to, oldest link first.
    pub async fn list_for_identity(
        &self,
        identity_id: Uuid,
    ) -> Result<Vec<cluster::Model>, RepositoryError> {
        let links = identity_cluster::Entity::find()
            .find_also_related(cluster::Entity)
            .filter(identity_cluster::Column::IdentityId.eq(identity_id))
            .filter(identity_cluster::Column::DeletedAt.is_null())
            .order_by_asc(identity_cluster::Column::CreatedAt)
            .all(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "list", e))?;
        Ok(links
            .into_iter()
            .filter_map(|(_, cluster)| cluster)
            .filter(|cluster| cluster.deleted_at.is_none())
            .collect())
    }

    pub async fn list_for_cluster(
        &self,
        cluster_id: Uuid,
    ) -> Result<Vec<identity_cluster::Model>, RepositoryError> {
        identity_cluster::Entity::find()
            .filter(identity_cluster::Column::ClusterId.eq(cluster_id))
            .filter(identity_cluster::Column::DeletedAt.is_null())
            .order_by_asc(identity_cluster::Column::CreatedAt)
            .all(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "list", e))
    }

    pub async fn delete(&self, identity_id: Uuid, cluster_id: Uuid) -> Result<(), RepositoryError> {
        let result = identity_cluster::Entity::delete_by_id((identity_id, cluster_id))
            .exec(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "delete", e))?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                ENTITY,
                "identity and cluster id",
                format!("{identity_id}/{cluster_id}"),
            ));
        }
        debug!("unlinked identity {identity_id} from cluster {cluster_id}");
        Ok(())
    }
}
