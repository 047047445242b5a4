use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entities::{cluster, identity_cluster},
    error::RepositoryError,
    filter::ClusterFilter,
};

const ENTITY: &str = "cluster";

/// Reads and writes `cluster` rows. Rows carrying a `deleted_at` marker are
/// invisible to every operation.
#[derive(Clone)]
pub struct ClusterRepository {
    conn: DatabaseConnection,
}

impl ClusterRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn load(&self, id: Uuid) -> Result<cluster::Model, RepositoryError> {
        find_live(&self.conn, id)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "load", e))?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, "id", id))
    }

    pub async fn load_by_url(&self, url: &str) -> Result<cluster::Model, RepositoryError> {
        find_live_by_url(&self.conn, url)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "load", e))?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, "url", url))
    }

    /// Inserts `cluster` under a freshly generated id. The id and timestamps
    /// of the argument are ignored.
    pub async fn create(&self, cluster: &cluster::Model) -> Result<cluster::Model, RepositoryError> {
        let model = new_row(cluster)
            .insert(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "create", e))?;
        debug!("created cluster {} for {}", model.cluster_id, model.url);
        Ok(model)
    }

    /// Overwrites every mutable field of the cluster with `cluster.cluster_id`.
    /// The id and creation time are kept.
    pub async fn save(&self, cluster: &cluster::Model) -> Result<cluster::Model, RepositoryError> {
        let txn = self
            .conn
            .begin()
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "save", e))?;

        if find_live(&txn, cluster.cluster_id)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "save", e))?
            .is_none()
        {
            return Err(RepositoryError::not_found(ENTITY, "id", cluster.cluster_id));
        }

        let model = existing_row(cluster, cluster.cluster_id)
            .update(&txn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "save", e))?;
        txn.commit()
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "save", e))?;

        debug!("saved cluster {}", model.cluster_id);
        Ok(model)
    }

    /// Reconciles `cluster` by url: inserts it under a new id when no cluster
    /// has that url, otherwise overwrites the mutable fields of the existing
    /// one and keeps its id and creation time.
    ///
    /// Two concurrent calls for a new url race on the unique url index, the
    /// loser gets a [`RepositoryError::ConstraintViolation`].
    pub async fn create_or_save(
        &self,
        cluster: &cluster::Model,
    ) -> Result<cluster::Model, RepositoryError> {
        let err = |e| RepositoryError::from_db(ENTITY, "create or save", e);

        let txn = self.conn.begin().await.map_err(err)?;
        let existing = find_live_by_url(&txn, &cluster.url).await.map_err(err)?;
        let model = match existing {
            Some(existing) => existing_row(cluster, existing.cluster_id)
                .update(&txn)
                .await
                .map_err(err)?,
            None => new_row(cluster).insert(&txn).await.map_err(err)?,
        };
        txn.commit().await.map_err(err)?;

        debug!("reconciled cluster {} for {}", model.cluster_id, model.url);
        Ok(model)
    }

    /// Deletes the cluster together with every identity association
    /// pointing at it.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let err = |e| RepositoryError::from_db(ENTITY, "delete", e);

        let txn = self.conn.begin().await.map_err(err)?;
        if find_live(&txn, id).await.map_err(err)?.is_none() {
            return Err(RepositoryError::not_found(ENTITY, "id", id));
        }

        identity_cluster::Entity::delete_many()
            .filter(identity_cluster::Column::ClusterId.eq(id))
            .exec(&txn)
            .await
            .map_err(err)?;
        cluster::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(err)?;
        txn.commit().await.map_err(err)?;

        debug!("deleted cluster {id}");
        Ok(())
    }

    pub async fn check_exists(&self, id: Uuid) -> Result<(), RepositoryError> {
        let count = cluster::Entity::find()
            .filter(cluster::Column::ClusterId.eq(id))
            .filter(cluster::Column::DeletedAt.is_null())
            .count(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "check", e))?;
        if count == 0 {
            return Err(RepositoryError::not_found(ENTITY, "id", id));
        }
        Ok(())
    }

    /// All clusters matching `filter`, in no particular order.
    pub async fn query(&self, filter: ClusterFilter) -> Result<Vec<cluster::Model>, RepositoryError> {
        cluster::Entity::find()
            .filter(filter.into_condition())
            .filter(cluster::Column::DeletedAt.is_null())
            .all(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "query", e))
    }

    /// All clusters, oldest first, optionally limited to one cluster type.
    pub async fn list(
        &self,
        cluster_type: Option<&str>,
    ) -> Result<Vec<cluster::Model>, RepositoryError> {
        let mut query = cluster::Entity::find().filter(cluster::Column::DeletedAt.is_null());
        if let Some(cluster_type) = cluster_type {
            query = query.filter(cluster::Column::ClusterType.eq(cluster_type));
        }
        query
            .order_by_asc(cluster::Column::CreatedAt)
            .all(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_db(ENTITY, "list", e))
    }
}

async fn find_live<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<cluster::Model>, DbErr> {
    cluster::Entity::find_by_id(id)
        .filter(cluster::Column::DeletedAt.is_null())
        .one(db)
        .await
}

async fn find_live_by_url<C: ConnectionTrait>(
    db: &C,
    url: &str,
) -> Result<Option<cluster::Model>, DbErr> {
    cluster::Entity::find()
        .filter(cluster::Column::Url.eq(url))
        .filter(cluster::Column::DeletedAt.is_null())
        .one(db)
        .await
}

fn new_row(cluster: &cluster::Model) -> cluster::ActiveModel {
    let now = Utc::now().into();
    cluster::ActiveModel {
        cluster_id: ActiveValue::Set(Uuid::new_v4()),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
        deleted_at: ActiveValue::Set(None),
        ..mutable_fields(cluster)
    }
}

fn existing_row(cluster: &cluster::Model, id: Uuid) -> cluster::ActiveModel {
    cluster::ActiveModel {
        cluster_id: ActiveValue::Unchanged(id),
        updated_at: ActiveValue::Set(Utc::now().into()),
        ..mutable_fields(cluster)
    }
}

fn mutable_fields(cluster: &cluster::Model) -> cluster::ActiveModel {
    cluster::ActiveModel {
        name: ActiveValue::Set(cluster.name.clone()),
        url: ActiveValue::Set(cluster.url.clone()),
        console_url: ActiveValue::Set(cluster.console_url.clone()),
        metrics_url: ActiveValue::Set(cluster.metrics_url.clone()),
        logging_url: ActiveValue::Set(cluster.logging_url.clone()),
        app_dns: ActiveValue::Set(cluster.app_dns.clone()),
        sa_token: ActiveValue::Set(cluster.sa_token.clone()),
        sa_username: ActiveValue::Set(cluster.sa_username.clone()),
        sa_token_encrypted: ActiveValue::Set(cluster.sa_token_encrypted),
        token_provider_id: ActiveValue::Set(cluster.token_provider_id.clone()),
        auth_client_id: ActiveValue::Set(cluster.auth_client_id.clone()),
        auth_client_secret: ActiveValue::Set(cluster.auth_client_secret.clone()),
        auth_default_scope: ActiveValue::Set(cluster.auth_default_scope.clone()),
        cluster_type: ActiveValue::Set(cluster.cluster_type.clone()),
        capacity_exhausted: ActiveValue::Set(cluster.capacity_exhausted),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, ActiveValue};
    use uuid::Uuid;

    use crate::{
        entities::cluster,
        filter::ClusterFilter,
        tests::{assert_equal_clusters, new_cluster, prepare_db},
    };

    fn modify(cluster: &mut cluster::Model) {
        cluster.name = Uuid::new_v4().to_string();
        cluster.console_url = Uuid::new_v4().to_string();
        cluster.metrics_url = Uuid::new_v4().to_string();
        cluster.logging_url = Uuid::new_v4().to_string();
        cluster.app_dns = Uuid::new_v4().to_string();
        cluster.sa_token = Uuid::new_v4().to_string();
        cluster.sa_username = Uuid::new_v4().to_string();
        cluster.sa_token_encrypted = !cluster.sa_token_encrypted;
        cluster.token_provider_id = Uuid::new_v4().to_string();
        cluster.auth_client_id = Uuid::new_v4().to_string();
        cluster.auth_client_secret = Uuid::new_v4().to_string();
        cluster.auth_default_scope = Uuid::new_v4().to_string();
        cluster.cluster_type = Uuid::new_v4().to_string();
        cluster.capacity_exhausted = true;
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster1 = repo.create(&new_cluster()).await.unwrap();
        repo.create(&new_cluster()).await.unwrap(); // noise

        assert_ne!(cluster1.cluster_id, Uuid::nil());
        let loaded = repo.load(cluster1.cluster_id).await.unwrap();
        assert_equal_clusters(&cluster1, &loaded);
    }

    #[tokio::test]
    async fn test_load_by_url() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster1 = repo.create(&new_cluster()).await.unwrap();
        repo.create(&new_cluster()).await.unwrap(); // noise

        let loaded = repo.load_by_url(&cluster1.url).await.unwrap();
        assert_equal_clusters(&cluster1, &loaded);
    }

    #[tokio::test]
    async fn test_load_by_unknown_url_fails() {
        let repo = prepare_db().await.unwrap().clusters();
        repo.create(&new_cluster()).await.unwrap();

        let url = Uuid::new_v4().to_string();
        let err = repo.load_by_url(&url).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), format!("cluster with url '{url}' not found"));
    }

    #[tokio::test]
    async fn test_load_unknown_fails() {
        let repo = prepare_db().await.unwrap().clusters();
        let id = Uuid::new_v4();
        let err = repo.load(id).await.unwrap_err();
        assert_eq!(err.to_string(), format!("cluster with id '{id}' not found"));
    }

    #[tokio::test]
    async fn test_create_duplicate_url_fails() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster = repo.create(&new_cluster()).await.unwrap();

        let mut duplicate = new_cluster();
        duplicate.url = cluster.url.clone();
        let err = repo.create(&duplicate).await.unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(repo.query(ClusterFilter::url(&cluster.url)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_or_save_creates() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster = new_cluster();
        let created = repo.create_or_save(&cluster).await.unwrap();
        repo.create(&new_cluster()).await.unwrap(); // noise

        assert_ne!(created.cluster_id, Uuid::nil());
        let loaded = repo.load_by_url(&cluster.url).await.unwrap();
        assert_equal_clusters(
            &cluster::Model {
                cluster_id: created.cluster_id,
                ..cluster
            },
            &loaded,
        );
    }

    #[tokio::test]
    async fn test_create_or_save_updates_existing() {
        let repo = prepare_db().await.unwrap().clusters();
        repo.create(&new_cluster()).await.unwrap(); // noise
        let mut cluster = new_cluster();
        let first = repo.create_or_save(&cluster).await.unwrap();

        modify(&mut cluster);
        let second = repo.create_or_save(&cluster).await.unwrap();

        assert_eq!(first.cluster_id, second.cluster_id);
        assert_eq!(first.created_at, second.created_at);
        let loaded = repo.load_by_url(&cluster.url).await.unwrap();
        assert_equal_clusters(&second, &loaded);
        assert!(loaded.capacity_exhausted);
        assert_eq!(loaded.name, cluster.name);
        assert_eq!(
            repo.query(ClusterFilter::url(&cluster.url)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_create_or_save_is_convergent() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster = new_cluster();
        let first = repo.create_or_save(&cluster).await.unwrap();
        let second = repo.create_or_save(&cluster).await.unwrap();
        assert_equal_clusters(&first, &second);
        assert_eq!(repo.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save() {
        let repo = prepare_db().await.unwrap().clusters();
        let mut cluster1 = repo.create(&new_cluster()).await.unwrap();
        let cluster2 = repo.create(&new_cluster()).await.unwrap(); // noise

        modify(&mut cluster1);
        cluster1.url = Uuid::new_v4().to_string();
        let saved = repo.save(&cluster1).await.unwrap();
        assert_eq!(saved.created_at, cluster1.created_at);

        let loaded1 = repo.load(cluster1.cluster_id).await.unwrap();
        assert_equal_clusters(&cluster1, &loaded1);
        let loaded2 = repo.load(cluster2.cluster_id).await.unwrap();
        assert_equal_clusters(&cluster2, &loaded2);
    }

    #[tokio::test]
    async fn test_save_unknown_fails() {
        let repo = prepare_db().await.unwrap().clusters();
        let existing = repo.create(&new_cluster()).await.unwrap();

        let unknown = cluster::Model {
            cluster_id: Uuid::new_v4(),
            ..new_cluster()
        };
        let err = repo.save(&unknown).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("cluster with id '{}' not found", unknown.cluster_id)
        );

        let clusters = repo.list(None).await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_equal_clusters(&existing, &clusters[0]);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = prepare_db().await.unwrap();
        let repo = db.clusters();
        let links = db.identity_clusters();
        let cluster1 = repo.create(&new_cluster()).await.unwrap();
        let cluster2 = repo.create(&new_cluster()).await.unwrap(); // noise
        let identity = Uuid::new_v4();
        links.create(identity, cluster1.cluster_id).await.unwrap();
        links.create(identity, cluster2.cluster_id).await.unwrap();

        repo.delete(cluster1.cluster_id).await.unwrap();

        let err = repo.load(cluster1.cluster_id).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(links
            .list_for_cluster(cluster1.cluster_id)
            .await
            .unwrap()
            .is_empty());

        let loaded = repo.load(cluster2.cluster_id).await.unwrap();
        assert_equal_clusters(&cluster2, &loaded);
        assert_eq!(
            links.list_for_cluster(cluster2.cluster_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_unknown_fails() {
        let repo = prepare_db().await.unwrap().clusters();
        let noise = repo.create(&new_cluster()).await.unwrap();

        let id = Uuid::new_v4();
        let err = repo.delete(id).await.unwrap_err();
        assert_eq!(err.to_string(), format!("cluster with id '{id}' not found"));
        repo.load(noise.cluster_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_twice_fails() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster = repo.create(&new_cluster()).await.unwrap();
        repo.delete(cluster.cluster_id).await.unwrap();
        let err = repo.delete(cluster.cluster_id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_soft_deleted_cluster_is_invisible() {
        let db = prepare_db().await.unwrap();
        let repo = db.clusters();
        let cluster = repo.create(&new_cluster()).await.unwrap();
        cluster::ActiveModel {
            cluster_id: ActiveValue::Unchanged(cluster.cluster_id),
            deleted_at: ActiveValue::Set(Some(Utc::now().into())),
            ..Default::default()
        }
        .update(&db.conn)
        .await
        .unwrap();

        assert!(repo.load(cluster.cluster_id).await.unwrap_err().is_not_found());
        assert!(repo.load_by_url(&cluster.url).await.unwrap_err().is_not_found());
        assert!(repo
            .check_exists(cluster.cluster_id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(repo.delete(cluster.cluster_id).await.unwrap_err().is_not_found());
        assert!(repo.save(&cluster).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_check_exists() {
        let repo = prepare_db().await.unwrap().clusters();
        let id = Uuid::new_v4();
        let err = repo.check_exists(id).await.unwrap_err();
        assert_eq!(err.to_string(), format!("cluster with id '{id}' not found"));

        let cluster = repo.create(&new_cluster()).await.unwrap();
        repo.check_exists(cluster.cluster_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_query() {
        let repo = prepare_db().await.unwrap().clusters();
        let cluster1 = repo.create(&new_cluster()).await.unwrap();
        let mut exhausted = new_cluster();
        exhausted.capacity_exhausted = true;
        exhausted.cluster_type = "OCP".to_string();
        let cluster2 = repo.create(&exhausted).await.unwrap();

        let clusters = repo
            .query(ClusterFilter::id(cluster1.cluster_id))
            .await
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_equal_clusters(&cluster1, &clusters[0]);

        let clusters = repo
            .query(ClusterFilter::capacity_exhausted(true).and(ClusterFilter::cluster_type("OCP")))
            .await
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_equal_clusters(&cluster2, &clusters[0]);

        let clusters = repo
            .query(ClusterFilter::id(cluster1.cluster_id).not())
            .await
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, cluster2.cluster_id);

        let clusters = repo
            .query(ClusterFilter::url(&cluster1.url).or(ClusterFilter::url(&cluster2.url)))
            .await
            .unwrap();
        assert_eq!(clusters.len(), 2);

        assert_eq!(repo.query(ClusterFilter::everything()).await.unwrap().len(), 2);
        assert!(repo
            .query(ClusterFilter::name("unknown"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let repo = prepare_db().await.unwrap().clusters();
        let osd = repo.create(&new_cluster()).await.unwrap();
        let mut ocp = new_cluster();
        ocp.cluster_type = "OCP".to_string();
        let ocp = repo.create(&ocp).await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let listed = repo.list(Some("OCP")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].cluster_id, ocp.cluster_id);

        let listed = repo.list(Some("OSD")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].cluster_id, osd.cluster_id);
    }
}
