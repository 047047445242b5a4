use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cluster")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub cluster_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub name: String,
    #[sea_orm(unique)]
    pub url: String,
    pub console_url: String,
    pub metrics_url: String,
    pub logging_url: String,
    pub app_dns: String,
    pub sa_token: String,
    pub sa_username: String,
    pub sa_token_encrypted: bool,
    pub token_provider_id: String,
    pub auth_client_id: String,
    pub auth_client_secret: String,
    pub auth_default_scope: String,
    #[sea_orm(column_name = "type")]
    pub cluster_type: String,
    pub capacity_exhausted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::identity_cluster::Entity")]
    IdentityCluster,
}

impl Related<super::identity_cluster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdentityCluster.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
