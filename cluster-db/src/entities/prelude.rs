pub use super::cluster::Entity as Cluster;
pub use super::identity_cluster::Entity as IdentityCluster;
pub use super::version::Entity as Version;
