mod cluster;
mod identity_cluster;

pub use cluster::ClusterRepository;
pub use identity_cluster::IdentityClusterRepository;
