pub mod prelude;

pub mod cluster;
pub mod identity_cluster;
pub mod version;
