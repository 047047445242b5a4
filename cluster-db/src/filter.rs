use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use crate::entities::cluster;

/// A predicate over clusters, built by callers and turned into a `WHERE`
/// condition by the repository.
///
/// ```ignore
/// let filter = ClusterFilter::cluster_type("OSD").and(ClusterFilter::capacity_exhausted(false));
/// let clusters = repo.query(filter).await?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClusterFilter {
    Id(Uuid),
    Url(String),
    Name(String),
    ClusterType(String),
    TokenProviderId(String),
    CapacityExhausted(bool),
    All(Vec<ClusterFilter>),
    Any(Vec<ClusterFilter>),
    Not(Box<ClusterFilter>),
}

impl ClusterFilter {
    pub fn id(id: Uuid) -> Self {
        ClusterFilter::Id(id)
    }

    pub fn url(url: impl Into<String>) -> Self {
        ClusterFilter::Url(url.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        ClusterFilter::Name(name.into())
    }

    pub fn cluster_type(cluster_type: impl Into<String>) -> Self {
        ClusterFilter::ClusterType(cluster_type.into())
    }

    pub fn token_provider_id(id: impl Into<String>) -> Self {
        ClusterFilter::TokenProviderId(id.into())
    }

    pub fn capacity_exhausted(exhausted: bool) -> Self {
        ClusterFilter::CapacityExhausted(exhausted)
    }

    /// Matches every cluster.
    pub fn everything() -> Self {
        ClusterFilter::All(Vec::new())
    }

    pub fn and(self, other: ClusterFilter) -> Self {
        match self {
            ClusterFilter::All(mut filters) => {
                filters.push(other);
                ClusterFilter::All(filters)
            }
            filter => ClusterFilter::All(vec![filter, other]),
        }
    }

    pub fn or(self, other: ClusterFilter) -> Self {
        match self {
            ClusterFilter::Any(mut filters) => {
                filters.push(other);
                ClusterFilter::Any(filters)
            }
            filter => ClusterFilter::Any(vec![filter, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        ClusterFilter::Not(Box::new(self))
    }

    pub(crate) fn into_condition(self) -> Condition {
        match self {
            ClusterFilter::Id(id) => Condition::all().add(cluster::Column::ClusterId.eq(id)),
            ClusterFilter::Url(url) => Condition::all().add(cluster::Column::Url.eq(url)),
            ClusterFilter::Name(name) => Condition::all().add(cluster::Column::Name.eq(name)),
            ClusterFilter::ClusterType(t) => {
                Condition::all().add(cluster::Column::ClusterType.eq(t))
            }
            ClusterFilter::TokenProviderId(id) => {
                Condition::all().add(cluster::Column::TokenProviderId.eq(id))
            }
            ClusterFilter::CapacityExhausted(exhausted) => {
                Condition::all().add(cluster::Column::CapacityExhausted.eq(exhausted))
            }
            ClusterFilter::All(filters) => filters
                .into_iter()
                .fold(Condition::all(), |cond, f| cond.add(f.into_condition())),
            ClusterFilter::Any(filters) => filters
                .into_iter()
                .fold(Condition::any(), |cond, f| cond.add(f.into_condition())),
            ClusterFilter::Not(filter) => filter.into_condition().not(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClusterFilter;

    #[test]
    fn test_and_flattens() {
        let filter = ClusterFilter::name("a")
            .and(ClusterFilter::url("b"))
            .and(ClusterFilter::capacity_exhausted(true));
        assert_eq!(
            filter,
            ClusterFilter::All(vec![
                ClusterFilter::name("a"),
                ClusterFilter::url("b"),
                ClusterFilter::capacity_exhausted(true),
            ])
        );
    }

    #[test]
    fn test_or_then_and_nests() {
        let filter = ClusterFilter::name("a")
            .or(ClusterFilter::name("b"))
            .and(ClusterFilter::cluster_type("OSD"));
        assert_eq!(
            filter,
            ClusterFilter::All(vec![
                ClusterFilter::Any(vec![ClusterFilter::name("a"), ClusterFilter::name("b")]),
                ClusterFilter::cluster_type("OSD"),
            ])
        );
    }
}
