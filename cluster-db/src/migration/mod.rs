use futures::future::BoxFuture;
use sea_orm_migration::prelude::*;

mod runner;

pub mod m000_bootstrap;
pub mod m001_create_cluster_tables;
pub mod m002_identity_cluster_on_delete_cascade;
pub mod m003_create_cluster_url_index;
pub mod m004_add_capacity_exhausted;
pub mod m005_make_cluster_url_index_unique;
pub mod m006_add_sa_token_encrypted;

pub use runner::{current_version, migrate};

/// A schema change, or a check run right after one, executed inside the
/// step's transaction.
pub type StepFn = for<'a> fn(&'a SchemaManager<'a>) -> BoxFuture<'a, Result<(), DbErr>>;

/// One entry of the migration registry. Steps are addressed by their position
/// in [`steps`] only, which is what gets recorded in the `version` table.
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub up: StepFn,
    pub verify: Option<StepFn>,
}

impl Step {
    pub const fn new(name: &'static str, up: StepFn) -> Self {
        Self {
            name,
            up,
            verify: None,
        }
    }

    pub const fn with_verify(mut self, verify: StepFn) -> Self {
        self.verify = Some(verify);
        self
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("verify", &self.verify.is_some())
            .finish()
    }
}

/// The released migrations. Append only: a step's index is its version, so
/// never reorder or remove an entry once it has shipped.
pub fn steps() -> Vec<Step> {
    vec![
        Step::new("bootstrap", m000_bootstrap::up),
        Step::new("create_cluster_tables", m001_create_cluster_tables::up),
        Step::new(
            "identity_cluster_on_delete_cascade",
            m002_identity_cluster_on_delete_cascade::up,
        ),
        Step::new("create_cluster_url_index", m003_create_cluster_url_index::up),
        Step::new("add_capacity_exhausted", m004_add_capacity_exhausted::up)
            .with_verify(m004_add_capacity_exhausted::verify),
        Step::new(
            "make_cluster_url_index_unique",
            m005_make_cluster_url_index_unique::up,
        ),
        Step::new("add_sa_token_encrypted", m006_add_sa_token_encrypted::up)
            .with_verify(m006_add_sa_token_encrypted::verify),
    ]
}

/// Fails unless every row of `table` reads `expected` in `column`, which is
/// what a column added with a non null default must look like afterwards.
pub(crate) async fn verify_boolean_backfill(
    manager: &SchemaManager<'_>,
    table: impl IntoIden,
    column: impl IntoIden,
    expected: bool,
) -> Result<(), DbErr> {
    let table = table.into_iden();
    let column = column.into_iden();
    let query = Query::select()
        .expr_as(Expr::col(Asterisk).count(), Alias::new("unexpected"))
        .from(table.clone())
        .cond_where(
            Condition::any()
                .add(Expr::col(column.clone()).is_null())
                .add(Expr::col(column.clone()).ne(expected)),
        )
        .to_owned();

    let backend = manager.get_database_backend();
    let unexpected: i64 = match manager
        .get_connection()
        .query_one(backend.build(&query))
        .await?
    {
        Some(row) => row.try_get("", "unexpected")?,
        None => 0,
    };
    if unexpected > 0 {
        return Err(DbErr::Migration(format!(
            "{unexpected} rows of {}.{} don't read back as {expected}",
            table.to_string(),
            column.to_string()
        )));
    }
    Ok(())
}
