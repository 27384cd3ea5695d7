//! Postgres SuperHero store
//!
//! Expects the table:
//!
//! ```sql
//! CREATE TABLE super_hero (
//!     id         BIGSERIAL PRIMARY KEY,
//!     name       VARCHAR(255),
//!     age        INTEGER,
//!     superpower VARCHAR(255)
//! );
//! ```
//!
//! Filters are rendered with [`sqlx::QueryBuilder`]. Operands are always bound
//! parameters and column names only ever come from [`SuperHeroField`].

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::filter::{FilterCondition, FilterOperator, FilterValue, SuperHeroField, SuperHeroQuery};
use super::pagination::{Page, PageRequest};
use super::traits::SuperHeroRepository;
use crate::domain::SuperHero;

const TABLE: &str = "super_hero";
const COLUMNS: &str = "id, name, age, superpower";

/// SuperHero store backed by a sqlx Postgres pool
#[derive(Debug, Clone)]
pub struct PgSuperHeroRepository {
    pool: PgPool,
}

impl PgSuperHeroRepository {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(operation: RepositoryOperation) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |err| RepositoryError::from(err).with_operation(operation)
}

/// Start a `SELECT` over the table with the query's WHERE clause applied
fn select(query: &SuperHeroQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");
    if query.distinct {
        builder.push("DISTINCT ");
    }
    builder.push(COLUMNS).push(" FROM ").push(TABLE);
    push_where(&mut builder, query);
    builder
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, query: &SuperHeroQuery) {
    for (i, condition) in query.spec.conditions().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(builder, condition);
    }
}

fn push_condition(builder: &mut QueryBuilder<'static, Postgres>, condition: &FilterCondition) {
    let column = condition.field.column();
    builder.push("(");
    match (condition.operator, &condition.value) {
        (FilterOperator::IsNull, _) => {
            builder.push(column).push(" IS NULL");
        }
        (FilterOperator::IsNotNull, _) => {
            builder.push(column).push(" IS NOT NULL");
        }
        (FilterOperator::Contains, FilterValue::String(needle)) => {
            builder
                .push("strpos(")
                .push(column)
                .push(", ")
                .push_bind(needle.clone())
                .push(") > 0");
        }
        (FilterOperator::NotContains, FilterValue::String(needle)) => {
            builder
                .push("strpos(")
                .push(column)
                .push(", ")
                .push_bind(needle.clone())
                .push(") = 0");
        }
        (FilterOperator::In, FilterValue::IntegerList(list)) => {
            builder.push(column).push(" = ANY(").push_bind(list.clone()).push(")");
        }
        (FilterOperator::In, FilterValue::StringList(list)) => {
            builder.push(column).push(" = ANY(").push_bind(list.clone()).push(")");
        }
        // `<> ALL('{}')` is true even for NULL, so nulls are excluded explicitly.
        (FilterOperator::NotIn, FilterValue::IntegerList(list)) => {
            builder
                .push(column)
                .push(" IS NOT NULL AND ")
                .push(column)
                .push(" <> ALL(")
                .push_bind(list.clone())
                .push(")");
        }
        (FilterOperator::NotIn, FilterValue::StringList(list)) => {
            builder
                .push(column)
                .push(" IS NOT NULL AND ")
                .push(column)
                .push(" <> ALL(")
                .push_bind(list.clone())
                .push(")");
        }
        (op, FilterValue::Integer(n)) if is_comparison(op) => {
            builder.push(column).push(format!(" {} ", op)).push_bind(*n);
        }
        (op, FilterValue::String(s)) if is_comparison(op) => {
            builder.push(column).push(format!(" {} ", op)).push_bind(s.clone());
        }
        _ => {
            builder.push("FALSE");
        }
    }
    builder.push(")");
}

fn is_comparison(op: FilterOperator) -> bool {
    matches!(
        op,
        FilterOperator::Equal
            | FilterOperator::NotEqual
            | FilterOperator::GreaterThan
            | FilterOperator::GreaterThanOrEqual
            | FilterOperator::LessThan
            | FilterOperator::LessThanOrEqual
    )
}

fn push_order(builder: &mut QueryBuilder<'static, Postgres>, page: &PageRequest) {
    builder.push(" ORDER BY ");
    for (i, sort) in page.effective_sort().iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder
            .push(sort.field.column())
            .push(" ")
            .push(sort.direction.as_sql());
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl SuperHeroRepository for PgSuperHeroRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<SuperHero>> {
        sqlx::query_as::<_, SuperHero>(&format!("SELECT {COLUMNS} FROM {TABLE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::FindById))
    }

    async fn find_all(&self, query: &SuperHeroQuery) -> RepositoryResult<Vec<SuperHero>> {
        let mut builder = select(query);
        builder.push(" ORDER BY ").push(SuperHeroField::Id.column());
        debug!(sql = builder.sql(), "Finding superHeroes");
        builder
            .build_query_as::<SuperHero>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::FindAll))
    }

    async fn find_page(
        &self,
        query: &SuperHeroQuery,
        page: &PageRequest,
    ) -> RepositoryResult<Page<SuperHero>> {
        let total = self
            .count(query)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::FindPage))?;

        let mut builder = select(query);
        push_order(&mut builder, page);
        builder
            .push(" LIMIT ")
            .push_bind(to_i64(page.size))
            .push(" OFFSET ")
            .push_bind(to_i64(page.offset()));
        debug!(sql = builder.sql(), "Finding superHero page");

        let content = builder
            .build_query_as::<SuperHero>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::FindPage))?;
        Ok(Page::new(content, page, total))
    }

    async fn count(&self, query: &SuperHeroQuery) -> RepositoryResult<u64> {
        let mut builder: QueryBuilder<'static, Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {TABLE}"));
        push_where(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Count))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn exists_by_id(&self, id: i64) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {TABLE} WHERE id = $1)"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(RepositoryOperation::Exists))
    }

    async fn save(&self, entity: SuperHero) -> RepositoryResult<SuperHero> {
        let saved = match entity.id {
            None => {
                let sql = format!(
                    "INSERT INTO {TABLE} (name, age, superpower) VALUES ($1, $2, $3) \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, SuperHero>(&sql)
                    .bind(entity.name)
                    .bind(entity.age)
                    .bind(entity.superpower)
                    .fetch_one(&self.pool)
                    .await
            }
            Some(id) => {
                let sql = format!(
                    "INSERT INTO {TABLE} (id, name, age, superpower) VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (id) DO UPDATE SET \
                     name = EXCLUDED.name, age = EXCLUDED.age, superpower = EXCLUDED.superpower \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, SuperHero>(&sql)
                    .bind(id)
                    .bind(entity.name)
                    .bind(entity.age)
                    .bind(entity.superpower)
                    .fetch_one(&self.pool)
                    .await
            }
        };
        saved.map_err(db_error(RepositoryOperation::Save))
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<()> {
        sqlx::query(&format!("DELETE FROM {TABLE} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Delete))?;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Ping))?;
        Ok(())
    }
}
