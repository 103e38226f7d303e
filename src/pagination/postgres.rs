use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{pool::PoolConnection, postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};

use super::{
    error::PaginationError,
    fields::{FieldValue, Paginated},
    query::{escape_like, Criteria, Sort},
    service::RowSource,
};

/// Row source holding one pooled connection for the whole paginated call.
/// The connection goes back to the pool when this value is dropped.
pub struct PgRows<T> {
    conn: PoolConnection<Postgres>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgRows<T> {
    pub async fn acquire(db: &PgPool) -> Result<Self, PaginationError> {
        let conn = db.acquire().await?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Text(v) => qb.push_bind(v.clone()),
        FieldValue::Bool(v) => qb.push_bind(*v),
        FieldValue::Uuid(v) => qb.push_bind(*v),
        FieldValue::Timestamp(v) => qb.push_bind(*v),
    };
}

/// Appends the WHERE clause for `criteria`. Column names come from the field registry only.
pub(crate) fn push_criteria(qb: &mut QueryBuilder<'_, Postgres>, criteria: &Criteria) {
    let mut first = true;
    let mut clause = |qb: &mut QueryBuilder<'_, Postgres>| {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    for filter in &criteria.filters {
        clause(qb);
        qb.push(filter.field.column).push(" = ");
        push_value(qb, &filter.value);
    }

    if let Some(search) = &criteria.search {
        clause(qb);
        let pattern = format!("%{}%", escape_like(&search.term));
        qb.push("(");
        for (i, field) in search.fields.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(field.column)
                .push(" ILIKE ")
                .push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

pub(crate) fn count_query<T: Paginated>(criteria: &Criteria) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
    qb.push(T::TABLE);
    push_criteria(&mut qb, criteria);
    qb
}

pub(crate) fn page_query<T: Paginated>(
    criteria: &Criteria,
    sort: &Sort,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    {
        let mut columns = qb.separated(", ");
        for field in T::fields() {
            columns.push(field.column);
        }
    }
    qb.push(" FROM ").push(T::TABLE);
    push_criteria(&mut qb, criteria);
    qb.push(" ORDER BY ")
        .push(sort.field.column)
        .push(sort.order.as_sql());
    if sort.key.column != sort.field.column {
        qb.push(", ").push(sort.key.column).push(" ASC");
    }
    qb.push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}

#[async_trait]
impl<T> RowSource<T> for PgRows<T>
where
    T: Paginated + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    async fn count(&mut self, criteria: &Criteria) -> Result<i64, PaginationError> {
        let mut qb = count_query::<T>(criteria);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(total)
    }

    async fn fetch(
        &mut self,
        criteria: &Criteria,
        sort: &Sort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>, PaginationError> {
        let mut qb = page_query::<T>(criteria, sort, limit, offset);
        let rows = qb.build_query_as::<T>().fetch_all(&mut *self.conn).await?;
        Ok(rows)
    }
}
