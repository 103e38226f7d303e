use async_trait::async_trait;

use super::{
    error::PaginationError,
    fields::Paginated,
    query::{Criteria, Sort},
    service::RowSource,
};

/// Row source over an owned snapshot of entities.
pub struct MemoryRows<T> {
    rows: Vec<T>,
}

impl<T> MemoryRows<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl<T> RowSource<T> for MemoryRows<T>
where
    T: Paginated + Clone + Send + Sync,
{
    async fn count(&mut self, criteria: &Criteria) -> Result<i64, PaginationError> {
        Ok(self.rows.iter().filter(|r| criteria.matches(*r)).count() as i64)
    }

    async fn fetch(
        &mut self,
        criteria: &Criteria,
        sort: &Sort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>, PaginationError> {
        let mut hits: Vec<&T> = self.rows.iter().filter(|r| criteria.matches(*r)).collect();
        hits.sort_by(|a, b| sort.compare(*a, *b));
        Ok(hits
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
