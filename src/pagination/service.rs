use async_trait::async_trait;
use tracing::debug;

use super::{
    error::PaginationError,
    fields::Paginated,
    query::{filter_criteria, search_criteria, sort_criteria, Criteria, Page, PageRequest, Sort},
};

/// Data-access capability behind `get_rows`: count and fetch over one entity collection.
#[async_trait]
pub trait RowSource<T>: Send
where
    T: Paginated + Send,
{
    async fn count(&mut self, criteria: &Criteria) -> Result<i64, PaginationError>;

    async fn fetch(
        &mut self,
        criteria: &Criteria,
        sort: &Sort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>, PaginationError>;
}

/// Ceiling division that cannot overflow, whatever `per_page` the caller asked for.
pub fn total_pages(total_entries: i64, per_page: i64) -> i64 {
    total_entries / per_page + i64::from(total_entries % per_page != 0)
}

/// Filters, searches, counts, sorts and paginates, in that order.
pub async fn get_rows<T, S>(source: &mut S, req: &PageRequest) -> Result<Page<T>, PaginationError>
where
    T: Paginated + Send,
    S: RowSource<T> + ?Sized,
{
    if req.per_page < 1 {
        return Err(PaginationError::validation("per_page must be at least 1"));
    }
    if req.page < 1 {
        return Err(PaginationError::validation("page must be at least 1"));
    }

    let criteria = Criteria {
        filters: filter_criteria::<T>(&req.filters)?,
        search: search_criteria::<T>(&req.search),
    };

    let total_entries = source.count(&criteria).await?;

    let sort = sort_criteria::<T>(&req.sort_field, &req.sort_order)?;

    let total_pages = total_pages(total_entries, req.per_page);
    // page 1 of an empty result is an empty page, not an error
    if req.page > total_pages.max(1) {
        return Err(PaginationError::validation("Requested page does not exist"));
    }

    let offset = (req.page - 1) * req.per_page;
    let rows = source.fetch(&criteria, &sort, req.per_page, offset).await?;
    debug!(
        table = T::TABLE,
        page = req.page,
        per_page = req.per_page,
        total_entries,
        returned = rows.len(),
        "page fetched"
    );

    Ok(Page {
        rows,
        total_entries,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{
        fields::{FieldDef, FieldValue},
        memory::MemoryRows,
    };
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct Contact {
        id: Uuid,
        name: String,
        city: String,
        secret_note: String,
        vip: bool,
    }

    static CONTACT_FIELDS: &[FieldDef] = &[
        FieldDef::uuid("id", "id"),
        FieldDef::text("name", "name"),
        FieldDef::text("city", "city"),
        FieldDef::text("secret_note", "secret_note").secret(),
        FieldDef::boolean("vip", "vip"),
    ];

    impl Paginated for Contact {
        const TABLE: &'static str = "contacts";
        const KEY: &'static str = "id";

        fn fields() -> &'static [FieldDef] {
            CONTACT_FIELDS
        }

        fn value_of(&self, field: &str) -> Option<FieldValue> {
            match field {
                "id" => Some(FieldValue::Uuid(self.id)),
                "name" => Some(FieldValue::Text(self.name.clone())),
                "city" => Some(FieldValue::Text(self.city.clone())),
                "secret_note" => Some(FieldValue::Text(self.secret_note.clone())),
                "vip" => Some(FieldValue::Bool(self.vip)),
                _ => None,
            }
        }
    }

    fn contact(name: &str, city: &str, vip: bool) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            name: name.into(),
            city: city.into(),
            secret_note: "doe-secret".into(),
            vip,
        }
    }

    fn numbered(count: usize) -> Vec<Contact> {
        (0..count)
            .map(|i| contact(&format!("contact-{:02}", i), "Oslo", i % 2 == 0))
            .collect()
    }

    fn request(page: i64, per_page: i64) -> PageRequest {
        PageRequest {
            page,
            per_page,
            ..PageRequest::default()
        }
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(7, 1), 7);
        assert_eq!(total_pages(2, i64::MAX), 1);
        assert_eq!(total_pages(0, i64::MAX), 0);
    }

    #[tokio::test]
    async fn huge_page_size_fits_everything_on_one_page() {
        let mut source = MemoryRows::new(numbered(3));
        let page = get_rows(&mut source, &request(1, i64::MAX)).await.unwrap();
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.total_entries, 3);
        assert_eq!(page.total_pages, 1);

        let err = get_rows(&mut source, &request(2, i64::MAX)).await.unwrap_err();
        assert!(matches!(err, PaginationError::Validation(_)));
    }

    #[tokio::test]
    async fn last_page_holds_the_remainder() {
        let mut source = MemoryRows::new(numbered(25));
        let page = get_rows(&mut source, &request(3, 10)).await.unwrap();
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_entries, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.rows[0].name, "contact-20");
        assert_eq!(page.rows[4].name, "contact-24");
    }

    #[tokio::test]
    async fn page_beyond_range_is_a_validation_error() {
        let mut source = MemoryRows::new(numbered(25));
        let err = get_rows(&mut source, &request(4, 10)).await.unwrap_err();
        assert!(matches!(err, PaginationError::Validation(ref m) if m == "Requested page does not exist"));
    }

    #[tokio::test]
    async fn empty_collection_yields_an_empty_first_page() {
        let mut source = MemoryRows::<Contact>::new(Vec::new());
        let page = get_rows(&mut source, &request(1, 10)).await.unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_entries, 0);
        assert_eq!(page.total_pages, 0);

        let err = get_rows(&mut source, &request(2, 10)).await.unwrap_err();
        assert!(matches!(err, PaginationError::Validation(_)));
    }

    #[tokio::test]
    async fn non_positive_page_or_size_is_rejected() {
        let mut source = MemoryRows::new(numbered(3));
        assert!(matches!(
            get_rows(&mut source, &request(0, 10)).await,
            Err(PaginationError::Validation(_))
        ));
        assert!(matches!(
            get_rows(&mut source, &request(1, 0)).await,
            Err(PaginationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let mut rows = numbered(6);
        rows.push(contact("Bergen vip", "Bergen", true));
        rows.push(contact("Bergen regular", "Bergen", false));
        let mut source = MemoryRows::new(rows);

        let mut req = request(1, 50);
        req.filters = json!({ "city": "Bergen", "vip": true })
            .as_object()
            .cloned()
            .unwrap();
        let page = get_rows(&mut source, &req).await.unwrap();
        assert_eq!(page.total_entries, 1);
        assert_eq!(page.rows[0].name, "Bergen vip");
        assert!(page.rows.iter().all(|c| c.city == "Bergen" && c.vip));
    }

    #[tokio::test]
    async fn unknown_filter_field_is_a_validation_error() {
        let mut source = MemoryRows::new(numbered(3));
        let mut req = request(1, 10);
        req.filters = json!({ "nickname": "x" }).as_object().cloned().unwrap();
        let err = get_rows(&mut source, &req).await.unwrap_err();
        assert!(matches!(err, PaginationError::Validation(ref m) if m.contains("nickname")));
    }

    #[tokio::test]
    async fn secret_field_cannot_be_filtered_or_sorted() {
        let mut source = MemoryRows::new(numbered(3));
        let mut req = request(1, 10);
        req.filters = json!({ "secret_note": "doe-secret" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(matches!(
            get_rows(&mut source, &req).await,
            Err(PaginationError::Validation(_))
        ));

        let mut req = request(1, 10);
        req.sort_field = "secret_note".into();
        assert!(matches!(
            get_rows(&mut source, &req).await,
            Err(PaginationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_skips_secret_fields() {
        let mut rows = numbered(4);
        rows.push(contact("Jane DOE", "Oslo", false));
        rows.push(contact("Mark", "Doetinchem", false));
        let mut source = MemoryRows::new(rows);

        let mut req = request(1, 50);
        req.search = "doe".into();
        let page = get_rows(&mut source, &req).await.unwrap();
        // every row carries "doe" in secret_note; only the two real matches count
        assert_eq!(page.total_entries, 2);
        for row in &page.rows {
            let hit = row.name.to_lowercase().contains("doe")
                || row.city.to_lowercase().contains("doe");
            assert!(hit, "{row:?} should match the search");
        }
    }

    #[tokio::test]
    async fn unknown_sort_field_returns_no_rows() {
        let mut source = MemoryRows::new(numbered(3));
        let mut req = request(1, 10);
        req.sort_field = "age".into();
        let err = get_rows(&mut source, &req).await.unwrap_err();
        assert!(matches!(err, PaginationError::Validation(ref m) if m.contains("age")));
    }

    #[tokio::test]
    async fn count_is_independent_of_sort_and_page() {
        let mut source = MemoryRows::new(numbered(17));
        let mut totals = Vec::new();
        for (field, order, page) in [
            ("name", "asc", 1),
            ("name", "desc", 2),
            ("vip", "asc", 1),
            ("city", "DESC", 2),
        ] {
            let mut req = request(page, 9);
            req.sort_field = field.into();
            req.sort_order = order.into();
            let result = get_rows(&mut source, &req).await.unwrap();
            totals.push((result.total_entries, result.total_pages));
        }
        assert!(totals.iter().all(|t| *t == (17, 2)));
    }

    #[tokio::test]
    async fn descending_sort_reverses_the_order() {
        let mut source = MemoryRows::new(numbered(5));
        let mut req = request(1, 5);
        req.sort_order = "DESC".into();
        let page = get_rows(&mut source, &req).await.unwrap();
        let names: Vec<_> = page.rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["contact-04", "contact-03", "contact-02", "contact-01", "contact-00"]
        );
    }
}
