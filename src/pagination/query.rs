use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::{
    error::PaginationError,
    fields::{FieldDef, FieldValue, Paginated},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only a case-insensitive `desc` sorts descending; anything else is ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => " ASC",
            SortOrder::Desc => " DESC",
        }
    }
}

/// Declarative paging parameters, as received from the boundary.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    pub sort_field: String,
    pub sort_order: String,
    pub search: String,
    pub filters: Map<String, Value>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            sort_field: "name".into(),
            sort_order: "asc".into(),
            search: String::new(),
            filters: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_entries: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub field: &'static FieldDef,
    pub value: FieldValue,
}

#[derive(Debug, Clone)]
pub struct Search {
    pub term: String,
    pub fields: Vec<&'static FieldDef>,
}

/// Row selection shared by the count and the page fetch.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub filters: Vec<Filter>,
    pub search: Option<Search>,
}

#[derive(Debug, Clone, Copy)]
pub struct Sort {
    pub field: &'static FieldDef,
    pub order: SortOrder,
    pub key: &'static FieldDef,
}

pub(crate) fn filter_criteria<T: Paginated>(
    filters: &Map<String, Value>,
) -> Result<Vec<Filter>, PaginationError> {
    filters
        .iter()
        .map(|(key, value)| {
            let field = T::field(key).ok_or_else(|| {
                PaginationError::validation(format!(
                    "Error in filter query. Field '{}' does not exist in {}.",
                    key,
                    T::TABLE
                ))
            })?;
            if field.secret {
                return Err(PaginationError::validation(format!(
                    "Field '{}' cannot be used as a filter.",
                    key
                )));
            }
            Ok(Filter {
                field,
                value: FieldValue::from_json(field, value)?,
            })
        })
        .collect()
}

pub(crate) fn search_criteria<T: Paginated>(search: &str) -> Option<Search> {
    if search.is_empty() {
        return None;
    }
    let fields: Vec<&'static FieldDef> = T::fields().iter().filter(|f| f.is_searchable()).collect();
    if fields.is_empty() {
        return None;
    }
    Some(Search {
        term: search.to_string(),
        fields,
    })
}

pub(crate) fn sort_criteria<T: Paginated>(
    sort_field: &str,
    sort_order: &str,
) -> Result<Sort, PaginationError> {
    let field = T::field(sort_field)
        .filter(|f| !f.secret)
        .ok_or_else(|| {
            PaginationError::validation(format!(
                "Sort field {} does not exist in {}.",
                sort_field,
                T::TABLE
            ))
        })?;
    let key = T::field(T::KEY).ok_or_else(|| {
        PaginationError::Internal(anyhow::anyhow!(
            "key field '{}' is not registered for {}",
            T::KEY,
            T::TABLE
        ))
    })?;
    Ok(Sort {
        field,
        order: SortOrder::parse(sort_order),
        key,
    })
}

impl Criteria {
    /// In-memory evaluation of the same predicate the SQL backend builds.
    pub fn matches<T: Paginated>(&self, row: &T) -> bool {
        let filters_hold = self
            .filters
            .iter()
            .all(|f| row.value_of(f.field.name).as_ref() == Some(&f.value));
        if !filters_hold {
            return false;
        }
        match &self.search {
            None => true,
            Some(search) => {
                let needle = search.term.to_lowercase();
                search.fields.iter().any(|field| {
                    matches!(
                        row.value_of(field.name),
                        Some(FieldValue::Text(text)) if text.to_lowercase().contains(&needle)
                    )
                })
            }
        }
    }
}

impl Sort {
    pub fn compare<T: Paginated>(&self, a: &T, b: &T) -> Ordering {
        let by_field = compare_field(a, b, self.field.name);
        let by_field = match self.order {
            SortOrder::Asc => by_field,
            SortOrder::Desc => by_field.reverse(),
        };
        by_field.then_with(|| compare_field(a, b, self.key.name))
    }
}

fn compare_field<T: Paginated>(a: &T, b: &T, name: &str) -> Ordering {
    match (a.value_of(name), b.value_of(name)) {
        (Some(x), Some(y)) => x.compare(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Escapes LIKE metacharacters so the term is matched literally.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_bare_desc_sorts_descending() {
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse(" desc "), SortOrder::Asc);
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("descending"), SortOrder::Asc);
        assert_eq!(SortOrder::parse(""), SortOrder::Asc);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("doe"), "doe");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn default_request_matches_boundary_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 10);
        assert_eq!(req.sort_field, "name");
        assert_eq!(req.sort_order, "asc");
        assert!(req.search.is_empty());
        assert!(req.filters.is_empty());
    }
}
