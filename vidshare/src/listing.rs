//! Paginated, filtered, sorted listings.
//!
//! A [`ListQuery`] arrives from the caller, is checked against a resource's
//! [`ListingPolicy`] and becomes [`ListParams`]. [`list`] then issues the count
//! and the page fetch concurrently. The two are independent reads, so under
//! concurrent writes `total` may not agree exactly with the items returned.

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

use crate::{
    config::ListingSettings,
    errors::RepoError,
    filters::{Filter, FilterCondition},
    id::EntityId,
    projection::{JoinSpec, Joined, Projection, attach},
    store::EntityStore,
    types::{Entity, SortField, SortOrder, SortSpec},
};

pub const DEFAULT_PAGE: u64 = 1;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Listing parameters as callers send them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

impl ListQuery {
    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn sort(mut self, sort_by: impl Into<String>, sort_type: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_type = Some(sort_type.into());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// The `userId` filter, if one was supplied. A malformed id is rejected, not ignored.
    pub fn user_filter(&self) -> Result<Option<EntityId>, RepoError> {
        match self.user_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => EntityId::parse("userId", raw).map(Some),
        }
    }

    /// Validate against `policy` and resolve paging, sorting and text search.
    pub fn into_params(&self, policy: &ListingPolicy, settings: &ListingSettings) -> Result<ListParams, RepoError> {
        let page = self.page.map_or(DEFAULT_PAGE, |p| p.max(1) as u64);
        let page_size = match self.limit {
            Some(limit) => limit.clamp(1, MAX_PAGE_SIZE as i64) as u64,
            None => settings.default_page_size.clamp(1, MAX_PAGE_SIZE),
        };

        let order = match self.sort_type.as_deref().map(str::trim) {
            None | Some("") => SortOrder::Desc,
            Some(raw) if raw.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(raw) if raw.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            Some(raw) => {
                return Err(RepoError::invalid("sortType", format!("expected `asc` or `desc`, got `{raw}`")));
            }
        };

        let sort = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") if self.sort_type.is_none() => policy.default_sort,
            None | Some("") => SortSpec::new(policy.default_sort.field, order),
            Some(name) => {
                let field = policy
                    .sorts
                    .iter()
                    .find(|field| field.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| RepoError::invalid("sortBy", format!("unsupported sort field `{name}`")))?;
                SortSpec::new(field.path, order)
            }
        };

        let mut filter = Filter::new();
        if let Some(term) = self.query.as_deref().map(str::trim).filter(|t| !t.is_empty())
            && !policy.search_fields.is_empty()
        {
            filter = filter.with(FilterCondition::or(
                policy
                    .search_fields
                    .iter()
                    .map(|field| FilterCondition::contains(*field, term)),
            ));
        }

        Ok(ListParams {
            page,
            page_size,
            filter,
            sort,
        })
    }
}

/// Numbers may arrive as JSON numbers or as query-string text. Text is read
/// up to its first non-digit; anything unreadable counts as absent.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => Some(n),
        Some(Raw::Float(f)) if f.is_finite() => Some(f.trunc() as i64),
        Some(Raw::Text(text)) => leading_int(&text),
        _ => None,
    })
}

fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_from = usize::from(text.starts_with(['-', '+']));
    let end = text[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| i + digits_from);
    text[..end].parse().ok()
}

/// Per-resource listing rules.
#[derive(Debug, Clone, Copy)]
pub struct ListingPolicy {
    /// Accepted `sortBy` values
    pub sorts: &'static [SortField],
    pub default_sort: SortSpec,
    /// Fields the `query` text is matched against (any of them)
    pub search_fields: &'static [&'static str],
}

impl ListingPolicy {
    /// Newest first, sortable only by creation time, no text search.
    pub const fn newest_first() -> Self {
        const SORTS: &[SortField] = &[SortField {
            name: "createdAt",
            path: "createdAtTs",
        }];
        Self {
            sorts: SORTS,
            default_sort: SortSpec::new("createdAtTs", SortOrder::Desc),
            search_fields: &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u64,
    pub page_size: u64,
    pub filter: Filter,
    pub sort: SortSpec,
}

impl ListParams {
    #[inline]
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.filter = self.filter.with(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        Self {
            items,
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size.max(1)),
        }
    }

    pub fn empty(params: &ListParams) -> Self {
        Self::new(Vec::new(), params.page, params.page_size, 0)
    }

    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Count and fetch one page concurrently.
pub async fn list<S, T>(store: &S, params: &ListParams) -> Result<Page<T>, RepoError>
where
    S: EntityStore,
    T: Entity,
{
    let (total, items) = tokio::join!(
        store.count::<T>(&params.filter),
        store.query::<T>(&params.filter, Some(params.sort), params.skip(), params.page_size),
    );
    Ok(Page::new(items?, params.page, params.page_size, total?))
}

/// [`list`], then resolve `join` on the page's rows only.
pub async fn list_joined<S, T, P>(store: &S, params: &ListParams, join: JoinSpec<T>) -> Result<Page<Joined<T, P>>, RepoError>
where
    S: EntityStore,
    T: Entity,
    P: Projection,
{
    let mut page = list::<S, T>(store, params).await?;
    let rows = std::mem::take(&mut page.items);
    let joined = attach(store, rows, join).await?;
    Ok(page.with_items(joined))
}
