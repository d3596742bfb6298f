use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::filters::{self, CompiledFilter, SearchParams};
use super::store::StorePage;
use super::{cache, country, dedupe, estimate, geo, quality, store};
use crate::error::AppError;
use crate::models::job::Job;
use crate::providers::ProviderRegistry;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_jobs: i64,
    pub has_more: bool,
    pub next_page: Option<i64>,
    pub jobs_per_page: i64,
    pub total_pages: i64,
}

impl Pagination {
    fn zeroed() -> Self {
        Self {
            current_page: 0,
            total_jobs: 0,
            has_more: false,
            next_page: None,
            jobs_per_page: 0,
            total_pages: 0,
        }
    }
}

/// How many records in the response set came from each channel. `sample`
/// is a legacy field the UI still reads; nothing serves sample data.
#[derive(Debug, Serialize)]
pub struct SourceCounts {
    pub database: i64,
    pub external: i64,
    pub sample: i64,
}

impl SourceCounts {
    fn zeroed() -> Self {
        Self {
            database: 0,
            external: 0,
            sample: 0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub search_phrase: String,
    pub regions: Vec<&'static str>,
    pub external_attempted: bool,
    pub store_degraded: bool,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub jobs: Vec<Job>,
    pub pagination: Pagination,
    pub sources: SourceCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl SearchResponse {
    /// Envelope for an unexpected pipeline failure. Provider and store
    /// outages never produce this; they degrade the result set instead.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            jobs: Vec::new(),
            pagination: Pagination::zeroed(),
            sources: SourceCounts::zeroed(),
            metadata: None,
        }
    }
}

/// Response-set counts per channel, taken after dedup and before caching
/// while id presence still tells the two channels apart. Only records that
/// will survive the quality filter are counted.
#[derive(Debug, Clone, Copy)]
struct ChannelCounts {
    database: i64,
    external: i64,
}

impl ChannelCounts {
    fn of(merged: &[Job]) -> Self {
        let database = merged
            .iter()
            .filter(|j| j.id.is_some() && quality::is_quality(j))
            .count() as i64;
        let external = merged
            .iter()
            .filter(|j| j.id.is_none() && j.source.is_external() && quality::is_quality(j))
            .count() as i64;
        Self { database, external }
    }
}

/// Runs one aggregated search: compile the filter, fetch the store page and
/// the external providers concurrently, merge by trust, cache fresh
/// external records, quality-filter, and assemble the envelope.
///
/// External providers are consulted when the request asks for them, when a
/// free-text query was given, or as a fallback when the store is degraded;
/// an explicit `includeExternal=false` always wins.
pub async fn search(
    pool: &PgPool,
    registry: &ProviderRegistry,
    params: &SearchParams,
) -> Result<SearchResponse, AppError> {
    let filter = filters::compile(params);
    let regions = country::resolve(params.location.as_deref(), filter.country.as_deref());
    let region_codes: Vec<&'static str> = regions.iter().map(|r| r.code).collect();
    let request_id = Uuid::new_v4().to_string();

    tracing::debug!(
        request_id = %request_id,
        phrase = %filter.search_phrase,
        regions = ?region_codes,
        page = filter.page,
        "compiled search"
    );

    let eager_external = filter.include_external == Some(true)
        || (filter.query.is_some() && filter.include_external != Some(false));

    let (store_page, mut external_jobs) = if eager_external {
        tokio::join!(
            store::fetch(pool, &filter),
            registry.fetch_all(&filter.search_phrase, &regions, filter.page, filter.limit)
        )
    } else {
        (store::fetch(pool, &filter).await, Vec::new())
    };

    // Second chance for requests that would otherwise come back empty when
    // the store is down.
    let mut external_attempted = eager_external;
    if store_page.degraded && !external_attempted && filter.include_external != Some(false) {
        external_jobs = registry
            .fetch_all(&filter.search_phrase, &regions, filter.page, filter.limit)
            .await;
        external_attempted = true;
    }

    let StorePage {
        jobs: mut combined,
        total: store_total,
        degraded,
    } = store_page;
    combined.extend(external_jobs);

    let mut merged = dedupe::merge(combined);
    let counts = ChannelCounts::of(&merged);

    if cache_enabled(&filter, degraded) {
        cache::persist_external(pool, &mut merged).await;
    }

    tracing::info!(
        request_id = %request_id,
        database = counts.database,
        external = counts.external,
        degraded,
        external_attempted,
        "search aggregated"
    );

    let metadata = Metadata {
        search_phrase: filter.search_phrase.clone(),
        regions: region_codes,
        external_attempted,
        store_degraded: degraded,
        request_id,
        timestamp: Utc::now(),
    };

    Ok(assemble(merged, store_total, counts, &filter, metadata))
}

/// The cache writer runs only when the request wants the store involved and
/// the store is actually reachable. A request with `includeDatabase=false`
/// must not write into the store it asked us to leave out.
fn cache_enabled(filter: &CompiledFilter, degraded: bool) -> bool {
    filter.include_database && !degraded
}

/// Pure tail of the pipeline: quality filter, sort, geo pass, page slice,
/// apply link computation, and the envelope itself.
fn assemble(
    merged: Vec<Job>,
    store_total: i64,
    counts: ChannelCounts,
    filter: &CompiledFilter,
    metadata: Metadata,
) -> SearchResponse {
    let mut jobs = quality::filter(merged);

    // The store's own ordering is kept for store-only result sets.
    if counts.external > 0 {
        jobs.sort_by(|a, b| {
            let a_key = a.posted_at.or(a.created_at);
            let b_key = b.posted_at.or(b.created_at);
            b_key.cmp(&a_key)
        });
    }

    if let (Some(lat), Some(lng)) = (filter.lat, filter.lng) {
        geo::apply(&mut jobs, lat, lng, filter.radius_km);
    }

    let total = estimate::estimate_total(store_total, counts.external, filter.limit);
    jobs.truncate(filter.limit as usize);

    for job in &mut jobs {
        job.apply_url = if job.source.is_external() {
            job.source_url.clone()
        } else {
            job.id.map(|id| format!("/jobs/{id}"))
        };
    }

    // Stable desugaring of `i64::div_ceil` (unstable for signed ints):
    // quotient rounded toward positive infinity.
    let (quot, rem) = (total / filter.limit, total % filter.limit);
    let total_pages = if (rem > 0 && filter.limit > 0) || (rem < 0 && filter.limit < 0) {
        quot + 1
    } else {
        quot
    };
    let has_more = filter.page < total_pages;

    SearchResponse {
        success: true,
        error: None,
        jobs,
        pagination: Pagination {
            current_page: filter.page,
            total_jobs: total,
            has_more,
            next_page: if has_more { Some(filter.page + 1) } else { None },
            jobs_per_page: filter.limit,
            total_pages,
        },
        sources: SourceCounts {
            database: counts.database,
            external: counts.external,
            sample: 0,
        },
        metadata: Some(metadata),
    }
}
