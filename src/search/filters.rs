use std::str::FromStr;

use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;

/// Phrase sent to external providers when the request carries neither a
/// free-text query nor a usable location.
pub const DEFAULT_SEARCH_PHRASE: &str = "software engineer";

/// Raw query-string parameters. Everything arrives as an optional string and
/// is parsed defensively; a malformed value falls back to its default
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub is_remote: Option<String>,
    pub sector: Option<String>,
    pub country: Option<String>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub radius: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub include_external: Option<String>,
    pub include_database: Option<String>,
}

/// Normalized, provider-agnostic predicate produced by [`compile`].
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub query: Option<String>,
    pub location_tokens: Vec<String>,
    pub company: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub is_remote: Option<bool>,
    pub sector: Option<String>,
    pub country: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub page: i64,
    pub limit: i64,
    pub radius_km: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub include_external: Option<bool>,
    pub include_database: bool,
    pub search_phrase: String,
}

impl CompiledFilter {
    /// `page` is only lower-bounded, so the multiply must saturate to keep
    /// absurd page numbers from wrapping into a negative offset.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub fn compile(params: &SearchParams) -> CompiledFilter {
    let query = non_blank(&params.query);
    let location = non_blank(&params.location);

    let location_tokens: Vec<String> = location
        .as_deref()
        .map(|loc| {
            loc.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let page = parse_or(params.page.as_deref(), 1).max(1);
    let limit = parse_or(params.limit.as_deref(), DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT);

    let search_phrase = query.clone().unwrap_or_else(|| {
        location_tokens
            .first()
            .map(|token| format!("jobs in {token}"))
            .unwrap_or_else(|| DEFAULT_SEARCH_PHRASE.to_string())
    });

    CompiledFilter {
        query,
        location_tokens,
        company: non_blank(&params.company),
        job_type: non_blank(&params.job_type),
        experience_level: non_blank(&params.experience_level),
        is_remote: parse_bool(params.is_remote.as_deref()),
        sector: non_blank(&params.sector),
        country: non_blank(&params.country),
        salary_min: parse_validated(params.salary_min.as_deref(), |v: &i32| *v >= 0),
        salary_max: parse_validated(params.salary_max.as_deref(), |v: &i32| *v >= 0),
        page,
        limit,
        radius_km: parse_validated(params.radius.as_deref(), |v: &f64| *v > 0.0),
        lat: parse_validated(params.lat.as_deref(), |v: &f64| (-90.0..=90.0).contains(v)),
        lng: parse_validated(params.lng.as_deref(), |v: &f64| {
            (-180.0..=180.0).contains(v)
        }),
        include_external: parse_bool(params.include_external.as_deref()),
        include_database: parse_bool(params.include_database.as_deref()).unwrap_or(true),
        search_phrase,
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn parse_validated<T: FromStr>(raw: Option<&str>, valid: impl Fn(&T) -> bool) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok()).filter(|v| valid(v))
}

/// Only literal "true"/"false" count; anything else is treated as absent.
fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let mut p = SearchParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "query" => p.query = value,
                "location" => p.location = value,
                "isRemote" => p.is_remote = value,
                "salaryMin" => p.salary_min = value,
                "page" => p.page = value,
                "limit" => p.limit = value,
                "lat" => p.lat = value,
                "radius" => p.radius = value,
                "includeExternal" => p.include_external = value,
                "includeDatabase" => p.include_database = value,
                other => panic!("unknown param {other}"),
            }
        }
        p
    }

    #[test]
    fn empty_params_compile_to_defaults() {
        let filter = compile(&SearchParams::default());
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert!(filter.query.is_none());
        assert!(filter.location_tokens.is_empty());
        assert!(filter.include_database);
        assert!(filter.include_external.is_none());
        assert_eq!(filter.search_phrase, DEFAULT_SEARCH_PHRASE);
    }

    #[test]
    fn malformed_numbers_fall_back_instead_of_failing() {
        let filter = compile(&params(&[
            ("page", "abc"),
            ("limit", "lots"),
            ("salaryMin", "12k"),
            ("lat", "91.5"),
            ("radius", "-10"),
        ]));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert!(filter.salary_min.is_none());
        assert!(filter.lat.is_none());
        assert!(filter.radius_km.is_none());
    }

    #[test]
    fn page_and_limit_are_clamped() {
        let filter = compile(&params(&[("page", "0"), ("limit", "5000")]));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_LIMIT);

        let filter = compile(&params(&[("page", "3"), ("limit", "-2")]));
        assert_eq!(filter.page, 3);
        assert_eq!(filter.limit, MIN_LIMIT);
        assert_eq!(filter.offset(), 2);
    }

    #[test]
    fn extreme_page_numbers_keep_the_offset_in_range() {
        let filter = compile(&params(&[("page", &i64::MAX.to_string())]));
        assert_eq!(filter.page, i64::MAX);
        assert_eq!(filter.offset(), i64::MAX);
    }

    #[test]
    fn location_splits_into_trimmed_tokens() {
        let filter = compile(&params(&[("location", " Pune , India ,, ")]));
        assert_eq!(filter.location_tokens, vec!["Pune", "India"]);
    }

    #[test]
    fn search_phrase_prefers_query_then_location() {
        let filter = compile(&params(&[("query", "rust engineer"), ("location", "Pune")]));
        assert_eq!(filter.search_phrase, "rust engineer");

        let filter = compile(&params(&[("location", "Pune, India")]));
        assert_eq!(filter.search_phrase, "jobs in Pune");

        let filter = compile(&SearchParams::default());
        assert_eq!(filter.search_phrase, DEFAULT_SEARCH_PHRASE);
    }

    #[test]
    fn booleans_only_accept_literals() {
        assert_eq!(
            compile(&params(&[("isRemote", "true")])).is_remote,
            Some(true)
        );
        assert_eq!(
            compile(&params(&[("includeExternal", "false")])).include_external,
            Some(false)
        );
        assert_eq!(compile(&params(&[("isRemote", "1")])).is_remote, None);
        assert!(compile(&params(&[("includeDatabase", "nope")])).include_database);
    }

    #[test]
    fn blank_strings_are_treated_as_absent() {
        let filter = compile(&params(&[("query", "   ")]));
        assert!(filter.query.is_none());
        assert_eq!(filter.search_phrase, DEFAULT_SEARCH_PHRASE);
    }
}
