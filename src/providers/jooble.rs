use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Value};

use super::{JobProvider, PROVIDER_TIMEOUT};
use crate::models::job::{Job, JobSource};
use crate::search::country::Region;

const BASE_URL: &str = "https://jooble.org/api";

/// Jooble aggregator API. Unusual shape: the key is a URL path segment and
/// the search is a POST with a JSON body. Descriptions arrive as HTML
/// snippets with highlight markup.
pub struct Jooble {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl Jooble {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: std::env::var("JOOBLE_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

#[async_trait]
impl JobProvider for Jooble {
    fn name(&self) -> &'static str {
        "jooble"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(
        &self,
        phrase: &str,
        region: &Region,
        page: i64,
        _limit: i64,
    ) -> Result<Vec<Job>> {
        let Some(api_key) = &self.api_key else {
            return Ok(Vec::new());
        };

        let body: Value = self
            .client
            .post(format!("{BASE_URL}/{api_key}"))
            .json(&json!({
                "keywords": phrase,
                "location": region.jooble_location,
                "page": page,
            }))
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let jobs = body
            .get("jobs")
            .and_then(Value::as_array)
            .map(|jobs| jobs.iter().filter_map(|v| parse_job(v, region)).collect())
            .unwrap_or_default();

        Ok(jobs)
    }
}

fn parse_job(v: &Value, region: &Region) -> Option<Job> {
    let source_id = match v.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    let title = v.get("title")?.as_str()?.trim().to_string();

    let location = v
        .get("location")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    let description = v
        .get("snippet")
        .and_then(Value::as_str)
        .map(strip_tags)
        .unwrap_or_default();

    let salary = v
        .get("salary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let is_remote = title.to_lowercase().contains("remote")
        || location.to_lowercase().contains("remote");

    Some(Job {
        source: JobSource::Jooble,
        source_id: Some(source_id),
        title,
        company: v
            .get("company")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string(),
        location,
        country: Some(region.name.to_string()),
        description,
        salary,
        salary_currency: Some(region.currency.to_string()),
        job_type: v
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase()),
        is_remote,
        is_active: true,
        source_url: v.get("link").and_then(Value::as_str).map(str::to_string),
        posted_at: v
            .get("updated")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        ..Job::default()
    })
}

/// Jooble timestamps sometimes carry an offset and sometimes do not.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

/// Drops HTML markup from snippets, keeping only the text content.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ").trim().to_string()
}
