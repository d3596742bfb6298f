use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{format_salary, JobProvider, PROVIDER_TIMEOUT};
use crate::models::job::{Job, JobSource};
use crate::search::country::Region;

const BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";

/// Adzuna job search API. Credentialed with an app id and app key pair;
/// the country lives in the URL path and pages are 1-based path segments.
pub struct Adzuna {
    client: reqwest::Client,
    app_id: Option<String>,
    app_key: Option<String>,
}

impl Adzuna {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            app_id: env_key("ADZUNA_APP_ID"),
            app_key: env_key("ADZUNA_APP_KEY"),
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl JobProvider for Adzuna {
    fn name(&self) -> &'static str {
        "adzuna"
    }

    fn is_available(&self) -> bool {
        self.app_id.is_some() && self.app_key.is_some()
    }

    async fn fetch(
        &self,
        phrase: &str,
        region: &Region,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Job>> {
        let (Some(app_id), Some(app_key)) = (&self.app_id, &self.app_key) else {
            return Ok(Vec::new());
        };

        let url = format!("{BASE_URL}/{}/search/{page}", region.adzuna_code);
        let body: Value = self
            .client
            .get(&url)
            .query(&[
                ("app_id", app_id.as_str()),
                ("app_key", app_key.as_str()),
                ("what", phrase),
                ("results_per_page", &limit.to_string()),
                ("content-type", "application/json"),
            ])
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let jobs = body
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|v| parse_job(v, region))
                    .collect()
            })
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

    let company = v
        .pointer("/company/display_name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    let location = v
        .pointer("/location/display_name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let description = v
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let salary_min = v.get("salary_min").and_then(Value::as_f64).map(|s| s as i32);
    let salary_max = v.get("salary_max").and_then(Value::as_f64).map(|s| s as i32);

    let posted_at = v
        .get("created")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    // "full_time"/"part_time" arrive under contract_time, "contract"/
    // "permanent" under contract_type; dashed in our taxonomy.
    let job_type = v
        .get("contract_time")
        .and_then(Value::as_str)
        .or_else(|| v.get("contract_type").and_then(Value::as_str))
        .map(|t| t.replace('_', "-"));

    let is_remote = title.to_lowercase().contains("remote")
        || location.to_lowercase().contains("remote")
        || description.to_lowercase().contains("remote");

    Some(Job {
        source: JobSource::Adzuna,
        source_id: Some(source_id),
        title,
        company,
        location,
        country: Some(region.name.to_string()),
        description,
        salary: format_salary(salary_min, salary_max, region.currency),
        salary_min,
        salary_max,
        salary_currency: Some(region.currency.to_string()),
        job_type,
        sector: v
            .pointer("/category/label")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_remote,
        is_active: true,
        source_url: v
            .get("redirect_url")
            .and_then(Value::as_str)
            .map(str::to_string),
        posted_at,
        ..Job::default()
    })
}
