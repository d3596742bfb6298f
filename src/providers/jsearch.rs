use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{format_salary, JobProvider, PROVIDER_TIMEOUT};
use crate::models::job::{Job, JobSource};
use crate::search::country::Region;

const BASE_URL: &str = "https://jsearch.p.rapidapi.com/search";
const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";

/// JSearch on RapidAPI. One shared RapidAPI key, country passed as a query
/// parameter, results under a `data` array.
pub struct Jsearch {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl Jsearch {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: std::env::var("RAPIDAPI_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

#[async_trait]
impl JobProvider for Jsearch {
    fn name(&self) -> &'static str {
        "jsearch"
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
            .get(BASE_URL)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .query(&[
                ("query", phrase),
                ("page", &page.to_string()),
                ("num_pages", "1"),
                ("country", region.jsearch_code),
            ])
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let jobs = body
            .get("data")
            .and_then(Value::as_array)
            .map(|data| data.iter().filter_map(|v| parse_job(v, region)).collect())
            .unwrap_or_default();

        Ok(jobs)
    }
}

fn parse_job(v: &Value, region: &Region) -> Option<Job> {
    let source_id = v.get("job_id")?.as_str()?.to_string();
    let title = v.get("job_title")?.as_str()?.trim().to_string();

    let company = v
        .get("employer_name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let city = v.get("job_city").and_then(Value::as_str).unwrap_or("");
    let state = v.get("job_state").and_then(Value::as_str).unwrap_or("");
    let job_country = v.get("job_country").and_then(Value::as_str).unwrap_or("");
    let location = [city, state, job_country]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    let description = v
        .get("job_description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let salary_min = v
        .get("job_min_salary")
        .and_then(Value::as_f64)
        .map(|s| s as i32);
    let salary_max = v
        .get("job_max_salary")
        .and_then(Value::as_f64)
        .map(|s| s as i32);
    let currency = v
        .get("job_salary_currency")
        .and_then(Value::as_str)
        .unwrap_or(region.currency);

    let is_remote = v
        .get("job_is_remote")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || location.to_lowercase().contains("remote");

    Some(Job {
        source: JobSource::Jsearch,
        source_id: Some(source_id),
        title,
        company,
        location,
        country: Some(region.name.to_string()),
        description,
        salary: format_salary(salary_min, salary_max, currency),
        salary_min,
        salary_max,
        salary_currency: Some(currency.to_string()),
        job_type: v
            .get("job_employment_type")
            .and_then(Value::as_str)
            .map(normalize_job_type),
        is_remote,
        is_active: true,
        source_url: v
            .get("job_apply_link")
            .and_then(Value::as_str)
            .map(str::to_string),
        posted_at: v
            .get("job_posted_at_datetime_utc")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        ..Job::default()
    })
}

/// JSearch reports employment types as bare uppercase words.
fn normalize_job_type(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "fulltime" => "full-time".to_string(),
        "parttime" => "part-time".to_string(),
        "contractor" => "contract".to_string(),
        "intern" => "internship".to_string(),
        other => other.to_string(),
    }
}
