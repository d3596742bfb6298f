use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;
use crate::search::filters::CompiledFilter;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "job_source", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobSource {
    #[default]
    Internal,
    EmployerManual,
    Adzuna,
    Jsearch,
    Jooble,
}

impl JobSource {
    pub fn as_str(self) -> &'static str {
        match self {
            JobSource::Internal => "internal",
            JobSource::EmployerManual => "employer-manual",
            JobSource::Adzuna => "adzuna",
            JobSource::Jsearch => "jsearch",
            JobSource::Jooble => "jooble",
        }
    }

    pub fn is_external(self) -> bool {
        !matches!(self, JobSource::Internal | JobSource::EmployerManual)
    }
}

/// Canonical job record. Stored rows carry an `id`; records freshly fetched
/// from a provider do not until the cache writer has persisted them.
/// `distance` and `apply_url` are computed per request and never persisted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub source: JobSource,
    pub source_id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub country: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub skills: Vec<String>,
    pub salary: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub sector: Option<String>,
    pub is_remote: bool,
    pub is_hybrid: bool,
    pub is_urgent: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub source_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub views: i32,
    pub applications_count: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
}

/// Employer-submitted listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub country: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub salary: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub sector: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub is_hybrid: bool,
    #[serde(default)]
    pub is_urgent: bool,
    pub source_url: Option<String>,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }
        if self.company.trim().is_empty() {
            return Err(AppError::BadRequest("Company is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::BadRequest("Description is required".to_string()));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CachedUpsert {
    #[sqlx(flatten)]
    job: Job,
    was_inserted: bool,
}

/// Null-guarded conditions shared by the page and count queries in
/// [`Job::search`] so the two cannot drift apart. Sector matches as a
/// case-insensitive substring; provider labels vary ("Engineering" vs
/// "Engineering Jobs").
const SEARCH_PREDICATE: &str = "is_active = TRUE \
    AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%' OR company ILIKE '%' || $1 || '%' OR location ILIKE '%' || $1 || '%' OR array_to_string(skills, ' ') ILIKE '%' || $1 || '%') \
    AND (cardinality($2::text[]) = 0 OR EXISTS (SELECT 1 FROM unnest($2::text[]) AS tok WHERE jobs.location ILIKE '%' || tok || '%' OR COALESCE(jobs.country, '') ILIKE '%' || tok || '%')) \
    AND ($3::text IS NULL OR company ILIKE '%' || $3 || '%') \
    AND ($4::text IS NULL OR job_type = $4) \
    AND ($5::text IS NULL OR experience_level = $5) \
    AND ($6::bool IS NULL OR is_remote = $6) \
    AND ($7::text IS NULL OR sector ILIKE '%' || $7 || '%') \
    AND ($8::text IS NULL OR country ILIKE '%' || $8 || '%' OR location ILIKE '%' || $8 || '%') \
    AND ($9::int IS NULL OR salary_min >= $9) \
    AND ($10::int IS NULL OR salary_max <= $10)";

impl Job {
    /// Execute the compiled predicate, returning one page of active rows
    /// plus the exact total count of matching rows.
    pub async fn search(
        pool: &PgPool,
        filter: &CompiledFilter,
    ) -> Result<(Vec<Job>, i64), AppError> {
        let page_sql = format!(
            "SELECT * FROM jobs WHERE {} ORDER BY posted_at DESC NULLS LAST, created_at DESC LIMIT $11 OFFSET $12",
            SEARCH_PREDICATE
        );
        let jobs = sqlx::query_as::<_, Job>(&page_sql)
            .bind(&filter.query)
            .bind(&filter.location_tokens)
            .bind(&filter.company)
            .bind(&filter.job_type)
            .bind(&filter.experience_level)
            .bind(filter.is_remote)
            .bind(&filter.sector)
            .bind(&filter.country)
            .bind(filter.salary_min)
            .bind(filter.salary_max)
            .bind(filter.limit)
            .bind(filter.offset())
            .fetch_all(pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM jobs WHERE {}", SEARCH_PREDICATE);
        let total: (i64,) = sqlx::query_as(&count_sql)
            .bind(&filter.query)
            .bind(&filter.location_tokens)
            .bind(&filter.company)
            .bind(&filter.job_type)
            .bind(&filter.experience_level)
            .bind(filter.is_remote)
            .bind(&filter.sector)
            .bind(&filter.country)
            .bind(filter.salary_min)
            .bind(filter.salary_max)
            .fetch_one(pool)
            .await?;

        Ok((jobs, total.0))
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Job, AppError> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    pub async fn create_manual(pool: &PgPool, input: NewJob) -> Result<Job, AppError> {
        input.validate()?;
        let job = sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (source, title, company, location, country, description, requirements, skills, salary, salary_min, salary_max, salary_currency, job_type, experience_level, sector, is_remote, is_hybrid, is_urgent, source_url, posted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, NOW()) RETURNING *",
        )
        .bind(JobSource::EmployerManual)
        .bind(&input.title)
        .bind(&input.company)
        .bind(&input.location)
        .bind(&input.country)
        .bind(&input.description)
        .bind(&input.requirements)
        .bind(&input.skills)
        .bind(&input.salary)
        .bind(input.salary_min)
        .bind(input.salary_max)
        .bind(&input.salary_currency)
        .bind(&input.job_type)
        .bind(&input.experience_level)
        .bind(&input.sector)
        .bind(input.is_remote)
        .bind(input.is_hybrid)
        .bind(input.is_urgent)
        .bind(&input.source_url)
        .fetch_one(pool)
        .await?;
        Ok(job)
    }

    /// Idempotent upsert keyed by (source, source_id). A fresh record is
    /// inserted with a 7-day expiry; an existing row only gets its
    /// is_active/updated_at touch fields refreshed. Returns the stored row
    /// and whether it was newly inserted.
    pub async fn upsert_cached(pool: &PgPool, job: &Job) -> Result<(Job, bool), AppError> {
        let row = sqlx::query_as::<_, CachedUpsert>(
            "INSERT INTO jobs (source, source_id, title, company, location, country, description, requirements, skills, salary, salary_min, salary_max, salary_currency, job_type, experience_level, sector, is_remote, is_hybrid, is_urgent, is_featured, source_url, posted_at, expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, NOW() + INTERVAL '7 days') \
             ON CONFLICT (source, source_id) DO UPDATE SET is_active = TRUE, updated_at = NOW() \
             RETURNING *, (xmax = 0) AS was_inserted",
        )
        .bind(job.source)
        .bind(&job.source_id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.country)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.skills)
        .bind(&job.salary)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.salary_currency)
        .bind(&job.job_type)
        .bind(&job.experience_level)
        .bind(&job.sector)
        .bind(job.is_remote)
        .bind(job.is_hybrid)
        .bind(job.is_urgent)
        .bind(job.is_featured)
        .bind(&job.source_url)
        .bind(job.posted_at)
        .fetch_one(pool)
        .await?;
        Ok((row.job, row.was_inserted))
    }

    pub async fn touch_views(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE jobs SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Deactivate cached rows past their expiry date. Only cached external
    /// rows carry an expiry_date, so no source guard is needed.
    pub async fn deactivate_expired(pool: &PgPool) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE jobs SET is_active = FALSE, updated_at = NOW() \
             WHERE is_active = TRUE AND expiry_date IS NOT NULL AND expiry_date < NOW()",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> NewJob {
        NewJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Pune, MH".to_string(),
            country: Some("IN".to_string()),
            description: "Build and operate the services behind our hiring platform.".to_string(),
            requirements: None,
            skills: vec!["rust".to_string()],
            salary: None,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            job_type: Some("full-time".to_string()),
            experience_level: None,
            sector: None,
            is_remote: false,
            is_hybrid: false,
            is_urgent: false,
            source_url: None,
        }
    }

    #[test]
    fn validate_accepts_complete_submission() {
        assert!(new_job().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        let mut input = new_job();
        input.title = "   ".to_string();
        assert!(matches!(
            input.validate(),
            Err(AppError::BadRequest(_))
        ));

        let mut input = new_job();
        input.company = String::new();
        assert!(input.validate().is_err());

        let mut input = new_job();
        input.description = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn source_tags_use_kebab_case() {
        assert_eq!(JobSource::EmployerManual.as_str(), "employer-manual");
        assert_eq!(
            serde_json::to_value(JobSource::EmployerManual).unwrap(),
            serde_json::json!("employer-manual")
        );
        assert!(JobSource::Adzuna.is_external());
        assert!(!JobSource::Internal.is_external());
        assert!(!JobSource::EmployerManual.is_external());
    }

    #[test]
    fn sector_filter_matches_provider_labels_by_substring() {
        // Adzuna sends category labels like "Engineering Jobs"; a sector
        // query for "engineering" has to hit them.
        assert!(SEARCH_PREDICATE.contains("sector ILIKE '%' || $7 || '%'"));
    }

    #[test]
    fn job_serializes_camel_case_and_skips_derived_when_absent() {
        let job = Job {
            source: JobSource::Jsearch,
            source_id: Some("abc".to_string()),
            title: "Data Engineer".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["sourceId"], "abc");
        assert!(value.get("distance").is_none());
        assert!(value.get("applyUrl").is_none());
        assert!(value.get("id").is_none());
    }
}
