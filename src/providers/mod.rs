pub mod adzuna;
pub mod jooble;
pub mod jsearch;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;

use crate::models::job::Job;
use crate::search::country::Region;

/// Ceiling on a single provider call. A provider that cannot answer in time
/// contributes nothing to the request instead of stalling it.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait JobProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the adapter has the credentials it needs. Unavailable
    /// providers stay registered but are never called.
    fn is_available(&self) -> bool;

    async fn fetch(&self, phrase: &str, region: &Region, page: i64, limit: i64)
    -> Result<Vec<Job>>;
}

/// All known provider adapters, constructed once at startup. Credential
/// presence is checked at construction and never mutated afterwards.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn JobProvider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Box<dyn JobProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_env() -> Self {
        Self::new(vec![
            Box::new(adzuna::Adzuna::from_env()),
            Box::new(jsearch::Jsearch::from_env()),
            Box::new(jooble::Jooble::from_env()),
        ])
    }

    pub fn available(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.name())
            .collect()
    }

    /// Fans out one call per available provider per region and waits for
    /// every call to settle. Failures and timeouts are logged and contribute
    /// an empty list, so one bad provider never costs us the others.
    pub async fn fetch_all(
        &self,
        phrase: &str,
        regions: &[&Region],
        page: i64,
        limit: i64,
    ) -> Vec<Job> {
        let calls = self
            .providers
            .iter()
            .filter(|p| p.is_available())
            .flat_map(|p| {
                regions
                    .iter()
                    .map(move |region| fetch_one(p.as_ref(), phrase, region, page, limit))
            });

        join_all(calls).await.into_iter().flatten().collect()
    }
}

async fn fetch_one(
    provider: &dyn JobProvider,
    phrase: &str,
    region: &Region,
    page: i64,
    limit: i64,
) -> Vec<Job> {
    match tokio::time::timeout(PROVIDER_TIMEOUT, provider.fetch(phrase, region, page, limit)).await
    {
        Ok(Ok(jobs)) => {
            tracing::debug!(
                provider = provider.name(),
                region = region.code,
                count = jobs.len(),
                "provider returned results"
            );
            jobs
        }
        Ok(Err(err)) => {
            tracing::warn!(
                provider = provider.name(),
                region = region.code,
                error = %err,
                "provider fetch failed"
            );
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                provider = provider.name(),
                region = region.code,
                "provider fetch timed out"
            );
            Vec::new()
        }
    }
}

pub(crate) fn format_salary(min: Option<i32>, max: Option<i32>, currency: &str) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("{currency} {min} - {max}")),
        (Some(min), None) => Some(format!("{currency} from {min}")),
        (None, Some(max)) => Some(format!("{currency} up to {max}")),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobSource;
    use crate::search::country;

    struct StubProvider {
        name: &'static str,
        available: bool,
        outcome: Outcome,
    }

    enum Outcome {
        Jobs(usize),
        Error,
        Hang,
    }

    #[async_trait]
    impl JobProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn fetch(
            &self,
            _phrase: &str,
            region: &Region,
            _page: i64,
            _limit: i64,
        ) -> Result<Vec<Job>> {
            match self.outcome {
                Outcome::Jobs(count) => Ok((0..count)
                    .map(|i| Job {
                        source: JobSource::Adzuna,
                        source_id: Some(format!("{}-{}-{i}", self.name, region.code)),
                        title: format!("Job {i}"),
                        ..Job::default()
                    })
                    .collect()),
                Outcome::Error => anyhow::bail!("upstream says no"),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn regions(codes: &[&str]) -> Vec<&'static Region> {
        codes
            .iter()
            .map(|c| country::find(c).expect("known region"))
            .collect()
    }

    #[tokio::test]
    async fn one_failing_provider_does_not_sink_the_batch() {
        let registry = ProviderRegistry::new(vec![
            Box::new(StubProvider {
                name: "good",
                available: true,
                outcome: Outcome::Jobs(2),
            }),
            Box::new(StubProvider {
                name: "bad",
                available: true,
                outcome: Outcome::Error,
            }),
        ]);

        let jobs = registry.fetch_all("engineer", &regions(&["IN"]), 1, 20).await;
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn unavailable_providers_are_skipped_entirely() {
        let registry = ProviderRegistry::new(vec![Box::new(StubProvider {
            name: "keyless",
            available: false,
            outcome: Outcome::Jobs(5),
        })]);

        assert!(registry.available().is_empty());
        let jobs = registry.fetch_all("engineer", &regions(&["IN"]), 1, 20).await;
        assert!(jobs.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn a_hung_provider_is_cut_off_at_the_timeout() {
        let registry = ProviderRegistry::new(vec![
            Box::new(StubProvider {
                name: "hung",
                available: true,
                outcome: Outcome::Hang,
            }),
            Box::new(StubProvider {
                name: "good",
                available: true,
                outcome: Outcome::Jobs(1),
            }),
        ]);

        let jobs = registry.fetch_all("engineer", &regions(&["IN"]), 1, 20).await;
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn every_available_provider_is_called_once_per_region() {
        let registry = ProviderRegistry::new(vec![
            Box::new(StubProvider {
                name: "a",
                available: true,
                outcome: Outcome::Jobs(1),
            }),
            Box::new(StubProvider {
                name: "b",
                available: true,
                outcome: Outcome::Jobs(1),
            }),
        ]);

        let jobs = registry
            .fetch_all("engineer", &regions(&["IN", "GB", "US"]), 1, 20)
            .await;
        assert_eq!(jobs.len(), 6);
    }

    #[test]
    fn salary_strings_cover_partial_bounds() {
        assert_eq!(
            format_salary(Some(50000), Some(80000), "INR"),
            Some("INR 50000 - 80000".to_string())
        );
        assert_eq!(
            format_salary(Some(50000), None, "USD"),
            Some("USD from 50000".to_string())
        );
        assert_eq!(
            format_salary(None, Some(80000), "GBP"),
            Some("GBP up to 80000".to_string())
        );
        assert_eq!(format_salary(None, None, "EUR"), None);
    }
}
