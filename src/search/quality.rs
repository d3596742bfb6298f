use crate::models::job::Job;

/// Descriptions shorter than this (after trimming) are treated as
/// placeholder data.
const MIN_DESCRIPTION_LEN: usize = 50;

/// A description under this length that also matches two or more generic
/// phrases is treated as boilerplate. Longer descriptions are kept even
/// when they contain common phrases, so real postings that open with a
/// stock sentence are not rejected.
const GENERIC_MAX_LEN: usize = 200;

static GENERIC_PHRASES: &[&str] = &[
    "we are looking for",
    "join our team",
    "great opportunity",
    "dynamic environment",
    "growing team",
    "exciting projects",
    "talented professionals",
    "job description not available",
];

pub fn is_quality(job: &Job) -> bool {
    if job.title.trim().is_empty() || job.company.trim().is_empty() {
        return false;
    }

    let description = job.description.trim();
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        return false;
    }

    if description.chars().count() < GENERIC_MAX_LEN {
        let lowered = description.to_lowercase();
        let generic_hits = GENERIC_PHRASES
            .iter()
            .filter(|phrase| lowered.contains(*phrase))
            .count();
        if generic_hits >= 2 {
            return false;
        }
    }

    true
}

pub fn filter(jobs: Vec<Job>) -> Vec<Job> {
    jobs.into_iter().filter(is_quality).collect()
}
