use std::collections::HashMap;

use crate::models::job::{Job, JobSource};

/// Trust ranking used to resolve duplicate listings. Employer submissions
/// outrank anything retrieved from the store, which outranks a fresh
/// external fetch. A cached external row carries a store id and is ranked
/// as stored data, not as its original provider.
fn trust_rank(job: &Job) -> u8 {
    match job.source {
        JobSource::EmployerManual => 3,
        JobSource::Internal => 2,
        _ if job.id.is_some() => 2,
        _ => 1,
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Locations are compared on the portion before the first comma, so
/// "Pune, MH" and "Pune, India" collapse to the same key.
fn normalize_location(value: &str) -> String {
    normalize(value.split(',').next().unwrap_or(""))
}

fn primary_key(job: &Job) -> String {
    format!(
        "{}|{}|{}",
        normalize(&job.title),
        normalize(&job.company),
        normalize_location(&job.location)
    )
}

fn secondary_key(job: &Job) -> String {
    format!("{}|{}", normalize(&job.title), normalize(&job.company))
}

/// Stable identity for a record: the store id when present, then the
/// provider-qualified source id, then the content key so nothing is ever
/// keyless.
fn identity_key(job: &Job) -> String {
    if let Some(id) = job.id {
        return format!("db:{id}");
    }
    match job.source_id.as_deref().filter(|s| !s.is_empty()) {
        Some(source_id) => format!("{}-{}", job.source.as_str(), source_id),
        None => primary_key(job),
    }
}

/// Merges records in input order into a unique-by-identity set. A later
/// record with a colliding identity or content key replaces the held one
/// only when it has strictly higher trust; ties keep the first-seen record
/// in its original position.
pub fn merge(records: Vec<Job>) -> Vec<Job> {
    let mut slots: Vec<Job> = Vec::with_capacity(records.len());
    let mut by_identity: HashMap<String, usize> = HashMap::new();
    let mut by_content: HashMap<String, usize> = HashMap::new();

    for record in records {
        let ikey = identity_key(&record);
        let pkey = primary_key(&record);
        let skey = secondary_key(&record);

        let existing = by_identity
            .get(&ikey)
            .or_else(|| by_content.get(&pkey))
            .or_else(|| by_content.get(&skey))
            .copied();

        match existing {
            Some(slot) => {
                if trust_rank(&record) > trust_rank(&slots[slot]) {
                    slots[slot] = record;
                }
                // Either way the incoming keys now resolve to this slot, so
                // later variants of the same listing keep collapsing here.
                by_identity.insert(ikey, slot);
                by_content.insert(pkey, slot);
                by_content.insert(skey, slot);
            }
            None => {
                let slot = slots.len();
                slots.push(record);
                by_identity.insert(ikey, slot);
                by_content.insert(pkey, slot);
                by_content.insert(skey, slot);
            }
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external(source: JobSource, source_id: &str, title: &str, company: &str, location: &str) -> Job {
        Job {
            source,
            source_id: Some(source_id.to_string()),
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            ..Job::default()
        }
    }

    fn stored(id: i32, source: JobSource, title: &str, company: &str, location: &str) -> Job {
        Job {
            id: Some(id),
            ..external(source, &format!("s-{id}"), title, company, location)
        }
    }

    #[test]
    fn location_variants_collapse_to_one_key() {
        assert_eq!(normalize_location("Pune, MH"), "pune");
        assert_eq!(normalize_location("Pune, India"), "pune");
        assert_eq!(normalize_location(" PUNE "), "pune");
    }

    #[test]
    fn employer_listing_wins_regardless_of_arrival_order() {
        let manual = stored(1, JobSource::EmployerManual, "backend engineer", "ACME", "Pune, MH");
        let copy = external(JobSource::Adzuna, "az-1", "Backend Engineer", "Acme", "Pune");

        let out = merge(vec![copy.clone(), manual.clone()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, JobSource::EmployerManual);

        let out = merge(vec![manual, copy]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, JobSource::EmployerManual);
    }

    #[test]
    fn stored_rows_are_not_replaced_by_fresh_external_copies() {
        let cached = stored(7, JobSource::Adzuna, "Data Analyst", "Globex", "Mumbai");
        let fresh = external(JobSource::Jooble, "jb-9", "Data Analyst", "Globex", "Mumbai, MH");

        let out = merge(vec![cached, fresh]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, Some(7));
    }

    #[test]
    fn equal_trust_keeps_the_first_seen_record() {
        let first = external(JobSource::Adzuna, "az-1", "QA Engineer", "Initech", "Delhi");
        let second = external(JobSource::Jsearch, "js-2", "QA Engineer", "Initech", "Delhi");

        let out = merge(vec![first, second]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, JobSource::Adzuna);
    }

    #[test]
    fn replacement_preserves_the_original_position() {
        let records = vec![
            external(JobSource::Adzuna, "az-1", "Backend Engineer", "Acme", "Pune"),
            external(JobSource::Adzuna, "az-2", "Frontend Engineer", "Acme", "Pune"),
            stored(3, JobSource::EmployerManual, "Backend Engineer", "Acme", "Pune"),
        ];

        let out = merge(records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, JobSource::EmployerManual);
        assert_eq!(out[1].title, "Frontend Engineer");
    }

    #[test]
    fn secondary_key_catches_differing_location_strings() {
        let a = external(JobSource::Adzuna, "az-1", "SRE", "Hooli", "Bangalore");
        let b = external(JobSource::Jooble, "jb-2", "SRE", "Hooli", "Remote");

        let out = merge(vec![a, b]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn no_identity_ever_appears_twice() {
        let records = vec![
            external(JobSource::Adzuna, "az-1", "Role A", "X Corp", "Pune"),
            external(JobSource::Adzuna, "az-1", "Role A (updated)", "X Corp", "Pune"),
            stored(5, JobSource::Internal, "Role B", "Y Corp", "Delhi"),
            stored(5, JobSource::Internal, "Role B", "Y Corp", "Delhi"),
        ];

        let out = merge(records);
        let mut keys: Vec<String> = out.iter().map(identity_key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), out.len());
    }

    #[test]
    fn keyless_records_fall_back_to_content_identity() {
        let mut anon = external(JobSource::Jooble, "", "Designer", "Umbrella", "Chennai");
        anon.source_id = None;

        let out = merge(vec![anon.clone(), anon]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn distinct_listings_pass_through_in_order() {
        let records = vec![
            stored(1, JobSource::Internal, "Role A", "Acme", "Pune"),
            stored(2, JobSource::Internal, "Role B", "Acme", "Pune"),
            external(JobSource::Adzuna, "az-1", "Role C", "Globex", "Mumbai"),
        ];

        let out = merge(records);
        assert_eq!(out.len(), 3);
        let titles: Vec<&str> = out.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["Role A", "Role B", "Role C"]);
    }
}
