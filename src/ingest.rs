//! Turning loosely typed backend JSON into records.
//!
//! The backend is not under our control: ids arrive as `_id` or `id`, lists
//! arrive as arrays or comma-separated strings, and required-looking fields
//! are routinely missing. Nothing here fails; bad input degrades to
//! defaults or is skipped with a warning.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::warn;

use crate::models::{Candidate, Employer, Job, Record, RecordKind};

const LIST_KEYS: [&str; 3] = ["data", "results", "items"];

pub trait Ingest: Record + Sized {
    fn from_raw(raw: &Value) -> Option<Self>;
}

/// Pulls the record array out of a response body.
pub fn extract_list(body: Value, kind: RecordKind) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let list_key = LIST_KEYS
                .iter()
                .copied()
                .chain([kind.path()])
                .find(|key| map.get(*key).is_some_and(Value::is_array));
            if let Some(Value::Array(items)) = list_key.and_then(|key| map.remove(key)) {
                return items;
            }
            // {"data": {"jobs": [...]}}
            if let Some(inner @ Value::Object(_)) = map.remove("data") {
                return extract_list(inner, kind);
            }
            warn!(kind = %kind, "response did not contain a record list");
            Vec::new()
        }
        _ => {
            warn!(kind = %kind, "response body was not a list or object");
            Vec::new()
        }
    }
}

/// Pulls a single record out of a response body.
pub fn extract_one(body: Value, kind: RecordKind) -> Value {
    let singular = kind.path().trim_end_matches('s');
    match body {
        Value::Object(mut map) => {
            let wrapper = ["data", singular]
                .into_iter()
                .find(|key| map.get(*key).is_some_and(Value::is_object));
            match wrapper.and_then(|key| map.remove(key)) {
                Some(inner) => inner,
                None => Value::Object(map),
            }
        }
        other => other,
    }
}

/// Normalizes every raw record, dropping those without an id and keeping
/// the first occurrence of a duplicated id.
pub fn ingest<R: Ingest>(raws: &[Value]) -> Vec<R> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(raws.len());

    for raw in raws {
        let Some(record) = R::from_raw(raw) else {
            warn!("skipping record without an id");
            continue;
        };
        if seen.insert(record.id().to_string()) {
            records.push(record);
        } else {
            warn!(id = record.id(), "skipping duplicate record");
        }
    }

    records
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-blank string (or number) among `keys`.
fn str_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw.get(key).and_then(text))
}

fn id_of(raw: &Value) -> Option<String> {
    str_field(raw, &["_id", "id"])
}

/// Accepts `["a", "b"]`, `"a, b"`, or `[{"name": "a"}]`.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| text(item).or_else(|| str_field(item, &["name", "label"])))
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = value?.as_str()?;
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn salary(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(range) => {
            let min = range.get("min").and_then(text);
            let max = range.get("max").and_then(text);
            match (min, max) {
                (Some(min), Some(max)) => Some(format!("${} - ${}", min, max)),
                (Some(min), None) => Some(format!("${}+", min)),
                (None, Some(max)) => Some(format!("up to ${}", max)),
                (None, None) => None,
            }
        }
        Value::Number(n) => Some(format!("${}", n)),
        other => text(other),
    }
}

impl Ingest for Job {
    fn from_raw(raw: &Value) -> Option<Self> {
        let employer = raw.get("employer");
        let employer_id = str_field(raw, &["employerId", "employer_id"])
            .or_else(|| employer.and_then(id_of))
            .or_else(|| employer.and_then(text));
        let company = str_field(raw, &["company", "companyName"])
            .or_else(|| employer.and_then(|e| str_field(e, &["companyName", "name"])))
            .unwrap_or_else(|| "Unknown Company".to_string());

        let mut categories = string_list(raw.get("category"));
        if categories.is_empty() {
            categories = string_list(raw.get("tags"));
        }

        Some(Job {
            id: id_of(raw)?,
            title: str_field(raw, &["title"]).unwrap_or_else(|| "Untitled Position".to_string()),
            company,
            location: str_field(raw, &["location"]).unwrap_or_else(|| "Remote".to_string()),
            job_type: str_field(raw, &["jobType", "type"]).unwrap_or_else(|| "Full-time".to_string()),
            categories,
            salary: salary(raw.get("salary")),
            created_at: timestamp(raw.get("createdAt")),
            featured: flag(raw.get("featured")),
            employer_id,
            description: str_field(raw, &["description"]),
        })
    }
}

impl Ingest for Candidate {
    fn from_raw(raw: &Value) -> Option<Self> {
        let name = str_field(raw, &["name", "fullName"])
            .or_else(|| {
                let parts: Vec<String> = ["firstName", "lastName"]
                    .iter()
                    .filter_map(|key| str_field(raw, &[*key]))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            })
            .unwrap_or_else(|| "Anonymous".to_string());

        let education = match raw.get("education") {
            Some(Value::Array(entries)) => entries
                .iter()
                .find_map(|e| text(e).or_else(|| str_field(e, &["degree", "level"]))),
            Some(other) => text(other),
            None => None,
        };

        Some(Candidate {
            id: id_of(raw)?,
            name,
            professional_title: str_field(raw, &["professionalTitle", "title"]),
            location: str_field(raw, &["location"]),
            experience: str_field(raw, &["experience"]),
            skills: string_list(raw.get("skills")),
            education,
        })
    }
}

impl Ingest for Employer {
    fn from_raw(raw: &Value) -> Option<Self> {
        Some(Employer {
            id: id_of(raw)?,
            company_name: str_field(raw, &["companyName", "name"])
                .unwrap_or_else(|| "Unknown Company".to_string()),
            industry: str_field(raw, &["industry"]),
            location: str_field(raw, &["location"]).unwrap_or_else(|| "Remote".to_string()),
            logo: str_field(raw, &["logo"]),
            job_count: 0,
        })
    }
}

/// Whether `job` belongs to the employer with this id or company name.
pub fn is_posted_by(job: &Job, employer_id: &str, company_name: &str) -> bool {
    job.employer_id.as_deref() == Some(employer_id)
        || job.company.trim().eq_ignore_ascii_case(company_name.trim())
}

pub fn jobs_for_employer(jobs: Vec<Job>, employer: &Employer) -> Vec<Job> {
    jobs.into_iter()
        .filter(|job| is_posted_by(job, &employer.id, &employer.company_name))
        .collect()
}

pub fn attach_job_counts(employers: &mut [Employer], jobs: &[Job]) {
    for employer in employers.iter_mut() {
        employer.job_count = jobs
            .iter()
            .filter(|job| is_posted_by(job, &employer.id, &employer.company_name))
            .count();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSort {
    /// Newest first; undated jobs last.
    Newest,
    /// Featured jobs first, each group newest first.
    Featured,
}

/// Orders the base collection once, before any filtering. Stable.
pub fn sort_jobs(jobs: &mut [Job], sort: JobSort) {
    match sort {
        JobSort::Newest => jobs.sort_by_key(|job| Reverse(job.created_at)),
        JobSort::Featured => jobs.sort_by_key(|job| (Reverse(job.featured), Reverse(job.created_at))),
    }
}
