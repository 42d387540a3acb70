//! Field tables describing how each record kind is searched, faceted and matched.
//!
//! A [`Schema`] replaces per-page filtering code: jobs, candidates and
//! employers differ only in which attributes they expose and how a selected
//! value is compared against a record's value.

use serde::Serialize;
use std::fmt;

use crate::facets::{normalize_values, FacetOrder};
use crate::models::{Candidate, Employer, Job, Record, RecordKind};

/// How a selected value is compared against a record's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Trimmed, case-insensitive equality.
    Exact,
    /// Case-insensitive substring of the record value.
    Contains,
}

impl MatchMode {
    pub fn matches(self, record_value: &str, selected: &str) -> bool {
        let record_value = record_value.trim().to_lowercase();
        let selected = selected.trim().to_lowercase();
        match self {
            MatchMode::Exact => record_value == selected,
            MatchMode::Contains => record_value.contains(&selected),
        }
    }
}

/// Whether the rendering layer offers a field as radio-style or checkbox-style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectKind {
    Single,
    Multi,
}

pub struct Field<R> {
    pub name: &'static str,
    pub label: &'static str,
    pub select: SelectKind,
    pub match_mode: MatchMode,
    pub order: FacetOrder,
    /// Label offered for records with no value, e.g. "Unknown".
    pub unknown: Option<&'static str>,
    extract: fn(&R) -> Vec<String>,
}

impl<R> Field<R> {
    pub fn new(name: &'static str, label: &'static str, extract: fn(&R) -> Vec<String>) -> Self {
        Self {
            name,
            label,
            select: SelectKind::Multi,
            match_mode: MatchMode::Exact,
            order: FacetOrder::CountDesc,
            unknown: None,
            extract,
        }
    }

    pub fn single(mut self) -> Self {
        self.select = SelectKind::Single;
        self
    }

    pub fn contains(mut self) -> Self {
        self.match_mode = MatchMode::Contains;
        self
    }

    pub fn alphabetical(mut self) -> Self {
        self.order = FacetOrder::Alphabetical;
        self
    }

    pub fn with_unknown(mut self, label: &'static str) -> Self {
        self.unknown = Some(label);
        self
    }

    /// Raw attribute values as the record carries them.
    pub fn raw_values(&self, record: &R) -> Vec<String> {
        (self.extract)(record)
    }

    /// Distinct non-empty values, or the unknown label when the record has none.
    pub fn values(&self, record: &R) -> Vec<String> {
        normalize_values(self.raw_values(record), self.unknown)
    }

    pub fn matches(&self, record: &R, selected: &str) -> bool {
        self.values(record)
            .iter()
            .any(|value| self.match_mode.matches(value, selected))
    }
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Field<R> {}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("select", &self.select)
            .field("match_mode", &self.match_mode)
            .field("order", &self.order)
            .field("unknown", &self.unknown)
            .finish()
    }
}

pub struct Schema<R> {
    pub kind: RecordKind,
    text: fn(&R) -> Vec<&str>,
    pub fields: Vec<Field<R>>,
}

impl<R> Schema<R> {
    pub fn new(kind: RecordKind, text: fn(&R) -> Vec<&str>, fields: Vec<Field<R>>) -> Self {
        Self { kind, text, fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Case-insensitive substring search over the kind's text fields.
    /// A blank query matches everything.
    pub fn matches_text(&self, record: &R, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        (self.text)(record)
            .iter()
            .any(|text| text.to_lowercase().contains(&query))
    }
}

impl<R> Clone for Schema<R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            text: self.text,
            fields: self.fields.clone(),
        }
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .finish()
    }
}

/// A record kind that knows its own field table.
pub trait Listable: Record + Sized {
    fn schema() -> Schema<Self>;
}

fn one(value: &str) -> Vec<String> {
    vec![value.to_string()]
}

fn maybe(value: &Option<String>) -> Vec<String> {
    value.iter().cloned().collect()
}

fn job_text(job: &Job) -> Vec<&str> {
    vec![job.title.as_str(), job.company.as_str()]
}

fn candidate_text(c: &Candidate) -> Vec<&str> {
    let mut text = vec![c.name.as_str()];
    text.extend(c.professional_title.as_deref());
    text
}

fn employer_text(e: &Employer) -> Vec<&str> {
    let mut text = vec![e.company_name.as_str()];
    text.extend(e.industry.as_deref());
    text
}

impl Listable for Job {
    fn schema() -> Schema<Self> {
        Schema::new(
            RecordKind::Jobs,
            job_text,
            vec![
                Field::new("location", "Location", |job: &Job| one(&job.location))
                    .single()
                    .contains(),
                Field::new("type", "Job Type", |job: &Job| one(&job.job_type)),
                Field::new("category", "Category", |job: &Job| job.categories.clone()),
            ],
        )
    }
}

impl Listable for Candidate {
    fn schema() -> Schema<Self> {
        Schema::new(
            RecordKind::Candidates,
            candidate_text,
            vec![
                Field::new("location", "Location", |c: &Candidate| maybe(&c.location))
                    .single()
                    .alphabetical()
                    .with_unknown("Unknown"),
                Field::new("experience", "Experience", |c: &Candidate| {
                    c.experience_level()
                        .map(|level| level.label().to_string())
                        .into_iter()
                        .collect()
                })
                .alphabetical(),
                Field::new("skills", "Skills", |c: &Candidate| c.skills.clone()).alphabetical(),
                Field::new("education", "Education", |c: &Candidate| maybe(&c.education))
                    .alphabetical()
                    .with_unknown("Unknown"),
            ],
        )
    }
}

impl Listable for Employer {
    fn schema() -> Schema<Self> {
        Schema::new(
            RecordKind::Employers,
            employer_text,
            vec![
                Field::new("industry", "Industry", |e: &Employer| maybe(&e.industry)),
                Field::new("location", "Location", |e: &Employer| one(&e.location))
                    .single()
                    .contains(),
            ],
        )
    }
}
