use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Anything rendered in a list view. The id is the only identity a record has.
pub trait Record {
    fn id(&self) -> &str;
}

/// The REST collection a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Jobs,
    Candidates,
    Employers,
}

impl RecordKind {
    pub fn path(self) -> &'static str {
        match self {
            RecordKind::Jobs => "jobs",
            RecordKind::Candidates => "candidates",
            RecordKind::Employers => "employers",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String, // free text, "City, REGION" or "Remote"
    pub job_type: String, // "Full-time", "Part-time", "Contract", ...
    pub categories: Vec<String>,
    pub salary: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub employer_id: Option<String>,
    pub description: Option<String>,
}

impl Record for Job {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub professional_title: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>, // free text, bucketed by ExperienceLevel
    pub skills: Vec<String>,
    pub education: Option<String>,
}

impl Candidate {
    pub fn experience_level(&self) -> Option<ExperienceLevel> {
        self.experience
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(ExperienceLevel::from_text)
    }
}

impl Record for Candidate {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    pub id: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub location: String,
    pub logo: Option<String>,
    pub job_count: usize, // derived from the jobs collection, never sent by the backend
}

impl Record for Employer {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("years pattern is valid"));
static SENIOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(senior|sr|lead|principal|staff|expert)\b").expect("senior pattern is valid")
});
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(junior|jr|entry|intern|internship|graduate|trainee)\b")
        .expect("entry pattern is valid")
});
static MID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(mid|intermediate)\b").expect("mid pattern is valid"));

impl ExperienceLevel {
    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry Level",
            ExperienceLevel::Mid => "Mid Level",
            ExperienceLevel::Senior => "Senior Level",
        }
    }

    /// Buckets free-text experience like "6+ years", "Senior" or "2 yrs".
    ///
    /// Seniority words take precedence over a year count; with neither
    /// present the candidate is treated as entry level.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();

        if SENIOR_RE.is_match(&lower) {
            return ExperienceLevel::Senior;
        }
        if ENTRY_RE.is_match(&lower) {
            return ExperienceLevel::Entry;
        }
        if MID_RE.is_match(&lower) {
            return ExperienceLevel::Mid;
        }

        let years = YEARS_RE
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());

        match years {
            Some(y) if y >= 5.0 => ExperienceLevel::Senior,
            Some(y) if y >= 2.0 => ExperienceLevel::Mid,
            _ => ExperienceLevel::Entry,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
