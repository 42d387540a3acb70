use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::schema::{Field, Schema, SelectKind};

const QUERY_KEYS: [&str; 3] = ["q", "query", "search"];

/// The user's active selections for one list view.
///
/// Each entry is an independent predicate group. A group with no selection
/// is inactive, so the default state passes every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub query: String,
    pub single: BTreeMap<String, String>,
    pub multi: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
            && self.single.values().all(|v| v.trim().is_empty())
            && self.multi.values().flatten().all(|v| v.trim().is_empty())
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn with_single(mut self, field: &str, value: &str) -> Self {
        self.set_single(field, Some(value));
        self
    }

    pub fn with_multi<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values
            .into_iter()
            .map(|v| Into::<String>::into(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if !values.is_empty() {
            self.multi.entry(field.to_string()).or_default().extend(values);
        }
        self
    }

    /// Flips `value` in a multi-select group; returns whether it is now selected.
    /// A blank value selects nothing.
    pub fn toggle(&mut self, field: &str, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let values = self.multi.entry(field.to_string()).or_default();
        let selected = if values.remove(value) {
            false
        } else {
            values.insert(value.to_string());
            true
        };
        if values.is_empty() {
            self.multi.remove(field);
        }
        selected
    }

    /// Sets or clears a single-select group. A blank value clears it.
    pub fn set_single(&mut self, field: &str, value: Option<&str>) {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.single.insert(field.to_string(), v.to_string());
            }
            None => {
                self.single.remove(field);
            }
        }
    }

    pub fn is_selected(&self, field: &str, value: &str) -> bool {
        self.single.get(field).is_some_and(|v| v == value)
            || self.multi.get(field).is_some_and(|set| set.contains(value))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reads selections from a URL query string such as
    /// `?q=rust&type=Full-time&type=Contract&location=Austin`.
    ///
    /// Keys are resolved against `schema`; unknown keys and `page` are skipped.
    pub fn from_query_string<R>(query_string: &str, schema: &Schema<R>) -> Self {
        let mut state = Self::default();
        let pairs = form_urlencoded::parse(query_string.trim_start_matches('?').as_bytes());

        for (key, value) in pairs {
            if QUERY_KEYS.contains(&key.as_ref()) {
                state.query = value.into_owned();
                continue;
            }
            match schema.field(&key) {
                Some(field) if field.select == SelectKind::Single => {
                    state.set_single(field.name, Some(&value));
                }
                Some(field) => {
                    if !value.trim().is_empty() {
                        state
                            .multi
                            .entry(field.name.to_string())
                            .or_default()
                            .insert(value.trim().to_string());
                    }
                }
                None if key == "page" => {}
                None => debug!(key = %key, "ignoring unknown query parameter"),
            }
        }

        state
    }

    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.query.trim().is_empty() {
            out.append_pair("q", self.query.trim());
        }
        for (field, value) in &self.single {
            out.append_pair(field, value);
        }
        for (field, values) in &self.multi {
            for value in values {
                out.append_pair(field, value);
            }
        }
        out.finish()
    }
}

enum Group<'s, R> {
    Single(&'s Field<R>, &'s str),
    Multi(&'s Field<R>, &'s BTreeSet<String>),
}

impl<R> Group<'_, R> {
    fn passes(&self, record: &R) -> bool {
        match self {
            Group::Single(field, value) => field.matches(record, value),
            Group::Multi(field, values) => values
                .iter()
                .filter(|v| !v.trim().is_empty())
                .any(|v| field.matches(record, v)),
        }
    }
}

fn active_groups<'s, R>(schema: &'s Schema<R>, state: &'s FilterState) -> Vec<Group<'s, R>> {
    let mut groups = Vec::new();

    for (name, value) in &state.single {
        if value.trim().is_empty() {
            continue;
        }
        match schema.field(name) {
            Some(field) => groups.push(Group::Single(field, value.as_str())),
            None => warn!(field = %name, kind = %schema.kind, "ignoring filter on unknown field"),
        }
    }

    for (name, values) in &state.multi {
        if values.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        match schema.field(name) {
            Some(field) => groups.push(Group::Multi(field, values)),
            None => warn!(field = %name, kind = %schema.kind, "ignoring filter on unknown field"),
        }
    }

    groups
}

/// Returns the records passing every active group, in their original order.
///
/// Groups combine with AND; the values inside one multi-select group combine
/// with OR. The input is never modified.
pub fn filter_records<'a, R, I>(records: I, schema: &Schema<R>, state: &FilterState) -> Vec<&'a R>
where
    R: 'a,
    I: IntoIterator<Item = &'a R>,
{
    let groups = active_groups(schema, state);
    records
        .into_iter()
        .filter(|record| schema.matches_text(record, &state.query))
        .filter(|record| groups.iter().all(|group| group.passes(record)))
        .collect()
}
