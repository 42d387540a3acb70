use serde::Serialize;
use std::collections::HashMap;

use crate::schema::{Field, MatchMode};

/// One selectable value of a filterable attribute and how many base records carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetOrder {
    /// Most frequent first; ties keep first-encounter order.
    CountDesc,
    /// Case-insensitive by value, with the unknown bucket last.
    Alphabetical,
}

/// Values that differ only in case or surrounding space are one value.
fn same_value(a: &str, b: &str) -> bool {
    facet_key(a) == facet_key(b)
}

fn facet_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trims values, drops blanks and case-insensitive duplicates, and falls
/// back to the unknown label when nothing is left.
pub fn normalize_values(raw: Vec<String>, unknown: Option<&str>) -> Vec<String> {
    let mut values: Vec<String> = Vec::with_capacity(raw.len());
    for value in raw {
        let value = value.trim();
        if !value.is_empty() && !values.iter().any(|v| same_value(v, value)) {
            values.push(value.to_string());
        }
    }
    if values.is_empty() {
        if let Some(label) = unknown {
            values.push(label.to_string());
        }
    }
    values
}

/// Counts distinct attribute values across `records`.
///
/// Multi-valued attributes contribute each of their values once, so a
/// candidate listing three skills lands in three buckets. Counts are taken
/// over whatever collection is passed in; list views always pass the
/// unfiltered base collection.
pub fn derive_facets<R, F>(
    records: &[R],
    select: F,
    order: FacetOrder,
    unknown: Option<&str>,
) -> Vec<FacetCount>
where
    F: Fn(&R) -> Vec<String>,
{
    let mut facets = count_values(records, select, unknown);
    sort_facets(&mut facets, order, unknown);
    facets
}

/// Distinct values with counts, in first-encounter order.
fn count_values<R, F>(records: &[R], select: F, unknown: Option<&str>) -> Vec<FacetCount>
where
    F: Fn(&R) -> Vec<String>,
{
    let mut facets: Vec<FacetCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        for value in normalize_values(select(record), unknown) {
            // first spelling seen is the one displayed
            match index.get(&facet_key(&value)) {
                Some(&i) => facets[i].count += 1,
                None => {
                    index.insert(facet_key(&value), facets.len());
                    facets.push(FacetCount { value, count: 1 });
                }
            }
        }
    }

    facets
}

fn sort_facets(facets: &mut [FacetCount], order: FacetOrder, unknown: Option<&str>) {
    match order {
        // sort_by is stable, so equal counts stay in encounter order
        FacetOrder::CountDesc => facets.sort_by(|a, b| b.count.cmp(&a.count)),
        FacetOrder::Alphabetical => facets.sort_by(|a, b| {
            let a_unknown = Some(a.value.as_str()) == unknown;
            let b_unknown = Some(b.value.as_str()) == unknown;
            a_unknown
                .cmp(&b_unknown)
                .then_with(|| a.value.to_lowercase().cmp(&b.value.to_lowercase()))
                .then_with(|| a.value.cmp(&b.value))
        }),
    }
}

/// Facets of one schema field over `records`.
///
/// For substring-matched fields a value also covers every longer value
/// containing it ("Austin" covers "Austin, TX"), so each count is the number
/// of records that selecting the value would keep.
pub fn field_facets<R>(records: &[R], field: &Field<R>) -> Vec<FacetCount> {
    let mut facets = count_values(records, |r| field.raw_values(r), field.unknown);
    if field.match_mode == MatchMode::Contains {
        for facet in facets.iter_mut() {
            facet.count = records.iter().filter(|r| field.matches(r, &facet.value)).count();
        }
    }
    sort_facets(&mut facets, field.order, field.unknown);
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterState;
    use crate::models::{Candidate, Employer, Job};
    use crate::schema::{Listable, SelectKind};
    use crate::view::assemble;
    use proptest::prelude::*;

    fn counts(facets: &[FacetCount]) -> Vec<(&str, usize)> {
        facets.iter().map(|f| (f.value.as_str(), f.count)).collect()
    }

    #[test]
    fn test_count_desc_ties_keep_encounter_order() {
        let types = ["Contract", "Full-time", "Part-time", "Full-time", "Part-time"];
        let facets = derive_facets(&types, |t| vec![t.to_string()], FacetOrder::CountDesc, None);
        assert_eq!(
            counts(&facets),
            vec![("Full-time", 2), ("Part-time", 2), ("Contract", 1)]
        );
    }

    #[test]
    fn test_multi_valued_records_count_once_per_value() {
        let skills = vec![
            vec!["React", "Rust", "React"],
            vec!["rust", "Go"],
            vec!["React"],
        ];
        let facets = derive_facets(
            &skills,
            |s| s.iter().map(|v| v.to_string()).collect(),
            FacetOrder::Alphabetical,
            None,
        );
        assert_eq!(
            counts(&facets),
            vec![("Go", 1), ("React", 2), ("Rust", 2)]
        );
    }

    #[test]
    fn test_blank_values_excluded_without_unknown_bucket() {
        let locations = vec![Some("Paris"), None, Some("  "), Some("Berlin")];
        let select = |l: &Option<&str>| -> Vec<String> { l.iter().map(|v| v.to_string()).collect() };
        let facets = derive_facets(&locations, select, FacetOrder::CountDesc, None);
        assert_eq!(counts(&facets), vec![("Paris", 1), ("Berlin", 1)]);

        let facets = derive_facets(&locations, select, FacetOrder::Alphabetical, Some("Unknown"));
        assert_eq!(
            counts(&facets),
            vec![("Berlin", 1), ("Paris", 1), ("Unknown", 2)]
        );
    }

    #[test]
    fn test_values_differing_in_case_share_a_bucket() {
        let skills = [vec![" Rust"], vec!["rust"], vec!["Go"]];
        let facets = derive_facets(
            &skills,
            |s: &Vec<&str>| -> Vec<String> { s.iter().map(|v| v.to_string()).collect() },
            FacetOrder::CountDesc,
            None,
        );
        assert_eq!(counts(&facets), vec![("Rust", 2), ("Go", 1)]);
        assert_eq!(normalize_values(vec!["SQL".into(), "sql ".into()], None), vec!["SQL"]);
    }

    fn assert_counts_match_selection<R: Listable>(records: &[R]) {
        let schema = R::schema();
        for field in &schema.fields {
            for facet in field_facets(records, field) {
                let state = match field.select {
                    SelectKind::Single => FilterState::new().with_single(field.name, &facet.value),
                    SelectKind::Multi => FilterState::new().with_multi(field.name, [facet.value.as_str()]),
                };
                let vm = assemble(records, &schema, &state, 10, 1);
                assert_eq!(
                    facet.count, vm.filtered_count,
                    "{} = {}", field.name, facet.value
                );
            }
        }
    }

    #[test]
    fn test_every_facet_count_matches_its_selection() {
        let jobs = vec![
            Job {
                id: "1".to_string(),
                title: "Rust Engineer".to_string(),
                company: "Acme".to_string(),
                location: "Austin".to_string(),
                job_type: "Full-time".to_string(),
                categories: vec!["Engineering".to_string()],
                salary: None,
                created_at: None,
                featured: false,
                employer_id: None,
                description: None,
            },
            Job {
                id: "2".to_string(),
                title: "Data Engineer".to_string(),
                company: "Initech".to_string(),
                location: "Austin, TX".to_string(),
                job_type: "full-time".to_string(),
                categories: vec!["engineering".to_string(), "Data".to_string()],
                salary: None,
                created_at: None,
                featured: false,
                employer_id: None,
                description: None,
            },
            Job {
                id: "3".to_string(),
                title: "Designer".to_string(),
                company: "Globex".to_string(),
                location: "Remote".to_string(),
                job_type: "Contract".to_string(),
                categories: vec![],
                salary: None,
                created_at: None,
                featured: false,
                employer_id: None,
                description: None,
            },
        ];
        assert_counts_match_selection(&jobs);

        let location = field_facets(&jobs, &Job::schema().fields[0]);
        assert_eq!(counts(&location), vec![("Austin", 2), ("Austin, TX", 1), ("Remote", 1)]);

        let candidate = |id: &str, skills: &[&str], location: Option<&str>| Candidate {
            id: id.to_string(),
            name: id.to_string(),
            professional_title: None,
            location: location.map(str::to_string),
            experience: Some("3 years".to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            education: None,
        };
        let candidates = vec![
            candidate("a", &["Rust"], Some("Berlin")),
            candidate("b", &["rust", "Go"], Some("berlin ")),
            candidate("c", &["Go"], None),
        ];
        assert_counts_match_selection(&candidates);

        let employers = vec![
            Employer {
                id: "e1".to_string(),
                company_name: "Acme".to_string(),
                industry: Some("Software".to_string()),
                location: "Austin".to_string(),
                logo: None,
                job_count: 0,
            },
            Employer {
                id: "e2".to_string(),
                company_name: "Initech".to_string(),
                industry: Some("software".to_string()),
                location: "Austin, TX".to_string(),
                logo: None,
                job_count: 0,
            },
        ];
        assert_counts_match_selection(&employers);
    }

    #[test]
    fn test_empty_input() {
        let none: Vec<String> = Vec::new();
        assert!(derive_facets(&none, |s| vec![s.clone()], FacetOrder::CountDesc, None).is_empty());
    }

    proptest! {
        #[test]
        fn test_single_valued_counts_sum_to_non_empty_records(
            values in prop::collection::vec(prop::option::of("[a-c ]{0,3}"), 0..40)
        ) {
            let select = |v: &Option<String>| -> Vec<String> { v.iter().cloned().collect() };
            let facets = derive_facets(&values, select, FacetOrder::CountDesc, None);
            let total: usize = facets.iter().map(|f| f.count).sum();
            let non_empty = values
                .iter()
                .filter(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
                .count();
            prop_assert_eq!(total, non_empty);
        }
    }
}
