use board::{assemble, paginate, Candidate, FilterState, Job, ListView, Listable, UiEffect};

fn job(id: usize, job_type: &str) -> Job {
    Job {
        id: id.to_string(),
        title: format!("Engineer {}", id),
        company: "Acme".to_string(),
        location: "Austin, TX".to_string(),
        job_type: job_type.to_string(),
        categories: vec!["Engineering".to_string()],
        salary: None,
        created_at: None,
        featured: false,
        employer_id: None,
        description: None,
    }
}

fn candidate(id: &str, skills: &[&str], experience: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        name: format!("Candidate {}", id),
        professional_title: None,
        location: Some("Remote".to_string()),
        experience: Some(experience.to_string()),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        education: None,
    }
}

fn seven_jobs() -> Vec<Job> {
    (1..=7)
        .map(|i| job(i, if i <= 5 { "Full-time" } else { "Contract" }))
        .collect()
}

#[test]
fn seven_jobs_split_into_two_pages() {
    let mut view = ListView::<Job>::new(5);
    view.set_records(seven_jobs());

    let vm = view.view_model();
    assert_eq!(vm.filtered_count, 7);
    assert_eq!(vm.total_pages, 2);
    assert_eq!(vm.page_items.len(), 5);

    assert_eq!(view.on_page_change(2), UiEffect::ScrollToTop);
    let vm = view.view_model();
    assert_eq!(vm.current_page, 2);
    let ids: Vec<&str> = vm.page_items.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["6", "7"]);
}

#[test]
fn filter_change_resets_to_first_page_and_keeps_facets() {
    let mut view = ListView::<Job>::new(5);
    view.set_records(seven_jobs());
    let _ = view.on_page_change(2);

    view.on_toggle_multi_select("type", "Contract");
    let vm = view.view_model();
    assert_eq!(vm.current_page, 1);
    assert_eq!(vm.filtered_count, 2);
    assert_eq!(vm.total_pages, 1);

    let types = &vm.facets["type"];
    assert_eq!(types[0].value, "Full-time");
    assert_eq!(types[0].count, 5);
    assert_eq!(types[1].count, 2);
}

#[test]
fn candidate_selections_across_fields_are_anded() {
    let records = vec![
        candidate("a", &["React", "TypeScript"], "Senior engineer, 8 years"),
        candidate("b", &["React"], "Junior developer"),
        candidate("c", &["Go"], "Lead engineer"),
    ];
    let schema = Candidate::schema();
    let state = FilterState::new()
        .with_multi("skills", ["React"])
        .with_multi("experience", ["Senior Level"]);

    let vm = assemble(&records, &schema, &state, 10, 1);
    let ids: Vec<&str> = vm.page_items.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a"]);

    let levels: Vec<(&str, usize)> = vm.facets["experience"]
        .iter()
        .map(|f| (f.value.as_str(), f.count))
        .collect();
    assert_eq!(levels, vec![("Entry Level", 1), ("Senior Level", 2)]);
}

#[test]
fn reset_returns_the_initial_view() {
    let mut view = ListView::<Job>::new(5);
    view.set_records(seven_jobs());
    let initial = view.view_model().page_items.iter().map(|j| j.id.clone()).collect::<Vec<_>>();

    view.on_query_change("engineer 6");
    view.on_set_single_select("location", Some("austin"));
    view.on_toggle_multi_select("category", "Engineering");
    assert_eq!(view.view_model().filtered_count, 1);

    view.on_reset_filters();
    let vm = view.view_model();
    assert!(view.filters().is_empty());
    assert_eq!(vm.filtered_count, 7);
    assert_eq!(vm.current_page, 1);
    let ids: Vec<String> = vm.page_items.iter().map(|j| j.id.clone()).collect();
    assert_eq!(ids, initial);
}

#[test]
fn assembling_twice_gives_the_same_view() {
    let records = seven_jobs();
    let schema = Job::schema();
    let state = FilterState::new().with_query("engineer").with_multi("type", ["Full-time"]);

    assert_eq!(
        assemble(&records, &schema, &state, 5, 1),
        assemble(&records, &schema, &state, 5, 1)
    );
}

#[test]
fn empty_and_out_of_range_pages() {
    let empty: Vec<Job> = Vec::new();
    let page = paginate(&empty, 5, 1);
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.total_count, 0);

    let records = seven_jobs();
    let page = paginate(&records, 5, 999);
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 999);

    let mut view = ListView::<Job>::new(5);
    view.set_records(records);
    assert_eq!(view.on_page_change(999), UiEffect::ScrollToTop);
    assert_eq!(view.page(), 2);
    assert_eq!(view.on_page_change(2), UiEffect::None);
}

#[test]
fn stale_fetch_is_discarded() {
    let mut view = ListView::<Job>::new(5);
    let first = view.begin_fetch();
    let second = view.begin_fetch();
    assert!(view.is_loading());

    assert!(view.finish_fetch(second, vec![job(1, "Full-time")]));
    assert!(!view.finish_fetch(first, seven_jobs()));
    assert_eq!(view.records().len(), 1);
    assert!(!view.is_loading());
}

#[test]
fn url_parameters_seed_the_view() {
    let mut view = ListView::<Job>::new(5)
        .with_query_string("?q=engineer&type=Full-time&type=Contract&location=Austin&page=2");
    view.set_records(seven_jobs());

    assert_eq!(view.filters().query, "engineer");
    assert!(view.filters().is_selected("type", "Contract"));
    assert!(view.filters().is_selected("location", "Austin"));
    let vm = view.view_model();
    assert_eq!(vm.filtered_count, 7);
    assert_eq!(vm.current_page, 2);
    assert_eq!(vm.page_items.len(), 2);
}
