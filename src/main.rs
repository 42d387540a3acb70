use anyhow::{Context, Result};
use board::api::{load_record, load_records, ApiClient, RecordSource};
use board::config::{self, Config};
use board::ingest::{attach_job_counts, ingest, jobs_for_employer, sort_jobs, Ingest, JobSort};
use board::logging;
use board::models::{Candidate, Employer, ExperienceLevel, Job, RecordKind};
use board::schema::Listable;
use board::tui::{self, truncate, Summary};
use board::view::ListView;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use url::form_urlencoded;

#[derive(Parser)]
#[command(name = "board")]
#[command(about = "Browse job board listings - jobs, candidates, and employers")]
struct Cli {
    /// API base URL (overrides BOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ListArgs {
    /// Free-text search
    #[arg(short, long)]
    query: Option<String>,

    /// Page to show
    #[arg(long)]
    page: Option<usize>,

    /// Results per page (overrides BOARD_PAGE_SIZE)
    #[arg(long)]
    page_size: Option<usize>,

    /// Filters as a URL query string, e.g. "type=Full-time&location=Austin"
    #[arg(long)]
    params: Option<String>,

    /// Print the view model as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List jobs
    Jobs {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by location (substring match)
        #[arg(short, long)]
        location: Option<String>,

        /// Filter by job type; repeat for any of several
        #[arg(short = 't', long = "type")]
        job_type: Vec<String>,

        /// Filter by category; repeat for any of several
        #[arg(short, long)]
        category: Vec<String>,

        /// Ordering of the listing
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortArg,
    },

    /// List candidates
    Candidates {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by location
        #[arg(short, long)]
        location: Option<String>,

        /// Filter by skill; repeat for any of several
        #[arg(short, long)]
        skill: Vec<String>,

        /// Filter by experience (entry, mid, senior, or free text)
        #[arg(short, long)]
        experience: Vec<String>,

        /// Filter by education; repeat for any of several
        #[arg(long)]
        education: Vec<String>,
    },

    /// List employers
    Employers {
        #[command(flatten)]
        list: ListArgs,

        /// Filter by industry; repeat for any of several
        #[arg(short, long)]
        industry: Vec<String>,

        /// Filter by location (substring match)
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Show employer details and open positions
    Employer {
        /// Employer ID
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive browser
    Browse {
        /// What to browse
        #[arg(value_enum)]
        kind: KindArg,

        /// Initial filters as a URL query string
        #[arg(long)]
        params: Option<String>,

        /// Results per page (overrides BOARD_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    Featured,
}

impl From<SortArg> for JobSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Newest => JobSort::Newest,
            SortArg::Featured => JobSort::Featured,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Jobs,
    Candidates,
    Employers,
}

/// One line of the plain-text listing.
trait Row {
    fn header() -> String;
    fn row(&self) -> String;
}

impl Row for Job {
    fn header() -> String {
        format!("{:<12} {:<30} {:<20} {:<18} {:<12}", "ID", "TITLE", "COMPANY", "LOCATION", "TYPE")
    }

    fn row(&self) -> String {
        let title = if self.featured {
            format!("* {}", self.title)
        } else {
            self.title.clone()
        };
        format!(
            "{:<12} {:<30} {:<20} {:<18} {:<12}",
            truncate(&self.id, 12),
            truncate(&title, 28),
            truncate(&self.company, 18),
            truncate(&self.location, 16),
            truncate(&self.job_type, 12)
        )
    }
}

impl Row for Candidate {
    fn header() -> String {
        format!("{:<12} {:<22} {:<26} {:<18} {:<12}", "ID", "NAME", "TITLE", "LOCATION", "EXPERIENCE")
    }

    fn row(&self) -> String {
        format!(
            "{:<12} {:<22} {:<26} {:<18} {:<12}",
            truncate(&self.id, 12),
            truncate(&self.name, 20),
            truncate(self.professional_title.as_deref().unwrap_or("-"), 24),
            truncate(self.location.as_deref().unwrap_or("-"), 16),
            self.experience_level().map(|l| l.label()).unwrap_or("-")
        )
    }
}

impl Row for Employer {
    fn header() -> String {
        format!("{:<12} {:<30} {:<20} {:<18} {:>5}", "ID", "COMPANY", "INDUSTRY", "LOCATION", "JOBS")
    }

    fn row(&self) -> String {
        format!(
            "{:<12} {:<30} {:<20} {:<18} {:>5}",
            truncate(&self.id, 12),
            truncate(&self.company_name, 28),
            truncate(self.industry.as_deref().unwrap_or("-"), 18),
            truncate(&self.location, 16),
            self.job_count
        )
    }
}

/// Merges `--params` with the individual filter flags into one query string.
fn build_query(params: Option<&str>, pairs: &[(&str, String)]) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        out.append_pair(key, value);
    }
    let flags = out.finish();
    let params = params.unwrap_or_default().trim_start_matches('?');

    match (params.is_empty(), flags.is_empty()) {
        (true, _) => flags,
        (false, true) => params.to_string(),
        (false, false) => format!("{}&{}", params, flags),
    }
}

fn list_pairs(list: &ListArgs) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(query) = &list.query {
        pairs.push(("q", query.clone()));
    }
    if let Some(page) = list.page {
        pairs.push(("page", page.to_string()));
    }
    pairs
}

/// Loads records into a fresh view seeded from `query`, then restores the
/// requested page once the records are in.
async fn open_view<R, F>(query: &str, page_size: usize, fetch: F) -> ListView<R>
where
    R: Listable,
    F: Future<Output = Vec<R>>,
{
    let mut view = ListView::new(page_size).with_query_string(query);
    let requested = view.page();
    let ticket = view.begin_fetch();
    view.finish_fetch(ticket, fetch.await);
    let _ = view.on_page_change(requested);
    view
}

async fn fetch_all<R: Ingest, S: RecordSource>(source: &S, kind: RecordKind) -> Vec<R> {
    ingest(&load_records(source, kind, &[]).await)
}

async fn fetch_jobs<S: RecordSource>(source: &S, sort: JobSort) -> Vec<Job> {
    let mut jobs: Vec<Job> = fetch_all(source, RecordKind::Jobs).await;
    sort_jobs(&mut jobs, sort);
    jobs
}

async fn fetch_employers<S: RecordSource>(source: &S) -> Vec<Employer> {
    let (mut employers, jobs) = tokio::join!(
        fetch_all::<Employer, _>(source, RecordKind::Employers),
        fetch_all::<Job, _>(source, RecordKind::Jobs)
    );
    attach_job_counts(&mut employers, &jobs);
    employers
}

fn print_view<R: Row + Serialize>(view: &ListView<R>, json: bool) -> Result<()> {
    let vm = view.view_model();
    if json {
        println!("{}", serde_json::to_string_pretty(&vm).context("Failed to encode view model")?);
        return Ok(());
    }

    for field in &view.schema().fields {
        let Some(facets) = vm.facets.get(field.name).filter(|f| !f.is_empty()) else {
            continue;
        };
        let values: Vec<String> = facets
            .iter()
            .map(|facet| {
                let mark = if view.filters().is_selected(field.name, &facet.value) { "*" } else { "" };
                format!("{}{} ({})", mark, facet.value, facet.count)
            })
            .collect();
        println!("{}: {}", field.label, values.join(", "));
    }
    println!();

    if vm.page_items.is_empty() {
        println!("No {} found.", view.schema().kind);
    } else {
        let header = R::header();
        println!("{}", header);
        println!("{}", "-".repeat(header.len()));
        for record in &vm.page_items {
            println!("{}", record.row());
        }
    }
    println!(
        "\nPage {} of {} ({} results)",
        vm.current_page, vm.total_pages, vm.filtered_count
    );
    Ok(())
}

fn browse<R, S>(view: ListView<R>, source: Arc<S>) -> Result<()>
where
    R: Summary,
    S: RecordSource + Send + Sync + 'static,
{
    tokio::task::block_in_place(|| tui::run_browse(view, source))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Browse { .. } => logging::init_file(cli.verbose, &config::log_path())?,
        _ => logging::init_stderr(cli.verbose)?,
    }

    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    let client = ApiClient::new(&config)?;
    tracing::debug!(api = client.base_url(), "using API");

    match cli.command {
        Commands::Jobs {
            list,
            location,
            job_type,
            category,
            sort,
        } => {
            let mut pairs = list_pairs(&list);
            pairs.extend(location.map(|l| ("location", l)));
            pairs.extend(job_type.into_iter().map(|t| ("type", t)));
            pairs.extend(category.into_iter().map(|c| ("category", c)));

            let query = build_query(list.params.as_deref(), &pairs);
            let page_size = list.page_size.unwrap_or(config.page_size);
            let view = open_view(&query, page_size, fetch_jobs(&client, sort.into())).await;
            print_view(&view, list.json)?;
        }

        Commands::Candidates {
            list,
            location,
            skill,
            experience,
            education,
        } => {
            let mut pairs = list_pairs(&list);
            pairs.extend(location.map(|l| ("location", l)));
            pairs.extend(skill.into_iter().map(|s| ("skills", s)));
            pairs.extend(
                experience
                    .iter()
                    .map(|e| ("experience", ExperienceLevel::from_text(e).label().to_string())),
            );
            pairs.extend(education.into_iter().map(|e| ("education", e)));

            let query = build_query(list.params.as_deref(), &pairs);
            let page_size = list.page_size.unwrap_or(config.page_size);
            let view = open_view(
                &query,
                page_size,
                fetch_all::<Candidate, _>(&client, RecordKind::Candidates),
            )
            .await;
            print_view(&view, list.json)?;
        }

        Commands::Employers {
            list,
            industry,
            location,
        } => {
            let mut pairs = list_pairs(&list);
            pairs.extend(industry.into_iter().map(|i| ("industry", i)));
            pairs.extend(location.map(|l| ("location", l)));

            let query = build_query(list.params.as_deref(), &pairs);
            let page_size = list.page_size.unwrap_or(config.page_size);
            let view = open_view(&query, page_size, fetch_employers(&client)).await;
            print_view(&view, list.json)?;
        }

        Commands::Employer { id, json } => {
            let employer = load_record(&client, RecordKind::Employers, &id)
                .await
                .and_then(|raw| Employer::from_raw(&raw));
            let Some(mut employer) = employer else {
                println!("Employer '{}' not found.", id);
                return Ok(());
            };

            let raws = load_records(&client, RecordKind::Jobs, &[("employer", id.as_str())]).await;
            let mut jobs = jobs_for_employer(ingest(&raws), &employer);
            sort_jobs(&mut jobs, JobSort::Newest);
            employer.job_count = jobs.len();

            if json {
                let out = serde_json::json!({ "employer": employer, "jobs": jobs });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            for line in employer.detail() {
                println!("{}", line);
            }
            if !jobs.is_empty() {
                println!("\nJobs ({}):", jobs.len());
                for job in &jobs {
                    println!("  {} - {} ({}, {})", job.id, job.title, job.job_type, job.location);
                }
            }
        }

        Commands::Browse {
            kind,
            params,
            page_size,
        } => {
            let query = params.unwrap_or_default();
            let page_size = page_size.unwrap_or(config.page_size);
            let source = Arc::new(client);

            match kind {
                KindArg::Jobs => {
                    let view = open_view(&query, page_size, fetch_jobs(source.as_ref(), JobSort::Featured)).await;
                    browse(view, source)?;
                }
                KindArg::Candidates => {
                    let fetch = fetch_all::<Candidate, _>(source.as_ref(), RecordKind::Candidates);
                    let view = open_view(&query, page_size, fetch).await;
                    browse(view, source)?;
                }
                KindArg::Employers => {
                    let view = open_view(&query, page_size, fetch_employers(source.as_ref())).await;
                    browse(view, source)?;
                }
            }
        }
    }

    Ok(())
}
