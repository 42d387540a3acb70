use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::api::{load_records, RecordSource};
use crate::ingest::{ingest, is_posted_by};
use crate::models::{Candidate, Employer, Job, RecordKind};
use crate::schema::SelectKind;
use crate::view::{FetchTicket, ListView, UiEffect, ViewModel};

/// How a record shows up in the browser.
pub trait Summary {
    fn headline(&self) -> String;
    fn detail(&self) -> Vec<String>;

    /// `(id, company name)` when the record owns job postings worth loading.
    fn owner(&self) -> Option<(&str, &str)> {
        None
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

impl Summary for Job {
    fn headline(&self) -> String {
        let marker = if self.featured { "*" } else { " " };
        format!("{} {} | {}", marker, truncate(&self.title, 32), truncate(&self.company, 20))
    }

    fn detail(&self) -> Vec<String> {
        let mut lines = vec![
            self.title.clone(),
            format!("at {}", self.company),
            format!("Location: {}", self.location),
            format!("Type: {}", self.job_type),
        ];
        if !self.categories.is_empty() {
            lines.push(format!("Category: {}", self.categories.join(", ")));
        }
        if let Some(salary) = &self.salary {
            lines.push(format!("Salary: {}", salary));
        }
        if let Some(created) = &self.created_at {
            lines.push(format!("Posted: {}", created.format("%Y-%m-%d")));
        }
        if let Some(description) = &self.description {
            lines.push(String::new());
            lines.extend(textwrap::wrap(description, 72).into_iter().map(|l| l.into_owned()));
        }
        lines
    }
}

impl Summary for Candidate {
    fn headline(&self) -> String {
        let title = self.professional_title.as_deref().unwrap_or("-");
        format!("  {} | {}", truncate(&self.name, 24), truncate(title, 28))
    }

    fn detail(&self) -> Vec<String> {
        let mut lines = vec![self.name.clone()];
        if let Some(title) = &self.professional_title {
            lines.push(title.clone());
        }
        lines.push(format!("Location: {}", self.location.as_deref().unwrap_or("Unknown")));
        if let Some(experience) = &self.experience {
            let level = self.experience_level().map(|l| l.label()).unwrap_or("-");
            lines.push(format!("Experience: {} ({})", experience, level));
        }
        if !self.skills.is_empty() {
            lines.push(String::new());
            lines.push("Skills".to_string());
            lines.extend(
                textwrap::wrap(&self.skills.join(", "), 70)
                    .into_iter()
                    .map(|l| format!("  {}", l)),
            );
        }
        lines.push(format!("Education: {}", self.education.as_deref().unwrap_or("Unknown")));
        lines
    }
}

impl Summary for Employer {
    fn headline(&self) -> String {
        let industry = self.industry.as_deref().unwrap_or("-");
        format!(
            "  {} | {} ({})",
            truncate(&self.company_name, 26),
            truncate(industry, 18),
            self.job_count
        )
    }

    fn detail(&self) -> Vec<String> {
        let mut lines = vec![self.company_name.clone()];
        if let Some(industry) = &self.industry {
            lines.push(format!("Industry: {}", industry));
        }
        lines.push(format!("Location: {}", self.location));
        if let Some(logo) = &self.logo {
            lines.push(format!("Logo: {}", logo));
        }
        lines.push(format!("Open jobs: {}", self.job_count));
        lines
    }

    fn owner(&self) -> Option<(&str, &str)> {
        Some((&self.id, &self.company_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Facets,
    Query,
}

struct FacetEntry {
    field: &'static str,
    label: &'static str,
    value: String,
    count: usize,
    single: bool,
}

/// Jobs of the highlighted employer, reloaded whenever the highlight moves.
struct Related {
    view: ListView<Job>,
    owner_id: Option<String>,
}

struct AppState<R> {
    view: ListView<R>,
    selected: usize,
    scroll_offset: u16,
    focus: Focus,
    facet_cursor: usize,
    related: Related,
    // Derived from the view model by `refresh` after every change.
    entries: Vec<FacetEntry>,
    page_len: usize,
    owner: Option<(String, String)>,
}

type RelatedResult = (FetchTicket, Vec<Job>);

fn facet_entries<R>(view: &ListView<R>, vm: &ViewModel<'_, R>) -> Vec<FacetEntry> {
    let mut entries = Vec::new();
    for field in &view.schema().fields {
        let Some(facets) = vm.facets.get(field.name) else { continue };
        for facet in facets {
            entries.push(FacetEntry {
                field: field.name,
                label: field.label,
                value: facet.value.clone(),
                count: facet.count,
                single: field.select == SelectKind::Single,
            });
        }
    }
    entries
}

impl<R: Summary> AppState<R> {
    fn new(view: ListView<R>) -> Self {
        let mut state = Self {
            view,
            selected: 0,
            scroll_offset: 0,
            focus: Focus::List,
            facet_cursor: 0,
            related: Related {
                view: ListView::new(usize::MAX),
                owner_id: None,
            },
            entries: Vec::new(),
            page_len: 0,
            owner: None,
        };
        state.refresh();
        state
    }

    /// Rebuilds the view model once and caches what key handling needs.
    fn refresh(&mut self) {
        let (entries, page_len, owner) = {
            let vm = self.view.view_model();
            let owner = vm
                .page_items
                .get(self.selected)
                .and_then(|record| record.owner())
                .map(|(id, name)| (id.to_string(), name.to_string()));
            (facet_entries(&self.view, &vm), vm.page_items.len(), owner)
        };
        self.entries = entries;
        self.page_len = page_len;
        self.owner = owner;
        self.facet_cursor = self.facet_cursor.min(self.entries.len().saturating_sub(1));
    }

    fn reset_cursor(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
        self.refresh();
    }

    fn next(&mut self) {
        if self.selected + 1 < self.page_len {
            self.selected += 1;
            self.scroll_offset = 0;
            self.refresh();
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
            self.refresh();
        }
    }

    fn change_page(&mut self, page: usize) {
        if self.view.on_page_change(page) == UiEffect::ScrollToTop {
            self.reset_cursor();
        }
    }

    fn toggle_facet(&mut self) {
        let Some(entry) = self.entries.get(self.facet_cursor) else { return };
        let (field, value, single) = (entry.field, entry.value.clone(), entry.single);
        if single {
            let selected = self.view.filters().is_selected(field, &value);
            self.view.on_set_single_select(field, (!selected).then_some(value.as_str()));
        } else {
            self.view.on_toggle_multi_select(field, &value);
        }
        self.reset_cursor();
    }

    fn reset_filters(&mut self) {
        self.view.on_reset_filters();
        self.reset_cursor();
    }

    fn edit_query(&mut self, edit: impl FnOnce(&mut String)) {
        let mut query = self.view.filters().query.clone();
        edit(&mut query);
        self.view.on_query_change(&query);
        self.reset_cursor();
    }

    /// Starts loading the highlighted employer's jobs when the highlight moved
    /// to a different employer. Results come back through `tx`.
    fn sync_related<S>(&mut self, source: &Arc<S>, tx: &mpsc::Sender<RelatedResult>)
    where
        S: RecordSource + Send + Sync + 'static,
    {
        let Some((id, name)) = self.owner.clone() else {
            self.related.owner_id = None;
            return;
        };
        if self.related.owner_id.as_deref() == Some(id.as_str()) {
            return;
        }

        self.related.owner_id = Some(id.clone());
        let ticket = self.related.view.begin_fetch();
        let source = Arc::clone(source);
        let tx = tx.clone();
        tokio::spawn(async move {
            let raws = load_records(source.as_ref(), RecordKind::Jobs, &[("employer", id.as_str())]).await;
            let jobs: Vec<Job> = ingest::<Job>(&raws)
                .into_iter()
                .filter(|job| is_posted_by(job, &id, &name))
                .collect();
            let _ = tx.send((ticket, jobs));
        });
    }
}

pub fn run_browse<R, S>(view: ListView<R>, source: Arc<S>) -> Result<()>
where
    R: Summary,
    S: RecordSource + Send + Sync + 'static,
{
    if view.records().is_empty() {
        println!("No {} found.", view.schema().kind);
        return Ok(());
    }

    let mut state = AppState::new(view);
    let (tx, rx) = mpsc::channel();
    state.sync_related(&source, &tx);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, &source, &tx, &rx);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<R, S>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState<R>,
    source: &Arc<S>,
    tx: &mpsc::Sender<RelatedResult>,
    rx: &mpsc::Receiver<RelatedResult>,
) -> Result<()>
where
    R: Summary,
    S: RecordSource + Send + Sync + 'static,
{
    let mut list_state = ListState::default();

    loop {
        while let Ok((ticket, jobs)) = rx.try_recv() {
            state.related.view.finish_fetch(ticket, jobs);
        }

        list_state.select(Some(state.selected));
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.focus {
            Focus::Query => match key.code {
                KeyCode::Enter | KeyCode::Esc => state.focus = Focus::List,
                KeyCode::Backspace => state.edit_query(|q| {
                    q.pop();
                }),
                KeyCode::Char(c) => state.edit_query(|q| q.push(c)),
                _ => {}
            },
            Focus::Facets => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Tab => state.focus = Focus::List,
                KeyCode::Down | KeyCode::Char('j') => {
                    if state.facet_cursor + 1 < state.entries.len() {
                        state.facet_cursor += 1;
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    state.facet_cursor = state.facet_cursor.saturating_sub(1);
                }
                KeyCode::Char(' ') | KeyCode::Enter => state.toggle_facet(),
                KeyCode::Char('R') => state.reset_filters(),
                _ => {}
            },
            Focus::List => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => {
                    state.scroll_offset = state.scroll_offset.saturating_add(3);
                }
                KeyCode::Char('K') | KeyCode::PageUp => {
                    state.scroll_offset = state.scroll_offset.saturating_sub(3);
                }
                KeyCode::Right | KeyCode::Char('n') => state.change_page(state.view.page() + 1),
                KeyCode::Left | KeyCode::Char('p') => {
                    state.change_page(state.view.page().saturating_sub(1))
                }
                KeyCode::Char('/') => state.focus = Focus::Query,
                KeyCode::Tab => state.focus = Focus::Facets,
                KeyCode::Char('R') => state.reset_filters(),
                _ => {}
            },
        }

        state.sync_related(source, tx);
    }
    Ok(())
}

fn kind_title(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Jobs => "Jobs",
        RecordKind::Candidates => "Candidates",
        RecordKind::Employers => "Employers",
    }
}

fn focused(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn draw<R: Summary>(frame: &mut Frame, state: &AppState<R>, list_state: &mut ListState) {
    let vm: ViewModel<'_, R> = state.view.view_model();

    let outer = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(frame.area());
    let columns =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).split(outer[0]);
    let left = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(columns[0]);
    let right =
        Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).split(columns[1]);

    // Search box
    let search = Paragraph::new(state.view.filters().query.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search (/) ")
            .border_style(focused(state.focus == Focus::Query)),
    );
    frame.render_widget(search, left[0]);

    // Result list
    let items: Vec<ListItem> = vm
        .page_items
        .iter()
        .map(|record| ListItem::new(record.headline()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    " {} ({} of {}) page {}/{} ",
                    kind_title(state.view.schema().kind),
                    vm.filtered_count,
                    state.view.records().len(),
                    vm.current_page,
                    vm.total_pages
                ))
                .border_style(focused(state.focus == Focus::List)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, left[1], list_state);

    // Facets
    let facet_items: Vec<ListItem> = state
        .entries
        .iter()
        .map(|entry| {
            let on = state.view.filters().is_selected(entry.field, &entry.value);
            let mark = match (entry.single, on) {
                (true, true) => "(*)",
                (true, false) => "( )",
                (false, true) => "[x]",
                (false, false) => "[ ]",
            };
            ListItem::new(format!("{:<10} {} {} ({})", entry.label, mark, entry.value, entry.count))
        })
        .collect();
    let mut facet_state = ListState::default();
    if state.focus == Focus::Facets {
        facet_state.select(Some(state.facet_cursor));
    }
    let facets = List::new(facet_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Filters (tab) ")
                .border_style(focused(state.focus == Focus::Facets)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    frame.render_stateful_widget(facets, right[0], &mut facet_state);

    // Detail
    let detail = Paragraph::new(build_detail(state, &vm))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail, right[1]);

    // Footer help
    let help = Paragraph::new(
        " j/k:move  J/K:scroll  n/p:page  /:search  tab:filters  space:toggle  R:reset  q:quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, outer[1]);
}

fn build_detail<R: Summary>(state: &AppState<R>, vm: &ViewModel<'_, R>) -> Text<'static> {
    let Some(record) = vm.page_items.get(state.selected) else {
        return Text::raw("No results");
    };

    let mut detail = record.detail().into_iter();
    let mut lines: Vec<Line> = Vec::new();
    if let Some(heading) = detail.next() {
        lines.push(Line::from(Span::styled(
            heading,
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines.extend(detail.map(Line::from));

    if record.owner().is_some() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Open positions",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if state.related.view.is_loading() {
            lines.push(Line::from(Span::styled(
                "  loading...",
                Style::default().fg(Color::DarkGray),
            )));
        } else if state.related.view.records().is_empty() {
            lines.push(Line::from(Span::styled(
                "  (none)",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            for job in state.related.view.records() {
                lines.push(Line::from(format!(
                    "  - {} ({}, {})",
                    job.title, job.job_type, job.location
                )));
            }
        }
    }

    Text::from(lines)
}
