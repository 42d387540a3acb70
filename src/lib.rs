//! List-view core for a job board: facets, filtering, pagination, and the
//! view model a rendering layer draws from.

pub mod api;
pub mod config;
pub mod facets;
pub mod filter;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod paginate;
pub mod schema;
pub mod tui;
pub mod view;

pub use facets::{derive_facets, FacetCount, FacetOrder};
pub use filter::{filter_records, FilterState};
pub use models::{Candidate, Employer, ExperienceLevel, Job, Record, RecordKind};
pub use paginate::{paginate, Page};
pub use schema::{Listable, MatchMode, Schema, SelectKind};
pub use view::{assemble, FetchTicket, ListView, UiEffect, ViewModel};
