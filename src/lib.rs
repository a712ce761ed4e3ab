#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod filter;
pub mod intent;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod session;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, SessionConfig, load_config, parse_config};
pub use filter::{ChartFilter, all_tags, department_names, filter_entities, search_manager_candidates};
pub use intent::{Intent, IntentError};
pub use ir::{Department, Entity, EntityId, OrgData, Position};
pub use layout::{
    ChartEdge, ChartLayout, CollapseState, DagreSolver, LayoutSolver, NodePlacement, SolverError,
    compute_chart_layout, prepare_layout,
};
pub use session::{ChartSession, LayoutOutcome, RequestToken};
