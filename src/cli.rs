use crate::config::load_config;
use crate::filter::ChartFilter;
use crate::ir::OrgData;
use crate::layout::DagreSolver;
use crate::layout_dump::write_layout_dump;
use crate::session::ChartSession;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "orgchart", version, about = "Org chart layout with collapsible teams")]
pub struct Args {
    /// Org export (JSON with `profiles` and `departments`) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Only show entities of this department (by name)
    #[arg(long = "department")]
    pub department: Option<String>,

    /// Only show entities carrying any of these tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Start with every manager expanded
    #[arg(long = "expand-all", conflicts_with = "collapse")]
    pub expand_all: bool,

    /// Collapse these managers (implies starting from fully expanded)
    #[arg(long = "collapse")]
    pub collapse: Vec<String>,

    /// Expand these managers after the initial collapse
    #[arg(long = "expand")]
    pub expand: Vec<String>,

    /// Override the large-team threshold
    #[arg(long = "threshold")]
    pub threshold: Option<usize>,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        config.layout.large_team_threshold = threshold;
    }

    let input = read_input(args.input.as_deref())?;
    let org: OrgData = serde_json::from_str(&input).context("invalid org export")?;

    let mut session = ChartSession::new(config);
    session.load(&org.profiles);
    apply_collapse_flags(&mut session, &args);
    session.set_filter(filter_from_args(&args));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let outcome = runtime.block_on(session.layout(
        &org.profiles,
        &org.departments,
        &DagreSolver::new(),
    ));
    // A timed-out dagre run may still be busy on the blocking pool.
    runtime.shutdown_background();
    let layout = outcome
        .into_layout()
        .ok_or_else(|| anyhow::anyhow!("layout was superseded"))?;

    if let Some(reason) = &layout.degraded {
        tracing::warn!(%reason, "layout degraded, nodes placed at origin");
    }
    write_layout_dump(args.output.as_deref(), &layout, &org.profiles)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn apply_collapse_flags(session: &mut ChartSession, args: &Args) {
    if args.expand_all || !args.collapse.is_empty() {
        session.expand_all();
    }
    let state = session.collapse_state_mut();
    for id in &args.collapse {
        state.collapse(id);
    }
    for id in &args.expand {
        state.expand(id);
    }
}

fn filter_from_args(args: &Args) -> ChartFilter {
    let mut filter = ChartFilter::new();
    if let Some(department) = args.department.as_deref() {
        filter = filter.with_department(department);
    }
    for tag in &args.tags {
        filter = filter.with_tag(tag);
    }
    filter
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::Entity;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("orgchart").chain(argv.iter().copied())).unwrap()
    }

    fn session() -> ChartSession {
        let org = vec![
            Entity::new("ceo", "CEO"),
            Entity::new("cto", "CTO").with_manager("ceo"),
            Entity::new("dev", "Dev").with_manager("cto"),
        ];
        let mut session = ChartSession::new(Config::default());
        session.load(&org);
        session
    }

    #[test]
    fn expand_flags_open_selected_managers() {
        let args = parse(&["--expand", "ceo"]);
        let mut session = session();
        apply_collapse_flags(&mut session, &args);
        assert!(!session.collapse_state().is_collapsed("ceo"));
        assert!(session.collapse_state().is_collapsed("cto"));
    }

    #[test]
    fn collapse_flags_start_from_expanded() {
        let args = parse(&["--collapse", "cto"]);
        let mut session = session();
        apply_collapse_flags(&mut session, &args);
        assert_eq!(session.collapse_state().iter().collect::<Vec<_>>(), vec!["cto"]);
    }

    #[test]
    fn expand_all_conflicts_with_collapse() {
        let argv = ["orgchart", "--expand-all", "--collapse", "x"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn filter_flags_build_filter() {
        let args = parse(&["--department", "Eng", "--tag", "rust", "--tag", "lead"]);
        let filter = filter_from_args(&args);
        assert_eq!(filter.department.as_deref(), Some("Eng"));
        assert_eq!(filter.tags.len(), 2);
    }
}
