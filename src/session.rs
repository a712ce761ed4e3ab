use crate::config::Config;
use crate::filter::ChartFilter;
use crate::ir::{Department, Entity};
use crate::layout::{ChartLayout, CollapseState, LayoutSolver, OrgGraph, compute_chart_layout};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence number of a layout request within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    Applied {
        token: RequestToken,
        layout: ChartLayout,
    },
    /// A newer request was issued while this one was in flight.
    Stale { token: RequestToken },
}

impl LayoutOutcome {
    pub fn token(&self) -> RequestToken {
        match self {
            LayoutOutcome::Applied { token, .. } | LayoutOutcome::Stale { token } => *token,
        }
    }

    pub fn into_layout(self) -> Option<ChartLayout> {
        match self {
            LayoutOutcome::Applied { layout, .. } => Some(layout),
            LayoutOutcome::Stale { .. } => None,
        }
    }
}

/// State one chart keeps between layout runs.
///
/// Collapse and filter state only change through `&mut self`, so they are never
/// touched while a run borrows the session. Each run snapshots them up front.
/// Issuing a token only needs `&self`, which lets a newer run start while an
/// older one is still awaiting its solver; the older one then reports
/// [`LayoutOutcome::Stale`].
#[derive(Debug)]
pub struct ChartSession {
    config: Config,
    collapse: CollapseState,
    filter: ChartFilter,
    initialized: bool,
    latest: AtomicU64,
}

impl ChartSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            collapse: CollapseState::new(),
            filter: ChartFilter::new(),
            initialized: false,
            latest: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seeds the collapse state the first time a non-empty org shows up.
    pub fn load(&mut self, entities: &[Entity]) {
        if self.initialized || entities.is_empty() {
            return;
        }
        if self.config.session.collapse_on_load {
            let graph = OrgGraph::build(entities);
            self.collapse = CollapseState::all_managers(&graph);
        }
        self.initialized = true;
        tracing::debug!(collapsed = self.collapse.len(), "chart session initialized");
    }

    pub fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn collapse_state_mut(&mut self) -> &mut CollapseState {
        &mut self.collapse
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        self.collapse.toggle(id)
    }

    pub fn expand_all(&mut self) {
        self.collapse.clear();
    }

    pub fn filter(&self) -> &ChartFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ChartFilter) {
        self.filter = filter;
    }

    pub fn issue_token(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Filters, lays out and returns the chart unless a newer request overtook it.
    pub async fn layout<S>(
        &self,
        entities: &[Entity],
        departments: &[Department],
        solver: &S,
    ) -> LayoutOutcome
    where
        S: LayoutSolver + ?Sized,
    {
        let token = self.issue_token();
        let collapsed = self.collapse.clone();
        let filtered = self.filter.apply(entities, departments);
        tracing::debug!(
            token = token.value(),
            total = entities.len(),
            filtered = filtered.len(),
            "layout requested"
        );

        let layout = compute_chart_layout(&filtered, &collapsed, &self.config.layout, solver).await;

        if !self.is_current(token) {
            tracing::debug!(token = token.value(), "discarding stale layout");
            return LayoutOutcome::Stale { token };
        }
        LayoutOutcome::Applied { token, layout }
    }

    /// Manual re-layout with unchanged inputs.
    pub async fn relayout<S>(
        &self,
        entities: &[Entity],
        departments: &[Department],
        solver: &S,
    ) -> LayoutOutcome
    where
        S: LayoutSolver + ?Sized,
    {
        self.layout(entities, departments, solver).await
    }
}
