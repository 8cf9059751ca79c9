use std::sync::Arc;

use fixchain_graph::RepairGraph;
use fixchain_session::{
    HistoryStore, HistoryWindow, InMemoryHistoryStore, InMemoryUsageRecorder, TitleGenerator,
    UsageRecorder,
};

use crate::{ActiveExchanges, Authenticator};

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Everything a request handler needs, shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub graph: RepairGraph,
    pub auth: Arc<dyn Authenticator>,
    pub history: Arc<dyn HistoryStore>,
    pub usage: Arc<dyn UsageRecorder>,
    pub titles: TitleGenerator,
    pub window: HistoryWindow,
    pub active: ActiveExchanges,
    /// Events buffered between a run and a slow client.
    pub channel_capacity: usize,
}

impl AppState {
    /// In-memory history and usage, heuristic titles.
    pub fn new(graph: RepairGraph, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            graph,
            auth,
            history: Arc::new(InMemoryHistoryStore::new()),
            usage: Arc::new(InMemoryUsageRecorder::new()),
            titles: TitleGenerator::heuristic(),
            window: HistoryWindow::default(),
            active: ActiveExchanges::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }

    pub fn with_usage(mut self, usage: Arc<dyn UsageRecorder>) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_titles(mut self, titles: TitleGenerator) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }
}
