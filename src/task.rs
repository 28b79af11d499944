use crate::catalog::ProductRecord;
use crate::phase::PhaseGuard;
use tokio::sync::{OwnedSemaphorePermit, mpsc};

/// A listing page still to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    pub url: String,
    pub offset: u32,
}

/// A product whose detail document is still to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTask {
    pub url: String,
    pub id: u64,
}

/// Work for the pool, tagged by stage. Each variant carries the queue its
/// stage writes to, so that queue stays open exactly as long as some task
/// could still write to it.
#[derive(Debug)]
pub enum FetchTask {
    Page {
        task: PageTask,
        products: mpsc::Sender<ProductTask>,
    },
    Product {
        task: ProductTask,
        results: mpsc::Sender<ProductRecord>,
    },
}

impl FetchTask {
    pub fn url(&self) -> &str {
        match self {
            FetchTask::Page { task, .. } => &task.url,
            FetchTask::Product { task, .. } => &task.url,
        }
    }
}

/// A dispatched task together with its slot in the phase's in-flight count.
#[derive(Debug)]
pub struct Job {
    pub task: FetchTask,
    pub guard: PhaseGuard,
    /// Page jobs hold one of the coordinator's page slots until they finish.
    pub slot: Option<OwnedSemaphorePermit>,
}
