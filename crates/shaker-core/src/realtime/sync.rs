use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{PushEvent, PushEventKind};
use crate::store::Stores;

use super::connection::{ConnectionManager, ListenerId};

/// Which collection a push event invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refetch {
    Tasks,
    Agents,
    Contexts,
    Standups,
}

impl Refetch {
    pub fn for_kind(kind: PushEventKind) -> Option<Self> {
        match kind {
            PushEventKind::TaskUpdate => Some(Refetch::Tasks),
            PushEventKind::AgentUpdate => Some(Refetch::Agents),
            PushEventKind::ContextAdded
            | PushEventKind::ContextUpdated
            | PushEventKind::ContextDeleted => Some(Refetch::Contexts),
            PushEventKind::StandupUpdate => Some(Refetch::Standups),
            PushEventKind::Unknown => None,
        }
    }
}

/// Keeps a project's cached collections fresh by re-fetching whenever the
/// push channel reports a change. Listeners only enqueue; a worker task runs
/// the fetches one at a time, in arrival order.
///
/// Dropping the handle unregisters the listeners and stops the worker.
pub struct ProjectSync {
    connection: ConnectionManager,
    project_id: String,
    listeners: Vec<(PushEventKind, ListenerId)>,
    worker: JoinHandle<()>,
}

impl ProjectSync {
    /// Must be called from within a Tokio runtime.
    pub fn attach(connection: &ConnectionManager, stores: &Stores, project_id: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Refetch>();

        let mut listeners = Vec::new();
        for kind in PushEventKind::ALL {
            let Some(target) = Refetch::for_kind(kind) else {
                continue;
            };
            let tx = tx.clone();
            let active = project_id.to_string();
            let id = connection.on(kind, move |event: &PushEvent| {
                if !event.concerns_project(&active) {
                    tracing::debug!(
                        "Ignoring {:?} for project {:?}",
                        event.kind(),
                        event.project_id()
                    );
                    return;
                }
                let _ = tx.send(target);
            });
            listeners.push((kind, id));
        }

        let worker = tokio::spawn(refetch_worker(stores.clone(), project_id.to_string(), rx));

        Self {
            connection: connection.clone(),
            project_id: project_id.to_string(),
            listeners,
            worker,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl Drop for ProjectSync {
    fn drop(&mut self) {
        for (kind, id) in self.listeners.drain(..) {
            self.connection.off(kind, id);
        }
        self.worker.abort();
    }
}

async fn refetch_worker(stores: Stores, project_id: String, mut rx: mpsc::UnboundedReceiver<Refetch>) {
    while let Some(target) = rx.recv().await {
        tracing::debug!("Re-fetching {:?} for project {}", target, project_id);
        // Failures are already recorded in the store's error field
        let result = match target {
            Refetch::Tasks => stores.tasks.fetch_project_tasks(&project_id).await.map(drop),
            Refetch::Agents => stores.agents.fetch_project_agents(&project_id).await.map(drop),
            Refetch::Contexts => stores
                .contexts
                .fetch_project_contexts(&project_id)
                .await
                .map(drop),
            Refetch::Standups => stores
                .standups
                .fetch_project_standups(&project_id)
                .await
                .map(drop),
        };
        if let Err(e) = result {
            tracing::warn!("Re-fetch of {:?} failed: {}", target, e);
        }
    }
}
