use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use contracts::{PlayerCode, PlayerUpdate};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::HubClient;

/// Coalesces rapid edits into one save per code.
///
/// Each submitted edit restarts the quiet window. When the window elapses the
/// merged edit is handed to the sink, later attribute values replacing earlier
/// ones. Dropping the sender side via [`DebouncedSaver::shutdown`] flushes
/// whatever is still pending.
pub struct DebouncedSaver {
    tx: mpsc::UnboundedSender<(PlayerCode, PlayerUpdate)>,
    task: JoinHandle<()>,
}

impl DebouncedSaver {
    pub fn spawn<F, Fut>(quiet: Duration, sink: F) -> Self
    where
        F: FnMut(PlayerCode, PlayerUpdate) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(rx, quiet, sink));
        Self { tx, task }
    }

    /// Saver that pushes coalesced edits to the backend, logging failures.
    pub fn for_client(client: HubClient, quiet: Duration) -> Self {
        Self::spawn(quiet, move |code, update| {
            let client = client.clone();
            async move {
                if let Err(err) = client.save_player(&code, &update).await {
                    warn!(%code, error = %err, "debounced save failed");
                }
            }
        })
    }

    /// Queues an edit. Edits that change nothing are dropped. Returns `false`
    /// once the saver has stopped.
    pub fn submit(&self, code: PlayerCode, update: PlayerUpdate) -> bool {
        if update.is_empty() {
            return !self.tx.is_closed();
        }
        self.tx.send((code, update)).is_ok()
    }

    /// Flushes pending edits and waits for the worker to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(err) = self.task.await {
            warn!(error = %err, "debounce worker ended abnormally");
        }
    }
}

async fn run<F, Fut>(
    mut rx: mpsc::UnboundedReceiver<(PlayerCode, PlayerUpdate)>,
    quiet: Duration,
    mut sink: F,
) where
    F: FnMut(PlayerCode, PlayerUpdate) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: BTreeMap<PlayerCode, PlayerUpdate> = BTreeMap::new();

    loop {
        if pending.is_empty() {
            match rx.recv().await {
                Some((code, update)) => coalesce(&mut pending, code, update),
                None => break,
            }
            continue;
        }

        match tokio::time::timeout(quiet, rx.recv()).await {
            Ok(Some((code, update))) => coalesce(&mut pending, code, update),
            Ok(None) => {
                flush(&mut pending, &mut sink).await;
                break;
            }
            Err(_) => flush(&mut pending, &mut sink).await,
        }
    }
}

fn coalesce(pending: &mut BTreeMap<PlayerCode, PlayerUpdate>, code: PlayerCode, update: PlayerUpdate) {
    match pending.get_mut(&code) {
        Some(existing) => existing.merge(update),
        None => {
            pending.insert(code, update);
        }
    }
}

async fn flush<F, Fut>(pending: &mut BTreeMap<PlayerCode, PlayerUpdate>, sink: &mut F)
where
    F: FnMut(PlayerCode, PlayerUpdate) -> Fut,
    Fut: Future<Output = ()>,
{
    for (code, update) in std::mem::take(pending) {
        debug!(%code, "flushing debounced save");
        sink(code, update).await;
    }
}
