//! The migration pipe: the streaming channel from adapter to orchestrator.
//!
//! A `migrate` call reports progress and errors through a bounded
//! single-producer/single-consumer channel instead of a return value. The
//! adapter is the only writer and the orchestrator the only reader. The
//! first event is always [`PipeEvent::Started`], so the reader knows a
//! file's execution has begun before any error can arrive. Dropping the
//! sender closes the stream; there is no separate "done" event, and nothing
//! is sent after close.
//!
//! Backpressure is part of the contract: the reader must drain events as
//! they arrive or the writer blocks on the bounded channel. Slow draining
//! delays, but never corrupts, the ledger, because ledger mutation happens
//! before any failure event is sent.

use tokio::sync::mpsc;

use crate::error::MigrateError;
use crate::file::MigrationFile;

/// Channel capacity. Small: a migrate call sends one file and rarely more
/// than two errors.
const PIPE_CAPACITY: usize = 16;

/// One event streamed from an adapter.
#[derive(Debug)]
pub enum PipeEvent {
    /// Acknowledgment that execution of this file has begun.
    Started(MigrationFile),
    /// A failure: statement, rollback, commit, or content read.
    Error(MigrateError),
}

/// Create a connected sender/receiver pair for one `migrate` call.
pub fn pipe() -> (PipeSender, PipeReceiver) {
    let (tx, rx) = mpsc::channel(PIPE_CAPACITY);
    (PipeSender { tx }, PipeReceiver { rx })
}

/// Write half, owned by the adapter. The stream closes when this is dropped,
/// which happens on every exit path of `migrate`.
#[derive(Debug)]
pub struct PipeSender {
    tx: mpsc::Sender<PipeEvent>,
}

impl PipeSender {
    /// Emit the started acknowledgment. Send failures mean the reader went
    /// away; the migration itself proceeds regardless.
    pub async fn started(&self, file: MigrationFile) {
        let _ = self.tx.send(PipeEvent::Started(file)).await;
    }

    /// Emit an error event.
    pub async fn error(&self, err: MigrateError) {
        let _ = self.tx.send(PipeEvent::Error(err)).await;
    }
}

/// Read half, owned by the orchestrator.
#[derive(Debug)]
pub struct PipeReceiver {
    rx: mpsc::Receiver<PipeEvent>,
}

impl PipeReceiver {
    /// Receive the next event, or `None` once the adapter has closed the
    /// pipe.
    pub async fn recv(&mut self) -> Option<PipeEvent> {
        self.rx.recv().await
    }

    /// Drain the pipe to completion, returning the started file (if the
    /// adapter got that far) and every error in arrival order.
    pub async fn drain(mut self) -> (Option<MigrationFile>, Vec<MigrateError>) {
        let mut started = None;
        let mut errors = Vec::new();
        while let Some(event) = self.rx.recv().await {
            match event {
                PipeEvent::Started(file) => started = Some(file),
                PipeEvent::Error(err) => errors.push(err),
            }
        }
        (started, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Direction;

    #[tokio::test]
    async fn started_arrives_before_errors() {
        let (tx, mut rx) = pipe();
        let file = MigrationFile::with_content(1, "a", Direction::Up, "SELECT 1");
        tx.started(file).await;
        tx.error(MigrateError::Statement("boom".into())).await;
        drop(tx);

        assert!(matches!(rx.recv().await, Some(PipeEvent::Started(_))));
        assert!(matches!(rx.recv().await, Some(PipeEvent::Error(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn drop_closes_the_stream() {
        let (tx, mut rx) = pipe();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn drain_separates_file_and_errors() {
        let (tx, rx) = pipe();
        let file = MigrationFile::with_content(7, "b", Direction::Down, "DROP TABLE b");
        tx.started(file).await;
        tx.error(MigrateError::Statement("first".into())).await;
        tx.error(MigrateError::Statement("second".into())).await;
        drop(tx);

        let (started, errors) = rx.drain().await;
        assert_eq!(started.unwrap().version, 7);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "first");
        assert_eq!(errors[1].to_string(), "second");
    }

    #[tokio::test]
    async fn drain_with_no_events() {
        let (tx, rx) = pipe();
        drop(tx);
        let (started, errors) = rx.drain().await;
        assert!(started.is_none());
        assert!(errors.is_empty());
    }
}
