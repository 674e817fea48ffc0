//! Async handoff of attachments between tasks.
//!
//! `AttachmentPool` keeps up to `size` attachments. A background task opens
//! them one by one on the blocking thread pool and parks them in a bounded
//! channel; `acquire` takes one out and `dispose` puts it back. Attachments
//! themselves stay synchronous, so a task that holds one uses it like any
//! other blocking resource.
//!
//! # Example
//!
//! ```no_run
//! use fbclient_rs::pool::AttachmentPool;
//! use fbclient_rs::{Attachment, LoopbackClient};
//!
//! #[tokio::main]
//! async fn main() -> fbclient_rs::Result<()> {
//!     let pool = AttachmentPool::new(4, || {
//!         Attachment::attach(LoopbackClient::new(), "employee.fdb", &[])
//!     });
//!     let mut att = pool.acquire().await?;
//!     att.execute("DELETE FROM SALES")?;
//!     pool.dispose(att).await;
//!     pool.close().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::attachment::Attachment;
use crate::error::{Error, Result};

type Factory = Arc<dyn Fn() -> Result<Attachment> + Send + Sync>;

/// A fixed-size pool of attachments.
pub struct AttachmentPool {
    size: usize,
    idle_tx: mpsc::Sender<Result<Attachment>>,
    idle_rx: Mutex<mpsc::Receiver<Result<Attachment>>>,
    closed: watch::Sender<bool>,
    filler: JoinHandle<()>,
}

impl AttachmentPool {
    /// Create a pool of `size` attachments opened with `factory`.
    ///
    /// Must be called inside a tokio runtime. Attachments are opened in the
    /// background; `acquire` waits for the first one. A factory failure is
    /// handed to the `acquire` call that would have received the attachment.
    pub fn new<F>(size: usize, factory: F) -> Self
    where
        F: Fn() -> Result<Attachment> + Send + Sync + 'static,
    {
        let size = size.max(1);
        let (idle_tx, idle_rx) = mpsc::channel(size);
        let filler = tokio::spawn(fill(size, Arc::new(factory), idle_tx.clone()));
        let (closed, _) = watch::channel(false);
        Self {
            size,
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            closed,
            filler,
        }
    }

    /// Number of attachments the pool manages.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Take an attachment, waiting until one is idle.
    ///
    /// Fails with `InvalidHandle` once the pool is closed, including for
    /// callers still waiting when [`AttachmentPool::close`] runs.
    pub async fn acquire(&self) -> Result<Attachment> {
        if *self.closed.borrow() {
            return Err(Error::InvalidHandle);
        }
        tokio::select! {
            biased;
            _ = closing(self.closed.subscribe()) => Err(Error::InvalidHandle),
            item = async { self.idle_rx.lock().await.recv().await } => {
                item.unwrap_or(Err(Error::InvalidHandle))
            }
        }
    }

    /// Return an attachment. After [`AttachmentPool::close`] it is closed instead.
    pub async fn dispose(&self, attachment: Attachment) {
        if let Err(returned) = self.idle_tx.send(Ok(attachment)).await {
            tracing::debug!("pool closed, detaching returned attachment");
            if let Ok(att) = returned.0 {
                detach(att).await;
            }
        }
    }

    /// Stop opening attachments and close every idle one.
    pub async fn close(&self) {
        self.closed.send_replace(true);
        self.filler.abort();
        let mut idle = self.idle_rx.lock().await;
        idle.close();
        while let Ok(item) = idle.try_recv() {
            if let Ok(att) = item {
                detach(att).await;
            }
        }
    }
}

impl Drop for AttachmentPool {
    fn drop(&mut self) {
        self.filler.abort();
    }
}

async fn fill(size: usize, factory: Factory, idle: mpsc::Sender<Result<Attachment>>) {
    for n in 0..size {
        let factory = factory.clone();
        let opened = tokio::task::spawn_blocking(move || factory())
            .await
            .unwrap_or_else(|e| Err(Error::protocol(format!("attachment factory panicked: {}", e))));
        if let Err(e) = &opened {
            tracing::warn!(error = %e, "failed to open pooled attachment");
        } else {
            tracing::debug!(n = n + 1, size, "opened pooled attachment");
        }
        if idle.send(opened).await.is_err() {
            return;
        }
    }
}

/// Resolves once the pool is marked closed.
async fn closing(mut closed: watch::Receiver<bool>) {
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            return;
        }
    }
}

async fn detach(mut att: Attachment) {
    let closed = tokio::task::spawn_blocking(move || att.close()).await;
    match closed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "failed to detach pooled attachment"),
        Err(e) => tracing::warn!(error = %e, "detach task failed"),
    }
}
