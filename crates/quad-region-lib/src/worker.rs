//! Background task owning a spatial index
//!
//! The worker is the single owner of its [`SpatialIndex`]; every request is
//! served in arrival order, so mutations and reads never interleave. Callers
//! talk to it through a cloneable [`WorkerHandle`]. After each change the
//! worker bumps a revision number that renderers can watch to know when to
//! re-query.

use crate::{Bounds, DataError, QuadHit, QuadPath, Result, SpatialIndex, codec};
use geo::Point;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Number of requests that may queue before senders wait
const REQUEST_QUEUE_CAPACITY: usize = 64;

/// Messages understood by the worker
#[derive(Debug)]
enum Request {
    Import {
        data: Vec<u8>,
        reply: oneshot::Sender<Result<()>>,
    },
    Export {
        reply: oneshot::Sender<Result<Vec<u8>>>,
    },
    QueryRange {
        query: Bounds,
        reply: oneshot::Sender<Vec<QuadHit>>,
    },
    Locate {
        point: Point<f64>,
        max_depth: Option<u8>,
        reply: oneshot::Sender<QuadPath>,
    },
    Subdivide {
        path: QuadPath,
        reply: oneshot::Sender<bool>,
    },
    SubdivideAt {
        point: Point<f64>,
        reply: oneshot::Sender<Option<QuadPath>>,
    },
}

/// Cloneable sender side of a running worker
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    requests: mpsc::Sender<Request>,
    revision: watch::Receiver<u64>,
}

/// Start a worker task owning `index`
///
/// The task ends once every [`WorkerHandle`] is dropped and hands the index
/// back through the returned join handle. Must be called inside a tokio runtime.
pub fn spawn_worker(index: SpatialIndex) -> (WorkerHandle, JoinHandle<SpatialIndex>) {
    let (requests, inbox) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
    let (revision_tx, revision) = watch::channel(0);
    let task = tokio::spawn(run(index, inbox, revision_tx));
    (WorkerHandle { requests, revision }, task)
}

async fn run(
    mut index: SpatialIndex,
    mut inbox: mpsc::Receiver<Request>,
    revision: watch::Sender<u64>,
) -> SpatialIndex {
    tracing::debug!(nodes = index.len(), "index worker started");

    while let Some(request) = inbox.recv().await {
        serve(&mut index, request, &revision);
    }

    tracing::debug!(nodes = index.len(), "index worker stopped");
    index
}

/// Handle one request
///
/// The revision is bumped before replying, so a caller that sees its change
/// acknowledged also sees the new revision. A caller that gave up waiting
/// drops its reply receiver; the send error is ignored since the work itself
/// has already been done.
fn serve(index: &mut SpatialIndex, request: Request, revision: &watch::Sender<u64>) {
    let bump = |changed: bool| {
        if changed {
            revision.send_modify(|rev| *rev += 1);
        }
    };

    match request {
        Request::Import { data, reply } => {
            let result = codec::decode(&data).map(|snapshot| index.restore(snapshot));
            if let Err(err) = &result {
                tracing::warn!("Rejected snapshot import: {err}");
            }
            bump(result.is_ok());
            let _ = reply.send(result);
        }
        Request::Export { reply } => {
            let _ = reply.send(index.export());
        }
        Request::QueryRange { query, reply } => {
            let _ = reply.send(index.query_range(&query));
        }
        Request::Locate {
            point,
            max_depth,
            reply,
        } => {
            let depth = max_depth.unwrap_or(index.config().max_depth);
            let _ = reply.send(index.locate_with_depth(point, depth));
        }
        Request::Subdivide { path, reply } => {
            let changed = index.subdivide(&path);
            bump(changed);
            let _ = reply.send(changed);
        }
        Request::SubdivideAt { point, reply } => {
            let subdivided = index.subdivide_at(point);
            if subdivided.is_none() {
                tracing::debug!(?point, "no leaf to subdivide at point");
            }
            bump(subdivided.is_some());
            let _ = reply.send(subdivided);
        }
    }
}

impl WorkerHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(build(reply))
            .await
            .map_err(|_| DataError::WorkerClosed)?;
        response.await.map_err(|_| DataError::WorkerClosed)
    }

    /// Replace the worker's tree with a snapshot
    pub async fn import(&self, data: Vec<u8>) -> Result<()> {
        self.request(|reply| Request::Import { data, reply }).await?
    }

    pub async fn export(&self) -> Result<Vec<u8>> {
        self.request(|reply| Request::Export { reply }).await?
    }

    pub async fn query_range(&self, query: Bounds) -> Result<Vec<QuadHit>> {
        self.request(|reply| Request::QueryRange { query, reply }).await
    }

    /// Locate `point`, descending at most `max_depth` levels (or the configured limit)
    pub async fn locate(&self, point: Point<f64>, max_depth: Option<u8>) -> Result<QuadPath> {
        self.request(|reply| Request::Locate {
            point,
            max_depth,
            reply,
        })
        .await
    }

    pub async fn subdivide(&self, path: QuadPath) -> Result<bool> {
        self.request(|reply| Request::Subdivide { path, reply }).await
    }

    /// Subdivide the leaf under `point`, returning its path if it was split
    pub async fn subdivide_at(&self, point: Point<f64>) -> Result<Option<QuadPath>> {
        self.request(|reply| Request::SubdivideAt { point, reply }).await
    }

    /// Current revision; it increases by one for every change to the tree
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver notified whenever the tree changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.clone()
    }
}
