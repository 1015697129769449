//! Remote stroke gateway abstraction.
//!
//! The remote side is an append-only, per-room stroke log. The engine only ever
//! appends, lists, and undoes/redoes one entry at a time; it knows nothing about how
//! the log is stored.

mod memory;
mod stroke_log;

pub use memory::MemoryGateway;
pub use stroke_log::StrokeLog;

use crate::error::GatewayResult;
use crate::stroke::Stroke;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by gateway operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The five operations the engine needs from the remote stroke log.
pub trait StrokeGateway: Send + Sync {
    /// Append a stroke to the log. Retrying an append that already landed is harmless.
    fn append_stroke(&self, stroke: &Stroke, author_id: &str) -> BoxFuture<'_, GatewayResult<()>>;

    /// Active strokes in log order, skipping the first `since_count`.
    fn list_strokes(&self, since_count: usize) -> BoxFuture<'_, GatewayResult<Vec<Stroke>>>;

    /// Undo exactly one prior append by `author_id` (LIFO per author).
    fn undo_last(&self, author_id: &str) -> BoxFuture<'_, GatewayResult<()>>;

    /// Redo exactly one prior undo by `author_id`.
    fn redo_last(&self, author_id: &str) -> BoxFuture<'_, GatewayResult<()>>;

    /// Drop every entry in the log.
    fn clear_all(&self) -> BoxFuture<'_, GatewayResult<()>>;
}
