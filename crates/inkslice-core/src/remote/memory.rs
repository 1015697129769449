//! In-process gateway backed by a [`StrokeLog`].

use super::{BoxFuture, StrokeGateway, StrokeLog};
use crate::error::{GatewayError, GatewayResult};
use crate::stroke::Stroke;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Gateway for tests and offline editing: the "remote" log lives in memory.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    log: RwLock<StrokeLog>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the underlying log.
    pub fn log(&self) -> GatewayResult<StrokeLog> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> GatewayResult<RwLockReadGuard<'_, StrokeLog>> {
        self.log
            .read()
            .map_err(|e| GatewayError::Unavailable(format!("Lock error: {}", e)))
    }

    fn write(&self) -> GatewayResult<RwLockWriteGuard<'_, StrokeLog>> {
        self.log
            .write()
            .map_err(|e| GatewayError::Unavailable(format!("Lock error: {}", e)))
    }
}

impl StrokeGateway for MemoryGateway {
    fn append_stroke(&self, stroke: &Stroke, author_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let stroke = stroke.clone();
        let author_id = author_id.to_string();
        Box::pin(async move {
            if !self.write()?.append(stroke, &author_id) {
                log::debug!("duplicate append acknowledged for {}", author_id);
            }
            Ok(())
        })
    }

    fn list_strokes(&self, since_count: usize) -> BoxFuture<'_, GatewayResult<Vec<Stroke>>> {
        Box::pin(async move { Ok(self.read()?.list(since_count)) })
    }

    fn undo_last(&self, author_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let author_id = author_id.to_string();
        Box::pin(async move {
            self.write()?.undo_last(&author_id)?;
            Ok(())
        })
    }

    fn redo_last(&self, author_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let author_id = author_id.to_string();
        Box::pin(async move {
            self.write()?.redo_last(&author_id)?;
            Ok(())
        })
    }

    fn clear_all(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.write()?.clear();
            Ok(())
        })
    }
}
