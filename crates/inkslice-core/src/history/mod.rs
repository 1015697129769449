//! Per-user undo/redo kept in lockstep with the remote stroke log.
//!
//! The remote log only knows single appends and single-step undo/redo per author.
//! Every local entry therefore remembers how many remote appends it was built from,
//! and undoing or redoing it replays exactly that many remote steps.

mod action;

pub use action::CompositeAction;

use crate::config::EngineConfig;
use crate::edit::{CutOutcome, cut, replay_log};
use crate::error::{EngineError, EngineResult};
use crate::geometry::SelectionRect;
use crate::remote::StrokeGateway;
use crate::stroke::{Stroke, StrokeStore};
use std::sync::Arc;

/// Undo/redo controller for one user session.
pub struct ActionLog<G: StrokeGateway> {
    gateway: Arc<G>,
    author_id: String,
    config: EngineConfig,
    undo_stack: Vec<CompositeAction>,
    redo_stack: Vec<CompositeAction>,
    /// Set while a remote round trip is outstanding.
    busy: bool,
}

impl<G: StrokeGateway> ActionLog<G> {
    /// Create an empty log for `author_id`.
    pub fn new(gateway: Arc<G>, author_id: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            gateway,
            author_id: author_id.into(),
            config,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            busy: false,
        }
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Whether a remote round trip is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Entries on the undo stack, oldest first.
    pub fn undo_entries(&self) -> &[CompositeAction] {
        &self.undo_stack
    }

    /// Drop all local history. The remote log is untouched.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Persist a drawn stroke and record it as one undo step.
    pub async fn commit_stroke(&mut self, store: &mut StrokeStore, stroke: Stroke) -> EngineResult<()> {
        self.begin()?;
        let result = self.commit_stroke_inner(store, stroke).await;
        self.busy = false;
        result
    }

    /// Cut the working set against `rect` and record the cut as one undo step.
    ///
    /// A cut that touches nothing is returned as is, with no remote traffic.
    pub async fn commit_cut(&mut self, store: &mut StrokeStore, rect: SelectionRect) -> EngineResult<CutOutcome> {
        self.begin()?;
        let result = self.commit_cut_inner(store, rect).await;
        self.busy = false;
        result
    }

    /// Persist pasted strokes and record them as one undo step.
    pub async fn commit_paste(&mut self, store: &mut StrokeStore, strokes: Vec<Stroke>) -> EngineResult<()> {
        if strokes.is_empty() {
            return Err(EngineError::InvalidPasteTarget);
        }
        self.begin()?;
        let result = self.commit_paste_inner(store, strokes).await;
        self.busy = false;
        result
    }

    /// Undo the most recent entry. Returns `false` when there is nothing to undo.
    pub async fn undo(&mut self, store: &mut StrokeStore) -> EngineResult<bool> {
        self.begin()?;
        let result = self.undo_inner(store).await;
        self.busy = false;
        result
    }

    /// Redo the most recently undone entry. Returns `false` when there is nothing to redo.
    pub async fn redo(&mut self, store: &mut StrokeStore) -> EngineResult<bool> {
        self.begin()?;
        let result = self.redo_inner(store).await;
        self.busy = false;
        result
    }

    /// Rebuild the working set from the remote log.
    ///
    /// If a previous round trip never completed (its future was dropped), the remote
    /// outcome is unknown: history is discarded and the busy flag released.
    pub async fn resync(&mut self, store: &mut StrokeStore) -> EngineResult<()> {
        if self.busy {
            log::warn!("discarding history after an interrupted remote round trip");
            self.clear();
            self.busy = false;
        }
        self.resync_inner(store).await
    }

    /// Clear the remote log, the working set and all history.
    pub async fn clear_all(&mut self, store: &mut StrokeStore) -> EngineResult<()> {
        self.begin()?;
        let result = self.gateway.clear_all().await;
        self.busy = false;
        result.map_err(EngineError::RemoteAppend)?;
        store.clear();
        self.clear();
        log::info!("cleared canvas for {}", self.author_id);
        Ok(())
    }

    fn begin(&mut self) -> EngineResult<()> {
        if self.busy {
            return Err(EngineError::Busy);
        }
        self.busy = true;
        Ok(())
    }

    async fn commit_stroke_inner(&mut self, store: &mut StrokeStore, stroke: Stroke) -> EngineResult<()> {
        self.append_all(std::slice::from_ref(&stroke)).await?;
        let action = CompositeAction::Atomic { stroke };
        action.apply(store);
        self.push(action);
        Ok(())
    }

    async fn commit_cut_inner(&mut self, store: &mut StrokeStore, rect: SelectionRect) -> EngineResult<CutOutcome> {
        let outcome = cut(store, rect, &self.author_id, &self.config);
        let Some(record) = outcome.cut_record.clone() else {
            log::debug!("cut touched nothing");
            return Ok(outcome);
        };

        let mut remote = Vec::with_capacity(1 + outcome.erase_strokes.len());
        remote.push(record);
        remote.extend(outcome.erase_strokes.iter().cloned());
        let appended = self.append_all(&remote).await?;

        if let Some(action) = CompositeAction::from_cut(&outcome, appended) {
            action.apply(store);
            self.push(action);
        }
        Ok(outcome)
    }

    async fn commit_paste_inner(&mut self, store: &mut StrokeStore, strokes: Vec<Stroke>) -> EngineResult<()> {
        let appended = self.append_all(&strokes).await?;
        let action = CompositeAction::Paste {
            pasted_strokes: strokes,
            remote_step_count: appended,
        };
        action.apply(store);
        self.push(action);
        Ok(())
    }

    async fn undo_inner(&mut self, store: &mut StrokeStore) -> EngineResult<bool> {
        let Some(action) = self.undo_stack.pop() else {
            return Ok(false);
        };

        let gateway = Arc::clone(&self.gateway);
        let steps = action.remote_step_count();
        for step in 0..steps {
            if let Err(err) = gateway.undo_last(&self.author_id).await {
                log::warn!(
                    "remote undo failed at step {}/{} of {}: {}",
                    step + 1,
                    steps,
                    action.kind(),
                    err
                );
                self.clear();
                return Err(EngineError::HistoryDesynchronized(err));
            }
        }

        action.revert(store);
        log::info!("undid {} ({} remote step(s))", action.kind(), steps);
        self.redo_stack.push(action);
        self.resync_inner(store).await?;
        Ok(true)
    }

    async fn redo_inner(&mut self, store: &mut StrokeStore) -> EngineResult<bool> {
        let Some(action) = self.redo_stack.pop() else {
            return Ok(false);
        };

        let gateway = Arc::clone(&self.gateway);
        let steps = action.remote_step_count();
        for step in 0..steps {
            if let Err(err) = gateway.redo_last(&self.author_id).await {
                log::warn!(
                    "remote redo failed at step {}/{} of {}: {}",
                    step + 1,
                    steps,
                    action.kind(),
                    err
                );
                self.clear();
                return Err(EngineError::HistoryDesynchronized(err));
            }
        }

        action.apply(store);
        log::info!("redid {} ({} remote step(s))", action.kind(), steps);
        self.undo_stack.push(action);
        self.resync_inner(store).await?;
        Ok(true)
    }

    async fn resync_inner(&mut self, store: &mut StrokeStore) -> EngineResult<()> {
        let strokes = self
            .gateway
            .list_strokes(0)
            .await
            .map_err(EngineError::Resync)?;
        log::debug!("resync: {} stroke(s) in remote log", strokes.len());
        replay_log(store, strokes, &self.config);
        Ok(())
    }

    /// Append every stroke in order. On failure the appends already made are undone
    /// remotely so the log matches the untouched local state.
    async fn append_all(&mut self, strokes: &[Stroke]) -> EngineResult<usize> {
        let gateway = Arc::clone(&self.gateway);
        for (appended, stroke) in strokes.iter().enumerate() {
            if let Err(err) = gateway.append_stroke(stroke, &self.author_id).await {
                log::warn!("append {}/{} failed: {}", appended + 1, strokes.len(), err);
                self.compensate(appended).await?;
                return Err(EngineError::RemoteAppend(err));
            }
        }
        Ok(strokes.len())
    }

    async fn compensate(&mut self, appended: usize) -> EngineResult<()> {
        if appended == 0 {
            return Ok(());
        }
        // Any successful append discarded this author's remote redo chain.
        self.redo_stack.clear();

        let gateway = Arc::clone(&self.gateway);
        for _ in 0..appended {
            if let Err(err) = gateway.undo_last(&self.author_id).await {
                log::warn!("could not roll back partial commit: {}", err);
                self.clear();
                return Err(EngineError::HistoryDesynchronized(err));
            }
        }
        Ok(())
    }

    fn push(&mut self, action: CompositeAction) {
        log::info!(
            "committed {} ({} remote step(s))",
            action.kind(),
            action.remote_step_count()
        );
        self.undo_stack.push(action);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.config.max_history {
            self.undo_stack.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, GatewayResult};
    use crate::geometry::Point;
    use crate::remote::{BoxFuture, MemoryGateway};
    use crate::stroke::StrokeId;
    use pollster::block_on;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const NEVER: usize = usize::MAX;

    /// Memory gateway that counts calls and fails on demand.
    struct RecordingGateway {
        inner: MemoryGateway,
        appends: AtomicUsize,
        undos: AtomicUsize,
        redos: AtomicUsize,
        fail_append_at: AtomicUsize,
        fail_undo_at: AtomicUsize,
        fail_redo_at: AtomicUsize,
        hang_appends: AtomicBool,
    }

    impl RecordingGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryGateway::new(),
                appends: AtomicUsize::new(0),
                undos: AtomicUsize::new(0),
                redos: AtomicUsize::new(0),
                fail_append_at: AtomicUsize::new(NEVER),
                fail_undo_at: AtomicUsize::new(NEVER),
                fail_redo_at: AtomicUsize::new(NEVER),
                hang_appends: AtomicBool::new(false),
            })
        }

        fn counts(&self) -> (usize, usize, usize) {
            (
                self.appends.load(Ordering::SeqCst),
                self.undos.load(Ordering::SeqCst),
                self.redos.load(Ordering::SeqCst),
            )
        }

        fn remote_ids(&self) -> Vec<StrokeId> {
            let mut ids: Vec<StrokeId> = block_on(self.inner.list_strokes(0))
                .unwrap()
                .into_iter()
                .map(|s| s.id)
                .collect();
            ids.sort();
            ids
        }
    }

    impl StrokeGateway for RecordingGateway {
        fn append_stroke(&self, stroke: &Stroke, author_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
            if self.hang_appends.load(Ordering::SeqCst) {
                return Box::pin(std::future::pending());
            }
            let n = self.appends.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_append_at.load(Ordering::SeqCst) {
                return Box::pin(async { Err(GatewayError::Unavailable("append dropped".into())) });
            }
            self.inner.append_stroke(stroke, author_id)
        }

        fn list_strokes(&self, since_count: usize) -> BoxFuture<'_, GatewayResult<Vec<Stroke>>> {
            self.inner.list_strokes(since_count)
        }

        fn undo_last(&self, author_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
            let n = self.undos.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_undo_at.load(Ordering::SeqCst) {
                return Box::pin(async { Err(GatewayError::Unavailable("undo dropped".into())) });
            }
            self.inner.undo_last(author_id)
        }

        fn redo_last(&self, author_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
            let n = self.redos.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_redo_at.load(Ordering::SeqCst) {
                return Box::pin(async { Err(GatewayError::Unavailable("redo dropped".into())) });
            }
            self.inner.redo_last(author_id)
        }

        fn clear_all(&self) -> BoxFuture<'_, GatewayResult<()>> {
            self.inner.clear_all()
        }
    }

    fn setup() -> (Arc<RecordingGateway>, ActionLog<RecordingGateway>, StrokeStore) {
        let gateway = RecordingGateway::new();
        let log = ActionLog::new(Arc::clone(&gateway), "alice", EngineConfig::default());
        (gateway, log, StrokeStore::new())
    }

    fn stroke(store: &StrokeStore, points: &[(f64, f64)]) -> Stroke {
        Stroke::freehand("alice", points.iter().map(|&(x, y)| Point::new(x, y)).collect())
            .with_order(store.next_order())
    }

    fn sorted_ids(store: &StrokeStore) -> Vec<StrokeId> {
        let mut ids = store.ids();
        ids.sort();
        ids
    }

    #[test]
    fn test_draw_three_undo_twice_redo_once() {
        let (gateway, mut log, mut store) = setup();
        for i in 0..3 {
            let s = stroke(&store, &[(i as f64, 0.0), (i as f64, 10.0)]);
            block_on(log.commit_stroke(&mut store, s)).unwrap();
        }

        assert!(block_on(log.undo(&mut store)).unwrap());
        assert!(block_on(log.undo(&mut store)).unwrap());
        assert!(block_on(log.redo(&mut store)).unwrap());

        assert_eq!(store.len(), 2);
        assert_eq!(sorted_ids(&store), gateway.remote_ids());
        assert_eq!(log.undo_len(), 2);
        assert_eq!(log.redo_len(), 1);
    }

    #[test]
    fn test_cut_remote_step_count_matches_appends_and_undos() {
        let (gateway, mut log, mut store) = setup();
        let a = stroke(&store, &[(-10.0, 50.0), (50.0, 50.0), (150.0, 50.0)]);
        block_on(log.commit_stroke(&mut store, a)).unwrap();
        let b = stroke(&store, &[(50.0, -10.0), (50.0, 30.0)]);
        block_on(log.commit_stroke(&mut store, b)).unwrap();
        let (appends_before, _, _) = gateway.counts();

        let outcome = block_on(log.commit_cut(&mut store, SelectionRect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        let k = outcome.erase_strokes.len();
        assert_eq!(k, 2);

        let (appends_after, undos_before, _) = gateway.counts();
        assert_eq!(appends_after - appends_before, k + 1);
        assert_eq!(log.undo_entries().last().unwrap().remote_step_count(), k + 1);

        block_on(log.undo(&mut store)).unwrap();
        let (_, undos_after, _) = gateway.counts();
        assert_eq!(undos_after - undos_before, k + 1);
    }

    #[test]
    fn test_undo_then_redo_cut_restores_membership() {
        let (gateway, mut log, mut store) = setup();
        let s = stroke(&store, &[(-10.0, 50.0), (50.0, 50.0), (150.0, 50.0)]);
        let original = s.id;
        block_on(log.commit_stroke(&mut store, s)).unwrap();

        block_on(log.commit_cut(&mut store, SelectionRect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        let after_cut = sorted_ids(&store);
        assert!(!store.contains(original));

        block_on(log.undo(&mut store)).unwrap();
        assert_eq!(store.ids(), vec![original]);

        block_on(log.redo(&mut store)).unwrap();
        assert_eq!(sorted_ids(&store), after_cut);
        assert_eq!(gateway.counts().2, 2);
    }

    #[test]
    fn test_disjoint_cut_makes_no_remote_calls() {
        let (gateway, mut log, mut store) = setup();
        let s = stroke(&store, &[(200.0, 200.0), (300.0, 300.0)]);
        block_on(log.commit_stroke(&mut store, s)).unwrap();

        let outcome = block_on(log.commit_cut(&mut store, SelectionRect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(gateway.counts().0, 1);
        assert_eq!(log.undo_len(), 1);
    }

    #[test]
    fn test_remote_undo_failure_clears_history() {
        let (gateway, mut log, mut store) = setup();
        let a = stroke(&store, &[(-10.0, 50.0), (50.0, 50.0), (150.0, 50.0)]);
        block_on(log.commit_stroke(&mut store, a)).unwrap();
        block_on(log.commit_cut(&mut store, SelectionRect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        assert_eq!(log.undo_entries().last().unwrap().remote_step_count(), 2);

        // Fail the second of the cut's two remote undos.
        gateway.fail_undo_at.store(2, Ordering::SeqCst);
        let err = block_on(log.undo(&mut store)).unwrap_err();
        assert!(matches!(err, EngineError::HistoryDesynchronized(_)));
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert!(!log.is_busy());
    }

    #[test]
    fn test_remote_redo_failure_clears_history() {
        let (gateway, mut log, mut store) = setup();
        let a = stroke(&store, &[(-10.0, 50.0), (50.0, 50.0), (150.0, 50.0)]);
        block_on(log.commit_stroke(&mut store, a)).unwrap();
        block_on(log.commit_cut(&mut store, SelectionRect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        block_on(log.undo(&mut store)).unwrap();
        assert!(log.can_redo());

        // Fail the second of the cut's two remote redos.
        gateway.fail_redo_at.store(2, Ordering::SeqCst);
        let err = block_on(log.redo(&mut store)).unwrap_err();
        assert!(matches!(err, EngineError::HistoryDesynchronized(_)));
        assert_eq!(gateway.counts().2, 2);
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert!(!log.is_busy());
    }

    #[test]
    fn test_failed_rollback_of_partial_paste_clears_history() {
        let (gateway, mut log, mut store) = setup();
        let existing = stroke(&store, &[(0.0, 0.0), (1.0, 1.0)]);
        block_on(log.commit_stroke(&mut store, existing)).unwrap();
        let before_local = sorted_ids(&store);

        let pasted = vec![
            stroke(&store, &[(10.0, 10.0), (20.0, 20.0)]),
            stroke(&store, &[(30.0, 30.0), (40.0, 40.0)]),
            stroke(&store, &[(50.0, 50.0), (60.0, 60.0)]),
        ];
        // Third paste append fails, then the first rollback undo fails too.
        gateway.fail_append_at.store(4, Ordering::SeqCst);
        gateway.fail_undo_at.store(1, Ordering::SeqCst);
        let err = block_on(log.commit_paste(&mut store, pasted)).unwrap_err();

        assert!(matches!(err, EngineError::HistoryDesynchronized(_)));
        assert_eq!(gateway.counts().1, 1);
        assert_eq!(sorted_ids(&store), before_local);
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert!(!log.is_busy());
    }

    #[test]
    fn test_append_failure_during_paste_leaves_state_untouched() {
        let (gateway, mut log, mut store) = setup();
        let existing = stroke(&store, &[(0.0, 0.0), (1.0, 1.0)]);
        block_on(log.commit_stroke(&mut store, existing)).unwrap();
        let before_local = sorted_ids(&store);
        let before_remote = gateway.remote_ids();

        let pasted = vec![
            stroke(&store, &[(10.0, 10.0), (20.0, 20.0)]),
            stroke(&store, &[(30.0, 30.0), (40.0, 40.0)]),
            stroke(&store, &[(50.0, 50.0), (60.0, 60.0)]),
        ];
        // Third append of the paste (fourth overall) fails.
        gateway.fail_append_at.store(4, Ordering::SeqCst);
        let err = block_on(log.commit_paste(&mut store, pasted)).unwrap_err();

        assert!(matches!(err, EngineError::RemoteAppend(_)));
        assert_eq!(sorted_ids(&store), before_local);
        assert_eq!(gateway.remote_ids(), before_remote);
        assert_eq!(log.undo_len(), 1);
    }

    #[test]
    fn test_new_commit_clears_redo() {
        let (_gateway, mut log, mut store) = setup();
        let a = stroke(&store, &[(0.0, 0.0), (1.0, 1.0)]);
        block_on(log.commit_stroke(&mut store, a)).unwrap();
        block_on(log.undo(&mut store)).unwrap();
        assert!(log.can_redo());

        let b = stroke(&store, &[(2.0, 2.0), (3.0, 3.0)]);
        block_on(log.commit_stroke(&mut store, b)).unwrap();
        assert!(!log.can_redo());
    }

    #[test]
    fn test_empty_stacks_report_nothing_done() {
        let (gateway, mut log, mut store) = setup();
        assert!(!block_on(log.undo(&mut store)).unwrap());
        assert!(!block_on(log.redo(&mut store)).unwrap());
        assert_eq!(gateway.counts(), (0, 0, 0));
    }

    #[test]
    fn test_history_is_capped() {
        let gateway = RecordingGateway::new();
        let config = EngineConfig {
            max_history: 2,
            ..EngineConfig::default()
        };
        let mut log = ActionLog::new(gateway, "alice", config);
        let mut store = StrokeStore::new();
        for i in 0..4 {
            let s = stroke(&store, &[(i as f64, 0.0), (i as f64, 1.0)]);
            block_on(log.commit_stroke(&mut store, s)).unwrap();
        }
        assert_eq!(log.undo_len(), 2);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_interrupted_commit_keeps_busy_until_resync() {
        use std::future::Future;
        use std::task::{Context, Poll, Waker};

        let (gateway, mut log, mut store) = setup();
        gateway.hang_appends.store(true, Ordering::SeqCst);

        {
            let s = stroke(&store, &[(0.0, 0.0), (1.0, 1.0)]);
            let mut pending = Box::pin(log.commit_stroke(&mut store, s));
            let mut cx = Context::from_waker(Waker::noop());
            assert!(matches!(pending.as_mut().poll(&mut cx), Poll::Pending));
        }
        assert!(log.is_busy());

        gateway.hang_appends.store(false, Ordering::SeqCst);
        let s = stroke(&store, &[(2.0, 2.0), (3.0, 3.0)]);
        assert!(matches!(block_on(log.commit_stroke(&mut store, s)), Err(EngineError::Busy)));

        block_on(log.resync(&mut store)).unwrap();
        assert!(!log.is_busy());
        let s = stroke(&store, &[(4.0, 4.0), (5.0, 5.0)]);
        block_on(log.commit_stroke(&mut store, s)).unwrap();
    }

    #[test]
    fn test_clear_all() {
        let (gateway, mut log, mut store) = setup();
        let s = stroke(&store, &[(0.0, 0.0), (1.0, 1.0)]);
        block_on(log.commit_stroke(&mut store, s)).unwrap();
        block_on(log.clear_all(&mut store)).unwrap();
        assert!(store.is_empty());
        assert!(!log.can_undo());
        assert!(gateway.remote_ids().is_empty());
    }
}
