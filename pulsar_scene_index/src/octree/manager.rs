/// SpatialIndex — manager owning the live octree and its published
/// snapshots.
///
/// Mutations (`insert`/`remove`/`update`/`request_rebuild`) come from a
/// single logical scene-mutation context and apply to a private working
/// tree. Readers on any thread see immutable, generation-numbered
/// snapshots: `flush()` publishes a fresh snapshot with a single atomic
/// `Arc` swap, so a reader holding generation N is never blocked by (and
/// never blocks) the publication of N+1 — a captured snapshot can only be
/// stale, never corrupt.
///
/// Rebuild requests are coalesced: any number of `request_rebuild()` calls
/// between two drains collapse into one bulk rebuild performed by the next
/// `flush()`.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use glam::Vec3;

use crate::bounds::{BoundingBox, Ray};
use crate::error::Result;
use crate::index_debug;
use crate::index_info;
use crate::index_warn;
use super::hit_test::{HitTester, OverlapResult, RayHit, RayHitResult};
use super::observer::{ChangeNotifier, IndexObserver};
use super::params::BuildParameters;
use super::tree::{ObjectId, Octree, SceneObjectRef, TreeStats};

/// Log source for this module
const SOURCE: &str = "pulsar3d::SpatialIndex";

// ===== SNAPSHOT =====

/// One immutable, fully-built generation of the index.
///
/// Snapshots are shared via `Arc` and never mutated after publication;
/// the id→node side table inside the tree was cloned at the same
/// generation boundary as the structure it indexes.
#[derive(Debug)]
pub struct IndexSnapshot {
    tree: Octree,
    generation: u64,
}

impl IndexSnapshot {
    /// The tree of this generation.
    pub fn tree(&self) -> &Octree {
        &self.tree
    }

    /// Generation number (0 = the initial empty snapshot).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of objects in this generation.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether this generation holds no objects.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// All node regions of this generation (read-only debug surface for
    /// wireframe visualization).
    pub fn node_bounds(&self) -> Vec<BoundingBox> {
        self.tree.node_bounds()
    }

    /// Structural statistics of this generation.
    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }
}

// ===== SHARED STATE =====

/// State shared between the writer and all reader handles.
struct SharedState {
    published: RwLock<Arc<IndexSnapshot>>,
}

impl SharedState {
    fn current(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.published.read().unwrap_or_else(|e| e.into_inner()))
    }

    fn publish(&self, snapshot: Arc<IndexSnapshot>) {
        *self.published.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }
}

// ===== READER =====

/// Cheap cloneable read handle, safe to use from any thread, including
/// while the writer is rebuilding.
#[derive(Clone)]
pub struct IndexReader {
    shared: Arc<SharedState>,
}

impl IndexReader {
    /// Latest complete snapshot; never a structure mid-rebuild.
    pub fn current(&self) -> Arc<IndexSnapshot> {
        self.shared.current()
    }

    /// Ray query against the latest snapshot.
    pub fn query_ray(&self, ray: &Ray) -> RayHitResult {
        HitTester::query_ray(&self.current(), ray)
    }

    /// Nearest-hit ray query against the latest snapshot.
    pub fn query_ray_first(&self, ray: &Ray) -> Option<RayHit> {
        HitTester::query_ray_first(&self.current(), ray)
    }

    /// Point query against the latest snapshot.
    pub fn query_point(&self, point: Vec3) -> OverlapResult {
        HitTester::query_point(&self.current(), point)
    }

    /// Box overlap query against the latest snapshot.
    pub fn query_box(&self, bounds: &BoundingBox) -> OverlapResult {
        HitTester::query_box(&self.current(), bounds)
    }
}

// ===== MANAGER =====

/// Rebuild state machine: Clean → Dirty (on mutation/param change) →
/// Rebuilding (on drain) → Clean (new generation published).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexState {
    Clean,
    Dirty,
    Rebuilding,
}

/// Owner of the octree index: accepts mutations, coalesces rebuild
/// requests, publishes generation-numbered snapshots, and notifies
/// observers.
pub struct SpatialIndex {
    /// Live working tree, maintained incrementally between drains
    tree: Octree,
    /// Active build parameters
    params: BuildParameters,
    /// Parameter change staged for the next rebuild
    staged_params: Option<BuildParameters>,
    /// Rebuild state machine
    state: IndexState,
    /// Coalesced full-rebuild request flag
    rebuild_requested: bool,
    /// Last published generation
    generation: u64,
    /// State shared with reader handles
    shared: Arc<SharedState>,
    /// Publish notifications
    notifier: ChangeNotifier,
}

impl SpatialIndex {
    /// Create an index with the given build parameters.
    ///
    /// Generation 0 is an initial empty snapshot, immediately visible to
    /// readers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::pulsar3d::Error::InvalidParameters`] for a
    /// rejected parameter set.
    pub fn new(params: BuildParameters) -> Result<Self> {
        params.validate()?;
        let initial = Arc::new(IndexSnapshot {
            tree: Octree::new(params),
            generation: 0,
        });
        Ok(Self {
            tree: Octree::new(params),
            params,
            staged_params: None,
            state: IndexState::Clean,
            rebuild_requested: false,
            generation: 0,
            shared: Arc::new(SharedState {
                published: RwLock::new(initial),
            }),
            notifier: ChangeNotifier::new(),
        })
    }

    /// Create an index with default parameters.
    pub fn with_default_parameters() -> Self {
        // Defaults always validate
        match Self::new(BuildParameters::default()) {
            Ok(index) => index,
            Err(_) => unreachable!("default build parameters are valid"),
        }
    }

    // ===== MUTATION =====

    /// Insert an object with its world bounds.
    ///
    /// # Errors
    ///
    /// `DuplicateId` for an id that is already registered (reported, not
    /// silently overwritten); `DegenerateBounds` for NaN/infinite bounds
    /// (the object is excluded, the rest of the scene stays queryable).
    pub fn insert(&mut self, id: ObjectId, bounds: BoundingBox) -> Result<()> {
        self.assert_not_rebuilding();
        match self.tree.insert(id, bounds) {
            Ok(()) => {
                self.mark_dirty();
                Ok(())
            }
            Err(err) => {
                index_warn!(SOURCE, "insert rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Remove an object.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id — a tolerated no-op (async unregister
    /// races are expected), logged and reported.
    pub fn remove(&mut self, id: ObjectId) -> Result<()> {
        self.assert_not_rebuilding();
        match self.tree.remove(id) {
            Ok(()) => {
                self.mark_dirty();
                Ok(())
            }
            Err(err) => {
                index_warn!(SOURCE, "remove ignored: {}", err);
                Err(err)
            }
        }
    }

    /// Update an object's bounds, re-homing it across octant boundaries
    /// as needed.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; `DegenerateBounds` for NaN/infinite
    /// bounds (the object keeps its previous bounds).
    pub fn update(&mut self, id: ObjectId, bounds: BoundingBox) -> Result<()> {
        self.assert_not_rebuilding();
        match self.tree.update(id, bounds) {
            Ok(()) => {
                self.mark_dirty();
                Ok(())
            }
            Err(err) => {
                index_warn!(SOURCE, "update rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Remove every object. The emptied index is published on the next
    /// drain.
    pub fn clear(&mut self) {
        self.assert_not_rebuilding();
        self.tree.clear();
        self.mark_dirty();
    }

    // ===== COLLABORATOR SURFACE =====

    /// Register a scene object (collaborator-facing alias of `insert`).
    pub fn register(&mut self, id: ObjectId, initial_bounds: BoundingBox) -> Result<()> {
        self.insert(id, initial_bounds)
    }

    /// Unregister a scene object (alias of `remove`).
    pub fn unregister(&mut self, id: ObjectId) -> Result<()> {
        self.remove(id)
    }

    /// Report changed bounds for a registered object (alias of `update`).
    pub fn notify_bounds_changed(&mut self, id: ObjectId, new_bounds: BoundingBox) -> Result<()> {
        self.update(id, new_bounds)
    }

    // ===== REBUILD =====

    /// Mark the index for a full bulk rebuild on the next drain.
    ///
    /// Not performed inline: repeated requests between two drains are
    /// coalesced into a single rebuild, so O(n) work cannot fire once per
    /// mutation in a tight loop.
    pub fn request_rebuild(&mut self) {
        self.assert_not_rebuilding();
        self.rebuild_requested = true;
        self.mark_dirty();
    }

    /// Stage new build parameters.
    ///
    /// Takes effect on the next rebuild, not retroactively; marks the
    /// index dirty.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` for a rejected set; nothing is staged.
    pub fn set_build_parameters(&mut self, params: BuildParameters) -> Result<()> {
        params.validate()?;
        index_debug!(SOURCE, "build parameters staged for next rebuild: {:?}", params);
        self.staged_params = Some(params);
        self.request_rebuild();
        Ok(())
    }

    /// Drain pending work and publish a new generation.
    ///
    /// If a rebuild was requested, the working tree is bulk-rebuilt from
    /// the live object set with the staged parameters. Any dirty state
    /// (incremental or rebuilt) is then published as a new immutable
    /// snapshot via a single atomic swap, and observers are notified
    /// afterwards. With nothing to do, this is a no-op.
    ///
    /// Returns the current (possibly just published) generation.
    pub fn flush(&mut self) -> u64 {
        if self.state == IndexState::Clean {
            return self.generation;
        }
        debug_assert!(
            self.state != IndexState::Rebuilding,
            "rebuild re-entered while already in progress"
        );
        self.state = IndexState::Rebuilding;

        if self.rebuild_requested {
            let started = Instant::now();
            if let Some(params) = self.staged_params.take() {
                self.params = params;
            }
            let objects = self.tree.scene_objects();
            self.tree = Octree::build(&objects, self.params);
            self.rebuild_requested = false;

            let stats = self.tree.stats();
            index_info!(
                SOURCE,
                "octree rebuilt: {} objects in {} nodes (depth {}) in {:.2} ms",
                stats.object_count,
                stats.node_count,
                stats.max_depth,
                started.elapsed().as_secs_f64() * 1000.0
            );
        }

        self.generation += 1;
        let snapshot = Arc::new(IndexSnapshot {
            tree: self.tree.clone(),
            generation: self.generation,
        });
        self.shared.publish(snapshot);
        self.state = IndexState::Clean;

        // Observers run strictly after the swap: current() already
        // returns the generation they are told about
        self.notifier.notify(self.generation);
        self.generation
    }

    // ===== READ SIDE =====

    /// Latest complete snapshot; never a structure mid-rebuild.
    pub fn current(&self) -> Arc<IndexSnapshot> {
        self.shared.current()
    }

    /// Cheap cloneable read handle for other threads.
    pub fn reader(&self) -> IndexReader {
        IndexReader {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Ray query against the latest published snapshot.
    pub fn query_ray(&self, ray: &Ray) -> RayHitResult {
        HitTester::query_ray(&self.current(), ray)
    }

    /// Nearest-hit ray query against the latest published snapshot.
    pub fn query_ray_first(&self, ray: &Ray) -> Option<RayHit> {
        HitTester::query_ray_first(&self.current(), ray)
    }

    /// Point query against the latest published snapshot.
    pub fn query_point(&self, point: Vec3) -> OverlapResult {
        HitTester::query_point(&self.current(), point)
    }

    /// Box overlap query against the latest published snapshot.
    pub fn query_box(&self, bounds: &BoundingBox) -> OverlapResult {
        HitTester::query_box(&self.current(), bounds)
    }

    // ===== OBSERVATION =====

    /// Subscribe an observer to generation publications. Only a weak
    /// reference is kept; dropping the subscriber unsubscribes it.
    pub fn subscribe<O: IndexObserver + 'static>(&mut self, observer: &Arc<O>) {
        self.notifier.subscribe(observer);
    }

    /// Number of live observer subscriptions.
    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    // ===== INSPECTION =====

    /// Active build parameters (staged changes excluded until the next
    /// rebuild).
    pub fn params(&self) -> &BuildParameters {
        &self.params
    }

    /// Last published generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether unpublished changes are pending.
    pub fn is_dirty(&self) -> bool {
        self.state == IndexState::Dirty
    }

    /// Number of live objects in the working set (including changes not
    /// yet published).
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the working set is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Whether `id` is registered in the working set.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.tree.contains(id)
    }

    /// Registered bounds of `id` in the working set.
    pub fn object_bounds(&self, id: ObjectId) -> Option<BoundingBox> {
        self.tree.object_bounds(id)
    }

    /// Live object set of the working tree, sorted by id.
    pub fn scene_objects(&self) -> Vec<SceneObjectRef> {
        self.tree.scene_objects()
    }

    /// Structural statistics of the working tree.
    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }

    // ===== INTERNAL =====

    fn mark_dirty(&mut self) {
        if self.state == IndexState::Clean {
            self.state = IndexState::Dirty;
        }
    }

    /// Internal invariant: mutations must never race a rebuild. The
    /// exclusive borrow already rules this out; the assertion documents
    /// and enforces it in debug builds.
    fn assert_not_rebuilding(&self) {
        debug_assert!(
            self.state != IndexState::Rebuilding,
            "mutation while a rebuild is in progress"
        );
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
