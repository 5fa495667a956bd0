//! Octree spatial index module
//!
//! Provides the dynamic octree, the managing `SpatialIndex` with
//! generation-numbered snapshots, hit-test queries, and publish
//! notifications.

mod params;
mod tree;
mod manager;
mod observer;

pub use params::{BuildParameters, MAX_DEPTH_CAP};
pub use tree::{ObjectId, Octree, SceneObjectRef, TreeStats};
pub use manager::{IndexReader, IndexSnapshot, SpatialIndex};
pub use hit_test::{HitTester, OverlapResult, RayHit, RayHitResult};
pub use observer::{ChangeNotifier, IndexObserver};
