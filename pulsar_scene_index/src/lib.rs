/*!
# Pulsar3D Scene Index

Spatial octree index for the Pulsar3D scene toolkit.

This crate is the hit-testing core shared by the toolkit's 3D containers:
a bounding-volume hierarchy that partitions the axis-aligned bounds of a
dynamic set of scene objects, supports incremental membership changes, and
answers ray/point queries by traversing only the nodes whose bounds
intersect the query.

## Architecture

- **BoundingBox / Ray**: axis-aligned box and ray value types
- **Octree**: dynamic loose octree over object bounds
- **SpatialIndex**: manager with coalesced rebuilds and generation-numbered
  immutable snapshots
- **HitTester**: ray/point/box traversal over a published snapshot
- **ChangeNotifier**: observer contract for generation publications

Collaborators (scene-graph nodes, input handling, debug visualization) feed
the index `(id, world bounds)` pairs and consume ordered hit lists; the
index never interprets geometry.
*/

// Internal modules
mod error;
pub mod log;
pub mod bounds;
pub mod octree;

// Main pulsar3d namespace module
pub mod pulsar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{ConsoleLogger, LogEntry, LogSeverity, Logger};
        // Note: index_* macros are NOT re-exported here - they are internal only
    }

    // Geometry value types
    pub use crate::bounds::{BoundingBox, Ray};

    // Octree sub-module with all index types
    pub mod octree {
        pub use crate::octree::*;
    }

    // Flat re-exports of the main entry points
    pub use crate::octree::{
        BuildParameters, ChangeNotifier, HitTester, IndexObserver, IndexReader, IndexSnapshot,
        ObjectId, Octree, OverlapResult, RayHit, RayHitResult, SceneObjectRef, SpatialIndex,
        TreeStats,
    };
}

// Re-export math library at crate root
pub use glam;
