/// Octree — dynamic spatial partition over object bounding boxes.
///
/// Uses single-node placement: each object is stored in exactly one node,
/// the deepest node whose region fully contains the object. An object that
/// straddles a child boundary stays in the parent ("loose" policy), so no
/// object is ever duplicated across nodes and removal needs no reference
/// counting.
///
/// Nodes live in a flat arena indexed by `NodeId`; freed slots are recycled
/// through a free list. A reverse lookup table (object id → owning node)
/// gives O(1) average removal without tree traversal.

use rustc_hash::FxHashMap;

use crate::bounds::{octant_of_point, BoundingBox};
use crate::error::{Error, Result};
use super::params::BuildParameters;

// ===== OBJECT ID =====

/// Stable, caller-assigned identifier for an indexed scene object.
///
/// Ids are unique within one index instance; reusing an id after its
/// removal is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The record the index stores about one scene object.
///
/// The index never interprets geometry; collaborators supply the id and
/// the world-space bounds and keep everything else to themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObjectRef {
    /// Caller-assigned stable id
    pub id: ObjectId,
    /// World-space bounds
    pub bounds: BoundingBox,
}

// ===== NODE ARENA =====

/// Index of a node in the arena.
pub(crate) type NodeId = u32;

/// Sentinel for an absent child or parent.
pub(crate) const NIL: NodeId = u32::MAX;

/// A single partition cell.
#[derive(Debug, Clone)]
pub(crate) struct OctreeNode {
    /// World-space region of this cell
    pub(crate) bounds: BoundingBox,
    /// Depth in the tree (root = 0)
    pub(crate) depth: u32,
    /// Parent node (NIL for the root)
    pub(crate) parent: NodeId,
    /// Children by octant (bit0 = X, bit1 = Y, bit2 = Z; NIL = absent)
    pub(crate) children: [NodeId; 8],
    /// Objects assigned to this cell (straddlers and under-threshold sets)
    pub(crate) objects: Vec<ObjectId>,
}

impl OctreeNode {
    fn new(bounds: BoundingBox, depth: u32, parent: NodeId) -> Self {
        Self {
            bounds,
            depth,
            parent,
            children: [NIL; 8],
            objects: Vec::new(),
        }
    }

    /// A node is a leaf iff it has no children.
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.iter().all(|&c| c == NIL)
    }
}

// ===== STATS =====

/// Structural statistics of one tree, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Total live nodes
    pub node_count: usize,
    /// Leaf nodes
    pub leaf_count: usize,
    /// Indexed objects
    pub object_count: usize,
    /// Deepest node level (root = 0)
    pub max_depth: u32,
}

// ===== OCTREE =====

/// Dynamic octree over object bounding boxes.
///
/// The root region is fixed when the tree is bulk-built (the union of all
/// object bounds at that time). Objects inserted later that do not fit the
/// root region are kept at the root; they are still found by every query
/// because the root's object list is always tested.
#[derive(Debug, Clone)]
pub struct Octree {
    /// Flat arena of nodes; freed slots are recycled via `free_list`
    nodes: Vec<OctreeNode>,
    /// Root node index
    root: NodeId,
    /// Recycled node slots
    free_list: Vec<NodeId>,
    /// Reverse lookup: object id → (owning node, world bounds)
    locations: FxHashMap<ObjectId, (NodeId, BoundingBox)>,
    /// Parameters this tree was built with
    params: BuildParameters,
}

impl Octree {
    /// Create an empty tree.
    ///
    /// The root region starts empty; objects inserted before the first
    /// bulk build accumulate at the root.
    pub fn new(params: BuildParameters) -> Self {
        Self {
            nodes: vec![OctreeNode::new(BoundingBox::EMPTY, 0, NIL)],
            root: 0,
            free_list: Vec::new(),
            locations: FxHashMap::default(),
            params,
        }
    }

    /// Bulk-build a tree from an object set.
    ///
    /// The root region is the union of all object bounds. Objects are
    /// pushed into the single smallest octant that fully contains them;
    /// straddlers stay put. Given the same objects in the same order and
    /// the same parameters, the resulting tree shape is bit-identical.
    ///
    /// Objects with non-finite bounds are excluded; if an id appears more
    /// than once, only the first entry is kept.
    pub fn build(objects: &[SceneObjectRef], params: BuildParameters) -> Self {
        let mut tree = Self::new(params);

        let mut region = BoundingBox::EMPTY;
        for obj in objects {
            if obj.bounds.is_finite() && !tree.locations.contains_key(&obj.id) {
                region = region.union(&obj.bounds);
                tree.locations.insert(obj.id, (tree.root, obj.bounds));
                tree.nodes[tree.root as usize].objects.push(obj.id);
            }
        }
        tree.nodes[tree.root as usize].bounds = region;

        tree.try_split(tree.root);
        tree
    }

    // ===== ACCESSORS =====

    /// Parameters this tree was built with.
    pub fn params(&self) -> &BuildParameters {
        &self.params
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the tree holds no objects.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Whether `id` is currently indexed.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.locations.contains_key(&id)
    }

    /// Registered bounds of `id`, if indexed.
    pub fn object_bounds(&self, id: ObjectId) -> Option<BoundingBox> {
        self.locations.get(&id).map(|&(_, bounds)| bounds)
    }

    /// Snapshot of the live object set, sorted by id.
    ///
    /// The sorted order makes bulk rebuilds deterministic regardless of
    /// the hash map's internal iteration order.
    pub fn scene_objects(&self) -> Vec<SceneObjectRef> {
        let mut objects: Vec<SceneObjectRef> = self
            .locations
            .iter()
            .map(|(&id, &(_, bounds))| SceneObjectRef { id, bounds })
            .collect();
        objects.sort_by_key(|o| o.id);
        objects
    }

    /// All node regions of this tree in depth-first (octant-ordered)
    /// traversal order. Read-only debug surface for wireframe
    /// visualization.
    pub fn node_bounds(&self) -> Vec<BoundingBox> {
        let mut boxes = Vec::new();
        self.visit_preorder(|node| boxes.push(node.bounds));
        boxes
    }

    /// Structural statistics.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.visit_preorder(|node| {
            stats.node_count += 1;
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
            stats.max_depth = stats.max_depth.max(node.depth);
        });
        stats.object_count = self.locations.len();
        stats
    }

    pub(crate) fn root_id(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &OctreeNode {
        &self.nodes[id as usize]
    }

    // ===== MUTATION =====

    /// Insert an object.
    ///
    /// Descends to the deepest node whose region fully contains the
    /// bounds; if the receiving leaf then holds enough objects, it is
    /// subdivided in place. Objects outside the root region stay at the
    /// root.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateId`] if `id` is already indexed;
    /// [`Error::DegenerateBounds`] if the bounds contain NaN or
    /// infinities (the tree is left untouched).
    pub fn insert(&mut self, id: ObjectId, bounds: BoundingBox) -> Result<()> {
        if !bounds.is_finite() {
            return Err(Error::DegenerateBounds(id));
        }
        if self.locations.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        self.insert_unchecked(id, bounds);
        Ok(())
    }

    /// Remove an object.
    ///
    /// With `auto_prune_empty`, a leaf that becomes empty is detached from
    /// its parent, and emptied ancestors are pruned upward (never the
    /// root).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is not indexed; the tree is unchanged
    /// (idempotent).
    pub fn remove(&mut self, id: ObjectId) -> Result<()> {
        let Some((node_id, _)) = self.locations.remove(&id) else {
            return Err(Error::NotFound(id));
        };
        self.detach_object(node_id, id);
        if self.params.auto_prune_empty {
            self.prune_upward(node_id);
        }
        Ok(())
    }

    /// Update an object's bounds.
    ///
    /// Equivalent to remove followed by insert: an object moving across
    /// octant boundaries is re-homed rather than mutated in place. When
    /// the owning node would not change, only the stored bounds are
    /// refreshed.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is not indexed;
    /// [`Error::DegenerateBounds`] for NaN/infinite bounds (the object
    /// keeps its previous bounds).
    pub fn update(&mut self, id: ObjectId, bounds: BoundingBox) -> Result<()> {
        if !bounds.is_finite() {
            return Err(Error::DegenerateBounds(id));
        }
        let Some(&(current, _)) = self.locations.get(&id) else {
            return Err(Error::NotFound(id));
        };

        if let Some(target) = self.find_target(&bounds) {
            if target == current {
                // Same node — just refresh the stored bounds
                if let Some(entry) = self.locations.get_mut(&id) {
                    entry.1 = bounds;
                }
                return Ok(());
            }
        }

        // Different node — remove from the old home, reinsert
        self.locations.remove(&id);
        self.detach_object(current, id);
        if self.params.auto_prune_empty {
            self.prune_upward(current);
        }
        self.insert_unchecked(id, bounds);
        Ok(())
    }

    /// Remove all objects and reset to a single empty root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(OctreeNode::new(BoundingBox::EMPTY, 0, NIL));
        self.root = 0;
        self.free_list.clear();
        self.locations.clear();
    }

    // ===== PLACEMENT =====

    /// Insert without id/bounds validation (checked by the callers).
    fn insert_unchecked(&mut self, id: ObjectId, bounds: BoundingBox) {
        let node_id = self.descend_for_insert(&bounds);
        self.nodes[node_id as usize].objects.push(id);
        self.locations.insert(id, (node_id, bounds));
        self.try_split(node_id);
    }

    /// Descend from the root to the node that should receive `bounds`,
    /// creating at most one missing octant child along the way.
    ///
    /// Placement rule (shared with the bulk build): descend into the
    /// single octant that fully contains the bounds; on a straddle, stay.
    fn descend_for_insert(&mut self, bounds: &BoundingBox) -> NodeId {
        // Outside the root region: store at root
        if !self.nodes[self.root as usize].bounds.contains(bounds) {
            return self.root;
        }

        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id as usize];
            if node.is_leaf() {
                return node_id;
            }

            let region = self.split_region(node.bounds);
            let center = region.center();
            let lo = octant_of_point(center, bounds.min);
            let hi = octant_of_point(center, bounds.max);
            if lo != hi {
                // Straddles a split plane — stays in the current node
                return node_id;
            }

            let octant_box = region.octant(center, lo);
            if !octant_box.contains(bounds) {
                return node_id;
            }

            let child = node.children[lo as usize];
            if child == NIL {
                // Octant was omitted as empty; materialize it for this object
                let depth = node.depth + 1;
                let created = self.alloc_node(octant_box, depth, node_id);
                self.nodes[node_id as usize].children[lo as usize] = created;
                return created;
            }
            node_id = child;
        }
    }

    /// Find the node `bounds` would be placed in (read-only, no tree
    /// modification). Returns `None` when placement would materialize a
    /// missing octant child.
    ///
    /// Same traversal logic as `descend_for_insert`, used by `update` to
    /// check whether an object needs to move.
    fn find_target(&self, bounds: &BoundingBox) -> Option<NodeId> {
        if !self.nodes[self.root as usize].bounds.contains(bounds) {
            return Some(self.root);
        }

        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id as usize];
            if node.is_leaf() {
                return Some(node_id);
            }

            let region = self.split_region(node.bounds);
            let center = region.center();
            let lo = octant_of_point(center, bounds.min);
            let hi = octant_of_point(center, bounds.max);
            if lo != hi {
                return Some(node_id);
            }

            let octant_box = region.octant(center, lo);
            if !octant_box.contains(bounds) {
                return Some(node_id);
            }

            let child = node.children[lo as usize];
            if child == NIL {
                return None;
            }
            node_id = child;
        }
    }

    /// The region a node's octants are carved from: the node's own box,
    /// or the equal-sided cube over it when cubify is set.
    fn split_region(&self, bounds: BoundingBox) -> BoundingBox {
        if self.params.cubify {
            bounds.cubified()
        } else {
            bounds
        }
    }

    // ===== SUBDIVISION =====

    /// Subdivide a leaf if it meets the split conditions, recursing into
    /// children that received objects.
    ///
    /// Leaf conditions (any one keeps the node a leaf): fewer objects than
    /// `min_objects_to_split`, depth at the safety cap, or a region
    /// smaller than `min_node_size` along every axis.
    fn try_split(&mut self, node_id: NodeId) {
        let (count, depth, region, is_leaf) = {
            let node = &self.nodes[node_id as usize];
            (node.objects.len(), node.depth, node.bounds, node.is_leaf())
        };

        if !is_leaf {
            return;
        }
        if (count as u32) < self.params.min_objects_to_split {
            return;
        }
        if depth >= self.params.depth_limit() {
            return;
        }
        if region.is_empty() || region.size().max_element() < self.params.min_node_size {
            return;
        }

        let split_region = self.split_region(region);
        let center = split_region.center();

        // Partition: each object goes to the single octant that fully
        // contains it, or stays here
        let ids = std::mem::take(&mut self.nodes[node_id as usize].objects);
        let mut buckets: [Vec<ObjectId>; 8] = Default::default();
        let mut kept = Vec::new();
        for id in ids {
            let bounds = self.locations[&id].1;
            let lo = octant_of_point(center, bounds.min);
            let hi = octant_of_point(center, bounds.max);
            if lo == hi && split_region.octant(center, lo).contains(&bounds) {
                buckets[lo as usize].push(id);
            } else {
                kept.push(id);
            }
        }
        self.nodes[node_id as usize].objects = kept;

        for octant in 0..8u8 {
            let bucket = std::mem::take(&mut buckets[octant as usize]);
            if bucket.is_empty() && self.params.auto_prune_empty {
                continue;
            }
            let child_bounds = split_region.octant(center, octant);
            let child = self.alloc_node(child_bounds, depth + 1, node_id);
            self.nodes[node_id as usize].children[octant as usize] = child;
            for &id in &bucket {
                if let Some(entry) = self.locations.get_mut(&id) {
                    entry.0 = child;
                }
            }
            self.nodes[child as usize].objects = bucket;
            self.try_split(child);
        }
    }

    // ===== REMOVAL SUPPORT =====

    /// Erase `id` from a node's object list.
    fn detach_object(&mut self, node_id: NodeId, id: ObjectId) {
        let objects = &mut self.nodes[node_id as usize].objects;
        if let Some(pos) = objects.iter().position(|&k| k == id) {
            objects.swap_remove(pos);
        }
    }

    /// Detach empty leaves walking up from `node_id`, stopping at the
    /// first non-empty or non-leaf ancestor. The root is never pruned.
    fn prune_upward(&mut self, mut node_id: NodeId) {
        while node_id != self.root {
            let node = &self.nodes[node_id as usize];
            if !node.objects.is_empty() || !node.is_leaf() {
                return;
            }
            let parent = node.parent;

            let parent_node = &mut self.nodes[parent as usize];
            for child in parent_node.children.iter_mut() {
                if *child == node_id {
                    *child = NIL;
                }
            }
            self.nodes[node_id as usize].objects = Vec::new();
            self.free_list.push(node_id);

            node_id = parent;
        }
    }

    // ===== ARENA =====

    fn alloc_node(&mut self, bounds: BoundingBox, depth: u32, parent: NodeId) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id as usize] = OctreeNode::new(bounds, depth, parent);
            id
        } else {
            let id = self.nodes.len() as NodeId;
            self.nodes.push(OctreeNode::new(bounds, depth, parent));
            id
        }
    }

    /// Visit live nodes in depth-first order, children in octant order.
    pub(crate) fn visit_preorder(&self, mut f: impl FnMut(&OctreeNode)) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            f(node);
            for &child in node.children.iter().rev() {
                if child != NIL {
                    stack.push(child);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
