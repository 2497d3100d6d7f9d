use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::allocation::adjust::{apply_adjustments_in_place, Adjustment};
use crate::allocation::models::AllocationTree;
use crate::allocation::seed::seed_tree;

/// The session's in-memory allocation tree, shared across handlers.
///
/// Readers take cloned snapshots; writers apply a finished change under the
/// write lock. Concurrent instructions land in completion order.
#[derive(Clone)]
pub struct AllocationStore {
    inner: Arc<RwLock<AllocationTree>>,
}

impl AllocationStore {
    pub fn new(tree: AllocationTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_tree())
    }

    pub async fn snapshot(&self) -> AllocationTree {
        self.inner.read().await.clone()
    }

    /// Applies a plan's adjustments to the current tree and returns the result.
    pub async fn apply(&self, adjustments: &[Adjustment]) -> AllocationTree {
        let mut tree = self.inner.write().await;
        apply_adjustments_in_place(&mut tree, adjustments);
        debug!(
            "Applied {} adjustments, leaf total now {:.6}",
            adjustments.len(),
            tree.leaf_total()
        );
        tree.clone()
    }

    /// Runs a fallible edit under the write lock. On error the tree is untouched.
    pub async fn edit<T, E>(
        &self,
        f: impl FnOnce(&mut AllocationTree) -> Result<T, E>,
    ) -> Result<(T, AllocationTree), E> {
        let mut tree = self.inner.write().await;
        let mut draft = tree.clone();
        let value = f(&mut draft)?;
        *tree = draft;
        Ok((value, tree.clone()))
    }

    pub async fn reset(&self) -> AllocationTree {
        let mut tree = self.inner.write().await;
        *tree = seed_tree();
        tree.clone()
    }
}
