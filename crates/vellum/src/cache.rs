//! Plan cache for dynamic sub-templates.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::trace;

use crate::evaluate::Plan;

/// Compiled plans keyed by the literal template text.
///
/// Holds at most one plan per key. Concurrent misses on the same key may
/// both compile; the last insert wins. With a non-zero capacity the oldest
/// entry is evicted first.
#[derive(Debug, Default)]
pub struct PlanCache {
    capacity: usize,
    plans: RwLock<IndexMap<String, Arc<Plan>>>,
}

impl PlanCache {
    /// Cache holding up to `capacity` plans; 0 means unbounded.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            plans: RwLock::new(IndexMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, text: &str) -> Option<Arc<Plan>> {
        let plans = self.plans.read().unwrap_or_else(PoisonError::into_inner);
        plans.get(text).cloned()
    }

    pub fn insert(&self, text: &str, plan: Arc<Plan>) {
        let mut plans = self.plans.write().unwrap_or_else(PoisonError::into_inner);
        plans.insert(text.to_string(), plan);
        if self.capacity > 0 {
            while plans.len() > self.capacity {
                if let Some((evicted, _)) = plans.shift_remove_index(0) {
                    trace!(len = evicted.len(), "evicted plan");
                }
            }
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        let plans = self.plans.read().unwrap_or_else(PoisonError::into_inner);
        plans.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.plans.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.plans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
