use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters collected while a scrubber walks a fragment
#[derive(Debug, Default)]
pub struct ScrubMetrics {
    /// Nodes handed to the scrubber
    nodes_visited: AtomicUsize,
    /// Nodes detached together with their subtree
    nodes_removed: AtomicUsize,
    /// Elements replaced by their children
    nodes_unwrapped: AtomicUsize,
    /// Nodes swapped for a scrubber-supplied replacement
    nodes_replaced: AtomicUsize,
}

impl ScrubMetrics {
    /// Create new scrub metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_visited(&self) {
        self.nodes_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removed(&self) {
        self.nodes_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unwrapped(&self) {
        self.nodes_unwrapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_replaced(&self) {
        self.nodes_replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited.load(Ordering::Relaxed)
    }

    pub fn nodes_removed(&self) -> usize {
        self.nodes_removed.load(Ordering::Relaxed)
    }

    pub fn nodes_unwrapped(&self) -> usize {
        self.nodes_unwrapped.load(Ordering::Relaxed)
    }

    pub fn nodes_replaced(&self) -> usize {
        self.nodes_replaced.load(Ordering::Relaxed)
    }

    /// Total number of structural changes made to the fragment
    pub fn total_changes(&self) -> usize {
        self.nodes_removed() + self.nodes_unwrapped() + self.nodes_replaced()
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.nodes_visited.store(0, Ordering::Relaxed);
        self.nodes_removed.store(0, Ordering::Relaxed);
        self.nodes_unwrapped.store(0, Ordering::Relaxed);
        self.nodes_replaced.store(0, Ordering::Relaxed);
    }
}
