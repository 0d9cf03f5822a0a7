//! Load-state machine shared by all panels.
//!
//! Two quirks of the interactive dashboard are handled here once:
//!
//! * The requested selection and the loaded selection are tracked
//!   separately. The route query is rewritten from the loaded side only
//!   after a successful fetch, so a route update can never trigger a
//!   redundant re-fetch of data that is already showing.
//! * Every request carries a generation number. A response whose
//!   generation is no longer current is discarded, so when a newer
//!   trigger supersedes an in-flight request the stale response cannot
//!   overwrite newer state (last-requested-wins).

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Selection/fetch bookkeeping for one panel. `S` is whatever uniquely
/// identifies a fetch: a date range, or a range plus a user id.
#[derive(Debug, Clone)]
pub struct PanelCore<S: Clone + PartialEq> {
    state: LoadState,
    generation: u64,
    requested: Option<S>,
    loaded: Option<S>,
}

impl<S: Clone + PartialEq> Default for PanelCore<S> {
    fn default() -> Self {
        Self {
            state: LoadState::Idle,
            generation: 0,
            requested: None,
            loaded: None,
        }
    }
}

impl<S: Clone + PartialEq> PanelCore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// The selection the current models were built from.
    pub fn loaded(&self) -> Option<&S> {
        self.loaded.as_ref()
    }

    /// Whether `selection` differs from what is already loaded.
    pub fn needs_fetch(&self, selection: &S) -> bool {
        self.state != LoadState::Loaded || self.loaded.as_ref() != Some(selection)
    }

    /// Begin a fetch for `selection`. Returns the generation tag the
    /// caller must hand back to [`Self::complete`] or [`Self::fail`], or
    /// `None` when the selection is already loaded and no fetch is
    /// needed.
    pub fn begin(&mut self, selection: S) -> Option<u64> {
        if !self.needs_fetch(&selection) {
            return None;
        }
        self.generation += 1;
        self.requested = Some(selection);
        self.state = LoadState::Loading;
        debug!(generation = self.generation, "fetch started");
        Some(self.generation)
    }

    /// A response for `generation` arrived. Returns false when the
    /// response is stale and must be discarded.
    pub fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale response discarded");
            return false;
        }
        self.state = LoadState::Loaded;
        self.loaded = self.requested.clone();
        true
    }

    /// The fetch for `generation` failed. The loaded selection (and the
    /// caller's models) stay as they were; stale failures are ignored.
    pub fn fail(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.state = LoadState::Failed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut core: PanelCore<u32> = PanelCore::new();
        assert_eq!(core.state(), LoadState::Idle);

        let gen = core.begin(7).unwrap();
        assert_eq!(core.state(), LoadState::Loading);
        assert!(core.complete(gen));
        assert_eq!(core.state(), LoadState::Loaded);
        assert_eq!(core.loaded(), Some(&7));
    }

    #[test]
    fn test_loaded_selection_skips_refetch() {
        let mut core: PanelCore<u32> = PanelCore::new();
        let gen = core.begin(7).unwrap();
        core.complete(gen);
        // same selection again: no fetch, breaks the route/refetch cycle
        assert!(core.begin(7).is_none());
        // a different selection fetches
        assert!(core.begin(8).is_some());
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut core: PanelCore<u32> = PanelCore::new();
        let first = core.begin(7).unwrap();
        let second = core.begin(8).unwrap();
        assert_ne!(first, second);
        // the superseded response must not win
        assert!(!core.complete(first));
        assert_eq!(core.state(), LoadState::Loading);
        assert!(core.complete(second));
        assert_eq!(core.loaded(), Some(&8));
    }

    #[test]
    fn test_failure_keeps_loaded_selection() {
        let mut core: PanelCore<u32> = PanelCore::new();
        let gen = core.begin(7).unwrap();
        core.complete(gen);
        let gen = core.begin(8).unwrap();
        assert!(core.fail(gen));
        assert_eq!(core.state(), LoadState::Failed);
        // stale-but-valid data remains attributed to the old selection
        assert_eq!(core.loaded(), Some(&7));
        // and a retry of the failed selection is a real fetch
        assert!(core.needs_fetch(&8));
    }

    #[test]
    fn test_stale_failure_ignored() {
        let mut core: PanelCore<u32> = PanelCore::new();
        let first = core.begin(7).unwrap();
        let second = core.begin(8).unwrap();
        assert!(!core.fail(first));
        assert_eq!(core.state(), LoadState::Loading);
        assert!(core.complete(second));
    }
}
