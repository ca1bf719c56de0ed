use std::collections::BTreeSet;

use upstatic_rank::OrderedResultList;

/// Which result is active and which results are visible.
///
/// `active`, when set, is always a member of `visible`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigatorState {
    pub active: Option<usize>,
    pub visible: BTreeSet<usize>,
}

/// Outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    /// Candidate to select, if anything was active.
    pub selected: Option<usize>,
}

/// Direction-key navigation over the latest result list.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    ordering: Vec<usize>,
    state: NavigatorState,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn active(&self) -> Option<usize> {
        self.state.active
    }

    /// Candidate indices in the order of the latest result list.
    pub fn ordering(&self) -> &[usize] {
        &self.ordering
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.state.visible.contains(&index)
    }

    /// Replace the visible set with the contents of `results`. The active
    /// index survives only if it is still visible.
    pub fn apply(&mut self, results: &OrderedResultList) -> &NavigatorState {
        self.ordering = results.indices().collect();
        self.state.visible = self.ordering.iter().copied().collect();
        if let Some(active) = self.state.active {
            if !self.state.visible.contains(&active) {
                self.state.active = None;
            }
        }
        &self.state
    }

    /// Advance to the next visible result. With nothing active, selects the
    /// first visible result. Stops at the end of the list.
    pub fn move_next(&mut self) -> &NavigatorState {
        let next = match self.state.active {
            None => self.first_visible(),
            Some(active) => self.position(active).and_then(|pos| {
                self.ordering[pos + 1..]
                    .iter()
                    .copied()
                    .find(|index| self.is_visible(*index))
            }),
        };
        if next.is_some() {
            self.state.active = next;
        }
        &self.state
    }

    /// Retreat to the previous visible result. No-op with nothing active or at
    /// the start of the list.
    pub fn move_previous(&mut self) -> &NavigatorState {
        let Some(active) = self.state.active else {
            return &self.state;
        };
        let previous = self.position(active).and_then(|pos| {
            self.ordering[..pos]
                .iter()
                .rev()
                .copied()
                .find(|index| self.is_visible(*index))
        });
        if previous.is_some() {
            self.state.active = previous;
        }
        &self.state
    }

    /// Submit the active result, if any. State is left unchanged.
    pub fn submit(&self) -> Submission {
        Submission {
            selected: self.state.active,
        }
    }

    /// Drop the active index. Visibility keeps tracking the last result list.
    pub fn clear(&mut self) -> &NavigatorState {
        self.state.active = None;
        &self.state
    }

    /// Pointer entered `index`: make it active if it is visible.
    pub fn hover(&mut self, index: usize) -> bool {
        if !self.is_visible(index) {
            return false;
        }
        self.state.active = Some(index);
        true
    }

    /// Pointer left `index`: deactivate it if it was the active one.
    pub fn unhover(&mut self, index: usize) -> bool {
        if self.state.active != Some(index) {
            return false;
        }
        self.state.active = None;
        true
    }

    /// Activate and submit a specific visible result (a click).
    pub fn select(&mut self, index: usize) -> Submission {
        if self.hover(index) {
            self.submit()
        } else {
            Submission { selected: None }
        }
    }

    fn first_visible(&self) -> Option<usize> {
        self.ordering
            .iter()
            .copied()
            .find(|index| self.is_visible(*index))
    }

    fn position(&self, index: usize) -> Option<usize> {
        self.ordering.iter().position(|&i| i == index)
    }
}
