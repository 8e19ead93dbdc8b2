use chrono::NaiveDate;

use super::FilterSpec;

/// Filter controls of one dashboard view. Lives only as long as the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    spec: FilterSpec,
}

impl FilterState {
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.spec.term = term.into();
    }

    /// Selects `tag` if it is not selected, deselects it otherwise.
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.spec.tags.remove(tag) {
            self.spec.tags.insert(tag.to_owned());
        }
    }

    pub fn toggle_type(&mut self, ty: &str) {
        if !self.spec.types.remove(ty) {
            self.spec.types.insert(ty.to_owned());
        }
    }

    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.spec.start_date = start;
        self.spec.end_date = end;
    }

    /// Drops all filters and the search term.
    pub fn clear(&mut self) {
        self.spec = FilterSpec::default();
    }

    /// The search term does not count as a filter.
    pub fn has_active_filters(&self) -> bool {
        !self.spec.tags.is_empty() || !self.spec.types.is_empty() || self.spec.has_date_bound()
    }

    /// Number shown on the filter button. A date range counts once.
    pub fn active_filter_count(&self) -> usize {
        self.spec.tags.len() + self.spec.types.len() + usize::from(self.spec.has_date_bound())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn toggling_twice_restores_state() {
        let mut state = FilterState::default();
        state.toggle_tag("wood");
        state.toggle_type("glb");
        let before = state.clone();
        state.toggle_tag("metal");
        state.toggle_tag("metal");
        state.toggle_type("obj");
        state.toggle_type("obj");
        assert_eq!(state, before);
        state.toggle_tag("wood");
        assert!(state.spec().tags.is_empty());
    }

    #[test]
    fn counts_date_range_once() {
        let mut state = FilterState::default();
        state.set_term("chair");
        assert!(!state.has_active_filters());
        assert_eq!(state.active_filter_count(), 0);
        state.toggle_tag("wood");
        state.toggle_tag("metal");
        state.toggle_type("fbx");
        state.set_date_range(
            NaiveDate::from_ymd_opt(2024, 1, 1),
            NaiveDate::from_ymd_opt(2024, 1, 31),
        );
        assert!(state.has_active_filters());
        assert_eq!(state.active_filter_count(), 4);
        state.set_date_range(None, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(state.active_filter_count(), 4);
    }

    #[test]
    fn clear_resets_term_too() {
        let mut state = FilterState::default();
        state.set_term("lamp");
        state.toggle_type("obj");
        state.clear();
        assert_eq!(state, FilterState::default());
    }
}
