use std::fmt::Display;

use chrono::{Local, TimeZone};
use tracing::debug;

use crate::model::AssetId;

use super::{available_tags, available_types, filter_assets_in, AssetRecord, AssetView, FilterState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The initial load failed. Shown until dismissed or a later load succeeds.
    Failed(String),
}

/// View-model of the asset dashboard: the last fetched snapshot of all assets
/// plus the filter controls applied to it.
#[derive(Debug, Clone)]
pub struct DashboardSession<A = AssetRecord> {
    assets: Vec<A>,
    filters: FilterState,
    load_state: LoadState,
}

impl<A: AssetView> Default for DashboardSession<A> {
    fn default() -> Self {
        DashboardSession {
            assets: Vec::new(),
            filters: FilterState::default(),
            load_state: LoadState::Loading,
        }
    }
}

impl<A: AssetView> DashboardSession<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn assets(&self) -> &[A] {
        &self.assets
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    /// Result of the initial fetch. A failure is surfaced through
    /// [`LoadState::Failed`].
    pub fn load<E: Display>(&mut self, result: Result<Vec<A>, E>) {
        match result {
            Ok(assets) => {
                self.assets = assets;
                self.load_state = LoadState::Ready;
            }
            Err(err) => {
                self.load_state = LoadState::Failed(err.to_string());
            }
        }
    }

    /// Result of a background refresh. A failure keeps the current snapshot
    /// and is not surfaced.
    pub fn sync<E: Display>(&mut self, result: Result<Vec<A>, E>) {
        match result {
            Ok(assets) => {
                self.assets = assets;
                self.load_state = LoadState::Ready;
            }
            Err(err) => {
                debug!(error = %err, "background refresh failed, keeping previous assets");
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        if let LoadState::Failed(_) = self.load_state {
            self.load_state = LoadState::Ready;
        }
    }

    pub fn visible(&self) -> Vec<&A> {
        self.visible_in(&Local)
    }

    pub fn visible_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<&A> {
        filter_assets_in(&self.assets, self.filters.spec(), tz)
    }

    pub fn available_tags(&self) -> Vec<String> {
        available_tags(&self.assets)
    }

    pub fn available_types(&self) -> Vec<String> {
        available_types(&self.assets)
    }

    /// Swaps in an edited asset. Returns false if the snapshot has no asset
    /// with that id.
    pub fn replace(&mut self, asset: A) -> bool {
        match self.assets.iter_mut().find(|a| a.id() == asset.id()) {
            Some(existing) => {
                *existing = asset;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: AssetId) -> bool {
        let len_before = self.assets.len();
        self.assets.retain(|a| a.id() != id);
        self.assets.len() != len_before
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: i64, name: &str, tags: &[&str]) -> AssetRecord {
        AssetRecord {
            id: AssetId(id),
            name: Some(name.to_owned()),
            file_url: None,
            ty: Some("glb".to_owned()),
            size: Some(1),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            uploaded_at: Some(Utc::now().into()),
            upload_date: None,
        }
    }

    fn names(assets: Vec<&AssetRecord>) -> Vec<&str> {
        assets.into_iter().filter_map(|a| a.name()).collect()
    }

    #[test]
    fn initial_load_failure_is_surfaced() {
        let mut session: DashboardSession = DashboardSession::new();
        assert_eq!(session.load_state(), &LoadState::Loading);
        session.load(Err::<Vec<AssetRecord>, _>("HTTP error! status: 500"));
        assert_eq!(
            session.load_state(),
            &LoadState::Failed("HTTP error! status: 500".to_owned())
        );
        assert!(session.assets().is_empty());
        session.dismiss_error();
        assert_eq!(session.load_state(), &LoadState::Ready);
    }

    #[test]
    fn background_failure_keeps_snapshot() {
        let mut session: DashboardSession = DashboardSession::new();
        session.load(Ok::<_, String>(vec![record(1, "Chair", &["wood"])]));
        session.sync(Err::<Vec<AssetRecord>, _>("connection reset"));
        assert_eq!(session.load_state(), &LoadState::Ready);
        assert_eq!(names(session.visible_in(&Utc)), vec!["Chair"]);
        session.sync(Ok::<_, String>(vec![
            record(2, "Lamp", &["light"]),
            record(1, "Chair", &["wood"]),
        ]));
        assert_eq!(names(session.visible_in(&Utc)), vec!["Lamp", "Chair"]);
    }

    #[test]
    fn facets_ignore_active_filters() {
        let mut session: DashboardSession = DashboardSession::new();
        session.load(Ok::<_, String>(vec![
            record(1, "Chair", &["wood", "chair"]),
            record(2, "Lamp", &["metal"]),
        ]));
        session.filters_mut().toggle_tag("wood");
        assert_eq!(names(session.visible_in(&Utc)), vec!["Chair"]);
        assert_eq!(session.available_tags(), vec!["chair", "metal", "wood"]);
        assert_eq!(session.available_types(), vec!["glb"]);
    }

    #[test]
    fn edits_and_deletes_update_snapshot() {
        let mut session: DashboardSession = DashboardSession::new();
        session.load(Ok::<_, String>(vec![
            record(1, "Chair", &[]),
            record(2, "Lamp", &[]),
        ]));
        assert!(session.replace(record(2, "Desk Lamp", &["light"])));
        assert!(!session.replace(record(3, "Ghost", &[])));
        assert_eq!(names(session.visible_in(&Utc)), vec!["Chair", "Desk Lamp"]);
        assert!(session.remove(AssetId(1)));
        assert!(!session.remove(AssetId(1)));
        session.filters_mut().set_term("lamp");
        assert_eq!(names(session.visible_in(&Utc)), vec!["Desk Lamp"]);
    }
}
