//! Client side filtering of an in-memory asset snapshot.
//!
//! Everything here is synchronous and side effect free. Records with missing
//! fields never cause an error, they just fail the predicates that need the
//! missing field.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

mod facets;
mod record;
mod session;
mod state;

pub use facets::*;
pub use record::*;
pub use session::*;
pub use state::*;

/// Conjunction of independent predicates over an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring of the name or of any tag.
    /// Blank matches everything.
    pub term: String,
    /// An asset must carry every one of these tags
    pub tags: BTreeSet<String>,
    /// An asset must have one of these types
    pub types: BTreeSet<String>,
    /// Inclusive, from the start of this day
    pub start_date: Option<NaiveDate>,
    /// Inclusive, up to the end of this day
    pub end_date: Option<NaiveDate>,
}

impl FilterSpec {
    pub fn has_date_bound(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Assets matching `spec`, in their original order, with day boundaries in
/// the local timezone of this system.
pub fn filter_assets<'a, A: AssetView>(assets: &'a [A], spec: &FilterSpec) -> Vec<&'a A> {
    filter_assets_in(assets, spec, &Local)
}

/// Like [`filter_assets`], with day boundaries taken in `tz`.
pub fn filter_assets_in<'a, A: AssetView, Tz: TimeZone>(
    assets: &'a [A],
    spec: &FilterSpec,
    tz: &Tz,
) -> Vec<&'a A> {
    let matcher = Matcher::new(spec, tz);
    assets.iter().filter(|asset| matcher.matches(*asset)).collect()
}

/// A [`FilterSpec`] with its per-call work (lowercasing, day boundaries) done once.
struct Matcher<'s, Tz: TimeZone> {
    spec: &'s FilterSpec,
    term: Option<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    tz: &'s Tz,
}

impl<'s, Tz: TimeZone> Matcher<'s, Tz> {
    fn new(spec: &'s FilterSpec, tz: &'s Tz) -> Self {
        let term = spec.term.trim();
        Matcher {
            spec,
            term: match term.is_empty() {
                true => None,
                false => Some(term.to_lowercase()),
            },
            start: spec.start_date.map(|d| d.and_time(NaiveTime::MIN)),
            end: spec
                .end_date
                .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)),
            tz,
        }
    }

    fn matches<A: AssetView>(&self, asset: &A) -> bool {
        self.matches_term(asset)
            && self.matches_tags(asset)
            && self.matches_types(asset)
            && self.matches_dates(asset)
    }

    fn matches_term<A: AssetView>(&self, asset: &A) -> bool {
        let Some(term) = &self.term else {
            return true;
        };
        let in_name = asset
            .name()
            .is_some_and(|name| name.to_lowercase().contains(term.as_str()));
        in_name
            || asset.tags().is_some_and(|tags| {
                tags.iter()
                    .any(|tag| tag.to_lowercase().contains(term.as_str()))
            })
    }

    fn matches_tags<A: AssetView>(&self, asset: &A) -> bool {
        if self.spec.tags.is_empty() {
            return true;
        }
        let Some(tags) = asset.tags() else {
            return false;
        };
        self.spec
            .tags
            .iter()
            .all(|required| tags.iter().any(|tag| tag == required))
    }

    fn matches_types<A: AssetView>(&self, asset: &A) -> bool {
        if self.spec.types.is_empty() {
            return true;
        }
        asset
            .file_type()
            .is_some_and(|ty| self.spec.types.contains(ty))
    }

    fn matches_dates<A: AssetView>(&self, asset: &A) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(uploaded_at) = asset.uploaded_at() else {
            return false;
        };
        let local = uploaded_at.local_in(self.tz);
        self.start.map_or(true, |start| local >= start) && self.end.map_or(true, |end| local <= end)
    }
}
