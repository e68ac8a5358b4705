//! Global statistics (`stats.json`).

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::directory::{ArtistEntry, VenueEntry};
use crate::loader::Catalog;

/// Length of the top artist/venue lists.
pub const TOP_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedName {
    pub name: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Stats {
    pub total_concerts: usize,
    pub concerts_with_setlists: usize,
    pub total_songs: i64,
    pub total_artists: usize,
    pub total_venues: usize,
    pub top_artists: Vec<RankedName>,
    pub top_venues: Vec<RankedName>,
    pub concerts_by_year: Vec<YearCount>,
    /// Wall-clock time of the run; the only field that changes between
    /// runs on unchanged data.
    pub generated_at: String,
}

/// Concert counts per year, newest year first. Concerts without a parseable
/// year are left out.
pub fn concerts_by_year(catalog: &Catalog) -> Vec<YearCount> {
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for year in catalog.concerts.iter().filter_map(|c| c.year()) {
        *years.entry(year).or_default() += 1;
    }
    years
        .into_iter()
        .rev()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// `artists` and `venues` are the sorted, zero-filtered directories.
pub fn statistics(
    catalog: &Catalog,
    artists: &[ArtistEntry],
    venues: &[VenueEntry],
    generated_at: NaiveDateTime,
) -> Stats {
    Stats {
        total_concerts: catalog.concerts.iter().filter(|c| !c.date.is_empty()).count(),
        concerts_with_setlists: catalog.concerts_with_setlists(),
        // song_count is trusted as stored, even if it disagrees with the song list.
        total_songs: catalog.total_song_count(),
        total_artists: artists.len(),
        total_venues: venues.len(),
        top_artists: artists
            .iter()
            .take(TOP_LIMIT)
            .map(|a| RankedName {
                name: a.name.clone(),
                count: a.concert_count,
            })
            .collect(),
        top_venues: venues
            .iter()
            .take(TOP_LIMIT)
            .map(|v| RankedName {
                name: v.name.clone(),
                count: v.concert_count,
            })
            .collect(),
        concerts_by_year: concerts_by_year(catalog),
        generated_at: format_generated_at(generated_at),
    }
}

/// ISO 8601 local time; the fraction is printed only when non-zero, as
/// microseconds.
fn format_generated_at(time: NaiveDateTime) -> String {
    if time.nanosecond() / 1_000 == 0 {
        time.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
