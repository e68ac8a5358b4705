//! Artist and venue directories (`artists.json`, `venues.json`).

use serde::Serialize;

use crate::loader::Catalog;
use crate::models::Tally;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtistEntry {
    pub id: String,
    pub name: String,
    pub concert_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VenueEntry {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub concert_count: usize,
}

/// Roster memberships per artist id, every role included. An artist listed
/// twice on one roster counts twice.
pub fn artist_concert_counts(catalog: &Catalog) -> Tally {
    let mut counts = Tally::new();
    for concert in &catalog.concerts {
        for artist in &concert.artists {
            if let Some(id) = artist.artist_id.as_deref().filter(|id| !id.is_empty()) {
                counts.bump(id);
            }
        }
    }
    counts
}

pub fn venue_concert_counts(catalog: &Catalog) -> Tally {
    let mut counts = Tally::new();
    for concert in &catalog.concerts {
        if let Some(id) = concert.venue_id.as_deref().filter(|id| !id.is_empty()) {
            counts.bump(id);
        }
    }
    counts
}

/// Count descending, then name ascending.
fn sort_directory<T>(entries: &mut [T], key: impl Fn(&T) -> (usize, &str)) {
    entries.sort_by(|a, b| {
        let (a_count, a_name) = key(a);
        let (b_count, b_name) = key(b);
        b_count.cmp(&a_count).then_with(|| a_name.cmp(b_name))
    });
}

/// Artists seen at least once.
pub fn artist_directory(catalog: &Catalog) -> Vec<ArtistEntry> {
    let counts = artist_concert_counts(catalog);
    let mut entries: Vec<ArtistEntry> = catalog
        .artists
        .iter()
        .filter_map(|artist| {
            let concert_count = counts.count(&artist.id);
            (concert_count > 0).then(|| ArtistEntry {
                id: artist.id.clone(),
                name: artist.canonical_name.clone(),
                concert_count,
            })
        })
        .collect();
    sort_directory(&mut entries, |e| (e.concert_count, e.name.as_str()));
    entries
}

/// Venues with at least one concert.
pub fn venue_directory(catalog: &Catalog) -> Vec<VenueEntry> {
    let counts = venue_concert_counts(catalog);
    let mut entries: Vec<VenueEntry> = catalog
        .venues
        .iter()
        .filter_map(|venue| {
            let concert_count = counts.count(&venue.id);
            (concert_count > 0).then(|| VenueEntry {
                id: venue.id.clone(),
                name: venue.canonical_name.clone(),
                city: venue.city.clone(),
                state: venue.state.clone(),
                concert_count,
            })
        })
        .collect();
    sort_directory(&mut entries, |e| (e.concert_count, e.name.as_str()));
    entries
}
