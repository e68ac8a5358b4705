//! Venue and artist detail pages.

use serde::Serialize;

use crate::concerts::has_detail_page;
use crate::loader::Catalog;
use crate::models::{Artist, Concert, Role, Venue};
use crate::songs::{ArtistSongCounts, TopSong, TOP_SONGS_LIMIT};

#[derive(Clone, Debug, Serialize)]
pub struct VenueConcert {
    pub id: String,
    pub show_number: Option<i64>,
    pub date: String,
    pub festival_name: Option<String>,
    pub artists: String,
    pub has_setlist: bool,
    pub opening_song: Option<String>,
    pub closing_song: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VenueDetail {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub concert_count: usize,
    pub concerts: Vec<VenueConcert>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArtistConcert {
    pub id: String,
    pub show_number: Option<i64>,
    pub date: String,
    pub festival_name: Option<String>,
    pub venue: String,
    pub city: String,
    pub state: String,
    pub role: Role,
    pub has_setlist: bool,
    pub opening_song: Option<String>,
    pub closing_song: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArtistDetail {
    pub id: String,
    pub name: String,
    pub concert_count: usize,
    pub top_songs: Vec<TopSong>,
    pub concerts: Vec<ArtistConcert>,
}

fn newest_first<T>(concerts: &mut [T], date: impl Fn(&T) -> &str) {
    concerts.sort_by(|a, b| date(b).cmp(date(a)));
}

/// `None` when no concert took place at the venue.
pub fn venue_detail(catalog: &Catalog, venue: &Venue) -> Option<VenueDetail> {
    let mut concerts: Vec<VenueConcert> = catalog
        .concerts
        .iter()
        .filter(|c| c.venue_id.as_deref() == Some(venue.id.as_str()))
        .map(|c| VenueConcert {
            id: c.id.clone(),
            show_number: c.show_number,
            date: c.date.clone(),
            festival_name: c.festival_name.clone(),
            artists: c.primary_artist_names(),
            // Derived like concerts.json rather than read from the stored
            // flag, which can lag behind the setlists collection.
            has_setlist: has_detail_page(catalog, &c.id),
            opening_song: c.opening_song.clone(),
            closing_song: c.closing_song.clone(),
        })
        .collect();
    if concerts.is_empty() {
        return None;
    }
    newest_first(&mut concerts, |c| c.date.as_str());

    Some(VenueDetail {
        id: venue.id.clone(),
        name: venue.canonical_name.clone(),
        city: venue.city.clone(),
        state: venue.state.clone(),
        concert_count: concerts.len(),
        concerts,
    })
}

pub fn venue_details(catalog: &Catalog) -> Vec<VenueDetail> {
    catalog
        .venues
        .iter()
        .filter_map(|venue| venue_detail(catalog, venue))
        .collect()
}

/// The artist's role at a concert, from the first roster entry with its id.
fn role_at(concert: &Concert, artist_id: &str) -> Option<Role> {
    concert
        .artists
        .iter()
        .find(|a| a.artist_id.as_deref() == Some(artist_id))
        .map(|a| a.role.clone().unwrap_or(Role::Headliner))
}

/// Every concert the artist appeared at in any role; `None` when there are none.
pub fn artist_detail(
    catalog: &Catalog,
    artist: &Artist,
    song_counts: &ArtistSongCounts,
) -> Option<ArtistDetail> {
    let mut concerts: Vec<ArtistConcert> = catalog
        .concerts
        .iter()
        .filter_map(|c| {
            let role = role_at(c, &artist.id)?;
            Some(ArtistConcert {
                id: c.id.clone(),
                show_number: c.show_number,
                date: c.date.clone(),
                festival_name: c.festival_name.clone(),
                venue: c.venue_name.clone(),
                city: c.city.clone(),
                state: c.state.clone(),
                role,
                has_setlist: has_detail_page(catalog, &c.id),
                opening_song: c.opening_song.clone(),
                closing_song: c.closing_song.clone(),
            })
        })
        .collect();
    if concerts.is_empty() {
        return None;
    }
    newest_first(&mut concerts, |c| c.date.as_str());

    Some(ArtistDetail {
        id: artist.id.clone(),
        name: artist.canonical_name.clone(),
        concert_count: concerts.len(),
        top_songs: song_counts.top_songs(&artist.id, TOP_SONGS_LIMIT),
        concerts,
    })
}

pub fn artist_details(catalog: &Catalog, song_counts: &ArtistSongCounts) -> Vec<ArtistDetail> {
    catalog
        .artists
        .iter()
        .filter_map(|artist| artist_detail(catalog, artist, song_counts))
        .collect()
}
