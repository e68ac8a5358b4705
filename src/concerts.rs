//! Concert listing and concert detail pages.
//!
//! ## Detail shapes
//!
//! A concert with exactly one setlist has the setlist flattened onto the
//! detail object (`song_count`, `has_encore`, `songs`). A concert with several
//! setlists keeps them as a `setlists` array in running order (openers first)
//! plus `total_song_count` and an any-encore `has_encore`.
//!
//! Setlist artists are matched to the concert roster by display name: setlist
//! artist ids come from an external metadata source and never match roster
//! ids. Two different artists sharing a name will be confused.

use chrono::SecondsFormat;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::loader::Catalog;
use crate::models::{Concert, Photo, Role, Setlist, Song};
use crate::safety::is_safe_document_id;

const DEFAULT_SETLIST_STATUS: &str = "not_researched";

// ============================================================================
// Concert List
// ============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct ConcertListEntry {
    pub id: String,
    pub show_number: Option<i64>,
    pub date: String,
    pub festival_name: Option<String>,
    pub venue: String,
    pub city: String,
    pub state: String,
    /// Billed artists, comma-joined.
    pub artists: String,
    #[serde(rename = "hasSetlist")]
    pub has_setlist: bool,
    pub setlist_status: String,
}

/// Whether the concert has a detail page: at least one setlist, and an id
/// that can name its file.
pub fn has_detail_page(catalog: &Catalog, concert_id: &str) -> bool {
    catalog.has_setlist(concert_id) && is_safe_document_id(concert_id)
}

/// One entry per concert, in catalog order (date descending).
pub fn concert_list(catalog: &Catalog) -> Vec<ConcertListEntry> {
    catalog
        .concerts
        .iter()
        .map(|concert| ConcertListEntry {
            id: concert.id.clone(),
            show_number: concert.show_number,
            date: concert.date.clone(),
            festival_name: concert.festival_name.clone(),
            venue: concert.venue_name.clone(),
            city: concert.city.clone(),
            state: concert.state.clone(),
            artists: concert.primary_artist_names(),
            has_setlist: has_detail_page(catalog, &concert.id),
            setlist_status: concert
                .setlist_status
                .clone()
                .unwrap_or_else(|| DEFAULT_SETLIST_STATUS.to_string()),
        })
        .collect()
}

// ============================================================================
// Concert Detail
// ============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct SongEntry {
    pub position: i64,
    pub name: String,
    pub set_name: String,
    pub encore: i64,
    pub is_cover: bool,
    pub cover_artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_artist: Option<String>,
}

impl From<&Song> for SongEntry {
    fn from(song: &Song) -> Self {
        Self {
            position: song.position,
            name: song.name.clone(),
            set_name: song.set_name.clone(),
            encore: song.encore,
            is_cover: song.is_cover,
            cover_artist: song.cover_artist.clone(),
            guest_artist: song.guest_artist.clone().filter(|g| !g.is_empty()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhotoEntry {
    pub id: String,
    pub user_name: String,
    pub user_photo: String,
    pub download_url: String,
    pub uploaded_at: Option<String>,
    pub caption: String,
    pub file_type: String,
}

impl From<&Photo> for PhotoEntry {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id.clone(),
            user_name: photo.user_name.clone(),
            user_photo: photo.user_photo.clone(),
            download_url: photo.download_url.clone(),
            uploaded_at: photo
                .uploaded_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            caption: photo.caption.clone(),
            file_type: photo.file_type.clone(),
        }
    }
}

/// One artist's setlist on a multi-artist bill.
#[derive(Clone, Debug, Serialize)]
pub struct ArtistSetlist {
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub artist_role: Role,
    pub setlistfm_url: Option<String>,
    pub song_count: i64,
    pub has_encore: bool,
    pub songs: Vec<SongEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum SetlistShape {
    Single {
        setlistfm_url: Option<String>,
        song_count: i64,
        has_encore: bool,
        songs: Vec<SongEntry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tour_name: Option<String>,
    },
    Multiple {
        setlists: Vec<ArtistSetlist>,
        total_song_count: i64,
        has_encore: bool,
        /// Present only when the setlists name exactly one distinct tour.
        #[serde(skip_serializing_if = "Option::is_none")]
        tour_name: Option<String>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ConcertDetail {
    pub id: String,
    pub show_number: Option<i64>,
    pub date: String,
    pub festival_name: Option<String>,
    pub venue: String,
    pub city: String,
    pub state: String,
    pub artists: Vec<RosterEntry>,
    pub photos: Vec<PhotoEntry>,
    pub photo_count: usize,
    #[serde(flatten)]
    pub setlist: SetlistShape,
}

fn songs(setlist: &Setlist) -> Vec<SongEntry> {
    setlist.songs.iter().map(SongEntry::from).collect()
}

fn single_shape(setlist: &Setlist) -> SetlistShape {
    SetlistShape::Single {
        setlistfm_url: setlist.setlistfm_url.clone(),
        song_count: setlist.song_count,
        has_encore: setlist.has_encore,
        songs: songs(setlist),
        tour_name: setlist.tour().map(str::to_string),
    }
}

fn multiple_shape(concert: &Concert, setlists: &[&Setlist]) -> SetlistShape {
    // Later roster entries win when a name repeats.
    let roles: FxHashMap<&str, Role> = concert
        .artists
        .iter()
        .map(|a| {
            let role = a.role.clone().unwrap_or(Role::Headliner);
            (a.artist_name.as_str(), role)
        })
        .collect();
    let role_of = |setlist: &Setlist| -> Role {
        setlist
            .artist_name
            .as_deref()
            .and_then(|name| roles.get(name).cloned())
            .unwrap_or(Role::Headliner)
    };

    let mut ordered: Vec<&Setlist> = setlists.to_vec();
    ordered.sort_by(|a, b| {
        role_of(*a)
            .running_order()
            .cmp(&role_of(*b).running_order())
            .then_with(|| {
                let a_name = a.artist_name.as_deref().unwrap_or("");
                let b_name = b.artist_name.as_deref().unwrap_or("");
                a_name.cmp(b_name)
            })
    });

    let mut tour_names = BTreeSet::new();
    let mut total_song_count = 0;
    let mut has_encore = false;
    let entries = ordered
        .into_iter()
        .map(|setlist| {
            if let Some(tour) = setlist.tour() {
                tour_names.insert(tour.to_string());
            }
            total_song_count += setlist.song_count;
            has_encore |= setlist.has_encore;
            ArtistSetlist {
                artist_id: setlist.artist_id.clone(),
                artist_name: setlist.artist_name.clone(),
                artist_role: role_of(setlist),
                setlistfm_url: setlist.setlistfm_url.clone(),
                song_count: setlist.song_count,
                has_encore: setlist.has_encore,
                songs: songs(setlist),
                tour_name: setlist.tour().map(str::to_string),
            }
        })
        .collect();

    let tour_name = if tour_names.len() == 1 {
        tour_names.into_iter().next()
    } else {
        None
    };

    SetlistShape::Multiple {
        setlists: entries,
        total_song_count,
        has_encore,
        tour_name,
    }
}

/// Detail page of a concert with at least one setlist.
pub fn concert_detail(catalog: &Catalog, concert: &Concert, setlists: &[&Setlist]) -> ConcertDetail {
    let photos: Vec<PhotoEntry> = catalog
        .photos_for(&concert.id)
        .iter()
        .map(PhotoEntry::from)
        .collect();

    let setlist = match setlists {
        [only] => single_shape(only),
        _ => multiple_shape(concert, setlists),
    };

    ConcertDetail {
        id: concert.id.clone(),
        show_number: concert.show_number,
        date: concert.date.clone(),
        festival_name: concert.festival_name.clone(),
        venue: concert.venue_name.clone(),
        city: concert.city.clone(),
        state: concert.state.clone(),
        artists: concert
            .artists
            .iter()
            .map(|a| RosterEntry {
                name: a.artist_name.clone(),
                role: a.role.as_ref().map(|r| r.as_str().to_string()).unwrap_or_default(),
            })
            .collect(),
        photo_count: photos.len(),
        photos,
        setlist,
    }
}

/// Detail pages for every concert with a setlist.
pub fn concert_details(catalog: &Catalog) -> Vec<ConcertDetail> {
    catalog
        .setlist_groups()
        .map(|(concert, setlists)| concert_detail(catalog, concert, &setlists))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{fixture_catalog, fixture_store};
    use crate::loader::load;
    use crate::store::SETLISTS;
    use serde_json::{json, Value};

    fn detail_json(catalog: &Catalog, concert_id: &str) -> Value {
        let concert = catalog.concert(concert_id).unwrap();
        let setlists = catalog.setlists_for(concert_id);
        serde_json::to_value(concert_detail(catalog, concert, &setlists)).unwrap()
    }

    #[test]
    fn test_concert_list_flags_and_defaults() {
        let catalog = fixture_catalog();
        let list = concert_list(&catalog);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].id, "c1");
        assert_eq!(list[0].artists, "Headliner B");
        assert!(list[0].has_setlist);
        assert_eq!(list[0].setlist_status, "not_researched");
        assert_eq!(list[1].setlist_status, "complete");
        assert!(!list[2].has_setlist);
        assert_eq!(list[2].festival_name.as_deref(), Some("Summerfest"));

        let value = serde_json::to_value(&list[0]).unwrap();
        assert_eq!(value["hasSetlist"], true);
        assert!(value.get("has_setlist").is_none());
    }

    #[test]
    fn test_single_setlist_is_flattened() {
        let catalog = fixture_catalog();
        let value = detail_json(&catalog, "c2");
        assert_eq!(value["song_count"], 2);
        assert_eq!(value["has_encore"], true);
        assert_eq!(value["tour_name"], "World Tour");
        assert_eq!(value["setlistfm_url"], "https://example.org/setlist/s3");
        assert_eq!(value["songs"].as_array().unwrap().len(), 2);
        assert!(value.get("setlists").is_none());
        assert_eq!(value["photo_count"], 0);
    }

    #[test]
    fn test_multiple_setlists_opener_first() {
        let catalog = fixture_catalog();
        let value = detail_json(&catalog, "c1");
        let setlists = value["setlists"].as_array().unwrap();
        assert_eq!(setlists[0]["artist_name"], "Opener A");
        assert_eq!(setlists[0]["artist_role"], "opener");
        assert_eq!(setlists[1]["artist_name"], "Headliner B");
        assert_eq!(setlists[1]["artist_role"], "headliner");
        assert_eq!(value["total_song_count"], 4);
        assert_eq!(value["has_encore"], true);
        // Only Headliner B names a tour; one distinct name is enough.
        assert_eq!(value["tour_name"], "World Tour");
        assert!(value.get("song_count").is_none());
    }

    #[test]
    fn test_shared_tour_requires_single_distinct_name() {
        let mut store = fixture_store();
        store.put(SETLISTS, "s2", json!({
            "concert_id": "c1",
            "artist_name": "Opener A",
            "tour_name": "Other Tour",
            "songs": []
        }));
        let (catalog, _) = load(&store).unwrap();
        let value = detail_json(&catalog, "c1");
        assert!(value.get("tour_name").is_none());
        assert_eq!(value["setlists"][0]["tour_name"], "Other Tour");
    }

    #[test]
    fn test_unknown_setlist_artist_sorts_as_headliner_by_name() {
        let mut store = fixture_store();
        store.put(SETLISTS, "s0", json!({
            "concert_id": "c1",
            "artist_name": "Aardvark Guest",
            "songs": []
        }));
        let (catalog, _) = load(&store).unwrap();
        let value = detail_json(&catalog, "c1");
        let names: Vec<_> = value["setlists"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["artist_name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Opener A", "Aardvark Guest", "Headliner B"]);
        assert_eq!(value["setlists"][1]["artist_role"], "headliner");
    }

    #[test]
    fn test_song_entries_guest_and_cover() {
        let catalog = fixture_catalog();
        let value = detail_json(&catalog, "c1");
        let opener_song = &value["setlists"][0]["songs"][0];
        assert_eq!(opener_song["guest_artist"], "Friend");
        assert_eq!(opener_song["cover_artist"], Value::Null);

        let cover = &value["setlists"][1]["songs"][1];
        assert_eq!(cover["is_cover"], true);
        assert_eq!(cover["cover_artist"], "Someone Else");
        assert!(cover.get("guest_artist").is_none());
    }

    #[test]
    fn test_photos_and_roster() {
        let catalog = fixture_catalog();
        let value = detail_json(&catalog, "c1");
        assert_eq!(value["photo_count"], 2);
        assert_eq!(value["photos"][0]["id"], "p_new");
        assert_eq!(value["photos"][0]["uploaded_at"], "2023-07-22T04:26:40+00:00");
        assert_eq!(value["photos"][1]["uploaded_at"], "2023-06-02T10:00:00+00:00");
        assert_eq!(value["artists"][1], json!({"name": "Opener A", "role": "opener"}));
    }

    #[test]
    fn test_details_only_for_concerts_with_setlists() {
        let catalog = fixture_catalog();
        let ids: Vec<_> = concert_details(&catalog).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
