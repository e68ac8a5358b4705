//! Loader: reads every collection once and builds the in-memory catalog.
//!
//! All later stages are projections of the [`Catalog`]. Setlists and photos
//! that reference an unknown concert are dropped here; only their song counts
//! are kept for the global total.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use tracing::info;

use crate::models::{Artist, Concert, Ordered, Photo, Record, Setlist, Venue};
use crate::progress::create_spinner;
use crate::store::{DocumentStore, ARTISTS, CONCERTS, CONCERT_PHOTOS, SETLISTS, VENUES};

/// Snapshot of the concert database for one export run.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Ordered by date descending; same-date concerts keep identifier order.
    pub concerts: Vec<Concert>,
    /// Setlists with a known concert, in store order.
    pub setlists: Vec<Setlist>,
    pub artists: Vec<Artist>,
    pub venues: Vec<Venue>,
    concert_index: FxHashMap<String, usize>,
    /// Concert id -> indices into `setlists`, in first-seen order.
    setlist_groups: Ordered<Vec<usize>>,
    artist_index: FxHashMap<String, usize>,
    venue_index: FxHashMap<String, usize>,
    /// Concert id -> photos, newest first.
    photos: FxHashMap<String, Vec<Photo>>,
    /// Sum of `song_count` over dropped setlists.
    orphaned_song_count: i64,
}

/// Counts of records dropped while loading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub orphaned_setlists: usize,
    pub orphaned_photos: usize,
}

impl Catalog {
    pub fn from_parts(
        mut concerts: Vec<Concert>,
        setlists: Vec<Setlist>,
        artists: Vec<Artist>,
        venues: Vec<Venue>,
        photos: Vec<Photo>,
    ) -> (Self, LoadReport) {
        let mut report = LoadReport::default();

        concerts.sort_by(|a, b| b.date.cmp(&a.date));
        let concert_index = concerts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect::<FxHashMap<_, _>>();

        let mut kept_setlists = Vec::with_capacity(setlists.len());
        let mut orphaned_song_count = 0;
        let mut setlist_groups: Ordered<Vec<usize>> = Ordered::new();
        for setlist in setlists {
            match setlist.concert_id.as_deref() {
                Some(concert_id) if concert_index.contains_key(concert_id) => {
                    setlist_groups.entry(concert_id).push(kept_setlists.len());
                    kept_setlists.push(setlist);
                }
                other => {
                    info!(setlist = %setlist.id, concert = ?other, "dropping setlist for unknown concert");
                    report.orphaned_setlists += 1;
                    orphaned_song_count += setlist.song_count;
                }
            }
        }

        let artist_index = artists
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();

        let venue_index = venues
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();

        let mut photos_by_concert: FxHashMap<String, Vec<Photo>> = FxHashMap::default();
        for photo in photos {
            match photo.concert_id.clone() {
                Some(concert_id) if concert_index.contains_key(&concert_id) => {
                    photos_by_concert.entry(concert_id).or_default().push(photo);
                }
                other => {
                    info!(photo = %photo.id, concert = ?other, "dropping photo for unknown concert");
                    report.orphaned_photos += 1;
                }
            }
        }
        for photos in photos_by_concert.values_mut() {
            // Missing timestamps sort last.
            photos.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        }

        let catalog = Catalog {
            concerts,
            setlists: kept_setlists,
            artists,
            venues,
            concert_index,
            setlist_groups,
            artist_index,
            venue_index,
            photos: photos_by_concert,
            orphaned_song_count,
        };
        (catalog, report)
    }

    pub fn concert(&self, id: &str) -> Option<&Concert> {
        self.concert_index.get(id).map(|&i| &self.concerts[i])
    }

    pub fn artist(&self, id: &str) -> Option<&Artist> {
        self.artist_index.get(id).map(|&i| &self.artists[i])
    }

    pub fn artist_name(&self, id: &str) -> Option<&str> {
        self.artist(id).map(|a| a.canonical_name.as_str())
    }

    pub fn venue(&self, id: &str) -> Option<&Venue> {
        self.venue_index.get(id).map(|&i| &self.venues[i])
    }

    /// True iff at least one setlist references the concert, even an empty one.
    pub fn has_setlist(&self, concert_id: &str) -> bool {
        self.setlist_groups.contains_key(concert_id)
    }

    pub fn concerts_with_setlists(&self) -> usize {
        self.setlist_groups.len()
    }

    pub fn setlists_for(&self, concert_id: &str) -> Vec<&Setlist> {
        self.setlist_groups
            .get(concert_id)
            .map(|indices| indices.iter().map(|&i| &self.setlists[i]).collect())
            .unwrap_or_default()
    }

    /// Concerts with at least one setlist, each with its setlists in store order.
    pub fn setlist_groups(&self) -> impl Iterator<Item = (&Concert, Vec<&Setlist>)> {
        self.setlist_groups.iter().filter_map(move |(concert_id, indices)| {
            let concert = self.concert(concert_id)?;
            Some((concert, indices.iter().map(|&i| &self.setlists[i]).collect()))
        })
    }

    pub fn photos_for(&self, concert_id: &str) -> &[Photo] {
        self.photos.get(concert_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stored `song_count` summed over every loaded setlist, orphans included.
    pub fn total_song_count(&self) -> i64 {
        let kept: i64 = self.setlists.iter().map(|s| s.song_count).sum();
        kept + self.orphaned_song_count
    }
}

fn read_collection<T: Record>(store: &dyn DocumentStore, collection: &str) -> Result<Vec<T>> {
    let spinner = create_spinner(&format!("Reading {}", collection));
    let docs = store
        .documents(collection)
        .with_context(|| format!("Failed to read collection '{}'", collection))?;
    spinner.finish_and_clear();
    Ok(docs.into_iter().map(T::from_document).collect())
}

/// Read all collections and build the catalog.
pub fn load(store: &dyn DocumentStore) -> Result<(Catalog, LoadReport)> {
    let concerts = read_collection::<Concert>(store, CONCERTS)?;
    let setlists = read_collection::<Setlist>(store, SETLISTS)?;
    let artists = read_collection::<Artist>(store, ARTISTS)?;
    let venues = read_collection::<Venue>(store, VENUES)?;
    let photos = read_collection::<Photo>(store, CONCERT_PHOTOS)?;
    Ok(Catalog::from_parts(concerts, setlists, artists, venues, photos))
}
