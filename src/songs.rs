//! Song analytics (`songs.json`) and per-artist play counts.
//!
//! Every named song occurrence in every setlist is counted. Opening, closing
//! and encore songs are credited to each billed artist of the concert
//! (headliners and festival performers; openers are not analyzed), and only
//! songs seen at least [`REPEAT_THRESHOLD`] times are reported.

use serde::Serialize;

use crate::loader::Catalog;
use crate::models::{Ordered, Tally};

/// Minimum occurrences for an opening/closing/encore song to be listed.
pub const REPEAT_THRESHOLD: usize = 2;

/// Length of an artist's top-song table.
pub const TOP_SONGS_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SongSummary {
    pub name: String,
    pub times_heard: usize,
    pub is_mostly_cover: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SongFrequency {
    pub song: String,
    pub times: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopSong {
    pub name: String,
    pub times_played: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SongsReport {
    pub all_songs: Vec<SongSummary>,
    pub opening_songs_by_artist: Ordered<Vec<SongFrequency>>,
    pub closing_songs_by_artist: Ordered<Vec<SongFrequency>>,
    pub encore_songs_by_artist: Ordered<Vec<SongFrequency>>,
    pub total_unique_songs: usize,
}

/// Raw counts gathered in one pass over the setlists.
#[derive(Debug, Default)]
pub struct SongAnalytics {
    plays: Tally,
    covers: Tally,
    /// Artist name -> song -> times.
    opening: Ordered<Tally>,
    closing: Ordered<Tally>,
    encores: Ordered<Tally>,
}

impl SongAnalytics {
    pub fn collect(catalog: &Catalog) -> Self {
        let mut analytics = Self::default();

        for setlist in &catalog.setlists {
            let Some(concert) = setlist
                .concert_id
                .as_deref()
                .and_then(|id| catalog.concert(id))
            else {
                continue;
            };
            let billed: Vec<&str> = concert
                .primary_artists()
                .map(|a| a.artist_name.as_str())
                .collect();

            for song in setlist.songs.iter().filter(|s| !s.name.is_empty()) {
                analytics.plays.bump(&song.name);
                if song.is_cover {
                    analytics.covers.bump(&song.name);
                }
                for artist in &billed {
                    if song.opens_main_set() {
                        analytics.opening.entry(artist).bump(&song.name);
                    }
                    if song.is_encore() {
                        analytics.encores.entry(artist).bump(&song.name);
                    }
                }
            }

            if let Some(closer) = setlist.closing_song().filter(|s| !s.name.is_empty()) {
                for artist in &billed {
                    analytics.closing.entry(artist).bump(&closer.name);
                }
            }
        }

        analytics
    }

    pub fn times_heard(&self, song: &str) -> usize {
        self.plays.count(song)
    }

    /// Covered in a strict majority of performances.
    pub fn is_mostly_cover(&self, song: &str) -> bool {
        self.covers.count(song) * 2 > self.plays.count(song)
    }

    pub fn report(&self) -> SongsReport {
        let all_songs: Vec<SongSummary> = self
            .plays
            .ranked()
            .into_iter()
            .map(|(name, times_heard)| SongSummary {
                name: name.to_string(),
                times_heard,
                is_mostly_cover: self.is_mostly_cover(name),
            })
            .collect();

        SongsReport {
            total_unique_songs: all_songs.len(),
            all_songs,
            opening_songs_by_artist: repeated_by_artist(&self.opening),
            closing_songs_by_artist: repeated_by_artist(&self.closing),
            encore_songs_by_artist: repeated_by_artist(&self.encores),
        }
    }
}

/// Per-artist tables restricted to repeated songs; artists left with nothing
/// are dropped.
fn repeated_by_artist(tables: &Ordered<Tally>) -> Ordered<Vec<SongFrequency>> {
    let mut filtered = Ordered::new();
    for (artist, tally) in tables.iter() {
        let repeated: Vec<SongFrequency> = tally
            .ranked()
            .into_iter()
            .filter(|&(_, times)| times >= REPEAT_THRESHOLD)
            .map(|(song, times)| SongFrequency {
                song: song.to_string(),
                times,
            })
            .collect();
        if !repeated.is_empty() {
            filtered.insert(artist, repeated);
        }
    }
    filtered
}

/// Song play counts per roster artist id, from concerts where the artist is
/// billed (openers excluded).
#[derive(Debug, Default)]
pub struct ArtistSongCounts {
    by_artist: Ordered<Tally>,
}

impl ArtistSongCounts {
    pub fn collect(catalog: &Catalog) -> Self {
        let mut by_artist: Ordered<Tally> = Ordered::new();
        for setlist in &catalog.setlists {
            let Some(concert) = setlist
                .concert_id
                .as_deref()
                .and_then(|id| catalog.concert(id))
            else {
                continue;
            };
            let billed: Vec<&str> = concert
                .primary_artists()
                .filter_map(|a| a.artist_id.as_deref())
                .filter(|id| !id.is_empty())
                .collect();
            for song in setlist.songs.iter().filter(|s| !s.name.is_empty()) {
                for artist_id in &billed {
                    by_artist.entry(artist_id).bump(&song.name);
                }
            }
        }
        Self { by_artist }
    }

    /// Most played songs, most frequent first.
    pub fn top_songs(&self, artist_id: &str, limit: usize) -> Vec<TopSong> {
        self.by_artist
            .get(artist_id)
            .map(|tally| {
                tally
                    .ranked()
                    .into_iter()
                    .take(limit)
                    .map(|(name, times_played)| TopSong {
                        name: name.to_string(),
                        times_played,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;
    use crate::loader::tests::fixture_catalog;
    use crate::store::{MemoryStore, CONCERTS, SETLISTS};
    use serde_json::{json, Value};

    fn concert(store: &mut MemoryStore, id: &str, artists: Value) {
        store.put(CONCERTS, id, json!({"date": "2020-01-01", "artists": artists}));
    }

    fn setlist(store: &mut MemoryStore, id: &str, concert_id: &str, songs: Value) {
        store.put(SETLISTS, id, json!({"concert_id": concert_id, "songs": songs}));
    }

    fn analytics_for(store: &MemoryStore) -> SongAnalytics {
        let (catalog, _) = load(store).unwrap();
        SongAnalytics::collect(&catalog)
    }

    #[test]
    fn test_mostly_cover_boundary() {
        let mut store = MemoryStore::new();
        concert(&mut store, "c1", json!([]));
        // "Half" is covered 2 of 4 times, "Most" 3 of 4.
        for (i, covered) in [true, true, false, false].iter().enumerate() {
            setlist(&mut store, &format!("h{}", i), "c1", json!([
                {"position": 1, "name": "Half", "is_cover": covered}
            ]));
        }
        for (i, covered) in [true, true, true, false].iter().enumerate() {
            setlist(&mut store, &format!("m{}", i), "c1", json!([
                {"position": 1, "name": "Most", "is_cover": covered}
            ]));
        }
        let analytics = analytics_for(&store);
        assert_eq!(analytics.times_heard("Half"), 4);
        assert!(!analytics.is_mostly_cover("Half"));
        assert!(analytics.is_mostly_cover("Most"));
    }

    #[test]
    fn test_opening_threshold_is_inclusive() {
        let mut store = MemoryStore::new();
        for i in 0..3 {
            let id = format!("y{}", i);
            concert(&mut store, &id, json!([{"artist_name": "Y", "role": "headliner"}]));
            setlist(&mut store, &format!("sy{}", i), &id, json!([
                {"position": 1, "name": "X", "set_name": "Main Set", "encore": 0}
            ]));
        }
        for i in 0..2 {
            let id = format!("z{}", i);
            concert(&mut store, &id, json!([{"artist_name": "Z", "role": "festival_performer"}]));
            setlist(&mut store, &format!("sz{}", i), &id, json!([
                {"position": 1, "name": "X", "set_name": "Main Set", "encore": 0}
            ]));
        }
        let w = "w0";
        concert(&mut store, w, json!([{"artist_name": "W", "role": "headliner"}]));
        setlist(&mut store, "sw", w, json!([{"position": 1, "name": "X"}]));

        let report = analytics_for(&store).report();
        assert_eq!(
            report.opening_songs_by_artist.get("Y"),
            Some(&vec![SongFrequency { song: "X".to_string(), times: 3 }])
        );
        assert_eq!(
            report.opening_songs_by_artist.get("Z"),
            Some(&vec![SongFrequency { song: "X".to_string(), times: 2 }])
        );
        assert!(!report.opening_songs_by_artist.contains_key("W"));
    }

    #[test]
    fn test_openers_not_credited() {
        let mut store = MemoryStore::new();
        for i in 0..2 {
            let id = format!("c{}", i);
            concert(&mut store, &id, json!([
                {"artist_name": "Support", "role": "opener"},
                {"artist_name": "Main", "role": "headliner"}
            ]));
            setlist(&mut store, &format!("s{}", i), &id, json!([
                {"position": 1, "name": "Start", "set_name": "Main Set"},
                {"position": 2, "name": "End", "set_name": "Main Set"},
                {"position": 3, "name": "Again", "set_name": "Encore", "encore": 1}
            ]));
        }
        let report = analytics_for(&store).report();
        for table in [
            &report.opening_songs_by_artist,
            &report.closing_songs_by_artist,
            &report.encore_songs_by_artist,
        ] {
            assert!(!table.contains_key("Support"));
            assert!(table.contains_key("Main"));
        }
        assert_eq!(report.closing_songs_by_artist.get("Main").unwrap()[0].song, "End");
        assert_eq!(report.encore_songs_by_artist.get("Main").unwrap()[0].song, "Again");
    }

    #[test]
    fn test_empty_names_ignored() {
        let mut store = MemoryStore::new();
        concert(&mut store, "c1", json!([{"artist_name": "A", "role": "headliner"}]));
        setlist(&mut store, "s1", "c1", json!([
            {"position": 1, "name": ""},
            {"position": 2, "name": "Real"},
            {"position": 3, "name": ""}
        ]));
        let report = analytics_for(&store).report();
        assert_eq!(report.total_unique_songs, 1);
        assert_eq!(report.all_songs[0].name, "Real");
    }

    #[test]
    fn test_all_songs_sorted_by_times_heard() {
        let report = SongAnalytics::collect(&fixture_catalog()).report();
        let names: Vec<_> = report.all_songs.iter().map(|s| (s.name.as_str(), s.times_heard)).collect();
        assert_eq!(
            names,
            vec![
                ("Opener Song", 2),
                ("Big Finish", 2),
                ("Cover Tune", 1),
                ("Warmup", 1)
            ]
        );
        assert!(report.all_songs[2].is_mostly_cover);
        assert_eq!(report.total_unique_songs, 4);
    }

    #[test]
    fn test_fixture_frequency_tables() {
        let report = SongAnalytics::collect(&fixture_catalog()).report();
        // Opener A's "Warmup" is credited to Headliner B, the only billed artist of c1.
        let opening = report.opening_songs_by_artist.get("Headliner B").unwrap();
        assert_eq!(opening, &vec![SongFrequency { song: "Opener Song".to_string(), times: 2 }]);
        let encores = report.encore_songs_by_artist.get("Headliner B").unwrap();
        assert_eq!(encores[0].times, 2);
        // Closers were "Cover Tune", "Warmup" and "Opener Song": none repeats.
        assert!(report.closing_songs_by_artist.is_empty());
    }

    #[test]
    fn test_artist_top_songs() {
        let catalog = fixture_catalog();
        let counts = ArtistSongCounts::collect(&catalog);
        let top = counts.top_songs("a_b", TOP_SONGS_LIMIT);
        assert_eq!(top[0], TopSong { name: "Opener Song".to_string(), times_played: 2 });
        assert_eq!(top.len(), 4);
        assert_eq!(counts.top_songs("a_b", 1).len(), 1);
        assert!(counts.top_songs("a_a", TOP_SONGS_LIMIT).is_empty());
        assert!(counts.top_songs("a_c", TOP_SONGS_LIMIT).is_empty());
    }

    #[test]
    fn test_report_serializes_artist_tables_as_objects() {
        let report = SongAnalytics::collect(&fixture_catalog()).report();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["opening_songs_by_artist"]["Headliner B"][0]["times"], 2);
        assert_eq!(value["closing_songs_by_artist"], json!({}));
    }
}
