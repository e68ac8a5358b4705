//! Core data models for the concert export.
//!
//! This module contains the source records read from the document store
//! (concerts, setlists, artists, venues, photos) and the insertion-ordered
//! collections used by the aggregation stages.
//!
//! Records are decoded leniently: a missing, null or mistyped field takes the
//! field's default instead of failing the whole document.

use chrono::{DateTime, TimeZone, Utc};
use rustc_hash::FxHashMap;
use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

// ============================================================================
// Lenient Field Decoding
// ============================================================================

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decodes a list element by element, dropping elements that do not decode.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn as_int(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_int(&value).unwrap_or_default())
}

fn lenient_opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_int(&value))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&value))
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 strings and `{seconds, nanos}` objects, including the
/// underscore-prefixed variant some database exports produce.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(as_int)?;
            let nanos = map
                .get("nanos")
                .or_else(|| map.get("nanoseconds"))
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

/// A record decoded from a store document. The document identifier is not
/// part of the field record and is attached after decoding.
pub trait Record: DeserializeOwned + Default {
    fn set_id(&mut self, id: String);

    fn from_document(doc: Document) -> Self {
        let mut record: Self = serde_json::from_value(doc.data).unwrap_or_default();
        record.set_id(doc.id);
        record
    }
}

macro_rules! impl_record {
    ($($ty:ty),*) => {
        $(impl Record for $ty {
            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        })*
    };
}

// ============================================================================
// Roles
// ============================================================================

/// Billing role of an artist at a concert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Headliner,
    Opener,
    FestivalPerformer,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Headliner => "headliner",
            Role::Opener => "opener",
            Role::FestivalPerformer => "festival_performer",
            Role::Other(s) => s,
        }
    }

    /// Headliners and festival performers are billed as the concert's artists.
    pub fn is_primary(&self) -> bool {
        matches!(self, Role::Headliner | Role::FestivalPerformer)
    }

    /// Order in which setlists are shown on a multi-artist bill: openers first.
    pub fn running_order(&self) -> u8 {
        match self {
            Role::Opener => 1,
            _ => 2,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "headliner" => Role::Headliner,
            "opener" => Role::Opener,
            "festival_performer" => Role::FestivalPerformer,
            _ => Role::Other(s),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Role::from)
    }
}

// ============================================================================
// Source Records
// ============================================================================

/// Roster entry of a concert.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConcertArtist {
    #[serde(deserialize_with = "lenient")]
    pub artist_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub artist_name: String,
    #[serde(deserialize_with = "lenient")]
    pub role: Option<Role>,
}

impl ConcertArtist {
    pub fn is_primary(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_primary)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Concert {
    #[serde(skip)]
    pub id: String,
    #[serde(deserialize_with = "lenient_opt_int")]
    pub show_number: Option<i64>,
    /// ISO date, sortable lexicographically. Empty when unknown.
    #[serde(deserialize_with = "lenient")]
    pub date: String,
    #[serde(deserialize_with = "lenient")]
    pub festival_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub venue_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub venue_name: String,
    #[serde(deserialize_with = "lenient")]
    pub city: String,
    #[serde(deserialize_with = "lenient")]
    pub state: String,
    #[serde(deserialize_with = "lenient_list")]
    pub artists: Vec<ConcertArtist>,
    #[serde(deserialize_with = "lenient")]
    pub setlist_status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub opening_song: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub closing_song: Option<String>,
}

impl Concert {
    pub fn primary_artists(&self) -> impl Iterator<Item = &ConcertArtist> {
        self.artists.iter().filter(|a| a.is_primary())
    }

    /// Display string of the billed artists; openers are left out.
    pub fn primary_artist_names(&self) -> String {
        self.primary_artists()
            .map(|a| a.artist_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Year from the first four characters of the date, if they form a number.
    pub fn year(&self) -> Option<i32> {
        self.date.get(..4)?.parse().ok()
    }
}

/// Song entry embedded in a setlist.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Song {
    #[serde(deserialize_with = "lenient_int")]
    pub position: i64,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub set_name: String,
    /// Encore tier, 0 for the main set.
    #[serde(deserialize_with = "lenient_int")]
    pub encore: i64,
    #[serde(deserialize_with = "lenient")]
    pub is_cover: bool,
    #[serde(deserialize_with = "lenient")]
    pub cover_artist: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub guest_artist: Option<String>,
}

impl Song {
    pub fn is_encore(&self) -> bool {
        self.encore > 0
    }

    pub fn opens_main_set(&self) -> bool {
        self.position == 1
            && (self.set_name == "Main Set" || self.set_name.is_empty() || self.encore == 0)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Setlist {
    #[serde(skip)]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub concert_id: Option<String>,
    /// Identifier from the external music metadata source, not an artist document id.
    #[serde(deserialize_with = "lenient")]
    pub artist_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub artist_name: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub songs: Vec<Song>,
    #[serde(deserialize_with = "lenient_int")]
    pub song_count: i64,
    #[serde(deserialize_with = "lenient")]
    pub has_encore: bool,
    #[serde(deserialize_with = "lenient")]
    pub tour_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub setlistfm_url: Option<String>,
}

impl Setlist {
    pub fn tour(&self) -> Option<&str> {
        self.tour_name.as_deref().filter(|t| !t.is_empty())
    }

    /// Last main-set song: highest position among non-encore songs. On a
    /// position tie the later entry wins.
    pub fn closing_song(&self) -> Option<&Song> {
        self.songs
            .iter()
            .filter(|s| !s.is_encore())
            .max_by_key(|s| s.position)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Photo {
    #[serde(skip)]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub concert_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub user_name: String,
    #[serde(deserialize_with = "lenient")]
    pub user_photo: String,
    #[serde(deserialize_with = "lenient")]
    pub download_url: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub caption: String,
    #[serde(deserialize_with = "lenient")]
    pub file_type: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Artist {
    #[serde(skip)]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub canonical_name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Venue {
    #[serde(skip)]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub canonical_name: String,
    #[serde(deserialize_with = "lenient")]
    pub city: String,
    #[serde(deserialize_with = "lenient")]
    pub state: String,
}

impl_record!(Concert, Setlist, Photo, Artist, Venue);

// ============================================================================
// Ordered Collections
// ============================================================================

/// String-keyed map that iterates in first-insertion order.
///
/// Aggregations use it so that ties keep a stable order between runs and
/// keyed JSON objects are emitted in first-seen order.
#[derive(Clone, Debug)]
pub struct Ordered<V> {
    index: FxHashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self {
            index: FxHashMap::default(),
            entries: Vec::new(),
        }
    }
}

impl<V> Ordered<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, inserting the default at the end if absent.
    pub fn entry(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        let slot = match self.index.get(key).copied() {
            Some(slot) => slot,
            None => {
                let slot = self.entries.len();
                self.index.insert(key.to_string(), slot);
                self.entries.push((key.to_string(), V::default()));
                slot
            }
        };
        &mut self.entries[slot].1
    }

    /// Insert or replace; a replaced key keeps its original position.
    pub fn insert(&mut self, key: &str, value: V) {
        match self.index.get(key).copied() {
            Some(slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Occurrence counter keyed by name.
pub type Tally = Ordered<usize>;

impl Ordered<usize> {
    pub fn bump(&mut self, key: &str) {
        *self.entry(key) += 1;
    }

    pub fn count(&self, key: &str) -> usize {
        self.get(key).copied().unwrap_or(0)
    }

    /// Entries by count descending; equal counts stay in first-seen order.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.iter().map(|(k, &v)| (k, v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

// ============================================================================
// TESTS
// ============================================================================
