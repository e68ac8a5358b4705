//! Export pipeline: load once, then project and write every output view.
//!
//! Stage order follows the dependency chain: concert details (and stale
//! cleanup) before the concert list, directories before statistics, song
//! counts before artist details. A failing stage aborts the run and leaves
//! the files of earlier stages in place.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::concerts::{concert_details, concert_list};
use crate::details::{artist_details, venue_details};
use crate::directory::{artist_directory, venue_directory};
use crate::loader::{load, Catalog, LoadReport};
use crate::output::{detail_path, prune_stale, write_json, OutputLayout};
use crate::progress::StageProgress;
use crate::safety::is_safe_document_id;
use crate::songs::{ArtistSongCounts, SongAnalytics};
use crate::stats::statistics;
use crate::store::DocumentStore;

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub load: LoadReport,
    pub concerts: usize,
    pub concert_details: usize,
    pub stale_removed: Vec<String>,
    pub artists: usize,
    pub venues: usize,
    pub unique_songs: usize,
    pub venue_details: usize,
    pub artist_details: usize,
    /// Detail files not written because the id is not a usable file name.
    pub skipped_files: usize,
}

/// Outcome of one detail directory.
struct DetailFiles {
    removed: Vec<String>,
    skipped: usize,
}

/// Write a detail file per item and prune files of ids no longer present.
///
/// Items whose id cannot be a file name are skipped; they still appear in
/// every listing.
fn write_details<T: Serialize>(
    dir: &Path,
    label: &str,
    items: &[T],
    id: impl Fn(&T) -> &str,
) -> Result<DetailFiles> {
    let progress = StageProgress::new(label, items.len());
    let mut current: FxHashSet<&str> = FxHashSet::default();
    let mut skipped = 0;
    for item in items {
        let item_id = id(item);
        if is_safe_document_id(item_id) {
            write_json(&detail_path(dir, item_id), item)?;
            current.insert(item_id);
        } else {
            warn!(id = item_id, dir = %dir.display(), "no detail file for an identifier unusable as a file name");
            skipped += 1;
        }
        progress.inc();
    }
    progress.finish();
    Ok(DetailFiles {
        removed: prune_stale(dir, &current)?,
        skipped,
    })
}

/// Run every stage against an already loaded catalog.
pub fn export_catalog(
    catalog: &Catalog,
    layout: &OutputLayout,
    generated_at: NaiveDateTime,
) -> Result<ExportSummary> {
    layout.create_dirs()?;
    let mut summary = ExportSummary::default();

    println!("\n1. Exporting concerts...");
    let concerts = concert_list(catalog);
    summary.concerts = concerts.len();
    println!("   Loaded {} concerts", concerts.len());

    println!("\n2. Exporting concert details with setlists...");
    let details = concert_details(catalog);
    let written =
        write_details(&layout.concert_details(), "Concert details", &details, |d| d.id.as_str())?;
    summary.stale_removed = written.removed;
    summary.skipped_files += written.skipped;
    summary.concert_details = details.len() - written.skipped;
    println!("   Exported {} concert details", summary.concert_details);
    for id in &summary.stale_removed {
        println!("   Deleted stale detail file: {}.json", id);
    }
    if !summary.stale_removed.is_empty() {
        println!("   Cleaned up {} stale detail file(s)", summary.stale_removed.len());
    }
    // Written only now: hasSetlist must agree with the detail files on disk.
    write_json(&layout.concerts(), &concerts)?;

    println!("\n3. Exporting artists...");
    let artists = artist_directory(catalog);
    write_json(&layout.artists(), &artists)?;
    summary.artists = artists.len();
    println!("   Exported {} artists", artists.len());

    println!("\n4. Exporting venues...");
    let venues = venue_directory(catalog);
    write_json(&layout.venues(), &venues)?;
    summary.venues = venues.len();
    println!("   Exported {} venues", venues.len());

    println!("\n5. Generating statistics...");
    let stats = statistics(catalog, &artists, &venues, generated_at);
    write_json(&layout.stats(), &stats)?;
    println!("   Generated statistics");

    println!("\n6. Exporting songs...");
    let songs = SongAnalytics::collect(catalog).report();
    write_json(&layout.songs(), &songs)?;
    summary.unique_songs = songs.total_unique_songs;
    println!("   Exported {} unique songs", songs.total_unique_songs);

    println!("\n7. Exporting venue details...");
    let venue_pages = venue_details(catalog);
    let written = write_details(&layout.venue_details(), "Venue details", &venue_pages, |v| {
        v.id.as_str()
    })?;
    summary.skipped_files += written.skipped;
    summary.venue_details = venue_pages.len() - written.skipped;
    println!("   Exported {} venue details", summary.venue_details);
    if !written.removed.is_empty() {
        println!("   Cleaned up {} stale venue file(s)", written.removed.len());
    }

    println!("\n8. Exporting artist details...");
    let song_counts = ArtistSongCounts::collect(catalog);
    let artist_pages = artist_details(catalog, &song_counts);
    let written = write_details(&layout.artist_details(), "Artist details", &artist_pages, |a| {
        a.id.as_str()
    })?;
    summary.skipped_files += written.skipped;
    summary.artist_details = artist_pages.len() - written.skipped;
    println!("   Exported {} artist details", summary.artist_details);
    if !written.removed.is_empty() {
        println!("   Cleaned up {} stale artist file(s)", written.removed.len());
    }

    Ok(summary)
}

/// Load the store and export it into `output_dir`, stamped with the current time.
pub fn run(store: &dyn DocumentStore, output_dir: &Path) -> Result<ExportSummary> {
    println!("Exporting concert database to JSON...");
    println!("{:=<60}", "");

    let (catalog, report) = load(store)?;
    if report.orphaned_setlists > 0 || report.orphaned_photos > 0 {
        println!(
            "   Ignored {} setlist(s) and {} photo(s) for unknown concerts",
            report.orphaned_setlists, report.orphaned_photos
        );
    }

    let layout = OutputLayout::new(output_dir);
    let mut summary = export_catalog(&catalog, &layout, Local::now().naive_local())?;
    summary.load = report;
    Ok(summary)
}
