use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::types::{CatalogEntry, Source};

use super::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Membership {
    Album(String),
    Playlist(String),
}

impl From<Source> for Membership {
    fn from(source: Source) -> Self {
        match source {
            Source::Album { album_title } => Membership::Album(album_title),
            Source::Playlist { playlist_name } => Membership::Playlist(playlist_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    pub memberships: Vec<Membership>,
}

impl Track {
    /// Creates a track, collapsing duplicate memberships while keeping their
    /// first-seen order.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        album: Option<String>,
        memberships: Vec<Membership>,
    ) -> Self {
        let mut unique: Vec<Membership> = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if !unique.contains(&membership) {
                unique.push(membership);
            }
        }

        Self {
            id: id.into(),
            name: name.into(),
            artist: artist.into(),
            album: album.filter(|a| !a.trim().is_empty()),
            memberships: unique,
        }
    }

    pub fn from_entry(id: impl Into<String>, entry: CatalogEntry) -> Self {
        let memberships = entry.sources.into_iter().map(Membership::from).collect();
        Self::new(id, entry.name, entry.artist, entry.album, memberships)
    }

    pub fn is_album_track(&self) -> bool {
        self.memberships
            .iter()
            .any(|m| matches!(m, Membership::Album(_)))
    }

    /// Human readable `"<name> - <artist>"` used in progress output.
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.artist)
    }
}

#[derive(Debug, Clone)]
pub struct Album {
    pub title: String,
    pub artist: String,
    pub tracks: Vec<Arc<Track>>,
}

impl Album {
    pub fn label(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }
}

#[derive(Debug, Clone)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Arc<Track>>,
}

/// Tracks with derived album and playlist indices.
///
/// Albums and playlists keep the order in which they were first referenced
/// in the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Arc<Track>>,
    albums: Vec<Album>,
    album_index: HashMap<String, usize>,
    playlists: Vec<Playlist>,
    playlist_index: HashMap<String, usize>,
}

impl Catalog {
    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Tracks without any album or playlist membership.
    pub fn standalone_tracks(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter().filter(|t| t.memberships.is_empty())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Builds the album and playlist indices over `tracks`.
///
/// Fails fast on the first entry with an empty id or name, or on an id that
/// appears twice.
pub fn build_catalog(tracks: Vec<Track>) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(tracks.len());

    for track in tracks {
        if track.id.trim().is_empty() {
            return Err(CatalogError::MalformedCatalogEntry {
                id: track.id,
                reason: "empty track id".to_string(),
            });
        }
        if track.name.trim().is_empty() {
            return Err(CatalogError::MalformedCatalogEntry {
                id: track.id,
                reason: "missing track name".to_string(),
            });
        }
        if !seen.insert(track.id.clone()) {
            return Err(CatalogError::MalformedCatalogEntry {
                id: track.id,
                reason: "duplicate track id".to_string(),
            });
        }

        let track = Arc::new(track);

        for membership in &track.memberships {
            match membership {
                Membership::Album(title) => {
                    let index = *catalog
                        .album_index
                        .entry(title.clone())
                        .or_insert_with(|| {
                            catalog.albums.push(Album {
                                title: title.clone(),
                                artist: track.artist.clone(),
                                tracks: Vec::new(),
                            });
                            catalog.albums.len() - 1
                        });
                    catalog.albums[index].tracks.push(Arc::clone(&track));
                }
                Membership::Playlist(name) => {
                    let index = *catalog
                        .playlist_index
                        .entry(name.clone())
                        .or_insert_with(|| {
                            catalog.playlists.push(Playlist {
                                name: name.clone(),
                                tracks: Vec::new(),
                            });
                            catalog.playlists.len() - 1
                        });
                    catalog.playlists[index].tracks.push(Arc::clone(&track));
                }
            }
        }

        catalog.tracks.push(track);
    }

    Ok(catalog)
}
