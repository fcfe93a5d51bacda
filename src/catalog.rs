//! Catalog entries supplied by an external collaborator.
//!
//! The core does not care how the catalog was obtained (API pagination,
//! authentication and retry handling belong to the collaborator); it only
//! requires a finite, ordered sequence of [`CatalogEntry`] values.

use serde::{Deserialize, Serialize};

/// One recording in the artist catalog, immutable once received.
///
/// `isrc` is optional: releases without a registered identifier are counted
/// as unverifiable by the matcher, never as non-matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Recording title.
    pub title: String,
    /// Album/release name.
    pub album: String,
    /// Release kind (album, single, compilation).
    #[serde(default)]
    pub album_type: Option<String>,
    /// Release date as supplied (not parsed; display-only downstream).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Track duration in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Collaborator-side track id (e.g. a Spotify track id).
    #[serde(default)]
    pub track_id: Option<String>,
    /// Recording identifier, if the release carries one.
    #[serde(default)]
    pub isrc: Option<String>,
}

impl CatalogEntry {
    /// Minimal constructor for the common case; remaining display fields
    /// default to `None`.
    pub fn new(title: impl Into<String>, album: impl Into<String>, isrc: Option<String>) -> Self {
        Self {
            title: title.into(),
            album: album.into(),
            album_type: None,
            release_date: None,
            duration_ms: None,
            track_id: None,
            isrc,
        }
    }
}
