//! M3U8 playlist inspection.
//!
//! Playlists are handed to ffmpeg untouched; they are parsed only to reject
//! uploads that are not playlists before an encoder is spawned.

use m4bforge_common::{Error, Result};

/// One media entry of a playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub uri: String,
    /// Duration from the preceding `#EXTINF`, if any.
    pub duration: Option<f64>,
    /// Title from the preceding `#EXTINF`, if any.
    pub title: Option<String>,
}

/// A parsed M3U/M3U8 playlist.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Parse playlist text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the `#EXTM3U` header is missing,
    /// an `#EXTINF` duration is not a number, or no entries are present.
    pub fn parse(contents: &str) -> Result<Self> {
        let contents = contents.trim_start_matches('\u{feff}');
        if !contents.trim_start().starts_with("#EXTM3U") {
            return Err(Error::invalid_input("playlist is missing the #EXTM3U header"));
        }

        let mut entries = Vec::new();
        let mut pending: Option<(f64, Option<String>)> = None;

        for line in contents.lines().map(str::trim) {
            if let Some(info) = line.strip_prefix("#EXTINF:") {
                pending = Some(parse_extinf(info)?);
            } else if line.is_empty() || line.starts_with('#') {
                continue;
            } else {
                let (duration, title) = match pending.take() {
                    Some((duration, title)) => (Some(duration), title),
                    None => (None, None),
                };
                entries.push(PlaylistEntry {
                    uri: line.to_string(),
                    duration,
                    title,
                });
            }
        }

        if entries.is_empty() {
            return Err(Error::invalid_input("playlist contains no media entries"));
        }

        Ok(Self { entries })
    }

    /// Read and parse a playlist file.
    pub async fn from_file(path: &std::path::Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of known entry durations in seconds. Negative (unknown) durations
    /// are skipped.
    pub fn total_duration(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|e| e.duration)
            .filter(|d| *d > 0.0)
            .sum()
    }
}

// `#EXTINF:<duration> [attributes],<title>`
fn parse_extinf(info: &str) -> Result<(f64, Option<String>)> {
    let (head, title) = match info.split_once(',') {
        Some((head, title)) => (head, Some(title.trim()).filter(|t| !t.is_empty())),
        None => (info, None),
    };

    let duration = head
        .split_whitespace()
        .next()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| Error::invalid_input(format!("invalid #EXTINF duration: {head}")))?;

    Ok((duration, title.map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_media_playlist() {
        let playlist = Playlist::parse(
            "#EXTM3U\n\
             #EXT-X-VERSION:3\n\
             #EXT-X-TARGETDURATION:10\n\
             #EXTINF:9.009,\n\
             segment0.ts\n\
             #EXTINF:10.0,Part Two\n\
             https://cdn.example.com/segment1.ts\n\
             #EXT-X-ENDLIST\n",
        )
        .unwrap();

        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.entries[0].uri, "segment0.ts");
        assert_eq!(playlist.entries[0].duration, Some(9.009));
        assert_eq!(playlist.entries[0].title, None);
        assert_eq!(playlist.entries[1].title.as_deref(), Some("Part Two"));
        assert!((playlist.total_duration() - 19.009).abs() < 1e-9);
    }

    #[test]
    fn extended_attributes_are_ignored() {
        let playlist = Playlist::parse(
            "#EXTM3U\n#EXTINF:-1 tvg-id=\"x\" group-title=\"News\",Live Radio\nhttp://radio/stream\n",
        )
        .unwrap();
        assert_eq!(playlist.entries[0].duration, Some(-1.0));
        assert_eq!(playlist.entries[0].title.as_deref(), Some("Live Radio"));
        assert_eq!(playlist.total_duration(), 0.0);
    }

    #[test]
    fn bare_uris_have_no_duration() {
        let playlist = Playlist::parse("#EXTM3U\r\nfirst.mp3\r\nsecond.mp3\r\n").unwrap();
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.entries[1].uri, "second.mp3");
        assert!(playlist.entries[1].duration.is_none());
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = Playlist::parse("segment0.ts\n").unwrap_err();
        assert!(err.to_string().contains("#EXTM3U"));
    }

    #[test]
    fn empty_playlist_is_rejected() {
        assert!(Playlist::parse("#EXTM3U\n#EXT-X-ENDLIST\n").is_err());
    }

    #[test]
    fn bad_duration_is_rejected() {
        assert!(Playlist::parse("#EXTM3U\n#EXTINF:abc,\nseg.ts\n").is_err());
    }

    #[test]
    fn byte_order_mark_is_tolerated() {
        assert!(Playlist::parse("\u{feff}#EXTM3U\nseg.ts\n").is_ok());
    }
}
