//! Share-link resolution for MEDIAL source URLs
//!
//! MEDIAL is self-hosted, so share links carry no recognizable domain.
//! A source is claimed purely on path shape: `/Player/<id>` with an
//! eight-character alphanumeric id. The embed URL keeps the source's
//! scheme, host and port and swaps in the player page with its fixed
//! query contract.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Fixed path segment that marks a share link
pub const SHARE_PATH_SEGMENT: &str = "Player";

/// Share-link video ids are exactly this many ASCII alphanumerics
pub const VIDEO_ID_LEN: usize = 8;

/// Path of the embeddable player page
const EMBED_PATH: &str = "/player";

/// Opaque video identifier extracted from a share link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the video id from a share-link URL.
///
/// Host-agnostic: any scheme and host qualify as long as the path is exactly
/// `/Player/<id>`. Malformed URLs simply do not match.
pub fn video_id(source_url: &str) -> Option<VideoId> {
    let url = Url::parse(source_url).ok()?;
    share_id(&url).map(|id| VideoId(id.to_owned()))
}

/// True if the URL has the share-link shape this adapter can play
pub fn is_share_link(source_url: &str) -> bool {
    video_id(source_url).is_some()
}

fn share_id(url: &Url) -> Option<&str> {
    let mut segments = url.path_segments()?;
    let head = segments.next()?;
    let id = segments.next()?;
    if segments.next().is_some() || head != SHARE_PATH_SEGMENT {
        return None;
    }
    let valid = id.len() == VIDEO_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(id)
}

/// Build the embeddable player URL for a share link.
///
/// The query string is a wire contract the player page reads verbatim:
/// autoplay off, captions requested, chapter zero, and the flag that makes
/// the page load its postMessage bridge. Keys and ordering are fixed.
pub fn embed_url(source_url: &str) -> Result<Url> {
    let mut url = Url::parse(source_url)?;
    let id = match share_id(&url) {
        Some(id) => id.to_owned(),
        None => {
            return Err(Error::UnrecognizedSource {
                url: source_url.to_owned(),
            })
        }
    };

    url.set_path(EMBED_PATH);
    url.set_query(Some(&format!(
        "autostart=n&videoId={id}&captions=y&chapterId=0&playerJs=y"
    )));
    url.set_fragment(None);
    // Only scheme, host and port survive from the source.
    let _ = url.set_username("");
    let _ = url.set_password(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_link_detection() {
        assert!(is_share_link("https://media.example.ac.uk/Player/oT9122Fc"));
        assert!(is_share_link("http://video.intranet:8443/Player/A1b2C3d4"));

        assert!(!is_share_link("https://media.example.ac.uk/Watch/oT9122Fc"));
        assert!(!is_share_link("https://media.example.ac.uk/Player"));
        assert!(!is_share_link(
            "https://media.example.ac.uk/Player/oT9122Fc/extra"
        ));
        assert!(!is_share_link("https://media.example.ac.uk/"));
        assert!(!is_share_link("not a url"));
    }

    #[test]
    fn test_id_length_boundaries() {
        assert!(is_share_link("https://m.example.com/Player/abcd1234"));
        // 7 and 9 characters
        assert!(!is_share_link("https://m.example.com/Player/abcd123"));
        assert!(!is_share_link("https://m.example.com/Player/abcd12345"));
    }

    #[test]
    fn test_id_charset() {
        assert!(!is_share_link("https://m.example.com/Player/abcd-123"));
        assert!(!is_share_link("https://m.example.com/Player/abcd12_4"));
        assert!(!is_share_link("https://m.example.com/Player/abcd123%"));
    }

    #[test]
    fn test_share_segment_is_case_sensitive() {
        assert!(!is_share_link("https://m.example.com/player/oT9122Fc"));
    }

    #[test]
    fn test_trailing_slash_does_not_match() {
        assert!(!is_share_link("https://m.example.com/Player/oT9122Fc/"));
    }

    #[test]
    fn test_video_id_extraction() {
        let id = video_id("https://media.example.ac.uk/Player/oT9122Fc");
        assert_eq!(id.unwrap().as_str(), "oT9122Fc");

        assert!(video_id("https://media.example.ac.uk/About").is_none());
    }

    #[test]
    fn test_embed_url_contract() {
        let embed = embed_url("https://media.example.ac.uk/Player/oT9122Fc").unwrap();
        assert_eq!(
            embed.as_str(),
            "https://media.example.ac.uk/player?autostart=n&videoId=oT9122Fc&captions=y&chapterId=0&playerJs=y"
        );
    }

    #[test]
    fn test_embed_url_preserves_scheme_host_port() {
        let embed = embed_url("http://video.intranet:8443/Player/A1b2C3d4").unwrap();
        assert_eq!(embed.scheme(), "http");
        assert_eq!(embed.host_str(), Some("video.intranet"));
        assert_eq!(embed.port(), Some(8443));
    }

    #[test]
    fn test_embed_url_is_deterministic() {
        let source = "https://media.example.ac.uk/Player/oT9122Fc";
        let first = embed_url(source).unwrap();
        let second = embed_url(source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_embed_url_drops_fragment() {
        let embed = embed_url("https://media.example.ac.uk/Player/oT9122Fc#t=30").unwrap();
        assert!(!embed.as_str().contains('#'));
    }

    #[test]
    fn test_embed_url_rejects_non_share_links() {
        let err = embed_url("https://media.example.ac.uk/Watch/oT9122Fc");
        assert!(matches!(err, Err(Error::UnrecognizedSource { .. })));

        let err = embed_url("][not-a-url");
        assert!(matches!(err, Err(Error::InvalidUrl(_))));
    }
}
