//! Status and stream-format classification

use url::Url;

use crate::models::{EntryStatus, StreamFormat};

/// Status phrases in match order; the first hit wins
const STATUS_TABLE: &[(&str, EntryStatus)] = &[
    ("devam ediyor", EntryStatus::Ongoing),
    ("tamamlandı", EntryStatus::Completed),
    // Upcoming titles are not complete yet
    ("yakında", EntryStatus::Ongoing),
];

/// Lowercase with the Turkish dotted/dotless `i` pair folded to `i`
///
/// The site is inconsistent about `ı`/`I`/`İ` in labels typed in caps.
pub fn fold_turkish(text: &str) -> String {
    text.to_lowercase()
        .replace('\u{307}', "")
        .replace('ı', "i")
}

/// Map free status text from a detail page to [`EntryStatus`]
pub fn classify_status(text: &str) -> EntryStatus {
    let text = fold_turkish(text);
    STATUS_TABLE
        .iter()
        .find(|(needle, _)| text.contains(&fold_turkish(needle)))
        .map(|(_, status)| *status)
        .unwrap_or(EntryStatus::Unknown)
}

/// Decide HLS vs progressive from the source's type hint, then its URL
pub fn classify_format(type_hint: Option<&str>, url: &str) -> StreamFormat {
    if let Some(hint) = type_hint.map(str::trim) {
        if hint.eq_ignore_ascii_case("hls") || hint.eq_ignore_ascii_case("m3u8") {
            return StreamFormat::Hls;
        }
    }

    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| {
            url.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        });

    if path.to_ascii_lowercase().ends_with(".m3u8") {
        StreamFormat::Hls
    } else {
        StreamFormat::Progressive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ongoing() {
        assert_eq!(classify_status("Devam Ediyor"), EntryStatus::Ongoing);
        assert_eq!(classify_status("  devam ediyor  "), EntryStatus::Ongoing);
    }

    #[test]
    fn test_status_completed() {
        assert_eq!(classify_status("Tamamlandı"), EntryStatus::Completed);
        assert_eq!(classify_status("TAMAMLANDI"), EntryStatus::Completed);
    }

    #[test]
    fn test_fold_turkish() {
        assert_eq!(fold_turkish("TÜRLER"), "türler");
        assert_eq!(fold_turkish("İzle"), "izle");
        assert_eq!(fold_turkish("Tamamlandı"), "tamamlandi");
    }

    #[test]
    fn test_status_upcoming_is_ongoing() {
        assert_eq!(classify_status("Yakında"), EntryStatus::Ongoing);
    }

    #[test]
    fn test_status_unknown() {
        assert_eq!(classify_status(""), EntryStatus::Unknown);
        assert_eq!(classify_status("Ara verildi"), EntryStatus::Unknown);
    }

    #[test]
    fn test_status_first_match_wins() {
        assert_eq!(
            classify_status("Devam ediyor (yakında tamamlandı)"),
            EntryStatus::Ongoing
        );
    }

    #[test]
    fn test_format_from_hint() {
        assert_eq!(
            classify_format(Some("hls"), "https://cdn.x/video"),
            StreamFormat::Hls
        );
        assert_eq!(
            classify_format(Some("M3U8"), "https://cdn.x/video.mp4"),
            StreamFormat::Hls
        );
    }

    #[test]
    fn test_format_from_url_suffix() {
        assert_eq!(
            classify_format(None, "https://cdn.x/master.m3u8?token=abc"),
            StreamFormat::Hls
        );
        assert_eq!(
            classify_format(Some("mp4"), "https://cdn.x/list.M3U8"),
            StreamFormat::Hls
        );
    }

    #[test]
    fn test_format_progressive() {
        assert_eq!(
            classify_format(None, "https://cdn.x/video.mp4"),
            StreamFormat::Progressive
        );
        assert_eq!(
            classify_format(Some("video/mp4"), "https://cdn.x/m3u8/file.mp4"),
            StreamFormat::Progressive
        );
    }
}
