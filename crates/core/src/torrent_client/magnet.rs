//! Magnet link construction from search results.

/// Build a magnet URI from an info hash, a display name and trackers.
pub fn build_magnet(info_hash: &str, name: &str, trackers: &[String]) -> String {
    let mut uri = format!("magnet:?xt=urn:btih:{}", info_hash.to_lowercase());
    if !name.is_empty() {
        uri.push_str("&dn=");
        uri.push_str(&urlencoding::encode(name));
    }
    for tracker in trackers {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnet_with_name_and_trackers() {
        let uri = build_magnet(
            "ABCDEF0123456789ABCDEF0123456789ABCDEF01",
            "Show S01E02 1080p",
            &["udp://tracker.example:1337/announce".to_string()],
        );
        assert_eq!(
            uri,
            "magnet:?xt=urn:btih:abcdef0123456789abcdef0123456789abcdef01\
             &dn=Show%20S01E02%201080p\
             &tr=udp%3A%2F%2Ftracker.example%3A1337%2Fannounce"
        );
    }

    #[test]
    fn test_magnet_bare_hash() {
        assert_eq!(build_magnet("abc", "", &[]), "magnet:?xt=urn:btih:abc");
    }
}
