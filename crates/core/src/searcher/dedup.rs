//! Deduplication of torrent search results by info_hash.

use std::collections::HashMap;

use super::TorrentCandidate;

/// Merge candidates that share an info hash.
///
/// The first listing of a hash keeps its position and name; later listings
/// only contribute a higher seeder count and an earlier publish date.
/// Candidates without a hash are kept as-is.
pub fn deduplicate_results(raw: Vec<TorrentCandidate>) -> Vec<TorrentCandidate> {
    let mut index_by_hash: HashMap<String, usize> = HashMap::new();
    let mut results: Vec<TorrentCandidate> = Vec::with_capacity(raw.len());

    for mut candidate in raw {
        if candidate.info_hash.is_empty() {
            results.push(candidate);
            continue;
        }

        candidate.info_hash = candidate.info_hash.to_lowercase();
        match index_by_hash.get(&candidate.info_hash) {
            Some(&idx) => {
                let existing = &mut results[idx];
                existing.seeders = existing.seeders.max(candidate.seeders);
                existing.leechers = existing.leechers.max(candidate.leechers);
                if let Some(date) = candidate.publish_date {
                    existing.publish_date = Some(match existing.publish_date {
                        Some(existing_date) => existing_date.min(date),
                        None => date,
                    });
                }
                if existing.size_bytes == 0 {
                    existing.size_bytes = candidate.size_bytes;
                }
            }
            None => {
                index_by_hash.insert(candidate.info_hash.clone(), results.len());
                results.push(candidate);
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make(name: &str, hash: &str, seeders: u32) -> TorrentCandidate {
        TorrentCandidate {
            name: name.to_string(),
            info_hash: hash.to_string(),
            seeders,
            size_bytes: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn test_dedup_keeps_first_position() {
        let results = deduplicate_results(vec![
            make("A", "aaa", 5),
            make("B", "bbb", 50),
            make("A again", "AAA", 9),
        ]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "A");
        assert_eq!(results[0].seeders, 9);
        assert_eq!(results[1].name, "B");
    }

    #[test]
    fn test_dedup_without_hash_kept() {
        let results = deduplicate_results(vec![make("X", "", 1), make("Y", "", 2)]);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_dedup_earliest_publish_date() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let mut first = make("A", "aaa", 1);
        first.publish_date = Some(late);
        let mut second = make("A", "aaa", 1);
        second.publish_date = Some(early);

        let results = deduplicate_results(vec![first, second]);
        assert_eq!(results[0].publish_date, Some(early));
    }
}
