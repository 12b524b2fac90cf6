use std::collections::HashMap;

use crate::storage::entity::{catalog_entry, user_catalog_link};

/// A catalog entry with its popularity counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub entry: catalog_entry::Model,
    /// Users that registered the character.
    pub links: u64,
    /// Users that marked it as their favorite.
    pub favorites: u64,
}

impl LeaderboardRow {
    pub fn score(&self) -> u64 {
        self.links + self.favorites
    }
}

/// Ranks `entries` by links plus favorites, descending.
///
/// Entries with equal scores keep the order they were given in; entries
/// without links are included with a score of zero.
pub fn rank(
    entries: Vec<catalog_entry::Model>,
    links: &[user_catalog_link::Model],
) -> Vec<LeaderboardRow> {
    let mut counts: HashMap<i32, (u64, u64)> = HashMap::new();
    for link in links {
        let counter = counts.entry(link.catalog_entry_id).or_default();
        counter.0 += 1;
        if link.favorite {
            counter.1 += 1;
        }
    }

    let mut rows: Vec<LeaderboardRow> = entries
        .into_iter()
        .map(|entry| {
            let (links, favorites) = counts.get(&entry.id).copied().unwrap_or_default();
            LeaderboardRow {
                entry,
                links,
                favorites,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.score().cmp(&a.score()));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: i32, name: &str) -> catalog_entry::Model {
        catalog_entry::Model {
            id,
            shikimori_id: i64::from(id) * 100,
            name: name.to_string(),
            russian_name: name.to_string(),
            image: String::new(),
            url: String::new(),
            alt_name: None,
            japanese_name: None,
        }
    }

    fn links(entry_id: i32, count: i32, favorites: i32) -> Vec<user_catalog_link::Model> {
        (0..count)
            .map(|user| user_catalog_link::Model {
                id: entry_id * 100 + user,
                user_id: user,
                catalog_entry_id: entry_id,
                favorite: user < favorites,
            })
            .collect()
    }

    #[test]
    fn ranks_by_links_plus_favorites() {
        let entries = vec![entry(1, "A"), entry(2, "B"), entry(3, "C")];
        let all_links = [links(1, 3, 1), links(2, 5, 0), links(3, 1, 1)].concat();

        let ranked = rank(entries, &all_links);
        let names: Vec<_> = ranked.iter().map(|r| r.entry.name.as_str()).collect();

        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!((ranked[1].links, ranked[1].favorites), (3, 1));
        assert_eq!(ranked[2].score(), 2);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let entries = vec![entry(1, "first"), entry(2, "second"), entry(3, "unlinked")];
        let all_links = [links(1, 2, 0), links(2, 1, 1)].concat();

        let ranked = rank(entries, &all_links);
        let names: Vec<_> = ranked.iter().map(|r| r.entry.name.as_str()).collect();

        assert_eq!(names, vec!["first", "second", "unlinked"]);
        assert_eq!(ranked[2].score(), 0);
    }
}
