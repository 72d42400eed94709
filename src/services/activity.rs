/// Activity catalog and name detection for event creation defaults.
///
/// The detector maps free-typed activity names onto the catalog and fills
/// in the activity type and its usual squad size. Matching is a stateless
/// similarity score with a strict threshold, so only exact matches after
/// normalization land.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Raid,
    Dungeon,
    Trials,
}

impl ActivityKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ActivityKind::Raid => "Raid",
            ActivityKind::Dungeon => "Dungeon",
            ActivityKind::Trials => "PvP - Trials of Osiris",
        }
    }

    pub fn default_squad_size(self) -> i32 {
        match self {
            ActivityKind::Raid => 6,
            ActivityKind::Dungeon | ActivityKind::Trials => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedActivity {
    pub canonical_name: String,
    pub kind: ActivityKind,
}

struct CatalogEntry {
    canonical: &'static str,
    keywords: &'static [&'static str],
    kind: ActivityKind,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        canonical: "King's Fall",
        keywords: &["kings fall", "king's fall", "kf", "oryx"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Crota's End",
        keywords: &["crotas end", "crota's end", "crota", "ce"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Vault of Glass",
        keywords: &["vault of glass", "vog"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Last Wish",
        keywords: &["last wish", "lw", "riven"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Garden of Salvation",
        keywords: &["garden of salvation", "garden", "gos"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Deep Stone Crypt",
        keywords: &["deep stone crypt", "dsc"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Vow of the Disciple",
        keywords: &["vow of the disciple", "vow", "vod"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Root of Nightmares",
        keywords: &["root of nightmares", "root", "ron"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Salvation's Edge",
        keywords: &["salvations edge", "salvation's edge", "edge", "se"],
        kind: ActivityKind::Raid,
    },
    CatalogEntry {
        canonical: "Prophecy",
        keywords: &["prophecy"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Shattered Throne",
        keywords: &["shattered throne", "st"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Pit of Heresy",
        keywords: &["pit of heresy", "pit", "poh"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Duality",
        keywords: &["duality"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Spire of the Watcher",
        keywords: &["spire of the watcher", "spire", "sotw"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Ghosts of the Deep",
        keywords: &["ghosts of the deep", "ghosts", "gotd"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Warlord's Ruin",
        keywords: &["warlords ruin", "warlord's ruin", "wr"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Vesper's Host",
        keywords: &["vespers host", "vesper's host", "vesper"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Sundered Doctrine",
        keywords: &["sundered doctrine", "sundered", "doctrine"],
        kind: ActivityKind::Dungeon,
    },
    CatalogEntry {
        canonical: "Trials of Osiris",
        keywords: &["trials of osiris", "trials", "osiris"],
        kind: ActivityKind::Trials,
    },
];

/// Strict: only a perfect score counts, anything fuzzier asks the creator
/// to set type and capacity explicitly.
const SIMILARITY_THRESHOLD: f64 = 1.0;

fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Dice coefficient over character bigrams. 1.0 means identical after
/// normalization.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let a_grams = bigrams(a);
    let mut b_grams = bigrams(b);
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }
    let mut matches = 0usize;
    for gram in &a_grams {
        if let Some(pos) = b_grams.iter().position(|g| g == gram) {
            b_grams.swap_remove(pos);
            matches += 1;
        }
    }
    (2.0 * matches as f64) / (a_grams.len() + b_grams.len() + matches) as f64
}

/// Maps a free-typed name onto the catalog. Returns the canonical entry
/// when the score clears the threshold, `None` otherwise.
pub fn detect_activity(name_input: &str) -> Option<DetectedActivity> {
    let needle = normalize(name_input);
    let mut best: Option<(&CatalogEntry, f64)> = None;

    for entry in CATALOG {
        let mut score = similarity(&needle, &normalize(entry.canonical));
        for keyword in entry.keywords {
            score = score.max(similarity(&needle, keyword));
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((entry, score));
        }
    }

    match best {
        Some((entry, score)) if score >= SIMILARITY_THRESHOLD => Some(DetectedActivity {
            canonical_name: entry.canonical.to_string(),
            kind: entry.kind,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_abbreviation() {
        let detected = detect_activity("vog").unwrap();
        assert_eq!(detected.canonical_name, "Vault of Glass");
        assert_eq!(detected.kind, ActivityKind::Raid);
        assert_eq!(detected.kind.default_squad_size(), 6);
    }

    #[test]
    fn test_detect_normalizes_case_and_spacing() {
        let detected = detect_activity("  Pit of Heresy ").unwrap();
        assert_eq!(detected.kind, ActivityKind::Dungeon);
        assert_eq!(detected.kind.default_squad_size(), 3);
    }

    #[test]
    fn test_near_misses_are_rejected() {
        assert!(detect_activity("vaul of glas").is_none());
        assert!(detect_activity("some custom night").is_none());
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let partial = similarity("night", "light");
        assert!(partial > 0.0 && partial < 1.0);
    }
}
