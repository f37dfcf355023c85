//! Category label lists and keyword rules for subcategory inference.

pub const DEFAULT_SUBCATEGORY: &str = "General";

const BUSINESS_LABELS: &[&str] = &[
    "Stocks",
    "Cryptocurrency",
    "Commodities",
    "Forex",
    "IPO",
    "Mutual Funds",
];

const SPORTS_LABELS: &[&str] = &[
    "Football",
    "Basketball",
    "Cricket",
    "Tennis",
    "Baseball",
    "Soccer",
];

const ENTERTAINMENT_LABELS: &[&str] = &[
    "Movies",
    "TV Shows",
    "Music",
    "Celebrity",
    "Streaming",
    "Gaming",
];

const GENERAL_LABELS: &[&str] = &[
    "World",
    "Politics",
    "Technology",
    "Science",
    "Health",
    "Business",
];

// Ordered: the first keyword found in the text decides the label.
const BUSINESS_RULES: &[(&str, &str)] = &[
    ("bitcoin", "Cryptocurrency"),
    ("ethereum", "Cryptocurrency"),
    ("crypto", "Cryptocurrency"),
    ("blockchain", "Cryptocurrency"),
    ("initial public offering", "IPO"),
    ("ipo", "IPO"),
    ("mutual fund", "Mutual Funds"),
    ("forex", "Forex"),
    ("exchange rate", "Forex"),
    ("currency", "Forex"),
    ("crude", "Commodities"),
    ("gold", "Commodities"),
    ("silver", "Commodities"),
    ("commodit", "Commodities"),
    ("stock", "Stocks"),
    ("shares", "Stocks"),
    ("equity", "Stocks"),
    ("nasdaq", "Stocks"),
    ("sensex", "Stocks"),
];

const SPORTS_RULES: &[(&str, &str)] = &[
    ("nfl", "Football"),
    ("touchdown", "Football"),
    ("quarterback", "Football"),
    ("nba", "Basketball"),
    ("basketball", "Basketball"),
    ("cricket", "Cricket"),
    ("wicket", "Cricket"),
    ("tennis", "Tennis"),
    ("wimbledon", "Tennis"),
    ("grand slam", "Tennis"),
    ("mlb", "Baseball"),
    ("baseball", "Baseball"),
    ("soccer", "Soccer"),
    ("premier league", "Soccer"),
    ("champions league", "Soccer"),
    ("fifa", "Soccer"),
    ("football", "Football"),
];

const ENTERTAINMENT_RULES: &[(&str, &str)] = &[
    ("netflix", "Streaming"),
    ("streaming", "Streaming"),
    ("hulu", "Streaming"),
    ("box office", "Movies"),
    ("movie", "Movies"),
    ("film", "Movies"),
    ("album", "Music"),
    ("concert", "Music"),
    ("song", "Music"),
    ("music", "Music"),
    ("video game", "Gaming"),
    ("gaming", "Gaming"),
    ("playstation", "Gaming"),
    ("xbox", "Gaming"),
    ("nintendo", "Gaming"),
    ("episode", "TV Shows"),
    ("series", "TV Shows"),
    ("television", "TV Shows"),
    ("celebrity", "Celebrity"),
    ("red carpet", "Celebrity"),
];

const GENERAL_RULES: &[(&str, &str)] = &[
    ("election", "Politics"),
    ("senate", "Politics"),
    ("parliament", "Politics"),
    ("minister", "Politics"),
    ("software", "Technology"),
    ("artificial intelligence", "Technology"),
    ("technology", "Technology"),
    ("nasa", "Science"),
    ("research", "Science"),
    ("scientist", "Science"),
    ("vaccine", "Health"),
    ("hospital", "Health"),
    ("health", "Health"),
    ("economy", "Business"),
    ("market", "Business"),
    ("united nations", "World"),
    ("war", "World"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Business,
    Sports,
    Entertainment,
    General,
}

fn group_of(category: &str) -> Group {
    match category.trim().to_ascii_lowercase().as_str() {
        "business" | "finance" | "markets" => Group::Business,
        "sports" | "sport" => Group::Sports,
        "entertainment" => Group::Entertainment,
        _ => Group::General,
    }
}

/// Ordered subcategory labels for a category. Unknown categories use the general list.
pub fn subcategory_labels(category: &str) -> &'static [&'static str] {
    match group_of(category) {
        Group::Business => BUSINESS_LABELS,
        Group::Sports => SPORTS_LABELS,
        Group::Entertainment => ENTERTAINMENT_LABELS,
        Group::General => GENERAL_LABELS,
    }
}

fn rules_for(category: &str) -> &'static [(&'static str, &'static str)] {
    match group_of(category) {
        Group::Business => BUSINESS_RULES,
        Group::Sports => SPORTS_RULES,
        Group::Entertainment => ENTERTAINMENT_RULES,
        Group::General => GENERAL_RULES,
    }
}

/// Case-insensitive keyword match over `text`; the first rule that matches wins.
pub fn infer_subcategory(category: &str, text: &str) -> Option<&'static str> {
    let haystack = text.to_lowercase();
    rules_for(category)
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, label)| *label)
}

/// Category implied by a feed key: the lowercased prefix before the first `-`, `_` or `.`.
pub fn category_for_feed(feed_key: &str) -> String {
    let prefix = feed_key
        .split(['-', '_', '.'])
        .next()
        .unwrap_or_default()
        .trim();
    if prefix.is_empty() {
        "general".to_string()
    } else {
        prefix.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod labels_tests {
        use super::*;

        #[test]
        fn test_business_labels_order() {
            assert_eq!(
                subcategory_labels("business"),
                &["Stocks", "Cryptocurrency", "Commodities", "Forex", "IPO", "Mutual Funds"]
            );
        }

        #[test]
        fn test_category_lookup_is_case_insensitive() {
            assert_eq!(subcategory_labels("Sports"), SPORTS_LABELS);
            assert_eq!(subcategory_labels(" ENTERTAINMENT "), ENTERTAINMENT_LABELS);
        }

        #[test]
        fn test_unknown_category_uses_general_labels() {
            assert_eq!(subcategory_labels("latest"), GENERAL_LABELS);
            assert_eq!(subcategory_labels("weather"), GENERAL_LABELS);
        }
    }

    mod inference_tests {
        use super::*;

        #[test]
        fn test_first_matching_rule_wins() {
            // Mentions both bitcoin and stocks; crypto rules come first.
            let label = infer_subcategory("business", "Bitcoin rally lifts tech stocks");
            assert_eq!(label, Some("Cryptocurrency"));
        }

        #[test]
        fn test_match_is_case_insensitive() {
            assert_eq!(
                infer_subcategory("business", "GOLD hits record high"),
                Some("Commodities")
            );
        }

        #[test]
        fn test_soccer_beats_generic_football() {
            assert_eq!(
                infer_subcategory("sports", "Premier League football returns"),
                Some("Soccer")
            );
            assert_eq!(
                infer_subcategory("sports", "College football scores"),
                Some("Football")
            );
        }

        #[test]
        fn test_no_match_returns_none() {
            assert_eq!(infer_subcategory("entertainment", "Local bakery opens"), None);
        }

        #[test]
        fn test_rules_scoped_to_category() {
            assert_eq!(infer_subcategory("business", "Netflix subscriber growth"), None);
            assert_eq!(
                infer_subcategory("entertainment", "Netflix subscriber growth"),
                Some("Streaming")
            );
        }
    }

    mod feed_category_tests {
        use super::*;

        #[test]
        fn test_prefix_before_separator() {
            assert_eq!(category_for_feed("business-api"), "business");
            assert_eq!(category_for_feed("Sports_rss"), "sports");
            assert_eq!(category_for_feed("entertainment.db"), "entertainment");
        }

        #[test]
        fn test_plain_key() {
            assert_eq!(category_for_feed("business"), "business");
        }

        #[test]
        fn test_empty_key_is_general() {
            assert_eq!(category_for_feed(""), "general");
            assert_eq!(category_for_feed("-api"), "general");
        }
    }
}
