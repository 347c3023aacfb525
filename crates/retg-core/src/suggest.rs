//! Tag autocompletion for inline queries.

use crate::{tags::tag, tree::ChatTree};

/// One autocomplete entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub display: String,
    /// The `*Alias` this entry completes to.
    pub matched_alias_token: String,
    /// The whole query with its last token replaced by the tag.
    pub insert_text: String,
}

/// Complete the last token of `query` to a tag, keeping the text before it.
///
/// An empty query (or a bare `*`) lists every tag. A token glued to the
/// previous word (`text*`) matches nothing, so typing mid-word does not pop
/// up suggestions.
pub fn suggest(tree: &ChatTree, query: &str) -> Vec<Suggestion> {
    let candidates = tree.all_aliases().into_iter().map(|alias| tag(&alias));

    let (prefix, filter) = match query.split_whitespace().last() {
        Some(last) => {
            let trimmed = query.trim_end();
            let prefix = &trimmed[..trimmed.len() - last.len()];
            (prefix, Some(last.to_lowercase()))
        }
        None => (query, None),
    };

    candidates
        .filter(|candidate| match &filter {
            Some(token) => candidate.to_lowercase().contains(token.as_str()),
            None => true,
        })
        .map(|candidate| {
            let insert_text = format!("{prefix}{candidate}");
            Suggestion {
                display: insert_text.clone(),
                matched_alias_token: candidate,
                insert_text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;

    const ALL_TAGS: [&str; 9] = [
        "*All",
        "*DoubleDigit",
        "*Eleventh",
        "*First",
        "*Hundreadth",
        "*Second",
        "*SingleDigit",
        "*Tenth",
        "*TripleDigit",
    ];

    fn tokens(out: &[Suggestion]) -> Vec<&str> {
        out.iter().map(|s| s.matched_alias_token.as_str()).collect()
    }

    fn texts(out: &[Suggestion]) -> Vec<&str> {
        out.iter().map(|s| s.insert_text.as_str()).collect()
    }

    #[test]
    fn empty_query_suggests_all_tags() {
        let out = suggest(&sample_tree(), "");
        assert_eq!(tokens(&out), ALL_TAGS);
        assert_eq!(texts(&out), ALL_TAGS);
    }

    #[test]
    fn whitespace_only_query_keeps_the_whitespace() {
        let out = suggest(&sample_tree(), "  ");
        assert_eq!(out.len(), ALL_TAGS.len());
        assert_eq!(out[0].insert_text, "  *All");
    }

    #[test]
    fn bare_star_suggests_all_tags() {
        let out = suggest(&sample_tree(), "*");
        assert_eq!(texts(&out), ALL_TAGS);
    }

    #[test]
    fn star_and_subword_filters() {
        let out = suggest(&sample_tree(), "*Se");
        assert_eq!(
            out,
            vec![Suggestion {
                display: "*Second".to_string(),
                matched_alias_token: "*Second".to_string(),
                insert_text: "*Second".to_string(),
            }]
        );
    }

    #[test]
    fn subword_without_matches_gives_nothing() {
        assert!(suggest(&sample_tree(), "*thi").is_empty());
    }

    #[test]
    fn subword_without_star_still_filters() {
        assert_eq!(tokens(&suggest(&sample_tree(), "Fir")), vec!["*First"]);
        assert_eq!(tokens(&suggest(&sample_tree(), "sec")), vec!["*Second"]);
    }

    #[test]
    fn star_after_text_and_space_suggests_all_tags() {
        let out = suggest(&sample_tree(), "Some message *");
        assert_eq!(out.len(), ALL_TAGS.len());
        assert_eq!(out[0].insert_text, "Some message *All");
        assert_eq!(out[0].display, "Some message *All");
        assert_eq!(out[0].matched_alias_token, "*All");
    }

    #[test]
    fn star_glued_to_text_suggests_nothing() {
        assert!(suggest(&sample_tree(), "Some message*").is_empty());
        assert!(suggest(&sample_tree(), "Some text*").is_empty());
    }

    #[test]
    fn preserves_leading_text_when_filtering() {
        let out = suggest(&sample_tree(), "Some text *Se");
        assert_eq!(texts(&out), vec!["Some text *Second"]);
    }

    #[test]
    fn previous_tags_are_kept_in_the_prefix() {
        let out = suggest(&sample_tree(), "*first *");
        assert_eq!(out.len(), ALL_TAGS.len());
        assert_eq!(out[3].insert_text, "*first *First");

        let out = suggest(&sample_tree(), "*first *a");
        assert_eq!(texts(&out), vec!["*first *All"]);
    }

    #[test]
    fn trailing_whitespace_is_not_part_of_the_token() {
        let out = suggest(&sample_tree(), "hello *sec ");
        assert_eq!(texts(&out), vec!["hello *Second"]);
    }

    #[test]
    fn filter_is_substring_not_prefix() {
        // "Digit" appears inside three aliases.
        assert_eq!(
            tokens(&suggest(&sample_tree(), "digit")),
            vec!["*DoubleDigit", "*SingleDigit", "*TripleDigit"]
        );
    }

    #[test]
    fn empty_tree_suggests_nothing() {
        assert!(suggest(&ChatTree::default(), "").is_empty());
    }
}
