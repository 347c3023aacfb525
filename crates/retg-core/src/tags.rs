//! Inline `*alias` tags.

/// Marker that turns an alias into a tag inside free text.
pub const TAG_PREFIX: char = '*';

/// Whether `text` references `alias` as a tag.
///
/// Case-insensitive substring test: `*First` also matches inside `*Firstly`.
pub fn has_tag(alias: &str, text: &str) -> bool {
    let needle = format!("{TAG_PREFIX}{}", alias.to_lowercase());
    text.to_lowercase().contains(&needle)
}

/// Whether any alias is tagged in the message text or its caption.
pub fn any_tagged<'a>(
    aliases: impl IntoIterator<Item = &'a String>,
    text: Option<&str>,
    caption: Option<&str>,
) -> bool {
    aliases.into_iter().any(|alias| {
        text.is_some_and(|t| has_tag(alias, t)) || caption.is_some_and(|c| has_tag(alias, c))
    })
}

/// `*alias`, preserving case.
pub fn tag(alias: &str) -> String {
    format!("{TAG_PREFIX}{alias}")
}

/// Space-joined `*alias` list, lower-cased, as shown in replies.
pub fn tag_list(aliases: &[String]) -> String {
    aliases
        .iter()
        .map(|a| tag(&a.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}
