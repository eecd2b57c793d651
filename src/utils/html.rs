// src/utils/html.rs

/// Sanitises free-text fields (descriptions, remarks, qualification) before
/// they are stored.
///
/// Whitelist-based: safe inline tags survive, `<script>` and event-handler
/// attributes are stripped. Plain text is stored as typed, so `&` and `<`
/// come back unescaped; escaping is the renderer's job. Not applied to
/// question statements or options, whose exact text takes part in answer
/// matching.
pub fn clean_text(input: &str) -> String {
    unescape_entities(&ammonia::clean(input.trim()))
}

/// Reverts the entities the sanitiser's serializer writes for plain text.
/// `&amp;` goes last so escaped ampersands never combine into new entities.
fn unescape_entities(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
