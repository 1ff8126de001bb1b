// src/utils/html.rs

use std::collections::HashSet;

use ammonia::Builder;

/// Strips unsafe markup from admin-entered free text (exam descriptions)
/// before it is stored.
///
/// Whitelist based: harmless tags such as `<b>` survive, `<script>` is
/// removed together with its content. Surrounding whitespace is trimmed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}

/// Reduces admin-entered text to plain text (exam and note titles).
///
/// Every tag is dropped, `<script>` and `<style>` with their content.
/// The entities the sanitizer writes are decoded again, so `Q&A` is stored
/// as typed.
pub fn clean_text(input: &str) -> String {
    let stripped = Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input.trim())
        .to_string();

    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
