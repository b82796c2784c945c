//! Text rendering of retrieved chunks for the agent.

use crate::storage::DocumentChunk;

/// Visible separator placed between retrieved blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Title used when a row carries none.
pub const DEFAULT_TITLE: &str = "Documentation";

const TITLE_SEPARATOR: &str = " - ";

/// Canonical document title: everything before the first `" - "`.
///
/// Ingestion stores compound titles such as `"Hooks - React Docs"`. This cut
/// is a fixed normalisation step; a title that legitimately contains `" - "`
/// loses its tail.
pub fn canonical_title(raw: &str) -> &str {
    let main = match raw.find(TITLE_SEPARATOR) {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let main = main.trim();
    if main.is_empty() { DEFAULT_TITLE } else { main }
}

fn heading(title: &str, label: &str, url: &str) -> String {
    format!("# {} ({label})\n\nSource: {url}", canonical_title(title))
}

/// One self-contained retrieval block: heading, source line, content.
pub fn format_block(chunk: &DocumentChunk, label: &str) -> String {
    format!(
        "{}\n\n{}",
        heading(&chunk.title, label, &chunk.url),
        chunk.content
    )
}

/// A full page: heading followed by every chunk's content, blank-line separated.
pub fn format_page<'a, I>(title: &str, label: &str, url: &str, contents: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parts = vec![heading(title, label, url)];
    parts.extend(contents.into_iter().map(str::to_string));
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(title: &str) -> DocumentChunk {
        DocumentChunk {
            url: "https://react.dev/reference/react/hooks".into(),
            chunk_index: 0,
            title: title.into(),
            summary: String::new(),
            content: "Hooks let you use different React features.".into(),
            metadata: serde_json::Value::Null,
            embedding: None,
        }
    }

    #[test]
    fn test_canonical_title() {
        assert_eq!(canonical_title("Hooks - React Docs"), "Hooks");
        assert_eq!(canonical_title("A - B - C"), "A");
        assert_eq!(canonical_title("Plain"), "Plain");
        assert_eq!(canonical_title("Self-Contained"), "Self-Contained");
        assert_eq!(canonical_title(""), "Documentation");
        assert_eq!(canonical_title(" - Only Suffix"), "Documentation");
    }

    #[test]
    fn test_format_block() {
        assert_eq!(
            format_block(&chunk("Hooks - React Docs"), "Web"),
            "# Hooks (Web)\n\n\
             Source: https://react.dev/reference/react/hooks\n\n\
             Hooks let you use different React features."
        );
    }

    #[test]
    fn test_format_page() {
        let page = format_page(
            "Built-in Hooks - React",
            "Web",
            "https://react.dev/reference/react/hooks",
            ["zero", "one"],
        );
        assert_eq!(
            page,
            "# Built-in Hooks (Web)\n\n\
             Source: https://react.dev/reference/react/hooks\n\n\
             zero\n\n\
             one"
        );
    }
}
