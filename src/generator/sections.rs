//! Semantic section extraction
//!
//! Splits a page into its top-level landmark elements so each can be
//! regenerated on its own. Nested landmarks stay inside their outermost
//! ancestor; a page without landmarks falls back to the body's direct `div`s.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::constants::generation as gen_constants;
use crate::types::Chunk;

static SECTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&gen_constants::SECTION_TAGS.join(", "))
        .expect("Failed to parse section selector")
});

static BODY_DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body > div").expect("Failed to parse body div selector"));

/// Extracts section chunks from a page
pub struct SectionSplitter;

impl SectionSplitter {
    /// Outer HTML of every top-level section, in document order
    pub fn split(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let sections: Vec<String> = document
            .select(&SECTION_SELECTOR)
            .filter(|element| !has_section_ancestor(element))
            .map(|element| element.html())
            .collect();

        if !sections.is_empty() {
            debug!(count = sections.len(), "Found semantic sections");
            return sections;
        }

        let divs: Vec<String> = document
            .select(&BODY_DIV_SELECTOR)
            .map(|element| element.html())
            .collect();

        debug!(count = divs.len(), "No semantic sections, using top-level divs");
        divs
    }

    /// Sections wrapped as a numbered chunk batch
    pub fn split_chunks(html: &str) -> Vec<Chunk> {
        Chunk::batch(Self::split(html))
    }
}

fn has_section_ancestor(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            gen_constants::SECTION_TAGS.contains(&ancestor.value().name())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outermost_sections_in_order() {
        let html = r#"<html><body>
            <header><nav><a href="/">Home</a></nav></header>
            <main><section id="a">A</section><article>B</article></main>
            <footer>F</footer>
        </body></html>"#;

        let sections = SectionSplitter::split(html);
        assert_eq!(sections.len(), 3);
        assert!(sections[0].starts_with("<header>"));
        assert!(sections[0].contains("<nav>"));
        assert!(sections[1].starts_with("<main>"));
        assert!(sections[1].contains(r#"<section id="a">"#));
        assert!(sections[2].starts_with("<footer>"));
    }

    #[test]
    fn test_sibling_sections_are_separate() {
        let html = "<body><section>one</section><section>two</section></body>";
        let sections = SectionSplitter::split(html);
        assert_eq!(sections, vec!["<section>one</section>", "<section>two</section>"]);
    }

    #[test]
    fn test_falls_back_to_body_divs() {
        let html = "<body><div class=\"a\"><div>inner</div></div><div>b</div><p>c</p></body>";
        let sections = SectionSplitter::split(html);
        assert_eq!(sections.len(), 2);
        assert!(sections[0].starts_with("<div class=\"a\">"));
        assert_eq!(sections[1], "<div>b</div>");
    }

    #[test]
    fn test_no_sections_at_all() {
        let html = "<body><p>Just text</p><span>more</span></body>";
        assert!(SectionSplitter::split(html).is_empty());
        assert!(SectionSplitter::split_chunks(html).is_empty());
    }

    #[test]
    fn test_split_chunks_numbers_sections() {
        let html = "<body><nav>n</nav><footer>f</footer></body>";
        let chunks = SectionSplitter::split_chunks(html);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].total, 2);
    }
}
