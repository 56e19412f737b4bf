//! Content Structurer: raw page text → typed content blocks.
//!
//! One reasoning call per page, in page order. The model classifies and
//! segments the page and is instructed to drop running headers, footers,
//! and page numbers entirely. A page whose call or parse fails degrades to
//! a single `unknown` block carrying the original text — structuring never
//! aborts a run.
//!
//! Block page numbers are stamped from the input chunk, not trusted from
//! the model, so every emitted block provably belongs to the page it was
//! derived from.

use crate::model::{BlockKind, RawPage, StructuredBlock};
use crate::prompts;
use crate::reasoning::{self, TextGenerator};
use tracing::{debug, info, warn};

/// Structure all pages, preserving input page order.
pub async fn structure_pages(
    generator: &dyn TextGenerator,
    pages: &[RawPage],
) -> Vec<StructuredBlock> {
    let mut blocks = Vec::new();
    for page in pages {
        blocks.extend(structure_page(generator, page).await);
    }
    info!(
        "Structured {} pages into {} blocks",
        pages.len(),
        blocks.len()
    );
    blocks
}

/// Structure one page; always returns blocks, degrading on any failure.
async fn structure_page(generator: &dyn TextGenerator, page: &RawPage) -> Vec<StructuredBlock> {
    let prompt = prompts::structure_page(page.page, &page.content);

    let reply = match generator.generate(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(
                "Structuring call failed for page {}: {}; keeping raw text as unknown block",
                page.page, e
            );
            return vec![degraded_block(page)];
        }
    };

    match reasoning::parse_json_array::<StructuredBlock>(&reply) {
        Ok(mut blocks) => {
            // The page number comes from the chunk, never from the model.
            for block in &mut blocks {
                block.page = page.page;
            }
            debug!("Page {} structured into {} blocks", page.page, blocks.len());
            blocks
        }
        Err(e) => {
            warn!(
                "Structuring reply for page {} unparseable: {}; keeping raw text as unknown block",
                page.page, e
            );
            vec![degraded_block(page)]
        }
    }
}

fn degraded_block(page: &RawPage) -> StructuredBlock {
    StructuredBlock {
        page: page.page,
        kind: BlockKind::Unknown,
        text: page.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasoningError;
    use crate::reasoning::testing::ScriptedGenerator;

    fn page(n: u32, content: &str) -> RawPage {
        RawPage {
            page: n,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn classifies_page_and_drops_running_header() {
        // The model reply for a page whose running header was excluded.
        let reply = r#"```json
[
  {"page": 3, "type": "header", "content": "Introduction"},
  {"page": 3, "type": "paragraph", "content": "CNNs are used for images."}
]
```"#;
        let generator = ScriptedGenerator::replying(&[reply]);
        let pages = [page(3, "Page 3 of 10\nIntroduction\nCNNs are used for images.")];

        let blocks = structure_pages(&generator, &pages).await;

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Header);
        assert_eq!(blocks[0].text, "Introduction");
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
        assert!(blocks.iter().all(|b| b.page == 3));
    }

    #[tokio::test]
    async fn failed_page_degrades_to_unknown_block() {
        let generator = ScriptedGenerator::new(vec![Err(ReasoningError::EmptyReply)]);
        let pages = [page(1, "original text survives")];

        let blocks = structure_pages(&generator, &pages).await;

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Unknown);
        assert_eq!(blocks[0].text, "original text survives");
        assert_eq!(blocks[0].page, 1);
    }

    #[tokio::test]
    async fn unparseable_reply_degrades_only_its_page() {
        let generator = ScriptedGenerator::replying(&[
            "not json at all",
            r#"[{"page": 2, "type": "paragraph", "content": "fine"}]"#,
        ]);
        let pages = [page(1, "broken page"), page(2, "good page")];

        let blocks = structure_pages(&generator, &pages).await;

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Unknown);
        assert_eq!(blocks[0].page, 1);
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
        assert_eq!(blocks[1].page, 2);
    }

    #[tokio::test]
    async fn page_numbers_are_stamped_from_input_not_model() {
        // Model claims page 99; the chunk says page 4.
        let generator =
            ScriptedGenerator::replying(&[r#"[{"page": 99, "type": "list", "content": "- a"}]"#]);
        let pages = [page(4, "- a")];

        let blocks = structure_pages(&generator, &pages).await;

        assert_eq!(blocks[0].page, 4);
    }

    #[tokio::test]
    async fn pages_processed_in_order_with_one_prompt_each() {
        let generator = ScriptedGenerator::replying(&["[]", "[]", "[]"]);
        let pages = [page(1, "one"), page(2, "two"), page(3, "three")];

        let blocks = structure_pages(&generator, &pages).await;

        assert!(blocks.is_empty());
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("Page number: 1"));
        assert!(prompts[2].contains("Page number: 3"));
    }
}
