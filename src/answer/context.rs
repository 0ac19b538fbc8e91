//! Context formatting for grounded answers.

use crate::chunking::Chunk;
use crate::index::SearchHit;

/// Format retrieved chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "---\n[{}] Report excerpt #{}\n{}\n---",
                i + 1,
                chunk.ordinal + 1,
                chunk.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format search hits for display to the user.
pub fn format_hits_for_display(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Report excerpt #{} (score: {:.2})",
                hit.chunk.ordinal + 1,
                hit.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context() {
        let chunks = vec![
            Chunk::new(4, "One person enters the cage.\n".to_string(), 0, 0),
            Chunk::new(0, "No people.".to_string(), 0, 0),
        ];
        assert_eq!(
            format_context_for_prompt(&chunks),
            "---\n[1] Report excerpt #5\nOne person enters the cage.\n---\n\n---\n[2] Report excerpt #1\nNo people.\n---"
        );
        assert_eq!(format_context_for_prompt(&[]), "");
    }

    #[test]
    fn test_format_hits() {
        let hits = vec![SearchHit {
            chunk: Chunk::new(2, "x".to_string(), 0, 0),
            score: 0.876,
        }];
        assert_eq!(format_hits_for_display(&hits), "Report excerpt #3 (score: 0.88)");
    }
}
