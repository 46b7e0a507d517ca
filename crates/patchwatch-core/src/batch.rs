//! Message batching
//!
//! Renders change records into a sequence of message chunks, each within
//! a transport byte budget. Records are sorted by publish time first:
//! recipients read the notification as a chronological changelog, so the
//! ordering is a displayed contract, not an implementation detail.

use crate::detector::ChangeRecord;

/// Header prepended to the first chunk
const CHUNK_HEADER: &str = "```\nGame updates\n────────────────────\n";

/// Header for continuation chunks
const CHUNK_HEADER_CONT: &str = "```\nGame updates (cont.)\n────────────────────\n";

/// Closing delimiter appended to every chunk
const CHUNK_FOOTER: &str = "```";

/// One rendered notification message
///
/// `text().len() <= max_chunk_bytes` whenever the budget can hold the
/// header, the longest single line and the footer together. A record
/// line is never split across chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChunk {
    text: String,
    line_count: usize,
}

impl MessageChunk {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Serialized size in bytes
    pub fn len_bytes(&self) -> usize {
        self.text.len()
    }

    /// Number of record lines in this chunk
    pub fn line_count(&self) -> usize {
        self.line_count
    }
}

/// Partition records into size-bounded chunks
///
/// - records are sorted by `published_at` ascending (stable for ties);
/// - every record appears in exactly one chunk, in order;
/// - an empty input yields zero chunks (no empty notification).
pub fn render_chunks(records: &[ChangeRecord], max_chunk_bytes: usize) -> Vec<MessageChunk> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&ChangeRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.published_at);

    let mut chunks = Vec::new();
    let mut current = String::from(CHUNK_HEADER);
    let mut lines_in_current = 0usize;

    for record in sorted {
        let line = format!("{}\n", record.render_line());

        if lines_in_current > 0
            && current.len() + line.len() + CHUNK_FOOTER.len() > max_chunk_bytes
        {
            current.push_str(CHUNK_FOOTER);
            chunks.push(MessageChunk {
                text: std::mem::replace(&mut current, String::from(CHUNK_HEADER_CONT)),
                line_count: lines_in_current,
            });
            lines_in_current = 0;
        }

        if lines_in_current == 0
            && current.len() + line.len() + CHUNK_FOOTER.len() > max_chunk_bytes
        {
            // A single line that cannot fit an empty chunk goes out alone
            // and oversized; the channel may reject it, which surfaces in
            // the delivery report rather than silently dropping the record.
            tracing::warn!(
                app = %record.app_id,
                line_bytes = line.len(),
                max_chunk_bytes,
                "record line exceeds chunk budget on its own"
            );
        }

        current.push_str(&line);
        lines_in_current += 1;
    }

    if lines_in_current > 0 {
        current.push_str(CHUNK_FOOTER);
        chunks.push(MessageChunk {
            text: current,
            line_count: lines_in_current,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::feed_fetcher::AppId;
    use chrono::{TimeZone, Utc};

    fn record(app: u64, name: &str, build: &str, hour: u32) -> ChangeRecord {
        ChangeRecord {
            app_id: AppId(app),
            display_name: name.to_string(),
            build_id: build.to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_input_yields_zero_chunks() {
        assert!(render_chunks(&[], 4_000).is_empty());
    }

    #[test]
    fn single_chunk_carries_all_lines_in_time_order() {
        // Input deliberately out of publish order
        let records = vec![
            record(2, "Later", "b2", 12),
            record(1, "Earlier", "b1", 8),
            record(3, "Middle", "b3", 10),
        ];

        let chunks = render_chunks(&records, 4_000);
        assert_eq!(chunks.len(), 1);

        let text = chunks[0].text();
        let earlier = text.find("Earlier").unwrap();
        let middle = text.find("Middle").unwrap();
        let later = text.find("Later").unwrap();
        assert!(earlier < middle && middle < later);
        assert_eq!(chunks[0].line_count(), 3);
        assert!(text.starts_with("```\n"));
        assert!(text.ends_with("```"));
    }

    #[test]
    fn oversized_input_splits_without_breaking_lines() {
        // Three ~1.5 KB lines against a 4 KB budget: exactly two chunks,
        // two lines in the first, one in the continuation.
        let big_name = "x".repeat(1_450);
        let records = vec![
            record(1, &big_name, "b1", 8),
            record(2, &big_name, "b2", 9),
            record(3, &big_name, "b3", 10),
        ];

        let chunks = render_chunks(&records, 4_000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].line_count(), 2);
        assert_eq!(chunks[1].line_count(), 1);
        assert!(chunks[1].text().contains("(cont.)"));

        for chunk in &chunks {
            assert!(chunk.len_bytes() <= 4_000, "chunk exceeds budget");
            assert!(chunk.text().ends_with("```"));
        }
    }

    #[test]
    fn every_record_appears_exactly_once_across_chunks() {
        let records: Vec<ChangeRecord> = (0..40)
            .map(|i| record(i, &format!("Game{}", i), &format!("b{}", i), (i % 24) as u32))
            .collect();

        let chunks = render_chunks(&records, 300);
        let combined: String = chunks.iter().map(|c| c.text()).collect();

        for r in &records {
            let needle = format!("[GAME][{}] ", r.app_id);
            assert_eq!(
                combined.matches(&needle).count(),
                1,
                "record {} must appear exactly once",
                r.app_id
            );
        }

        let total_lines: usize = chunks.iter().map(|c| c.line_count()).sum();
        assert_eq!(total_lines, records.len());
        for chunk in &chunks {
            assert!(chunk.len_bytes() <= 300);
        }
    }

    #[test]
    fn byte_budget_counts_bytes_not_chars() {
        // Multibyte names: budget accounting must use encoded length.
        let records = vec![
            record(1, &"游".repeat(40), "b1", 8),
            record(2, &"戏".repeat(40), "b2", 9),
        ];

        let chunks = render_chunks(&records, 260);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len_bytes() <= 260);
        }
    }
}
