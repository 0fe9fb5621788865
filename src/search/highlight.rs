use std::ops::Range;
use crate::core::config::HighlightConfig;

/// Builds a bounded excerpt of `text` with every range wrapped in markers.
///
/// Ranges are byte offsets into `text`; the window is measured in chars. The
/// window opens at most `max_prefix` chars before the first match and spans at
/// most `max_length` chars. A match cut by the window end is closed at the cut,
/// so markers always come in pairs. The prefix never takes the whole window,
/// so the first match always shows. Returns `None` when there is nothing to
/// emphasize.
pub fn highlight(
    text: &str,
    before: &str,
    after: &str,
    ranges: &[Range<usize>],
    config: HighlightConfig,
) -> Option<String> {
    if text.is_empty() || ranges.is_empty() {
        return None;
    }

    // byte offset of every char boundary, including the end of text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = boundaries.len() - 1;
    let to_char = |byte: usize| boundaries.partition_point(|&b| b < byte).min(total);

    let merged = merge_ranges(
        ranges
            .iter()
            .map(|r| to_char(r.start)..to_char(r.end))
            .filter(|r| r.start < r.end),
    );
    let first = merged.first()?.start;

    let prefix = config.max_prefix.min(config.max_length.saturating_sub(1));
    let window_start = first
        .saturating_sub(prefix)
        .min(total.saturating_sub(config.max_length));
    let window_end = (window_start + config.max_length).min(total);
    let slice = |from: usize, to: usize| &text[boundaries[from]..boundaries[to]];

    let mut excerpt = String::new();
    let mut cursor = window_start;
    let mut emphasized = false;
    for range in merged {
        let start = range.start.max(window_start);
        let end = range.end.min(window_end);
        if start >= window_end {
            break;
        }
        if end <= start {
            continue;
        }

        excerpt.push_str(slice(cursor, start));
        excerpt.push_str(before);
        excerpt.push_str(slice(start, end));
        excerpt.push_str(after);
        cursor = end;
        emphasized = true;
    }
    if !emphasized {
        return None;
    }
    excerpt.push_str(slice(cursor, window_end));

    Some(excerpt)
}

/// Sorts ranges and merges the overlapping or touching ones.
fn merge_ranges<I>(ranges: I) -> Vec<Range<usize>>
where
    I: IntoIterator<Item = Range<usize>>,
{
    let mut sorted: Vec<Range<usize>> = ranges.into_iter().collect();
    sorted.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}
