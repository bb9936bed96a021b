/// Separator hierarchy, coarsest first: paragraph, line, sentence, word.
/// A chunk prefers to end just after the coarsest separator that still
/// fits the size bound; otherwise it is cut at the bound.
const SEPARATORS: [&[char]; 4] = [&['\n', '\n'], &['\n'], &['.', ' '], &[' ']];

/// Splits `text` into size-bounded chunks where each chunk after the first
/// repeats the final `overlap` characters of its predecessor.
///
/// Whitespace-only input yields no chunks. Sizes are measured in characters
/// so multi-byte input never splits inside a code point.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let hard_end = (start + chunk_size).min(total);
        let end = if hard_end == total {
            total
        } else {
            // Any break strictly past start + overlap keeps the cursor moving
            // forward, so the loop always terminates.
            natural_break(&chars, start + overlap, hard_end).unwrap_or(hard_end)
        };

        chunks.push(chars[start..end].iter().collect());
        if end == total {
            break;
        }
        start = end - overlap;
    }

    chunks
}

/// Finds the rightmost occurrence of the coarsest separator whose end falls
/// in `(min_end, max_end]`, returning the position just after it.
fn natural_break(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    for separator in SEPARATORS {
        if let Some(end) = last_separator_end(chars, separator, min_end, max_end) {
            return Some(end);
        }
    }
    None
}

fn last_separator_end(
    chars: &[char],
    separator: &[char],
    min_end: usize,
    max_end: usize,
) -> Option<usize> {
    let mut end = max_end;
    while end > min_end {
        if end >= separator.len() && chars[end - separator.len()..end] == *separator {
            return Some(end);
        }
        end -= 1;
    }
    None
}
