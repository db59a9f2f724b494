//! Paragraph-boundary chunking with overlap
//!
//! Pages and text files larger than the character budget are split so each
//! chunk stays embeddable. Splits prefer paragraph boundaries; oversized
//! paragraphs fall back to a hard character split. Adjacent chunks share an
//! overlap tail so answers near a boundary keep their surroundings.

/// Split `text` into chunks of at most `max_chars` characters with
/// `overlap` characters carried between adjacent chunks.
///
/// Invariant: joins on char boundaries only, never inside a code point.
pub fn split_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let overlap = overlap.min(max_chars / 2);

    if char_len(text) <= max_chars {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    // True while `current` holds nothing beyond a carried overlap tail;
    // a seed on its own is never emitted as a chunk
    let mut seed_only = true;

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        // Paragraph alone exceeds the budget: flush and hard-split it
        if char_len(paragraph) > max_chars {
            if !seed_only {
                chunks.push(current.trim().to_string());
            }
            for piece in hard_split(paragraph, max_chars, overlap) {
                chunks.push(piece);
            }
            current = chunks
                .last()
                .map(|c| tail_chars(c, overlap))
                .unwrap_or_default();
            seed_only = true;
            continue;
        }

        let sep = if current.is_empty() { 0 } else { 2 };
        if char_len(&current) + sep + char_len(paragraph) > max_chars {
            if !seed_only {
                let finished = current.trim().to_string();
                let seed = tail_chars(&finished, overlap);
                chunks.push(finished);
                current = seed;
                seed_only = true;
            }
            // The seed plus this paragraph may still exceed the budget;
            // the paragraph then starts a chunk without the overlap
            if char_len(&current) + 2 + char_len(paragraph) > max_chars {
                current.clear();
            }
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
        seed_only = false;
    }

    if !seed_only && !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

/// Hard split on character boundaries for paragraphs that exceed the budget
fn hard_split(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = max_chars.saturating_sub(overlap).max(1);

    let mut pieces = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim().to_string();
        if !piece.is_empty() {
            pieces.push(piece);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`, on a char boundary
fn tail_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = char_len(s);
    if total <= n {
        return s.to_string();
    }
    s.chars().skip(total - n).collect()
}
