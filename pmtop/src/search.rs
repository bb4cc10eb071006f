//! Client-side ranked filtering and highlight spans over log lines.
//!
//! Queries are always literal text; no pattern syntax is interpreted, so a
//! search for `a.b` only ever matches a literal `a.b`.

/// One piece of a highlighted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Filter `lines` against `query`, case-insensitively.
///
/// An empty query returns every line untouched. Otherwise lines containing
/// the query as one contiguous run rank above lines that only match it as a
/// spread-out character subsequence; within each rank the original order is
/// kept, and lines matching neither way are dropped.
pub fn filter<'a, S: AsRef<str>>(lines: &'a [S], query: &str) -> Vec<&'a str> {
    if query.is_empty() {
        return lines.iter().map(|l| l.as_ref()).collect();
    }
    let mut contiguous = Vec::new();
    let mut scattered = Vec::new();
    for line in lines {
        let line = line.as_ref();
        if find_literal(line, query, 0).is_some() {
            contiguous.push(line);
        } else if is_subsequence(line, query) {
            scattered.push(line);
        }
    }
    contiguous.append(&mut scattered);
    contiguous
}

/// Split `line` into alternating plain/matched chunks, where matched chunks
/// are exact case-insensitive occurrences of `query`. An empty query yields
/// the whole line as a single plain chunk.
pub fn highlight<'a>(line: &'a str, query: &str) -> Vec<Chunk<'a>> {
    if query.is_empty() {
        return vec![Chunk {
            text: line,
            matched: false,
        }];
    }
    let mut chunks = Vec::new();
    let mut cursor = 0;
    while let Some((start, end)) = find_literal(line, query, cursor) {
        if start > cursor {
            chunks.push(Chunk {
                text: &line[cursor..start],
                matched: false,
            });
        }
        chunks.push(Chunk {
            text: &line[start..end],
            matched: true,
        });
        cursor = end;
    }
    if cursor < line.len() || chunks.is_empty() {
        chunks.push(Chunk {
            text: &line[cursor..],
            matched: false,
        });
    }
    chunks
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

// First case-insensitive occurrence of `needle` in `hay` at or after byte
// offset `from` (which must sit on a char boundary). Returns the byte range
// of the matched span in `hay`.
fn find_literal(hay: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let tail = hay.get(from..)?;
    for (start, _) in tail.char_indices() {
        if let Some(len) = match_at(&tail[start..], needle) {
            return Some((from + start, from + start + len));
        }
    }
    None
}

// Byte length of a case-insensitive match of `needle` at the start of `hay`.
fn match_at(hay: &str, needle: &str) -> Option<usize> {
    let mut hay_chars = hay.char_indices();
    let mut end = 0;
    for n in needle.chars() {
        let (idx, h) = hay_chars.next()?;
        if !chars_eq_ci(h, n) {
            return None;
        }
        end = idx + h.len_utf8();
    }
    Some(end)
}

// True when every char of `needle` appears in `hay` in order, not
// necessarily adjacent.
fn is_subsequence(hay: &str, needle: &str) -> bool {
    let mut wanted = needle.chars();
    let mut want = match wanted.next() {
        Some(c) => c,
        None => return true,
    };
    for h in hay.chars() {
        if chars_eq_ci(h, want) {
            match wanted.next() {
                Some(c) => want = c,
                None => return true,
            }
        }
    }
    false
}
