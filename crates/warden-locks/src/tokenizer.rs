//! Permission string tokenizer
//!
//! Splits a raw permission string into entries on `,` while keeping the
//! argument lists of function calls such as `attr_gt(level, 10)` intact.

/// Split `raw` on `separator`, re-joining pieces while a `(` is still open.
///
/// Each piece is appended to the current entry (with `joiner` between them)
/// as long as the entry has seen more `(` than `)`. An entry left unbalanced
/// at the end of input is kept as-is. Entries are trimmed and empty entries
/// are dropped.
pub(crate) fn split_balanced<'a, I>(pieces: I, joiner: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries: Vec<String> = Vec::new();
    let mut depth: i64 = 0;

    for piece in pieces {
        match entries.last_mut() {
            Some(current) if depth > 0 => {
                current.push_str(joiner);
                current.push_str(piece);
            }
            _ => {
                depth = 0;
                entries.push(piece.to_string());
            }
        }
        depth += paren_balance(piece);
    }

    entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Count of `(` minus count of `)` in `text`
pub(crate) fn paren_balance(text: &str) -> i64 {
    text.chars().fold(0, |acc, ch| match ch {
        '(' => acc + 1,
        ')' => acc - 1,
        _ => acc,
    })
}

/// Tokenize a permission string into its entries
///
/// Splits on `,` but never inside an open parenthesis, so
/// `"edit: attr_ge(level, 10), Builders"` yields two entries.
pub fn tokenize(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    split_balanced(raw.split(','), ",")
}

/// Tokenize an already split sequence of entries
///
/// The entries are taken as they are apart from trimming; blank entries are
/// dropped. Tokenizing the output of [`tokenize`] this way is the identity.
pub fn tokenize_entries<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.as_ref().trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Join entries back into a permission string
pub fn join(entries: &[String]) -> String {
    entries.join(",")
}
