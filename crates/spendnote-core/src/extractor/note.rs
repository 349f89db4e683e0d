//! Residual note text

/// Text left after removing the amount span, with symbol runs collapsed
///
/// Letters and digits (any script) are kept. Apostrophes and hyphens survive
/// only between two kept characters ("Joe's", "e-bike"). Everything else
/// (punctuation, symbols, emoji, whitespace) becomes a single space. Returns
/// `None` when nothing is left.
pub(crate) fn residual_note(text: &str, removed: Option<(usize, usize)>) -> Option<String> {
    let residual = match removed {
        Some((start, end)) => format!("{} {}", &text[..start], &text[end..]),
        None => text.to_string(),
    };

    let chars: Vec<char> = residual.chars().collect();
    let mut note = String::with_capacity(residual.len());
    let mut pending_space = false;

    for (i, &c) in chars.iter().enumerate() {
        let keep = c.is_alphanumeric()
            || (is_joiner(c)
                && i > 0
                && chars[i - 1].is_alphanumeric()
                && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric()));

        if keep {
            if pending_space && !note.is_empty() {
                note.push(' ');
            }
            pending_space = false;
            note.push(c);
        } else {
            pending_space = true;
        }
    }

    if note.is_empty() {
        None
    } else {
        Some(note)
    }
}

fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '’' | '-')
}
