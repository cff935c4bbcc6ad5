/// Greedily wrap `text` into lines of at most `max_chars` characters.
///
/// Words are never split: a single word longer than `max_chars` gets a line of
/// its own. Whitespace-only input yields no lines. A `max_chars` of zero is
/// treated as one.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let sep = usize::from(current_len > 0);

        if current_len + sep + word_len <= max_chars {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_len += sep + word_len;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
