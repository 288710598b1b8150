use crate::text_metrics;

use super::TextBlock;

/// Wraps a node label into lines no wider than `max_width`.
///
/// Lines break at whitespace and after hyphens. A single word wider than the
/// limit stays on its own line.
pub(super) fn wrap_label(
    text: &str,
    max_width: f32,
    font_size: f32,
    line_height: f32,
    font_family: &str,
    fast_metrics: bool,
) -> TextBlock {
    let words = split_words(text);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in words {
        let candidate = join_word(&current, &word);
        if current.is_empty()
            || text_width(&candidate, font_size, font_family, fast_metrics) <= max_width
        {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    single_block(lines, font_size, line_height, font_family, fast_metrics)
}

pub(super) fn unwrapped_label(
    text: &str,
    font_size: f32,
    line_height: f32,
    font_family: &str,
    fast_metrics: bool,
) -> TextBlock {
    single_block(
        vec![text.trim().to_string()],
        font_size,
        line_height,
        font_family,
        fast_metrics,
    )
}

fn single_block(
    lines: Vec<String>,
    font_size: f32,
    line_height: f32,
    font_family: &str,
    fast_metrics: bool,
) -> TextBlock {
    let width = lines
        .iter()
        .map(|line| text_width(line, font_size, font_family, fast_metrics))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font_size * line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

/// Words in reading order; a hyphenated word contributes each part with its
/// trailing hyphen kept.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for token in text.split_whitespace() {
        let mut rest = token;
        while let Some(pos) = rest.find('-') {
            let (head, tail) = rest.split_at(pos + 1);
            words.push(head.to_string());
            rest = tail;
        }
        if !rest.is_empty() {
            words.push(rest.to_string());
        }
    }
    words
}

fn join_word(current: &str, word: &str) -> String {
    if current.is_empty() {
        word.to_string()
    } else if current.ends_with('-') {
        format!("{current}{word}")
    } else {
        format!("{current} {word}")
    }
}

pub(super) fn text_width(text: &str, font_size: f32, font_family: &str, fast_metrics: bool) -> f32 {
    if !fast_metrics
        && let Some(width) = text_metrics::measure_text_width(text, font_size, font_family)
    {
        return width;
    }
    estimate_width(text, font_size)
}

fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(|ch| char_width_factor(ch) * font_size).sum()
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 0.27,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.88,
        'A'..='Z' => 0.66,
        '0'..='9' => 0.6,
        _ => 0.56,
    }
}
