//! Text measurement and truncation for direct labels.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px` and add a single ellipsis if needed.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        let with_ellipsis = format!("{out}…");
        if estimate_text_width_px(&with_ellipsis, font_px) > max_px {
            out.pop();
            break;
        }
    }
    if out.is_empty() {
        return String::new();
    }
    out.push('…');
    out
}

/// Widest label in pixels, capped at `max_px`.
pub fn widest_label_px<'a>(
    labels: impl IntoIterator<Item = &'a str>,
    font_px: u32,
    max_px: u32,
) -> u32 {
    labels
        .into_iter()
        .map(|l| estimate_text_width_px(l, font_px))
        .max()
        .unwrap_or(0)
        .min(max_px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("GDP", 10, 100), "GDP");
    }

    #[test]
    fn long_text_gets_single_ellipsis() {
        let t = truncate_to_width("Gross domestic product per capita", 10, 60);
        assert!(t.ends_with('…'));
        assert_eq!(t.matches('…').count(), 1);
        assert!(estimate_text_width_px(&t, 10) <= 60);
    }

    #[test]
    fn widest_label_is_capped() {
        assert_eq!(
            widest_label_px(["a", "abcd"], 10, 1000),
            estimate_text_width_px("abcd", 10)
        );
        assert_eq!(widest_label_px(["a", "abcd"], 10, 10), 10);
        assert_eq!(widest_label_px(std::iter::empty(), 10, 10), 0);
    }
}
