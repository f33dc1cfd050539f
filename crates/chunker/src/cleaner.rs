use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_FOOTER_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?m)^.*Header.*$",
        r"(?m)^.*標題.*$",
        r"(?m)^.*Footer.*$",
        r"(?m)^.*頁尾.*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid header/footer pattern"))
    .collect()
});

static NOISE_KEEP_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^A-Za-z0-9\x{4e00}-\x{9fff}\s\.,;:、'"\?!\-\(\)（）]"#)
        .expect("valid noise pattern")
});

static NOISE_STRIP_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9\x{4e00}-\x{9fff}\s]").expect("valid noise pattern"));

static REPEATED_PUNCTUATION: Lazy<[(Regex, &'static str); 3]> = Lazy::new(|| {
    [
        (Regex::new(r"\.{2,}").expect("valid pattern"), "."),
        (Regex::new(r"!{2,}").expect("valid pattern"), "!"),
        (Regex::new(r"\?{2,}").expect("valid pattern"), "?"),
    ]
});

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid blank line pattern"));

static INLINE_SPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+").expect("valid space pattern"));

/// Normalizes scraped page text before it is split and embedded.
#[derive(Debug, Clone, Copy)]
pub struct TextCleaner {
    keep_punctuation: bool,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self {
            keep_punctuation: true,
        }
    }
}

impl TextCleaner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop sentence punctuation as well as symbols.
    #[must_use]
    pub const fn strip_punctuation(mut self) -> Self {
        self.keep_punctuation = false;
        self
    }

    /// Full cleaning pass.
    #[must_use]
    pub fn clean(&self, text: &str) -> String {
        let text = Self::remove_headers_footers(text);
        let text = self.remove_special_characters(&text);
        let text = Self::collapse_repeated_punctuation(&text);
        Self::collapse_whitespace(&text)
    }

    #[must_use]
    pub fn remove_headers_footers(text: &str) -> String {
        let mut out = text.to_string();
        for pattern in HEADER_FOOTER_LINES.iter() {
            out = pattern.replace_all(&out, "").into_owned();
        }
        out.trim().to_string()
    }

    #[must_use]
    pub fn remove_special_characters(&self, text: &str) -> String {
        let pattern = if self.keep_punctuation {
            &*NOISE_KEEP_PUNCTUATION
        } else {
            &*NOISE_STRIP_PUNCTUATION
        };
        pattern.replace_all(text, "").trim().to_string()
    }

    #[must_use]
    pub fn collapse_repeated_punctuation(text: &str) -> String {
        let mut out = text.to_string();
        for (pattern, replacement) in REPEATED_PUNCTUATION.iter() {
            out = pattern.replace_all(&out, *replacement).into_owned();
        }
        out.trim().to_string()
    }

    #[must_use]
    pub fn collapse_whitespace(text: &str) -> String {
        let out = BLANK_LINE_RUNS.replace_all(text, "\n\n");
        let out = INLINE_SPACE_RUNS.replace_all(&out, " ");
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_header_and_footer_lines() {
        let text = "Page Header v2\nReal content\n頁尾 copyright";
        assert_eq!(TextCleaner::remove_headers_footers(text), "Real content");
    }

    #[test]
    fn keeps_cjk_and_sentence_punctuation() {
        let cleaner = TextCleaner::new();
        assert_eq!(
            cleaner.remove_special_characters("配對 AirPods™ (Pro): yes?"),
            "配對 AirPods (Pro): yes?"
        );
    }

    #[test]
    fn strip_mode_drops_punctuation() {
        let cleaner = TextCleaner::new().strip_punctuation();
        assert_eq!(cleaner.remove_special_characters("Reset, now!"), "Reset now");
    }

    #[test]
    fn collapses_repeated_punctuation() {
        assert_eq!(
            TextCleaner::collapse_repeated_punctuation("Wait.... what?? wow!!!"),
            "Wait. what? wow!"
        );
    }

    #[test]
    fn collapses_blank_lines_and_spaces() {
        assert_eq!(
            TextCleaner::collapse_whitespace("a  \t b\n\n\n  \nc"),
            "a b\n\nc"
        );
    }

    #[test]
    fn full_clean_pipeline() {
        let text = "Site Header\n  Open   ★the lid...\n\n\n\nHold the button!!\nFooter links";
        assert_eq!(
            TextCleaner::new().clean(text),
            "Open the lid.\n\nHold the button!"
        );
    }
}
