use kbqa_vector_store::{QueryResult, ScoredItem};

/// Characters of each passage shown in the human-readable report.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 200;

pub fn render_query_result(result: &QueryResult, max_text_chars: usize) -> String {
    let mut out = String::new();
    for (question, items) in result.iter() {
        out.push_str(&render_question(question, items, max_text_chars));
    }
    out
}

pub fn render_question(question: &str, items: &[ScoredItem], max_text_chars: usize) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    out.push_str(&format!("\n{rule}\n"));
    out.push_str(&format!("Question : {question}\n"));
    out.push_str(&format!("{rule}\n"));
    out.push_str("Most relative chunks :\n");
    for (idx, item) in items.iter().enumerate() {
        out.push_str(&format!("\n  {}. Similarity : {:.4}\n", idx + 1, item.similarity));
        out.push_str(&format!(
            "     Content : {}\n",
            truncate_chars(&item.text, max_text_chars)
        ));
    }
    out.push('\n');
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}
