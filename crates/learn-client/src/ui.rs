use serde_json::Value;
use std::io::{self, Write};

/// Characters of a tool result shown before the preview is cut off.
pub const RESULT_PREVIEW_CHARS: usize = 500;

/// Get a human-readable display name for a tool
pub fn get_tool_display_name(tool_name: &str) -> String {
    match tool_name {
        "microsoft_docs_search" => "Docs Search".to_string(),
        "microsoft_docs_fetch" => "Docs Fetch".to_string(),
        "microsoft_code_sample_search" => "Code Sample Search".to_string(),

        // snake_case to Title Case
        _ => tool_name
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Get an appropriate emoji for a tool category
pub fn get_tool_emoji(tool_name: &str) -> &'static str {
    match tool_name {
        "microsoft_docs_search" | "microsoft_code_sample_search" => "🔍",
        "microsoft_docs_fetch" => "📄",
        _ => "🔧",
    }
}

pub fn format_tool_call(tool_name: &str, args: &Value) -> String {
    let pretty = serde_json::to_string_pretty(args).unwrap_or_else(|_| args.to_string());
    format!(
        "🔧 Calling tool: {tool_name}\n{} {}\n   Arguments: {pretty}",
        get_tool_emoji(tool_name),
        get_tool_display_name(tool_name)
    )
}

/// Cut `text` to [`RESULT_PREVIEW_CHARS`] characters, marking the cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn format_tool_result(text: &str) -> String {
    format!("   Result preview: {}", preview(text))
}

/// Display a tool call before it is sent
pub fn display_tool_call(tool_name: &str, args: &Value) {
    println!("\n{}", format_tool_call(tool_name, args));
    let _ = io::stdout().flush();
}

/// Display the text a tool returned
pub fn display_tool_result(_tool_name: &str, text: &str) {
    println!("{}\n", format_tool_result(text));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_names() {
        assert_eq!(get_tool_display_name("microsoft_docs_search"), "Docs Search");
        assert_eq!(get_tool_display_name("some_new_tool"), "Some New Tool");
    }

    #[test]
    fn test_format_tool_call_includes_pretty_arguments() {
        let formatted = format_tool_call("microsoft_docs_search", &json!({"query": "blob"}));
        assert!(formatted.starts_with("🔧 Calling tool: microsoft_docs_search"));
        assert!(formatted.contains("\"query\": \"blob\""));
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        let short = "short result";
        assert_eq!(preview(short), short);

        let long = "é".repeat(RESULT_PREVIEW_CHARS + 10);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), RESULT_PREVIEW_CHARS + 3);
    }
}
