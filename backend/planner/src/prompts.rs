//! Prompt construction for every model call CodeDoc makes.

use codedoc_core::ChatTurn;

/// System message for documentation calls, unless replaced by configuration.
pub const DOC_SYSTEM_MESSAGE: &str = "You are a helpful assistant specialized in analyzing source code and generating detailed technical documentation.";

/// Extension used when the model cannot tell what the user wants.
pub const DEFAULT_EXTENSION: &str = ".md";

const DOC_FORMAT_INSTRUCTIONS: &str = "\
Include the following in your documentation:
1. A brief description of what the code does.
2. Any important functions or classes and their purposes.
3. Any important queries and their purposes, including the queries themselves if present.
4. Any notable dependencies or imports.
5. Any potential improvements or best practices that could be applied.
6. A flowchart of the functionality (Mermaid flowchart, without parentheses) ONLY if applicable.
7. An ER diagram of the database schema (Mermaid ER diagram, without parentheses) ONLY if applicable.
8. The document should be well structured and easy to understand.
9. No irrelevant information should be included in the documentation.
10. Copying and pasting the response should be sufficient to get the documentation.
";

const DOC_JSON_INSTRUCTIONS: &str = r#"11. Provide the documentation strictly in JSON format with the following structure:

interface Documentation {
    Description?: string;
    Functions?: Array<{ Name: string; Purpose: string; }>;
    Queries?: Array<string>;
    Dependencies?: Array<{ Module: string; Purpose: string; }>;
    Improvements?: Array<{ Improvement: string; Details: string; }>;
    Flowchart?: Array<{ Heading: string; Chart: string; }>;
    "ER Diagram"?: Array<{ Heading: string; Chart: string; }>;
}
If there is no Flowchart or ER Diagram, provide empty arrays for them.
"#;

/// Natural language to SQL, grounded on the live schema.
pub fn sql_prompt(formatted_schema: &str, natural_language_query: &str) -> String {
    format!(
        "Given the following database schema:\n\
         {formatted_schema}\n\
         Translate the following natural language query into an SQL query compatible with SQLite:\n\
         \"{natural_language_query}\"\n\n\
         Please generate only the SQL query without any additional text or explanation."
    )
}

/// Conversation-aware chat prompt. Prior turns are embedded as JSON.
pub fn chat_prompt(history: &[ChatTurn], user_prompt: &str) -> String {
    let history_json = serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string());
    format!(
        "This is the previous conversation between user and assistant (You are the assistant)\n\
         {history_json}\n\
         1) Provide a response to the user's query analyzing the previous conversation between the user and assistant (YOU).\n\
         2) The user's new query is: {user_prompt}\n\
         3) The response should be based on the previous conversation but should not explicitly mention it.\n\
         4) Provide the response as if it was asked to you directly in markdown format."
    )
}

/// Ask the model which file extension the user's request is about.
pub fn extension_prompt(user_prompt: &str) -> String {
    format!(
        "Identify the file extension of the given content.\n\n\
         Please analyze the following content and provide ONLY the file extension \
         (e.g., .md, .txt, .js, .docx, .ppt).\n\n\
         {user_prompt}"
    )
}

/// Documentation request for one file.
///
/// `structured` adds the JSON output contract used for single-file documents.
pub fn documentation_prompt(
    extension: &str,
    content: &str,
    user_prompt: Option<&str>,
    structured: bool,
) -> String {
    let mut prompt = format!(
        "Please analyze the following {extension} code and provide a detailed documentation:\n\
         {content}\n\n\
         {DOC_FORMAT_INSTRUCTIONS}"
    );
    if structured {
        prompt.push_str(DOC_JSON_INSTRUCTIONS);
    }
    if let Some(extra) = user_prompt.filter(|p| !p.trim().is_empty()) {
        prompt.push('\n');
        prompt.push_str(extra);
    }
    prompt
}

/// Reduce a model reply to a plain extension such as `.ts`.
///
/// Anything that does not look like one falls back to [`DEFAULT_EXTENSION`].
pub fn normalize_extension(reply: &str) -> String {
    let tokens: Vec<&str> = reply
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == ','))
        .filter(|t| !t.is_empty())
        .collect();
    let token = match tokens.iter().find(|t| t.starts_with('.')) {
        Some(dotted) => *dotted,
        None if tokens.len() == 1 => tokens[0],
        None => "",
    };
    let bare = token.trim_start_matches('.');
    let valid = !bare.is_empty()
        && bare.len() <= 10
        && bare.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        format!(".{}", bare.to_ascii_lowercase())
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codedoc_core::ChatRole;

    #[test]
    fn test_sql_prompt_embeds_schema_and_query() {
        let prompt = sql_prompt("Database schema:\nTable: users\n", "how many users?");
        assert!(prompt.contains("Table: users"));
        assert!(prompt.contains("\"how many users?\""));
        assert!(prompt.contains("only the SQL query"));
    }

    #[test]
    fn test_chat_prompt_serializes_history() {
        let history = vec![ChatTurn {
            role: ChatRole::User,
            content: "hi".into(),
        }];
        let prompt = chat_prompt(&history, "and then?");
        assert!(prompt.contains(r#"[{"role":"user","content":"hi"}]"#));
        assert!(prompt.contains("The user's new query is: and then?"));
    }

    #[test]
    fn test_documentation_prompt_structured() {
        let plain = documentation_prompt(".ts", "const a = 1;", None, false);
        assert!(plain.contains("following .ts code"));
        assert!(!plain.contains("interface Documentation"));

        let structured = documentation_prompt(".ts", "const a = 1;", Some("focus on types"), true);
        assert!(structured.contains("interface Documentation"));
        assert!(structured.ends_with("focus on types"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".ts\n"), ".ts");
        assert_eq!(normalize_extension("`PY`"), ".py");
        assert_eq!(normalize_extension("md"), ".md");
        assert_eq!(normalize_extension("I cannot tell."), ".md");
        assert_eq!(normalize_extension(""), ".md");
        assert_eq!(normalize_extension("The extension is .docx"), ".docx");
    }
}
