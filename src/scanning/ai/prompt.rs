//! Prompt and response schema sent to the generative AI service

use serde_json::{json, Value};
use url::Url;

use crate::types::Category;
use crate::util::truncate_str;

/// Default cap on page characters embedded in the prompt
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 200_000;

/// Instruction plus the page HTML
pub fn build_prompt(page_url: &Url, content: &str, max_content_chars: usize) -> String {
    let categories = category_list();
    let content_chars = content.chars().count();
    let content = if content_chars > max_content_chars {
        tracing::debug!(
            "Truncating page content from {} to {} characters for the prompt",
            content_chars,
            max_content_chars
        );
        truncate_str(content, max_content_chars)
    } else {
        content.to_string()
    };

    format!(
        "Analyze the following HTML content from the URL \"{url}\" and extract all direct links to downloadable files.\n\
         For each file, provide its absolute URL, a descriptive name based on the link text or file name, \
         its file category, and its size in bytes (use 0 if unknown).\n\
         The category must be one of: {categories}.\n\
         Base the URL on the provided page URL: {url}. Relative links like '/files/document.pdf' \
         should be resolved to absolute URLs.\n\n\
         HTML content:\n```html\n{content}\n```\n",
        url = page_url,
        categories = categories,
        content = content,
    )
}

/// JSON schema constraining the response to an array of file objects
pub fn response_schema() -> Value {
    let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "url": {
                    "type": "STRING",
                    "description": "The full, absolute URL of the file."
                },
                "name": {
                    "type": "STRING",
                    "description": "A descriptive name for the file."
                },
                "category": {
                    "type": "STRING",
                    "enum": names,
                    "description": format!("The file's category: {}.", category_list())
                },
                "size": {
                    "type": "NUMBER",
                    "description": "The file size in bytes. Use 0 if unknown."
                }
            },
            "required": ["url", "name", "category", "size"]
        }
    })
}

fn category_list() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ")
}
