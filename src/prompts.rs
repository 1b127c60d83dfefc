pub const SUMMARY_SYSTEM: &str = r#"You are a concise GitHub repository summarizer. Return ONLY a Markdown bullet list (each line starting with "- ") describing:
- the purpose of the repository
- its core technologies and languages
- its key features or modules
- its target audience or use-case

Do not include installation steps, code examples, headings or any other text."#;

pub const SUMMARY_USER: &str = "Summarize this GitHub repository in bullet points:\n\n{0}";

pub const LANGUAGE_PREFIX: &str = "Primary Language: {0}\n\n";

pub const SIMILAR_SYSTEM: &str = "You are a GitHub repository expert.";

pub const SIMILAR_USER: &str = r#"Based on this repository summary, suggest 5 similar popular GitHub repositories.

Summary:
{0}

Language: {1}

Respond with ONLY the repositories in owner/repo format, one per line. No descriptions, no numbering, no other text."#;

/// Substitutes `{0}`, `{1}`, ... in a prompt template
pub fn fill(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .rev()
        .fold(template.to_string(), |acc, (i, arg)| acc.replace(&format!("{{{}}}", i), arg))
}
