//! Language-tag normalisation for fenced code blocks.

/// Language used when a fence carries no tag at all.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// Alias → canonical highlighter name.
const ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("rb", "ruby"),
    ("kt", "kotlin"),
    ("cpp", "cpp"),
    ("c++", "cpp"),
    ("cs", "csharp"),
    ("java", "java"),
    ("go", "go"),
    ("php", "php"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("shell", "bash"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("xml", "xml"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("sql", "sql"),
];

/// Normalise a fence tag to the name the highlighter understands.
///
/// Tags are compared case-insensitively. Unknown tags pass through
/// lowercased; a missing or blank tag becomes [`DEFAULT_LANGUAGE`].
///
/// ```
/// use capture_answer::format::normalize_language;
///
/// assert_eq!(normalize_language(Some("yml")), "yaml");
/// assert_eq!(normalize_language(Some("zig")), "zig");
/// assert_eq!(normalize_language(None), "javascript");
/// ```
pub fn normalize_language(tag: Option<&str>) -> String {
    let tag = match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_lowercase(),
        None => return DEFAULT_LANGUAGE.to_string(),
    };

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(tag)
}
