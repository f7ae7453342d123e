//! Splits a completed answer into text and fenced-code segments.
//!
//! A fence opens with three backticks, an optional info string and a newline,
//! e.g. `` ```python main.py `` on its own line, and closes at the next three
//! backticks. The first info token is the language tag, anything after it is the title.
//! An opener that never reaches a newline or a closing fence is left as plain
//! text so the UI never renders a highlighted region that does not end.

use super::language::normalize_language;

const FENCE: &str = "```";

// ---------------------------------------------------------------------------
// FormattedSegment
// ---------------------------------------------------------------------------

/// One contiguous unit of rendered output, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedSegment {
    /// Prose between (or around) code blocks, verbatim.
    Text { content: String },
    /// The body of a fenced block, without the fence lines.
    Code {
        language: String,
        title: Option<String>,
        content: String,
    },
}

impl FormattedSegment {
    /// The segment body as it appeared in the answer.
    pub fn content(&self) -> &str {
        match self {
            FormattedSegment::Text { content } | FormattedSegment::Code { content, .. } => content,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, FormattedSegment::Code { .. })
    }

    fn text(content: &str) -> Self {
        FormattedSegment::Text {
            content: content.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// parse / reassemble
// ---------------------------------------------------------------------------

/// Parse `answer` into an ordered list of segments.
///
/// Concatenating every segment's content yields `answer` minus the fence
/// lines and closing fences (see [`reassemble`]).
///
/// ```
/// use capture_answer::format::parse;
///
/// let segments = parse("before ```js\ncode()\n``` after");
/// assert_eq!(segments.len(), 3);
/// assert!(segments[1].is_code());
/// ```
pub fn parse(answer: &str) -> Vec<FormattedSegment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(found) = answer[cursor..].find(FENCE) {
        let open = cursor + found;
        let info_start = open + FENCE.len();

        // Opener line must end in a newline; otherwise the rest is text.
        let Some(line_len) = answer[info_start..].find('\n') else {
            break;
        };
        let info = &answer[info_start..info_start + line_len];

        if !is_info_string(info) {
            cursor = open + 1;
            continue;
        }

        let body_start = info_start + line_len + 1;
        let Some(body_len) = answer[body_start..].find(FENCE) else {
            break;
        };
        let close = body_start + body_len;

        if open > text_start {
            segments.push(FormattedSegment::text(&answer[text_start..open]));
        }

        let (language, title) = split_info(info);
        segments.push(FormattedSegment::Code {
            language,
            title,
            content: answer[body_start..close].to_string(),
        });

        cursor = close + FENCE.len();
        text_start = cursor;
    }

    if text_start < answer.len() {
        segments.push(FormattedSegment::text(&answer[text_start..]));
    }

    segments
}

/// Concatenate segment bodies back into one string.
pub fn reassemble(segments: &[FormattedSegment]) -> String {
    segments.iter().map(FormattedSegment::content).collect()
}

/// An info string is empty or starts right after the backticks with a tag.
fn is_info_string(info: &str) -> bool {
    match info.chars().next() {
        None => true,
        Some(c) => !c.is_whitespace() && c != '`',
    }
}

fn split_info(info: &str) -> (String, Option<String>) {
    let info = info.trim_end_matches('\r');
    let mut parts = info.splitn(2, char::is_whitespace);
    let tag = parts.next().filter(|t| !t.is_empty());
    let title = parts
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    (normalize_language(tag), title)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FormattedSegment {
        FormattedSegment::Text {
            content: s.to_string(),
        }
    }

    fn code(language: &str, title: Option<&str>, content: &str) -> FormattedSegment {
        FormattedSegment::Code {
            language: language.to_string(),
            title: title.map(str::to_string),
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn plain_text_is_one_segment() {
        let input = "plain text, no fences";
        assert_eq!(parse(input), vec![text(input)]);
    }

    #[test]
    fn code_block_between_text() {
        let segments = parse("before ```js\ncode()\n``` after");
        assert_eq!(
            segments,
            vec![
                text("before "),
                code("javascript", None, "code()\n"),
                text(" after"),
            ]
        );
    }

    #[test]
    fn unterminated_fence_is_plain_text() {
        let input = "```py\nprint(1)";
        assert_eq!(parse(input), vec![text(input)]);
    }

    #[test]
    fn unterminated_fence_after_block_keeps_tail_as_text() {
        let segments = parse("```sh\nls\n```\nthen ```py\nprint(1)");
        assert_eq!(
            segments,
            vec![code("bash", None, "ls\n"), text("\nthen ```py\nprint(1)")]
        );
    }

    #[test]
    fn opener_without_newline_is_text() {
        let input = "use ```js to open a fence";
        assert_eq!(parse(input), vec![text(input)]);
    }

    #[test]
    fn missing_tag_defaults_to_javascript() {
        let segments = parse("```\nlet x = 1;\n```");
        assert_eq!(segments, vec![code("javascript", None, "let x = 1;\n")]);
    }

    #[test]
    fn title_follows_language() {
        let segments = parse("```python main.py\nprint('hi')\n```");
        assert_eq!(
            segments,
            vec![code("python", Some("main.py"), "print('hi')\n")]
        );
    }

    #[test]
    fn unknown_language_passes_through() {
        let segments = parse("```zig\nconst x = 1;\n```");
        assert_eq!(segments, vec![code("zig", None, "const x = 1;\n")]);
    }

    #[test]
    fn multiple_blocks_keep_document_order() {
        let segments = parse("a\n```yml\nk: v\n```\nb\n```rb\nputs 1\n```\nc");
        assert_eq!(
            segments,
            vec![
                text("a\n"),
                code("yaml", None, "k: v\n"),
                text("\nb\n"),
                code("ruby", None, "puts 1\n"),
                text("\nc"),
            ]
        );
    }

    #[test]
    fn adjacent_blocks_have_no_empty_text_between() {
        let segments = parse("```js\na\n``````py\nb\n```");
        assert_eq!(
            segments,
            vec![code("javascript", None, "a\n"), code("python", None, "b\n")]
        );
    }

    #[test]
    fn whitespace_after_backticks_is_not_an_opener() {
        let input = "``` not a fence\nstill text ```";
        assert_eq!(parse(input), vec![text(input)]);
    }

    #[test]
    fn crlf_opener_line_is_accepted() {
        let segments = parse("```js\r\nx()\r\n```");
        assert_eq!(segments, vec![code("javascript", None, "x()\r\n")]);
    }

    #[test]
    fn reassemble_restores_text_without_fence_markers() {
        let input = "intro\n```ts App.tsx\nconst a = 1;\n```\noutro";
        let segments = parse(input);
        assert_eq!(reassemble(&segments), "intro\nconst a = 1;\n\noutro");
    }

    #[test]
    fn reassemble_is_identity_without_fences() {
        for input in ["", "one line", "multi\nline\n\ntext", "single ` and `` ticks"] {
            assert_eq!(reassemble(&parse(input)), input);
        }
    }

    #[test]
    fn reassemble_is_identity_for_unterminated_fences() {
        for input in ["```py\nprint(1)", "x ```", "```js"] {
            assert_eq!(reassemble(&parse(input)), input);
        }
    }

    #[test]
    fn non_ascii_text_survives_slicing() {
        let input = "olá ```py\nprint('ç')\n``` fim ✓";
        let segments = parse(input);
        assert_eq!(
            segments,
            vec![
                text("olá "),
                code("python", None, "print('ç')\n"),
                text(" fim ✓"),
            ]
        );
    }
}
