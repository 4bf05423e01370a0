//! Scanner for component elements embedded in a Markdown body.
//!
//! Capitalised tags such as `<Callout type="tip">…</Callout>` or
//! `<YouTube id="abc" />` are cut out of the body and replaced by a slot
//! token made of private-use code points, which pulldown-cmark treats as
//! ordinary text. Text in fenced code blocks and inline code spans is never
//! scanned.
//!
//! Prop values are strings (`"…"` or `'…'`), bare flags (`true`) or JSON
//! literals in braces (`{3}`, `{["a", "b"]}`). Arbitrary expressions are
//! rejected since nothing evaluates them.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::Props;

lazy_static! {
    /// Matches a placeholder left in the Markdown by [`scan`]
    pub static ref PLACEHOLDER: Regex = Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap();
}

/// Placeholder standing in for the element at `index`
pub fn placeholder(index: usize) -> String {
    format!("\u{E000}{}\u{E001}", index)
}

/// Malformed component syntax
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

/// One component element found in the body
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub props: Props,
    /// Raw, dedented children markup; `None` for self-closing elements
    pub children: Option<String>,
    /// Whether the element sits on its own line(s)
    pub block: bool,
    pub line: usize,
}

/// Body text with elements replaced by placeholders
#[derive(Debug, Default)]
pub struct ScannedBody {
    pub markdown: String,
    pub elements: Vec<Element>,
}

/// Extract component elements from `src`
pub fn scan(src: &str) -> Result<ScannedBody, SyntaxError> {
    let mut scanner = Scanner {
        src,
        pos: 0,
        line: 1,
        fence: None,
        pending_break: None,
        out: String::with_capacity(src.len()),
        elements: Vec::new(),
    };
    scanner.run()?;
    Ok(ScannedBody {
        markdown: scanner.out,
        elements: scanner.elements,
    })
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    /// Open code fence: marker byte and run length
    fence: Option<(u8, usize)>,
    /// A block placeholder was just written at this indentation and the
    /// next line is unread
    pending_break: Option<&'a str>,
    out: String,
    elements: Vec<Element>,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) -> Result<(), SyntaxError> {
        let src = self.src;
        let mut at_line_start = true;

        while self.pos < src.len() {
            if at_line_start {
                at_line_start = false;
                if let Some(indent) = self.pending_break.take() {
                    if !self.current_line_is_blank() {
                        self.out.push_str(indent);
                        self.out.push('\n');
                    }
                }
                if self.line_start()? {
                    at_line_start = true;
                    continue;
                }
            }

            let rest = &src[self.pos..];
            match rest.find(['\n', '`', '{', '<']) {
                None => {
                    self.out.push_str(rest);
                    self.pos = src.len();
                }
                Some(n) if n > 0 => {
                    self.out.push_str(&rest[..n]);
                    self.pos += n;
                }
                Some(_) => {
                    let bytes = rest.as_bytes();
                    match bytes[0] {
                        b'\n' => {
                            self.out.push('\n');
                            self.pos += 1;
                            self.line += 1;
                            at_line_start = true;
                        }
                        b'`' => self.copy_code_span(),
                        b'{' if rest.starts_with("{/*") => self.skip_comment()?,
                        b'<' if bytes.get(1).is_some_and(u8::is_ascii_uppercase) => {
                            at_line_start = self.element()?;
                        }
                        other => {
                            self.out.push(other as char);
                            self.pos += 1;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle fences and module statements; returns true if the whole line
    /// was consumed
    fn line_start(&mut self) -> Result<bool, SyntaxError> {
        let src = self.src;
        let line_end = src[self.pos..]
            .find('\n')
            .map(|i| self.pos + i + 1)
            .unwrap_or(src.len());
        let line = &src[self.pos..line_end];
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim_start_matches(' ');
        let indent = content.len() - trimmed.len();

        if let Some((marker, len)) = self.fence {
            let run = trimmed.bytes().take_while(|&b| b == marker).count();
            if indent < 4 && run >= len && trimmed[run..].trim().is_empty() {
                self.fence = None;
            }
            self.copy_through(line_end);
            return Ok(true);
        }

        if indent < 4 {
            if let Some(marker) = trimmed.bytes().next().filter(|b| *b == b'`' || *b == b'~') {
                let run = trimmed.bytes().take_while(|&b| b == marker).count();
                let info = &trimmed[run..];
                if run >= 3 && !(marker == b'`' && info.contains('`')) {
                    self.fence = Some((marker, run));
                    self.copy_through(line_end);
                    return Ok(true);
                }
            }
        }

        if indent == 0 && (content.starts_with("import ") || content.starts_with("export ")) {
            return Err(self.error("import/export statements are not supported"));
        }

        Ok(false)
    }

    fn current_line_is_blank(&self) -> bool {
        self.src[self.pos..]
            .split('\n')
            .next()
            .map_or(true, |l| l.trim().is_empty())
    }

    fn copy_through(&mut self, end: usize) {
        let text = &self.src[self.pos..end];
        self.line += newlines(text);
        self.out.push_str(text);
        self.pos = end;
    }

    /// Copy an inline code span verbatim, or a lone backtick run
    fn copy_code_span(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        let run = rest.bytes().take_while(|&b| b == b'`').count();
        let ticks = &rest[..run];

        let mut search = run;
        while let Some(offset) = rest[search..].find(ticks) {
            let start = search + offset;
            let len = rest[start..].bytes().take_while(|&b| b == b'`').count();
            if len == run {
                let end = self.pos + start + run;
                self.copy_through(end);
                return;
            }
            search = start + len;
        }

        self.out.push_str(ticks);
        self.pos += run;
    }

    /// Drop a `{/* … */}` comment
    fn skip_comment(&mut self) -> Result<(), SyntaxError> {
        let rest = &self.src[self.pos..];
        match rest.find("*/}") {
            Some(end) => {
                self.line += newlines(&rest[..end]);
                self.pos += end + 3;
                Ok(())
            }
            None => Err(self.error("unterminated {/* comment */}")),
        }
    }

    /// Replace the element at the cursor with a placeholder; returns true
    /// if the cursor is left at the start of a line
    fn element(&mut self) -> Result<bool, SyntaxError> {
        let start = self.pos;
        let start_line = self.line;
        let tag = parse_tag(self.src, start, start_line)?;

        let (children, end, end_line) = if tag.self_closing {
            (None, tag.end, tag.end_line)
        } else {
            let (children, end, end_line) = find_closing(self.src, &tag)?;
            (Some(dedent(children)), end, end_line)
        };

        let line_begin = self.src[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = self.src[end..]
            .find('\n')
            .map(|i| end + i + 1)
            .unwrap_or(self.src.len());
        let block = self.src[line_begin..start].trim().is_empty()
            && self.src[end..line_end].trim().is_empty();

        let index = self.elements.len();
        self.elements.push(Element {
            name: tag.name,
            props: tag.props,
            children,
            block,
            line: start_line,
        });

        if block {
            // A block placeholder is a paragraph of its own, indented like
            // the element so it stays inside an enclosing list item
            let src = self.src;
            let indent = &src[line_begin..start];
            if let Some(kept) = self.out.strip_suffix(indent).map(str::len) {
                self.out.truncate(kept);
            }
            if !self.out.is_empty() && !self.out.ends_with("\n\n") {
                self.out.push_str(indent);
                self.out.push('\n');
            }
            self.out.push_str(indent);
            self.out.push_str(&placeholder(index));
            self.out.push('\n');
            self.pending_break = Some(indent);
            self.line = end_line + newlines(&self.src[end..line_end]);
            self.pos = line_end;
            Ok(true)
        } else {
            self.out.push_str(&placeholder(index));
            self.line = end_line;
            self.pos = end;
            Ok(false)
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line,
            message: message.into(),
        }
    }
}

struct OpenTag {
    name: String,
    props: Props,
    self_closing: bool,
    /// Byte offset just past the closing `>`
    end: usize,
    end_line: usize,
}

/// Parse `<Name prop=… …>` or `<Name … />` starting at `start`
fn parse_tag(src: &str, start: usize, line: usize) -> Result<OpenTag, SyntaxError> {
    let bytes = src.as_bytes();
    let error = |line: usize, message: String| SyntaxError { line, message };

    let mut i = start + 1;
    let name_len = src[i..].bytes().take_while(|b| is_name_byte(*b)).count();
    let name = src[i..i + name_len].to_string();
    i += name_len;

    let mut line = line;
    let mut props = Props::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            if bytes[i] == b'\n' {
                line += 1;
            }
            i += 1;
        }

        let Some(&b) = bytes.get(i) else {
            return Err(error(line, format!("unterminated <{}> tag", name)));
        };

        match b {
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Ok(OpenTag {
                    name,
                    props,
                    self_closing: true,
                    end: i + 2,
                    end_line: line,
                });
            }
            b'>' => {
                return Ok(OpenTag {
                    name,
                    props,
                    self_closing: false,
                    end: i + 1,
                    end_line: line,
                });
            }
            b'{' => {
                return Err(error(
                    line,
                    format!("spread props are not supported on <{}>", name),
                ));
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let attr_len = src[i..]
                    .bytes()
                    .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':'))
                    .count();
                let attr = src[i..i + attr_len].to_string();
                i += attr_len;

                let mut j = i;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }

                if bytes.get(j) != Some(&b'=') {
                    props.insert(attr, Value::Bool(true));
                    continue;
                }

                line += newlines(&src[i..j]);
                i = j + 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    if bytes[i] == b'\n' {
                        line += 1;
                    }
                    i += 1;
                }

                let value = match bytes.get(i) {
                    Some(&quote) if quote == b'"' || quote == b'\'' => {
                        let close = src[i + 1..].find(quote as char).ok_or_else(|| {
                            error(line, format!("unterminated string for prop '{}'", attr))
                        })?;
                        let text = &src[i + 1..i + 1 + close];
                        line += newlines(text);
                        i += close + 2;
                        Value::String(text.to_string())
                    }
                    Some(b'{') => {
                        let close = matching_brace(src, i).ok_or_else(|| {
                            error(line, format!("unterminated expression for prop '{}'", attr))
                        })?;
                        let expr = &src[i + 1..close];
                        let value = parse_expression(&attr, expr).map_err(|m| error(line, m))?;
                        line += newlines(expr);
                        i = close + 1;
                        value
                    }
                    _ => return Err(error(line, format!("expected a value for prop '{}'", attr))),
                };
                props.insert(attr, value);
            }
            other => {
                return Err(error(
                    line,
                    format!("unexpected character '{}' in <{}> tag", other as char, name),
                ));
            }
        }
    }
}

/// Find the `</Name>` closing `tag`, skipping nested elements of the same name
fn find_closing<'s>(src: &'s str, tag: &OpenTag) -> Result<(&'s str, usize, usize), SyntaxError> {
    let bytes = src.as_bytes();
    let open_pat = format!("<{}", tag.name);
    let close_pat = format!("</{}", tag.name);

    let mut depth = 1;
    let mut i = tag.end;
    let mut line = tag.end_line;

    while let Some(offset) = src[i..].find(|c| c == '<' || c == '`') {
        let at = i + offset;
        line += newlines(&src[i..at]);

        if bytes[at] == b'`' {
            // Tags inside code spans and fences are text
            let run = bytes[at..].iter().take_while(|&&b| b == b'`').count();
            let ticks = &src[at..at + run];
            i = match src[at + run..].find(ticks) {
                Some(close) => {
                    let end = at + run + close + run;
                    line += newlines(&src[at..end]);
                    end
                }
                None => at + run,
            };
            continue;
        }

        if src[at..].starts_with(&close_pat) && ends_name(bytes, at + close_pat.len()) {
            let mut k = at + close_pat.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) != Some(&b'>') {
                return Err(SyntaxError {
                    line,
                    message: format!("malformed closing tag </{}>", tag.name),
                });
            }
            line += newlines(&src[at..k]);
            depth -= 1;
            if depth == 0 {
                return Ok((&src[tag.end..at], k + 1, line));
            }
            i = k + 1;
        } else if src[at..].starts_with(&open_pat) && ends_name(bytes, at + open_pat.len()) {
            let inner = parse_tag(src, at, line)?;
            if !inner.self_closing {
                depth += 1;
            }
            line = inner.end_line;
            i = inner.end;
        } else {
            i = at + 1;
        }
    }

    Err(SyntaxError {
        line: tag.end_line,
        message: format!("missing closing tag </{}>", tag.name),
    })
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

fn ends_name(bytes: &[u8], i: usize) -> bool {
    bytes.get(i).map_or(true, |b| !is_name_byte(*b))
}

/// Index of the `}` matching the `{` at `open`, skipping string literals
fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    None
}

fn parse_expression(prop: &str, expr: &str) -> Result<Value, String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(format!("empty expression for prop '{}'", prop));
    }
    serde_json::from_str(expr).map_err(|_| {
        format!(
            "prop '{}' uses an unsupported expression `{{{}}}`, only JSON literals are allowed",
            prop, expr
        )
    })
}

/// Remove the indentation shared by all non-blank lines; blank lines come
/// out empty
fn dedent(s: &str) -> String {
    let indent = s
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    if indent == 0 {
        return s.to_string();
    }

    s.lines()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

fn newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_self_closing_with_props() {
        let body = scan("Intro\n\n<YouTube id=\"abc\" start={42} autoplay />\n\nOutro\n").unwrap();
        assert_eq!(body.elements.len(), 1);

        let el = &body.elements[0];
        assert_eq!(el.name, "YouTube");
        assert_eq!(el.props["id"], json!("abc"));
        assert_eq!(el.props["start"], json!(42));
        assert_eq!(el.props["autoplay"], json!(true));
        assert!(el.children.is_none());
        assert!(el.block);
        assert_eq!(el.line, 3);
        assert_eq!(body.markdown, format!("Intro\n\n{}\n\nOutro\n", placeholder(0)));
    }

    #[test]
    fn test_children_and_nesting() {
        let src = "<Callout type='tip'>\n  Outer **text**\n  <Callout>inner</Callout>\n</Callout>\nAfter\n";
        let body = scan(src).unwrap();
        assert_eq!(body.elements.len(), 1);

        let el = &body.elements[0];
        assert_eq!(el.props["type"], json!("tip"));
        let children = el.children.as_deref().unwrap();
        assert!(children.contains("Outer **text**"));
        assert!(children.contains("<Callout>inner</Callout>"));
        assert!(children.starts_with("\nOuter"));
        assert!(body.markdown.ends_with(&format!("{}\n\nAfter\n", placeholder(0))));
    }

    #[test]
    fn test_inline_element() {
        let body = scan("Watch <Badge>new</Badge> today").unwrap();
        assert_eq!(body.markdown, format!("Watch {} today", placeholder(0)));
        assert!(!body.elements[0].block);
        assert_eq!(body.elements[0].children.as_deref(), Some("new"));
    }

    #[test]
    fn test_block_element_after_paragraph_gets_blank_line() {
        let body = scan("Some text\n<Figure src=\"a.png\" />\nMore text").unwrap();
        assert_eq!(
            body.markdown,
            format!("Some text\n\n{}\n\nMore text", placeholder(0))
        );
    }

    #[test]
    fn test_inline_element_opening_a_line() {
        let body = scan("<Badge>new</Badge> release is **out**\n").unwrap();
        assert!(!body.elements[0].block);
        assert_eq!(
            body.markdown,
            format!("{} release is **out**\n", placeholder(0))
        );
    }

    #[test]
    fn test_block_element_keeps_list_indentation() {
        let body = scan("- one\n  <Callout>inside</Callout>\n- two\n").unwrap();
        assert!(body.elements[0].block);
        assert_eq!(
            body.markdown,
            format!("- one\n  \n  {}\n  \n- two\n", placeholder(0))
        );
    }

    #[test]
    fn test_html_comments_are_not_slots() {
        let src = "Text <!--folio-slot:0--> more\n";
        let body = scan(src).unwrap();
        assert!(body.elements.is_empty());
        assert!(!PLACEHOLDER.is_match(&body.markdown));
    }

    #[test]
    fn test_code_is_not_scanned() {
        let src = "```jsx\n<Callout>in a fence</Callout>\n```\n\nUse `<Figure />` inline.\n";
        let body = scan(src).unwrap();
        assert!(body.elements.is_empty());
        assert_eq!(body.markdown, src);
    }

    #[test]
    fn test_lowercase_html_passes_through() {
        let src = "<div class=\"note\">plain html</div>\n";
        let body = scan(src).unwrap();
        assert!(body.elements.is_empty());
        assert_eq!(body.markdown, src);
    }

    #[test]
    fn test_comments_are_removed() {
        let body = scan("Before {/* hidden\nnote */} after").unwrap();
        assert_eq!(body.markdown, "Before  after");
    }

    #[test]
    fn test_json_props() {
        let body = scan("<Gallery images={[\"a.png\", \"b.png\"]} meta={{\"w\": 2}} />").unwrap();
        let el = &body.elements[0];
        assert_eq!(el.props["images"], json!(["a.png", "b.png"]));
        assert_eq!(el.props["meta"], json!({"w": 2}));
    }

    #[test]
    fn test_unsupported_expression() {
        let err = scan("\n<Chart data={loadData()} />").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("only JSON literals"));
    }

    #[test]
    fn test_unterminated_tag() {
        let err = scan("<Callout type=\"tip\"").unwrap_err();
        assert!(err.message.contains("unterminated <Callout> tag"));
    }

    #[test]
    fn test_missing_closing_tag() {
        let err = scan("line\n<Callout>\nnever closed\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("missing closing tag </Callout>"));
    }

    #[test]
    fn test_spread_props_rejected() {
        let err = scan("<Callout {...props} />").unwrap_err();
        assert!(err.message.contains("spread props"));
    }

    #[test]
    fn test_module_statements_rejected() {
        let err = scan("# Title\n\nimport Chart from './chart'\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("import/export"));
    }

    #[test]
    fn test_placeholder_pattern() {
        let slot = placeholder(12);
        let caps = PLACEHOLDER.captures(&slot).unwrap();
        assert_eq!(&caps[1], "12");
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("\n  a\n    b\n"), "\na\n  b");
        assert_eq!(dedent("flat"), "flat");
    }

    #[test]
    fn test_dedent_blank_lines_with_wide_spaces() {
        assert_eq!(dedent("\n text\n\u{3000}\n"), "\ntext\n");
        assert_eq!(dedent("  a\n\u{a0}\u{a0}\n  b"), "a\n\nb");
    }

    #[test]
    fn test_tags_in_code_spans_do_not_nest() {
        let scanned = scan("<Callout>\nUse `<Callout>` freely.\n</Callout>\n").unwrap();
        assert_eq!(scanned.elements.len(), 1);
        assert_eq!(
            scanned.elements[0].children.as_deref().map(str::trim),
            Some("Use `<Callout>` freely.")
        );
    }
}
