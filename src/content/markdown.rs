//! Markdown rendering with an ordered chain of markup extensions

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::helpers::escape_html;

/// Optional markup extensions a collection can enable.
///
/// Plain CommonMark is always on. Extensions are applied in the order the
/// collection lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupExtension {
    /// GitHub flavoured extras: tables, strikethrough, task lists, footnotes
    Gfm,
    /// Syntax highlighting of fenced code blocks
    Highlight,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML with the given extension chain
    pub fn render(&self, markdown: &str, extensions: &[MarkupExtension]) -> String {
        let mut options = Options::empty();
        let mut highlight = false;
        for ext in extensions {
            match ext {
                MarkupExtension::Gfm => {
                    options |= Options::ENABLE_TABLES
                        | Options::ENABLE_FOOTNOTES
                        | Options::ENABLE_STRIKETHROUGH
                        | Options::ENABLE_TASKLISTS
                        | Options::ENABLE_GFM;
                }
                MarkupExtension::Highlight => highlight = true,
            }
        }

        let events: Vec<Event> = Parser::new_ext(markdown, options).collect();
        let events = if highlight {
            self.highlight_code_blocks(events)
        } else {
            events
        };

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Replace every code block with pre-highlighted HTML
    fn highlight_code_blocks<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut code_block: Option<Option<String>> = None;
        let mut code = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(lang);
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(lang) = code_block.take() {
                        let highlighted = self.highlight_code(&code, lang.as_deref());
                        out.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => code.push_str(&text),
                other => out.push(other),
            }
        }

        out
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self.theme() else {
            return plain_code_block(code, lang);
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let html = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
                });
            match html {
                Ok(html) => lines.push(html),
                Err(e) => {
                    tracing::debug!("Highlighting {} failed, using plain text: {}", lang, e);
                    return plain_code_block(code, lang);
                }
            }
        }

        let background = theme
            .settings
            .background
            .map(|c| format!(r#" style="background-color:#{:02x}{:02x}{:02x};""#, c.r, c.g, c.b))
            .unwrap_or_default();

        if self.line_numbers {
            self.add_line_numbers(&lines, lang, &background)
        } else {
            format!(
                r#"<figure class="highlight {lang}"><pre{background}><code class="language-{lang}">{}</code></pre></figure>"#,
                lines.concat()
            )
        }
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, lines: &[String], lang: &str, background: &str) -> String {
        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");
        let code_lines = lines
            .iter()
            .map(|l| l.trim_end_matches(['\n', '\r']))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {lang}"><table><tr><td class="gutter"><pre>{gutter}</pre></td><td class="code"><pre{background}><code class="language-{lang}">{code_lines}</code></pre></td></tr></table></figure>"#
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre><code class="language-{}">{}</code></pre>"#,
        lang,
        escape_html(code)
    )
}
