//! Compiled UI units

use std::fmt;
use std::sync::Arc;

use super::jsx::PLACEHOLDER;
use super::registry::{Component, ComponentError};
use super::Props;

/// The compiled form of a document body.
///
/// Markdown has already been rendered to HTML and every component reference
/// resolved, so rendering never touches the source markup again.
#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    segments: Vec<Segment>,
}

/// One piece of a [`CompiledUnit`]
#[derive(Debug, Clone)]
pub enum Segment {
    Html(String),
    Component(ComponentCall),
}

/// A resolved component reference with its props and compiled children
#[derive(Clone)]
pub struct ComponentCall {
    pub name: String,
    pub props: Props,
    pub children: CompiledUnit,
    pub inline: bool,
    component: Arc<dyn Component>,
}

impl ComponentCall {
    pub fn new(
        name: impl Into<String>,
        component: Arc<dyn Component>,
        props: Props,
        children: CompiledUnit,
        inline: bool,
    ) -> Self {
        Self {
            name: name.into(),
            props,
            children,
            inline,
            component,
        }
    }

    fn render(&self) -> Result<String, ComponentError> {
        let children = self.children.render()?;
        let children = if self.inline {
            unwrap_paragraph(&children)
        } else {
            children.as_str()
        };
        self.component.render(&self.props, children)
    }
}

impl fmt::Debug for ComponentCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCall")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("inline", &self.inline)
            .finish()
    }
}

impl CompiledUnit {
    /// Stitch rendered HTML and resolved calls back together.
    ///
    /// Every call must be referenced by exactly one placeholder in `html`.
    /// A block call replaces the paragraph its placeholder was rendered in.
    pub fn assemble(html: &str, calls: Vec<ComponentCall>) -> Result<Self, String> {
        let mut calls: Vec<Option<ComponentCall>> = calls.into_iter().map(Some).collect();
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(html) {
            let Some(whole) = caps.get(0) else { continue };
            let call = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| calls.get_mut(index))
                .and_then(Option::take)
                .ok_or_else(|| format!("unexpected component placeholder {}", whole.as_str()))?;

            let (mut start, mut end) = (whole.start(), whole.end());
            if !call.inline
                && html[last..start].ends_with("<p>")
                && html[end..].starts_with("</p>")
            {
                start -= "<p>".len();
                end += "</p>".len();
            }

            if start > last {
                segments.push(Segment::Html(html[last..start].to_string()));
            }
            segments.push(Segment::Component(call));
            last = end;
        }

        if last < html.len() {
            segments.push(Segment::Html(html[last..].to_string()));
        }

        if let Some(lost) = calls.into_iter().flatten().next() {
            return Err(format!(
                "<{}> ended up inside markup that cannot hold a component",
                lost.name
            ));
        }

        Ok(Self { segments })
    }

    /// Instantiate the unit into HTML
    pub fn render(&self) -> Result<String, ComponentError> {
        let mut html = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Html(s) => html.push_str(s),
                Segment::Component(call) => html.push_str(&call.render()?),
            }
        }
        Ok(html)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Names of every component used, depth first
    pub fn component_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for segment in &self.segments {
            if let Segment::Component(call) = segment {
                names.push(call.name.as_str());
                names.extend(call.children.component_names());
            }
        }
        names
    }
}

/// Inline children render as a single paragraph; drop its wrapper
fn unwrap_paragraph(html: &str) -> &str {
    let trimmed = html.trim_end();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner,
        _ => html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::markup::jsx::placeholder;

    struct Upper;

    impl Component for Upper {
        fn render(&self, _props: &Props, children: &str) -> Result<String, ComponentError> {
            Ok(format!("<b>{}</b>", children.to_uppercase()))
        }
    }

    fn call(name: &str, children: &str, inline: bool) -> ComponentCall {
        let children = CompiledUnit::assemble(children, Vec::new()).unwrap();
        ComponentCall::new(name, Arc::new(Upper), Props::new(), children, inline)
    }

    #[test]
    fn test_assemble_and_render() {
        let html = format!("<p>a {} b</p>\n{}\n", placeholder(0), placeholder(1));
        let unit = CompiledUnit::assemble(
            &html,
            vec![call("X", "<p>one</p>\n", true), call("Y", "<p>two</p>\n", false)],
        )
        .unwrap();

        assert_eq!(unit.segments().len(), 5);
        assert_eq!(unit.component_names(), vec!["X", "Y"]);
        assert_eq!(
            unit.render().unwrap(),
            "<p>a <b>ONE</b> b</p>\n<b><P>TWO</P>\n</b>\n"
        );
    }

    #[test]
    fn test_block_call_replaces_its_paragraph() {
        let html = format!("<ul>\n<li>\n<p>one</p>\n<p>{}</p>\n</li>\n</ul>\n", placeholder(0));
        let unit = CompiledUnit::assemble(&html, vec![call("Y", "two", false)]).unwrap();
        assert_eq!(
            unit.render().unwrap(),
            "<ul>\n<li>\n<p>one</p>\n<b>TWO</b>\n</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_html_comments_pass_through() {
        let html = "<p>a</p>\n<!--folio-slot:0-->\n";
        let unit = CompiledUnit::assemble(html, Vec::new()).unwrap();
        assert_eq!(unit.render().unwrap(), html);
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let err = CompiledUnit::assemble("<p>no slot</p>", vec![call("X", "", false)]).unwrap_err();
        assert!(err.contains("<X>"));
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        assert!(CompiledUnit::assemble(&placeholder(3), Vec::new()).is_err());
    }

    #[test]
    fn test_unwrap_paragraph() {
        assert_eq!(unwrap_paragraph("<p>hi</p>\n"), "hi");
        assert_eq!(unwrap_paragraph("<p>a</p>\n<p>b</p>\n"), "<p>a</p>\n<p>b</p>\n");
    }
}
