//! Registry of components that content bodies may embed

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tera::{Context, Tera};
use thiserror::Error;

use super::Props;
use crate::helpers::escape_html;

/// Component validation and rendering errors
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("<{component}> is missing required prop '{prop}'")]
    MissingProp { component: String, prop: String },

    #[error("<{component}> prop '{prop}' must be {expected}")]
    InvalidProp {
        component: String,
        prop: String,
        expected: &'static str,
    },

    #[error("<{component}> failed to render: {message}")]
    Render { component: String, message: String },
}

/// A named fragment that content bodies can embed.
///
/// `validate` runs when a document is compiled, `render` when the compiled
/// unit is instantiated into a page.
pub trait Component: Send + Sync {
    fn validate(&self, _props: &Props) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Render with the already rendered children HTML
    fn render(&self, props: &Props, children: &str) -> Result<String, ComponentError>;
}

/// Maps component names to implementations
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in components: `Callout`, `Figure` and `YouTube`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("Callout", Callout);
        registry.register("Figure", Figure);
        registry.register("YouTube", YouTube);
        registry
    }

    /// Built-ins plus one component per Tera template.
    ///
    /// Templates see every prop at the top level, the whole map as `props`,
    /// and the rendered children as `children` (use `children | safe`).
    pub fn with_templates(templates: &IndexMap<String, String>) -> Result<Self, tera::Error> {
        let mut registry = Self::with_builtins();
        if templates.is_empty() {
            return Ok(registry);
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(
            templates
                .iter()
                .map(|(name, source)| (template_name(name), source.as_str())),
        )?;
        let tera = Arc::new(tera);

        for name in templates.keys() {
            tracing::debug!("Registering template component <{}>", name);
            registry.register(
                name,
                TemplateComponent {
                    name: name.clone(),
                    tera: Arc::clone(&tera),
                },
            );
        }

        Ok(registry)
    }

    /// Register a component, replacing any previous one with that name
    pub fn register(&mut self, name: impl Into<String>, component: impl Component + 'static) {
        self.components.insert(name.into(), Arc::new(component));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

/// Template names end in `.html` so Tera autoescapes prop values
fn template_name(component: &str) -> String {
    format!("{}.html", component)
}

fn prop_str<'p>(component: &str, props: &'p Props, prop: &str) -> Result<Option<&'p str>, ComponentError> {
    match props.get(prop) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ComponentError::InvalidProp {
            component: component.to_string(),
            prop: prop.to_string(),
            expected: "a string",
        }),
    }
}

fn required_str<'p>(component: &str, props: &'p Props, prop: &str) -> Result<&'p str, ComponentError> {
    prop_str(component, props, prop)?.ok_or_else(|| ComponentError::MissingProp {
        component: component.to_string(),
        prop: prop.to_string(),
    })
}

/// Optional integer-ish dimension, written as `{640}` or `"640"`
fn prop_dimension(component: &str, props: &Props, prop: &str) -> Result<Option<String>, ComponentError> {
    match props.get(prop) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) if n.is_u64() => Ok(Some(n.to_string())),
        Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(Some(s.clone()))
        }
        Some(_) => Err(ComponentError::InvalidProp {
            component: component.to_string(),
            prop: prop.to_string(),
            expected: "a positive integer",
        }),
    }
}

/// `<Callout type="tip" title="…">children</Callout>`
pub struct Callout;

impl Component for Callout {
    fn validate(&self, props: &Props) -> Result<(), ComponentError> {
        prop_str("Callout", props, "type")?;
        prop_str("Callout", props, "title")?;
        Ok(())
    }

    fn render(&self, props: &Props, children: &str) -> Result<String, ComponentError> {
        let kind = prop_str("Callout", props, "type")?.unwrap_or("note");
        let title = prop_str("Callout", props, "title")?
            .map(|t| format!(r#"<p class="callout-title">{}</p>"#, escape_html(t)))
            .unwrap_or_default();
        Ok(format!(
            r#"<aside class="callout callout-{}">{}{}</aside>"#,
            escape_html(kind),
            title,
            children
        ))
    }
}

/// `<Figure src="…" alt="…" caption="…" width={640} />`
pub struct Figure;

impl Component for Figure {
    fn validate(&self, props: &Props) -> Result<(), ComponentError> {
        required_str("Figure", props, "src")?;
        prop_str("Figure", props, "alt")?;
        prop_str("Figure", props, "caption")?;
        prop_dimension("Figure", props, "width")?;
        prop_dimension("Figure", props, "height")?;
        Ok(())
    }

    fn render(&self, props: &Props, children: &str) -> Result<String, ComponentError> {
        let src = required_str("Figure", props, "src")?;
        let alt = prop_str("Figure", props, "alt")?.unwrap_or("");

        let mut img = format!(
            r#"<img src="{}" alt="{}""#,
            escape_html(src),
            escape_html(alt)
        );
        for dim in ["width", "height"] {
            if let Some(value) = prop_dimension("Figure", props, dim)? {
                img.push_str(&format!(r#" {}="{}""#, dim, value));
            }
        }
        img.push_str(r#" loading="lazy">"#);

        let caption = match prop_str("Figure", props, "caption")? {
            Some(caption) => escape_html(caption),
            None => children.trim().to_string(),
        };
        let caption = if caption.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{}</figcaption>", caption)
        };

        Ok(format!("<figure>{}{}</figure>", img, caption))
    }
}

/// `<YouTube id="dQw4w9WgXcQ" title="…" />`
pub struct YouTube;

impl Component for YouTube {
    fn validate(&self, props: &Props) -> Result<(), ComponentError> {
        let id = required_str("YouTube", props, "id")?;
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ComponentError::InvalidProp {
                component: "YouTube".to_string(),
                prop: "id".to_string(),
                expected: "a video id",
            });
        }
        prop_str("YouTube", props, "title")?;
        Ok(())
    }

    fn render(&self, props: &Props, _children: &str) -> Result<String, ComponentError> {
        self.validate(props)?;
        let id = required_str("YouTube", props, "id")?;
        let title = prop_str("YouTube", props, "title")?.unwrap_or("YouTube video");
        Ok(format!(
            r#"<div class="video"><iframe src="https://www.youtube-nocookie.com/embed/{}" title="{}" frameborder="0" allow="accelerometer; encrypted-media; picture-in-picture" allowfullscreen></iframe></div>"#,
            id,
            escape_html(title)
        ))
    }
}

/// A component declared in the site config as a Tera template
pub struct TemplateComponent {
    name: String,
    tera: Arc<Tera>,
}

impl Component for TemplateComponent {
    fn render(&self, props: &Props, children: &str) -> Result<String, ComponentError> {
        let mut context = Context::new();
        for (key, value) in props {
            context.insert(key.as_str(), value);
        }
        context.insert("props", props);
        context.insert("children", children);

        self.tera
            .render(&template_name(&self.name), &context)
            .map_err(|e| ComponentError::Render {
                component: self.name.clone(),
                message: format!("{:?}", e),
            })
    }
}
