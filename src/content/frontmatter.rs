//! Front-matter parsing

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

/// Opening and closing delimiter of a YAML front-matter block
const DELIMITER: &str = "---";

/// Front-matter parse failures
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("missing closing '---' delimiter")]
    Unterminated,

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front-matter must be a mapping of keys to values, found {0}")]
    NotAMapping(&'static str),

    #[error("unsupported front-matter key: {0}")]
    InvalidKey(String),
}

/// Metadata preamble of a content file.
///
/// Keys keep the order they were written in; values are raw YAML so that
/// arbitrary fields survive untouched into records and templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, Value>,
}

impl FrontMatter {
    /// Split `content` into front-matter and body.
    ///
    /// A file without a leading `---` line has empty front-matter and the
    /// whole text as body. An opened block that is never closed is an error.
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let Some(rest) = strip_delimiter_line(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == DELIMITER {
                let yaml = &rest[..offset];
                let body = &rest[offset + line.len()..];
                return Ok((Self::from_yaml(yaml)?, body));
            }
            offset += line.len();
        }

        Err(FrontMatterError::Unterminated)
    }

    /// Parse a bare YAML block into front-matter
    pub fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let mapping = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Null => return Ok(FrontMatter::default()),
            Value::Mapping(mapping) => mapping,
            Value::Sequence(_) => return Err(FrontMatterError::NotAMapping("a sequence")),
            Value::Tagged(_) => return Err(FrontMatterError::NotAMapping("a tagged value")),
            _ => return Err(FrontMatterError::NotAMapping("a scalar")),
        };

        let mut fields = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(FrontMatterError::InvalidKey(format!("{:?}", other))),
            };
            fields.insert(key, value);
        }

        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field as a string, only if it is a YAML string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.get_str("date")
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    /// Textual form of `date` used for ordering.
    ///
    /// Strings compare as written. Other scalars use their YAML rendering,
    /// and a missing or null date is the empty string.
    pub fn date_key(&self) -> String {
        match self.fields.get("date") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Strip an opening `---` line, returning what follows it
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(DELIMITER)?;
    let line_end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
    // `----` or `--- text` is a thematic break or prose, not a preamble
    if !rest[..line_end].trim().is_empty() {
        return None;
    }
    Some(&rest[line_end..])
}
