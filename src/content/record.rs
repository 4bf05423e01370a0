//! Content records and route parameters

use serde::Serialize;

use super::FrontMatter;

/// Summary of one document: its id plus everything in its front-matter.
///
/// Serializes flat (`{"id": .., "title": .., "date": .., ...}`), which is
/// the shape listing templates consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub id: String,
    #[serde(flatten)]
    pub frontmatter: FrontMatter,
}

impl ContentRecord {
    /// Build a record; the filename-derived id always wins over a
    /// front-matter `id` key.
    pub fn new(id: impl Into<String>, mut frontmatter: FrontMatter) -> Self {
        let id = id.into();
        if frontmatter.remove("id").is_some() {
            tracing::debug!("Ignoring front-matter 'id' in favour of filename id '{}'", id);
        }
        Self { id, frontmatter }
    }

    pub fn title(&self) -> Option<&str> {
        self.frontmatter.title()
    }

    pub fn date(&self) -> Option<&str> {
        self.frontmatter.date()
    }

    pub fn description(&self) -> Option<&str> {
        self.frontmatter.description()
    }

    pub fn date_key(&self) -> String {
        self.frontmatter.date_key()
    }
}

/// Parameters of one pre-rendered detail route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteParams {
    pub id: String,
}

/// Sort records newest first by comparing raw `date` strings.
///
/// This is a textual sort: `"2020-1-5"` sorts after `"2020-01-10"`. The sort
/// is stable, so records with equal dates keep their enumeration order.
pub fn sort_by_date_desc(records: &mut [ContentRecord]) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(r.date_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, yaml: &str) -> ContentRecord {
        ContentRecord::new(id, FrontMatter::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_serializes_flat_with_id_first() {
        let r = record("hello", "title: Hello\ndate: 2022-01-01");
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"id":"hello","title":"Hello","date":"2022-01-01"}"#
        );
    }

    #[test]
    fn test_filename_id_wins() {
        let r = record("from-file", "id: from-yaml\ntitle: T");
        assert_eq!(r.id, "from-file");
        assert!(!r.frontmatter.contains_key("id"));
    }

    #[test]
    fn test_sort_is_textual_and_stable() {
        let mut records = vec![
            record("first", "date: 2020-01-01"),
            record("middle", "date: 2019-12-31"),
            record("last", "date: 2020-01-01"),
        ];
        sort_by_date_desc(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "last", "middle"]);
    }

    #[test]
    fn test_sort_does_not_parse_dates() {
        let mut records = vec![
            record("padded", "date: 2020-01-10"),
            record("unpadded", "date: 2020-1-5"),
            record("undated", "title: none"),
        ];
        sort_by_date_desc(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["unpadded", "padded", "undated"]);
    }
}
