//! Domain entities: core data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unique document key.
///
/// Accepts a JSON string or integer on input, always written back as a string
/// so that persisted position maps stay keyed by string ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for DocumentId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// A document record as delivered by the document-list collaborator.
///
/// Children are never stored here; they are derived when the forest is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: DocumentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_id: Option<DocumentId>,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub tree_order: i64,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub word_count: u64,
}

impl DocumentNode {
    pub fn new(id: impl Into<DocumentId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            parent_id: None,
            tree_order: 0,
            word_count: 0,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<DocumentId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_order(mut self, tree_order: i64) -> Self {
        self.tree_order = tree_order;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_word_count(mut self, word_count: u64) -> Self {
        self.word_count = word_count;
        self
    }
}

/// `null`, absent and `""` all mean "no parent".
fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<DocumentId>, D::Error>
where
    D: Deserializer<'de>,
{
    let parent = Option::<DocumentId>::deserialize(deserializer)?;
    Ok(parent.filter(|id| !id.is_empty()))
}

fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A point in world or screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Visible container geometry in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Usable for fitting: finite and strictly positive in both axes.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Node positions keyed by document id.
pub type PositionMap = BTreeMap<DocumentId, Position>;

/// Ids of nodes whose children are currently shown.
pub type ExpandedSet = BTreeSet<DocumentId>;

/// User-owned view state: dragged positions and expansion.
///
/// Treated as an immutable value: every mutation builds a new snapshot and
/// replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    pub custom_positions: PositionMap,
    pub expanded: ExpandedSet,
}

impl CanvasSnapshot {
    pub fn new(custom_positions: PositionMap, expanded: ExpandedSet) -> Self {
        Self {
            custom_positions,
            expanded,
        }
    }

    pub fn with_custom_positions(&self, custom_positions: PositionMap) -> Self {
        Self {
            custom_positions,
            expanded: self.expanded.clone(),
        }
    }

    pub fn with_expanded(&self, expanded: ExpandedSet) -> Self {
        Self {
            custom_positions: self.custom_positions.clone(),
            expanded,
        }
    }
}

/// Merge computed and custom positions; custom wins per id.
pub fn effective_positions(computed: &PositionMap, custom: &PositionMap) -> PositionMap {
    let mut merged = computed.clone();
    for (id, pos) in custom {
        merged.insert(id.clone(), *pos);
    }
    merged
}

/// Notifications raised to collaborators. The core never creates or deletes
/// documents itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CanvasEvent {
    Toggled { id: DocumentId },
    DeleteRequested { id: DocumentId, title: String },
    NodeSelected { id: DocumentId },
    AddChildRequested { parent_id: DocumentId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_numeric_and_string_ids_when_deserializing_then_both_become_strings() {
        let docs: Vec<DocumentNode> = serde_json::from_str(
            r#"[{"id": 1, "title": "a"}, {"id": "2", "parentId": 1, "treeOrder": 3}]"#,
        )
        .unwrap();

        assert_eq!(docs[0].id, DocumentId::from("1"));
        assert_eq!(docs[1].parent_id, Some(DocumentId::from("1")));
        assert_eq!(docs[1].tree_order, 3);
        assert_eq!(docs[1].word_count, 0);
        assert_eq!(docs[1].title, "");
    }

    #[test]
    fn given_null_or_empty_parent_when_deserializing_then_no_parent() {
        let docs: Vec<DocumentNode> = serde_json::from_str(
            r#"[{"id": "a", "parentId": null, "treeOrder": null, "wordCount": null},
                {"id": "b", "parentId": ""}]"#,
        )
        .unwrap();

        assert!(docs[0].parent_id.is_none());
        assert_eq!(docs[0].tree_order, 0);
        assert!(docs[1].parent_id.is_none());
    }

    #[test]
    fn given_custom_position_when_merging_then_custom_wins() {
        let mut computed = PositionMap::new();
        computed.insert("a".into(), Position::new(1.0, 1.0));
        computed.insert("b".into(), Position::new(2.0, 2.0));
        let mut custom = PositionMap::new();
        custom.insert("b".into(), Position::new(9.0, 9.0));

        let merged = effective_positions(&computed, &custom);

        assert_eq!(merged[&DocumentId::from("a")], Position::new(1.0, 1.0));
        assert_eq!(merged[&DocumentId::from("b")], Position::new(9.0, 9.0));
    }
}
