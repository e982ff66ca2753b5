//! Tests for TreeBuilder and the resulting Forest

use std::collections::BTreeSet;

use rstest::rstest;

use doccanvas::domain::{DocumentId, DocumentNode, Forest, TreeBuilder};

fn ids(forest: &Forest) -> Vec<String> {
    forest
        .iter()
        .map(|(_, node)| node.document.id.to_string())
        .collect()
}

fn root_ids(forest: &Forest) -> Vec<String> {
    forest
        .roots()
        .iter()
        .filter_map(|&idx| forest.get_node(idx))
        .map(|node| node.document.id.to_string())
        .collect()
}

#[test]
fn given_flat_list_with_parents_when_building_then_every_document_appears_once() {
    // Arrange
    let docs = vec![
        DocumentNode::new("1", "Book"),
        DocumentNode::new("2", "Part I").with_parent("1"),
        DocumentNode::new("3", "Part II").with_parent("1"),
        DocumentNode::new("4", "Chapter").with_parent("2"),
        DocumentNode::new("5", "Notes"),
    ];

    // Act
    let forest = TreeBuilder::new().build(docs);

    // Assert
    let all = ids(&forest);
    assert_eq!(all.len(), 5);
    let unique: BTreeSet<_> = all.iter().collect();
    assert_eq!(unique.len(), 5);
    assert_eq!(root_ids(&forest), vec!["1", "5"]);
    assert_eq!(all, vec!["1", "2", "4", "3", "5"]);
}

#[test]
fn given_unknown_parent_when_building_then_document_becomes_root() {
    // Arrange
    let docs = vec![
        DocumentNode::new("1", "Root"),
        DocumentNode::new("2", "Orphan").with_parent("99"),
    ];

    // Act
    let forest = TreeBuilder::new().build(docs);

    // Assert
    assert_eq!(root_ids(&forest), vec!["1", "2"]);
}

#[test]
fn given_tree_order_when_building_then_children_sorted_stably() {
    // Arrange
    let docs = vec![
        DocumentNode::new("p", "Parent"),
        DocumentNode::new("c", "third").with_parent("p").with_order(2),
        DocumentNode::new("a", "first").with_parent("p").with_order(0),
        DocumentNode::new("b", "tie-first").with_parent("p").with_order(1),
        DocumentNode::new("d", "tie-second").with_parent("p").with_order(1),
    ];

    // Act
    let forest = TreeBuilder::new().build(docs);

    // Assert
    let children: Vec<String> = forest
        .children(&DocumentId::from("p"))
        .unwrap()
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(children, vec!["a", "b", "d", "c"]);
}

#[rstest]
#[case::two_cycle(vec![("a", "b"), ("b", "a")])]
#[case::three_cycle(vec![("a", "c"), ("b", "a"), ("c", "b")])]
#[case::self_parent(vec![("a", "a"), ("b", "a")])]
#[case::tail_into_cycle(vec![("t", "a"), ("a", "b"), ("b", "a")])]
fn given_parent_cycle_when_building_then_terminates_with_every_node_reachable(
    #[case] edges: Vec<(&str, &str)>,
) {
    // Arrange
    let docs: Vec<DocumentNode> = edges
        .iter()
        .map(|(id, parent)| DocumentNode::new(*id, *id).with_parent(*parent))
        .collect();

    // Act
    let forest = TreeBuilder::new().build(docs);

    // Assert
    assert!(!forest.roots().is_empty());
    assert_eq!(ids(&forest).len(), edges.len());
    assert_eq!(forest.len(), edges.len());
}

#[test]
fn given_numeric_and_string_ids_when_parsing_json_then_ids_unify() {
    // Arrange
    let json = r#"[
        {"id": 1, "title": "Root", "parentId": null},
        {"id": "2", "title": "Child", "parentId": 1, "treeOrder": 0},
        {"id": 3, "title": "Blank parent", "parentId": ""}
    ]"#;

    // Act
    let docs: Vec<DocumentNode> = serde_json::from_str(json).unwrap();
    let forest = TreeBuilder::new().build(docs);

    // Assert
    assert_eq!(root_ids(&forest), vec!["1", "3"]);
    assert!(forest.has_children(&DocumentId::from(1i64)));
    assert_eq!(
        forest.descendants(&DocumentId::from("1")).unwrap(),
        vec![DocumentId::from("2")]
    );
}

#[test]
fn given_empty_input_when_building_then_empty_forest() {
    let forest = TreeBuilder::new().build(Vec::new());

    assert!(forest.is_empty());
    assert_eq!(forest.depth(), 0);
    assert!(forest.roots().is_empty());
}

#[test]
fn given_forest_when_rendering_tree_string_then_marks_expanded_nodes() {
    // Arrange
    let forest = TreeBuilder::new().build(vec![
        DocumentNode::new("1", "Book"),
        DocumentNode::new("2", "Chapter").with_parent("1"),
    ]);
    let expanded = [DocumentId::from("1")].into_iter().collect();

    // Act
    let rendered = forest.to_tree_string(&expanded).to_string();

    // Assert
    assert!(rendered.contains("Book"));
    assert!(rendered.contains("Chapter"));
}
