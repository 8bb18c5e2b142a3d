//! Structural rules every document must satisfy.

use crate::ast::{Node, NodeKind};
use crate::error::{ModelError, ModelResult};
use crate::table::TableMap;

fn violation(message: impl Into<String>) -> ModelError {
    ModelError::invalid_structure(message)
}

impl Node {
    /// Validate this node as a document root
    pub fn check(&self) -> ModelResult<()> {
        if self.kind != NodeKind::Doc {
            return Err(violation(format!(
                "document root must be doc, found {}",
                self.kind.name()
            )));
        }
        self.check_node()
    }

    /// Validate this node and its descendants
    pub fn check_node(&self) -> ModelResult<()> {
        if !self.is_text() && !self.marks.is_empty() {
            return Err(violation(format!("{} cannot carry marks", self.kind.name())));
        }

        match &self.kind {
            NodeKind::Text { value } => {
                if value.is_empty() {
                    return Err(violation("text nodes must not be empty"));
                }
                if !self.children.is_empty() {
                    return Err(violation("text nodes cannot have children"));
                }
                Ok(())
            }
            NodeKind::Image { src, width } => {
                if src.trim().is_empty() {
                    return Err(violation("image requires a src"));
                }
                if *width == Some(0) {
                    return Err(violation("image width must be positive"));
                }
                self.check_leaf()
            }
            NodeKind::HorizontalRule => self.check_leaf(),
            NodeKind::Paragraph { .. } | NodeKind::Heading { .. } => {
                if let NodeKind::Heading { level, .. } = self.kind {
                    if !(1..=4).contains(&level) {
                        return Err(violation(format!("heading level {level} out of range 1..=4")));
                    }
                }
                self.check_inline_content()
            }
            NodeKind::BulletList | NodeKind::OrderedList { .. } | NodeKind::TaskList => {
                if self.children.is_empty() {
                    return Err(violation(format!("{} must not be empty", self.kind.name())));
                }
                let task = self.kind == NodeKind::TaskList;
                for item in &self.children {
                    let matches = match item.kind {
                        NodeKind::TaskItem { .. } => task,
                        NodeKind::ListItem => !task,
                        _ => false,
                    };
                    if !matches {
                        return Err(violation(format!(
                            "{} cannot contain {}",
                            self.kind.name(),
                            item.kind.name()
                        )));
                    }
                    item.check_node()?;
                }
                Ok(())
            }
            NodeKind::Table => {
                TableMap::build(self)?;
                for row in &self.children {
                    for cell in &row.children {
                        cell.check_node()?;
                    }
                }
                Ok(())
            }
            NodeKind::TableRow => Err(violation("table row outside of a table")),
            NodeKind::Doc
            | NodeKind::ListItem
            | NodeKind::TaskItem { .. }
            | NodeKind::TableCell(_)
            | NodeKind::TableHeaderCell(_) => self.check_block_content(),
        }
    }

    fn check_leaf(&self) -> ModelResult<()> {
        if self.children.is_empty() {
            Ok(())
        } else {
            Err(violation(format!("{} cannot have children", self.kind.name())))
        }
    }

    fn check_block_content(&self) -> ModelResult<()> {
        if self.children.is_empty() {
            return Err(violation(format!(
                "{} must contain at least one block",
                self.kind.name()
            )));
        }
        for child in &self.children {
            if !child.kind.is_block() {
                return Err(violation(format!(
                    "{} cannot contain {}",
                    self.kind.name(),
                    child.kind.name()
                )));
            }
            child.check_node()?;
        }
        Ok(())
    }

    fn check_inline_content(&self) -> ModelResult<()> {
        let mut previous: Option<&Node> = None;
        for child in &self.children {
            if !child.is_text() {
                return Err(violation(format!(
                    "{} cannot contain {}",
                    self.kind.name(),
                    child.kind.name()
                )));
            }
            child.check_node()?;
            if previous.map_or(false, |p| p.marks == child.marks) {
                return Err(violation("adjacent text nodes with equal marks must be merged"));
            }
            previous = Some(child);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::Mark;

    #[test]
    fn test_valid_document() {
        let doc = Node::doc(vec![
            Node::heading(1, vec![Node::plain_text("Title")]),
            Node::paragraph(vec![
                Node::marked_text("bold", [Mark::Bold]),
                Node::plain_text(" plain"),
            ]),
            Node::task_list(vec![Node::task_item(true, vec![Node::paragraph_text("done")])]),
            crate::table::empty_table(2, 2, true),
            Node::image("https://example.com/cat.png", Some(200)),
        ]);
        assert!(doc.check().is_ok());
    }

    #[test]
    fn test_list_item_rejects_bare_text() {
        let doc = Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![
            Node::plain_text("bare"),
        ])])]);
        assert!(doc.check().is_err());
    }

    #[test]
    fn test_rejects_unmerged_text() {
        let doc = Node::doc(vec![Node::paragraph(vec![
            Node::plain_text("a"),
            Node::plain_text("b"),
        ])]);
        let err = doc.check().unwrap_err();
        assert!(err.to_string().contains("merged"));
    }

    #[test]
    fn test_rejects_wrong_item_kind() {
        let doc = Node::doc(vec![Node::task_list(vec![Node::list_item(vec![
            Node::paragraph_text("x"),
        ])])]);
        assert!(doc.check().is_err());
    }

    #[test]
    fn test_rejects_empty_doc_and_bad_heading() {
        assert!(Node::doc(vec![]).check().is_err());
        assert!(Node::doc(vec![Node::heading(5, vec![])]).check().is_err());
    }

    #[test]
    fn test_rejects_non_row_in_table() {
        let doc = Node::doc(vec![Node::table(vec![Node::paragraph_text("x")])]);
        assert!(doc.check().is_err());
    }
}
