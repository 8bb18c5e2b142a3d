use crate::ast::{Node, NodeKind, NodeRef};
use crate::error::{ModelError, ModelResult};
use crate::table::{Rect, TableGrid, TableMap};
use std::sync::Arc;

impl Node {
    /// Detached copy of the content between two positions, wrapped in a
    /// `doc`. Ancestors shared by both ends are dropped down to the nearest
    /// textblock, list or block container; partially covered nodes are cut.
    /// When the ends lie in different cells of one table the result is a
    /// table holding the covered cell rectangle.
    pub fn slice_between(&self, from: usize, to: usize) -> ModelResult<Node> {
        let (from, to) = (from.min(to), from.max(to));
        let size = self.content_size();
        if to > size {
            return Err(ModelError::out_of_range(to, size));
        }

        let resolved = self.resolve(from)?;
        let mut depth = resolved.shared_depth(to);
        let shared = resolved.node(depth);
        if matches!(shared.kind, NodeKind::Table | NodeKind::TableRow) {
            let table_depth = if shared.kind == NodeKind::Table { depth } else { depth - 1 };
            let table = resolved.node(table_depth);
            let start = resolved.start(table_depth);
            let rect_table = cell_rect_slice(table, from - start, to - start)?;
            return Ok(Node::doc(vec![rect_table]));
        }
        while depth > 0 {
            let kind = &resolved.node(depth).kind;
            if kind.is_textblock() || kind.is_list() || kind.is_block_container() {
                break;
            }
            depth -= 1;
        }

        let node = resolved.node(depth);
        let start = resolved.start(depth);
        let cut = node.cut_children(from - start, to - start);
        let content = if node.is_textblock() || node.kind.is_list() {
            vec![Arc::new(node.copy_with(cut))]
        } else {
            cut
        };
        Ok(Node::from_refs(NodeKind::Doc, content))
    }

    /// Children restricted to the content range `from..to`
    pub fn cut_children(&self, from: usize, to: usize) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut pos = 0;
        for child in &self.children {
            let size = child.node_size();
            let end = pos + size;
            if pos >= to {
                break;
            }
            if end > from {
                if child.is_text() {
                    let start = from.saturating_sub(pos);
                    let stop = (to - pos).min(size);
                    out.push(Arc::new(child.cut_text(start, stop)));
                } else if child.is_atom() || (from <= pos && end <= to) {
                    out.push(child.clone());
                } else {
                    let inner_from = from.saturating_sub(pos + 1);
                    let inner_to = to.saturating_sub(pos + 1).min(child.content_size());
                    out.push(Arc::new(child.copy_with(child.cut_children(inner_from, inner_to))));
                }
            }
            pos = end;
        }
        out
    }
}

/// Table of the cells spanned by two table-relative positions
fn cell_rect_slice(table: &Node, from: usize, to: usize) -> ModelResult<Node> {
    let map = TableMap::build(table)?;
    let anchor = map.cell_containing(from);
    let head = map.cell_containing(to.saturating_sub(1).max(from));
    let rect = match (anchor, head) {
        (Some(a), Some(h)) => map.expand(map.cells[a].rect().union(map.cells[h].rect())),
        _ => Rect::new(0, 0, map.width, map.height),
    };

    let mut grid = TableGrid::from_table(table)?;
    grid.cells.retain(|c| rect.contains(&c.rect()));
    for cell in &mut grid.cells {
        cell.row -= rect.top;
        cell.col -= rect.left;
    }
    grid.width = rect.width();
    grid.height = rect.height();
    Ok(grid.build().0)
}
