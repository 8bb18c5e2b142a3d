//! Table commands.
//!
//! Structural edits go through a [`TableGrid`]: the table is lifted into
//! grid form, edited, normalized and rebuilt, so the result is always
//! rectangular. The cursor is then placed explicitly inside a cell.

use super::{block_slot, container_before, missing, nearest_cursor, Edit};
use crate::mapping::Mapping;
use crate::selection::Selection;
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{empty_table, CellInfo, Node, NodeKind, Rect, TableGrid, TableMap};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Axis {
    Row,
    Column,
}

/// The table around the selection and the cell rectangle it covers
struct TableSelection<'a> {
    table: &'a Node,
    /// Position before the table node
    table_pos: usize,
    map: TableMap,
    rect: Rect,
    /// Map index of the cell holding the anchor
    anchor: usize,
    /// Anchor offset inside that cell's content, when it lies inside one
    anchor_offset: Option<usize>,
}

impl TableSelection<'_> {
    /// Position before the cell with map index `index`
    fn cell_pos(&self, index: usize) -> usize {
        self.table_pos + 1 + self.map.cells[index].offset
    }
}

enum Focus {
    /// Stay in the anchor cell
    Keep,
    /// The cell covering a grid slot, clamped to the new table
    Slot(usize, usize),
}

fn table_selection(doc: &Document) -> EditorResult<TableSelection<'_>> {
    let root = doc.root();
    let sel = doc.selection();

    let mut found = None;
    for pos in [sel.anchor, sel.head] {
        let rp = root.resolve(pos)?;
        if let Some(depth) = rp.find_ancestor(|n| n.kind == NodeKind::Table) {
            if depth > 0 {
                found = Some((rp.before(depth), rp.start(depth), rp.node(depth)));
                break;
            }
        }
    }
    let (table_pos, start, table) =
        found.ok_or_else(|| EditorError::rejected("selection is not inside a table"))?;
    let map = TableMap::build(table)?;
    let end = start + table.content_size();

    let relative = |pos: usize| pos.clamp(start, end) - start;
    let anchor = cell_near(&map, relative(sel.anchor), sel.anchor <= sel.head);
    let head = cell_near(&map, relative(sel.head), sel.head <= sel.anchor);
    let rect = map.expand(map.cells[anchor].rect().union(map.cells[head].rect()));

    let info = &map.cells[anchor];
    let anchor_offset = sel
        .anchor
        .checked_sub(start + info.offset + 1)
        .filter(|&off| off + 2 <= info.size);

    Ok(TableSelection {
        table,
        table_pos,
        map,
        rect,
        anchor,
        anchor_offset,
    })
}

/// Cell containing a table-relative position; positions between cells pick
/// the next cell going forward, the previous one going backward
fn cell_near(map: &TableMap, rel: usize, forward: bool) -> usize {
    if let Some(index) = map.cell_containing(rel) {
        return index;
    }
    let last = map.cells.len().saturating_sub(1);
    if forward {
        map.cells
            .iter()
            .position(|c| c.offset >= rel)
            .unwrap_or(last)
    } else {
        map.cells
            .iter()
            .rposition(|c| c.offset + c.size <= rel)
            .unwrap_or(0)
    }
}

/// Replace the table with the grid's contents and place the cursor
fn rebuild(doc: &Document, ts: &TableSelection<'_>, mut grid: TableGrid, focus: Focus) -> EditorResult<Applied> {
    grid.normalize();
    let (table, origins) = grid.build();
    let map = TableMap::build(&table)?;

    let anchor_info = &ts.map.cells[ts.anchor];
    let slot = match focus {
        Focus::Keep => (anchor_info.row, anchor_info.col),
        Focus::Slot(row, col) => (row, col),
    };
    let kept = match focus {
        Focus::Keep => origins.iter().position(|o| *o == Some(ts.anchor)),
        Focus::Slot(..) => None,
    };
    let cell = kept.unwrap_or_else(|| {
        let row = slot.0.min(map.height - 1);
        let col = slot.1.min(map.width - 1);
        map.cell_at(row, col)
    });
    let cell_pos = ts.table_pos + 1 + map.cells[cell].offset;

    let mut root = doc.root().clone();
    let target = root
        .node_at_mut(ts.table_pos)
        .ok_or_else(|| missing("table"))?;
    *target = table;

    let offset = kept.and(ts.anchor_offset);
    let cursor = cursor_in_cell(&root, cell_pos, offset);
    Edit::new(root, Mapping::Identity)
        .with_selection(Selection::cursor(cursor))
        .commit(doc)
}

fn cursor_in_cell(root: &Node, cell_pos: usize, offset: Option<usize>) -> usize {
    let inside = root.node_at(cell_pos).map_or(0, Node::content_size);
    offset
        .filter(|&off| off <= inside)
        .map(|off| cell_pos + 1 + off)
        .filter(|&pos| root.resolve(pos).map_or(false, |rp| rp.parent().is_textblock()))
        .unwrap_or_else(|| nearest_cursor(root, cell_pos))
}

/// Empty every cell of the rectangle spanned by `from` and `to` inside the
/// table at `table_pos`, returning the new root and a cursor in the first one
pub(super) fn clear_cells(
    root: &Node,
    table_pos: usize,
    from: usize,
    to: usize,
) -> EditorResult<(Node, usize)> {
    let table = root.node_at(table_pos).ok_or_else(|| missing("table"))?;
    let map = TableMap::build(table)?;
    let start = table_pos + 1;
    let end = start + table.content_size();
    let relative = |pos: usize| pos.clamp(start, end) - start;
    let first = cell_near(&map, relative(from), true);
    let last = cell_near(&map, relative(to), false);
    let cells = map.cells_in(map.expand(map.cells[first].rect().union(map.cells[last].rect())));

    let mut new_root = root.clone();
    // back to front so earlier offsets stay valid
    for &index in cells.iter().rev() {
        let cell = new_root
            .node_at_mut(start + map.cells[index].offset)
            .ok_or_else(|| missing("cell"))?;
        cell.children = vec![Arc::new(Node::paragraph(vec![]))];
    }
    let first_pos = cells.first().map_or(start, |&i| start + map.cells[i].offset);
    let cursor = nearest_cursor(&new_root, first_pos);
    Ok((new_root, cursor))
}

pub(super) fn insert_table(
    doc: &Document,
    rows: usize,
    cols: usize,
    with_header_row: bool,
) -> EditorResult<Applied> {
    if rows == 0 {
        return Err(EditorError::invalid("rows", "a table needs at least one row"));
    }
    if cols == 0 {
        return Err(EditorError::invalid("cols", "a table needs at least one column"));
    }

    let slot = block_slot(doc.root(), doc.selection().head)?;
    let mut new_root = doc.root().clone();
    let container = new_root
        .container_mut(slot.container)
        .ok_or_else(|| missing("block container"))?;
    let table = Arc::new(empty_table(rows, cols, with_header_row));
    if slot.in_empty {
        container.children[slot.index] = table;
    } else {
        container.children.insert(slot.index, table);
    }

    // table, row, cell, paragraph
    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(slot.pos + 4))
        .commit(doc)
}

pub(super) fn add_row(doc: &Document, after: bool) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    let at = if after { ts.rect.bottom } else { ts.rect.top };
    let mut grid = TableGrid::from_table(ts.table)?;
    grid.insert_row(at);
    rebuild(doc, &ts, grid, Focus::Keep)
}

pub(super) fn add_column(doc: &Document, after: bool) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    let at = if after { ts.rect.right } else { ts.rect.left };
    let mut grid = TableGrid::from_table(ts.table)?;
    grid.insert_column(at);
    rebuild(doc, &ts, grid, Focus::Keep)
}

pub(super) fn delete_row(doc: &Document) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    if ts.rect.top == 0 && ts.rect.bottom == ts.map.height {
        return Err(EditorError::rejected(
            "cannot delete every row of a table; delete the table instead",
        ));
    }
    let mut grid = TableGrid::from_table(ts.table)?;
    grid.remove_rows(ts.rect.top, ts.rect.bottom);
    rebuild(doc, &ts, grid, Focus::Slot(ts.rect.top, ts.rect.left))
}

pub(super) fn delete_column(doc: &Document) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    if ts.rect.left == 0 && ts.rect.right == ts.map.width {
        return Err(EditorError::rejected(
            "cannot delete every column of a table; delete the table instead",
        ));
    }
    let mut grid = TableGrid::from_table(ts.table)?;
    grid.remove_columns(ts.rect.left, ts.rect.right);
    rebuild(doc, &ts, grid, Focus::Slot(ts.rect.top, ts.rect.left))
}

pub(super) fn delete_table(doc: &Document) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    let root = doc.root();
    let rp = root.resolve(ts.table_pos)?;
    let depth = rp.depth();
    let index = rp.index(depth);

    let mut new_root = root.clone();
    let container = new_root
        .container_mut(container_before(&rp, depth))
        .ok_or_else(|| missing("block container"))?;
    container.children.remove(index);
    if container.children.is_empty() {
        container.children.push(Arc::new(Node::paragraph(vec![])));
    }

    let cursor = nearest_cursor(&new_root, ts.table_pos);
    Edit::new(new_root, Mapping::Identity)
        .with_selection(Selection::cursor(cursor))
        .commit(doc)
}

pub(super) fn set_cell_attribute(doc: &Document, name: &str, value: &Value) -> EditorResult<Applied> {
    let color = match name {
        "backgroundColor" => match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            _ => {
                return Err(EditorError::invalid(
                    "value",
                    "backgroundColor must be a string or null",
                ))
            }
        },
        "colspan" | "rowspan" => {
            return Err(EditorError::invalid(
                "name",
                format!("{name} changes through mergeCells and splitCell"),
            ))
        }
        other => {
            return Err(EditorError::invalid(
                "name",
                format!("unknown cell attribute '{other}'"),
            ))
        }
    };

    let ts = table_selection(doc)?;
    let mut root = doc.root().clone();
    for index in ts.map.cells_in(ts.rect) {
        let cell = root
            .node_at_mut(ts.cell_pos(index))
            .ok_or_else(|| missing("cell"))?;
        if let Some(attrs) = cell.kind.cell_attrs_mut() {
            if attrs.background_color != color {
                attrs.background_color = color.clone();
            }
        }
    }
    Edit::new(root, Mapping::Identity).commit(doc)
}

pub(super) fn merge_cells(doc: &Document) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    let mut grid = TableGrid::from_table(ts.table)?;
    grid.merge(ts.rect).map_err(EditorError::rejected)?;
    rebuild(doc, &ts, grid, Focus::Slot(ts.rect.top, ts.rect.left))
}

pub(super) fn split_cell(doc: &Document) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    let cells = ts.map.cells_in(ts.rect);
    if cells.len() != 1 {
        return Err(EditorError::rejected("select a single merged cell to split"));
    }
    let mut grid = TableGrid::from_table(ts.table)?;
    let index = grid.find_origin(cells[0]).ok_or_else(|| missing("cell"))?;
    grid.split(index).map_err(EditorError::rejected)?;
    rebuild(doc, &ts, grid, Focus::Keep)
}

/// Toggle the first row or column between header and body cells. A cell
/// that also belongs to the other axis' header line stays a header.
pub(super) fn toggle_header(doc: &Document, axis: Axis) -> EditorResult<Applied> {
    let ts = table_selection(doc)?;
    let map = &ts.map;
    let header = |row: usize, col: usize| map.cells[map.cell_at(row, col)].header;

    let (turning_on, crossing) = match axis {
        Axis::Row => (
            !map.is_header_row(0),
            map.height > 1 && (1..map.height).all(|row| header(row, 0)),
        ),
        Axis::Column => (
            !map.is_header_column(0),
            map.width > 1 && (1..map.width).all(|col| header(0, col)),
        ),
    };
    let in_line = |info: &CellInfo| match axis {
        Axis::Row => info.row == 0,
        Axis::Column => info.col == 0,
    };
    let on_crossing = |info: &CellInfo| match axis {
        Axis::Row => info.col == 0,
        Axis::Column => info.row == 0,
    };

    let mut root = doc.root().clone();
    for (index, info) in map.cells.iter().enumerate() {
        if !in_line(info) {
            continue;
        }
        let header = turning_on || (crossing && on_crossing(info));
        if header == info.header {
            continue;
        }
        let cell = root
            .node_at_mut(ts.cell_pos(index))
            .ok_or_else(|| missing("cell"))?;
        if let Some(attrs) = cell.kind.cell_attrs().cloned() {
            cell.kind = if header {
                NodeKind::TableHeaderCell(attrs)
            } else {
                NodeKind::TableCell(attrs)
            };
        }
    }
    Edit::new(root, Mapping::Identity).commit(doc)
}
