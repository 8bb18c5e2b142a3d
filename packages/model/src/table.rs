//! Table geometry.
//!
//! [`TableMap`] is a read-only view of where every cell of a table sits on
//! the grid once `colspan`/`rowspan` are applied. [`TableGrid`] is an editable
//! copy used to insert, remove, merge and split cells; rebuilding a table from
//! a grid always yields a rectangular table.

use crate::ast::{CellAttrs, Node, NodeKind, NodeRef};
use crate::error::{ModelError, ModelResult};
use std::sync::Arc;

/// Half-open rectangle of grid slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Rect {
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn union(self, other: Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    pub fn width(&self) -> usize {
        self.right - self.left
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top
    }
}

/// Placement of one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellInfo {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
    /// Index of the cell within its row node
    pub index: usize,
    /// Position of the cell relative to the table's content start
    pub offset: usize,
    pub size: usize,
    pub header: bool,
}

impl CellInfo {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.col,
            self.row,
            self.col + self.colspan,
            self.row + self.rowspan,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMap {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellInfo>,
    /// `width * height` slots, each holding an index into `cells`
    grid: Vec<usize>,
}

impl TableMap {
    /// Compute the geometry of a table, rejecting malformed tables
    pub fn build(table: &Node) -> ModelResult<Self> {
        if table.kind != NodeKind::Table {
            return Err(ModelError::invalid_structure(format!(
                "expected table, found {}",
                table.kind.name()
            )));
        }
        let height = table.children.len();
        if height == 0 {
            return Err(ModelError::invalid_structure("table must contain at least one row"));
        }

        let mut slots: Vec<Vec<Option<usize>>> = vec![Vec::new(); height];
        let mut cells = Vec::new();
        let mut row_offset = 0;
        for (r, row) in table.children.iter().enumerate() {
            if row.kind != NodeKind::TableRow {
                return Err(ModelError::invalid_structure(format!(
                    "table may only contain rows, found {}",
                    row.kind.name()
                )));
            }
            if row.children.is_empty() {
                return Err(ModelError::invalid_structure(format!(
                    "table row {r} must contain at least one cell"
                )));
            }

            let mut col = 0;
            let mut cell_offset = row_offset + 1;
            for (index, cell) in row.children.iter().enumerate() {
                let attrs = cell.kind.cell_attrs().ok_or_else(|| {
                    ModelError::invalid_structure(format!(
                        "table row may only contain cells, found {}",
                        cell.kind.name()
                    ))
                })?;
                let (colspan, rowspan) = (attrs.colspan as usize, attrs.rowspan as usize);
                if colspan == 0 || rowspan == 0 {
                    return Err(ModelError::invalid_structure("cell spans must be at least 1"));
                }
                if r + rowspan > height {
                    return Err(ModelError::invalid_structure(format!(
                        "cell in row {r} spans past the last row"
                    )));
                }

                while slots[r].get(col).map_or(false, Option::is_some) {
                    col += 1;
                }
                for rr in r..r + rowspan {
                    let line = &mut slots[rr];
                    if line.len() < col + colspan {
                        line.resize(col + colspan, None);
                    }
                    for slot in &mut line[col..col + colspan] {
                        if slot.is_some() {
                            return Err(ModelError::invalid_structure(format!(
                                "overlapping cells at row {rr}"
                            )));
                        }
                        *slot = Some(cells.len());
                    }
                }

                let size = cell.node_size();
                cells.push(CellInfo {
                    row: r,
                    col,
                    rowspan,
                    colspan,
                    index,
                    offset: cell_offset,
                    size,
                    header: matches!(cell.kind, NodeKind::TableHeaderCell(_)),
                });
                col += colspan;
                cell_offset += size;
            }
            row_offset += row.node_size();
        }

        let width = slots.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Vec::with_capacity(width * height);
        for (r, line) in slots.iter().enumerate() {
            if line.len() != width || line.iter().any(Option::is_none) {
                let covered = line.iter().filter(|s| s.is_some()).count();
                return Err(ModelError::invalid_structure(format!(
                    "table is not rectangular: row {r} covers {covered} of {width} columns"
                )));
            }
            grid.extend(line.iter().flatten().copied());
        }

        Ok(Self {
            width,
            height,
            cells,
            grid,
        })
    }

    /// Index of the cell covering a slot
    pub fn cell_at(&self, row: usize, col: usize) -> usize {
        self.grid[row * self.width + col]
    }

    /// Cell whose node contains the content-relative position `pos`
    pub fn cell_containing(&self, pos: usize) -> Option<usize> {
        self.cells
            .iter()
            .position(|c| c.offset <= pos && pos < c.offset + c.size)
    }

    /// Grow `rect` until no cell straddles its border
    pub fn expand(&self, mut rect: Rect) -> Rect {
        loop {
            let grown = self
                .cells
                .iter()
                .filter(|c| c.rect().overlaps(&rect))
                .fold(rect, |acc, c| acc.union(c.rect()));
            if grown == rect {
                return rect;
            }
            rect = grown;
        }
    }

    /// Cells overlapping `rect`, in row-major order
    pub fn cells_in(&self, rect: Rect) -> Vec<usize> {
        (0..self.cells.len())
            .filter(|&i| self.cells[i].rect().overlaps(&rect))
            .collect()
    }

    pub fn is_header_row(&self, row: usize) -> bool {
        (0..self.width).all(|col| self.cells[self.cell_at(row, col)].header)
    }

    pub fn is_header_column(&self, col: usize) -> bool {
        (0..self.height).all(|row| self.cells[self.cell_at(row, col)].header)
    }
}

/// One cell of an editable grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub node: NodeRef,
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
    /// Index of the cell in the source [`TableMap`], `None` for new cells
    pub origin: Option<usize>,
}

impl GridCell {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.col,
            self.row,
            self.col + self.colspan,
            self.row + self.rowspan,
        )
    }

    pub fn is_header(&self) -> bool {
        matches!(self.node.kind, NodeKind::TableHeaderCell(_))
    }

    fn covers(&self, row: usize, col: usize) -> bool {
        self.row <= row && row < self.row + self.rowspan && self.col <= col && col < self.col + self.colspan
    }
}

/// Editable table layout
#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<GridCell>,
}

impl TableGrid {
    pub fn from_table(table: &Node) -> ModelResult<Self> {
        let map = TableMap::build(table)?;
        let cells = map
            .cells
            .iter()
            .enumerate()
            .map(|(i, info)| GridCell {
                node: table.children[info.row].children[info.index].clone(),
                row: info.row,
                col: info.col,
                rowspan: info.rowspan,
                colspan: info.colspan,
                origin: Some(i),
            })
            .collect();
        Ok(Self {
            width: map.width,
            height: map.height,
            cells,
        })
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<usize> {
        self.cells.iter().position(|c| c.covers(row, col))
    }

    pub fn find_origin(&self, origin: usize) -> Option<usize> {
        self.cells.iter().position(|c| c.origin == Some(origin))
    }

    pub fn is_header_row(&self, row: usize) -> bool {
        (0..self.width).all(|col| self.cell_at(row, col).map_or(false, |i| self.cells[i].is_header()))
    }

    pub fn is_header_column(&self, col: usize) -> bool {
        (0..self.height).all(|row| self.cell_at(row, col).map_or(false, |i| self.cells[i].is_header()))
    }

    /// Insert an empty row so that it becomes row `at`
    pub fn insert_row(&mut self, at: usize) {
        let header_columns: Vec<bool> = (0..self.width).map(|c| self.is_header_column(c)).collect();
        for cell in &mut self.cells {
            if cell.row >= at {
                cell.row += 1;
            } else if cell.row + cell.rowspan > at {
                cell.rowspan += 1;
            }
        }
        self.height += 1;
        for col in 0..self.width {
            if self.cell_at(at, col).is_none() {
                self.push_empty(at, col, header_columns[col]);
            }
        }
    }

    /// Insert an empty column so that it becomes column `at`
    pub fn insert_column(&mut self, at: usize) {
        let header_rows: Vec<bool> = (0..self.height).map(|r| self.is_header_row(r)).collect();
        for cell in &mut self.cells {
            if cell.col >= at {
                cell.col += 1;
            } else if cell.col + cell.colspan > at {
                cell.colspan += 1;
            }
        }
        self.width += 1;
        for row in 0..self.height {
            if self.cell_at(row, at).is_none() {
                self.push_empty(row, at, header_rows[row]);
            }
        }
    }

    /// Remove rows `top..bottom`; cells spanning into the range shrink
    pub fn remove_rows(&mut self, top: usize, bottom: usize) {
        let removed = bottom - top;
        for cell in &mut self.cells {
            let end = cell.row + cell.rowspan;
            let overlap = end.min(bottom).saturating_sub(cell.row.max(top));
            cell.rowspan -= overlap;
            if cell.row >= bottom {
                cell.row -= removed;
            } else if cell.row >= top {
                cell.row = top;
            }
        }
        self.cells.retain(|c| c.rowspan > 0);
        self.height -= removed;
    }

    /// Remove columns `left..right`; cells spanning into the range shrink
    pub fn remove_columns(&mut self, left: usize, right: usize) {
        let removed = right - left;
        for cell in &mut self.cells {
            let end = cell.col + cell.colspan;
            let overlap = end.min(right).saturating_sub(cell.col.max(left));
            cell.colspan -= overlap;
            if cell.col >= right {
                cell.col -= removed;
            } else if cell.col >= left {
                cell.col = left;
            }
        }
        self.cells.retain(|c| c.colspan > 0);
        self.width -= removed;
    }

    /// Merge every cell inside `rect` into its top-left cell
    pub fn merge(&mut self, rect: Rect) -> Result<usize, String> {
        let mut inside: Vec<usize> = Vec::new();
        for (i, cell) in self.cells.iter().enumerate() {
            let cell_rect = cell.rect();
            if !cell_rect.overlaps(&rect) {
                continue;
            }
            if !rect.contains(&cell_rect) {
                return Err("selection cuts through a merged cell".to_string());
            }
            inside.push(i);
        }
        if inside.len() < 2 {
            return Err("select at least two cells to merge".to_string());
        }
        inside.sort_by_key(|&i| (self.cells[i].row, self.cells[i].col));
        let target = inside[0];

        let mut content: Vec<NodeRef> = Vec::new();
        for &i in &inside {
            let node = &self.cells[i].node;
            let blank = node.children.len() == 1 && node.children[0].is_empty_textblock();
            if !blank {
                content.extend(node.children.iter().cloned());
            }
        }
        if content.is_empty() {
            content.push(Arc::new(Node::paragraph(vec![])));
        }

        let cell = &mut self.cells[target];
        Arc::make_mut(&mut cell.node).children = content;
        cell.rowspan = rect.height();
        cell.colspan = rect.width();

        let drop: Vec<usize> = inside[1..].to_vec();
        let mut index = 0;
        self.cells.retain(|_| {
            let keep = !drop.contains(&index);
            index += 1;
            keep
        });
        // normalize only shrinks spans, so indices stay put
        self.normalize();
        Ok(target - drop.iter().filter(|&&i| i < target).count())
    }

    /// Split a spanning cell back into 1x1 cells
    pub fn split(&mut self, index: usize) -> Result<(), String> {
        let cell = &self.cells[index];
        if cell.rowspan == 1 && cell.colspan == 1 {
            return Err("cell is not merged".to_string());
        }
        let rect = cell.rect();
        let header = cell.is_header();
        let mut attrs = cell.node.kind.cell_attrs().cloned().unwrap_or_default();
        attrs.colspan = 1;
        attrs.rowspan = 1;

        let cell = &mut self.cells[index];
        cell.rowspan = 1;
        cell.colspan = 1;
        for row in rect.top..rect.bottom {
            for col in rect.left..rect.right {
                if row == rect.top && col == rect.left {
                    continue;
                }
                self.cells.push(GridCell {
                    node: Arc::new(Node::empty_cell(header, attrs.clone())),
                    row,
                    col,
                    rowspan: 1,
                    colspan: 1,
                    origin: None,
                });
            }
        }
        Ok(())
    }

    /// Switch a cell between header and body kind, keeping its attrs
    pub fn set_header(&mut self, index: usize, header: bool) {
        let node = Arc::make_mut(&mut self.cells[index].node);
        if let Some(attrs) = node.kind.cell_attrs().cloned() {
            node.kind = if header {
                NodeKind::TableHeaderCell(attrs)
            } else {
                NodeKind::TableCell(attrs)
            };
        }
    }

    /// Collapse rows and columns in which no cell starts
    pub fn normalize(&mut self) {
        let mut row = self.height;
        while row > 0 {
            row -= 1;
            if self.height > 1 && !self.cells.iter().any(|c| c.row == row) {
                for cell in &mut self.cells {
                    if cell.row > row {
                        cell.row -= 1;
                    } else if cell.row + cell.rowspan > row {
                        cell.rowspan -= 1;
                    }
                }
                self.height -= 1;
            }
        }
        let mut col = self.width;
        while col > 0 {
            col -= 1;
            if self.width > 1 && !self.cells.iter().any(|c| c.col == col) {
                for cell in &mut self.cells {
                    if cell.col > col {
                        cell.col -= 1;
                    } else if cell.col + cell.colspan > col {
                        cell.colspan -= 1;
                    }
                }
                self.width -= 1;
            }
        }
    }

    /// Rebuild the table node. Also returns each emitted cell's origin, in
    /// the same order [`TableMap::build`] will list the cells.
    pub fn build(&self) -> (Node, Vec<Option<usize>>) {
        let mut order: Vec<&GridCell> = self.cells.iter().collect();
        order.sort_by_key(|c| (c.row, c.col));

        let mut rows: Vec<Vec<NodeRef>> = vec![Vec::new(); self.height];
        let mut origins = Vec::with_capacity(order.len());
        for cell in order {
            let mut node = cell.node.clone();
            let spans = (cell.colspan as u32, cell.rowspan as u32);
            let current = node.kind.cell_attrs().map(|a| (a.colspan, a.rowspan));
            if current != Some(spans) {
                if let Some(attrs) = Arc::make_mut(&mut node).kind.cell_attrs_mut() {
                    attrs.colspan = spans.0;
                    attrs.rowspan = spans.1;
                }
            }
            rows[cell.row].push(node);
            origins.push(cell.origin);
        }

        let rows = rows
            .into_iter()
            .map(|cells| Arc::new(Node::from_refs(NodeKind::TableRow, cells)))
            .collect();
        (Node::from_refs(NodeKind::Table, rows), origins)
    }

    fn push_empty(&mut self, row: usize, col: usize, header: bool) {
        self.cells.push(GridCell {
            node: Arc::new(Node::empty_cell(header, CellAttrs::default())),
            row,
            col,
            rowspan: 1,
            colspan: 1,
            origin: None,
        });
    }
}

/// A `rows` x `cols` table of empty cells
pub fn empty_table(rows: usize, cols: usize, with_header_row: bool) -> Node {
    let rows = (0..rows)
        .map(|r| {
            let header = with_header_row && r == 0;
            Node::table_row(
                (0..cols)
                    .map(|_| Node::empty_cell(header, CellAttrs::default()))
                    .collect(),
            )
        })
        .collect();
    Node::table(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(text: &str, colspan: u32, rowspan: u32) -> Node {
        Node::new(
            NodeKind::TableCell(CellAttrs {
                colspan,
                rowspan,
                background_color: None,
            }),
            vec![Node::paragraph_text(text)],
        )
    }

    fn row_widths(table: &Node) -> Vec<usize> {
        let map = TableMap::build(table).unwrap();
        (0..map.height)
            .map(|r| {
                let mut seen = Vec::new();
                for c in 0..map.width {
                    let cell = map.cell_at(r, c);
                    if !seen.contains(&cell) {
                        seen.push(cell);
                    }
                }
                seen.iter().map(|&i| map.cells[i].colspan).sum()
            })
            .collect()
    }

    #[test]
    fn test_map_simple_table() {
        let table = empty_table(2, 3, true);
        let map = TableMap::build(&table).unwrap();

        assert_eq!(map.width, 3);
        assert_eq!(map.height, 2);
        assert!(map.is_header_row(0));
        assert!(!map.is_header_row(1));
        // row open + cell open
        assert_eq!(map.cells[0].offset, 1);
        assert_eq!(map.cells[1].offset, 1 + 4);
    }

    #[test]
    fn test_map_with_spans() {
        let table = Node::table(vec![
            Node::table_row(vec![cell_with("a", 2, 1), cell_with("b", 1, 2)]),
            Node::table_row(vec![cell_with("c", 1, 1), cell_with("d", 1, 1)]),
        ]);
        let map = TableMap::build(&table).unwrap();

        assert_eq!(map.width, 3);
        assert_eq!(map.cell_at(1, 2), 1);
        assert_eq!(map.cells[3].col, 1);
    }

    #[test]
    fn test_map_rejects_empty_row() {
        let table = Node::table(vec![Node::table_row(vec![])]);
        assert!(TableMap::build(&table).is_err());
    }

    #[test]
    fn test_map_rejects_ragged_rows() {
        let table = Node::table(vec![
            Node::table_row(vec![cell_with("a", 1, 1), cell_with("b", 1, 1)]),
            Node::table_row(vec![cell_with("c", 1, 1)]),
        ]);
        let err = TableMap::build(&table).unwrap_err();
        assert!(err.to_string().contains("not rectangular"));
    }

    #[test]
    fn test_expand_rect_includes_spanning_cells() {
        let table = Node::table(vec![
            Node::table_row(vec![cell_with("a", 2, 1), cell_with("b", 1, 1)]),
            Node::table_row(vec![
                cell_with("c", 1, 1),
                cell_with("d", 1, 1),
                cell_with("e", 1, 1),
            ]),
        ]);
        let map = TableMap::build(&table).unwrap();
        let rect = map.expand(Rect::new(1, 0, 2, 2));
        assert_eq!(rect, Rect::new(0, 0, 2, 2));
    }

    #[test]
    fn test_insert_row_extends_rowspan() {
        let table = Node::table(vec![
            Node::table_row(vec![cell_with("a", 1, 2), cell_with("b", 1, 1)]),
            Node::table_row(vec![cell_with("c", 1, 1)]),
        ]);
        let mut grid = TableGrid::from_table(&table).unwrap();
        grid.insert_row(1);
        let (rebuilt, _) = grid.build();

        let map = TableMap::build(&rebuilt).unwrap();
        assert_eq!(map.height, 3);
        assert_eq!(map.cells[0].rowspan, 3);
        assert_eq!(row_widths(&rebuilt), vec![2, 2, 2]);
    }

    #[test]
    fn test_remove_columns_shrinks_colspan() {
        let table = Node::table(vec![
            Node::table_row(vec![cell_with("a", 2, 1), cell_with("b", 1, 1)]),
            Node::table_row(vec![
                cell_with("c", 1, 1),
                cell_with("d", 1, 1),
                cell_with("e", 1, 1),
            ]),
        ]);
        let mut grid = TableGrid::from_table(&table).unwrap();
        grid.remove_columns(0, 1);
        let (rebuilt, _) = grid.build();

        assert_eq!(row_widths(&rebuilt), vec![2, 2]);
        assert_eq!(rebuilt.children[0].children[0].text_content(), "a");
    }

    #[test]
    fn test_merge_and_split() {
        let table = empty_table(2, 2, false);
        let mut grid = TableGrid::from_table(&table).unwrap();
        grid.merge(Rect::new(0, 0, 2, 1)).unwrap();
        let (merged, _) = grid.build();
        let map = TableMap::build(&merged).unwrap();
        assert_eq!(map.cells.len(), 3);
        assert_eq!(map.cells[0].colspan, 2);

        let mut grid = TableGrid::from_table(&merged).unwrap();
        grid.split(0).unwrap();
        let (split, _) = grid.build();
        assert_eq!(TableMap::build(&split).unwrap().cells.len(), 4);
    }

    #[test]
    fn test_merge_whole_column_collapses_row() {
        let table = empty_table(2, 1, false);
        let mut grid = TableGrid::from_table(&table).unwrap();
        grid.merge(Rect::new(0, 0, 1, 2)).unwrap();
        let (merged, _) = grid.build();

        assert_eq!(merged.children.len(), 1);
        let map = TableMap::build(&merged).unwrap();
        assert_eq!(map.cells[0].rowspan, 1);
    }

    #[test]
    fn test_merge_rejects_partial_cells() {
        let table = Node::table(vec![
            Node::table_row(vec![cell_with("a", 2, 1)]),
            Node::table_row(vec![cell_with("b", 1, 1), cell_with("c", 1, 1)]),
        ]);
        let mut grid = TableGrid::from_table(&table).unwrap();
        assert!(grid.merge(Rect::new(0, 0, 1, 2)).is_err());
    }
}
