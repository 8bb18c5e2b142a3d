//! # Position Mapping
//!
//! Commands describe how they moved content so the selection can follow it.
//!
//! - [`StepMap`]: ranges of replaced positions in old coordinates. A position
//!   after a replaced range shifts by the size difference; a position inside
//!   one snaps to its start or end.
//! - [`Mapping::Textblocks`]: for structural edits that rewrap blocks without
//!   touching text (lists), a position keeps its textblock and its offset in
//!   that textblock.

use nextnote_model::Node;

/// One replaced range: `old_size` positions starting at `start` became
/// `new_size` positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<StepRange>,
}

impl StepMap {
    pub fn identity() -> Self {
        Self::default()
    }

    /// A single replacement
    pub fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            ranges: vec![StepRange {
                start,
                old_size,
                new_size,
            }],
        }
    }

    /// Ranges must not overlap; they are kept sorted by start
    pub fn from_ranges(mut ranges: Vec<StepRange>) -> Self {
        ranges.sort_by_key(|r| r.start);
        Self { ranges }
    }

    pub fn ranges(&self) -> &[StepRange] {
        &self.ranges
    }

    /// Map `pos` through the replaced ranges. `assoc` picks the side for a
    /// position sitting exactly on an insertion point: negative stays before
    /// the inserted content, positive moves after it.
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let base = range.start as isize + diff;
                let mapped = if side < 0 {
                    base
                } else {
                    base + range.new_size as isize
                };
                return mapped.max(0) as usize;
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        (pos as isize + diff).max(0) as usize
    }
}

/// How positions move across one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    /// Sizes unchanged (marks, attributes, block kinds)
    Identity,
    /// Replacements applied one after another
    Steps(Vec<StepMap>),
    /// Textblocks kept their order and content, only their wrappers moved
    Textblocks,
}

impl Mapping {
    pub fn step(map: StepMap) -> Self {
        Mapping::Steps(vec![map])
    }

    pub fn map(&self, pos: usize, assoc: i8, old: &Node, new: &Node) -> usize {
        match self {
            Mapping::Identity => pos,
            Mapping::Steps(maps) => maps.iter().fold(pos, |pos, map| map.map(pos, assoc)),
            Mapping::Textblocks => map_by_textblock(pos, old, new),
        }
    }
}

fn map_by_textblock(pos: usize, old: &Node, new: &Node) -> usize {
    let old_blocks = old.textblock_ranges();
    let new_blocks = new.textblock_ranges();

    let found = old_blocks
        .iter()
        .position(|&(start, end)| start <= pos && pos <= end);
    match found {
        Some(index) => match new_blocks.get(index) {
            Some(&(start, end)) => (start + (pos - old_blocks[index].0)).min(end),
            None => new.content_size(),
        },
        // between blocks: stick to the start of the next textblock
        None => {
            let next = old_blocks.iter().position(|&(start, _)| start > pos);
            match next.and_then(|i| new_blocks.get(i)) {
                Some(&(start, _)) => start,
                None => new_blocks
                    .last()
                    .map_or(new.content_size(), |&(_, end)| end),
            }
        }
    }
}
