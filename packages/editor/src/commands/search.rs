//! Find and replace over the whole document.
//!
//! Each textblock is searched as one string, so a match may span several
//! text runs. The replacement takes the marks of the run where the match
//! starts; text around the matches keeps its own marks. Matches never cross
//! a block boundary.

use super::Edit;
use crate::mapping::{Mapping, StepMap, StepRange};
use crate::{Applied, Document, EditorError, EditorResult};
use nextnote_model::{normalize_inline, Node, NodeRef};
use std::sync::Arc;
use tracing::debug;

pub(super) fn replace_all(doc: &Document, find: &str, replace: &str) -> EditorResult<Applied> {
    if find.is_empty() {
        return Err(EditorError::invalid("find", "search text must not be empty"));
    }
    if replace.contains(|c: char| c == '\n' || c == '\r') {
        return Err(EditorError::invalid("replace", "replacement cannot contain line breaks"));
    }

    let old = doc.root();
    let mut root = old.clone();
    let mut steps = Vec::new();
    // back to front, so positions of earlier blocks stay valid
    for (start, _) in old.textblock_ranges().into_iter().rev() {
        let Some(block) = old.node_at(start - 1) else {
            continue;
        };
        let Some((children, ranges)) = replace_in_block(&block.children, find, replace, start)
        else {
            continue;
        };
        if let Some(target) = root.node_at_mut(start - 1) {
            target.children = normalize_inline(children);
            steps.extend(ranges);
        }
    }

    debug!(matches = steps.len(), "replace all");
    Edit::new(root, Mapping::step(StepMap::from_ranges(steps))).commit(doc)
}

/// New runs for one textblock plus the replaced ranges, or `None` without
/// a match. `start` is the position of the block's first character.
fn replace_in_block(
    runs: &[NodeRef],
    find: &str,
    replace: &str,
    start: usize,
) -> Option<(Vec<NodeRef>, Vec<StepRange>)> {
    let text: String = runs.iter().filter_map(|run| run.text_value()).collect();
    if !text.contains(find) {
        return None;
    }

    // byte offset of each run in `text`
    let mut bounds = Vec::with_capacity(runs.len());
    let mut offset = 0;
    for run in runs {
        bounds.push(offset);
        offset += run.text_value().map_or(0, str::len);
    }

    let find_size = find.chars().count();
    let replace_size = replace.chars().count();
    let mut out = Vec::new();
    let mut ranges = Vec::new();
    let mut copied = 0;
    for (at, _) in text.match_indices(find) {
        copy_runs(runs, &bounds, copied, at, &mut out);
        let run = bounds.partition_point(|&b| b <= at).saturating_sub(1);
        out.push(Arc::new(Node::text(replace, runs[run].marks.clone())));
        ranges.push(StepRange {
            start: start + text[..at].chars().count(),
            old_size: find_size,
            new_size: replace_size,
        });
        copied = at + find.len();
    }
    copy_runs(runs, &bounds, copied, text.len(), &mut out);
    Some((out, ranges))
}

/// Push the pieces of `runs` covering bytes `from..to` of the block text
fn copy_runs(runs: &[NodeRef], bounds: &[usize], from: usize, to: usize, out: &mut Vec<NodeRef>) {
    for (run, &begin) in runs.iter().zip(bounds) {
        let Some(value) = run.text_value() else {
            continue;
        };
        let end = begin + value.len();
        if end <= from || begin >= to {
            continue;
        }
        if begin >= from && end <= to {
            out.push(run.clone());
        } else {
            let piece = &value[from.max(begin) - begin..to.min(end) - begin];
            out.push(Arc::new(Node::text(piece, run.marks.clone())));
        }
    }
}
