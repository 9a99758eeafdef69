//! Part-number hierarchy: flat part records linked into a sorted forest
//! with per-node work item rollups.
//!
//! Parts live in an arena indexed by position; `index` maps a part id to its
//! slot and each node keeps the slots of its children. A part whose parent
//! is not in the set, or whose parent chain loops back on itself, becomes a
//! root and is reported in [`PartTree::promoted`].

use std::collections::{HashMap, HashSet};
use std::ops::{Add, AddAssign};

use serde::Serialize;

use super::enums::WorkItemType;
use super::records::PartNumber;

/// Work item counts attributed to a part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkItemCounts {
    pub deliverables: u32,
    pub issues: u32,
    pub tasks: u32,
    pub total: u32,
}

impl WorkItemCounts {
    pub fn record(&mut self, kind: WorkItemType) {
        match kind {
            WorkItemType::Deliverable => self.deliverables += 1,
            WorkItemType::Issue => self.issues += 1,
            WorkItemType::Task => self.tasks += 1,
        }
        self.total += 1;
    }
}

impl Add for WorkItemCounts {
    type Output = WorkItemCounts;

    fn add(mut self, rhs: WorkItemCounts) -> WorkItemCounts {
        self += rhs;
        self
    }
}

impl AddAssign for WorkItemCounts {
    fn add_assign(&mut self, rhs: WorkItemCounts) {
        self.deliverables += rhs.deliverables;
        self.issues += rhs.issues;
        self.tasks += rhs.tasks;
        self.total += rhs.total;
    }
}

/// Which rollup a node shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    Direct,
    IncludingChildren,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PromotionReason {
    /// `parentId` names a part outside the current set.
    ParentOutsideSet,
    /// The parent chain loops back to this part.
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotedRoot {
    pub part_id: i64,
    pub parent_id: i64,
    pub reason: PromotionReason,
}

#[derive(Debug)]
struct Node {
    part: PartNumber,
    parent: Option<usize>,
    children: Vec<usize>,
    direct: WorkItemCounts,
    including_children: WorkItemCounts,
}

impl Node {
    fn sort_key(&self) -> (i64, i64) {
        (self.part.number, self.part.id)
    }
}

#[derive(Debug, Default)]
pub struct PartTree {
    nodes: Vec<Node>,
    index: HashMap<i64, usize>,
    roots: Vec<usize>,
    promoted: Vec<PromotedRoot>,
}

impl PartTree {
    /// Builds the forest from `parts`, keeping only `program_id` when given.
    /// `links` pairs a part id with the kind of a work item linked to it;
    /// links to parts outside the set are ignored.
    pub fn build(
        parts: impl IntoIterator<Item = PartNumber>,
        program_id: Option<i64>,
        links: &[(i64, WorkItemType)],
    ) -> Self {
        let mut tree = PartTree::default();
        for part in parts {
            if program_id.is_some_and(|p| p != part.program_id) {
                continue;
            }
            if tree.index.contains_key(&part.id) {
                tracing::warn!(part_id = part.id, "duplicate part id ignored");
                continue;
            }
            tree.index.insert(part.id, tree.nodes.len());
            tree.nodes.push(Node {
                part,
                parent: None,
                children: Vec::new(),
                direct: WorkItemCounts::default(),
                including_children: WorkItemCounts::default(),
            });
        }

        tree.resolve_parents();
        tree.break_cycles();
        tree.link_children();
        tree.count(links);
        tree
    }

    fn resolve_parents(&mut self) {
        for slot in 0..self.nodes.len() {
            let Some(parent_id) = self.nodes[slot].part.parent_id else {
                continue;
            };
            match self.index.get(&parent_id) {
                Some(&parent) => self.nodes[slot].parent = Some(parent),
                None => self.promoted.push(PromotedRoot {
                    part_id: self.nodes[slot].part.id,
                    parent_id,
                    reason: PromotionReason::ParentOutsideSet,
                }),
            }
        }
    }

    /// Each node has at most one parent, so every cycle is found by walking
    /// parent links until a node on the current walk repeats.
    fn break_cycles(&mut self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        for start in 0..self.nodes.len() {
            let mut path = Vec::new();
            let mut cursor = Some(start);
            while let Some(slot) = cursor {
                match marks[slot] {
                    Mark::Done => break,
                    Mark::OnPath => {
                        let Some(pos) = path.iter().position(|&s| s == slot) else {
                            break;
                        };
                        self.cut_cycle(&path[pos..]);
                        break;
                    }
                    Mark::Unvisited => {
                        marks[slot] = Mark::OnPath;
                        path.push(slot);
                        cursor = self.nodes[slot].parent;
                    }
                }
            }
            for slot in path {
                marks[slot] = Mark::Done;
            }
        }
    }

    fn cut_cycle(&mut self, members: &[usize]) {
        let Some(&cut) = members
            .iter()
            .min_by_key(|&&s| self.nodes[s].sort_key())
        else {
            return;
        };
        let node = &mut self.nodes[cut];
        node.parent = None;
        tracing::warn!(
            part_id = node.part.id,
            cycle_len = members.len(),
            "part parent cycle broken"
        );
        self.promoted.push(PromotedRoot {
            part_id: node.part.id,
            parent_id: node.part.parent_id.unwrap_or(node.part.id),
            reason: PromotionReason::Cycle,
        });
    }

    fn link_children(&mut self) {
        for slot in 0..self.nodes.len() {
            match self.nodes[slot].parent {
                Some(parent) => self.nodes[parent].children.push(slot),
                None => self.roots.push(slot),
            }
        }

        let nodes = &self.nodes;
        self.roots.sort_by_key(|&s| nodes[s].sort_key());
        for slot in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[slot].children);
            children.sort_by_key(|&s| self.nodes[s].sort_key());
            self.nodes[slot].children = children;
        }
    }

    fn count(&mut self, links: &[(i64, WorkItemType)]) {
        for &(part_id, kind) in links {
            if let Some(&slot) = self.index.get(&part_id) {
                self.nodes[slot].direct.record(kind);
            }
        }

        // Children precede parents in the reversed pre-order walk.
        for slot in self.preorder().into_iter().rev() {
            let mut total = self.nodes[slot].direct;
            for &child in &self.nodes[slot].children {
                total += self.nodes[child].including_children;
            }
            self.nodes[slot].including_children = total;
        }
    }

    fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(slot) = stack.pop() {
            order.push(slot);
            stack.extend(self.nodes[slot].children.iter().rev().copied());
        }
        order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &PartNumber> {
        self.roots.iter().map(|&s| &self.nodes[s].part)
    }

    pub fn children(&self, part_id: i64) -> Vec<&PartNumber> {
        self.slot(part_id)
            .map(|s| {
                self.nodes[s]
                    .children
                    .iter()
                    .map(|&c| &self.nodes[c].part)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, part_id: i64) -> Option<&PartNumber> {
        let slot = self.slot(part_id)?;
        self.nodes[slot].parent.map(|p| &self.nodes[p].part)
    }

    pub fn promoted(&self) -> &[PromotedRoot] {
        &self.promoted
    }

    pub fn direct(&self, part_id: i64) -> Option<WorkItemCounts> {
        self.slot(part_id).map(|s| self.nodes[s].direct)
    }

    pub fn including_children(&self, part_id: i64) -> Option<WorkItemCounts> {
        self.slot(part_id).map(|s| self.nodes[s].including_children)
    }

    /// Expanded nodes and leaves show their own counts; a collapsed node
    /// with children shows the whole subtree.
    pub fn display(&self, part_id: i64, expanded: bool) -> Option<(DisplayMode, WorkItemCounts)> {
        self.slot(part_id).map(|s| self.display_slot(s, expanded))
    }

    fn display_slot(&self, slot: usize, expanded: bool) -> (DisplayMode, WorkItemCounts) {
        let node = &self.nodes[slot];
        if expanded || node.children.is_empty() {
            (DisplayMode::Direct, node.direct)
        } else {
            (DisplayMode::IncludingChildren, node.including_children)
        }
    }

    fn slot(&self, part_id: i64) -> Option<usize> {
        self.index.get(&part_id).copied()
    }

    /// Nested, serializable view of the forest.
    pub fn view(&self, expanded: &HashSet<i64>) -> HierarchyView {
        HierarchyView {
            roots: self
                .roots
                .iter()
                .map(|&s| self.view_node(s, 0, expanded))
                .collect(),
            promoted: self.promoted.clone(),
        }
    }

    fn view_node(&self, slot: usize, depth: usize, expanded: &HashSet<i64>) -> HierarchyNode {
        let node = &self.nodes[slot];
        let is_expanded = expanded.contains(&node.part.id);
        let (display_mode, display) = self.display_slot(slot, is_expanded);
        HierarchyNode {
            part: node.part.clone(),
            depth,
            expanded: is_expanded,
            direct: node.direct,
            including_children: node.including_children,
            display,
            display_mode,
            children: node
                .children
                .iter()
                .map(|&c| self.view_node(c, depth + 1, expanded))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    #[serde(flatten)]
    pub part: PartNumber,
    pub depth: usize,
    pub expanded: bool,
    pub direct: WorkItemCounts,
    pub including_children: WorkItemCounts,
    pub display: WorkItemCounts,
    pub display_mode: DisplayMode,
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyView {
    pub roots: Vec<HierarchyNode>,
    pub promoted: Vec<PromotedRoot>,
}
