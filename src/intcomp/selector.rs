//! Beam-search abbreviation selection over a buffered run of values
//! (spec.md §4.7 "Selection (rewriting)").
//!
//! Grounded on `original_source/src/intcomp/AbbrevSelector.h/.cpp`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

use crate::intcomp::count_node::{CountNodeId, CountTrie};
use crate::intstream::formats::IntTypeFormats;
use crate::intstream::IntValue;
use crate::stream::format_helpers::varuint_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SelectionKey {
    weight: u64,
    buffer_index: usize,
    creation_index: u64,
}

impl Ord for SelectionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| other.buffer_index.cmp(&self.buffer_index))
            .then_with(|| self.creation_index.cmp(&other.creation_index))
    }
}

impl PartialOrd for SelectionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One abbreviated (or literal) step emitted by a selection path.
#[derive(Debug, Clone)]
pub enum Choice {
    DefaultSingle(IntValue),
    DefaultMultiple(Vec<IntValue>),
    Abbrev { node: CountNodeId, values: Vec<IntValue> },
}

/// An immutable singly-linked partial solution: cheap to branch from
/// without copying the whole prefix (spec.md §9).
pub struct AbbrevSelection {
    pub choice: Option<Choice>,
    pub parent: Option<Rc<AbbrevSelection>>,
}

impl AbbrevSelection {
    /// Reconstructs the chosen steps in emission order.
    pub fn path(self: &Rc<Self>) -> Vec<Choice> {
        let mut steps = Vec::new();
        let mut cur = self.clone();
        while let Some(choice) = cur.choice.clone() {
            steps.push(choice);
            cur = match &cur.parent {
                Some(p) => p.clone(),
                None => break,
            };
        }
        steps.reverse();
        steps
    }
}

struct HeapEntry {
    key: SelectionKey,
    node: Rc<AbbrevSelection>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

pub struct AbbrevSelector<'a> {
    trie: &'a CountTrie,
    next_creation_index: u64,
}

impl<'a> AbbrevSelector<'a> {
    pub fn new(trie: &'a CountTrie) -> Self {
        AbbrevSelector {
            trie,
            next_creation_index: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_creation_index;
        self.next_creation_index += 1;
        id
    }

    /// Finds the minimum-cost way to abbreviate the whole of `buffer`,
    /// per spec.md §4.7's state/seed/extend/completion description,
    /// implemented as a Dijkstra-style search over buffer positions.
    pub fn select(&mut self, buffer: &[IntValue]) -> Rc<AbbrevSelection> {
        use std::cmp::Reverse;

        let root = Rc::new(AbbrevSelection {
            choice: None,
            parent: None,
        });
        let mut heap = BinaryHeap::new();
        let mut best_at: HashMap<usize, u64> = HashMap::new();
        heap.push(Reverse(HeapEntry {
            key: SelectionKey {
                weight: 0,
                buffer_index: 0,
                creation_index: self.next_id(),
            },
            node: root,
        }));

        while let Some(Reverse(entry)) = heap.pop() {
            let bi = entry.key.buffer_index;
            if bi == buffer.len() {
                return entry.node;
            }
            if let Some(&known) = best_at.get(&bi) {
                if known < entry.key.weight {
                    continue;
                }
            }
            best_at.insert(bi, entry.key.weight);

            for (choice, consumed, cost) in self.candidates(buffer, bi) {
                let new_bi = bi + consumed;
                let new_weight = entry.key.weight + cost;
                let child = Rc::new(AbbrevSelection {
                    choice: Some(choice),
                    parent: Some(entry.node.clone()),
                });
                heap.push(Reverse(HeapEntry {
                    key: SelectionKey {
                        weight: new_weight,
                        buffer_index: new_bi,
                        creation_index: self.next_id(),
                    },
                    node: child,
                }));
            }
        }

        // Unreachable for a non-empty trie with default abbreviations
        // assigned, since default-single always advances by one; kept
        // as a defensive terminal state for an empty buffer.
        Rc::new(AbbrevSelection {
            choice: None,
            parent: None,
        })
    }

    /// The candidate next steps from `bi`: the two default forms plus
    /// every trie path matching the buffer starting at `bi`.
    fn candidates(&self, buffer: &[IntValue], bi: usize) -> Vec<(Choice, usize, u64)> {
        let mut out = Vec::new();
        let v = buffer[bi];

        if let Some(idx) = self.trie.node(self.trie.default_single).abbrev_index {
            let cost = varuint_size(idx as u64) as u64 + IntTypeFormats::new(v).min_format_size() as u64;
            out.push((Choice::DefaultSingle(v), 1, cost));
        }

        if let Some(idx) = self.trie.node(self.trie.default_multiple).abbrev_index {
            let run = &buffer[bi..];
            if !run.is_empty() {
                let mut cost = varuint_size(idx as u64) as u64 + varuint_size(run.len() as u64) as u64;
                for &x in run {
                    cost += IntTypeFormats::new(x).min_format_size() as u64;
                }
                out.push((Choice::DefaultMultiple(run.to_vec()), run.len(), cost));
            }
        }

        let mut node = self.trie.root;
        let mut matched = Vec::new();
        let mut offset = 0;
        while bi + offset < buffer.len() {
            let value = buffer[bi + offset];
            match self.trie.node(node).children.get(&value) {
                Some(&child) => {
                    node = child;
                    matched.push(value);
                    offset += 1;
                    if let Some(idx) = self.trie.node(node).abbrev_index {
                        out.push((
                            Choice::Abbrev {
                                node,
                                values: matched.clone(),
                            },
                            matched.len(),
                            varuint_size(idx as u64) as u64,
                        ));
                    }
                }
                None => break,
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intcomp::assign::AbbrevAssignment;
    use crate::intcomp::count_writer::CountWriter;

    #[test]
    fn selects_an_abbreviation_over_two_literals_when_cheaper() {
        let mut w = CountWriter::new(1, 2);
        for v in [1u64, 2, 1, 2, 1, 2] {
            w.observe_value(v);
        }
        let mut trie = w.into_trie();
        AbbrevAssignment::new(1, 1).assign(&mut trie);

        let mut sel = AbbrevSelector::new(&trie);
        let result = sel.select(&[1, 2]);
        let path = result.path();
        assert!(!path.is_empty());
        let consumed: usize = path
            .iter()
            .map(|c| match c {
                Choice::DefaultSingle(_) => 1,
                Choice::DefaultMultiple(v) => v.len(),
                Choice::Abbrev { values, .. } => values.len(),
            })
            .sum();
        assert_eq!(consumed, 2);
    }

    #[test]
    fn falls_back_to_defaults_for_an_unseen_value() {
        let trie = CountTrie::new();
        let mut sel = AbbrevSelector::new(&trie);
        // No abbreviations assigned at all: selection must still
        // terminate (there is nothing to choose, so the result is the
        // empty root with no steps).
        let result = sel.select(&[]);
        assert!(result.path().is_empty());
    }
}
