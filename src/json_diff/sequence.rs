// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::operation::Operation;
use super::path::{Key, Path};
use super::Differ;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tracing::trace;

/// Edit script for two arrays found at `path`.
pub(crate) fn align(
    differ: &Differ<'_>,
    path: &Path,
    actual: &[Value],
    expected: &[Value],
) -> Vec<Operation> {
    if differ.rules().is_order_ignored(path) {
        reconcile_unordered(differ, path, actual, expected)
    } else {
        align_ordered(differ, path, actual, expected, true)
    }
}

/// Whether the arrays hold the same elements in any order. Elements are
/// claimed greedily, each actual element taking the first free match.
pub(crate) fn is_permutation(
    differ: &Differ<'_>,
    path: &Path,
    actual: &[Value],
    expected: &[Value],
) -> bool {
    if actual.len() != expected.len() {
        return false;
    }

    let element_paths = element_paths(path, expected.len());
    let mut claimed = vec![false; expected.len()];

    for element in actual {
        let found = expected
            .iter()
            .enumerate()
            .position(|(j, e)| !claimed[j] && differ.equivalent(&element_paths[j], element, e));

        match found {
            Some(j) => claimed[j] = true,
            None => return false,
        }
    }

    true
}

fn reconcile_unordered(
    differ: &Differ<'_>,
    path: &Path,
    actual: &[Value],
    expected: &[Value],
) -> Vec<Operation> {
    if is_permutation(differ, path, actual, expected) {
        trace!(path = %path, "order-ignored array holds the expected elements");
        return vec![];
    }

    // reordering alone is not a difference here
    align_ordered(differ, path, actual, expected, false)
}

fn align_ordered(
    differ: &Differ<'_>,
    path: &Path,
    actual: &[Value],
    expected: &[Value],
    report_moves: bool,
) -> Vec<Operation> {
    let element_paths = element_paths(path, expected.len());
    let anchors = longest_common_subsequence(differ, &element_paths, actual, expected);

    trace!(
        path = %path,
        actual = actual.len(),
        expected = expected.len(),
        anchors = anchors.len(),
        "aligned array"
    );

    let mut steps = vec![];
    let (mut i, mut j) = (0, 0);
    for (anchor_i, anchor_j) in anchors {
        gap_steps(i..anchor_i, j..anchor_j, &mut steps);
        steps.push(Step::Keep { actual: anchor_i });
        i = anchor_i + 1;
        j = anchor_j + 1;
    }
    gap_steps(i..actual.len(), j..expected.len(), &mut steps);

    let script = Script {
        differ,
        path,
        element_paths: &element_paths,
        actual,
        expected,
        report_moves,
    };
    script.emit(&steps)
}

/// What happens to the elements of both arrays, in scan order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    /// Anchor of the common subsequence.
    Keep { actual: usize },
    /// Elements facing each other between two anchors, compared recursively.
    Pair { actual: usize, expected: usize },
    Remove { actual: usize },
    Add { expected: usize },
}

/// Steps for the elements lying between two anchors. Elements are paired
/// position-wise, then what is left of `actual` is removed and what is left
/// of `expected` is added.
fn gap_steps(actual: Range<usize>, expected: Range<usize>, steps: &mut Vec<Step>) {
    let paired = actual.len().min(expected.len());
    steps.extend(
        actual
            .clone()
            .zip(expected.clone())
            .map(|(actual, expected)| Step::Pair { actual, expected }),
    );
    steps.extend((actual.start + paired..actual.end).map(|actual| Step::Remove { actual }));
    steps.extend((expected.start + paired..expected.end).map(|expected| Step::Add { expected }));
}

/// Index pairs `(actual, expected)` of a longest common subsequence under
/// masked equality, in increasing order. On ties the backtrack drops the
/// expected element first.
fn longest_common_subsequence(
    differ: &Differ<'_>,
    element_paths: &[Path],
    actual: &[Value],
    expected: &[Value],
) -> Vec<(usize, usize)> {
    let (n, m) = (actual.len(), expected.len());

    let matches = actual
        .iter()
        .map(|a| {
            expected
                .iter()
                .zip(element_paths)
                .map(|(e, path)| differ.equivalent(path, a, e))
                .collect::<Vec<bool>>()
        })
        .collect::<Vec<_>>();

    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in 0..n {
        for j in 0..m {
            lengths[i + 1][j + 1] = if matches[i][j] {
                lengths[i][j] + 1
            } else {
                lengths[i][j + 1].max(lengths[i + 1][j])
            };
        }
    }

    let mut anchors = vec![];
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if matches[i - 1][j - 1] {
            anchors.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if lengths[i - 1][j] > lengths[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    anchors.reverse();
    anchors
}

/// Turns the steps of one array into operations.
struct Script<'a, 'c> {
    differ: &'a Differ<'c>,
    path: &'a Path,
    element_paths: &'a [Path],
    actual: &'a [Value],
    expected: &'a [Value],
    report_moves: bool,
}

impl<'a, 'c> Script<'a, 'c> {
    /// Replays the steps on the array being transformed, so every index in
    /// the result is the one the element has when its operation applies.
    /// A removed element whose value is added elsewhere stays in the array
    /// until the addition, which then becomes a `move`.
    fn emit(&self, steps: &[Step]) -> Vec<Operation> {
        let moves = self.pair_moves(steps);
        let moved = moves.values().copied().collect::<HashSet<_>>();
        let mut slots = Slots::new(self.actual.len());
        let mut operations = vec![];

        for step in steps {
            match *step {
                Step::Keep { actual } => {
                    slots.place(actual);
                }
                Step::Pair { actual, expected } => {
                    if let Some(at) = slots.place(actual) {
                        operations.extend(self.element_diff(at, actual, expected));
                    }
                }
                Step::Remove { actual } if moved.contains(&actual) => {
                    if !self.report_moves {
                        slots.take(actual);
                    }
                }
                Step::Remove { actual } => {
                    let Some(at) = slots.take(actual) else {
                        continue;
                    };
                    let removed_at = self.path.append(Key::Idx(at));
                    if !self.differ.rules().is_value_ignored(&removed_at) {
                        operations.push(Operation::Remove {
                            path: removed_at,
                            value: self.actual[actual].clone(),
                        });
                    }
                }
                Step::Add { expected } => {
                    let source = moves.get(&expected).map(|&actual| slots.take(actual));
                    let added_at = self.path.append(Key::Idx(slots.insert()));
                    match source {
                        Some(Some(from)) if self.report_moves => operations.push(Operation::Move {
                            from: self.path.append(Key::Idx(from)),
                            path: added_at,
                        }),
                        Some(_) => {}
                        None if self
                            .differ
                            .rules()
                            .is_value_ignored(&self.element_paths[expected]) => {}
                        None => operations.push(Operation::Add {
                            path: added_at,
                            value: self.expected[expected].clone(),
                        }),
                    }
                }
            }
        }

        operations
    }

    /// Matches added elements with removed ones of equivalent value, keyed
    /// by expected index. Each addition takes the removal nearest by index,
    /// then the earliest.
    fn pair_moves(&self, steps: &[Step]) -> HashMap<usize, usize> {
        let mut removed = steps
            .iter()
            .filter_map(|step| match *step {
                Step::Remove { actual } => Some(actual),
                _ => None,
            })
            .collect::<Vec<_>>();
        let mut moves = HashMap::new();

        for step in steps {
            let Step::Add { expected: j } = *step else {
                continue;
            };
            let element = &self.element_paths[j];
            if self.differ.rules().is_value_ignored(element) {
                continue;
            }

            let nearest = removed
                .iter()
                .enumerate()
                .filter(|&(_, &i)| {
                    self.differ
                        .equivalent(element, &self.actual[i], &self.expected[j])
                })
                .min_by_key(|&(_, &i)| (i.abs_diff(j), i))
                .map(|(k, _)| k);
            if let Some(k) = nearest {
                moves.insert(j, removed.remove(k));
            }
        }

        moves
    }

    /// Differences inside a paired element, addressed at its current index.
    /// Ignore rules still apply at the expected index.
    fn element_diff(&self, at: usize, actual: usize, expected: usize) -> Vec<Operation> {
        let element = &self.element_paths[expected];
        let operations = self
            .differ
            .diff_at(element, &self.actual[actual], &self.expected[expected]);
        if at == expected {
            return operations;
        }

        let current = self.path.append(Key::Idx(at));
        operations
            .into_iter()
            .map(|operation| operation.rebased(element, &current))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Actual(usize),
    Placed,
}

/// The array being transformed: elements from `actual` not dealt with yet,
/// interleaved with elements already in their final order.
struct Slots(Vec<Slot>);

impl Slots {
    fn new(len: usize) -> Self {
        Slots((0..len).map(Slot::Actual).collect())
    }

    fn position(&self, actual: usize) -> Option<usize> {
        self.0.iter().position(|slot| *slot == Slot::Actual(actual))
    }

    fn place(&mut self, actual: usize) -> Option<usize> {
        let at = self.position(actual)?;
        self.0[at] = Slot::Placed;
        Some(at)
    }

    fn take(&mut self, actual: usize) -> Option<usize> {
        let at = self.position(actual)?;
        self.0.remove(at);
        Some(at)
    }

    /// Inserts right after the last placed element.
    fn insert(&mut self) -> usize {
        let at = self
            .0
            .iter()
            .rposition(|slot| *slot == Slot::Placed)
            .map_or(0, |last| last + 1);
        self.0.insert(at, Slot::Placed);
        at
    }
}

fn element_paths(path: &Path, len: usize) -> Vec<Path> {
    (0..len).map(|j| path.append(Key::Idx(j))).collect()
}
