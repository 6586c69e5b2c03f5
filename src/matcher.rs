//! NFA simulation with capture tracking.
//!
//! The simulation keeps two frontiers of `(state, capture log)` pairs and
//! never backtracks, so matching is linear in the input length times the
//! state count regardless of the pattern.

use std::rc::Rc;

use crate::automaton::{Automaton, Boundary, EdgeKind, GroupId, StateId};
use crate::matches::{Group, Match};

/// A persistent log of group boundary crossings along one simulation path.
///
/// Cloning is O(1); forked paths share their common prefix.
#[derive(Clone, Default)]
struct CaptureLog(Option<Rc<LogNode>>);

struct LogNode {
    prev: CaptureLog,
    group: GroupId,
    boundary: Boundary,
    pos: usize,
}

impl CaptureLog {
    fn push(&self, group: GroupId, boundary: Boundary, pos: usize) -> Self {
        CaptureLog(Some(Rc::new(LogNode {
            prev: self.clone(),
            group,
            boundary,
            pos,
        })))
    }
}

/// Active states at one input position, in priority order.
///
/// Deduplicated by state id; the first path to reach a state keeps it, which
/// is what makes edge insertion order decide ties.
struct Frontier {
    entries: Vec<(StateId, CaptureLog)>,
    seen: Vec<bool>,
}

impl Frontier {
    fn new(states: usize) -> Self {
        Frontier {
            entries: Vec::new(),
            seen: vec![false; states],
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.seen.fill(false);
    }
}

/// The best acceptance seen so far: its end position and capture log.
type Best = Option<(usize, CaptureLog)>;

/// Match the automaton against `tokens` with the match pinned to `start`.
///
/// Returns the longest match; among equal-length matches the path that
/// closed first (the lexically earlier alternative, the greedier loop) wins.
pub(crate) fn looking_at<E>(auto: &Automaton<E>, tokens: &[E], start: usize) -> Option<Match> {
    if start > tokens.len() {
        return None;
    }

    let mut current = Frontier::new(auto.states.len());
    let mut next = Frontier::new(auto.states.len());
    let mut best: Best = None;

    add_state(
        auto,
        &mut current,
        &mut best,
        auto.start,
        CaptureLog::default(),
        start,
        tokens.len(),
    );

    let mut pos = start;
    while pos < tokens.len() && !current.entries.is_empty() {
        next.clear();
        for (state, log) in &current.entries {
            for edge in &auto.states[*state].edges {
                if let EdgeKind::Match(predicate) = &edge.kind
                    && predicate(&tokens[pos])
                {
                    add_state(
                        auto,
                        &mut next,
                        &mut best,
                        edge.to,
                        log.clone(),
                        pos + 1,
                        tokens.len(),
                    );
                }
            }
        }
        std::mem::swap(&mut current, &mut next);
        pos += 1;
    }

    best.map(|(end, log)| resolve(auto, start, end, &log))
}

/// Insert a state and its epsilon closure into the frontier.
///
/// Zero-width edges are followed in insertion order: anchors only when the
/// position allows, group boundaries extending the capture log. Reaching the
/// global accept records a candidate; a candidate replaces the best only
/// when it ends strictly later.
fn add_state<E>(
    auto: &Automaton<E>,
    frontier: &mut Frontier,
    best: &mut Best,
    state: StateId,
    log: CaptureLog,
    pos: usize,
    len: usize,
) {
    if frontier.seen[state] {
        return;
    }
    frontier.seen[state] = true;

    if state == auto.accept && best.as_ref().is_none_or(|(end, _)| pos > *end) {
        *best = Some((pos, log.clone()));
    }

    frontier.entries.push((state, log.clone()));

    for edge in &auto.states[state].edges {
        match &edge.kind {
            EdgeKind::Epsilon => {
                add_state(auto, frontier, best, edge.to, log.clone(), pos, len);
            }
            EdgeKind::Group(group, boundary) => {
                let extended = log.push(*group, *boundary, pos);
                add_state(auto, frontier, best, edge.to, extended, pos, len);
            }
            EdgeKind::AssertStart if pos == 0 => {
                add_state(auto, frontier, best, edge.to, log.clone(), pos, len);
            }
            EdgeKind::AssertEnd if pos == len => {
                add_state(auto, frontier, best, edge.to, log.clone(), pos, len);
            }
            EdgeKind::Match(_) | EdgeKind::AssertStart | EdgeKind::AssertEnd => {}
        }
    }
}

/// Replay the winning path's boundary events oldest-first into group ranges.
///
/// An open records a pending start; a close commits the range, so a group
/// traversed repeatedly keeps the last range and a group never traversed is
/// absent.
fn resolve<E>(auto: &Automaton<E>, start: usize, end: usize, log: &CaptureLog) -> Match {
    let mut events = Vec::new();
    let mut node = &log.0;
    while let Some(n) = node {
        events.push((n.group, n.boundary, n.pos));
        node = &n.prev.0;
    }
    events.reverse();

    let mut opens = vec![None; auto.groups.len()];
    let mut ranges: Vec<Option<(usize, usize)>> = vec![None; auto.groups.len()];
    for (group, boundary, pos) in events {
        match boundary {
            Boundary::Open => opens[group] = Some(pos),
            Boundary::Close => {
                if let Some(open) = opens[group] {
                    ranges[group] = Some((open, pos));
                }
            }
        }
    }

    let groups = ranges
        .into_iter()
        .enumerate()
        .filter_map(|(id, range)| {
            range.map(|(group_start, group_end)| Group {
                index: id + 1,
                name: auto.groups[id].clone(),
                start: group_start,
                end: group_end,
            })
        })
        .collect();

    Match::new(start, end, groups)
}
