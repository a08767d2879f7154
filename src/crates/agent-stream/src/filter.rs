use std::collections::BTreeSet;

use crate::markers::{MarkerProtocol, MarkerRule};

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterState {
    Visible,
    /// Inside a paired block, waiting for its end marker.
    InBlock { end: String },
    /// After a sentinel; nothing further is visible.
    Swallowed,
}

enum MarkerHit {
    Start(MarkerRule),
    StrayEnd(String),
}

/// Incremental marker suppression with bounded lookahead.
///
/// Visible text is released as soon as it provably cannot be part of a
/// marker. The longest buffered suffix that is a prefix of any marker token
/// (inside a block, of the end marker) is held back, together with any
/// whitespace in front of it, since whitespace directly before a marker is
/// dropped. An end marker outside a block is removed like any other token.
#[derive(Debug, Clone)]
pub struct MarkerFilter {
    protocol: MarkerProtocol,
    pending: String,
    state: FilterState,
    seen: BTreeSet<String>,
}

impl MarkerFilter {
    pub fn new(protocol: MarkerProtocol) -> Self {
        Self {
            protocol,
            pending: String::new(),
            state: FilterState::Visible,
            seen: BTreeSet::new(),
        }
    }

    /// Feeds one fragment and returns the text that is now safe to show.
    pub fn push(&mut self, fragment: &str) -> String {
        self.pending.push_str(fragment);
        self.drain(false)
    }

    /// Flushes held-back text at end of stream. Trailing whitespace and an
    /// unterminated block are dropped.
    pub fn finish(&mut self) -> String {
        self.drain(true)
    }

    pub fn seen_markers(&self) -> &BTreeSet<String> {
        &self.seen
    }

    pub fn saw_marker(&self) -> bool {
        !self.seen.is_empty()
    }

    fn drain(&mut self, at_end: bool) -> String {
        let mut visible = String::new();

        loop {
            match self.state.clone() {
                FilterState::Swallowed => {
                    self.pending.clear();
                    break;
                }
                FilterState::InBlock { end } => {
                    if let Some(pos) = self.pending.find(&end) {
                        self.pending.drain(..pos + end.len());
                        self.seen.insert(end);
                        self.state = FilterState::Visible;
                        continue;
                    }
                    if at_end {
                        self.pending.clear();
                    } else {
                        let hold = partial_marker_start(&self.pending, [end.as_str()]);
                        self.pending.drain(..hold);
                    }
                    break;
                }
                FilterState::Visible => {
                    let hold = if at_end {
                        self.pending.len()
                    } else {
                        partial_marker_start(&self.pending, self.protocol.tokens())
                    };

                    // A partial marker that starts before a complete one may
                    // still grow into a longer marker that swallows it.
                    match self.earliest_marker() {
                        Some((pos, hit)) if hold >= pos => {
                            visible.push_str(self.pending[..pos].trim_end());
                            match hit {
                                MarkerHit::Start(marker) => {
                                    self.pending.drain(..pos + marker.start.len());
                                    self.seen.insert(marker.start);
                                    self.state = match marker.end {
                                        Some(end) => FilterState::InBlock { end },
                                        None => FilterState::Swallowed,
                                    };
                                }
                                // An end marker with no open block is dropped on its own.
                                MarkerHit::StrayEnd(end) => {
                                    self.pending.drain(..pos + end.len());
                                    self.seen.insert(end);
                                }
                            }
                        }
                        _ => {
                            let release = self.pending[..hold].trim_end().len();
                            visible.push_str(&self.pending[..release]);
                            self.pending.drain(..release);
                            if at_end {
                                self.pending.clear();
                            }
                            break;
                        }
                    }
                }
            }
        }

        visible
    }

    /// First complete marker in the pending text. Start markers win over
    /// end markers at the same position, then protocol order decides.
    fn earliest_marker(&self) -> Option<(usize, MarkerHit)> {
        let markers = self.protocol.markers();
        let starts = markers.iter().enumerate().filter_map(|(index, marker)| {
            let pos = self.pending.find(&marker.start)?;
            Some(((pos, 0, index), MarkerHit::Start(marker.clone())))
        });
        let ends = markers.iter().enumerate().filter_map(|(index, marker)| {
            let end = marker.end.as_deref()?;
            let pos = self.pending.find(end)?;
            Some(((pos, 1, index), MarkerHit::StrayEnd(end.to_string())))
        });
        starts
            .chain(ends)
            .min_by_key(|(key, _)| *key)
            .map(|((pos, _, _), hit)| (pos, hit))
    }
}

/// Byte offset where the longest suffix of `text` that is a proper prefix
/// of one of `markers` begins; `text.len()` when there is none.
fn partial_marker_start<'a>(text: &str, markers: impl IntoIterator<Item = &'a str>) -> usize {
    let mut longest = 0;
    for marker in markers {
        for (len, _) in marker.char_indices().skip(1) {
            if len > longest && len <= text.len() && text.ends_with(&marker[..len]) {
                longest = len;
            }
        }
    }
    text.len() - longest
}
