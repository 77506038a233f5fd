//! Per-subscriber call ledger
//!
//! A doubly linked list of [`CallEvent`]s held in a vector arena, linked by
//! index. Events are kept in ascending `year * 100 + month` order; within a
//! month the order is insertion order.

use callbill_core::models::CallEvent;

#[derive(Debug, Clone)]
struct LedgerNode {
    event: CallEvent,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Month-ordered call history of one subscriber
#[derive(Debug, Clone, Default)]
pub struct CallLedger {
    nodes: Vec<LedgerNode>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl CallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, keeping the ledger in month order
    ///
    /// The insertion point is found by a linear scan from the head: the new
    /// event goes immediately before the first event whose key is strictly
    /// greater, or at the tail if there is none.
    pub fn insert_ordered(&mut self, event: CallEvent) {
        let key = event.datetime_key();
        let idx = self.nodes.len();

        let mut cursor = self.head;
        while let Some(i) = cursor {
            if self.nodes[i].event.datetime_key() > key {
                break;
            }
            cursor = self.nodes[i].next;
        }

        match cursor {
            Some(successor) => {
                let prev = self.nodes[successor].prev;
                self.nodes.push(LedgerNode {
                    event,
                    prev,
                    next: Some(successor),
                });
                self.nodes[successor].prev = Some(idx);
                match prev {
                    Some(p) => self.nodes[p].next = Some(idx),
                    None => self.head = Some(idx),
                }
            }
            None => {
                self.nodes.push(LedgerNode {
                    event,
                    prev: self.tail,
                    next: None,
                });
                match self.tail {
                    Some(t) => self.nodes[t].next = Some(idx),
                    None => self.head = Some(idx),
                }
                self.tail = Some(idx);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&CallEvent> {
        self.head.map(|i| &self.nodes[i].event)
    }

    pub fn last(&self) -> Option<&CallEvent> {
        self.tail.map(|i| &self.nodes[i].event)
    }

    /// Events in ledger order, following the links from the head
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            ledger: self,
            cursor: self.head,
        }
    }

    /// Contiguous runs of events sharing the same year and month
    ///
    /// Single forward pass over the live links; call again for a fresh pass.
    pub fn monthly_groups(&self) -> MonthlyGroups<'_> {
        MonthlyGroups { events: self.iter().peekable() }
    }
}

impl<'a> IntoIterator for &'a CallLedger {
    type Item = &'a CallEvent;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over a [`CallLedger`]
pub struct Iter<'a> {
    ledger: &'a CallLedger,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CallEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.ledger.nodes[self.cursor?];
        self.cursor = node.next;
        Some(&node.event)
    }
}

/// All calls of one subscriber in one month
#[derive(Debug, Clone)]
pub struct MonthlyGroup<'a> {
    pub year: i32,
    pub month: u32,
    pub calls: Vec<&'a CallEvent>,
}

impl MonthlyGroup<'_> {
    pub fn call_count(&self) -> u64 {
        self.calls.len() as u64
    }

    pub fn total_duration(&self) -> u64 {
        self.calls.iter().map(|c| c.duration_seconds).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.calls.iter().map(|c| c.price).sum()
    }
}

/// Iterator returned by [`CallLedger::monthly_groups`]
pub struct MonthlyGroups<'a> {
    events: std::iter::Peekable<Iter<'a>>,
}

impl<'a> Iterator for MonthlyGroups<'a> {
    type Item = MonthlyGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.events.next()?;
        let key = first.datetime_key();
        let mut calls = vec![first];

        while let Some(event) = self.events.next_if(|e| e.datetime_key() == key) {
            calls.push(event);
        }

        Some(MonthlyGroup {
            year: first.year,
            month: first.month,
            calls,
        })
    }
}
