//! Timestamp-ordered merging of transaction streams.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::render::LineStyle;

/// A decoded transaction that can be ordered and rendered.
///
/// The timestamp is the variant's primary timestamp: the request phase for
/// APB, the address phase for AXI, and the command-word timestamp for the
/// DRAM buses.
pub trait Packet {
    fn timestamp(&self) -> u64;
    fn render_line(&self, style: &LineStyle) -> String;
}

struct HeapEntry<T> {
    key: u64,
    stream: usize,
    item: T,
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.stream == other.stream
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse to pop the earliest entry.
        // Equal timestamps resolve in stream order, keeping ties stable.
        (other.key, other.stream).cmp(&(self.key, self.stream))
    }
}

/// A k-way merge over several lazily pulled transaction streams.
///
/// Each inner stream must already be monotonic in its key, which every
/// decoder guarantees for its own output.
pub struct MergedStream<T, I: Iterator<Item = T>> {
    streams: Vec<I>,
    heap: BinaryHeap<HeapEntry<T>>,
    key: fn(&T) -> u64,
}

impl<T, I: Iterator<Item = T>> MergedStream<T, I> {
    pub fn with_key(streams: Vec<I>, key: fn(&T) -> u64) -> MergedStream<T, I> {
        let mut merged = MergedStream {
            streams,
            heap: BinaryHeap::new(),
            key,
        };
        for stream_index in 0..merged.streams.len() {
            merged.refill(stream_index);
        }
        merged
    }

    fn refill(&mut self, stream_index: usize) {
        if let Some(item) = self.streams[stream_index].next() {
            self.heap.push(HeapEntry {
                key: (self.key)(&item),
                stream: stream_index,
                item,
            });
        }
    }
}

impl<T: Packet, I: Iterator<Item = T>> MergedStream<T, I> {
    pub fn new(streams: Vec<I>) -> MergedStream<T, I> {
        MergedStream::with_key(streams, T::timestamp)
    }
}

impl<T, I: Iterator<Item = T>> Iterator for MergedStream<T, I> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let entry = self.heap.pop()?;
        self.refill(entry.stream);
        Some(entry.item)
    }
}

/// Threads a transaction stream through a set of annotators, yielding the
/// rendered line followed by each annotator's side panel.
pub fn annotated_lines<'a, T: Packet + 'a>(
    packets: impl Iterator<Item = T> + 'a,
    mut annotators: Vec<Box<dyn crate::annotate::Annotator<T> + 'a>>,
    style: LineStyle,
) -> impl Iterator<Item = String> + 'a {
    packets.map(move |packet| {
        let mut line = packet.render_line(&style);
        if !annotators.is_empty() {
            for annotator in annotators.iter_mut() {
                annotator.observe(&packet);
            }
            line.push_str("  ");
            let panels: Vec<String> = annotators.iter().map(|a| a.render()).collect();
            line.push_str(&panels.join(" "));
        }
        line
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tick(u64, &'static str);

    impl Packet for Tick {
        fn timestamp(&self) -> u64 {
            self.0
        }

        fn render_line(&self, _style: &LineStyle) -> String {
            format!("{} {}", self.0, self.1)
        }
    }

    #[test]
    fn merges_by_timestamp_with_stable_ties() {
        let a = vec![Tick(10, "a"), Tick(30, "a"), Tick(50, "a")];
        let b = vec![Tick(10, "b"), Tick(20, "b"), Tick(60, "b")];
        let merged: Vec<Tick> =
            MergedStream::new(vec![a.into_iter(), b.into_iter()]).collect();
        let order: Vec<(u64, &str)> = merged.iter().map(|t| (t.0, t.1)).collect();
        assert_eq!(
            order,
            vec![(10, "a"), (10, "b"), (20, "b"), (30, "a"), (50, "a"), (60, "b")]
        );
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        let streams: Vec<std::vec::IntoIter<Tick>> = Vec::new();
        assert_eq!(MergedStream::new(streams).count(), 0);
    }
}
