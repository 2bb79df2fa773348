//! Splitting outbound messages into fragment-sized slices.

use std::num::NonZeroUsize;

/// One contiguous slice of an outbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Bytes carried by this fragment.
    pub payload: &'a [u8],
    /// Set on the slice that consumes the tail of the message.
    pub last: bool,
}

/// Iterator over the fragments of one message.
///
/// Yields `ceil(len / max)` fragments; exactly the final one is marked
/// `last`. An empty message yields nothing.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use ackframe::transport::Fragments;
///
/// let max = NonZeroUsize::new(512).expect("non-zero");
/// let sizes: Vec<_> = Fragments::new(&[0; 1000], max)
///     .map(|f| (f.payload.len(), f.last))
///     .collect();
/// assert_eq!(sizes, [(512, false), (488, true)]);
/// ```
#[derive(Clone, Debug)]
pub struct Fragments<'a> {
    remaining: &'a [u8],
    max: NonZeroUsize,
}

impl<'a> Fragments<'a> {
    /// Split `message` into slices of at most `max` bytes.
    #[must_use]
    pub fn new(message: &'a [u8], max: NonZeroUsize) -> Self {
        Self {
            remaining: message,
            max,
        }
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        let take = self.remaining.len().min(self.max.get());
        let (payload, rest) = self.remaining.split_at(take);
        self.remaining = rest;
        Some(Fragment {
            payload,
            last: rest.is_empty(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = fragment_count(self.remaining.len(), self.max);
        (count, Some(count))
    }
}

impl ExactSizeIterator for Fragments<'_> {}

/// Number of fragments needed for a message of `len` bytes.
#[must_use]
pub fn fragment_count(len: usize, max: NonZeroUsize) -> usize { len.div_ceil(max.get()) }
