use crate::{
    error::Result,
    vint::{read_id, read_size},
};

/// Declared size of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSize {
    Known(u64),
    /// Reserved all-ones size, the element runs until the end of its parent.
    Unknown,
}

/// Header of an element found while walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    /// ID including the marker bits.
    pub id: u64,
    pub size: ElementSize,
    /// Offset of the ID.
    pub offset: usize,
    /// Offset of the first data byte.
    pub data_start: usize,
    /// End of the data, never past the end of the parent.
    pub data_end: usize,
    /// The declared size runs past the end of the parent.
    pub truncated: bool,
    /// Amount of containers the element is nested in, the root level is 1.
    pub depth: usize,
}

impl Element {
    /// The data of the element, the buffer must be the one that was walked.
    pub fn data<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.data_start..self.data_end]
    }
}

/// Depth-first walk over an EBML element tree.
///
/// Every element is skipped after it's returned by [`Walker::next_element`], unless the caller
/// descends into it with [`Walker::enter`].
#[derive(Debug, Clone)]
pub struct Walker<'a> {
    bytes: &'a [u8],
    /// Where the next element header starts.
    offset: usize,
    /// Ends of all entered containers, the innermost last.
    parent_ends: Vec<usize>,
}

impl<'a> Walker<'a> {
    /// Start walking at the beginning of the buffer.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            parent_ends: vec![bytes.len()],
        }
    }

    /// The buffer being walked.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Read the next element header.
    ///
    /// `Ok(None)` when the whole tree is walked or when the buffer ends in the middle of an
    /// element header.
    pub fn next_element(&mut self) -> Result<Option<Element>> {
        loop {
            let parent_end = match self.parent_ends.last() {
                Some(&end) => end,
                None => return Ok(None),
            };

            // Finished the current container
            if self.offset >= parent_end {
                self.parent_ends.pop();
                continue;
            }

            let id = match read_id(self.bytes, self.offset)? {
                Some(id) => id,
                None => return Ok(self.stop()),
            };
            let size = match read_size(self.bytes, self.offset + id.width)? {
                Some(size) => size,
                None => return Ok(self.stop()),
            };

            let data_start = (self.offset + id.width + size.width).min(parent_end);
            let (size, declared_end) = match size.known() {
                Some(len) => (
                    ElementSize::Known(len),
                    data_start.saturating_add(usize::try_from(len).unwrap_or(usize::MAX)),
                ),
                // Unknown sizes inherit the end of the parent
                None => (ElementSize::Unknown, parent_end),
            };

            let element = Element {
                id: id.value,
                size,
                offset: self.offset,
                data_start,
                data_end: declared_end.min(parent_end),
                truncated: declared_end > parent_end,
                depth: self.parent_ends.len(),
            };
            log::trace!(
                "element 0x{:X} at {}, data {}..{}{}",
                element.id,
                element.offset,
                element.data_start,
                element.data_end,
                if element.truncated { " (truncated)" } else { "" }
            );

            // Skip by default
            self.offset = element.data_end;

            return Ok(Some(element));
        }
    }

    /// Descend into the element so its children are walked next.
    pub fn enter(&mut self, element: &Element) {
        self.parent_ends.push(element.data_end);
        self.offset = element.data_start;
    }

    /// Stop walking, every following call returns `None`.
    pub fn stop(&mut self) -> Option<Element> {
        self.parent_ends.clear();

        None
    }
}
