//! Index-stride and sample-stride addressing.
//!
//! In index mode the write index `i` covers `[0, n)` and a read index `j`
//! starts at 0 and advances by the stride, wrapping by conditional
//! subtraction. The workload is always `n` elements whatever the stride.
//! In sample mode `i` itself advances by the stride and both streams use it.

use crate::config::AddressingMode;

/// Read step actually used in index mode.
///
/// The stride is reduced modulo `n` once, so [`next_index`] keeps its
/// `[0, n)` guarantee for strides larger than `n`. Zero-length problems map
/// to a zero step.
#[inline]
pub fn index_step(stride: usize, n: usize) -> usize {
    if n == 0 {
        0
    } else {
        stride % n
    }
}

/// Advance the wrapping read index.
///
/// Requires `j < n` and `step <= n`; the result is then in `[0, n)`.
#[inline(always)]
pub fn next_index(j: usize, step: usize, n: usize) -> usize {
    debug_assert!(j < n && step <= n);
    let j = j + step;
    if j >= n {
        j - n
    } else {
        j
    }
}

/// Number of output positions a strided kernel touches per call.
pub fn visited_elements(mode: AddressingMode, n: usize, stride: usize) -> usize {
    match mode {
        AddressingMode::Index => n,
        AddressingMode::Sample => n.div_ceil(stride.max(1)),
    }
}

/// One element access: output/`y` position and source/`x` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub write: usize,
    pub read: usize,
}

/// Iterator over the accesses of an index-mode kernel call.
#[derive(Debug, Clone)]
pub struct IndexStride {
    i: usize,
    j: usize,
    step: usize,
    n: usize,
}

impl IndexStride {
    pub fn new(n: usize, stride: usize) -> Self {
        Self {
            i: 0,
            j: 0,
            step: index_step(stride, n),
            n,
        }
    }
}

impl Iterator for IndexStride {
    type Item = Access;

    fn next(&mut self) -> Option<Access> {
        if self.i >= self.n {
            return None;
        }
        let access = Access {
            write: self.i,
            read: self.j,
        };
        self.i += 1;
        self.j = next_index(self.j, self.step, self.n);
        Some(access)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n - self.i;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndexStride {}

/// Iterator over the accesses of a sample-mode kernel call.
#[derive(Debug, Clone)]
pub struct SampleStride {
    i: usize,
    stride: usize,
    n: usize,
}

impl SampleStride {
    pub fn new(n: usize, stride: usize) -> Self {
        Self {
            i: 0,
            stride: stride.max(1),
            n,
        }
    }
}

impl Iterator for SampleStride {
    type Item = Access;

    fn next(&mut self) -> Option<Access> {
        if self.i >= self.n {
            return None;
        }
        let access = Access {
            write: self.i,
            read: self.i,
        };
        self.i = self.i.saturating_add(self.stride);
        Some(access)
    }
}

#[derive(Debug, Clone)]
pub enum AccessPattern {
    Index(IndexStride),
    Sample(SampleStride),
}

impl AccessPattern {
    pub fn new(mode: AddressingMode, n: usize, stride: usize) -> Self {
        match mode {
            AddressingMode::Index => AccessPattern::Index(IndexStride::new(n, stride)),
            AddressingMode::Sample => AccessPattern::Sample(SampleStride::new(n, stride)),
        }
    }
}

impl Iterator for AccessPattern {
    type Item = Access;

    fn next(&mut self) -> Option<Access> {
        match self {
            AccessPattern::Index(inner) => inner.next(),
            AccessPattern::Sample(inner) => inner.next(),
        }
    }
}
