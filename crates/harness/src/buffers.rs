//! 64-byte aligned working buffers and their snapshot.

use std::alloc::{alloc, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;
use thiserror::Error;
use vecbench_kernels::element::Element;
use vecbench_kernels::kernel::Operands;
use vecbench_verify::InitialState;

/// Base alignment of every buffer.
pub const BUFFER_ALIGN: usize = 64;

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("allocation of {bytes} bytes for buffer `{buffer}` failed")]
    Allocation { buffer: &'static str, bytes: usize },
    #[error("buffer `{buffer}` of {len} elements exceeds the address space")]
    LayoutOverflow { buffer: &'static str, len: usize },
    #[error(
        "cannot copy `{source_buffer}` ({source_len} elements) into `{buffer}` ({len} elements)"
    )]
    LengthMismatch {
        buffer: &'static str,
        len: usize,
        source_buffer: &'static str,
        source_len: usize,
    },
}

/// Heap buffer whose base address is a multiple of [`BUFFER_ALIGN`].
pub struct AlignedBuffer<T: Element> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
    name: &'static str,
}

impl<T: Element> AlignedBuffer<T> {
    /// Allocate `len` elements set to zero. Reports failure instead of aborting.
    pub fn zeroed(name: &'static str, len: usize) -> Result<Self, BufferError> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(BufferError::LayoutOverflow { buffer: name, len })?;
        // Zero-length buffers still get one aligned block so the base
        // pointer is always a real, aligned address.
        let layout = Layout::from_size_align(bytes.max(BUFFER_ALIGN), BUFFER_ALIGN)
            .map_err(|_| BufferError::LayoutOverflow { buffer: name, len })?;

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc(layout) } as *mut T;
        let ptr = NonNull::new(raw).ok_or(BufferError::Allocation {
            buffer: name,
            bytes: layout.size(),
        })?;

        for i in 0..len {
            // SAFETY: `i < len` and the block holds `len` elements of `T`.
            unsafe { ptr.as_ptr().add(i).write(T::ZERO) };
        }

        Ok(Self {
            ptr,
            len,
            layout,
            name,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` points to `len` initialised elements owned by `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Byte-for-byte copy of `source` into `self`.
    pub fn copy_from(&mut self, source: &AlignedBuffer<T>) -> Result<(), BufferError> {
        if self.len != source.len {
            return Err(BufferError::LengthMismatch {
                buffer: self.name,
                len: self.len,
                source_buffer: source.name,
                source_len: source.len,
            });
        }
        self.as_mut_slice().copy_from_slice(source.as_slice());
        Ok(())
    }

    pub fn try_clone(&self, name: &'static str) -> Result<Self, BufferError> {
        let mut copy = Self::zeroed(name, self.len)?;
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        Ok(copy)
    }

    /// Fill with uniform values in `[-1, 1)` from a generator seeded with `seed`.
    pub fn fill_uniform(&mut self, seed: u64) {
        let mut rng = fastrand::Rng::with_seed(seed);
        for value in self.as_mut_slice() {
            *value = T::from_f64(rng.f64() * 2.0 - 1.0);
        }
    }
}

impl<T: Element> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc` with exactly this layout.
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, self.layout) };
    }
}

impl<T: Element> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("ptr", &self.ptr)
            .finish()
    }
}

/// The `x`, `y`, `z` triple of one element-type run.
///
/// When misaligned, `x` carries one extra leading element and kernels see it
/// from offset 1, so the read stream starts exactly one element width past a
/// 64-byte boundary.
#[derive(Debug)]
pub struct BufferSet<T: Element> {
    x: AlignedBuffer<T>,
    y: AlignedBuffer<T>,
    z: AlignedBuffer<T>,
    n: usize,
    offset: usize,
}

impl<T: Element> BufferSet<T> {
    /// Allocate all three buffers. Buffers allocated before a failure are
    /// released when the partial set is dropped.
    pub fn allocate(n: usize, misalign: bool) -> Result<Self, BufferError> {
        Self::allocate_named(n, misalign, ["x", "y", "z"])
    }

    fn allocate_named(
        n: usize,
        misalign: bool,
        names: [&'static str; 3],
    ) -> Result<Self, BufferError> {
        let offset = usize::from(misalign);
        let x_len = n
            .checked_add(offset)
            .ok_or(BufferError::LayoutOverflow { buffer: names[0], len: n })?;
        let x = AlignedBuffer::zeroed(names[0], x_len)?;
        let y = AlignedBuffer::zeroed(names[1], n)?;
        let z = AlignedBuffer::zeroed(names[2], n)?;
        Ok(Self { x, y, z, n, offset })
    }

    /// Deterministic initial state: each buffer, including the extra
    /// misalignment element, is filled from its own generator seeded with `seed`.
    pub fn initialize(&mut self, seed: u64) {
        self.x.fill_uniform(seed);
        self.y.fill_uniform(seed);
        self.z.fill_uniform(seed);
    }

    /// Byte-identical copy of the whole set.
    pub fn snapshot(&self) -> Result<Self, BufferError> {
        self.duplicate(["x0", "y0", "z0"])
    }

    /// Disposable copy used for warmup iterations.
    pub fn scratch(&self) -> Result<Self, BufferError> {
        self.duplicate(["xw", "yw", "zw"])
    }

    fn duplicate(&self, names: [&'static str; 3]) -> Result<Self, BufferError> {
        Ok(Self {
            x: self.x.try_clone(names[0])?,
            y: self.y.try_clone(names[1])?,
            z: self.z.try_clone(names[2])?,
            n: self.n,
            offset: self.offset,
        })
    }

    /// Copy `snapshot` back over every working buffer, misalignment pad included.
    pub fn restore_from(&mut self, snapshot: &BufferSet<T>) -> Result<(), BufferError> {
        self.x.copy_from(&snapshot.x)?;
        self.y.copy_from(&snapshot.y)?;
        self.z.copy_from(&snapshot.z)?;
        Ok(())
    }

    pub fn operands(&mut self, stride: usize) -> Operands<'_, T> {
        let range = self.offset..self.offset + self.n;
        Operands::new(
            &self.x.as_slice()[range],
            self.y.as_mut_slice(),
            self.z.as_mut_slice(),
            stride,
        )
    }

    pub fn initial_state(&self) -> InitialState<'_, T> {
        InitialState {
            x: self.x_view(),
            y: self.y.as_slice(),
            z: self.z.as_slice(),
        }
    }

    /// `x` as the kernels see it.
    pub fn x_view(&self) -> &[T] {
        &self.x.as_slice()[self.offset..self.offset + self.n]
    }

    pub fn x_base(&self) -> &AlignedBuffer<T> {
        &self.x
    }

    pub fn y(&self) -> &[T] {
        self.y.as_slice()
    }

    pub fn z(&self) -> &[T] {
        self.z.as_slice()
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_addresses_are_aligned() {
        let set = BufferSet::<f64>::allocate(1000, false).expect("allocate");
        assert_eq!(set.x_view().as_ptr() as usize % BUFFER_ALIGN, 0);
        assert_eq!(set.y().as_ptr() as usize % BUFFER_ALIGN, 0);
        assert_eq!(set.z().as_ptr() as usize % BUFFER_ALIGN, 0);
    }

    #[test]
    fn misalignment_shifts_read_view_by_one_element() {
        let single = BufferSet::<f32>::allocate(100, true).expect("allocate");
        let double = BufferSet::<f64>::allocate(100, true).expect("allocate");
        assert_eq!(single.x_base().as_ptr() as usize % BUFFER_ALIGN, 0);
        assert_eq!(single.x_view().as_ptr() as usize % BUFFER_ALIGN, 4);
        assert_eq!(double.x_view().as_ptr() as usize % BUFFER_ALIGN, 8);
        assert_eq!(single.x_base().len(), 101);
        assert_eq!(single.x_view().len(), 100);
    }

    #[test]
    fn initialisation_is_seeded_and_bounded() {
        let mut a = BufferSet::<f64>::allocate(512, false).expect("allocate");
        let mut b = BufferSet::<f64>::allocate(512, false).expect("allocate");
        a.initialize(12345);
        b.initialize(12345);
        assert_eq!(a.y(), b.y());
        assert!(a.y().iter().all(|v| (-1.0..1.0).contains(v)));
        assert_eq!(a.x_view(), a.y());
    }

    #[test]
    fn restore_undoes_kernel_writes() {
        let mut working = BufferSet::<f32>::allocate(64, true).expect("allocate");
        working.initialize(7);
        let snapshot = working.snapshot().expect("snapshot");
        working.operands(1).y.iter_mut().for_each(|v| *v += 1.0);
        assert_ne!(working.y(), snapshot.y());
        working.restore_from(&snapshot).expect("restore");
        assert_eq!(working.y(), snapshot.y());
        assert_eq!(working.x_base().as_slice(), snapshot.x_base().as_slice());
    }

    #[test]
    fn mismatched_restore_is_an_error() {
        let mut small = BufferSet::<f64>::allocate(4, false).expect("allocate");
        let large = BufferSet::<f64>::allocate(8, false).expect("allocate");
        let err = small.restore_from(&large).expect_err("length mismatch");
        assert!(matches!(err, BufferError::LengthMismatch { .. }));
    }

    #[test]
    fn overflowing_length_is_reported_not_aborted() {
        let err = AlignedBuffer::<f64>::zeroed("huge", usize::MAX / 2).expect_err("overflow");
        assert!(matches!(err, BufferError::LayoutOverflow { .. }));
        assert!(err.to_string().contains("huge"));
    }

    #[test]
    fn empty_buffers_are_valid() {
        let mut set = BufferSet::<f64>::allocate(0, true).expect("allocate");
        assert!(set.is_empty());
        assert!(set.operands(3).y.is_empty());
        assert_eq!(set.x_base().len(), 1);
    }
}
