//! Span iterators
//!
//! All iterators walk a `[front, back)` window of row-major positions, so
//! they are double-ended and exact-size. They hold their own copy of the
//! layout; asking the span again starts a fresh pass.

use std::cell::Cell;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::bits::{read_raw, write_raw};
use super::element::Element;
use super::layout::Layout;
use super::view::{Backing, Span, SpanMut};

/// Position window shared by every iterator here
#[derive(Debug, Clone, Copy)]
struct Cursor {
    front: usize,
    back: usize,
}

impl Cursor {
    fn new(len: usize) -> Self {
        Self { front: 0, back: len }
    }

    fn next(&mut self) -> Option<usize> {
        (self.front < self.back).then(|| {
            self.front += 1;
            self.front - 1
        })
    }

    fn next_back(&mut self) -> Option<usize> {
        (self.front < self.back).then(|| {
            self.back -= 1;
            self.back
        })
    }

    fn remaining(&self) -> usize {
        self.back - self.front
    }
}

macro_rules! impl_window_iterator {
    ($name:ident, $item:ty, |$this:ident, $pos:ident| $make:expr) => {
        impl<'a, T: Element> Iterator for $name<'a, T> {
            type Item = $item;

            fn next(&mut self) -> Option<Self::Item> {
                let $pos = self.cursor.next()?;
                let $this = &*self;
                Some($make)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                let remaining = self.cursor.remaining();
                (remaining, Some(remaining))
            }
        }

        impl<'a, T: Element> DoubleEndedIterator for $name<'a, T> {
            fn next_back(&mut self) -> Option<Self::Item> {
                let $pos = self.cursor.next_back()?;
                let $this = &*self;
                Some($make)
            }
        }

        impl<'a, T: Element> ExactSizeIterator for $name<'a, T> {}

        impl<'a, T: Element> FusedIterator for $name<'a, T> {}
    };
}

// =============================================================================
// Read-only
// =============================================================================

/// Elements of a span in row-major order
#[derive(Clone)]
pub struct Values<'a, T: Element> {
    backing: Backing<'a>,
    layout: Layout,
    cursor: Cursor,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> Values<'a, T> {
    pub(crate) fn new(backing: Backing<'a>, layout: Layout) -> Self {
        Self {
            backing,
            layout,
            cursor: Cursor::new(layout.len()),
            _marker: PhantomData,
        }
    }
}

impl_window_iterator!(Values, T, |this, pos| T::from_raw(read_raw(
    &this.backing,
    this.layout.nth(pos),
    T::BITS
)));

/// Sub-spans along the outermost dimension
#[derive(Clone)]
pub struct Rows<'a, T: Element> {
    backing: Backing<'a>,
    layout: Layout,
    cursor: Cursor,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> Rows<'a, T> {
    pub(crate) fn new(backing: Backing<'a>, layout: Layout) -> Self {
        Self {
            backing,
            layout,
            cursor: Cursor::new(layout.dims()[0]),
            _marker: PhantomData,
        }
    }
}

impl_window_iterator!(Rows, Span<'a, T>, |this, pos| Span::from_parts(
    this.backing,
    this.layout.row(pos)
));

// =============================================================================
// Mutable
// =============================================================================

/// Handle to one element of a mutable span
#[derive(Clone, Copy)]
pub struct ElementMut<'a, T: Element> {
    cells: &'a [Cell<u8>],
    index: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> ElementMut<'_, T> {
    pub fn get(&self) -> T {
        T::from_raw(read_raw(self.cells, self.index, T::BITS))
    }

    pub fn set(&self, value: T) {
        write_raw(self.cells, self.index, T::BITS, value.to_raw());
    }

    /// Replace the value with `f(old)`
    pub fn update(&self, f: impl FnOnce(T) -> T) {
        self.set(f(self.get()));
    }
}

impl<T: Element> std::fmt::Debug for ElementMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ElementMut").field(&self.get()).finish()
    }
}

/// Writable element handles in row-major order
pub struct ValuesMut<'a, T: Element> {
    cells: &'a [Cell<u8>],
    layout: Layout,
    cursor: Cursor,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> ValuesMut<'a, T> {
    pub(crate) fn new(cells: &'a [Cell<u8>], layout: Layout) -> Self {
        Self {
            cells,
            layout,
            cursor: Cursor::new(layout.len()),
            _marker: PhantomData,
        }
    }
}

impl_window_iterator!(ValuesMut, ElementMut<'a, T>, |this, pos| ElementMut {
    cells: this.cells,
    index: this.layout.nth(pos),
    _marker: PhantomData,
});

/// Mutable sub-spans along the outermost dimension
pub struct RowsMut<'a, T: Element> {
    cells: &'a [Cell<u8>],
    layout: Layout,
    cursor: Cursor,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> RowsMut<'a, T> {
    pub(crate) fn new(cells: &'a [Cell<u8>], layout: Layout) -> Self {
        Self {
            cells,
            layout,
            cursor: Cursor::new(layout.dims()[0]),
            _marker: PhantomData,
        }
    }
}

impl_window_iterator!(RowsMut, SpanMut<'a, T>, |this, pos| SpanMut::from_parts(
    this.cells,
    this.layout.row(pos)
));
