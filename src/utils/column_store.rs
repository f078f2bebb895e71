/// Structure-of-arrays storage over a fixed tuple of column types.
///
/// A pool declares its per-row data as a tuple, e.g.
/// `(u64, BufferUsage, Vec<u8>)`, and each tuple element becomes one
/// contiguous column. Row `i` across all columns is one logical object.
///
/// All growth goes through [`ColumnStore::append_row`], which appends a
/// default element to every column in one call, so the columns can never
/// disagree on length, so a "partial row" cannot exist.
///
/// Columns are addressed by position with a const generic:
/// `store.get::<0>(row)`. Clients name their columns with `const`
/// indices (`get::<{ COL_SIZE }>`), keeping the mapping from position
/// to meaning in one place.
///
/// No ownership or validity tracking of its own: accessors require
/// `row < row_count()` and the owning pool is responsible for only
/// passing live rows. Bounds are debug-asserted; this is a hot path.

use std::cell::UnsafeCell;

// ===== COLUMN TUPLE TRAITS =====

/// A tuple of column element types usable as pool storage.
///
/// Implemented for tuples of arity 1 to 6 whose elements are `Default`.
/// `Arrays` is the growable form (one `Vec` per column) used by
/// [`ColumnStore`]; `CellArrays` is the fixed-capacity form (one boxed
/// slice of `UnsafeCell`s per column) used by the bounded concurrent
/// store, where rows need per-element interior mutability and stable
/// addresses.
pub trait Columns {
    /// One growable `Vec` per column.
    type Arrays;
    /// One fixed, per-element interior-mutable slice per column.
    type CellArrays;

    /// Empty growable arrays.
    fn new_arrays() -> Self::Arrays;
    /// Append one default element to every column.
    fn append_default(arrays: &mut Self::Arrays);
    /// Shared length of the columns.
    fn row_count(arrays: &Self::Arrays) -> usize;
    /// Reset one row to default values in every column.
    fn reset_row(arrays: &mut Self::Arrays, row: usize);
    /// Fixed arrays with `capacity` default rows in every column.
    fn new_cell_arrays(capacity: usize) -> Self::CellArrays;

    /// Reset one row of the fixed arrays to default values.
    ///
    /// # Safety
    ///
    /// The caller must have exclusive access to `row` (hold its lock or
    /// be the allocator handing it out) and `row` must be in range.
    unsafe fn reset_cell_row(cells: &Self::CellArrays, row: usize);
}

/// Typed access to column `K` of a [`Columns`] tuple.
pub trait ColumnAt<const K: usize>: Columns {
    /// Element type of column `K`.
    type Element: Default;

    /// Column `K` of the growable arrays.
    fn column(arrays: &Self::Arrays) -> &[Self::Element];
    /// Column `K` of the growable arrays, mutable.
    fn column_mut(arrays: &mut Self::Arrays) -> &mut [Self::Element];
    /// Column `K` of the fixed cell arrays.
    fn cells(cells: &Self::CellArrays) -> &[UnsafeCell<Self::Element>];
}

macro_rules! impl_columns {
    ( $(($T:ident, $idx:tt)),+ ) => {
        impl<$($T: Default),+> Columns for ($($T,)+) {
            type Arrays = ($(Vec<$T>,)+);
            type CellArrays = ($(Box<[UnsafeCell<$T>]>,)+);

            fn new_arrays() -> Self::Arrays {
                ($(Vec::<$T>::new(),)+)
            }

            fn append_default(arrays: &mut Self::Arrays) {
                $(arrays.$idx.push(<$T>::default());)+
            }

            fn row_count(arrays: &Self::Arrays) -> usize {
                arrays.0.len()
            }

            fn reset_row(arrays: &mut Self::Arrays, row: usize) {
                $(arrays.$idx[row] = <$T>::default();)+
            }

            fn new_cell_arrays(capacity: usize) -> Self::CellArrays {
                ($(
                    (0..capacity)
                        .map(|_| UnsafeCell::new(<$T>::default()))
                        .collect::<Vec<_>>()
                        .into_boxed_slice(),
                )+)
            }

            unsafe fn reset_cell_row(cells: &Self::CellArrays, row: usize) {
                $(*cells.$idx[row].get() = <$T>::default();)+
            }
        }
    };
}

macro_rules! impl_column_at {
    ( ($($T:ident),+), $El:ident, $idx:tt ) => {
        impl<$($T: Default),+> ColumnAt<$idx> for ($($T,)+) {
            type Element = $El;

            fn column(arrays: &Self::Arrays) -> &[$El] {
                &arrays.$idx
            }

            fn column_mut(arrays: &mut Self::Arrays) -> &mut [$El] {
                &mut arrays.$idx
            }

            fn cells(cells: &Self::CellArrays) -> &[UnsafeCell<$El>] {
                &cells.$idx
            }
        }
    };
}

impl_columns!((A, 0));
impl_column_at!((A), A, 0);

impl_columns!((A, 0), (B, 1));
impl_column_at!((A, B), A, 0);
impl_column_at!((A, B), B, 1);

impl_columns!((A, 0), (B, 1), (C, 2));
impl_column_at!((A, B, C), A, 0);
impl_column_at!((A, B, C), B, 1);
impl_column_at!((A, B, C), C, 2);

impl_columns!((A, 0), (B, 1), (C, 2), (D, 3));
impl_column_at!((A, B, C, D), A, 0);
impl_column_at!((A, B, C, D), B, 1);
impl_column_at!((A, B, C, D), C, 2);
impl_column_at!((A, B, C, D), D, 3);

impl_columns!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_column_at!((A, B, C, D, E), A, 0);
impl_column_at!((A, B, C, D, E), B, 1);
impl_column_at!((A, B, C, D, E), C, 2);
impl_column_at!((A, B, C, D, E), D, 3);
impl_column_at!((A, B, C, D, E), E, 4);

impl_columns!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_column_at!((A, B, C, D, E, F), A, 0);
impl_column_at!((A, B, C, D, E, F), B, 1);
impl_column_at!((A, B, C, D, E, F), C, 2);
impl_column_at!((A, B, C, D, E, F), D, 3);
impl_column_at!((A, B, C, D, E, F), E, 4);
impl_column_at!((A, B, C, D, E, F), F, 5);

// ===== COLUMN STORE =====

/// Growable, unsynchronized SoA container over a column tuple `C`.
pub struct ColumnStore<C: Columns> {
    arrays: C::Arrays,
}

impl<C: Columns> ColumnStore<C> {
    /// Create an empty store (all columns length 0)
    pub fn new() -> Self {
        Self {
            arrays: C::new_arrays(),
        }
    }

    /// Append one default-initialized row to every column.
    ///
    /// Returns the new row's index.
    pub fn append_row(&mut self) -> usize {
        C::append_default(&mut self.arrays);
        C::row_count(&self.arrays) - 1
    }

    /// Reset every column of `row` back to its default value.
    ///
    /// Used by the pools when recycling a freed slot, so a reused row
    /// never exposes the previous object's data.
    pub fn reset_row(&mut self, row: usize) {
        debug_assert!(
            row < self.row_count(),
            "row {} out of range ({} rows)",
            row,
            self.row_count()
        );
        C::reset_row(&mut self.arrays, row);
    }

    /// Number of rows (identical across all columns)
    pub fn row_count(&self) -> usize {
        C::row_count(&self.arrays)
    }

    /// Read column `K` of `row`.
    pub fn get<const K: usize>(&self, row: usize) -> &<C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(
            row < self.row_count(),
            "row {} out of range ({} rows)",
            row,
            self.row_count()
        );
        &<C as ColumnAt<K>>::column(&self.arrays)[row]
    }

    /// Mutable access to column `K` of `row`.
    pub fn get_mut<const K: usize>(&mut self, row: usize) -> &mut <C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(
            row < self.row_count(),
            "row {} out of range ({} rows)",
            row,
            self.row_count()
        );
        &mut <C as ColumnAt<K>>::column_mut(&mut self.arrays)[row]
    }

    /// Overwrite column `K` of `row`.
    pub fn set<const K: usize>(&mut self, row: usize, value: <C as ColumnAt<K>>::Element)
    where
        C: ColumnAt<K>,
    {
        *self.get_mut::<K>(row) = value;
    }
}

impl<C: Columns> Default for ColumnStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "column_store_tests.rs"]
mod tests;
