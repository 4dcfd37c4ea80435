//! Fixed, little-endian wire types for the census and schedule fan-out paths.
//!
//! Rank ids travel as `u32` (never `usize`) while cell counts travel as
//! `u64`: meshes large enough to need 64-bit cell counts still never need
//! more than 32 bits of rank id.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// All multi-byte integers in these structs are **little-endian** on the wire.
/// We store them pre-LE with `.to_le()` and decode with `::from_le()`.
///
/// Length header for a variable-length array that follows.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}
impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// A rank id carried on the wire.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireRank {
    pub id_le: u32,
}
impl WireRank {
    pub fn of(rank: usize) -> Self {
        Self {
            id_le: (rank as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.id_le) as usize
    }
}

/// A cell count carried on the wire.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireCells {
    pub n_le: u64,
}
impl WireCells {
    pub fn new(n: u64) -> Self {
        Self { n_le: n.to_le() }
    }
    pub fn get(&self) -> u64 {
        u64::from_le(self.n_le)
    }
}

// Pod/Zeroable ensures no padding contains uninit when cast to bytes.
const_assert_eq!(std::mem::size_of::<WireCount>(), 4);
const_assert_eq!(std::mem::size_of::<WireRank>(), 4);
const_assert_eq!(std::mem::size_of::<WireCells>(), 8);
