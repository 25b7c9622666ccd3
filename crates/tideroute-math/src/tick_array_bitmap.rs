//! Sparse index of initialized tick arrays
//!
//! The pool account carries a 1024-bit map centred on start index 0, one bit per
//! tick array, covering `±512` arrays. Arrays further out are tracked by the
//! extension account in 512-bit blocks, fourteen per side.

use crate::error::{ComputeError, ComputeResult};
use crate::tick_array::{check_is_valid_start_index, get_array_start_index, tick_count, TICK_ARRAY_SIZE};
use crate::tick_math::{MAX_TICK, MIN_TICK};

/// Arrays tracked by one half of the default bitmap, and by one extension block
pub const TICK_ARRAY_BITMAP_SIZE: i32 = 512;
pub const EXTENSION_TICKARRAY_BITMAP_SIZE: usize = 14;

pub type DefaultBitmap = [u64; 16];
pub type ExtensionBlock = [u64; 8];

/// Highest tick reachable through the default bitmap
pub fn max_tick_in_tickarray_bitmap(tick_spacing: u16) -> i32 {
    i32::from(tick_spacing) * TICK_ARRAY_SIZE * TICK_ARRAY_BITMAP_SIZE
}

/// Range `[min, max)` of ticks covered by the bitmap block that holds `tick_array_start_index`
pub fn get_bitmap_tick_boundary(tick_array_start_index: i32, tick_spacing: u16) -> (i32, i32) {
    let ticks_in_one_bitmap = max_tick_in_tickarray_bitmap(tick_spacing);
    let mut m = tick_array_start_index.abs() / ticks_in_one_bitmap;
    if tick_array_start_index < 0 && tick_array_start_index.abs() % ticks_in_one_bitmap != 0 {
        m += 1;
    }
    let min_value = ticks_in_one_bitmap * m;
    if tick_array_start_index < 0 {
        (-min_value, -min_value + ticks_in_one_bitmap)
    } else {
        (min_value, min_value + ticks_in_one_bitmap)
    }
}

fn bit_is_set(words: &[u64], bit: usize) -> bool {
    words[bit / 64] & (1u64 << (bit % 64)) != 0
}

/// Highest set bit at or below `bit`
fn highest_set_bit_at_or_below(words: &[u64], bit: usize) -> Option<usize> {
    (0..=bit).rev().find(|&candidate| bit_is_set(words, candidate))
}

/// Lowest set bit at or above `bit`
fn lowest_set_bit_at_or_above(words: &[u64], bit: usize) -> Option<usize> {
    (bit..words.len() * 64).find(|&candidate| bit_is_set(words, candidate))
}

/// Position of the array holding `tick_index` in the default bitmap
fn default_bitmap_position(tick_index: i32, tick_spacing: u16) -> i32 {
    let multiplier = tick_count(tick_spacing);
    tick_index.div_euclid(multiplier) + TICK_ARRAY_BITMAP_SIZE
}

/// Whether any of the ticks falls outside the default bitmap
pub fn is_overflow_default_tickarray_bitmap(tick_spacing: u16, tick_indexes: &[i32]) -> bool {
    let (min_tick_boundary, max_tick_boundary) = tick_array_start_index_range(tick_spacing);
    tick_indexes.iter().any(|&tick| {
        let start_index = get_array_start_index(tick, tick_spacing);
        start_index >= max_tick_boundary || start_index < min_tick_boundary
    })
}

/// Start-index range `[min, max)` served by the default bitmap, clamped to the tick domain
pub fn tick_array_start_index_range(tick_spacing: u16) -> (i32, i32) {
    let mut max_tick_boundary = max_tick_in_tickarray_bitmap(tick_spacing);
    let mut min_tick_boundary = -max_tick_boundary;
    if max_tick_boundary > MAX_TICK {
        max_tick_boundary = get_array_start_index(MAX_TICK, tick_spacing) + tick_count(tick_spacing);
    }
    if min_tick_boundary < MIN_TICK {
        min_tick_boundary = get_array_start_index(MIN_TICK, tick_spacing);
    }
    (min_tick_boundary, max_tick_boundary)
}

/// Whether the array holding `tick_current` is flagged, plus that array's start index
pub fn check_current_tick_array_is_initialized(
    bitmap: &DefaultBitmap,
    tick_current: i32,
    tick_spacing: u16,
) -> ComputeResult<(bool, i32)> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick_current) {
        return Err(ComputeError::TickOutOfRange(tick_current));
    }
    let position = default_bitmap_position(tick_current, tick_spacing);
    let start_index = (position - TICK_ARRAY_BITMAP_SIZE) * tick_count(tick_spacing);
    if !(0..1024).contains(&position) {
        return Ok((false, start_index));
    }
    Ok((bit_is_set(bitmap, position as usize), start_index))
}

/// Next flagged array strictly after `last_tick_array_start_index` in the swap direction.
///
/// `(false, boundary)` means the default bitmap holds nothing further that way.
pub fn next_initialized_tick_array_start_index(
    bitmap: &DefaultBitmap,
    last_tick_array_start_index: i32,
    tick_spacing: u16,
    zero_for_one: bool,
) -> (bool, i32) {
    let tick_boundary = max_tick_in_tickarray_bitmap(tick_spacing);
    let ticks_in_array = tick_count(tick_spacing);
    let next_start_index = if zero_for_one {
        last_tick_array_start_index - ticks_in_array
    } else {
        last_tick_array_start_index + ticks_in_array
    };

    if next_start_index < -tick_boundary || next_start_index >= tick_boundary {
        return (false, last_tick_array_start_index);
    }

    let position = default_bitmap_position(next_start_index, tick_spacing) as usize;
    if zero_for_one {
        match highest_set_bit_at_or_below(bitmap, position) {
            Some(bit) => (true, (bit as i32 - TICK_ARRAY_BITMAP_SIZE) * ticks_in_array),
            None => (false, -tick_boundary),
        }
    } else {
        match lowest_set_bit_at_or_above(bitmap, position) {
            Some(bit) => (true, (bit as i32 - TICK_ARRAY_BITMAP_SIZE) * ticks_in_array),
            None => (false, tick_boundary - ticks_in_array),
        }
    }
}

/// Bitmap blocks for tick arrays beyond the default bitmap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickArrayBitmapExtension {
    pub positive_tick_array_bitmap: [ExtensionBlock; EXTENSION_TICKARRAY_BITMAP_SIZE],
    pub negative_tick_array_bitmap: [ExtensionBlock; EXTENSION_TICKARRAY_BITMAP_SIZE],
}

impl TickArrayBitmapExtension {
    fn check_extension_boundary(tick_index: i32, tick_spacing: u16) -> ComputeResult<()> {
        let positive_tick_boundary = max_tick_in_tickarray_bitmap(tick_spacing);
        let negative_tick_boundary = -positive_tick_boundary;
        if tick_index >= negative_tick_boundary && tick_index < positive_tick_boundary {
            return Err(ComputeError::TickOutOfRange(tick_index));
        }
        Ok(())
    }

    fn get_bitmap_offset(tick_index: i32, tick_spacing: u16) -> ComputeResult<usize> {
        if !check_is_valid_start_index(tick_index, tick_spacing) {
            return Err(ComputeError::TickOutOfRange(tick_index));
        }
        Self::check_extension_boundary(tick_index, tick_spacing)?;

        let ticks_in_one_bitmap = max_tick_in_tickarray_bitmap(tick_spacing);
        let mut offset = tick_index.abs() / ticks_in_one_bitmap - 1;
        if tick_index < 0 && tick_index.abs() % ticks_in_one_bitmap == 0 {
            offset -= 1;
        }
        usize::try_from(offset)
            .ok()
            .filter(|offset| *offset < EXTENSION_TICKARRAY_BITMAP_SIZE)
            .ok_or(ComputeError::TickOutOfRange(tick_index))
    }

    fn get_bitmap(&self, tick_index: i32, tick_spacing: u16) -> ComputeResult<&ExtensionBlock> {
        let offset = Self::get_bitmap_offset(tick_index, tick_spacing)?;
        Ok(if tick_index < 0 {
            &self.negative_tick_array_bitmap[offset]
        } else {
            &self.positive_tick_array_bitmap[offset]
        })
    }

    /// Bit position of the array inside its 512-bit block
    pub fn tick_array_offset_in_bitmap(tick_array_start_index: i32, tick_spacing: u16) -> i32 {
        let m = tick_array_start_index.abs() % max_tick_in_tickarray_bitmap(tick_spacing);
        let mut offset = m / tick_count(tick_spacing);
        if tick_array_start_index < 0 && m != 0 {
            offset = TICK_ARRAY_BITMAP_SIZE - offset;
        }
        offset
    }

    pub fn check_tick_array_is_initialized(
        &self,
        tick_array_start_index: i32,
        tick_spacing: u16,
    ) -> ComputeResult<(bool, i32)> {
        let block = self.get_bitmap(tick_array_start_index, tick_spacing)?;
        let offset = Self::tick_array_offset_in_bitmap(tick_array_start_index, tick_spacing);
        Ok((bit_is_set(block, offset as usize), tick_array_start_index))
    }

    /// Search the block after `last_tick_array_start_index` in the swap direction.
    ///
    /// `(false, boundary)` means the block holds nothing further; the caller moves
    /// on to the next block from `boundary`.
    pub fn next_initialized_tick_array_from_one_bitmap(
        &self,
        last_tick_array_start_index: i32,
        tick_spacing: u16,
        zero_for_one: bool,
    ) -> ComputeResult<(bool, i32)> {
        let multiplier = tick_count(tick_spacing);
        let next_start_index = if zero_for_one {
            last_tick_array_start_index - multiplier
        } else {
            last_tick_array_start_index + multiplier
        };
        let min_start_index = get_array_start_index(MIN_TICK, tick_spacing);
        let max_start_index = get_array_start_index(MAX_TICK, tick_spacing);
        if next_start_index < min_start_index || next_start_index > max_start_index {
            return Ok((false, next_start_index));
        }

        let block = self.get_bitmap(next_start_index, tick_spacing)?;
        Ok(Self::next_initialized_tick_array_in_bitmap(
            block,
            next_start_index,
            tick_spacing,
            zero_for_one,
        ))
    }

    fn next_initialized_tick_array_in_bitmap(
        block: &ExtensionBlock,
        next_start_index: i32,
        tick_spacing: u16,
        zero_for_one: bool,
    ) -> (bool, i32) {
        let (bitmap_min_boundary, bitmap_max_boundary) =
            get_bitmap_tick_boundary(next_start_index, tick_spacing);
        let offset = Self::tick_array_offset_in_bitmap(next_start_index, tick_spacing) as usize;
        let ticks_in_array = tick_count(tick_spacing);

        if zero_for_one {
            match highest_set_bit_at_or_below(block, offset) {
                Some(bit) => (
                    true,
                    next_start_index - (offset - bit) as i32 * ticks_in_array,
                ),
                None => (false, bitmap_min_boundary),
            }
        } else {
            match lowest_set_bit_at_or_above(block, offset) {
                Some(bit) => (
                    true,
                    next_start_index + (bit - offset) as i32 * ticks_in_array,
                ),
                None => (false, bitmap_max_boundary - ticks_in_array),
            }
        }
    }
}

/// The pool-level view over both bitmaps
#[derive(Debug, Clone, Copy)]
pub struct TickArrayBitmaps<'a> {
    pub tick_spacing: u16,
    pub default_bitmap: &'a DefaultBitmap,
    pub extension: Option<&'a TickArrayBitmapExtension>,
}

impl<'a> TickArrayBitmaps<'a> {
    fn extension(&self) -> ComputeResult<&'a TickArrayBitmapExtension> {
        self.extension.ok_or_else(|| {
            ComputeError::InvalidTickArray("bitmap extension required but not loaded".to_string())
        })
    }

    /// The array the swap starts in: the current tick's own array when it is
    /// initialized, else the next initialized one in the swap direction.
    /// The flag reports whether the current tick's array was used.
    pub fn first_initialized_tick_array(
        &self,
        tick_current: i32,
        zero_for_one: bool,
    ) -> ComputeResult<(bool, i32)> {
        let (is_initialized, start_index) =
            if is_overflow_default_tickarray_bitmap(self.tick_spacing, &[tick_current]) {
                self.extension()?.check_tick_array_is_initialized(
                    get_array_start_index(tick_current, self.tick_spacing),
                    self.tick_spacing,
                )?
            } else {
                check_current_tick_array_is_initialized(
                    self.default_bitmap,
                    tick_current,
                    self.tick_spacing,
                )?
            };
        if is_initialized {
            return Ok((true, start_index));
        }

        let next = self.next_initialized_tick_array_start_index(
            get_array_start_index(tick_current, self.tick_spacing),
            zero_for_one,
        )?;
        next.map(|start| (false, start))
            .ok_or(ComputeError::InsufficientLiquidity)
    }

    /// Next initialized array after `last_tick_array_start_index`, walking
    /// the default bitmap and then the extension blocks.
    pub fn next_initialized_tick_array_start_index(
        &self,
        mut last_tick_array_start_index: i32,
        zero_for_one: bool,
    ) -> ComputeResult<Option<i32>> {
        last_tick_array_start_index =
            get_array_start_index(last_tick_array_start_index, self.tick_spacing);

        loop {
            let (is_found, start_index) = next_initialized_tick_array_start_index(
                self.default_bitmap,
                last_tick_array_start_index,
                self.tick_spacing,
                zero_for_one,
            );
            if is_found {
                return Ok(Some(start_index));
            }
            last_tick_array_start_index = start_index;

            let (is_found, start_index) = match self.extension {
                Some(extension) => extension.next_initialized_tick_array_from_one_bitmap(
                    last_tick_array_start_index,
                    self.tick_spacing,
                    zero_for_one,
                )?,
                None => return Ok(None),
            };
            if is_found {
                return Ok(Some(start_index));
            }
            last_tick_array_start_index = start_index;

            if last_tick_array_start_index < MIN_TICK || last_tick_array_start_index > MAX_TICK {
                return Ok(None);
            }
        }
    }

    /// Start indexes of up to `count` initialized arrays the swap will visit first
    pub fn initialized_tick_arrays_ahead(
        &self,
        tick_current: i32,
        zero_for_one: bool,
        count: usize,
    ) -> ComputeResult<Vec<i32>> {
        let mut starts = Vec::with_capacity(count);
        if count == 0 {
            return Ok(starts);
        }
        let (_, first) = match self.first_initialized_tick_array(tick_current, zero_for_one) {
            Ok(found) => found,
            Err(ComputeError::InsufficientLiquidity) => return Ok(starts),
            Err(err) => return Err(err),
        };
        starts.push(first);
        while starts.len() < count {
            match self.next_initialized_tick_array_start_index(starts[starts.len() - 1], zero_for_one)? {
                Some(next) => starts.push(next),
                None => break,
            }
        }
        Ok(starts)
    }
}
