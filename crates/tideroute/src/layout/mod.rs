//! Binary account layouts
//!
//! Every account starts with an 8-byte discriminator that is skipped, not
//! checked; discovery filters already restrict results to one program and one
//! account size. Integers are little-endian, addresses are raw 32-byte keys.

pub mod clmm;
pub mod cpmm;
pub mod pump;
pub mod token;

use solana_sdk::pubkey::Pubkey;

use crate::error::DecodeError;

pub const DISCRIMINATOR_LEN: usize = 8;

/// One named field in a layout's offset table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub len: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, len: usize) -> Self {
        Self { name, offset, len }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A fixed-layout account type
pub trait AccountLayout: Sized {
    /// Size of the account on chain, used as the discovery size filter
    const SPAN: usize;

    /// Fewest bytes `decode` accepts
    const MIN_LEN: usize = Self::SPAN;

    /// Named fields in declaration order
    const FIELDS: &'static [FieldSpec];

    /// Byte offset of `name`, discriminator included
    fn field_offset(name: &str) -> Option<usize> {
        Self::FIELDS
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.offset)
    }

    fn fixed_span() -> usize {
        Self::SPAN
    }

    /// Decode the account stored at `address`
    fn decode(address: Pubkey, data: &[u8]) -> Result<Self, DecodeError>;
}

pub(crate) fn check_len(data: &[u8], expected: usize) -> Result<(), DecodeError> {
    if data.len() < expected {
        return Err(DecodeError::TooShort {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn slice<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::TooShort {
            expected: offset + N,
            actual: data.len(),
        })
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8, DecodeError> {
    Ok(slice::<1>(data, offset)?[0])
}

pub(crate) fn read_bool(data: &[u8], offset: usize, field: &'static str) -> Result<bool, DecodeError> {
    match read_u8(data, offset)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidField {
            field,
            reason: format!("expected 0 or 1, got {}", other),
        }),
    }
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16, DecodeError> {
    slice(data, offset).map(u16::from_le_bytes)
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32, DecodeError> {
    slice(data, offset).map(u32::from_le_bytes)
}

pub(crate) fn read_i32(data: &[u8], offset: usize) -> Result<i32, DecodeError> {
    slice(data, offset).map(i32::from_le_bytes)
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Result<u64, DecodeError> {
    slice(data, offset).map(u64::from_le_bytes)
}

pub(crate) fn read_u128(data: &[u8], offset: usize) -> Result<u128, DecodeError> {
    slice(data, offset).map(u128::from_le_bytes)
}

pub(crate) fn read_i128(data: &[u8], offset: usize) -> Result<i128, DecodeError> {
    slice(data, offset).map(i128::from_le_bytes)
}

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, DecodeError> {
    slice::<32>(data, offset).map(Pubkey::new_from_array)
}

/// `N` consecutive little-endian u64 words
pub(crate) fn read_u64_words<const N: usize>(data: &[u8], offset: usize) -> Result<[u64; N], DecodeError> {
    let mut words = [0u64; N];
    for (i, word) in words.iter_mut().enumerate() {
        *word = read_u64(data, offset + i * 8)?;
    }
    Ok(words)
}
