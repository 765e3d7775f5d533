// Path: crates/candid/src/reader.rs
//! A bounds-checked cursor over a wire message.

use crate::leb128;
use crate::Result;
use ica_types::error::CandidError;
use num_bigint::{BigInt, BigUint};

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(|| underrun(n))?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| underrun(n))?;
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        slice.try_into().map_err(|_| underrun(N))
    }

    pub(crate) fn byte(&mut self) -> Result<u8> {
        let [b] = self.take_array::<1>()?;
        Ok(b)
    }

    /// ULEB128 bounded to `bits`.
    pub(crate) fn uleb(&mut self, bits: u32) -> Result<u64> {
        let (value, used) = leb128::decode_bounded(self.bytes, self.pos, bits)?;
        self.pos += used;
        Ok(value)
    }

    pub(crate) fn sleb(&mut self, bits: u32) -> Result<i64> {
        let (value, used) = leb128::decode_signed_bounded(self.bytes, self.pos, bits)?;
        self.pos += used;
        Ok(value)
    }

    /// A length or count: must fit in 32 bits and index this platform.
    pub(crate) fn len(&mut self) -> Result<usize> {
        let n = self.uleb(32)?;
        usize::try_from(n).map_err(|_| CandidError::Range(format!("length {n} exceeds usize")))
    }

    pub(crate) fn nat(&mut self) -> Result<BigUint> {
        let (value, used) = leb128::decode_nat(self.bytes, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    pub(crate) fn int(&mut self) -> Result<BigInt> {
        let (value, used) = leb128::decode_int(self.bytes, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Length-prefixed bytes.
    pub(crate) fn blob(&mut self) -> Result<&'a [u8]> {
        let len = self.len()?;
        self.take(len)
    }

    pub(crate) fn text(&mut self) -> Result<String> {
        let bytes = self.blob()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| CandidError::Encoding(format!("invalid utf-8 in text: {e}")))
    }
}

fn underrun(wanted: usize) -> CandidError {
    CandidError::Encoding(format!("unexpected end of input reading {wanted} bytes"))
}
