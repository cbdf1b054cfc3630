// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Encode;
use zeroize::Zeroize;

use super::Error;

/// Scratch buffer length, sized for the largest offloaded record
pub const SCRATCH_LEN: usize = 128;

/// Fixed-size working buffer shared by request handlers
///
/// This is the only transient buffer used to process a request and is
/// cleared at every request boundary, bounding the engine working set
/// to a single step independent of the transaction size.
pub struct Scratch {
    buff: [u8; SCRATCH_LEN],
    len: usize,
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

impl Scratch {
    /// Create a new / empty scratch buffer
    pub const fn new() -> Self {
        Self {
            buff: [0u8; SCRATCH_LEN],
            len: 0,
        }
    }

    /// Encode a record into the scratch buffer, returning the canonical encoding
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode<E: Encode<Error = encdec::Error>>(&mut self, v: &E) -> Result<&[u8], Error> {
        self.clear();

        let n = v.encode(&mut self.buff)?;
        self.len = n;

        Ok(&self.buff[..n])
    }

    /// Fetch the number of bytes currently in use
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clear buffer contents
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn clear(&mut self) {
        self.buff.zeroize();
        self.len = 0;
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        self.clear();
    }
}
