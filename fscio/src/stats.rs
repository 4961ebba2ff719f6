// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    // Alignment against the counter's `align` (block size for the checker)
    pub aligned_reads: u64,
    pub unaligned_reads: u64,

    pub max_read: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
pub struct IOCounter<'a, IO: BlockIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
    /// Local "block" alignment (e.g. 512, 4096).
    pub align: u64,
}

impl<'a, IO: BlockIO + ?Sized> IOCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
            align: 1,
        }
    }

    #[inline]
    pub fn with_align(inner: &'a mut IO, align: u64) -> Self {
        let align = if align == 0 { 1 } else { align };
        Self {
            inner,
            stats: IoStats::default(),
            align,
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> &'a mut IO {
        self.inner
    }
}

impl<'a, IO: BlockIO + ?Sized> BlockIO for IOCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let aligned = (offset % self.align == 0) && (buf.len() as u64 % self.align == 0);
        if aligned {
            self.stats.aligned_reads += 1;
        } else {
            self.stats.unaligned_reads += 1;
        }

        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        if self.stats.max_read < buf.len() as u64 {
            self.stats.max_read = buf.len() as u64;
        }

        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline]
    fn set_offset(&mut self, p: u64) -> u64 {
        self.inner.set_offset(p)
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.inner.partition_offset()
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn counts_reads_and_alignment() {
        let mut buf = [0u8; 8192];
        let mut mem = MemBlockIO::new(&mut buf);
        let mut io = IOCounter::with_align(&mut mem, 4096);

        let mut block = [0u8; 4096];
        io.read_block(1, 4096, &mut block).unwrap();
        io.read_u32_be_at(12).unwrap();
        io.write_at(0, &[1, 2]).unwrap();
        io.flush().unwrap();

        let s = io.snapshot();
        assert_eq!(s.reads, 2);
        assert_eq!(s.aligned_reads, 1);
        assert_eq!(s.unaligned_reads, 1);
        assert_eq!(s.read_bytes, 4100);
        assert_eq!(s.max_read, 4096);
        assert_eq!(s.writes, 1);
        assert_eq!(s.flushes, 1);

        io.stats.reset();
        assert_eq!(io.snapshot(), IoStats::default());
    }
}
