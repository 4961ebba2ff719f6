// SPDX-License-Identifier: MIT

use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::{BlockIO, BlockIOError, BlockIOResult};

/// `BlockIO` over any seekable std stream (files, cursors).
#[derive(Debug)]
pub struct StdBlockIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    partition_offset: u64,
}

impl<'a, T: Read + Write + Seek> StdBlockIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(io: &'a mut T, partition_offset: u64) -> Self {
        Self {
            io,
            partition_offset,
        }
    }

    /// Total length of the underlying stream in bytes.
    pub fn stream_len(&mut self) -> BlockIOResult<u64> {
        let len = self.io.seek(SeekFrom::End(0))?;
        Ok(len)
    }
}

impl<'a, T: Read + Write + Seek> BlockIO for StdBlockIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> BlockIOResult {
        self.io.flush()?;
        Ok(())
    }

    #[inline]
    fn set_offset(&mut self, partition_offset: u64) -> u64 {
        self.partition_offset = partition_offset;
        partition_offset
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}

impl From<Error> for BlockIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        if e.kind() == ErrorKind::UnexpectedEof {
            return BlockIOError::ShortRead;
        }
        // Leak the string to produce a 'static str. IO errors end the run.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        BlockIOError::Other(leaked_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_short_read_is_reported() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);
        io.write_at(0, &[0xAA; 100]).unwrap();

        let mut output = [0u8; 64];
        assert_eq!(io.read_at(80, &mut output), Err(BlockIOError::ShortRead));
    }

    #[test]
    fn test_partition_offset_applies_to_reads() {
        let mut file = tempfile().unwrap();
        {
            let mut io = StdBlockIO::new(&mut file);
            io.write_at(4096 + 8, &[9, 8, 7, 6]).unwrap();
        }
        let mut io = StdBlockIO::new_with_offset(&mut file, 4096);
        assert_eq!(io.read_u32_be_at(8).unwrap(), 0x0908_0706);
        assert_eq!(io.stream_len().unwrap(), 4096 + 12);
    }

    #[test]
    fn test_read_block() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);
        io.zero_fill(0, 3 * 512).unwrap();
        io.write_block(2, 512, &[0xCD; 512]).unwrap();

        let mut block = [0u8; 512];
        io.read_block(2, 512, &mut block).unwrap();
        assert!(block.iter().all(|&b| b == 0xCD));
    }
}
