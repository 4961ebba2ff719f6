// SPDX-License-Identifier: MIT

use std::io::Write;

use fscio::prelude::*;
use fscpart::{errors::PartError, *};

fn image_with_table(table: &PartTable, sectors: usize) -> tempfile::NamedTempFile {
    let mut img = vec![0u8; sectors * DEFAULT_SECTOR_SIZE as usize];
    {
        let mut io = MemBlockIO::new(&mut img);
        write_part_table(&mut io, table).unwrap();
    }
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(&img).unwrap();
    f
}

#[test]
fn selects_partition_from_file_image() {
    let mut table = PartTable::new_empty();
    table.entries[1] = PartEntry::new(PART_TYPE_FS, false, 16, 64, "fs");
    table.entries[2] = PartEntry::new(PART_TYPE_SWAP, false, 80, 16, "swap");
    let tmp = image_with_table(&table, 96);

    let mut file = std::fs::File::open(tmp.path()).unwrap();
    let mut io = StdBlockIO::new(&mut file);
    let read = read_part_table(&mut io).unwrap();

    let window = read.select(1).unwrap();
    assert_eq!(window.byte_offset(), 16 * 512);
    assert_eq!(window.block_count(), 8);
    assert_eq!(window.warnings(96 * 512).count(), 0);

    assert_eq!(read.select(2), Err(PartError::Swap { index: 2 }));
    assert_eq!(read.select(42), Err(PartError::IllegalNumber(42)));
}

#[test]
fn truncated_image_is_an_io_error() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&[0u8; 600]).unwrap();
    let mut io = StdBlockIO::new(&mut file);
    assert_eq!(
        read_part_table(&mut io).unwrap_err(),
        PartError::IO(BlockIOError::ShortRead)
    );
}
