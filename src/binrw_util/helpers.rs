use binrw::{prelude::*, Endian};

#[binrw::parser(reader, endian)]
pub fn read_u48() -> binrw::BinResult<u64> {
    type ConvFn = fn([u8; 8]) -> u64;
    let mut buf = [0u8; 8];
    let (conv, out): (ConvFn, &mut [u8]) = match endian {
        Endian::Little => (u64::from_le_bytes, &mut buf[..6]),
        Endian::Big => (u64::from_be_bytes, &mut buf[2..]),
    };
    reader.read_exact(out)?;
    Ok(conv(buf))
}

/// Copies exactly `size` bytes out of the reader.
///
/// Running out of input is reported as an I/O error, never as a short read:
/// a record whose declared size exceeds the remaining data leaves the stream
/// out of sync with record boundaries.
#[binrw::parser(reader)]
pub fn read_sized_bytes(size: usize) -> binrw::BinResult<Vec<u8>> {
    let mut data = vec![0u8; size];
    reader.read_exact(&mut data)?;
    Ok(data)
}
