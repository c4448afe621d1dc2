//! Fixed-width little-endian fields at absolute buffer offsets.
//!
//! The containers store every multi-byte field little-endian regardless of
//! host, so streams move between machines.

pub fn put_u16(buf: &mut [u8],offset: usize,val: u16) {
    buf[offset..offset+2].copy_from_slice(&u16::to_le_bytes(val));
}

pub fn put_u32(buf: &mut [u8],offset: usize,val: u32) {
    buf[offset..offset+4].copy_from_slice(&u32::to_le_bytes(val));
}

pub fn put_u64(buf: &mut [u8],offset: usize,val: u64) {
    buf[offset..offset+8].copy_from_slice(&u64::to_le_bytes(val));
}

pub fn get_u16(buf: &[u8],offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset],buf[offset+1]])
}

pub fn get_u32(buf: &[u8],offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset],buf[offset+1],buf[offset+2],buf[offset+3]])
}

pub fn get_u64(buf: &[u8],offset: usize) -> u64 {
    u64::from_le_bytes([buf[offset],buf[offset+1],buf[offset+2],buf[offset+3],
        buf[offset+4],buf[offset+5],buf[offset+6],buf[offset+7]])
}

#[test]
fn fields_round_trip_at_offsets() {
    let mut buf = [0u8;16];
    put_u16(&mut buf,1,0x1234);
    put_u32(&mut buf,3,0xdeadbeef);
    put_u64(&mut buf,7,0x0102030405060708);
    assert_eq!(get_u16(&buf,1),0x1234);
    assert_eq!(get_u32(&buf,3),0xdeadbeef);
    assert_eq!(get_u64(&buf,7),0x0102030405060708);
}

#[test]
fn layout_is_little_endian() {
    let mut buf = [0u8;4];
    put_u32(&mut buf,0,0x11223344);
    assert_eq!(buf,[0x44,0x33,0x22,0x11]);
}
