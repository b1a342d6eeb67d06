/// Writes `value` little-endian into the first four bytes of `buffer`
pub fn write_u32(buffer: &mut [u8], value: u32) {
    buffer[..4].copy_from_slice(&value.to_le_bytes());
}

pub fn read_u32(buffer: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buffer[..4]);
    u32::from_le_bytes(bytes)
}
