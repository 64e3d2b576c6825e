//! Power-on RAM contents.

/// Fill RAM with the DRAM power-on pattern: alternating 64-byte runs of
/// $00 and $FF.
pub fn ram_init(ram: &mut [u8]) {
    for (i, byte) in ram.iter_mut().enumerate() {
        *byte = if i & 0x40 == 0 { 0x00 } else { 0xFF };
    }
}
