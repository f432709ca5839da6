//! Fixed-width bit-vector encode/decode for small integers, per spec §4.6.
//! Round-trip identity is the only contract; the `byte_width` is fixed at
//! construction (derived from `q`, the value bit-width, in `BloomierFilter`).

#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    byte_width: usize,
}

impl Encoder {
    pub fn new(byte_width: usize) -> Self {
        Self { byte_width }
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    /// Encodes `x` little-endian into `byte_width` bytes.
    pub fn encode(&self, x: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; self.byte_width];
        let le = x.to_le_bytes();
        let n = self.byte_width.min(le.len());
        bytes[..n].copy_from_slice(&le[..n]);
        bytes
    }

    /// Decodes a little-endian bit-vector back to an integer.
    pub fn decode(&self, bits: &[u8]) -> usize {
        let mut buf = [0u8; std::mem::size_of::<usize>()];
        let n = bits.len().min(buf.len());
        buf[..n].copy_from_slice(&bits[..n]);
        usize::from_le_bytes(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_values_in_range() {
        let enc = Encoder::new(1); // q = 8 bits
        for x in 0..=255usize {
            assert_eq!(enc.decode(&enc.encode(x)), x);
        }
    }

    #[test]
    fn wider_encoding_round_trips() {
        let enc = Encoder::new(2); // q = 16 bits
        for x in [0usize, 1, 255, 256, 65535] {
            assert_eq!(enc.decode(&enc.encode(x)), x);
        }
    }
}
