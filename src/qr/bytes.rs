//! Биты ↔ кодворды и разбор Byte mode для QR v1.

/// Упаковать биты (MSB-first) в байты.
pub(crate) fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let mut out = Vec::with_capacity((bits.len() + 7) / 8);
    let mut cur: u8 = 0;
    let mut k = 0;
    for &b in bits {
        cur = (cur << 1) | u8::from(b);
        k += 1;
        if k == 8 {
            out.push(cur);
            cur = 0;
            k = 0;
        }
    }
    if k > 0 {
        out.push(cur << (8 - k));
    }
    out
}

/// Разобрать Byte mode из исправленных data-кодвордов.
///
/// Формат потока: 4 бита mode (0100), 8 бит длины, затем payload.
/// `capacity` — максимум байт полезной нагрузки для уровня EC.
pub(crate) fn parse_byte_mode(data_cw: &[u8], capacity: usize) -> Option<String> {
    struct Reader<'a> {
        cw: &'a [u8],
        i: usize,
    }
    impl Reader<'_> {
        fn get(&mut self, n: usize) -> Option<u32> {
            let mut v = 0u32;
            for _ in 0..n {
                let byte = *self.cw.get(self.i / 8)?;
                let bit = (byte >> (7 - (self.i % 8))) & 1;
                v = (v << 1) | u32::from(bit);
                self.i += 1;
            }
            Some(v)
        }
    }

    let mut r = Reader { cw: data_cw, i: 0 };
    let mode = r.get(4)?;
    if mode != 0b0100 {
        return None;
    }
    let len = r.get(8)? as usize;
    if len > capacity {
        return None;
    }
    let mut bytes = Vec::with_capacity(len);
    for _ in 0..len {
        bytes.push(r.get(8)? as u8);
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_msb_first() {
        let bits = [true, false, true, false, false, false, false, true, true];
        let out = bits_to_bytes(&bits);
        assert_eq!(out, vec![0b1010_0001, 0b1000_0000]);
    }

    #[test]
    fn parses_byte_mode_stream() {
        // mode=0100, len=2, "Hi"
        let cw = [0x40, 0x24, 0x86, 0x90, 0x00];
        assert_eq!(parse_byte_mode(&cw, 17).as_deref(), Some("Hi"));
    }

    #[test]
    fn rejects_wrong_mode_and_oversized_length() {
        let numeric = [0x10, 0x24, 0x86, 0x90];
        assert!(parse_byte_mode(&numeric, 17).is_none());
        // len=9 при capacity 7
        let long = [0x40, 0x9A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(parse_byte_mode(&long, 7).is_none());
    }
}
