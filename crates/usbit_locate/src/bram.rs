//! The 18-Kib BRAM memory-content and parity storage value type.
//!
//! Same MSb-left human string / LSb-first internal storage convention as
//! [`crate::lut::Lut`]: `INIT_XX`/`INITP_XX` fragments are reassembled into
//! a single MSb-left hex string (keys sorted by hex suffix ascending, then
//! reversed so the highest-numbered fragment is leftmost), which is then
//! reversed once into LSb-first bit storage so index `i` always means
//! "overall bit weight `2^i`", matching [`crate::lut::Lut::get_bit`].

/// Number of bits in an 18-Kib BRAM's memory content.
pub const BRAM_MEM_BITS: usize = 16384;
/// Number of bits in an 18-Kib BRAM's parity content.
pub const BRAM_PARITY_BITS: usize = 2048;

/// Width, in bits, of one `INIT_XX`/`INITP_XX` fragment.
const FRAGMENT_BITS: usize = 256;

/// An 18-Kib BRAM's memory-content and parity storage, stored LSb-first.
#[derive(Debug, Clone)]
pub struct Bram {
    mem: Vec<bool>,
    parity: Vec<bool>,
}

/// Reassembles an `{INIT_XX: "0x..."}`-shaped map into a single MSb-left
/// hex string: keys sorted by hex suffix ascending, then reversed so the
/// highest-numbered fragment is leftmost, each fragment zero-padded to
/// `FRAGMENT_BITS / 4` hex digits.
fn concat_init_fragments<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> Option<String> {
    let mut fragments: Vec<(u32, &str)> = entries
        .filter_map(|(key, value)| {
            let suffix = key.rsplit('_').next()?;
            let idx = u32::from_str_radix(suffix, 16).ok()?;
            Some((idx, value))
        })
        .collect();
    fragments.sort_by_key(|(idx, _)| *idx);
    fragments.reverse();

    let mut hex = String::with_capacity(fragments.len() * FRAGMENT_BITS / 4);
    for (_, value) in fragments {
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);
        if digits.len() > FRAGMENT_BITS / 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        hex.push_str(&format!("{digits:0>width$}", width = FRAGMENT_BITS / 4));
    }
    Some(hex)
}

/// Parses an MSb-left hex string into LSb-first bits: the rightmost hex
/// digit becomes the lowest 4 bit indices. The inverse of [`bits_to_hex`].
fn hex_str_to_lsb_bits(hex: &str) -> Option<Vec<bool>> {
    let mut bits = Vec::with_capacity(hex.len() * 4);
    for c in hex.chars().rev() {
        let nibble = c.to_digit(16)?;
        for shift in 0..4 {
            bits.push((nibble >> shift) & 1 == 1);
        }
    }
    Some(bits)
}

/// Renders LSb-first bits as an MSb-left hex string: the highest index
/// becomes the leftmost hex digit. The inverse of [`hex_str_to_lsb_bits`].
fn bits_to_hex(bits: &[bool]) -> String {
    let mut out = String::with_capacity(bits.len() / 4);
    for chunk_start in (0..bits.len()).step_by(4).rev() {
        let mut nibble = 0u8;
        for j in 0..4 {
            if bits[chunk_start + j] {
                nibble |= 1 << j;
            }
        }
        out.push(std::char::from_digit(nibble as u32, 16).unwrap());
    }
    out
}

impl Bram {
    /// An all-zero BRAM.
    pub fn zero() -> Self {
        Bram {
            mem: vec![false; BRAM_MEM_BITS],
            parity: vec![false; BRAM_PARITY_BITS],
        }
    }

    /// Builds a `Bram`'s memory content from an `{INIT_XX: "0x..."}` map.
    ///
    /// Returns `None` if the reconstructed bit count does not equal
    /// [`BRAM_MEM_BITS`].
    pub fn mem_from_init_fragments<'a>(
        entries: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Option<Vec<bool>> {
        let hex = concat_init_fragments(entries)?;
        let bits = hex_str_to_lsb_bits(&hex)?;
        (bits.len() == BRAM_MEM_BITS).then_some(bits)
    }

    /// Builds a `Bram`'s parity content from an `{INITP_XX: "0x..."}` map.
    ///
    /// Returns `None` if the reconstructed bit count does not equal
    /// [`BRAM_PARITY_BITS`].
    pub fn parity_from_init_fragments<'a>(
        entries: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Option<Vec<bool>> {
        let hex = concat_init_fragments(entries)?;
        let bits = hex_str_to_lsb_bits(&hex)?;
        (bits.len() == BRAM_PARITY_BITS).then_some(bits)
    }

    /// Builds a `Bram` from already-expanded memory and parity bit vectors.
    pub fn from_bits(mem: Vec<bool>, parity: Vec<bool>) -> Option<Self> {
        if mem.len() != BRAM_MEM_BITS || parity.len() != BRAM_PARITY_BITS {
            return None;
        }
        Some(Bram { mem, parity })
    }

    /// Reads memory bit `i`.
    pub fn get_mem_bit(&self, i: usize) -> bool {
        self.mem[i]
    }

    /// Sets memory bit `i`.
    pub fn set_mem_bit(&mut self, i: usize, value: bool) {
        self.mem[i] = value;
    }

    /// Reads parity bit `i`.
    pub fn get_parity_bit(&self, i: usize) -> bool {
        self.parity[i]
    }

    /// Sets parity bit `i`.
    pub fn set_parity_bit(&mut self, i: usize, value: bool) {
        self.parity[i] = value;
    }

    /// The MSb-left hex memory-content string.
    pub fn mem_to_hex(&self) -> String {
        bits_to_hex(&self.mem)
    }

    /// The MSb-left hex parity string.
    pub fn parity_to_hex(&self) -> String {
        bits_to_hex(&self.parity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_fragments_highest_suffix_first() {
        let entries = [("INIT_00", "0x1"), ("INIT_01", "0x2")];
        let hex = concat_init_fragments(entries.into_iter()).unwrap();
        assert_eq!(hex.len(), 128);
        assert!(hex.starts_with(&"0".repeat(63)));
        assert_eq!(&hex[63..64], "2"); // INIT_01 (higher suffix) is leftmost.
        assert_eq!(&hex[124..], "0001"); // INIT_00 is rightmost.
    }

    #[test]
    fn hex_bit_round_trip() {
        let hex = format!("{}1", "0".repeat(4095));
        assert_eq!(hex.len(), 4096);
        let bits = hex_str_to_lsb_bits(&hex).unwrap();
        assert_eq!(bits_to_hex(&bits), hex);
        assert!(bits[0]);
        assert!(!bits[1]);
    }

    #[test]
    fn zero_bram_hex_is_all_zero() {
        let bram = Bram::zero();
        assert_eq!(bram.mem_to_hex().len(), BRAM_MEM_BITS / 4);
        assert!(bram.mem_to_hex().chars().all(|c| c == '0'));
        assert_eq!(bram.parity_to_hex().len(), BRAM_PARITY_BITS / 4);
    }

    #[test]
    fn set_and_get_bits() {
        let mut bram = Bram::zero();
        bram.set_mem_bit(100, true);
        assert!(bram.get_mem_bit(100));
        assert!(!bram.get_mem_bit(101));
        bram.set_parity_bit(5, true);
        assert!(bram.get_parity_bit(5));
    }

    #[test]
    fn mem_from_init_fragments_builds_full_content() {
        let mut keys_values: Vec<(String, String)> =
            (0..64).map(|i| (format!("INIT_{i:02X}"), "0x0".to_string())).collect();
        keys_values[0].1 = format!("0x{}", "1".repeat(64));
        let entries: Vec<(&str, &str)> =
            keys_values.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let bits = Bram::mem_from_init_fragments(entries.into_iter()).unwrap();
        assert_eq!(bits.len(), BRAM_MEM_BITS);
    }
}
