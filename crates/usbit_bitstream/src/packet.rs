//! Type-1 / type-2 configuration packet headers and payloads.

/// Which of the two packet header encodings a word introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderType {
    /// Type-1: 14-bit register address, 11-bit word count.
    Type1,
    /// Type-2: inherits its register from the last type-1 packet, 27-bit
    /// word count.
    Type2,
}

/// The operation a packet requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// No operation; filtered out of the decoded packet list.
    Noop,
    /// Register read.
    Read,
    /// Register write.
    Write,
    /// Reserved encoding.
    Reserved,
}

impl Opcode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Opcode::Noop,
            1 => Opcode::Read,
            2 => Opcode::Write,
            _ => Opcode::Reserved,
        }
    }
}

/// A 14-bit configuration register address. UG570 table 9-19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Cyclic redundancy check.
    Crc,
    /// Frame Address Register.
    Far,
    /// Frame Data Register, Input (configuration writes).
    Fdri,
    /// Frame Data Register, Output (configuration reads).
    Fdro,
    /// Command register.
    Cmd,
    /// Control register 0.
    Ctl0,
    /// Masking register for CTL0 and CTL1.
    Mask,
    /// Status register.
    Stat,
    /// BSPI link output status.
    Lout,
    /// Configuration option register 0.
    Cor0,
    /// Multi-frame write register.
    Mfwr,
    /// CRC of the last packet under CBC mode.
    Cbc,
    /// Device identification code.
    Idcode,
    /// AXSS user access register.
    Axss,
    /// Configuration option register 1.
    Cor1,
    /// Unassigned register 15.
    ReservedRegister15,
    /// Warm boot start address register.
    Wbstar,
    /// Watchdog timer register.
    Timer,
    /// Unassigned register 18.
    ReservedRegister18,
    /// Unassigned register 19.
    ReservedRegister19,
    /// Unassigned register 20.
    ReservedRegister20,
    /// Unassigned register 21.
    ReservedRegister21,
    /// Boot history status register.
    Bootsts,
    /// Unassigned register 23.
    ReservedRegister23,
    /// Control register 1.
    Ctl1,
    /// Unassigned register 25.
    ReservedRegister25,
    /// Unassigned register 26.
    ReservedRegister26,
    /// Unassigned register 27.
    ReservedRegister27,
    /// Unassigned register 28.
    ReservedRegister28,
    /// Unassigned register 29.
    ReservedRegister29,
    /// Unassigned register 30: the "sinkhole" used as an end-of-SLR marker.
    Rsvd30,
    /// Catch-all for any 14-bit code not enumerated above.
    Other(u16),
}

impl Register {
    const MASK: u32 = 0x3FFF;

    fn from_bits(bits: u32) -> Self {
        match bits & Self::MASK {
            0 => Register::Crc,
            1 => Register::Far,
            2 => Register::Fdri,
            3 => Register::Fdro,
            4 => Register::Cmd,
            5 => Register::Ctl0,
            6 => Register::Mask,
            7 => Register::Stat,
            8 => Register::Lout,
            9 => Register::Cor0,
            10 => Register::Mfwr,
            11 => Register::Cbc,
            12 => Register::Idcode,
            13 => Register::Axss,
            14 => Register::Cor1,
            15 => Register::ReservedRegister15,
            16 => Register::Wbstar,
            17 => Register::Timer,
            18 => Register::ReservedRegister18,
            19 => Register::ReservedRegister19,
            20 => Register::ReservedRegister20,
            21 => Register::ReservedRegister21,
            22 => Register::Bootsts,
            23 => Register::ReservedRegister23,
            24 => Register::Ctl1,
            25 => Register::ReservedRegister25,
            26 => Register::ReservedRegister26,
            27 => Register::ReservedRegister27,
            28 => Register::ReservedRegister28,
            29 => Register::ReservedRegister29,
            30 => Register::Rsvd30,
            other => Register::Other(other as u16),
        }
    }
}

/// The `CMD` register value that ends a configuration section.
pub const CMD_DESYNC: u32 = 0x0000000D;

/// A decoded type-1 or type-2 configuration packet.
///
/// `payload` borrows directly from the underlying bitstream buffer: each
/// `u32` is one big-endian configuration word. Invariant: `payload.len()`
/// equals `word_count`, except a sinkhole `TYPE2` write (register
/// [`Register::Rsvd30`], opcode [`Opcode::Write`]), whose payload is always
/// empty regardless of the word count its header claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    /// Which header encoding introduced this packet.
    pub header_type: HeaderType,
    /// The requested operation.
    pub opcode: Opcode,
    /// The target register (inherited from the last type-1 packet for a
    /// type-2 packet).
    pub register: Register,
    /// The 2-bit reserved field of a type-1 header, if this was one.
    pub reserved: Option<u16>,
    /// The word count as carried in the packet header (may exceed
    /// `payload.len()` for a sinkhole write).
    pub word_count: u32,
    /// The payload words, big-endian, borrowed from the bitstream buffer.
    pub payload: &'a [u8],
    /// Absolute byte offset at which this packet's header word began.
    pub offset: usize,
}

impl<'a> Packet<'a> {
    /// Iterates over the payload as big-endian 32-bit words.
    pub fn words(&self) -> impl Iterator<Item = u32> + 'a {
        self.payload
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// The single payload word, if this packet carries exactly one.
    pub fn single_word(&self) -> Option<u32> {
        if self.payload.len() == 4 {
            self.words().next()
        } else {
            None
        }
    }

    pub(crate) fn opcode_from_bits(bits: u32) -> Opcode {
        Opcode::from_bits(bits)
    }

    pub(crate) fn register_from_bits(bits: u32) -> Register {
        Register::from_bits(bits)
    }
}
