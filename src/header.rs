//! The 12-byte DNS message header, packed bit-exact per
//! [RFC 1035 §4.1.1](https://www.rfc-editor.org/rfc/rfc1035#section-4.1.1).
//!
//! Bit layout and the `packed_struct` usage mirror the teacher's own
//! `Header`/`OpCode`/`Rcode`/`PacketType` types.

use packed_struct::prelude::*;

/// QR bit: whether a message is a question or an answer.
#[derive(Debug, PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Query = 0,
    Answer = 1,
}

impl From<bool> for PacketType {
    fn from(input: bool) -> Self {
        match input {
            false => Self::Query,
            true => Self::Answer,
        }
    }
}

/// The 4-bit OPCODE field. mDNS traffic is always `Query`; the other
/// values are decoded faithfully but otherwise unused by this engine.
#[derive(Debug, PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Query = 0,
    Status = 2,
    Reserved = 15,
}

impl From<u8> for OpCode {
    fn from(input: u8) -> Self {
        match input {
            0 => Self::Query,
            2 => Self::Status,
            _ => Self::Reserved,
        }
    }
}

/// The 4-bit RCODE field.
#[derive(Debug, PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError = 0,
    FormatError = 1,
    ServFail = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
}

/// The fixed 12-byte DNS header.
#[derive(Debug, PackedStruct, PartialEq, Eq, Clone, Copy)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct Header {
    #[packed_field(bits = "0..=15", endian = "msb")]
    pub id: u16,
    #[packed_field(bits = "16", ty = "enum")]
    pub qr: PacketType,
    #[packed_field(bits = "17..=20", ty = "enum")]
    pub opcode: OpCode,
    #[packed_field(bits = "21")]
    pub aa: bool,
    #[packed_field(bits = "22")]
    pub tc: bool,
    #[packed_field(bits = "23")]
    pub rd: bool,
    #[packed_field(bits = "24")]
    pub ra: bool,
    /// Reserved, must be zero on the wire; this engine never sets it.
    #[packed_field(bits = "25")]
    pub z: bool,
    #[packed_field(bits = "26")]
    pub ad: bool,
    #[packed_field(bits = "27")]
    pub cd: bool,
    #[packed_field(bits = "28..=31", ty = "enum")]
    pub rcode: Rcode,
    #[packed_field(bits = "32..=47", endian = "msb")]
    pub qdcount: u16,
    #[packed_field(bits = "48..=63", endian = "msb")]
    pub ancount: u16,
    #[packed_field(bits = "64..=79", endian = "msb")]
    pub nscount: u16,
    #[packed_field(bits = "80..=95", endian = "msb")]
    pub arcount: u16,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            id: 0,
            qr: PacketType::Query,
            opcode: OpCode::Query,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            z: false,
            ad: false,
            cd: false,
            rcode: Rcode::NoError,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }
}

impl Header {
    pub fn as_answer(mut self) -> Header {
        self.qr = PacketType::Answer;
        self.aa = true;
        self
    }
}
