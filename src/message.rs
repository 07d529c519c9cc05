//! The decoded form of a whole DNS message.

use crate::header::{Header, PacketType};
use crate::rdata::{Question, ResourceRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    pub fn is_query(&self) -> bool {
        self.header.qr == PacketType::Query
    }

    pub fn is_answer(&self) -> bool {
        self.header.qr == PacketType::Answer
    }
}
