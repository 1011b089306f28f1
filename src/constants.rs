//! ASTM E1381 control bytes and E1394-97 field/record separators.
//!
//! Values match the ASTM specification exactly; see `spec.md` §6.

/// Start of Text. Marks the beginning of a framed message.
pub const STX: u8 = 0x02;
/// End of Text. Terminates the final chunk of a message.
pub const ETX: u8 = 0x03;
/// End of Transmission. Closes a session.
pub const EOT: u8 = 0x04;
/// Enquiry. Opens a session.
pub const ENQ: u8 = 0x05;
/// Acknowledgment.
pub const ACK: u8 = 0x06;
/// Negative Acknowledgment.
pub const NAK: u8 = 0x15;
/// End of Transmission Block. Terminates a non-final chunk.
pub const ETB: u8 = 0x17;
/// Carriage Return.
pub const CR: u8 = 0x0D;
/// Line Feed.
pub const LF: u8 = 0x0A;

/// Default base encoding for ASTM text, per the ASTM specification.
pub const DEFAULT_ENCODING: &str = "latin-1";

/// Default separators, used unless a session negotiates otherwise via the
/// header record's delimiter-definition field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separators {
    pub field: u8,
    pub repeat: u8,
    pub component: u8,
    pub escape: u8,
    /// The record separator is fixed by the protocol and not configurable
    /// per session, but kept here so callers have one place to look.
    pub record: u8,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            field: b'|',
            repeat: b'\\',
            component: b'^',
            escape: b'&',
            record: CR,
        }
    }
}

/// Record type code for the Header record.
pub const HEADER_RECORD: u8 = b'H';
/// Record type code for the Patient record.
pub const PATIENT_RECORD: u8 = b'P';
/// Record type code for the Order record.
pub const ORDER_RECORD: u8 = b'O';
/// Record type code for the Result record.
pub const RESULT_RECORD: u8 = b'R';
/// Record type code for the Comment record.
pub const COMMENT_RECORD: u8 = b'C';
/// Record type code for the Scientific record.
pub const SCIENTIFIC_RECORD: u8 = b'S';
/// Record type code for the Manufacturer Information record.
pub const MANUFACTURER_RECORD: u8 = b'M';
/// Record type code for the Terminator record.
pub const TERMINATOR_RECORD: u8 = b'L';

/// Minimum byte length of a chunk, covering STX, the seq digit, the
/// terminator byte (ETB, or CR+ETX on the final chunk), the two-byte
/// checksum and the trailing CRLF.
pub const MIN_CHUNK_SIZE: usize = 7;
