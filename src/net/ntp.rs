//! Fixed 48-byte NTP packet layout and reply sanity checks.

use crate::error::{InvalidReply, SyncError};

pub const NTP_PACKET_LEN: usize = 48;
pub const NTP_PORT: u16 = 123;

pub const MODE_CLIENT: u8 = 3;
pub const MODE_SERVER: u8 = 4;
pub const REQUEST_VERSION: u8 = 1;

const LI_UNSYNC: u8 = 3;
const MODE_MASK: u8 = 0x07;
const VERSION_MASK: u8 = 0x38;

/// Seconds since 1900-01-01 plus a 32-bit binary fraction of a second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NtpTimestamp {
    pub seconds: u32,
    pub fraction: u32,
}

impl NtpTimestamp {
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.fraction == 0
    }

    fn read(buf: &[u8]) -> Self {
        NtpTimestamp {
            seconds: read_u32(&buf[..4]),
            fraction: read_u32(&buf[4..8]),
        }
    }

    fn write(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.seconds.to_be_bytes());
        buf[4..8].copy_from_slice(&self.fraction.to_be_bytes());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NtpPacket {
    /// LI (bits 6-7), VN (bits 3-5), mode (bits 0-2).
    pub flags: u8,
    pub stratum: u8,
    pub poll: u8,
    pub precision: u8,
    pub root_delay: u32,
    pub root_dispersion: u32,
    pub reference_id: u32,
    pub reference: NtpTimestamp,
    pub originate: NtpTimestamp,
    pub receive: NtpTimestamp,
    pub transmit: NtpTimestamp,
}

impl NtpPacket {
    pub fn leap_indicator(&self) -> u8 {
        self.flags >> 6
    }

    pub fn version(&self) -> u8 {
        (self.flags & VERSION_MASK) >> 3
    }

    pub fn mode(&self) -> u8 {
        self.flags & MODE_MASK
    }

    pub fn encode(&self) -> [u8; NTP_PACKET_LEN] {
        let mut buf = [0u8; NTP_PACKET_LEN];
        buf[0] = self.flags;
        buf[1] = self.stratum;
        buf[2] = self.poll;
        buf[3] = self.precision;
        buf[4..8].copy_from_slice(&self.root_delay.to_be_bytes());
        buf[8..12].copy_from_slice(&self.root_dispersion.to_be_bytes());
        buf[12..16].copy_from_slice(&self.reference_id.to_be_bytes());
        self.reference.write(&mut buf[16..24]);
        self.originate.write(&mut buf[24..32]);
        self.receive.write(&mut buf[32..40]);
        self.transmit.write(&mut buf[40..48]);
        buf
    }
}

/// Client request: everything zero except LI=0, VN=1, mode=3.
pub fn encode_request() -> [u8; NTP_PACKET_LEN] {
    NtpPacket {
        flags: (REQUEST_VERSION << 3) | MODE_CLIENT,
        ..Default::default()
    }
    .encode()
}

pub fn decode_reply(buf: &[u8]) -> Result<NtpPacket, SyncError> {
    if buf.len() != NTP_PACKET_LEN {
        return Err(SyncError::MalformedPacket { len: buf.len() });
    }
    Ok(NtpPacket {
        flags: buf[0],
        stratum: buf[1],
        poll: buf[2],
        precision: buf[3],
        root_delay: read_u32(&buf[4..8]),
        root_dispersion: read_u32(&buf[8..12]),
        reference_id: read_u32(&buf[12..16]),
        reference: NtpTimestamp::read(&buf[16..24]),
        originate: NtpTimestamp::read(&buf[24..32]),
        receive: NtpTimestamp::read(&buf[32..40]),
        transmit: NtpTimestamp::read(&buf[40..48]),
    })
}

/// Any single failing check rejects the whole reply.
pub fn validate(packet: &NtpPacket) -> Result<(), InvalidReply> {
    if packet.leap_indicator() == LI_UNSYNC {
        return Err(InvalidReply::Unsynchronized);
    }
    if packet.mode() != MODE_SERVER {
        return Err(InvalidReply::UnexpectedMode(packet.mode()));
    }
    if packet.stratum == 0 {
        return Err(InvalidReply::ZeroStratum);
    }
    if packet.transmit.is_zero() {
        return Err(InvalidReply::ZeroTransmitTimestamp);
    }
    Ok(())
}

fn read_u32(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}
