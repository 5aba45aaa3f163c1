//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use clocksync::{
    net::ntp::{NtpPacket, NtpTimestamp, MODE_SERVER, NTP_PACKET_LEN},
    ClockAuthority, ClockError, ClockSource, Notifier, SyncError, TickRate, Ticks, TimeSample,
    TimeSource,
};
use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tokio::{net::UdpSocket, task::JoinHandle};

pub const NS: TickRate = TickRate::NANOSECOND;

pub enum Reply {
    Sample(TimeSample),
    ResolutionFails,
    TimesOut,
}

pub struct FakeSource {
    reply: Reply,
    pub calls: AtomicUsize,
    pub last_offset: Mutex<Option<i32>>,
}

impl FakeSource {
    pub fn new(reply: Reply) -> Self {
        FakeSource {
            reply,
            calls: AtomicUsize::new(0),
            last_offset: Mutex::new(None),
        }
    }

    pub fn sample(seconds: i64, nanoseconds: u32) -> Self {
        Self::new(Reply::Sample(TimeSample {
            seconds,
            nanoseconds,
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimeSource for FakeSource {
    async fn query_time(
        &self,
        hostname: &str,
        timeout: Duration,
        tz_offset_seconds: i32,
    ) -> Result<TimeSample, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_offset.lock().unwrap() = Some(tz_offset_seconds);
        match &self.reply {
            Reply::Sample(sample) => Ok(*sample),
            Reply::ResolutionFails => Err(SyncError::Resolution {
                host: hostname.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such host"),
            }),
            Reply::TimesOut => Err(SyncError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

/// Device clock frozen at `now`, recording every change request.
pub struct FakeClock {
    now: Ticks,
    fail_with: Option<ClockError>,
    pub begins: AtomicUsize,
    pub ends: AtomicUsize,
    pub sets: Mutex<Vec<Ticks>>,
}

impl FakeClock {
    pub fn at_seconds(seconds: i64) -> Self {
        FakeClock {
            now: NS.seconds_to_ticks(seconds),
            fail_with: None,
            begins: AtomicUsize::new(0),
            ends: AtomicUsize::new(0),
            sets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, err: ClockError) -> Self {
        self.fail_with = Some(err);
        self
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> Vec<Ticks> {
        self.sets.lock().unwrap().clone()
    }
}

impl ClockSource for FakeClock {
    fn tick_rate(&self) -> TickRate {
        NS
    }

    fn now(&self) -> Ticks {
        self.now
    }
}

impl ClockAuthority for FakeClock {
    fn begin_time_change(&self) {
        self.begins.fetch_add(1, Ordering::SeqCst);
    }

    fn set_absolute_system_time(&self, time: Ticks) -> Result<(), ClockError> {
        self.sets.lock().unwrap().push(time);
        match self.fail_with {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn end_time_change(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub fn server_reply(transmit_seconds: u32, transmit_fraction: u32) -> NtpPacket {
    NtpPacket {
        flags: (4 << 3) | MODE_SERVER,
        stratum: 1,
        reference_id: u32::from_be_bytes(*b"GPS\0"),
        transmit: NtpTimestamp {
            seconds: transmit_seconds,
            fraction: transmit_fraction,
        },
        ..Default::default()
    }
}

/// Loopback UDP server that answers the first datagram with `reply`
/// (or stays silent) and hands back the request it saw.
pub async fn spawn_server(reply: Option<Vec<u8>>) -> (u16, JoinHandle<Vec<u8>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
        if let Some(reply) = reply {
            socket.send_to(&reply, peer).await.unwrap();
        } else {
            // keep the socket open past the client's timeout
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        buf[..len].to_vec()
    });
    (port, handle)
}

/// 32-bit wire seconds for an instant `since_2000` seconds after 2000-01-01.
pub fn wire_seconds(since_2000: u64) -> u32 {
    ((3_155_673_600u64 + since_2000) % (1 << 32)) as u32
}

pub fn reply_bytes(packet: &NtpPacket) -> Vec<u8> {
    let bytes: [u8; NTP_PACKET_LEN] = packet.encode();
    bytes.to_vec()
}
