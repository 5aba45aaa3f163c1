use async_trait::async_trait;
use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::{
    net::{lookup_host, UdpSocket},
    time::timeout,
};
use tracing::debug;

use crate::{
    error::SyncError,
    net::ntp::{decode_reply, encode_request, validate, NTP_PACKET_LEN, NTP_PORT},
    time::calc::TimeSample,
};

/// Something that can tell us the network time.
#[async_trait]
pub trait TimeSource: Send + Sync {
    async fn query_time(
        &self,
        hostname: &str,
        timeout: Duration,
        tz_offset_seconds: i32,
    ) -> Result<TimeSample, SyncError>;
}

#[async_trait]
impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    async fn query_time(
        &self,
        hostname: &str,
        timeout: Duration,
        tz_offset_seconds: i32,
    ) -> Result<TimeSample, SyncError> {
        (**self)
            .query_time(hostname, timeout, tz_offset_seconds)
            .await
    }
}

/// Single-exchange SNTP-style client. Never retries; callers decide.
#[derive(Clone, Debug)]
pub struct NtpClient {
    port: u16,
}

impl Default for NtpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NtpClient {
    pub fn new() -> Self {
        NtpClient { port: NTP_PORT }
    }

    /// Talks to a non-standard port; only useful against local test servers.
    pub fn with_port(port: u16) -> Self {
        NtpClient { port }
    }

    async fn resolve(&self, hostname: &str) -> Result<SocketAddr, SyncError> {
        let resolution = |source| SyncError::Resolution {
            host: hostname.to_string(),
            source,
        };
        let addrs = lookup_host((hostname, self.port)).await.map_err(resolution)?;
        let mut v4 = addrs.filter(SocketAddr::is_ipv4);
        v4.next().ok_or_else(|| {
            resolution(io::Error::new(
                io::ErrorKind::NotFound,
                "no IPv4 address for host",
            ))
        })
    }

    async fn exchange(
        &self,
        addr: SocketAddr,
        wait: Duration,
    ) -> Result<[u8; NTP_PACKET_LEN], SyncError> {
        // dropped (and closed) on every return path
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect(addr).await?;

        let request = encode_request();
        let sent = socket.send(&request).await?;
        if sent != request.len() {
            return Err(SyncError::Socket(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {sent} of {} bytes", request.len()),
            )));
        }

        // one spare byte so oversized replies show up as malformed
        let mut resp = [0u8; NTP_PACKET_LEN + 1];
        let len = timeout(wait, socket.recv(&mut resp))
            .await
            .map_err(|_| SyncError::Timeout {
                after_ms: wait.as_millis() as u64,
            })??;
        if len != NTP_PACKET_LEN {
            return Err(SyncError::MalformedPacket { len });
        }
        let mut reply = [0u8; NTP_PACKET_LEN];
        reply.copy_from_slice(&resp[..NTP_PACKET_LEN]);
        Ok(reply)
    }
}

#[async_trait]
impl TimeSource for NtpClient {
    async fn query_time(
        &self,
        hostname: &str,
        timeout: Duration,
        tz_offset_seconds: i32,
    ) -> Result<TimeSample, SyncError> {
        let addr = self.resolve(hostname).await?;
        debug!("ntp query {} via {}", hostname, addr);

        let raw = self.exchange(addr, timeout).await?;
        let packet = decode_reply(&raw)?;
        validate(&packet)?;

        let sample = TimeSample::from_ntp(packet.transmit, tz_offset_seconds);
        debug!(
            "ntp {} stratum={} transmit={}.{:09}",
            hostname, packet.stratum, sample.seconds, sample.nanoseconds
        );
        Ok(sample)
    }
}
