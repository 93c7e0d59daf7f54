use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::adapters::metrics::{Gauge, MetricsError, MetricsSink};
use crate::domain::session_state::EpochSeconds;

/// DogStatsD sink: all gauges of one submission go out as a single datagram.
#[derive(Debug, Clone)]
pub struct StatsdUdpSink {
    target: SocketAddr,
}

impl StatsdUdpSink {
    pub fn new(address: &str) -> Result<Self, MetricsError> {
        let mut addrs = address.to_socket_addrs().map_err(MetricsError::Resolve)?;
        let target = addrs.next().ok_or_else(|| {
            MetricsError::Resolve(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no socket address resolved for statsd endpoint",
            ))
        })?;

        Ok(Self { target })
    }
}

impl MetricsSink for StatsdUdpSink {
    fn submit(&self, gauges: &[Gauge], _timestamp: EpochSeconds) -> Result<(), MetricsError> {
        if gauges.is_empty() {
            return Ok(());
        }

        let payload = encode_gauges(gauges);
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.send_to(payload.as_bytes(), self.target)?;
        Ok(())
    }
}

fn encode_gauges(gauges: &[Gauge]) -> String {
    gauges
        .iter()
        .map(|gauge| format!("{}:{}|g", gauge.name, gauge.value))
        .collect::<Vec<_>>()
        .join("\n")
}
