//! Best-effort tracking of the ownship position broadcast by the simulator
//! GPS position datagrams arrive on a well-known port; the tracker drains
//! them without ever blocking and must never make the replay stall or fail.
//!

use anyhow::Context;
use socket2::{Domain, Socket, Type};
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::str::FromStr;

// Tag of a GPS position line
const OWNSHIP_TAG: &str = "XGPS";

// Well-known port of the simulator's GPS broadcast
const OWNSHIP_PORT: u16 = 49002;

const RX_BUF_SIZE: usize = 512;


/// Last known position of the user's own aircraft.
/// All values start undefined (NaN) until the first update arrives.
#[derive(Debug, Clone, Copy)]
pub struct OwnshipPosition {
    pub latitude: f64,      // degrees
    pub longitude: f64,     // degrees
    pub altitude: f64,      // m above sea level
    pub track: f64,         // degrees
    pub ground_speed: f64,  // m/s
}

impl Default for OwnshipPosition {
    fn default() -> Self {
        OwnshipPosition {
            latitude: f64::NAN,
            longitude: f64::NAN,
            altitude: f64::NAN,
            track: f64::NAN,
            ground_speed: f64::NAN,
        }
    }
}


/// Listener for the GPS broadcast, sole writer of the position record
pub struct OwnshipTracker {
    socket: UdpSocket,
    position: OwnshipPosition,
}

impl OwnshipTracker {
    pub fn new() -> anyhow::Result<Self> {
        Self::bound_to(OWNSHIP_PORT)
    }

    fn bound_to(port: u16) -> anyhow::Result<Self> {
        // We use the socket2 crate because UdpSocket does not allow setting
        // the reuse options before bind; the simulator side sets them too so
        // several listeners can share the GPS port
        let sock = Socket::new(Domain::IPV4, Type::DGRAM, None)
            .context("Failed to create the GPS listen socket")?;
        sock.set_reuse_address(true).context("Failed to set SO_REUSEADDR on the GPS socket")?;
        sock.set_reuse_port(true).context("Failed to set SO_REUSEPORT on the GPS socket")?;
        sock.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into())
            .with_context(|| format!("Failed to listen for the GPS broadcast on port {port}"))?;

        // Now we can convert to UdpSocket
        let socket: UdpSocket = sock.into();

        // The per-record poll must never suspend the replay
        socket.set_nonblocking(true).context("Failed to set the GPS socket to non-blocking")?;

        Ok(OwnshipTracker {
            socket,
            position: OwnshipPosition::default(),
        })
    }

    /// Drains the datagrams currently available and applies the position
    /// updates they carry, later datagrams win. Never blocks; reception
    /// errors are swallowed. Returns true when the position was updated.
    pub fn poll(&mut self) -> bool {
        let mut updated = false;
        let mut buf = [0u8; RX_BUF_SIZE];
        loop {
            let len = match self.socket.recv_from(&mut buf) {
                Ok((len, _)) => len,
                Err(_) => return updated,   // nothing left, or an error the replay must not inherit
            };
            if let Ok(payload) = std::str::from_utf8(&buf[..len]) {
                for line in payload.lines() {
                    updated |= self.apply_line(line.trim());
                }
            }
        }
    }

    /// Read access to the last known position; the tracker is the only writer
    pub fn position(&self) -> &OwnshipPosition {
        &self.position
    }

    /// Applies one GPS line. The fields behind the tag are scanned for
    /// numbers: the first two are latitude and longitude, then altitude,
    /// track and ground speed. Fields missing from a line keep their
    /// previous value.
    fn apply_line(&mut self, line: &str) -> bool {
        if !line.starts_with(OWNSHIP_TAG) {
            return false;
        }

        // The tag field is skipped entirely: some senders append their name
        // to it, which also makes it non-numeric
        let values: Vec<f64> = line
            .split(',')
            .skip(1)
            .filter_map(|field| f64::from_str(field.trim()).ok())
            .collect();
        if values.len() < 2 {
            return false;   // no usable position in this line
        }

        self.position.latitude = values[0];
        self.position.longitude = values[1];
        if let Some(&altitude) = values.get(2) {
            self.position.altitude = altitude;
        }
        if let Some(&track) = values.get(3) {
            self.position.track = track;
        }
        if let Some(&ground_speed) = values.get(4) {
            self.position.ground_speed = ground_speed;
        }

        true
    }
}
