//! Replay of a recorded traffic stream over UDP
//! Each input line produces at most one outbound datagram: traffic records
//! are filtered, paced against the wall clock and sent to the traffic port,
//! everything else goes verbatim to the weather port.
//!

use crate::{
    ac_filter::AcFilter,
    ownship::OwnshipTracker,
    pacing::{self, PassState},
    record::{self, Record, TrafficRecord},
};

use anyhow::Context;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};


/// Line source of the replay, a file or standard input
pub struct Input {
    path: Option<PathBuf>,
    reader: Box<dyn BufRead>,
}

impl Input {
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let reader: Box<dyn BufRead> = match path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open input file {}", path.display()))?;
                Box::new(BufReader::new(file))
            }
            None => Box::new(BufReader::new(std::io::stdin())),
        };
        Ok(Input {
            path: path.map(Path::to_path_buf),
            reader,
        })
    }

    /// Restarts the source from its first line
    fn rewind(&mut self) -> anyhow::Result<()> {
        match &self.path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to reopen input file {}", path.display()))?;
                self.reader = Box::new(BufReader::new(file));
                Ok(())
            }
            None => Err(anyhow::anyhow!("Standard input cannot be rewound")),
        }
    }
}


/// How a replay pass ended
#[derive(Debug, PartialEq)]
enum PassOutcome {
    Completed,
    Cancelled,
}


pub struct Replay {
    socket: UdpSocket,
    traffic_dest: SocketAddr,
    weather_dest: SocketAddr,
    filter: AcFilter,
    historic: f64,
    ownship: Option<OwnshipTracker>,
    print_ownship: bool,
    cancel: Arc<AtomicBool>,

    // run counters, reported in the shutdown summary
    nb_traffic_sent: u64,
    nb_weather_sent: u64,
    nb_malformed: u64,
    nb_filtered: u64,
}

impl Replay {
    pub fn new(
        host: &str,
        traffic_port: u16,
        weather_port: u16,
        filter: AcFilter,
        historic: f64,
        ownship: Option<OwnshipTracker>,
        print_ownship: bool,
        cancel: Arc<AtomicBool>,
    ) -> anyhow::Result<Self> {
        // One sending socket for both destinations, bound to an ephemeral port
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .context("Failed to create the sending socket")?;

        Ok(Replay {
            socket,
            traffic_dest: resolve(host, traffic_port)?,
            weather_dest: resolve(host, weather_port)?,
            filter,
            historic,
            ownship,
            print_ownship,
            cancel,
            nb_traffic_sent: 0,
            nb_weather_sent: 0,
            nb_malformed: 0,
            nb_filtered: 0,
        })
    }

    /// Replays the whole source, restarting from the beginning forever when
    /// looping is enabled. Returns cleanly on cancellation.
    pub fn run(&mut self, input: &mut Input, buf_period: f64, loop_input: bool) -> anyhow::Result<()> {
        let mut pass = PassState::new(buf_period);
        loop {
            if self.run_pass(&mut input.reader, &mut pass)? == PassOutcome::Cancelled {
                return Ok(());
            }
            if !loop_input {
                return Ok(());
            }

            log::debug!("End of input, restarting from the beginning");
            input.rewind()?;
            pass.next_pass();
        }
    }

    /// Replays all lines from the current read position to the end of the
    /// stream. The ownship poll is interleaved before each line so it can
    /// never delay a record.
    fn run_pass<R: BufRead>(&mut self, reader: &mut R, pass: &mut PassState) -> anyhow::Result<PassOutcome> {
        let mut first_of_pass = true;
        let mut line = String::new();

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(PassOutcome::Cancelled);
            }

            if let Some(tracker) = self.ownship.as_mut() {
                if tracker.poll() && self.print_ownship {
                    let pos = tracker.position();
                    log::info!(
                        "Ownship: lat={:.5} lon={:.5} alt={:.0}m trk={:.0} gs={:.1}m/s",
                        pos.latitude, pos.longitude, pos.altitude, pos.track, pos.ground_speed
                    );
                }
            }

            line.clear();
            let nb = reader.read_line(&mut line).context("Failed to read from the input stream")?;
            if nb == 0 {
                return Ok(PassOutcome::Completed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match record::classify(trimmed) {
                Record::Traffic(traffic) => {
                    // on repeated passes the first record was already the
                    // last one seen before the seam, sending it again would
                    // produce a duplicate burst
                    let suppress_seam = first_of_pass && pass.pass_index() > 0;
                    first_of_pass = false;
                    if !self.send_traffic(traffic, pass, suppress_seam)? {
                        return Ok(PassOutcome::Cancelled);
                    }
                }
                Record::Malformed(payload) => {
                    self.nb_malformed += 1;
                    log::warn!(
                        "Skipping traffic record with only {} fields: {payload}",
                        payload.split(',').count()
                    );
                }
                Record::Weather(payload) => self.send_weather(&payload)?,
            }
        }
    }

    /// Filters, paces and emits one traffic record.
    /// Returns false when the pacing wait was interrupted by a cancellation.
    fn send_traffic(&mut self, mut traffic: TrafficRecord, pass: &mut PassState, suppress_seam: bool) -> anyhow::Result<bool> {
        // the id field is only interpreted when a filter is set
        if !self.filter.is_empty() {
            let id = traffic.aircraft_id()?;
            if !self.filter.selects(id) {
                self.nb_filtered += 1;
                log::debug!("Skipping aircraft {id}");
                return Ok(true);
            }
        }

        // wait until the record is due
        let raw_ts = traffic.timestamp()?;
        let target = pass.target_for(raw_ts, pacing::unix_now());
        if !pacing::wait_until(target, &self.cancel) {
            return Ok(false);
        }

        if suppress_seam {
            log::debug!("Suppressing first record at the loop seam");
            return Ok(true);
        }

        // the consumer may be told the data is older than its send time
        traffic.set_timestamp(target - self.historic);

        let datagram = traffic.to_line();
        self.socket
            .send_to(datagram.as_bytes(), self.traffic_dest)
            .with_context(|| format!("Failed to send traffic data to {}", self.traffic_dest))?;
        self.nb_traffic_sent += 1;
        log::debug!("{datagram}");
        Ok(true)
    }

    /// Forwards a weather line untouched
    fn send_weather(&mut self, payload: &str) -> anyhow::Result<()> {
        self.socket
            .send_to(payload.as_bytes(), self.weather_dest)
            .with_context(|| format!("Failed to send weather data to {}", self.weather_dest))?;
        self.nb_weather_sent += 1;
        log::debug!("{payload}");
        Ok(())
    }

    pub fn log_summary(&self) {
        log::info!(
            "{} traffic records sent, {} weather lines forwarded, {} malformed skipped, {} filtered out",
            self.nb_traffic_sent,
            self.nb_weather_sent,
            self.nb_malformed,
            self.nb_filtered
        );
    }
}


fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {host}:{port}"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("No address found for {host}:{port}"))
}
