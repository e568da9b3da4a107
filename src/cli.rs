//! Command line surface of the replay sender

use clap::Parser;
use std::path::PathBuf;


/// Sends recorded air traffic data out on UDP ports, so that a
/// RealTraffic-compatible consumer can receive canned traffic and weather
/// data at the original pace.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Opts {
    /// Tracking data file: CSV records holding traffic data in the AITFC or
    /// RTTFC dialect plus weather data. Standard input when omitted.
    pub in_file: Option<PathBuf>,

    /// List of aircraft to send, others are skipped. One or several
    /// transponder hex codes, separated by commas.
    #[arg(short = 'a', long, value_name = "HEX_LIST")]
    pub aircraft: Option<String>,

    /// Same as -a, but with decimal values (as used in the CSV file)
    #[arg(short = 'd', long, value_name = "NUM_LIST")]
    pub aircraft_decimal: Option<String>,

    /// Buffering period: seconds the first record is pushed into the past so
    /// that the consumer's own buffer fills more quickly
    #[arg(short = 'b', long, value_name = "SECS", default_value_t = 0.0)]
    pub buf_period: f64,

    /// Seconds subtracted from every sent timestamp, marking the data as
    /// older than its actual send time
    #[arg(long, value_name = "SECS", default_value_t = 0.0)]
    pub historic: f64,

    /// Restart from the beginning of the file upon reaching its end
    #[arg(short = 'l', long = "loop", requires = "in_file")]
    pub loop_input: bool,

    /// UDP target host or ip to send the data to
    #[arg(long, value_name = "NAME_OR_IP", default_value = "localhost")]
    pub host: String,

    /// UDP port to send traffic data to
    #[arg(long, value_name = "NUM", default_value_t = 49003)]
    pub port: u16,

    /// UDP port to send weather data to
    #[arg(long, value_name = "NUM", default_value_t = 49004)]
    pub weather_port: u16,

    /// Track the ownship position from the simulator's GPS broadcast
    /// (listens on UDP port 49002)
    #[arg(long)]
    pub ownship: bool,

    /// Log every received ownship position
    #[arg(long, requires = "ownship")]
    pub print_ownship: bool,

    /// Verbose output: informs of each sent record
    #[arg(short = 'v', long)]
    pub verbose: bool,
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Opts::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_wire_conventions() {
        let opts = Opts::try_parse_from(["sendtraffic"]).unwrap();
        assert_eq!(None, opts.in_file);
        assert_eq!(0.0, opts.buf_period);
        assert_eq!(0.0, opts.historic);
        assert_eq!("localhost", opts.host);
        assert_eq!(49003, opts.port);
        assert_eq!(49004, opts.weather_port);
        assert!(!opts.loop_input);
        assert!(!opts.ownship);
    }

    #[test]
    fn looping_requires_a_file() {
        assert!(Opts::try_parse_from(["sendtraffic", "--loop"]).is_err());
        assert!(Opts::try_parse_from(["sendtraffic", "--loop", "data.csv"]).is_ok());
    }

    #[test]
    fn printing_the_ownship_requires_tracking_it() {
        assert!(Opts::try_parse_from(["sendtraffic", "--print-ownship"]).is_err());
        assert!(Opts::try_parse_from(["sendtraffic", "--ownship", "--print-ownship"]).is_ok());
    }
}
