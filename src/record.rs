//! Classification and parsing of RealTraffic CSV records
//! A traffic record starts with one of the recognized tags and carries at
//! least 15 comma-separated fields; everything else is weather data and is
//! forwarded untouched.
//!

use anyhow::Context;
use std::str::FromStr;

// Recognized traffic tags
const TRAFFIC_TAG_AITFC: &str = "AITFC";
const TRAFFIC_TAG_RTTFC: &str = "RTTFC";

// Position of the fields interpreted by the replay engine
const FIELD_POS_HEXID: usize = 1;           // transponder code, decimal notation
const FIELD_POS_TIMESTAMP: usize = 14;      // seconds since epoch, fractional allowed

// Minimum number of fields, up to and including the timestamp.
// RTTFC records carry more, the extra fields pass through untouched.
const NUM_FIELDS_MIN: usize = 15;


/// One classified input line
#[derive(Debug)]
pub enum Record {
    Traffic(TrafficRecord),
    Weather(String),
    /// Recognized traffic tag but too few fields
    Malformed(String),
}

/// Classifies one input line by its leading tag.
/// Unrecognized lines are weather data, not an error.
pub fn classify(line: &str) -> Record {
    if line.starts_with(TRAFFIC_TAG_AITFC) || line.starts_with(TRAFFIC_TAG_RTTFC) {
        match TrafficRecord::parse(line) {
            Some(record) => Record::Traffic(record),
            None => Record::Malformed(line.to_string()),
        }
    }
    else {
        Record::Weather(line.to_string())
    }
}


/// An aircraft position record in the AITFC or RTTFC dialect
#[derive(Debug)]
pub struct TrafficRecord {
    fields: Vec<String>,
}

impl TrafficRecord {
    fn parse(line: &str) -> Option<TrafficRecord> {
        let fields: Vec<String> = line.split(',').map(String::from).collect();
        if fields.len() < NUM_FIELDS_MIN {
            return None;
        }
        Some(TrafficRecord { fields })
    }

    /// Transponder code of the aircraft
    pub fn aircraft_id(&self) -> anyhow::Result<u32> {
        u32::from_str(&self.fields[FIELD_POS_HEXID])
            .with_context(|| format!("Failed to parse aircraft id '{}'", self.fields[FIELD_POS_HEXID]))
    }

    /// Recorded timestamp in seconds since epoch
    pub fn timestamp(&self) -> anyhow::Result<f64> {
        f64::from_str(&self.fields[FIELD_POS_TIMESTAMP])
            .with_context(|| format!("Failed to parse timestamp '{}'", self.fields[FIELD_POS_TIMESTAMP]))
    }

    /// Rewrites the timestamp field, all other fields are left untouched
    pub fn set_timestamp(&mut self, ts: f64) {
        self.fields[FIELD_POS_TIMESTAMP] = format_timestamp(ts);
    }

    /// Joins the fields back into one datagram payload
    pub fn to_line(&self) -> String {
        self.fields.join(",")
    }
}


// Whole seconds are written without a decimal point, like the recordings
// carry them; fractional values keep millisecond precision
fn format_timestamp(ts: f64) -> String {
    if (ts - ts.round()).abs() < 0.0005 {
        format!("{}", ts.round() as i64)
    }
    else {
        format!("{ts:.3}")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const AITFC_LINE: &str = "AITFC,11259375,50.037,8.562,3000,64,1,170,140,DLH123,A320,D-AIMC,FRA,JFK,1590180935";

    #[test]
    fn classify_traffic_line() {
        match classify(AITFC_LINE) {
            Record::Traffic(record) => {
                assert_eq!(15, record.to_line().split(',').count());
                assert_eq!(11_259_375, record.aircraft_id().unwrap());
                assert_eq!(1_590_180_935.0, record.timestamp().unwrap());
            }
            other => panic!("expected a traffic record, got {other:?}"),
        }
    }

    #[test]
    fn classify_rttfc_line_with_extra_fields() {
        let line = "RTTFC,10518308,49.95,7.82,36000,0,0,262,447,DLH456,A359,D-AIXA,FRA,IAD,1590180935,extra,fields,kept";
        match classify(line) {
            Record::Traffic(record) => {
                assert_eq!(line, record.to_line());
            }
            other => panic!("expected a traffic record, got {other:?}"),
        }
    }

    #[rstest]
    #[case("ICAO,EDDF,QNH,1013")]
    #[case("{\"ICAO\": \"EDDF\", \"QNH\": 1013}")]
    #[case("aitfc,1,2,3,4,5,6,7,8,9,10,11,12,13,14")]   // tags are case-sensitive
    fn classify_weather_line(#[case] line: &str) {
        match classify(line) {
            Record::Weather(payload) => assert_eq!(line, payload),
            other => panic!("expected a weather record, got {other:?}"),
        }
    }

    #[test]
    fn classify_short_traffic_line_as_malformed() {
        match classify("AITFC,11259375,50.037,8.562") {
            Record::Malformed(_) => (),
            other => panic!("expected a malformed record, got {other:?}"),
        }
    }

    #[test]
    fn timestamp_rewrite_keeps_other_fields() {
        let mut record = match classify(AITFC_LINE) {
            Record::Traffic(record) => record,
            other => panic!("expected a traffic record, got {other:?}"),
        };
        record.set_timestamp(1_590_181_000.0);

        let before: Vec<&str> = AITFC_LINE.split(',').collect();
        let after = record.to_line();
        let after: Vec<&str> = after.split(',').collect();
        assert_eq!(before.len(), after.len());
        for i in 0..before.len() {
            if i == 14 {
                assert_eq!("1590181000", after[i]);
            }
            else {
                assert_eq!(before[i], after[i]);
            }
        }
    }

    #[test]
    fn unparsable_aircraft_id_is_an_error() {
        match classify("AITFC,not-a-number,50.0,8.5,3000,64,1,170,140,DLH123,A320,D-AIMC,FRA,JFK,1590180935") {
            Record::Traffic(record) => assert!(record.aircraft_id().is_err()),
            other => panic!("expected a traffic record, got {other:?}"),
        }
    }

    #[rstest]
    #[case(1_590_180_935.0, "1590180935")]
    #[case(1_590_180_935.25, "1590180935.250")]
    #[case(1_590_180_935.9996, "1590180936")]
    fn timestamp_formatting(#[case] ts: f64, #[case] expected: &str) {
        assert_eq!(expected, format_timestamp(ts));
    }
}
