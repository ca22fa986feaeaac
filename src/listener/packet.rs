use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::ListenerError;
use super::parsing::parse_frequency_mhz;
use crate::tracker::SondeFrame;

const PAYLOAD_SUMMARY: &str = "PAYLOAD_SUMMARY";

/// Every AutoRX UDP packet carries a `type`; only payload summaries are used.
#[derive(Debug, Deserialize)]
struct PacketHeader {
    #[serde(rename = "type")]
    packet_type: String,
}

#[derive(Debug, Deserialize)]
struct PayloadSummary {
    callsign: String,
    frame: u64,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    model: String,
    freq: String,
}

/// Decode one datagram. Packets of other types yield `Ok(None)`.
pub fn decode_datagram(
    bytes: &[u8],
    received_at: DateTime<Utc>,
) -> Result<Option<SondeFrame>, ListenerError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let header = PacketHeader::deserialize(&value)?;
    if header.packet_type != PAYLOAD_SUMMARY {
        return Ok(None);
    }

    let summary = PayloadSummary::deserialize(value)?;
    let frequency_mhz = parse_frequency_mhz(&summary.freq)?;
    let on_globe = (-90.0..=90.0).contains(&summary.latitude)
        && (-180.0..=180.0).contains(&summary.longitude);
    if !on_globe {
        return Err(ListenerError::InvalidPosition {
            latitude: summary.latitude,
            longitude: summary.longitude,
        });
    }

    Ok(Some(SondeFrame {
        serial: summary.callsign,
        frame_number: summary.frame,
        latitude: summary.latitude,
        longitude: summary.longitude,
        altitude: summary.altitude.trunc() as i64,
        model: summary.model,
        frequency_mhz,
        received_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn decodes_payload_summary() {
        let packet = br#"{
            "type": "PAYLOAD_SUMMARY",
            "station": "N0CALL",
            "callsign": "V1234567",
            "latitude": 48.1234,
            "longitude": 11.5678,
            "altitude": 15234.7,
            "speed": 12.3,
            "heading": 270.0,
            "time": "12:00:00",
            "comment": "Radiosonde",
            "model": "RS41-SG",
            "freq": "403.500 MHz",
            "temp": -45.2,
            "frame": 4321
        }"#;

        let frame = decode_datagram(packet, now()).unwrap().unwrap();
        assert_eq!(frame.serial, "V1234567");
        assert_eq!(frame.frame_number, 4321);
        assert_eq!(frame.latitude, 48.1234);
        assert_eq!(frame.longitude, 11.5678);
        assert_eq!(frame.altitude, 15234);
        assert_eq!(frame.model, "RS41-SG");
        assert_eq!(frame.frequency_mhz, 403.5);
        assert_eq!(frame.received_at, now());
    }

    #[test]
    fn ignores_other_packet_types() {
        let packet = br#"{"type": "MODEM_STATS", "source": "rs41"}"#;
        assert!(decode_datagram(packet, now()).unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_packets() {
        assert!(matches!(
            decode_datagram(b"not json", now()),
            Err(ListenerError::Json(_))
        ));
        assert!(matches!(
            decode_datagram(br#"{"callsign": "V1"}"#, now()),
            Err(ListenerError::Json(_))
        ));

        let missing_altitude = br#"{"type": "PAYLOAD_SUMMARY", "callsign": "V1", "frame": 1,
            "latitude": 1.0, "longitude": 2.0, "model": "RS41", "freq": "403.5 MHz"}"#;
        assert!(matches!(
            decode_datagram(missing_altitude, now()),
            Err(ListenerError::Json(_))
        ));

        let bad_freq = br#"{"type": "PAYLOAD_SUMMARY", "callsign": "V1", "frame": 1,
            "latitude": 1.0, "longitude": 2.0, "altitude": 100, "model": "RS41", "freq": "?"}"#;
        assert!(matches!(
            decode_datagram(bad_freq, now()),
            Err(ListenerError::InvalidFrequency(_))
        ));
    }

    #[test]
    fn rejects_positions_off_the_globe() {
        let packet = |lat: f64, lon: f64| {
            format!(
                r#"{{"type": "PAYLOAD_SUMMARY", "callsign": "V1", "frame": 1, "latitude": {lat},
                "longitude": {lon}, "altitude": 100, "model": "RS41", "freq": "403.5 MHz"}}"#
            )
        };

        for (lat, lon) in [(95.0, 11.0), (-90.5, 0.0), (48.0, 180.5), (1e6, 1e6)] {
            assert!(matches!(
                decode_datagram(packet(lat, lon).as_bytes(), now()),
                Err(ListenerError::InvalidPosition { .. })
            ));
        }
        assert!(decode_datagram(packet(-90.0, 180.0).as_bytes(), now())
            .unwrap()
            .is_some());
    }
}
