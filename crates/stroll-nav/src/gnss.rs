use std::time::Duration;

use anyhow::{Context, Result};
use stroll_proto::position::PositionFix;
use time::OffsetDateTime;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

const KNOTS_TO_MPS: f64 = 0.514_444;
/// Metres of horizontal error per unit of HDOP.
const HDOP_TO_METERS: f64 = 5.0;
/// A GGA sentence older than this no longer describes the current fix.
const GGA_MAX_AGE_S: i64 = 5;

enum Input {
    Serial(BufReader<SerialStream>),
    File { reader: BufReader<File>, pace: Option<Duration> },
}

pub struct GnssSource {
    input: Input,
    parser: NmeaParser,
}

impl GnssSource {
    pub fn serial(dev: &str, baud: u32) -> Result<Self> {
        let port = tokio_serial::new(dev, baud).open_native_async()
            .with_context(|| format!("open serial {}", dev))?;
        Ok(Self::with_input(Input::Serial(BufReader::new(port))))
    }

    /// Replay a recorded NMEA log. With `pace`, waits that long between fixes.
    pub fn file(path: &str, pace: Option<Duration>) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("open nmea file {}", path))?;
        let reader = BufReader::new(File::from_std(f));
        Ok(Self::with_input(Input::File { reader, pace }))
    }

    fn with_input(input: Input) -> Self {
        Self { input, parser: NmeaParser::default() }
    }

    /// Next position, or `None` once a replayed file is exhausted.
    pub async fn next_fix(&mut self) -> Result<Option<PositionFix>> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = match &mut self.input {
                Input::Serial(r) => r.read_line(&mut line).await.context("read serial")?,
                Input::File { reader, .. } => reader.read_line(&mut line).await.context("read nmea file")?,
            };
            if n == 0 {
                if let Input::File { .. } = self.input {
                    return Ok(None);
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                continue;
            }
            if let Some(fix) = self.parser.feed(line.trim(), OffsetDateTime::now_utc()) {
                if let Input::File { pace: Some(p), .. } = &self.input {
                    tokio::time::sleep(*p).await;
                }
                return Ok(Some(fix));
            }
        }
    }
}

/// Read fixes until the source ends or the receiver goes away.
pub fn spawn_gnss(mut src: GnssSource, tx: mpsc::Sender<PositionFix>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match src.next_fix().await {
                Ok(Some(fix)) => {
                    if tx.send(fix).await.is_err() {
                        debug!("gnss: receiver closed");
                        break;
                    }
                }
                Ok(None) => {
                    info!("gnss: end of replay");
                    break;
                }
                Err(e) => {
                    warn!("gnss: {:#}", e);
                    break;
                }
            }
        }
    })
}

/// Minimal NMEA 0183 parsing:
/// - GGA: HDOP, kept until the next RMC
/// - RMC: position, speed over ground, course
#[derive(Debug, Default)]
pub struct NmeaParser {
    last_hdop: Option<(f64, OffsetDateTime)>,
}

impl NmeaParser {
    /// Feed one sentence; returns a fix for every valid RMC.
    pub fn feed(&mut self, s: &str, now: OffsetDateTime) -> Option<PositionFix> {
        let body = match checked_body(s) {
            Some(b) => b,
            None => {
                if s.starts_with('$') {
                    debug!("gnss: dropping bad sentence {:?}", s);
                }
                return None;
            }
        };
        let parts: Vec<&str> = body.split(',').collect();
        let kind = parts.first().map(|t| t.get(2..).unwrap_or("")).unwrap_or("");

        match kind {
            "GGA" if parts.len() > 8 => {
                let quality: u8 = parts[6].parse().unwrap_or(0);
                match parts[8].parse::<f64>() {
                    Ok(hdop) if quality > 0 && hdop.is_finite() && hdop > 0.0 => {
                        self.last_hdop = Some((hdop, now));
                    }
                    _ => self.last_hdop = None,
                }
                None
            }
            "RMC" if parts.len() > 8 => {
                // parts[2]=status, [3]=lat ddmm.mmmm, [4]=N/S, [5]=lon dddmm.mmmm, [6]=E/W
                if parts[2] != "A" {
                    return None;
                }
                let lat = parse_deg_min(parts[3], parts[4])?;
                let lng = parse_deg_min(parts[5], parts[6])?;
                let speed_mps = parts[7].parse::<f64>().ok().map(|kn| kn * KNOTS_TO_MPS);
                let heading = parts[8].parse::<f64>().ok().filter(|c| c.is_finite());
                let accuracy_m = self
                    .last_hdop
                    .filter(|(_, ts)| (now - *ts).whole_seconds() <= GGA_MAX_AGE_S)
                    .map(|(hdop, _)| hdop * HDOP_TO_METERS);
                Some(PositionFix { lat, lng, heading, accuracy_m, speed_mps })
            }
            _ => None,
        }
    }
}

/// Strip `$` and `*hh`, verifying the checksum when one is present.
fn checked_body(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('$')?;
    let (body, sum) = match rest.split_once('*') {
        Some((b, sum)) => (b, Some(sum)),
        None => (rest, None),
    };
    if let Some(sum) = sum {
        let expected = u8::from_str_radix(sum.trim(), 16).ok()?;
        let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);
        if actual != expected {
            return None;
        }
    }
    Some(body)
}

fn parse_deg_min(v: &str, hemi: &str) -> Option<f64> {
    if v.is_empty() { return None; }
    // lat: ddmm.mmmm, lon: dddmm.mmmm
    let dot = v.find('.')?;
    let deg_len = if dot > 4 { 3 } else { 2 };
    let deg: f64 = v.get(..deg_len)?.parse().ok()?;
    let min: f64 = v.get(deg_len..)?.parse().ok()?;
    let mut out = deg + (min / 60.0);
    if hemi == "S" || hemi == "W" { out = -out; }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RMC: &str = "$GNRMC,101500.00,A,5222.2000,N,00453.4000,E,2.72,91.0,181026,,,A*45";
    const GGA: &str = "$GNGGA,101500.00,5222.2000,N,00453.4000,E,1,09,1.2,2.0,M,46.0,M,,*7E";
    const VOID: &str = "$GNRMC,101501.00,V,,,,,,,181026,,,N*6B";
    const STILL: &str = "$GNRMC,101502.00,A,5222.2010,N,00453.4100,E,0.00,,181026,,,A*56";

    #[test]
    fn rmc_gives_position_speed_and_course() {
        let mut p = NmeaParser::default();
        let fix = p.feed(RMC, OffsetDateTime::now_utc()).unwrap();
        assert!((fix.lat - 52.37).abs() < 1e-9);
        assert!((fix.lng - 4.89).abs() < 1e-9);
        assert!((fix.speed_mps.unwrap() - 1.3993).abs() < 1e-3);
        assert_eq!(fix.heading, Some(91.0));
        assert_eq!(fix.accuracy_m, None);
    }

    #[test]
    fn gga_hdop_becomes_accuracy_until_stale() {
        let mut p = NmeaParser::default();
        let t0 = OffsetDateTime::now_utc();
        assert!(p.feed(GGA, t0).is_none());
        let fix = p.feed(RMC, t0 + time::Duration::seconds(1)).unwrap();
        assert!((fix.accuracy_m.unwrap() - 6.0).abs() < 1e-9);

        let later = p.feed(RMC, t0 + time::Duration::seconds(30)).unwrap();
        assert_eq!(later.accuracy_m, None);
    }

    #[test]
    fn void_and_corrupt_sentences_are_dropped() {
        let mut p = NmeaParser::default();
        let now = OffsetDateTime::now_utc();
        assert!(p.feed(VOID, now).is_none());
        assert!(p.feed(&RMC.replace("*45", "*46"), now).is_none());
        assert!(p.feed("garbage", now).is_none());
        assert!(p.feed("", now).is_none());
    }

    #[test]
    fn empty_course_leaves_heading_unset() {
        let mut p = NmeaParser::default();
        let fix = p.feed(STILL, OffsetDateTime::now_utc()).unwrap();
        assert_eq!(fix.heading, None);
        assert_eq!(fix.speed_mps, Some(0.0));
    }

    #[test]
    fn textbook_sentence_with_three_digit_longitude() {
        let mut p = NmeaParser::default();
        let s = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
        let fix = p.feed(s, OffsetDateTime::now_utc()).unwrap();
        assert!((fix.lat - (48.0 + 7.038 / 60.0)).abs() < 1e-9);
        assert!((fix.lng - 11.516_666_666).abs() < 1e-6);
        assert_eq!(parse_deg_min("4807.038", "S").map(|v| v < 0.0), Some(true));
    }

    fn nmea_file(tag: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("stroll-gnss-{}-{}.nmea", tag, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn file_replay_sends_each_fix_then_ends() {
        let path = nmea_file("replay", &format!("{}\n{}\n{}\n{}\n", GGA, RMC, VOID, STILL));
        let src = GnssSource::file(path.to_str().unwrap(), None).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        spawn_gnss(src, tx).await.unwrap();

        let mut fixes = Vec::new();
        while let Some(f) = rx.recv().await {
            fixes.push(f);
        }
        assert_eq!(fixes.len(), 2);
        assert!(fixes[0].accuracy_m.is_some());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn empty_file_is_exhausted_immediately() {
        let path = nmea_file("empty", "");
        let mut src = GnssSource::file(path.to_str().unwrap(), None).unwrap();
        assert!(src.next_fix().await.unwrap().is_none());
        let _ = std::fs::remove_file(&path);
    }
}
