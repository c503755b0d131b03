//! Parsing of ffmpeg's `-progress` output.
//!
//! With `-progress pipe:1` ffmpeg writes `key=value` blocks, each terminated
//! by a `progress=continue` (or `progress=end`) line:
//!
//! ```text
//! frame=120
//! out_time_us=4004000
//! out_time=00:00:04.004000
//! progress=continue
//! ```

/// Accumulates progress lines and reports one timecode per block.
#[derive(Debug, Default)]
pub struct ProgressParser {
    out_time: Option<f64>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns the output timecode in seconds when a block ends.
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // out_time_ms is in microseconds too
            "out_time_us" | "out_time_ms" => {
                if let Some(us) = value.trim().parse::<i64>().ok().filter(|us| *us >= 0) {
                    self.out_time = Some(us as f64 / 1_000_000.0);
                }
                None
            }
            "out_time" => {
                if let Some(secs) = parse_clock(value) {
                    self.out_time = Some(secs);
                }
                None
            }
            "progress" => self.out_time,
            _ => None,
        }
    }
}

/// Parse `HH:MM:SS(.fraction)` into seconds.
pub fn parse_clock(s: &str) -> Option<f64> {
    let mut parts = s.trim().splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if hours < 0.0 || !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_yields_timecode() {
        let mut parser = ProgressParser::new();
        assert_eq!(parser.feed("frame=120"), None);
        assert_eq!(parser.feed("out_time_us=4004000"), None);
        assert_eq!(parser.feed("progress=continue"), Some(4.004));
        assert_eq!(parser.feed("out_time_ms=5000000"), None);
        assert_eq!(parser.feed("progress=end"), Some(5.0));
    }

    #[test]
    fn test_no_timecode_before_first_block() {
        let mut parser = ProgressParser::new();
        assert_eq!(parser.feed("out_time_us=N/A"), None);
        assert_eq!(parser.feed("progress=continue"), None);
    }

    #[test]
    fn test_out_time_clock_fallback() {
        let mut parser = ProgressParser::new();
        parser.feed("out_time=00:01:02.500000");
        assert_eq!(parser.feed("progress=continue"), Some(62.5));
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("01:00:00.00"), Some(3600.0));
        assert_eq!(parse_clock("00:00:01.25"), Some(1.25));
        assert_eq!(parse_clock("00:61:00"), None);
        assert_eq!(parse_clock("garbage"), None);
    }
}
