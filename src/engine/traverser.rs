//! Random-access replay of a compressed transcript, accelerated by a
//! checkpoint cache so seeking never requires starting over from the
//! snapshot.

use super::checkpoint::FPCache;
use super::config::TraverserConfig;
use super::halfbook::{Halfbook, Side};
use super::price::{ParseError, Price};
use super::records::CompressedRecord;
use super::types::{OrderBook, OrderbookState, PriceRange};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Errors raised while loading or replaying a compressed transcript.
#[derive(Debug)]
#[non_exhaustive]
pub enum TraverserError {
    /// The transcript file does not exist.
    NotFound(PathBuf),
    /// The transcript's first line was not a well-formed snapshot record.
    Protocol(String),
    /// A line in the transcript was not valid JSON.
    Deserialize(serde_json::Error),
    /// A price or size string did not parse as a decimal.
    Parse(ParseError),
    /// An I/O error occurred while reading the transcript.
    Io(io::Error),
    /// An operation was called with an argument outside its valid range,
    /// e.g. `move_by` with a non-positive number of seconds.
    InvalidArgument(String),
}

impl fmt::Display for TraverserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraverserError::NotFound(path) => {
                write!(f, "orderbook transcript not found at {}", path.display())
            }
            TraverserError::Protocol(message) => write!(f, "protocol error: {message}"),
            TraverserError::Deserialize(err) => write!(f, "malformed transcript line: {err}"),
            TraverserError::Parse(err) => write!(f, "parse error: {err}"),
            TraverserError::Io(err) => write!(f, "I/O error: {err}"),
            TraverserError::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
        }
    }
}

impl std::error::Error for TraverserError {}

impl From<serde_json::Error> for TraverserError {
    fn from(err: serde_json::Error) -> Self {
        TraverserError::Deserialize(err)
    }
}

impl From<ParseError> for TraverserError {
    fn from(err: ParseError) -> Self {
        TraverserError::Parse(err)
    }
}

impl From<io::Error> for TraverserError {
    fn from(err: io::Error) -> Self {
        TraverserError::Io(err)
    }
}

/// Replays a compressed transcript one record at a time, exposing
/// step/skip/seek/interval-scan primitives over the reconstructed book.
///
/// Internally this keeps a single [`OrderbookState`] plus the transcript
/// file offset it was read up to, and periodically checkpoints both into
/// an [`FPCache`] so [`Traverser::skip`] and [`Traverser::at`] can jump
/// without replaying from the snapshot.
pub struct Traverser {
    symbol: String,
    filename: PathBuf,
    config: TraverserConfig,
    current_position: u64,
    current_state: OrderbookState,
    /// Logical timestamp: greater than or equal to `current_state.timestamp`,
    /// strictly less than the next unread record's timestamp.
    current_timestamp: i64,
    initial_timestamp: i64,
    cache: FPCache<(OrderbookState, u64)>,
}

impl Traverser {
    /// Opens `filename` and loads its initial snapshot.
    ///
    /// # Errors
    /// Returns [`TraverserError::NotFound`] if the file does not exist, or
    /// any error [`Traverser::reset`] can return while parsing the
    /// snapshot line.
    pub fn new(
        symbol: impl Into<String>,
        filename: impl Into<PathBuf>,
        config: TraverserConfig,
    ) -> Result<Self, TraverserError> {
        let filename = filename.into();
        if !filename.exists() {
            return Err(TraverserError::NotFound(filename));
        }

        let (current_state, current_position) = load_initial_snapshot(&filename)?;
        let current_timestamp = current_state.timestamp;
        let mut cache = FPCache::new();
        cache.add(current_state.timestamp, (current_state.clone(), current_position));

        Ok(Traverser {
            symbol: symbol.into(),
            filename,
            config,
            current_position,
            current_state,
            current_timestamp,
            initial_timestamp: current_timestamp,
            cache,
        })
    }

    /// The current reconstructed state.
    pub fn get(&self) -> &OrderbookState {
        &self.current_state
    }

    /// The current state projected to the float-valued, best-ask-last
    /// [`OrderBook`] view.
    pub fn get_orderbook(&self) -> OrderBook {
        OrderBook {
            symbol: self.symbol.clone(),
            asks: self
                .current_state
                .asks
                .levels()
                .iter()
                .rev()
                .map(|(p, q)| (p.to_f64(), q.to_f64()))
                .collect(),
            bids: self
                .current_state
                .bids
                .levels()
                .iter()
                .map(|(p, q)| (p.to_f64(), q.to_f64()))
                .collect(),
            timestamp: self.current_timestamp,
        }
    }

    /// The current best bid price, if any bids are present.
    pub fn best_bid(&self) -> Option<Price> {
        self.current_state.bids.levels().first().map(|(p, _)| *p)
    }

    /// The current best ask price, if any asks are present.
    pub fn best_ask(&self) -> Option<Price> {
        self.current_state.asks.levels().first().map(|(p, _)| *p)
    }

    fn add_to_cache(&mut self) {
        self.cache.add(
            self.current_state.timestamp,
            (self.current_state.clone(), self.current_position),
        );
    }

    fn add_to_cache_if_needed(&mut self) {
        let last = self.cache.last_key().unwrap_or(self.current_state.timestamp);
        if self.current_state.timestamp - last > self.config.cache_frequency_seconds * 1000 {
            self.add_to_cache();
        }
    }

    /// Replays records from `current_position` onward, calling `hook`
    /// before each record is applied. `hook` returns `true` to stop
    /// *before* applying that record; the record that triggers
    /// termination is never applied or added to the cache.
    ///
    /// On a normal (non-terminated) iteration the state, file position,
    /// and checkpoint cache are all updated.
    fn read_from_current(
        &mut self,
        mut hook: impl FnMut(&OrderbookState, &CompressedRecord) -> bool,
    ) -> Result<(), TraverserError> {
        let file = File::open(&self.filename)?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.current_position))?;

        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                break; // EOF
            }
            let record: CompressedRecord = serde_json::from_str(&line)?;

            if hook(&self.current_state, &record) {
                break;
            }

            apply_record(&mut self.current_state, &record)?;
            self.current_position = reader.stream_position()?;
            tracing::trace!(
                t = self.current_state.timestamp,
                s = self.current_state.sequence,
                position = self.current_position,
                "applied record"
            );
            self.add_to_cache_if_needed();
        }
        Ok(())
    }

    /// Skips forward (or, with a negative `seconds`, backward) relative to
    /// the current logical timestamp. Never seeks earlier than the initial
    /// snapshot's timestamp. Consults the checkpoint cache before falling
    /// back to a linear scan.
    pub fn skip(&mut self, seconds: f64) -> Result<(), TraverserError> {
        let target_time = (self.current_timestamp as f64 + seconds * 1000.0) as i64;
        let target_time = target_time.max(self.initial_timestamp);

        if let Some((state, position)) = self.cache.get(target_time).cloned() {
            let exact = state.timestamp == target_time;
            self.current_state = state;
            self.current_position = position;
            if exact {
                self.current_timestamp = target_time;
                return Ok(());
            }
        }

        self.read_from_current(|_state, record| record.t > target_time)?;
        self.current_timestamp = target_time;
        Ok(())
    }

    /// Skips to the earliest state at or after `timestamp_ms`.
    ///
    /// The offset passed to `skip` is truncated to whole seconds, discarding
    /// any sub-second remainder of `timestamp_ms - current_state.timestamp`,
    /// before converting to seconds.
    pub fn at(&mut self, timestamp_ms: i64) -> Result<(), TraverserError> {
        let seconds = ((timestamp_ms - self.current_state.timestamp) / 1000) as f64;
        self.skip(seconds)
    }

    /// Moves forward by `seconds` (which must be positive), tracking the
    /// best-bid/best-ask extremes observed along the way. Unlike `skip`,
    /// this always does a full linear scan of the interval: the cache
    /// cannot answer "what was the extreme over this range".
    ///
    /// The record that would advance the state past the target time is
    /// read but not applied, so its effect on best bid/ask is not
    /// reflected in the returned range.
    ///
    /// # Errors
    /// Returns [`TraverserError::InvalidArgument`] if `seconds` is not
    /// positive.
    pub fn move_by(&mut self, seconds: f64) -> Result<PriceRange, TraverserError> {
        if seconds <= 0.0 {
            return Err(TraverserError::InvalidArgument(format!(
                "move_by only accepts positive intervals, got {seconds}"
            )));
        }

        let start_time = self.current_timestamp;
        let target_time = self.current_timestamp + (seconds * 1000.0) as i64;

        let mut lowest_ask = self.best_ask();
        let mut highest_bid = self.best_bid();

        self.read_from_current(|state, record| {
            let current_ask = state.asks.levels().first().map(|(p, _)| *p);
            let current_bid = state.bids.levels().first().map(|(p, _)| *p);
            lowest_ask = min_option(lowest_ask, current_ask);
            highest_bid = max_option(highest_bid, current_bid);
            record.t > target_time
        })?;

        self.current_timestamp = target_time;

        Ok(PriceRange {
            lowest_ask,
            highest_bid,
            start_time,
            end_time: self.current_timestamp,
        })
    }

    /// Advances by exactly one set of same-timestamp records.
    pub fn step(&mut self) -> Result<(), TraverserError> {
        let mut current_ts: Option<i64> = None;
        self.read_from_current(|_state, record| match current_ts {
            None => {
                current_ts = Some(record.t);
                false
            }
            Some(ts) => record.t > ts,
        })?;
        self.current_timestamp = self.current_state.timestamp;
        Ok(())
    }

    /// Resets to the initial snapshot.
    pub fn reset(&mut self) -> Result<(), TraverserError> {
        let (current_state, current_position) = load_initial_snapshot(&self.filename)?;
        self.current_timestamp = current_state.timestamp;
        self.current_position = current_position;
        self.current_state = current_state;
        self.cache = FPCache::new();
        self.add_to_cache();
        Ok(())
    }
}

fn min_option(a: Option<Price>, b: Option<Price>) -> Option<Price> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn max_option(a: Option<Price>, b: Option<Price>) -> Option<Price> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn apply_record(state: &mut OrderbookState, record: &CompressedRecord) -> Result<(), ParseError> {
    if let Some(updates) = &record.b {
        for (price, size) in updates {
            state.bids.update(*price, size.clone())?;
        }
    }
    if let Some(updates) = &record.a {
        for (price, size) in updates {
            state.asks.update(*price, size.clone())?;
        }
    }
    state.timestamp = record.t;
    state.sequence = record.s;
    Ok(())
}

fn load_initial_snapshot(filename: &Path) -> Result<(OrderbookState, u64), TraverserError> {
    let file = File::open(filename)?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;
    if first_line.is_empty() {
        return Err(TraverserError::Protocol("transcript is empty".into()));
    }

    let record: CompressedRecord = serde_json::from_str(&first_line)?;
    let bids_raw = record
        .b
        .ok_or_else(|| TraverserError::Protocol("initial snapshot missing 'b'".into()))?;
    let asks_raw = record
        .a
        .ok_or_else(|| TraverserError::Protocol("initial snapshot missing 'a'".into()))?;

    let mut bids = Halfbook::new(Side::Bid);
    bids.set(bids_raw);
    let mut asks = Halfbook::new(Side::Ask);
    asks.set(asks_raw);

    let state = OrderbookState {
        bids,
        asks,
        timestamp: record.t,
        sequence: record.s,
    };
    let position = reader.stream_position()?;
    Ok((state, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_transcript(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn sample_transcript() -> tempfile::NamedTempFile {
        write_transcript(&[
            r#"{"t":1000,"s":1,"b":[["100","10"],["99","5"]],"a":[["101","8"],["102","4"]]}"#,
            r#"{"t":2000,"s":2,"b":[["100","20"]]}"#,
            r#"{"t":2000,"s":3,"a":[["101","1"]]}"#,
            r#"{"t":5000,"s":4,"b":[["100","0"]]}"#,
            r#"{"t":12000,"s":5,"a":[["103","2"]]}"#,
        ])
    }

    #[test]
    fn loads_initial_snapshot() {
        let file = sample_transcript();
        let trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        assert_eq!(trav.get().timestamp, 1000);
        assert_eq!(trav.best_bid(), Some(Price::parse("100").unwrap()));
        assert_eq!(trav.best_ask(), Some(Price::parse("101").unwrap()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = Traverser::new("BTCUSD", "/no/such/file.data", TraverserConfig::default());
        assert!(matches!(result, Err(TraverserError::NotFound(_))));
    }

    #[test]
    fn step_advances_one_timestamp_set_at_a_time() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        trav.step().unwrap();
        assert_eq!(trav.get().timestamp, 2000);
        assert_eq!(trav.get().sequence, 3);
        assert_eq!(trav.best_bid(), Some(Price::parse("100").unwrap()));
        assert_eq!(trav.best_ask(), Some(Price::parse("101").unwrap()));

        trav.step().unwrap();
        assert_eq!(trav.get().timestamp, 5000);
        assert!(trav.get().bids.levels().iter().all(|(p, _)| p.to_string() != "100"));
    }

    #[test]
    fn skip_lands_on_the_earliest_record_past_the_target() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        trav.skip(4.0).unwrap();
        assert_eq!(trav.get().timestamp, 5000);
        assert_eq!(trav.current_timestamp, 5000);
    }

    #[test]
    fn skip_never_goes_before_the_initial_snapshot() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        trav.skip(-100.0).unwrap();
        assert_eq!(trav.current_timestamp, 1000);
    }

    #[test]
    fn at_seeks_to_a_specific_timestamp() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        trav.at(5500).unwrap();
        assert_eq!(trav.get().timestamp, 5000);
        assert_eq!(trav.current_timestamp, 5000);
    }

    #[test]
    fn at_truncates_a_sub_second_remainder() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        // 1000 + 1999ms truncates to a 1-second offset, landing on t=2000
        // rather than jumping as far as t=2999 would.
        trav.at(2999).unwrap();
        assert_eq!(trav.get().timestamp, 2000);
        assert_eq!(trav.current_timestamp, 2000);
    }

    #[test]
    fn move_by_tracks_extremes_excluding_the_terminating_record() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        let range = trav.move_by(4.0).unwrap();
        assert_eq!(range.start_time, 1000);
        assert_eq!(range.end_time, 5000);
        assert_eq!(range.highest_bid, Some(Price::parse("100").unwrap()));
        assert_eq!(range.lowest_ask, Some(Price::parse("101").unwrap()));
        // The t=5000 record (which removes the 100 bid) is applied, since
        // its timestamp is not strictly past the target. The t=12000
        // record is read but never applied, so its effect is invisible
        // both to the state and to the tracked extremes.
        assert_eq!(trav.get().timestamp, 5000);
        assert_eq!(trav.best_bid(), Some(Price::parse("99").unwrap()));
    }

    #[test]
    fn reset_returns_to_the_initial_snapshot() {
        let file = sample_transcript();
        let mut trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        trav.step().unwrap();
        trav.step().unwrap();
        trav.reset().unwrap();
        assert_eq!(trav.get().timestamp, 1000);
        assert_eq!(trav.current_timestamp, 1000);
    }

    #[test]
    fn get_orderbook_projects_asks_best_last() {
        let file = sample_transcript();
        let trav = Traverser::new("BTCUSD", file.path(), TraverserConfig::default()).unwrap();
        let ob = trav.get_orderbook();
        assert_eq!(ob.best_ask(), Some(101.0));
        assert_eq!(ob.best_bid(), Some(100.0));
        assert_eq!(ob.asks.last().map(|(p, _)| *p), Some(101.0));
    }
}
