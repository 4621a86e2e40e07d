//! Roster parsing: `name,rating,gender` CSV into players.

use crate::models::{Player, ScheduleError};
use csv::{ReaderBuilder, Trim};
use std::io::Read;

/// Read players from CSV with a `name,rating,gender` header.
///
/// Gender accepts `male`/`female` or `m`/`f`; lines starting with `#` are skipped.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<Player>, ScheduleError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut players = Vec::new();
    for (i, record) in rdr.deserialize::<Player>().enumerate() {
        let player = record.map_err(|e| ScheduleError::InvalidRoster {
            // +2: 1-based, after the header
            line: e.position().map(|p| p.line()).unwrap_or(i as u64 + 2),
            message: e.to_string(),
        })?;
        players.push(player);
    }
    Ok(players)
}

pub fn parse_roster_str(text: &str) -> Result<Vec<Player>, ScheduleError> {
    parse_roster(text.as_bytes())
}
