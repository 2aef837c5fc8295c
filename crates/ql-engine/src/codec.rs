//! The quest binary format.
//!
//! Converting a source file for the engine means [`crate::parser::parse_game`]
//! followed by [`encode`]; the engine's loader runs [`decode`]. Layout:
//! a 4-byte magic, a u32-LE location count, then per location a
//! length-prefixed UTF-8 name and a length-prefixed list of length-prefixed
//! UTF-8 code lines.

use crate::error::{EngineError, EngineResult};
use crate::game::{GameData, GameLocation};

/// Magic bytes at the start of every quest binary.
pub const MAGIC: [u8; 4] = *b"QLB1";

/// Serialize game data into the quest binary format.
pub fn encode(game: &GameData) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    push_u32(&mut out, game.locations.len() as u32);
    for loc in &game.locations {
        push_str(&mut out, &loc.name);
        push_u32(&mut out, loc.lines.len() as u32);
        for line in &loc.lines {
            push_str(&mut out, line);
        }
    }
    out
}

/// Deserialize a quest binary back into game data.
pub fn decode(bytes: &[u8]) -> EngineResult<GameData> {
    let mut reader = Reader { bytes, pos: 0 };
    if reader.take(4)? != MAGIC {
        return Err(EngineError::BadMagic);
    }
    let location_count = reader.take_u32()?;
    let mut locations = Vec::with_capacity(location_count as usize);
    for _ in 0..location_count {
        let name = reader.take_str()?;
        let line_count = reader.take_u32()?;
        let mut lines = Vec::with_capacity(line_count as usize);
        for _ in 0..line_count {
            lines.push(reader.take_str()?);
        }
        locations.push(GameLocation { name, lines });
    }
    Ok(GameData { locations })
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    push_u32(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> EngineResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(EngineError::TruncatedGame)?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_u32(&mut self) -> EngineResult<u32> {
        let raw = self.take(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(raw);
        Ok(u32::from_le_bytes(buf))
    }

    fn take_str(&mut self) -> EngineResult<String> {
        let len = self.take_u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| EngineError::GameNotUtf8)
    }
}
