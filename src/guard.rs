//! Memory guard consulted before wildcard fan-out.
//!
//! The guard reads the resident memory of the current process and refuses to
//! continue once it exceeds the configured threshold. The failure travels up
//! as [`PathkeeperError::ResourceExhausted`]; nothing catches it on the way.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::trace;

use crate::error::{PathkeeperError, Result};

lazy_static! {
    static ref BYTE_SIZE: Regex = Regex::new(r"(?i)^\s*(\d+)\s*([kmgtp]?)b?\s*$").unwrap();
}

const UNITS: [&str; 6] = ["b", "kb", "mb", "gb", "tb", "pb"];

/// Parses `1024`, `512k`, `3MB`, `2 gb` and the like into a byte count.
pub fn parse_byte_size(text: &str) -> Result<u64> {
    let invalid = || PathkeeperError::Config(format!("invalid byte size '{text}'"));
    let captures = BYTE_SIZE.captures(text).ok_or_else(invalid)?;
    let amount: u64 = captures[1].parse().map_err(|_| invalid())?;
    let shift = match captures[2].to_ascii_lowercase().as_str() {
        "" => 0,
        "k" => 10,
        "m" => 20,
        "g" => 30,
        "t" => 40,
        _ => 50,
    };
    amount.checked_mul(1u64 << shift).ok_or_else(invalid)
}

/// Renders a byte count with the largest unit that keeps it at or above one.
pub fn format_bytes(bytes: u64) -> String {
    let mut level = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && level < UNITS.len() - 1 {
        scaled /= 1024;
        level += 1;
    }
    format!("{} {}", scaled, UNITS[level])
}

// ------------- ByteSize -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawByteSize")]
pub struct ByteSize(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawByteSize {
    Bytes(u64),
    Text(String),
}

impl TryFrom<RawByteSize> for ByteSize {
    type Error = PathkeeperError;
    fn try_from(raw: RawByteSize) -> Result<Self> {
        match raw {
            RawByteSize::Bytes(bytes) => Ok(ByteSize(bytes)),
            RawByteSize::Text(text) => parse_byte_size(&text).map(ByteSize),
        }
    }
}

// ------------- Guards -------------
pub trait ResourceGuard {
    fn check(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGuard {
    limit: Option<u64>,
}

impl MemoryGuard {
    pub fn new(limit: Option<u64>) -> Self {
        Self { limit }
    }
    pub fn unlimited() -> Self {
        Self { limit: None }
    }
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
    /// Resident memory of this process, or `None` when the platform does not
    /// report it.
    pub fn usage() -> Option<u64> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(|process| process.memory())
    }
}

impl ResourceGuard for MemoryGuard {
    fn check(&self) -> Result<()> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let usage = Self::usage().unwrap_or(0);
        trace!(usage, limit, "memory check");
        if usage > limit {
            return Err(PathkeeperError::ResourceExhausted {
                usage: format_bytes(usage),
                limit: format_bytes(limit),
            });
        }
        Ok(())
    }
}
