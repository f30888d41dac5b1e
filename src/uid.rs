//! Generation of the 12-byte object identifiers synthesized for `_id`.

use std::fmt::{ Debug, Formatter, Result as FmtResult };
use std::sync::atomic::{ AtomicU32, Ordering };
use bson::oid::ObjectId;

/// Highest value of the 3-byte counter part of an `ObjectId`.
const COUNTER_MASK: u32 = 0x00ff_ffff;

/// A source of fresh object identifiers.
///
/// Generators are shared by every encode call of a `Codec`, possibly
/// from several threads at once.
pub trait IdGenerator: Debug + Send + Sync {
    /// Returns a new identifier, distinct from the previous ones.
    fn generate(&self) -> ObjectId;
}

/// The standard scheme: seconds since the epoch, a per-process random
/// value and an atomically incremented counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn generate(&self) -> ObjectId {
        ObjectId::new()
    }
}

/// Deterministic identifiers with a fixed timestamp and process part.
///
/// Only the counter varies, so two generators with the same seed produce
/// the same sequence. Useful for reproducible output.
/// ```
/// # use tabula::uid::{ IdGenerator, SequentialIdGenerator };
/// let ids = SequentialIdGenerator::new(0x5f00_0000, [1, 2, 3, 4, 5]);
///
/// assert_eq!(ids.generate().to_hex(), "5f0000000102030405000000");
/// assert_eq!(ids.generate().to_hex(), "5f0000000102030405000001");
/// ```
pub struct SequentialIdGenerator {
    /// Big-endian seconds part of every identifier.
    timestamp: u32,
    /// The 5-byte process-unique part.
    process: [u8; 5],
    /// Next value of the 3-byte counter part.
    counter: AtomicU32,
}

impl SequentialIdGenerator {
    /// Creates a generator whose counter starts at zero.
    pub fn new(timestamp: u32, process: [u8; 5]) -> Self {
        SequentialIdGenerator {
            timestamp,
            process,
            counter: AtomicU32::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> ObjectId {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;
        let mut bytes = [0_u8; 12];

        bytes[..4].copy_from_slice(&self.timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        ObjectId::from_bytes(bytes)
    }
}

impl Debug for SequentialIdGenerator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        formatter
            .debug_struct("SequentialIdGenerator")
            .field("timestamp", &self.timestamp)
            .field("process", &self.process)
            .field("counter", &self.counter.load(Ordering::SeqCst))
            .finish()
    }
}

/// Generates a fresh identifier with the standard scheme.
/// Its canonical rendering is 24 lowercase hex digits.
/// ```
/// # use tabula::uid::new_identifier;
/// let id = new_identifier();
/// let hex = id.to_hex();
///
/// assert_eq!(id.bytes().len(), 12);
/// assert_eq!(hex.len(), 24);
/// assert_ne!(new_identifier(), id);
/// ```
pub fn new_identifier() -> ObjectId {
    ObjectIdGenerator.generate()
}
