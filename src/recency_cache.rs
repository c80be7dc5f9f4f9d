//! A bounded map from an identity to the time it was last seen.
//!
//! When full, inserting a new key evicts the entry with the oldest timestamp.
//! Lookups refresh the timestamp, so frequently read entries stay resident.

use std::{
	collections::HashMap,
	hash::{BuildHasher, Hash},
	num::NonZeroUsize,
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::clock::{Clock, SystemClock};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
	#[error("key is not in the cache")]
	KeyNotFound,
	#[error("cache capacity cannot be negative (got {0})")]
	InvalidCapacity(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capacity {
	Unbounded,
	Bounded(NonZeroUsize),
}

impl Capacity {
	/// The configured maximum, with 0 meaning unbounded.
	pub fn max_size(self) -> usize {
		match self {
			Capacity::Unbounded => 0,
			Capacity::Bounded(max) => max.get(),
		}
	}
}

impl From<usize> for Capacity {
	fn from(max_size: usize) -> Self {
		NonZeroUsize::new(max_size).map_or(Capacity::Unbounded, Capacity::Bounded)
	}
}

impl TryFrom<i64> for Capacity {
	type Error = CacheError;

	fn try_from(max_size: i64) -> Result<Self, Self::Error> {
		if max_size < 0 {
			return Err(CacheError::InvalidCapacity(max_size));
		}
		Ok(Capacity::from(usize::try_from(max_size).unwrap_or(usize::MAX)))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub inserts: u64,
	pub evictions: u64,
	pub current_size: usize,
	pub max_size: usize,
}

pub struct RecencyCache<K, C = SystemClock> {
	entries: HashMap<K, DateTime<Utc>>,
	capacity: Capacity,
	clock: C,
	hits: u64,
	misses: u64,
	inserts: u64,
	evictions: u64,
}

impl<K, C> RecencyCache<K, C>
where
	K: Hash + Eq + Clone,
	C: Clock,
{
	pub fn with_clock(capacity: Capacity, clock: C) -> Self {
		Self {
			entries: HashMap::new(),
			capacity,
			clock,
			hits: 0,
			misses: 0,
			inserts: 0,
			evictions: 0,
		}
	}

	/// Seeds the cache without touching the counters. Seeding more entries than fit keeps the newest ones.
	pub fn with_entries(
		capacity: Capacity,
		clock: C,
		entries: impl IntoIterator<Item = (K, DateTime<Utc>)>,
	) -> Self {
		let mut cache = Self::with_clock(capacity, clock);
		for (key, last_seen) in entries {
			cache.insert(key, last_seen);
		}
		cache
	}

	/// Marks `key` as seen now.
	pub fn set(&mut self, key: K) {
		let now = self.clock.now();
		self.set_at(key, now);
	}

	pub fn set_at(&mut self, key: K, last_seen: DateTime<Utc>) {
		self.inserts += 1;
		if self.insert(key, last_seen) {
			self.evictions += 1;
		}
	}

	/// Returns the stored timestamp as it was before this lookup, then refreshes it to now.
	pub fn get(&mut self, key: &K) -> Result<DateTime<Utc>, CacheError> {
		let now = self.clock.now();
		match self.entries.get_mut(key) {
			Some(last_seen) => {
				self.hits += 1;
				Ok(std::mem::replace(last_seen, now))
			}
			None => {
				self.misses += 1;
				Err(CacheError::KeyNotFound)
			}
		}
	}

	/// Linear scan for the first key whose hash matches the probe's hash.
	///
	/// This is not a map lookup: it is O(n), and two different keys can share a hash.
	/// It exists for finding a key from a value that hashes the same way but is a different type.
	pub fn find_by_equivalent_hash<Q>(&self, probe: &Q) -> Option<&K>
	where
		Q: Hash + ?Sized,
	{
		let hasher = self.entries.hasher();
		let target = hasher.hash_one(probe);
		self.entries
			.keys()
			.find(|key| hasher.hash_one(*key) == target)
	}

	#[cfg(test)]
	pub fn contains_key(&self, key: &K) -> bool {
		self.entries.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> Capacity {
		self.capacity
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.hits,
			misses: self.misses,
			inserts: self.inserts,
			evictions: self.evictions,
			current_size: self.entries.len(),
			max_size: self.capacity.max_size(),
		}
	}

	/// Returns whether another entry was evicted to make room.
	fn insert(&mut self, key: K, last_seen: DateTime<Utc>) -> bool {
		let must_evict = match self.capacity {
			Capacity::Unbounded => false,
			Capacity::Bounded(max) => {
				self.entries.len() >= max.get() && !self.entries.contains_key(&key)
			}
		};
		let evicted = must_evict && self.evict_stalest();
		self.entries.insert(key, last_seen);
		evicted
	}

	/// Ties go to whichever stalest entry the map yields first.
	fn evict_stalest(&mut self) -> bool {
		let stalest = self
			.entries
			.iter()
			.min_by_key(|(_, last_seen)| **last_seen)
			.map(|(key, _)| key.clone());
		match stalest {
			Some(key) => self.entries.remove(&key).is_some(),
			None => false,
		}
	}
}
