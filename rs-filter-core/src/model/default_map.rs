use std::collections::HashMap;
use std::collections::hash_map::Iter;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Zero-argument producer of default values.
pub type DefaultProducer<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// A map that answers lookups of absent keys with a produced default.
///
/// Unlike `HashMap::entry(..).or_insert_with(..)`, reading a missing key does
/// **not** store the produced value. Only `put` (and `get_or_insert`) add keys,
/// so `size` counts explicitly stored entries exclusively.
///
/// # Invariants
/// - `size()` equals the number of keys passed to `put` / `get_or_insert`
/// - The default producer is never called for stored keys
pub struct DefaultMap<K, V> {
	/// Called on every lookup of an absent key.
	default: DefaultProducer<V>,
	/// Explicitly stored values.
	values: HashMap<K, V>,
}

impl<K, V> DefaultMap<K, V>
where
	K: Eq + Hash,
{
	/// Creates an empty map using `default` for absent keys.
	pub fn new<F>(default: F) -> Self
	where
		F: Fn() -> V + Send + Sync + 'static,
	{
		Self {
			default: Arc::new(default),
			values: HashMap::new(),
		}
	}

	/// Stores `value` under `key`, overwriting any previous value.
	pub fn put(&mut self, key: K, value: V) {
		self.values.insert(key, value);
	}

	/// Returns the stored value for `key`, if any.
	///
	/// Does not consult the default producer.
	pub fn get_stored<Q>(&self, key: &Q) -> Option<&V>
	where
		K: std::borrow::Borrow<Q>,
		Q: Eq + Hash + ?Sized,
	{
		self.values.get(key)
	}

	/// Returns the stored value for `key`, storing a produced default first
	/// if the key is absent.
	pub fn get_or_insert(&mut self, key: K) -> &mut V {
		let default = &self.default;
		self.values.entry(key).or_insert_with(|| default())
	}

	/// Produces a fresh default value, as returned for absent keys.
	pub fn produce_default(&self) -> V {
		(self.default)()
	}

	/// Number of explicitly stored keys.
	pub fn size(&self) -> usize {
		self.values.len()
	}

	/// Iterates over stored entries only.
	pub fn iter(&self) -> Iter<'_, K, V> {
		self.values.iter()
	}
}

impl<K, V> DefaultMap<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	/// Returns the stored value for `key`, or a produced default.
	///
	/// The produced default is not stored.
	pub fn get<Q>(&self, key: &Q) -> V
	where
		K: std::borrow::Borrow<Q>,
		Q: Eq + Hash + ?Sized,
	{
		match self.values.get(key) {
			Some(value) => value.clone(),
			None => (self.default)(),
		}
	}
}

impl<K: Clone, V: Clone> Clone for DefaultMap<K, V> {
	fn clone(&self) -> Self {
		Self {
			default: Arc::clone(&self.default),
			values: self.values.clone(),
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DefaultMap<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DefaultMap").field("values", &self.values).finish_non_exhaustive()
	}
}
