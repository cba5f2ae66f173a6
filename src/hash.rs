//! Hash map used for positions and LP share balances.
//!
//! Picks FxHash with `rustc-hash`, aHash with `ahash`, and the std SipHash
//! map otherwise. `std-hash` or enabling both hashers falls back to std.

#[cfg(all(feature = "rustc-hash", not(feature = "ahash"), not(feature = "std-hash")))]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(feature = "ahash", not(feature = "rustc-hash"), not(feature = "std-hash")))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(not(any(
    all(feature = "rustc-hash", not(feature = "ahash"), not(feature = "std-hash")),
    all(feature = "ahash", not(feature = "rustc-hash"), not(feature = "std-hash")),
)))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
