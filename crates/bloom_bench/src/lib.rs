//! Criterion benchmarks for `bloom_core`; see `benches/`.
