//! Benchmark utilities for herald.
//!
//! This crate provides benchmarking infrastructure for event dispatch, including:
//!
//! - **Microbenchmarks**: registration, inline raise, disposal, subset raise
//! - **Scenario benchmarks**: subscriber churn with dropping targets, offloaded delivery
//! - **Memory tracking**: per-handler heap cost by shape and delivery, via dhat
//! - **Raise profiling**: steady raises timed apart from raises that sweep dead entries
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p herald_bench
//!
//! # Run specific benchmark group
//! cargo bench -p herald_bench -- raise
//!
//! # Run with memory profiling (slower)
//! cargo bench -p herald_bench --features memory_profiling
//! ```
//!
//! # Benchmark Results
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.
//! Memory profiling results are written to `dhat-heap.json` for viewing with
//! DHAT's viewer.

pub mod churn;
pub mod listeners;
pub mod memory;
pub mod raise_profile;
