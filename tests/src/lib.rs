//! End-to-end checks across the workspace crates.

#[cfg(test)]
mod system_tests;
