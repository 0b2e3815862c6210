//! Run-time tunables for a compression/decompression pass.
//!
//! Grounded on `jafreck-lz4r/src/io/prefs.rs`'s `Prefs` struct: a plain
//! knob bag threaded from the CLI down into the pipeline, rather than a
//! global.

#[derive(Debug, Clone, Copy)]
pub struct Prefs {
    /// Minimum n-gram occurrence count to survive pruning (spec.md §4.6).
    pub count_cutoff: u64,
    /// Minimum n-gram weight (bytes saved estimate) to receive an
    /// abbreviation index (spec.md §4.7).
    pub weight_cutoff: u64,
    /// Longest n-gram path length the counting pass tracks.
    pub up_to_size: usize,
    /// Size of the abbreviation-assign writer's sliding buffer window.
    pub window: usize,
    /// Cap on how many abbreviation steps are emitted per selector
    /// invocation before the buffer is re-filled.
    pub pattern_length_limit: usize,
    /// Re-encode block length prefixes to their minimum width on write
    /// (spec.md §4.1, the `-m` flag).
    pub minimize_block_size: bool,
    /// Refuse to clobber an existing output file unless set.
    pub overwrite: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Prefs {
            count_cutoff: 4,
            weight_cutoff: 4,
            up_to_size: 4,
            window: 64,
            pattern_length_limit: 8,
            minimize_block_size: false,
            overwrite: false,
        }
    }
}

impl Prefs {
    pub fn compress_options(&self) -> crate::intcomp::CompressOptions {
        crate::intcomp::CompressOptions {
            count_cutoff: self.count_cutoff,
            weight_cutoff: self.weight_cutoff,
            up_to_size: self.up_to_size,
            window: self.window,
            pattern_length_limit: self.pattern_length_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_nontrivial() {
        let p = Prefs::default();
        assert!(p.count_cutoff > 0);
        assert!(p.up_to_size > 1);
    }
}
