//! Progress reporting hook. Purely observational.

/// Which pass is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pass 1 of encoding: counting byte frequencies.
    Scan,
    /// Pass 2 of encoding: packing codes.
    Pack,
    /// Decoding. Counts encoded bytes, header included.
    Unpack,
}

pub trait Progress {
    /// Called after every chunk with the input bytes consumed so far in `stage`.
    fn advance(&mut self, stage: Stage, processed: u64);
}

impl<F: FnMut(Stage, u64)> Progress for F {
    fn advance(&mut self, stage: Stage, processed: u64) {
        self(stage, processed)
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&mut self, _stage: Stage, _processed: u64) {}
}
