//! Per-mode storage format descriptors.
//!
//! The expression layer treats formats opaquely except for two questions:
//! does the layout admit in-place accumulation, and in what order are the
//! modes stored (the transposition check compares mode orders).

use std::fmt;

use crate::error::{FormatCharSnafu, Result};

/// Storage kind of a single tensor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeFormat {
    Dense,
    Sparse,
    /// Fixed number of nonzeros per slice.
    Fixed,
    Replicated,
}

impl ModeFormat {
    pub fn character(self) -> char {
        match self {
            Self::Dense => 'd',
            Self::Sparse => 's',
            Self::Fixed => 'f',
            Self::Replicated => 'r',
        }
    }
}

/// One storage kind per mode, plus the order modes are stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    modes: Vec<ModeFormat>,
    mode_order: Vec<usize>,
}

impl Format {
    /// Format with modes stored in index order.
    pub fn new(modes: Vec<ModeFormat>) -> Self {
        let mode_order = (0..modes.len()).collect();
        Self { modes, mode_order }
    }

    /// Format with an explicit storage order (a permutation of the modes).
    pub fn with_mode_order(modes: Vec<ModeFormat>, mode_order: Vec<usize>) -> Self {
        debug_assert_eq!(modes.len(), mode_order.len());
        debug_assert!((0..modes.len()).all(|mode| mode_order.contains(&mode)));
        Self { modes, mode_order }
    }

    /// The all-dense format of the given order.
    pub fn dense(order: usize) -> Self {
        Self::new(vec![ModeFormat::Dense; order])
    }

    /// Parse a format from one character per mode, outermost first:
    /// `d`ense, `s`parse, `f`ixed, `r`eplicated.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let mut modes = Vec::with_capacity(spec.len());
        for found in spec.chars() {
            let mode = match found {
                'd' => ModeFormat::Dense,
                's' => ModeFormat::Sparse,
                'f' => ModeFormat::Fixed,
                'r' => ModeFormat::Replicated,
                _ => return FormatCharSnafu { found }.fail(),
            };
            modes.push(mode);
        }
        Ok(Self::new(modes))
    }

    pub fn order(&self) -> usize {
        self.modes.len()
    }

    pub fn modes(&self) -> &[ModeFormat] {
        &self.modes
    }

    pub fn mode_order(&self) -> &[usize] {
        &self.mode_order
    }

    /// True iff every mode is dense; only then can `+=` accumulate into
    /// the result in place.
    pub fn admits_accumulation(&self) -> bool {
        self.modes.iter().all(|mode| matches!(mode, ModeFormat::Dense))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mode in &self.modes {
            write!(f, "{}", mode.character())?;
        }
        Ok(())
    }
}
