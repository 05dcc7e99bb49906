//! Solver configuration.
use anyhow::Error;
use serde::Deserialize;

use losat_formula::Mode;

/// Configurable parameters used during solving.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Canonicalization mode for formulas entering the node table. (Default: flo)
    pub mode: Mode,

    /// Group clauses by length ascending before canonicalization. (Default: false)
    pub sort_by_size: bool,

    /// Pre-order clauses by (length, input position) before canonicalization. (Default: false)
    pub thief_method: bool,

    /// Stop all workers as soon as one satisfying assignment is found. (Default: false)
    pub exit_upon_solving: bool,

    /// Number of worker threads; 0 uses all hardware threads, 1 explores inline. (Default: 1)
    pub threads: usize,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            mode: Mode::Flo,
            sort_by_size: false,
            thief_method: false,
            exit_upon_solving: false,
            threads: 1,
        }
    }
}

impl SolverConfig {
    /// Apply a partial configuration update.
    pub fn apply(&mut self, update: &SolverConfigUpdate) -> Result<(), Error> {
        if let Some(mode) = &update.mode {
            self.mode = mode.parse()?;
        }
        if let Some(sort_by_size) = update.sort_by_size {
            self.sort_by_size = sort_by_size;
        }
        if let Some(thief_method) = update.thief_method {
            self.thief_method = thief_method;
        }
        if let Some(exit_upon_solving) = update.exit_upon_solving {
            self.exit_upon_solving = exit_upon_solving;
        }
        if let Some(threads) = update.threads {
            self.threads = threads;
        }
        Ok(())
    }

    /// The number of worker threads to launch.
    pub fn effective_threads(&self) -> usize {
        match self.threads {
            0 => num_cpus::get(),
            n => n,
        }
    }
}

/// A partial update of a [`SolverConfig`], e.g. parsed from a TOML config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfigUpdate {
    pub mode: Option<String>,
    pub sort_by_size: Option<bool>,
    pub thief_method: Option<bool>,
    pub exit_upon_solving: Option<bool>,
    pub threads: Option<usize>,
}

impl SolverConfigUpdate {
    pub fn new() -> SolverConfigUpdate {
        SolverConfigUpdate::default()
    }

    /// Merge another update into this one; fields set in `other` win.
    pub fn merge(&mut self, other: SolverConfigUpdate) {
        if other.mode.is_some() {
            self.mode = other.mode;
        }
        if other.sort_by_size.is_some() {
            self.sort_by_size = other.sort_by_size;
        }
        if other.thief_method.is_some() {
            self.thief_method = other.thief_method;
        }
        if other.exit_upon_solving.is_some() {
            self.exit_upon_solving = other.exit_upon_solving;
        }
        if other.threads.is_some() {
            self.threads = other.threads;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_apply_and_merge() {
        let mut config = SolverConfig::default();
        assert_eq!(config.mode, Mode::Flo);
        assert_eq!(config.threads, 1);

        let mut update = SolverConfigUpdate::new();
        update.mode = Some("flop".to_owned());
        update.threads = Some(4);

        let mut override_update = SolverConfigUpdate::new();
        override_update.threads = Some(2);
        update.merge(override_update);

        config.apply(&update).unwrap();
        assert_eq!(config.mode, Mode::Flop);
        assert_eq!(config.threads, 2);
        assert_eq!(config.effective_threads(), 2);

        let mut bad = SolverConfigUpdate::new();
        bad.mode = Some("fancy".to_owned());
        assert!(config.apply(&bad).is_err());
    }
}
