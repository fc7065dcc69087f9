//! Accumulating diagnostics sink shared by all semantic passes

use log::debug;

use crate::utils::{Error, ErrorKind};

/// Append-only list of semantic errors, in report order
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. Never fails, never halts the analysis.
    pub fn report(&mut self, error: Error) {
        debug!("diagnostic {}: {}", error.kind().code(), error.render());
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    /// Number of errors of the given kind
    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.errors
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
