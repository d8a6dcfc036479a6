use std::convert::Infallible;

use burnup_core::{CompBundle, Cursor, RunLayout, Store, TransportResult};

/// Storage collaborator that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    layout: Option<RunLayout>,
    compositions: Vec<(Cursor, CompBundle)>,
    results: Vec<(Cursor, TransportResult)>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout of the most recent run.
    #[must_use]
    pub fn layout(&self) -> Option<&RunLayout> {
        self.layout.as_ref()
    }

    /// Compositions in the order they were written.
    #[must_use]
    pub fn compositions(&self) -> &[(Cursor, CompBundle)] {
        &self.compositions
    }

    /// Transport results in the order they were posted.
    #[must_use]
    pub fn results(&self) -> &[(Cursor, TransportResult)] {
        &self.results
    }

    #[must_use]
    pub fn last_compositions(&self) -> Option<&CompBundle> {
        self.compositions.last().map(|(_, comps)| comps)
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn before_main(&mut self, layout: &RunLayout) -> Result<(), Self::Error> {
        self.layout = Some(layout.clone());
        self.compositions.clear();
        self.results.clear();
        self.compositions.reserve(layout.transport_solves);
        self.results.reserve(layout.transport_solves);
        Ok(())
    }

    fn post_transport(
        &mut self,
        cursor: &Cursor,
        result: &TransportResult,
    ) -> Result<(), Self::Error> {
        self.results.push((*cursor, result.clone()));
        Ok(())
    }

    fn write_compositions(
        &mut self,
        cursor: &Cursor,
        compositions: &CompBundle,
    ) -> Result<(), Self::Error> {
        self.compositions.push((*cursor, compositions.clone()));
        Ok(())
    }
}
