use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::error::PipelineError;
use crate::model::{Company, CompanyId, Incentive};

#[async_trait]
/// Lookup of company records by id. Unknown ids are absent from the returned map.
pub trait CompanyDirectory: Send + Sync {
    async fn companies(&self, ids: &[CompanyId]) -> HashMap<CompanyId, Company>;
}

/// Directory held fully in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCompanyDirectory {
    companies: HashMap<CompanyId, Company>,
}

impl InMemoryCompanyDirectory {
    pub fn new(companies: impl IntoIterator<Item = Company>) -> Self {
        Self {
            companies: companies.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Loads a JSON array of companies.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let companies: Vec<Company> = read_json(path)?;
        Ok(Self::new(companies))
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn get(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryCompanyDirectory {
    async fn companies(&self, ids: &[CompanyId]) -> HashMap<CompanyId, Company> {
        ids.iter()
            .filter_map(|id| self.companies.get(id).map(|c| (*id, c.clone())))
            .collect()
    }
}

/// Loads a JSON array of incentives.
pub fn load_incentives(path: &Path) -> Result<Vec<Incentive>, PipelineError> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| PipelineError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
