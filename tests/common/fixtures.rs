//! Test fixtures for pipeline integration tests.

use std::sync::Arc;
use std::time::Duration;

use fundmatch::eligibility::{EligibilityFilter, MockReasoner};
use fundmatch::embedding::QueryEncoder;
use fundmatch::expansion::{ExpansionConfig, ExpansionController};
use fundmatch::location::{
    LocationCache, LocationResolver, MemoryLocationCache, MockBehavior, MockGeocoder,
};
use fundmatch::model::{Company, Incentive};
use fundmatch::pipeline::{InMemoryCompanyDirectory, MatchingPipeline};
use fundmatch::results::MemoryResultStore;
use fundmatch::retrieval::CandidateRetriever;
use fundmatch::scoring::{CompanyScorer, SemanticReranker};
use fundmatch::vectordb::MockVectorDbClient;

pub const COLLECTION: &str = "companies";

pub const PROVIDER_TIMEOUT: Duration = Duration::from_millis(150);

/// Cities the region-aware reasoner places in each region.
pub const NORTE_CITIES: &[&str] = &["Porto", "Braga", "Guimaraes", "Viana do Castelo"];

pub fn company(id: u64) -> Company {
    Company {
        id,
        name: format!("Metalomecanica {} Lda", id),
        classification: "25110 Fabricacao de estruturas metalicas".to_string(),
        activities: "Fabricacao de estruturas metalicas e serralharia".to_string(),
        website: (id % 2 == 0).then(|| format!("https://metal{}.pt", id)),
        address_hint: None,
    }
}

pub fn incentive(id: u64, geo_requirement: &str) -> Incentive {
    Incentive {
        id,
        title: "Apoio a PME industriais".to_string(),
        sector: "Metalomecanica estruturas metalicas".to_string(),
        description: Some("Modernizacao de unidades de fabricacao metalica".to_string()),
        geo_requirement: geo_requirement.to_string(),
        eligible_actions: vec!["Aquisicao de equipamentos".to_string()],
        total_budget: Some(500_000.0),
    }
}

/// Answers `inside` for every prompt line whose address mentions one of `cities`.
pub fn region_reasoner(cities: &'static [&'static str]) -> MockReasoner {
    MockReasoner::from_fn(move |prompt| {
        let entries: Vec<String> = prompt
            .lines()
            .filter_map(|line| {
                let (id, address) = line.split_once(": ")?;
                let id: u64 = id.trim().parse().ok()?;
                let label = if cities.iter().any(|c| address.contains(c)) {
                    "inside"
                } else {
                    "outside"
                };
                Some(format!(
                    "\"{}\": {{\"match\": \"{}\", \"rationale\": \"{}\"}}",
                    id, label, address
                ))
            })
            .collect();
        Ok(format!("{{{}}}", entries.join(", ")))
    })
}

/// A pipeline wired to in-memory collaborators.
pub struct Harness {
    pub index: Arc<MockVectorDbClient>,
    pub geocoder: Arc<MockGeocoder>,
    pub reasoner: Arc<MockReasoner>,
    pub cache: Arc<dyn LocationCache>,
    pub store: Arc<MemoryResultStore>,
    pub resolver: Arc<LocationResolver>,
    pub pipeline: Arc<MatchingPipeline<MockVectorDbClient>>,
}

pub struct HarnessBuilder {
    companies: Vec<(Company, f32, MockBehavior)>,
    reasoner: MockReasoner,
    cache: Arc<dyn LocationCache>,
    expansion: ExpansionConfig,
}

impl HarnessBuilder {
    pub fn new(reasoner: MockReasoner) -> Self {
        Self {
            companies: Vec::new(),
            reasoner,
            cache: Arc::new(MemoryLocationCache::new()),
            expansion: ExpansionConfig::default(),
        }
    }

    /// Adds a company with a fixed retrieval similarity and geocoding behavior.
    pub fn company(mut self, company: Company, similarity: f32, behavior: MockBehavior) -> Self {
        self.companies.push((company, similarity, behavior));
        self
    }

    /// Adds `count` companies with ids starting at `first_id`, descending similarity, all
    /// geocoded to `city`.
    pub fn companies_in(mut self, first_id: u64, count: u64, city: &str) -> Self {
        for id in first_id..first_id + count {
            let similarity = 0.99 - (id as f32) * 0.001;
            self.companies.push((
                company(id),
                similarity,
                MockBehavior::found(format!("Rua {}, {}", id, city)),
            ));
        }
        self
    }

    pub fn cache(mut self, cache: Arc<dyn LocationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn build(self) -> Harness {
        let index = Arc::new(MockVectorDbClient::new());
        let geocoder = Arc::new(MockGeocoder::new());
        let mut directory = Vec::with_capacity(self.companies.len());
        for (company, similarity, behavior) in self.companies {
            index.insert_scored(COLLECTION, company.id, similarity);
            geocoder.set(company.id, behavior);
            directory.push(company);
        }

        let reasoner = Arc::new(self.reasoner);
        let store = Arc::new(MemoryResultStore::new());
        let resolver = Arc::new(LocationResolver::new(
            self.cache.clone(),
            geocoder.clone(),
            "Portugal",
            PROVIDER_TIMEOUT,
            8,
        ));

        let pipeline = MatchingPipeline::new(
            CandidateRetriever::new(Arc::new(QueryEncoder::stub()), index.clone(), COLLECTION),
            resolver.clone(),
            EligibilityFilter::new(reasoner.clone(), "Portugal", PROVIDER_TIMEOUT),
            ExpansionController::new(self.expansion).expect("valid expansion config"),
            SemanticReranker::stub().expect("stub reranker"),
            CompanyScorer::new(5),
            Arc::new(InMemoryCompanyDirectory::new(directory)),
            store.clone(),
        );

        Harness {
            index,
            geocoder,
            reasoner,
            cache: self.cache,
            store,
            resolver,
            pipeline: Arc::new(pipeline),
        }
    }
}
