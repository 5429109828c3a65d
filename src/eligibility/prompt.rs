//! Prompt construction and response parsing for geographic eligibility.
//!
//! The reasoner answers with one JSON object keyed by company id. Only this module looks at
//! raw provider text; everything downstream sees [`GeoMatch`].

use std::collections::HashMap;

use serde_json::Value;

use super::error::ReasonerError;
use crate::model::CompanyId;

/// First-level administrative regions listed in every prompt.
pub const NUTS2_REGIONS: &[&str] = &[
    "Norte", "Centro", "Lisboa", "Alentejo", "Algarve", "Açores", "Madeira",
];

/// Whole requirements, after [`fold`], that place no restriction inside the country.
const NATIONAL_PHRASES: &[&str] = &[
    "national",
    "nacional",
    "nationwide",
    "portugal",
    "todo o pais",
    "todo o territorio nacional",
    "territorio nacional",
    "ambito nacional",
    "all regions",
    "todas as regioes",
];

/// Reasoner classification of one address against the requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoMatch {
    Inside { rationale: String },
    Partial { rationale: String },
    Outside { rationale: String },
    Ambiguous { rationale: String },
}

/// Lowercases and strips Portuguese diacritics and punctuation.
pub fn fold(text: &str) -> String {
    let folded: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns `true` if the whole requirement is a national marker.
///
/// Names that merely contain "nacional" (a national park, a national network of a region)
/// are not markers. An empty requirement is not one either.
pub fn is_national_requirement(requirement: &str) -> bool {
    NATIONAL_PHRASES.contains(&fold(requirement).as_str())
}

/// Builds the eligibility prompt for one batch of `(company id, address)` lines.
pub fn build_prompt(requirement: &str, country: &str, locations: &[(CompanyId, &str)]) -> String {
    let companies = locations
        .iter()
        .map(|(id, address)| format!("{}: {}", id, address))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Decide whether each company address lies inside the required area of {country}.\n\
         \n\
         Required area: {requirement}\n\
         First-level regions (NUTS II): {regions}\n\
         A city or municipality counts as inside a region when it lies within that region.\n\
         When the requirement names a municipality, only an exact or containing match is inside.\n\
         Use \"partial\" when the address only partially overlaps the area and \"ambiguous\" when \
         the place name could belong to more than one region.\n\
         \n\
         Companies (id: address):\n\
         {companies}\n\
         \n\
         Return JSON only, one entry per id:\n\
         {{\"<id>\": {{\"match\": \"inside\" | \"partial\" | \"outside\" | \"ambiguous\", \
         \"rationale\": \"<short reason>\"}}}}\n",
        country = country,
        requirement = requirement.trim(),
        regions = NUTS2_REGIONS.join(", "),
        companies = companies,
    )
}

/// Extracts the JSON object between the first `{` and the last `}` and reads one
/// [`GeoMatch`] per company id. Entries that are not understood are skipped.
pub fn parse_response(text: &str) -> Result<HashMap<CompanyId, GeoMatch>, ReasonerError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(ReasonerError::InvalidResponse {
            reason: "no JSON object in response".to_string(),
        });
    };
    if end < start {
        return Err(ReasonerError::InvalidResponse {
            reason: "unbalanced JSON object".to_string(),
        });
    }

    let value: Value =
        serde_json::from_str(&text[start..=end]).map_err(|e| ReasonerError::InvalidResponse {
            reason: e.to_string(),
        })?;
    let Value::Object(entries) = value else {
        return Err(ReasonerError::InvalidResponse {
            reason: "top-level value is not an object".to_string(),
        });
    };

    let mut matches = HashMap::with_capacity(entries.len());
    for (key, entry) in entries {
        let Some(company_id) = parse_company_key(&key) else {
            continue;
        };
        if let Some(geo) = parse_entry(&entry) {
            matches.insert(company_id, geo);
        }
    }
    Ok(matches)
}

fn parse_company_key(key: &str) -> Option<CompanyId> {
    let key = key.trim();
    let digits = key
        .strip_prefix("Company ")
        .or_else(|| key.strip_prefix("company "))
        .unwrap_or(key);
    digits.trim().parse().ok()
}

fn parse_entry(entry: &Value) -> Option<GeoMatch> {
    match entry {
        Value::Bool(true) => Some(GeoMatch::Inside {
            rationale: String::new(),
        }),
        Value::Bool(false) => Some(GeoMatch::Outside {
            rationale: String::new(),
        }),
        Value::String(label) => classify(label, String::new()),
        Value::Object(fields) => {
            let rationale = fields
                .get("rationale")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            match fields.get("match") {
                Some(Value::String(label)) => classify(label, rationale),
                Some(Value::Bool(true)) => Some(GeoMatch::Inside { rationale }),
                Some(Value::Bool(false)) => Some(GeoMatch::Outside { rationale }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn classify(label: &str, rationale: String) -> Option<GeoMatch> {
    match fold(label).as_str() {
        "inside" | "true" | "yes" => Some(GeoMatch::Inside { rationale }),
        "partial" => Some(GeoMatch::Partial { rationale }),
        "outside" | "false" | "no" => Some(GeoMatch::Outside { rationale }),
        "ambiguous" => Some(GeoMatch::Ambiguous { rationale }),
        _ => None,
    }
}
