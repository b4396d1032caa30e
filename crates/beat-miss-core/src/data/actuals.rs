use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Money, Percent, StatementType};

/// Reported results for one company, statement type and period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActualResult {
    pub net_sales: Option<Money>,
    pub ebitda: Option<Money>,
    /// PAT
    pub net_profit: Option<Money>,
    #[serde(alias = "ebitda_margin")]
    pub ebitda_margin_percent: Option<Percent>,
    #[serde(alias = "pat_margin")]
    pub pat_margin_percent: Option<Percent>,
}

/// All reported results of one company, keyed by statement type then period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyActuals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub statements: BTreeMap<StatementType, BTreeMap<String, ActualResult>>,
}

impl CompanyActuals {
    pub fn named(name: impl Into<String>) -> Self {
        CompanyActuals {
            name: Some(name.into()),
            statements: BTreeMap::new(),
        }
    }

    pub fn with_result(
        mut self,
        statement_type: StatementType,
        period: impl Into<String>,
        result: ActualResult,
    ) -> Self {
        self.statements
            .entry(statement_type)
            .or_default()
            .insert(period.into(), result);
        self
    }

    /// Strict lookup: never falls back to the other statement type.
    pub fn result(&self, statement_type: StatementType, period: &str) -> Option<&ActualResult> {
        self.statements.get(&statement_type)?.get(period)
    }

    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.statements
            .values()
            .flat_map(|by_period| by_period.keys().map(String::as_str))
    }
}

/// Actual results of every company, keyed by company identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActualsTable {
    companies: BTreeMap<String, CompanyActuals>,
}

impl ActualsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, company_id: impl Into<String>, actuals: CompanyActuals) {
        self.companies.insert(company_id.into(), actuals);
    }

    pub fn get(&self, company_id: &str) -> Option<&CompanyActuals> {
        self.companies.get(company_id)
    }

    pub(crate) fn get_key_value(&self, company_id: &str) -> Option<(&String, &CompanyActuals)> {
        self.companies.get_key_value(company_id)
    }

    /// Display name, falling back to the identifier itself.
    pub fn display_name<'a>(&'a self, company_id: &'a str) -> &'a str {
        self.companies
            .get(company_id)
            .and_then(|c| c.name.as_deref())
            .unwrap_or(company_id)
    }

    /// Identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.companies.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompanyActuals)> {
        self.companies.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

impl FromIterator<(String, CompanyActuals)> for ActualsTable {
    fn from_iter<I: IntoIterator<Item = (String, CompanyActuals)>>(iter: I) -> Self {
        ActualsTable {
            companies: iter.into_iter().collect(),
        }
    }
}
