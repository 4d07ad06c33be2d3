//! Record ↔ registry join.
//!
//! Each record's institution name is resolved independently against the
//! read-only registry (in parallel), then results are folded in input order:
//!
//! - no institution name: the record is skipped (neither matched nor reported),
//! - match: the registry id is attached under the foreign-key field,
//! - no match: the raw name goes into the unmatched report, once per name.

use crate::matcher::{FuzzyMatcher, MatchResult};
use crate::registry::Registry;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    /// JSON pointer to the free-text institution name inside a record.
    pub institution_pointer: String,
    /// Field added to matched records holding the registry id.
    pub foreign_key: String,
    /// Top-level field of the joined document holding the matched records.
    pub output_field: String,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            institution_pointer: "/institution/title".to_string(),
            foreign_key: "universityId".to_string(),
            output_field: "courses".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOutcome {
    /// Matched records (input order), each carrying the foreign key.
    pub matched: Vec<Value>,
    /// Distinct unmatched institution names, sorted.
    pub unmatched: Vec<String>,
    /// Records without an institution name.
    pub skipped: usize,
}

impl JoinOutcome {
    /// The joined document: `{ "<output_field>": [matched...] }`.
    pub fn to_document(&self, output_field: &str) -> Value {
        let mut doc = Map::new();
        doc.insert(output_field.to_string(), Value::Array(self.matched.clone()));
        Value::Object(doc)
    }
}

enum Resolution {
    Skipped,
    Matched(Value),
    Unmatched(String),
}

pub struct EntityJoiner<'r> {
    matcher: FuzzyMatcher<'r>,
    options: JoinOptions,
}

impl<'r> EntityJoiner<'r> {
    pub fn new(registry: &'r Registry, options: JoinOptions) -> Self {
        Self {
            matcher: FuzzyMatcher::new(registry),
            options,
        }
    }

    pub fn options(&self) -> &JoinOptions {
        &self.options
    }

    /// Free-text institution name of a record, if it has a non-blank one.
    pub fn institution_name<'v>(&self, record: &'v Value) -> Option<&'v str> {
        record
            .pointer(&self.options.institution_pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn join(&self, records: &[Value]) -> JoinOutcome {
        let resolutions: Vec<Resolution> = records.par_iter().map(|r| self.resolve(r)).collect();

        let mut outcome = JoinOutcome::default();
        let mut unmatched = BTreeSet::new();
        for res in resolutions {
            match res {
                Resolution::Skipped => outcome.skipped += 1,
                Resolution::Matched(record) => outcome.matched.push(record),
                Resolution::Unmatched(name) => {
                    unmatched.insert(name);
                }
            }
        }
        outcome.unmatched = unmatched.into_iter().collect();

        tracing::info!(
            records = records.len(),
            matched = outcome.matched.len(),
            unmatched_names = outcome.unmatched.len(),
            skipped = outcome.skipped,
            "join finished"
        );
        outcome
    }

    fn resolve(&self, record: &Value) -> Resolution {
        let Some(name) = self.institution_name(record) else {
            return Resolution::Skipped;
        };
        match self.matcher.resolve(name) {
            MatchResult::Matched(entry) => {
                let mut joined = record.clone();
                if let Value::Object(map) = &mut joined {
                    map.insert(self.options.foreign_key.clone(), entry.id.clone().into());
                }
                Resolution::Matched(joined)
            }
            MatchResult::Unmatched { name } => Resolution::Unmatched(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryEntry;
    use serde_json::json;

    fn course(id: &str, institution: Option<&str>) -> Value {
        match institution {
            Some(t) => json!({"id": id, "institution": {"title": t}}),
            None => json!({"id": id}),
        }
    }

    fn warsaw_registry() -> Registry {
        Registry::new(vec![RegistryEntry::new(1, "University of Warsaw")]).unwrap()
    }

    #[test]
    fn attaches_foreign_key_on_match() {
        let reg = warsaw_registry();
        let out = EntityJoiner::new(&reg, JoinOptions::default())
            .join(&[course("c1", Some("Warsaw University"))]);
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0]["universityId"], 1);
        assert_eq!(out.matched[0]["id"], "c1");
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn records_without_institution_are_skipped_entirely() {
        let reg = warsaw_registry();
        let records = vec![
            course("a", None),
            json!({"id": "b", "institution": {}}),
            json!({"id": "c", "institution": {"title": ""}}),
            json!({"id": "d", "institution": {"title": "   "}}),
            json!({"id": "e", "institution": {"title": 12}}),
        ];
        let out = EntityJoiner::new(&reg, JoinOptions::default()).join(&records);
        assert_eq!(out.skipped, 5);
        assert!(out.matched.is_empty());
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn unmatched_names_are_distinct_and_sorted() {
        let reg = warsaw_registry();
        let records = vec![
            course("1", Some("Zeta Academy")),
            course("2", Some("Alpha Institute")),
            course("3", Some("Zeta Academy")),
            course("4", Some("University of Warsaw")),
        ];
        let out = EntityJoiner::new(&reg, JoinOptions::default()).join(&records);
        assert_eq!(out.unmatched, vec!["Alpha Institute", "Zeta Academy"]);
        assert_eq!(out.matched.len(), 1);
    }

    #[test]
    fn matched_records_keep_input_order() {
        let reg = warsaw_registry();
        let records: Vec<Value> = (0..200)
            .map(|i| course(&format!("c{i}"), Some("Warsaw University")))
            .collect();
        let out = EntityJoiner::new(&reg, JoinOptions::default()).join(&records);
        let ids: Vec<&str> = out.matched.iter().map(|r| r["id"].as_str().unwrap()).collect();
        let expected: Vec<String> = (0..200).map(|i| format!("c{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn custom_fields_and_document_shape() {
        let reg = Registry::new(vec![RegistryEntry::new("uw", "University of Warsaw")]).unwrap();
        let opts = JoinOptions {
            institution_pointer: "/school".to_string(),
            foreign_key: "schoolId".to_string(),
            output_field: "programs".to_string(),
        };
        let out = EntityJoiner::new(&reg, opts).join(&[json!({"id": 1, "school": "Warsaw"})]);
        assert_eq!(
            out.to_document("programs"),
            json!({"programs": [{"id": 1, "school": "Warsaw", "schoolId": "uw"}]})
        );
    }
}
