//! The KQML-facing DTDA agent.
//!
//! Tasks and reply contents:
//!
//! | Task                   | Arguments            | Success content                          |
//! |------------------------|----------------------|------------------------------------------|
//! | `IS-DRUG-TARGET`       | `:drug`, `:target`   | `(SUCCESS :is-target TRUE\|FALSE)`       |
//! | `FIND-TARGET-DRUG`     | `:target`            | `(SUCCESS :drugs ((:name N :pubchem-id C)...))` |
//! | `FIND-DRUG-TARGETS`    | `:drug`              | `(SUCCESS :targets ((:name T)...))`      |
//! | `FIND-DISEASE-TARGETS` | `:disease`           | `(SUCCESS :protein (:name G) :prevalence "NN")` |
//! | `FIND-TREATMENT`       | `:disease`           | disease targets plus `:drugs` for the top gene |
//!
//! Term arguments are KQML lists carrying `:name` (a bare token or string
//! is also accepted). Failure reasons: `MISSING_DRUG`, `MISSING_TARGET`,
//! `MISSING_DISEASE`, `DRUG_NOT_FOUND`, `DISEASE_NOT_FOUND`,
//! `NO_TARGET_FOUND`.

use tracing::debug;

use bioagents::agent::{Bioagent, ReplyContext, TaskError};
use bioagents_kqml::{KqmlList, KqmlValue};

use crate::dtda::{Dtda, DtdaError, DrugEntry};

const TASKS: &[&str] = &[
    "IS-DRUG-TARGET",
    "FIND-TARGET-DRUG",
    "FIND-DRUG-TARGETS",
    "FIND-DISEASE-TARGETS",
    "FIND-TREATMENT",
];

/// Disease-target-drug agent.
pub struct DtdaAgent {
    dtda: Dtda,
}

impl DtdaAgent {
    pub fn new(dtda: Dtda) -> Self {
        Self { dtda }
    }

    fn respond_is_drug_target(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let drug = term_name(content, "drug").ok_or_else(|| TaskError::failure("MISSING_DRUG"))?;
        let target =
            term_name(content, "target").ok_or_else(|| TaskError::failure("MISSING_TARGET"))?;
        let is_target = self
            .dtda
            .is_nominal_drug_target(&[drug.as_str()], &target)
            .map_err(|_| TaskError::failure("DRUG_NOT_FOUND"))?;
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("is-target", bool_token(is_target));
        Ok(msg)
    }

    fn respond_find_target_drug(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let target =
            term_name(content, "target").ok_or_else(|| TaskError::failure("MISSING_TARGET"))?;
        let drugs = self.dtda.find_target_drugs(&target);
        debug!("found {} drugs for target {target}", drugs.len());
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("drugs", drug_list(&drugs));
        Ok(msg)
    }

    fn respond_find_drug_targets(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let drug = term_name(content, "drug").ok_or_else(|| TaskError::failure("MISSING_DRUG"))?;
        let targets = self.dtda.find_drug_targets(&drug);
        let mut list = KqmlList::new();
        for target in targets {
            let mut entry = KqmlList::new();
            entry.sets("name", target);
            list.push(entry);
        }
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("targets", list);
        Ok(msg)
    }

    fn top_disease_target(&self, content: &KqmlList) -> Result<(String, u32), TaskError> {
        let disease =
            term_name(content, "disease").ok_or_else(|| TaskError::failure("MISSING_DISEASE"))?;
        let top = self.dtda.top_mutation(&disease).map_err(|e| match e {
            DtdaError::DiseaseNotFound(name) => {
                TaskError::failure_with("DISEASE_NOT_FOUND", format!("unknown disease '{name}'"))
            }
            DtdaError::DrugNotFound => TaskError::failure("DRUG_NOT_FOUND"),
        })?;
        top.ok_or_else(|| TaskError::failure("NO_TARGET_FOUND"))
    }

    fn respond_find_disease_targets(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let (gene, percent) = self.top_disease_target(content)?;
        let mut protein = KqmlList::new();
        protein.sets("name", gene);
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("protein", protein);
        msg.sets("prevalence", percent.to_string());
        Ok(msg)
    }

    fn respond_find_treatment(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let (gene, percent) = self.top_disease_target(content)?;
        let drugs = self.dtda.find_target_drugs(&gene);
        if drugs.is_empty() {
            return Err(TaskError::failure_with(
                "DRUG_NOT_FOUND",
                format!("no drugs target {gene}"),
            ));
        }
        let mut protein = KqmlList::new();
        protein.sets("name", gene);
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("protein", protein);
        msg.sets("prevalence", percent.to_string());
        msg.set("drugs", drug_list(&drugs));
        Ok(msg)
    }
}

impl Bioagent for DtdaAgent {
    fn name(&self) -> &str {
        "DTDA"
    }

    fn tasks(&self) -> &[&str] {
        TASKS
    }

    fn handle_task(
        &mut self,
        task: &str,
        content: &KqmlList,
        _cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError> {
        match task {
            "IS-DRUG-TARGET" => self.respond_is_drug_target(content),
            "FIND-TARGET-DRUG" => self.respond_find_target_drug(content),
            "FIND-DRUG-TARGETS" => self.respond_find_drug_targets(content),
            "FIND-DISEASE-TARGETS" => self.respond_find_disease_targets(content),
            "FIND-TREATMENT" => self.respond_find_treatment(content),
            other => Err(TaskError::Internal(format!("unhandled task {other}"))),
        }
    }
}

/// Extract a term's name: `(:name X ...)`, or a bare token/string.
fn term_name(content: &KqmlList, key: &str) -> Option<String> {
    match content.get(key)? {
        KqmlValue::List(term) => term.gets("name").map(str::to_string),
        other => other.text().map(str::to_string),
    }
    .filter(|name| !name.is_empty())
}

fn bool_token(value: bool) -> KqmlValue {
    KqmlValue::token(if value { "TRUE" } else { "FALSE" })
}

fn drug_list(drugs: &[&DrugEntry]) -> KqmlList {
    let mut list = KqmlList::new();
    for drug in drugs {
        let mut entry = KqmlList::new();
        entry.sets("name", drug.name.clone());
        if let Some(cid) = &drug.pubchem_id {
            entry.set("pubchem-id", KqmlValue::token(cid.clone()));
        }
        list.push(entry);
    }
    list
}
