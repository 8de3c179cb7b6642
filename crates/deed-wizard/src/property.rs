//! Property stage: enrichment, disambiguation and user amendments

use property_search::PropertyEnrichmentClient;
use shared_types::{EnrichmentOutcome, NormalizedAddress, PropertyRecord};
use tracing::{info, warn};
use validation_engine::SearchRequest;

use crate::error::WizardError;
use crate::machine::WizardStateMachine;
use crate::session::PropertyAmendment;

impl WizardStateMachine {
    /// Enrich an explicitly selected address.
    ///
    /// The search is validated first and a rejected search never reaches the
    /// title source. Only `Error` outcomes are retried, up to `attempts`
    /// tries, with `on_attempt(attempt, max)` called before each one. Once a
    /// record exists for this address, enriching it again is refused.
    pub async fn enrich_with_progress<F>(
        &mut self,
        client: &PropertyEnrichmentClient,
        address: NormalizedAddress,
        attempts: u32,
        mut on_attempt: F,
    ) -> Result<&EnrichmentOutcome, WizardError>
    where
        F: FnMut(u32, u32) + Send,
    {
        let search = SearchRequest {
            address: address.full_address.clone(),
            county: Some(address.county.clone()).filter(|c| !c.trim().is_empty()),
        };
        let report = self.engine.validate_search_request(&search);
        if !report.is_valid {
            warn!(address = %address.full_address, "Search rejected before enrichment");
            return Err(WizardError::SearchRejected(report));
        }

        let same_address = self.session.selected_address.as_ref() == Some(&address);
        if same_address && self.session.property_record.is_some() {
            return Err(WizardError::AlreadyEnriched);
        }
        if !same_address {
            self.session.property_record = None;
            self.session.document_suggestion = None;
            self.session.amendments = PropertyAmendment::default();
        }
        self.session.selected_address = Some(address.clone());
        self.session.enrichment = None;

        let max = attempts.max(1);
        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            on_attempt(attempt, max);
            let outcome = client.enrich(&address).await;
            match &outcome {
                EnrichmentOutcome::Error { reason } if attempt < max => {
                    warn!(attempt, max, %reason, "Enrichment failed, trying again");
                }
                _ => break outcome,
            }
        };

        if let Some(record) = outcome.record() {
            self.attach_record(record.clone());
        }
        Ok(&*self.session.enrichment.insert(outcome))
    }

    /// Resolve a pending multi-match by the user's choice
    pub fn choose_match(&mut self, index: usize) -> Result<&PropertyRecord, WizardError> {
        let pending = self
            .session
            .enrichment
            .as_ref()
            .ok_or(WizardError::Selection(property_search::SelectionError::NotMultiMatch))?;
        let resolved = property_search::resolve_multi_match(pending, index, chrono::Utc::now())?;
        let EnrichmentOutcome::Resolved { record } = &resolved else {
            return Err(WizardError::NoPropertyRecord);
        };
        info!(index, apn = %record.apn, "Multi-match candidate chosen");
        self.attach_record(record.clone());
        self.session.enrichment = Some(resolved);
        self.session
            .property_record
            .as_ref()
            .ok_or(WizardError::NoPropertyRecord)
    }

    /// Correct the APN or legal description of the enriched record
    pub fn amend_property(
        &mut self,
        apn: Option<String>,
        legal_description: Option<String>,
    ) -> Result<&PropertyRecord, WizardError> {
        let record = self
            .session
            .property_record
            .as_mut()
            .ok_or(WizardError::NoPropertyRecord)?;
        if apn.is_some() {
            self.session.amendments.apn = apn;
        }
        if legal_description.is_some() {
            self.session.amendments.legal_description = legal_description;
        }
        self.session.amendments.apply(record);
        Ok(&*record)
    }

    /// Attach a record directly, e.g. one resolved outside the wizard
    pub fn attach_property(&mut self, record: PropertyRecord) {
        self.session.selected_address = Some(record.address.clone());
        self.attach_record(record);
    }

    fn attach_record(&mut self, mut record: PropertyRecord) {
        if !self.session.amendments.is_empty() {
            self.session.amendments.apply(&mut record);
        }
        self.session.property_record = Some(record);
    }

    /// Wizard may leave the property stage only with a record
    pub fn has_property(&self) -> bool {
        self.session.property_record.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DocumentTypeRegistry;
    use deed_assistant::NoopTelemetry;
    use pretty_assertions::assert_eq;
    use property_search::mock::MockTitleSource;
    use property_search::{TitleMatch, TitleResponse};
    use std::sync::Arc;

    fn machine() -> WizardStateMachine {
        WizardStateMachine::new(
            Arc::new(DocumentTypeRegistry::standard()),
            Arc::new(NoopTelemetry),
        )
    }

    fn address(full: &str) -> NormalizedAddress {
        NormalizedAddress {
            full_address: full.into(),
            street: "123 Main St".into(),
            city: "Los Angeles".into(),
            state: "CA".into(),
            zip: "90210".into(),
            county: "Los Angeles".into(),
            external_place_id: "place-1".into(),
        }
    }

    fn title_match(apn: &str, owner: &str) -> TitleMatch {
        TitleMatch {
            apn: Some(apn.into()),
            county: Some("Los Angeles".into()),
            legal_description: Some("LOT 1 OF TRACT 1234".into()),
            owner_name: Some(owner.into()),
            ..TitleMatch::default()
        }
    }

    #[tokio::test]
    async fn test_retries_only_errors() {
        let source = Arc::new(MockTitleSource::new(vec![
            Err(property_search::LookupError::Transport("reset".into())),
            Ok(TitleResponse::single(title_match("555-001-002", "John Doe"))),
        ]));
        let client = PropertyEnrichmentClient::new(source.clone());
        let mut m = machine();
        let mut seen = Vec::new();

        let outcome = m
            .enrich_with_progress(
                &client,
                address("123 Main St, Los Angeles, CA 90210"),
                3,
                |a, max| seen.push((a, max)),
            )
            .await
            .unwrap()
            .clone();

        assert!(outcome.is_resolved());
        assert_eq!(seen, vec![(1, 3), (2, 3)]);
        assert_eq!(source.call_count(), 2);
        assert!(m.has_property());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let source = Arc::new(MockTitleSource::responding(TitleResponse::not_found()));
        let client = PropertyEnrichmentClient::new(source.clone());
        let mut m = machine();
        let outcome = m
            .enrich_with_progress(&client, address("9 Nowhere Rd, Fresno, CA 93650"), 3, |_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome, &EnrichmentOutcome::NotFound);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_same_address_enriched_once() {
        let source = Arc::new(MockTitleSource::responding(TitleResponse::single(
            title_match("555-001-002", "John Doe"),
        )));
        let client = PropertyEnrichmentClient::new(source.clone());
        let mut m = machine();
        let addr = address("123 Main St, Los Angeles, CA 90210");

        m.enrich_with_progress(&client, addr.clone(), 1, |_, _| {})
            .await
            .unwrap();
        let again = m.enrich_with_progress(&client, addr, 1, |_, _| {}).await;
        assert_eq!(again.unwrap_err(), WizardError::AlreadyEnriched);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_po_box_never_reaches_title_source() {
        let source = Arc::new(MockTitleSource::responding(TitleResponse::not_found()));
        let client = PropertyEnrichmentClient::new(source.clone());
        let mut m = machine();
        let err = m
            .enrich_with_progress(&client, address("PO Box 123, Los Angeles, CA 90210"), 3, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::SearchRejected(_)));
        assert!(err.to_string().contains("PO Box"));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_multi_match_choice_and_amendment() {
        let source = Arc::new(MockTitleSource::responding(TitleResponse::multi(vec![
            title_match("111-111-111", "Alice Ng"),
            title_match("222-222-222", "Bob Ng"),
        ])));
        let client = PropertyEnrichmentClient::new(source);
        let mut m = machine();
        m.enrich_with_progress(&client, address("123 Main St, Los Angeles, CA 90210"), 1, |_, _| {})
            .await
            .unwrap();
        assert!(!m.has_property());

        let record = m.choose_match(1).unwrap();
        assert_eq!(record.apn, "222-222-222");
        assert_eq!(record.current_owners[0].name, "Bob Ng");

        let amended = m
            .amend_property(None, Some("LOT 2 OF TRACT 1234".into()))
            .unwrap();
        assert_eq!(amended.legal_description, "LOT 2 OF TRACT 1234");
        assert_eq!(amended.apn, "222-222-222");

        assert!(matches!(
            m.choose_match(0),
            Err(WizardError::Selection(property_search::SelectionError::NotMultiMatch))
        ));
    }

    #[test]
    fn test_amend_requires_record() {
        let mut m = machine();
        assert_eq!(
            m.amend_property(Some("555-001-002".into()), None).unwrap_err(),
            WizardError::NoPropertyRecord
        );
    }
}
