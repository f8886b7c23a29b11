//! DraftingService - the UI-facing entry point.
//!
//! Holds the immutable template registry and the open drafting sessions.
//! Every operation is a short synchronous read or write on one session;
//! the only slow step, the generation backend call, runs with no session
//! entry held.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use motion_engine::{
    incomplete_prerequisites, is_field_valid, render, FieldCheck, JurisdictionVariant, Section,
    TemplateRegistry,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{GenerationBackend, GenerationRequest};
use crate::config::{DraftingConfig, SessionConfig};
use crate::error::SessionError;
use crate::plan::{section_complete, DocumentPlan};
use crate::session::DraftSession;

/// Drafting sessions over a shared template registry.
pub struct DraftingService {
    /// Configuration
    config: SessionConfig,
    /// Template registry, built once at startup
    registry: Arc<TemplateRegistry>,
    /// Open sessions
    sessions: DashMap<Uuid, DraftSession>,
    /// Reserved session slots, taken before insert and released on removal
    reserved: AtomicUsize,
}

impl DraftingService {
    /// Create a service over a built registry.
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self {
            config: SessionConfig::default(),
            registry,
            sessions: DashMap::new(),
            reserved: AtomicUsize::new(0),
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load template data as configured and create the service.
    pub fn from_config(config: &DraftingConfig) -> Result<Self, SessionError> {
        let registry = match &config.data.data_dir {
            Some(dir) => TemplateRegistry::from_dir(dir)?,
            None => TemplateRegistry::builtin()?,
        };
        Ok(Self::new(Arc::new(registry)).with_config(config.session.clone()))
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Number of open sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Ordered sections for a template and jurisdiction.
    pub fn list_sections(
        &self,
        template_id: &str,
        jurisdiction_code: &str,
        district_code: Option<&str>,
    ) -> Result<&[Section], SessionError> {
        Ok(self
            .registry
            .list_sections(template_id, jurisdiction_code, district_code)?)
    }

    /// Open a session on a template/jurisdiction combination.
    pub fn start_session(
        &self,
        template_id: &str,
        jurisdiction_code: &str,
        district_code: Option<&str>,
    ) -> Result<Uuid, SessionError> {
        let variant = self
            .registry
            .lookup(template_id, jurisdiction_code, district_code)?;

        let max = self.config.max_active_sessions;
        let reserved = self
            .reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            });
        if let Err(active) = reserved {
            warn!(active, "Session limit reached");
            return Err(SessionError::SessionLimit(active));
        }

        let session = DraftSession::new(template_id, variant, self.config.seed_default_values);
        let id = session.id;
        self.sessions.insert(id, session);

        info!(
            session_id = %id,
            template = %template_id,
            jurisdiction = %variant.key(),
            "Drafting session started"
        );
        Ok(id)
    }

    /// Snapshot of a session.
    pub fn session(&self, session_id: Uuid) -> Result<DraftSession, SessionError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    /// Close a session and discard its values.
    pub fn end_session(&self, session_id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .remove(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        self.reserved.fetch_sub(1, Ordering::AcqRel);
        info!(session_id = %session_id, "Drafting session ended");
        Ok(())
    }

    /// Store a field value and validate it.
    ///
    /// The value is kept even when invalid so the form shows what the user
    /// typed; the returned check says what is wrong with it. List values
    /// must already be joined into one string (see `join_list`).
    pub fn set_field_value(
        &self,
        session_id: Uuid,
        field_id: &str,
        value: impl Into<String>,
    ) -> Result<FieldCheck, SessionError> {
        let value = value.into();
        let mut session = self.session_mut(session_id)?;
        let variant = self.variant(&session)?;
        let (_, field) = variant
            .field(field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))?;

        let check = is_field_valid(field, Some(value.as_str()));
        session.set_value(field_id, value);

        debug!(
            session_id = %session_id,
            field = %field_id,
            valid = check.valid,
            "Field value set"
        );
        Ok(check)
    }

    /// Remove a field value.
    pub fn clear_field_value(
        &self,
        session_id: Uuid,
        field_id: &str,
    ) -> Result<FieldCheck, SessionError> {
        let mut session = self.session_mut(session_id)?;
        let variant = self.variant(&session)?;
        let (_, field) = variant
            .field(field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))?;

        session.clear_value(field_id);
        debug!(session_id = %session_id, field = %field_id, "Field value cleared");
        Ok(is_field_valid(field, None))
    }

    /// Completion of every section, keyed by section id.
    pub fn completion_status(
        &self,
        session_id: Uuid,
    ) -> Result<BTreeMap<String, bool>, SessionError> {
        let session = self.session_ref(session_id)?;
        let variant = self.variant(&session)?;

        Ok(variant
            .sections
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.id.clone(), section_complete(variant, idx, &session)))
            .collect())
    }

    /// The rendered prompt of an AI-generated section.
    ///
    /// Only available once every earlier user-input section is complete.
    pub fn rendered_prompt(
        &self,
        session_id: Uuid,
        section_id: &str,
    ) -> Result<String, SessionError> {
        self.generation_request(session_id, section_id)
            .map(|request| request.rendered_prompt)
    }

    /// What the generation backend receives for a section.
    pub fn generation_request(
        &self,
        session_id: Uuid,
        section_id: &str,
    ) -> Result<GenerationRequest, SessionError> {
        let session = self.session_ref(session_id)?;
        let variant = self.variant(&session)?;
        let request = build_request(variant, &session, section_id)?;
        debug!(
            session_id = %session_id,
            section = %section_id,
            chars = request.rendered_prompt.len(),
            "Rendered prompt"
        );
        Ok(request)
    }

    /// Store prose for an AI-generated section.
    ///
    /// Surrounding whitespace is trimmed; blank prose is rejected and the
    /// session is left unchanged.
    pub fn accept_generated(
        &self,
        session_id: Uuid,
        section_id: &str,
        prose: impl Into<String>,
    ) -> Result<(), SessionError> {
        let prose: String = prose.into();
        self.store_prose(session_id, section_id, prose.trim(), None)
    }

    /// Render, call the backend and store the result.
    ///
    /// On any failure the session is unchanged and the call can be retried;
    /// the retry sends an identical request unless field values changed.
    /// Prose is only stored if the prompt still renders the same after the
    /// call, so an edit made while the backend was drafting is never paired
    /// with prose written from the old values.
    pub async fn generate_section(
        &self,
        session_id: Uuid,
        section_id: &str,
        backend: &dyn GenerationBackend,
    ) -> Result<String, SessionError> {
        let request = self.generation_request(session_id, section_id)?;

        let prose = backend.generate(&request).await.inspect_err(|e| {
            warn!(
                session_id = %session_id,
                section = %section_id,
                backend = %backend.id(),
                retryable = e.is_retryable(),
                error = %e,
                "Generation failed"
            );
        })?;

        let prose = prose.trim();
        self.store_prose(session_id, section_id, prose, Some(&request))?;
        Ok(prose.to_string())
    }

    /// The finished document, if every required section is complete.
    pub fn document_plan(&self, session_id: Uuid) -> Result<DocumentPlan, SessionError> {
        let session = self.session_ref(session_id)?;
        let variant = self.variant(&session)?;

        DocumentPlan::assemble(variant, &session, self.registry.dataset_hash()).map_err(
            |sections| {
                warn!(
                    session_id = %session_id,
                    incomplete = ?sections,
                    "Document plan refused"
                );
                SessionError::Incomplete { sections }
            },
        )
    }

    /// Produce the document plan and close the session.
    pub fn finalize(&self, session_id: Uuid) -> Result<DocumentPlan, SessionError> {
        let plan = self.document_plan(session_id)?;
        self.end_session(session_id)?;
        info!(
            session_id = %session_id,
            template = %plan.template_id,
            sections = plan.sections.len(),
            "Document finalized"
        );
        Ok(plan)
    }

    /// Accept trimmed prose, optionally only while `request` is still what
    /// the session would send.
    fn store_prose(
        &self,
        session_id: Uuid,
        section_id: &str,
        prose: &str,
        request: Option<&GenerationRequest>,
    ) -> Result<(), SessionError> {
        let mut session = self.session_mut(session_id)?;
        let variant = self.variant(&session)?;
        generated_section(variant, section_id)?;

        if prose.is_empty() {
            warn!(session_id = %session_id, section = %section_id, "Rejected empty generation");
            return Err(SessionError::EmptyGeneration(section_id.to_string()));
        }

        if let Some(request) = request {
            let current = build_request(variant, &session, section_id)?;
            if current != *request {
                warn!(
                    session_id = %session_id,
                    section = %section_id,
                    "Discarded generation drafted from outdated values"
                );
                return Err(SessionError::StaleGeneration(section_id.to_string()));
            }
        }

        session.accept(section_id, prose.to_string());
        debug!(session_id = %session_id, section = %section_id, "Generated content accepted");
        Ok(())
    }

    fn session_ref(
        &self,
        session_id: Uuid,
    ) -> Result<dashmap::mapref::one::Ref<'_, Uuid, DraftSession>, SessionError> {
        self.sessions
            .get(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    fn session_mut(
        &self,
        session_id: Uuid,
    ) -> Result<dashmap::mapref::one::RefMut<'_, Uuid, DraftSession>, SessionError> {
        self.sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    fn variant(&self, session: &DraftSession) -> Result<&JurisdictionVariant, SessionError> {
        Ok(self.registry.lookup(
            &session.template_id,
            &session.jurisdiction_code,
            session.district_code.as_deref(),
        )?)
    }
}

/// The backend request for a section, if its prerequisites are complete.
fn build_request(
    variant: &JurisdictionVariant,
    session: &DraftSession,
    section_id: &str,
) -> Result<GenerationRequest, SessionError> {
    let (section, preceding) = generated_section(variant, section_id)?;
    let (prompt_template, instructions) = section
        .prompt()
        .ok_or_else(|| SessionError::NotGenerated(section_id.to_string()))?;

    let missing = incomplete_prerequisites(preceding, &session.values);
    if !missing.is_empty() {
        return Err(SessionError::PrerequisitesIncomplete {
            section: section_id.to_string(),
            missing: missing.into_iter().map(String::from).collect(),
        });
    }

    Ok(GenerationRequest {
        section_id: section_id.to_string(),
        instructions: instructions.to_string(),
        rendered_prompt: render(prompt_template, &session.values),
    })
}

/// An AI-generated section and the sections before it.
fn generated_section<'a>(
    variant: &'a JurisdictionVariant,
    section_id: &str,
) -> Result<(&'a Section, &'a [Section]), SessionError> {
    let idx = variant
        .sections
        .iter()
        .position(|s| s.id == section_id)
        .ok_or_else(|| SessionError::UnknownSection(section_id.to_string()))?;
    let section = &variant.sections[idx];
    if section.prompt().is_none() {
        return Err(SessionError::NotGenerated(section_id.to_string()));
    }
    Ok((section, &variant.sections[..idx]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GenerationError, MockBackend};
    use async_trait::async_trait;
    use motion_engine::FieldIssue;
    use proptest::prelude::*;

    /// Backend that edits a field of the session while it is drafting.
    struct EditingBackend<'a> {
        service: &'a DraftingService,
        session_id: Uuid,
    }

    #[async_trait]
    impl GenerationBackend for EditingBackend<'_> {
        fn id(&self) -> &str {
            "editing"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.service
                .set_field_value(self.session_id, "defendantName", "Jordan A. Doe")
                .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
            Ok("Drafted from the old name.".to_string())
        }
    }

    fn service() -> DraftingService {
        DraftingService::from_config(&DraftingConfig::default()).unwrap()
    }

    fn fill_mistrial(service: &DraftingService, id: Uuid) {
        for (field, value) in [
            ("defendantName", "Jordan Doe"),
            ("caseNumber", "24-CR-1021"),
            ("courtName", "Criminal District Court"),
            ("parish", "orleans"),
            ("groundType", "prejudicial-remark"),
            (
                "groundsDescription",
                "The prosecutor told the jury in opening that the defendant had been to prison.",
            ),
        ] {
            assert!(service.set_field_value(id, field, value).unwrap().valid, "{field}");
        }
    }

    #[test]
    fn test_start_unsupported_jurisdiction() {
        let service = service();
        let err = service.start_session("motion-for-mistrial", "ZZ", None).unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert_eq!(service.active_sessions(), 0);
    }

    #[test]
    fn test_list_sections() {
        let service = service();
        let sections = service.list_sections("motion-for-mistrial", "LA", None).unwrap();
        assert_eq!(sections[0].order, 1);
        assert_eq!(sections.len(), 6);
    }

    #[test]
    fn test_set_field_value_reports_issue() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();

        let check = service.set_field_value(id, "groundsDescription", "Too short").unwrap();
        assert_eq!(check.reason, Some(FieldIssue::TooShort));
        // invalid values are still kept for the form
        assert_eq!(
            service.session(id).unwrap().value("groundsDescription"),
            Some("Too short")
        );

        let check = service.set_field_value(id, "parish", "Orleans").unwrap();
        assert_eq!(check.reason, Some(FieldIssue::InvalidOption));

        let check = service.clear_field_value(id, "parish").unwrap();
        assert_eq!(check.reason, Some(FieldIssue::MissingRequired));

        assert!(matches!(
            service.set_field_value(id, "victimName", "x"),
            Err(SessionError::UnknownField(_))
        ));
    }

    #[test]
    fn test_completion_status() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();

        let status = service.completion_status(id).unwrap();
        assert_eq!(status.len(), 6);
        assert!(status["jurisdictionStandard"]);
        assert!(!status["caption"]);
        assert!(status["certificate"]);

        fill_mistrial(&service, id);
        let status = service.completion_status(id).unwrap();
        assert!(status["caption"]);
        assert!(status["grounds"]);
        assert!(!status["argument"]);
    }

    #[test]
    fn test_rendered_prompt_requires_prerequisites() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();

        match service.rendered_prompt(id, "argument").unwrap_err() {
            SessionError::PrerequisitesIncomplete { section, missing } => {
                assert_eq!(section, "argument");
                assert_eq!(missing, vec!["caption", "grounds"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            service.rendered_prompt(id, "caption"),
            Err(SessionError::NotGenerated(_))
        ));
        assert!(matches!(
            service.rendered_prompt(id, "exhibits"),
            Err(SessionError::UnknownSection(_))
        ));

        fill_mistrial(&service, id);
        let prompt = service.rendered_prompt(id, "argument").unwrap();
        assert!(prompt.contains("Defendant: Jordan Doe"));
        assert!(prompt.contains("Incident date: Not provided"));
        assert!(prompt.contains("Objection made: yes"));
        assert_eq!(prompt, service.rendered_prompt(id, "argument").unwrap());
    }

    #[test]
    fn test_session_limit() {
        let config = DraftingConfig {
            session: SessionConfig {
                max_active_sessions: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let service = DraftingService::from_config(&config).unwrap();

        let id = service.start_session("bond-redetermination", "EOIR", None).unwrap();
        assert!(matches!(
            service.start_session("bond-redetermination", "EOIR", None),
            Err(SessionError::SessionLimit(1))
        ));

        service.end_session(id).unwrap();
        assert!(service.start_session("bond-redetermination", "EOIR", None).is_ok());
        assert!(matches!(
            service.end_session(id),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_session_limit_holds_under_concurrency() {
        let config = DraftingConfig {
            session: SessionConfig {
                max_active_sessions: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        let service = DraftingService::from_config(&config).unwrap();

        let started = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| service.start_session("bond-redetermination", "EOIR", None))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap().ok())
                .collect::<Vec<_>>()
        });

        assert_eq!(started.len(), 4);
        assert_eq!(service.active_sessions(), 4);

        service.end_session(started[0]).unwrap();
        assert!(service.start_session("bond-redetermination", "EOIR", None).is_ok());
        assert!(matches!(
            service.start_session("bond-redetermination", "EOIR", None),
            Err(SessionError::SessionLimit(4))
        ));
    }

    #[test]
    fn test_accept_rejects_blank_prose() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();
        fill_mistrial(&service, id);

        assert!(matches!(
            service.accept_generated(id, "argument", "  \n"),
            Err(SessionError::EmptyGeneration(_))
        ));
        assert!(service.session(id).unwrap().generated.is_empty());
    }

    #[tokio::test]
    async fn test_generate_section_stores_prose() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();
        fill_mistrial(&service, id);

        let backend =
            MockBackend::new("test-model").with_response("  The remark was incurable.\n");
        let prose = service.generate_section(id, "argument", &backend).await.unwrap();

        assert_eq!(prose, "The remark was incurable.");
        assert_eq!(backend.call_count(), 1);
        let request = backend.last_request().unwrap();
        assert_eq!(request.section_id, "argument");
        assert_eq!(request.rendered_prompt, service.rendered_prompt(id, "argument").unwrap());
        assert_eq!(
            service.session(id).unwrap().generated_content("argument"),
            Some("The remark was incurable.")
        );
        assert!(service.completion_status(id).unwrap()["argument"]);
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_session_unchanged() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();
        fill_mistrial(&service, id);
        let before = service.session(id).unwrap();

        let backend = MockBackend::new("test-model").with_available(false);
        let err = service.generate_section(id, "argument", &backend).await.unwrap_err();
        assert!(matches!(err, SessionError::Backend(_)));

        let empty = MockBackend::new("test-model").with_response("");
        let err = service.generate_section(id, "argument", &empty).await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyGeneration(_)));

        assert_eq!(service.session(id).unwrap(), before);

        // retry sends the same request
        backend.set_available(true);
        service.generate_section(id, "argument", &backend).await.unwrap();
        assert_eq!(backend.last_request(), empty.last_request());
    }

    #[tokio::test]
    async fn test_edit_during_generation_discards_prose() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();
        fill_mistrial(&service, id);

        let backend = EditingBackend {
            service: &service,
            session_id: id,
        };
        let err = service.generate_section(id, "argument", &backend).await.unwrap_err();
        assert!(matches!(err, SessionError::StaleGeneration(_)));

        let session = service.session(id).unwrap();
        assert_eq!(session.value("defendantName"), Some("Jordan A. Doe"));
        assert_eq!(session.generated_content("argument"), None);

        // regenerating from the new values succeeds
        let backend = MockBackend::default().with_response("Drafted from the new name.");
        service.generate_section(id, "argument", &backend).await.unwrap();
        assert!(backend.last_request().unwrap().rendered_prompt.contains("Jordan A. Doe"));
    }

    #[tokio::test]
    async fn test_finalize() {
        let service = service();
        let id = service.start_session("motion-for-mistrial", "LA", None).unwrap();
        fill_mistrial(&service, id);

        match service.finalize(id).unwrap_err() {
            SessionError::Incomplete { sections } => {
                assert_eq!(sections, vec!["argument", "relief"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let backend = MockBackend::default().with_response("Drafted.");
        service.generate_section(id, "argument", &backend).await.unwrap();
        service.generate_section(id, "relief", &backend).await.unwrap();

        let plan = service.finalize(id).unwrap();
        assert_eq!(plan.jurisdiction_code, "LA");
        assert_eq!(plan.dataset_hash, service.registry().dataset_hash());
        assert_eq!(service.active_sessions(), 0);
        assert!(matches!(
            service.session(id),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_any_value_is_stored_verbatim(value in ".{0,200}") {
            let service = service();
            let id = service.start_session("motion-for-mistrial", "TX", None).unwrap();

            let check = service.set_field_value(id, "groundsDescription", value.clone()).unwrap();
            prop_assert_eq!(check.valid, check.reason.is_none());
            let session = service.session(id).unwrap();
            prop_assert_eq!(session.value("groundsDescription"), Some(value.as_str()));
        }
    }
}
