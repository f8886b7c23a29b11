//! End-to-end drafting flows over the bundled templates

use std::sync::Arc;

use drafting_session::{DraftingConfig, DraftingService, GenerationError, MockBackend, SessionError};
use motion_engine::{join_list, CourtType, FieldIssue, SectionKind, TemplateRegistry};

fn service() -> DraftingService {
    DraftingService::new(Arc::new(TemplateRegistry::builtin().expect("bundled data loads")))
}

#[tokio::test]
async fn test_bond_redetermination_flow() {
    let service = service();
    let id = service
        .start_session("bond-redetermination", "EOIR", None)
        .unwrap();

    let check = service
        .set_field_value(id, "alienNumber", "A-123-456-789")
        .unwrap();
    assert_eq!(check.reason, Some(FieldIssue::PatternMismatch));

    for (field, value) in [
        ("respondentName", "Ana Ruiz"),
        ("alienNumber", "A123456789"),
        ("immigrationCourt", "Oakdale Immigration Court"),
        ("detentionFacility", "Central Louisiana ICE Processing Center"),
        ("familyTies", "U.S. citizen spouse and two children in Houston."),
        ("residenceHistory", "Twelve years at the same address in Houston, Texas."),
        ("criminalHistory", "None"),
        ("proposedBondAmount", "3000"),
    ] {
        let check = service.set_field_value(id, field, value).unwrap();
        assert!(check.valid, "{field}: {:?}", check.reason);
    }

    let request = service.generation_request(id, "argument").unwrap();
    assert!(request.rendered_prompt.contains("Respondent: Ana Ruiz (A123456789)"));
    assert!(request.rendered_prompt.contains("Employment:\nNot provided"));
    assert!(request.instructions.contains("custody redetermination"));

    let backend = MockBackend::new("drafter").with_response("Ms. Ruiz poses no danger.");
    service.generate_section(id, "argument", &backend).await.unwrap();

    let plan = service.finalize(id).unwrap();
    assert_eq!(plan.court_type, CourtType::Immigration);
    assert_eq!(plan.jurisdiction_code, "EOIR");
    assert_eq!(plan.sections.first().map(|s| s.kind), Some(SectionKind::Static));
    assert_eq!(plan.sections.last().map(|s| s.id.as_str()), Some("exhibits"));
    assert_eq!(service.active_sessions(), 0);
}

#[tokio::test]
async fn test_federal_mistrial_flow() {
    let service = service();
    let id = service
        .start_session("motion-for-mistrial", "la", Some("LAED"))
        .unwrap();

    // federal captions carry no parish picker
    assert!(matches!(
        service.set_field_value(id, "parish", "orleans"),
        Err(SessionError::UnknownField(_))
    ));

    let incidents = join_list(["juror 4 read a news article", " ", "juror 9 discussed it"]);
    let description = format!("During deliberations: {incidents}.");
    for (field, value) in [
        ("defendantName", "Jordan Doe"),
        ("caseNumber", "2:24-cr-00112"),
        ("courtName", "United States District Court"),
        ("groundType", "juror-misconduct"),
        ("groundsDescription", description.as_str()),
    ] {
        assert!(service.set_field_value(id, field, value).unwrap().valid, "{field}");
    }

    let prompt = service.rendered_prompt(id, "argument").unwrap();
    assert!(prompt.contains("juror 4 read a news article, juror 9 discussed it"));

    let failing = MockBackend::new("drafter").with_available(false);
    let err = service
        .generate_section(id, "argument", &failing)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Backend(GenerationError::Unavailable(_))
    ));
    assert!(!service.completion_status(id).unwrap()["argument"]);

    let backend =
        MockBackend::new("drafter").with_response("The jury was exposed to extrinsic evidence.");
    service.generate_section(id, "argument", &backend).await.unwrap();
    service.generate_section(id, "relief", &backend).await.unwrap();

    let plan = service.document_plan(id).unwrap();
    assert_eq!(plan.district_code.as_deref(), Some("laed"));
    assert_eq!(plan.sections[0].id, "federalStandard");
    assert!(plan.sections[0].body.contains("Fifth Circuit"));
    assert_eq!(plan.dataset_hash, service.registry().dataset_hash());
}

#[test]
fn test_service_from_data_dir() {
    let mut config = DraftingConfig::default();
    config.data.data_dir = Some(
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("motion-engine")
            .join("data"),
    );

    let service = DraftingService::from_config(&config).unwrap();
    assert!(service.list_sections("motion-for-mistrial", "AK", None).is_ok());

    config.data.data_dir = Some(std::path::PathBuf::from("/nonexistent/motion-data"));
    assert!(matches!(
        DraftingService::from_config(&config),
        Err(SessionError::Engine(_))
    ));
}
