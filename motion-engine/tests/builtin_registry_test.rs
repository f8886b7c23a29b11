//! Integration tests over the bundled template data set

use std::path::PathBuf;

use motion_engine::{
    is_field_valid, is_section_complete, prompt::placeholders, render, CourtType, FieldIssue,
    FieldKind, FieldValues, SectionKind, TemplateRegistry, FEDERAL_STANDARD_ID,
    IMMIGRATION_STANDARD_ID, JURISDICTION_STANDARD_ID, NOT_PROVIDED,
};

fn registry() -> TemplateRegistry {
    TemplateRegistry::builtin().expect("bundled data loads")
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[test]
fn test_every_variant_is_well_formed() {
    let registry = registry();

    for template in registry.templates() {
        assert!(!template.jurisdiction_variants.is_empty(), "{}", template.id);

        for variant in &template.jurisdiction_variants {
            let first = &variant.sections[0];
            assert_eq!(first.kind(), SectionKind::Static);
            assert_eq!(first.order, 1);
            assert_eq!(
                variant.sections.len(),
                template.base_sections.len() + 1,
                "{} {}",
                template.id,
                variant.key()
            );

            for (i, section) in variant.sections.iter().enumerate() {
                assert_eq!(section.order, i as u32 + 1);
                assert_eq!(
                    i == 0,
                    section.kind() == SectionKind::Static && section.id.ends_with("Standard")
                );
            }

            // placeholders only reach back to earlier sections
            for (i, section) in variant.sections.iter().enumerate() {
                let Some((prompt, _)) = section.prompt() else {
                    continue;
                };
                let earlier: Vec<&str> = variant.sections[..i]
                    .iter()
                    .flat_map(|s| s.fields())
                    .map(|f| f.id.as_str())
                    .collect();
                for token in placeholders(prompt) {
                    assert!(
                        earlier.contains(&token),
                        "{} {}: {{{{{token}}}}} not defined before '{}'",
                        template.id,
                        variant.key(),
                        section.id
                    );
                }
            }
        }
    }
}

#[test]
fn test_mistrial_covers_states_and_districts() {
    let registry = registry();
    let template = registry.template("motion-for-mistrial").unwrap();

    let states = template
        .jurisdiction_variants
        .iter()
        .filter(|v| v.court_type == CourtType::State)
        .count();
    let federal = template
        .jurisdiction_variants
        .iter()
        .filter(|v| v.court_type == CourtType::Federal)
        .count();

    assert_eq!(states, motion_engine::jurisdiction::STATE_CODES.len());
    assert_eq!(federal, registry.districts().len());
}

#[test]
fn test_louisiana_state_variant() {
    let registry = registry();
    let variant = registry.lookup("motion-for-mistrial", "LA", None).unwrap();

    assert_eq!(variant.sections[0].id, JURISDICTION_STANDARD_ID);
    let text = variant.sections[0].static_text().unwrap();
    assert!(text.starts_with("APPLICABLE LEGAL STANDARD\nLouisiana (LA)"));
    assert!(text.contains("La. Code Crim. Proc. arts. 770, 771, 775"));

    let caption = variant.section("caption").unwrap();
    let parish = caption.field("parish").expect("parish picker added");
    assert_eq!(parish.kind, FieldKind::Select);
    assert!(parish.required);
    assert_eq!(parish.label, "Parish");
    assert_eq!(parish.options().len(), 64);
    assert!(parish.allows_option("orleans"));

    let base = registry.template("motion-for-mistrial").unwrap();
    assert_eq!(caption.fields().len(), base.base_sections[0].fields().len() + 1);
    assert!(base.base_sections[0].field("parish").is_none());
}

#[test]
fn test_sub_jurisdiction_labels() {
    let registry = registry();

    let alaska = registry.lookup("motion-for-mistrial", "AK", None).unwrap();
    assert!(alaska.field("judicialDistrict").is_some());

    let delaware = registry.lookup("motion-for-mistrial", "DE", None).unwrap();
    let (_, county) = delaware.field("county").unwrap();
    assert_eq!(county.label, "County");

    let ohio = registry.lookup("motion-for-mistrial", "OH", None).unwrap();
    assert!(ohio.field("county").is_none());
}

#[test]
fn test_federal_variant() {
    let registry = registry();
    let variant = registry
        .lookup("motion-for-mistrial", "LA", Some("laed"))
        .unwrap();

    assert_eq!(variant.court_type, CourtType::Federal);
    assert_eq!(variant.sections[0].id, FEDERAL_STANDARD_ID);
    assert!(variant.court_specific_rules_summary.starts_with("Fifth Circuit: "));
    assert!(variant.field("parish").is_none());

    let text = variant.sections[0].static_text().unwrap();
    assert!(text.contains("Eastern District of Louisiana (Fifth Circuit)"));
    assert!(text.contains("Fed. R. Crim. P. 26.3"));
}

#[test]
fn test_immigration_variant() {
    let registry = registry();
    let variant = registry.lookup("bond-redetermination", "eoir", None).unwrap();

    assert_eq!(variant.court_type, CourtType::Immigration);
    assert_eq!(variant.jurisdiction_code, "EOIR");
    assert_eq!(variant.sections[0].id, IMMIGRATION_STANDARD_ID);
    assert!(variant.sections[0]
        .static_text()
        .unwrap()
        .contains("Matter of Guerra"));

    assert!(registry.lookup("bond-redetermination", "LA", None).is_err());
}

#[test]
fn test_unregistered_code_is_not_found() {
    let registry = registry();
    let err = registry.lookup("motion-for-mistrial", "ZZ", None).unwrap_err();
    assert_eq!(err.template_id, "motion-for-mistrial");
    assert_eq!(err.to_string(), "motion-for-mistrial is not yet supported for ZZ");
}

#[test]
fn test_render_argument_with_missing_values() {
    let registry = registry();
    let variant = registry.lookup("motion-for-mistrial", "TX", None).unwrap();
    let (prompt, _) = variant.section("argument").unwrap().prompt().unwrap();

    let mut values = FieldValues::new();
    values.insert("defendantName".to_string(), "Jordan Doe".to_string());
    values.insert("groundsDescription".to_string(), String::new());

    let rendered = render(prompt, &values);
    assert!(rendered.contains("Defendant: Jordan Doe"));
    assert!(rendered.contains(&format!("Facts:\n{NOT_PROVIDED}")));
    assert!(!rendered.contains("{{"));
}

#[test]
fn test_argument_waits_for_caption_and_grounds() {
    let registry = registry();
    let variant = registry.lookup("motion-for-mistrial", "NY", None).unwrap();
    let before = variant.sections_before("argument").unwrap();
    let argument = variant.section("argument").unwrap();

    let mut values = FieldValues::new();
    assert!(!is_section_complete(argument, before, &values));

    for (id, value) in [
        ("defendantName", "Jordan Doe"),
        ("caseNumber", "IND-1021-24"),
        ("courtName", "Supreme Court, Kings County"),
        ("groundType", "prejudicial-remark"),
        (
            "groundsDescription",
            "During summation the prosecutor told the jury the defendant had a prior record.",
        ),
        ("objectionMade", "yes"),
    ] {
        values.insert(id.to_string(), value.to_string());
    }
    assert!(is_section_complete(argument, before, &values));
}

#[test]
fn test_alien_number_pattern() {
    let registry = registry();
    let variant = registry.lookup("bond-redetermination", "EOIR", None).unwrap();
    let (_, field) = variant.field("alienNumber").unwrap();

    assert!(is_field_valid(field, Some("A123456789")).valid);
    assert!(is_field_valid(field, Some("12345678")).valid);
    assert_eq!(
        is_field_valid(field, Some("A-123-456-789")).reason,
        Some(FieldIssue::PatternMismatch)
    );
}

#[test]
fn test_directory_matches_bundled_data() {
    let bundled = registry();
    let loaded = TemplateRegistry::from_dir(data_dir()).unwrap();

    assert_eq!(bundled.dataset_hash(), loaded.dataset_hash());
    assert_eq!(
        bundled.list_sections("motion-for-mistrial", "CA", None).unwrap(),
        loaded.list_sections("motion-for-mistrial", "CA", None).unwrap()
    );
}
