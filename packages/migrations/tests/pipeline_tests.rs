//! End-to-end runs of the migration pipeline on legacy documents

use designkit_linter::{has_errors, lint_document, LintOptions};
use designkit_migrations::{
    baseline, migrate, migrate_document, MigrationContext, MigrationError, CURRENT_SCHEMA_VERSION,
};
use designkit_model::{system_default_theme, NodeId, SchemaCatalog, SystemThemeComputer};
use serde_json::{json, Value};

fn legacy_document() -> Value {
    json!({
        "schemaVersion": 0,
        "customTheme": { "name": "brand", "colors": { "primary": "#ff0066" } },
        "boards": {
            "text": { "variants": ["variant-text-default"], "order": 4 },
            "buttonGroup": {
                "label": "Button Group",
                "variants": ["variant-buttonGroup-default", "variant-buttonGroup-1"],
                "order": 9
            },
            "tooltip": { "variants": ["variant-tooltip-default"], "order": 1 }
        },
        "byId": {
            "variant-text-default": {
                "id": "variant-text-default",
                "componentType": "text",
                "label": "Text",
                "properties": { "content": "Text" }
            },
            "variant-buttonGroup-default": {
                "id": "variant-buttonGroup-default",
                "componentType": "buttonGroup",
                "level": 2,
                "label": "Button Group",
                "children": ["child-text-1"]
            },
            "child-text-1": {
                "id": "child-text-1",
                "componentType": "text",
                "label": "Caption",
                "derivesFrom": "variant-text-default",
                "fromSchema": true,
                "visible": false
            },
            "variant-buttonGroup-1": {
                "id": "variant-buttonGroup-1",
                "componentType": "buttonGroup",
                "level": 2,
                "label": "Compact",
                "children": ["child-text-2"]
            },
            "child-text-2": {
                "id": "child-text-2",
                "componentType": "text",
                "label": "Caption",
                "derivesFrom": "child-text-1",
                "fromSchema": true
            },
            "variant-tooltip-default": {
                "id": "variant-tooltip-default",
                "componentType": "tooltip",
                "children": ["child-text-3"]
            },
            "child-text-3": {
                "id": "child-text-3",
                "componentType": "text",
                "derivesFrom": "variant-text-default"
            }
        }
    })
}

#[test]
fn test_baseline_on_bare_document() {
    let catalog = SchemaCatalog::builtin();
    let mut ctx = MigrationContext::new(&catalog, &SystemThemeComputer);
    let mut root = json!({ "version": 0 }).as_object().cloned().unwrap();

    baseline(&mut root, &mut ctx).unwrap();

    assert_eq!(root["customTheme"], system_default_theme());
    assert_eq!(root["boards"], json!({}));
    assert_eq!(root["byId"], json!({}));
    assert_eq!(root["version"], 0);
    assert!(ctx.report().is_clean());
}

#[test]
fn test_legacy_document_reaches_current_shape() {
    let catalog = SchemaCatalog::builtin();
    let (doc, report) = migrate_document(legacy_document(), &catalog, &SystemThemeComputer).unwrap();

    assert!(report.is_clean(), "{:#?}", report.diagnostics);
    assert_eq!(report.from_version, 0);
    assert_eq!(report.to_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(doc.schema_version, CURRENT_SCHEMA_VERSION);

    assert!(doc.board("tooltip").is_none());
    assert!(!doc.contains("variant-tooltip-default"));
    assert!(!doc.contains("child-text-3"));

    let bar = doc.board("button-bar").unwrap();
    assert_eq!(bar.order, 1);
    assert_eq!(doc.board("text").unwrap().order, 0);
    assert_eq!(
        bar.variants,
        vec![
            NodeId::from("variant-button-bar-default"),
            NodeId::from("variant-button-bar-1")
        ]
    );

    let compact = doc.node("variant-button-bar-1").unwrap();
    assert_eq!(compact.derives_from(), Some(&NodeId::from("variant-button-bar-default")));
    let caption = doc.node("child-text-1").unwrap();
    assert!(caption.is_hidden());
    assert_eq!(caption.owner(), &NodeId::from("variant-button-bar-default"));

    assert_eq!(doc.theme["name"], "brand");
    assert_eq!(doc.theme["colors"]["primary"], "#ff0066");
    assert_eq!(doc.theme["colors"]["text"], "#222b45");

    let diagnostics = lint_document(&doc, LintOptions::default());
    assert!(!has_errors(&diagnostics), "{diagnostics:#?}");
}

#[test]
fn test_second_run_is_byte_identical() {
    let catalog = SchemaCatalog::builtin();
    let (once, _) = migrate(legacy_document(), &catalog, &SystemThemeComputer).unwrap();
    let (twice, report) = migrate(once.clone(), &catalog, &SystemThemeComputer).unwrap();

    assert_eq!(
        serde_json::to_string(&once).unwrap(),
        serde_json::to_string(&twice).unwrap()
    );
    assert!(report.applied.is_empty());
}

#[test]
fn test_malformed_nodes_do_not_stop_the_pipeline() {
    let catalog = SchemaCatalog::builtin();
    let input = json!({
        "version": 0,
        "boards": { "text": { "variants": ["variant-text-default"] } },
        "byId": {
            "variant-text-default": { "id": "variant-text-default", "componentType": "text" },
            "child-text-9": null,
            "child-text-10": { "id": 42, "componentType": "text", "children": "oops" }
        }
    });

    let (migrated, report) = migrate(input.clone(), &catalog, &SystemThemeComputer).unwrap();
    assert_eq!(migrated["byId"]["child-text-9"], Value::Null);
    assert_eq!(migrated["byId"]["child-text-10"]["children"], "oops");
    assert_eq!(migrated["byId"]["variant-text-default"]["fromSchema"], true);
    assert_eq!(migrated["byId"]["variant-text-default"]["children"], json!([]));

    let mut paths: Vec<&str> = report.diagnostics.iter().map(|d| d.path.as_str()).collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["byId.child-text-10", "byId.child-text-9"]);

    let (doc, report) = migrate_document(input, &catalog, &SystemThemeComputer).unwrap();
    assert_eq!(doc.registry.len(), 1);
    assert!(doc.node("variant-text-default").unwrap().is_default_variant());
    assert_eq!(report.diagnostics.len(), 2);
}

#[test]
fn test_obsolete_theme_aborts() {
    let catalog = SchemaCatalog::builtin();
    let mut input = legacy_document();
    input["customTheme"] = json!("flat-2015");

    let err = migrate(input, &catalog, &SystemThemeComputer).unwrap_err();
    assert_eq!(err, MigrationError::UnsupportedTheme("flat-2015".to_string()));
}

#[test]
fn test_current_document_only_gets_schema_fixes() {
    let catalog = SchemaCatalog::builtin();
    let input = json!({
        "version": 5,
        "customTheme": system_default_theme(),
        "boards": {
            "pageHeader": {
                "componentType": "pageHeader",
                "label": "Page Header",
                "order": 0,
                "theme": "default",
                "properties": {},
                "variants": ["variant-pageHeader-default"]
            }
        },
        "byId": {
            "variant-pageHeader-default": {
                "id": "variant-pageHeader-default",
                "componentType": "pageHeader",
                "level": 3,
                "isChild": false,
                "fromSchema": true,
                "properties": {},
                "children": []
            }
        }
    });

    let (doc, report) = migrate_document(input, &catalog, &SystemThemeComputer).unwrap();
    assert!(report.applied.is_empty());
    assert!(doc.board("page-header").is_some());
    assert!(doc.node("variant-page-header-default").unwrap().is_default_variant());
}
