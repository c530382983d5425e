//! Per-operation behaviour of the mutation engine

use designkit_editor::{Mutation, MutationError, MutationResult, NoopReason, Outcome};
use designkit_linter::{has_errors, lint_document, LintOptions};
use designkit_model::{ComponentType, Document, NodeId, SchemaCatalog, ThemeRef, HIDDEN_PROPERTY};
use serde_json::json;

fn apply(doc: &Document, mutation: Mutation) -> MutationResult {
    mutation.apply(doc, &SchemaCatalog::builtin()).unwrap()
}

fn try_apply(doc: &Document, mutation: Mutation) -> Result<MutationResult, MutationError> {
    mutation.apply(doc, &SchemaCatalog::builtin())
}

fn document_with(components: &[&str]) -> Document {
    components.iter().fold(Document::empty(5), |doc, component| {
        apply(
            &doc,
            Mutation::AddComponent {
                component_type: ComponentType::from(*component),
            },
        )
        .document
    })
}

fn children(doc: &Document, id: &NodeId) -> Vec<NodeId> {
    doc.node(id.as_str()).unwrap().children().to_vec()
}

fn child(doc: &Document, id: &str, index: usize) -> NodeId {
    children(doc, &NodeId::from(id))[index].clone()
}

fn template_of(doc: &Document, id: &NodeId) -> NodeId {
    doc.node(id.as_str()).unwrap().derives_from().unwrap().clone()
}

fn property(doc: &Document, id: &NodeId, key: &str) -> Option<serde_json::Value> {
    doc.resolved_property(id.as_str(), key).cloned()
}

fn assert_lint_clean(doc: &Document) {
    let diagnostics = lint_document(doc, LintOptions::default());
    assert!(!has_errors(&diagnostics), "{diagnostics:?}");
}

fn insert(doc: &Document, parent: &NodeId, index: usize, template: &str) -> (Document, NodeId) {
    let result = apply(
        doc,
        Mutation::InsertInstance {
            parent_id: parent.clone(),
            index,
            template_id: NodeId::from(template),
        },
    );
    let root = result.created.root.clone().unwrap();
    (result.document, root)
}

mod remove {
    use super::*;

    #[test]
    fn test_schema_defined_child_is_hidden_everywhere() {
        let doc = document_with(&["button-bar"]);
        let label = child(&doc, "variant-button-default", 0);

        let result = apply(&doc, Mutation::Remove { node_id: label.clone() });
        let after = &result.document;

        assert!(result.is_applied());
        assert_eq!(after.registry.len(), doc.registry.len());
        assert!(after.node(label.as_str()).unwrap().is_hidden());
        for button in children(after, &NodeId::from("variant-button-bar-default")) {
            let mirrored = &children(after, &button)[0];
            assert_eq!(template_of(after, mirrored), label);
            assert_eq!(property(after, mirrored, HIDDEN_PROPERTY), Some(json!(true)));
        }
    }

    #[test]
    fn test_manually_added_child_is_deleted_with_mirrors() {
        let doc = document_with(&["button-bar", "icon"]);
        let (doc, icon) = insert(&doc, &NodeId::from("variant-button-default"), 1, "variant-icon-default");
        let size = doc.registry.len();

        let after = apply(&doc, Mutation::Remove { node_id: icon.clone() }).document;

        assert!(!after.contains(icon.as_str()));
        assert_eq!(after.registry.len(), size - 3);
        for button in children(&after, &NodeId::from("variant-button-bar-default")) {
            assert_eq!(children(&after, &button).len(), 1);
        }
    }

    #[test]
    fn test_user_variant_takes_its_instances_along() {
        let doc = document_with(&["button-bar"]);
        let added = apply(
            &doc,
            Mutation::AddVariant {
                component_type: ComponentType::from("button"),
            },
        );
        let variant = added.created.root.clone().unwrap();
        let bar = NodeId::from("variant-button-bar-default");
        let (doc, placed) = insert(&added.document, &bar, 2, variant.as_str());
        assert_eq!(children(&doc, &bar).len(), 3);

        let after = apply(&doc, Mutation::Remove { node_id: variant.clone() }).document;

        assert!(!after.contains(variant.as_str()));
        assert!(!after.contains(placed.as_str()));
        assert_eq!(children(&after, &bar).len(), 2);
        assert_eq!(
            after.board("button").unwrap().variants,
            vec![NodeId::from("variant-button-default")]
        );
    }

    #[test]
    fn test_default_variant_is_protected() {
        let doc = document_with(&["button"]);
        let result = apply(
            &doc,
            Mutation::Remove {
                node_id: NodeId::from("variant-button-default"),
            },
        );

        match result.outcome {
            Outcome::Noop {
                reason: NoopReason::Denied { .. },
            } => {}
            other => panic!("expected denial, got {other:?}"),
        }
        assert_eq!(result.document, doc);
    }

    #[test]
    fn test_remove_board_cascades_into_other_boards() {
        let doc = document_with(&["card"]);
        let card = NodeId::from("variant-card-default");
        assert_eq!(children(&doc, &card).len(), 3);

        let after = apply(
            &doc,
            Mutation::RemoveBoard {
                component_type: ComponentType::from("button-bar"),
            },
        )
        .document;

        assert!(after.board("button-bar").is_none());
        assert!(!after.contains("variant-button-bar-default"));
        assert_eq!(children(&after, &card).len(), 2);
        let mut orders: Vec<u32> = after.boards.values().map(|b| b.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, (0..after.boards.len() as u32).collect::<Vec<_>>());
    }
}

mod insert {
    use super::*;

    #[test]
    fn test_fan_out_reaches_every_transitive_mirror() {
        let doc = document_with(&["card", "page-header", "icon"]);

        let result = apply(
            &doc,
            Mutation::InsertInstance {
                parent_id: NodeId::from("variant-button-default"),
                index: 0,
                template_id: NodeId::from("variant-icon-default"),
            },
        );

        // two buttons in each of: the bar, the card's bar, the header's bar
        assert_eq!(result.created.mirrors.len(), 6);
        assert_eq!(result.document.registry.len(), doc.registry.len() + 7);
    }

    #[test]
    fn test_created_paths_cover_the_subtree() {
        let doc = document_with(&["button-bar", "card"]);
        let result = apply(
            &doc,
            Mutation::InsertInstance {
                parent_id: NodeId::from("variant-card-default"),
                index: 0,
                template_id: NodeId::from("variant-button-bar-default"),
            },
        );

        let created = &result.created;
        let root = created.root.clone().unwrap();
        let primary = created.at("0").unwrap();
        assert_eq!(children(&result.document, &root)[0], *primary);
        assert_eq!(
            created.at("0.0"),
            Some(&children(&result.document, primary)[0])
        );
        assert_eq!(created.by_path.len(), 4);
    }

    #[test]
    fn test_level_violation_is_error() {
        let doc = document_with(&["button-bar"]);
        let err = try_apply(
            &doc,
            Mutation::InsertInstance {
                parent_id: NodeId::from("variant-text-default"),
                index: 0,
                template_id: NodeId::from("variant-button-bar-default"),
            },
        )
        .unwrap_err();

        assert!(matches!(err, MutationError::LevelViolation { .. }));
    }

    #[test]
    fn test_self_containment_is_cycle() {
        let doc = document_with(&["button"]);
        let err = try_apply(
            &doc,
            Mutation::InsertInstance {
                parent_id: NodeId::from("variant-button-default"),
                index: 0,
                template_id: NodeId::from("variant-button-default"),
            },
        )
        .unwrap_err();

        assert!(matches!(err, MutationError::CycleDetected(_)));
    }

    #[test]
    fn test_indirect_containment_is_cycle() {
        let doc = document_with(&["card"]);
        let err = try_apply(
            &doc,
            Mutation::InsertInstance {
                parent_id: NodeId::from("variant-button-bar-default"),
                index: 0,
                template_id: NodeId::from("variant-card-default"),
            },
        )
        .unwrap_err();

        assert!(matches!(err, MutationError::CycleDetected(_)));
    }

    #[test]
    fn test_index_past_end_is_noop() {
        let doc = document_with(&["button"]);
        let result = apply(
            &doc,
            Mutation::InsertInstance {
                parent_id: NodeId::from("variant-button-default"),
                index: 5,
                template_id: NodeId::from("variant-text-default"),
            },
        );

        assert_eq!(
            result.outcome,
            Outcome::Noop {
                reason: NoopReason::IndexOutOfRange { index: 5, len: 1 }
            }
        );
    }
}

mod duplicate {
    use super::*;

    #[test]
    fn test_default_variant_becomes_user_variant() {
        let doc = document_with(&["button"]);
        let result = apply(
            &doc,
            Mutation::Duplicate {
                node_id: NodeId::from("variant-button-default"),
            },
        );
        let after = &result.document;
        let copy = result.created.root.clone().unwrap();

        let variants = &after.board("button").unwrap().variants;
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1], copy);
        let node = after.node(copy.as_str()).unwrap();
        assert_eq!(node.data().label, "Button Copy");
        assert_eq!(node.derives_from(), Some(&NodeId::from("variant-button-default")));
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn test_instance_copy_lands_after_source_and_is_mirrored() {
        let doc = document_with(&["card"]);
        let bar = NodeId::from("variant-button-bar-default");
        let primary = child(&doc, bar.as_str(), 0);

        let result = apply(&doc, Mutation::Duplicate { node_id: primary.clone() });
        let after = &result.document;
        let copy = result.created.root.clone().unwrap();

        let bar_children = children(after, &bar);
        assert_eq!(bar_children.len(), 3);
        assert_eq!(bar_children[0], primary);
        assert_eq!(bar_children[1], copy);
        assert!(!after.node(copy.as_str()).unwrap().from_schema());

        let card_bar = child(after, "variant-card-default", 2);
        let mirrored = children(after, &card_bar);
        assert_eq!(mirrored.len(), 3);
        assert_eq!(template_of(after, &mirrored[1]), copy);
    }
}

mod movement {
    use super::*;

    fn with_manual_text() -> (Document, NodeId) {
        let doc = document_with(&["card", "form"]);
        let primary = child(&doc, "variant-button-bar-default", 0);
        insert(&doc, &primary, 1, "variant-text-default")
    }

    #[test]
    fn test_move_between_siblings_follows_in_mirrors() {
        let (doc, text) = with_manual_text();
        let primary = child(&doc, "variant-button-bar-default", 0);
        let secondary = child(&doc, "variant-button-bar-default", 1);

        let after = apply(
            &doc,
            Mutation::MoveNode {
                node_id: text.clone(),
                new_parent_id: secondary.clone(),
                index: 0,
            },
        )
        .document;

        assert_eq!(children(&after, &primary).len(), 1);
        assert_eq!(children(&after, &secondary)[0], text);

        let card_bar = child(&after, "variant-card-default", 2);
        let card_primary = child(&after, card_bar.as_str(), 0);
        let card_secondary = child(&after, card_bar.as_str(), 1);
        assert_eq!(children(&after, &card_primary).len(), 1);
        let moved = children(&after, &card_secondary);
        assert_eq!(moved.len(), 2);
        assert_eq!(template_of(&after, &moved[0]), text);
    }

    #[test]
    fn test_move_across_owners_drops_stranded_counterparts() {
        let (doc, text) = with_manual_text();
        let submit = child(&doc, "variant-form-default", 1);

        let after = apply(
            &doc,
            Mutation::MoveNode {
                node_id: text.clone(),
                new_parent_id: submit.clone(),
                index: 0,
            },
        )
        .document;

        assert_eq!(children(&after, &submit)[0], text);
        assert_eq!(
            after.node(text.as_str()).unwrap().owner(),
            &NodeId::from("variant-form-default")
        );
        let card_bar = child(&after, "variant-card-default", 2);
        let card_primary = child(&after, card_bar.as_str(), 0);
        assert_eq!(children(&after, &card_primary).len(), 1);
        assert_eq!(after.registry.len(), doc.registry.len() - 1);
    }

    #[test]
    fn test_move_into_own_subtree_is_cycle() {
        let doc = document_with(&["button-bar"]);
        let primary = child(&doc, "variant-button-bar-default", 0);
        let label = child(&doc, primary.as_str(), 0);

        let err = try_apply(
            &doc,
            Mutation::MoveNode {
                node_id: primary,
                new_parent_id: label,
                index: 0,
            },
        )
        .unwrap_err();

        assert!(matches!(err, MutationError::CycleDetected(_)));
    }

    #[test]
    fn test_missing_destination_is_noop() {
        let (doc, text) = with_manual_text();
        let result = apply(
            &doc,
            Mutation::MoveNode {
                node_id: text,
                new_parent_id: NodeId::from("child-button-404"),
                index: 0,
            },
        );

        assert!(matches!(
            result.outcome,
            Outcome::Noop {
                reason: NoopReason::MissingDestination { .. }
            }
        ));
        assert_eq!(result.document, doc);
    }

    #[test]
    fn test_schema_defined_node_stays_put() {
        let doc = document_with(&["button-bar"]);
        let primary = child(&doc, "variant-button-bar-default", 0);
        let secondary = child(&doc, "variant-button-bar-default", 1);
        let label = child(&doc, primary.as_str(), 0);

        let result = apply(
            &doc,
            Mutation::MoveNode {
                node_id: label,
                new_parent_id: secondary,
                index: 0,
            },
        );

        assert!(matches!(
            result.outcome,
            Outcome::Noop {
                reason: NoopReason::SchemaDefinedMove { .. }
            }
        ));
    }
}

mod reorder {
    use super::*;

    #[test]
    fn test_child_reorder_is_mirrored() {
        let doc = document_with(&["card"]);
        let bar = NodeId::from("variant-button-bar-default");
        let secondary = child(&doc, bar.as_str(), 1);

        let after = apply(
            &doc,
            Mutation::ReorderChild {
                node_id: secondary.clone(),
                new_index: 0,
            },
        )
        .document;

        assert_eq!(children(&after, &bar)[0], secondary);
        let card_bar = child(&after, "variant-card-default", 2);
        assert_eq!(template_of(&after, &child(&after, card_bar.as_str(), 0)), secondary);
    }

    #[test]
    fn test_child_index_bounds() {
        let doc = document_with(&["button-bar"]);
        let bar = NodeId::from("variant-button-bar-default");
        let primary = child(&doc, bar.as_str(), 0);

        let past = apply(
            &doc,
            Mutation::ReorderChild {
                node_id: primary.clone(),
                new_index: 3,
            },
        );
        assert!(past.is_noop());

        let end = apply(
            &doc,
            Mutation::ReorderChild {
                node_id: primary.clone(),
                new_index: 2,
            },
        );
        assert!(end.is_applied());
        assert_eq!(children(&end.document, &bar)[1], primary);
    }

    #[test]
    fn test_mirror_keeps_schema_child_order() {
        let doc = document_with(&["card"]);
        let added = apply(
            &doc,
            Mutation::AddVariant {
                component_type: ComponentType::from("card"),
            },
        );
        let variant = added.created.root.clone().unwrap();
        let doc = added.document;
        let image = child(&doc, variant.as_str(), 0);

        let result = apply(
            &doc,
            Mutation::ReorderChild {
                node_id: image,
                new_index: 2,
            },
        );

        assert!(matches!(
            result.outcome,
            Outcome::Noop {
                reason: NoopReason::SchemaOrderLocked { .. }
            }
        ));
        assert_eq!(result.document, doc);
        assert_lint_clean(&result.document);
    }

    #[test]
    fn test_same_parent_move_keeps_schema_child_order() {
        let doc = document_with(&["card"]);
        let card_bar = child(&doc, "variant-card-default", 2);
        let primary = child(&doc, card_bar.as_str(), 0);

        let result = apply(
            &doc,
            Mutation::MoveNode {
                node_id: primary,
                new_parent_id: card_bar,
                index: 2,
            },
        );

        assert!(matches!(
            result.outcome,
            Outcome::Noop {
                reason: NoopReason::SchemaOrderLocked { .. }
            }
        ));
        assert_eq!(result.document, doc);
        assert_lint_clean(&result.document);
    }

    #[test]
    fn test_manual_child_moves_around_mirrored_schema_children() {
        let doc = document_with(&["card", "icon"]);
        let card_bar = child(&doc, "variant-card-default", 2);
        let (doc, icon) = insert(&doc, &card_bar, 0, "variant-icon-default");

        let result = apply(
            &doc,
            Mutation::ReorderChild {
                node_id: icon.clone(),
                new_index: 2,
            },
        );

        assert!(result.is_applied());
        assert_eq!(children(&result.document, &card_bar)[2], icon);
        assert_lint_clean(&result.document);

        let moved = apply(
            &result.document,
            Mutation::MoveNode {
                node_id: icon.clone(),
                new_parent_id: card_bar.clone(),
                index: 1,
            },
        );
        assert!(moved.is_applied());
        assert_eq!(children(&moved.document, &card_bar)[1], icon);
        assert_lint_clean(&moved.document);
    }

    #[test]
    fn test_variant_reorder_keeps_default_first() {
        let mut doc = document_with(&["button"]);
        for _ in 0..2 {
            doc = apply(
                &doc,
                Mutation::AddVariant {
                    component_type: ComponentType::from("button"),
                },
            )
            .document;
        }
        let variants = doc.board("button").unwrap().variants.clone();
        let last = variants[2].clone();

        let moved = apply(
            &doc,
            Mutation::ReorderVariant {
                variant_id: last.clone(),
                new_index: 1,
            },
        );
        assert_eq!(
            moved.document.board("button").unwrap().variants,
            vec![variants[0].clone(), last.clone(), variants[1].clone()]
        );

        let to_front = apply(
            &doc,
            Mutation::ReorderVariant {
                variant_id: last,
                new_index: 0,
            },
        );
        assert!(matches!(
            to_front.outcome,
            Outcome::Noop {
                reason: NoopReason::DefaultVariantPinned { .. }
            }
        ));

        let default = apply(
            &doc,
            Mutation::ReorderVariant {
                variant_id: variants[0].clone(),
                new_index: 1,
            },
        );
        assert!(default.is_noop());
    }
}

mod fields {
    use super::*;

    #[test]
    fn test_property_override_survives_template_edit() {
        let doc = document_with(&["button-bar"]);
        let primary = child(&doc, "variant-button-bar-default", 0);
        let secondary = child(&doc, "variant-button-bar-default", 1);
        let button = NodeId::from("variant-button-default");

        let doc = apply(
            &doc,
            Mutation::SetProperty {
                node_id: secondary.clone(),
                key: "size".to_string(),
                value: json!("large"),
            },
        )
        .document;
        let after = apply(
            &doc,
            Mutation::SetProperty {
                node_id: button.clone(),
                key: "size".to_string(),
                value: json!("small"),
            },
        )
        .document;

        assert_eq!(property(&after, &button, "size"), Some(json!("small")));
        assert_eq!(property(&after, &primary, "size"), Some(json!("small")));
        assert_eq!(property(&after, &secondary, "size"), Some(json!("large")));
    }

    #[test]
    fn test_override_equal_to_template_value_survives() {
        let doc = document_with(&["button-bar"]);
        let primary = child(&doc, "variant-button-bar-default", 0);
        let secondary = child(&doc, "variant-button-bar-default", 1);
        let button = NodeId::from("variant-button-default");
        assert_eq!(property(&doc, &primary, "size"), Some(json!("medium")));

        let doc = apply(
            &doc,
            Mutation::SetProperty {
                node_id: primary.clone(),
                key: "size".to_string(),
                value: json!("medium"),
            },
        )
        .document;
        let after = apply(
            &doc,
            Mutation::SetProperty {
                node_id: button,
                key: "size".to_string(),
                value: json!("small"),
            },
        )
        .document;

        assert_eq!(property(&after, &primary, "size"), Some(json!("medium")));
        assert_eq!(property(&after, &secondary, "size"), Some(json!("small")));
    }

    #[test]
    fn test_new_instances_inherit_instead_of_copying() {
        let doc = document_with(&["button-bar"]);
        let bar = NodeId::from("variant-button-bar-default");
        let (doc, placed) = insert(&doc, &bar, 2, "variant-button-default");

        let node = doc.node(placed.as_str()).unwrap();
        assert!(node.data().properties.is_empty());
        assert_eq!(node.data().theme, None);
        assert_eq!(property(&doc, &placed, "size"), Some(json!("medium")));

        let after = apply(
            &doc,
            Mutation::RemoveProperty {
                node_id: NodeId::from("variant-button-default"),
                key: "size".to_string(),
            },
        )
        .document;
        assert_eq!(property(&after, &placed, "size"), None);
    }

    #[test]
    fn test_remove_property_reaches_mirrors() {
        let doc = document_with(&["button-bar"]);
        let button = NodeId::from("variant-button-default");

        let after = apply(
            &doc,
            Mutation::RemoveProperty {
                node_id: button.clone(),
                key: "size".to_string(),
            },
        )
        .document;

        assert_eq!(property(&after, &button, "size"), None);
        for instance in children(&after, &NodeId::from("variant-button-bar-default")) {
            assert_eq!(property(&after, &instance, "size"), None);
        }
    }

    #[test]
    fn test_variant_theme_reaches_its_subtree() {
        let doc = document_with(&["button-bar"]);
        let button = NodeId::from("variant-button-default");
        let label = child(&doc, button.as_str(), 0);

        let after = apply(
            &doc,
            Mutation::SetTheme {
                node_id: button.clone(),
                theme: Some(ThemeRef::from("dark")),
            },
        )
        .document;

        let dark = Some(ThemeRef::from("dark"));
        assert_eq!(after.node(button.as_str()).unwrap().data().theme, dark);
        assert_eq!(after.node(label.as_str()).unwrap().data().theme, dark);
        for instance in children(&after, &NodeId::from("variant-button-bar-default")) {
            assert_eq!(after.resolved_theme(instance.as_str()), dark.as_ref());
            let nested = child(&after, instance.as_str(), 0);
            assert_eq!(after.resolved_theme(nested.as_str()), dark.as_ref());
        }
    }

    #[test]
    fn test_label_edit_stays_local() {
        let doc = document_with(&["button-bar"]);
        let button = NodeId::from("variant-button-default");

        let after = apply(
            &doc,
            Mutation::SetLabel {
                node_id: button.clone(),
                label: "Action".to_string(),
            },
        )
        .document;

        assert_eq!(after.node(button.as_str()).unwrap().data().label, "Action");
        let primary = child(&after, "variant-button-bar-default", 0);
        assert_eq!(after.node(primary.as_str()).unwrap().data().label, "Primary");
    }

    #[test]
    fn test_board_fields() {
        let doc = document_with(&["button"]);
        let button = ComponentType::from("button");

        let doc = apply(
            &doc,
            Mutation::SetBoardLabel {
                component_type: button.clone(),
                label: "Buttons".to_string(),
            },
        )
        .document;
        let doc = apply(
            &doc,
            Mutation::SetBoardTheme {
                component_type: button.clone(),
                theme: ThemeRef::from("dark"),
            },
        )
        .document;
        let doc = apply(
            &doc,
            Mutation::SetBoardProperty {
                component_type: button.clone(),
                key: "grid".to_string(),
                value: json!(8),
            },
        )
        .document;

        let board = doc.board("button").unwrap();
        assert_eq!(board.label, "Buttons");
        assert_eq!(board.theme, ThemeRef::from("dark"));
        assert_eq!(board.properties.get("grid"), Some(&json!(8)));
    }
}
