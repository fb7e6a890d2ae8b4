use super::*;
use crate::{
    CODE_KIND, Catalog, CatalogEntry, MAIL_READER_KIND, ValidationError, validate_workflow,
};
use serde_json::json;

// ── Helpers ─────────────────────────────────────────────────────

fn run(raw: Value) -> Normalized {
    normalize_named(&raw, &Catalog::builtin(), "Test Workflow")
}

fn edge_pairs(workflow: &Workflow) -> Vec<(String, String)> {
    workflow
        .edges()
        .map(|e| (e.from.to_string(), e.to.to_string()))
        .collect()
}

// ── Fallback ────────────────────────────────────────────────────

#[test]
fn test_fallback_for_missing_or_empty_nodes() {
    for raw in [json!({}), json!({"nodes": []}), json!("free text"), json!({"nodes": "x"})] {
        let result = run(raw);
        assert!(result.fallback);
        assert!(!result.warnings.is_empty());

        let wf = &result.workflow;
        assert_eq!(wf.nodes.len(), 2);
        assert_eq!(wf.nodes[0].kind, SCHEDULER_KIND);
        assert_eq!(wf.nodes[1].kind, MAIL_SEND_KIND);
        assert_eq!(
            edge_pairs(wf),
            vec![("Schedule Trigger".to_string(), "Send Notification".to_string())]
        );
        assert!(validate_workflow(wf, &Catalog::builtin()).is_ok());
    }
}

#[test]
fn test_fallback_when_every_node_is_malformed() {
    let result = run(json!({"nodes": ["gmail", 3, null]}));
    assert!(result.fallback);
    assert_eq!(result.warnings.len(), 4);
}

#[test]
fn test_fallback_nodes_have_full_defaults() {
    let wf = fallback_workflow(&Catalog::builtin(), "Fallback");
    assert_eq!(wf.name, "Fallback");
    assert!(!wf.active);
    assert_eq!(wf.nodes[0].parameters["cronExpression"], json!("0 10 * * 1"));
    assert!(wf.nodes[0].credentials.is_none());
    assert!(wf.nodes[1].credentials.as_ref().unwrap().contains_key("smtp"));
}

// ── Edges ───────────────────────────────────────────────────────

#[test]
fn test_dangling_edge_dropped() {
    let result = run(json!({
        "nodes": [{"id": "a", "kind": "scheduler"}],
        "connections": {"a": ["ghost"]}
    }));
    assert!(!result.fallback);
    assert_eq!(result.workflow.nodes.len(), 1);
    assert_eq!(result.workflow.nodes[0].id, "a");
    assert!(result.workflow.connections.is_empty());
    assert!(result.warnings.iter().any(|w| w.contains("ghost")));
}

#[test]
fn test_chain_synthesis_when_no_edges() {
    let result = run(json!({
        "nodes": [
            {"id": "a", "kind": "scheduler"},
            {"id": "b", "kind": "mail-send"}
        ],
        "connections": {}
    }));
    assert_eq!(edge_pairs(&result.workflow), vec![("a".to_string(), "b".to_string())]);
}

#[test]
fn test_chain_synthesis_when_every_edge_dangles() {
    let result = run(json!({
        "nodes": [{"id": "a", "type": "code"}, {"id": "b", "type": "code"}, {"id": "c", "type": "code"}],
        "connections": {"a": ["x"], "y": ["b"]}
    }));
    assert_eq!(
        edge_pairs(&result.workflow),
        vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string())
        ]
    );
}

#[test]
fn test_branching_connections_by_id() {
    let result = run(json!({
        "nodes": [
            {"id": "trigger1", "type": "schedule"},
            {"id": "check", "type": "if"},
            {"id": "A", "type": "doA"},
            {"id": "B", "type": "doB"}
        ],
        "connections": {
            "trigger1": ["check"],
            "check": ["A", "B"],
            "A": ["B"]
        }
    }));
    let edges = edge_pairs(&result.workflow);
    assert_eq!(edges.len(), 4);
    assert!(edges.contains(&("check".to_string(), "A".to_string())));
    assert!(edges.contains(&("check".to_string(), "B".to_string())));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_connections_resolve_ids_to_names() {
    let result = run(json!({
        "nodes": [
            {"id": "t", "name": "Schedule Trigger", "type": "schedule"},
            {"id": "m", "name": "Send Summary", "type": "sendEmail"}
        ],
        "connections": {"t": "m"}
    }));
    assert_eq!(
        edge_pairs(&result.workflow),
        vec![("Schedule Trigger".to_string(), "Send Summary".to_string())]
    );
}

#[test]
fn test_id_takes_priority_over_name() {
    // "b" is both the id of the second node and the name of the first.
    let result = run(json!({
        "nodes": [
            {"id": "a", "name": "b", "type": "code"},
            {"id": "b", "name": "c", "type": "code"}
        ],
        "connections": {"b": ["a"]}
    }));
    assert_eq!(edge_pairs(&result.workflow), vec![("c".to_string(), "b".to_string())]);
}

#[test]
fn test_platform_native_connections() {
    let result = run(json!({
        "nodes": [
            {"id": "t", "name": "Schedule Trigger", "type": "schedule"},
            {"id": "g", "name": "Get Unread Emails", "type": "gmail"},
            {"id": "s", "name": "Send Summary", "type": "sendEmail"}
        ],
        "connections": {
            "Schedule Trigger": {"main": [[{"node": "Get Unread Emails", "type": "main", "index": 0}]]},
            "Get Unread Emails": {"main": [[{"node": "Send Summary", "type": "main", "index": 0}]]}
        }
    }));
    assert_eq!(result.workflow.edge_count(), 2);
    assert!(result.warnings.is_empty());
    assert_eq!(
        serde_json::to_value(&result.workflow.connections["Schedule Trigger"]).unwrap(),
        json!({"main": [[{"node": "Get Unread Emails", "type": "main", "index": 0}]]})
    );
}

#[test]
fn test_edge_list_form() {
    let result = run(json!({
        "nodes": [{"id": "a", "type": "code"}, {"id": "b", "type": "code"}, {"id": "c", "type": "code"}],
        "edges": [{"from": "a", "to": "c"}, {"source": "c", "target": "b"}]
    }));
    assert_eq!(
        edge_pairs(&result.workflow),
        vec![
            ("a".to_string(), "c".to_string()),
            ("c".to_string(), "b".to_string())
        ]
    );
}

// ── Node defaults ───────────────────────────────────────────────

#[test]
fn test_node_field_defaults() {
    let result = run(json!({
        "nodes": [
            {"type": "code"},
            {"id": "second", "type": "code", "typeVersion": 2, "disabled": true},
            {"id": "third", "name": "Third", "type": "code", "position": [10, 20.4]}
        ]
    }));
    let nodes = &result.workflow.nodes;

    assert_eq!(nodes[0].id, "node_1");
    assert_eq!(nodes[0].name, "node_1");
    assert_eq!(nodes[0].version, 1);
    assert_eq!(nodes[0].position, layout_position(0));
    assert!(!nodes[0].disabled);

    assert_eq!(nodes[1].name, "second");
    assert_eq!(nodes[1].version, 2);
    assert!(nodes[1].disabled);
    assert_eq!(nodes[1].position, layout_position(1));

    assert_eq!(nodes[2].name, "Third");
    assert_eq!(nodes[2].position, Position { x: 10, y: 20 });
}

#[test]
fn test_layout_alternates_rows() {
    let p: Vec<Position> = (0..4).map(layout_position).collect();
    assert_eq!(p[0], Position { x: 240, y: 300 });
    assert_eq!(p[1], Position { x: 460, y: 420 });
    assert_eq!(p[2], Position { x: 680, y: 300 });
    assert!(p.windows(2).all(|w| w[1].x > w[0].x));
}

#[test]
fn test_aliases_resolve_and_unknown_kinds_pass_through() {
    let result = run(json!({
        "nodes": [
            {"id": "a", "type": "gmail"},
            {"id": "b", "type": "n8n-nodes-base.slack", "parameters": {"channel": "#ops"},
             "credentials": {"slackApi": {"id": "7", "name": "Slack"}}}
        ]
    }));
    let nodes = &result.workflow.nodes;
    assert_eq!(nodes[0].kind, MAIL_READER_KIND);
    assert_eq!(nodes[0].parameters["operation"], json!("getAll"));
    assert_eq!(nodes[1].kind, "n8n-nodes-base.slack");
    assert_eq!(nodes[1].parameters, json!({"channel": "#ops"}).as_object().cloned().unwrap());
    assert!(nodes[1].credentials.as_ref().unwrap().contains_key("slackApi"));
}

#[test]
fn test_missing_type_is_left_for_validation() {
    let result = run(json!({"nodes": [{"id": "a"}]}));
    assert_eq!(result.workflow.nodes[0].kind, "");
    let err = validate_workflow(&result.workflow, &Catalog::builtin()).unwrap_err();
    assert_eq!(
        err.violations(),
        &[ValidationError::MissingNodeField {
            node: "'a'".into(),
            field: "type".into()
        }]
    );
}

#[test]
fn test_duplicate_ids_and_names_are_repaired() {
    let result = run(json!({
        "nodes": [
            {"id": "a", "name": "Step", "type": "code"},
            {"id": "a", "name": "Step", "type": "code"}
        ]
    }));
    let nodes = &result.workflow.nodes;
    assert_eq!(nodes[1].id, "node_2");
    assert_eq!(nodes[1].name, "Step 2");
    assert!(validate_workflow(&result.workflow, &Catalog::builtin()).is_ok());
}

// ── Parameters & credentials ────────────────────────────────────

#[test]
fn test_parameters_merge_input_wins() {
    let result = run(json!({
        "nodes": [{"id": "g", "type": "gmail", "parameters": {
            "limit": 5,
            "filters": {"labelIds": ["INBOX"]}
        }}]
    }));
    let params = &result.workflow.nodes[0].parameters;
    assert_eq!(params["limit"], json!(5));
    assert_eq!(params["resource"], json!("message"));
    assert_eq!(
        params["filters"],
        json!({"labelIds": ["INBOX"], "includeSpamTrash": false})
    );
}

#[test]
fn test_required_parameters_satisfied_after_normalization() {
    let raw = json!({"nodes": [{"id": "send", "type": "mail-send", "parameters": {}}]});

    let mut unnormalized = Workflow::new("Raw");
    unnormalized
        .nodes
        .push(crate::Node::new("send", MAIL_SEND_KIND, Position::default()));
    let err = validate_workflow(&unnormalized, &Catalog::builtin()).unwrap_err();
    assert!(matches!(
        &err.violations()[0],
        ValidationError::MissingRequiredParameter { keys, .. }
            if keys == &vec!["fromEmail".to_string(), "toEmail".to_string(), "subject".to_string()]
    ));

    let result = run(raw);
    assert!(validate_workflow(&result.workflow, &Catalog::builtin()).is_ok());
}

#[test]
fn test_trigger_credentials_are_stripped() {
    let result = run(json!({"nodes": [{
        "id": "t", "type": "scheduler",
        "credentials": {"cronApi": {"id": "1", "name": "nope"}}
    }]}));
    assert!(result.workflow.nodes[0].credentials.is_none());
}

#[test]
fn test_credential_placeholder_and_supplied_reference() {
    let result = run(json!({"nodes": [
        {"id": "a", "type": "openai"},
        {"id": "b", "type": "openai", "credentials": {"openAiApi": {"id": "42", "name": "Prod"}}},
        {"id": "c", "type": "code", "credentials": {"x": {"id": "1"}}}
    ]}));
    let nodes = &result.workflow.nodes;
    assert_eq!(
        nodes[0].credentials.as_ref().unwrap()["openAiApi"],
        json!({"id": "1", "name": "OpenAI Account"})
    );
    assert_eq!(nodes[1].credentials.as_ref().unwrap()["openAiApi"]["id"], json!("42"));
    assert!(nodes[2].credentials.is_none());
}

#[test]
fn test_mail_send_message_renamed_to_text() {
    let result = run(json!({"nodes": [{"id": "m", "type": "sendEmail", "parameters": {
        "message": "Hello",
        "options": {"cc": "", "bcc": null, "replyTo": "", "priority": "high"}
    }}]}));
    let params = &result.workflow.nodes[0].parameters;
    assert!(!params.contains_key("message"));
    assert_eq!(params["text"], json!("Hello"));
    assert_eq!(
        params["options"],
        json!({"allowUnauthorizedCerts": false, "priority": "high"})
    );
}

#[test]
fn test_empty_optionals_dropped() {
    let result = run(json!({"nodes": [{"id": "x", "type": "code", "parameters": {
        "cc": "", "attachments": [], "keep": "", "options": {"replyTo": " "}
    }}]}));
    let params = &result.workflow.nodes[0].parameters;
    assert!(!params.contains_key("cc"));
    assert!(!params.contains_key("attachments"));
    assert!(!params.contains_key("options"));
    assert_eq!(params["keep"], json!(""));
}

#[test]
fn test_substitute_catalog() {
    let catalog = Catalog::builder()
        .entry(
            CatalogEntry::new("acme.widget")
                .aliases(&["widget"])
                .requires(&["size"])
                .defaults(json!({"size": 3}))
                .credential("acmeApi", "Acme"),
        )
        .build();
    let result = normalize_named(&json!({"nodes": [{"type": "widget"}]}), &catalog, "W");
    let node = &result.workflow.nodes[0];
    assert_eq!(node.kind, "acme.widget");
    assert_eq!(node.parameters["size"], json!(3));
    assert!(node.credentials.is_some());
    assert!(validate_workflow(&result.workflow, &catalog).is_ok());
}

// ── Properties ──────────────────────────────────────────────────

fn sample_plan() -> Value {
    json!({
        "nodes": [
            {"id": "trigger1", "name": "Schedule Trigger", "type": "schedule",
             "parameters": {"cronExpression": "0 9 * * 1"}},
            {"id": "gmail1", "name": "Get Unread Emails", "type": "gmail"},
            {"id": "agg", "name": "Aggregate Emails", "type": "aggregate"},
            {"id": "openai1", "name": "Summarize Emails", "type": "openai"},
            {"id": "email1", "name": "Send Summary", "type": "sendEmail",
             "parameters": {"message": "={{$json.text}}", "options": {"cc": ""}}},
            {"id": "code1", "type": CODE_KIND, "disabled": true}
        ],
        "connections": {
            "trigger1": ["gmail1"],
            "gmail1": ["agg"],
            "agg": ["openai1"],
            "openai1": ["email1"]
        }
    })
}

#[test]
fn test_normalize_is_idempotent() {
    let first = run(sample_plan());
    let again = run(serde_json::to_value(&first.workflow).unwrap());
    assert_eq!(again.workflow, first.workflow);
    assert!(again.warnings.is_empty());
}

#[test]
fn test_renormalizing_keeps_edges_when_names_shadow_ids() {
    // The first node's name is the second node's id.
    let first = run(json!({
        "nodes": [
            {"id": "a", "name": "b", "type": "code"},
            {"id": "b", "name": "c", "type": "code"}
        ],
        "connections": {"b": ["a"]}
    }));
    assert_eq!(edge_pairs(&first.workflow), vec![("c".to_string(), "b".to_string())]);

    let again = run(serde_json::to_value(&first.workflow).unwrap());
    assert_eq!(edge_pairs(&again.workflow), vec![("c".to_string(), "b".to_string())]);
    assert_eq!(again.workflow, first.workflow);
    assert!(again.warnings.is_empty());
}

#[test]
fn test_normalize_is_deterministic() {
    let a = serde_json::to_string(&run(sample_plan()).workflow).unwrap();
    let b = serde_json::to_string(&run(sample_plan()).workflow).unwrap();
    assert_eq!(a, b);

    let named = normalize(&sample_plan(), &Catalog::builtin());
    assert!(named.workflow.name.starts_with("Workflow "));
    assert_eq!(named.workflow.nodes, run(sample_plan()).workflow.nodes);
}

#[test]
fn test_sample_plan_validates() {
    let result = run(sample_plan());
    assert!(!result.fallback);
    assert!(validate_workflow(&result.workflow, &Catalog::builtin()).is_ok());
    assert_eq!(result.workflow.edge_count(), 4);
    assert_eq!(
        result.workflow.execution_order(),
        vec![
            "Schedule Trigger",
            "Get Unread Emails",
            "Aggregate Emails",
            "Summarize Emails",
            "Send Summary"
        ]
    );
}
