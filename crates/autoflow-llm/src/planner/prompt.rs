use autoflow_core::Catalog;

pub(crate) const GRAPH_TEMPLATE: &str = r#"{
  "nodes": [
    {
      "id": "trigger1",
      "name": "Schedule Trigger",
      "type": "n8n-nodes-base.cron",
      "typeVersion": 1,
      "parameters": {"mode": "custom", "cronExpression": "0 10 * * 1", "timezone": "UTC"},
      "position": [240, 300],
      "disabled": false
    },
    {
      "id": "gmail1",
      "name": "Get Unread Emails",
      "type": "n8n-nodes-base.googleGmail",
      "typeVersion": 1,
      "parameters": {"resource": "message", "operation": "getAll"},
      "position": [460, 300],
      "disabled": false
    },
    {
      "id": "code1",
      "name": "Validate Emails",
      "type": "n8n-nodes-base.code",
      "typeVersion": 1,
      "parameters": {"functionCode": "const forbidden = ['spam', 'scam', 'viagra', 'offensive'];\nconst clean = items.filter(item => {\n  const text = ((item.json.subject || '') + ' ' + (item.json.snippet || '')).toLowerCase();\n  return !forbidden.some(word => text.includes(word));\n});\nreturn clean.map(item => ({ json: { ...item.json, filteredCount: clean.length, flaggedCount: items.length - clean.length } }));"},
      "position": [680, 300],
      "disabled": false
    },
    {
      "id": "aggregate1",
      "name": "Aggregate Emails",
      "type": "n8n-nodes-base.aggregate",
      "typeVersion": 1,
      "parameters": {"aggregation": {"mode": "append", "fields": [{"fieldName": "*", "aggregatedAs": "emails", "aggregationFunction": "append"}]}},
      "position": [900, 300],
      "disabled": false
    },
    {
      "id": "email1",
      "name": "Send Summary",
      "type": "n8n-nodes-base.emailSend",
      "typeVersion": 1,
      "parameters": {"fromEmail": "bot@example.com", "toEmail": "me@example.com", "subject": "Summary", "text": "={{$json.summary}}"},
      "position": [1120, 300],
      "disabled": false
    }
  ],
  "connections": {
    "Schedule Trigger": {"main": [[{"node": "Get Unread Emails", "type": "main", "index": 0}]]},
    "Get Unread Emails": {"main": [[{"node": "Validate Emails", "type": "main", "index": 0}]]},
    "Validate Emails": {"main": [[{"node": "Aggregate Emails", "type": "main", "index": 0}]]},
    "Aggregate Emails": {"main": [[{"node": "Send Summary", "type": "main", "index": 0}]]}
  }
}"#;

/// Build the plan-generation system prompt from the node kinds in `catalog`.
pub(crate) fn planner_system_prompt(catalog: &Catalog) -> String {
    let mut kinds = String::new();
    for kind in catalog.kinds() {
        let entry = catalog.entry(kind);
        let aliases = entry.map(|e| e.aliases.join(", ")).unwrap_or_default();
        let required = entry.map(|e| e.required_params.join(", ")).unwrap_or_default();
        kinds.push_str(&format!("- {}", kind));
        if !aliases.is_empty() {
            kinds.push_str(&format!(" (aliases: {})", aliases));
        }
        if !required.is_empty() {
            kinds.push_str(&format!("; required parameters: {}", required));
        }
        kinds.push('\n');
    }

    format!(
        r#"You are an expert n8n workflow architect. Turn the user's request into a complete n8n workflow graph.

Rules:
1. Respond with a single JSON object with a "nodes" array and a "connections" object. No prose, no comments.
2. Every node has "id", "name", "type", "typeVersion", "parameters" and "position".
3. Include every required parameter for the node type.
4. Use n8n expression syntax for dynamic values: ={{{{$json.field}}}}.
5. Connect nodes sequentially unless the request needs branching.
6. Always use node NAMES in connections, not ids.
7. Start the workflow with a trigger node.
8. Whenever the workflow reads email, add a code node named "Validate Emails" right after the mail reader. It drops every item whose subject or snippet contains one of the forbidden words 'spam', 'scam', 'viagra' or 'offensive', and reports filteredCount and flaggedCount.
9. Follow "Validate Emails" with an aggregate node named "Aggregate Emails" that collects all items into an "emails" field before they are summarized or sent.

Supported node types:
{kinds}
Example:
{template}"#,
        kinds = kinds,
        template = GRAPH_TEMPLATE,
    )
}
