//! Default Catalog: per-kind parameter defaults, required keys and credential
//! placeholders.
//!
//! The catalog is built once and handed by reference to the normalizer and the
//! validator. It is never mutated after `build()`.

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::ParameterSet;

/// Bumped whenever builtin defaults change shape.
pub const CATALOG_VERSION: u32 = 1;

pub const SCHEDULER_KIND: &str = "n8n-nodes-base.cron";
pub const MAIL_READER_KIND: &str = "n8n-nodes-base.googleGmail";
pub const SUMMARIZER_KIND: &str = "n8n-nodes-base.openai";
pub const MAIL_SEND_KIND: &str = "n8n-nodes-base.emailSend";
pub const CONDITIONAL_KIND: &str = "n8n-nodes-base.if";
pub const HTTP_KIND: &str = "n8n-nodes-base.httpRequest";
pub const CODE_KIND: &str = "n8n-nodes-base.code";
pub const AGGREGATE_KIND: &str = "n8n-nodes-base.aggregate";

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub kind: String,
    pub aliases: Vec<String>,
    pub required_params: Vec<String>,
    pub default_params: ParameterSet,
    /// Credential placeholder attached to nodes of this kind, if any.
    pub credentials: Option<ParameterSet>,
    /// Trigger kinds start a workflow and never carry credentials.
    pub is_trigger: bool,
}

impl CatalogEntry {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            aliases: vec![],
            required_params: vec![],
            default_params: ParameterSet::new(),
            credentials: None,
            is_trigger: false,
        }
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn requires(mut self, keys: &[&str]) -> Self {
        self.required_params = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Non-object values are ignored.
    pub fn defaults(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.default_params = map;
        }
        self
    }

    /// Placeholder of the form `{credential_type: {id: "1", name}}`.
    pub fn credential(mut self, credential_type: &str, name: &str) -> Self {
        let mut creds = ParameterSet::new();
        creds.insert(credential_type.to_string(), json!({"id": "1", "name": name}));
        self.credentials = Some(creds);
        self
    }

    /// Whether nodes of this kind get a credential attached.
    pub fn requires_credential(&self) -> bool {
        !self.is_trigger && self.credentials.is_some()
    }

    /// Required keys that are absent (or null) in `params`.
    pub fn missing_params(&self, params: &ParameterSet) -> Vec<String> {
        self.required_params
            .iter()
            .filter(|key| params.get(key.as_str()).is_none_or(Value::is_null))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    version: u32,
    entries: HashMap<String, CatalogEntry>,
    /// Lower-cased alias -> canonical kind.
    aliases: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    version: u32,
    entries: Vec<CatalogEntry>,
}

impl CatalogBuilder {
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn entry(mut self, entry: CatalogEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> Catalog {
        let mut entries = HashMap::new();
        let mut aliases = HashMap::new();
        for entry in self.entries {
            for alias in &entry.aliases {
                aliases.insert(alias.to_lowercase(), entry.kind.clone());
            }
            aliases.insert(entry.kind.to_lowercase(), entry.kind.clone());
            entries.insert(entry.kind.clone(), entry);
        }
        Catalog {
            version: self.version,
            entries,
            aliases,
        }
    }
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map a raw kind (canonical id or alias, any case) to its canonical id.
    /// Unknown kinds come back unchanged.
    pub fn resolve_kind<'a>(&'a self, raw: &'a str) -> &'a str {
        if self.entries.contains_key(raw) {
            return raw;
        }
        self.aliases
            .get(&raw.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(raw)
    }

    pub fn entry(&self, kind: &str) -> Option<&CatalogEntry> {
        self.entries.get(kind)
    }

    pub fn is_trigger(&self, kind: &str) -> bool {
        self.entry(kind).is_some_and(|e| e.is_trigger)
    }

    /// Canonical kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// The builtin catalog for the workflow platform's base node set.
    pub fn builtin() -> Self {
        Catalog::builder()
            .version(CATALOG_VERSION)
            .entry(
                CatalogEntry::new(SCHEDULER_KIND)
                    .trigger()
                    .aliases(&["schedule", "scheduler", "scheduleTrigger", "cron"])
                    .requires(&["mode"])
                    .defaults(json!({
                        "mode": "custom",
                        "cronExpression": "0 10 * * 1",
                        "timezone": "UTC"
                    })),
            )
            .entry(
                CatalogEntry::new(MAIL_READER_KIND)
                    .aliases(&["gmail", "mail-reader"])
                    .requires(&["resource", "operation"])
                    .defaults(json!({
                        "resource": "message",
                        "operation": "getAll",
                        "returnAll": true,
                        "limit": 50,
                        "simple": false,
                        "filters": {
                            "labelIds": ["UNREAD"],
                            "includeSpamTrash": false
                        },
                        "options": {
                            "attachments": false,
                            "format": "full"
                        }
                    }))
                    .credential("googleApi", "Google Account"),
            )
            .entry(
                CatalogEntry::new(SUMMARIZER_KIND)
                    .aliases(&["openai", "text-summarizer"])
                    .requires(&["messagesUi"])
                    .defaults(json!({
                        "resource": "chat",
                        "operation": "chat",
                        "model": "gpt-4o-mini",
                        "options": {
                            "temperature": 0.3,
                            "maxTokens": 1000
                        },
                        "messagesUi": {
                            "messageValues": [
                                {
                                    "role": "system",
                                    "content": "You are a helpful assistant that summarizes emails. Create a concise summary in markdown format."
                                },
                                {
                                    "role": "user",
                                    "content": "={{$json.emails.map(email => `Subject: ${email.subject}\\nFrom: ${email.from}\\nSnippet: ${email.snippet}`).join('\\n\\n')}}"
                                }
                            ]
                        },
                        "simplifyOutput": false
                    }))
                    .credential("openAiApi", "OpenAI Account"),
            )
            .entry(
                CatalogEntry::new(MAIL_SEND_KIND)
                    .aliases(&["sendEmail", "mail-send", "email"])
                    .requires(&["fromEmail", "toEmail", "subject"])
                    .defaults(json!({
                        "fromEmail": "noreply@example.com",
                        "toEmail": "user@example.com",
                        "subject": "Workflow notification - {{$now.format('YYYY-MM-DD')}}",
                        "text": "={{$json.message.content || $json}}",
                        "options": {
                            "allowUnauthorizedCerts": false,
                            "priority": "normal"
                        },
                        "transport": "smtp"
                    }))
                    .credential("smtp", "SMTP Account"),
            )
            .entry(
                CatalogEntry::new(CONDITIONAL_KIND)
                    .aliases(&["if", "conditional"])
                    .requires(&["conditions"])
                    .defaults(json!({
                        "conditions": {
                            "boolean": [],
                            "number": [
                                {
                                    "value1": "={{$json.count}}",
                                    "operation": "larger",
                                    "value2": 0
                                }
                            ],
                            "string": []
                        },
                        "combineOperation": "all"
                    })),
            )
            .entry(
                CatalogEntry::new(HTTP_KIND)
                    .aliases(&["httpRequest", "http-call", "http"])
                    .requires(&["method", "url"])
                    .defaults(json!({
                        "method": "GET",
                        "url": "",
                        "authentication": "none",
                        "options": {
                            "response": {
                                "response": {"responseFormat": "json"}
                            }
                        }
                    }))
                    .credential("httpBasicAuth", "HTTP Basic Auth"),
            )
            .entry(
                CatalogEntry::new(CODE_KIND)
                    .aliases(&["code", "code-exec"])
                    .requires(&["functionCode"])
                    .defaults(json!({"functionCode": "return items;"})),
            )
            .entry(
                CatalogEntry::new(AGGREGATE_KIND)
                    .aliases(&["aggregate", "aggregator", "itemLists"])
                    .requires(&["aggregation"])
                    .defaults(json!({
                        "aggregation": {
                            "mode": "append",
                            "fields": [
                                {
                                    "fieldName": "*",
                                    "aggregatedAs": "emails",
                                    "aggregationFunction": "append"
                                }
                            ]
                        },
                        "options": {}
                    })),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_every_kind() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.version(), CATALOG_VERSION);
        assert_eq!(catalog.len(), 8);
        for kind in catalog.kinds() {
            let entry = catalog.entry(kind).unwrap();
            assert!(!entry.required_params.is_empty(), "{kind} has no required params");
            assert!(
                entry.missing_params(&entry.default_params).is_empty(),
                "{kind} defaults do not satisfy its own required params"
            );
        }
    }

    #[test]
    fn test_resolve_aliases() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.resolve_kind("scheduler"), SCHEDULER_KIND);
        assert_eq!(catalog.resolve_kind("schedule"), SCHEDULER_KIND);
        assert_eq!(catalog.resolve_kind("mail-send"), MAIL_SEND_KIND);
        assert_eq!(catalog.resolve_kind("sendEmail"), MAIL_SEND_KIND);
        assert_eq!(catalog.resolve_kind("Gmail"), MAIL_READER_KIND);
        assert_eq!(catalog.resolve_kind(MAIL_SEND_KIND), MAIL_SEND_KIND);
    }

    #[test]
    fn test_unknown_kind_passes_through() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.resolve_kind("n8n-nodes-base.slack"), "n8n-nodes-base.slack");
        assert!(catalog.entry("n8n-nodes-base.slack").is_none());
    }

    #[test]
    fn test_trigger_never_requires_credential() {
        let entry = CatalogEntry::new("x").trigger().credential("api", "API");
        assert!(!entry.requires_credential());

        let catalog = Catalog::builtin();
        assert!(catalog.is_trigger(SCHEDULER_KIND));
        assert!(!catalog.entry(SCHEDULER_KIND).unwrap().requires_credential());
        assert!(catalog.entry(MAIL_SEND_KIND).unwrap().requires_credential());
        assert!(!catalog.entry(CODE_KIND).unwrap().requires_credential());
    }

    #[test]
    fn test_missing_params_treats_null_as_missing() {
        let entry = CatalogEntry::new("x").requires(&["a", "b"]);
        let mut params = ParameterSet::new();
        params.insert("a".into(), Value::Null);
        assert_eq!(entry.missing_params(&params), vec!["a", "b"]);
    }
}
