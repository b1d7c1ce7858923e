//! Template store with a seeded default.
//!
//! Templates are a local-only singleton file. The store guarantees there is
//! always at least one template and exactly one default.

use chrono::Utc;
use uuid::Uuid;

use super::model::EmailTemplate;
use crate::error::{StageError, StageResult};
use crate::storage::LocalStore;

const DEFAULT_SUBJECT: &str = "I built something for {{business_name}}";
const DEFAULT_BODY: &str = "Hey,\n\nI noticed {{business_name}} in {{city}} could use a stronger \
web presence.\n\nI put together a free preview, no commitment:\n{{website_url}}\n\nIf you like \
it, I can get it live on a real domain for you.\n\nBest,\n{{sender_name}}";

/// Load templates, seeding the default on first access.
pub async fn ensure_templates(local: &LocalStore) -> StageResult<Vec<EmailTemplate>> {
    let existing = local.templates().await?;
    if !existing.is_empty() {
        return Ok(existing);
    }
    let seeded = vec![EmailTemplate {
        id: "default".into(),
        name: "Cold intro".into(),
        subject: DEFAULT_SUBJECT.into(),
        body: DEFAULT_BODY.into(),
        is_default: true,
        created_at: Utc::now(),
    }];
    local.set_templates(&seeded).await?;
    Ok(seeded)
}

pub async fn add_template(
    local: &LocalStore,
    name: &str,
    subject: &str,
    body: &str,
) -> StageResult<()> {
    let mut templates = ensure_templates(local).await?;
    templates.push(EmailTemplate {
        id: Uuid::new_v4().to_string(),
        name: name.into(),
        subject: subject.into(),
        body: body.into(),
        is_default: false,
        created_at: Utc::now(),
    });
    local.set_templates(&templates).await?;
    Ok(())
}

/// Make the named template (case-insensitive) the default.
pub async fn set_default_template(local: &LocalStore, name: &str) -> StageResult<()> {
    let mut templates = ensure_templates(local).await?;
    let mut found = false;
    for template in templates.iter_mut() {
        template.is_default = template.name.eq_ignore_ascii_case(name);
        if template.is_default {
            found = true;
        }
    }
    if !found {
        return Err(StageError::TemplateNotFound(name.into()));
    }
    local.set_templates(&templates).await?;
    Ok(())
}

/// Delete by name; the last template cannot go, and deleting the default
/// promotes the first remaining one.
pub async fn delete_template(local: &LocalStore, name: &str) -> StageResult<()> {
    let mut templates = ensure_templates(local).await?;
    templates.retain(|t| !t.name.eq_ignore_ascii_case(name));
    if templates.is_empty() {
        return Err(StageError::CannotDeleteLastTemplate);
    }
    if !templates.iter().any(|t| t.is_default) {
        templates[0].is_default = true;
    }
    local.set_templates(&templates).await?;
    Ok(())
}

/// Replace every `{{key}}` with its value.
pub fn substitute(text: &str, vars: &[(&str, String)]) -> String {
    let mut out = text.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DataPaths;

    fn local() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_dirs().unwrap();
        (dir, LocalStore::new(paths))
    }

    #[tokio::test]
    async fn first_access_seeds_the_default() {
        let (_dir, local) = local();
        let templates = ensure_templates(&local).await.unwrap();
        assert_eq!(templates.len(), 1);
        assert!(templates[0].is_default);
        assert_eq!(templates[0].name, "Cold intro");
    }

    #[tokio::test]
    async fn default_switches_case_insensitively() {
        let (_dir, local) = local();
        add_template(&local, "Follow up", "Re: {{business_name}}", "Just checking in.")
            .await
            .unwrap();
        set_default_template(&local, "FOLLOW UP").await.unwrap();

        let templates = local.templates().await.unwrap();
        let defaults: Vec<_> = templates.iter().filter(|t| t.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "Follow up");

        let err = set_default_template(&local, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "template_not_found: nope");
    }

    #[tokio::test]
    async fn cannot_delete_last_and_default_is_promoted() {
        let (_dir, local) = local();
        ensure_templates(&local).await.unwrap();
        let err = delete_template(&local, "Cold intro").await.unwrap_err();
        assert_eq!(err.to_string(), "cannot_delete_last_template");

        add_template(&local, "Follow up", "s", "b").await.unwrap();
        delete_template(&local, "Cold intro").await.unwrap();
        let templates = local.templates().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert!(templates[0].is_default, "a default must survive deletion");
    }

    #[test]
    fn substitute_replaces_all_occurrences() {
        let out = substitute(
            "{{a}} and {{a}} besides {{b}}",
            &[("a", "one".into()), ("b", "two".into())],
        );
        assert_eq!(out, "one and one besides two");
    }
}
