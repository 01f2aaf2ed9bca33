use crate::{
    errors::ActionError,
    types::{ElementHandle, FieldSpec, Probe},
};
use async_trait::async_trait;
use cdp_adapter::PageSession;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Attribute stamped on located elements so later CDP commands can address them.
pub const FIELD_ATTR: &str = "data-studylog-field";

/// Resolver responsible for turning a [`FieldSpec`] into a concrete selector
/// that page commands can operate on.
#[async_trait]
pub trait FieldLocator: Send + Sync {
    /// Look the field up without failing when it is absent.
    async fn probe(
        &self,
        page: &dyn PageSession,
        spec: &FieldSpec,
    ) -> Result<Option<Probe>, ActionError>;

    /// First match in document order; zero matches is `FieldNotFound`.
    async fn locate(
        &self,
        page: &dyn PageSession,
        spec: &FieldSpec,
    ) -> Result<ElementHandle, ActionError> {
        self.probe(page, spec)
            .await?
            .map(|probe| probe.handle)
            .ok_or_else(|| ActionError::FieldNotFound(spec.to_string()))
    }
}

/// Default script-based locator that evaluates the lookup in the page.
///
/// Each distinct spec keeps one stamp token for the locator's lifetime, and the
/// lookup clears that stamp from any element other than the current match.
#[derive(Debug, Default)]
pub struct ScriptFieldLocator {
    tokens: DashMap<String, String>,
}

impl ScriptFieldLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp token reused for every lookup of `spec`.
    pub fn token_for(&self, spec: &FieldSpec) -> String {
        self.tokens
            .entry(spec.to_string())
            .or_insert_with(|| format!("f-{}", Uuid::new_v4().simple()))
            .clone()
    }
}

#[async_trait]
impl FieldLocator for ScriptFieldLocator {
    async fn probe(
        &self,
        page: &dyn PageSession,
        spec: &FieldSpec,
    ) -> Result<Option<Probe>, ActionError> {
        let token = self.token_for(spec);
        let expression = locator_script(spec, &token)?;
        let value = page.evaluate(&expression).await?;
        let probe = parse_probe(spec, value)?;
        debug!(
            field = %spec,
            found = probe.is_some(),
            visible = probe.as_ref().map(|p| p.visible).unwrap_or(false),
            "field probe"
        );
        Ok(probe)
    }
}

/// Build the lookup expression for `spec`, tagging the match with `token`.
pub fn locator_script(spec: &FieldSpec, token: &str) -> Result<String, ActionError> {
    let spec_json = serde_json::to_string(spec)
        .map_err(|err| ActionError::Internal(format!("failed to serialize field spec: {err}")))?;
    let attr = json_string(FIELD_ATTR)?;
    let token = json_string(token)?;

    Ok(format!(
        r#"(() => {{
            const spec = {spec_json};
            const attr = {attr};
            const token = {token};
            const collapse = (input) => (input || '').replace(/\s+/g, ' ').trim();
            const normalize = (input) => collapse(input).toLowerCase();
            const compact = (input) => normalize(input).replace(/\s/g, '');
            const IMPLICIT = {{
                textbox: 'input:not([type]), input[type="text"], input[type="email"], input[type="password"], input[type="tel"], input[type="url"], input[type="search"], textarea, [contenteditable="true"]',
                button: 'button, input[type="button"], input[type="submit"], input[type="reset"], input[type="image"], summary',
                link: 'a[href], area[href]',
                combobox: 'select',
                checkbox: 'input[type="checkbox"]',
                radio: 'input[type="radio"]',
                heading: 'h1, h2, h3, h4, h5, h6',
            }};
            const explicitRole = (el) => ((el.getAttribute('role') || '').trim().split(/\s+/)[0] || '').toLowerCase();
            const hasRole = (el, role) => {{
                const explicit = explicitRole(el);
                if (explicit) return explicit === role;
                const selector = IMPLICIT[role];
                return !!selector && el.matches(selector);
            }};
            const hiddenFromTree = (el) => {{
                for (let node = el; node && node.nodeType === 1; node = node.parentElement) {{
                    if (node.hidden || node.getAttribute('aria-hidden') === 'true') return true;
                    if (window.getComputedStyle(node).display === 'none') return true;
                }}
                return window.getComputedStyle(el).visibility === 'hidden';
            }};
            const byRole = (root, role) => {{
                const selector = IMPLICIT[role] ? '[role], ' + IMPLICIT[role] : '[role]';
                return Array.from(root.querySelectorAll(selector))
                    .filter(el => hasRole(el, role) && !hiddenFromTree(el));
            }};
            const labelText = (el) => {{
                if (el.labels && el.labels.length) {{
                    return Array.from(el.labels).map(label => label.textContent || '').join(' ');
                }}
                const wrapping = el.closest ? el.closest('label') : null;
                return wrapping ? (wrapping.textContent || '') : '';
            }};
            const nameSources = (el) => {{
                const labelledby = (el.getAttribute('aria-labelledby') || '')
                    .split(/\s+/)
                    .filter(Boolean)
                    .map(id => document.getElementById(id))
                    .map(node => node ? (node.textContent || '') : '')
                    .join(' ');
                const inputType = (el.getAttribute('type') || '').toLowerCase();
                const buttonValue = el.tagName === 'INPUT' && ['button', 'submit', 'reset'].includes(inputType)
                    ? el.value
                    : '';
                return [
                    el.getAttribute('aria-label'),
                    labelledby,
                    labelText(el),
                    el.getAttribute('placeholder'),
                    el.getAttribute('title'),
                    buttonValue,
                    el.innerText || el.textContent,
                ].map(normalize).filter(Boolean);
            }};
            const nameMatches = (el, wanted) => {{
                if (wanted === undefined || wanted === null) return true;
                const target = normalize(wanted);
                return nameSources(el).some(name => name.includes(target));
            }};
            const isVisible = (el) => {{
                if (!(el instanceof Element) || !el.isConnected) return false;
                const style = window.getComputedStyle(el);
                if (style.visibility === 'hidden' || style.display === 'none') return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }};

            let match = null;
            if (spec.kind === 'css') {{
                match = document.querySelector(spec.selector);
            }} else if (spec.kind === 'role') {{
                match = byRole(document, spec.role).find(el => nameMatches(el, spec.name)) || null;
            }} else if (spec.kind === 'scoped') {{
                const fragments = spec.contains.map(compact);
                const container = Array.from(document.querySelectorAll(spec.container))
                    .find(node => {{
                        const text = compact(node.innerText || node.textContent);
                        return fragments.every(fragment => text.includes(fragment));
                    }});
                if (!container) {{
                    return {{ status: 'not-found', reason: 'container' }};
                }}
                match = byRole(container, spec.role).find(el => nameMatches(el, spec.name)) || null;
            }}

            if (!match) {{
                return {{ status: 'not-found' }};
            }}
            document.querySelectorAll('[' + attr + '="' + token + '"]').forEach(el => {{
                if (el !== match) el.removeAttribute(attr);
            }});
            match.setAttribute(attr, token);
            return {{
                status: 'ok',
                selector: '[' + attr + '="' + token + '"]',
                visible: isVisible(match),
            }};
        }})()"#
    ))
}

fn parse_probe(spec: &FieldSpec, value: Value) -> Result<Option<Probe>, ActionError> {
    match value.get("status").and_then(Value::as_str) {
        Some("ok") => {
            let selector = value
                .get("selector")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ActionError::Internal(format!("locator for {spec} returned no selector"))
                })?;
            Ok(Some(Probe {
                handle: ElementHandle {
                    selector: selector.to_string(),
                    spec: spec.clone(),
                },
                visible: value
                    .get("visible")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            }))
        }
        Some("not-found") => Ok(None),
        _ => Err(ActionError::Internal(format!(
            "unexpected locator response for {spec}: {value}"
        ))),
    }
}

fn json_string(value: &str) -> Result<String, ActionError> {
    serde_json::to_string(value)
        .map_err(|err| ActionError::Internal(format!("failed to encode script literal: {err}")))
}
