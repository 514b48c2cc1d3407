//! Capability invocation commands.

use anyhow::{Context, Result, bail};
use console::style;
use serde_json::{Value, json};

use mnemos_core::memory::builtin::MemoryOperation;
use mnemos_types::profile::OwnerId;

use crate::state::AppState;

/// Resolve the owner, activate the role, optionally grant, invoke, then sync.
///
/// ```bash
/// mnemos invoke 676 SemanticMemory SEMANTICMEMORY add_memories \
///     --args '{"observation": "prefers tea"}' --grant
/// ```
#[allow(clippy::too_many_arguments)]
pub async fn invoke(
    state: &AppState,
    owner: &str,
    entity_name: &str,
    namespace: &str,
    capability: &str,
    args: &str,
    grant: bool,
    json: bool,
) -> Result<()> {
    let args = parse_args(args)?;
    let dispatcher = state.dispatcher()?;

    let mut session = state
        .registry
        .resolve(&OwnerId::from(owner))
        .await
        .with_context(|| format!("failed to resolve owner '{owner}'"))?;

    let entity = state
        .registry
        .activate_role(&mut session, entity_name, namespace)?;
    if grant {
        state
            .registry
            .grant_capability(&mut session, entity, capability)
            .with_context(|| format!("cannot grant '{capability}' to {entity_name}"))?;
    }

    let result = dispatcher
        .invoke(&session, entity, capability, args)
        .await
        .with_context(|| format!("{entity_name}.{capability} failed"))?;

    state
        .registry
        .sync(&mut session)
        .await
        .context("failed to sync the profile schema")?;
    state.registry.close(&mut session);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} {}.{}",
            style("✓").green().bold(),
            style(entity_name).cyan(),
            style(capability).bold(),
        );
        println!();
        println!("{}", serde_json::to_string_pretty(&result)?);
        println!();
    }
    Ok(())
}

/// Print the built-in capability names.
pub fn list_operations(json: bool) -> Result<()> {
    let names: Vec<&str> = MemoryOperation::ALL.iter().map(|op| op.name()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "operations": names }))?);
        return Ok(());
    }

    println!();
    for name in &names {
        println!("  {} {}", style("•").dim(), name);
    }
    println!();
    println!("  {} operations", style(names.len()).bold());
    println!();
    Ok(())
}

/// Capability arguments must be a JSON object.
fn parse_args(raw: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("--args is not valid JSON: {raw}"))?;
    if !value.is_object() {
        bail!("--args must be a JSON object");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_accepts_objects_only() {
        assert!(parse_args(r#"{"observation": "x"}"#).is_ok());
        assert!(parse_args("[1, 2]").is_err());
        assert!(parse_args("not json").is_err());
    }

    #[tokio::test]
    async fn test_invoke_without_api_key_fails_before_resolving() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf(), None).await.unwrap();

        let result = invoke(
            &state,
            "676",
            "SemanticMemory",
            "SEMANTICMEMORY",
            "list_operations",
            "{}",
            true,
            true,
        )
        .await;
        assert!(result.is_err());
    }
}
