//! Profile commands: show and extend an owner's vocabulary.

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use mnemos_core::memory::session::Session;
use mnemos_types::profile::{OwnerId, Vocabulary, VocabularyKind};

use crate::state::AppState;

/// Resolve an owner and print the profile id and vocabulary.
///
/// ```bash
/// mnemos profile show 676
/// ```
pub async fn show_profile(state: &AppState, owner: &str, json: bool) -> Result<()> {
    let owner_id = OwnerId::from(owner);
    let mut session = state
        .registry
        .resolve(&owner_id)
        .await
        .with_context(|| format!("failed to resolve owner '{owner}'"))?;

    print_profile(&session, session.vocabulary(), json)?;
    state.registry.close(&mut session);
    Ok(())
}

/// Add names to the owner's vocabulary and sync them to the store.
///
/// ```bash
/// mnemos profile extend 676 --attribute mood --capability summarize
/// ```
pub async fn extend_profile(
    state: &AppState,
    owner: &str,
    attributes: &[String],
    capabilities: &[String],
    json: bool,
) -> Result<()> {
    if attributes.is_empty() && capabilities.is_empty() {
        bail!("nothing to add: pass --attribute and/or --capability");
    }

    let owner_id = OwnerId::from(owner);
    let mut session = state
        .registry
        .resolve(&owner_id)
        .await
        .with_context(|| format!("failed to resolve owner '{owner}'"))?;

    let names = attributes
        .iter()
        .map(|n| (VocabularyKind::Attribute, n))
        .chain(capabilities.iter().map(|n| (VocabularyKind::Capability, n)));
    let mut added = 0;
    for (kind, name) in names {
        if state.registry.extend_vocabulary(&mut session, kind, name)? {
            added += 1;
        }
    }

    let vocabulary = state
        .registry
        .sync(&mut session)
        .await
        .context("failed to persist the extended vocabulary")?;

    if !json {
        println!();
        println!(
            "  {} Added {} name{} to '{}'",
            style("✓").green().bold(),
            style(added).bold(),
            if added == 1 { "" } else { "s" },
            style(owner).cyan(),
        );
    }
    print_profile(&session, &vocabulary, json)?;
    state.registry.close(&mut session);
    Ok(())
}

fn print_profile(session: &Session, vocabulary: &Vocabulary, json: bool) -> Result<()> {
    let profile_id = session
        .profile_id()
        .context("session has no resolved profile")?;

    if json {
        let out = json!({
            "owner_id": session.owner_id(),
            "profile_id": profile_id,
            "new_owner": session.is_new_owner(),
            "attributes": vocabulary.attributes(),
            "capabilities": vocabulary.capabilities(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  Profile {} for owner '{}'{}",
        style(profile_id).cyan().bold(),
        style(session.owner_id()).cyan(),
        if session.is_new_owner() {
            format!(" {}", style("(new)").green())
        } else {
            String::new()
        }
    );
    println!();
    println!("{}", vocabulary_table(vocabulary));
    println!();
    Ok(())
}

fn vocabulary_table(vocabulary: &Vocabulary) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Attributes").fg(Color::White),
        Cell::new("Capabilities").fg(Color::White),
    ]);

    let rows = vocabulary
        .attributes()
        .len()
        .max(vocabulary.capabilities().len());
    for i in 0..rows {
        let attribute = vocabulary.attributes().get(i).map(String::as_str).unwrap_or("");
        let capability = vocabulary.capabilities().get(i).map(String::as_str).unwrap_or("");
        table.add_row(vec![
            Cell::new(attribute).fg(Color::Yellow),
            Cell::new(capability).fg(Color::Cyan),
        ]);
    }
    table
}
