//! Thin commands over the LLM adapter: classification, transcription, vision.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde_json::json;

use mnemos_core::llm::structured::{StructuredOutput, render_prompt};
use mnemos_core::llm::transcriber::Transcriber;
use mnemos_core::llm::vision::Vision;
use mnemos_types::taxonomy::ContentPrediction;

use crate::state::AppState;

const CLASSIFY_SYSTEM_PROMPT: &str = "You are a content classifier. Decide which content type \
the input belongs to (text, audio, image, video, multimedia, 3D model or procedural) and list \
every subclass of that type that applies.";

/// Ask the model for a `ContentPrediction` of `text`.
pub async fn classify(state: &AppState, text: &str, json: bool) -> Result<()> {
    let provider = state.llm()?;
    let prediction: ContentPrediction =
        StructuredOutput::generate(&provider, text, CLASSIFY_SYSTEM_PROMPT)
            .await
            .context("classification failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        let label = serde_json::to_value(&prediction.label)?;
        println!();
        println!(
            "  {} {}",
            style("type:").dim(),
            style(label["type"].as_str().unwrap_or("?")).cyan().bold()
        );
        if let Some(subclasses) = label["subclass"].as_array() {
            for subclass in subclasses {
                println!("    {} {}", style("•").dim(), subclass.as_str().unwrap_or("?"));
            }
        }
        println!();
    }
    Ok(())
}

/// Print the classification prompt pair without calling the model.
pub fn show_classify_prompt(text: &str, json: bool) -> Result<()> {
    let prompt = render_prompt(text, CLASSIFY_SYSTEM_PROMPT)?;
    if json {
        let out = json!({ "system_prompt": CLASSIFY_SYSTEM_PROMPT, "prompt": prompt });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{prompt}");
    }
    Ok(())
}

pub async fn transcribe(state: &AppState, path: &Path, json: bool) -> Result<()> {
    let text = state
        .transcriber()?
        .transcribe(path)
        .await
        .with_context(|| format!("failed to transcribe {}", path.display()))?;
    print_text("transcript", path, &text, json)
}

pub async fn describe_image(state: &AppState, path: &Path, json: bool) -> Result<()> {
    let text = state
        .vision()?
        .describe_image(path)
        .await
        .with_context(|| format!("failed to describe {}", path.display()))?;
    print_text("description", path, &text, json)
}

fn print_text(field: &str, path: &Path, text: &str, json: bool) -> Result<()> {
    if json {
        let out = json!({ "path": path.display().to_string(), field: text });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!("  {}", style(path.display()).cyan());
        println!();
        println!("{text}");
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prompt_renders_without_model() {
        let prompt = render_prompt("", CLASSIFY_SYSTEM_PROMPT).unwrap();
        assert!(prompt.starts_with("System Prompt:\nYou are a content classifier."));
        assert!(prompt.contains("User Input:\nNo user input provided."));
        assert!(show_classify_prompt("a podcast episode", true).is_ok());
    }
}
