//! Loader for prompt overrides stored in the workspace.
//!
//! Overrides live in `.docqa/prompts/<id>.yml` and replace a strategy's
//! built-in template.

use crate::types::{PromptDefinition, PromptTemplate};
use docqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".docqa/prompts")
}

/// Load and compile a prompt override by ID.
///
/// # Example
/// ```no_run
/// use docqa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let template = load_prompt(Path::new("."), "qa.stuff.medical")?;
/// println!("Loaded prompt: {}", template.id());
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptTemplate> {
    let path = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));
    tracing::debug!("Loading prompt override {:?}", path);

    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::Prompt(format!("No prompt '{}' in {:?}", prompt_id, path))
        }
        _ => AppError::Prompt(format!("Cannot read {:?}: {}", path, e)),
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Invalid prompt YAML in {:?}: {}", path, e)))?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "{:?} declares id '{}', expected '{}'",
            path, definition.id, prompt_id
        )));
    }
    validate_prompt(&definition)?;

    tracing::info!("Using prompt override {} ({})", definition.id, definition.title);
    definition.into_template()
}

/// List all prompt override IDs in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids: Vec<String> = walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| {
            entry.path().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("yml")
        })
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect();

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    let required = [
        ("title", def.title.as_str()),
        ("template", def.template.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has an empty {}",
            def.id, field
        )));
    }

    let well_formed = def
        .api_version
        .split_once('.')
        .is_some_and(|(major, minor)| is_number(major) && is_number(minor));
    if !well_formed {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has apiVersion '{}', expected 'major.minor'",
            def.id, def.api_version
        )));
    }

    // Every declared slot must appear in the template text
    if let Some(unused) = def
        .input_variables
        .iter()
        .find(|name| !def.template.contains(&format!("{{{{{}}}}}", name)))
    {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' declares variable '{}' but never uses it",
            def.id, unused
        )));
    }

    Ok(())
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) {
        let prompts = prompts_dir(dir);
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join(format!("{}.yml", id)), content).unwrap();
    }

    fn valid_prompt(id: &str) -> String {
        format!(
            r#"
id: {}
title: "Terse answers"
apiVersion: "1.0"
createdBy: test
inputVariables: [question, context]
template: "Q: {{{{question}}}}\nExtracts:\n{{{{context}}}}"
"#,
            id
        )
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "qa.terse", &valid_prompt("qa.terse"));

        let template = load_prompt(temp_dir.path(), "qa.terse").unwrap();
        assert_eq!(template.id(), "qa.terse");

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "why?".to_string());
        vars.insert("context".to_string(), "Extract 1: because".to_string());
        assert_eq!(
            template.render(&vars).unwrap(),
            "Q: why?\nExtracts:\nExtract 1: because"
        );
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "invalid").is_err());
    }

    #[test]
    fn test_rejects_mismatched_id() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "qa.one", &valid_prompt("qa.two"));

        match load_prompt(temp_dir.path(), "qa.one") {
            Err(AppError::Prompt(msg)) => assert!(msg.contains("qa.two")),
            other => panic!("expected prompt error, got {:?}", other.map(|t| t.id().to_string())),
        }
    }

    #[test]
    fn test_rejects_bad_api_version() {
        let temp_dir = TempDir::new().unwrap();
        let content = valid_prompt("v").replace("apiVersion: \"1.0\"", "apiVersion: \"one\"");
        write_prompt(temp_dir.path(), "v", &content);

        assert!(matches!(
            load_prompt(temp_dir.path(), "v"),
            Err(AppError::Prompt(_))
        ));
    }

    #[test]
    fn test_rejects_unused_declared_variable() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "unused",
            r#"
id: unused
title: Unused slot
apiVersion: "1.0"
inputVariables: [question, previous_answer]
template: "{{question}}"
"#,
        );

        match load_prompt(temp_dir.path(), "unused") {
            Err(AppError::Prompt(msg)) => assert!(msg.contains("previous_answer")),
            other => panic!("expected prompt error, got {:?}", other.map(|t| t.id().to_string())),
        }
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "b", &valid_prompt("b"));
        write_prompt(temp_dir.path(), "a", &valid_prompt("a"));

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["a", "b"]);
    }

    #[test]
    fn test_list_prompts_without_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_prompts(temp_dir.path()).unwrap().is_empty());
    }
}
