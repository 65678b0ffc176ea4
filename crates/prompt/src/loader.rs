//! Prompt loader for YAML prompt definitions.

use crate::builtin::{builtin_ids, builtin_prompt};
use crate::types::PromptDefinition;
use docqa_core::{config::STATE_DIR, AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

/// Load a prompt definition by ID.
///
/// Looks for `<id>.yml` (or `<id>.yaml`) in `.docqa/prompts/` first, then
/// falls back to the builtin prompts.
///
/// # Example
/// ```no_run
/// use docqa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let dir = prompts_dir(workspace_path);
    let candidate = ["yml", "yaml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prompt_id, ext)))
        .find(|path| path.is_file());

    let definition = match candidate {
        Some(prompt_file) => {
            tracing::debug!("Loading prompt from: {:?}", prompt_file);
            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;

            serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to parse prompt YAML {:?}: {}",
                    prompt_file, e
                ))
            })?
        }
        None => builtin_prompt(prompt_id)?.ok_or_else(|| {
            AppError::Prompt(format!(
                "Prompt '{}' not found in {:?} and is not a builtin",
                prompt_id, dir
            ))
        })?,
    };

    validate_prompt(&definition)?;

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs, workspace overrides and builtins, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);
    let mut prompt_ids: Vec<String> = builtin_ids().iter().map(|id| id.to_string()).collect();

    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yml") | Some("yaml")
            );
            if path.is_file() && is_yaml {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::DEFAULT_ANSWER_PROMPT_ID;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, file_name: &str, content: &str) {
        let prompts = prompts_dir(dir);
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join(file_name), content).unwrap();
    }

    fn valid_prompt(id: &str) -> String {
        format!(
            "id: {}\ntitle: \"Test Prompt\"\napiVersion: \"1.0\"\ntemplate: \"Q: {{{{question}}}}\"\n",
            id
        )
    }

    #[test]
    fn test_load_workspace_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "answer.terse.yml", &valid_prompt("answer.terse"));

        let prompt = load_prompt(temp_dir.path(), "answer.terse").unwrap();
        assert_eq!(prompt.id, "answer.terse");
        assert_eq!(prompt.template, "Q: {{question}}");
    }

    #[test]
    fn test_workspace_overrides_builtin() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "answer.default.yaml",
            &valid_prompt(DEFAULT_ANSWER_PROMPT_ID),
        );

        let prompt = load_prompt(temp_dir.path(), DEFAULT_ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Test Prompt");
    }

    #[test]
    fn test_builtin_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), DEFAULT_ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, DEFAULT_ANSWER_PROMPT_ID);
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "broken.yml", "invalid: yaml: content:");

        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_bad_api_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "v.yml",
            "id: v\ntitle: V\napiVersion: \"1\"\ntemplate: \"x\"\n",
        );

        assert!(load_prompt(temp_dir.path(), "v").is_err());
    }

    #[test]
    fn test_list_prompts_includes_builtins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "zeta.yml", &valid_prompt("zeta"));
        write_prompt(temp_dir.path(), "alpha.yaml", &valid_prompt("alpha"));
        write_prompt(temp_dir.path(), "notes.txt", "ignored");

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["alpha", DEFAULT_ANSWER_PROMPT_ID, "zeta"]);
    }
}
