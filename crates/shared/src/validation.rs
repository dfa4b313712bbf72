use crate::constants::*;

pub fn validate_workspace_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Workspace name is required".into());
    }
    if trimmed.len() > MAX_WORKSPACE_NAME_LENGTH {
        return Err(format!(
            "Workspace name must be at most {} characters",
            MAX_WORKSPACE_NAME_LENGTH
        ));
    }
    Ok(())
}

/// Channel names are stored with whitespace stripped and lowercased;
/// callers normalize first, then validate.
pub fn normalize_channel_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn validate_channel_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Channel name is required".into());
    }
    if name.len() > MAX_CHANNEL_NAME_LENGTH {
        return Err(format!(
            "Channel name must be at most {} characters",
            MAX_CHANNEL_NAME_LENGTH
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(
            "Channel name can only contain lowercase letters, numbers, hyphens, and underscores"
                .into(),
        );
    }
    Ok(())
}

pub fn validate_message_body(body: &str) -> Result<(), String> {
    if body.is_empty() {
        return Err("Message body is required".into());
    }
    if body.len() > MAX_MESSAGE_BODY_LENGTH {
        return Err("Message too long".into());
    }
    Ok(())
}

pub fn validate_reaction_value(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("Reaction value is required".into());
    }
    if value.len() > MAX_REACTION_VALUE_LENGTH {
        return Err("Reaction value too long".into());
    }
    Ok(())
}
