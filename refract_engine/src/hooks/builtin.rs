//! Bundled `wrap` handlers

use super::{HookBus, HookError, WrapEnv};

/// Add a `keyword-<content>` class to `keyword` tokens
pub fn keyword_classes(env: &mut WrapEnv) -> Result<(), HookError> {
    if env.token_type == "keyword" {
        env.classes.push(format!("keyword-{}", env.content));
    }
    Ok(())
}

/// Give `entity` tokens a `title` holding the entity text with its leading
/// `&amp;` decoded back to `&`
pub fn entity_title(env: &mut WrapEnv) -> Result<(), HookError> {
    if env.token_type == "entity" {
        let title = env.content.replacen("&amp;", "&", 1);
        env.set_attribute("title", title);
    }
    Ok(())
}

/// Register every bundled handler on `bus`
pub fn install(bus: &mut HookBus) {
    bus.on_wrap(keyword_classes);
    bus.on_wrap(entity_title);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookName;

    fn env(token_type: &str, content: &str) -> WrapEnv {
        WrapEnv {
            token_type: token_type.to_string(),
            content: content.to_string(),
            tag: "span".to_string(),
            classes: vec!["token".to_string(), token_type.to_string()],
            attributes: Vec::new(),
            language: "markup".to_string(),
        }
    }

    #[test]
    fn test_keyword_class() {
        let mut keyword = env("keyword", "return");
        keyword_classes(&mut keyword).unwrap();
        assert_eq!(keyword.classes, vec!["token", "keyword", "keyword-return"]);

        let mut other = env("string", "\"x\"");
        keyword_classes(&mut other).unwrap();
        assert_eq!(other.classes.len(), 2);
    }

    #[test]
    fn test_entity_title() {
        let mut entity = env("entity", "&amp;lt;");
        entity_title(&mut entity).unwrap();
        assert_eq!(entity.attribute("title"), Some("&lt;"));

        let mut other = env("tag", "&amp;");
        entity_title(&mut other).unwrap();
        assert!(other.attributes.is_empty());
    }

    #[test]
    fn test_install_registers_wrap_handlers() {
        let mut bus = HookBus::new();
        install(&mut bus);
        assert_eq!(bus.handler_count(HookName::Wrap), 2);

        let mut keyword = env("keyword", "if");
        bus.run_wrap(&mut keyword).unwrap();
        assert!(keyword.classes.contains(&"keyword-if".to_string()));
    }
}
