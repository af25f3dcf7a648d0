//! Token tree to markup serialization
//!
//! Text leaves are written verbatim; callers escape them first with
//! [`encode`]. Each token becomes `<tag class="..." k="v">content</tag>` after
//! the `wrap` hook has had a chance to edit its [`WrapEnv`].

pub mod encode;

pub use encode::{encode, encode_text};

use crate::config::runtime::RenderPreferences;
use crate::hooks::{HookBus, HookError, WrapEnv};
use crate::log_debug;
use crate::tokens::{Token, TokenContent, TokenNode};

/// Render with default preferences
pub fn stringify(
    nodes: &[TokenNode],
    language: &str,
    hooks: &HookBus,
) -> Result<String, HookError> {
    stringify_with(nodes, language, hooks, &RenderPreferences::default())
}

pub fn stringify_with(
    nodes: &[TokenNode],
    language: &str,
    hooks: &HookBus,
    preferences: &RenderPreferences,
) -> Result<String, HookError> {
    let renderer = Renderer {
        language,
        hooks,
        preferences,
    };

    let mut out = String::new();
    renderer.write_nodes(nodes, &mut out)?;

    log_debug!("Token tree rendered",
        "language" => language,
        "nodes" => nodes.len(),
        "bytes" => out.len()
    );
    Ok(out)
}

struct Renderer<'a> {
    language: &'a str,
    hooks: &'a HookBus,
    preferences: &'a RenderPreferences,
}

impl Renderer<'_> {
    fn write_nodes(&self, nodes: &[TokenNode], out: &mut String) -> Result<(), HookError> {
        for node in nodes {
            match node {
                TokenNode::Text(text) => out.push_str(text),
                TokenNode::Token(token) => self.write_token(token, out)?,
            }
        }
        Ok(())
    }

    fn write_token(&self, token: &Token, out: &mut String) -> Result<(), HookError> {
        let content = match &token.content {
            TokenContent::Text(text) => text.clone(),
            TokenContent::Nested(children) => {
                let mut inner = String::new();
                self.write_nodes(children, &mut inner)?;
                inner
            }
        };

        let mut classes = Vec::with_capacity(2 + token.alias.len());
        classes.push("token".to_string());
        classes.push(token.token_type.clone());
        classes.extend(token.alias.iter().cloned());

        let mut attributes = Vec::new();
        if self.preferences.emit_language_attribute {
            attributes.push(("data-language".to_string(), self.language.to_string()));
        }

        let mut env = WrapEnv {
            token_type: token.token_type.clone(),
            content,
            tag: "span".to_string(),
            classes,
            attributes,
            language: self.language.to_string(),
        };
        self.hooks.run_wrap(&mut env)?;

        write_element(&env, out);
        Ok(())
    }
}

fn write_element(env: &WrapEnv, out: &mut String) {
    out.push('<');
    out.push_str(&env.tag);
    out.push_str(" class=\"");
    out.push_str(&env.classes.join(" "));
    out.push('"');
    for (name, value) in &env.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    out.push('>');
    out.push_str(&env.content);
    out.push_str("</");
    out.push_str(&env.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::builtin;
    use assert_matches::assert_matches;

    fn prefs(emit_language_attribute: bool) -> RenderPreferences {
        RenderPreferences {
            encode_entities: true,
            emit_language_attribute,
        }
    }

    fn sample() -> Vec<TokenNode> {
        vec![
            TokenNode::Text("x=".to_string()),
            TokenNode::Token(Token::text("num", "12")),
            TokenNode::Token(Token::text("str", "\"a\"")),
        ]
    }

    #[test]
    fn test_plain_rendering() {
        let html = stringify_with(&sample(), "example", &HookBus::new(), &prefs(false)).unwrap();
        assert_eq!(
            html,
            r#"x=<span class="token num">12</span><span class="token str">"a"</span>"#
        );
    }

    #[test]
    fn test_aliases_and_nesting() {
        let inner = Token::new(
            "tag",
            TokenContent::Nested(vec![
                TokenNode::Token(Token::text("punctuation", "&lt;")),
                TokenNode::Text("b".to_string()),
            ]),
            vec!["markup".to_string(), "element".to_string()],
            "<b",
        );

        let html = stringify_with(&[TokenNode::Token(inner)], "html", &HookBus::new(), &prefs(false))
            .unwrap();
        assert_eq!(
            html,
            "<span class=\"token tag markup element\">\
             <span class=\"token punctuation\">&lt;</span>b</span>"
        );
    }

    #[test]
    fn test_wrap_hook_edits_element() {
        let mut hooks = HookBus::new();
        hooks.on_wrap(|env| {
            if env.token_type == "num" {
                env.tag = "b".to_string();
                env.set_attribute("title", "say \"twelve\"");
            }
            Ok(())
        });

        let html = stringify_with(&sample(), "example", &hooks, &prefs(true)).unwrap();
        assert_eq!(
            html,
            "x=<b class=\"token num\" data-language=\"example\" title=\"say &quot;twelve&quot;\">12</b>\
             <span class=\"token str\" data-language=\"example\">\"a\"</span>"
        );
    }

    #[test]
    fn test_builtin_handlers_in_output() {
        let mut hooks = HookBus::new();
        builtin::install(&mut hooks);

        let nodes = encode(vec![
            TokenNode::Token(Token::text("keyword", "if")),
            TokenNode::Text(" ".to_string()),
            TokenNode::Token(Token::text("entity", "&lt;")),
        ]);
        let html = stringify_with(&nodes, "markup", &hooks, &prefs(false)).unwrap();

        assert_eq!(
            html,
            "<span class=\"token keyword keyword-if\">if</span> \
             <span class=\"token entity\" title=\"&lt;\">&amp;lt;</span>"
        );
    }

    #[test]
    fn test_wrap_error_propagates() {
        let mut hooks = HookBus::new();
        hooks.on_wrap(|_| Err(HookError::msg("no")));

        assert_matches!(stringify(&sample(), "example", &hooks), Err(HookError::Message(_)));
        assert_eq!(
            stringify(&[TokenNode::Text("only text".to_string())], "example", &hooks).unwrap(),
            "only text"
        );
    }
}
