//! `\special{...}` dispatch: a prefix-keyed registry routing opaque
//! strings to handlers that share the builder's action context.
//!
//! Grounded on the original `SpecialManager`/`SpecialHandler` contract
//! (see DESIGN.md); no concrete handler (color, hyperref, papersize,
//! PostScript, TPIC, emTeX, PDF, dvisvgm-raw) is implemented, since their
//! behavior is explicitly out of scope — only the dispatch surface, plus
//! a couple of illustrative no-op handlers used to exercise it in tests.

use crate::builder::ActionContext;
use crate::config::Config;
use crate::error::Result;

/// A registered handler for one or more `\special` prefixes.
pub trait SpecialHandler {
    /// The leading tokens this handler claims (e.g. `["color"]`).
    fn prefixes(&self) -> &[&str];

    /// A one-line description, surfaced by a `--list-specials` CLI flag.
    fn info(&self) -> &str;

    /// Handles the special whose leading token was `prefix`; `body` is
    /// the remainder of the string (including the prefix, as originally
    /// written) so handlers are free to re-tokenize it.
    fn process(&mut self, prefix: &str, body: &str, ctx: &mut ActionContext) -> Result<()>;
}

/// Owns the registered handlers and the prefix → handler routing table.
/// Ignored prefixes (via the configuration's ignore-list) are dropped at
/// registration time rather than checked on every dispatch.
#[derive(Default)]
pub struct SpecialManager {
    handlers: Vec<Box<dyn SpecialHandler>>,
    routes: Vec<(String, usize)>,
}

impl SpecialManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, skipping any of its prefixes disabled by
    /// `config`'s ignore-list (the handler itself is dropped entirely if
    /// every one of its prefixes ends up ignored).
    pub fn register(&mut self, handler: Box<dyn SpecialHandler>, config: &Config) {
        let live: Vec<String> = handler.prefixes().iter().filter(|p| !config.ignores_special(p)).map(|p| p.to_string()).collect();
        if live.is_empty() {
            return;
        }
        let idx = self.handlers.len();
        for prefix in live {
            self.routes.push((prefix, idx));
        }
        self.handlers.push(handler);
    }

    pub fn handlers(&self) -> impl Iterator<Item = (&[&str], &str)> {
        self.handlers.iter().map(|h| (h.prefixes(), h.info()))
    }

    /// Extracts the leading alphanumeric/`:` token from `body`, and if a
    /// handler is registered for it, dispatches. Unknown prefixes are
    /// silently ignored, per the dispatch contract.
    pub fn dispatch(&mut self, body: &str, ctx: &mut ActionContext) -> Result<()> {
        let prefix = leading_token(body);
        if prefix.is_empty() {
            return Ok(());
        }
        if let Some(&(_, idx)) = self.routes.iter().find(|(p, _)| p == prefix) {
            self.handlers[idx].process(prefix, body, ctx)?;
        }
        Ok(())
    }
}

fn leading_token(body: &str) -> &str {
    let end = body.find(|c: char| !(c.is_alphanumeric() || c == ':')).unwrap_or(body.len());
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ActionContext;
    use svg_tree::Document;

    struct NoopSpecialHandler {
        prefixes: Vec<&'static str>,
        info: String,
        calls: std::cell::RefCell<Vec<String>>,
    }

    impl SpecialHandler for NoopSpecialHandler {
        fn prefixes(&self) -> &[&str] {
            &self.prefixes
        }
        fn info(&self) -> &str {
            &self.info
        }
        fn process(&mut self, prefix: &str, body: &str, _ctx: &mut ActionContext) -> Result<()> {
            self.calls.get_mut().push(format!("{prefix}:{body}"));
            Ok(())
        }
    }

    fn test_context(doc: &mut Document) -> ActionContext<'_> {
        ActionContext::new(doc)
    }

    #[test]
    fn dispatches_to_registered_prefix() {
        let mut mgr = SpecialManager::new();
        let config = Config::default();
        mgr.register(
            Box::new(NoopSpecialHandler { prefixes: vec!["color"], info: "color pushes/pops".into(), calls: Default::default() }),
            &config,
        );
        let mut doc = Document::new("svg");
        let mut ctx = test_context(&mut doc);
        mgr.dispatch("color push rgb 1 0 0", &mut ctx).unwrap();
        assert_eq!(mgr.handlers().count(), 1);
    }

    #[test]
    fn unknown_prefix_is_silently_ignored() {
        let mut mgr = SpecialManager::new();
        let mut doc = Document::new("svg");
        let mut ctx = test_context(&mut doc);
        assert!(mgr.dispatch("nonexistent-prefix foo", &mut ctx).is_ok());
    }

    #[test]
    fn ignore_list_drops_handler_at_registration() {
        let mut mgr = SpecialManager::new();
        let config = Config { ignore_specials_list: vec!["color".to_string()], ..Default::default() };
        mgr.register(
            Box::new(NoopSpecialHandler { prefixes: vec!["color"], info: "".into(), calls: Default::default() }),
            &config,
        );
        assert_eq!(mgr.handlers().count(), 0);
    }
}
