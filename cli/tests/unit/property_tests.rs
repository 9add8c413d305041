//! Property tests for hook rendering and request parsing.

#![allow(clippy::expect_used)]

use deckhand::domain::hooks::{display_key, parse, render_command};
use deckhand::domain::invocation::CONNECTORS;
use deckhand::domain::{Invocation, render_commands};
use proptest::prelude::*;

fn hooks_source(hooks: &[(bool, String, Vec<String>)]) -> String {
    let mut src = String::from("- perform_on: [staging]\n  hooks:\n");
    for (pre, name, commands) in hooks {
        let phase = if *pre { "pre" } else { "post" };
        let run: Vec<String> = commands.iter().map(|c| format!("\"{c}\"")).collect();
        src.push_str(&format!(
            "    - {phase}: \"{name}\"\n      run: [{}]\n",
            run.join(", ")
        ));
    }
    src
}

fn hook_strategy() -> impl Strategy<Value = (bool, String, Vec<String>)> {
    (
        any::<bool>(),
        "[a-z_]{1,12}",
        proptest::collection::vec("[a-z ;]{0,12}", 0..5),
    )
}

proptest! {
    /// Rendered commands never contain a run of semicolons.
    #[test]
    fn prop_rendered_commands_have_no_double_semicolons(
        hooks in proptest::collection::vec(hook_strategy(), 1..6)
    ) {
        let set = parse(&hooks_source(&hooks), "staging").expect("generated source parses");
        for hook in set.hooks() {
            let rendered = render_command(hook);
            prop_assert!(!rendered.contains(";;"), "got {rendered:?}");
        }
    }

    /// Display keys are numbered by overall position, so they are unique
    /// even when names repeat.
    #[test]
    fn prop_display_keys_are_sequential(
        hooks in proptest::collection::vec(hook_strategy(), 1..6)
    ) {
        let set = parse(&hooks_source(&hooks), "staging").expect("generated source parses");
        prop_assert_eq!(set.len(), hooks.len());
        let rendered = render_commands(set.hooks());
        for (index, ((key, _), hook)) in rendered.iter().zip(set.hooks()).enumerate() {
            prop_assert_eq!(key, format!("{index}) {}", hook.name));
            prop_assert_eq!(key, display_key(hook));
        }
    }

    /// Parsing and re-parsing the same source gives the same set.
    #[test]
    fn prop_parse_is_deterministic(
        hooks in proptest::collection::vec(hook_strategy(), 0..6)
    ) {
        let src = hooks_source(&hooks);
        prop_assert_eq!(parse(&src, "staging").ok(), parse(&src, "staging").ok());
    }

    /// The token after the last connector is always the environment.
    #[test]
    fn prop_environment_follows_last_connector(
        verb in "[a-z]{1,8}",
        args in proptest::collection::vec("[a-z0-9.]{1,8}", 0..3),
        connector in prop::sample::select(vec!["to", "for", "from", "on", "in"]),
        env in "[a-z_]{1,10}",
    ) {
        prop_assume!(!CONNECTORS.contains(&env.as_str()));
        let mut tokens = vec![verb.clone()];
        tokens.extend(args.iter().cloned());
        tokens.push(connector.to_string());
        tokens.push(env.clone());
        let inv = Invocation::parse(&tokens).expect("has a verb");
        prop_assert_eq!(inv.verb, verb);
        prop_assert_eq!(inv.environment, Some(env));
    }
}
