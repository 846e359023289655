//! Property-based tests for command prefixing and walltime formatting.

use proptest::prelude::*;
use qsubkit_sched::Walltime;
use qsubkit_sched::pbs::wrap::{is_wrapped, per_node_prefix, wrap};

/// Command lines built from shell-ish tokens with irregular spacing.
fn arb_command() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-z./=_0-9-]{1,8}", " {1,3}"), 1..6).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(token, gap)| format!("{token}{gap}"))
            .collect::<String>()
    })
}

fn arb_prefix() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("time".to_string()),
        Just("/usr/bin/time".to_string()),
        (1_u32..=12).prop_map(per_node_prefix),
    ]
}

proptest! {
    #[test]
    fn wrap_is_idempotent(prefix in arb_prefix(), line in arb_command()) {
        let once = wrap(&prefix, &line, true);
        prop_assert_eq!(wrap(&prefix, &once, true), once);
    }

    #[test]
    fn wrap_disabled_is_identity(prefix in arb_prefix(), line in arb_command()) {
        prop_assert_eq!(wrap(&prefix, &line, false), line);
    }

    #[test]
    fn wrap_keeps_tokens(prefix in arb_prefix(), line in arb_command()) {
        prop_assume!(!is_wrapped(&prefix, &line));
        let wrapped = wrap(&prefix, &line, true);
        prop_assert!(wrapped.ends_with(&line.split_whitespace().collect::<Vec<_>>().join(" ")));
        prop_assert!(wrapped.starts_with(prefix.as_str()));
    }

    #[test]
    fn walltime_pads_minutes_and_seconds(h in 0_u32..200, m in 0_u32..60, s in 0_u32..60) {
        let text = Walltime::new(h, m, s).to_string();
        let parts: Vec<&str> = text.split(':').collect();
        prop_assert_eq!(parts.len(), 3);
        prop_assert_eq!(parts[0], h.to_string());
        prop_assert_eq!(parts[1].len(), 2);
        prop_assert_eq!(parts[2].len(), 2);
        prop_assert_eq!(text.parse::<Walltime>().unwrap(), Walltime::new(h, m, s));
    }
}
