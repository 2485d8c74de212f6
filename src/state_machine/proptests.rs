//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible decisions.

use super::decision::ToolParameters;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_phase() -> impl Strategy<Value = Phase> {
    proptest::sample::select(Phase::ALL.to_vec())
}

fn arb_action() -> impl Strategy<Value = RequiredAction> {
    proptest::sample::select(RequiredAction::ALL.to_vec())
}

fn arb_tool_parameters() -> impl Strategy<Value = Option<ToolParameters>> {
    proptest::option::of(
        (
            proptest::option::of("[a-z ]{0,20}"),
            proptest::option::of("[a-z ]{0,20}"),
        )
            .prop_map(|(search_query, vton_prompt)| ToolParameters {
                search_query,
                vton_prompt,
            }),
    )
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    (
        "[a-zA-Z ]{0,30}",
        "[a-zA-Z ]{0,30}",
        arb_phase(),
        arb_action(),
        arb_tool_parameters(),
    )
        .prop_map(
            |(rationale, user_message, phase, action, tool_parameters)| Decision {
                rationale,
                user_message,
                phase,
                action,
                tool_parameters,
            },
        )
}

fn arb_session() -> impl Strategy<Value = SessionState> {
    (
        arb_phase(),
        proptest::collection::vec("[a-z ]{1,20}", 0..4),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(phase, user_texts, busy, upload_requested)| {
            let mut state = SessionState::new("prop-session", "hello");
            for text in user_texts {
                state.push(Message::user(text, None));
                state.push(Message::assistant("ok"));
            }
            state.phase = phase;
            state.busy = busy;
            state.upload_requested = upload_requested;
            state
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// The oracle's phase assignment is always taken verbatim
    #[test]
    fn prop_phase_follows_decision(state in arb_session(), decision in arb_decision()) {
        let expected = decision.phase;
        let result = transition(&state, decision);
        prop_assert_eq!(result.new_state.phase, expected);
    }

    /// Exactly one assistant message is appended; earlier messages are untouched
    #[test]
    fn prop_message_log_is_append_only(state in arb_session(), decision in arb_decision()) {
        let text = decision.user_message.clone();
        let result = transition(&state, decision);

        prop_assert_eq!(result.new_state.messages.len(), state.messages.len() + 1);
        prop_assert_eq!(&result.new_state.messages[..state.messages.len()], &state.messages[..]);
        let last = result.new_state.messages.last().unwrap();
        prop_assert_eq!(last.role, Role::Assistant);
        prop_assert_eq!(&last.text, &text);
    }

    /// At most one action obligation per turn, matching the decision's action
    #[test]
    fn prop_action_obligations(state in arb_session(), decision in arb_decision()) {
        let action = decision.action;
        let result = transition(&state, decision);

        let searches = result.effects.iter().filter(|e| matches!(e, Effect::RunSearch { .. })).count();
        let uploads = result.effects.iter().filter(|e| matches!(e, Effect::RequestImage)).count();

        prop_assert!(searches + uploads <= 1);
        prop_assert_eq!(searches == 1, action == RequiredAction::CallSearchTool);
        prop_assert_eq!(uploads == 1, action == RequiredAction::AskImage);
    }

    /// Oracle query wins; otherwise the latest user text is searched
    #[test]
    fn prop_search_query_fallback_order(state in arb_session(), decision in arb_decision()) {
        let decision = Decision { action: RequiredAction::CallSearchTool, ..decision };
        let result = transition(&state, decision.clone());
        let query = result.search_query().unwrap();

        match (decision.search_query(), state.last_user_text()) {
            (Some(q), _) => prop_assert_eq!(query, q),
            (None, Some(user_text)) => prop_assert_eq!(query, user_text),
            (None, None) => prop_assert_eq!(query, "hello"),
        }
    }

    /// Lifecycle fields are owned by the runtime, not the transition
    #[test]
    fn prop_runtime_fields_untouched(state in arb_session(), decision in arb_decision()) {
        let result = transition(&state, decision);
        prop_assert_eq!(result.new_state.busy, state.busy);
        prop_assert_eq!(result.new_state.upload_requested, state.upload_requested);
        prop_assert_eq!(&result.new_state.reference_image, &state.reference_image);
        prop_assert_eq!(&result.new_state.id, &state.id);
    }

    /// Any decision survives a trip through the oracle wire format
    #[test]
    fn prop_decision_wire_format(decision in arb_decision()) {
        let raw = serde_json::to_string(&decision).unwrap();
        let decoded = Decision::from_json(&raw).unwrap();
        prop_assert_eq!(decoded, decision);
    }
}
