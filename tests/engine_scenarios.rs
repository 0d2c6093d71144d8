use std::collections::VecDeque;
use std::sync::Arc;

use ivr_kernel::kernel::state::InteractionState;
use ivr_kernel::services::collect::ScriptedCollector;
use ivr_kernel::{
    Call, CollectResult, InteractionContext, InteractionEngine, IvrError, MenuBuilder, MenuDefinition, Outcome, Prompt,
    Utterance,
};

/// What the callbacks saw during one run.
#[derive(Debug, Default)]
struct Tally {
    completed: Vec<String>,
    failures: usize,
    validations: usize,
    unread: VecDeque<&'static str>,
}

fn city_menu(prompts: &[&str], max_attempts: usize) -> MenuBuilder<Tally> {
    MenuDefinition::builder()
        .prompts(prompts.iter().copied())
        .max_attempts(max_attempts)
        .grammar("some_grammar")
        .on_complete(|ctx: &mut InteractionContext<Tally>, result: &CollectResult| {
            let city = result.utterance().and_then(|u| u.text()).unwrap_or_default();
            ctx.state.completed.push(format!("Let's go to {}", city));
        })
        .on_failure(|ctx: &mut InteractionContext<Tally>| {
            ctx.state.failures += 1;
        })
}

fn engine_for(menu: MenuDefinition<Tally>, collector: &Arc<ScriptedCollector>) -> InteractionEngine<Tally> {
    InteractionEngine::new(Arc::new(menu), InteractionContext::new(Call::new(), Tally::default()))
        .with_shared_collector(collector.clone())
}

fn texts(prompts: Vec<Prompt>) -> Vec<String> {
    prompts.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn test_scenario_a_reprompts_until_match() {
    let menu = city_menu(&["Where to?", "Say again?", "Last try"], 3).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([
        CollectResult::NoInput,
        CollectResult::NoInput,
        CollectResult::matched("Paris"),
    ]));
    let mut engine = engine_for(menu, &collector);

    let outcome = engine.run().await.expect("run should succeed");

    assert_eq!(outcome, Outcome::Complete(CollectResult::matched("Paris")));
    assert_eq!(engine.context.state.completed, vec!["Let's go to Paris".to_string()]);
    assert_eq!(engine.context.state.failures, 0);
    assert_eq!(
        texts(collector.prompts().await),
        vec!["Where to?", "Say again?", "Last try"],
        "Prompts must be delivered in order"
    );
    assert_eq!(engine.state(), InteractionState::Complete);
}

#[tokio::test]
async fn test_scenario_b_single_attempt_fails_once() {
    let menu = city_menu(&["Hello"], 1).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::NoMatch]));
    let mut engine = engine_for(menu, &collector);

    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome, Outcome::Failed(CollectResult::NoMatch));
    assert_eq!(engine.context.state.failures, 1, "onFailure fires exactly once");
    assert!(engine.context.state.completed.is_empty());
    assert_eq!(collector.call_count().await, 1, "collect invoked exactly once");
}

#[tokio::test]
async fn test_scenario_c_missing_criteria_fails_before_collect() {
    let menu = MenuDefinition::<()>::builder().prompt("Hello").build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::matched("Paris")]));
    let mut engine = InteractionEngine::for_call(Arc::new(menu), Call::new()).with_shared_collector(collector.clone());

    let err = engine.run().await.expect_err("should be a configuration error");

    assert!(matches!(err, IvrError::MissingCollectionCriteria), "got {:?}", err);
    assert!(err.is_configuration());
    assert_eq!(collector.call_count().await, 0, "collect must never be reached");
}

#[tokio::test]
async fn test_exhausting_attempts_fails_once_for_each_failing_kind() {
    for failing in [CollectResult::NoMatch, CollectResult::NoInput] {
        let menu = city_menu(&["one", "two", "three"], 3).build().unwrap();
        let collector = Arc::new(ScriptedCollector::new(vec![failing.clone(); 3]));
        let mut engine = engine_for(menu, &collector);

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome, Outcome::Failed(failing.clone()));
        assert_eq!(engine.context.state.failures, 1);
        assert!(engine.context.state.completed.is_empty());
        assert_eq!(collector.call_count().await, 3);
        assert_eq!(engine.attempts.attempt_index, 2, "attempt index stays below max attempts");
    }
}

#[tokio::test]
async fn test_custom_max_attempts() {
    let menu = city_menu(&["one", "two", "three"], 2).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::NoInput, CollectResult::NoInput]));
    let mut engine = engine_for(menu, &collector);

    engine.run().await.unwrap();

    assert_eq!(engine.context.state.failures, 1);
    assert_eq!(texts(collector.prompts().await), vec!["one", "two"]);
}

#[tokio::test]
async fn test_match_stops_collecting() {
    let menu = city_menu(&["one", "two", "three"], 3).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([
        CollectResult::NoMatch,
        CollectResult::matched("Paris"),
        CollectResult::NoMatch,
    ]));
    let mut engine = engine_for(menu, &collector);

    engine.run().await.unwrap();

    assert_eq!(engine.context.state.completed.len(), 1);
    assert_eq!(collector.call_count().await, 2, "no collect after an accepted match");
}

#[tokio::test]
async fn test_last_prompt_is_reused() {
    let menu = city_menu(&["first", "second"], 4).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([
        CollectResult::NoInput,
        CollectResult::NoInput,
        CollectResult::NoMatch,
        CollectResult::matched("Paris"),
    ]));
    let mut engine = engine_for(menu, &collector);

    engine.run().await.unwrap();

    assert_eq!(texts(collector.prompts().await), vec!["first", "second", "second", "second"]);
}

#[tokio::test]
async fn test_stop_exits_quietly() {
    let menu = city_menu(&["one", "two"], 3).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::NoInput, CollectResult::Stop]));
    let mut engine = engine_for(menu, &collector);

    let outcome = engine.run().await.expect("stop is not an error");

    assert_eq!(outcome, Outcome::Stopped);
    assert!(engine.context.state.completed.is_empty());
    assert_eq!(engine.context.state.failures, 0);
    assert_eq!(collector.call_count().await, 2);
}

#[tokio::test]
async fn test_hangup_raises_and_skips_callbacks() {
    let menu = city_menu(&["one"], 3).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::NoMatch, CollectResult::Hangup]));
    let call = Call::new();
    let mut engine = InteractionEngine::new(Arc::new(menu), InteractionContext::new(call.clone(), Tally::default()))
        .with_shared_collector(collector.clone());

    let err = engine.run().await.expect_err("hangup must propagate");

    match err {
        IvrError::CallTerminated { call_id } => assert_eq!(call_id, call.id()),
        other => panic!("Expected CallTerminated, got {:?}", other),
    }
    assert!(engine.context.state.completed.is_empty());
    assert_eq!(engine.context.state.failures, 0);
    assert!(call.is_terminated(), "hangup marks the call dead");
}

#[tokio::test]
async fn test_dead_call_never_prompts() {
    let menu = city_menu(&["one"], 3).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::matched("Paris")]));
    let call = Call::new();
    call.terminate();
    let mut engine = InteractionEngine::new(Arc::new(menu), InteractionContext::new(call, Tally::default()))
        .with_shared_collector(collector.clone());

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, IvrError::CallTerminated { .. }));
    assert_eq!(collector.call_count().await, 0);
}

#[tokio::test]
async fn test_dead_call_still_reports_a_broken_menu() {
    let menu = MenuDefinition::<()>::builder().prompt("Hello").build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([CollectResult::matched("Paris")]));
    let call = Call::new();
    call.terminate();
    let mut engine = InteractionEngine::for_call(Arc::new(menu), call).with_shared_collector(collector.clone());

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, IvrError::MissingCollectionCriteria), "configuration errors come first, got {:?}", err);
    assert_eq!(collector.call_count().await, 0);
}

#[tokio::test]
async fn test_rejected_matches_count_as_failures() {
    let menu = city_menu(&["one", "two", "three"], 3)
        .validate(|ctx, _result| {
            ctx.state.validations += 1;
            false
        })
        .build()
        .unwrap();
    let collector = Arc::new(ScriptedCollector::new(vec![CollectResult::matched("Atlantis"); 3]));
    let mut engine = engine_for(menu, &collector);

    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome, Outcome::Failed(CollectResult::matched("Atlantis")));
    assert_eq!(engine.context.state.failures, 1);
    assert_eq!(engine.context.state.validations, 3);
    assert!(engine.context.state.completed.is_empty());
    assert_eq!(collector.call_count().await, 3);
}

#[tokio::test]
async fn test_validation_sees_latest_result() {
    let menu = city_menu(&["one"], 3)
        .validate(|_ctx, result| result.utterance().and_then(|u| u.text()) == Some("Paris"))
        .build()
        .unwrap();
    let collector = Arc::new(ScriptedCollector::new([
        CollectResult::matched("Atlantis"),
        CollectResult::matched("Paris"),
    ]));
    let mut engine = engine_for(menu, &collector);

    let outcome = engine.run().await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(engine.context.state.completed, vec!["Let's go to Paris".to_string()]);
}

#[tokio::test]
async fn test_dynamic_prompts_are_evaluated_in_context() {
    let menu = MenuBuilder::<Tally>::new()
        .prompt_with(|ctx| Prompt::from(ctx.state.unread.pop_front().unwrap_or("nothing left")))
        .grammar("some_grammar")
        .build()
        .unwrap();
    let collector = Arc::new(ScriptedCollector::new(vec![CollectResult::NoInput; 3]));
    let state = Tally {
        unread: VecDeque::from(vec!["one", "two", "three"]),
        ..Tally::default()
    };
    let mut engine = InteractionEngine::new(Arc::new(menu), InteractionContext::new(Call::new(), state))
        .with_shared_collector(collector.clone());

    engine.run().await.unwrap();

    assert_eq!(texts(collector.prompts().await), vec!["one", "two", "three"]);
    assert!(engine.context.state.unread.is_empty());
}

#[tokio::test]
async fn test_without_callbacks_run_returns_result() {
    let menu = Arc::new(MenuDefinition::<()>::builder().prompt("Hello").grammar("g").build().unwrap());

    let collector = Arc::new(ScriptedCollector::new([CollectResult::matched("Paris")]));
    let mut engine = InteractionEngine::for_call(menu.clone(), Call::new()).with_shared_collector(collector);
    assert_eq!(engine.run().await.unwrap().result(), Some(&CollectResult::matched("Paris")));

    let collector = Arc::new(ScriptedCollector::new(vec![CollectResult::NoInput; 3]));
    let mut engine = InteractionEngine::for_call(menu, Call::new()).with_shared_collector(collector.clone());
    assert_eq!(engine.run().await.unwrap(), Outcome::Failed(CollectResult::NoInput));
    assert_eq!(texts(collector.prompts().await), vec!["Hello", "Hello", "Hello"]);
}

#[tokio::test]
async fn test_prompt_override_is_per_engine() {
    let menu = Arc::new(city_menu(&["default"], 3).build().unwrap());
    let collector = Arc::new(ScriptedCollector::new([CollectResult::matched("Paris")]));
    let mut engine = InteractionEngine::new(menu.clone(), InteractionContext::new(Call::new(), Tally::default()))
        .with_prompts(["override one", "override two"])
        .with_shared_collector(collector.clone());

    engine.run().await.unwrap();

    assert_eq!(texts(collector.prompts().await), vec!["override one"]);
    assert_eq!(menu.prompts().len(), 1, "shared menu is untouched");
    assert_eq!(engine.context.state.completed, vec!["Let's go to Paris".to_string()]);
}

#[tokio::test]
async fn test_engine_without_collector() {
    let menu = Arc::new(MenuDefinition::<()>::builder().prompt("Hello").grammar("g").build().unwrap());
    let mut engine = InteractionEngine::for_call(menu, Call::new());

    assert!(matches!(engine.run().await, Err(IvrError::NoCollector)));
}

#[tokio::test]
async fn test_run_resets_attempts() {
    let menu = city_menu(&["one", "two"], 2).build().unwrap();
    let collector = Arc::new(ScriptedCollector::new([
        CollectResult::NoInput,
        CollectResult::NoInput,
        CollectResult::matched("Paris"),
    ]));
    let mut engine = engine_for(menu, &collector);

    assert!(matches!(engine.run().await.unwrap(), Outcome::Failed(_)));
    assert!(engine.run().await.unwrap().is_complete(), "second run starts from attempt 0");
    assert_eq!(texts(collector.prompts().await), vec!["one", "two", "one"]);
}

#[tokio::test]
async fn test_digit_limit_mode_forwards_options() {
    let menu = MenuDefinition::<()>::builder()
        .prompt("Enter your four digit PIN")
        .limit(4)
        .barge_in(true)
        .timeout(std::time::Duration::from_secs(8))
        .validate(|_ctx, result| result.utterance().and_then(|u| u.text()).map(|t| t.len() == 4).unwrap_or(false))
        .build()
        .unwrap();
    let collector = Arc::new(ScriptedCollector::default());
    collector.push(CollectResult::Match(Utterance::dtmf("12"))).await;
    collector.push(CollectResult::Match(Utterance::dtmf("1234"))).await;
    let mut engine = InteractionEngine::for_call(Arc::new(menu), Call::new()).with_shared_collector(collector.clone());

    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome, Outcome::Complete(CollectResult::Match(Utterance::dtmf("1234"))));
    assert_eq!(engine.menu().limit(), Some(4));
    let calls = collector.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].options.limit(), Some(4));
    assert!(calls[0].options.grammar().is_none());
    assert!(calls[0].options.interruptible, "first PIN prompt may be interrupted");
    assert!(!calls[1].options.interruptible, "re-prompts play in full");
    assert_eq!(calls[1].options.timeout, Some(std::time::Duration::from_secs(8)));
}
