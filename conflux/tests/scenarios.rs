use conflux::prelude::*;
use conflux::{ContextKey, InterpretationError, combine_effects};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn double_then_increment() {
    let double = Flow::<i32, i32>::from_fn(|x| x * 2);
    let increment = Flow::<i32, i32>::from_fn(|x| x + 1);

    assert_eq!(double.pipe(&increment).call(5).await.unwrap(), 11);
    assert_eq!(compose!(double, increment).call(5).await.unwrap(), 11);
}

#[test]
fn extended_context_lists_parent_and_new_keys() {
    let ctx = Context::from_bindings(Bindings::new().bind("a", 1))
        .with(Bindings::new().bind("b", 2))
        .unwrap();

    let expected: BTreeSet<ContextKey> = ["a", "b"].into_iter().map(ContextKey::from).collect();
    assert_eq!(ctx.keys(), expected);
}

#[tokio::test]
async fn pure_stage_adds_no_effects() {
    let fetch = effectful(
        Flow::<i32, i32>::from_fn(|x| x * 10),
        [standard::read(), standard::io()],
    );
    assert_eq!(fetch.flags(), EffectFlags::READ | EffectFlags::IO);

    let chain = fetch.pipe(&pure(Flow::from_fn(|x: i32| x - 1)));
    assert_eq!(chain.flags(), EffectFlags::READ | EffectFlags::IO);
    assert_eq!(
        combine_effects([&fetch as &dyn HasEffects, &chain]),
        EffectFlags::READ | EffectFlags::IO
    );
    assert_eq!(chain.call(3).await.unwrap(), 29);
}

#[tokio::test]
async fn empty_interpreter_names_missing_effect() {
    let flow = effectful(Flow::<i32, i32>::from_fn(|x| x), [standard::network()]);
    let err = EffectInterpreter::new()
        .run(&flow, 1, &Context::new())
        .await
        .unwrap_err();

    match err {
        Error::Interpretation(err) => {
            assert_eq!(err.effect(), "network");
            assert_eq!(
                err,
                InterpretationError::MissingHandler {
                    effect: "network".into()
                }
            );
        }
        other => panic!("expected interpretation error, got {other:?}"),
    }
}

#[test]
fn frozen_context_rejects_extension_only() {
    let ctx = Context::from_bindings(Bindings::new().bind("region", "eu".to_string()));
    ctx.freeze();

    assert!(ctx.with_value("region", "us".to_string()).is_err());
    assert_eq!(ctx.get_named::<String>("region").map(String::as_str), Some("eu"));

    let child = ctx.fork();
    assert!(!child.is_frozen());
    let child = child.with_value("zone", 3u8).unwrap();
    assert_eq!(child.get_named::<String>("region").map(String::as_str), Some("eu"));
    assert_eq!(child.get_named::<u8>("zone"), Some(&3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_runs_keep_their_own_context() {
    let request_id = contextual::<u64, Option<u64>, Error, _, _>(|delay, _| async move {
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(Context::current().get_named::<u64>("request").copied())
    });

    let handles: Vec<_> = (0..8u64)
        .map(|id| {
            let flow = request_id.clone();
            tokio::spawn(async move {
                let ctx = Context::new().with_value("request", id).unwrap();
                ctx.run(&flow, (8 - id) * 3).await.map(|seen| (id, seen))
            })
        })
        .collect();

    for handle in handles {
        let (id, seen) = handle.await.unwrap().unwrap();
        assert_eq!(seen, Some(id));
    }
    assert!(!Context::is_active());
}

#[tokio::test]
async fn parallel_branches_share_the_ambient_context() {
    let read = |offset: i32| {
        contextual_fn(move |x: i32, ctx: &Context| {
            Ok::<_, Error>(x + offset + ctx.get_named::<i32>("base").copied().unwrap_or_default())
        })
    };
    let fan_out = parallel(vec![read(1), read(2), read(3)]);

    let ctx = Context::new().with_value("base", 100).unwrap();
    assert_eq!(ctx.run(&fan_out, 0).await.unwrap(), vec![101, 102, 103]);
}

#[tokio::test]
async fn interpreter_runs_cleanups_and_serves_handlers_to_the_body() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let counter = cleanups.clone();
    let audit = effect("audit", EffectFlags::WRITE, |value: Value, _: Context| async move {
        anyhow::Ok(json!({ "logged": value }))
    })
    .with_cleanup(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let interpreter = Arc::new(EffectInterpreter::new());
    interpreter.register(&audit);

    let body = contextual::<String, Value, Error, _, _>(|entry, ctx| async move {
        let interpreter = ctx
            .get_named::<Arc<EffectInterpreter>>("interpreter")
            .cloned()
            .ok_or_else(|| Error::msg("interpreter not bound"))?;
        Ok(interpreter.handle("audit", json!(entry), &ctx).await?)
    });
    let flow = effectful(body, [audit]);

    let ctx = Context::new()
        .with_value("interpreter", interpreter.clone())
        .unwrap();
    let out = interpreter.run(&flow, "created".to_string(), &ctx).await.unwrap();

    assert_eq!(out, json!({ "logged": "created" }));
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn race_takes_the_fastest_branch() {
    let delayed = |ms: u64, label: &'static str| {
        Flow::<(), &'static str>::new(move |_| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(label)
        })
    };
    let winner = race(vec![delayed(50, "slow"), delayed(1, "fast")]);
    assert_eq!(winner.call(()).await.unwrap(), "fast");

    let empty = race(Vec::<Flow<(), (), Error>>::new());
    assert!(matches!(empty.call(()).await, Err(Error::EmptyRace)));
}

#[tokio::test]
async fn deferred_io_wraps_a_flow() {
    let flow = Flow::<u32, u32>::from_fn(|x| x + 1);
    let io = Io::from_flow(flow, 41).map(|x| x.to_string());
    assert_eq!(io.run().await.unwrap(), "42");
}
