//! End-to-end multi-step workflows

use crate::prelude::*;

/// A small content pipeline: research feeds a draft and an asset pass,
/// and assembly depends on both.
fn pipeline_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register("research", |_request, input, _config| async move {
        TaskResult::ok(json!({ "topic": input["topic"], "facts": ["f1", "f2"] }))
    });

    registry.register("draft", |_request, input, _config| async move {
        let facts = input["research"]["facts"].clone();
        TaskResult::ok(json!({ "body": "draft text", "cited": facts }))
    });

    registry.register("assets", |_request, input, _config| async move {
        TaskResult::ok(json!({ "images": 2, "topic": input["research"]["topic"] }))
    });

    registry.register("assemble", |_request, input, _config| async move {
        TaskResult::ok(json!({
            "body": input["draft"]["body"],
            "images": input["assets"]["images"],
        }))
    });

    registry
}

#[tokio::test]
async fn diamond_pipeline_produces_assembled_output() {
    let (manager, _clock) = orchestration(pipeline_registry());
    let request = TaskRequest::new("acme", "thread-1");

    let steps = vec![
        step("research"),
        step("draft").depends_on("research"),
        step("assets").depends_on("research"),
        step("assemble").depends_on("draft").depends_on("assets"),
    ];

    let result = manager
        .execute(&request, &json!({"topic": "otters"}), &steps)
        .await;

    assert!(result.success);
    assert_eq!(result.rounds, 3);
    assert_eq!(result.completed.len(), 4);

    let assembled = result.step_results["assemble"].result.as_ref().unwrap();
    assert_eq!(assembled["body"], "draft text");
    assert_eq!(assembled["images"], 2);
}

#[tokio::test]
async fn sequence_reports_progress_for_ui_display() {
    let mut registry = HandlerRegistry::new();
    for name in ["outline", "write", "polish"] {
        registry.register(name, |_request, input, config| async move {
            let progress: ProgressState =
                serde_json::from_value(input["progress"].clone()).unwrap();
            TaskResult::ok(json!({ "step": config.task_name }))
                .with_progress(progress.advance(&config.task_name))
        });
    }

    let (manager, _clock) = coordination(registry);
    let request = TaskRequest::new("acme", "thread-2");

    let sequence = manager
        .execute_sequence(
            &request,
            &json!({"brief": "launch post"}),
            &[config("outline"), config("write"), config("polish")],
            &LockOptions::default(),
        )
        .await;

    assert!(sequence.success);
    let progress = sequence.progress.unwrap();
    assert_eq!(
        progress.completed_steps,
        vec!["outline", "write", "polish"]
    );
    assert_eq!(progress.current_progress, 100);
    assert_eq!(progress.current_step, "completed");

    // The whole record ships as JSON to the caller's UI
    let json = serde_json::to_value(&progress).unwrap();
    assert_eq!(json["completed_steps"][1], "write");
}

#[tokio::test]
async fn failing_step_aborts_and_reports_partials() {
    let mut registry = pipeline_registry();
    registry.register("draft", |_request, _input, _config| async move {
        TaskResult::err(ErrorInfo::new(ErrorKind::TaskExecutionFailed, "model refused"))
    });

    let (manager, _clock) = orchestration(registry);
    let request = TaskRequest::new("acme", "thread-3");

    let steps = vec![
        step("research"),
        step("draft").depends_on("research"),
        step("assemble").depends_on("draft"),
    ];

    let result = manager
        .execute(&request, &json!({"topic": "otters"}), &steps)
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_ref().map(|e| e.kind),
        Some(ErrorKind::OrchestrationStepFailed)
    );
    assert_eq!(result.completed, vec!["research"]);
    assert_eq!(result.pending, vec!["assemble"]);

    // No lock left behind after the abort
    assert!(!manager
        .coordination()
        .is_in_progress("acme", "thread-3")
        .await
        .unwrap());
}
