use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_core::App as _;

use casecard_core::capabilities::{
    HttpError, HttpOperation, HttpResponse, ObjectUrlOperation, TimerOperation,
};
use casecard_core::focus::{FlipTrigger, FocusTarget};
use casecard_core::model::{LoadState, Model};
use casecard_core::record::{BlobRef, MediaRef, PartialRecord};
use casecard_core::view::CardFace;
use casecard_core::{App, BlobId, Effect, Event, RecordId};

fn tester() -> AppTester<App, Effect> {
    AppTester::<App, Effect>::default()
}

fn mount(app: &AppTester<App, Effect>, model: &mut Model, record: Option<PartialRecord>) {
    app.update(
        Event::Mounted {
            id: RecordId::new("case-7"),
            record: record.map(Box::new),
        },
        model,
    );
}

fn ok_response(body: &str) -> HttpResponse {
    HttpResponse::new(200, vec![], body.as_bytes().to_vec(), "req-1".into(), 12)
}

fn status_response(status: u16) -> HttpResponse {
    HttpResponse::new(status, vec![], Vec::new(), "req-1".into(), 12)
}

fn http_request_urls(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(req) => {
                let HttpOperation::Execute(r) = &req.operation;
                Some(r.url().as_str().to_string())
            }
            _ => None,
        })
        .collect()
}

fn timer_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Timer(_)))
        .count()
}

#[test]
fn mount_without_data_renders_fallback_and_fetches() {
    let app = tester();
    let mut model = Model::default();

    let update = app.update(
        Event::Mounted {
            id: RecordId::new("case-7"),
            record: None,
        },
        &mut model,
    );

    // The fallback is renderable immediately; no loading flash.
    assert_eq!(model.record.title, "Unnamed case");
    assert!(model.load.is_fetching());

    let urls = http_request_urls(&update.effects);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("/records/case-7"));
    assert!(update
        .effects
        .iter()
        .any(|e| matches!(e, Effect::Render(_))));
}

#[test]
fn mount_with_upstream_data_does_not_fetch() {
    let app = tester();
    let mut model = Model::default();

    let partial = PartialRecord {
        title: Some("Stolen e-bike".into()),
        ..PartialRecord::default()
    };
    let update = app.update(
        Event::Mounted {
            id: RecordId::new("case-7"),
            record: Some(Box::new(partial)),
        },
        &mut model,
    );

    assert_eq!(model.record.title, "Stolen e-bike");
    assert_matches!(model.load, LoadState::Ready);
    assert!(http_request_urls(&update.effects).is_empty());
}

#[test]
fn flip_is_idempotent_under_rapid_input() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, Some(PartialRecord::default()));

    let update = app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::DetailsControl,
        },
        &mut model,
    );
    assert!(model.ui.flipped);
    assert!(model.ui.animating);
    assert_eq!(timer_count(&update.effects), 1);

    // Dismiss gesture inside the animation window: dropped, not queued.
    let update = app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::EscapeKey,
        },
        &mut model,
    );
    assert!(model.ui.flipped, "flip must not double-toggle");
    assert_eq!(timer_count(&update.effects), 0);

    // Window closes; the next flip is accepted again.
    app.update(
        Event::FlipAnimationDone {
            token: model.ui.flip_token(),
        },
        &mut model,
    );
    assert!(!model.ui.animating);

    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::EscapeKey,
        },
        &mut model,
    );
    assert!(!model.ui.flipped);
}

#[test]
fn open_gestures_only_act_on_the_front_face() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, Some(PartialRecord::default()));

    // Escape while the front shows: nothing to dismiss.
    let update = app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::EscapeKey,
        },
        &mut model,
    );
    assert!(!model.ui.flipped);
    assert_eq!(timer_count(&update.effects), 0);

    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::FrontFace,
        },
        &mut model,
    );
    app.update(
        Event::FlipAnimationDone {
            token: model.ui.flip_token(),
        },
        &mut model,
    );
    assert!(model.ui.flipped);

    // A second open gesture while flipped is ignored.
    let update = app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::DetailsControl,
        },
        &mut model,
    );
    assert!(model.ui.flipped);
    assert_eq!(timer_count(&update.effects), 0);
}

#[test]
fn tab_order_follows_the_flip() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, Some(PartialRecord::default()));

    let view = App::default().view(&model);
    assert_eq!(view.face, CardFace::Front);
    assert_eq!(view.front.details_control.tab_index, 0);
    assert!(view.back.tabs.iter().all(|t| t.tab_index == -1));
    assert!(!view.subscriptions.outside_click);

    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::DetailsControl,
        },
        &mut model,
    );
    app.update(
        Event::FlipAnimationDone {
            token: model.ui.flip_token(),
        },
        &mut model,
    );

    let view = App::default().view(&model);
    assert_eq!(view.face, CardFace::Back);
    assert!(view.back.tabs.iter().all(|t| t.tab_index == 0));
    assert_eq!(view.back.close_tab_index, 0);
    // Front-face controls leave the tab order: the trap is complete.
    assert_eq!(view.front.details_control.tab_index, -1);
    assert!(view.subscriptions.escape_key);
    assert!(view.subscriptions.outside_click);
    assert!(view.subscriptions.scroll_dismiss);
    assert_eq!(view.focus, Some(FocusTarget::BackFace));
}

#[test]
fn escape_returns_focus_to_the_details_control() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, Some(PartialRecord::default()));

    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::DetailsControl,
        },
        &mut model,
    );
    app.update(
        Event::FlipAnimationDone {
            token: model.ui.flip_token(),
        },
        &mut model,
    );

    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::EscapeKey,
        },
        &mut model,
    );
    let view = App::default().view(&model);
    assert_eq!(view.face, CardFace::Front);
    assert_eq!(view.focus, Some(FocusTarget::DetailsControl));

    // Pointer-driven dismissal leaves focus where the user put it.
    app.update(
        Event::FlipAnimationDone {
            token: model.ui.flip_token(),
        },
        &mut model,
    );
    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::FrontFace,
        },
        &mut model,
    );
    app.update(
        Event::FlipAnimationDone {
            token: model.ui.flip_token(),
        },
        &mut model,
    );
    app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::OutsideClick,
        },
        &mut model,
    );
    let view = App::default().view(&model);
    assert_eq!(view.face, CardFace::Front);
    assert_eq!(view.focus, None);
}

#[test]
fn image_failure_substitutes_the_placeholder_permanently() {
    let app = tester();
    let mut model = Model::default();
    let partial = PartialRecord {
        primary_image: Some(MediaRef::remote("https://cdn.example/mugshot.jpg")),
        ..PartialRecord::default()
    };
    mount(&app, &mut model, Some(partial));

    let view = App::default().view(&model);
    assert_eq!(view.front.image_url, "https://cdn.example/mugshot.jpg");
    assert!(!view.front.image_is_placeholder);

    app.update(Event::ImageLoadFailed, &mut model);
    let view = App::default().view(&model);
    assert!(model.ui.image_error);
    assert_eq!(view.front.image_url, model.config.placeholder_image);
    assert!(view.front.image_is_placeholder);

    // A second failure (e.g. the placeholder itself erroring upstream)
    // neither throws nor recurses.
    app.update(Event::ImageLoadFailed, &mut model);
    let view = App::default().view(&model);
    assert!(view.front.image_is_placeholder);
}

#[test]
fn transient_failure_offers_retry_and_retry_recovers() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, None);

    app.update(
        Event::FetchResponse(Box::new(Err(HttpError::Timeout {
            timeout_ms: 30_000,
            request_id: "req-1".into(),
        }))),
        &mut model,
    );
    let view = App::default().view(&model);
    let panel = view.error.expect("transient failure surfaces a panel");
    assert!(panel.can_retry);

    // Retry clears the panel optimistically and re-fetches exactly once.
    let update = app.update(Event::RetryRequested, &mut model);
    assert!(model.load.is_fetching());
    let view = App::default().view(&model);
    assert!(view.error.is_none());
    assert!(view.is_loading);
    assert_eq!(http_request_urls(&update.effects).len(), 1);

    app.update(
        Event::FetchResponse(Box::new(Ok(ok_response(
            r#"{"title": "Burglary series, Stuttgart-West", "category": "wanted-person"}"#,
        )))),
        &mut model,
    );
    assert_matches!(model.load, LoadState::Ready);
    assert_eq!(model.record.title, "Burglary series, Stuttgart-West");
    assert!(App::default().view(&model).error.is_none());

    // With the card healthy again, the retry affordance is gone.
    let update = app.update(Event::RetryRequested, &mut model);
    assert!(!model.load.is_fetching(), "retry without an error is ignored");
    assert!(http_request_urls(&update.effects).is_empty());
}

#[test]
fn second_failure_reenters_the_error_state() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, None);

    app.update(
        Event::FetchResponse(Box::new(Err(HttpError::Timeout {
            timeout_ms: 30_000,
            request_id: "req-1".into(),
        }))),
        &mut model,
    );
    app.update(Event::RetryRequested, &mut model);
    app.update(
        Event::FetchResponse(Box::new(Err(HttpError::Connection {
            host: "portal.example".into(),
            message: "connection reset".into(),
        }))),
        &mut model,
    );

    let view = App::default().view(&model);
    let panel = view.error.expect("second failure surfaces the panel again");
    assert!(panel.can_retry);
}

#[test]
fn not_found_is_terminal_and_ignores_retry() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, None);

    app.update(
        Event::FetchResponse(Box::new(Ok(status_response(404)))),
        &mut model,
    );
    let view = App::default().view(&model);
    let panel = view.error.expect("not-found surfaces a panel");
    assert!(!panel.can_retry);
    assert_eq!(panel.title, "Record unavailable");

    let update = app.update(Event::RetryRequested, &mut model);
    assert!(http_request_urls(&update.effects).is_empty());
    assert_matches!(model.load, LoadState::Failed(_));
}

#[test]
fn quick_edit_visibility_requires_hover_and_permission() {
    let app = tester();
    let mut model = Model::default();
    model.config.permissions.can_edit = true;
    mount(&app, &mut model, Some(PartialRecord::default()));

    assert!(!App::default().view(&model).front.quick_edit_visible);

    app.update(Event::PointerEntered, &mut model);
    assert!(App::default().view(&model).front.quick_edit_visible);

    app.update(Event::PointerExited, &mut model);
    assert!(!App::default().view(&model).front.quick_edit_visible);

    // Hovering without permission shows nothing.
    model.config.permissions.can_edit = false;
    app.update(Event::PointerEntered, &mut model);
    assert!(!App::default().view(&model).front.quick_edit_visible);
}

#[test]
fn navigation_is_suppressed_in_embedded_contexts() {
    let app = tester();
    let mut model = Model::default();
    model.config.navigation_disabled = true;
    mount(&app, &mut model, Some(PartialRecord::default()));

    let update = app.update(Event::OpenRecordRequested, &mut model);
    assert!(
        !update
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Navigate(_))),
        "disabled context must not navigate"
    );

    model.config.navigation_disabled = false;
    let update = app.update(Event::OpenRecordRequested, &mut model);
    assert!(update
        .effects
        .iter()
        .any(|e| matches!(e, Effect::Navigate(_))));
}

#[test]
fn unmount_revokes_exactly_the_created_urls() {
    let app = tester();
    let mut model = Model::default();
    let blob_id = BlobId::new("b1");
    let partial = PartialRecord {
        primary_image: Some(MediaRef::Local {
            blob: BlobRef::new(blob_id.clone()),
        }),
        ..PartialRecord::default()
    };

    let update = app.update(
        Event::Mounted {
            id: RecordId::new("case-7"),
            record: Some(Box::new(partial)),
        },
        &mut model,
    );
    assert!(
        update.effects.iter().any(|e| matches!(
            e,
            Effect::ObjectUrl(req) if matches!(req.operation, ObjectUrlOperation::Create { .. })
        )),
        "local media needs a display URL"
    );

    app.update(
        Event::ObjectUrlCreated {
            blob_id: blob_id.clone(),
            url: "blob:preview-1".into(),
        },
        &mut model,
    );
    assert_eq!(model.object_urls.len(), 1);

    let update = app.update(Event::Unmounted, &mut model);
    let revoked: Vec<_> = update
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::ObjectUrl(req) => match &req.operation {
                ObjectUrlOperation::Revoke { urls } => Some(urls.clone()),
                ObjectUrlOperation::Create { .. } => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(revoked, vec![vec!["blob:preview-1".to_string()]]);
    assert!(model.object_urls.is_empty());

    // A URL minted after unmount is revoked immediately, not leaked.
    let update = app.update(
        Event::ObjectUrlCreated {
            blob_id: BlobId::new("late"),
            url: "blob:late".into(),
        },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| matches!(
        e,
        Effect::ObjectUrl(req) if matches!(&req.operation, ObjectUrlOperation::Revoke { urls } if urls == &vec!["blob:late".to_string()])
    )));
    assert!(model.object_urls.is_empty());
}

#[test]
fn late_fetch_response_after_unmount_is_ignored() {
    let app = tester();
    let mut model = Model::default();
    mount(&app, &mut model, None);
    app.update(Event::Unmounted, &mut model);

    let update = app.update(
        Event::FetchResponse(Box::new(Ok(ok_response(r#"{"title": "late"}"#)))),
        &mut model,
    );
    assert_ne!(model.record.title, "late");
    assert!(update.effects.is_empty(), "no reaction after unmount");
}

#[test]
fn timer_effects_carry_the_configured_flip_duration() {
    let app = tester();
    let mut model = Model::default();
    model.config.flip_duration_ms = 350;
    mount(&app, &mut model, Some(PartialRecord::default()));

    let update = app.update(
        Event::FlipRequested {
            trigger: FlipTrigger::DetailsControl,
        },
        &mut model,
    );
    let millis: Vec<_> = update
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::Timer(req) => match req.operation {
                TimerOperation::Start { millis, .. } => Some(millis),
                TimerOperation::Cancel { .. } => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(millis, vec![350]);
}
