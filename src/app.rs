//! Composition root: wires the merger, state machine, focus policy,
//! geocoder, object-URL cache and error handling into one `update()`/
//! `view()` pair. The state machine never performs effects itself; this is
//! the only place that talks to capabilities.

use tracing::{debug, warn};

use crate::capabilities::{
    Capabilities, HttpRequest, ObjectUrlOutput, TimerId, TimerOutput,
};
use crate::event::Event;
use crate::focus::{self, Subscriptions};
use crate::geocode::{self, GeocodePlan, GeocodeQuery, ResolvedLocation};
use crate::model::{DetailTab, LoadState, Model};
use crate::record::{self, MediaRef, PartialRecord, Record};
use crate::view::{
    BackFaceView, CardFace, ControlView, ErrorPanelView, FrontFaceView, LocationView,
    MediaItemView, TabContentView, TabView, ViewModel,
};
use crate::{CardError, ErrorKind, DESCRIPTION_PREVIEW_LENGTH};

#[derive(Default)]
pub struct App;

impl App {
    fn next_timer_id(model: &mut Model) -> TimerId {
        model.timer_seq += 1;
        TimerId(model.timer_seq)
    }

    fn fetch_record(model: &mut Model, caps: &Capabilities) {
        // Optimistic on retry: entering Fetching clears any error panel
        // before the request resolves.
        model.load = LoadState::Fetching;

        let url = format!(
            "{}/records/{}",
            model.config.record_base_url.trim_end_matches('/'),
            model.record_id
        );
        let request = HttpRequest::get(url)
            .and_then(|r| r.with_header("Accept", "application/json"))
            .and_then(|r| r.with_timeout_ms(model.config.fetch_timeout_ms));

        match request {
            Ok(request) => {
                caps.http
                    .send(request, |result| Event::FetchResponse(Box::new(result)));
            }
            Err(e) => {
                warn!(error = %e, "record request could not be built");
                model.load = LoadState::Failed(CardError::new(ErrorKind::Unknown, e.to_string()));
            }
        }
    }

    fn apply_record(partial: PartialRecord, model: &mut Model, caps: &Capabilities) {
        model.source = Some(partial);
        model.record = record::merge(model.source.as_ref(), &Record::fallback());
        model.load = LoadState::Ready;

        Self::request_local_previews(model, caps);
        Self::schedule_location(model, caps);
    }

    /// Ask the shell for display URLs for local media handles that don't
    /// have one yet. The pending set keeps this idempotent across renders.
    fn request_local_previews(model: &mut Model, caps: &Capabilities) {
        let blobs: Vec<_> = model
            .record
            .media
            .iter()
            .filter_map(|media| match media {
                MediaRef::Local { blob } => Some(blob.clone()),
                MediaRef::Remote { .. } => None,
            })
            .filter(|blob| model.object_urls.needs_url(&blob.id))
            .collect();

        for blob in blobs {
            model.object_urls.mark_pending(blob.id.clone());
            let blob_id = blob.id.clone();
            caps.object_url.create(blob, move |output| match output {
                ObjectUrlOutput::Created { url } => Event::ObjectUrlCreated { blob_id, url },
                ObjectUrlOutput::Revoked => Event::Noop,
            });
        }
    }

    /// Decide how the location tab gets its coordinates. Known coordinates
    /// resolve without the network; everything else goes through the
    /// debounced lookup.
    fn schedule_location(model: &mut Model, caps: &Capabilities) {
        let address = model
            .record
            .main_location
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(ToOwned::to_owned);

        let query = match (address, model.record.coordinates) {
            (Some(address), Some(coord)) => {
                model.geocode.resolve_immediate(ResolvedLocation {
                    coord,
                    display_name: address,
                });
                None
            }
            (Some(address), None) => Some(GeocodeQuery::forward(&address)),
            (None, Some(coord)) => {
                // Pin immediately, fill in the display address via reverse
                // lookup when it arrives.
                model.geocode.resolve_immediate(ResolvedLocation {
                    coord,
                    display_name: String::new(),
                });
                Some(GeocodeQuery::Reverse { coord })
            }
            (None, None) => None,
        };

        if let Some(query) = query {
            match model.geocode.schedule(query) {
                GeocodePlan::Debounce { generation } => {
                    Self::arm_debounce(model, caps, generation);
                }
                GeocodePlan::CacheHit | GeocodePlan::AlreadyScheduled => {}
            }
        }
    }

    fn arm_debounce(model: &mut Model, caps: &Capabilities, generation: u64) {
        let id = Self::next_timer_id(model);
        caps.timer.start(
            id,
            model.config.geocode_debounce_ms,
            move |output| match output {
                TimerOutput::Fired { .. } => Event::GeocodeDebounceElapsed { generation },
                TimerOutput::Cancelled { .. } => Event::Noop,
            },
        );
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user = event.is_user_initiated(),
            "card event"
        );

        match event {
            Event::Noop => {}

            Event::Mounted { id, record } => {
                model.mounted = true;
                model.record_id = id;
                // The fallback renders immediately; real data re-merges
                // without a loading flash when it lands.
                model.record = Record::fallback();

                match record {
                    Some(partial) => Self::apply_record(*partial, model, caps),
                    None => Self::fetch_record(model, caps),
                }
                caps.render.render();
            }

            Event::RecordDataArrived { record } => {
                if !model.mounted {
                    debug!("record data arrived after unmount; ignored");
                    return;
                }
                Self::apply_record(*record, model, caps);
                caps.render.render();
            }

            Event::Unmounted => {
                model.mounted = false;
                model.geocode.abandon();
                let urls = model.object_urls.release_all();
                caps.object_url.revoke(urls);
            }

            Event::FetchRequested => {
                if !model.mounted {
                    return;
                }
                Self::fetch_record(model, caps);
                caps.render.render();
            }

            Event::FetchResponse(result) => {
                if !model.mounted {
                    debug!("record fetch completed after unmount; ignored");
                    return;
                }
                match *result {
                    Ok(response) if response.is_success() => {
                        match response.json::<PartialRecord>() {
                            Ok(partial) => Self::apply_record(partial, model, caps),
                            Err(e) => {
                                warn!(error = %e, "record payload could not be parsed");
                                model.load = LoadState::Failed(CardError::new(
                                    ErrorKind::Deserialization,
                                    e.to_string(),
                                ));
                            }
                        }
                    }
                    Ok(response) => {
                        let error =
                            CardError::from_http_status(response.status(), Some(response.body()));
                        warn!(status = response.status(), code = error.code(), "record fetch failed");
                        model.load = LoadState::Failed(error);
                    }
                    Err(e) => {
                        let error = CardError::from(&e);
                        warn!(code = error.code(), "record fetch errored");
                        model.load = LoadState::Failed(error);
                    }
                }
                caps.render.render();
            }

            Event::RetryRequested => {
                if model.load.can_retry() {
                    Self::fetch_record(model, caps);
                    caps.render.render();
                } else {
                    debug!("retry ignored: no retryable error present");
                }
            }

            Event::FlipRequested { trigger } => {
                let allowed = if trigger.is_open_gesture() {
                    !model.ui.flipped
                } else {
                    model.ui.flipped
                };
                if !allowed {
                    debug!(?trigger, "flip request does not apply to the visible face");
                    return;
                }

                if let Some(token) = model.ui.begin_flip() {
                    model.focus.on_flip(model.ui.flipped, trigger);
                    let id = Self::next_timer_id(model);
                    caps.timer.start(
                        id,
                        model.config.flip_duration_ms,
                        move |output| match output {
                            TimerOutput::Fired { .. } => Event::FlipAnimationDone { token },
                            TimerOutput::Cancelled { .. } => Event::Noop,
                        },
                    );
                    caps.render.render();
                } else {
                    debug!(?trigger, "flip dropped while animating");
                }
            }

            Event::FlipAnimationDone { token } => {
                if model.ui.finish_flip(token) {
                    caps.render.render();
                } else {
                    debug!("stale flip-animation completion ignored");
                }
            }

            Event::TabSelected(tab) => {
                if model.ui.select_tab(tab) {
                    caps.render.render();
                }
            }

            Event::PointerEntered => {
                model.ui.set_quick_edit_visible(true);
                caps.render.render();
            }

            Event::PointerExited => {
                model.ui.set_quick_edit_visible(false);
                caps.render.render();
            }

            Event::ImageLoadFailed => {
                if !model.ui.image_error {
                    debug!(record = %model.record_id, "main image failed; placeholder substituted");
                    model.ui.set_image_error(true);
                }
                caps.render.render();
            }

            Event::GeocodeDebounceElapsed { generation } => {
                if !model.mounted {
                    return;
                }
                if let Some(query) = model.geocode.debounce_elapsed(generation) {
                    let key = query.cache_key();
                    match geocode::request_for(&model.config, &query) {
                        Ok(request) => {
                            debug!(key = %key, "geocode lookup dispatched");
                            caps.http.send(request, move |result| Event::GeocodeResponse {
                                key,
                                result: Box::new(result),
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "geocode request could not be built");
                            model.geocode.complete(&key, None);
                        }
                    }
                }
            }

            Event::GeocodeResponse { key, result } => {
                if !model.mounted {
                    model.geocode.abandon();
                    return;
                }
                let outcome = match *result {
                    Ok(response) if response.is_success() => {
                        if key.starts_with("rev:") {
                            geocode::parse_reverse(response.body())
                        } else {
                            geocode::parse_forward(response.body())
                        }
                    }
                    Ok(response) => {
                        warn!(status = response.status(), "geocode lookup failed");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "geocode lookup errored");
                        None
                    }
                };
                model.geocode.complete(&key, outcome);

                // A different address may have queued up behind this one.
                if let Some(generation) = model.geocode.rearm() {
                    Self::arm_debounce(model, caps, generation);
                }
                caps.render.render();
            }

            Event::ObjectUrlCreated { blob_id, url } => {
                if !model.mounted {
                    // Arrived after unmount: revoke straight away instead
                    // of leaking the URL.
                    caps.object_url.revoke(vec![url]);
                    return;
                }
                if let Some(surplus) = model.object_urls.insert(blob_id, url) {
                    caps.object_url.revoke(vec![surplus]);
                }
                caps.render.render();
            }

            Event::LocalPreviewDiscarded { blob_id } => {
                if let Some(url) = model.object_urls.release(&blob_id) {
                    caps.object_url.revoke(vec![url]);
                }
                if model
                    .record
                    .media
                    .primary
                    .as_ref()
                    .and_then(MediaRef::blob_id)
                    == Some(&blob_id)
                {
                    model.record.media.primary = None;
                }
                model
                    .record
                    .media
                    .gallery
                    .retain(|media| media.blob_id() != Some(&blob_id));
                caps.render.render();
            }

            Event::OpenRecordRequested => {
                if model.config.navigation_disabled {
                    debug!("navigation disabled by embedding context");
                } else {
                    caps.navigate.to_detail(model.record_id.clone());
                }
            }

            Event::QuickEditRequested => {
                if model.can_quick_edit() && !model.config.navigation_disabled {
                    caps.navigate.to_edit(model.record_id.clone());
                } else {
                    debug!("quick edit not permitted in this context");
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let record = &model.record;
        let (image_url, image_is_placeholder) = front_image(model);

        ViewModel {
            face: if model.ui.flipped {
                CardFace::Back
            } else {
                CardFace::Front
            },
            animating: model.ui.animating,
            flip_duration_ms: model.config.flip_duration_ms,
            front: FrontFaceView {
                title: record.title.clone(),
                summary: record.description_preview(DESCRIPTION_PREVIEW_LENGTH),
                image_url,
                image_is_placeholder,
                category_badge: record.category.badge().into(),
                priority_badge: record.priority.badge().into(),
                tags: record.tags.clone(),
                quick_edit_visible: model.ui.quick_edit_visible && model.can_quick_edit(),
                quick_delete_visible: model.ui.quick_edit_visible
                    && model.config.permissions.can_delete,
                details_control: ControlView {
                    tab_index: focus::front_face_tab_index(model.ui.flipped),
                    stops_propagation: true,
                },
            },
            back: BackFaceView {
                tabs: DetailTab::ALL
                    .iter()
                    .map(|tab| TabView {
                        tab: *tab,
                        active: *tab == model.ui.active_tab,
                        tab_index: focus::back_face_tab_index(model.ui.flipped),
                    })
                    .collect(),
                content: tab_content(model),
                close_tab_index: focus::back_face_tab_index(model.ui.flipped),
            },
            error: model.load.error().map(|e| ErrorPanelView {
                title: if e.is_retryable() {
                    "Temporary problem".into()
                } else {
                    "Record unavailable".into()
                },
                message: e.user_facing_message(),
                can_retry: e.is_retryable(),
            }),
            is_loading: model.load.is_fetching(),
            subscriptions: Subscriptions::for_state(&model.ui),
            focus: model.focus.directive,
        }
    }
}

/// Main image with the placeholder substituted for errored, absent, empty
/// or not-yet-minted sources. The returned URL is never an empty string.
fn front_image(model: &Model) -> (String, bool) {
    if !model.ui.image_error {
        if let Some(media) = &model.record.media.primary {
            if let Some(url) = model.object_urls.display_url(media) {
                if !url.is_empty() {
                    return (url.to_string(), false);
                }
            }
        }
    }
    (model.config.placeholder_image.clone(), true)
}

fn tab_content(model: &Model) -> TabContentView {
    let record = &model.record;
    match model.ui.active_tab {
        DetailTab::Overview => TabContentView::Overview {
            short_description: record.short_description.clone(),
            features: record.features.clone(),
            category_badge: record.category.badge().into(),
            priority_badge: record.priority.badge().into(),
            contact: (&record.contact).into(),
        },
        DetailTab::Description => TabContentView::Description {
            long_description: record.long_description.clone(),
        },
        DetailTab::Media => TabContentView::Media {
            items: record
                .media
                .iter()
                .map(|media| {
                    let url = model
                        .object_urls
                        .display_url(media)
                        .filter(|u| !u.is_empty());
                    MediaItemView {
                        pending: media.is_local() && url.is_none(),
                        url: url.map_or_else(
                            || model.config.placeholder_image.clone(),
                            ToOwned::to_owned,
                        ),
                        is_local_preview: media.is_local(),
                    }
                })
                .collect(),
        },
        DetailTab::Location => TabContentView::Location {
            location: location_view(model),
        },
    }
}

fn location_view(model: &Model) -> LocationView {
    let record = &model.record;
    let has_address = record
        .main_location
        .as_deref()
        .is_some_and(|a| !a.trim().is_empty());

    if !has_address && record.coordinates.is_none() {
        return LocationView::NoData;
    }

    if let Some(resolved) = &model.geocode.resolved {
        let display_address = if resolved.display_name.is_empty() {
            record
                .main_location
                .clone()
                .unwrap_or_else(|| {
                    format!("{:.5}, {:.5}", resolved.coord.lat, resolved.coord.lon)
                })
        } else {
            resolved.display_name.clone()
        };
        return LocationView::Resolved {
            lat: resolved.coord.lat,
            lon: resolved.coord.lon,
            zoom: model.config.resolved_zoom,
            display_address,
        };
    }

    if model.geocode.is_pending() {
        return LocationView::Pending {
            address: record.main_location.clone(),
        };
    }

    LocationView::Fallback {
        lat: model.config.fallback_center.lat,
        lon: model.config.fallback_center.lon,
        zoom: model.config.fallback_zoom,
    }
}
