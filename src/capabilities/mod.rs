mod http;
mod navigate;
mod object_url;
mod timer;

pub use self::http::{
    Http, HttpError, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    ValidatedUrl,
};
pub use self::navigate::{Navigate, NavigateOperation};
pub use self::object_url::{ObjectUrl, ObjectUrlOperation, ObjectUrlOutput};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub timer: Timer<Event>,
    pub object_url: ObjectUrl<Event>,
    pub navigate: Navigate<Event>,
}
