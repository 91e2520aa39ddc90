use std::cell::RefCell;
use std::rc::Rc;

use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_book_item_creation::{ProgressEvent, ProgressNormalizer, PROGRESS_EVENT};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent};

use super::tracker::{RealtimeChannel, Subscription};

type ProgressSink = Rc<dyn Fn(ProgressEvent)>;

/// Канал событий прогресса поверх Server-Sent Events
pub struct EventSourceChannel {
    url: String,
    sink: ProgressSink,
}

impl EventSourceChannel {
    pub fn new(url: String, sink: impl Fn(ProgressEvent) + 'static) -> Self {
        Self {
            url,
            sink: Rc::new(sink),
        }
    }
}

pub struct EventSourceSubscription {
    docname: String,
    source: Option<EventSource>,
    listener: Option<Closure<dyn FnMut(MessageEvent)>>,
}

impl Subscription for EventSourceSubscription {
    fn docname(&self) -> &str {
        &self.docname
    }

    fn cancel(&mut self) {
        if let Some(source) = self.source.take() {
            if let Some(listener) = self.listener.as_ref() {
                let _ = source.remove_event_listener_with_callback(
                    PROGRESS_EVENT,
                    listener.as_ref().unchecked_ref(),
                );
            }
            source.close();
            log::debug!("u508: realtime listener for {} closed", self.docname);
        }
        self.listener = None;
    }
}

impl Drop for EventSourceSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl RealtimeChannel for EventSourceChannel {
    type Subscription = EventSourceSubscription;

    fn subscribe(&mut self, docname: &str) -> Result<EventSourceSubscription, UseCaseError> {
        let source = EventSource::new(&self.url).map_err(|e| {
            UseCaseError::remote(format!("Failed to open realtime channel: {:?}", e))
        })?;

        let normalizer = Rc::new(RefCell::new(ProgressNormalizer::new()));
        let sink = self.sink.clone();
        let expected = docname.to_string();

        let listener = Closure::wrap(Box::new(move |event: MessageEvent| {
            let Some(raw) = event.data().as_string() else {
                return;
            };
            match normalizer.borrow_mut().decode(&raw) {
                Ok(progress) if progress.docname == expected => sink(progress),
                Ok(_) => {}
                Err(e) => log::warn!("u508: malformed progress event: {}", e),
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        source
            .add_event_listener_with_callback(PROGRESS_EVENT, listener.as_ref().unchecked_ref())
            .map_err(|e| UseCaseError::remote(format!("Failed to listen for progress: {:?}", e)))?;

        log::debug!("u508: realtime listener for {} opened", docname);
        Ok(EventSourceSubscription {
            docname: docname.to_string(),
            source: Some(source),
            listener: Some(listener),
        })
    }
}
