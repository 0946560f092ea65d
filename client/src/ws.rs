use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use starchart_shared::MapEvent;

use crate::config::{RECONNECT_BASE_MS, RECONNECT_MAX_ATTEMPTS, RECONNECT_MAX_MS, WS_PATH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Disconnected,
    Error,
    Reconnecting(u32),
    Failed,
}

impl ConnectionStatus {
    pub fn text(self) -> String {
        match self {
            Self::Connecting => "CONNECTING...".to_string(),
            Self::Live => "CONNECTED".to_string(),
            Self::Disconnected => "DISCONNECTED".to_string(),
            Self::Error => "ERROR".to_string(),
            Self::Reconnecting(attempt) => format!("RECONNECTING... ({attempt})"),
            Self::Failed => "CONNECTION FAILED".to_string(),
        }
    }

    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Live => "status-live",
            Self::Connecting | Self::Error | Self::Reconnecting(_) => "status-warning",
            Self::Disconnected | Self::Failed => "status-error",
        }
    }
}

/// Delay before reconnect attempt `attempt` (1-based): doubling from the base,
/// capped.
pub fn reconnect_delay_ms(attempt: u32) -> u32 {
    let exponent = attempt.saturating_sub(1).min(15);
    RECONNECT_BASE_MS
        .saturating_mul(1u32 << exponent)
        .min(RECONNECT_MAX_MS)
}

/// The next attempt number after `made` failed attempts, or `None` once the
/// budget is spent.
pub fn next_attempt(made: u32) -> Option<u32> {
    (made < RECONNECT_MAX_ATTEMPTS).then_some(made + 1)
}

pub fn socket_url(protocol: &str, host: &str) -> String {
    let scheme = if protocol == "https:" { "wss:" } else { "ws:" };
    format!("{scheme}//{host}{WS_PATH}")
}

type EventSink = Rc<dyn Fn(MapEvent)>;

struct WsConnection {
    socket: WebSocket,
    _on_open: Closure<dyn Fn()>,
    _on_message: Closure<dyn Fn(MessageEvent)>,
    _on_close: Closure<dyn Fn(CloseEvent)>,
    _on_error: Closure<dyn Fn(Event)>,
}

impl WsConnection {
    fn close(self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        self.socket.set_onerror(None);
        let _ = self.socket.close();
    }
}

thread_local! {
    static WS_CONNECTION: RefCell<Option<WsConnection>> = const { RefCell::new(None) };
    static RECONNECT_TIMER: RefCell<Option<Timeout>> = const { RefCell::new(None) };
    static RECONNECT_ATTEMPTS: Cell<u32> = const { Cell::new(0) };
}

/// Open the push socket. Every decoded message goes to `on_event`; frames
/// that fail to decode are logged and dropped.
pub fn connect(on_event: impl Fn(MapEvent) + 'static, status: RwSignal<ConnectionStatus>) {
    RECONNECT_ATTEMPTS.with(|attempts| attempts.set(0));
    RECONNECT_TIMER.with(|slot| slot.borrow_mut().take());
    status.set(ConnectionStatus::Connecting);
    open_socket(Rc::new(on_event), status);
}

/// Close the socket and cancel any pending reconnect.
pub fn disconnect() {
    RECONNECT_TIMER.with(|slot| slot.borrow_mut().take());
    let old = WS_CONNECTION.with(|slot| slot.borrow_mut().take());
    if let Some(old) = old {
        old.close();
    }
}

fn current_socket_url() -> Option<String> {
    let location = web_sys::window()?.location();
    Some(socket_url(&location.protocol().ok()?, &location.host().ok()?))
}

fn open_socket(sink: EventSink, status: RwSignal<ConnectionStatus>) {
    let Some(url) = current_socket_url() else {
        status.set(ConnectionStatus::Failed);
        return;
    };
    let socket = match WebSocket::new(&url) {
        Ok(socket) => socket,
        Err(e) => {
            web_sys::console::warn_1(&format!("WebSocket open failed: {e:?}").into());
            schedule_reconnect(sink, status);
            return;
        }
    };

    let on_open = Closure::<dyn Fn()>::new(move || {
        web_sys::console::info_1(&"WebSocket connected".into());
        RECONNECT_ATTEMPTS.with(|attempts| attempts.set(0));
        status.set(ConnectionStatus::Live);
    });
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let message_sink = sink.clone();
    let on_message = Closure::<dyn Fn(MessageEvent)>::new(move |e: MessageEvent| {
        let Some(text) = e.data().as_string() else {
            web_sys::console::warn_1(&"Dropping non-text push frame".into());
            return;
        };
        match MapEvent::decode(&text) {
            Ok(event) => message_sink(event),
            Err(err) => {
                web_sys::console::warn_1(&format!("Dropping push message: {err}").into());
            }
        }
    });
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let on_close = Closure::<dyn Fn(CloseEvent)>::new(move |_: CloseEvent| {
        status.set(ConnectionStatus::Disconnected);
        schedule_reconnect(sink.clone(), status);
    });
    socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    let on_error = Closure::<dyn Fn(Event)>::new(move |_: Event| {
        web_sys::console::error_1(&"WebSocket error".into());
        status.set(ConnectionStatus::Error);
    });
    socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    WS_CONNECTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(old) = slot.take() {
            old.close();
        }
        *slot = Some(WsConnection {
            socket,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
        });
    });
}

fn schedule_reconnect(sink: EventSink, status: RwSignal<ConnectionStatus>) {
    let Some(attempt) = RECONNECT_ATTEMPTS.with(|attempts| {
        let next = next_attempt(attempts.get())?;
        attempts.set(next);
        Some(next)
    }) else {
        web_sys::console::error_1(&"WebSocket reconnect attempts exhausted".into());
        status.set(ConnectionStatus::Failed);
        return;
    };

    let delay = reconnect_delay_ms(attempt);
    web_sys::console::info_1(&format!("Reconnecting in {delay} ms (attempt {attempt})").into());
    status.set(ConnectionStatus::Reconnecting(attempt));
    let timer = Timeout::new(delay, move || open_socket(sink, status));
    RECONNECT_TIMER.with(|slot| *slot.borrow_mut() = Some(timer));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_then_caps() {
        assert_eq!(reconnect_delay_ms(1), 1_000);
        assert_eq!(reconnect_delay_ms(2), 2_000);
        assert_eq!(reconnect_delay_ms(5), 16_000);
        assert_eq!(reconnect_delay_ms(6), 30_000);
        assert_eq!(reconnect_delay_ms(40), 30_000);
    }

    #[test]
    fn attempts_stop_at_budget() {
        assert_eq!(next_attempt(0), Some(1));
        assert_eq!(next_attempt(9), Some(10));
        assert_eq!(next_attempt(10), None);
    }

    #[test]
    fn url_follows_page_scheme() {
        assert_eq!(socket_url("https:", "map.example"), "wss://map.example/ws");
        assert_eq!(socket_url("http:", "localhost:8080"), "ws://localhost:8080/ws");
    }

    #[test]
    fn status_text() {
        assert_eq!(ConnectionStatus::Live.text(), "CONNECTED");
        assert_eq!(ConnectionStatus::Reconnecting(3).text(), "RECONNECTING... (3)");
        assert_eq!(ConnectionStatus::Failed.text(), "CONNECTION FAILED");
    }
}
