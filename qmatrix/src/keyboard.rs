use embassy_sync::channel::Receiver;

use crate::RawMutex;
use crate::config::KeyboardConfig;
use crate::event::KeyboardEvent;
use crate::layer::LayerState;
use crate::processor::{DispatchError, dispatch};
use crate::sink::{EventSink, Timer};
use crate::state::KeyboardState;

/// One keyboard device: its configuration, its state and where its events go.
pub struct Keyboard<'a, S: EventSink, T: Timer> {
    config: KeyboardConfig<'a>,
    state: KeyboardState,
    sink: S,
    timer: T,
    /// Layer state last reported through [`EventSink::layer_changed`]
    reported_layer_state: LayerState,
}

impl<'a, S: EventSink, T: Timer> Keyboard<'a, S, T> {
    pub fn new(config: KeyboardConfig<'a>, sink: S, timer: T) -> Self {
        Self {
            config,
            state: KeyboardState::new(),
            sink,
            timer,
            reported_layer_state: LayerState::new(),
        }
    }

    pub fn config(&self) -> &KeyboardConfig<'a> {
        &self.config
    }

    pub fn state(&self) -> &KeyboardState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Process one matrix event. Dispatch errors are logged and the event is dropped.
    pub fn process_event(&mut self, event: KeyboardEvent) {
        self.sink.matrix_event(event);

        match dispatch(&mut self.state, &self.config, &mut self.sink, &mut self.timer, event) {
            Ok(()) => {}
            Err(e @ (DispatchError::RowOutOfBounds { .. } | DispatchError::ColOutOfBounds { .. })) => {
                error!("Dropped matrix event {:?}: {:?}", event, e);
            }
            Err(e) => warn!("Failed to process {:?}: {:?}", event, e),
        }

        let layer_state = self.state.layer_state();
        if layer_state != self.reported_layer_state {
            self.reported_layer_state = layer_state;
            debug!("Layer state changed: {:?}", layer_state);
            self.sink.layer_changed(layer_state.active_layer(), layer_state);
        }
    }

    /// Process matrix events as they arrive.
    pub async fn run<const N: usize>(&mut self, events: Receiver<'_, RawMutex, KeyboardEvent, N>) -> ! {
        loop {
            let event = events.receive().await;
            self.process_event(event);
        }
    }
}
