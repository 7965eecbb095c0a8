//! Listener registry for stream events.
//!
//! Emission clones the listener list first, so a listener may register
//! further listeners or call back into the stream.

use std::rc::Rc;

use crate::chunk::Chunk;
use crate::error::StreamError;

use super::TransformStream;

pub(crate) type DataListener = Rc<dyn Fn(&Chunk)>;
pub(crate) type SignalListener = Rc<dyn Fn()>;
pub(crate) type ErrorListener = Rc<dyn Fn(&StreamError)>;
pub(crate) type PipeListener = Rc<dyn Fn(&TransformStream, &TransformStream)>;

#[derive(Default)]
pub(crate) struct Events {
    pub(crate) data: Vec<DataListener>,
    pub(crate) end: Vec<SignalListener>,
    pub(crate) finish: Vec<SignalListener>,
    pub(crate) drain: Vec<SignalListener>,
    pub(crate) error: Vec<ErrorListener>,
    pub(crate) pipe: Vec<PipeListener>,
}

/// Which no-argument event to emit.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Signal {
    End,
    Finish,
    Drain,
}

impl Events {
    pub(crate) fn signal(&self, signal: Signal) -> Vec<SignalListener> {
        match signal {
            Signal::End => self.end.clone(),
            Signal::Finish => self.finish.clone(),
            Signal::Drain => self.drain.clone(),
        }
    }
}
