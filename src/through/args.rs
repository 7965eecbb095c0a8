//! Argument shapes accepted by the [`Through`](super::Through) constructors.
//!
//! Every supported shape implements [`IntoArgs`]:
//!
//! | shape | options | transform | flush |
//! |---|---|---|---|
//! | `()` | default | pass-through | none |
//! | `Transform` | default | given | none |
//! | `(Transform, Flush)` | default | given | given |
//! | `Options` | given | pass-through | none |
//! | `(Options, Transform)` | given | given | none |
//! | `(Options, Transform, Flush)` | given | given | given |
//! | `(Option<Options>, Option<Transform>, Option<Flush>)` | any | any | any |
//!
//! Shapes starting with a `Transform` are the "options omitted" forms.

use crate::config::Options;

use super::callback::{Flush, Transform};

/// Resolved constructor arguments.
///
/// Missing pieces are filled in by [`Args::resolve`].
#[derive(Debug, Default)]
pub struct Args {
    /// Stream options, default when absent.
    pub options: Option<Options>,
    /// Per-unit callback, pass-through when absent.
    pub transform: Option<Transform>,
    /// End-of-input callback, skipped when absent.
    pub flush: Option<Flush>,
}

impl Args {
    /// Creates positional arguments.
    pub fn new(options: Option<Options>, transform: Option<Transform>, flush: Option<Flush>) -> Self {
        Self {
            options,
            transform,
            flush,
        }
    }

    /// Applies the defaults for every absent piece.
    pub fn resolve(self) -> (Options, Transform, Option<Flush>) {
        (
            self.options.unwrap_or_default(),
            self.transform.unwrap_or_else(Transform::passthrough),
            self.flush,
        )
    }
}

/// Conversion from an argument shape into [`Args`].
pub trait IntoArgs {
    /// Performs the conversion.
    fn into_args(self) -> Args;
}

impl IntoArgs for Args {
    fn into_args(self) -> Args {
        self
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Args {
        Args::default()
    }
}

impl IntoArgs for Options {
    fn into_args(self) -> Args {
        Args::new(Some(self), None, None)
    }
}

impl IntoArgs for Transform {
    fn into_args(self) -> Args {
        Args::new(None, Some(self), None)
    }
}

impl IntoArgs for (Transform, Flush) {
    fn into_args(self) -> Args {
        Args::new(None, Some(self.0), Some(self.1))
    }
}

impl IntoArgs for (Options, Transform) {
    fn into_args(self) -> Args {
        Args::new(Some(self.0), Some(self.1), None)
    }
}

impl IntoArgs for (Options, Transform, Flush) {
    fn into_args(self) -> Args {
        Args::new(Some(self.0), Some(self.1), Some(self.2))
    }
}

impl IntoArgs for (Option<Options>, Option<Transform>, Option<Flush>) {
    fn into_args(self) -> Args {
        Args::new(self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(args: impl IntoArgs) -> (bool, bool, bool) {
        let args = args.into_args();
        (
            args.options.is_some(),
            args.transform.is_some(),
            args.flush.is_some(),
        )
    }

    #[test]
    fn test_shapes() {
        let flush = || Flush::sync(|_| Ok(()));

        assert_eq!(shape(()), (false, false, false));
        assert_eq!(shape(Transform::passthrough()), (false, true, false));
        assert_eq!(shape((Transform::passthrough(), flush())), (false, true, true));
        assert_eq!(shape(Options::default()), (true, false, false));
        assert_eq!(shape((Options::default(), Transform::passthrough())), (true, true, false));
        assert_eq!(
            shape((Options::default(), Transform::passthrough(), flush())),
            (true, true, true)
        );
        assert_eq!(shape((None::<Options>, None::<Transform>, Some(flush()))), (false, false, true));
    }

    #[test]
    fn test_resolve_defaults() {
        let (options, transform, flush) = ().into_args().resolve();
        assert_eq!(options, Options::default());
        assert!(transform.is_sync());
        assert!(flush.is_none());
    }
}
