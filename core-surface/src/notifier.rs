//! First-frame notification.

use crate::traits::VideoRenderedListener;
use bridge_traits::{RenderSurface, TransformMatrix};
use std::sync::Arc;
use tracing::debug;

/// Applies frame transforms to the surface and fires the rendered callback
/// exactly once per bind cycle.
pub struct RenderedNotifier {
    listener: Option<Arc<dyn VideoRenderedListener>>,
    visible_alpha: f32,
    armed: bool,
    fired: bool,
}

impl RenderedNotifier {
    pub fn new(visible_alpha: f32) -> Self {
        Self {
            listener: None,
            visible_alpha,
            armed: false,
            fired: false,
        }
    }

    pub fn set_listener(&mut self, listener: Option<Arc<dyn VideoRenderedListener>>) {
        self.listener = listener;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Starts a new bind cycle.
    pub fn arm(&mut self) {
        self.armed = true;
        self.fired = false;
    }

    /// Ends the current bind cycle. Later frames are ignored until re-armed.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.fired = false;
    }

    /// Whether the first frame of the current cycle has been presented.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Applies `matrix` to `surface`. On the first call of a cycle the surface
    /// is also made visible and the listener notified; returns `true` then.
    pub fn present(&mut self, surface: &dyn RenderSurface, matrix: &TransformMatrix) -> bool {
        if !self.armed {
            return false;
        }

        surface.set_transform(matrix);
        surface.invalidate();

        if self.fired {
            return false;
        }
        surface.set_alpha(self.visible_alpha);
        if let Some(listener) = &self.listener {
            listener.on_rendered(surface);
        }
        self.fired = true;
        debug!(alpha = self.visible_alpha, "first frame presented");
        true
    }
}

impl std::fmt::Debug for RenderedNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedNotifier")
            .field("has_listener", &self.listener.is_some())
            .field("armed", &self.armed)
            .field("fired", &self.fired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::PixelSize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingListener {
        calls: AtomicUsize,
    }

    impl VideoRenderedListener for CountingListener {
        fn on_rendered(&self, surface: &dyn RenderSurface) {
            assert_eq!(surface.size(), PixelSize::new(100, 100));
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        transforms: Mutex<Vec<TransformMatrix>>,
        alphas: Mutex<Vec<f32>>,
    }

    impl RenderSurface for RecordingSurface {
        fn size(&self) -> PixelSize {
            PixelSize::new(100, 100)
        }
        fn set_transform(&self, matrix: &TransformMatrix) {
            self.transforms.lock().unwrap().push(*matrix);
        }
        fn set_alpha(&self, alpha: f32) {
            self.alphas.lock().unwrap().push(alpha);
        }
    }

    #[test]
    fn fires_once_per_cycle() {
        let listener = Arc::new(CountingListener::default());
        let mut notifier = RenderedNotifier::new(1.0);
        notifier.set_listener(Some(listener.clone()));
        let surface = RecordingSurface::default();

        notifier.arm();
        assert!(notifier.present(&surface, &TransformMatrix::IDENTITY));
        assert!(!notifier.present(&surface, &TransformMatrix::new(0.5, 1.0, 25.0, 0.0)));
        assert!(notifier.has_fired());

        notifier.disarm();
        assert!(!notifier.present(&surface, &TransformMatrix::IDENTITY));

        notifier.arm();
        assert!(notifier.present(&surface, &TransformMatrix::IDENTITY));

        assert_eq!(listener.calls.load(Ordering::SeqCst), 2);
        assert_eq!(surface.transforms.lock().unwrap().len(), 3);
        assert_eq!(*surface.alphas.lock().unwrap(), vec![1.0, 1.0]);
    }

    /// Surface and listener that append to one shared log.
    #[derive(Default)]
    struct SequenceLog {
        entries: Mutex<Vec<&'static str>>,
    }

    impl SequenceLog {
        fn push(&self, entry: &'static str) {
            self.entries.lock().unwrap().push(entry);
        }
    }

    impl RenderSurface for SequenceLog {
        fn size(&self) -> PixelSize {
            PixelSize::new(100, 100)
        }
        fn set_transform(&self, _matrix: &TransformMatrix) {
            self.push("transform");
        }
        fn set_alpha(&self, _alpha: f32) {
            self.push("alpha");
        }
        fn invalidate(&self) {
            self.push("invalidate");
        }
    }

    struct LoggingListener(Arc<SequenceLog>);

    impl VideoRenderedListener for LoggingListener {
        fn on_rendered(&self, _surface: &dyn RenderSurface) {
            self.0.push("rendered");
        }
    }

    #[test]
    fn first_frame_reveals_before_notifying() {
        let log = Arc::new(SequenceLog::default());
        let mut notifier = RenderedNotifier::new(1.0);
        notifier.set_listener(Some(Arc::new(LoggingListener(log.clone()))));

        notifier.arm();
        assert!(!notifier.has_fired());
        assert!(notifier.present(log.as_ref(), &TransformMatrix::IDENTITY));
        assert!(notifier.has_fired());

        assert_eq!(
            *log.entries.lock().unwrap(),
            vec!["transform", "invalidate", "alpha", "rendered"]
        );
    }

    #[test]
    fn presents_without_listener() {
        let mut notifier = RenderedNotifier::new(0.8);
        let surface = RecordingSurface::default();
        notifier.arm();
        assert!(notifier.present(&surface, &TransformMatrix::IDENTITY));
        assert_eq!(*surface.alphas.lock().unwrap(), vec![0.8]);
        assert!(!notifier.has_listener());
    }
}
