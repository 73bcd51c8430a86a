//! Background crossfade properties.
//!
//! Skins draw two background layers. `background_static` holds the image
//! being faded out and `background` the image being faded in. Without
//! crossfading only the static layer is used.

use horizon_listsync_core::logging::targets;

use super::context::WindowContext;
use super::host::PropertyTarget;

/// Layer faded in.
pub const BACKGROUND_PROPERTY: &str = "background";
/// Layer faded out, or the only layer without crossfading.
pub const BACKGROUND_STATIC_PROPERTY: &str = "background_static";

/// Applies background changes to a window, sharing the last URL with every
/// other window through the [`WindowContext`].
#[derive(Debug, Clone)]
pub struct BackgroundCrossfade {
    context: WindowContext,
}

impl BackgroundCrossfade {
    /// Create a crossfader over the shared context.
    pub fn new(context: WindowContext) -> Self {
        Self { context }
    }

    /// Show `value` as the window background.
    ///
    /// Returns the background now shown, or `None` when nothing changed.
    /// With crossfading on, an empty value shows the fallback image.
    pub fn apply(&self, target: &dyn PropertyTarget, value: Option<&str>) -> Option<String> {
        let settings = self.context.settings();
        let value = value.filter(|v| !v.is_empty());

        if !settings.crossfade() {
            let value = value?;
            write(target, BACKGROUND_STATIC_PROPERTY, value);
            return Some(value.to_string());
        }

        let last = self.context.last_background_url();
        let Some(value) = value else {
            let fallback = settings.fallback_background();
            write(target, BACKGROUND_STATIC_PROPERTY, last.as_deref().unwrap_or(fallback));
            write(target, BACKGROUND_PROPERTY, fallback);
            self.context.set_last_background_url(Some(fallback.to_string()));
            return Some(fallback.to_string());
        };

        if target.property(BACKGROUND_PROPERTY).is_empty() {
            write(target, BACKGROUND_STATIC_PROPERTY, value);
            write(target, BACKGROUND_PROPERTY, value);
        } else if last.as_deref() != Some(value) {
            write(target, BACKGROUND_STATIC_PROPERTY, last.as_deref().unwrap_or_default());
            write(target, BACKGROUND_PROPERTY, value);
        }
        self.context.set_last_background_url(Some(value.to_string()));
        Some(value.to_string())
    }
}

fn write(target: &dyn PropertyTarget, key: &str, value: &str) {
    if let Err(error) = target.set_property(key, value) {
        tracing::warn!(target: targets::WINDOW, key, %error, "failed to set background property");
    }
}
