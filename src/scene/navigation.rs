//! Opening label links outside the app.

use bevy::prelude::*;
use thiserror::Error;

/// Request to open a URL in a new browser tab or window.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct OpenUrl(pub String);

/// Failure to hand a URL to the browser.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Only `http` and `https` links are opened.
    #[error("refusing to open non-web url {0:?}")]
    UnsupportedScheme(String),
    /// The system browser could not be launched.
    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to launch browser for {url}: {source}")]
    Launch {
        /// Requested URL.
        url: String,
        /// Launcher error.
        #[source]
        source: std::io::Error,
    },
    /// No global `window` object.
    #[cfg(target_arch = "wasm32")]
    #[error("no browser window available")]
    NoWindow,
    /// `window.open` threw or was blocked.
    #[cfg(target_arch = "wasm32")]
    #[error("window.open({url}) failed: {reason}")]
    Blocked {
        /// Requested URL.
        url: String,
        /// Browser-reported reason.
        reason: String,
    },
}

/// Opens every requested URL without blocking the frame.
pub fn open_requested_urls(mut requests: MessageReader<OpenUrl>) {
    for OpenUrl(url) in requests.read() {
        match open_in_new_context(url) {
            Ok(()) => info!("opened {url}"),
            Err(err) => error!("{err}"),
        }
    }
}

fn check_scheme(url: &str) -> Result<(), NavigationError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(NavigationError::UnsupportedScheme(url.to_owned()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn open_in_new_context(url: &str) -> Result<(), NavigationError> {
    check_scheme(url)?;
    webbrowser::open(url).map_err(|source| NavigationError::Launch {
        url: url.to_owned(),
        source,
    })
}

#[cfg(target_arch = "wasm32")]
fn open_in_new_context(url: &str) -> Result<(), NavigationError> {
    check_scheme(url)?;
    let window = web_sys::window().ok_or(NavigationError::NoWindow)?;
    match window.open_with_url_and_target(url, "_blank") {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(NavigationError::Blocked {
            url: url.to_owned(),
            reason: "popup blocked".into(),
        }),
        Err(err) => Err(NavigationError::Blocked {
            url: url.to_owned(),
            reason: format!("{err:?}"),
        }),
    }
}
