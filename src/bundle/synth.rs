//! Bundle synthesis: the installable-app shell around a captured page.
//!
//! Everything here except [`write_bundle`] is a pure function of the app
//! name and the captured markup, so the generated files can be checked
//! without a filesystem or a browser.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use serde_json::json;

use super::error::BundleError;
use super::templates::{self, ICON_192, ICON_512};
use crate::capture::CapturedPage;
use crate::util::names::cache_name;

pub const INDEX_HTML: &str = "index.html";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const SERVICE_WORKER_JS: &str = "service-worker.js";
pub const APP_JS: &str = "app.js";
pub const STYLES_CSS: &str = "styles.css";

pub const BACKGROUND_COLOR: &str = "#ffffff";
pub const THEME_COLOR: &str = "#000000";

/// Every file a bundle contains, in write order
pub const BUNDLE_FILES: [&str; 7] = [
    INDEX_HTML,
    MANIFEST_JSON,
    SERVICE_WORKER_JS,
    APP_JS,
    STYLES_CSS,
    ICON_192,
    ICON_512,
];

/// Assets the service worker pre-caches
const PRECACHE: [&str; 7] = [
    "./",
    "./index.html",
    "./styles.css",
    "./app.js",
    "./manifest.json",
    "./icon-192.png",
    "./icon-512.png",
];

#[derive(Debug, Clone)]
pub struct BundleFile {
    pub name: &'static str,
    pub contents: Cow<'static, [u8]>,
}

/// In-memory bundle, ready to be written
#[derive(Debug, Clone)]
pub struct BundleFiles {
    files: Vec<BundleFile>,
}

impl BundleFiles {
    /// Render the full file set
    ///
    /// `app_name` is the name shown to users; `cache_key` is the sanitized
    /// name used to derive the service worker cache.
    pub fn render(
        app_name: &str,
        cache_key: &str,
        captured: &CapturedPage,
    ) -> Result<Self, BundleError> {
        let text = |name: &'static str, body: String| BundleFile {
            name,
            contents: Cow::Owned(body.into_bytes()),
        };

        let mut files = vec![
            text(INDEX_HTML, index_html(app_name, captured)),
            text(MANIFEST_JSON, manifest_json(app_name)),
            text(SERVICE_WORKER_JS, service_worker_js(cache_key)),
            text(APP_JS, app_js().to_string()),
            text(STYLES_CSS, styles_css().to_string()),
        ];

        for icon in [ICON_192, ICON_512] {
            let contents = templates::icon(icon).ok_or_else(|| {
                BundleError::write(
                    icon,
                    io::Error::new(io::ErrorKind::NotFound, "icon template missing"),
                )
            })?;
            files.push(BundleFile {
                name: icon,
                contents,
            });
        }

        Ok(Self { files })
    }

    pub fn iter(&self) -> impl Iterator<Item = &BundleFile> {
        self.files.iter()
    }

    pub fn get(&self, name: &str) -> Option<&BundleFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Write every file into `dir`. Stops at the first failure.
pub fn write_bundle(dir: &Path, files: &BundleFiles) -> Result<(), BundleError> {
    for file in files.iter() {
        let path = dir.join(file.name);
        fs::write(&path, &file.contents).map_err(|e| BundleError::write(&path, e))?;
    }
    Ok(())
}

/// Markup document wrapping the captured page
pub fn index_html(app_name: &str, captured: &CapturedPage) -> String {
    let title = escape_html(app_name);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="theme-color" content="{theme}">
  <title>{title}</title>
  <link rel="manifest" href="manifest.json">
  <link rel="stylesheet" href="styles.css">
  <link rel="icon" type="image/png" href="icon-192.png">
</head>
<body>
  <div id="app-content">{content}</div>
  <script src="app.js"></script>
</body>
</html>
"#,
        theme = THEME_COLOR,
        content = captured.as_str(),
    )
}

/// Web app manifest (pretty-printed JSON)
pub fn manifest_json(app_name: &str) -> String {
    let manifest = json!({
        "name": app_name,
        "short_name": app_name,
        "start_url": "./index.html",
        "display": "standalone",
        "background_color": BACKGROUND_COLOR,
        "theme_color": THEME_COLOR,
        "icons": [
            {
                "src": ICON_192,
                "sizes": "192x192",
                "type": "image/png"
            },
            {
                "src": ICON_512,
                "sizes": "512x512",
                "type": "image/png"
            }
        ]
    });
    // Serializing a json! value cannot fail.
    serde_json::to_string_pretty(&manifest).unwrap_or_default()
}

/// Offline-cache worker: pre-cache on install, cache-first with network fallback
pub fn service_worker_js(cache_key: &str) -> String {
    let cache = serde_json::to_string(&cache_name(cache_key)).unwrap_or_default();
    let assets = serde_json::to_string_pretty(&PRECACHE).unwrap_or_default();
    format!(
        r#"const CACHE_NAME = {cache};
const ASSETS = {assets};

self.addEventListener('install', (event) => {{
  event.waitUntil(
    caches.open(CACHE_NAME).then((cache) => cache.addAll(ASSETS))
  );
  self.skipWaiting();
}});

self.addEventListener('activate', (event) => {{
  event.waitUntil(
    caches.keys().then((keys) =>
      Promise.all(
        keys.filter((key) => key !== CACHE_NAME).map((key) => caches.delete(key))
      )
    )
  );
  self.clients.claim();
}});

self.addEventListener('fetch', (event) => {{
  event.respondWith(
    caches.match(event.request).then((cached) => cached || fetch(event.request))
  );
}});
"#
    )
}

/// Bootstrap script registering the worker when supported
pub fn app_js() -> &'static str {
    r#"if ('serviceWorker' in navigator) {
  window.addEventListener('load', () => {
    navigator.serviceWorker
      .register('./service-worker.js')
      .then((registration) => {
        console.log('Service worker registered with scope:', registration.scope);
      })
      .catch((error) => {
        console.error('Service worker registration failed:', error);
      });
  });
}
"#
}

pub fn styles_css() -> &'static str {
    r#"*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  padding: 0;
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
  background-color: #ffffff;
}

#app-content {
  width: 100%;
  min-height: 100vh;
}
"#
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
